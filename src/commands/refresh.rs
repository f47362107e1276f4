use super::{any_failed, connect, report_refresh, target};
use crate::Context;
use crate::cli::TargetArgs;
use crate::engine::{ExecuteOptions, refresh};
use crate::state::StateFile;
use crate::ui;
use anyhow::{Result, bail};
use reconcile::ApplyResult;

pub fn run(ctx: &Context, args: &TargetArgs) -> Result<()> {
    let target = target(args.target.as_deref())?;
    let mut state = StateFile::load(&ctx.state)?;
    if state.is_empty() {
        ui::info("No resources are tracked yet.");
        return Ok(());
    }
    let before = state.resources.clone();

    let adapters = connect(ctx)?;
    let opts = ExecuteOptions {
        quiet: ctx.quiet,
        ..Default::default()
    };
    let outcomes = refresh(&adapters, &mut state, target.as_ref(), &opts)?;
    report_refresh(&outcomes);

    if state.resources != before {
        state.save(&ctx.state)?;
    }

    let drifted = outcomes
        .iter()
        .filter(|o| o.result == ApplyResult::Drifted)
        .count();
    if any_failed(&outcomes) {
        bail!("Some resources could not be refreshed");
    }
    ui::success(&format!(
        "Refreshed {} resources ({drifted} drifted)",
        outcomes.len()
    ));
    Ok(())
}
