use super::{connect, target};
use crate::Context;
use crate::cli::DestroyArgs;
use crate::engine::{ExecuteOptions, destroy_plan, execute};
use crate::state::StateFile;
use crate::ui;
use anyhow::{Result, bail};

pub fn run(ctx: &Context, args: &DestroyArgs) -> Result<()> {
    let target = target(args.target.target.as_deref())?;
    let mut state = StateFile::load(&ctx.state)?;

    let plan = destroy_plan(&state, target.as_ref());
    if plan.changes.is_empty() {
        ui::info("Nothing to destroy.");
        return Ok(());
    }

    let adapters = connect(ctx)?;
    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs,
        yes: args.yes,
        quiet: ctx.quiet,
        ..Default::default()
    };
    let before = state.resources.clone();
    let summary = execute(&adapters, &plan, &mut state, &opts)?;

    if state.resources != before {
        state.save(&ctx.state)?;
    }

    if !summary.is_success() {
        bail!("{} of {} deletions failed", summary.failed, summary.total());
    }
    Ok(())
}
