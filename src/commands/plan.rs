use super::{connect, report_refresh, target};
use crate::Context;
use crate::cli::PlanArgs;
use crate::engine::differ::display_plan;
use crate::engine::{ExecuteOptions, build_plan, refresh};
use crate::manifest::Manifest;
use crate::state::StateFile;
use crate::ui;

/// Refresh in memory and print what apply would do; state is not written
pub fn run(ctx: &Context, args: &PlanArgs) -> anyhow::Result<()> {
    let target = target(args.target.target.as_deref())?;
    let manifest = Manifest::load(&ctx.manifest)?;
    let mut state = StateFile::load(&ctx.state)?;
    if manifest.is_empty() && state.is_empty() {
        ui::info("Nothing is declared or tracked yet.");
        return Ok(());
    }

    if !args.no_refresh && !state.is_empty() {
        let adapters = connect(ctx)?;
        let opts = ExecuteOptions {
            quiet: ctx.quiet,
            ..Default::default()
        };
        let outcomes = refresh(&adapters, &mut state, target.as_ref(), &opts)?;
        report_refresh(&outcomes);
    }

    let plan = build_plan(&manifest, &state, target.as_ref());
    display_plan(&plan);

    if ctx.verbose > 0 {
        for change in plan.changes.iter().filter(|c| !c.action().is_change()) {
            ui::dim(&format!("{} is up to date", change.address));
        }
    }

    Ok(())
}
