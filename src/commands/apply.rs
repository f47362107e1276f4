use super::{connect, report_refresh, target};
use crate::Context;
use crate::cli::ApplyArgs;
use crate::engine::{ExecuteOptions, build_plan, execute, refresh};
use crate::manifest::Manifest;
use crate::retry::RetryConfig;
use crate::state::StateFile;
use anyhow::{Result, bail};

pub fn run(ctx: &Context, args: &ApplyArgs) -> Result<()> {
    let target = target(args.target.target.as_deref())?;
    let manifest = Manifest::load(&ctx.manifest)?;
    let mut state = StateFile::load(&ctx.state)?;
    let before = state.resources.clone();

    let adapters = connect(ctx)?;
    let opts = ExecuteOptions {
        dry_run: args.dry_run,
        jobs: args.jobs,
        yes: args.yes,
        quiet: ctx.quiet,
        retry: RetryConfig::with_retries(args.retries),
    };

    if !args.no_refresh {
        let outcomes = refresh(&adapters, &mut state, target.as_ref(), &opts)?;
        report_refresh(&outcomes);
    }

    let plan = build_plan(&manifest, &state, target.as_ref());
    let summary = execute(&adapters, &plan, &mut state, &opts)?;

    // Outcomes are saved even when some changes failed
    if !args.dry_run && state.resources != before {
        state.save(&ctx.state)?;
    }

    if !summary.is_success() {
        bail!("{} of {} changes failed", summary.failed, summary.total());
    }
    Ok(())
}
