pub mod apply;
pub mod deployment;
pub mod destroy;
pub mod import;
pub mod plan;
pub mod refresh;
pub mod state;

use crate::Context;
use crate::config::ProviderConfig;
use crate::engine::executor::Outcome;
use crate::engine::{Target, parse_target};
use crate::ui;
use anyhow::{Context as _, Result};
use factory::{Adapters, FactoryClient};
use reconcile::ApplyResult;

/// Build the remote adapters from config file, flags and environment
pub fn connect(ctx: &Context) -> Result<Adapters> {
    let config = ProviderConfig::load(ctx.provider.config.as_deref())?
        .with_overrides(&ctx.provider)
        .into_client_config()?;

    log::debug!(
        "Connecting to {} as deployment '{}'",
        config.base_url,
        config.deployment_name
    );
    let client = FactoryClient::new(config).context("Invalid provider configuration")?;
    Ok(Adapters::new(client))
}

pub fn target(raw: Option<&str>) -> Result<Option<Target>> {
    raw.map(parse_target).transpose()
}

/// Report drift and failed reads from a refresh
pub fn report_refresh(outcomes: &[Outcome]) {
    for outcome in outcomes {
        match &outcome.result {
            ApplyResult::Drifted => ui::warn(&format!(
                "{} no longer exists remotely; removed from state",
                outcome.address
            )),
            ApplyResult::Failed { error } => {
                ui::error(&format!("Could not refresh {}: {error}", outcome.address));
            }
            _ => {}
        }
    }
}

/// Whether any outcome failed
pub fn any_failed(outcomes: &[Outcome]) -> bool {
    outcomes
        .iter()
        .any(|o| matches!(o.result, ApplyResult::Failed { .. }))
}
