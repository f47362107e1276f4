use super::connect;
use crate::Context;
use crate::engine::executor::run_request;
use crate::retry::RetryConfig;
use crate::ui;
use anyhow::{Context as _, Result, bail};
use reconcile::{AttributeRecord, NewState, Request, ResourceKind};

pub fn run(ctx: &Context, json: bool) -> Result<()> {
    let adapters = connect(ctx)?;
    let kind = ResourceKind::Deployment;
    let request = Request::Read {
        prior: AttributeRecord::new(),
    };

    let record = match run_request(&adapters, kind, request, &RetryConfig::default())? {
        NewState::Persist(record) => record,
        NewState::Clear => bail!("The deployment was not found. Check the deployment name"),
    };

    if json {
        let out = serde_json::to_string_pretty(&record).context("Failed to serialize deployment")?;
        println!("{out}");
        return Ok(());
    }

    let policy = kind.policy();
    ui::header("Deployment");
    for (field, value) in record.iter() {
        ui::kv(field, &ui::display_value(policy, field, value));
    }
    Ok(())
}
