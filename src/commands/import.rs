use super::connect;
use crate::Context;
use crate::engine::executor::run_request;
use crate::manifest::{Address, Manifest};
use crate::retry::RetryConfig;
use crate::state::StateFile;
use crate::ui;
use anyhow::{Result, bail};
use reconcile::Request;

/// Adopt an existing remote instance under `address`
pub fn run(ctx: &Context, address: &str, id: &str) -> Result<()> {
    let address: Address = address.parse()?;
    let mut state = StateFile::load(&ctx.state)?;
    if state.contains(&address.to_string()) {
        bail!("{address} is already tracked; run `deploymeta state rm {address}` first to re-import it");
    }

    let adapters = connect(ctx)?;
    let new_state = run_request(
        &adapters,
        address.kind,
        Request::Import { id: id.to_string() },
        &RetryConfig::default(),
    )?;

    state.apply_new_state(&address, new_state);
    state.save(&ctx.state)?;
    ui::success(&format!("Imported {address} ({id})"));

    if let Some(manifest) = Manifest::load_optional(&ctx.manifest)?
        && !manifest.contains(&address.to_string())
    {
        ui::warn(&format!(
            "{address} is not declared in {}; the next apply will delete it",
            ctx.manifest.display()
        ));
    }
    Ok(())
}
