use crate::Context;
use crate::cli::StateCommand;
use crate::manifest::Address;
use crate::state::StateFile;
use crate::ui;
use anyhow::{Result, bail};
use colored::Colorize;

pub fn run(ctx: &Context, cmd: StateCommand) -> Result<()> {
    match cmd {
        StateCommand::List => list(ctx),
        StateCommand::Show { address } => show(ctx, &address),
        StateCommand::Rm { address } => rm(ctx, &address),
    }
}

fn list(ctx: &Context) -> Result<()> {
    let state = StateFile::load(&ctx.state)?;
    if state.is_empty() {
        ui::info("No resources are tracked yet.");
        return Ok(());
    }

    for (address, entry) in state.entries() {
        let id = entry
            .kind
            .policy()
            .identifier_of(&entry.attributes)
            .unwrap_or("-");
        println!("{:<48} {}", address.to_string(), id.dimmed());
    }
    Ok(())
}

fn show(ctx: &Context, address: &str) -> Result<()> {
    let address: Address = address.parse()?;
    let state = StateFile::load(&ctx.state)?;
    let Some(entry) = state.get(&address.to_string()) else {
        bail!("{address} is not tracked");
    };

    let policy = entry.kind.policy();
    ui::header(&address.to_string());
    for (field, value) in entry.attributes.iter() {
        ui::kv(field, &ui::display_value(policy, field, value));
    }
    Ok(())
}

fn rm(ctx: &Context, address: &str) -> Result<()> {
    let address: Address = address.parse()?;
    let mut state = StateFile::load(&ctx.state)?;
    if state.remove(&address.to_string()).is_none() {
        bail!("{address} is not tracked");
    }
    state.save(&ctx.state)?;

    ui::success(&format!("Removed {address} from state"));
    ui::dim("The remote resource was left untouched.");
    Ok(())
}
