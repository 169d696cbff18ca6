//! List command implementation

use anyhow::Result;
use clap::Args;

use crate::host::Host;

/// List every operation
#[derive(Args, Debug)]
pub struct ListArgs {
    /// Only show enabled operations
    #[arg(long)]
    enabled: bool,
}

/// Execute the list command
pub fn execute(host: &Host, args: ListArgs) -> Result<()> {
    let controllers: Vec<_> = host
        .manager
        .controllers()
        .iter()
        .filter(|c| !args.enabled || c.is_active())
        .collect();

    if controllers.is_empty() {
        println!(
            "No operations found (directory {})",
            host.directory.display()
        );
        return Ok(());
    }

    println!(
        "{:<20} {:<12} {:<24} {:<9} DESCRIPTION",
        "NAME", "MENU", "MODULE", "STATE"
    );
    for controller in controllers {
        let state = if controller.is_active() {
            "enabled"
        } else {
            "disabled"
        };
        println!(
            "{:<20} {:<12} {:<24} {:<9} {}",
            controller.name(),
            controller.menu_group(),
            controller.module().to_string(),
            state,
            controller.description()
        );
    }

    Ok(())
}
