//! Menus command implementation

use anyhow::Result;
use clap::Args;
use scribbler_host::MenuBar;

use crate::host::Host;

/// Show the menu layout
#[derive(Args, Debug)]
pub struct MenusArgs {}

/// Execute the menus command
pub fn execute(host: &Host, _args: MenusArgs) -> Result<()> {
    print!("{}", MenuBar::build(host.manager.controllers()));
    Ok(())
}
