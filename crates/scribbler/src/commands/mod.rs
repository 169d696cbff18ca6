//! CLI command dispatch and execution

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::host::Host;

mod edit;
mod list;
mod menus;
mod modules;
mod run;

/// scribbler - text operations from plugin modules
#[derive(Parser, Debug)]
#[command(
    name = "scribbler",
    version,
    about = "Text operations from plugin modules",
    long_about = "Loads operation modules from the operations directory and runs them on text"
)]
pub struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

/// Options accepted by every command
#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Directory to scan for operation modules
    #[arg(long, global = true, value_name = "PATH")]
    pub operations_dir: Option<PathBuf>,

    /// Additional config file, applied over global and repo-local config
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Load module files in place instead of shadow copies
    #[arg(long, global = true)]
    pub no_shadow_copy: bool,

    /// Debug logging on stderr
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// List operations with their menu, module and state
    List(list::ListArgs),

    /// Show the menus built from the loaded operations
    Menus(menus::MenusArgs),

    /// List loaded modules and their state
    Modules(modules::ModulesArgs),

    /// Run one operation on a file or stdin
    Run(run::RunArgs),

    /// Interactive editing session
    Edit(edit::EditArgs),
}

impl Cli {
    /// Execute the CLI command
    pub fn execute(self) -> Result<()> {
        scribbler_core::logging::init(self.global.verbose);
        let host = Host::start(&self.global)?;

        match self.command {
            Commands::List(args) => list::execute(&host, args),
            Commands::Menus(args) => menus::execute(&host, args),
            Commands::Modules(args) => modules::execute(&host, args),
            Commands::Run(args) => run::execute(&host, args),
            Commands::Edit(args) => edit::execute(&host, args),
        }
    }
}
