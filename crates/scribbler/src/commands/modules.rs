//! Modules command implementation

use anyhow::Result;
use clap::Args;
use std::io::Write;

use crate::host::Host;

/// Show loaded modules
#[derive(Args, Debug)]
pub struct ModulesArgs {
    /// Also print each module's file path and full fingerprint
    #[arg(long)]
    paths: bool,
}

/// Execute the modules command
pub fn execute(host: &Host, args: ModulesArgs) -> Result<()> {
    let mut stdout = std::io::stdout().lock();
    render(host, args.paths, &mut stdout)?;
    stdout.flush()?;
    Ok(())
}

fn render<W: Write>(host: &Host, paths: bool, out: &mut W) -> Result<()> {
    let contexts = host.manager.contexts();
    if contexts.is_empty() {
        writeln!(out, "No modules loaded (directory {})", host.directory.display())?;
        return Ok(());
    }

    for context in contexts {
        let identity = context.identity();
        writeln!(
            out,
            "{:<32} {:<20} {} operation(s)",
            identity.to_string(),
            context.state().to_string(),
            context.controllers().len()
        )?;
        if let Some(ref description) = identity.description {
            writeln!(out, "    {description}")?;
        }
        if paths {
            writeln!(out, "    path: {}", identity.path.display())?;
            writeln!(out, "    sha256: {}", identity.fingerprint)?;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribbler_core::config::Config;
    use scribbler_host::OperationManager;
    use scribbler_host::plugin::{StaticModuleLoader, operation_factory};
    use scribbler_types::OperationDescription;
    use std::path::PathBuf;
    use std::sync::Arc;

    fn host() -> Host {
        let loader = Arc::new(
            StaticModuleLoader::new()
                .with_module(
                    "letter-case",
                    vec![operation_factory(
                        "Upper Case",
                        OperationDescription::new("Converts text to upper case").in_menu("Format"),
                        |text, _| Ok(text.to_uppercase()),
                    )],
                )
                .with_module(
                    "statistics",
                    vec![operation_factory(
                        "Word Count",
                        OperationDescription::new("Counts words").in_menu("Statistics"),
                        |text, _| Ok(text.to_string()),
                    )],
                ),
        );
        let mut identities = loader.identities();
        identities[0].version = Some("0.1.0".to_string());
        identities[0].description = Some("Letter case conversions".to_string());

        Host {
            config: Config::default(),
            directory: PathBuf::from("operations"),
            manager: OperationManager::from_modules(identities, loader),
        }
    }

    fn rendered(host: &Host, paths: bool) -> String {
        let mut out = Vec::new();
        render(host, paths, &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_description_follows_module_line() {
        let host = host();
        host.manager.set_active("Word Count", false).unwrap();
        let out = rendered(&host, false);
        let lines: Vec<_> = out.lines().collect();

        assert_eq!(lines.len(), 3, "{out}");
        assert!(lines[0].starts_with("letter-case@0.1.0"), "{out}");
        assert!(lines[0].contains("loaded (1 active)"), "{out}");
        assert_eq!(lines[1], "    Letter case conversions");
        assert!(lines[2].starts_with("statistics@"), "{out}");
        assert!(lines[2].contains("unloaded"), "{out}");
        assert!(!out.contains("sha256:"));
    }

    #[test]
    fn test_paths_flag() {
        let host = host();
        let out = rendered(&host, true);
        assert!(out.contains("    path: static/letter-case"), "{out}");
        assert!(out.contains("    sha256: "), "{out}");
    }
}
