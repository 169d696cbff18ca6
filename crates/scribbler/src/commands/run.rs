//! Run command implementation

use anyhow::{Context, Result};
use clap::Args;
use scribbler_core::text::{open_text_file, save_text_file};
use std::io::{Read, Write};
use std::path::PathBuf;

use crate::host::{Host, results};

/// Run an operation once
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Operation name
    name: String,

    /// Menu the operation is in, when several share a name
    #[arg(long)]
    group: Option<String>,

    /// Read text from this file instead of stdin
    #[arg(short, long, value_name = "FILE")]
    input: Option<PathBuf>,

    /// Write the result to this file instead of stdout
    #[arg(short, long, value_name = "FILE")]
    output: Option<PathBuf>,

    /// Session value handed to the operation (repeatable)
    #[arg(long = "set", value_name = "KEY=VALUE", value_parser = parse_key_value)]
    values: Vec<(String, String)>,
}

/// Execute the run command
pub fn execute(host: &Host, args: RunArgs) -> Result<()> {
    let controller = host.find(&args.name, args.group.as_deref())?;

    let text = match args.input {
        Some(ref path) => open_text_file(path)?,
        None => {
            let mut text = String::new();
            std::io::stdin()
                .read_to_string(&mut text)
                .context("Failed to read text from stdin")?;
            text
        }
    };

    let mut session = host.session();
    session.extend(args.values);

    let output = controller.execute(&text, &mut session)?;

    match args.output {
        Some(ref path) => save_text_file(path, &output)?,
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout.write_all(output.as_bytes())?;
            stdout.flush()?;
        }
    }

    for (key, value) in results(&session) {
        eprintln!("{key} = {value}");
    }

    Ok(())
}

/// Parse a `KEY=VALUE` argument; the value may be empty, the key may not
fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    let (key, value) = raw
        .split_once('=')
        .ok_or_else(|| format!("expected KEY=VALUE, got '{raw}'"))?;
    if key.trim().is_empty() {
        return Err(format!("empty key in '{raw}'"));
    }
    Ok((key.trim().to_string(), value.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_key_value() {
        assert_eq!(
            parse_key_value("replace.search=world").unwrap(),
            ("replace.search".to_string(), "world".to_string())
        );
        assert_eq!(
            parse_key_value("replace.with=").unwrap(),
            ("replace.with".to_string(), String::new())
        );
        assert_eq!(
            parse_key_value("expr=a=b").unwrap(),
            ("expr".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("no-equals").is_err());
        assert!(parse_key_value("=value").is_err());
    }
}
