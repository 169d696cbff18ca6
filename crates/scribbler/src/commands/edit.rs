//! Edit command implementation
//!
//! A line-oriented editing session: one buffer, the operation menus, and
//! commands to toggle and run operations on the buffer.

use anyhow::{Result, bail};
use clap::Args;
use scribbler_core::text::{TextFileError, open_text_file, save_text_file};
use scribbler_host::{MenuBar, Transition};
use scribbler_types::Session;
use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::host::{Host, results};

const HELP: &str = "\
Commands:
  open <file>         load a file into the buffer
  save [file]         write the buffer (to its file, or to <file>)
  new                 start an empty buffer
  append <text>       add a line to the buffer
  show                print the buffer
  menus               show the operation menus
  enable <name>       enable an operation
  disable <name>      disable an operation
  run <name>          run an operation on the buffer
  set <key> <value>   set a session value
  quit                leave the session";

/// Interactive editing session over stdin
#[derive(Args, Debug)]
pub struct EditArgs {
    /// File to open; created on first save if it does not exist
    file: Option<PathBuf>,
}

/// Execute the edit command
pub fn execute(host: &Host, args: EditArgs) -> Result<()> {
    let mut editor = Editor::new(host.session());
    if let Some(ref path) = args.file {
        editor.open_or_create(path)?;
    }

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    editor.run(host, stdin.lock(), stdout.lock())
}

enum Flow {
    Continue,
    Quit,
}

struct Editor {
    text: String,
    path: Option<PathBuf>,
    session: Session,
    modified: bool,
}

impl Editor {
    fn new(session: Session) -> Self {
        Self {
            text: String::new(),
            path: None,
            session,
            modified: false,
        }
    }

    fn open_or_create(&mut self, path: &Path) -> Result<()> {
        match open_text_file(path) {
            Ok(text) => self.text = text,
            Err(TextFileError::NotFound { .. }) => self.text.clear(),
            Err(e) => return Err(e.into()),
        }
        self.path = Some(path.to_path_buf());
        self.modified = false;
        Ok(())
    }

    /// Read commands until `quit` or end of input
    ///
    /// Command errors are printed and the session continues.
    fn run<R: BufRead, W: Write>(&mut self, host: &Host, input: R, mut out: W) -> Result<()> {
        writeln!(out, "{} operation(s) loaded; type 'help' for commands", host.manager.len())?;

        for line in input.lines() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let (command, rest) = match line.split_once(char::is_whitespace) {
                Some((command, rest)) => (command, rest.trim()),
                None => (line, ""),
            };

            match self.dispatch(host, command, rest, &mut out) {
                Ok(Flow::Continue) => {}
                Ok(Flow::Quit) => break,
                Err(e) => writeln!(out, "Error: {e:#}")?,
            }
        }

        if self.modified {
            writeln!(out, "Unsaved changes discarded")?;
        }
        out.flush()?;
        Ok(())
    }

    fn dispatch<W: Write>(
        &mut self,
        host: &Host,
        command: &str,
        rest: &str,
        out: &mut W,
    ) -> Result<Flow> {
        match command {
            "help" => writeln!(out, "{HELP}")?,
            "open" => {
                let path = required(rest, "open <file>")?;
                self.text = open_text_file(Path::new(path))?;
                self.path = Some(PathBuf::from(path));
                self.modified = false;
                writeln!(out, "Opened {path} ({} characters)", self.text.chars().count())?;
            }
            "save" => {
                let path = match (rest, &self.path) {
                    ("", Some(path)) => path.clone(),
                    ("", None) => bail!("no file name; use save <file>"),
                    (path, _) => PathBuf::from(path),
                };
                save_text_file(&path, &self.text)?;
                writeln!(out, "Saved {}", path.display())?;
                self.path = Some(path);
                self.modified = false;
            }
            "new" => {
                self.text.clear();
                self.path = None;
                self.modified = false;
                writeln!(out, "New buffer")?;
            }
            "append" => {
                self.text.push_str(rest);
                self.text.push('\n');
                self.modified = true;
            }
            "show" => {
                write!(out, "{}", self.text)?;
                if !self.text.is_empty() && !self.text.ends_with('\n') {
                    writeln!(out)?;
                }
            }
            "menus" => write!(out, "{}", MenuBar::build(host.manager.controllers()))?,
            "enable" | "disable" => {
                let name = required(rest, "enable|disable <name>")?;
                let transition = host.manager.set_active(name, command == "enable")?;
                writeln!(out, "{}", describe(name, transition))?;
            }
            "run" => {
                let name = required(rest, "run <name>")?;
                let controller = host.find(name, None)?;
                let output = controller.execute(&self.text, &mut self.session)?;
                if output != self.text {
                    self.text = output;
                    self.modified = true;
                }
                writeln!(out, "Ran {name}")?;
                for (key, value) in results(&self.session) {
                    writeln!(out, "  {key} = {value}")?;
                }
            }
            "set" => {
                let (key, value) = rest
                    .split_once(char::is_whitespace)
                    .map(|(k, v)| (k, v.trim()))
                    .unwrap_or((rest, ""));
                let key = required(key, "set <key> <value>")?;
                self.session.set(key, value);
                writeln!(out, "{key} = {value}")?;
            }
            "quit" | "exit" => return Ok(Flow::Quit),
            other => writeln!(out, "Unknown command '{other}'; type 'help' for commands")?,
        }
        Ok(Flow::Continue)
    }
}

fn required<'a>(value: &'a str, usage: &str) -> Result<&'a str> {
    if value.is_empty() {
        bail!("usage: {usage}");
    }
    Ok(value)
}

fn describe(name: &str, transition: Transition) -> String {
    match transition {
        Transition::Unchanged => format!("{name} unchanged"),
        Transition::Activated { reloaded: true } => format!("Enabled {name} (module reloaded)"),
        Transition::Activated { reloaded: false } => format!("Enabled {name}"),
        Transition::Deactivated { unloaded: true } => format!("Disabled {name} (module unloaded)"),
        Transition::Deactivated { unloaded: false } => format!("Disabled {name}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use scribbler_core::config::Config;
    use scribbler_host::OperationManager;
    use scribbler_host::plugin::{StaticModuleLoader, operation_factory};
    use scribbler_types::OperationDescription;
    use std::sync::Arc;
    use tempfile::TempDir;

    fn host() -> Host {
        let loader = Arc::new(
            StaticModuleLoader::new()
                .with_module(
                    "search-replace",
                    vec![operation_factory(
                        "Replace",
                        OperationDescription::new("Replaces all instances of the specified text"),
                        |text, session| {
                            let search = session.get("replace.search").unwrap_or_default();
                            if search.is_empty() {
                                return Ok(text.to_string());
                            }
                            let with = session.get("replace.with").unwrap_or_default();
                            Ok(text.replace(search, with))
                        },
                    )],
                )
                .with_module(
                    "statistics",
                    vec![operation_factory(
                        "Word Count",
                        OperationDescription::new("Counts words").in_menu("Statistics"),
                        |text, session| {
                            session.set("result.words", text.split_whitespace().count().to_string());
                            Ok(text.to_string())
                        },
                    )],
                ),
        );
        Host {
            config: Config::default(),
            directory: PathBuf::from("operations"),
            manager: OperationManager::from_modules(loader.identities(), loader),
        }
    }

    fn session_output(host: &Host, editor: &mut Editor, script: &str) -> String {
        let mut out = Vec::new();
        editor.run(host, script.as_bytes(), &mut out).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn test_replace_and_save() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("note.txt");
        std::fs::write(&path, "hello world\n").unwrap();

        let host = host();
        let mut editor = Editor::new(Session::new());
        let script = format!(
            "open {}\nset replace.search world\nset replace.with there\nrun Replace\nsave\nquit\n",
            path.display()
        );
        let out = session_output(&host, &mut editor, &script);

        assert!(out.contains("Ran Replace"), "{out}");
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "hello there\n");
        assert!(!out.contains("Unsaved changes"));
    }

    #[test]
    fn test_errors_do_not_end_session() {
        let host = host();
        let mut editor = Editor::new(Session::new());
        let out = session_output(
            &host,
            &mut editor,
            "disable Replace\nrun Replace\nrun Missing\nbogus\nenable Replace\nappend one two\nrun Word Count\n",
        );

        assert!(out.contains("Disabled Replace (module unloaded)"), "{out}");
        assert!(out.contains("Error: operation 'Replace' is not active"), "{out}");
        assert!(out.contains("Error: no operation named 'Missing'"), "{out}");
        assert!(out.contains("Unknown command 'bogus'"), "{out}");
        assert!(out.contains("Enabled Replace (module reloaded)"), "{out}");
        assert!(out.contains("result.words = 2"), "{out}");
        assert!(out.contains("Unsaved changes discarded"), "{out}");
    }

    #[test]
    fn test_save_without_path_is_error() {
        let host = host();
        let mut editor = Editor::new(Session::new());
        let out = session_output(&host, &mut editor, "append text\nsave\nshow\n");

        assert!(out.contains("Error: no file name"), "{out}");
        assert!(out.contains("text\n"), "{out}");
    }

    #[test]
    fn test_open_or_create_missing_file() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("new.txt");

        let mut editor = Editor::new(Session::new());
        editor.open_or_create(&path).unwrap();
        assert!(editor.text.is_empty());
        assert_eq!(editor.path.as_deref(), Some(path.as_path()));
    }

    #[test]
    fn test_menus_command() {
        let host = host();
        let mut editor = Editor::new(Session::new());
        let out = session_output(&host, &mut editor, "menus\n");

        assert!(out.contains("Statistics"), "{out}");
        assert!(out.contains("Disable Word Count"), "{out}");
    }
}
