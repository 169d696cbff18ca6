//! Registry start-up over a real operations directory
//!
//! The scanner runs against files on disk; loading is served by the
//! in-process loader under the same module names.

use scribbler_host::plugin::{StaticModuleLoader, operation_factory};
use scribbler_host::{ContextState, MenuBar, OperationManager, PLUGINS_MENU, PluginError};
use scribbler_types::{OperationDescription, OperationFactory};
use std::path::Path;
use std::sync::Arc;
use tempfile::TempDir;

const ELF_HEADER: &[u8] = b"\x7fELF\x02\x01\x01\x00";

fn op(name: &str, group: Option<&str>) -> OperationFactory {
    let description = match group {
        Some(group) => OperationDescription::new(name).in_menu(group),
        None => OperationDescription::new(name),
    };
    operation_factory(name, description, |text, _| Ok(text.to_string()))
}

fn write_module(dir: &Path, file: &str) {
    std::fs::write(dir.join(file), ELF_HEADER).unwrap();
}

fn loader() -> Arc<StaticModuleLoader> {
    Arc::new(
        StaticModuleLoader::new()
            .with_module("search_replace", vec![op("Replace", None)])
            .with_module(
                "statistics",
                vec![
                    op("Character Count", Some("Statistics")),
                    op("Word Count", Some("Statistics")),
                ],
            ),
    )
}

#[test]
fn test_initialize_from_directory() {
    let temp = TempDir::new().unwrap();
    write_module(temp.path(), "libsearch_replace.so");
    write_module(temp.path(), "libstatistics.so");
    std::fs::write(temp.path().join("notes.txt"), "not a module").unwrap();
    std::fs::write(temp.path().join("libfake.so"), "#!/bin/sh").unwrap();

    let manager = OperationManager::initialize(temp.path(), loader()).unwrap();

    // One controller per operation over all valid modules
    assert_eq!(manager.len(), 3);
    assert_eq!(manager.contexts().len(), 2);
    for context in manager.contexts() {
        assert_eq!(
            context.state(),
            ContextState::Loaded {
                active: context.controllers().len()
            }
        );
        assert_eq!(context.identity().fingerprint.len(), 64);
    }

    // Controllers of one module stay contiguous and in registration order
    let names: Vec<_> = manager.controllers().iter().map(|c| c.name()).collect();
    let stats = names.iter().position(|n| *n == "Character Count").unwrap();
    assert_eq!(names[stats + 1], "Word Count");
}

#[test]
fn test_unloadable_module_does_not_stop_discovery() {
    let temp = TempDir::new().unwrap();
    write_module(temp.path(), "libsearch_replace.so");
    write_module(temp.path(), "libstatistics.so");
    write_module(temp.path(), "libunknown.so");

    let loader = loader();
    loader.fail_loads("statistics", Some("corrupt image"));

    let manager = OperationManager::initialize(temp.path(), loader).unwrap();
    assert_eq!(manager.len(), 1);
    assert_eq!(manager.controllers()[0].name(), "Replace");
}

#[test]
fn test_sidecar_manifest_renames_module() {
    let temp = TempDir::new().unwrap();
    write_module(temp.path(), "libsr.so");
    std::fs::write(
        temp.path().join("libsr.toml"),
        "[module]\nname = \"search_replace\"\nversion = \"1.2.0\"\ndescription = \"Find and replace\"\n",
    )
    .unwrap();

    let manager = OperationManager::initialize(temp.path(), loader()).unwrap();
    assert_eq!(manager.len(), 1);
    let identity = manager.contexts()[0].identity();
    assert_eq!(identity.to_string(), "search_replace@1.2.0");
    assert_eq!(identity.description.as_deref(), Some("Find and replace"));
}

#[test]
fn test_operations_path_must_be_directory() {
    let temp = TempDir::new().unwrap();
    let file = temp.path().join("operations");
    std::fs::write(&file, "").unwrap();

    let err = OperationManager::initialize(&file, loader()).unwrap_err();
    assert!(matches!(err, PluginError::Config { .. }));
}

#[test]
fn test_disabled_list_and_menus() {
    let temp = TempDir::new().unwrap();
    write_module(temp.path(), "libstatistics.so");

    let loader = loader();
    let manager = OperationManager::initialize(temp.path(), loader.clone()).unwrap();
    manager.apply_disabled(&["Character Count".to_string(), "Word Count".to_string()]);

    assert_eq!(manager.contexts()[0].state(), ContextState::Unloaded);
    assert_eq!(loader.live("statistics"), 0);

    let bar = MenuBar::build(manager.controllers());
    let labels: Vec<_> = bar
        .menu(PLUGINS_MENU)
        .unwrap()
        .entries
        .iter()
        .map(|e| e.label.clone())
        .collect();
    assert_eq!(labels, vec!["Enable Character Count", "Enable Word Count"]);
}
