//! Operations directory scanning
//!
//! Finds module libraries and resolves their identity without loading them.
//! Enumeration order is whatever the filesystem returns, which differs
//! between platforms; callers must not rely on it being sorted.

use super::manifest::{ModuleManifest, is_valid_name};
use super::types::{ModuleIdentity, PluginError};
use sha2::{Digest, Sha256};
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, warn};

/// Shared object header magics: ELF, Mach-O (32/64-bit, both byte orders), fat Mach-O, PE
const LIBRARY_MAGICS: &[&[u8]] = &[
    b"\x7fELF",
    &[0xfe, 0xed, 0xfa, 0xce],
    &[0xce, 0xfa, 0xed, 0xfe],
    &[0xfe, 0xed, 0xfa, 0xcf],
    &[0xcf, 0xfa, 0xed, 0xfe],
    &[0xca, 0xfe, 0xba, 0xbe],
    &[0xbe, 0xba, 0xfe, 0xca],
    b"MZ",
];

pub struct ModuleScanner;

impl ModuleScanner {
    /// Scan a directory (non-recursively) for valid modules
    ///
    /// A missing directory yields an empty list. Files that fail validation
    /// are skipped and logged at debug level.
    ///
    /// # Errors
    ///
    /// Returns `PluginError::Config` if the path is not a directory and
    /// `PluginError::Io` if it cannot be read.
    pub fn scan(dir: &Path) -> Result<Vec<ModuleIdentity>, PluginError> {
        if !dir.exists() {
            debug!("Operations directory does not exist, skipping: {}", dir.display());
            return Ok(Vec::new());
        }

        if !dir.is_dir() {
            return Err(PluginError::Config {
                message: format!("operations path is not a directory: {}", dir.display()),
            });
        }

        let entries = std::fs::read_dir(dir).map_err(|source| PluginError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut modules = Vec::new();
        for entry in entries {
            let entry = match entry {
                Ok(e) => e,
                Err(e) => {
                    warn!("Failed to read directory entry: {}", e);
                    continue;
                }
            };

            let path = entry.path();
            if !Self::is_module_library(&path) {
                continue;
            }

            match Self::validate(&path) {
                Ok(identity) => {
                    debug!("Found module {} at {}", identity, path.display());
                    modules.push(identity);
                }
                Err(e) => debug!("Skipping {}: {}", path.display(), e),
            }
        }

        Ok(modules)
    }

    /// Check if a path is a candidate module based on file extension
    pub fn is_module_library(path: &Path) -> bool {
        if !path.is_file() {
            return false;
        }

        matches!(
            path.extension().and_then(|e| e.to_str()),
            Some("so") | Some("dylib") | Some("dll")
        )
    }

    /// Resolve a module's identity without loading it
    pub fn validate(path: &Path) -> Result<ModuleIdentity, PluginError> {
        if !has_library_header(path)? {
            return Err(PluginError::ModuleValidation {
                path: path.to_path_buf(),
                message: "not a shared library".to_string(),
            });
        }

        let manifest = ModuleManifest::load_sidecar(path)?;
        let (name, version, description) = match manifest {
            Some(manifest) => (
                manifest.module.name,
                manifest.module.version,
                manifest.module.description,
            ),
            None => (name_from_file(path)?, None, None),
        };

        let path = path.canonicalize().map_err(|source| PluginError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let fingerprint = fingerprint_file(&path)?;

        Ok(ModuleIdentity {
            name,
            version,
            description,
            path,
            fingerprint,
        })
    }
}

/// Lower-case hex SHA-256 of a file
pub fn fingerprint_file(path: &Path) -> Result<String, PluginError> {
    let io_err = |source| PluginError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut file = File::open(path).map_err(io_err)?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(io_err)?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }

    Ok(hasher
        .finalize()
        .iter()
        .map(|b| format!("{b:02x}"))
        .collect())
}

fn has_library_header(path: &Path) -> Result<bool, PluginError> {
    let mut header = [0u8; 4];
    let mut file = File::open(path).map_err(|source| PluginError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let mut filled = 0;
    while filled < header.len() {
        match file.read(&mut header[filled..]) {
            Ok(0) => break,
            Ok(n) => filled += n,
            Err(source) => {
                return Err(PluginError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        }
    }

    let header = &header[..filled];
    Ok(LIBRARY_MAGICS.iter().any(|magic| header.starts_with(magic)))
}

/// Module name from the file stem, without the `lib` prefix used on Unix
fn name_from_file(path: &Path) -> Result<String, PluginError> {
    let stem = path
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or_default();
    let unix_library = matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("so") | Some("dylib")
    );
    let stem = match stem.strip_prefix("lib") {
        Some(rest) if unix_library && !rest.is_empty() => rest,
        _ => stem,
    };

    if !is_valid_name(stem) {
        return Err(PluginError::ModuleValidation {
            path: path.to_path_buf(),
            message: format!("cannot derive a module name from '{stem}'"),
        });
    }
    Ok(stem.to_string())
}
