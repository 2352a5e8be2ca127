//! Project configuration discovery.
//!
//! A project is configured by `bblang.json` files placed next to, or above,
//! its sources. Every open file contributes the markers found in its
//! directory and each ancestor; all of them are folded into one
//! [`ProjectConfig`] together with the client's `bblang` settings section.

use bblang_core::{ExternalConstant, ExternalFunction, FileUri};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::error::ConfigError;

/// File name of a project configuration marker.
pub const CONFIG_FILE_NAME: &str = "bblang.json";

/// Section of the client settings read as configuration.
pub const SETTINGS_SECTION: &str = "bblang";

/// Contents of one `bblang.json`.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ConfigFile {
    /// Directories searched for `using` paths, relative to the file.
    pub extra_directories: Vec<String>,
    /// Files imported by every source file.
    pub additional_imports: Vec<String>,
    /// Host-supplied functions.
    pub external_functions: Vec<ExternalFunction>,
    /// Host-supplied constants.
    pub external_constants: Vec<ExternalConstant>,
}

/// Effective configuration of everything open.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProjectConfig {
    /// Directories searched for `using` paths.
    pub extra_directories: Vec<PathBuf>,
    /// Files imported by every source file.
    pub additional_imports: Vec<String>,
    /// Host-supplied functions.
    pub external_functions: Vec<ExternalFunction>,
    /// Host-supplied constants.
    pub external_constants: Vec<ExternalConstant>,
}

impl ProjectConfig {
    /// Fold a configuration file in. Relative directories are resolved
    /// against `base`.
    pub fn merge(&mut self, file: ConfigFile, base: Option<&Path>) {
        for directory in file.extra_directories {
            let directory = match base {
                Some(base) => base.join(directory),
                None => PathBuf::from(directory),
            };
            if !self.extra_directories.contains(&directory) {
                self.extra_directories.push(directory);
            }
        }
        for import in file.additional_imports {
            if !self.additional_imports.contains(&import) {
                self.additional_imports.push(import);
            }
        }
        for function in file.external_functions {
            if !self.external_functions.iter().any(|f| f.name == function.name) {
                self.external_functions.push(function);
            }
        }
        for constant in file.external_constants {
            if !self.external_constants.iter().any(|c| c.name == constant.name) {
                self.external_constants.push(constant);
            }
        }
    }
}

/// Read and parse one configuration file.
pub fn load_config_file(path: &Path) -> Result<ConfigFile, ConfigError> {
    let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Every `bblang.json` in the directory of `uri` and its ancestors, nearest
/// first.
pub fn search(uri: &FileUri) -> Vec<PathBuf> {
    let Some(path) = uri.to_file_path() else {
        return Vec::new();
    };
    path.ancestors()
        .skip(1)
        .map(|directory| directory.join(CONFIG_FILE_NAME))
        .filter(|marker| marker.is_file())
        .collect()
}

/// Build the effective configuration for the open `documents`.
///
/// Markers are deduplicated across documents. Unreadable or malformed
/// markers are logged and skipped.
pub fn discover<'a>(
    documents: impl IntoIterator<Item = &'a FileUri>,
    client_settings: &serde_json::Value,
) -> ProjectConfig {
    let mut markers: Vec<PathBuf> = Vec::new();
    for uri in documents {
        for marker in search(uri) {
            if !markers.contains(&marker) {
                markers.push(marker);
            }
        }
    }

    let mut config = ProjectConfig::default();
    for marker in &markers {
        match load_config_file(marker) {
            Ok(file) => {
                tracing::debug!("Loaded configuration {}", marker.display());
                config.merge(file, marker.parent());
            }
            Err(e) => tracing::warn!("Skipping configuration: {}", e),
        }
    }

    if let Some(section) = client_settings.get(SETTINGS_SECTION) {
        match serde_json::from_value::<ConfigFile>(section.clone()) {
            Ok(file) => config.merge(file, None),
            Err(e) => tracing::warn!("Ignoring invalid client settings: {}", e),
        }
    }

    config
}
