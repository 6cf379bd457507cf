//! Workspace configuration (`kls.toml`) and logging setup.
//!
//! ```toml
//! [logging]
//! level = "info"
//!
//! [scripts]
//! enabled = false
//! build_scripts_enabled = false
//!
//! [exclusions]
//! patterns = ["generated"]
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

mod diagnostics;
mod logging;

pub use diagnostics::ConfigDiagnostics;
pub use logging::{global_log_buffer, init_tracing, LogBuffer, LoggingConfig};

/// Environment variable naming an explicit config file (absolute, or relative
/// to the workspace root).
pub const KLS_CONFIG_ENV_VAR: &str = "KLS_CONFIG_PATH";

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct KlsConfig {
    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub scripts: ScriptsConfig,

    #[serde(default)]
    pub exclusions: ExclusionsConfig,
}

/// Whether Kotlin scripts belong to the workspace.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScriptsConfig {
    /// When false, `*.kts` files are excluded.
    #[serde(default)]
    pub enabled: bool,

    /// When false, `*.gradle.kts` files are excluded.
    #[serde(default)]
    pub build_scripts_enabled: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionsConfig {
    /// Extra glob patterns, matched against each path component.
    #[serde(default)]
    pub patterns: Vec<String>,
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse toml config: {0}")]
    Toml(String),
}

impl From<toml::de::Error> for ConfigError {
    fn from(err: toml::de::Error) -> Self {
        // The `Display` form quotes the offending source line; keep only the message.
        ConfigError::Toml(err.message().to_owned())
    }
}

impl KlsConfig {
    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        Ok(Self::load_from_path_with_diagnostics(path)?.0)
    }

    /// Loads a config file and reports unknown keys. Unknown keys are logged
    /// and otherwise ignored.
    pub fn load_from_path_with_diagnostics(
        path: impl AsRef<Path>,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let (config, diagnostics) = Self::load_from_str_with_diagnostics(&text)?;
        for key in &diagnostics.unknown_keys {
            tracing::warn!(
                target: "kls.config",
                path = %path.display(),
                key = %key,
                "unknown config key"
            );
        }
        Ok((config, diagnostics))
    }

    pub fn load_from_str_with_diagnostics(
        text: &str,
    ) -> Result<(Self, ConfigDiagnostics), ConfigError> {
        let (config, unknown_keys) =
            diagnostics::deserialize_toml_with_unknown_keys::<KlsConfig>(text)?;
        Ok((config, ConfigDiagnostics { unknown_keys }))
    }
}

/// Finds the config file of a workspace root.
///
/// Search order: `KLS_CONFIG_PATH`, then `kls.toml` and `.kls.toml` in
/// `workspace_root`.
pub fn discover_config_path(workspace_root: &Path) -> Option<PathBuf> {
    if let Some(value) = std::env::var_os(KLS_CONFIG_ENV_VAR) {
        let candidate = PathBuf::from(value);
        let path = if candidate.is_absolute() {
            candidate
        } else {
            workspace_root.join(candidate)
        };
        return Some(path);
    }

    ["kls.toml", ".kls.toml"]
        .into_iter()
        .map(|name| workspace_root.join(name))
        .find(|path| path.is_file())
}

/// Loads the config of a workspace root, or the defaults when there is none.
pub fn load_for_workspace(
    workspace_root: &Path,
) -> Result<(KlsConfig, Option<PathBuf>), ConfigError> {
    let Some(path) = discover_config_path(workspace_root) else {
        return Ok((KlsConfig::default(), None));
    };
    let config = KlsConfig::load_from_path(&path)?;
    tracing::debug!(target: "kls.config", path = %path.display(), "loaded config");
    Ok((config, Some(path)))
}

/// Reloads the config of a workspace root and reports whether it changed.
pub fn reload_for_workspace(
    workspace_root: &Path,
    previous: &KlsConfig,
    previous_path: Option<&Path>,
) -> Result<(KlsConfig, Option<PathBuf>, bool), ConfigError> {
    let (config, path) = load_for_workspace(workspace_root)?;
    let changed = path.as_deref() != previous_path || &config != previous;
    Ok((config, path, changed))
}
