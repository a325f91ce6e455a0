//! Configuration loading for chatmem.
//!
//! The core treats configuration as opaque constants supplied at startup:
//! where the history database lives and which model new users start on.
//! Values come from `~/.chatmem/config.toml`, with `${VAR}` environment
//! expansion in path values and an optional Docker-style secret file for
//! deployments that mount credentials under `/run/secrets`.
//!
//! Loading is lenient: a missing or unparsable file yields defaults and a
//! warning, never an error. Validation of the values themselves (e.g. the
//! model name) happens in the domain types.

use std::env;
use std::io;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use chatmem_types::ChatModel;

#[derive(Debug, Default, Deserialize)]
pub struct ChatmemConfig {
    pub app: Option<AppConfig>,
    pub storage: Option<StorageConfig>,
}

#[derive(Debug, Default, Deserialize)]
pub struct AppConfig {
    /// Model assigned to users created lazily on first contact.
    pub default_model: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct StorageConfig {
    /// Path to the SQLite history database. Supports `${VAR}` expansion.
    pub database_path: Option<String>,
}

impl ChatmemConfig {
    /// Load the config file, if present and parsable.
    #[must_use]
    pub fn load() -> Option<Self> {
        let path = config_path()?;
        Self::load_from(&path)
    }

    fn load_from(path: &Path) -> Option<Self> {
        if !path.exists() {
            return None;
        }

        let content = match std::fs::read_to_string(path) {
            Ok(content) => content,
            Err(err) => {
                tracing::warn!("Failed to read config at {:?}: {}", path, err);
                return None;
            }
        };

        match toml::from_str(&content) {
            Ok(config) => Some(config),
            Err(err) => {
                tracing::warn!("Failed to parse config at {:?}: {}", path, err);
                None
            }
        }
    }

    /// The model for newly created users.
    ///
    /// An unknown configured name falls back to [`ChatModel::default`] with a
    /// warning rather than failing startup.
    #[must_use]
    pub fn default_model(&self) -> ChatModel {
        let Some(raw) = self.app.as_ref().and_then(|app| app.default_model.as_deref()) else {
            return ChatModel::default();
        };

        match ChatModel::parse(raw) {
            Ok(model) => model,
            Err(err) => {
                tracing::warn!("Ignoring configured default model: {}", err);
                ChatModel::default()
            }
        }
    }

    /// Where the history database lives, after `${VAR}` expansion.
    ///
    /// Defaults to `~/.chatmem/history.db` when unconfigured.
    #[must_use]
    pub fn database_path(&self) -> Option<PathBuf> {
        let configured = self
            .storage
            .as_ref()
            .and_then(|storage| storage.database_path.as_deref());

        match configured {
            Some(raw) => Some(PathBuf::from(expand_env_vars(raw))),
            None => default_database_path(),
        }
    }
}

/// Path of the config file (`~/.chatmem/config.toml`).
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".chatmem").join("config.toml"))
}

fn default_database_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(".chatmem").join("history.db"))
}

/// Read a mounted secret file (e.g. `/run/secrets/DATABASE_URL`), trimming
/// the trailing newline most secret stores append.
pub fn read_secret(path: impl AsRef<Path>) -> io::Result<String> {
    let content = std::fs::read_to_string(path)?;
    Ok(content.trim().to_string())
}

/// Expand `${VAR}` references against the process environment.
///
/// Unset variables expand to the empty string; malformed references are
/// copied through verbatim.
#[must_use]
pub fn expand_env_vars(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    let mut i = 0;

    while i < value.len() {
        if value[i..].starts_with("${") {
            let start = i + 2;
            if let Some(end_rel) = value[start..].find('}') {
                let end = start + end_rel;
                let var = &value[start..end];
                if !var.is_empty() {
                    let replacement = env::var(var).unwrap_or_default();
                    out.push_str(&replacement);
                }
                i = end + 1;
                continue;
            }
        }

        let ch = value[i..].chars().next().unwrap_or_default();
        out.push(ch);
        i += ch.len_utf8();
    }

    out
}
