// src/core/profile.rs

//! Resolves which `.rconfig` profile is active and extracts the RCON
//! connection parameters from it.

use crate::core::RelayError;
use crate::core::rconfig::{self, ConfigDocument};
use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// Name of the selector document inside the configuration directory.
pub const SELECTOR_FILE: &str = "config.rconfig";
/// Profile used when the selector names nothing usable.
pub const DEFAULT_PROFILE: &str = "login.rconfig";

/// Typed connection parameters for the RCON session.
#[derive(Clone, PartialEq, Eq)]
pub struct ConnectionParams {
    pub host: String,
    pub port: u16,
    pub password: String,
}

impl ConnectionParams {
    /// Builds parameters from a parsed profile document.
    ///
    /// Requires `ip`, `port` and `password`. The port must be an integer
    /// in `1..=65535`.
    pub fn from_document(doc: &ConfigDocument) -> Result<Self, RelayError> {
        let host = require(doc, "ip")?;
        let raw_port = require(doc, "port")?;
        let password = doc
            .get("password")
            .ok_or_else(|| RelayError::MissingConfigKey("password".to_string()))?;

        let port = match raw_port.parse::<u16>() {
            Ok(p) if p != 0 => p,
            _ => return Err(RelayError::InvalidPort(raw_port.to_string())),
        };

        Ok(Self {
            host: host.to_string(),
            port,
            password: password.to_string(),
        })
    }

    /// The `host:port` address of the RCON endpoint.
    pub fn addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

// The password never shows up in logs.
impl fmt::Debug for ConnectionParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConnectionParams")
            .field("host", &self.host)
            .field("port", &self.port)
            .field("password", &"<redacted>")
            .finish()
    }
}

fn require<'a>(doc: &'a ConfigDocument, key: &str) -> Result<&'a str, RelayError> {
    doc.get(key)
        .filter(|v| !v.is_empty())
        .ok_or_else(|| RelayError::MissingConfigKey(key.to_string()))
}

/// The result of resolving the active profile.
#[derive(Debug, Clone)]
pub struct ResolvedProfile {
    /// File name of the profile that was loaded.
    pub profile: String,
    pub path: PathBuf,
    pub params: ConnectionParams,
}

/// Picks the active profile inside `config_dir` and loads its connection parameters.
///
/// The selector's `selected` key names the profile file. A missing selector,
/// a missing key, a name that is not a plain file name, or a name whose file
/// does not exist all fall back to [`DEFAULT_PROFILE`]. Failing to read the
/// final profile, or an invalid profile, is an error.
pub fn resolve(config_dir: &Path) -> Result<ResolvedProfile, RelayError> {
    let profile = select_profile(config_dir)?;
    let path = config_dir.join(&profile);
    let doc = read_document(&path)?;
    let params = ConnectionParams::from_document(&doc)?;
    info!(
        "Loaded RCON profile '{}' targeting {}:{}",
        profile, params.host, params.port
    );
    Ok(ResolvedProfile {
        profile,
        path,
        params,
    })
}

/// Determines the profile file name without loading it.
pub fn select_profile(config_dir: &Path) -> Result<String, RelayError> {
    let selector_path = config_dir.join(SELECTOR_FILE);
    let selected = if selector_path.is_file() {
        let selector = read_document(&selector_path)?;
        selector.get("selected").map(str::to_string)
    } else {
        warn!(
            "Selector document '{}' not found. Using default profile.",
            selector_path.display()
        );
        None
    };

    let profile = match selected {
        Some(name) if !is_plain_file_name(&name) => {
            warn!(
                "Selected profile '{}' is not a plain file name. Falling back to '{}'.",
                name, DEFAULT_PROFILE
            );
            DEFAULT_PROFILE.to_string()
        }
        Some(name) if config_dir.join(&name).is_file() => name,
        Some(name) => {
            warn!(
                "Selected profile '{}' does not exist. Falling back to '{}'.",
                name, DEFAULT_PROFILE
            );
            DEFAULT_PROFILE.to_string()
        }
        None => {
            debug!("No profile selected. Using '{}'.", DEFAULT_PROFILE);
            DEFAULT_PROFILE.to_string()
        }
    };
    Ok(profile)
}

fn read_document(path: &Path) -> Result<ConfigDocument, RelayError> {
    let raw = fs::read(path).map_err(|e| RelayError::ConfigRead {
        path: path.display().to_string(),
        reason: e.to_string(),
    })?;
    let (doc, skipped) = rconfig::parse_with_diagnostics(
        std::str::from_utf8(&raw).map_err(|_| RelayError::NonTextualConfig)?,
    );
    for line in skipped {
        debug!(
            "Skipped line {} of '{}': {:?}",
            line.line_number,
            path.display(),
            line.reason
        );
    }
    Ok(doc)
}

fn is_plain_file_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\'])
        && Path::new(name).file_name().is_some_and(|f| f == name)
}
