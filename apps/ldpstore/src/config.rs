//! # Configuration Loading
//!
//! Repository settings come from an optional TOML file with a `[repository]`
//! table, then from environment overrides:
//!
//! ```toml
//! [repository]
//! referential_integrity = "strict"
//! messaging = true
//! default_user = "admin"
//! ```
//!
//! - `LDPSTORE_REFERENTIAL_INTEGRITY` = `off` | `lenient` | `strict`
//! - `LDPSTORE_MESSAGING` = `true` | `false` (also `1`/`0`, `yes`/`no`, `on`/`off`)

use ldpstore_core::{LdpError, RefIntMode, RepoConfig};
use serde::Deserialize;
use std::path::Path;

pub const ENV_REFERENTIAL_INTEGRITY: &str = "LDPSTORE_REFERENTIAL_INTEGRITY";
pub const ENV_MESSAGING: &str = "LDPSTORE_MESSAGING";

/// Config file default, looked up next to the database when no path is given.
pub const CONFIG_FILE: &str = "ldpstore.toml";

#[derive(Debug, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
struct ConfigFile {
    repository: RepoConfig,
}

/// Parse the TOML text of a config file.
pub fn parse_config(text: &str) -> Result<RepoConfig, LdpError> {
    toml::from_str::<ConfigFile>(text)
        .map(|file| file.repository)
        .map_err(|e| LdpError::Config(e.to_string()))
}

/// Load settings from `path` (defaults if `None`), then apply the process
/// environment.
pub fn load_config(path: Option<&Path>) -> Result<RepoConfig, LdpError> {
    let config = match path {
        Some(p) => {
            let text = std::fs::read_to_string(p).map_err(|e| {
                LdpError::Config(format!("cannot read {}: {e}", p.display()))
            })?;
            parse_config(&text)?
        }
        None => RepoConfig::default(),
    };
    apply_env_overrides(config, |key| std::env::var(key).ok())
}

/// Apply environment overrides read through `lookup`.
pub fn apply_env_overrides(
    mut config: RepoConfig,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<RepoConfig, LdpError> {
    if let Some(value) = lookup(ENV_REFERENTIAL_INTEGRITY) {
        config.referential_integrity = parse_ref_int(&value)?;
    }
    if let Some(value) = lookup(ENV_MESSAGING) {
        config.messaging = parse_flag(ENV_MESSAGING, &value)?;
    }
    Ok(config)
}

fn parse_ref_int(value: &str) -> Result<RefIntMode, LdpError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "off" => Ok(RefIntMode::Off),
        "lenient" => Ok(RefIntMode::Lenient),
        "strict" => Ok(RefIntMode::Strict),
        other => Err(LdpError::Config(format!(
            "{ENV_REFERENTIAL_INTEGRITY}: expected off, lenient or strict, got {other:?}"
        ))),
    }
}

fn parse_flag(key: &str, value: &str) -> Result<bool, LdpError> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(LdpError::Config(format!("{key}: not a boolean: {other:?}"))),
    }
}
