//! CLI settings.
//!
//! Loaded from an optional TOML file (default
//! `<config dir>/hourglass/config.toml`) with `HOURGLASS_*` environment
//! variables layered on top. Nested keys use a double underscore, e.g.
//! `HOURGLASS_PROFILES__STRICT__BURN_FACTOR=4`.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, anyhow};
use serde::{Deserialize, Serialize};

use hourglass_core::policy::VerifyProfile;

/// Settings for the `hourglass` command.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Profile used when a command does not name one.
    pub profile: String,
    /// Custom profiles; a name here shadows a built-in profile.
    pub profiles: BTreeMap<String, VerifyProfile>,
    /// Number of keys derived from the seed.
    pub key_count: u32,
    /// Log filter used when `RUST_LOG` is unset (e.g. "info", "hourglass_wallet=debug").
    pub log_level: String,
    /// "json" for structured logs, anything else for text.
    pub log_format: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile: "user".to_string(),
            profiles: BTreeMap::new(),
            key_count: 10,
            log_level: "warn".to_string(),
            log_format: "text".to_string(),
        }
    }
}

impl Settings {
    /// Default settings file location, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("hourglass").join("config.toml"))
    }

    /// Load settings from `path` (or the default location) and the environment.
    ///
    /// A missing file is not an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut builder = ::config::Config::builder();
        if let Some(path) = path.map(Path::to_path_buf).or_else(Self::default_path) {
            builder = builder.add_source(::config::File::from(path).required(false));
        }
        builder
            .add_source(
                ::config::Environment::with_prefix("HOURGLASS")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .context("Failed to read settings")?
            .try_deserialize()
            .context("Invalid settings")
    }

    /// Resolve a profile by name, falling back to the configured default.
    pub fn resolve_profile(&self, name: Option<&str>) -> Result<VerifyProfile> {
        let name = name.unwrap_or(&self.profile);
        let profile = self
            .profiles
            .get(name)
            .copied()
            .or_else(|| VerifyProfile::by_name(name))
            .ok_or_else(|| anyhow!("Unknown profile: {name}"))?;
        profile
            .validate()
            .with_context(|| format!("Invalid profile: {name}"))?;
        Ok(profile)
    }
}
