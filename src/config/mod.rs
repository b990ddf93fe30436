// Copyright (c) 2026 Robert L. Snyder, Sierra Vista, AZ
// Licensed under the MIT License. See LICENSE file in the project root for details.

//! Session configuration.
//!
//! Timing constants for the settle delay and error banner, the artifact
//! filename and the initial master volume. Every field has a default, so
//! an empty YAML or TOML document is a valid configuration.

use std::fs;
use std::path::Path;
use std::time::Duration;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

/// Configuration for a capture session
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SessionConfig {
    /// Wait after a stop before the encoder is finished (ms)
    #[serde(default = "default_settle_delay_ms")]
    pub settle_delay_ms: u64,
    /// How long the error banner stays visible (ms)
    #[serde(default = "default_banner_duration_ms")]
    pub banner_duration_ms: u64,
    /// Suggested filename for every artifact
    #[serde(default = "default_artifact_filename")]
    pub artifact_filename: String,
    /// Banner text when a save finds no recording
    #[serde(default = "default_no_recording_message")]
    pub no_recording_message: String,
    /// Master volume applied on every load (dB)
    #[serde(default)]
    pub initial_volume_db: f64,
}

fn default_settle_delay_ms() -> u64 {
    2000
}
fn default_banner_duration_ms() -> u64 {
    5000
}
fn default_artifact_filename() -> String {
    "recording.webm".to_string()
}
fn default_no_recording_message() -> String {
    "No recording available.".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            settle_delay_ms: default_settle_delay_ms(),
            banner_duration_ms: default_banner_duration_ms(),
            artifact_filename: default_artifact_filename(),
            no_recording_message: default_no_recording_message(),
            initial_volume_db: 0.0,
        }
    }
}

impl SessionConfig {
    /// Load a configuration file, picking the format from its extension
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let config = match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => Self::from_toml(&contents)?,
            _ => Self::from_yaml(&contents)?,
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a configuration from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        // serde_yaml treats an empty document as unit, not an empty map
        if yaml.trim().is_empty() {
            return Ok(Self::default());
        }
        serde_yaml::from_str(yaml).context("Failed to parse YAML configuration")
    }

    /// Parse a configuration from TOML string
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse TOML configuration")
    }

    /// Serialize to YAML string
    pub fn to_yaml(&self) -> Result<String> {
        serde_yaml::to_string(self).context("Failed to serialize configuration to YAML")
    }

    /// Save configuration to a YAML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let yaml = self.to_yaml()?;
        fs::write(path.as_ref(), yaml)
            .with_context(|| format!("Failed to write config file: {:?}", path.as_ref()))
    }

    /// Reject values the session cannot work with
    pub fn validate(&self) -> Result<()> {
        if self.artifact_filename.trim().is_empty() {
            bail!("artifact_filename must not be empty");
        }
        if !self.initial_volume_db.is_finite() {
            bail!("initial_volume_db must be finite, got {}", self.initial_volume_db);
        }
        Ok(())
    }

    /// Settle delay as a duration
    pub fn settle_delay(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    /// Banner display time as a duration
    pub fn banner_duration(&self) -> Duration {
        Duration::from_millis(self.banner_duration_ms)
    }
}
