//! Sound configuration: loads optional ~/.adaptune/sound.yaml.
//!
//! Every field has a default, so a partial file is fine. Out-of-range values
//! are clamped on load rather than rejected.

use std::io;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::audio::{DeviceOptions, DEFAULT_MAX_VOICES};
use crate::music::conductor::clamp_unit;
use crate::music::theory::wrap_theme_index;
use crate::music::Volumes;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config io error: {0}")]
    Io(#[from] io::Error),
    #[error("config parse error: {0}")]
    Parse(#[from] serde_yaml::Error),
}

/// Sound settings loaded from YAML.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SoundConfig {
    /// Master switch. When off, nothing is played until toggled on.
    pub enabled: bool,
    pub music_enabled: bool,
    pub master_volume: f64,
    pub music_volume: f64,
    pub sfx_volume: f64,
    /// Initial theme index, wrapped into the theme table.
    pub theme: usize,
    /// Fixed RNG seed for reproducible music. None = seeded from entropy.
    pub seed: Option<u64>,
    /// Override the device sample rate.
    pub sample_rate: Option<u32>,
    /// Cap on simultaneously rendering voices.
    pub max_voices: usize,
}

impl Default for SoundConfig {
    fn default() -> Self {
        let volumes = Volumes::default();
        Self {
            enabled: true,
            music_enabled: true,
            master_volume: volumes.master,
            music_volume: volumes.music,
            sfx_volume: volumes.sfx,
            theme: 0,
            seed: None,
            sample_rate: None,
            max_voices: DEFAULT_MAX_VOICES,
        }
    }
}

impl SoundConfig {
    /// Load from the standard path (~/.adaptune/sound.yaml), falling back to
    /// defaults when the file is missing or unreadable.
    pub fn load() -> Self {
        match Self::load_from(&default_config_path()) {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!("ignoring sound config: {e}");
                Self::default()
            }
        }
    }

    /// Load from `path`. A missing file yields the defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Self = serde_yaml::from_str(&content)?;
        Ok(config.clamped())
    }

    /// Save to `path`, creating parent directories as needed.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let yaml = serde_yaml::to_string(self)?;
        std::fs::write(path, yaml)?;
        Ok(())
    }

    /// Copy with every value pulled into its valid range.
    pub fn clamped(mut self) -> Self {
        self.master_volume = clamp_unit(self.master_volume);
        self.music_volume = clamp_unit(self.music_volume);
        self.sfx_volume = clamp_unit(self.sfx_volume);
        self.theme = wrap_theme_index(self.theme);
        self.sample_rate = self.sample_rate.filter(|&sr| sr > 0);
        self.max_voices = self.max_voices.clamp(1, 4096);
        self
    }

    pub fn volumes(&self) -> Volumes {
        Volumes::new(self.master_volume, self.music_volume, self.sfx_volume)
    }

    pub fn device_options(&self) -> DeviceOptions {
        DeviceOptions {
            sample_rate: self.sample_rate,
            max_voices: self.max_voices,
        }
    }
}

/// ~/.adaptune/sound.yaml, or ./.adaptune/sound.yaml without a home directory.
pub fn default_config_path() -> PathBuf {
    let mut path = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
    path.push(".adaptune");
    path.push("sound.yaml");
    path
}
