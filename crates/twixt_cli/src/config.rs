//! Twixt configuration file handling

use anyhow::{Context, Result};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::str::FromStr;
use twixt_animation::{Easing, Repeat, Tween, DEFAULT_DURATION_MS};
use twixt_core::{Properties, SharedProperties, Value};

/// Config file picked up from the working directory when none is given
pub const DEFAULT_CONFIG_FILE: &str = "twixt.toml";

/// Top-level Twixt configuration (twixt.toml)
#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TwixtConfig {
    #[serde(default)]
    pub simulation: SimulationConfig,
    #[serde(default, rename = "tween")]
    pub tweens: Vec<TweenConfig>,
}

/// How frames are rendered on stdout
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize, Serialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Text,
    Json,
}

/// Simulation settings
#[derive(Debug, Deserialize, Serialize)]
pub struct SimulationConfig {
    /// Frames per simulated second
    #[serde(default = "default_fps")]
    pub fps: u32,
    /// Stop after this many frames even if tweens are still running
    #[serde(default = "default_max_frames")]
    pub max_frames: u64,
    #[serde(default)]
    pub format: OutputFormat,
}

fn default_fps() -> u32 {
    60
}

fn default_max_frames() -> u64 {
    600
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            fps: default_fps(),
            max_frames: default_max_frames(),
            format: OutputFormat::default(),
        }
    }
}

impl SimulationConfig {
    /// Milliseconds between frames
    pub fn frame_ms(&self) -> f64 {
        1000.0 / f64::from(self.fps)
    }
}

/// One tween to simulate
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TweenConfig {
    /// Label used in output, defaults to `tween<N>`
    #[serde(default)]
    pub name: Option<String>,
    /// Initial target fields
    #[serde(default)]
    pub from: IndexMap<String, Value>,
    /// End values
    #[serde(default)]
    pub to: IndexMap<String, Value>,
    #[serde(default = "default_duration")]
    pub duration: f64,
    #[serde(default)]
    pub delay: f64,
    #[serde(default)]
    pub repeat: RepeatSetting,
    #[serde(default)]
    pub yoyo: bool,
    #[serde(default = "default_easing")]
    pub easing: String,
}

fn default_duration() -> f64 {
    DEFAULT_DURATION_MS
}

fn default_easing() -> String {
    Easing::Linear.to_string()
}

impl Default for TweenConfig {
    fn default() -> Self {
        Self {
            name: None,
            from: IndexMap::new(),
            to: IndexMap::new(),
            duration: default_duration(),
            delay: 0.0,
            repeat: RepeatSetting::default(),
            yoyo: false,
            easing: default_easing(),
        }
    }
}

impl TweenConfig {
    /// A fresh target holding the `from` fields
    pub fn target(&self) -> SharedProperties {
        Properties::from_values(self.from.iter().map(|(k, v)| (k.clone(), v.clone()))).into_shared()
    }

    /// Build an idle tween over `target`
    pub fn build(&self, target: SharedProperties) -> Result<Tween> {
        let easing = Easing::from_str(&self.easing).context("Invalid tween easing")?;
        let repeat = self.repeat.to_repeat()?;

        Ok(Tween::new(target)
            .to(self.to.iter().map(|(k, v)| (k.clone(), v.clone())), Some(self.duration))
            .delay(self.delay)
            .repeat(repeat)
            .yoyo(self.yoyo)
            .easing(easing))
    }

    /// Output label, `index` numbers unnamed tweens
    pub fn label(&self, index: usize) -> String {
        self.name.clone().unwrap_or_else(|| format!("tween{index}"))
    }
}

/// Repeat count as written in config: a number or `"infinite"`
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum RepeatSetting {
    Count(u32),
    Keyword(String),
}

impl Default for RepeatSetting {
    fn default() -> Self {
        RepeatSetting::Count(0)
    }
}

impl RepeatSetting {
    pub fn to_repeat(&self) -> Result<Repeat> {
        match self {
            RepeatSetting::Count(n) => Ok(Repeat::Count(*n)),
            RepeatSetting::Keyword(word) if word.eq_ignore_ascii_case("infinite") => {
                Ok(Repeat::Infinite)
            }
            RepeatSetting::Keyword(word) => {
                anyhow::bail!("Invalid repeat '{}'. Use a count or \"infinite\"", word)
            }
        }
    }
}

impl FromStr for RepeatSetting {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s.trim().parse::<u32>() {
            Ok(n) => RepeatSetting::Count(n),
            Err(_) => RepeatSetting::Keyword(s.trim().to_string()),
        })
    }
}

impl TwixtConfig {
    /// Load configuration from a file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;

        let config: TwixtConfig = toml::from_str(&content)
            .with_context(|| format!("Failed to parse {}", path.display()))?;

        config.validate()?;
        Ok(config)
    }

    /// Load `path` if given, else `twixt.toml` from the working directory if
    /// present, else defaults
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => Self::load(path),
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::load(Path::new(DEFAULT_CONFIG_FILE))
            }
            None => Ok(Self::default()),
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.simulation.fps == 0 {
            anyhow::bail!("simulation.fps must be at least 1");
        }
        for (index, tween) in self.tweens.iter().enumerate() {
            if !tween.duration.is_finite() || !tween.delay.is_finite() {
                anyhow::bail!(
                    "Tween {} needs a finite duration and delay",
                    tween.label(index)
                );
            }
        }
        Ok(())
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).context("Failed to serialize config")
    }
}
