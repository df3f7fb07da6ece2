use std::{fs, path::Path};

use serde::Deserialize;
use thiserror::Error;

// ─── Fixed hardware / engine constants ──────────────────────────────────────

pub const SAMPLE_RATE: f32 = 48_000.0;
/// Sample period.
pub const TS: f32 = 1.0 / SAMPLE_RATE;

/// Chorus delay line length in samples (29.17 ms at 48 kHz).
pub const DEPTH: usize = 1400;
/// Guard samples kept at both ends of the chorus line for the 4-tap kernel.
pub const MARGIN: usize = 6;

/// Longest echo delay in samples. The echo buffer holds two more.
pub const DELAYLINE_LEN: usize = 30_000;
pub const MIN_DELAY: usize = 250;
/// Echo delay-time nudge, in samples.
pub const DELTA_DELAY: usize = 20;

/// Interleaved 16-bit words in the hardware buffer.
pub const BUFF_LEN: usize = 1024;
pub const MAXVOL: u8 = 100;
pub const VOL: u8 = 70;

// ─── Runtime configuration ──────────────────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
  #[error("failed to read config {path}: {source}")]
  Io { path: String, #[source] source: std::io::Error },
  #[error("malformed config: {0}")]
  Parse(#[from] serde_json::Error),
  #[error("invalid config: {0}")]
  Invalid(String),
}

/// Initial state of one chorus/flanger channel.
#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChannelConfig {
  /// Base tap position, samples.
  pub delay: f32,
  /// LFO amplitude, samples.
  pub sweep: f32,
  /// LFO rate, Hz.
  pub rate: f32,
  pub feedback: f32,
  pub forward: f32,
  pub mix: f32,
  /// Initial LFO phase, radians.
  pub phase: f32,
}

impl ChannelConfig {
  pub const LEFT: Self = Self {
    delay: 240.0,
    sweep: 50.0,
    rate: 0.11,
    feedback: -0.2,
    forward: 0.5,
    mix: 0.5,
    phase: std::f32::consts::FRAC_PI_2,
  };
  pub const RIGHT: Self = Self { rate: 0.12, phase: 0.0, ..Self::LEFT };
}

impl Default for ChannelConfig {
  fn default() -> Self { Self::LEFT }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct ChorusConfig {
  pub left: ChannelConfig,
  pub right: ChannelConfig,
}

impl Default for ChorusConfig {
  fn default() -> Self { Self { left: ChannelConfig::LEFT, right: ChannelConfig::RIGHT } }
}

#[derive(Clone, Copy, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct EchoConfig {
  /// Write-to-read distance, samples.
  pub shift: usize,
  pub feedback: f32,
  /// One-pole coefficient in the loop: 0 = no filtering, near 1 = heavy.
  pub coefficient: f32,
}

impl Default for EchoConfig {
  fn default() -> Self { Self { shift: 13_000, feedback: 0.4, coefficient: 0.6 } }
}

#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(default)]
pub struct FxConfig {
  pub chorus: ChorusConfig,
  pub echo: EchoConfig,
  pub volume: u8,
  pub buff_len: usize,
  pub chorus_on: bool,
  pub echo_on: bool,
}

impl Default for FxConfig {
  fn default() -> Self {
    Self {
      chorus: ChorusConfig::default(),
      echo: EchoConfig::default(),
      volume: VOL,
      buff_len: BUFF_LEN,
      chorus_on: true,
      echo_on: true,
    }
  }
}

impl FxConfig {
  pub fn from_json(text: &str) -> Result<Self, ConfigError> {
    let cfg: FxConfig = serde_json::from_str(text)?;
    cfg.validate()?;
    Ok(cfg)
  }

  pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)
      .map_err(|source| ConfigError::Io { path: path.display().to_string(), source })?;
    let cfg = Self::from_json(&text)?;
    log::info!("loaded effect config from {}", path.display());
    Ok(cfg)
  }

  pub fn validate(&self) -> Result<(), ConfigError> {
    // 4 regions of interleaved stereo frames
    if self.buff_len == 0 || self.buff_len % 8 != 0 {
      return Err(ConfigError::Invalid(format!("buff_len {} must be a non-zero multiple of 8", self.buff_len)));
    }
    for (name, ch) in [("left", &self.chorus.left), ("right", &self.chorus.right)] {
      if !(0.0..DEPTH as f32).contains(&ch.delay) {
        return Err(ConfigError::Invalid(format!("chorus.{name}.delay {} outside [0, {DEPTH})", ch.delay)));
      }
    }
    let cap = DELAYLINE_LEN + 2;
    if self.echo.shift == 0 || self.echo.shift >= cap {
      return Err(ConfigError::Invalid(format!("echo.shift {} outside [1, {cap})", self.echo.shift)));
    }
    if !(0.0..1.0).contains(&self.echo.coefficient) {
      return Err(ConfigError::Invalid(format!("echo.coefficient {} outside [0, 1)", self.echo.coefficient)));
    }
    if self.volume > MAXVOL {
      return Err(ConfigError::Invalid(format!("volume {} above {MAXVOL}", self.volume)));
    }
    Ok(())
  }
}
