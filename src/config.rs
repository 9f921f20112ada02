use crate::error::{Error, Result};
use crate::params::{ParamValue, Parameter, MAX_COUNT};
use crate::tween::{Ease, TweenOptions, TweenSpec};
use crate::{CameraParams, GalaxyParams};
use log::warn;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
  /// Fixed RNG seed; unseeded when absent.
  pub seed: Option<u64>,
  pub galaxy: GalaxyParams,
  pub camera: CameraParams,
  pub animation: AnimationConfig,
  pub window: WindowConfig,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnimationConfig {
  /// Radians per second about the Y axis.
  pub rotation_speed: f32,
  pub tweens: Vec<TweenSpec>,
}

impl Default for AnimationConfig {
  fn default() -> Self {
    Self {
      rotation_speed: 0.1,
      tweens: vec![TweenSpec {
        parameter: Parameter::Spin,
        to: ParamValue::Scalar(-1.0),
        options: TweenOptions {
          duration: 6.0,
          ease: Ease::PowerInOut(2),
          delay: 1.0,
          repeat: -1,
          yoyo: true,
        },
      }],
    }
  }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WindowConfig {
  pub title: String,
  pub width: u32,
  pub height: u32,
}

impl Default for WindowConfig {
  fn default() -> Self {
    Self {
      title: "Galaxy Generator".to_string(),
      width: 1280,
      height: 720,
    }
  }
}

impl Config {
  pub fn load(path: &Path) -> Result<Self> {
    let content = std::fs::read_to_string(path).map_err(|source| Error::ConfigRead {
      path: path.to_path_buf(),
      source,
    })?;
    Self::parse(&content)
  }

  pub fn parse(content: &str) -> Result<Self> {
    let mut config: Self = toml::from_str(content)?;
    config.limit_count();
    Ok(config)
  }

  /// Caps `galaxy.count` at the count slider maximum. Smaller values,
  /// including zero, are kept.
  pub fn limit_count(&mut self) {
    if self.galaxy.count > MAX_COUNT {
      warn!(
        "count {} exceeds the maximum of {MAX_COUNT}, clamping",
        self.galaxy.count
      );
      self.galaxy.count = MAX_COUNT;
    }
  }

  pub fn to_toml(&self) -> Result<String> {
    Ok(toml::to_string_pretty(self)?)
  }
}
