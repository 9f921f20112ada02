use crate::params::{ParamValue, Parameter, ParameterChanged};
use crate::GalaxyParams;
use serde::{Deserialize, Serialize};
use std::f32::consts::PI;
use std::fmt;
use std::str::FromStr;

/// Easing curves, named the way `power2.inOut` style ease strings name them.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Ease {
  Linear,
  /// Polynomial of degree `n + 1` (`power1` is quadratic).
  PowerIn(u8),
  PowerOut(u8),
  PowerInOut(u8),
  SineIn,
  SineOut,
  SineInOut,
}

impl Ease {
  /// Evaluate at `t`, clamped to `[0, 1]`.
  pub fn evaluate(self, t: f32) -> f32 {
    let t = t.clamp(0.0, 1.0);
    match self {
      Ease::Linear => t,
      Ease::PowerIn(n) => t.powi(i32::from(n) + 1),
      Ease::PowerOut(n) => 1.0 - (1.0 - t).powi(i32::from(n) + 1),
      Ease::PowerInOut(n) => {
        let e = i32::from(n) + 1;
        if t < 0.5 {
          (2.0 * t).powi(e) / 2.0
        } else {
          1.0 - (2.0 * (1.0 - t)).powi(e) / 2.0
        }
      }
      Ease::SineIn => 1.0 - (t * PI / 2.0).cos(),
      Ease::SineOut => (t * PI / 2.0).sin(),
      Ease::SineInOut => -((PI * t).cos() - 1.0) / 2.0,
    }
  }
}

impl Default for Ease {
  fn default() -> Self {
    Ease::PowerOut(1)
  }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown ease `{0}`")]
pub struct ParseEaseError(pub String);

impl FromStr for Ease {
  type Err = ParseEaseError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let err = || ParseEaseError(s.to_string());
    if s == "none" || s == "linear" {
      return Ok(Ease::Linear);
    }
    let (family, kind) = s.split_once('.').unwrap_or((s, "out"));
    let build = |power: Option<u8>| match (power, kind) {
      (Some(n), "in") => Ok(Ease::PowerIn(n)),
      (Some(n), "out") => Ok(Ease::PowerOut(n)),
      (Some(n), "inOut") => Ok(Ease::PowerInOut(n)),
      (None, "in") => Ok(Ease::SineIn),
      (None, "out") => Ok(Ease::SineOut),
      (None, "inOut") => Ok(Ease::SineInOut),
      _ => Err(err()),
    };
    match family {
      "sine" => build(None),
      "power0" => Ok(Ease::Linear),
      _ => match family.strip_prefix("power").and_then(|n| n.parse::<u8>().ok()) {
        Some(n @ 1..=4) => build(Some(n)),
        _ => Err(err()),
      },
    }
  }
}

impl TryFrom<String> for Ease {
  type Error = ParseEaseError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Ease> for String {
  fn from(ease: Ease) -> Self {
    ease.to_string()
  }
}

impl fmt::Display for Ease {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Ease::Linear => write!(f, "none"),
      Ease::PowerIn(n) => write!(f, "power{n}.in"),
      Ease::PowerOut(n) => write!(f, "power{n}.out"),
      Ease::PowerInOut(n) => write!(f, "power{n}.inOut"),
      Ease::SineIn => write!(f, "sine.in"),
      Ease::SineOut => write!(f, "sine.out"),
      Ease::SineInOut => write!(f, "sine.inOut"),
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TweenOptions {
  pub duration: f32,
  pub ease: Ease,
  /// Seconds before the start value is captured.
  pub delay: f32,
  /// Extra cycles after the first; `-1` repeats forever.
  pub repeat: i32,
  pub yoyo: bool,
}

impl Default for TweenOptions {
  fn default() -> Self {
    Self {
      duration: 0.5,
      ease: Ease::default(),
      delay: 0.0,
      repeat: 0,
      yoyo: false,
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct TweenSpec {
  pub parameter: Parameter,
  pub to: ParamValue,
  #[serde(flatten)]
  pub options: TweenOptions,
}

#[derive(Clone, Debug)]
struct Tween {
  parameter: Parameter,
  from: Option<ParamValue>,
  to: ParamValue,
  options: TweenOptions,
  elapsed: f32,
}

impl Tween {
  fn is_forever(&self) -> bool {
    self.options.repeat < 0
  }

  fn cycles(&self) -> u32 {
    self.options.repeat.max(0) as u32 + 1
  }

  /// Advance by `dt` and return the value for this frame, or `None` while
  /// still delayed. Sets `done` once the last cycle has completed.
  fn advance(&mut self, dt: f32, params: &GalaxyParams, done: &mut bool) -> Option<ParamValue> {
    self.elapsed += dt;
    let active = self.elapsed - self.options.delay;
    if active < 0.0 {
      return None;
    }
    let from = *self.from.get_or_insert_with(|| params.get(self.parameter));

    let duration = self.options.duration.max(f32::EPSILON);
    let mut cycle = (active / duration).floor() as u32;
    let mut progress = (active - cycle as f32 * duration) / duration;
    if !self.is_forever() && cycle >= self.cycles() {
      cycle = self.cycles() - 1;
      progress = 1.0;
      *done = true;
    }

    let reversed = self.options.yoyo && cycle % 2 == 1;
    let t = if reversed { 1.0 - progress } else { progress };
    Some(interpolate(from, self.to, self.options.ease.evaluate(t)))
  }
}

fn interpolate(from: ParamValue, to: ParamValue, t: f32) -> ParamValue {
  match (from, to) {
    (ParamValue::Scalar(a), ParamValue::Scalar(b)) => ParamValue::Scalar(a + (b - a) * t),
    (ParamValue::Color(a), ParamValue::Color(b)) => ParamValue::Color(a.lerp(b, t)),
    _ => to,
  }
}

#[derive(Clone, Debug, Default)]
pub struct Timeline {
  tweens: Vec<Tween>,
}

impl Timeline {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_specs(specs: &[TweenSpec]) -> Self {
    let mut timeline = Self::new();
    for spec in specs {
      timeline.to(spec.parameter, spec.to, spec.options);
    }
    timeline
  }

  pub fn to(&mut self, parameter: Parameter, target: ParamValue, options: TweenOptions) {
    self.tweens.push(Tween {
      parameter,
      from: None,
      to: target,
      options,
      elapsed: 0.0,
    });
  }

  pub fn kill(&mut self, parameter: Parameter) {
    self.tweens.retain(|t| t.parameter != parameter);
  }

  pub fn is_empty(&self) -> bool {
    self.tweens.is_empty()
  }

  pub fn len(&self) -> usize {
    self.tweens.len()
  }

  /// Advance every tween by `dt` seconds and return this frame's updates.
  /// Finished tweens are removed after emitting their final value.
  pub fn tick(&mut self, dt: f32, params: &GalaxyParams) -> Vec<ParameterChanged> {
    let mut updates = Vec::with_capacity(self.tweens.len());
    self.tweens.retain_mut(|tween| {
      let mut done = false;
      if let Some(value) = tween.advance(dt, params, &mut done) {
        updates.push(ParameterChanged {
          parameter: tween.parameter,
          value,
        });
      }
      !done
    });
    updates
  }
}
