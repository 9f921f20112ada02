use crate::color::Color;
use crate::GalaxyParams;
use serde::{Deserialize, Serialize};
use std::fmt;

pub const MAX_COUNT: u32 = 1_000_000;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Parameter {
  Count,
  Size,
  Radius,
  Branches,
  Spin,
  Randomness,
  RandomnessPower,
  InsideColor,
  OutsideColor,
}

impl Parameter {
  pub const ALL: [Parameter; 9] = [
    Parameter::Count,
    Parameter::Size,
    Parameter::Radius,
    Parameter::Branches,
    Parameter::Spin,
    Parameter::Randomness,
    Parameter::RandomnessPower,
    Parameter::InsideColor,
    Parameter::OutsideColor,
  ];

  pub fn name(self) -> &'static str {
    match self {
      Parameter::Count => "count",
      Parameter::Size => "size",
      Parameter::Radius => "radius",
      Parameter::Branches => "branches",
      Parameter::Spin => "spin",
      Parameter::Randomness => "randomness",
      Parameter::RandomnessPower => "randomness power",
      Parameter::InsideColor => "inside color",
      Parameter::OutsideColor => "outside color",
    }
  }

  /// Slider bounds, `None` for color pickers.
  pub fn range(self) -> Option<SliderRange> {
    let r = |min, max, step| Some(SliderRange { min, max, step });
    match self {
      Parameter::Count => r(100.0, MAX_COUNT as f32, 100.0),
      Parameter::Size => r(0.001, 0.1, 0.001),
      Parameter::Radius => r(0.01, 20.0, 0.01),
      Parameter::Branches => r(2.0, 20.0, 1.0),
      Parameter::Spin => r(-5.0, 5.0, 0.001),
      Parameter::Randomness => r(0.0, 2.0, 0.001),
      Parameter::RandomnessPower => r(1.0, 10.0, 0.001),
      Parameter::InsideColor | Parameter::OutsideColor => None,
    }
  }

  pub fn is_color(self) -> bool {
    matches!(self, Parameter::InsideColor | Parameter::OutsideColor)
  }
}

impl fmt::Display for Parameter {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.write_str(self.name())
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct SliderRange {
  pub min: f32,
  pub max: f32,
  pub step: f32,
}

impl SliderRange {
  pub fn clamp(&self, value: f32) -> f32 {
    value.clamp(self.min, self.max)
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ParamValue {
  Scalar(f32),
  Color(Color),
}

impl fmt::Display for ParamValue {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      ParamValue::Scalar(v) => write!(f, "{v}"),
      ParamValue::Color(c) => write!(f, "{c}"),
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ParameterChanged {
  pub parameter: Parameter,
  pub value: ParamValue,
}

impl ParameterChanged {
  pub fn scalar(parameter: Parameter, value: f32) -> Self {
    Self {
      parameter,
      value: ParamValue::Scalar(value),
    }
  }

  pub fn color(parameter: Parameter, value: Color) -> Self {
    Self {
      parameter,
      value: ParamValue::Color(value),
    }
  }
}

impl GalaxyParams {
  pub fn get(&self, parameter: Parameter) -> ParamValue {
    use ParamValue::Scalar;
    match parameter {
      Parameter::Count => Scalar(self.count as f32),
      Parameter::Size => Scalar(self.size),
      Parameter::Radius => Scalar(self.radius),
      Parameter::Branches => Scalar(self.branches as f32),
      Parameter::Spin => Scalar(self.spin),
      Parameter::Randomness => Scalar(self.randomness),
      Parameter::RandomnessPower => Scalar(self.randomness_power),
      Parameter::InsideColor => ParamValue::Color(self.inside_color),
      Parameter::OutsideColor => ParamValue::Color(self.outside_color),
    }
  }

  /// Apply a change, clamped to the slider bounds. Integer fields are rounded
  /// to their step. A value of the wrong kind is ignored.
  ///
  /// Returns whether the record changed.
  pub fn apply(&mut self, change: ParameterChanged) -> bool {
    let before = *self;
    match (change.parameter, change.value) {
      (Parameter::InsideColor, ParamValue::Color(c)) => self.inside_color = c,
      (Parameter::OutsideColor, ParamValue::Color(c)) => self.outside_color = c,
      (parameter, ParamValue::Scalar(v)) if v.is_finite() => {
        let Some(range) = parameter.range() else {
          return false;
        };
        let v = range.clamp(v);
        match parameter {
          Parameter::Count => self.count = snap_integer(v, &range),
          Parameter::Branches => self.branches = snap_integer(v, &range),
          Parameter::Size => self.size = v,
          Parameter::Radius => self.radius = v,
          Parameter::Spin => self.spin = v,
          Parameter::Randomness => self.randomness = v,
          Parameter::RandomnessPower => self.randomness_power = v,
          Parameter::InsideColor | Parameter::OutsideColor => {}
        }
      }
      _ => return false,
    }
    *self != before
  }
}

fn snap_integer(v: f32, range: &SliderRange) -> u32 {
  let steps = ((v - range.min) / range.step).round();
  range.clamp(range.min + steps * range.step) as u32
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn apply_clamps_to_slider_bounds() {
    let mut p = GalaxyParams::default();
    assert!(p.apply(ParameterChanged::scalar(Parameter::Branches, 50.0)));
    assert_eq!(p.branches, 20);
    assert!(p.apply(ParameterChanged::scalar(Parameter::Randomness, -1.0)));
    assert_eq!(p.randomness, 0.0);
  }

  #[test]
  fn apply_snaps_integer_fields() {
    let mut p = GalaxyParams::default();
    p.apply(ParameterChanged::scalar(Parameter::Count, 1234.0));
    assert_eq!(p.count, 1200);
    p.apply(ParameterChanged::scalar(Parameter::Branches, 4.6));
    assert_eq!(p.branches, 5);
  }

  #[test]
  fn apply_reports_no_change() {
    let mut p = GalaxyParams::default();
    assert!(!p.apply(ParameterChanged::scalar(Parameter::Spin, p.spin)));
    assert!(!p.apply(ParameterChanged::scalar(Parameter::Count, 100_040.0)));
  }

  #[test]
  fn apply_ignores_mismatched_kinds() {
    let mut p = GalaxyParams::default();
    let before = p;
    assert!(!p.apply(ParameterChanged::scalar(Parameter::InsideColor, 1.0)));
    assert!(!p.apply(ParameterChanged::color(Parameter::Spin, Color::new(1.0, 1.0, 1.0))));
    assert!(!p.apply(ParameterChanged::scalar(Parameter::Spin, f32::NAN)));
    assert_eq!(p, before);
  }

  #[test]
  fn get_reflects_apply() {
    let mut p = GalaxyParams::default();
    let c = Color::new(0.1, 0.2, 0.3);
    p.apply(ParameterChanged::color(Parameter::OutsideColor, c));
    assert_eq!(p.get(Parameter::OutsideColor), ParamValue::Color(c));
    assert_eq!(p.get(Parameter::Branches), ParamValue::Scalar(3.0));
  }
}
