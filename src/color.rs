use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// RGB color with channels in `[0, 1]`. Serialized as `#rrggbb`.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct Color {
  pub r: f32,
  pub g: f32,
  pub b: f32,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid hex color `{0}`, expected #rrggbb")]
pub struct ParseColorError(pub String);

impl Color {
  pub const fn new(r: f32, g: f32, b: f32) -> Self {
    Self { r, g, b }
  }

  pub fn from_rgb8(r: u8, g: u8, b: u8) -> Self {
    Self {
      r: r as f32 / 255.0,
      g: g as f32 / 255.0,
      b: b as f32 / 255.0,
    }
  }

  pub fn to_rgb8(self) -> [u8; 3] {
    let q = |c: f32| (c.clamp(0.0, 1.0) * 255.0).round() as u8;
    [q(self.r), q(self.g), q(self.b)]
  }

  /// Linear interpolation towards `other`; `t` is not clamped.
  #[must_use]
  pub fn lerp(self, other: Color, t: f32) -> Color {
    Color {
      r: self.r + (other.r - self.r) * t,
      g: self.g + (other.g - self.g) * t,
      b: self.b + (other.b - self.b) * t,
    }
  }

  pub fn to_array(self) -> [f32; 3] {
    [self.r, self.g, self.b]
  }

  /// Rotate the hue by `degrees`, keeping saturation and lightness.
  #[must_use]
  pub fn shift_hue(self, degrees: f32) -> Color {
    let (h, s, l) = self.to_hsl();
    Color::from_hsl((h + degrees).rem_euclid(360.0), s, l)
  }

  fn to_hsl(self) -> (f32, f32, f32) {
    let max = self.r.max(self.g).max(self.b);
    let min = self.r.min(self.g).min(self.b);
    let l = (max + min) / 2.0;
    let d = max - min;
    if d <= f32::EPSILON {
      return (0.0, 0.0, l);
    }
    let s = if l > 0.5 { d / (2.0 - max - min) } else { d / (max + min) };
    let h = if max == self.r {
      (self.g - self.b) / d + if self.g < self.b { 6.0 } else { 0.0 }
    } else if max == self.g {
      (self.b - self.r) / d + 2.0
    } else {
      (self.r - self.g) / d + 4.0
    };
    (h * 60.0, s, l)
  }

  fn from_hsl(h: f32, s: f32, l: f32) -> Color {
    if s <= f32::EPSILON {
      return Color::new(l, l, l);
    }
    let q = if l < 0.5 { l * (1.0 + s) } else { l + s - l * s };
    let p = 2.0 * l - q;
    let h = h / 360.0;
    let channel = |t: f32| {
      let t = t.rem_euclid(1.0);
      if t < 1.0 / 6.0 {
        p + (q - p) * 6.0 * t
      } else if t < 0.5 {
        q
      } else if t < 2.0 / 3.0 {
        p + (q - p) * (2.0 / 3.0 - t) * 6.0
      } else {
        p
      }
    };
    Color::new(channel(h + 1.0 / 3.0), channel(h), channel(h - 1.0 / 3.0))
  }
}

impl FromStr for Color {
  type Err = ParseColorError;

  fn from_str(s: &str) -> Result<Self, Self::Err> {
    let hex = s.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.is_ascii() {
      return Err(ParseColorError(s.to_string()));
    }
    let byte = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16);
    match (byte(0), byte(2), byte(4)) {
      (Ok(r), Ok(g), Ok(b)) => Ok(Color::from_rgb8(r, g, b)),
      _ => Err(ParseColorError(s.to_string())),
    }
  }
}

impl TryFrom<String> for Color {
  type Error = ParseColorError;

  fn try_from(value: String) -> Result<Self, Self::Error> {
    value.parse()
  }
}

impl From<Color> for String {
  fn from(color: Color) -> Self {
    color.to_string()
  }
}

impl fmt::Display for Color {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let [r, g, b] = self.to_rgb8();
    write!(f, "#{r:02x}{g:02x}{b:02x}")
  }
}
