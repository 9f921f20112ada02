pub mod camera;
pub mod color;
pub mod config;
pub mod error;
pub mod galaxy;
pub mod gui;
pub mod initialize;
pub mod panel;
pub mod params;
pub mod render;
pub mod state;
pub mod tween;

use color::Color;
use serde::{Deserialize, Serialize};

/// Inputs to the galaxy generator.
#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GalaxyParams {
  pub count: u32,
  pub size: f32,
  pub radius: f32,
  pub branches: u32,
  pub spin: f32,
  pub randomness: f32,
  pub randomness_power: f32,
  pub inside_color: Color,
  pub outside_color: Color,
}

impl Default for GalaxyParams {
  fn default() -> Self {
    Self {
      count: 100_000,
      size: 0.01,
      radius: 5.0,
      branches: 3,
      spin: 1.0,
      randomness: 0.2,
      randomness_power: 3.0,
      inside_color: Color::from_rgb8(0xff, 0x60, 0x30),
      outside_color: Color::from_rgb8(0x1b, 0x39, 0x84),
    }
  }
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraParams {
  pub eye: [f32; 3],
  pub target: [f32; 3],
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
  pub damping: f32,
  pub rotate_speed: f32,
  pub zoom_speed: f32,
  pub min_distance: f32,
  pub max_distance: f32,
}

impl Default for CameraParams {
  fn default() -> Self {
    Self {
      eye: [3.0, 3.0, 3.0],
      target: [0.0, 0.0, 0.0],
      fovy: 75.0,
      znear: 0.1,
      zfar: 100.0,
      damping: 0.05,
      rotate_speed: 0.005,
      zoom_speed: 0.95,
      min_distance: 0.5,
      max_distance: 50.0,
    }
  }
}

/// One star as laid out in the GPU instance buffer.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct PointVertex {
  pub pos: [f32; 3],
  pub color: [f32; 3],
}
