use crate::CameraParams;
use cgmath::{InnerSpace, Point3, SquareMatrix, Vector3};
use std::f32::consts::PI;
use winit::{
  dpi::PhysicalPosition,
  event::{ElementState, KeyEvent, MouseButton, MouseScrollDelta, WindowEvent},
  keyboard::{KeyCode, PhysicalKey},
};

#[rustfmt::skip]
pub const OPENGL_TO_WGPU_MATRIX: cgmath::Matrix4<f32> = cgmath::Matrix4::new(
    1.0, 0.0, 0.0, 0.0,
    0.0, 1.0, 0.0, 0.0,
    0.0, 0.0, 0.5, 0.5,
    0.0, 0.0, 0.0, 1.0,
);

const POLAR_EPSILON: f32 = 1e-3;
const KEY_ROTATE_STEP: f32 = 0.02;
const SETTLE_THRESHOLD: f32 = 1e-5;

pub struct Camera {
  pub eye: Point3<f32>,
  pub target: Point3<f32>,
  pub up: Vector3<f32>,
  pub aspect: f32,
  pub fovy: f32,
  pub znear: f32,
  pub zfar: f32,
}

impl Camera {
  pub fn from_params(params: &CameraParams, aspect: f32) -> Self {
    Self {
      eye: params.eye.into(),
      target: params.target.into(),
      up: Vector3::unit_y(),
      aspect,
      fovy: params.fovy,
      znear: params.znear,
      zfar: params.zfar,
    }
  }

  pub fn build_view_projection_matrix(&self) -> cgmath::Matrix4<f32> {
    let view = cgmath::Matrix4::look_at_rh(self.eye, self.target, self.up);
    let proj = cgmath::perspective(cgmath::Deg(self.fovy), self.aspect, self.znear, self.zfar);
    OPENGL_TO_WGPU_MATRIX * proj * view
  }
}

#[repr(C)]
#[derive(Debug, Copy, Clone, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
  view_proj: [[f32; 4]; 4],
}

impl CameraUniform {
  pub fn new() -> Self {
    Self {
      view_proj: cgmath::Matrix4::identity().into(),
    }
  }

  pub fn update_view_proj(&mut self, camera: &Camera) {
    self.view_proj = camera.build_view_projection_matrix().into();
  }
}

impl Default for CameraUniform {
  fn default() -> Self {
    Self::new()
  }
}

/// Orbit controls: the eye moves on a sphere around the target. Input is
/// accumulated into deltas which are bled off by the damping factor every
/// update, so motion eases out after the mouse is released.
pub struct OrbitController {
  damping: f32,
  rotate_speed: f32,
  zoom_speed: f32,
  min_distance: f32,
  max_distance: f32,
  theta_delta: f32,
  phi_delta: f32,
  /// Multiplicative; 1.0 means no zoom pending.
  scale: f32,
  is_dragging: bool,
  last_cursor: Option<PhysicalPosition<f64>>,
}

impl OrbitController {
  pub fn init(params: &CameraParams) -> Self {
    Self {
      damping: params.damping.clamp(0.0, 1.0),
      rotate_speed: params.rotate_speed,
      zoom_speed: params.zoom_speed,
      min_distance: params.min_distance,
      max_distance: params.max_distance,
      theta_delta: 0.0,
      phi_delta: 0.0,
      scale: 1.0,
      is_dragging: false,
      last_cursor: None,
    }
  }

  pub fn rotate(&mut self, theta: f32, phi: f32) {
    self.theta_delta += theta;
    self.phi_delta += phi;
  }

  /// Positive `steps` move closer.
  pub fn zoom(&mut self, steps: f32) {
    self.scale *= self.zoom_speed.powf(steps);
  }

  pub fn process_events(&mut self, event: &WindowEvent) -> bool {
    match event {
      WindowEvent::MouseInput {
        state,
        button: MouseButton::Left,
        ..
      } => {
        self.is_dragging = *state == ElementState::Pressed;
        true
      }
      WindowEvent::CursorMoved { position, .. } => {
        if self.is_dragging {
          if let Some(last) = self.last_cursor {
            let dx = (position.x - last.x) as f32;
            let dy = (position.y - last.y) as f32;
            self.rotate(-dx * self.rotate_speed, -dy * self.rotate_speed);
          }
        }
        self.last_cursor = Some(*position);
        self.is_dragging
      }
      WindowEvent::MouseWheel { delta, .. } => {
        let steps = match delta {
          MouseScrollDelta::LineDelta(_, y) => *y,
          MouseScrollDelta::PixelDelta(p) => (p.y / 50.0) as f32,
        };
        self.zoom(steps);
        true
      }
      WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state: ElementState::Pressed,
            physical_key: PhysicalKey::Code(keycode),
            ..
          },
        ..
      } => self.process_key(*keycode),
      _ => false,
    }
  }

  pub fn process_key(&mut self, key: KeyCode) -> bool {
    match key {
      KeyCode::KeyW => self.zoom(1.0),
      KeyCode::KeyS => self.zoom(-1.0),
      KeyCode::KeyA | KeyCode::ArrowLeft => self.rotate(KEY_ROTATE_STEP, 0.0),
      KeyCode::KeyD | KeyCode::ArrowRight => self.rotate(-KEY_ROTATE_STEP, 0.0),
      KeyCode::KeyQ => self.rotate(0.0, KEY_ROTATE_STEP),
      KeyCode::KeyE => self.rotate(0.0, -KEY_ROTATE_STEP),
      _ => return false,
    }
    true
  }

  pub fn update_camera(&mut self, camera: &mut Camera) {
    let offset = camera.eye - camera.target;
    let radius = offset.magnitude();
    if radius <= f32::EPSILON {
      return;
    }
    // Spherical coordinates with the polar angle measured from +Y.
    let mut theta = offset.x.atan2(offset.z);
    let mut phi = (offset.y / radius).clamp(-1.0, 1.0).acos();

    let factor = if self.damping > 0.0 { self.damping } else { 1.0 };
    theta += self.theta_delta * factor;
    phi = (phi + self.phi_delta * factor).clamp(POLAR_EPSILON, PI - POLAR_EPSILON);
    let zoom = 1.0 + (self.scale - 1.0) * factor;
    let radius = (radius * zoom).clamp(self.min_distance, self.max_distance);

    camera.eye = camera.target
      + Vector3::new(
        radius * phi.sin() * theta.sin(),
        radius * phi.cos(),
        radius * phi.sin() * theta.cos(),
      );
    camera.up = Vector3::unit_y();

    let keep = 1.0 - factor;
    self.theta_delta *= keep;
    self.phi_delta *= keep;
    self.scale = 1.0 + (self.scale - 1.0) * keep;
    if self.theta_delta.abs() < SETTLE_THRESHOLD {
      self.theta_delta = 0.0;
    }
    if self.phi_delta.abs() < SETTLE_THRESHOLD {
      self.phi_delta = 0.0;
    }
    if (self.scale - 1.0).abs() < SETTLE_THRESHOLD {
      self.scale = 1.0;
    }
  }

  pub fn is_settled(&self) -> bool {
    self.theta_delta == 0.0 && self.phi_delta == 0.0 && self.scale == 1.0
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn setup() -> (OrbitController, Camera) {
    let params = CameraParams::default();
    (OrbitController::init(&params), Camera::from_params(&params, 16.0 / 9.0))
  }

  fn distance(camera: &Camera) -> f32 {
    (camera.eye - camera.target).magnitude()
  }

  #[test]
  fn rotation_keeps_distance() {
    let (mut controller, mut camera) = setup();
    let before = distance(&camera);
    controller.rotate(1.0, 0.3);
    for _ in 0..10 {
      controller.update_camera(&mut camera);
    }
    assert!((distance(&camera) - before).abs() < 1e-4);
  }

  #[test]
  fn damping_converges_to_full_delta() {
    let (mut controller, mut camera) = setup();
    let start = camera.eye.x.atan2(camera.eye.z);
    controller.rotate(0.5, 0.0);
    for _ in 0..1000 {
      controller.update_camera(&mut camera);
    }
    assert!(controller.is_settled());
    let end = camera.eye.x.atan2(camera.eye.z);
    assert!((end - start - 0.5).abs() < 1e-2, "{}", end - start);
  }

  #[test]
  fn zoom_is_clamped() {
    let (mut controller, mut camera) = setup();
    controller.zoom(500.0);
    for _ in 0..200 {
      controller.update_camera(&mut camera);
    }
    assert!(distance(&camera) >= CameraParams::default().min_distance - 1e-4);
    controller.zoom(-50.0);
    for _ in 0..200 {
      controller.update_camera(&mut camera);
    }
    assert!(distance(&camera) <= CameraParams::default().max_distance + 1e-4);
  }

  #[test]
  fn polar_angle_never_flips() {
    let (mut controller, mut camera) = setup();
    controller.rotate(0.0, -10.0);
    for _ in 0..200 {
      controller.update_camera(&mut camera);
      assert!(camera.eye.y > 0.0);
    }
  }

  #[test]
  fn keys_zoom_and_orbit() {
    let (mut controller, mut camera) = setup();
    let before = distance(&camera);
    assert!(controller.process_key(KeyCode::KeyW));
    for _ in 0..200 {
      controller.update_camera(&mut camera);
    }
    let closer = distance(&camera);
    assert!(closer < before);

    assert!(controller.process_key(KeyCode::KeyS));
    assert!(controller.process_key(KeyCode::KeyS));
    for _ in 0..200 {
      controller.update_camera(&mut camera);
    }
    assert!(distance(&camera) > closer);

    let theta = camera.eye.x.atan2(camera.eye.z);
    assert!(controller.process_key(KeyCode::ArrowLeft));
    for _ in 0..200 {
      controller.update_camera(&mut camera);
    }
    assert!(camera.eye.x.atan2(camera.eye.z) > theta);

    assert!(!controller.process_key(KeyCode::Space));
    assert!(controller.is_settled());
  }
}
