use crate::camera::{Camera, CameraUniform, OrbitController};
use crate::config::Config;
use crate::error::{Error, Result};
use crate::galaxy::{Galaxy, HeadlessBackend};
use crate::gui::Gui;
use crate::initialize::PointCloud;
use crate::panel::DebugPanel;
use crate::params::ParameterChanged;
use crate::render::{GpuPoints, Render};
use crate::tween::Timeline;
use crate::GalaxyParams;
use log::{debug, info, warn};
use serde::Serialize;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;
use wgpu::util::DeviceExt;
use winit::{
  application::ApplicationHandler,
  dpi::PhysicalSize,
  event::{ElementState, KeyEvent, WindowEvent},
  event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
  keyboard::{KeyCode, PhysicalKey},
  window::{Window, WindowId},
};

pub const HEADLESS_DT: f32 = 1.0 / 60.0;

pub struct Clock {
  start: Instant,
  last: Instant,
}

impl Clock {
  pub fn new() -> Self {
    let now = Instant::now();
    Self {
      start: now,
      last: now,
    }
  }

  /// Returns `(elapsed, delta)` in seconds.
  pub fn tick(&mut self) -> (f32, f32) {
    let now = Instant::now();
    let delta = now.duration_since(self.last).as_secs_f32();
    self.last = now;
    (now.duration_since(self.start).as_secs_f32(), delta)
  }
}

impl Default for Clock {
  fn default() -> Self {
    Self::new()
  }
}

struct State {
  window: Arc<Window>,
  surface: wgpu::Surface<'static>,
  config: wgpu::SurfaceConfiguration,
  scene_format: wgpu::TextureFormat,
  gui_format: wgpu::TextureFormat,
  device: Arc<wgpu::Device>,
  queue: wgpu::Queue,
  camera: Camera,
  camera_uniform: CameraUniform,
  camera_buffer: wgpu::Buffer,
  camera_bind_group: wgpu::BindGroup,
  camera_controller: OrbitController,
  render: Render,
  gui: Gui,
  galaxy: Galaxy<GpuPoints>,
  timeline: Timeline,
  panel: DebugPanel,
  clock: Clock,
  rotation_speed: f32,
  elapsed: f32,
  title: String,
}

impl State {
  async fn init(window: Arc<Window>, app: &Config) -> Result<Self> {
    let size = window.inner_size();
    let width = size.width.max(1);
    let height = size.height.max(1);

    let instance = wgpu::Instance::new(wgpu::InstanceDescriptor {
      #[cfg(not(target_arch = "wasm32"))]
      backends: wgpu::Backends::PRIMARY,
      ..Default::default()
    });
    let surface = instance.create_surface(window.clone())?;

    let adapter = instance
      .request_adapter(&wgpu::RequestAdapterOptions {
        power_preference: wgpu::PowerPreference::default(),
        compatible_surface: Some(&surface),
        force_fallback_adapter: false,
      })
      .await
      .ok_or(Error::NoAdapter)?;
    info!("using adapter {:?}", adapter.get_info().name);

    let (device, queue) = adapter
      .request_device(
        &wgpu::DeviceDescriptor {
          label: None,
          required_features: wgpu::Features::empty(),
          required_limits: wgpu::Limits::default(),
          memory_hints: Default::default(),
        },
        None,
      )
      .await?;
    let device = Arc::new(device);

    let mut config = surface
      .get_default_config(&adapter, width, height)
      .ok_or(Error::UnsupportedSurface)?;
    // stars blend in sRGB, egui expects a linear target
    let scene_format = config.format.add_srgb_suffix();
    let gui_format = config.format.remove_srgb_suffix();
    config.view_formats = vec![scene_format, gui_format];
    surface.configure(&device, &config);

    let camera = Camera::from_params(&app.camera, width as f32 / height as f32);
    let mut camera_uniform = CameraUniform::new();
    camera_uniform.update_view_proj(&camera);

    let camera_buffer = device.create_buffer_init(&wgpu::util::BufferInitDescriptor {
      label: Some("Camera Buffer"),
      contents: bytemuck::cast_slice(&[camera_uniform]),
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
    });
    let camera_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: None,
          },
          count: None,
        }],
        label: Some("camera_bind_group_layout"),
      });
    let camera_bind_group = device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &camera_bind_group_layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: camera_buffer.as_entire_binding(),
      }],
      label: Some("camera_bind_group"),
    });
    let camera_controller = OrbitController::init(&app.camera);

    let mut render = Render::init(scene_format, device.clone(), &camera_bind_group_layout);
    let gui = Gui::new(&window, &device, gui_format);
    let mut galaxy = Galaxy::new(app.galaxy, app.seed);
    let cloud = galaxy.regenerate(&mut render.backend);
    info!("generated {} points", cloud.len());

    let state = Self {
      window,
      surface,
      config,
      scene_format,
      gui_format,
      device,
      queue,
      camera,
      camera_uniform,
      camera_buffer,
      camera_bind_group,
      camera_controller,
      render,
      gui,
      galaxy,
      timeline: Timeline::from_specs(&app.animation.tweens),
      panel: DebugPanel::new(app.galaxy),
      clock: Clock::new(),
      rotation_speed: app.animation.rotation_speed,
      elapsed: 0.0,
      title: app.window.title.clone(),
    };
    state.refresh_title();
    Ok(state)
  }

  fn refresh_title(&self) {
    let readout = self.panel.title(self.galaxy.params());
    self.window.set_title(&format!("{} | {readout}", self.title));
  }

  fn dispatch(&mut self, change: ParameterChanged) {
    if self.galaxy.handle(change, &mut self.render.backend).is_some()
      && change.parameter == self.panel.focused()
    {
      self.refresh_title();
    }
  }

  fn edit(&mut self, change: ParameterChanged) {
    debug!("{} -> {}", change.parameter, change.value);
    // manual edits win over running tweens
    self.timeline.kill(change.parameter);
    self.dispatch(change);
  }

  fn input(&mut self, event: &WindowEvent) -> bool {
    if self.gui.on_window_event(&self.window, event) {
      return true;
    }
    if self.camera_controller.process_events(event) {
      return true;
    }
    let Some(action) = self.panel.process_events(event) else {
      return false;
    };
    if let Some(change) = self.panel.apply(action, self.galaxy.params()) {
      self.edit(change);
    }
    self.refresh_title();
    true
  }

  fn resize(&mut self, size: PhysicalSize<u32>) {
    self.config.width = size.width.max(1);
    self.config.height = size.height.max(1);
    self.surface.configure(&self.device, &self.config);
    self.camera.aspect = self.config.width as f32 / self.config.height as f32;
  }

  fn update(&mut self) {
    let (elapsed, delta) = self.clock.tick();
    self.elapsed = elapsed;
    for change in self.timeline.tick(delta, self.galaxy.params()) {
      self.dispatch(change);
    }

    self.camera_controller.update_camera(&mut self.camera);
    self.camera_uniform.update_view_proj(&self.camera);
    self.queue.write_buffer(
      &self.camera_buffer,
      0,
      bytemuck::cast_slice(&[self.camera_uniform]),
    );
    if let Some(points) = self.galaxy.points() {
      self.render.update(
        &self.queue,
        points,
        self.elapsed * self.rotation_speed,
        &self.config,
      );
    }
  }

  fn acquire(&mut self) -> Option<wgpu::SurfaceTexture> {
    match self.surface.get_current_texture() {
      Ok(frame) => Some(frame),
      Err(wgpu::SurfaceError::Timeout) => {
        warn!("surface timed out, skipping frame");
        None
      }
      Err(e) => {
        warn!("surface error: {e}, reconfiguring");
        self.surface.configure(&self.device, &self.config);
        self.surface.get_current_texture().ok()
      }
    }
  }

  fn draw(&mut self) {
    let params = *self.galaxy.params();
    let panel = &mut self.panel;
    let mut edits = Vec::new();
    let gui_frame = self.gui.run(&self.window, |ctx| edits = panel.show(ctx, &params));
    if !edits.is_empty() {
      for change in edits {
        self.edit(change);
      }
      self.refresh_title();
    }

    let Some(frame) = self.acquire() else {
      return;
    };
    let scene_view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
      format: Some(self.scene_format),
      ..wgpu::TextureViewDescriptor::default()
    });
    self.render.render(
      &scene_view,
      &self.device,
      &self.queue,
      &self.camera_bind_group,
      self.galaxy.points(),
    );
    let gui_view = frame.texture.create_view(&wgpu::TextureViewDescriptor {
      format: Some(self.gui_format),
      ..wgpu::TextureViewDescriptor::default()
    });
    self.gui.paint(
      &self.device,
      &self.queue,
      &gui_view,
      [self.config.width, self.config.height],
      gui_frame,
    );
    frame.present();
  }

  fn shutdown(&mut self) {
    self.galaxy.dispose(&mut self.render.backend);
  }
}

struct App {
  config: Config,
  state: Option<State>,
  error: Option<Error>,
}

impl App {
  fn open(&self, event_loop: &ActiveEventLoop) -> Result<State> {
    let attrs = Window::default_attributes()
      .with_title(&self.config.window.title)
      .with_inner_size(PhysicalSize::new(
        self.config.window.width,
        self.config.window.height,
      ));
    let window = Arc::new(event_loop.create_window(attrs)?);
    pollster::block_on(State::init(window, &self.config))
  }
}

impl ApplicationHandler for App {
  fn resumed(&mut self, event_loop: &ActiveEventLoop) {
    if self.state.is_some() {
      return;
    }
    match self.open(event_loop) {
      Ok(state) => {
        state.window.request_redraw();
        self.state = Some(state);
      }
      Err(e) => {
        self.error = Some(e);
        event_loop.exit();
      }
    }
  }

  fn window_event(&mut self, event_loop: &ActiveEventLoop, window_id: WindowId, event: WindowEvent) {
    let Some(state) = self.state.as_mut() else {
      return;
    };
    if window_id != state.window.id() || state.input(&event) {
      return;
    }
    match event {
      WindowEvent::CloseRequested
      | WindowEvent::KeyboardInput {
        event:
          KeyEvent {
            state: ElementState::Pressed,
            physical_key: PhysicalKey::Code(KeyCode::Escape),
            ..
          },
        ..
      } => {
        state.shutdown();
        event_loop.exit();
      }
      WindowEvent::Resized(size) => state.resize(size),
      WindowEvent::RedrawRequested => {
        state.update();
        state.draw();
      }
      _ => {}
    }
  }

  fn about_to_wait(&mut self, _event_loop: &ActiveEventLoop) {
    if let Some(state) = &self.state {
      state.window.request_redraw();
    }
  }
}

pub fn run(config: Config) -> Result<()> {
  let event_loop = EventLoop::new()?;
  event_loop.set_control_flow(ControlFlow::Poll);
  let mut app = App {
    config,
    state: None,
    error: None,
  };
  event_loop.run_app(&mut app)?;
  match app.error {
    Some(e) => Err(e),
    None => Ok(()),
  }
}

pub struct HeadlessRun {
  pub galaxy: Galaxy<HeadlessBackend>,
  pub backend: HeadlessBackend,
  pub frames: u32,
}

/// Step the tween timeline for up to `frames` fixed steps, regenerating on
/// every change. Stops early once `stop` is set.
pub fn simulate(config: &Config, frames: u32, stop: &AtomicBool) -> HeadlessRun {
  let mut backend = HeadlessBackend::default();
  let mut galaxy = Galaxy::new(config.galaxy, config.seed);
  let mut timeline = Timeline::from_specs(&config.animation.tweens);
  galaxy.regenerate(&mut backend);

  let mut ran = 0;
  while ran < frames && !stop.load(Ordering::SeqCst) {
    for change in timeline.tick(HEADLESS_DT, galaxy.params()) {
      galaxy.handle(change, &mut backend);
    }
    ran += 1;
  }
  HeadlessRun {
    galaxy,
    backend,
    frames: ran,
  }
}

#[derive(Serialize)]
struct Dump<'a> {
  params: &'a GalaxyParams,
  #[serde(flatten)]
  cloud: &'a PointCloud,
}

pub fn run_headless(config: &Config, frames: u32, dump: Option<&Path>) -> Result<()> {
  let stop = Arc::new(AtomicBool::new(false));
  let handler_stop = stop.clone();
  ctrlc::set_handler(move || handler_stop.store(true, Ordering::SeqCst))?;

  let mut run = simulate(config, frames, &stop);
  if run.frames < frames {
    info!("interrupted after {} of {frames} frames", run.frames);
  }
  info!(
    "{} regenerations, {} points generated in total",
    run.galaxy.generation(),
    run.backend.total_points
  );

  if let Some(points) = run.galaxy.points() {
    let cloud = &points.geometry;
    if let Some((min, max)) = cloud.bounds() {
      info!("final galaxy: {} points, bounds {min:?} .. {max:?}", cloud.len());
    }
    if let Some(path) = dump {
      let mut writer = BufWriter::new(File::create(path)?);
      serde_json::to_writer(
        &mut writer,
        &Dump {
          params: run.galaxy.params(),
          cloud,
        },
      )?;
      writer.flush()?;
      info!("wrote {}", path.display());
    }
  }
  run.galaxy.dispose(&mut run.backend);
  Ok(())
}
