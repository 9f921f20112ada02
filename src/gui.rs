use egui_wgpu::ScreenDescriptor;
use winit::event::WindowEvent;
use winit::window::Window;

pub struct GuiFrame {
  paint_jobs: Vec<egui::ClippedPrimitive>,
  textures_delta: egui::TexturesDelta,
  pixels_per_point: f32,
}

/// egui glue: winit input in, wgpu draw calls out.
pub struct Gui {
  ctx: egui::Context,
  state: egui_winit::State,
  renderer: egui_wgpu::Renderer,
}

impl Gui {
  pub fn new(window: &Window, device: &wgpu::Device, format: wgpu::TextureFormat) -> Self {
    let ctx = egui::Context::default();
    let state = egui_winit::State::new(
      ctx.clone(),
      egui::ViewportId::ROOT,
      window,
      Some(window.scale_factor() as f32),
      None,
      Some(device.limits().max_texture_dimension_2d as usize),
    );
    let renderer = egui_wgpu::Renderer::new(device, format, None, 1, false);
    Self {
      ctx,
      state,
      renderer,
    }
  }

  /// Returns true when egui consumed the event.
  pub fn on_window_event(&mut self, window: &Window, event: &WindowEvent) -> bool {
    self.state.on_window_event(window, event).consumed
  }

  pub fn run(&mut self, window: &Window, build: impl FnMut(&egui::Context)) -> GuiFrame {
    let raw_input = self.state.take_egui_input(window);
    let output = self.ctx.run(raw_input, build);
    self
      .state
      .handle_platform_output(window, output.platform_output);
    GuiFrame {
      paint_jobs: self.ctx.tessellate(output.shapes, output.pixels_per_point),
      textures_delta: output.textures_delta,
      pixels_per_point: output.pixels_per_point,
    }
  }

  /// Draw `frame` on top of whatever `view` already holds.
  pub fn paint(
    &mut self,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    view: &wgpu::TextureView,
    size: [u32; 2],
    frame: GuiFrame,
  ) {
    for (id, delta) in &frame.textures_delta.set {
      self.renderer.update_texture(device, queue, *id, delta);
    }
    let screen = ScreenDescriptor {
      size_in_pixels: size,
      pixels_per_point: frame.pixels_per_point,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: Some("gui") });
    let mut command_buffers =
      self
        .renderer
        .update_buffers(device, queue, &mut command_encoder, &frame.paint_jobs, &screen);
    {
      let mut rpass = command_encoder
        .begin_render_pass(&wgpu::RenderPassDescriptor {
          label: Some("gui"),
          color_attachments: &[Some(wgpu::RenderPassColorAttachment {
            view,
            resolve_target: None,
            ops: wgpu::Operations {
              load: wgpu::LoadOp::Load,
              store: wgpu::StoreOp::Store,
            },
          })],
          depth_stencil_attachment: None,
          timestamp_writes: None,
          occlusion_query_set: None,
        })
        .forget_lifetime();
      self.renderer.render(&mut rpass, &frame.paint_jobs, &screen);
    }
    command_buffers.push(command_encoder.finish());
    queue.submit(command_buffers);
    for id in &frame.textures_delta.free {
      self.renderer.free_texture(id);
    }
  }
}
