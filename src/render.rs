use crate::galaxy::{Points, PointsBackend, PointsMaterial};
use crate::initialize::PointCloud;
use crate::PointVertex;
use cgmath::{Matrix4, Rad};
use std::borrow::Cow;
use std::sync::Arc;
use wgpu::{util::DeviceExt, PipelineCompilationOptions};

#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
struct PointsUniform {
  model: [[f32; 4]; 4],
  size: f32,
  aspect: f32,
  viewport_height: f32,
  attenuate: u32,
}

pub struct GpuGeometry {
  buffer: wgpu::Buffer,
  len: u32,
}

pub struct GpuMaterial {
  material: PointsMaterial,
  buffer: wgpu::Buffer,
  bind_group: wgpu::BindGroup,
}

impl GpuMaterial {
  fn uniform(&self, rotation: f32, width: u32, height: u32) -> PointsUniform {
    let height = height.max(1) as f32;
    PointsUniform {
      model: Matrix4::from_angle_y(Rad(rotation)).into(),
      size: self.material.size,
      aspect: width.max(1) as f32 / height,
      viewport_height: height,
      attenuate: u32::from(self.material.size_attenuation),
    }
  }
}

/// Allocates point buffers on the GPU. Disposal destroys the buffers
/// immediately rather than waiting for the handles to drop.
pub struct GpuPoints {
  device: Arc<wgpu::Device>,
  layout: wgpu::BindGroupLayout,
}

impl PointsBackend for GpuPoints {
  type Geometry = GpuGeometry;
  type Material = GpuMaterial;

  fn create_geometry(&mut self, cloud: &PointCloud) -> GpuGeometry {
    let mut vertices = cloud.vertices();
    let len = vertices.len() as u32;
    if vertices.is_empty() {
      // zero-sized vertex buffers cannot be bound
      vertices.push(PointVertex {
        pos: [0.0; 3],
        color: [0.0; 3],
      });
    }
    let buffer = self
      .device
      .create_buffer_init(&wgpu::util::BufferInitDescriptor {
        label: Some("Galaxy Point Buffer"),
        contents: bytemuck::cast_slice(&vertices),
        usage: wgpu::BufferUsages::VERTEX,
      });
    GpuGeometry { buffer, len }
  }

  fn create_material(&mut self, material: &PointsMaterial) -> GpuMaterial {
    let buffer = self.device.create_buffer(&wgpu::BufferDescriptor {
      label: Some("Galaxy Material Buffer"),
      size: std::mem::size_of::<PointsUniform>() as u64,
      usage: wgpu::BufferUsages::UNIFORM | wgpu::BufferUsages::COPY_DST,
      mapped_at_creation: false,
    });
    let bind_group = self.device.create_bind_group(&wgpu::BindGroupDescriptor {
      layout: &self.layout,
      entries: &[wgpu::BindGroupEntry {
        binding: 0,
        resource: buffer.as_entire_binding(),
      }],
      label: Some("galaxy_material_bind_group"),
    });
    GpuMaterial {
      material: *material,
      buffer,
      bind_group,
    }
  }

  fn dispose_geometry(&mut self, geometry: GpuGeometry) {
    geometry.buffer.destroy();
  }

  fn dispose_material(&mut self, material: GpuMaterial) {
    material.buffer.destroy();
  }
}

pub struct Render {
  render_pipeline: wgpu::RenderPipeline,
  pub backend: GpuPoints,
}

impl Render {
  #[must_use]
  pub fn init(
    format: wgpu::TextureFormat,
    device: Arc<wgpu::Device>,
    camera_bind_group_layout: &wgpu::BindGroupLayout,
  ) -> Self {
    let draw_shader = device.create_shader_module(wgpu::ShaderModuleDescriptor {
      label: Some("points"),
      source: wgpu::ShaderSource::Wgsl(Cow::Borrowed(include_str!("shaders/points.wgsl"))),
    });

    let material_bind_group_layout =
      device.create_bind_group_layout(&wgpu::BindGroupLayoutDescriptor {
        entries: &[wgpu::BindGroupLayoutEntry {
          binding: 0,
          visibility: wgpu::ShaderStages::VERTEX,
          ty: wgpu::BindingType::Buffer {
            ty: wgpu::BufferBindingType::Uniform,
            has_dynamic_offset: false,
            min_binding_size: wgpu::BufferSize::new(std::mem::size_of::<PointsUniform>() as _),
          },
          count: None,
        }],
        label: Some("galaxy_material_bind_group_layout"),
      });

    let render_pipeline_layout = device.create_pipeline_layout(&wgpu::PipelineLayoutDescriptor {
      label: Some("render"),
      bind_group_layouts: &[camera_bind_group_layout, &material_bind_group_layout],
      push_constant_ranges: &[],
    });
    let point_buffer = wgpu::VertexBufferLayout {
      array_stride: std::mem::size_of::<PointVertex>() as wgpu::BufferAddress,
      step_mode: wgpu::VertexStepMode::Instance,
      attributes: &wgpu::vertex_attr_array![0 => Float32x3, 1 => Float32x3],
    };
    let additive = wgpu::BlendComponent {
      src_factor: wgpu::BlendFactor::SrcAlpha,
      dst_factor: wgpu::BlendFactor::One,
      operation: wgpu::BlendOperation::Add,
    };
    let render_pipeline = device.create_render_pipeline(&wgpu::RenderPipelineDescriptor {
      label: Some("Render Pipeline"),
      layout: Some(&render_pipeline_layout),
      vertex: wgpu::VertexState {
        module: &draw_shader,
        entry_point: "main_vs",
        compilation_options: PipelineCompilationOptions::default(),
        buffers: &[point_buffer],
      },
      fragment: Some(wgpu::FragmentState {
        module: &draw_shader,
        entry_point: "main_fs",
        compilation_options: PipelineCompilationOptions::default(),
        targets: &[Some(wgpu::ColorTargetState {
          format,
          blend: Some(wgpu::BlendState {
            color: additive,
            alpha: additive,
          }),
          write_mask: wgpu::ColorWrites::ALL,
        })],
      }),
      primitive: wgpu::PrimitiveState::default(),
      depth_stencil: None,
      multisample: wgpu::MultisampleState::default(),
      multiview: None,
      cache: None,
    });

    Render {
      render_pipeline,
      backend: GpuPoints {
        device,
        layout: material_bind_group_layout,
      },
    }
  }

  /// Upload the per-frame model rotation and viewport for `points`.
  pub fn update(
    &self,
    queue: &wgpu::Queue,
    points: &Points<GpuPoints>,
    rotation: f32,
    config: &wgpu::SurfaceConfiguration,
  ) {
    let uniform = points.material.uniform(rotation, config.width, config.height);
    queue.write_buffer(&points.material.buffer, 0, bytemuck::cast_slice(&[uniform]));
  }

  pub fn render(
    &self,
    view: &wgpu::TextureView,
    device: &wgpu::Device,
    queue: &wgpu::Queue,
    camera_bind_group: &wgpu::BindGroup,
    points: Option<&Points<GpuPoints>>,
  ) {
    let color_attachments = [Some(wgpu::RenderPassColorAttachment {
      view,
      resolve_target: None,
      ops: wgpu::Operations {
        load: wgpu::LoadOp::Clear(wgpu::Color::BLACK),
        store: wgpu::StoreOp::Store,
      },
    })];
    let render_pass_descriptor = wgpu::RenderPassDescriptor {
      label: None,
      color_attachments: &color_attachments,
      depth_stencil_attachment: None,
      timestamp_writes: None,
      occlusion_query_set: None,
    };
    let mut command_encoder =
      device.create_command_encoder(&wgpu::CommandEncoderDescriptor { label: None });
    {
      let mut rpass = command_encoder.begin_render_pass(&render_pass_descriptor);
      if let Some(points) = points.filter(|p| p.geometry.len > 0) {
        rpass.set_pipeline(&self.render_pipeline);
        rpass.set_bind_group(0, camera_bind_group, &[]);
        rpass.set_bind_group(1, &points.material.bind_group, &[]);
        rpass.set_vertex_buffer(0, points.geometry.buffer.slice(..));
        rpass.draw(0..6, 0..points.geometry.len);
      }
    }
    queue.submit(Some(command_encoder.finish()));
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn uniform_layout_is_16_byte_aligned() {
    assert_eq!(std::mem::size_of::<PointsUniform>() % 16, 0);
    assert_eq!(std::mem::size_of::<PointVertex>(), 24);
  }

  #[test]
  fn largest_galaxy_fits_default_buffer_limit() {
    let bytes = crate::params::MAX_COUNT as u64 * std::mem::size_of::<PointVertex>() as u64;
    assert!(bytes <= wgpu::Limits::default().max_buffer_size);
  }
}
