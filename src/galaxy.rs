use crate::initialize::{generate_galaxy, PointCloud};
use crate::params::ParameterChanged;
use crate::GalaxyParams;
use log::debug;
use rand::{rngs::SmallRng, Rng, SeedableRng};

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PointsMaterial {
  pub size: f32,
  /// When set, `size` is in world units and shrinks with distance;
  /// otherwise it is in pixels.
  pub size_attenuation: bool,
}

impl PointsMaterial {
  pub fn from_params(params: &GalaxyParams) -> Self {
    Self {
      size: params.size,
      size_attenuation: true,
    }
  }
}

/// Allocates and releases the resources behind a point object.
pub trait PointsBackend {
  type Geometry;
  type Material;

  fn create_geometry(&mut self, cloud: &PointCloud) -> Self::Geometry;
  fn create_material(&mut self, material: &PointsMaterial) -> Self::Material;
  fn dispose_geometry(&mut self, geometry: Self::Geometry);
  fn dispose_material(&mut self, material: Self::Material);
}

pub struct Points<B: PointsBackend> {
  pub geometry: B::Geometry,
  pub material: B::Material,
  pub len: u32,
}

pub struct Galaxy<B: PointsBackend, R: Rng = SmallRng> {
  params: GalaxyParams,
  rng: R,
  points: Option<Points<B>>,
  generation: u64,
}

impl<B: PointsBackend> Galaxy<B, SmallRng> {
  pub fn new(params: GalaxyParams, seed: Option<u64>) -> Self {
    let rng = match seed {
      Some(seed) => SmallRng::seed_from_u64(seed),
      None => SmallRng::from_entropy(),
    };
    Self::with_rng(params, rng)
  }
}

impl<B: PointsBackend, R: Rng> Galaxy<B, R> {
  pub fn with_rng(params: GalaxyParams, rng: R) -> Self {
    Self {
      params,
      rng,
      points: None,
      generation: 0,
    }
  }

  pub fn params(&self) -> &GalaxyParams {
    &self.params
  }

  pub fn points(&self) -> Option<&Points<B>> {
    self.points.as_ref()
  }

  pub fn generation(&self) -> u64 {
    self.generation
  }

  /// Replace the point object with a freshly generated one. The previous
  /// geometry and material are disposed first.
  pub fn regenerate(&mut self, backend: &mut B) -> PointCloud {
    self.dispose(backend);

    let cloud = generate_galaxy(&self.params, &mut self.rng);
    let geometry = backend.create_geometry(&cloud);
    let material = backend.create_material(&PointsMaterial::from_params(&self.params));
    self.points = Some(Points {
      geometry,
      material,
      len: cloud.len() as u32,
    });
    self.generation += 1;
    debug!(
      "regenerated galaxy #{} with {} points",
      self.generation,
      cloud.len()
    );
    cloud
  }

  pub fn handle(&mut self, change: ParameterChanged, backend: &mut B) -> Option<PointCloud> {
    if !self.params.apply(change) {
      return None;
    }
    debug!("{} -> {}", change.parameter, change.value);
    Some(self.regenerate(backend))
  }

  pub fn dispose(&mut self, backend: &mut B) {
    if let Some(old) = self.points.take() {
      backend.dispose_geometry(old.geometry);
      backend.dispose_material(old.material);
    }
  }
}

#[derive(Debug, Default)]
pub struct HeadlessBackend {
  pub live_geometries: usize,
  pub live_materials: usize,
  pub total_points: u64,
}

impl PointsBackend for HeadlessBackend {
  type Geometry = PointCloud;
  type Material = PointsMaterial;

  fn create_geometry(&mut self, cloud: &PointCloud) -> PointCloud {
    self.live_geometries += 1;
    self.total_points += cloud.len() as u64;
    cloud.clone()
  }

  fn create_material(&mut self, material: &PointsMaterial) -> PointsMaterial {
    self.live_materials += 1;
    *material
  }

  fn dispose_geometry(&mut self, _geometry: PointCloud) {
    self.live_geometries -= 1;
  }

  fn dispose_material(&mut self, _material: PointsMaterial) {
    self.live_materials -= 1;
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::params::Parameter;
  use std::collections::HashMap;

  /// Hands out numbered handles and records how often each was disposed.
  #[derive(Default)]
  struct Recorder {
    next: u32,
    created: Vec<u32>,
    disposed: HashMap<u32, u32>,
  }

  impl Recorder {
    fn issue(&mut self) -> u32 {
      self.next += 1;
      self.created.push(self.next);
      self.next
    }

    fn release(&mut self, id: u32) {
      *self.disposed.entry(id).or_default() += 1;
    }
  }

  impl PointsBackend for Recorder {
    type Geometry = u32;
    type Material = u32;

    fn create_geometry(&mut self, _cloud: &PointCloud) -> u32 {
      self.issue()
    }

    fn create_material(&mut self, _material: &PointsMaterial) -> u32 {
      self.issue()
    }

    fn dispose_geometry(&mut self, geometry: u32) {
      self.release(geometry);
    }

    fn dispose_material(&mut self, material: u32) {
      self.release(material);
    }
  }

  fn small() -> GalaxyParams {
    GalaxyParams {
      count: 200,
      ..GalaxyParams::default()
    }
  }

  #[test]
  fn stale_resources_disposed_exactly_once() {
    let mut backend = Recorder::default();
    let mut galaxy = Galaxy::with_rng(small(), SmallRng::seed_from_u64(1));
    for _ in 0..5 {
      galaxy.regenerate(&mut backend);
    }
    assert_eq!(backend.created.len(), 10);
    let live = galaxy.points().map(|p| [p.geometry, p.material]).unwrap();
    for id in &backend.created {
      let expected = u32::from(!live.contains(id));
      assert_eq!(backend.disposed.get(id).copied().unwrap_or(0), expected, "handle {id}");
    }

    galaxy.dispose(&mut backend);
    assert!(galaxy.points().is_none());
    assert!(backend.created.iter().all(|id| backend.disposed[id] == 1));
  }

  #[test]
  fn unchanged_value_does_not_regenerate() {
    let mut backend = Recorder::default();
    let mut galaxy = Galaxy::with_rng(small(), SmallRng::seed_from_u64(2));
    galaxy.regenerate(&mut backend);
    let same = ParameterChanged::scalar(Parameter::Spin, galaxy.params().spin);
    assert!(galaxy.handle(same, &mut backend).is_none());
    assert_eq!(galaxy.generation(), 1);

    let cloud = galaxy
      .handle(ParameterChanged::scalar(Parameter::Count, 500.0), &mut backend)
      .unwrap();
    assert_eq!(cloud.len(), 500);
    assert_eq!(galaxy.points().unwrap().len, 500);
    assert_eq!(galaxy.generation(), 2);
  }

  #[test]
  fn headless_backend_keeps_one_live_object() {
    let mut backend = HeadlessBackend::default();
    let mut galaxy = Galaxy::new(small(), Some(3));
    galaxy.regenerate(&mut backend);
    galaxy.handle(ParameterChanged::scalar(Parameter::Branches, 5.0), &mut backend);
    assert_eq!(backend.live_geometries, 1);
    assert_eq!(backend.live_materials, 1);
    assert_eq!(backend.total_points, 400);
    galaxy.dispose(&mut backend);
    assert_eq!(backend.live_geometries, 0);
  }
}
