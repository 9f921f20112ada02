use crate::{GalaxyParams, PointVertex};
use rand::Rng;
use serde::Serialize;
use std::f32::consts::TAU;

/// Flat position and color buffers, three floats per point.
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
pub struct PointCloud {
  pub positions: Vec<f32>,
  pub colors: Vec<f32>,
}

impl PointCloud {
  pub fn len(&self) -> usize {
    self.positions.len() / 3
  }

  pub fn is_empty(&self) -> bool {
    self.positions.is_empty()
  }

  pub fn position(&self, i: usize) -> [f32; 3] {
    [self.positions[3 * i], self.positions[3 * i + 1], self.positions[3 * i + 2]]
  }

  pub fn color(&self, i: usize) -> [f32; 3] {
    [self.colors[3 * i], self.colors[3 * i + 1], self.colors[3 * i + 2]]
  }

  /// Interleave into the instance layout the renderer consumes.
  pub fn vertices(&self) -> Vec<PointVertex> {
    (0..self.len())
      .map(|i| PointVertex {
        pos: self.position(i),
        color: self.color(i),
      })
      .collect()
  }

  pub fn bounds(&self) -> Option<([f32; 3], [f32; 3])> {
    if self.is_empty() {
      return None;
    }
    let mut min = [f32::MAX; 3];
    let mut max = [f32::MIN; 3];
    for p in self.positions.chunks_exact(3) {
      for axis in 0..3 {
        min[axis] = min[axis].min(p[axis]);
        max[axis] = max[axis].max(p[axis]);
      }
    }
    Some((min, max))
  }
}

#[must_use]
pub fn generate_galaxy<R: Rng + ?Sized>(params: &GalaxyParams, rng: &mut R) -> PointCloud {
  let count = params.count as usize;
  let mut positions = Vec::with_capacity(3 * count);
  let mut colors = Vec::with_capacity(3 * count);

  for i in 0..count {
    let radius = rng.gen::<f32>() * params.radius;
    let spin_angle = radius * params.spin;
    let branch_angle = if params.branches == 0 {
      0.0
    } else {
      (i as u32 % params.branches) as f32 / params.branches as f32 * TAU
    };

    let random_x = jitter(rng, params);
    let random_y = jitter(rng, params);
    let random_z = jitter(rng, params);

    let angle = branch_angle + spin_angle;
    positions.extend_from_slice(&[
      angle.cos() * radius + random_x,
      random_y,
      angle.sin() * radius + random_z,
    ]);

    let t = if params.radius > 0.0 { radius / params.radius } else { 0.0 };
    let color = params.inside_color.lerp(params.outside_color, t);
    colors.extend_from_slice(&color.to_array());
  }

  PointCloud { positions, colors }
}

fn jitter<R: Rng + ?Sized>(rng: &mut R, params: &GalaxyParams) -> f32 {
  let sign = if rng.gen_bool(0.5) { 1.0 } else { -1.0 };
  rng.gen::<f32>().powf(params.randomness_power) * sign * params.randomness
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::color::Color;
  use rand::{rngs::SmallRng, SeedableRng};

  fn params(count: u32) -> GalaxyParams {
    GalaxyParams {
      count,
      ..GalaxyParams::default()
    }
  }

  #[test]
  fn buffer_lengths_match_count() {
    let mut rng = SmallRng::seed_from_u64(42);
    for count in [0, 1, 7, 1000] {
      let cloud = generate_galaxy(&params(count), &mut rng);
      assert_eq!(cloud.positions.len(), 3 * count as usize);
      assert_eq!(cloud.colors.len(), 3 * count as usize);
      assert_eq!(cloud.len(), count as usize);
    }
  }

  #[test]
  fn empty_count_gives_empty_buffers() {
    let mut rng = SmallRng::seed_from_u64(1);
    let cloud = generate_galaxy(&params(0), &mut rng);
    assert!(cloud.is_empty());
    assert!(cloud.bounds().is_none());
    assert!(cloud.vertices().is_empty());
  }

  #[test]
  fn radius_stays_inside_galaxy_without_jitter() {
    let mut rng = SmallRng::seed_from_u64(7);
    let p = GalaxyParams {
      count: 5000,
      randomness: 0.0,
      ..GalaxyParams::default()
    };
    let cloud = generate_galaxy(&p, &mut rng);
    for i in 0..cloud.len() {
      let [x, _, z] = cloud.position(i);
      assert!((x * x + z * z).sqrt() < p.radius + 1e-4);
    }
  }

  #[test]
  fn colors_run_from_inside_to_outside() {
    let mut rng = SmallRng::seed_from_u64(3);
    let p = GalaxyParams {
      count: 2000,
      randomness: 0.0,
      inside_color: Color::new(1.0, 0.0, 0.0),
      outside_color: Color::new(0.0, 0.0, 1.0),
      ..GalaxyParams::default()
    };
    let cloud = generate_galaxy(&p, &mut rng);
    let mut samples: Vec<(f32, [f32; 3])> = (0..cloud.len())
      .map(|i| {
        let [x, _, z] = cloud.position(i);
        ((x * x + z * z).sqrt(), cloud.color(i))
      })
      .collect();
    samples.sort_by(|a, b| a.0.total_cmp(&b.0));
    for pair in samples.windows(2) {
      assert!(pair[1].1[0] <= pair[0].1[0] + 1e-4, "red must not increase");
      assert!(pair[1].1[2] >= pair[0].1[2] - 1e-4, "blue must not decrease");
    }
    for (r, c) in samples {
      let t = r / p.radius;
      assert!((c[0] - (1.0 - t)).abs() < 1e-3);
      assert!((c[2] - t).abs() < 1e-3);
    }
  }

  #[test]
  fn zero_galaxy_radius_uses_inside_color() {
    let mut rng = SmallRng::seed_from_u64(5);
    let p = GalaxyParams {
      count: 10,
      radius: 0.0,
      ..GalaxyParams::default()
    };
    let cloud = generate_galaxy(&p, &mut rng);
    for i in 0..cloud.len() {
      assert_eq!(cloud.color(i), p.inside_color.to_array());
    }
  }

  #[test]
  fn jitter_is_bounded_by_randomness() {
    let mut rng = SmallRng::seed_from_u64(11);
    let p = GalaxyParams {
      count: 3000,
      randomness: 0.5,
      ..GalaxyParams::default()
    };
    let cloud = generate_galaxy(&p, &mut rng);
    for i in 0..cloud.len() {
      assert!(cloud.position(i)[1].abs() <= p.randomness);
    }
  }

  #[test]
  fn vertices_interleave_buffers() {
    let mut rng = SmallRng::seed_from_u64(9);
    let cloud = generate_galaxy(&params(4), &mut rng);
    let vertices = cloud.vertices();
    assert_eq!(vertices.len(), 4);
    assert_eq!(vertices[2].pos, cloud.position(2));
    assert_eq!(vertices[2].color, cloud.color(2));
  }
}
