use galaxy_generator::galaxy::{Galaxy, HeadlessBackend};
use galaxy_generator::initialize::generate_galaxy;
use galaxy_generator::params::{Parameter, ParameterChanged};
use galaxy_generator::GalaxyParams;
use rand::{rngs::SmallRng, SeedableRng};
use std::f32::consts::{PI, TAU};

fn wrap(angle: f32) -> f32 {
  (angle + PI).rem_euclid(TAU) - PI
}

#[test]
fn zero_randomness_lies_exactly_on_spiral_arms() {
  let params = GalaxyParams {
    count: 100,
    radius: 5.0,
    branches: 3,
    spin: 1.0,
    randomness: 0.0,
    randomness_power: 3.0,
    ..GalaxyParams::default()
  };
  let mut rng = SmallRng::seed_from_u64(2024);
  let cloud = generate_galaxy(&params, &mut rng);
  assert_eq!(cloud.len(), 100);

  for i in 0..cloud.len() {
    let [x, y, z] = cloud.position(i);
    assert_eq!(y, 0.0, "point {i} left the galactic plane");

    let r = (x * x + z * z).sqrt();
    assert!(r < params.radius);
    let branch = (i as u32 % params.branches) as f32 / params.branches as f32 * TAU;
    let theta = branch + r * params.spin;
    assert!((x - theta.cos() * r).abs() < 1e-4, "x mismatch at {i}");
    assert!((z - theta.sin() * r).abs() < 1e-4, "z mismatch at {i}");
  }
}

#[test]
fn arms_cluster_around_equally_spaced_angles() {
  let params = GalaxyParams {
    count: 10_000,
    radius: 5.0,
    branches: 4,
    spin: 0.0,
    randomness: 0.2,
    randomness_power: 3.0,
    ..GalaxyParams::default()
  };
  let mut rng = SmallRng::seed_from_u64(99);
  let cloud = generate_galaxy(&params, &mut rng);

  let mut sums = vec![0.0f32; 4];
  let mut counts = vec![0u32; 4];
  for i in 0..cloud.len() {
    let [x, _, z] = cloud.position(i);
    if (x * x + z * z).sqrt() < 1.3 {
      continue;
    }
    let arm = i % 4;
    let expected = arm as f32 * TAU / 4.0;
    let offset = wrap(z.atan2(x) - expected);
    assert!(offset.abs() < 0.3, "point {i} is {offset} rad off its arm");
    sums[arm] += offset;
    counts[arm] += 1;
  }
  for arm in 0..4 {
    assert!(counts[arm] > 1500);
    let mean = sums[arm] / counts[arm] as f32;
    assert!(mean.abs() < 0.02, "arm {arm} mean offset {mean}");
  }
}

#[test]
fn parameter_changes_rebuild_without_leaking() {
  let mut backend = HeadlessBackend::default();
  let mut galaxy = Galaxy::new(
    GalaxyParams {
      count: 1000,
      ..GalaxyParams::default()
    },
    Some(5),
  );
  galaxy.regenerate(&mut backend);

  let changes = [
    ParameterChanged::scalar(Parameter::Count, 2000.0),
    ParameterChanged::scalar(Parameter::Branches, 6.0),
    ParameterChanged::scalar(Parameter::Radius, 8.0),
    ParameterChanged::scalar(Parameter::Size, 0.02),
  ];
  for change in changes {
    let cloud = galaxy.handle(change, &mut backend).unwrap();
    assert_eq!(cloud.positions.len(), 3 * galaxy.params().count as usize);
    assert_eq!(cloud.colors.len(), cloud.positions.len());
    assert_eq!(backend.live_geometries, 1);
    assert_eq!(backend.live_materials, 1);
  }
  assert_eq!(galaxy.generation(), 5);
  assert_eq!(galaxy.points().unwrap().material.size, 0.02);
}
