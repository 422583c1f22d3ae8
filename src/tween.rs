use glam::Vec3;

/// Quadratic ease-in-out over `[0, 1]`.
pub fn ease(t: f32) -> f32 {
  let t = t.clamp(0., 1.);
  if t < 0.5 {
    2. * t * t
  } else {
    1. - (-2. * t + 2.).powi(2) / 2.
  }
}

pub fn lerp(a: f32, b: f32, t: f32) -> f32 {
  a + (b - a) * t
}

pub fn lerp_vec3(a: Vec3, b: Vec3, t: f32) -> Vec3 {
  a + (b - a) * t
}

/// Tween progress at `now`, clamped to `[0, 1]`. `duration` must be positive.
pub fn progress(start_time: f64, duration: f64, now: f64) -> f32 {
  ((now - start_time) / duration).clamp(0., 1.) as f32
}
