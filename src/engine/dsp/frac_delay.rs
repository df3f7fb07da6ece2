//! Fractional delay line read through 3rd order Lagrange interpolation.
//!
//! The chorus tap moves every sample, so the fractional part of the lag
//! never settles; a 4-point kernel keeps the top end from dulling without
//! the cost of anything longer.

use super::ring::Ring;
use crate::engine::config::MARGIN;

/// 3rd order Lagrange interpolation of `y[n], y[n-1], y[n-2], y[n-3]` at offset `f`.
#[inline]
pub fn lagrange3(f: f32, y_n: f32, y_n_1: f32, y_n_2: f32, y_n_3: f32) -> f32 {
  (f - 2.0) * (f - 3.0) * (-(1.0 / 6.0) * (f - 1.0) * y_n + 0.5 * f * y_n_1)
    + f * (f - 1.0) * (-0.5 * (f - 3.0) * y_n_2 + (1.0 / 6.0) * (f - 2.0) * y_n_3)
}

#[derive(Clone, Debug)]
pub struct FracDelay {
  ring: Ring,
}

impl FracDelay {
  /// The write index starts on the last slot.
  pub fn new(capacity: usize) -> Self {
    let capacity = capacity.max(2 * MARGIN + 1);
    Self { ring: Ring::with_index(capacity, capacity - 1) }
  }

  #[inline]
  pub fn capacity(&self) -> usize { self.ring.len() }

  #[inline]
  pub fn write_index(&self) -> usize { self.ring.index() }

  /// Lags outside `[MARGIN, capacity - MARGIN]` are clamped, never rejected.
  #[inline]
  pub fn clamp_lag(&self, lag: f32) -> f32 {
    let hi = (self.capacity() - MARGIN) as f32;
    // NaN lands on the floor
    if lag >= MARGIN as f32 { lag.min(hi) } else { MARGIN as f32 }
  }

  #[inline]
  pub fn write(&mut self, x: f32) { self.ring.write_advance(x); }

  #[inline]
  pub fn read(&self, lag: f32) -> f32 {
    let d = self.clamp_lag(lag);
    let i = d.floor();
    let f = d - i;
    let i = i as usize;
    lagrange3(f, self.ring.read_at(i), self.ring.read_at(i + 1), self.ring.read_at(i + 2), self.ring.read_at(i + 3))
  }

  pub fn clear(&mut self) { self.ring.clear(); }
}

#[cfg(test)]
mod tests {
  use super::*;

  const CAP: usize = 64;

  fn impulse_then_zeros(zeros: usize) -> FracDelay {
    let mut d = FracDelay::new(CAP);
    d.write(1.0);
    for _ in 0..zeros {
      d.write(0.0);
    }
    d
  }

  #[test]
  fn kernel_hits_samples_at_integer_offsets() {
    let ys = [0.3, -0.7, 1.1, 0.25];
    for (k, want) in ys.iter().enumerate() {
      let got = lagrange3(k as f32, ys[0], ys[1], ys[2], ys[3]);
      assert!((got - want).abs() < 1e-5, "f={k}: {got} vs {want}");
    }
  }

  #[test]
  fn kernel_is_exact_for_cubics() {
    // samples of p(t) = t^3 - 2t + 1 at t = 0, 1, 2, 3
    let p = |t: f32| t * t * t - 2.0 * t + 1.0;
    for f in [0.1, 0.5, 0.77, 1.5, 2.25] {
      let got = lagrange3(f, p(0.0), p(1.0), p(2.0), p(3.0));
      assert!((got - p(f)).abs() < 1e-4, "f={f}: {got} vs {}", p(f));
    }
  }

  #[test]
  fn impulse_response_matches_kernel() {
    let lo = MARGIN as f32;
    let hi = (CAP - MARGIN) as f32;
    let mut lag = lo;
    while lag <= hi {
      let n = lag.floor() as usize;
      let f = lag - n as f32;
      // the impulse is now n + 1 writes old, i.e. it sits at y[n-1]
      let d = impulse_then_zeros(n);
      let want = lagrange3(f, 0.0, 1.0, 0.0, 0.0);
      let got = d.read(lag);
      assert!((got - want).abs() < 1e-5, "lag {lag}: {got} vs {want}");
      lag += 0.37;
    }
  }

  #[test]
  fn integer_lag_reads_exact_sample() {
    let mut d = FracDelay::new(CAP);
    for i in 0..200 {
      d.write(i as f32);
    }
    // read(k) is the sample written k writes ago, counting the latest as 1
    assert!((d.read(10.0) - 190.0).abs() < 1e-3);
    assert!((d.read(6.0) - 194.0).abs() < 1e-3);
  }

  #[test]
  fn lag_is_clamped() {
    let d = FracDelay::new(CAP);
    assert_eq!(d.clamp_lag(0.0), MARGIN as f32);
    assert_eq!(d.clamp_lag(-40.0), MARGIN as f32);
    assert_eq!(d.clamp_lag(1e9), (CAP - MARGIN) as f32);
    assert_eq!(d.clamp_lag(f32::NAN), MARGIN as f32);
    assert_eq!(d.clamp_lag(17.5), 17.5);

    let mut d = FracDelay::new(CAP);
    for i in 0..CAP {
      d.write(i as f32);
    }
    assert_eq!(d.read(-3.0), d.read(MARGIN as f32));
    assert_eq!(d.read(500.0), d.read((CAP - MARGIN) as f32));
  }

  #[test]
  fn write_index_wraps() {
    let mut d = FracDelay::new(CAP);
    assert_eq!(d.write_index(), CAP - 1);
    for _ in 0..(3 * CAP + 5) {
      d.write(0.5);
      assert!(d.write_index() < d.capacity());
    }
  }
}
