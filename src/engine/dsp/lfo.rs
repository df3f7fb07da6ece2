use std::f32::consts::PI;

use once_cell::sync::Lazy;

use crate::engine::config::TS;

const TAU: f32 = 2.0 * PI;

pub const SINETABLE_SIZE: usize = 1024;
/// Table index per radian of phase.
const ALPHA: f32 = SINETABLE_SIZE as f32 / TAU;

// One guard point at the end: a phase just below 2π rounds to SINETABLE_SIZE.
static SINETABLE: Lazy<[f32; SINETABLE_SIZE + 1]> = Lazy::new(|| {
  let mut table = [0.0f32; SINETABLE_SIZE + 1];
  for (i, v) in table.iter_mut().enumerate() {
    *v = (TAU * i as f32 / SINETABLE_SIZE as f32).sin();
  }
  log::debug!("sine table ({SINETABLE_SIZE} points) generated");
  table
});

/// Forces the table build outside the audio path.
pub fn warm_table() { Lazy::force(&SINETABLE); }

/// Phase-accumulating table LFO with a unipolar output in `[0, 2·amp]`.
#[derive(Clone, Debug)]
pub struct Lfo {
  pub amp: f32,
  pub freq: f32,
  phase: f32,
  out: f32,
}

impl Lfo {
  pub fn new(amp: f32, freq: f32, phase: f32) -> Self {
    let mut lfo = Self { amp, freq, phase: 0.0, out: 0.0 };
    lfo.set_phase(phase);
    lfo
  }

  #[inline]
  pub fn phase(&self) -> f32 { self.phase }

  #[inline]
  pub fn last(&self) -> f32 { self.out }

  pub fn set_phase(&mut self, phase: f32) {
    self.phase = phase;
    self.wrap();
  }

  #[inline]
  fn wrap(&mut self) {
    if !self.phase.is_finite() {
      self.phase = 0.0;
      return;
    }
    if self.phase < 0.0 {
      self.phase += TAU;
    } else if self.phase >= TAU {
      self.phase -= TAU;
    }
    // more than one cycle per step
    if !(0.0..TAU).contains(&self.phase) {
      self.phase = self.phase.rem_euclid(TAU);
      if self.phase >= TAU { self.phase = 0.0; }
    }
  }

  #[inline]
  pub fn advance(&mut self) -> f32 {
    self.phase += TAU * TS * self.freq;
    self.wrap();
    let idx = ((ALPHA * self.phase).round() as usize).min(SINETABLE_SIZE);
    self.out = self.amp * (SINETABLE[idx] + 1.0);
    self.out
  }
}
