//! Single-tap feedback echo with a low-pass in the loop.
//!
//! ```text
//!  x ──►(+)──► clip ──┬──► y
//!        ▲            │
//!        │       [delay line: shift]
//!        │            │
//!        └── fb ◄── [one-pole] ◄┘
//! ```
//!
//! Each pass through the loop is filtered again, so later repeats come back
//! darker, like a tape or BBD echo.

use super::filter::OnePole;
use super::ring::Ring;
use crate::engine::config::{EchoConfig, DELAYLINE_LEN, DELTA_DELAY, MIN_DELAY};

pub struct Echo {
  ring: Ring,
  // write cursor is the ring index
  read: usize,
  shift: usize,
  lp: OnePole,
  fb: f32,
  min_delay: usize,
  step: usize,
}

impl Echo {
  pub const CAPACITY: usize = DELAYLINE_LEN + 2;

  pub fn new(cfg: &EchoConfig) -> Self { Self::with_capacity(Self::CAPACITY, cfg) }

  /// Read cursor starts at slot 0, write cursor `shift` slots ahead.
  pub fn with_capacity(capacity: usize, cfg: &EchoConfig) -> Self {
    let capacity = capacity.max(2);
    let shift = cfg.shift.clamp(1, capacity - 1);
    Self {
      ring: Ring::with_index(capacity, shift),
      read: 0,
      shift,
      lp: OnePole::new(cfg.coefficient),
      fb: cfg.feedback,
      min_delay: MIN_DELAY,
      step: DELTA_DELAY,
    }
  }

  /// Overrides the nudge bounds used by `inc_time` / `dec_time`.
  pub fn with_limits(mut self, min_delay: usize, step: usize) -> Self {
    self.min_delay = min_delay;
    self.step = step;
    self
  }

  pub fn capacity(&self) -> usize { self.ring.len() }
  pub fn read_cursor(&self) -> usize { self.read }
  pub fn write_cursor(&self) -> usize { self.ring.index() }
  pub fn shift(&self) -> usize { self.shift }

  /// Unconstrained apart from keeping the cursors distinct.
  pub fn set_shift(&mut self, shift: usize) {
    self.shift = shift.clamp(1, self.capacity() - 1);
    self.sync_read();
  }

  pub fn feedback(&self) -> f32 { self.fb }
  pub fn set_feedback(&mut self, g: f32) { self.fb = g; }

  pub fn coefficient(&self) -> f32 { self.lp.coeff() }
  pub fn set_coefficient(&mut self, a: f32) { self.lp.set_coeff(a); }

  #[inline]
  fn sync_read(&mut self) { self.read = self.ring.back(self.ring.index(), self.shift); }

  #[inline]
  fn bounds(&self) -> (usize, usize) {
    let lo = self.min_delay + self.step;
    let hi = self.capacity().saturating_sub(self.step).max(lo);
    (lo, hi)
  }

  pub fn inc_time(&mut self) {
    let (lo, hi) = self.bounds();
    self.shift = (self.shift + self.step).min(hi).max(lo);
    self.sync_read();
  }

  pub fn dec_time(&mut self) {
    let (lo, hi) = self.bounds();
    self.shift = self.shift.saturating_sub(self.step).max(lo).min(hi);
    self.sync_read();
  }

  pub fn inc_feedback(&mut self) { self.fb *= 1.05; }
  pub fn dec_feedback(&mut self) { self.fb *= 0.95; }

  /// Zeroes the line and the filter memory; cursors keep their distance.
  pub fn clean(&mut self) {
    self.ring.clear();
    self.lp.reset();
  }

  #[inline]
  pub fn process(&mut self, x: f32) -> f32 {
    let tap = self.ring.get(self.read);
    let dy = self.lp.tick(tap);
    let y = clip(x + self.fb * dy);
    self.ring.write_advance(y);
    self.read += 1;
    if self.read >= self.ring.len() { self.read = 0; }
    y
  }
}

#[inline]
fn clip(y: f32) -> f32 {
  if y > 1.0 {
    1.0
  } else if y < -1.0 {
    -1.0
  } else if y.is_nan() {
    0.0
  } else {
    y
  }
}
