/// One-pole low-pass used inside the echo loop: `y = (1 - a)·x + a·y[n-1]`.
#[derive(Clone, Debug)]
pub struct OnePole {
  a: f32,
  y: f32,
}

impl OnePole {
  pub const MAX_COEFF: f32 = 0.999;

  pub fn new(a: f32) -> Self {
    let mut f = Self { a: 0.0, y: 0.0 };
    f.set_coeff(a);
    f
  }

  #[inline]
  pub fn coeff(&self) -> f32 { self.a }

  /// Clamped into `[0, MAX_COEFF]`; at 1 the filter would freeze.
  #[inline]
  pub fn set_coeff(&mut self, a: f32) {
    self.a = if a > 0.0 { a.min(Self::MAX_COEFF) } else { 0.0 };
  }

  #[inline]
  pub fn last(&self) -> f32 { self.y }

  #[inline]
  pub fn tick(&mut self, x: f32) -> f32 {
    self.y = (1.0 - self.a) * x + self.a * self.y;
    self.y
  }

  pub fn reset(&mut self) { self.y = 0.0; }
}
