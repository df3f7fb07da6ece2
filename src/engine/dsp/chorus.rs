// Stereo chorus/flanger
//
// One channel:
//
//                 ---------[mix >----------------------------
//                 |                                         |
//                 |x1                                       v
//  xin ------>[+]----->[z^-M]--[interp.]----[fw >--------->[+]-----> yout
//              ^         delay line      |
//              |                         |
//              --< fb]<-------------------
//
// Both channels share the mono input; their LFOs start in quadrature.

use super::frac_delay::FracDelay;
use super::lfo::Lfo;
use crate::engine::config::{ChannelConfig, ChorusConfig, DEPTH, MARGIN};

/// Where the regenerative tap is read from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FeedbackTap {
  /// Same modulated read as the forward path.
  Variable,
  /// Second, unmodulated read at the base delay.
  Fixed,
}

impl FeedbackTap {
  pub fn toggled(self) -> Self {
    match self {
      FeedbackTap::Variable => FeedbackTap::Fixed,
      FeedbackTap::Fixed => FeedbackTap::Variable,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Polarity {
  Positive,
  Negative,
}

impl Polarity {
  pub fn flipped(self) -> Self {
    match self {
      Polarity::Positive => Polarity::Negative,
      Polarity::Negative => Polarity::Positive,
    }
  }

  #[inline]
  fn apply(self, x: f32) -> f32 {
    match self {
      Polarity::Positive => x,
      Polarity::Negative => -x,
    }
  }
}

pub struct ChorusChannel {
  pub lfo: Lfo,
  line: FracDelay,
  base_delay: f32,
  // feedback kept as magnitude + sign so flips never drift
  fb: f32,
  polarity: Polarity,
  fw: f32,
  mix: f32,
  tap: FeedbackTap,
  init_phase: f32,
}

impl ChorusChannel {
  pub fn new(cfg: &ChannelConfig) -> Self {
    let mut ch = Self {
      lfo: Lfo::new(cfg.sweep, cfg.rate, cfg.phase),
      line: FracDelay::new(DEPTH),
      base_delay: cfg.delay,
      fb: 0.0,
      polarity: Polarity::Positive,
      fw: cfg.forward,
      mix: cfg.mix,
      tap: FeedbackTap::Variable,
      init_phase: cfg.phase,
    };
    ch.set_feedback(cfg.feedback);
    ch
  }

  // ─── Raw accessors (unclamped) ──────────────────────────────────────────

  pub fn delay(&self) -> f32 { self.base_delay }
  pub fn set_delay(&mut self, d: f32) { self.base_delay = d; }

  /// Signed feedback gain.
  pub fn feedback(&self) -> f32 { self.polarity.apply(self.fb) }
  pub fn set_feedback(&mut self, g: f32) {
    self.polarity = if g < 0.0 { Polarity::Negative } else { Polarity::Positive };
    self.fb = g.abs();
  }
  pub fn polarity(&self) -> Polarity { self.polarity }

  pub fn forward(&self) -> f32 { self.fw }
  pub fn set_forward(&mut self, g: f32) { self.fw = g; }

  pub fn mix(&self) -> f32 { self.mix }
  pub fn set_mix(&mut self, g: f32) { self.mix = g; }

  pub fn tap(&self) -> FeedbackTap { self.tap }
  pub fn set_tap(&mut self, tap: FeedbackTap) { self.tap = tap; }

  pub fn line(&self) -> &FracDelay { &self.line }

  // ─── Control nudges ─────────────────────────────────────────────────────

  pub fn scale_rate(&mut self, k: f32) { self.lfo.freq *= k; }
  pub fn scale_sweep(&mut self, k: f32) { self.lfo.amp *= k; }
  pub fn scale_feedback(&mut self, k: f32) { self.fb *= k; }

  /// Grows the base delay unless that would reach the line capacity.
  pub fn grow_delay(&mut self, k: f32) {
    let d = self.base_delay * k;
    if d < DEPTH as f32 { self.base_delay = d; }
  }
  pub fn shrink_delay(&mut self, k: f32) { self.base_delay *= k; }

  pub fn toggle_tap(&mut self) { self.tap = self.tap.toggled(); }
  pub fn flip_polarity(&mut self) { self.polarity = self.polarity.flipped(); }

  pub fn reset_phase(&mut self) { self.lfo.set_phase(self.init_phase); }

  pub fn clear(&mut self) { self.line.clear(); }

  #[inline]
  pub fn process(&mut self, xin: f32) -> f32 {
    let margin = MARGIN as f32;
    let fb = self.feedback();
    let x2 = self.line.read(self.base_delay + self.lfo.advance() + margin);
    let x1 = match self.tap {
      FeedbackTap::Variable => xin + fb * x2,
      FeedbackTap::Fixed => xin + fb * self.line.read(self.base_delay + margin),
    };
    let yout = self.mix * x1 + self.fw * x2;
    self.line.write(x1);
    yout
  }
}

pub struct StereoChorus {
  pub left: ChorusChannel,
  pub right: ChorusChannel,
}

impl StereoChorus {
  pub fn new(cfg: &ChorusConfig) -> Self {
    Self { left: ChorusChannel::new(&cfg.left), right: ChorusChannel::new(&cfg.right) }
  }

  #[inline]
  pub fn process(&mut self, xin: f32) -> (f32, f32) {
    (self.left.process(xin), self.right.process(xin))
  }

  #[inline]
  fn both(&mut self, mut f: impl FnMut(&mut ChorusChannel)) {
    f(&mut self.left);
    f(&mut self.right);
  }

  pub fn inc_rate(&mut self) { self.both(|c| c.scale_rate(1.05)); }
  pub fn dec_rate(&mut self) { self.both(|c| c.scale_rate(0.95)); }
  pub fn inc_delay(&mut self) { self.both(|c| c.grow_delay(1.1)); }
  pub fn dec_delay(&mut self) { self.both(|c| c.shrink_delay(0.9)); }
  pub fn inc_feedback(&mut self) { self.both(|c| c.scale_feedback(1.02)); }
  pub fn dec_feedback(&mut self) { self.both(|c| c.scale_feedback(0.95)); }
  pub fn inc_sweep(&mut self) { self.both(|c| c.scale_sweep(1.05)); }
  pub fn dec_sweep(&mut self) { self.both(|c| c.scale_sweep(0.95)); }
  pub fn toggle_mode(&mut self) { self.both(ChorusChannel::toggle_tap); }
  pub fn flip_feedback_sign(&mut self) { self.both(ChorusChannel::flip_polarity); }
  pub fn reset_phase(&mut self) { self.both(ChorusChannel::reset_phase); }
  pub fn clear(&mut self) { self.both(ChorusChannel::clear); }
}
