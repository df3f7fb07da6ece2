//! Real-time buffer pipeline.
//!
//! The hardware plays an interleaved stereo `i16` buffer in a loop and
//! signals twice per lap: once when the first half has gone out, once when
//! the second has. Each signal refills the half that was just vacated with
//! `len / 4` frames, so the producer always works one half behind the
//! consumer. A fill must finish before the consumer comes back around to
//! it; nothing here detects a miss.
//!
//! Samples cross the buffer boundary as `f32` in `[-1, 1]`, clamped and
//! scaled to `i16` full range.

use crossbeam_channel::Receiver;
use dasp::Sample;

use crate::engine::{
  config::FxConfig,
  dsp::{chorus::StereoChorus, echo::Echo, lfo},
  messages::ControlMsg,
};

/// Most control messages applied per fill.
const DRAIN_CAP: usize = 32;

/// Mono input feeding the effect chain, one call per output frame.
pub trait SampleSource {
  fn next_sample(&mut self) -> f32;
}

impl<F: FnMut() -> f32> SampleSource for F {
  #[inline]
  fn next_sample(&mut self) -> f32 { self() }
}

/// Status light toggled around each fill: off while producing, on after.
pub trait Indicator {
  fn set(&mut self, on: bool);
}

impl Indicator for () {
  #[inline]
  fn set(&mut self, _on: bool) {}
}

/// Which half of the hardware buffer a fill writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Region {
  /// Words `[0, len/2)`, refilled on half-consumed.
  First,
  /// Words `[len/2, len)`, refilled on full-consumed.
  Second,
}

impl Region {
  /// Word range inside a buffer of `len` interleaved words.
  pub fn span(self, len: usize) -> std::ops::Range<usize> {
    let words = (len / 4) * 2;
    match self {
      Region::First => 0..words,
      Region::Second => words..2 * words,
    }
  }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PipelineState {
  AwaitingHalfConsumed,
  AwaitingFullConsumed,
}

#[inline]
fn to_word(x: f32) -> i16 { x.clamp(-1.0, 1.0).to_sample::<i16>() }

pub struct Pipeline<S: SampleSource, I: Indicator = ()> {
  pub chorus: StereoChorus,
  pub echo: Echo,
  source: S,
  led: I,
  rx: Receiver<ControlMsg>,
  chorus_on: bool,
  echo_on: bool,
  state: PipelineState,
  fills: u64,
  order_faults: u64,
}

impl<S: SampleSource> Pipeline<S, ()> {
  pub fn new(cfg: &FxConfig, source: S, rx: Receiver<ControlMsg>) -> Self {
    lfo::warm_table();
    log::info!(
      "pipeline up: {} words/buffer, chorus {}, echo {} (shift {})",
      cfg.buff_len,
      if cfg.chorus_on { "on" } else { "off" },
      if cfg.echo_on { "on" } else { "off" },
      cfg.echo.shift
    );
    Self {
      chorus: StereoChorus::new(&cfg.chorus),
      echo: Echo::new(&cfg.echo),
      source,
      led: (),
      rx,
      chorus_on: cfg.chorus_on,
      echo_on: cfg.echo_on,
      state: PipelineState::AwaitingHalfConsumed,
      fills: 0,
      order_faults: 0,
    }
  }
}

impl<S: SampleSource, I: Indicator> Pipeline<S, I> {
  pub fn with_indicator<J: Indicator>(self, led: J) -> Pipeline<S, J> {
    Pipeline {
      chorus: self.chorus,
      echo: self.echo,
      source: self.source,
      led,
      rx: self.rx,
      chorus_on: self.chorus_on,
      echo_on: self.echo_on,
      state: self.state,
      fills: self.fills,
      order_faults: self.order_faults,
    }
  }

  pub fn state(&self) -> PipelineState { self.state }
  pub fn fills(&self) -> u64 { self.fills }
  /// Signals that arrived out of the half/full alternation.
  pub fn order_faults(&self) -> u64 { self.order_faults }
  pub fn chorus_on(&self) -> bool { self.chorus_on }
  pub fn echo_on(&self) -> bool { self.echo_on }
  pub fn indicator(&self) -> &I { &self.led }
  pub fn source_mut(&mut self) -> &mut S { &mut self.source }

  /// Zeroes every delay line.
  pub fn clean(&mut self) {
    self.echo.clean();
    self.chorus.clear();
  }

  pub fn apply(&mut self, msg: ControlMsg) {
    match msg {
      ControlMsg::ChorusRateUp => self.chorus.inc_rate(),
      ControlMsg::ChorusRateDown => self.chorus.dec_rate(),
      ControlMsg::ChorusDelayUp => self.chorus.inc_delay(),
      ControlMsg::ChorusDelayDown => self.chorus.dec_delay(),
      ControlMsg::ChorusFeedbackUp => self.chorus.inc_feedback(),
      ControlMsg::ChorusFeedbackDown => self.chorus.dec_feedback(),
      ControlMsg::ChorusSweepUp => self.chorus.inc_sweep(),
      ControlMsg::ChorusSweepDown => self.chorus.dec_sweep(),
      ControlMsg::ChorusModeToggle => self.chorus.toggle_mode(),
      ControlMsg::ChorusFeedbackSign => self.chorus.flip_feedback_sign(),
      ControlMsg::EchoTimeUp => self.echo.inc_time(),
      ControlMsg::EchoTimeDown => self.echo.dec_time(),
      ControlMsg::EchoFeedbackUp => self.echo.inc_feedback(),
      ControlMsg::EchoFeedbackDown => self.echo.dec_feedback(),
      ControlMsg::ToggleChorus => self.chorus_on = !self.chorus_on,
      ControlMsg::ToggleEcho => self.echo_on = !self.echo_on,
      ControlMsg::ResetPhase => self.chorus.reset_phase(),
      ControlMsg::Clean => self.clean(),
    }
  }

  /// Applies pending control messages without blocking.
  pub fn drain(&mut self) {
    for _ in 0..DRAIN_CAP {
      match self.rx.try_recv() {
        Ok(msg) => self.apply(msg),
        Err(_) => break,
      }
    }
  }

  /// One frame through the chain: source → echo → chorus.
  #[inline]
  pub fn tick(&mut self) -> (f32, f32) {
    let mut y = self.source.next_sample();
    if self.echo_on {
      y = self.echo.process(y);
    }
    if self.chorus_on {
      self.chorus.process(y)
    } else {
      (y, y)
    }
  }

  /// Fills one region of `buf` (interleaved L/R words).
  pub fn produce(&mut self, region: Region, buf: &mut [i16]) {
    self.drain();
    self.led.set(false);
    let span = region.span(buf.len());
    for frame in buf[span].chunks_exact_mut(2) {
      let (l, r) = self.tick();
      frame[0] = to_word(l);
      frame[1] = to_word(r);
    }
    self.led.set(true);
    self.fills += 1;
  }

  /// Hardware signal: the first half has been played out.
  pub fn on_half_consumed(&mut self, buf: &mut [i16]) {
    self.check_order(PipelineState::AwaitingHalfConsumed);
    self.produce(Region::First, buf);
    self.state = PipelineState::AwaitingFullConsumed;
  }

  /// Hardware signal: the second half has been played out.
  pub fn on_full_consumed(&mut self, buf: &mut [i16]) {
    self.check_order(PipelineState::AwaitingFullConsumed);
    self.produce(Region::Second, buf);
    self.state = PipelineState::AwaitingHalfConsumed;
  }

  fn check_order(&mut self, want: PipelineState) {
    if self.state != want {
      self.order_faults += 1;
      log::warn!("buffer signal out of order: expected {want:?} (fault #{})", self.order_faults);
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::engine::control::{Controller, NullCodec};

  fn silent_chain(cfg: &mut FxConfig) {
    cfg.chorus_on = false;
    cfg.echo_on = false;
  }

  #[derive(Default)]
  struct Led {
    toggles: Vec<bool>,
  }

  impl Indicator for Led {
    fn set(&mut self, on: bool) { self.toggles.push(on); }
  }

  #[test]
  fn regions_split_the_buffer() {
    assert_eq!(Region::First.span(16), 0..8);
    assert_eq!(Region::Second.span(16), 8..16);
    assert_eq!(Region::Second.span(1024), 512..1024);
  }

  #[test]
  fn word_conversion_is_full_scale_and_clamped() {
    assert_eq!(to_word(0.0), 0);
    assert_eq!(to_word(1.0), i16::MAX);
    assert!(to_word(-1.0) <= -i16::MAX);
    assert_eq!(to_word(7.5), i16::MAX);
    assert_eq!(to_word(-3.0), to_word(-1.0));
    assert!((to_word(0.5) as i32 - 16_384).abs() <= 1);
  }

  #[test]
  fn fills_only_the_requested_half() {
    let mut cfg = FxConfig::default();
    silent_chain(&mut cfg);
    let (_ctl, rx) = Controller::new(NullCodec, 50);
    let mut p = Pipeline::new(&cfg, || 0.5f32, rx);
    let half = to_word(0.5);
    let mut buf = vec![-7i16; 16];
    p.on_half_consumed(&mut buf);
    assert!(buf[..8].iter().all(|&w| w == half));
    assert!(buf[8..].iter().all(|&w| w == -7));
    p.on_full_consumed(&mut buf);
    assert!(buf.iter().all(|&w| w == half));
    assert_eq!(p.fills(), 2);
    assert_eq!(p.order_faults(), 0);
  }

  #[test]
  fn states_alternate_and_faults_are_counted() {
    let cfg = FxConfig::default();
    let (_ctl, rx) = Controller::new(NullCodec, 50);
    let mut p = Pipeline::new(&cfg, || 0.0f32, rx);
    let mut buf = vec![0i16; 64];
    assert_eq!(p.state(), PipelineState::AwaitingHalfConsumed);
    p.on_half_consumed(&mut buf);
    assert_eq!(p.state(), PipelineState::AwaitingFullConsumed);
    p.on_full_consumed(&mut buf);
    assert_eq!(p.state(), PipelineState::AwaitingHalfConsumed);
    p.on_full_consumed(&mut buf);
    assert_eq!(p.order_faults(), 1);
    assert_eq!(p.state(), PipelineState::AwaitingHalfConsumed);
  }

  #[test]
  fn indicator_brackets_each_fill() {
    let cfg = FxConfig::default();
    let (_ctl, rx) = Controller::new(NullCodec, 50);
    let mut p = Pipeline::new(&cfg, || 0.0f32, rx).with_indicator(Led::default());
    let mut buf = vec![0i16; 32];
    p.on_half_consumed(&mut buf);
    p.on_full_consumed(&mut buf);
    assert_eq!(p.indicator().toggles, vec![false, true, false, true]);
  }

  #[test]
  fn control_messages_land_before_the_fill() {
    let cfg = FxConfig::default();
    let (ctl, rx) = Controller::new(NullCodec, 50);
    let mut p = Pipeline::new(&cfg, || 0.0f32, rx);
    let before = p.chorus.left.lfo.freq;
    ctl.inc_chorus_rate().unwrap();
    ctl.toggle_echo().unwrap();
    ctl.inc_delay_time().unwrap();
    assert_eq!(p.chorus.left.lfo.freq, before);
    let mut buf = vec![0i16; 32];
    p.on_half_consumed(&mut buf);
    assert!((p.chorus.left.lfo.freq - before * 1.05).abs() < 1e-7);
    assert!(!p.echo_on());
    assert_eq!(p.echo.shift(), cfg.echo.shift + 20);
  }

  #[test]
  fn drain_is_capped_per_fill() {
    let cfg = FxConfig::default();
    let (ctl, rx) = Controller::new(NullCodec, 50);
    let mut p = Pipeline::new(&cfg, || 0.0f32, rx);
    for _ in 0..(DRAIN_CAP + 5) {
      ctl.inc_chorus_sweep().unwrap();
    }
    p.drain();
    assert!((p.chorus.left.lfo.amp - 50.0 * 1.05f32.powi(DRAIN_CAP as i32)).abs() < 1e-2);
    p.drain();
    assert!((p.chorus.left.lfo.amp - 50.0 * 1.05f32.powi(DRAIN_CAP as i32 + 5)).abs() < 1e-2);
  }

  #[test]
  fn bypassed_chain_is_dual_mono() {
    let mut cfg = FxConfig::default();
    cfg.chorus_on = false;
    let (_ctl, rx) = Controller::new(NullCodec, 50);
    let mut n = 0u32;
    let src = move || {
      n += 1;
      if n % 3 == 0 { 0.25f32 } else { -0.1 }
    };
    let mut p = Pipeline::new(&cfg, src, rx);
    for _ in 0..1000 {
      let (l, r) = p.tick();
      assert_eq!(l, r);
    }
  }
}
