use dasp::{signal, Signal};
use fxunit_lib::engine::config::{FxConfig, MAXVOL, SAMPLE_RATE};
use fxunit_lib::engine::control::{Codec, Controller, NullCodec};
use fxunit_lib::engine::host::DmaSim;
use fxunit_lib::engine::pipeline::{Pipeline, PipelineState};

fn sine(hz: f64) -> impl FnMut() -> f32 {
  let mut s = signal::rate(SAMPLE_RATE as f64).const_hz(hz).sine();
  move || 0.4 * s.next() as f32
}

#[test]
fn toggling_sound_twice_restores_level_and_quadrature() {
  let cfg = FxConfig::default();
  let (mut ctl, rx) = Controller::new(NullCodec, cfg.volume);
  let mut p = Pipeline::new(&cfg, sine(440.0), rx);
  let (l0, r0) = (p.chorus.left.lfo.phase(), p.chorus.right.lfo.phase());
  let mut dma = DmaSim::new(cfg.buff_len);
  let mut out = vec![0i16; 4096];
  dma.consume(&mut p, &mut out);
  assert_ne!(p.chorus.left.lfo.phase(), l0);

  ctl.toggle_sound().unwrap();
  assert_eq!(ctl.volume().effective(), 0);
  ctl.toggle_sound().unwrap();
  assert_eq!(ctl.volume().level(), cfg.volume);

  // the reset lands at the start of the next fill
  p.drain();
  assert_eq!(p.chorus.left.lfo.phase(), l0);
  assert_eq!(p.chorus.right.lfo.phase(), r0);
}

#[test]
fn long_run_keeps_alternation_and_valid_output() {
  let cfg = FxConfig::default();
  let (ctl, rx) = Controller::new(NullCodec, cfg.volume);
  let mut p = Pipeline::new(&cfg, sine(220.0), rx);
  let mut dma = DmaSim::new(cfg.buff_len);

  // uneven host callback sizes
  let mut out = vec![0.0f32; 733];
  for i in 0..300 {
    if i % 40 == 0 {
      ctl.inc_chorus_delay().unwrap();
      ctl.toggle_chorus_mode().unwrap();
      ctl.dec_delay_time().unwrap();
    }
    dma.consume_f32(&mut p, &mut out);
    assert!(out.iter().all(|x| x.is_finite() && (-1.0..=1.0).contains(x)));
  }
  assert_eq!(p.order_faults(), 0);
  let words = 300 * 733;
  assert_eq!(p.fills(), (words / (cfg.buff_len / 2)) as u64);
  let expected = if p.fills() % 2 == 0 { PipelineState::AwaitingHalfConsumed } else { PipelineState::AwaitingFullConsumed };
  assert_eq!(p.state(), expected);
  assert!(p.chorus.left.delay() < fxunit_lib::engine::config::DEPTH as f32);
}

#[test]
fn chorus_widens_a_mono_input() {
  let mut cfg = FxConfig::default();
  cfg.echo_on = false;
  let (_ctl, rx) = Controller::new(NullCodec, cfg.volume);
  let mut p = Pipeline::new(&cfg, sine(330.0), rx);
  let mut dma = DmaSim::new(cfg.buff_len);
  let mut out = vec![0i16; 48_000];
  dma.consume(&mut p, &mut out);
  let diff: i64 = out[cfg.buff_len..].chunks_exact(2).map(|f| (f[0] as i64 - f[1] as i64).abs()).sum();
  assert!(diff > 0, "left and right never differ");

  let mut cfg = cfg.clone();
  cfg.chorus_on = false;
  let (_ctl, rx) = Controller::new(NullCodec, cfg.volume);
  let mut p = Pipeline::new(&cfg, sine(330.0), rx);
  let mut dma = DmaSim::new(cfg.buff_len);
  dma.consume(&mut p, &mut out);
  assert!(out.chunks_exact(2).all(|f| f[0] == f[1]));
}

struct Counting(u32);

impl Codec for Counting {
  fn set_volume(&mut self, _level: u8) { self.0 += 1; }
}

#[test]
fn volume_never_leaves_its_range() {
  let (mut ctl, _rx) = Controller::new(Counting(0), 3);
  for _ in 0..10 {
    ctl.dec_vol();
  }
  assert_eq!(ctl.volume().level(), 0);
  for _ in 0..(MAXVOL as usize + 20) {
    ctl.inc_vol();
  }
  assert_eq!(ctl.volume().level(), MAXVOL);
  // one initial push, 3 down steps, MAXVOL up steps
  assert_eq!(ctl.codec().0, 1 + 3 + MAXVOL as u32);
}

#[test]
fn clean_flushes_echo_tail() {
  let mut cfg = FxConfig::default();
  cfg.chorus_on = false;
  cfg.echo.shift = 100;
  cfg.echo.feedback = 0.9;
  let (ctl, rx) = Controller::new(NullCodec, cfg.volume);
  let mut burst = 0u32;
  let src = move || {
    burst += 1;
    if burst < 50 { 0.8f32 } else { 0.0 }
  };
  let mut p = Pipeline::new(&cfg, src, rx);
  let mut dma = DmaSim::new(cfg.buff_len);
  let mut out = vec![0i16; 2 * cfg.buff_len];
  dma.consume(&mut p, &mut out);
  ctl.clean().unwrap();
  dma.consume(&mut p, &mut out);
  dma.consume(&mut p, &mut out);
  assert!(out.iter().all(|&w| w == 0));
}
