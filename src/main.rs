use std::io::{self, BufRead};

use anyhow::{Context, Result};
use dasp::{signal, Signal};
use fxunit_lib::engine::{audio::AudioEngine, config::SAMPLE_RATE};
use fxunit_lib::{Codec, ControlMsg, Controller, FxConfig, Pipeline};

/// Host audio applies volume in the OS mixer; just report what the codec would get.
struct LogCodec;

impl Codec for LogCodec {
  fn set_volume(&mut self, level: u8) { log::info!("codec volume -> {level}"); }
}

fn main() -> Result<()> {
  // RUST_LOG overrides the default level
  env_logger::builder()
    .filter_level(log::LevelFilter::Info)
    .parse_default_env()
    .init();

  let cfg = match std::env::args().nth(1) {
    Some(path) => FxConfig::load(&path).with_context(|| format!("loading {path}"))?,
    None => FxConfig::default(),
  };

  let (mut ctl, rx) = Controller::new(LogCodec, cfg.volume);

  // a decaying 220 Hz burst once a second stands in for the codec input
  let mut tone = signal::rate(SAMPLE_RATE as f64).const_hz(220.0).sine();
  let mut n = 0u32;
  let source = move || {
    n = (n + 1) % SAMPLE_RATE as u32;
    let env = (-(n as f32) / 4_000.0).exp();
    0.5 * env * tone.next() as f32
  };
  let pipeline = Pipeline::new(&cfg, source, rx);

  let mut engine = AudioEngine::new();
  engine.start(&cfg, pipeline)?;

  log::info!("commands: vol+ vol- mute timeout quit, or a control name such as EchoTimeUp");
  for line in io::stdin().lock().lines() {
    let line = line.context("reading stdin")?;
    let cmd = line.trim();
    let sent = match cmd {
      "" => continue,
      "quit" | "q" => break,
      "vol+" => { ctl.inc_vol(); Ok(()) }
      "vol-" => { ctl.dec_vol(); Ok(()) }
      "mute" => ctl.toggle_sound(),
      "timeout" => { ctl.codec_timeout(); Ok(()) }
      name => match serde_json::from_value::<ControlMsg>(serde_json::Value::String(name.to_string())) {
        Ok(msg) => ctl.send(msg),
        Err(e) => {
          log::warn!("unknown command {name:?}: {e}");
          continue;
        }
      },
    };
    if let Err(e) = sent {
      log::warn!("{e}");
    }
  }

  engine.stop();
  Ok(())
}
