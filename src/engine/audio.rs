use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};

use super::{
  config::{FxConfig, SAMPLE_RATE},
  host::DmaSim,
  pipeline::{Indicator, Pipeline, SampleSource},
};

/// Plays the effect chain on the default output device.
///
/// The cpal callback stands in for the codec's DMA: it drains the
/// simulated hardware buffer, which raises the half/full signals that
/// drive the pipeline.
pub struct AudioEngine {
  stream: Option<cpal::Stream>,
  pub sr: f32,
}

fn pick_config(device: &cpal::Device) -> Result<cpal::SupportedStreamConfig> {
  // stereo f32, the engine's own rate first
  for sr in [SAMPLE_RATE as u32, 44_100] {
    let supported = device.supported_output_configs().context("querying output configs")?;
    for cfg_range in supported {
      if cfg_range.channels() != 2 { continue; }
      if cfg_range.sample_format() != cpal::SampleFormat::F32 { continue; }
      if cfg_range.min_sample_rate().0 <= sr && cfg_range.max_sample_rate().0 >= sr {
        return Ok(cfg_range.with_sample_rate(cpal::SampleRate(sr)));
      }
    }
  }
  let fallback = device.default_output_config().context("no default output config")?;
  if fallback.channels() != 2 || fallback.sample_format() != cpal::SampleFormat::F32 {
    return Err(anyhow!("output device offers no stereo f32 stream ({fallback:?})"));
  }
  Ok(fallback)
}

impl AudioEngine {
  pub fn new() -> Self { Self { stream: None, sr: SAMPLE_RATE } }

  pub fn start<S, I>(&mut self, cfg: &FxConfig, mut pipeline: Pipeline<S, I>) -> Result<()>
  where
    S: SampleSource + Send + 'static,
    I: Indicator + Send + 'static,
  {
    if self.stream.is_some() { return Ok(()); }
    let host = cpal::default_host();
    let device = host.default_output_device().ok_or_else(|| anyhow!("no output device"))?;
    let config = pick_config(&device)?;
    let stream_cfg: cpal::StreamConfig = config.into();
    self.sr = stream_cfg.sample_rate.0 as f32;
    if (self.sr - SAMPLE_RATE).abs() > 1.0 {
      log::warn!("device runs at {} Hz, effect timings assume {} Hz", self.sr, SAMPLE_RATE);
    }

    let mut dma = DmaSim::new(cfg.buff_len);
    let err_fn = |e: cpal::StreamError| log::error!("stream error: {e}");
    let stream = device
      .build_output_stream(&stream_cfg, move |data: &mut [f32], _| dma.consume_f32(&mut pipeline, data), err_fn, None)
      .context("building output stream")?;
    stream.play().context("starting output stream")?;
    log::info!("audio running at {} Hz", self.sr);
    self.stream = Some(stream);
    Ok(())
  }

  pub fn stop(&mut self) { self.stream.take(); }
}

impl Default for AudioEngine {
  fn default() -> Self { Self::new() }
}
