//! Stereo chorus/flanger and feedback echo core for a DMA-driven effects unit.
//!
//! The hardware (or [`engine::host::DmaSim`]) calls the [`Pipeline`] on every
//! half-buffer signal; a [`Controller`] on a lower-priority context nudges
//! effect parameters through a lock-free queue.

pub mod engine {
  pub mod config;
  pub mod control;
  pub mod dsp;
  pub mod host;
  pub mod messages;
  pub mod pipeline;
  pub mod state;
  #[cfg(feature = "device")]
  pub mod audio;
}

pub use engine::config::FxConfig;
pub use engine::control::{Codec, Controller, Recovery};
pub use engine::messages::ControlMsg;
pub use engine::pipeline::Pipeline;
