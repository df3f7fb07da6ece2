use std::sync::Arc;

use crossbeam_channel::{bounded, Receiver, Sender, TrySendError};
use thiserror::Error;

use crate::engine::{messages::ControlMsg, state::VolumeState};

/// Pending intents the pipeline has not drained yet.
pub const QUEUE_LEN: usize = 64;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ControlError {
  #[error("control queue full, dropped {0:?}")]
  QueueFull(ControlMsg),
  #[error("pipeline is gone")]
  Disconnected,
}

/// What to do after the codec failed to acknowledge in time.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Recovery {
  /// Keep going as if nothing happened.
  Ignore,
  /// Silence the output until the user unmutes.
  Mute,
  /// Flush the effect state and push the volume again.
  Reinit,
}

/// Codec side of the unit: the volume register and the timeout fault hook.
pub trait Codec {
  fn set_volume(&mut self, level: u8);

  /// Fault hook for a codec that did not acknowledge within its timeout.
  fn on_timeout(&mut self) -> Recovery { Recovery::Ignore }
}

/// Codec stand-in for hosts where volume is applied elsewhere.
#[derive(Clone, Copy, Debug, Default)]
pub struct NullCodec;

impl Codec for NullCodec {
  fn set_volume(&mut self, _level: u8) {}
}

/// The control surface. Every call returns immediately; effect changes are
/// picked up by the pipeline at its next region fill.
pub struct Controller<C: Codec> {
  tx: Sender<ControlMsg>,
  volume: Arc<VolumeState>,
  codec: C,
}

impl<C: Codec> Controller<C> {
  /// Returns the controller and the receiving end for the pipeline.
  pub fn new(mut codec: C, level: u8) -> (Self, Receiver<ControlMsg>) {
    let (tx, rx) = bounded(QUEUE_LEN);
    let volume = Arc::new(VolumeState::new(level));
    codec.set_volume(volume.effective());
    (Self { tx, volume, codec }, rx)
  }

  pub fn volume(&self) -> Arc<VolumeState> { self.volume.clone() }

  pub fn codec(&self) -> &C { &self.codec }

  pub fn send(&self, msg: ControlMsg) -> Result<(), ControlError> {
    self.tx.try_send(msg).map_err(|e| match e {
      TrySendError::Full(m) => {
        log::warn!("control queue full, dropping {m:?}");
        ControlError::QueueFull(m)
      }
      TrySendError::Disconnected(_) => ControlError::Disconnected,
    })
  }

  // ─── Volume / mute ──────────────────────────────────────────────────────

  /// Mutes, or unmutes with the LFOs restarted in quadrature.
  ///
  /// The phase reset is queued before the level is pushed, but like every
  /// other intent it only lands at the next region fill, so up to one
  /// region may still play with the old phases after the gain returns.
  /// The level is restored even if the reset could not be queued; the
  /// send error is logged and returned.
  pub fn toggle_sound(&mut self) -> Result<(), ControlError> {
    if self.volume.muted() {
      let reset = self.send(ControlMsg::ResetPhase);
      if let Err(e) = &reset {
        log::error!("unmuting without phase reset: {e}");
      }
      self.volume.set_muted(false);
      self.codec.set_volume(self.volume.level());
      reset
    } else {
      self.volume.set_muted(true);
      self.codec.set_volume(0);
      Ok(())
    }
  }

  pub fn inc_vol(&mut self) { self.step_vol(true); }
  pub fn dec_vol(&mut self) { self.step_vol(false); }

  fn step_vol(&mut self, up: bool) {
    if let Some(level) = self.volume.step(up) {
      // a muted unit stays silent; the new level applies on unmute
      if !self.volume.muted() {
        self.codec.set_volume(level);
      }
    }
  }

  // ─── Chorus / flanger ───────────────────────────────────────────────────

  pub fn inc_chorus_rate(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusRateUp) }
  pub fn dec_chorus_rate(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusRateDown) }
  pub fn inc_chorus_delay(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusDelayUp) }
  pub fn dec_chorus_delay(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusDelayDown) }
  pub fn inc_chorus_feedback(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusFeedbackUp) }
  pub fn dec_chorus_feedback(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusFeedbackDown) }
  pub fn inc_chorus_sweep(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusSweepUp) }
  pub fn dec_chorus_sweep(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusSweepDown) }
  pub fn toggle_chorus_mode(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusModeToggle) }
  pub fn change_chorus_fdb_sign(&self) -> Result<(), ControlError> { self.send(ControlMsg::ChorusFeedbackSign) }

  // ─── Echo ───────────────────────────────────────────────────────────────

  pub fn inc_delay_time(&self) -> Result<(), ControlError> { self.send(ControlMsg::EchoTimeUp) }
  pub fn dec_delay_time(&self) -> Result<(), ControlError> { self.send(ControlMsg::EchoTimeDown) }
  pub fn inc_delay_feedback(&self) -> Result<(), ControlError> { self.send(ControlMsg::EchoFeedbackUp) }
  pub fn dec_delay_feedback(&self) -> Result<(), ControlError> { self.send(ControlMsg::EchoFeedbackDown) }

  // ─── Effect routing ─────────────────────────────────────────────────────

  pub fn toggle_chorus(&self) -> Result<(), ControlError> { self.send(ControlMsg::ToggleChorus) }
  pub fn toggle_echo(&self) -> Result<(), ControlError> { self.send(ControlMsg::ToggleEcho) }
  pub fn clean(&self) -> Result<(), ControlError> { self.send(ControlMsg::Clean) }

  /// Entry for the codec driver's timeout path. Runs the fault hook and
  /// applies whatever it asks for.
  pub fn codec_timeout(&mut self) -> Recovery {
    let action = self.codec.on_timeout();
    match action {
      Recovery::Ignore => log::warn!("codec timeout ignored"),
      Recovery::Mute => {
        log::warn!("codec timeout, muting output");
        self.volume.set_muted(true);
        self.codec.set_volume(0);
      }
      Recovery::Reinit => {
        log::warn!("codec timeout, reinitializing effect state");
        if let Err(e) = self.send(ControlMsg::Clean).and_then(|_| self.send(ControlMsg::ResetPhase)) {
          log::error!("reinit after codec timeout incomplete: {e}");
        }
        self.codec.set_volume(self.volume.effective());
      }
    }
    action
  }
}
