use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use crate::engine::config::MAXVOL;

/// Process-wide output level and mute flag.
///
/// Written by the control context, read by whatever drives the codec's
/// volume register. The DSP path never looks at it.
#[derive(Debug)]
pub struct VolumeState {
  level: AtomicU8,
  muted: AtomicBool,
}

impl VolumeState {
  pub fn new(level: u8) -> Self {
    Self { level: AtomicU8::new(level.min(MAXVOL)), muted: AtomicBool::new(false) }
  }

  pub fn level(&self) -> u8 { self.level.load(Ordering::Relaxed) }

  pub fn muted(&self) -> bool { self.muted.load(Ordering::Relaxed) }

  /// What the codec should be set to right now.
  pub fn effective(&self) -> u8 { if self.muted() { 0 } else { self.level() } }

  /// Steps the level by one; `None` when already at the rail.
  pub(crate) fn step(&self, up: bool) -> Option<u8> {
    let cur = self.level();
    let next = if up { (cur < MAXVOL).then(|| cur + 1) } else { cur.checked_sub(1) };
    let next = next?;
    self.level.store(next, Ordering::Relaxed);
    Some(next)
  }

  pub(crate) fn set_muted(&self, muted: bool) { self.muted.store(muted, Ordering::Relaxed); }
}
