use dasp::Sample;

use crate::engine::pipeline::{Indicator, Pipeline, SampleSource};

/// Software stand-in for the DMA consumer.
///
/// Owns the hardware buffer, plays it out word by word and raises the
/// half/full signals on the pipeline exactly where a circular DMA transfer
/// would: after word `len/2 - 1` and after the last word.
pub struct DmaSim {
  buf: Vec<i16>,
  pos: usize,
}

impl DmaSim {
  /// Starts on a silent buffer, as the codec does at power-up.
  pub fn new(len: usize) -> Self {
    let len = (len / 8).max(1) * 8;
    Self { buf: vec![0; len], pos: 0 }
  }

  pub fn len(&self) -> usize { self.buf.len() }
  pub fn position(&self) -> usize { self.pos }
  pub fn buffer(&self) -> &[i16] { &self.buf }

  /// Plays out `out.len()` words, refilling as halves are vacated.
  pub fn consume<S: SampleSource, I: Indicator>(&mut self, pipeline: &mut Pipeline<S, I>, out: &mut [i16]) {
    for w in out.iter_mut() {
      *w = self.next_word(pipeline);
    }
  }

  /// Same as [`consume`](Self::consume) but converted to `f32` for host APIs.
  pub fn consume_f32<S: SampleSource, I: Indicator>(&mut self, pipeline: &mut Pipeline<S, I>, out: &mut [f32]) {
    for w in out.iter_mut() {
      *w = self.next_word(pipeline).to_sample::<f32>();
    }
  }

  #[inline]
  fn next_word<S: SampleSource, I: Indicator>(&mut self, pipeline: &mut Pipeline<S, I>) -> i16 {
    let w = self.buf[self.pos];
    self.pos += 1;
    let half = self.buf.len() / 2;
    if self.pos == half {
      pipeline.on_half_consumed(&mut self.buf);
    } else if self.pos == self.buf.len() {
      self.pos = 0;
      pipeline.on_full_consumed(&mut self.buf);
    }
    w
  }
}
