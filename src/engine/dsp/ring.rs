/// Fixed-capacity circular sample buffer with a single moving write index.
///
/// `read_at(n)` looks `n` slots behind the write index, so `read_at(1)` is the
/// most recent write and `read_at(0)` is the slot about to be overwritten.
#[derive(Clone, Debug)]
pub struct Ring {
  buf: Box<[f32]>,
  idx: usize,
}

impl Ring {
  pub fn new(len: usize) -> Self { Self::with_index(len, 0) }

  pub fn with_index(len: usize, idx: usize) -> Self {
    let len = len.max(1);
    Self { buf: vec![0.0; len].into_boxed_slice(), idx: idx % len }
  }

  #[inline]
  pub fn len(&self) -> usize { self.buf.len() }

  #[inline]
  pub fn index(&self) -> usize { self.idx }

  #[inline]
  pub fn write_advance(&mut self, x: f32) {
    self.buf[self.idx] = x;
    self.idx += 1;
    if self.idx >= self.buf.len() { self.idx = 0; }
  }

  #[inline]
  pub fn read_at(&self, offset: usize) -> f32 { self.buf[self.back(self.idx, offset)] }

  /// Absolute slot access; `i` is reduced modulo the capacity.
  #[inline]
  pub fn get(&self, i: usize) -> f32 { self.buf[i % self.buf.len()] }

  /// Slot `n` steps before `from`, wrapping.
  #[inline]
  pub fn back(&self, from: usize, n: usize) -> usize {
    let len = self.buf.len();
    (from % len + len - n % len) % len
  }

  pub fn clear(&mut self) { self.buf.fill(0.0); }
}
