/// Fixed-size receive buffer shared by control reads and uploads.
///
/// Allocated once; never resized while a client is connected.
pub struct RxBuffer {
    buf: Box<[u8]>,
}

impl RxBuffer {
    pub fn new(capacity: usize) -> Self {
        Self {
            buf: vec![0u8; capacity].into_boxed_slice(),
        }
    }

    pub fn capacity(&self) -> usize {
        self.buf.len()
    }

    pub fn as_mut_slice(&mut self) -> &mut [u8] {
        &mut self.buf
    }

    /// The first `len` bytes, as filled by the last read.
    pub fn filled(&self, len: usize) -> &[u8] {
        &self.buf[..len.min(self.buf.len())]
    }

    pub fn zero(&mut self) {
        self.buf.fill(0);
    }
}
