//! Big-endian wire encoding primitives.
//!
//! The export wire format writes every integer big-endian. [`BeWriter`]
//! is a position-tracking cursor over a caller-supplied byte range;
//! [`BeReader`] is its defensive counterpart, returning `None` instead of
//! panicking on truncated input.

/// Cursor that writes big-endian values into a fixed byte range.
#[derive(Debug)]
pub struct BeWriter<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> BeWriter<'a> {
    pub fn new(buf: &'a mut [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    /// Bytes written so far.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes still available in the underlying range.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn write_bytes(&mut self, bytes: &[u8]) -> Option<()> {
        let end = self.pos.checked_add(bytes.len())?;
        if end > self.buf.len() {
            return None;
        }
        self.buf[self.pos..end].copy_from_slice(bytes);
        self.pos = end;
        Some(())
    }

    pub fn write_i32(&mut self, v: i32) -> Option<()> {
        self.write_bytes(&v.to_be_bytes())
    }

    pub fn write_i64(&mut self, v: i64) -> Option<()> {
        self.write_bytes(&v.to_be_bytes())
    }

    pub fn write_f64(&mut self, v: f64) -> Option<()> {
        self.write_bytes(&v.to_be_bytes())
    }

    /// Write a 4-byte length prefix followed by the raw bytes.
    pub fn write_len_prefixed(&mut self, bytes: &[u8]) -> Option<()> {
        let len = i32::try_from(bytes.len()).ok()?;
        self.write_i32(len)?;
        self.write_bytes(bytes)
    }
}

/// Cursor that reads big-endian values from a byte range.
///
/// All reads return `None` on truncated input.
#[derive(Debug, Clone)]
pub struct BeReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> BeReader<'a> {
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Bytes consumed so far.
    #[inline]
    pub const fn position(&self) -> usize {
        self.pos
    }

    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len() - self.pos
    }

    fn read_array<const N: usize>(&mut self) -> Option<[u8; N]> {
        let end = self.pos.checked_add(N)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        slice.try_into().ok()
    }

    pub fn read_i32(&mut self) -> Option<i32> {
        self.read_array().map(i32::from_be_bytes)
    }

    pub fn read_i64(&mut self) -> Option<i64> {
        self.read_array().map(i64::from_be_bytes)
    }

    pub fn read_f64(&mut self) -> Option<f64> {
        self.read_array().map(f64::from_be_bytes)
    }

    pub fn read_bytes(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.data.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    /// Read a 4-byte length prefix followed by that many raw bytes.
    pub fn read_len_prefixed(&mut self) -> Option<&'a [u8]> {
        let len = self.read_i32()?;
        let len = usize::try_from(len).ok()?;
        self.read_bytes(len)
    }
}
