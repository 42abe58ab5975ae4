use bytes::{BufMut, Bytes, BytesMut};

use crate::types::EncodeError;

/// Marker written in place of a length prefix for null strings.
const NULL_LENGTH: i32 = -1;

/// A buffer for encoding OPC UA binary data.
///
/// Integers are always written little-endian at their full width.
pub(crate) struct RecordBuffer {
    buf: BytesMut,
}

impl AsRef<[u8]> for RecordBuffer {
    fn as_ref(&self) -> &[u8] {
        &self.buf
    }
}

impl RecordBuffer {
    pub fn with_capacity(size: usize) -> Self {
        RecordBuffer {
            buf: BytesMut::with_capacity(size),
        }
    }

    pub fn freeze(self) -> Bytes {
        self.buf.freeze()
    }

    /// Writes a single byte.
    #[inline]
    pub fn byte(&mut self, byte: u8) {
        self.buf.put_u8(byte);
    }

    /// Writes a known number of raw bytes.
    #[inline]
    pub fn bytes<const N: usize>(&mut self, bytes: &[u8; N]) {
        self.buf.put_slice(bytes);
    }

    #[inline]
    pub fn bool(&mut self, b: bool) {
        self.byte(u8::from(b));
    }

    #[inline]
    pub fn i8(&mut self, i: i8) {
        self.buf.put_i8(i);
    }

    #[inline]
    pub fn u16(&mut self, u: u16) {
        self.buf.put_u16_le(u);
    }

    #[inline]
    pub fn i16(&mut self, i: i16) {
        self.buf.put_i16_le(i);
    }

    #[inline]
    pub fn u32(&mut self, u: u32) {
        self.buf.put_u32_le(u);
    }

    #[inline]
    pub fn i32(&mut self, i: i32) {
        self.buf.put_i32_le(i);
    }

    #[inline]
    pub fn u64(&mut self, u: u64) {
        self.buf.put_u64_le(u);
    }

    #[inline]
    pub fn i64(&mut self, i: i64) {
        self.buf.put_i64_le(i);
    }

    #[inline]
    pub fn f32(&mut self, f: f32) {
        self.buf.put_f32_le(f);
    }

    #[inline]
    pub fn f64(&mut self, f: f64) {
        self.buf.put_f64_le(f);
    }

    /// Writes a length-prefixed byte string.
    pub fn byte_string(&mut self, bytes: &[u8]) -> Result<(), EncodeError> {
        let len = i32::try_from(bytes.len()).map_err(|_| EncodeError::TooLong(bytes.len()))?;
        self.buf.reserve(4 + bytes.len());
        self.i32(len);
        self.buf.put_slice(bytes);
        Ok(())
    }

    /// Writes a length-prefixed string.
    #[inline]
    pub fn str<S: AsRef<str>>(&mut self, s: S) -> Result<(), EncodeError> {
        self.byte_string(s.as_ref().as_bytes())
    }

    /// Writes a string, or the null marker if there is none.
    #[inline]
    pub fn opt_str(&mut self, s: Option<&str>) -> Result<(), EncodeError> {
        match s {
            Some(s) => self.str(s),
            None => {
                self.i32(NULL_LENGTH);
                Ok(())
            }
        }
    }
}
