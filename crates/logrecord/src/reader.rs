use crate::types::DecodeError;

/// A cursor-based reader over a byte slice for decoding OPC UA binary data.
///
/// Uses "sticky error" semantics: once an error occurs, all subsequent reads
/// return zero/default values. The first error is reported by [`finish`].
///
/// All multi-byte integers are little-endian. Strings and byte strings carry
/// an `Int32` length prefix where `-1` denotes a null value.
///
/// [`finish`]: RecordReader::finish
pub(crate) struct RecordReader<'a> {
    data: &'a [u8],
    pos: usize,
    err: Option<DecodeError>,
}

impl<'a> RecordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        Self {
            data,
            pos: 0,
            err: None,
        }
    }

    pub fn has_error(&self) -> bool {
        self.err.is_some()
    }

    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Returns the number of bytes consumed, or the first error encountered.
    pub fn finish(self) -> Result<usize, DecodeError> {
        match self.err {
            Some(err) => Err(err),
            None => Ok(self.pos),
        }
    }

    fn set_err(&mut self, err: DecodeError) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }

    fn ensure(&mut self, n: usize) -> bool {
        if self.err.is_some() {
            return false;
        }
        if n > self.remaining() {
            self.set_err(DecodeError::UnexpectedEof {
                offset: self.pos,
                needed: n,
            });
            return false;
        }
        true
    }

    /// Read n bytes as a slice from the data.
    fn read_bytes_slice(&mut self, n: usize) -> &'a [u8] {
        if !self.ensure(n) {
            return &[];
        }
        let start = self.pos;
        self.pos += n;
        &self.data[start..self.pos]
    }

    fn array<const N: usize>(&mut self) -> [u8; N] {
        let mut out = [0u8; N];
        let b = self.read_bytes_slice(N);
        if b.len() == N {
            out.copy_from_slice(b);
        }
        out
    }

    /// Skip n bytes.
    pub fn skip(&mut self, n: usize) {
        self.read_bytes_slice(n);
    }

    /// Read a single byte.
    pub fn byte(&mut self) -> u8 {
        self.array::<1>()[0]
    }

    /// Read a boolean (single byte, 0 = false).
    pub fn bool_val(&mut self) -> bool {
        self.byte() != 0
    }

    pub fn int8(&mut self) -> i8 {
        i8::from_le_bytes(self.array())
    }

    pub fn uint16(&mut self) -> u16 {
        u16::from_le_bytes(self.array())
    }

    pub fn int16(&mut self) -> i16 {
        i16::from_le_bytes(self.array())
    }

    pub fn uint32(&mut self) -> u32 {
        u32::from_le_bytes(self.array())
    }

    pub fn int32(&mut self) -> i32 {
        i32::from_le_bytes(self.array())
    }

    pub fn uint64(&mut self) -> u64 {
        u64::from_le_bytes(self.array())
    }

    pub fn int64(&mut self) -> i64 {
        i64::from_le_bytes(self.array())
    }

    pub fn float32(&mut self) -> f32 {
        f32::from_bits(self.uint32())
    }

    pub fn float64(&mut self) -> f64 {
        f64::from_bits(self.uint64())
    }

    /// Read n raw bytes into a fixed-size array.
    pub fn fixed<const N: usize>(&mut self) -> [u8; N] {
        self.array()
    }

    /// Read an `Int32` length prefix. Returns `None` for the null marker (-1).
    fn length(&mut self) -> Option<usize> {
        let offset = self.pos;
        let len = self.int32();
        if self.err.is_some() || len == -1 {
            return None;
        }
        if len < 0 {
            self.set_err(DecodeError::InvalidLength { len, offset });
            return None;
        }
        Some(len as usize)
    }

    /// Read a length-prefixed byte string. Returns `None` for a null byte string.
    pub fn byte_string(&mut self) -> Option<&'a [u8]> {
        let len = self.length()?;
        let bytes = self.read_bytes_slice(len);
        if self.err.is_some() {
            return None;
        }
        Some(bytes)
    }

    /// Read a length-prefixed UTF-8 string. Invalid UTF-8 is replaced.
    /// Returns `None` for a null string.
    pub fn opt_string(&mut self) -> Option<String> {
        self.byte_string()
            .map(|b| String::from_utf8_lossy(b).into_owned())
    }

    /// Read a string, mapping null to the empty string.
    pub fn string(&mut self) -> String {
        self.opt_string().unwrap_or_default()
    }
}
