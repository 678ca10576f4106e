//! Byte cursor primitives used by every profile layout.
//!
//! Integers are fixed-width big-endian `i32`, booleans are a single byte and
//! strings carry an `i32` byte length followed by UTF-8 data. Nothing at this
//! level is optional: higher layers decide whether a field is written at all.

use crate::error::{ProfileError, Result};

/// Upper bound used when no [`crate::DecodeOptions`] are supplied.
pub const DEFAULT_MAX_STRING_LEN: usize = 1 << 20;

#[derive(Debug, Default)]
pub struct Writer {
    bf: Vec<u8>,
}

impl Writer {
    pub fn new() -> Self {
        Self { bf: Vec::with_capacity(64) }
    }

    pub fn write_i32(&mut self, value: i32) {
        self.bf.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bool(&mut self, value: bool) {
        self.bf.push(u8::from(value));
    }

    pub fn write_string(&mut self, s: &str) -> Result<()> {
        let bytes = s.as_bytes();
        self.write_i32(wire_len(bytes.len(), self.bf.len())?);
        self.bf.extend_from_slice(bytes);
        Ok(())
    }

    pub fn dump(self) -> Vec<u8> {
        self.bf
    }
}

/// String lengths travel as `i32`; anything longer cannot be written.
fn wire_len(len: usize, offset: usize) -> Result<i32> {
    i32::try_from(len).map_err(|_| ProfileError::InvalidString {
        offset,
        reason: format!("length {len} does not fit the i32 length prefix"),
    })
}

#[derive(Debug)]
pub struct Reader<'a> {
    bf: &'a [u8],
    cursor: usize,
    max_string_len: usize,
}

impl<'a> Reader<'a> {
    pub fn new(bf: &'a [u8]) -> Self {
        Self::with_limit(bf, DEFAULT_MAX_STRING_LEN)
    }

    pub fn with_limit(bf: &'a [u8], max_string_len: usize) -> Self {
        Reader {
            bf,
            cursor: 0,
            max_string_len,
        }
    }

    pub fn remaining(&self) -> usize {
        self.bf.len() - self.cursor
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(ProfileError::truncated(self.cursor, n, self.bf.len()));
        }
        let out = &self.bf[self.cursor..self.cursor + n];
        self.cursor += n;
        Ok(out)
    }

    pub fn read_i32(&mut self) -> Result<i32> {
        let raw = self.take(4)?;
        let mut buf = [0u8; 4];
        buf.copy_from_slice(raw);
        Ok(i32::from_be_bytes(buf))
    }

    pub fn read_bool(&mut self) -> Result<bool> {
        Ok(self.take(1)?[0] != 0)
    }

    pub fn read_string(&mut self) -> Result<String> {
        let offset = self.cursor;
        let len = self.read_i32()?;
        if len < 0 {
            return Err(ProfileError::InvalidString {
                offset,
                reason: format!("negative length {len}"),
            });
        }
        let len = len as usize;
        if len > self.max_string_len {
            return Err(ProfileError::InvalidString {
                offset,
                reason: format!("length {len} exceeds limit {}", self.max_string_len),
            });
        }
        let raw = self.take(len)?;
        String::from_utf8(raw.to_vec()).map_err(|e| ProfileError::InvalidString {
            offset,
            reason: e.to_string(),
        })
    }
}
