//! Sequential, offset-seekable reader over a byte slice.
//!
//! All multi-byte reads are little-endian; the cursor is the single
//! primitive every other decoder module builds on.

use crate::ElfError;

/// A forward reader over `&[u8]` with absolute seeking.
///
/// Reads advance the position; every read fails with
/// [`ElfError::Truncated`] when fewer bytes remain than requested, so
/// callers can propagate with `?` instead of bounds-checking manually.
#[derive(Debug, Clone)]
pub struct Cursor<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> Cursor<'a> {
    /// Creates a cursor positioned at offset 0.
    #[must_use]
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Moves to an absolute byte offset.
    ///
    /// Seeking past the end is allowed; subsequent reads fail with
    /// [`ElfError::Truncated`].
    pub fn seek(&mut self, pos: usize) {
        self.pos = pos;
    }

    /// Returns the current byte offset.
    #[must_use]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Returns the number of bytes between the position and the end.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// Reads `n` bytes, advancing the position.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if fewer than `n` bytes remain.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8], ElfError> {
        let end = self.pos.checked_add(n).ok_or(ElfError::Truncated)?;
        if end > self.data.len() {
            return Err(ElfError::Truncated);
        }
        let bytes = &self.data[self.pos..end];
        self.pos = end;
        Ok(bytes)
    }

    /// Reads a little-endian `u16`, advancing the position.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if fewer than 2 bytes remain.
    pub fn read_u16(&mut self) -> Result<u16, ElfError> {
        let bytes = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([bytes[0], bytes[1]]))
    }

    /// Reads a little-endian `u32`, advancing the position.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if fewer than 4 bytes remain.
    pub fn read_u32(&mut self) -> Result<u32, ElfError> {
        let bytes = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]))
    }

    /// Reads bytes up to (not including) the next NUL, advancing past it.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::UnterminatedString`] if the data ends before a
    /// NUL byte is found.
    pub fn read_cstr(&mut self) -> Result<&'a [u8], ElfError> {
        let rest = self.data.get(self.pos..).unwrap_or(&[]);
        let nul = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or(ElfError::UnterminatedString)?;
        let bytes = &rest[..nul];
        self.pos += nul + 1;
        Ok(bytes)
    }
}
