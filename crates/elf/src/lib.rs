//! Minimal ELF32 decoder for dynamic-dependency inspection.
//!
//! Parses the ELF32 file header, the program header (segment) table, and —
//! for `PT_DYNAMIC` segments — the dynamic tag table, resolving the
//! name-bearing tags (`NEEDED`, `SONAME`, `RPATH`) against the dynamic
//! string table. Everything else (section headers, symbol tables,
//! relocations) is out of scope; the decoder is strictly read-only.
//!
//! All multi-byte fields are decoded as 32-bit little-endian regardless of
//! the identity block's declared class/encoding bytes. ELF64 and big-endian
//! objects are a documented limitation, not a detected condition; see
//! [`DecodeProfile`].
//!
//! # Usage
//!
//! ```
//! use sodeps_elf::ElfFile;
//!
//! fn needed(data: &[u8]) {
//!     let elf = ElfFile::parse(data).expect("valid ELF32 object");
//!     for name in elf.needed_libraries() {
//!         // resolve `name` against a search directory
//!     }
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

extern crate alloc;

pub mod cursor;
pub mod dynamic;
pub mod header;
pub mod segment;

pub use cursor::Cursor;
pub use dynamic::{DynEntry, DynTag, DynValue, DynamicTable, TagKind};
pub use header::{ElfHeader, ElfIdent};
pub use segment::{ElfFile, Segment};

use core::fmt;

/// Decoding profile selecting field widths and byte order.
///
/// Currently fixed to the single [`Elf32LittleEndian`](Self::Elf32LittleEndian)
/// profile; the identity block's class and encoding bytes are retained for
/// display but not used to switch decoding. Adding another profile extends
/// this enum without reworking callers of [`ElfFile::parse`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DecodeProfile {
    /// 32-bit fields, little-endian byte order.
    #[default]
    Elf32LittleEndian,
}

/// Errors that can occur while decoding an ELF object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElfError {
    /// The file does not start with the ELF magic bytes.
    BadMagic,
    /// The input data is too short for the declared structure.
    Truncated,
    /// A program header entry size below the 32 bytes this decoder reads.
    UndersizedPhEntry,
    /// A segment's file range extends past the end of the input data.
    SegmentOutOfBounds,
    /// A string table name ran past the end of the data without a NUL.
    UnterminatedString,
    /// A name-bearing dynamic tag exists but the table has no `STRTAB`.
    MissingStringTable,
    /// A resolved name contains bytes outside the ASCII range.
    InvalidString,
}

impl fmt::Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic => write!(f, "invalid ELF magic bytes"),
            Self::Truncated => write!(f, "input data truncated"),
            Self::UndersizedPhEntry => {
                write!(f, "program header entry size below 32 bytes")
            }
            Self::SegmentOutOfBounds => {
                write!(f, "segment file range extends past end of data")
            }
            Self::UnterminatedString => {
                write!(f, "unterminated string in dynamic string table")
            }
            Self::MissingStringTable => {
                write!(f, "dynamic table has name-bearing tags but no STRTAB")
            }
            Self::InvalidString => write!(f, "non-ASCII byte in resolved name"),
        }
    }
}

impl core::error::Error for ElfError {}
