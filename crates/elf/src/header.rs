//! ELF32 identity block and file header decoding.
//!
//! The header occupies exactly 52 bytes: the 16-byte identity block
//! followed by 9 fixed-width fields. Only the magic bytes are validated;
//! the declared class/encoding/version bytes are retained for display.

use crate::{Cursor, ElfError};

/// ELF magic bytes: `\x7fELF`.
pub const ELF_MAGIC: [u8; 4] = [0x7f, b'E', b'L', b'F'];

/// Size of the identity block.
pub const EI_NIDENT: usize = 16;

/// Total size of an ELF32 file header (identity block included).
pub const ELF32_EHDR_SIZE: usize = 52;

/// ELF type: shared object.
pub const ET_DYN: u16 = 3;

/// ELF type: executable.
pub const ET_EXEC: u16 = 2;

/// The 16-byte identity block at the start of every ELF object.
///
/// The first four bytes must equal [`ELF_MAGIC`]; the class, encoding and
/// version bytes that follow are carried for diagnostics only.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfIdent {
    bytes: [u8; EI_NIDENT],
}

impl ElfIdent {
    /// Returns the raw identity bytes.
    #[must_use]
    pub fn bytes(&self) -> &[u8; EI_NIDENT] {
        &self.bytes
    }

    /// Returns the declared file class byte (`EI_CLASS`).
    #[must_use]
    pub fn class(&self) -> u8 {
        self.bytes[4]
    }

    /// Returns the declared data encoding byte (`EI_DATA`).
    #[must_use]
    pub fn encoding(&self) -> u8 {
        self.bytes[5]
    }

    /// Returns the declared identity version byte (`EI_VERSION`).
    #[must_use]
    pub fn version(&self) -> u8 {
        self.bytes[6]
    }

    /// Human-readable name for the declared class.
    #[must_use]
    pub fn class_name(&self) -> &'static str {
        match self.class() {
            1 => "ELF32",
            2 => "ELF64",
            _ => "invalid",
        }
    }

    /// Human-readable name for the declared data encoding.
    #[must_use]
    pub fn encoding_name(&self) -> &'static str {
        match self.encoding() {
            1 => "2's complement, little endian",
            2 => "2's complement, big endian",
            _ => "invalid",
        }
    }
}

/// Parsed ELF32 file header.
///
/// Immutable once decoded; [`crate::ElfFile`] decodes it exactly once and
/// keeps it for the lifetime of the parsed object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ElfHeader {
    /// Identity block.
    pub ident: ElfIdent,
    /// Object file type (`ET_EXEC`, `ET_DYN`, ...).
    pub e_type: u16,
    /// Target machine architecture.
    pub e_machine: u16,
    /// Object file version.
    pub e_version: u32,
    /// Virtual address of the entry point.
    pub e_entry: u32,
    /// File offset of the program header table.
    pub e_phoff: u32,
    /// File offset of the section header table (not decoded further).
    pub e_shoff: u32,
    /// Processor-specific flags.
    pub e_flags: u32,
    /// Size of this header in bytes.
    pub e_ehsize: u16,
    /// Size of one program header entry.
    pub e_phentsize: u16,
    /// Number of program header entries.
    pub e_phnum: u16,
    /// Size of one section header entry.
    pub e_shentsize: u16,
    /// Number of section header entries.
    pub e_shnum: u16,
    /// Section header string table index.
    pub e_shstrndx: u16,
}

impl ElfHeader {
    /// Decodes the 52-byte ELF32 file header from a cursor at offset 0.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::BadMagic`] if the first four identity bytes are
    /// not `\x7fELF`, or [`ElfError::Truncated`] if the data ends before
    /// the header does.
    pub fn parse(cur: &mut Cursor<'_>) -> Result<Self, ElfError> {
        let ident_bytes = cur.read_bytes(EI_NIDENT)?;
        if ident_bytes[..4] != ELF_MAGIC {
            return Err(ElfError::BadMagic);
        }
        let mut bytes = [0u8; EI_NIDENT];
        bytes.copy_from_slice(ident_bytes);
        let ident = ElfIdent { bytes };

        Ok(Self {
            ident,
            e_type: cur.read_u16()?,
            e_machine: cur.read_u16()?,
            e_version: cur.read_u32()?,
            e_entry: cur.read_u32()?,
            e_phoff: cur.read_u32()?,
            e_shoff: cur.read_u32()?,
            e_flags: cur.read_u32()?,
            e_ehsize: cur.read_u16()?,
            e_phentsize: cur.read_u16()?,
            e_phnum: cur.read_u16()?,
            e_shentsize: cur.read_u16()?,
            e_shnum: cur.read_u16()?,
            e_shstrndx: cur.read_u16()?,
        })
    }

    /// Human-readable name for the object file type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.e_type {
            0 => "NONE",
            1 => "REL",
            2 => "EXEC",
            3 => "DYN",
            4 => "CORE",
            _ => "UNKNOWN",
        }
    }

    /// Human-readable name for the machine architecture.
    #[must_use]
    pub fn machine_name(&self) -> &'static str {
        match self.e_machine {
            0 => "NONE",
            1 => "M32",
            2 => "SPARC",
            3 => "386",
            4 => "68000",
            5 => "88000",
            7 => "80860",
            8 => "MIPS-RS3000",
            40 => "ARM",
            62 => "X86-64",
            _ => "UNKNOWN",
        }
    }
}
