//! Program header (segment) table decoding and the [`ElfFile`] entry point.
//!
//! [`ElfFile::parse`] runs the whole decode chain once — file header,
//! every program header entry, and the dynamic table of every
//! `PT_DYNAMIC` segment — and keeps the result for its lifetime. Entries
//! come back in on-disk order with no filtering.

use alloc::vec::Vec;

use crate::dynamic::DynamicTable;
use crate::header::ElfHeader;
use crate::{Cursor, DecodeProfile, ElfError};

/// Segment type: dynamic linking metadata.
pub const PT_DYNAMIC: u32 = 2;

/// Segment type: loadable.
pub const PT_LOAD: u32 = 1;

/// Size in bytes of the ELF32 program header fields this decoder reads.
pub const ELF32_PHDR_SIZE: usize = 32;

/// One program header entry: eight 32-bit fields plus the decoded dynamic
/// table when the entry is `PT_DYNAMIC`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment<'a> {
    /// Segment type (`PT_LOAD`, `PT_DYNAMIC`, ...).
    pub p_type: u32,
    /// File offset of the segment data.
    pub p_offset: u32,
    /// Virtual address of the segment.
    pub p_vaddr: u32,
    /// Physical address of the segment.
    pub p_paddr: u32,
    /// Size of the segment data in the file.
    pub p_filesz: u32,
    /// Size of the segment in memory.
    pub p_memsz: u32,
    /// Segment permission flags.
    pub p_flags: u32,
    /// Alignment constraint.
    pub p_align: u32,
    /// Decoded dynamic table; populated only for `PT_DYNAMIC` entries.
    pub dynamic: Option<DynamicTable<'a>>,
}

impl Segment<'_> {
    /// Human-readable name for the segment type.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self.p_type {
            0 => "NULL",
            1 => "LOAD",
            2 => "DYNAMIC",
            3 => "INTERP",
            4 => "NOTE",
            5 => "SHLIB",
            6 => "PHDR",
            _ => "UNKNOWN",
        }
    }
}

/// A fully decoded ELF32 object.
///
/// Borrows the raw file image; header and segments are decoded eagerly by
/// [`parse`](Self::parse) and never re-read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ElfFile<'a> {
    data: &'a [u8],
    profile: DecodeProfile,
    header: ElfHeader,
    segments: Vec<Segment<'a>>,
}

impl<'a> ElfFile<'a> {
    /// Decodes an ELF32 object with the default profile.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError`] if the header, any program header entry, or
    /// any dynamic table is malformed; nothing partial is returned.
    pub fn parse(data: &'a [u8]) -> Result<Self, ElfError> {
        Self::parse_with(data, DecodeProfile::default())
    }

    /// Decodes an ELF32 object with an explicit [`DecodeProfile`].
    ///
    /// # Errors
    ///
    /// See [`parse`](Self::parse).
    pub fn parse_with(data: &'a [u8], profile: DecodeProfile) -> Result<Self, ElfError> {
        let mut cur = Cursor::new(data);
        let header = ElfHeader::parse(&mut cur)?;
        let segments = decode_segments(data, &header)?;
        Ok(Self {
            data,
            profile,
            header,
            segments,
        })
    }

    /// Returns the raw file image this object was decoded from.
    #[must_use]
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Returns the decode profile in effect.
    #[must_use]
    pub fn profile(&self) -> DecodeProfile {
        self.profile
    }

    /// Returns the decoded file header.
    #[must_use]
    pub fn header(&self) -> &ElfHeader {
        &self.header
    }

    /// Returns the program header entries in on-disk order.
    #[must_use]
    pub fn segments(&self) -> &[Segment<'a>] {
        &self.segments
    }

    /// Returns the `NEEDED` names across all dynamic segments, in on-disk
    /// order with duplicates preserved.
    ///
    /// An object with no `PT_DYNAMIC` segment yields an empty list.
    #[must_use]
    pub fn needed_libraries(&self) -> Vec<&'a str> {
        self.segments
            .iter()
            .filter_map(|seg| seg.dynamic.as_ref())
            .flat_map(DynamicTable::needed)
            .collect()
    }

    /// Returns the first `SONAME` declared by any dynamic segment.
    #[must_use]
    pub fn soname(&self) -> Option<&'a str> {
        self.segments
            .iter()
            .filter_map(|seg| seg.dynamic.as_ref())
            .find_map(DynamicTable::soname)
    }
}

/// Decodes `e_phnum` entries of `e_phentsize` bytes starting at `e_phoff`.
#[expect(
    clippy::cast_possible_truncation,
    reason = "offsets are bounds-checked against the data length in u64"
)]
fn decode_segments<'a>(data: &'a [u8], header: &ElfHeader) -> Result<Vec<Segment<'a>>, ElfError> {
    let phoff = u64::from(header.e_phoff);
    let phentsize = u64::from(header.e_phentsize);
    let phnum = u64::from(header.e_phnum);

    if phnum == 0 {
        return Ok(Vec::new());
    }
    if (header.e_phentsize as usize) < ELF32_PHDR_SIZE {
        return Err(ElfError::UndersizedPhEntry);
    }
    if phoff + phnum * phentsize > data.len() as u64 {
        return Err(ElfError::Truncated);
    }

    let mut cur = Cursor::new(data);
    let mut segments = Vec::with_capacity(header.e_phnum as usize);

    for i in 0..phnum {
        cur.seek((phoff + i * phentsize) as usize);

        let p_type = cur.read_u32()?;
        let p_offset = cur.read_u32()?;
        let p_vaddr = cur.read_u32()?;
        let p_paddr = cur.read_u32()?;
        let p_filesz = cur.read_u32()?;
        let p_memsz = cur.read_u32()?;
        let p_flags = cur.read_u32()?;
        let p_align = cur.read_u32()?;

        // A segment whose file range leaks past the image is malformed;
        // fail instead of silently truncating.
        if u64::from(p_offset) + u64::from(p_filesz) > data.len() as u64 {
            return Err(ElfError::SegmentOutOfBounds);
        }

        let dynamic = if p_type == PT_DYNAMIC {
            Some(DynamicTable::parse(
                data,
                p_offset as usize,
                p_filesz as usize,
            )?)
        } else {
            None
        };

        segments.push(Segment {
            p_type,
            p_offset,
            p_vaddr,
            p_paddr,
            p_filesz,
            p_memsz,
            p_flags,
            p_align,
            dynamic,
        });
    }

    Ok(segments)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::header::tests::{append_phdr, make_elf_header};
    use crate::{DynTag, DynValue};

    const DT_NULL: u32 = 0;
    const DT_NEEDED: u32 = 1;
    const DT_STRTAB: u32 = 5;
    const DT_SONAME: u32 = 14;

    /// Build a complete shared object image: header, one `PT_DYNAMIC`
    /// program header, the dynamic records, and the string table.
    fn make_so(needed: &[&str], soname: Option<&str>) -> Vec<u8> {
        let mut strtab = vec![0u8];
        let mut name_offsets = Vec::new();
        for name in needed {
            name_offsets.push(strtab.len() as u32);
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
        }
        let soname_offset = soname.map(|name| {
            let off = strtab.len() as u32;
            strtab.extend_from_slice(name.as_bytes());
            strtab.push(0);
            off
        });

        let record_count = needed.len() + usize::from(soname.is_some()) + 2;
        let dyn_size = record_count * 8;
        let dyn_offset = 52 + 32; // header + one phdr
        let strtab_offset = dyn_offset + dyn_size;

        let mut buf = make_elf_header();
        append_phdr(&mut buf, PT_DYNAMIC, dyn_offset as u32, dyn_size as u32, 6);

        let mut push_record = |tag: u32, un: u32| {
            buf.extend_from_slice(&tag.to_le_bytes());
            buf.extend_from_slice(&un.to_le_bytes());
        };
        for off in &name_offsets {
            push_record(DT_NEEDED, *off);
        }
        if let Some(off) = soname_offset {
            push_record(DT_SONAME, off);
        }
        push_record(DT_STRTAB, strtab_offset as u32);
        push_record(DT_NULL, 0);

        buf.extend_from_slice(&strtab);
        buf
    }

    #[test]
    fn no_segments() {
        let buf = make_elf_header();
        let elf = ElfFile::parse(&buf).expect("valid ELF");
        assert!(elf.segments().is_empty());
        assert!(elf.needed_libraries().is_empty());
        assert_eq!(elf.soname(), None);
    }

    #[test]
    fn needed_across_decode_chain() {
        let buf = make_so(&["libm.so", "libc.so"], Some("libown.so"));
        let elf = ElfFile::parse(&buf).expect("valid ELF");

        assert_eq!(elf.segments().len(), 1);
        let seg = &elf.segments()[0];
        assert_eq!(seg.p_type, PT_DYNAMIC);
        assert_eq!(seg.type_name(), "DYNAMIC");
        assert!(seg.dynamic.is_some());

        assert_eq!(elf.needed_libraries(), ["libm.so", "libc.so"]);
        assert_eq!(elf.soname(), Some("libown.so"));
    }

    #[test]
    fn non_dynamic_segment_has_no_table() {
        let mut buf = make_elf_header();
        // File range [0, 4) — the start of the header — is valid data.
        append_phdr(&mut buf, PT_LOAD, 0, 4, 5);
        let elf = ElfFile::parse(&buf).expect("valid ELF");
        assert_eq!(elf.segments().len(), 1);
        assert_eq!(elf.segments()[0].dynamic, None);
        assert_eq!(elf.segments()[0].type_name(), "LOAD");
        assert!(elf.needed_libraries().is_empty());
    }

    #[test]
    fn entries_in_disk_order_unfiltered() {
        let mut buf = make_elf_header();
        append_phdr(&mut buf, 4, 0, 0, 4); // PT_NOTE
        append_phdr(&mut buf, PT_LOAD, 0, 0, 5);
        append_phdr(&mut buf, 0x6474_e551, 0, 0, 6); // OS-specific
        let elf = ElfFile::parse(&buf).expect("valid ELF");
        let types: Vec<u32> = elf.segments().iter().map(|s| s.p_type).collect();
        assert_eq!(types, [4, PT_LOAD, 0x6474_e551]);
        assert_eq!(elf.segments()[2].type_name(), "UNKNOWN");
    }

    #[test]
    fn undersized_phentsize_rejected() {
        let mut buf = make_so(&[], None);
        buf[42..44].copy_from_slice(&8u16.to_le_bytes());
        assert_eq!(ElfFile::parse(&buf), Err(ElfError::UndersizedPhEntry));
    }

    #[test]
    fn phdr_table_past_end_rejected() {
        let mut buf = make_elf_header();
        // One entry claimed, no entry bytes present.
        buf[44..46].copy_from_slice(&1u16.to_le_bytes());
        assert_eq!(ElfFile::parse(&buf), Err(ElfError::Truncated));
    }

    #[test]
    fn segment_range_past_end_rejected() {
        let mut buf = make_elf_header();
        append_phdr(&mut buf, PT_LOAD, 0x1000, 0x1000, 5);
        assert_eq!(ElfFile::parse(&buf), Err(ElfError::SegmentOutOfBounds));
    }

    #[test]
    fn dynamic_decode_failure_aborts_parse() {
        // Corrupt the string table NUL terminator of the only name.
        let mut buf = make_so(&["libm.so"], None);
        let last = buf.len() - 1;
        buf[last] = b'x';
        assert_eq!(ElfFile::parse(&buf), Err(ElfError::UnterminatedString));
    }

    #[test]
    fn oversized_phentsize_skips_padding() {
        // phentsize larger than the 32 bytes we read: entries are padded.
        let mut buf = make_elf_header();
        buf[42..44].copy_from_slice(&40u16.to_le_bytes());
        buf[44..46].copy_from_slice(&1u16.to_le_bytes());
        // 40-byte entry: a PT_NULL segment with 8 bytes of padding.
        buf.extend_from_slice(&0u32.to_le_bytes()); // p_type = PT_NULL
        buf.extend_from_slice(&[0u8; 28]);
        buf.extend_from_slice(&[0xEE; 8]); // padding the decoder must skip
        let elf = ElfFile::parse(&buf).expect("valid ELF");
        assert_eq!(elf.segments().len(), 1);
        assert_eq!(elf.segments()[0].p_type, 0);
    }

    #[test]
    fn parse_is_idempotent() {
        let buf = make_so(&["libm.so"], Some("libown.so"));
        let a = ElfFile::parse(&buf).expect("valid ELF");
        let b = ElfFile::parse(&buf).expect("valid ELF");
        assert_eq!(a.header(), b.header());
        assert_eq!(a.segments(), b.segments());
    }

    #[test]
    fn dynamic_entry_payloads_exposed() {
        let buf = make_so(&["libm.so"], None);
        let elf = ElfFile::parse(&buf).expect("valid ELF");
        let table = elf.segments()[0].dynamic.as_ref().expect("dynamic table");
        let entries = table.entries();
        assert_eq!(entries[0].tag, DynTag::Needed);
        assert_eq!(entries[0].value, DynValue::Name("libm.so"));
        assert!(matches!(entries[1].value, DynValue::Pointer(_)));
        assert_eq!(entries[2].tag, DynTag::Null);
    }

    #[test]
    fn profile_defaults_to_elf32_le() {
        let buf = make_elf_header();
        let elf = ElfFile::parse(&buf).expect("valid ELF");
        assert_eq!(elf.profile(), DecodeProfile::Elf32LittleEndian);
    }
}
