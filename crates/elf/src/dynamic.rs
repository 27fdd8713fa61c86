//! Dynamic table (`PT_DYNAMIC` segment) decoding.
//!
//! A dynamic table is a run of 8-byte records: a 4-byte tag followed by a
//! 4-byte union interpreted as a value or a pointer depending solely on
//! the tag. The three name-bearing tags (`NEEDED`, `SONAME`, `RPATH`) are
//! resolved against the table's own string table, located through the
//! `STRTAB` record's file offset.

use alloc::vec::Vec;

use crate::{Cursor, ElfError};

use core::fmt;

/// A dynamic table tag.
///
/// All tags defined by the base ELF32 specification are enumerated;
/// anything above `JMPREL` (23) is retained as [`Unknown`](Self::Unknown)
/// with a fallback label and no payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynTag {
    /// End-of-table marker. No payload.
    Null,
    /// A required shared library; names resolve via the string table.
    Needed,
    /// Size of the PLT relocation entries.
    PltRelSz,
    /// Address of the PLT/GOT.
    PltGot,
    /// Address of the symbol hash table.
    Hash,
    /// File offset of the dynamic string table.
    StrTab,
    /// Address of the symbol table.
    SymTab,
    /// Address of the `Rela` relocation table.
    Rela,
    /// Size of the `Rela` relocation table.
    RelaSz,
    /// Size of one `Rela` entry.
    RelaEnt,
    /// Size of the string table.
    StrSz,
    /// Size of one symbol table entry.
    SymEnt,
    /// Address of the initialization function.
    Init,
    /// Address of the termination function.
    Fini,
    /// This object's own name; resolves via the string table.
    Soname,
    /// Library search path string; resolves via the string table.
    Rpath,
    /// Symbolic resolution flag. No payload.
    Symbolic,
    /// Address of the `Rel` relocation table.
    Rel,
    /// Size of the `Rel` relocation table.
    RelSz,
    /// Size of one `Rel` entry.
    RelEnt,
    /// Type of relocation referenced by the PLT.
    PltRel,
    /// Debugging hook address.
    Debug,
    /// Text relocation flag. No payload.
    TextRel,
    /// Address of the PLT relocation entries.
    JmpRel,
    /// A tag above the highest known value; carried without a payload.
    Unknown(u32),
}

/// Payload classification of a dynamic tag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TagKind {
    /// The union holds an address/offset.
    Pointer,
    /// The union holds a plain value.
    Value,
    /// The union holds nothing usable.
    None,
}

impl DynTag {
    /// Maps a raw tag number to a tag.
    #[must_use]
    pub fn from_u32(raw: u32) -> Self {
        match raw {
            0 => Self::Null,
            1 => Self::Needed,
            2 => Self::PltRelSz,
            3 => Self::PltGot,
            4 => Self::Hash,
            5 => Self::StrTab,
            6 => Self::SymTab,
            7 => Self::Rela,
            8 => Self::RelaSz,
            9 => Self::RelaEnt,
            10 => Self::StrSz,
            11 => Self::SymEnt,
            12 => Self::Init,
            13 => Self::Fini,
            14 => Self::Soname,
            15 => Self::Rpath,
            16 => Self::Symbolic,
            17 => Self::Rel,
            18 => Self::RelSz,
            19 => Self::RelEnt,
            20 => Self::PltRel,
            21 => Self::Debug,
            22 => Self::TextRel,
            23 => Self::JmpRel,
            other => Self::Unknown(other),
        }
    }

    /// Payload classification, fully determined by the tag identifier.
    #[must_use]
    pub fn kind(self) -> TagKind {
        match self {
            Self::PltGot
            | Self::Hash
            | Self::StrTab
            | Self::SymTab
            | Self::Rela
            | Self::Init
            | Self::Fini
            | Self::Rel
            | Self::Debug
            | Self::JmpRel => TagKind::Pointer,
            Self::Null | Self::Symbolic | Self::TextRel | Self::Unknown(_) => TagKind::None,
            _ => TagKind::Value,
        }
    }

    /// Whether the tag's value is an offset into the string table.
    #[must_use]
    pub fn is_name_bearing(self) -> bool {
        matches!(self, Self::Needed | Self::Soname | Self::Rpath)
    }
}

impl fmt::Display for DynTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Null => "NULL",
            Self::Needed => "NEEDED",
            Self::PltRelSz => "PLTRELSZ",
            Self::PltGot => "PLTGOT",
            Self::Hash => "HASH",
            Self::StrTab => "STRTAB",
            Self::SymTab => "SYMTAB",
            Self::Rela => "RELA",
            Self::RelaSz => "RELASZ",
            Self::RelaEnt => "RELAENT",
            Self::StrSz => "STRSZ",
            Self::SymEnt => "SYMENT",
            Self::Init => "INIT",
            Self::Fini => "FINI",
            Self::Soname => "SONAME",
            Self::Rpath => "RPATH",
            Self::Symbolic => "SYMBOLIC",
            Self::Rel => "REL",
            Self::RelSz => "RELSZ",
            Self::RelEnt => "RELENT",
            Self::PltRel => "PLTREL",
            Self::Debug => "DEBUG",
            Self::TextRel => "TEXTREL",
            Self::JmpRel => "JMPREL",
            Self::Unknown(raw) => return write!(f, "UNKNOWN(0x{raw:x})"),
        };
        f.write_str(name)
    }
}

/// The decoded payload of one dynamic record.
///
/// Exactly one variant applies per record, selected by the tag alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DynValue<'a> {
    /// An address or file offset.
    Pointer(u32),
    /// A plain value.
    Value(u32),
    /// A resolved string table name (`NEEDED`, `SONAME`, `RPATH` only).
    Name(&'a str),
    /// No usable payload.
    None,
}

/// One decoded dynamic table record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DynEntry<'a> {
    /// The record's tag.
    pub tag: DynTag,
    /// The record's single payload.
    pub value: DynValue<'a>,
}

/// A decoded dynamic table, records in on-disk order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DynamicTable<'a> {
    entries: Vec<DynEntry<'a>>,
}

impl<'a> DynamicTable<'a> {
    /// Decodes the dynamic table in `file[offset..offset + size]`.
    ///
    /// `file` must be the whole object image: name resolution reads the
    /// string table through the `STRTAB` record's file offset, which is
    /// relative to the start of the file, not the segment.
    ///
    /// # Errors
    ///
    /// Returns [`ElfError::Truncated`] if the range runs past the data,
    /// [`ElfError::MissingStringTable`] if a name-bearing tag exists
    /// without a `STRTAB` record, [`ElfError::UnterminatedString`] if a
    /// name runs to the end of the data without a NUL, and
    /// [`ElfError::InvalidString`] for non-ASCII name bytes. Any of these
    /// aborts the whole decode; no partial table is returned.
    pub fn parse(file: &'a [u8], offset: usize, size: usize) -> Result<Self, ElfError> {
        let end = offset.checked_add(size).ok_or(ElfError::Truncated)?;

        let mut cur = Cursor::new(file);
        cur.seek(offset);

        let mut raw: Vec<(DynTag, u32)> = Vec::new();
        while cur.position() + 8 <= end {
            let tag = DynTag::from_u32(cur.read_u32()?);
            let un = cur.read_u32()?;
            raw.push((tag, un));
        }

        let strtab = raw
            .iter()
            .find(|(tag, _)| *tag == DynTag::StrTab)
            .map(|&(_, un)| un);

        let mut entries = Vec::with_capacity(raw.len());
        for (tag, un) in raw {
            let value = match tag.kind() {
                TagKind::Pointer => DynValue::Pointer(un),
                TagKind::None => DynValue::None,
                TagKind::Value if tag.is_name_bearing() => {
                    let strtab = strtab.ok_or(ElfError::MissingStringTable)?;
                    DynValue::Name(read_name(file, strtab, un)?)
                }
                TagKind::Value => DynValue::Value(un),
            };
            entries.push(DynEntry { tag, value });
        }

        Ok(Self { entries })
    }

    /// Returns the records in on-disk order.
    #[must_use]
    pub fn entries(&self) -> &[DynEntry<'a>] {
        &self.entries
    }

    /// Returns the `NEEDED` names in on-disk order, duplicates preserved.
    pub fn needed(&self) -> impl Iterator<Item = &'a str> + '_ {
        self.entries.iter().filter_map(|entry| match entry {
            DynEntry {
                tag: DynTag::Needed,
                value: DynValue::Name(name),
            } => Some(*name),
            _ => None,
        })
    }

    /// Returns the object's `SONAME`, if the table declares one.
    #[must_use]
    pub fn soname(&self) -> Option<&'a str> {
        self.entries.iter().find_map(|entry| match entry {
            DynEntry {
                tag: DynTag::Soname,
                value: DynValue::Name(name),
            } => Some(*name),
            _ => None,
        })
    }
}

/// Reads the NUL-terminated ASCII name at `strtab + value`.
fn read_name(file: &[u8], strtab: u32, value: u32) -> Result<&str, ElfError> {
    let offset = (strtab as usize)
        .checked_add(value as usize)
        .ok_or(ElfError::Truncated)?;

    let mut cur = Cursor::new(file);
    cur.seek(offset);
    let bytes = cur.read_cstr()?;
    if !bytes.is_ascii() {
        return Err(ElfError::InvalidString);
    }
    core::str::from_utf8(bytes).map_err(|_| ElfError::InvalidString)
}

#[cfg(test)]
mod tests {
    use super::*;

    const DT_NULL: u32 = 0;
    const DT_NEEDED: u32 = 1;
    const DT_PLTGOT: u32 = 3;
    const DT_STRTAB: u32 = 5;
    const DT_STRSZ: u32 = 10;
    const DT_SONAME: u32 = 14;
    const DT_RPATH: u32 = 15;
    const DT_SYMBOLIC: u32 = 16;

    /// Lay out `records` at offset 0 followed by `strtab`, returning the
    /// image and the table size in bytes.
    fn image(records: &[(u32, u32)], strtab: &[u8]) -> (Vec<u8>, usize) {
        let mut buf = Vec::new();
        for &(tag, un) in records {
            buf.extend_from_slice(&tag.to_le_bytes());
            buf.extend_from_slice(&un.to_le_bytes());
        }
        let size = buf.len();
        buf.extend_from_slice(strtab);
        (buf, size)
    }

    #[test]
    fn needed_names_in_order_with_duplicates() {
        let strtab = b"\0libm.so\0libc.so\0";
        // 5 records * 8 bytes; STRTAB points past them.
        let (buf, size) = image(
            &[
                (DT_NEEDED, 1),
                (DT_NEEDED, 9),
                (DT_NEEDED, 1),
                (DT_STRTAB, 40),
                (DT_NULL, 0),
            ],
            strtab,
        );
        let table = DynamicTable::parse(&buf, 0, size).expect("valid table");
        let needed: Vec<_> = table.needed().collect();
        assert_eq!(needed, ["libm.so", "libc.so", "libm.so"]);
    }

    #[test]
    fn soname_and_rpath_resolved() {
        let strtab = b"\0libown.so\0/data/lib\0";
        let (buf, size) = image(
            &[(DT_SONAME, 1), (DT_RPATH, 11), (DT_STRTAB, 32), (DT_NULL, 0)],
            strtab,
        );
        let table = DynamicTable::parse(&buf, 0, size).expect("valid table");
        assert_eq!(table.soname(), Some("libown.so"));
        assert_eq!(
            table.entries()[1].value,
            DynValue::Name("/data/lib"),
            "RPATH resolves through the string table too"
        );
    }

    #[test]
    fn payload_kind_follows_tag() {
        let (buf, size) = image(
            &[
                (DT_PLTGOT, 0x1000),
                (DT_STRSZ, 42),
                (DT_SYMBOLIC, 7),
                (DT_NULL, 0),
            ],
            b"",
        );
        let table = DynamicTable::parse(&buf, 0, size).expect("valid table");
        let entries = table.entries();
        assert_eq!(entries[0].value, DynValue::Pointer(0x1000));
        assert_eq!(entries[1].value, DynValue::Value(42));
        // SYMBOLIC carries neither a value nor a pointer, whatever the
        // union byte says.
        assert_eq!(entries[2].value, DynValue::None);
        assert_eq!(entries[3].value, DynValue::None);
    }

    #[test]
    fn unknown_tag_retained_without_payload() {
        let (buf, size) = image(&[(24, 99), (0x6fff_fef5, 1), (DT_NULL, 0)], b"");
        let table = DynamicTable::parse(&buf, 0, size).expect("valid table");
        let entries = table.entries();
        assert_eq!(entries[0].tag, DynTag::Unknown(24));
        assert_eq!(entries[0].value, DynValue::None);
        assert_eq!(format!("{}", entries[0].tag), "UNKNOWN(0x18)");
        assert_eq!(format!("{}", entries[1].tag), "UNKNOWN(0x6ffffef5)");
    }

    #[test]
    fn known_tag_labels() {
        assert_eq!(format!("{}", DynTag::Needed), "NEEDED");
        assert_eq!(format!("{}", DynTag::StrTab), "STRTAB");
        assert_eq!(format!("{}", DynTag::JmpRel), "JMPREL");
    }

    #[test]
    fn unterminated_name_aborts_decode() {
        // String table ends without a NUL.
        let strtab = b"\0libm.so";
        let (buf, size) = image(&[(DT_NEEDED, 1), (DT_STRTAB, 24), (DT_NULL, 0)], strtab);
        assert_eq!(
            DynamicTable::parse(&buf, 0, size),
            Err(ElfError::UnterminatedString)
        );
    }

    #[test]
    fn name_offset_past_end_aborts_decode() {
        let (buf, size) = image(&[(DT_NEEDED, 0x1000), (DT_STRTAB, 24), (DT_NULL, 0)], b"\0");
        assert_eq!(
            DynamicTable::parse(&buf, 0, size),
            Err(ElfError::UnterminatedString)
        );
    }

    #[test]
    fn missing_strtab_with_needed() {
        let (buf, size) = image(&[(DT_NEEDED, 1), (DT_NULL, 0)], b"\0libm.so\0");
        assert_eq!(
            DynamicTable::parse(&buf, 0, size),
            Err(ElfError::MissingStringTable)
        );
    }

    #[test]
    fn missing_strtab_without_names_is_fine() {
        let (buf, size) = image(&[(DT_STRSZ, 9), (DT_NULL, 0)], b"");
        let table = DynamicTable::parse(&buf, 0, size).expect("no names to resolve");
        assert_eq!(table.needed().count(), 0);
        assert_eq!(table.soname(), None);
    }

    #[test]
    fn non_ascii_name_rejected() {
        let strtab = b"\0lib\xc3\xa9.so\0";
        let (buf, size) = image(&[(DT_NEEDED, 1), (DT_STRTAB, 24), (DT_NULL, 0)], strtab);
        assert_eq!(
            DynamicTable::parse(&buf, 0, size),
            Err(ElfError::InvalidString)
        );
    }

    #[test]
    fn empty_table() {
        let (buf, size) = image(&[(DT_NULL, 0)], b"");
        let table = DynamicTable::parse(&buf, 0, size).expect("valid table");
        assert_eq!(table.entries().len(), 1);
        assert_eq!(table.needed().count(), 0);
    }

    #[test]
    fn trailing_partial_record_ignored() {
        let (mut buf, size) = image(&[(DT_NULL, 0)], b"");
        buf.extend_from_slice(&[0xAA; 5]);
        // The declared size covers only whole records.
        let table = DynamicTable::parse(&buf, 0, size + 5).expect("valid table");
        assert_eq!(table.entries().len(), 1);
    }

    #[test]
    fn range_past_end_is_truncated() {
        let (buf, _) = image(&[(DT_NULL, 0)], b"");
        assert_eq!(
            DynamicTable::parse(&buf, 0, buf.len() + 8),
            Err(ElfError::Truncated)
        );
    }
}
