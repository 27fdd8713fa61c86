//! Human-readable dump of a decoded ELF object.

use std::path::Path;

use sodeps_elf::{DynValue, ElfFile};

/// Prints the identity block, file header, every segment, and the decoded
/// dynamic records of `elf` to stdout.
pub fn dump_object(path: &Path, elf: &ElfFile<'_>) {
    let header = elf.header();

    println!("{}:", path.display());
    print!("  ident:  ");
    for byte in header.ident.bytes() {
        print!("{byte:02x} ");
    }
    println!();
    println!(
        "  class:  {} ({})",
        header.ident.class_name(),
        header.ident.encoding_name()
    );
    println!(
        "  type:   {}  machine: {}  version: {}",
        header.type_name(),
        header.machine_name(),
        header.e_version
    );
    println!(
        "  entry:  0x{:08x}  flags: 0x{:08x}",
        header.e_entry, header.e_flags
    );
    println!(
        "  phdrs:  {} x {} bytes at offset 0x{:x}",
        header.e_phnum, header.e_phentsize, header.e_phoff
    );

    for (index, seg) in elf.segments().iter().enumerate() {
        println!(
            "  segment {index}: {:<8} offset 0x{:06x} vaddr 0x{:08x} filesz 0x{:06x} memsz 0x{:06x} flags 0x{:x} align 0x{:x}",
            seg.type_name(),
            seg.p_offset,
            seg.p_vaddr,
            seg.p_filesz,
            seg.p_memsz,
            seg.p_flags,
            seg.p_align
        );
        if let Some(table) = &seg.dynamic {
            for entry in table.entries() {
                let tag = entry.tag.to_string();
                match entry.value {
                    DynValue::Pointer(ptr) => println!("    {tag:<12} 0x{ptr:08x}"),
                    DynValue::Value(value) => println!("    {tag:<12} {value}"),
                    DynValue::Name(name) => println!("    {tag:<12} {name}"),
                    DynValue::None => println!("    {tag}"),
                }
            }
        }
    }

    if let Some(soname) = elf.soname() {
        println!("  soname: {soname}");
    }
    let needed = elf.needed_libraries();
    if !needed.is_empty() {
        println!("  needed:");
        for name in needed {
            println!("    {name}");
        }
    }
}
