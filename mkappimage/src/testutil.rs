//! Shared fixture helpers for on-disk tests.

use std::{
    fs::File,
    io::{Read, Seek, SeekFrom, Write},
    path::Path,
};

use tempfile::NamedTempFile;

use crate::locate::Section;

/// A named section to place into a fixture stub.
pub(crate) struct FixtureSection {
    /// The name of the section.
    pub name: &'static str,
    /// The size of the section in bytes.
    pub size: usize,
    /// The byte every section byte is filled with.
    pub fill: u8,
}

impl FixtureSection {
    pub(crate) fn new(name: &'static str, size: usize, fill: u8) -> Self {
        Self { name, size, fill }
    }
}

/// A built fixture stub together with the expected location of every named section.
pub(crate) struct Fixture {
    /// The bytes of the stub.
    pub bytes: Vec<u8>,
    /// The expected byte range of every named section, in declaration order.
    pub sections: Vec<Section>,
}

/// Builds a minimal little-endian 64-bit ELF stub containing the given named sections (plus
/// the leading null entry and a trailing `.shstrtab`), laid out as header, section data,
/// string table, section header table.
pub(crate) fn build_stub(sections: &[FixtureSection]) -> Fixture {
    const EHSIZE: usize = 64;
    const SHENTSIZE: usize = 64;

    let mut strings = vec![0u8];
    let mut name_offsets = Vec::new();
    for section in sections {
        name_offsets.push(u32::try_from(strings.len()).unwrap());
        strings.extend_from_slice(section.name.as_bytes());
        strings.push(0);
    }
    let shstrtab_name_offset = u32::try_from(strings.len()).unwrap();
    strings.extend_from_slice(b".shstrtab\0");

    let mut position = EHSIZE;
    let mut data_offsets = Vec::new();
    for section in sections {
        data_offsets.push(position as u64);
        position += section.size;
    }
    let strings_offset = position as u64;
    position += strings.len();
    let shoff = position as u64;
    let count = sections.len() + 2;

    let mut bytes = vec![0u8; position + count * SHENTSIZE];

    // Identification bytes: magic, 64-bit class, little-endian encoding, version 1.
    bytes[0..4].copy_from_slice(&[0x7F, b'E', b'L', b'F']);
    bytes[4] = 2;
    bytes[5] = 1;
    bytes[6] = 1;

    // File header fields the locator consumes.
    bytes[0x12..0x14].copy_from_slice(&62u16.to_le_bytes());
    bytes[40..48].copy_from_slice(&shoff.to_le_bytes());
    bytes[58..60].copy_from_slice(&(SHENTSIZE as u16).to_le_bytes());
    bytes[60..62].copy_from_slice(&(count as u16).to_le_bytes());
    bytes[62..64].copy_from_slice(&((count - 1) as u16).to_le_bytes());

    for (section, offset) in sections.iter().zip(&data_offsets) {
        let start = *offset as usize;
        bytes[start..start + section.size].fill(section.fill);
    }

    let strings_start = strings_offset as usize;
    bytes[strings_start..strings_start + strings.len()].copy_from_slice(&strings);

    let mut write_header = |index: usize, name_offset: u32, offset: u64, size: u64| {
        let entry = shoff as usize + index * SHENTSIZE;
        bytes[entry..entry + 4].copy_from_slice(&name_offset.to_le_bytes());
        bytes[entry + 4..entry + 8].copy_from_slice(&1u32.to_le_bytes());
        bytes[entry + 24..entry + 32].copy_from_slice(&offset.to_le_bytes());
        bytes[entry + 32..entry + 40].copy_from_slice(&size.to_le_bytes());
    };

    for (index, section) in sections.iter().enumerate() {
        write_header(
            index + 1,
            name_offsets[index],
            data_offsets[index],
            section.size as u64,
        );
    }
    write_header(
        count - 1,
        shstrtab_name_offset,
        strings_offset,
        strings.len() as u64,
    );

    let sections = sections
        .iter()
        .zip(&data_offsets)
        .map(|(section, offset)| Section {
            name: section.name.to_owned(),
            offset: *offset,
            length: section.size as u64,
        })
        .collect();

    Fixture { bytes, sections }
}

/// Writes `bytes` to a fresh temporary file and returns its handle.
pub(crate) fn write_stub(bytes: &[u8]) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

/// Reads `length` bytes at `offset` from the file at `path`.
pub(crate) fn read_at(path: &Path, offset: u64, length: usize) -> Vec<u8> {
    let mut file = File::open(path).unwrap();
    file.seek(SeekFrom::Start(offset)).unwrap();
    let mut data = vec![0; length];
    file.read_exact(&mut data).unwrap();
    data
}
