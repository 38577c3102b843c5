//! Class aware field placement.

use core::mem;

use crate::{ParseError, encoding::DataEncoding, ident, raw, usize_to_u64};

/// The 32-/64-bit branch of the ELF file format, carried as a tagged variant.
///
/// All field offsets are computed from the [`raw`] structure definitions, so the two layouts
/// share a single set of accessors instead of duplicated parallel code paths.
#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum Layout {
    /// The file uses the 32-bit ELF structures.
    Elf32,
    /// The file uses the 64-bit ELF structures.
    Elf64,
}

impl Layout {
    /// Returns the [`Layout`] that corresponds with the given [`ident::Class`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnsupportedClass`] if the given [`ident::Class`] is neither the
    /// 32-bit nor the 64-bit class.
    pub fn from_elf_class(class: ident::Class) -> Result<Self, ParseError> {
        match class {
            ident::Class::CLASS32 => Ok(Self::Elf32),
            ident::Class::CLASS64 => Ok(Self::Elf64),
            class => Err(ParseError::UnsupportedClass(class)),
        }
    }

    /// Reads the class-sized unsigned integer at `offset` bytes into `data`, widened to `u64`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the read would go out of bounds.
    pub fn read_word(
        self,
        encoding: DataEncoding,
        data: &[u8],
        offset: u64,
    ) -> Result<u64, ParseError> {
        match self {
            Self::Elf32 => encoding.read_u32(data, offset).map(u64::from),
            Self::Elf64 => encoding.read_u64(data, offset),
        }
    }

    /// The expected size of an ELF file header.
    pub fn header_size(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::size_of::<raw::Elf32Header>()),
            Self::Elf64 => usize_to_u64(mem::size_of::<raw::Elf64Header>()),
        }
    }

    /// The offset of the machine field.
    pub fn machine_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32Header, machine)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64Header, machine)),
        }
    }

    /// The offset of the section header table offset field.
    pub fn section_header_offset_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32Header, shoff)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64Header, shoff)),
        }
    }

    /// The offset of the section header count field.
    pub fn section_header_count_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32Header, shnum)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64Header, shnum)),
        }
    }

    /// The offset of the section header size field.
    pub fn section_header_size_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32Header, shentsize)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64Header, shentsize)),
        }
    }

    /// The offset of the section header string table index field.
    pub fn string_table_index_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32Header, shstrndx)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64Header, shstrndx)),
        }
    }

    /// The expected size of an ELF section header.
    pub fn section_header_entry_size(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::size_of::<raw::Elf32SectionHeader>()),
            Self::Elf64 => usize_to_u64(mem::size_of::<raw::Elf64SectionHeader>()),
        }
    }

    /// The offset of the name field inside a section header.
    pub fn section_name_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32SectionHeader, name)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64SectionHeader, name)),
        }
    }

    /// The offset of the offset field inside a section header.
    pub fn section_offset_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32SectionHeader, offset)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64SectionHeader, offset)),
        }
    }

    /// The offset of the size field inside a section header.
    pub fn section_size_offset(self) -> u64 {
        match self {
            Self::Elf32 => usize_to_u64(mem::offset_of!(raw::Elf32SectionHeader, size)),
            Self::Elf64 => usize_to_u64(mem::offset_of!(raw::Elf64SectionHeader, size)),
        }
    }
}
