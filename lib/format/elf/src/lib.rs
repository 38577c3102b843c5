//! The `elf` crate provides an interface for reading ELF files.
//!
//! # Capabilities
//!
//! ## Works in `no_std` environments
//!
//! This crate provides an ELF file reading interface which does not allocate or use any `std`
//! features, so it can be used from any context that can produce a byte slice of the file.
//!
//! ## Endian Awareness
//!
//! This crate handles differences between host and file endianness when parsing the ELF file
//! structures.
//!
//! ## Class Awareness
//!
//! This crate handles both the 32-bit and the 64-bit ELF structure layouts. The branch between
//! the two is carried as a tagged variant ([`Layout`]) selected once when the file is opened,
//! so all accessors share a single code path.
//!
//! ## Uses no unsafe code
//!
//! This crate contains zero unsafe blocks of code.
#![no_std]

#[cfg(test)]
extern crate alloc;

use core::{error, fmt};

use crate::{
    encoding::DataEncoding,
    ident::ElfIdent,
    layout::Layout,
    section::{SectionHeader, SectionTable},
};

pub mod encoding;
pub mod ident;
pub mod layout;
pub mod raw;
pub mod section;

/// An ELF file.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Elf<'data> {
    /// The bytes of the entire ELF file.
    data: &'data [u8],
    /// The [`Layout`] used to decode this [`Elf`].
    layout: Layout,
    /// The [`DataEncoding`] used to decode this [`Elf`].
    encoding: DataEncoding,
}

impl<'data> Elf<'data> {
    /// Creates a new [`Elf`] over the given bytes.
    ///
    /// # Errors
    ///
    /// - [`ParseError::BadMagic`]: Returned when the magic bytes are not correct.
    /// - [`ParseError::UnsupportedClass`]: Returned when the class byte is neither the 32-bit
    ///   nor the 64-bit class.
    /// - [`ParseError::UnsupportedEncoding`]: Returned when the encoding byte is not a
    ///   recognized two's complement encoding.
    /// - [`ParseError::Bounds`]: Returned when the slice is too small to contain an ELF file
    ///   header.
    pub fn new(data: &'data [u8]) -> Result<Self, ParseError> {
        let ident = ElfIdent::new(data)?;
        ident.validate_magic()?;

        let layout = Layout::from_elf_class(ident.class())?;
        let encoding = DataEncoding::from_elf_encoding(ident.encoding())?;

        check_bounds(data, 0, layout.header_size())?;

        Ok(Self {
            data,
            layout,
            encoding,
        })
    }

    /// Returns the [`Layout`] used to decode this [`Elf`].
    pub fn layout(&self) -> Layout {
        self.layout
    }

    /// Returns the [`DataEncoding`] used to decode this [`Elf`].
    pub fn encoding(&self) -> DataEncoding {
        self.encoding
    }

    /// Returns the architecture for which this ELF file is targeted.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the header is truncated.
    pub fn machine(&self) -> Result<Machine, ParseError> {
        self.encoding
            .read_u16(self.data, self.layout.machine_offset())
            .map(Machine)
    }

    /// Returns the section header table's file offset in bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the header is truncated.
    pub fn section_header_offset(&self) -> Result<u64, ParseError> {
        self.layout.read_word(
            self.encoding,
            self.data,
            self.layout.section_header_offset_offset(),
        )
    }

    /// Returns the number of section headers in the section header table.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the header is truncated.
    pub fn section_header_count(&self) -> Result<u16, ParseError> {
        self.encoding
            .read_u16(self.data, self.layout.section_header_count_offset())
    }

    /// Returns the size of each section header in the section header table.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the header is truncated.
    pub fn section_header_entry_size(&self) -> Result<u16, ParseError> {
        self.encoding
            .read_u16(self.data, self.layout.section_header_size_offset())
    }

    /// Returns the index into the section header table to obtain the section name string table.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the header is truncated.
    pub fn string_table_index(&self) -> Result<u16, ParseError> {
        self.encoding
            .read_u16(self.data, self.layout.string_table_index_offset())
    }

    /// Returns the [`SectionTable`] of this [`Elf`], or [`None`] if the file declares no
    /// section header table.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the declared table does not fit inside the file.
    pub fn section_table(&self) -> Result<Option<SectionTable<'data>>, ParseError> {
        let offset = self.section_header_offset()?;
        if offset == 0 {
            return Ok(None);
        }

        let count = self.section_header_count()?;
        let entry_size = u64::from(self.section_header_entry_size()?);
        SectionTable::new(
            self.data,
            self.layout,
            self.encoding,
            offset,
            count,
            entry_size,
        )
        .map(Some)
    }

    /// Returns the first section whose name is exactly `name`, or [`None`] if no section
    /// carries that name.
    ///
    /// Names are resolved through the string table section indexed by the file header's
    /// string table index field.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the section header table or the string table does
    /// not fit inside the file.
    pub fn section_by_name(
        &self,
        name: &str,
    ) -> Result<Option<SectionHeader<'data>>, ParseError> {
        let Some(table) = self.section_table()? else {
            return Ok(None);
        };

        let Some(string_table) = table.get(self.string_table_index()?) else {
            return Ok(None);
        };
        let strings_offset = string_table.offset()?;
        let strings_size = string_table.size()?;
        check_bounds(self.data, strings_offset, strings_size)?;
        let strings =
            &self.data[u64_to_usize(strings_offset)..][..u64_to_usize(strings_size)];

        let name = name.as_bytes();
        for header in table {
            let name_offset = u64_to_usize(u64::from(header.name_offset()?));
            let Some(candidate) = strings.get(name_offset..) else {
                continue;
            };

            // An exact match is the name bytes followed by the string table's NUL terminator.
            if candidate.len() > name.len()
                && &candidate[..name.len()] == name
                && candidate[name.len()] == 0
            {
                return Ok(Some(header));
            }
        }

        Ok(None)
    }
}

impl fmt::Debug for Elf<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Elf")
            .field("layout", &self.layout)
            .field("encoding", &self.encoding)
            .finish()
    }
}

/// The architecture of the ELF file.
#[repr(transparent)]
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct Machine(pub u16);

impl Machine {
    /// No required machine.
    pub const NONE: Self = Self(0);
    /// ELF file requires the Intel 80386 architecture.
    pub const INTEL_386: Self = Self(3);
    /// ELF file requires the AArch32 architecture.
    pub const ARM: Self = Self(40);
    /// ELF file requires the AMD x86_64 architecture.
    pub const X86_64: Self = Self(62);
    /// ELF file requires the AArch64 architecture.
    pub const AARCH64: Self = Self(183);
}

impl fmt::Debug for Machine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => f.pad("None"),
            Self::INTEL_386 => f.pad("Intel386"),
            Self::ARM => f.pad("Aarch32"),
            Self::X86_64 => f.pad("x86_64"),
            Self::AARCH64 => f.pad("Aarch64"),
            machine => f.debug_tuple("Machine").field(&machine.0).finish(),
        }
    }
}

/// Various errors that can occur when reading an ELF file.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ParseError {
    /// The given slice has invalid magic bytes.
    BadMagic([u8; 4]),
    /// The class byte of the ELF file is not supported.
    UnsupportedClass(ident::Class),
    /// The encoding byte of the ELF file is not supported.
    UnsupportedEncoding(ident::Encoding),
    /// Requested region is outside of the bounds of the file.
    Bounds {
        /// The offset, in bytes, of the start of the requested region.
        offset: u64,
        /// The size, in bytes, of the requested region.
        length: u64,
        /// The actual size of the file.
        size: u64,
    },
}

impl fmt::Display for ParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMagic(bytes) => write!(f, "invalid magic bytes: {bytes:x?}"),
            Self::UnsupportedClass(class) => {
                write!(f, "unsupported ELF class: {class:?}")
            }
            Self::UnsupportedEncoding(encoding) => {
                write!(f, "unsupported ELF data encoding: {encoding:?}")
            }
            Self::Bounds {
                offset,
                length,
                size,
            } => write!(
                f,
                "requested region at {offset} bytes with a length of {length} \
                does not fit inside file of {size} bytes"
            ),
        }
    }
}

impl error::Error for ParseError {}

/// Utility function to centralize bounds checking.
pub(crate) fn check_bounds(data: &[u8], offset: u64, length: u64) -> Result<(), ParseError> {
    let size = usize_to_u64(data.len());
    let max_offset = offset.checked_add(length).ok_or(ParseError::Bounds {
        offset,
        length,
        size,
    })?;
    if max_offset > size {
        return Err(ParseError::Bounds {
            offset,
            length,
            size,
        });
    }

    Ok(())
}

/// Safely converts `value` to a `u64` relying on compile time code checking.
#[expect(clippy::as_conversions, reason = "implementation of type-safe as cast")]
pub(crate) fn usize_to_u64(value: usize) -> u64 {
    #[cfg(not(any(
        target_pointer_width = "16",
        target_pointer_width = "32",
        target_pointer_width = "64"
    )))]
    compile_error!("library supports only 16-bit, 32-bit, and 64-bit usize");
    value as u64
}

/// Safely converts `value` to a `usize` relying on compile time code checking.
#[expect(clippy::as_conversions, reason = "implementation of type-safe as cast")]
pub(crate) fn u64_to_usize(value: u64) -> usize {
    #[cfg(not(any(target_pointer_width = "64")))]
    compile_error!("converting file offsets to indices requires a 64-bit usize");
    value as usize
}
