//! Ergonomic wrapper over the ELF identification bytes.

use core::{fmt, mem};

use crate::{ParseError, check_bounds, raw, usize_to_u64};

/// Contains basic information about an ELF file that can be obtained in a class and encoding
/// independent manner.
#[derive(Clone, Copy, Hash, PartialEq, Eq)]
pub struct ElfIdent<'data>(&'data [u8]);

impl<'data> ElfIdent<'data> {
    /// The magic bytes that identify the start of an ELF file.
    pub const MAGIC_BYTES: [u8; 4] = [0x7F, b'E', b'L', b'F'];

    /// Creates a new [`ElfIdent`] over the given bytes.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the slice is not large enough to contain an
    /// [`ElfIdent`].
    pub fn new(data: &'data [u8]) -> Result<Self, ParseError> {
        check_bounds(data, 0, usize_to_u64(mem::size_of::<raw::ElfIdent>()))?;

        Ok(Self(data))
    }

    /// Validates that the magic bytes match the ELF specification.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::BadMagic`] if the magic bytes are not correct.
    pub fn validate_magic(&self) -> Result<(), ParseError> {
        let magic = self.magic();
        if magic != Self::MAGIC_BYTES {
            return Err(ParseError::BadMagic(magic));
        }

        Ok(())
    }

    /// Returns the magic bytes that identify this file as an ELF file.
    pub fn magic(&self) -> [u8; 4] {
        let offset = mem::offset_of!(raw::ElfIdent, magic);
        let mut arr = [0; 4];
        arr.copy_from_slice(&self.0[offset..offset + 4]);
        arr
    }

    /// Returns the [`Class`] of this ELF file.
    pub fn class(&self) -> Class {
        Class(self.0[mem::offset_of!(raw::ElfIdent, class)])
    }

    /// Returns the [`Encoding`] of this ELF file.
    pub fn encoding(&self) -> Encoding {
        Encoding(self.0[mem::offset_of!(raw::ElfIdent, encoding)])
    }

    /// Returns the version of the ELF file identifier.
    pub fn version(&self) -> u8 {
        self.0[mem::offset_of!(raw::ElfIdent, version)]
    }
}

impl fmt::Debug for ElfIdent<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ElfIdent")
            .field("magic", &self.magic())
            .field("class", &self.class())
            .field("encoding", &self.encoding())
            .field("version", &self.version())
            .finish()
    }
}

/// Specifier of the ELF file class, which determines the sizing
/// of various items in the ELF file format.
#[repr(transparent)]
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Class(pub u8);

impl Class {
    /// Invalid [`Class`] specifier.
    pub const NONE: Self = Self(0);
    /// ELF file is formatted in its 32-bit format.
    pub const CLASS32: Self = Self(1);
    /// ELF file is formatted in its 64-bit format.
    pub const CLASS64: Self = Self(2);
}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => f.pad("Invalid"),
            Self::CLASS32 => f.pad("Class32"),
            Self::CLASS64 => f.pad("Class64"),
            class => f.debug_tuple("Class").field(&class.0).finish(),
        }
    }
}

/// Specifier of the ELF file data encoding, which determines the encoding
/// of both the data structures used by the ELF file format and data contained
/// in the object file sections.
#[repr(transparent)]
#[derive(Clone, Copy, Hash, PartialEq, Eq, PartialOrd, Ord)]
pub struct Encoding(pub u8);

impl Encoding {
    /// Invalid [`Encoding`] specifier.
    pub const NONE: Self = Self(0);
    /// The encoding of the ELF file format uses little endian
    /// two's complement integers.
    pub const LSB2: Self = Self(1);
    /// The encoding of the ELF file format uses big endian
    /// two's complement integers.
    pub const MSB2: Self = Self(2);
}

impl fmt::Debug for Encoding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match *self {
            Self::NONE => f.pad("NoEncoding"),
            Self::LSB2 => f.pad("LittleEndian"),
            Self::MSB2 => f.pad("BigEndian"),
            encoding => f.debug_tuple("Encoding").field(&encoding.0).finish(),
        }
    }
}
