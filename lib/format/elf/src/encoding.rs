//! Encoding aware reading.

use crate::{ParseError, check_bounds, ident, u64_to_usize, usize_to_u64};

/// The data encoding used to decode integers in an ELF file.
///
/// Field offsets are independent of the encoding, so a tagged variant selected once at parse
/// time is all that is required.
#[derive(Clone, Copy, Hash, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub enum DataEncoding {
    /// Integers are two's complement little-endian.
    Little,
    /// Integers are two's complement big-endian.
    Big,
}

impl DataEncoding {
    /// Returns the [`DataEncoding`] that corresponds with the given [`ident::Encoding`].
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::UnsupportedEncoding`] if the given [`ident::Encoding`] is not a
    /// recognized two's complement encoding.
    pub fn from_elf_encoding(encoding: ident::Encoding) -> Result<Self, ParseError> {
        match encoding {
            ident::Encoding::LSB2 => Ok(Self::Little),
            ident::Encoding::MSB2 => Ok(Self::Big),
            encoding => Err(ParseError::UnsupportedEncoding(encoding)),
        }
    }

    /// Reads the `u16` at `offset` bytes into `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the read would go out of bounds.
    pub fn read_u16(self, data: &[u8], offset: u64) -> Result<u16, ParseError> {
        read_array(data, offset).map(|arr| match self {
            Self::Little => u16::from_le_bytes(arr),
            Self::Big => u16::from_be_bytes(arr),
        })
    }

    /// Reads the `u32` at `offset` bytes into `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the read would go out of bounds.
    pub fn read_u32(self, data: &[u8], offset: u64) -> Result<u32, ParseError> {
        read_array(data, offset).map(|arr| match self {
            Self::Little => u32::from_le_bytes(arr),
            Self::Big => u32::from_be_bytes(arr),
        })
    }

    /// Reads the `u64` at `offset` bytes into `data`.
    ///
    /// # Errors
    ///
    /// Returns [`ParseError::Bounds`] if the read would go out of bounds.
    pub fn read_u64(self, data: &[u8], offset: u64) -> Result<u64, ParseError> {
        read_array(data, offset).map(|arr| match self {
            Self::Little => u64::from_le_bytes(arr),
            Self::Big => u64::from_be_bytes(arr),
        })
    }
}

/// Performs an exact-length read.
fn read_array<const N: usize>(data: &[u8], offset: u64) -> Result<[u8; N], ParseError> {
    check_bounds(data, offset, usize_to_u64(N))?;

    // The requested read region fits within a `usize`, since the bounds checking succeeded
    // and the upper bound is a `usize`.
    let mut arr = [0; N];
    arr.copy_from_slice(&data[u64_to_usize(offset)..][..N]);
    Ok(arr)
}
