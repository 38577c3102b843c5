//! Bounds-checked in-place writes into reserved sections.

use std::{
    error, fmt,
    fs::OpenOptions,
    io::{self, Read, Seek, SeekFrom, Write},
    path::Path,
};

use crate::locate::Section;

/// What to do with the bytes of a section beyond the written payload.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Padding {
    /// Leave the remaining bytes untouched.
    None,
    /// Zero-fill the remaining bytes up to the section's end.
    Zero,
}

/// Writes `payload` at `section`'s offset in the file at `path` without changing the file's
/// length.
///
/// The file is opened for reading and writing without truncation and the write position is
/// seeked absolutely. With [`Padding::None`], section bytes beyond the payload are left
/// untouched; with [`Padding::Zero`], they are zero-filled up to the section's end.
///
/// # Errors
///
/// - [`PatchError::PayloadTooLarge`]: Returned when the payload does not fit in the section.
/// - [`PatchError::Io`]: Returned when the file cannot be opened, seeked, or written.
pub fn patch_section(
    path: &Path,
    section: &Section,
    payload: &[u8],
    padding: Padding,
) -> Result<(), PatchError> {
    if payload.len() as u64 > section.length {
        return Err(PatchError::PayloadTooLarge {
            section: section.name.clone(),
            payload: payload.len(),
            capacity: section.length,
        });
    }

    let mut file = OpenOptions::new().read(true).write(true).open(path)?;
    file.seek(SeekFrom::Start(section.offset))?;
    file.write_all(payload)?;

    if padding == Padding::Zero {
        let remaining = section.length - payload.len() as u64;
        io::copy(&mut io::repeat(0).take(remaining), &mut file)?;
    }

    Ok(())
}

/// Various errors that can occur when patching a section.
#[derive(Debug)]
pub enum PatchError {
    /// The payload does not fit in the target section.
    PayloadTooLarge {
        /// The name of the target section.
        section: String,
        /// The size of the rejected payload in bytes.
        payload: usize,
        /// The size of the target section in bytes.
        capacity: u64,
    },
    /// An error occurred while opening, seeking, or writing the file.
    Io(io::Error),
}

impl From<io::Error> for PatchError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl fmt::Display for PatchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PayloadTooLarge {
                section,
                payload,
                capacity,
            } => write!(
                f,
                "payload of {payload} bytes does not fit into section {section} \
                of {capacity} bytes"
            ),
            Self::Io(error) => write!(f, "error writing section: {error}"),
        }
    }
}

impl error::Error for PatchError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::PayloadTooLarge { .. } => None,
            Self::Io(error) => Some(error),
        }
    }
}
