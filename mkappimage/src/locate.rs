//! Locates named reserved sections inside the runtime stub.

use std::{error, fmt, fs::File, io, path::Path};

use elf::Elf;
use memmap2::Mmap;

/// Name of the reserved section holding the update descriptor.
pub const UPDATE_INFO_SECTION: &str = ".upd_info";
/// Name of the reserved section holding the 16-byte MD5 digest.
pub const DIGEST_SECTION: &str = ".digest_md5";
/// Name of the reserved section holding the detached signature.
pub const SIGNATURE_SECTION: &str = ".sha256_sig";
/// Name of the reserved section holding the signing key.
pub const SIGNING_KEY_SECTION: &str = ".sig_key";

/// A named, offset-addressed byte range in an ELF file.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct Section {
    /// The name of the section.
    pub name: String,
    /// The offset of the section's first byte from the start of the file.
    pub offset: u64,
    /// The length of the section in bytes.
    pub length: u64,
}

impl Section {
    /// Returns the offset one past the section's last byte.
    pub fn end(&self) -> u64 {
        self.offset.saturating_add(self.length)
    }
}

/// Returns the byte range of the first section named `name` in the ELF file at `path`, or
/// [`None`] if no section carries that name.
///
/// Each call maps the file read-only and releases the mapping before returning, so repeated
/// calls are independent.
///
/// # Errors
///
/// - [`LocateError::Io`]: Returned when the file cannot be opened or mapped.
/// - [`LocateError::Format`]: Returned when the file is not a supported ELF file.
pub fn locate(path: &Path, name: &str) -> Result<Option<Section>, LocateError> {
    let file = File::open(path)?;
    // SAFETY: the mapping is read-only and the artifact is exclusively owned by the running
    // packaging operation, so the underlying file does not change while mapped.
    let map = unsafe { Mmap::map(&file) }?;

    let elf = Elf::new(&map)?;
    let Some(header) = elf.section_by_name(name)? else {
        return Ok(None);
    };

    Ok(Some(Section {
        name: name.to_owned(),
        offset: header.offset()?,
        length: header.size()?,
    }))
}

/// Various errors that can occur when locating a section.
#[derive(Debug)]
pub enum LocateError {
    /// An error occurred while opening or mapping the file.
    Io(io::Error),
    /// The file is not a supported ELF file.
    Format(elf::ParseError),
}

impl From<io::Error> for LocateError {
    fn from(value: io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<elf::ParseError> for LocateError {
    fn from(value: elf::ParseError) -> Self {
        Self::Format(value)
    }
}

impl fmt::Display for LocateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(error) => write!(f, "error accessing ELF file: {error}"),
            Self::Format(error) => write!(f, "error reading ELF file: {error}"),
        }
    }
}

impl error::Error for LocateError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(error) => Some(error),
            Self::Format(error) => Some(error),
        }
    }
}

#[cfg(test)]
mod test {
    use std::io::Write;

    use super::{DIGEST_SECTION, LocateError, SIGNING_KEY_SECTION, UPDATE_INFO_SECTION, locate};
    use crate::testutil::{FixtureSection, build_stub, write_stub};

    #[test]
    fn locate_finds_reserved_sections() {
        let fixture = build_stub(&[
            FixtureSection::new(UPDATE_INFO_SECTION, 1024, 0),
            FixtureSection::new(DIGEST_SECTION, 16, 0),
        ]);
        let file = write_stub(&fixture.bytes);

        for expected in &fixture.sections {
            let section = locate(file.path(), &expected.name).unwrap().unwrap();
            assert_eq!(section.offset, expected.offset);
            assert_eq!(section.length, expected.length);
            assert_eq!(section.name, expected.name);
        }
    }

    #[test]
    fn locate_absent_section_is_none() {
        let fixture = build_stub(&[FixtureSection::new(UPDATE_INFO_SECTION, 64, 0)]);
        let file = write_stub(&fixture.bytes);

        assert!(locate(file.path(), SIGNING_KEY_SECTION).unwrap().is_none());
    }

    #[test]
    fn locate_rejects_non_elf_files() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not an ELF file").unwrap();

        assert!(matches!(
            locate(file.path(), DIGEST_SECTION).unwrap_err(),
            LocateError::Format(_)
        ));
    }

    #[test]
    fn locate_is_repeatable() {
        let fixture = build_stub(&[FixtureSection::new(DIGEST_SECTION, 16, 0)]);
        let file = write_stub(&fixture.bytes);

        let first = locate(file.path(), DIGEST_SECTION).unwrap().unwrap();
        let second = locate(file.path(), DIGEST_SECTION).unwrap().unwrap();
        assert_eq!(first, second);
    }
}
