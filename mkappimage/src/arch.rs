//! Architecture inference from ELF machine fields and textual hints.

use std::{
    error, fmt,
    fs::{self, File},
    io::{self, Read, Seek, SeekFrom},
    path::Path,
};

use elf::Machine;
use log::debug;

use crate::common::Arch;

/// The absolute file offset of the `e_machine` field, shared by the 32-bit and 64-bit ELF
/// header layouts.
const MACHINE_FIELD_OFFSET: u64 = 0x12;

/// Reads the raw machine field of the file at `path`.
///
/// The field is read little-endian regardless of the file's declared data encoding, and no
/// other part of the file is inspected.
///
/// # Errors
///
/// Returns [`io::Error`] if the file cannot be opened or is shorter than the machine field.
pub fn read_machine_field(path: &Path) -> io::Result<Machine> {
    let mut file = File::open(path)?;
    file.seek(SeekFrom::Start(MACHINE_FIELD_OFFSET))?;

    let mut raw = [0; 2];
    file.read_exact(&mut raw)?;

    Ok(Machine(u16::from_le_bytes(raw)))
}

/// Returns the [`Arch`] tag that corresponds with the given [`Machine`], or [`None`] for an
/// unrecognized machine value.
pub fn arch_from_machine(machine: Machine) -> Option<Arch> {
    match machine {
        Machine::INTEL_386 => Some(Arch::X86),
        Machine::X86_64 => Some(Arch::X86_64),
        Machine::ARM => Some(Arch::Armhf),
        Machine::AARCH64 => Some(Arch::Aarch64),
        _ => None,
    }
}

/// Returns the [`Arch`] tag named by a free-form textual hint, or [`None`] if the hint names
/// no recognized architecture.
///
/// Hints are trimmed, lowercased, and have `-` and spaces squashed to `_` before matching.
pub fn arch_from_text(text: &str) -> Option<Arch> {
    let normalized = text.trim().replace(['-', ' '], "_").to_ascii_lowercase();

    match normalized.as_str() {
        "i386" | "i486" | "i586" | "i686" | "intel_80386" | "intel_80486" | "intel_80586"
        | "intel_80686" => Some(Arch::X86),
        "x86_64" => Some(Arch::X86_64),
        "arm" | "armhf" => Some(Arch::Armhf),
        "arm_aarch64" | "aarch64" => Some(Arch::Aarch64),
        _ => None,
    }
}

/// Aggregates [`Arch`] tags observed across several candidate files and hints.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub struct ArchProbe {
    /// One flag per entry of [`Arch::ALL`].
    seen: [bool; 4],
}

impl ArchProbe {
    /// Creates an [`ArchProbe`] with no recorded tags.
    pub fn new() -> Self {
        Self::default()
    }

    /// Records one observation of `arch`.
    pub fn record(&mut self, arch: Arch) {
        for (flag, candidate) in self.seen.iter_mut().zip(Arch::ALL) {
            if candidate == arch {
                *flag = true;
            }
        }
    }

    /// Resolves the probe to the single observed [`Arch`].
    ///
    /// # Errors
    ///
    /// - [`ArchError::Unknown`]: Returned when no tag was recorded.
    /// - [`ArchError::Ambiguous`]: Returned when more than one distinct tag was recorded.
    pub fn resolve(&self) -> Result<Arch, ArchError> {
        let mut resolved = None;
        let mut count = 0;
        for (flag, candidate) in self.seen.iter().zip(Arch::ALL) {
            if *flag {
                resolved = Some(candidate);
                count += 1;
            }
        }

        match (resolved, count) {
            (Some(arch), 1) => Ok(arch),
            (None, _) => Err(ArchError::Unknown),
            (Some(_), count) => Err(ArchError::Ambiguous { count }),
        }
    }

    /// Records the architectures of every candidate file below `directory`.
    ///
    /// Candidates are non-symlink regular files that are either executable or named like a
    /// versioned shared object (`*.so.*`). Files whose machine field cannot be read or names
    /// an unrecognized architecture record nothing.
    ///
    /// # Errors
    ///
    /// Returns [`io::Error`] if a directory below `directory` cannot be listed.
    pub fn probe_directory(&mut self, directory: &Path) -> io::Result<()> {
        for entry in fs::read_dir(directory)? {
            let entry = entry?;
            let file_type = entry.file_type()?;
            if file_type.is_symlink() {
                continue;
            }

            let path = entry.path();
            if file_type.is_dir() {
                self.probe_directory(&path)?;
                continue;
            }

            if !is_executable(&entry)? && !is_versioned_shared_object(&path) {
                continue;
            }

            let Ok(machine) = read_machine_field(&path) else {
                continue;
            };
            if let Some(arch) = arch_from_machine(machine) {
                debug!(
                    "{} used for determining architecture {}",
                    path.display(),
                    arch.as_str()
                );
                self.record(arch);
            }
        }

        Ok(())
    }
}

/// Returns `true` if the directory entry has any execute permission bit set.
fn is_executable(entry: &fs::DirEntry) -> io::Result<bool> {
    use std::os::unix::fs::PermissionsExt;

    Ok(entry.metadata()?.permissions().mode() & 0o111 != 0)
}

/// Returns `true` if the file name looks like a versioned shared object (`*.so.*`).
fn is_versioned_shared_object(path: &Path) -> bool {
    path.file_name()
        .and_then(|name| name.to_str())
        .is_some_and(|name| name.contains(".so."))
}

/// Various errors that can occur when resolving an [`ArchProbe`].
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum ArchError {
    /// No architecture tag was recorded.
    Unknown,
    /// More than one distinct architecture tag was recorded.
    Ambiguous {
        /// The number of distinct tags recorded.
        count: usize,
    },
}

impl fmt::Display for ArchError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unknown => write!(f, "unable to determine an architecture"),
            Self::Ambiguous { count } => {
                write!(f, "{count} distinct architectures were found")
            }
        }
    }
}

impl error::Error for ArchError {}

#[cfg(test)]
mod test {
    use std::{fs, io::Write, os::unix::fs::PermissionsExt};

    use elf::Machine;

    use super::{ArchError, ArchProbe, arch_from_machine, arch_from_text, read_machine_field};
    use crate::common::Arch;

    #[test]
    fn machine_mapping() {
        assert_eq!(arch_from_machine(Machine(3)), Some(Arch::X86));
        assert_eq!(arch_from_machine(Machine(62)), Some(Arch::X86_64));
        assert_eq!(arch_from_machine(Machine(40)), Some(Arch::Armhf));
        assert_eq!(arch_from_machine(Machine(183)), Some(Arch::Aarch64));
        assert_eq!(arch_from_machine(Machine(8)), None);
    }

    #[test]
    fn machine_field_is_read_little_endian_at_fixed_offset() {
        let mut bytes = vec![0u8; 0x20];
        bytes[0x12] = 62;

        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&bytes).unwrap();

        let machine = read_machine_field(file.path()).unwrap();
        assert_eq!(machine, Machine::X86_64);
        assert_eq!(arch_from_machine(machine), Some(Arch::X86_64));
    }

    #[test]
    fn short_file_is_an_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&[0u8; 4]).unwrap();

        assert!(read_machine_field(file.path()).is_err());
    }

    #[test]
    fn textual_hints() {
        assert_eq!(arch_from_text("x86_64"), Some(Arch::X86_64));
        assert_eq!(arch_from_text("x86-64"), Some(Arch::X86_64));
        assert_eq!(arch_from_text(" i586 "), Some(Arch::X86));
        assert_eq!(arch_from_text("Intel 80686"), Some(Arch::X86));
        assert_eq!(arch_from_text("AARCH64"), Some(Arch::Aarch64));
        assert_eq!(arch_from_text("arm"), Some(Arch::Armhf));
        assert_eq!(arch_from_text("riscv64"), None);
    }

    #[test]
    fn probe_requires_exactly_one_tag() {
        let mut probe = ArchProbe::new();
        assert_eq!(probe.resolve(), Err(ArchError::Unknown));

        probe.record(Arch::X86_64);
        probe.record(Arch::X86_64);
        assert_eq!(probe.resolve(), Ok(Arch::X86_64));

        probe.record(Arch::Armhf);
        assert_eq!(probe.resolve(), Err(ArchError::Ambiguous { count: 2 }));
    }

    #[test]
    fn probe_directory_picks_up_shared_objects() {
        let dir = tempfile::tempdir().unwrap();
        let nested = dir.path().join("usr/lib");
        fs::create_dir_all(&nested).unwrap();

        let mut bytes = vec![0u8; 0x20];
        bytes[0x12] = 183;
        fs::write(nested.join("libc.so.6"), &bytes).unwrap();

        // Non-executable files without a shared object name are ignored.
        fs::write(nested.join("readme.txt"), b"not an ELF file").unwrap();
        let plain = fs::metadata(nested.join("readme.txt")).unwrap().permissions();
        assert_eq!(plain.mode() & 0o111, 0);

        let mut probe = ArchProbe::new();
        probe.probe_directory(dir.path()).unwrap();
        assert_eq!(probe.resolve(), Ok(Arch::Aarch64));
    }
}
