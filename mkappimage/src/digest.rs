//! Streaming digest of an artifact with reserved sections treated as zero.

use std::{fs::File, io, io::Read, path::Path};

use md5::{Digest, Md5};

use crate::locate::{self, LocateError, Section};

/// The number of bytes read and hashed per iteration.
const CHUNK_SIZE: usize = 4096;

/// Computes the MD5 digest of the file at `path`, with the byte range of every [`Section`] in
/// `exclusions` treated as zero-filled.
///
/// Excluded ranges are zeroed, not omitted: the number of hashed bytes always equals the file
/// size. The file is streamed in fixed-size chunks; each exclusion interval is clipped to the
/// current chunk, so intervals may appear in any order, overlap chunk boundaries, or share a
/// chunk. Zero-length sections (including the `(0, 0)` not-found sentinel) contribute nothing.
///
/// # Errors
///
/// Returns [`io::Error`] if the file cannot be opened or read.
pub fn digest_md5(path: &Path, exclusions: &[Section]) -> io::Result<[u8; 16]> {
    let mut file = File::open(path)?;
    let mut hasher = Md5::new();
    let mut buffer = [0; CHUNK_SIZE];
    let mut position: u64 = 0;

    loop {
        let read = file.read(&mut buffer)?;
        if read == 0 {
            break;
        }

        let chunk = &mut buffer[..read];
        let chunk_end = position + read as u64;

        for section in exclusions {
            if section.length == 0 {
                continue;
            }

            let start = section.offset.max(position);
            let end = section.end().min(chunk_end);
            if start < end {
                chunk[(start - position) as usize..(end - position) as usize].fill(0);
            }
        }

        hasher.update(&chunk);
        position = chunk_end;
    }

    Ok(hasher.finalize().into())
}

/// Returns the digest exclusion set of the runtime stub at `path`: the digest, signature, and
/// signing key sections, in that order.
///
/// A missing section contributes no exclusion and is not an error.
///
/// # Errors
///
/// Returns [`LocateError`] if the stub cannot be read as an ELF file.
pub fn stub_exclusions(path: &Path) -> Result<Vec<Section>, LocateError> {
    let mut exclusions = Vec::new();
    for name in [
        locate::DIGEST_SECTION,
        locate::SIGNATURE_SECTION,
        locate::SIGNING_KEY_SECTION,
    ] {
        if let Some(section) = locate::locate(path, name)? {
            exclusions.push(section);
        }
    }

    Ok(exclusions)
}
