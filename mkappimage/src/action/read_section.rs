//! Helper functions to print a named section given a [`ReadSectionConfig`].

use std::{
    fs::File,
    io::{self, Read, Seek, SeekFrom, Write},
};

use anyhow::{Context, Result};

use crate::{cli::read_section::ReadSectionConfig, locate::locate};

/// Locates the named section in the configured file and prints its contents to standard
/// output, either hex-encoded or raw up to the first NUL byte.
///
/// # Errors
///
/// Returns errors when the section does not exist or the file cannot be read.
pub fn read_section(config: ReadSectionConfig) -> Result<()> {
    let section = locate(&config.file, &config.name)?.with_context(|| {
        format!(
            "could not find section {} in {}",
            config.name,
            config.file.display()
        )
    })?;

    let mut file = File::open(&config.file)
        .with_context(|| format!("unable to open {}", config.file.display()))?;
    file.seek(SeekFrom::Start(section.offset))?;
    let mut data = vec![0; usize::try_from(section.length).context("section too large")?];
    file.read_exact(&mut data)
        .with_context(|| format!("failed to read section {}", config.name))?;

    let mut stdout = io::stdout().lock();
    if config.hex {
        for byte in &data {
            write!(stdout, "{byte:02x}")?;
        }
    } else {
        // Reserved sections hold NUL-padded strings; print up to the first NUL.
        let text = match data.iter().position(|&byte| byte == 0) {
            Some(end) => &data[..end],
            None => &data[..],
        };
        stdout.write_all(text)?;
    }
    writeln!(stdout)?;

    Ok(())
}
