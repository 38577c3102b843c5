//! Acquisition of the prebuilt runtime stub.

use std::{fs, io::Read, path::PathBuf};

use anyhow::{Context, Result, ensure};
use log::{debug, info};

use crate::common::Arch;

/// Base URL of the runtime stub releases, keyed by architecture name.
const RUNTIME_URL_BASE: &str =
    "https://github.com/AppImage/type2-runtime/releases/download/continuous";

/// Where the runtime stub bytes are obtained from.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum RuntimeSource {
    /// Use the runtime stub located at the given [`PathBuf`].
    File(PathBuf),
    /// Download the published runtime stub for the given [`Arch`].
    Download(Arch),
}

impl RuntimeSource {
    /// Returns the runtime stub bytes.
    ///
    /// # Errors
    ///
    /// Returns errors when the local file cannot be read or the download fails or is
    /// truncated.
    pub fn acquire(&self) -> Result<Vec<u8>> {
        match self {
            Self::File(path) => fs::read(path)
                .with_context(|| format!("unable to load runtime file {}", path.display())),
            Self::Download(arch) => fetch_runtime(*arch),
        }
    }
}

/// Returns the release URL of the runtime stub for `arch`.
fn runtime_url(arch: Arch) -> String {
    format!("{RUNTIME_URL_BASE}/runtime-{}", arch.as_str())
}

/// Downloads the runtime stub for `arch` into memory.
fn fetch_runtime(arch: Arch) -> Result<Vec<u8>> {
    let url = runtime_url(arch);
    info!("downloading runtime from {url}");

    let response = ureq::get(&url)
        .call()
        .with_context(|| format!("failed to download runtime from {url}"))?;

    let declared = response
        .header("Content-Length")
        .and_then(|value| value.parse::<u64>().ok());
    if let Some(declared) = declared {
        debug!("downloading runtime binary of {declared} bytes");
    }

    let mut data = Vec::with_capacity(declared.unwrap_or(0) as usize);
    response
        .into_reader()
        .read_to_end(&mut data)
        .context("failed to read runtime download")?;

    if let Some(declared) = declared {
        ensure!(
            data.len() as u64 == declared,
            "runtime download truncated: received {} of {declared} bytes",
            data.len()
        );
    }

    Ok(data)
}
