//! Delta-update metadata collaborator.

use std::{path::Path, process::Command};

use anyhow::{Context, Result};
use log::info;

use crate::action::run_cmd;

/// Generates the `.zsync` control file for the artifact at `path` by running `zsyncmake` in
/// the artifact's directory.
///
/// The advertised download URL is the artifact's bare file name, matching the relative-URL
/// convention of published release artifacts.
///
/// # Errors
///
/// Returns errors when the artifact path has no file name or `zsyncmake` fails.
pub fn generate_zsync(path: &Path) -> Result<()> {
    let file_name = path
        .file_name()
        .with_context(|| format!("artifact path {} has no file name", path.display()))?;
    let directory = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    info!("generating zsync file for {}", path.display());

    let mut cmd = Command::new("zsyncmake");
    cmd.arg("-u").arg(file_name).arg(file_name);
    cmd.current_dir(directory);
    run_cmd(cmd).context("zsyncmake failed")?;

    Ok(())
}
