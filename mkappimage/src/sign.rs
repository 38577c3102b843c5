//! Signing collaborator embedding a detached signature into the artifact.
//!
//! The signature and key material are produced by the external `gpg` tool; this module only
//! finds the reserved sections and embeds the results.

use std::{
    io::{self, Write},
    path::Path,
    process::{Command, Stdio},
};

use anyhow::{Context, Result, bail, ensure};
use log::info;

use crate::{
    digest::{digest_md5, stub_exclusions},
    locate::{SIGNATURE_SECTION, SIGNING_KEY_SECTION, locate},
    patch::{Padding, patch_section},
};

/// Configuration of the signing collaborator.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct SignConfig {
    /// The key identity to sign with; the signer's default key when [`None`].
    pub key: Option<String>,
}

/// Signs the artifact at `path`: the exclusion-aware digest is detach-signed and the armored
/// signature and public key are embedded into their reserved sections.
///
/// # Errors
///
/// Returns errors when a reserved section is missing or too small, the digest cannot be
/// computed, or the external signing tool fails.
pub fn sign_artifact(path: &Path, config: &SignConfig) -> Result<()> {
    info!("signing {}", path.display());

    let signature_section = locate(path, SIGNATURE_SECTION)?
        .filter(|section| section.length != 0)
        .with_context(|| format!("could not find section {SIGNATURE_SECTION} in runtime"))?;
    let key_section = locate(path, SIGNING_KEY_SECTION)?
        .filter(|section| section.length != 0)
        .with_context(|| format!("could not find section {SIGNING_KEY_SECTION} in runtime"))?;

    let exclusions = stub_exclusions(path)?;
    let digest = digest_md5(path, &exclusions)
        .with_context(|| format!("failed to calculate digest of {}", path.display()))?;
    let digest_hex = hex(&digest);

    let mut sign_args = vec!["--detach-sign", "--armor", "--output", "-"];
    if let Some(key) = &config.key {
        sign_args.extend(["--local-user", key]);
    }
    let signature = run_gpg(&sign_args, digest_hex.as_bytes())
        .context("failed to produce detached signature")?;
    patch_section(path, &signature_section, &signature, Padding::Zero)
        .context("failed to embed signature")?;

    let mut export_args = vec!["--export", "--armor"];
    if let Some(key) = &config.key {
        export_args.push(key);
    }
    let key_material = run_gpg(&export_args, &[]).context("failed to export signing key")?;
    ensure!(!key_material.is_empty(), "signing key export was empty");
    patch_section(path, &key_section, &key_material, Padding::Zero)
        .context("failed to embed signing key")?;

    Ok(())
}

/// Returns the lowercase hexadecimal rendition of `digest`.
fn hex(digest: &[u8; 16]) -> String {
    digest.iter().map(|byte| format!("{byte:02x}")).collect()
}

/// Runs the first available of `gpg2` and `gpg` with the given arguments, feeding it `input`
/// and returning its standard output.
fn run_gpg(args: &[&str], input: &[u8]) -> Result<Vec<u8>> {
    for program in ["gpg2", "gpg"] {
        match run_program(program, args, input) {
            Err(error) if error.kind() == io::ErrorKind::NotFound => continue,
            Err(error) => {
                return Err(error).with_context(|| format!("failed to run {program}"));
            }
            Ok(output) => return Ok(output),
        }
    }

    bail!("neither gpg2 nor gpg is available")
}

/// Runs `program` with the given arguments, feeding it `input` and returning its standard
/// output. A non-zero exit status is reported as an [`io::Error`].
fn run_program(program: &str, args: &[&str], input: &[u8]) -> io::Result<Vec<u8>> {
    let mut child = Command::new(program)
        .args(args)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .spawn()?;

    if let Some(mut stdin) = child.stdin.take() {
        stdin.write_all(input)?;
    }

    let output = child.wait_with_output()?;
    if !output.status.success() {
        return Err(io::Error::other(format!(
            "{program} exited with status {}",
            output.status
        )));
    }

    Ok(output.stdout)
}

#[cfg(test)]
mod test {
    use super::hex;

    #[test]
    fn hex_rendition() {
        assert_eq!(
            hex(&[
                0x00, 0x01, 0x0a, 0x10, 0xff, 0x7f, 0x80, 0x55, 0xaa, 0x00, 0x12, 0x34, 0x56,
                0x78, 0x9a, 0xbc
            ]),
            "00010a10ff7f8055aa00123456789abc"
        );
    }
}
