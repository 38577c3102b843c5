//! Helper functions to assemble an AppImage given a [`BundleConfig`].

use std::{
    fs::{self, OpenOptions},
    io::{Seek, SeekFrom, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, ensure};
use log::{debug, info, warn};

use crate::{
    arch::{self, ArchProbe},
    cli::bundle::BundleConfig,
    common::Arch,
    digest::{digest_md5, stub_exclusions},
    locate::{DIGEST_SECTION, UPDATE_INFO_SECTION, locate},
    patch::{Padding, patch_section},
    runtime::RuntimeSource,
    sign::{SignConfig, sign_artifact},
    squashfs::{self, SquashfsConfig},
    zsync,
};

/// The scheme prefixes an update descriptor may start with.
const UPDATE_SCHEMES: [&str; 3] = ["zsync|", "gh-releases-zsync|", "pling-v1-zsync|"];

/// The exact number of digest bytes embedded into the digest section.
const DIGEST_LENGTH: u64 = 16;

/// Assembles an AppImage as specified by `config`, returning the path of the final artifact
/// on success.
///
/// The stages run strictly in sequence and any failure aborts the run; a half-completed
/// artifact is never reported as success.
///
/// # Errors
///
/// Returns errors when a stage or one of its external collaborators fails.
pub fn bundle(config: BundleConfig) -> Result<PathBuf> {
    let source = config
        .source
        .canonicalize()
        .with_context(|| format!("no such AppDir: {}", config.source.display()))?;
    ensure!(source.is_dir(), "{} is not a directory", source.display());

    if let Some(info) = &config.update_information {
        validate_update_information(info)?;
    }

    let arch = detect_arch(config.arch.as_deref(), &source)?;
    info!("using architecture {}", arch.as_str());

    let destination = match config.destination {
        Some(destination) => destination,
        None => default_destination(&source, arch)?,
    };
    info!(
        "packaging {} as {}",
        source.display(),
        destination.display()
    );

    let runtime_source = match &config.runtime_file {
        Some(path) => RuntimeSource::File(path.clone()),
        None => RuntimeSource::Download(arch),
    };
    let runtime = runtime_source
        .acquire()
        .context("failed to acquire the runtime stub")?;
    debug!("size of the embedded runtime: {} bytes", runtime.len());

    let squashfs_config = SquashfsConfig {
        compression: config.compression,
        exclude_file: config.exclude_file.clone(),
        extra_args: config.mksquashfs_args.clone(),
    };
    squashfs::build_image(&source, &destination, runtime.len() as u64, &squashfs_config)
        .with_context(|| format!("failed to build image for {}", destination.display()))?;
    write_runtime_prefix(&destination, &runtime)?;
    make_executable(&destination)?;

    if let Some(info) = &config.update_information {
        embed_update_information(&destination, info)?;
    }

    embed_digest(&destination)?;

    if config.sign {
        sign_artifact(
            &destination,
            &SignConfig {
                key: config.sign_key.clone(),
            },
        )
        .with_context(|| format!("failed to sign {}", destination.display()))?;
    }

    if config.update_information.is_some() {
        zsync::generate_zsync(&destination)?;
    }

    Ok(destination)
}

/// Validates that an update descriptor starts with a recognized scheme prefix.
///
/// # Errors
///
/// Returns an error naming the recognized schemes otherwise.
fn validate_update_information(info: &str) -> Result<()> {
    ensure!(
        UPDATE_SCHEMES
            .iter()
            .any(|scheme| info.starts_with(scheme)),
        "the provided update information is not in a recognized format \
        (expected one of: {})",
        UPDATE_SCHEMES.join(" ")
    );

    Ok(())
}

/// Determines the target architecture from an explicit hint or by probing the AppDir.
fn detect_arch(hint: Option<&str>, source: &Path) -> Result<Arch> {
    let mut probe = ArchProbe::new();

    if let Some(text) = hint {
        match arch::arch_from_text(text) {
            Some(arch) => probe.record(arch),
            None => warn!("unrecognized architecture hint {text:?}"),
        }
    }

    if probe.resolve().is_err() {
        probe
            .probe_directory(source)
            .with_context(|| format!("failed to scan {}", source.display()))?;
    }

    let arch = probe.resolve().with_context(|| {
        format!(
            "unable to determine the architecture of {}; \
            pass --arch or set the ARCH environment variable",
            source.display()
        )
    })?;

    Ok(arch)
}

/// Derives the destination file name `<AppDir name>-<arch>.AppImage`, with spaces squashed
/// to underscores.
fn default_destination(source: &Path, arch: Arch) -> Result<PathBuf> {
    let name = source
        .file_name()
        .with_context(|| format!("source directory {} has no name", source.display()))?
        .to_string_lossy()
        .replace(' ', "_");

    Ok(PathBuf::from(format!("{name}-{}.AppImage", arch.as_str())))
}

/// Writes the runtime stub bytes over the artifact's prefix so `[0, len)` is exactly the
/// stub.
fn write_runtime_prefix(destination: &Path, runtime: &[u8]) -> Result<()> {
    info!("embedding runtime stub");

    let mut file = OpenOptions::new()
        .write(true)
        .open(destination)
        .with_context(|| format!("unable to open {} for writing", destination.display()))?;
    file.seek(SeekFrom::Start(0))?;
    file.write_all(runtime)
        .with_context(|| format!("failed to write runtime into {}", destination.display()))?;

    Ok(())
}

/// Marks the artifact as executable.
fn make_executable(destination: &Path) -> Result<()> {
    use std::os::unix::fs::PermissionsExt;

    fs::set_permissions(destination, fs::Permissions::from_mode(0o755))
        .with_context(|| format!("could not set executable bit on {}", destination.display()))
}

/// Embeds the update descriptor into the artifact's reserved section.
fn embed_update_information(destination: &Path, info: &str) -> Result<()> {
    info!("embedding update information");

    let section = locate(destination, UPDATE_INFO_SECTION)?
        .filter(|section| section.offset != 0 && section.length != 0)
        .with_context(|| format!("could not find section {UPDATE_INFO_SECTION} in runtime"))?;
    debug!(
        "update information section at {}, {} bytes",
        section.offset, section.length
    );

    patch_section(destination, &section, info.as_bytes(), Padding::None)
        .context("failed to embed update information")?;

    Ok(())
}

/// Computes the exclusion-aware digest of the artifact and embeds it into the digest
/// section.
fn embed_digest(destination: &Path) -> Result<()> {
    info!("embedding MD5 digest");

    let section = locate(destination, DIGEST_SECTION)?
        .filter(|section| section.offset != 0 && section.length != 0)
        .with_context(|| format!("could not find section {DIGEST_SECTION} in runtime"))?;
    ensure!(
        section.length >= DIGEST_LENGTH,
        "{DIGEST_SECTION} section in runtime is too small \
        (found {} bytes, minimum required: {DIGEST_LENGTH} bytes)",
        section.length
    );

    let exclusions = stub_exclusions(destination)?;
    let digest = digest_md5(destination, &exclusions)
        .with_context(|| format!("failed to calculate digest of {}", destination.display()))?;

    patch_section(destination, &section, &digest, Padding::None)
        .context("failed to embed MD5 digest")?;

    Ok(())
}

#[cfg(test)]
mod test {
    use std::path::Path;

    use super::{default_destination, validate_update_information};
    use crate::common::Arch;

    #[test]
    fn recognized_update_schemes_are_accepted() {
        validate_update_information("zsync|https://example.com/App.AppImage.zsync").unwrap();
        validate_update_information(
            "gh-releases-zsync|owner|repo|latest|App-*-x86_64.AppImage.zsync",
        )
        .unwrap();
        validate_update_information("pling-v1-zsync|product-id").unwrap();
    }

    #[test]
    fn unrecognized_update_schemes_are_rejected() {
        assert!(validate_update_information("https://example.com/App.AppImage").is_err());
        assert!(validate_update_information("zsync-http|unknown").is_err());
        assert!(validate_update_information("").is_err());
        // The scheme must be a prefix, not merely present.
        assert!(validate_update_information("x zsync|").is_err());
    }

    #[test]
    fn destination_is_derived_from_appdir_name_and_arch() {
        let destination =
            default_destination(Path::new("/builds/Cool App.AppDir"), Arch::X86_64).unwrap();
        assert_eq!(
            destination,
            Path::new("Cool_App.AppDir-x86_64.AppImage")
        );

        let destination = default_destination(Path::new("/builds/demo"), Arch::Armhf).unwrap();
        assert_eq!(destination, Path::new("demo-armhf.AppImage"));
    }
}
