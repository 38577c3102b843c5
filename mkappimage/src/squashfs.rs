//! Invocation of the external squashfs image builder.

use std::{
    env,
    ffi::OsString,
    path::{Path, PathBuf},
    process::Command,
};

use anyhow::{Context, Result, ensure};

use crate::{action::run_cmd, common::Compression};

/// Exclude patterns in this file are passed to `mksquashfs` whenever it is present in the
/// working directory.
pub const IGNORE_FILE: &str = ".appimageignore";

/// Configuration of the squashfs image builder.
#[derive(Clone, Debug, Default, Hash, PartialEq, Eq)]
pub struct SquashfsConfig {
    /// The [`Compression`] the image is built with.
    pub compression: Compression,
    /// An additional exclude file passed through to `mksquashfs`.
    pub exclude_file: Option<PathBuf>,
    /// Arguments passed through to `mksquashfs` verbatim, after all generated arguments.
    pub extra_args: Vec<String>,
}

/// Builds a squashfs image of `source` into `destination`, starting at byte `offset` so the
/// runtime stub can be written into the artifact's prefix afterwards.
///
/// # Errors
///
/// Returns errors when the configured exclude file is missing or `mksquashfs` fails.
pub fn build_image(
    source: &Path,
    destination: &Path,
    offset: u64,
    config: &SquashfsConfig,
) -> Result<()> {
    if let Some(exclude_file) = &config.exclude_file {
        ensure!(
            exclude_file.is_file(),
            "exclude file {} not found",
            exclude_file.display()
        );
    }

    let fixed_timestamp = env::var_os("SOURCE_DATE_EPOCH").is_none();

    let mut cmd = Command::new("mksquashfs");
    cmd.args(command_args(source, destination, offset, config, fixed_timestamp));
    run_cmd(cmd).context("mksquashfs failed")?;

    Ok(())
}

/// Returns the full `mksquashfs` argument vector for the given build.
///
/// With `fixed_timestamp`, the image timestamp is pinned to zero; callers disable this when
/// `SOURCE_DATE_EPOCH` already pins it.
fn command_args(
    source: &Path,
    destination: &Path,
    offset: u64,
    config: &SquashfsConfig,
    fixed_timestamp: bool,
) -> Vec<OsString> {
    let mut args: Vec<OsString> = vec![
        source.into(),
        destination.into(),
        "-offset".into(),
        offset.to_string().into(),
        "-comp".into(),
        config.compression.as_str().into(),
        "-root-owned".into(),
        "-noappend".into(),
    ];

    match config.compression {
        // 16K blocks with a full dictionary compress better at a small size cost.
        Compression::Xz => {
            args.extend(["-Xdict-size", "100%", "-b", "16384"].map(OsString::from));
        }
        // 128K blocks keep application startup fast.
        Compression::Zstd => args.extend(["-b", "128K"].map(OsString::from)),
        Compression::Gzip => {}
    }

    if Path::new(IGNORE_FILE).is_file() {
        args.extend(["-wildcards", "-ef", IGNORE_FILE].map(OsString::from));
    }

    if let Some(exclude_file) = &config.exclude_file {
        args.extend(["-wildcards", "-ef"].map(OsString::from));
        args.push(exclude_file.into());
    }

    if fixed_timestamp {
        args.extend(["-mkfs-time", "0"].map(OsString::from));
    }

    args.extend(config.extra_args.iter().map(OsString::from));

    args
}

#[cfg(test)]
mod test {
    use std::{ffi::OsString, path::Path};

    use super::{SquashfsConfig, command_args};
    use crate::common::Compression;

    fn strings(args: &[OsString]) -> Vec<String> {
        args.iter()
            .map(|arg| arg.to_string_lossy().into_owned())
            .collect()
    }

    #[test]
    fn zstd_arguments() {
        let config = SquashfsConfig::default();
        let args = strings(&command_args(
            Path::new("AppDir"),
            Path::new("App.AppImage"),
            1234,
            &config,
            true,
        ));

        assert_eq!(
            args[..8],
            [
                "AppDir",
                "App.AppImage",
                "-offset",
                "1234",
                "-comp",
                "zstd",
                "-root-owned",
                "-noappend"
            ]
        );
        assert!(args.windows(2).any(|pair| pair == ["-b", "128K"]));
        assert!(args.windows(2).any(|pair| pair == ["-mkfs-time", "0"]));
    }

    #[test]
    fn xz_arguments_tune_dictionary_and_block_size() {
        let config = SquashfsConfig {
            compression: Compression::Xz,
            ..SquashfsConfig::default()
        };
        let args = strings(&command_args(
            Path::new("AppDir"),
            Path::new("App.AppImage"),
            0,
            &config,
            false,
        ));

        assert!(args.windows(2).any(|pair| pair == ["-Xdict-size", "100%"]));
        assert!(args.windows(2).any(|pair| pair == ["-b", "16384"]));
        assert!(!args.iter().any(|arg| arg == "-mkfs-time"));
    }

    #[test]
    fn exclude_file_and_passthrough_arguments_come_last() {
        let config = SquashfsConfig {
            exclude_file: Some("excludes.txt".into()),
            extra_args: vec![String::from("-no-progress")],
            ..SquashfsConfig::default()
        };
        let args = strings(&command_args(
            Path::new("AppDir"),
            Path::new("App.AppImage"),
            0,
            &config,
            true,
        ));

        assert!(
            args.windows(3)
                .any(|triple| triple == ["-wildcards", "-ef", "excludes.txt"])
        );
        assert_eq!(args.last().unwrap(), "-no-progress");
    }
}
