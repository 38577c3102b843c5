//! Command line parsing and [`Action::Bundle`][ab] construction.
//!
//! [ab]: crate::cli::Action::Bundle

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, builder::EnumValueParser, value_parser};

use crate::common::Compression;

/// Description of various parameters of one AppImage assembly run.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct BundleConfig {
    /// The AppDir to package.
    pub source: PathBuf,
    /// The location at which the artifact should be placed; derived from the AppDir name and
    /// architecture when absent.
    pub destination: Option<PathBuf>,
    /// A textual architecture hint; the AppDir is probed when absent.
    pub arch: Option<String>,
    /// The update descriptor to embed, if any.
    pub update_information: Option<String>,
    /// A local runtime stub to use instead of downloading one.
    pub runtime_file: Option<PathBuf>,
    /// The [`Compression`] the filesystem image is built with.
    pub compression: Compression,
    /// An additional exclude file passed through to the image builder.
    pub exclude_file: Option<PathBuf>,
    /// Arguments passed through to the image builder verbatim.
    pub mksquashfs_args: Vec<String>,
    /// Whether the artifact should be signed.
    pub sign: bool,
    /// The key identity to sign with.
    pub sign_key: Option<String>,
    /// Whether verbose output was requested.
    pub verbose: bool,
}

/// Parses the arguments required to produce a valid [`BundleConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> BundleConfig {
    let source = matches
        .get_one::<PathBuf>("source")
        .cloned()
        .unwrap_or_else(|| unreachable!("`source` is a required argument"));

    let compression = matches
        .get_one::<Compression>("comp")
        .copied()
        .unwrap_or_else(|| unreachable!("`comp` should have a default value"));

    let mksquashfs_args = matches
        .get_many::<String>("mksquashfs-opt")
        .map(|values| values.cloned().collect())
        .unwrap_or_default();

    BundleConfig {
        source,
        destination: matches.get_one::<PathBuf>("destination").cloned(),
        arch: matches.get_one::<String>("arch").cloned(),
        update_information: matches.get_one::<String>("updateinformation").cloned(),
        runtime_file: matches.get_one::<PathBuf>("runtime-file").cloned(),
        compression,
        exclude_file: matches.get_one::<PathBuf>("exclude-file").cloned(),
        mksquashfs_args,
        sign: matches.get_flag("sign"),
        sign_key: matches.get_one::<String>("sign-key").cloned(),
        verbose: matches.get_flag("verbose"),
    }
}

/// Returns the command parser for an [`Action::Bundle`][ab].
///
/// [ab]: crate::cli::Action::Bundle
pub fn subcommand_parser() -> Command {
    let source = Arg::new("source")
        .value_name("SOURCE")
        .help("AppDir to package")
        .value_parser(value_parser!(PathBuf))
        .required(true);

    let destination = Arg::new("destination")
        .value_name("DESTINATION")
        .help("Path of the AppImage to produce")
        .value_parser(value_parser!(PathBuf));

    let arch = Arg::new("arch")
        .long("arch")
        .env("ARCH")
        .help("Target architecture, e.g. x86_64");

    let updateinformation = Arg::new("updateinformation")
        .long("updateinformation")
        .short('u')
        .help("Embed update information STRING and generate a zsync file");

    let runtime_file = Arg::new("runtime-file")
        .long("runtime-file")
        .value_parser(value_parser!(PathBuf))
        .help("Runtime file to use");

    let comp = Arg::new("comp")
        .long("comp")
        .value_parser(EnumValueParser::<Compression>::new())
        .default_value("zstd")
        .help("Squashfs compression");

    let exclude_file = Arg::new("exclude-file")
        .long("exclude-file")
        .value_parser(value_parser!(PathBuf))
        .help("Additional exclude file for the image builder");

    let mksquashfs_opt = Arg::new("mksquashfs-opt")
        .long("mksquashfs-opt")
        .action(ArgAction::Append)
        .allow_hyphen_values(true)
        .help("Argument to pass through to mksquashfs; can be specified multiple times");

    let sign = Arg::new("sign")
        .long("sign")
        .short('s')
        .action(ArgAction::SetTrue)
        .help("Sign with gpg[2]");

    let sign_key = Arg::new("sign-key")
        .long("sign-key")
        .help("Key ID to use for gpg[2] signatures");

    let verbose = Arg::new("verbose")
        .long("verbose")
        .short('v')
        .action(ArgAction::SetTrue)
        .help("Produce verbose output");

    Command::new("bundle")
        .about("Generates an AppImage from an existing AppDir")
        .arg(source)
        .arg(destination)
        .arg(arch)
        .arg(updateinformation)
        .arg(runtime_file)
        .arg(comp)
        .arg(exclude_file)
        .arg(mksquashfs_opt)
        .arg(sign)
        .arg(sign_key)
        .arg(verbose)
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::{parse_arguments, subcommand_parser};
    use crate::common::Compression;

    #[test]
    fn minimal_invocation_uses_defaults() {
        let matches = subcommand_parser()
            .try_get_matches_from(["bundle", "App.AppDir"])
            .unwrap();
        let config = parse_arguments(&matches);

        assert_eq!(config.source, PathBuf::from("App.AppDir"));
        assert_eq!(config.destination, None);
        assert_eq!(config.compression, Compression::Zstd);
        assert!(!config.sign);
        assert!(config.mksquashfs_args.is_empty());
    }

    #[test]
    fn full_invocation_is_parsed() {
        let matches = subcommand_parser()
            .try_get_matches_from([
                "bundle",
                "App.AppDir",
                "out/App.AppImage",
                "--arch",
                "x86_64",
                "-u",
                "zsync|https://example.com/App.AppImage.zsync",
                "--comp",
                "xz",
                "--mksquashfs-opt",
                "-no-progress",
                "--mksquashfs-opt",
                "-quiet",
                "--sign",
                "--sign-key",
                "ABCD1234",
                "-v",
            ])
            .unwrap();
        let config = parse_arguments(&matches);

        assert_eq!(config.destination, Some(PathBuf::from("out/App.AppImage")));
        assert_eq!(config.arch.as_deref(), Some("x86_64"));
        assert_eq!(
            config.update_information.as_deref(),
            Some("zsync|https://example.com/App.AppImage.zsync")
        );
        assert_eq!(config.compression, Compression::Xz);
        assert_eq!(config.mksquashfs_args, ["-no-progress", "-quiet"]);
        assert!(config.sign);
        assert_eq!(config.sign_key.as_deref(), Some("ABCD1234"));
        assert!(config.verbose);
    }
}
