//! Command line parsing and [`Action::ReadSection`][ars] construction.
//!
//! [ars]: crate::cli::Action::ReadSection

use std::path::PathBuf;

use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};

/// Description of which section of which file should be printed.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub struct ReadSectionConfig {
    /// The ELF file to inspect.
    pub file: PathBuf,
    /// The name of the section to print.
    pub name: String,
    /// Whether the section bytes should be hex-encoded instead of printed raw.
    pub hex: bool,
    /// Whether verbose output was requested.
    pub verbose: bool,
}

/// Parses the arguments required to produce a valid [`ReadSectionConfig`].
pub fn parse_arguments(matches: &ArgMatches) -> ReadSectionConfig {
    let file = matches
        .get_one::<PathBuf>("file")
        .cloned()
        .unwrap_or_else(|| unreachable!("`file` is a required argument"));

    let name = matches
        .get_one::<String>("name")
        .cloned()
        .unwrap_or_else(|| unreachable!("`name` is a required argument"));

    ReadSectionConfig {
        file,
        name,
        hex: matches.get_flag("hex"),
        verbose: matches.get_flag("verbose"),
    }
}

/// Returns the command parser for an [`Action::ReadSection`][ars].
///
/// [ars]: crate::cli::Action::ReadSection
pub fn subcommand_parser() -> Command {
    let file = Arg::new("file")
        .value_name("FILE")
        .help("ELF file to inspect")
        .value_parser(value_parser!(PathBuf))
        .required(true);

    let name = Arg::new("name")
        .value_name("NAME")
        .help("Name of the section to print, e.g. .upd_info")
        .required(true);

    let hex = Arg::new("hex")
        .long("hex")
        .action(ArgAction::SetTrue)
        .help("Print the section bytes hex-encoded");

    let verbose = Arg::new("verbose")
        .long("verbose")
        .short('v')
        .action(ArgAction::SetTrue)
        .help("Produce verbose output");

    Command::new("read-section")
        .about("Prints a named ELF section")
        .arg(file)
        .arg(name)
        .arg(hex)
        .arg(verbose)
}

#[cfg(test)]
mod test {
    use std::path::PathBuf;

    use super::{parse_arguments, subcommand_parser};

    #[test]
    fn invocation_is_parsed() {
        let matches = subcommand_parser()
            .try_get_matches_from(["read-section", "App.AppImage", ".upd_info", "--hex"])
            .unwrap();
        let config = parse_arguments(&matches);

        assert_eq!(config.file, PathBuf::from("App.AppImage"));
        assert_eq!(config.name, ".upd_info");
        assert!(config.hex);
        assert!(!config.verbose);
    }
}
