//! Command line parsing and [`Action`] construction.

use clap::Command;

use crate::cli::{bundle::BundleConfig, read_section::ReadSectionConfig};

pub mod bundle;
pub mod read_section;

/// The action to carry out.
#[derive(Clone, Debug, Hash, PartialEq, Eq)]
pub enum Action {
    /// Assemble an AppImage with a specific configuration.
    Bundle(BundleConfig),
    /// Print a named section of an ELF file.
    ReadSection(ReadSectionConfig),
}

impl Action {
    /// Returns whether verbose output was requested for this [`Action`].
    pub fn verbose(&self) -> bool {
        match self {
            Self::Bundle(config) => config.verbose,
            Self::ReadSection(config) => config.verbose,
        }
    }
}

/// Parses `mkappimage`'s arguments to construct an [`Action`].
pub fn get_action() -> Action {
    let matches = command_parser().get_matches();

    let Some((subcommand_name, subcommand_matches)) = matches.subcommand() else {
        unreachable!("subcommand is required");
    };
    match subcommand_name {
        "bundle" => Action::Bundle(bundle::parse_arguments(subcommand_matches)),
        "read-section" => Action::ReadSection(read_section::parse_arguments(subcommand_matches)),
        _ => unreachable!("unexpected subcommand: {subcommand_name:?}"),
    }
}

/// Returns the command parser for all [`Action`]s.
fn command_parser() -> Command {
    Command::new("mkappimage")
        .about("Generates AppImages from existing AppDirs")
        .subcommand(bundle::subcommand_parser())
        .subcommand(read_section::subcommand_parser())
        .subcommand_required(true)
        .arg_required_else_help(true)
}

#[cfg(test)]
mod test {
    use super::command_parser;

    #[test]
    fn parser_is_well_formed() {
        command_parser().debug_assert();
    }
}
