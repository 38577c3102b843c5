//! Generates AppImages from existing AppDirs by packing the directory into a squashfs image
//! appended to a prebuilt ELF runtime stub, then embedding packaging metadata (update
//! information, a tamper-evidence digest, and optionally a signature) into the stub's
//! reserved sections.

use anyhow::Result;

use crate::{
    action::{bundle::bundle, read_section::read_section},
    cli::Action,
};

pub mod action;
pub mod arch;
pub mod cli;
pub mod common;
pub mod digest;
pub mod locate;
pub mod patch;
pub mod runtime;
pub mod sign;
pub mod squashfs;
pub mod zsync;

#[cfg(test)]
pub(crate) mod testutil;

fn main() -> Result<()> {
    let action = cli::get_action();
    init_logging(action.verbose());

    match action {
        Action::Bundle(config) => {
            let path = bundle(config)?;
            println!("AppImage located at \"{}\"", path.display());
        }
        Action::ReadSection(config) => read_section(config)?,
    }

    Ok(())
}

/// Configures the global logger with the level selected on the command line.
fn init_logging(verbose: bool) {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::new()
        .filter_level(level)
        .format_timestamp(None)
        .init();
}
