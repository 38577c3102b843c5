//! Various items that are common between [`Action`][a] parsing and execution.
//!
//! [a]: crate::cli::Action

/// The architectures an AppImage can target.
#[derive(Clone, Copy, Debug, Hash, PartialEq, Eq)]
pub enum Arch {
    /// The 32-bit x86 architecture.
    X86,
    /// The x86_64 architecture.
    X86_64,
    /// The 32-bit ARM hard-float architecture.
    Armhf,
    /// The aarch64 architecture.
    Aarch64,
}

impl Arch {
    /// Every [`Arch`], in the order used for aggregation.
    pub const ALL: [Self; 4] = [Self::X86, Self::X86_64, Self::Armhf, Self::Aarch64];

    /// Returns the textual representation of the [`Arch`], as used in artifact file names and
    /// runtime release names.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::X86 => "i686",
            Self::X86_64 => "x86_64",
            Self::Armhf => "armhf",
            Self::Aarch64 => "aarch64",
        }
    }
}

/// The squashfs compression algorithms the image builder is invoked with.
#[derive(Clone, Copy, Debug, Default, Hash, PartialEq, Eq)]
pub enum Compression {
    /// The `zstd` compressor.
    #[default]
    Zstd,
    /// The `xz` compressor.
    Xz,
    /// The `gzip` compressor.
    Gzip,
}

impl Compression {
    /// Returns the textual representation of the [`Compression`].
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Zstd => "zstd",
            Self::Xz => "xz",
            Self::Gzip => "gzip",
        }
    }
}

impl clap::ValueEnum for Compression {
    fn value_variants<'a>() -> &'a [Self] {
        static COMPRESSIONS: &[Compression] =
            &[Compression::Zstd, Compression::Xz, Compression::Gzip];

        COMPRESSIONS
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(clap::builder::PossibleValue::new(self.as_str()))
    }
}
