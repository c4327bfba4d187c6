use clap::{Args, Parser, Subcommand, ValueEnum};
use cstruct_csv::paths::DEFAULT_PATHS_FILE;
use cstruct_csv::{ConversionConfig, ConversionGroup, Variant};
use std::path::{Path, PathBuf};

/// Top-level CLI parser for the `cstruct-csv` binary.
///
/// Without a subcommand every group listed in the conversion paths file is
/// converted.
#[derive(Debug, Parser)]
#[command(
    name = "cstruct-csv",
    version,
    about = "Convert C structure definitions into CCDD CSV data tables"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Conversion preset
    #[arg(long, global = true, value_enum, default_value = "generic")]
    pub variant: VariantArg,

    /// Use `#define NAME VALUE` lines as macro values
    #[arg(long, global = true)]
    pub capture_defines: bool,

    /// Convert groups in parallel
    #[arg(long, global = true)]
    pub parallel: bool,

    /// Also write the extracted model as `<output>.json`
    #[arg(long, global = true)]
    pub json: bool,

    /// Directory that output paths are relative to
    #[arg(short, long, global = true)]
    pub output: Option<PathBuf>,

    /// Conversion paths file
    #[arg(long, default_value = DEFAULT_PATHS_FILE)]
    pub paths: PathBuf,

    /// Quiet mode (errors only)
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Verbose mode (debug logging)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Convert the given input files as a single group
    Convert(ConvertArgs),
}

#[derive(Debug, Args)]
pub struct ConvertArgs {
    /// Group name
    #[arg(long)]
    pub name: String,

    /// Kind descriptor written in the header
    #[arg(long, default_value = "telemetry")]
    pub kind: String,

    /// Output file
    #[arg(long)]
    pub out: PathBuf,

    /// Input header files
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,
}

impl ConvertArgs {
    pub fn group(&self, output_dir: &Path) -> ConversionGroup {
        ConversionGroup::new(&self.name, &self.kind, output_dir.join(&self.out))
            .with_inputs(self.inputs.iter().cloned())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, ValueEnum)]
pub enum VariantArg {
    Generic,
    Cfs,
}

impl From<VariantArg> for Variant {
    fn from(value: VariantArg) -> Self {
        match value {
            VariantArg::Generic => Variant::Generic,
            VariantArg::Cfs => Variant::Cfs,
        }
    }
}

impl Cli {
    /// Conversion configuration selected by the flags.
    #[must_use]
    pub fn conversion_config(&self) -> ConversionConfig {
        ConversionConfig::for_variant(self.variant.into())
            .with_capture_defines(self.capture_defines)
            .with_parallel(self.parallel)
            .with_export_json(self.json)
    }

    /// Directory output paths are resolved against.
    #[must_use]
    pub fn output_dir(&self) -> PathBuf {
        self.output.clone().unwrap_or_default()
    }
}
