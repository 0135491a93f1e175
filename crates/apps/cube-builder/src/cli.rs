//! Command line arguments

use clap::{Parser, ValueEnum};
use placement::Variant;
use std::path::PathBuf;

/// Application variant selectable on the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum VariantArg {
    /// Camera stream with hand gestures
    Webcam,
    /// Immersive session with hit testing
    Xr,
}

impl From<VariantArg> for Variant {
    fn from(arg: VariantArg) -> Self {
        match arg {
            VariantArg::Webcam => Variant::Webcam,
            VariantArg::Xr => Variant::Xr,
        }
    }
}

#[derive(Parser, Debug)]
#[command(name = "cube-builder")]
#[command(about = "Replay AR cube placement scenarios headlessly", long_about = None)]
pub struct Args {
    /// Config file (defaults to the user config directory)
    #[arg(long, short = 'c', value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Variant for the built-in demo scenario
    #[arg(long, value_enum)]
    pub variant: Option<VariantArg>,

    /// Scenario file in RON format
    #[arg(long, short = 's', value_name = "PATH")]
    pub scenario: Option<PathBuf>,

    /// Stop after N frames
    #[arg(long, value_name = "N")]
    pub frames: Option<u64>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value = "info")]
    pub log_level: String,

    /// Print the effective configuration as TOML and exit
    #[arg(long)]
    pub dump_config: bool,

    /// Write the effective configuration to the config file and exit
    #[arg(long)]
    pub save_config: bool,
}
