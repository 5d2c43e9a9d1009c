//! Command-line arguments

use clap::{Parser, Subcommand, ValueEnum};

use crate::cli::commands::{
    norm::NormArgs, pop::PopCommands, ppk::PpkArgs, pplot::PplotArgs, stack::StackArgs,
    thres::ThresCommands,
};
use crate::core::Config;

/// Statistical tolerance stackups and process capability
#[derive(Parser, Debug)]
#[command(name = "tolstack", version, about, long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalOpts,

    #[command(subcommand)]
    pub command: Commands,
}

/// Options shared by every subcommand
#[derive(clap::Args, Debug, Clone)]
pub struct GlobalOpts {
    /// Output format
    #[arg(long, short = 'f', global = true, default_value = "auto")]
    pub format: OutputFormat,

    /// Debug logging on stderr
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Seed for reproducible Monte Carlo runs
    #[arg(long, global = true)]
    pub seed: Option<u64>,

    /// Decimal places in text output
    #[arg(long, global = true)]
    pub precision: Option<usize>,
}

impl GlobalOpts {
    /// Flags take priority over every config layer
    pub fn apply(&self, config: &mut Config) {
        if self.seed.is_some() {
            config.seed = self.seed;
        }
        if let Some(precision) = self.precision {
            config.precision = precision;
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    /// Text for reports, tab-separated for tables
    Auto,
    Text,
    Json,
    Yaml,
    Csv,
    Tsv,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Analyze a tolerance stackup described in YAML
    Stack(StackArgs),

    /// Process capability (Ppk) of measured data
    Ppk(PpkArgs),

    /// Normality test battery
    Norm(NormArgs),

    /// Ppk threshold solver
    #[command(subcommand)]
    Thres(ThresCommands),

    /// Multi-modal population utilities
    #[command(subcommand)]
    Pop(PopCommands),

    /// Normal probability-plot data
    Pplot(PplotArgs),
}
