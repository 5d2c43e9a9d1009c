//! `tolstack thres` command - Ppk threshold solver

use clap::Subcommand;
use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{format_value, make_rng, open_input, status_mark, yes_no};
use crate::cli::output::{effective_format, serialized, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::threshold::{CriticalPoint, SweepPoint};
use crate::core::{
    capability_sweep, critical_std_curve, max_std_for_target, meets_target, Config, GenNormFit,
    LongTable, SpecLimits, SweepSettings,
};

#[derive(Subcommand, Debug)]
pub enum ThresCommands {
    /// Largest σ meeting the target Ppk at a given mean
    MaxStd(MaxStdArgs),

    /// Check a measured sample against the target Ppk
    Check(CheckArgs),

    /// Simulate processes across the (mean, σ) plane
    Sweep(SweepArgs),

    /// Maximum σ over evenly spaced means between the limits
    Curve(CurveArgs),

    /// Fit a generalized normal law (shape, location, scale) to a sample
    Fit(FitArgs),
}

/// Two-sided limits and the target, shared by the solver subcommands
#[derive(clap::Args, Debug)]
pub struct TargetOpts {
    /// Lower specification limit
    #[arg(long, allow_negative_numbers = true)]
    pub lsl: f64,

    /// Upper specification limit
    #[arg(long, allow_negative_numbers = true)]
    pub usl: f64,

    /// Target Ppk
    #[arg(long, short = 't', default_value_t = 1.33)]
    pub target: f64,
}

#[derive(clap::Args, Debug)]
pub struct MaxStdArgs {
    /// Process mean
    #[arg(long, allow_negative_numbers = true)]
    pub mean: f64,

    #[command(flatten)]
    pub limits: TargetOpts,
}

#[derive(clap::Args, Debug)]
pub struct CheckArgs {
    /// Measurement CSV with a header row (`-` reads stdin)
    pub file: PathBuf,

    /// Column holding the measurements
    #[arg(long, short = 'c')]
    pub column: String,

    /// Lower specification limit
    #[arg(long, allow_negative_numbers = true)]
    pub lsl: Option<f64>,

    /// Upper specification limit
    #[arg(long, allow_negative_numbers = true)]
    pub usl: Option<f64>,

    /// Target Ppk
    #[arg(long, short = 't', default_value_t = 1.33)]
    pub target: f64,
}

#[derive(clap::Args, Debug)]
pub struct SweepArgs {
    #[command(flatten)]
    pub limits: TargetOpts,

    /// Number of simulated processes
    #[arg(long, default_value_t = 100)]
    pub draws: usize,

    /// Observations per simulated process
    #[arg(long, default_value_t = 200)]
    pub sample_size: usize,

    /// Smallest σ drawn (default: 0.1, capped at a third of the tolerance)
    #[arg(long)]
    pub std_min: Option<f64>,

    /// Largest σ drawn (default: a third of the tolerance)
    #[arg(long)]
    pub std_max: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct CurveArgs {
    #[command(flatten)]
    pub limits: TargetOpts,

    /// Number of means from LSL to USL
    #[arg(long, default_value_t = 11)]
    pub points: usize,
}

#[derive(clap::Args, Debug)]
pub struct FitArgs {
    /// Measurement CSV with a header row (`-` reads stdin)
    pub file: PathBuf,

    /// Column holding the measurements
    #[arg(long, short = 'c')]
    pub column: String,
}

#[derive(Serialize)]
struct FitReport<'a> {
    sample: &'a str,
    #[serde(flatten)]
    fit: GenNormFit,
    std: f64,
}

pub fn run(cmd: ThresCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        ThresCommands::MaxStd(args) => run_max_std(args, global, config),
        ThresCommands::Check(args) => run_check(args, global, config),
        ThresCommands::Sweep(args) => run_sweep(args, global, config),
        ThresCommands::Curve(args) => run_curve(args, global, config),
        ThresCommands::Fit(args) => run_fit(args, global, config),
    }
}

fn run_max_std(args: MaxStdArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let TargetOpts { lsl, usl, target } = args.limits;
    let max_std = max_std_for_target(args.mean, target, lsl, usl)?;
    let point = CriticalPoint {
        mean: args.mean,
        max_std,
    };
    if let Some(text) = serialized(&point, global.format)? {
        println!("{}", text);
        return Ok(());
    }
    match effective_format(global.format, false) {
        OutputFormat::Text => println!(
            "Maximum std for Ppk {} at mean {}: {}",
            target,
            format_value(args.mean, config.precision),
            style(format_value(max_std, config.precision)).bold()
        ),
        format => print!("{}", curve_table(&[point], config.precision).render(format)?),
    }
    Ok(())
}

fn run_check(args: CheckArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let limits = SpecLimits::new(args.lsl, args.usl)?;
    let sample = LongTable::from_csv(open_input(&args.file)?)?.column(&args.column)?;
    let check = meets_target(&sample, args.target, &limits)?;

    if let Some(text) = serialized(&check, global.format)? {
        println!("{}", text);
        return Ok(());
    }
    match effective_format(global.format, false) {
        OutputFormat::Text => println!(
            "{} {} - Ppk {} against target {}",
            status_mark(check.meets),
            style(&args.column).cyan(),
            format_value(check.ppk, config.precision),
            args.target
        ),
        format => {
            let mut table = Table::new(["sample", "ppk", "target", "meets"]);
            table.push_row([
                args.column.clone(),
                format_value(check.ppk, config.precision),
                args.target.to_string(),
                yes_no(check.meets).to_string(),
            ]);
            print!("{}", table.render(format)?);
        }
    }
    Ok(())
}

fn run_fit(args: FitArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let sample = LongTable::from_csv(open_input(&args.file)?)?.column(&args.column)?;
    let fit = GenNormFit::fit(&sample)?;
    let report = FitReport {
        sample: &args.column,
        fit,
        std: fit.std(),
    };

    if let Some(text) = serialized(&report, global.format)? {
        println!("{}", text);
        return Ok(());
    }
    let p = config.precision;
    match effective_format(global.format, false) {
        OutputFormat::Text => {
            println!("Generalized normal fit of {}", style(&args.column).cyan());
            println!("  beta:  {}", format_value(fit.beta, p));
            println!("  loc:   {}", format_value(fit.loc, p));
            println!("  scale: {}", format_value(fit.scale, p));
            println!("  std:   {}", format_value(report.std, p));
        }
        format => {
            let mut table = Table::new(["sample", "beta", "loc", "scale", "std"]);
            table.push_row([
                args.column.clone(),
                format_value(fit.beta, p),
                format_value(fit.loc, p),
                format_value(fit.scale, p),
                format_value(report.std, p),
            ]);
            print!("{}", table.render(format)?);
        }
    }
    Ok(())
}

fn run_sweep(args: SweepArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let TargetOpts { lsl, usl, target } = args.limits;
    let limits = SpecLimits::two_sided(lsl, usl)?;
    let mut settings = SweepSettings::across(&limits, args.draws)?;
    settings.sample_size = args.sample_size;
    if let Some(std_min) = args.std_min {
        settings.std_min = std_min;
    }
    if let Some(std_max) = args.std_max {
        settings.std_max = std_max;
    }

    let mut rng = make_rng(config.seed);
    let points = capability_sweep(&settings, &limits, target, &mut rng)?;

    if let Some(text) = serialized(&points, global.format)? {
        println!("{}", text);
        return Ok(());
    }
    let table = sweep_table(&points, config.precision);
    match effective_format(global.format, true) {
        OutputFormat::Text => {
            println!("{}", table.to_text());
            let meeting = points.iter().filter(|p| p.meets).count();
            println!(
                "\n{} of {} simulated processes meet Ppk {}",
                style(meeting).bold(),
                points.len(),
                target
            );
        }
        format => print!("{}", table.render(format)?),
    }
    Ok(())
}

fn run_curve(args: CurveArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let TargetOpts { lsl, usl, target } = args.limits;
    let curve = critical_std_curve(lsl, usl, target, args.points)?;

    if let Some(text) = serialized(&curve, global.format)? {
        println!("{}", text);
        return Ok(());
    }
    let table = curve_table(&curve, config.precision);
    match effective_format(global.format, true) {
        OutputFormat::Text => println!("{}", table.to_text()),
        format => print!("{}", table.render(format)?),
    }
    Ok(())
}

fn curve_table(points: &[CriticalPoint], precision: usize) -> Table {
    let mut table = Table::new(["mean", "max_std"]);
    for p in points {
        table.push_row([format_value(p.mean, precision), format_value(p.max_std, precision)]);
    }
    table
}

fn sweep_table(points: &[SweepPoint], precision: usize) -> Table {
    let mut table = Table::new(["mean", "std", "ppk", "meets"]);
    for p in points {
        table.push_row([
            format_value(p.mean, precision),
            format_value(p.std, precision),
            format_value(p.ppk, precision),
            yes_no(p.meets).to_string(),
        ]);
    }
    table
}
