//! `tolstack pop` command - multi-modal population utilities

use clap::Subcommand;
use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use std::io;
use std::path::PathBuf;

use crate::cli::helpers::{format_p_value, format_value, make_rng, open_input, status_mark, yes_no};
use crate::cli::output::{effective_format, serialized, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::population::{generate_populations, generate_shifted_population};
use crate::core::{Config, GroupedSample, LongTable, PopulationAnalysis, SpecLimits};

#[derive(Subcommand, Debug)]
pub enum PopCommands {
    /// Normality, equal variance and per-group capability of grouped data
    Analyze(AnalyzeArgs),

    /// Simulate a mixture of normal populations as long-form CSV
    Generate(GenerateArgs),
}

#[derive(clap::Args, Debug)]
pub struct AnalyzeArgs {
    /// Measurement CSV with a header row (`-` reads stdin)
    pub file: PathBuf,

    /// Long format: column naming the group of each row (default: one group per column)
    #[arg(long)]
    pub category: Option<String>,

    /// Long format: column holding the measurements
    #[arg(long, default_value = "value", requires = "category")]
    pub value: String,

    /// Lower specification limit
    #[arg(long, allow_negative_numbers = true)]
    pub lsl: Option<f64>,

    /// Upper specification limit
    #[arg(long, allow_negative_numbers = true)]
    pub usl: Option<f64>,

    /// Significance level (default from config)
    #[arg(long)]
    pub alpha: Option<f64>,
}

#[derive(clap::Args, Debug)]
pub struct GenerateArgs {
    /// Lower bound of the population means
    #[arg(long, allow_negative_numbers = true)]
    pub lsl: f64,

    /// Upper bound of the population means
    #[arg(long, allow_negative_numbers = true)]
    pub usl: f64,

    /// Number of populations
    #[arg(long, default_value_t = 16)]
    pub pops: usize,

    /// Values per population
    #[arg(long, default_value_t = 100)]
    pub values: usize,

    /// Scale each population's σ by a uniform random factor
    #[arg(long)]
    pub random_spread: bool,

    /// Copy one gaussian sample at this many shifts instead (flat-topped population)
    #[arg(long, value_name = "COUNT", conflicts_with_all = ["pops", "random_spread"])]
    pub shifted: Option<usize>,

    /// σ of the shifted sample (default: (usl − lsl) / values)
    #[arg(long, requires = "shifted")]
    pub std: Option<f64>,

    /// Write to a file instead of stdout
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,
}

pub fn run(cmd: PopCommands, global: &GlobalOpts, config: &Config) -> Result<()> {
    match cmd {
        PopCommands::Analyze(args) => run_analyze(args, global, config),
        PopCommands::Generate(args) => run_generate(args, config),
    }
}

fn run_analyze(args: AnalyzeArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let limits = SpecLimits::new(args.lsl, args.usl)?;
    let alpha = args.alpha.unwrap_or(config.normality_alpha);
    let reader = open_input(&args.file)?;
    let grouped = match &args.category {
        Some(category) => LongTable::from_csv(reader)?.group_by(category, &args.value)?,
        None => GroupedSample::from_wide_csv(reader)?,
    };
    let analysis = PopulationAnalysis::run(&grouped, &limits, alpha)?;

    if let Some(text) = serialized(&analysis, global.format)? {
        println!("{}", text);
        return Ok(());
    }

    let p = config.precision;
    let mut table = Table::new(["sample", "ad_p_value", "normal", "ppk", "ppk_pooled_std"]);
    for ((name, p_value), ((_, ppk), (_, pooled))) in analysis
        .normality
        .iter()
        .zip(analysis.capabilities.iter().zip(&analysis.pooled_capabilities))
    {
        table.push_row([
            name.clone(),
            format_p_value(*p_value),
            yes_no(*p_value >= alpha).to_string(),
            format_value(*ppk, p),
            format_value(*pooled, p),
        ]);
    }

    match effective_format(global.format, true) {
        OutputFormat::Text => {
            println!("{}", table.to_text());
            println!();
            println!("Overall std: {}", style(format_value(analysis.overall_std, p)).bold());
            println!(
                "{} All samples normal (alpha = {})",
                status_mark(!analysis.any_non_normal),
                alpha
            );
            println!(
                "{} Equal variances (Levene W = {}, p = {})",
                status_mark(analysis.equal_variances),
                format_value(analysis.levene.statistic, p),
                format_p_value(analysis.levene.p_value)
            );
        }
        format => print!("{}", table.render(format)?),
    }
    Ok(())
}

fn run_generate(args: GenerateArgs, config: &Config) -> Result<()> {
    let mut rng = make_rng(config.seed);
    let grouped = match args.shifted {
        Some(shift_count) => {
            let values = generate_shifted_population(
                args.lsl,
                args.usl,
                args.std,
                shift_count,
                args.values,
                &mut rng,
            )?;
            let mut grouped = GroupedSample::new();
            grouped.extend_group("shifted", values);
            grouped
        }
        None => generate_populations(
            args.lsl,
            args.usl,
            args.pops,
            args.values,
            args.random_spread,
            &mut rng,
        )?,
    };

    match &args.output {
        Some(path) => {
            let writer = csv::Writer::from_path(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("cannot create {}", path.display()))?;
            write_long_csv(writer, &grouped)?;
            eprintln!(
                "{} Wrote {} populations to {}",
                style("✓").green(),
                grouped.len(),
                path.display()
            );
        }
        None => write_long_csv(csv::Writer::from_writer(io::stdout().lock()), &grouped)?,
    }
    Ok(())
}

fn write_long_csv<W: io::Write>(mut writer: csv::Writer<W>, grouped: &GroupedSample) -> Result<()> {
    writer.write_record(["variable", "value"]).into_diagnostic()?;
    for (name, values) in grouped.iter() {
        for value in values {
            writer
                .write_record([name.to_string(), value.to_string()])
                .into_diagnostic()?;
        }
    }
    writer.flush().into_diagnostic()
}
