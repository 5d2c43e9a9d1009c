//! `tolstack stack` command - tolerance stackup analysis

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};

use crate::cli::helpers::{format_value, make_rng, status_mark};
use crate::cli::output::{effective_format, serialized, Table};
use crate::cli::viz;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::Config;
use crate::entities::stackup::{
    Contribution, ReportOptions, Stackup, StackupBounds, StackupDocument, StackupReport,
};

#[derive(clap::Args, Debug)]
pub struct StackArgs {
    /// Stackup description (YAML)
    pub file: PathBuf,

    /// Monte Carlo draws (default from config)
    #[arg(long, short = 'n')]
    pub draws: Option<usize>,

    /// Lower target limit of the stackup result (overrides the file)
    #[arg(long, allow_negative_numbers = true)]
    pub lsl: Option<f64>,

    /// Upper target limit of the stackup result (overrides the file)
    #[arg(long, allow_negative_numbers = true)]
    pub usl: Option<f64>,

    /// Print a histogram of the Monte Carlo results
    #[arg(long)]
    pub histogram: bool,

    /// Histogram bins (default from config)
    #[arg(long, requires = "histogram")]
    pub bins: Option<usize>,

    /// Write the raw Monte Carlo results to a CSV file
    #[arg(long, value_name = "PATH")]
    pub csv: Option<PathBuf>,

    /// Show each dimension's share of the stackup variance
    #[arg(long)]
    pub sensitivity: bool,

    /// Deterministic bounds only, no Monte Carlo run
    #[arg(long, conflicts_with_all = ["draws", "histogram", "csv"])]
    pub compare: bool,
}

#[derive(Serialize)]
struct StackOutput<'a, T: Serialize> {
    #[serde(skip_serializing_if = "Option::is_none")]
    title: Option<&'a str>,
    #[serde(flatten)]
    result: &'a T,
    #[serde(skip_serializing_if = "Option::is_none")]
    sensitivity: Option<Vec<Contribution>>,
}

pub fn run(args: StackArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let doc = StackupDocument::load(&args.file)
        .wrap_err_with(|| format!("cannot load stackup {}", args.file.display()))?;
    let stackup = doc.stackup()?;
    let sensitivity = args.sensitivity.then(|| stackup.sensitivity());
    let title = doc.title.as_deref();

    if args.compare {
        let mut bounds = stackup.compare()?;
        bounds.precision = config.precision;
        return print_bounds(&bounds, title, sensitivity, global.format);
    }

    let options = ReportOptions {
        draws: args.draws.unwrap_or(config.monte_carlo_draws),
        lsl: args.lsl.or(doc.lsl),
        usl: args.usl.or(doc.usl),
        precision: config.precision,
    };
    let mut rng = make_rng(config.seed);
    let population = stackup.monte_carlo(options.draws, &mut rng)?;
    let report = stackup.summarize(&population, &options)?;

    if let Some(path) = &args.csv {
        write_population(path, &population)?;
    }

    let output = StackOutput {
        title,
        result: &report,
        sensitivity,
    };
    if let Some(text) = serialized(&output, global.format)? {
        println!("{}", text);
        return Ok(());
    }

    match effective_format(global.format, false) {
        OutputFormat::Csv | OutputFormat::Tsv => {
            print!("{}", summary_table(&report).render(global.format)?);
            if let Some(contributions) = &output.sensitivity {
                println!();
                print!("{}", sensitivity_table(contributions, config.precision).render(global.format)?);
            }
        }
        _ => {
            print_text_report(&stackup, &report, &output, &options)?;
            if args.histogram {
                let bins = args.bins.unwrap_or(config.histogram_bins);
                println!();
                println!("{}", viz::render_histogram(&population, bins, options.limits()?.as_ref()));
            }
        }
    }
    Ok(())
}

fn print_bounds(
    bounds: &StackupBounds,
    title: Option<&str>,
    sensitivity: Option<Vec<Contribution>>,
    format: OutputFormat,
) -> Result<()> {
    let output = StackOutput {
        title,
        result: bounds,
        sensitivity,
    };
    if let Some(text) = serialized(&output, format)? {
        println!("{}", text);
        return Ok(());
    }
    match effective_format(format, false) {
        OutputFormat::Csv | OutputFormat::Tsv => {
            print!("{}", bounds_table(bounds).render(format)?);
        }
        _ => {
            if let Some(title) = title {
                println!("{}", style(title).bold());
            }
            println!("{}", bounds);
            if let Some(contributions) = &output.sensitivity {
                println!();
                println!("{}", sensitivity_table(contributions, bounds.precision).to_text());
            }
        }
    }
    Ok(())
}

fn print_text_report(
    stackup: &Stackup,
    report: &StackupReport,
    output: &StackOutput<'_, StackupReport>,
    options: &ReportOptions,
) -> Result<()> {
    if let Some(title) = output.title {
        println!("{}", style(title).bold());
    }
    let mut out = io::stdout().lock();
    report.write_to(&mut out).into_diagnostic()?;
    drop(out);

    if let Some(contributions) = &output.sensitivity {
        println!();
        println!("{}", sensitivity_table(contributions, options.precision).to_text());
    }

    if let (Some(lsl), Some(usl)) = (options.lsl, options.usl) {
        let wc = stackup.worst_case();
        println!();
        println!("   {}", style("Worst case against target").bold());
        println!("{}", viz::render_range_bar(wc.min, wc.max, lsl, usl));
    }

    if let Some(yield_percent) = report.monte_carlo.yield_percent {
        println!();
        println!(
            "{} Monte Carlo yield: {:.2}%",
            status_mark(yield_percent >= 100.0),
            yield_percent
        );
    }
    Ok(())
}

fn bounds_table(bounds: &StackupBounds) -> Table {
    let p = bounds.precision;
    let mut table = Table::new(["method", "min", "max"]);
    for (method, interval) in [
        ("worst_case", bounds.worst_case),
        ("tolerance_interval", bounds.tolerance_interval),
        ("statistical", bounds.statistical),
    ] {
        table.push_row([
            method.to_string(),
            format_value(interval.min, p),
            format_value(interval.max, p),
        ]);
    }
    table
}

fn summary_table(report: &StackupReport) -> Table {
    let p = report.bounds.precision;
    let mut table = bounds_table(&report.bounds);
    table.push_row([
        "monte_carlo_95".to_string(),
        format_value(report.monte_carlo.percentile_2_5, p),
        format_value(report.monte_carlo.percentile_97_5, p),
    ]);
    table
}

fn sensitivity_table(contributions: &[Contribution], precision: usize) -> Table {
    let mut table = Table::new(["dimension", "contribution_percent"]);
    for c in contributions {
        table.push_row([c.name.clone(), format_value(c.percent, precision)]);
    }
    table
}

fn write_population(path: &Path, population: &[f64]) -> Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot create {}", path.display()))?;
    writer.write_record(["value"]).into_diagnostic()?;
    for value in population {
        writer.write_record([value.to_string()]).into_diagnostic()?;
    }
    writer.flush().into_diagnostic()?;
    eprintln!(
        "{} Wrote {} samples to {}",
        style("✓").green(),
        population.len(),
        path.display()
    );
    Ok(())
}
