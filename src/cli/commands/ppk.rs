//! `tolstack ppk` command - process capability of measured data

use console::style;
use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{format_value, open_input, status_mark, yes_no};
use crate::cli::output::{effective_format, serialized, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{CapabilityEstimate, Config, GroupedSample, LongTable, SpecLimits, StatsError};

#[derive(clap::Args, Debug)]
pub struct PpkArgs {
    /// Measurement CSV with a header row (`-` reads stdin)
    pub file: PathBuf,

    /// Single column to analyze (default: every column)
    #[arg(long, short = 'c', conflicts_with = "category")]
    pub column: Option<String>,

    /// Long format: column naming the category of each row
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

    /// Target Ppk; each sample is checked against it
    #[arg(long)]
    pub target: Option<f64>,
}

#[derive(Debug, Serialize)]
struct PpkRow {
    name: String,
    n: usize,
    #[serde(flatten)]
    estimate: CapabilityEstimate,
    expected_dppm: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    meets_target: Option<bool>,
}

pub fn run(args: PpkArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let limits = SpecLimits::new(args.lsl, args.usl)?;
    if let Some(target) = args.target {
        if !(target > 0.0) {
            return Err(StatsError::config("target Ppk must be strictly superior to 0").into());
        }
    }

    let samples = load_samples(&args)?;
    let mut rows = Vec::with_capacity(samples.len());
    for (name, values) in samples.iter() {
        let estimate = CapabilityEstimate::fit_sample(values, &limits, config.sigma_multiple)
            .map_err(|e| match e {
                StatsError::InsufficientData(msg) => {
                    StatsError::InsufficientData(format!("sample '{}': {}", name, msg))
                }
                other => other,
            })?;
        rows.push(PpkRow {
            name: name.to_string(),
            n: values.len(),
            expected_dppm: estimate.expected_dppm(&limits),
            meets_target: args.target.map(|t| estimate.ppk >= t),
            estimate,
        });
    }

    if let Some(text) = serialized(&rows, global.format)? {
        println!("{}", text);
        return Ok(());
    }

    let table = ppk_table(&rows, config.precision);
    match effective_format(global.format, true) {
        OutputFormat::Text => {
            println!("{}", table.to_text());
            if let Some(target) = args.target {
                println!();
                for row in &rows {
                    println!(
                        "{} {} - Ppk {} against target {}",
                        status_mark(row.estimate.ppk >= target),
                        style(&row.name).cyan(),
                        format_value(row.estimate.ppk, config.precision),
                        target
                    );
                }
            }
        }
        format => print!("{}", table.render(format)?),
    }
    Ok(())
}

fn load_samples(args: &PpkArgs) -> Result<GroupedSample> {
    let reader = open_input(&args.file)?;
    let samples = match (&args.category, &args.column) {
        (Some(category), _) => LongTable::from_csv(reader)?.group_by(category, &args.value)?,
        (None, Some(column)) => {
            let mut grouped = GroupedSample::new();
            grouped.extend_group(column.clone(), LongTable::from_csv(reader)?.column(column)?);
            grouped
        }
        (None, None) => GroupedSample::from_wide_csv(reader)?,
    };
    if samples.is_empty() {
        return Err(StatsError::data("no samples found in input").into());
    }
    Ok(samples)
}

fn ppk_table(rows: &[PpkRow], precision: usize) -> Table {
    let with_target = rows.iter().any(|r| r.meets_target.is_some());
    let mut header = vec!["sample", "n", "mean", "std", "ppl", "ppu", "ppk", "dppm"];
    if with_target {
        header.push("meets");
    }
    let mut table = Table::new(header);
    let opt = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format_value(v, precision));
    for row in rows {
        let mut cells = vec![
            row.name.clone(),
            row.n.to_string(),
            format_value(row.estimate.mean, precision),
            format_value(row.estimate.std, precision),
            opt(row.estimate.ppl),
            opt(row.estimate.ppu),
            format_value(row.estimate.ppk, precision),
            format_value(row.expected_dppm, 1),
        ];
        if let Some(meets) = row.meets_target {
            cells.push(yes_no(meets).to_string());
        }
        table.push_row(cells);
    }
    table
}
