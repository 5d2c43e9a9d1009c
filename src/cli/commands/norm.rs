//! `tolstack norm` command - normality test battery

use console::style;
use miette::Result;
use std::path::PathBuf;

use crate::cli::helpers::{format_p_value, format_value, open_input, status_mark, yes_no};
use crate::cli::output::{effective_format, serialized, Table};
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::{
    batch, BatchOutcome, Config, GroupedSample, LongTable, NormalityResults, Sample, StatsError,
    TargetLaw, TestSelection,
};

#[derive(clap::Args, Debug)]
pub struct NormArgs {
    /// Measurement CSV with a header row (`-` reads stdin)
    pub file: PathBuf,

    /// Single column to test (default: every column)
    #[arg(long, short = 'c')]
    pub column: Option<String>,

    /// Law to test against: normal or lognormal
    #[arg(long, default_value = "normal")]
    pub law: String,

    /// Skip Anderson-Darling
    #[arg(long)]
    pub no_ad: bool,

    /// Skip Kolmogorov-Smirnov
    #[arg(long)]
    pub no_ks: bool,

    /// Skip Shapiro-Wilk
    #[arg(long)]
    pub no_sw: bool,

    /// Skip the D'Agostino-Pearson omnibus test
    #[arg(long)]
    pub no_omnibus: bool,

    /// Significance level (default from config)
    #[arg(long)]
    pub alpha: Option<f64>,
}

impl NormArgs {
    fn selection(&self) -> TestSelection {
        TestSelection {
            anderson_darling: !self.no_ad,
            kolmogorov_smirnov: !self.no_ks,
            shapiro_wilk: !self.no_sw,
            omnibus: !self.no_omnibus,
        }
    }
}

pub fn run(args: NormArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let law: TargetLaw = args.law.parse()?;
    let alpha = args.alpha.unwrap_or(config.normality_alpha);
    if !(alpha > 0.0 && alpha < 1.0) {
        return Err(StatsError::config("alpha must be in (0, 1)").into());
    }

    let reader = open_input(&args.file)?;
    let sample = match &args.column {
        Some(column) => Sample::Single(LongTable::from_csv(reader)?.column(column)?),
        None => Sample::Grouped(GroupedSample::from_wide_csv(reader)?),
    };
    let outcome = batch(&sample, law, &args.selection())?;

    if let Some(text) = serialized(&outcome, global.format)? {
        println!("{}", text);
        return Ok(());
    }

    let groups: Vec<(&str, &NormalityResults)> = match &outcome {
        BatchOutcome::Single(results) => {
            vec![(args.column.as_deref().unwrap_or("sample"), results)]
        }
        BatchOutcome::Grouped(groups) => groups.iter().map(|(n, r)| (n.as_str(), r)).collect(),
    };

    let mut table = Table::new(["sample", "test", "statistic", "p_value", "normal"]);
    for (name, results) in &groups {
        for (test, result) in results.iter() {
            table.push_row([
                name.to_string(),
                test.key().to_string(),
                format_value(result.statistic, config.precision),
                format_p_value(result.p_value),
                yes_no(!result.rejects(alpha)).to_string(),
            ]);
        }
        for test in results.skipped() {
            table.push_row([
                name.to_string(),
                test.key().to_string(),
                "-".to_string(),
                "-".to_string(),
                "n/a".to_string(),
            ]);
        }
    }

    match effective_format(global.format, true) {
        OutputFormat::Text => {
            println!("{}", table.to_text());
            println!();
            for (name, results) in &groups {
                let normal = results.min_p_value().is_some_and(|p| p >= alpha);
                println!(
                    "{} {} {} ({} law, alpha = {})",
                    status_mark(normal),
                    style(name).cyan(),
                    if normal { "looks normal" } else { "rejected" },
                    law,
                    alpha
                );
            }
        }
        format => print!("{}", table.render(format)?),
    }
    Ok(())
}
