//! `tolstack pplot` command - normal probability-plot data

use miette::Result;
use serde::Serialize;
use std::path::PathBuf;

use crate::cli::helpers::{format_p_value, format_value, open_input};
use crate::cli::output::{effective_format, serialized, Table};
use crate::cli::viz;
use crate::cli::{GlobalOpts, OutputFormat};
use crate::core::probplot::median_ranks;
use crate::core::{
    probability_plot, Config, HenryLine, LongTable, ProbabilityPlot, StatsError, TestSelection,
};

#[derive(clap::Args, Debug)]
pub struct PplotArgs {
    /// Measurement CSV with a header row (`-` reads stdin)
    pub file: PathBuf,

    /// Column to plot (default: the first column)
    #[arg(long, short = 'c')]
    pub column: Option<String>,

    /// Draw the plot in the terminal
    #[arg(long)]
    pub plot: bool,

    /// Add the Henry line through the quartiles
    #[arg(long)]
    pub henry: bool,

    /// Also run the omnibus test (needs at least 8 values)
    #[arg(long)]
    pub omnibus: bool,
}

#[derive(Serialize)]
struct PplotOutput<'a> {
    column: &'a str,
    #[serde(flatten)]
    plot: &'a ProbabilityPlot,
    median_ranks: Vec<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    henry: Option<HenryLine>,
}

pub fn run(args: PplotArgs, global: &GlobalOpts, config: &Config) -> Result<()> {
    let table = LongTable::from_csv(open_input(&args.file)?)?;
    let column = match &args.column {
        Some(column) => column.clone(),
        None => table
            .headers()
            .first()
            .cloned()
            .ok_or_else(|| StatsError::config("input has no columns"))?,
    };
    let sample = table.column(&column)?;

    let selection = TestSelection {
        omnibus: args.omnibus,
        ..TestSelection::classic()
    };
    let plot = probability_plot(&sample, &selection)?;
    let henry = if args.henry {
        Some(HenryLine::fit(&sample)?)
    } else {
        None
    };

    let output = PplotOutput {
        column: &column,
        plot: &plot,
        median_ranks: median_ranks(plot.observed.len()),
        henry,
    };
    if let Some(text) = serialized(&output, global.format)? {
        println!("{}", text);
        return Ok(());
    }

    let p = config.precision;
    let mut header = vec!["value", "ecdf", "median_rank"];
    if henry.is_some() {
        header.push("henry_z");
    }
    let mut points = Table::new(header);
    for ((x, ecdf), rank) in plot
        .observed
        .iter()
        .zip(&plot.observed_probability)
        .zip(&output.median_ranks)
    {
        let mut row = vec![format_value(*x, p), format_value(*ecdf, 4), format_value(*rank, 4)];
        if let Some(line) = henry {
            row.push(format_value(line.at(*x), 4));
        }
        points.push_row(row);
    }

    match effective_format(global.format, true) {
        OutputFormat::Text => {
            if args.plot {
                println!("{}", viz::render_probability_plot(&plot, viz::PLOT_WIDTH, viz::PLOT_HEIGHT));
                println!();
            }
            println!("{}", points.to_text());
            println!();
            for (test, outcome) in plot.p_values.iter() {
                println!("{:<14} p = {}", test.key(), format_p_value(outcome.p_value));
            }
        }
        format => print!("{}", points.render(format)?),
    }
    Ok(())
}
