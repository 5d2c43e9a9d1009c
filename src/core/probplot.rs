//! Normal probability-plot data
//!
//! Everything a renderer needs to draw a normal probability plot: the
//! empirical points, a fitted-normal reference line, the probability-axis
//! transform pair and its standard tick positions. No drawing happens here.

use serde::Serialize;

use crate::core::error::{Result, StatsError};
use crate::core::normality::{run_tests, NormalityResults, TargetLaw, TestSelection};
use crate::core::stats::{self, inverse_phi, linspace, phi, NormalFit};

/// Smallest probability the axis transform accepts
pub const PROBABILITY_FLOOR: f64 = 1e-6;

/// Major ticks of a probability axis
pub const PROBABILITY_TICKS: [f64; 17] = [
    0.001, 0.005, 0.01, 0.05, 0.1, 0.2, 0.3, 0.4, 0.5, 0.6, 0.7, 0.8, 0.9, 0.95, 0.99, 0.995,
    0.999,
];

/// Number of points on the theoretical line
const THEORETICAL_POINTS: usize = 10;

/// Probability → axis position (standard normal quantile)
pub fn ppf_transform(p: f64) -> f64 {
    inverse_phi(p.clamp(PROBABILITY_FLOOR, 1.0 - PROBABILITY_FLOOR))
}

/// Axis position → probability
pub fn cdf_transform(z: f64) -> f64 {
    phi(z)
}

/// Tick label such as `"99.5 %"`
pub fn tick_label(p: f64) -> String {
    format!("{:.1} %", p * 100.0)
}

/// Benard median ranks (i − 0.3) / (n + 0.4), i = 1..=n
pub fn median_ranks(n: usize) -> Vec<f64> {
    let nf = n as f64;
    (1..=n).map(|i| (i as f64 - 0.3) / (nf + 0.4)).collect()
}

/// Empirical CDF of sorted data evaluated at each point (ties share the upper value)
fn ecdf_sorted(sorted: &[f64]) -> Vec<f64> {
    let n = sorted.len() as f64;
    sorted
        .iter()
        .map(|x| sorted.partition_point(|v| v <= x) as f64 / n)
        .collect()
}

/// Data for one normal probability plot
#[derive(Debug, Clone, Serialize)]
pub struct ProbabilityPlot {
    pub law: TargetLaw,
    pub fit: NormalFit,
    /// Sorted observations
    pub observed: Vec<f64>,
    /// ECDF at each observation
    pub observed_probability: Vec<f64>,
    pub theoretical_x: Vec<f64>,
    /// Fitted normal CDF at `theoretical_x`
    pub theoretical_probability: Vec<f64>,
    pub p_values: NormalityResults,
}

/// Build probability-plot data for a sample of at least 5 values
pub fn probability_plot(sample: &[f64], selection: &TestSelection) -> Result<ProbabilityPlot> {
    if sample.len() < 5 {
        return Err(StatsError::data(format!(
            "probability plot needs at least 5 values, got {}",
            sample.len()
        )));
    }
    let observed = stats::sorted_copy(sample)?;
    let fit = NormalFit::fit(&observed)?;
    let observed_probability = ecdf_sorted(&observed);

    let theoretical_x = linspace(observed[0], observed[observed.len() - 1], THEORETICAL_POINTS);
    let theoretical_probability = theoretical_x
        .iter()
        .map(|&x| fit.cdf(x))
        .collect::<Result<Vec<_>>>()?;

    let p_values = run_tests(&observed, TargetLaw::Normal, selection)?;

    Ok(ProbabilityPlot {
        law: TargetLaw::Normal,
        fit,
        observed,
        observed_probability,
        theoretical_x,
        theoretical_probability,
        p_values,
    })
}

/// Henry line in (value, z-score) space
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct HenryLine {
    pub slope: f64,
    pub intercept: f64,
}

impl HenryLine {
    /// Line through the sample's 25 % and 75 % quantiles
    pub fn fit(sample: &[f64]) -> Result<Self> {
        let sorted = stats::sorted_copy(sample)?;
        let x1 = stats::quantile_sorted(&sorted, 0.25)?;
        let x2 = stats::quantile_sorted(&sorted, 0.75)?;
        if x2 <= x1 {
            return Err(StatsError::data("interquartile range is zero"));
        }
        let (y1, y2) = (inverse_phi(0.25), inverse_phi(0.75));
        let slope = (y2 - y1) / (x2 - x1);
        Ok(Self {
            slope,
            intercept: y2 - slope * x2,
        })
    }

    /// z-score of the line at `x`
    pub fn at(&self, x: f64) -> f64 {
        self.slope * x + self.intercept
    }
}

/// Henry-line z-scores at every sample point
pub fn henry_line(sample: &[f64]) -> Result<Vec<f64>> {
    let line = HenryLine::fit(sample)?;
    Ok(sample.iter().map(|&x| line.at(x)).collect())
}
