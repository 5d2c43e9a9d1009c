//! Stackup entity - tolerance chain built from signed dimensions
//!
//! A stackup is a fixed, ordered list of [`Dimension`]s combined by a signed
//! sum. Supports worst-case, root-sum-square (tolerance interval and
//! estimated σ) and Monte Carlo analysis methods.

use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::io;
use std::path::Path;

use crate::core::capability::{self, SpecLimits};
use crate::core::error::{Result, StatsError};
use crate::core::stats;
use crate::entities::dimension::Dimension;

/// Default Monte Carlo draw count
pub const DEFAULT_DRAWS: usize = 10_000;

/// Closed interval of stackup results
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interval {
    pub min: f64,
    pub max: f64,
}

impl Interval {
    /// `center ± half_width`
    pub fn around(center: f64, half_width: f64) -> Self {
        Self {
            min: center - half_width,
            max: center + half_width,
        }
    }

    pub fn width(&self) -> f64 {
        self.max - self.min
    }
}

/// Share of the stackup variance owed to one dimension
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contribution {
    pub name: String,
    /// Percentage of total variance; all contributions sum to 100
    pub percent: f64,
}

/// Ordered chain of dimensions
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawStackup")]
pub struct Stackup {
    name: String,
    nominal: f64,
    dimensions: Vec<Dimension>,
}

/// Serialized stackup; name and nominal are derived again on load
#[derive(Deserialize)]
struct RawStackup {
    dimensions: Vec<Dimension>,
}

impl TryFrom<RawStackup> for Stackup {
    type Error = StatsError;

    fn try_from(raw: RawStackup) -> Result<Self> {
        Stackup::new(raw.dimensions)
    }
}

impl Stackup {
    /// Build a stackup; at least one dimension is required
    pub fn new(dimensions: Vec<Dimension>) -> Result<Self> {
        if dimensions.is_empty() {
            return Err(StatsError::config("a stackup needs at least one dimension"));
        }
        let name = dimensions
            .iter()
            .enumerate()
            .map(|(i, dim)| dim.signed_label(i == 0))
            .collect::<Vec<_>>()
            .join(" ");
        let nominal = dimensions
            .iter()
            .map(|dim| dim.direction() as f64 * dim.nominal())
            .sum();
        Ok(Self {
            name,
            nominal,
            dimensions,
        })
    }

    /// Signed expression such as `a + b - 2*c`
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Σ direction × nominal
    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn dimensions(&self) -> &[Dimension] {
        &self.dimensions
    }

    /// Number of dimensions
    pub fn len(&self) -> usize {
        self.dimensions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dimensions.is_empty()
    }

    /// Extreme results with every dimension at its worst limit
    ///
    /// Positive directions contribute lsl to the minimum and usl to the
    /// maximum; negative directions the reverse.
    pub fn worst_case(&self) -> Interval {
        let mut min = 0.0;
        let mut max = 0.0;
        for dim in &self.dimensions {
            let k = dim.direction() as f64;
            if dim.direction() > 0 {
                min += k * dim.lsl();
                max += k * dim.usl();
            } else {
                min += k * dim.usl();
                max += k * dim.lsl();
            }
        }
        Interval { min, max }
    }

    /// √Σ((usl − lsl)/2)²
    pub fn tolerance_interval_spread(&self) -> f64 {
        self.dimensions
            .iter()
            .map(|dim| dim.half_tolerance().powi(2))
            .sum::<f64>()
            .sqrt()
    }

    /// √Σ std_hat²
    pub fn statistical_spread(&self) -> Result<f64> {
        let mut total = 0.0;
        for dim in &self.dimensions {
            let std = dim.std_hat().ok_or_else(|| {
                StatsError::config(format!(
                    "dimension '{}' has no std_hat for a statistical stackup",
                    dim.name()
                ))
            })?;
            total += std * std;
        }
        Ok(total.sqrt())
    }

    /// `draws` simulated stackup results, each Σ direction × draw
    pub fn monte_carlo<R: Rng + ?Sized>(&self, draws: usize, rng: &mut R) -> Result<Vec<f64>> {
        if draws == 0 {
            return Err(StatsError::config("Monte Carlo needs at least one draw"));
        }
        let samplers = self
            .dimensions
            .iter()
            .map(|dim| Ok((dim.direction() as f64, dim.sampler()?)))
            .collect::<Result<Vec<_>>>()?;

        let population: Vec<f64> = (0..draws)
            .map(|_| {
                samplers
                    .iter()
                    .map(|(k, sampler)| k * sampler.sample(rng))
                    .sum()
            })
            .collect();
        tracing::debug!(draws, stackup = %self.name, "Monte Carlo stackup complete");
        Ok(population)
    }

    /// Defect rate (dppm) of a Monte Carlo population against target limits
    pub fn defect_rate(population: &[f64], lsl: Option<f64>, usl: Option<f64>) -> Result<f64> {
        capability::defect_rate(population, lsl, usl)
    }

    /// Variance contribution of each dimension, in stackup order
    ///
    /// Uses (direction × std_hat)² when every dimension has a std_hat and
    /// (direction × half tolerance)² otherwise.
    pub fn sensitivity(&self) -> Vec<Contribution> {
        let use_std = self.dimensions.iter().all(|d| d.std_hat().is_some());
        let variances: Vec<f64> = self
            .dimensions
            .iter()
            .map(|dim| {
                let spread = if use_std {
                    dim.std_hat().unwrap_or_default()
                } else {
                    dim.half_tolerance()
                };
                (dim.direction() as f64 * spread).powi(2)
            })
            .collect();
        let total: f64 = variances.iter().sum();

        self.dimensions
            .iter()
            .zip(variances)
            .map(|(dim, v)| Contribution {
                name: dim.name().to_string(),
                percent: if total > 0.0 { v / total * 100.0 } else { 0.0 },
            })
            .collect()
    }

    /// Deterministic bounds: worst case, tolerance interval and σ-based spread
    pub fn compare(&self) -> Result<StackupBounds> {
        let ti = self.tolerance_interval_spread();
        let std = self.statistical_spread()?;
        Ok(StackupBounds {
            name: self.name.clone(),
            nominal: self.nominal,
            worst_case: self.worst_case(),
            tolerance_interval: Interval::around(self.nominal, ti),
            statistical: Interval::around(self.nominal, std),
            precision: 3,
        })
    }

    /// Full analysis including a Monte Carlo run
    pub fn report<R: Rng + ?Sized>(&self, options: &ReportOptions, rng: &mut R) -> Result<StackupReport> {
        let population = self.monte_carlo(options.draws, rng)?;
        self.summarize(&population, options)
    }

    /// Report for an already simulated population
    pub fn summarize(&self, population: &[f64], options: &ReportOptions) -> Result<StackupReport> {
        let mut bounds = self.compare()?;
        bounds.precision = options.precision;

        let limits = options.limits()?;
        let monte_carlo = MonteCarloSummary::from_samples(population, limits.as_ref())?;
        let defect_rate = match limits {
            Some(l) => Some(Self::defect_rate(population, l.lsl, l.usl)?),
            None => None,
        };

        Ok(StackupReport {
            bounds,
            monte_carlo,
            defect_rate,
        })
    }
}

/// Settings for [`Stackup::report`]
#[derive(Debug, Clone, PartialEq)]
pub struct ReportOptions {
    pub draws: usize,
    /// Target limits for the defect rate; neither means no defect rate
    pub lsl: Option<f64>,
    pub usl: Option<f64>,
    pub precision: usize,
}

impl Default for ReportOptions {
    fn default() -> Self {
        Self {
            draws: DEFAULT_DRAWS,
            lsl: None,
            usl: None,
            precision: 3,
        }
    }
}

impl ReportOptions {
    /// Target limits, `None` when neither is set
    pub fn limits(&self) -> Result<Option<SpecLimits>> {
        if self.lsl.is_none() && self.usl.is_none() {
            return Ok(None);
        }
        SpecLimits::new(self.lsl, self.usl).map(Some)
    }
}

/// Summary statistics of a Monte Carlo population
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonteCarloSummary {
    pub draws: usize,
    pub mean: f64,
    pub std: f64,
    pub min: f64,
    pub max: f64,
    pub percentile_2_5: f64,
    pub percentile_97_5: f64,
    /// Share of draws within the limits, when limits are given
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub yield_percent: Option<f64>,
}

impl MonteCarloSummary {
    pub fn from_samples(samples: &[f64], limits: Option<&SpecLimits>) -> Result<Self> {
        let sorted = stats::sorted_copy(samples)?;
        let n = sorted.len();
        let yield_percent = limits.map(|l| {
            sorted.iter().filter(|&&x| l.contains(x)).count() as f64 / n as f64 * 100.0
        });
        Ok(Self {
            draws: n,
            mean: stats::mean(&sorted)?,
            std: stats::population_std(&sorted)?,
            min: sorted[0],
            max: sorted[n - 1],
            percentile_2_5: stats::quantile_sorted(&sorted, 0.025)?,
            percentile_97_5: stats::quantile_sorted(&sorted, 0.975)?,
            yield_percent,
        })
    }
}

/// Deterministic stackup bounds
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackupBounds {
    pub name: String,
    pub nominal: f64,
    pub worst_case: Interval,
    pub tolerance_interval: Interval,
    pub statistical: Interval,
    #[serde(skip)]
    pub precision: usize,
}

impl fmt::Display for StackupBounds {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.precision;
        writeln!(f, "Stackup: {}", self.name)?;
        writeln!(f, "Nominal: {:.*}", p, self.nominal)?;
        writeln!(
            f,
            "Worst case - min: {:.*}, max: {:.*}",
            p, self.worst_case.min, p, self.worst_case.max
        )?;
        writeln!(
            f,
            "Statistical (tolerance interval) - min {:.*}, max {:.*}",
            p, self.tolerance_interval.min, p, self.tolerance_interval.max
        )?;
        write!(
            f,
            "Statistical (std) - min {:.*}, max {:.*}",
            p, self.statistical.min, p, self.statistical.max
        )
    }
}

/// Complete stackup report
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StackupReport {
    #[serde(flatten)]
    pub bounds: StackupBounds,
    pub monte_carlo: MonteCarloSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub defect_rate: Option<f64>,
}

impl StackupReport {
    /// Write the text report to any sink
    pub fn write_to<W: io::Write>(&self, out: &mut W) -> io::Result<()> {
        writeln!(out, "{}", self)
    }
}

impl fmt::Display for StackupReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let p = self.bounds.precision;
        writeln!(f, "{}", self.bounds)?;
        write!(
            f,
            "Monte Carlo ({} draws) - mean {:.*}, std {:.*}",
            self.monte_carlo.draws, p, self.monte_carlo.mean, p, self.monte_carlo.std
        )?;
        if let Some(dppm) = self.defect_rate {
            write!(f, "\nDefect rate: {:.*} dppm", p, dppm)?;
        }
        Ok(())
    }
}

/// Stackup description file
///
/// ```yaml
/// title: gap at the housing
/// lsl: 0.5
/// dimensions:
///   - { name: a, direction: 1, lsl: 5, usl: 10, ppk_min: 1.33 }
///   - { name: c, direction: -1, lsl: 9, usl: 11, distribution: uniform }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StackupDocument {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    /// Target limits of the stackup result
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub lsl: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usl: Option<f64>,
    pub dimensions: Vec<Dimension>,
}

impl StackupDocument {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yml::from_str(content)?)
    }

    pub fn to_yaml_string(&self) -> Result<String> {
        Ok(serde_yml::to_string(self)?)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    pub fn stackup(&self) -> Result<Stackup> {
        Stackup::new(self.dimensions.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::dimension::Distribution;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn gap_stackup() -> Stackup {
        Stackup::new(vec![
            Dimension::builder("a", 1, 5.0, 10.0).ppk_min(1.33).build().unwrap(),
            Dimension::builder("b", 1, 6.0, 12.0).ppk_min(1.0).build().unwrap(),
            Dimension::builder("c", -1, 9.0, 11.0).ppk_min(1.5).build().unwrap(),
        ])
        .unwrap()
    }

    #[test]
    fn test_stackup_creation() {
        let stackup = gap_stackup();
        assert_eq!(stackup.name(), "a + b - c");
        assert_eq!(stackup.len(), 3);
        assert!((stackup.nominal() - 6.5).abs() < 1e-12);
    }

    #[test]
    fn test_empty_stackup_rejected() {
        assert!(Stackup::new(Vec::new()).unwrap_err().is_configuration());
    }

    #[test]
    fn test_name_with_coefficients() {
        let stackup = Stackup::new(vec![
            Dimension::new("a", 2, 0.0, 1.0).unwrap(),
            Dimension::new("b", -3, 0.0, 1.0).unwrap(),
            Dimension::new("c", 1, 0.0, 1.0).unwrap(),
        ])
        .unwrap();
        assert_eq!(stackup.name(), "2*a - 3*b + c");
    }

    #[test]
    fn test_stackup_json_round_trip() {
        let stackup = Stackup::new(vec![
            Dimension::builder("a", 1, 5.0, 10.0).ppk_min(1.33).build().unwrap(),
            Dimension::builder("b", 1, 6.0, 12.0)
                .distribution(Distribution::GeneralizedNormal { beta: 3.0 })
                .std_hat(0.4)
                .build()
                .unwrap(),
            Dimension::builder("c", -2, 9.0, 11.0)
                .distribution(Distribution::Uniform)
                .build()
                .unwrap(),
        ])
        .unwrap();
        let json = serde_json::to_string(&stackup).unwrap();
        assert!(json.contains("\"name\":\"a + b - 2*c\""));
        let back: Stackup = serde_json::from_str(&json).unwrap();
        assert_eq!(back, stackup);
    }

    #[test]
    fn test_document_yaml_round_trip() {
        let doc = StackupDocument::from_yaml_str(
            "title: gap\nlsl: 0.5\ndimensions:\n  \
             - { name: a, direction: 1, lsl: 5, usl: 10, ppk: 1.33 }\n  \
             - { name: c, direction: -1, lsl: 9, usl: 11, distribution: equiprobable }\n  \
             - { name: g, direction: 1, lsl: 0, usl: 2, mean: 0.9, std: 0.2, beta: 1.2 }\n",
        )
        .unwrap();
        let yaml = doc.to_yaml_string().unwrap();
        assert!(!yaml.contains("usl: null"));
        let back = StackupDocument::from_yaml_str(&yaml).unwrap();
        assert_eq!(back, doc);
        assert_eq!(back.stackup().unwrap(), doc.stackup().unwrap());
    }

    #[test]
    fn test_worst_case_single() {
        let stackup = Stackup::new(vec![Dimension::new("a", 1, 5.0, 10.0).unwrap()]).unwrap();
        let wc = stackup.worst_case();
        assert_eq!(wc, Interval { min: 5.0, max: 10.0 });
        assert_eq!(stackup.nominal(), 7.5);
    }

    #[test]
    fn test_worst_case_signs() {
        let wc = gap_stackup().worst_case();
        assert_eq!(wc.min, 5.0 + 6.0 - 11.0);
        assert_eq!(wc.max, 10.0 + 12.0 - 9.0);
    }

    #[test]
    fn test_worst_case_with_multiplier() {
        let stackup = Stackup::new(vec![Dimension::new("a", -2, 1.0, 3.0).unwrap()]).unwrap();
        assert_eq!(stackup.worst_case(), Interval { min: -6.0, max: -2.0 });
        assert_eq!(stackup.nominal(), -4.0);
    }

    #[test]
    fn test_tolerance_interval_spread() {
        let ti = gap_stackup().tolerance_interval_spread();
        assert!((ti - 16.25f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn test_statistical_spread() {
        let s = gap_stackup().statistical_spread().unwrap();
        let expected = ((2.5f64 / 3.99).powi(2) + 1.0 + (1.0f64 / 4.5).powi(2)).sqrt();
        assert!((s - expected).abs() < 1e-12);

        let missing = Stackup::new(vec![Dimension::new("a", 1, 5.0, 10.0).unwrap()]).unwrap();
        assert!(missing.statistical_spread().unwrap_err().is_configuration());
    }

    #[test]
    fn test_monte_carlo_mean_near_nominal() {
        let stackup = gap_stackup();
        let mut rng = StdRng::seed_from_u64(2024);
        let draws = 100_000;
        let population = stackup.monte_carlo(draws, &mut rng).unwrap();
        assert_eq!(population.len(), draws);

        let mean = stats::mean(&population).unwrap();
        let std = stackup.statistical_spread().unwrap();
        let standard_error = std / (draws as f64).sqrt();
        assert!((mean - stackup.nominal()).abs() < 3.0 * standard_error);

        let sample_std = stats::population_std(&population).unwrap();
        assert!((sample_std - std).abs() < 0.02);
    }

    #[test]
    fn test_monte_carlo_seed_equality() {
        let stackup = gap_stackup();
        let a = stackup.monte_carlo(500, &mut StdRng::seed_from_u64(7)).unwrap();
        let b = stackup.monte_carlo(500, &mut StdRng::seed_from_u64(7)).unwrap();
        let c = stackup.monte_carlo(500, &mut StdRng::seed_from_u64(8)).unwrap();
        assert_eq!(a, b);
        assert_ne!(a, c);
    }

    #[test]
    fn test_monte_carlo_zero_draws() {
        let err = gap_stackup()
            .monte_carlo(0, &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_monte_carlo_uniform_bounded_by_worst_case() {
        let stackup = Stackup::new(vec![
            Dimension::builder("a", 1, 5.0, 10.0)
                .distribution(Distribution::Uniform)
                .build()
                .unwrap(),
            Dimension::builder("b", -1, 1.0, 2.0)
                .distribution(Distribution::Uniform)
                .build()
                .unwrap(),
        ])
        .unwrap();
        let wc = stackup.worst_case();
        let population = stackup.monte_carlo(5_000, &mut StdRng::seed_from_u64(1)).unwrap();
        assert!(population.iter().all(|&x| x >= wc.min && x <= wc.max));
    }

    #[test]
    fn test_defect_rate_requires_limits() {
        let err = Stackup::defect_rate(&[1.0, 2.0, 3.0], None, None).unwrap_err();
        assert!(err.is_configuration());
        let err = Stackup::defect_rate(&[1.0, 2.0, 3.0], Some(3.0), Some(1.0)).unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_sensitivity_with_std() {
        let contributions = gap_stackup().sensitivity();
        let total: f64 = contributions.iter().map(|c| c.percent).sum();
        assert!((total - 100.0).abs() < 1e-9);
        // b has the largest σ
        let max = contributions
            .iter()
            .max_by(|x, y| x.percent.total_cmp(&y.percent))
            .unwrap();
        assert_eq!(max.name, "b");
    }

    #[test]
    fn test_sensitivity_equal_tolerances() {
        let stackup = Stackup::new(vec![
            Dimension::new("a", 1, 0.0, 1.0).unwrap(),
            Dimension::new("b", -1, 5.0, 6.0).unwrap(),
        ])
        .unwrap();
        for c in stackup.sensitivity() {
            assert!((c.percent - 50.0).abs() < 1e-12);
        }
    }

    #[test]
    fn test_sensitivity_counts_multiplier() {
        // Same tolerance, direction 2 -> four times the variance
        let stackup = Stackup::new(vec![
            Dimension::new("a", 2, 0.0, 1.0).unwrap(),
            Dimension::new("b", 1, 0.0, 1.0).unwrap(),
        ])
        .unwrap();
        let s = stackup.sensitivity();
        assert!((s[0].percent - 80.0).abs() < 1e-12);
        assert!((s[1].percent - 20.0).abs() < 1e-12);
    }

    #[test]
    fn test_summary_percentiles() {
        let samples: Vec<f64> = (0..=1000).map(|i| i as f64 / 1000.0).collect();
        let limits = SpecLimits::two_sided(0.1, 0.9).unwrap();
        let summary = MonteCarloSummary::from_samples(&samples, Some(&limits)).unwrap();
        assert_eq!(summary.draws, 1001);
        assert!((summary.percentile_2_5 - 0.025).abs() < 1e-12);
        assert!((summary.percentile_97_5 - 0.975).abs() < 1e-12);
        assert_eq!(summary.min, 0.0);
        assert_eq!(summary.max, 1.0);
        assert!((summary.yield_percent.unwrap() - 801.0 / 1001.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_report_field_order() {
        let options = ReportOptions {
            draws: 2_000,
            lsl: Some(2.0),
            usl: Some(11.0),
            precision: 3,
        };
        let report = gap_stackup()
            .report(&options, &mut StdRng::seed_from_u64(5))
            .unwrap();
        let text = report.to_string();
        let order = [
            "Stackup: a + b - c",
            "Nominal: 6.500",
            "Worst case - min: 0.000, max: 13.000",
            "Statistical (tolerance interval)",
            "Statistical (std)",
            "Monte Carlo (2000 draws)",
            "Defect rate:",
        ];
        let mut last = 0;
        for needle in order {
            let pos = text.find(needle).unwrap_or_else(|| panic!("missing {}", needle));
            assert!(pos >= last, "{} out of order", needle);
            last = pos;
        }
        assert!(report.defect_rate.unwrap() > 0.0);
    }

    #[test]
    fn test_report_without_limits_has_no_defect_rate() {
        let options = ReportOptions {
            draws: 100,
            ..ReportOptions::default()
        };
        let report = gap_stackup()
            .report(&options, &mut StdRng::seed_from_u64(5))
            .unwrap();
        assert!(report.defect_rate.is_none());
        assert!(!report.to_string().contains("Defect rate"));
    }

    #[test]
    fn test_report_needs_std() {
        let stackup = Stackup::new(vec![Dimension::new("a", 1, 5.0, 10.0).unwrap()]).unwrap();
        let err = stackup
            .report(&ReportOptions::default(), &mut StdRng::seed_from_u64(0))
            .unwrap_err();
        assert!(err.is_configuration());
    }

    #[test]
    fn test_report_write_to() {
        let report = gap_stackup()
            .report(
                &ReportOptions {
                    draws: 100,
                    ..ReportOptions::default()
                },
                &mut StdRng::seed_from_u64(1),
            )
            .unwrap();
        let mut out = Vec::new();
        report.write_to(&mut out).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert!(text.starts_with("Stackup: a + b - c\n"));
        assert!(text.ends_with('\n'));
    }

    #[test]
    fn test_document_yaml() {
        let yaml = r#"
title: housing gap
usl: 12
dimensions:
  - { name: a, direction: 1, lsl: 5, usl: 10, ppk_min: 1.33 }
  - { name: b, direction: 1, lsl: 6, usl: 12, ppk: 1.0 }
  - { name: c, direction: -1, lsl: 9, usl: 11, distribution: equiprobable }
"#;
        let doc = StackupDocument::from_yaml_str(yaml).unwrap();
        assert_eq!(doc.title.as_deref(), Some("housing gap"));
        assert_eq!(doc.usl, Some(12.0));
        let stackup = doc.stackup().unwrap();
        assert_eq!(stackup.name(), "a + b - c");
        assert!(stackup.dimensions()[2].distribution().is_uniform());
    }

    #[test]
    fn test_document_rejects_invalid_dimension() {
        let yaml = "dimensions:\n  - { name: a, direction: 1, lsl: 10, usl: 5 }\n";
        assert!(StackupDocument::from_yaml_str(yaml).is_err());
    }
}
