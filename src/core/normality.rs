//! Normality test battery
//!
//! Four independent goodness-of-fit tests against a normal law:
//! Shapiro-Wilk, Anderson-Darling, Kolmogorov-Smirnov and the
//! D'Agostino-Pearson omnibus (skewness + kurtosis) test.
//! [`batch`] runs any subset of them over a single sample or over every
//! group of a [`GroupedSample`](crate::core::GroupedSample). A test whose size range excludes a sample
//! is skipped and listed in [`NormalityResults::skipped`].

use serde::ser::{SerializeMap, Serializer};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use u_analytics::{distribution, testing};

use crate::core::error::{Result, StatsError};
use crate::core::sample::Sample;
use crate::core::stats;

/// Law the data are tested against
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TargetLaw {
    /// Test the raw values
    #[default]
    Normal,
    /// Test the natural logarithm of the values (all must be > 0)
    LogNormal,
}

impl FromStr for TargetLaw {
    type Err = StatsError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "norm" | "normal" => Ok(TargetLaw::Normal),
            "lognorm" | "lognormal" => Ok(TargetLaw::LogNormal),
            other => Err(StatsError::NotImplemented(format!(
                "normality test against '{}' law",
                other
            ))),
        }
    }
}

impl fmt::Display for TargetLaw {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TargetLaw::Normal => write!(f, "normal"),
            TargetLaw::LogNormal => write!(f, "lognormal"),
        }
    }
}

impl TargetLaw {
    /// Validate a sample and map it into the space where normality is tested
    pub fn prepare(&self, data: &[f64]) -> Result<Vec<f64>> {
        if data.is_empty() {
            return Err(StatsError::data("non null data vector needed"));
        }
        match self {
            TargetLaw::Normal => Ok(data.to_vec()),
            TargetLaw::LogNormal => {
                if data.iter().any(|&x| !(x > 0.0)) {
                    return Err(StatsError::config(
                        "lognormal test needs strictly positive values",
                    ));
                }
                Ok(data.iter().map(|x| x.ln()).collect())
            }
        }
    }
}

/// One of the four tests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NormalityTest {
    #[serde(rename = "AD")]
    AndersonDarling,
    #[serde(rename = "kolmogorov")]
    KolmogorovSmirnov,
    #[serde(rename = "shapiro_wilk")]
    ShapiroWilk,
    #[serde(rename = "omnibus")]
    Omnibus,
}

impl NormalityTest {
    pub const ALL: [NormalityTest; 4] = [
        NormalityTest::AndersonDarling,
        NormalityTest::KolmogorovSmirnov,
        NormalityTest::ShapiroWilk,
        NormalityTest::Omnibus,
    ];

    /// Short key used in reports and serialized output
    pub fn key(&self) -> &'static str {
        match self {
            NormalityTest::AndersonDarling => "AD",
            NormalityTest::KolmogorovSmirnov => "kolmogorov",
            NormalityTest::ShapiroWilk => "shapiro_wilk",
            NormalityTest::Omnibus => "omnibus",
        }
    }

    /// Display name used in messages
    pub fn name(&self) -> &'static str {
        match self {
            NormalityTest::AndersonDarling => "Anderson-Darling",
            NormalityTest::KolmogorovSmirnov => "Kolmogorov-Smirnov",
            NormalityTest::ShapiroWilk => "Shapiro-Wilk",
            NormalityTest::Omnibus => "omnibus test",
        }
    }

    /// Smallest and largest sample size the test accepts
    pub fn size_range(&self) -> (usize, usize) {
        match self {
            NormalityTest::AndersonDarling => (8, usize::MAX),
            NormalityTest::KolmogorovSmirnov => (5, usize::MAX),
            NormalityTest::ShapiroWilk => (3, 5000),
            NormalityTest::Omnibus => (8, usize::MAX),
        }
    }

    /// True when a sample of `n` values is in range for this test
    pub fn applies_to(&self, n: usize) -> bool {
        let (min, max) = self.size_range();
        (min..=max).contains(&n)
    }

    /// Run this test on already-prepared data
    pub fn run(&self, data: &[f64]) -> Result<TestOutcome> {
        match self {
            NormalityTest::AndersonDarling => anderson_darling(data),
            NormalityTest::KolmogorovSmirnov => kolmogorov_smirnov(data),
            NormalityTest::ShapiroWilk => shapiro_wilk(data),
            NormalityTest::Omnibus => omnibus(data),
        }
    }
}

impl fmt::Display for NormalityTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.key())
    }
}

/// Which tests a batch runs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestSelection {
    pub anderson_darling: bool,
    pub kolmogorov_smirnov: bool,
    pub shapiro_wilk: bool,
    pub omnibus: bool,
}

impl Default for TestSelection {
    fn default() -> Self {
        Self {
            anderson_darling: true,
            kolmogorov_smirnov: true,
            shapiro_wilk: true,
            omnibus: true,
        }
    }
}

impl TestSelection {
    /// A selection with a single test enabled
    pub fn only(test: NormalityTest) -> Self {
        let mut selection = Self {
            anderson_darling: false,
            kolmogorov_smirnov: false,
            shapiro_wilk: false,
            omnibus: false,
        };
        match test {
            NormalityTest::AndersonDarling => selection.anderson_darling = true,
            NormalityTest::KolmogorovSmirnov => selection.kolmogorov_smirnov = true,
            NormalityTest::ShapiroWilk => selection.shapiro_wilk = true,
            NormalityTest::Omnibus => selection.omnibus = true,
        }
        selection
    }

    /// Anderson-Darling, Kolmogorov-Smirnov and Shapiro-Wilk
    pub fn classic() -> Self {
        Self {
            omnibus: false,
            ..Self::default()
        }
    }

    pub fn is_enabled(&self, test: NormalityTest) -> bool {
        match test {
            NormalityTest::AndersonDarling => self.anderson_darling,
            NormalityTest::KolmogorovSmirnov => self.kolmogorov_smirnov,
            NormalityTest::ShapiroWilk => self.shapiro_wilk,
            NormalityTest::Omnibus => self.omnibus,
        }
    }

    /// Enabled tests in canonical order
    pub fn enabled(&self) -> Vec<NormalityTest> {
        NormalityTest::ALL
            .into_iter()
            .filter(|t| self.is_enabled(*t))
            .collect()
    }

    pub fn validate(&self) -> Result<()> {
        if self.enabled().is_empty() {
            return Err(StatsError::config("at least one normality test needed"));
        }
        Ok(())
    }
}

/// Test statistic and p-value
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TestOutcome {
    pub statistic: f64,
    pub p_value: f64,
}

impl TestOutcome {
    /// True when normality is rejected at `alpha`
    pub fn rejects(&self, alpha: f64) -> bool {
        self.p_value < alpha
    }
}

/// Results of the enabled tests for one sample, in run order
///
/// Enabled tests whose sample-size range excludes the sample are listed as
/// skipped instead of failing the whole battery.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct NormalityResults {
    results: Vec<(NormalityTest, TestOutcome)>,
    skipped: Vec<NormalityTest>,
}

impl NormalityResults {
    pub fn get(&self, test: NormalityTest) -> Option<&TestOutcome> {
        self.results
            .iter()
            .find(|(t, _)| *t == test)
            .map(|(_, outcome)| outcome)
    }

    pub fn p_value(&self, test: NormalityTest) -> Option<f64> {
        self.get(test).map(|o| o.p_value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &(NormalityTest, TestOutcome)> {
        self.results.iter()
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    /// Enabled tests not applicable to the sample size
    pub fn skipped(&self) -> &[NormalityTest] {
        &self.skipped
    }

    /// Smallest p-value across the tests
    pub fn min_p_value(&self) -> Option<f64> {
        self.results
            .iter()
            .map(|(_, o)| o.p_value)
            .min_by(|a, b| a.total_cmp(b))
    }
}

impl Serialize for NormalityResults {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.results.len() + self.skipped.len()))?;
        for (test, outcome) in &self.results {
            map.serialize_entry(test.key(), outcome)?;
        }
        for test in &self.skipped {
            map.serialize_entry(test.key(), &None::<TestOutcome>)?;
        }
        map.end()
    }
}

/// Battery output, shaped like its input
#[derive(Debug, Clone, PartialEq)]
pub enum BatchOutcome {
    Single(NormalityResults),
    Grouped(Vec<(String, NormalityResults)>),
}

impl BatchOutcome {
    /// Results of one group by name
    pub fn group(&self, name: &str) -> Option<&NormalityResults> {
        match self {
            BatchOutcome::Single(_) => None,
            BatchOutcome::Grouped(groups) => {
                groups.iter().find(|(n, _)| n == name).map(|(_, r)| r)
            }
        }
    }

    /// Group names in input order (empty for a single sample)
    pub fn names(&self) -> Vec<&str> {
        match self {
            BatchOutcome::Single(_) => Vec::new(),
            BatchOutcome::Grouped(groups) => groups.iter().map(|(n, _)| n.as_str()).collect(),
        }
    }
}

impl Serialize for BatchOutcome {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        match self {
            BatchOutcome::Single(results) => results.serialize(serializer),
            BatchOutcome::Grouped(groups) => {
                let mut map = serializer.serialize_map(Some(groups.len()))?;
                for (name, results) in groups {
                    map.serialize_entry(name, results)?;
                }
                map.end()
            }
        }
    }
}

/// Run the selected tests on one sample
pub fn run_tests(
    data: &[f64],
    law: TargetLaw,
    selection: &TestSelection,
) -> Result<NormalityResults> {
    selection.validate()?;
    let prepared = law.prepare(data)?;
    let n = prepared.len();
    let mut results = Vec::new();
    let mut skipped = Vec::new();
    for test in selection.enabled() {
        if test.applies_to(n) {
            results.push((test, test.run(&prepared)?));
        } else {
            tracing::warn!(n, "{} skipped: sample size out of range", test.name());
            skipped.push(test);
        }
    }
    if results.is_empty() {
        return Err(StatsError::data(format!(
            "no selected normality test applies to {} values",
            n
        )));
    }
    Ok(NormalityResults { results, skipped })
}

/// Run the selected tests over a single sample or each group of a grouped sample
pub fn batch(sample: &Sample, law: TargetLaw, selection: &TestSelection) -> Result<BatchOutcome> {
    selection.validate()?;
    match sample {
        Sample::Single(values) => Ok(BatchOutcome::Single(run_tests(values, law, selection)?)),
        Sample::Grouped(groups) => {
            if groups.is_empty() {
                return Err(StatsError::data("no samples to test"));
            }
            let mut out = Vec::with_capacity(groups.len());
            for (name, values) in groups.iter() {
                let results = run_tests(values, law, selection)
                    .map_err(|e| prefix_error(name, e))?;
                tracing::debug!(group = name, "normality battery complete");
                out.push((name.to_string(), results));
            }
            Ok(BatchOutcome::Grouped(out))
        }
    }
}

fn prefix_error(name: &str, err: StatsError) -> StatsError {
    match err {
        StatsError::InsufficientData(msg) => {
            StatsError::InsufficientData(format!("sample '{}': {}", name, msg))
        }
        StatsError::Configuration(msg) => {
            StatsError::Configuration(format!("sample '{}': {}", name, msg))
        }
        other => other,
    }
}

// ---------------------------------------------------------------------------
// Anderson-Darling
// ---------------------------------------------------------------------------

/// Approximate p-value for an Anderson-Darling statistic
///
/// Piecewise exponential-polynomial in the statistic with four regimes.
pub fn anderson_darling_p_value(ad: f64) -> f64 {
    if ad >= 0.6 {
        (1.2937 - 5.709 * ad - 0.0186 * ad.powi(2)).exp()
    } else if ad >= 0.34 {
        (0.9177 - 4.279 * ad - 1.38 * ad.powi(2)).exp()
    } else if ad > 0.2 {
        1.0 - (-8.318 + 42.796 * ad - 59.938 * ad.powi(2)).exp()
    } else {
        1.0 - (-13.436 + 101.14 * ad - 223.73 * ad.powi(2)).exp()
    }
}

/// Anderson-Darling test against a normal law with estimated mean and
/// sample (ddof = 1) standard deviation (n ≥ 8)
///
/// The p-value is read from the uncorrected A² statistic.
pub fn anderson_darling(data: &[f64]) -> Result<TestOutcome> {
    let r = testing::anderson_darling_test(data)
        .ok_or_else(|| undefined(NormalityTest::AndersonDarling, data.len()))?;
    Ok(TestOutcome {
        statistic: r.statistic,
        p_value: anderson_darling_p_value(r.statistic).clamp(0.0, 1.0),
    })
}

// ---------------------------------------------------------------------------
// Kolmogorov-Smirnov
// ---------------------------------------------------------------------------

/// Kolmogorov-Smirnov test against the normal law fitted to the sample (n ≥ 5)
///
/// D = sup |Fₙ(x) − F(x)|; p-value from the Kolmogorov series with
/// Stephens' small-sample scaling of D.
pub fn kolmogorov_smirnov(data: &[f64]) -> Result<TestOutcome> {
    let (statistic, p_value) = distribution::ks_test_normal(data)
        .ok_or_else(|| undefined(NormalityTest::KolmogorovSmirnov, data.len()))?;
    Ok(TestOutcome { statistic, p_value })
}

// ---------------------------------------------------------------------------
// Shapiro-Wilk
// ---------------------------------------------------------------------------

/// Shapiro-Wilk W test (Royston, AS R94), valid for 3 ≤ n ≤ 5000
pub fn shapiro_wilk(data: &[f64]) -> Result<TestOutcome> {
    let r = testing::shapiro_wilk_test(data)
        .ok_or_else(|| undefined(NormalityTest::ShapiroWilk, data.len()))?;
    Ok(TestOutcome {
        statistic: r.w,
        p_value: r.p_value,
    })
}

/// Error for a test that cannot be computed on `n` values
fn undefined(test: NormalityTest, n: usize) -> StatsError {
    let (min, max) = test.size_range();
    if n < min && max == usize::MAX {
        StatsError::data(format!(
            "{} needs at least {} values, got {}",
            test.name(),
            min,
            n
        ))
    } else if n < min || n > max {
        StatsError::data(format!(
            "{} needs between {} and {} values, got {}",
            test.name(),
            min,
            max,
            n
        ))
    } else {
        StatsError::data(format!(
            "{} is undefined for this sample (zero variance or non-finite values)",
            test.name()
        ))
    }
}

// ---------------------------------------------------------------------------
// D'Agostino-Pearson omnibus
// ---------------------------------------------------------------------------

/// D'Agostino skewness z-score (n ≥ 8)
pub fn skewness_z(data: &[f64]) -> Result<f64> {
    let n = data.len();
    if n < 8 {
        return Err(StatsError::data(format!(
            "skewness test needs at least 8 values, got {}",
            n
        )));
    }
    let b2 = stats::skewness(data)?;
    let nf = n as f64;
    let y = b2 * ((nf + 1.0) * (nf + 3.0) / (6.0 * (nf - 2.0))).sqrt();
    let beta2 = 3.0 * (nf * nf + 27.0 * nf - 70.0) * (nf + 1.0) * (nf + 3.0)
        / ((nf - 2.0) * (nf + 5.0) * (nf + 7.0) * (nf + 9.0));
    let w2 = -1.0 + (2.0 * (beta2 - 1.0)).sqrt();
    let delta = 1.0 / (0.5 * w2.ln()).sqrt();
    let alpha = (2.0 / (w2 - 1.0)).sqrt();
    let y = if y == 0.0 { 1.0 } else { y };
    Ok(delta * (y / alpha + ((y / alpha).powi(2) + 1.0).sqrt()).ln())
}

/// Anscombe-Glynn kurtosis z-score (n ≥ 5, unreliable below 20)
pub fn kurtosis_z(data: &[f64]) -> Result<f64> {
    let n = data.len();
    if n < 5 {
        return Err(StatsError::data(format!(
            "kurtosis test needs at least 5 values, got {}",
            n
        )));
    }
    if n < 20 {
        tracing::warn!(n, "kurtosis test is only valid for n >= 20");
    }
    let b2 = stats::kurtosis(data)?;
    let nf = n as f64;
    let e = 3.0 * (nf - 1.0) / (nf + 1.0);
    let var_b2 = 24.0 * nf * (nf - 2.0) * (nf - 3.0)
        / ((nf + 1.0) * (nf + 1.0) * (nf + 3.0) * (nf + 5.0));
    let x = (b2 - e) / var_b2.sqrt();
    let sqrt_beta1 = 6.0 * (nf * nf - 5.0 * nf + 2.0) / ((nf + 7.0) * (nf + 9.0))
        * (6.0 * (nf + 3.0) * (nf + 5.0) / (nf * (nf - 2.0) * (nf - 3.0))).sqrt();
    let a = 6.0
        + 8.0 / sqrt_beta1 * (2.0 / sqrt_beta1 + (1.0 + 4.0 / (sqrt_beta1 * sqrt_beta1)).sqrt());
    let term1 = 1.0 - 2.0 / (9.0 * a);
    let denom = 1.0 + x * (2.0 / (a - 4.0)).sqrt();
    if denom == 0.0 {
        return Err(StatsError::data("kurtosis test is undefined for this sample"));
    }
    let term2 = denom.signum() * ((1.0 - 2.0 / a) / denom.abs()).cbrt();
    Ok((term1 - term2) / (2.0 / (9.0 * a)).sqrt())
}

/// Omnibus test K² = Z_skew² + Z_kurt², χ² with 2 degrees of freedom
pub fn omnibus(data: &[f64]) -> Result<TestOutcome> {
    let zs = skewness_z(data)?;
    let zk = kurtosis_z(data)?;
    let k2 = zs * zs + zk * zk;
    Ok(TestOutcome {
        statistic: k2,
        // χ²₂ survival function
        p_value: (-k2 / 2.0).exp(),
    })
}
