//! Multi-modal population utilities
//!
//! A part made in several cavities (or lots) is a mixture of normal
//! populations. These helpers generate such mixtures, check each group
//! for normality and equal variance, and compute per-group capability
//! with either a per-group or a pooled σ.

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use u_analytics::testing;

use crate::core::capability::{CapabilityEstimate, SpecLimits};
use crate::core::error::{Result, StatsError};
use crate::core::normality::{anderson_darling, TestOutcome};
use crate::core::sample::GroupedSample;
use crate::core::stats::{self, linspace};

fn normal_law(mean: f64, std: f64) -> Result<Normal<f64>> {
    Normal::new(mean, std).map_err(|e| StatsError::config(format!("invalid normal law: {}", e)))
}

/// `n_pops` normal populations of `n_vals` values with random means in [lsl, usl)
///
/// Each population has σ = (usl − lsl) / n_vals, scaled by a U[0, 1)
/// factor when `random_spread` is set. Groups are named "0", "1", ...
pub fn generate_populations<R: Rng + ?Sized>(
    lsl: f64,
    usl: f64,
    n_pops: usize,
    n_vals: usize,
    random_spread: bool,
    rng: &mut R,
) -> Result<GroupedSample> {
    SpecLimits::two_sided(lsl, usl)?;
    if n_pops == 0 || n_vals == 0 {
        return Err(StatsError::config(
            "population count and size must be at least 1",
        ));
    }

    let mut grouped = GroupedSample::new();
    for i in 0..n_pops {
        let mut std = (usl - lsl) / n_vals as f64;
        if random_spread {
            std *= rng.random::<f64>();
        }
        let mean = lsl + rng.random::<f64>() * (usl - lsl);
        let law = normal_law(mean, std)?;
        let values: Vec<f64> = (0..n_vals).map(|_| law.sample(rng)).collect();
        grouped.extend_group(i.to_string(), values);
    }
    tracing::debug!(n_pops, n_vals, "generated populations");
    Ok(grouped)
}

/// A single gaussian sample copied at `shift_count` evenly spaced offsets
/// from `x_min` to `x_max`
///
/// The result is a flat-topped population resembling a generalized normal
/// law with a large shape parameter. σ defaults to
/// (x_max − x_min) / sample_size.
pub fn generate_shifted_population<R: Rng + ?Sized>(
    x_min: f64,
    x_max: f64,
    std: Option<f64>,
    shift_count: usize,
    sample_size: usize,
    rng: &mut R,
) -> Result<Vec<f64>> {
    if x_min >= x_max {
        return Err(StatsError::config(
            "minimum must be strictly inferior to maximum",
        ));
    }
    if shift_count == 0 || sample_size == 0 {
        return Err(StatsError::config("shift count and sample size must be at least 1"));
    }
    let std = std.unwrap_or((x_max - x_min) / sample_size as f64);
    let law = normal_law(x_min, std)?;
    let base: Vec<f64> = (0..sample_size).map(|_| law.sample(rng)).collect();

    let mut out = Vec::with_capacity(shift_count * sample_size);
    for shift in linspace(0.0, x_max - x_min, shift_count) {
        out.extend(base.iter().map(|x| x + shift));
    }
    Ok(out)
}

/// Overall σ: arithmetic mean of the per-group population standard deviations
pub fn overall_std(grouped: &GroupedSample) -> Result<f64> {
    if grouped.is_empty() {
        return Err(StatsError::data("no groups"));
    }
    let mut total = 0.0;
    for (_, values) in grouped.iter() {
        total += stats::population_std(values)?;
    }
    Ok(total / grouped.len() as f64)
}

/// Anderson-Darling p-value per group, in group order
pub fn samples_normality(grouped: &GroupedSample) -> Result<Vec<(String, f64)>> {
    grouped
        .iter()
        .map(|(name, values)| {
            let outcome = anderson_darling(values)?;
            Ok((name.to_string(), outcome.p_value))
        })
        .collect()
}

/// True when any p-value falls below `alpha`
pub fn any_non_normal<I: IntoIterator<Item = f64>>(p_values: I, alpha: f64) -> bool {
    p_values.into_iter().any(|p| p < alpha)
}

/// Levene test for equal variances, centered on group medians (Brown-Forsythe)
///
/// One-way ANOVA on |x − median(group)|; the p-value comes from the
/// F(k − 1, N − k) distribution.
pub fn equal_variances(grouped: &GroupedSample) -> Result<TestOutcome> {
    if grouped.len() < 2 {
        return Err(StatsError::data("Levene test needs at least 2 groups"));
    }
    for (name, values) in grouped.iter() {
        if values.len() < 2 {
            return Err(StatsError::data(format!(
                "group '{}' needs at least 2 values",
                name
            )));
        }
    }

    let groups: Vec<&[f64]> = grouped.iter().map(|(_, values)| values).collect();
    let r = testing::levene_test(&groups).ok_or_else(|| {
        StatsError::data("Levene test is undefined: no spread within groups or non-finite values")
    })?;
    Ok(TestOutcome {
        statistic: r.statistic,
        p_value: r.p_value,
    })
}

/// Ppk per group
///
/// Without `pooled_std` every group gets its own normal fit; with it, the
/// group mean is combined with the shared σ.
pub fn group_capabilities(
    grouped: &GroupedSample,
    limits: &SpecLimits,
    pooled_std: Option<f64>,
) -> Result<Vec<(String, f64)>> {
    grouped
        .iter()
        .map(|(name, values)| {
            let estimate = match pooled_std {
                Some(std) => CapabilityEstimate::from_parameters(stats::mean(values)?, std, limits)?,
                None => CapabilityEstimate::from_sample(values, limits)?,
            };
            Ok((name.to_string(), estimate.ppk))
        })
        .collect()
}

/// Full multi-population review
#[derive(Debug, Clone, Serialize)]
pub struct PopulationAnalysis {
    pub overall_std: f64,
    pub normality: Vec<(String, f64)>,
    pub any_non_normal: bool,
    pub levene: TestOutcome,
    pub equal_variances: bool,
    pub capabilities: Vec<(String, f64)>,
    pub pooled_capabilities: Vec<(String, f64)>,
}

impl PopulationAnalysis {
    /// Run every check at significance `alpha`
    pub fn run(grouped: &GroupedSample, limits: &SpecLimits, alpha: f64) -> Result<Self> {
        let overall_std = overall_std(grouped)?;
        let normality = samples_normality(grouped)?;
        let non_normal = any_non_normal(normality.iter().map(|(_, p)| *p), alpha);
        if non_normal {
            tracing::warn!("at least one sample is not normal (alpha = {})", alpha);
        }
        let levene = equal_variances(grouped)?;
        let equal = !levene.rejects(alpha);
        if !equal {
            tracing::warn!(p = levene.p_value, "group variances differ");
        }

        Ok(Self {
            overall_std,
            any_non_normal: non_normal,
            normality,
            equal_variances: equal,
            levene,
            capabilities: group_capabilities(grouped, limits, None)?,
            pooled_capabilities: group_capabilities(grouped, limits, Some(overall_std))?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generate_populations_shape() {
        let mut rng = StdRng::seed_from_u64(11);
        let pops = generate_populations(25.0, 30.0, 16, 100, false, &mut rng).unwrap();
        assert_eq!(pops.len(), 16);
        let names: Vec<&str> = pops.names().collect();
        assert_eq!(names[0], "0");
        assert_eq!(names[15], "15");
        for (_, values) in pops.iter() {
            assert_eq!(values.len(), 100);
        }
    }

    #[test]
    fn test_generate_populations_validates() {
        let mut rng = StdRng::seed_from_u64(0);
        assert!(generate_populations(30.0, 25.0, 2, 10, true, &mut rng).is_err());
        assert!(generate_populations(25.0, 30.0, 0, 10, true, &mut rng).is_err());
    }

    #[test]
    fn test_shifted_population() {
        let mut rng = StdRng::seed_from_u64(5);
        let pop = generate_shifted_population(8.0, 12.0, None, 50, 200, &mut rng).unwrap();
        assert_eq!(pop.len(), 50 * 200);
        // Last copy is shifted by exactly the full interval
        assert!((pop[49 * 200] - pop[0] - 4.0).abs() < 1e-12);
        let mean = stats::mean(&pop).unwrap();
        assert!((mean - 10.0).abs() < 0.05);
    }

    #[test]
    fn test_overall_std() {
        let mut g = GroupedSample::new();
        g.extend_group("a", [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0]); // σ = 2
        g.extend_group("b", [1.0, 3.0]); // σ = 1
        assert!((overall_std(&g).unwrap() - 1.5).abs() < 1e-12);
    }

    #[test]
    fn test_any_non_normal() {
        assert!(!any_non_normal([0.2, 0.5, 0.06], 0.05));
        assert!(any_non_normal([0.2, 0.01], 0.05));
        assert!(!any_non_normal(std::iter::empty(), 0.05));
    }

    #[test]
    fn test_levene_known_value() {
        // medians 2 and 20; deviations [1,0,1] and [10,0,10]
        let mut g = GroupedSample::new();
        g.extend_group("a", [1.0, 2.0, 3.0]);
        g.extend_group("b", [10.0, 20.0, 30.0]);
        let r = equal_variances(&g).unwrap();
        // group means 2/3 and 20/3, grand 11/3
        // between = 3·(3² + 3²) = 54; within = 2/3 + 200/3 = 202/3
        let expected = 54.0 / (202.0 / 3.0 / 4.0);
        assert!((r.statistic - expected).abs() < 1e-9);
        // F(1, 4) = 3.21 -> p ≈ 0.15
        assert!(r.p_value > 0.1 && r.p_value < 0.2);
    }

    #[test]
    fn test_levene_needs_two_groups() {
        let mut g = GroupedSample::new();
        g.extend_group("a", [1.0, 2.0, 3.0]);
        assert!(matches!(equal_variances(&g), Err(StatsError::InsufficientData(_))));
    }

    #[test]
    fn test_group_capabilities_pooled() {
        let mut g = GroupedSample::new();
        g.extend_group("a", [9.0, 10.0, 11.0]);
        g.extend_group("b", [11.0, 12.0, 13.0]);
        let limits = SpecLimits::two_sided(4.0, 16.0).unwrap();
        let pooled = group_capabilities(&g, &limits, Some(1.0)).unwrap();
        assert!((pooled[0].1 - 2.0).abs() < 1e-12);
        assert!((pooled[1].1 - 4.0 / 3.0).abs() < 1e-12);

        let own = group_capabilities(&g, &limits, None).unwrap();
        assert_eq!(own.len(), 2);
        assert!(own[0].1 > pooled[0].1);
    }

    #[test]
    fn test_population_analysis() {
        let mut rng = StdRng::seed_from_u64(21);
        let pops = generate_populations(25.0, 30.0, 4, 100, false, &mut rng).unwrap();
        let limits = SpecLimits::two_sided(25.0, 30.0).unwrap();
        let analysis = PopulationAnalysis::run(&pops, &limits, 0.05).unwrap();
        assert_eq!(analysis.normality.len(), 4);
        assert_eq!(analysis.capabilities.len(), 4);
        assert!((analysis.overall_std - 0.05).abs() < 0.01);
    }
}
