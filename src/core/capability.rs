//! Long-term process capability (Ppk)
//!
//! Ppk compares the distance between the process mean and the nearer
//! specification limit with three standard deviations of a normal fit.

use serde::{Deserialize, Serialize};

use crate::core::error::{Result, StatsError};
use crate::core::sample::{GroupedSample, LongTable};
use crate::core::stats::{phi, NormalFit};

/// Default sigma multiple (half of the 6σ process spread)
pub const SIGMA_MULTIPLE: f64 = 3.0;

/// Lower and/or upper specification limit
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpecLimits {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lsl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usl: Option<f64>,
}

impl SpecLimits {
    /// At least one limit; when both are present lsl < usl
    pub fn new(lsl: Option<f64>, usl: Option<f64>) -> Result<Self> {
        if lsl.is_none() && usl.is_none() {
            return Err(StatsError::config("LSL and / or USL needed"));
        }
        if lsl.into_iter().chain(usl).any(|l| !l.is_finite()) {
            return Err(StatsError::config("specification limits must be finite"));
        }
        if let (Some(l), Some(u)) = (lsl, usl) {
            if l >= u {
                return Err(StatsError::config("LSL must be strictly inferior to USL"));
            }
        }
        Ok(Self { lsl, usl })
    }

    pub fn two_sided(lsl: f64, usl: f64) -> Result<Self> {
        Self::new(Some(lsl), Some(usl))
    }

    /// Midpoint of a two-sided interval
    pub fn nominal(&self) -> Option<f64> {
        match (self.lsl, self.usl) {
            (Some(l), Some(u)) => Some((l + u) / 2.0),
            _ => None,
        }
    }

    pub fn contains(&self, x: f64) -> bool {
        self.lsl.map_or(true, |l| x >= l) && self.usl.map_or(true, |u| x <= u)
    }
}

/// Capability against a single limit: |mean − limit| / (k·std)
pub fn one_sided_capability(mean: f64, std: f64, limit: f64, sigma_multiple: f64) -> Result<f64> {
    if !(std > 0.0) {
        return Err(StatsError::data("standard deviation must be strictly positive"));
    }
    if !(sigma_multiple > 0.0) {
        return Err(StatsError::config("sigma multiple must be strictly positive"));
    }
    Ok((mean - limit).abs() / (sigma_multiple * std))
}

/// Ppk for a two-sided interval: the smaller one-sided capability
pub fn two_sided_capability(mean: f64, std: f64, lsl: f64, usl: f64) -> Result<f64> {
    let ppl = one_sided_capability(mean, std, lsl, SIGMA_MULTIPLE)?;
    let ppu = one_sided_capability(mean, std, usl, SIGMA_MULTIPLE)?;
    Ok(ppl.min(ppu))
}

/// Capability of a fitted normal law against a set of limits
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CapabilityEstimate {
    pub mean: f64,
    pub std: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppl: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ppu: Option<f64>,
    pub ppk: f64,
}

impl CapabilityEstimate {
    /// Capability of a normal law with known parameters
    pub fn from_parameters(mean: f64, std: f64, limits: &SpecLimits) -> Result<Self> {
        Self::with_sigma_multiple(mean, std, limits, SIGMA_MULTIPLE)
    }

    /// Same as [`from_parameters`](Self::from_parameters) with a custom sigma multiple
    pub fn with_sigma_multiple(mean: f64, std: f64, limits: &SpecLimits, k: f64) -> Result<Self> {
        let ppl = limits
            .lsl
            .map(|l| one_sided_capability(mean, std, l, k))
            .transpose()?;
        let ppu = limits
            .usl
            .map(|u| one_sided_capability(mean, std, u, k))
            .transpose()?;
        let ppk = match (ppl, ppu) {
            (Some(l), Some(u)) => l.min(u),
            (Some(v), None) | (None, Some(v)) => v,
            (None, None) => return Err(StatsError::config("LSL and / or USL needed")),
        };
        Ok(Self {
            mean,
            std,
            ppl,
            ppu,
            ppk,
        })
    }

    /// Fit a normal law (MLE) to the sample, then compute capability
    pub fn from_sample(sample: &[f64], limits: &SpecLimits) -> Result<Self> {
        Self::fit_sample(sample, limits, SIGMA_MULTIPLE)
    }

    /// Normal fit plus capability at sigma multiple `k`
    pub fn fit_sample(sample: &[f64], limits: &SpecLimits, k: f64) -> Result<Self> {
        let fit = NormalFit::fit(sample)?;
        if fit.std <= 0.0 {
            return Err(StatsError::data("zero variance sample"));
        }
        Self::with_sigma_multiple(fit.mean, fit.std, limits, k)
    }

    /// Expected out-of-spec fraction in parts per million
    pub fn expected_dppm(&self, limits: &SpecLimits) -> f64 {
        let below = limits.lsl.map_or(0.0, |l| phi((l - self.mean) / self.std));
        let above = limits.usl.map_or(0.0, |u| phi((self.mean - u) / self.std));
        (below + above) * 1e6
    }
}

/// Ppk of a sample from a normal MLE fit
pub fn capability_from_sample(sample: &[f64], lsl: Option<f64>, usl: Option<f64>) -> Result<f64> {
    let limits = SpecLimits::new(lsl, usl)?;
    Ok(CapabilityEstimate::from_sample(sample, &limits)?.ppk)
}

/// Per-group capability, groups in input order
pub fn batch_capability(
    grouped: &GroupedSample,
    limits: &SpecLimits,
) -> Result<Vec<(String, CapabilityEstimate)>> {
    if grouped.is_empty() {
        return Err(StatsError::data("no groups to estimate"));
    }
    grouped
        .iter()
        .map(|(name, values)| {
            let estimate = CapabilityEstimate::from_sample(values, limits).map_err(|e| match e {
                StatsError::InsufficientData(msg) => {
                    StatsError::InsufficientData(format!("category '{}': {}", name, msg))
                }
                other => other,
            })?;
            tracing::debug!(category = name, ppk = estimate.ppk, "capability estimated");
            Ok((name.to_string(), estimate))
        })
        .collect()
}

/// Per-category capability of a long-form table
pub fn batch_capability_table(
    table: &LongTable,
    category_key: &str,
    value_key: &str,
    limits: &SpecLimits,
) -> Result<Vec<(String, CapabilityEstimate)>> {
    let grouped = table.group_by(category_key, value_key)?;
    batch_capability(&grouped, limits)
}

/// Defect rate of a population in parts per million
///
/// The population is fitted with a normal law; the mass below `lsl` and
/// above `usl` is summed.
pub fn defect_rate(population: &[f64], lsl: Option<f64>, usl: Option<f64>) -> Result<f64> {
    let limits = SpecLimits::new(lsl, usl)?;
    let fit = NormalFit::fit(population)?;
    let below = match limits.lsl {
        Some(l) => fit.cdf(l)?,
        None => 0.0,
    };
    let above = match limits.usl {
        Some(u) => fit.sf(u)?,
        None => 0.0,
    };
    Ok((below + above) * 1e6)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_one_sided() {
        let ppu = one_sided_capability(10.0, 1.0, 14.0, 3.0).unwrap();
        assert!((ppu - 4.0 / 3.0).abs() < 1e-12);
        // Distance is absolute
        let ppl = one_sided_capability(10.0, 1.0, 6.0, 3.0).unwrap();
        assert!((ppl - 4.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn test_two_sided_is_minimum() {
        let ppk = two_sided_capability(10.0, 1.0, 6.0, 14.0).unwrap();
        assert!((ppk - 4.0 / 3.0).abs() < 1e-12);

        let ppk = two_sided_capability(12.0, 1.0, 6.0, 14.0).unwrap();
        assert!((ppk - 2.0 / 3.0).abs() < 1e-12);
        assert!(ppk <= one_sided_capability(12.0, 1.0, 6.0, 3.0).unwrap());
    }

    #[test]
    fn test_zero_std_rejected() {
        assert!(matches!(
            one_sided_capability(1.0, 0.0, 2.0, 3.0),
            Err(StatsError::InsufficientData(_))
        ));
    }

    #[test]
    fn test_spec_limits_validation() {
        assert!(SpecLimits::new(None, None).unwrap_err().is_configuration());
        assert!(SpecLimits::new(Some(10.0), Some(5.0)).unwrap_err().is_configuration());
        assert!(SpecLimits::new(Some(5.0), Some(5.0)).unwrap_err().is_configuration());
        assert!(SpecLimits::new(Some(f64::NAN), None).unwrap_err().is_configuration());
        let limits = SpecLimits::new(Some(4.0), None).unwrap();
        assert!(limits.contains(100.0));
        assert!(!limits.contains(3.0));
        assert_eq!(limits.nominal(), None);
    }

    #[test]
    fn test_capability_from_sample() {
        // mean 5, population std 2
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let ppk = capability_from_sample(&data, Some(-1.0), Some(17.0)).unwrap();
        assert!((ppk - 1.0).abs() < 1e-12);

        let upper_only = capability_from_sample(&data, None, Some(11.0)).unwrap();
        assert!((upper_only - 1.0).abs() < 1e-12);

        assert!(capability_from_sample(&data, None, None)
            .unwrap_err()
            .is_configuration());
    }

    #[test]
    fn test_estimate_fields() {
        let limits = SpecLimits::two_sided(6.0, 14.0).unwrap();
        let est = CapabilityEstimate::from_parameters(12.0, 1.0, &limits).unwrap();
        assert!((est.ppl.unwrap() - 2.0).abs() < 1e-12);
        assert!((est.ppu.unwrap() - 2.0 / 3.0).abs() < 1e-12);
        assert_eq!(est.ppk, est.ppu.unwrap());
        // 2σ above: 1 − Φ(2) ≈ 22750 ppm
        assert!((est.expected_dppm(&limits) - 22_750.13).abs() < 1.0);
    }

    #[test]
    fn test_custom_sigma_multiple() {
        let limits = SpecLimits::new(None, Some(14.0)).unwrap();
        let est = CapabilityEstimate::with_sigma_multiple(10.0, 1.0, &limits, 4.0).unwrap();
        assert!((est.ppk - 1.0).abs() < 1e-12);
        assert!(est.ppl.is_none());
        assert!(CapabilityEstimate::with_sigma_multiple(10.0, 1.0, &limits, 0.0).is_err());
    }

    #[test]
    fn test_batch_capability_order() {
        let mut grouped = GroupedSample::new();
        grouped.extend_group("z", [9.0, 10.0, 11.0]);
        grouped.extend_group("a", [9.5, 10.0, 10.5]);
        let limits = SpecLimits::two_sided(4.0, 16.0).unwrap();
        let out = batch_capability(&grouped, &limits).unwrap();
        assert_eq!(out[0].0, "z");
        assert_eq!(out[1].0, "a");
        assert!(out[1].1.ppk > out[0].1.ppk);
    }

    #[test]
    fn test_batch_capability_table() {
        let csv = "cavity,value\nA,9\nB,10\nA,11\nB,10.5\nA,10\nB,9.5\n";
        let table = LongTable::from_csv(csv.as_bytes()).unwrap();
        let limits = SpecLimits::two_sided(4.0, 16.0).unwrap();
        let out = batch_capability_table(&table, "cavity", "value", &limits).unwrap();
        let names: Vec<&str> = out.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["A", "B"]);
    }

    #[test]
    fn test_defect_rate_tails() {
        // mean 5, std 2: lsl at −1σ, usl at +2σ
        let data = [2.0, 4.0, 4.0, 4.0, 5.0, 5.0, 7.0, 9.0];
        let dppm = defect_rate(&data, Some(3.0), Some(9.0)).unwrap();
        let expected = (phi(-1.0) + phi(-2.0)) * 1e6;
        assert!((dppm - expected).abs() < 1e-3);

        let lower_only = defect_rate(&data, Some(3.0), None).unwrap();
        assert!((lower_only - phi(-1.0) * 1e6).abs() < 1e-3);

        assert!(defect_rate(&data, None, None).unwrap_err().is_configuration());
    }
}
