//! Ppk-threshold solver
//!
//! Answers "does this sample meet the target Ppk?" and the inverse
//! "what is the largest σ that still meets it at a given mean?".

use rand::Rng;
use rand_distr::{Distribution, Normal};
use serde::{Deserialize, Serialize};

use crate::core::capability::{CapabilityEstimate, SpecLimits};
use crate::core::error::{Result, StatsError};
use crate::core::stats::linspace;

/// Outcome of a threshold check
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ThresholdCheck {
    pub meets: bool,
    pub ppk: f64,
}

fn require_positive_target(target_ppk: f64) -> Result<()> {
    if !(target_ppk > 0.0) || !target_ppk.is_finite() {
        return Err(StatsError::config(
            "target Ppk must be strictly superior to 0",
        ));
    }
    Ok(())
}

/// Fit a normal law to `sample` and compare its Ppk with `target_ppk`
pub fn meets_target(sample: &[f64], target_ppk: f64, limits: &SpecLimits) -> Result<ThresholdCheck> {
    require_positive_target(target_ppk)?;
    let estimate = CapabilityEstimate::from_sample(sample, limits)?;
    Ok(ThresholdCheck {
        meets: estimate.ppk >= target_ppk,
        ppk: estimate.ppk,
    })
}

/// Largest standard deviation meeting `target_ppk` at `mean`
///
/// The limit nearer to the mean side of the nominal is the binding one:
/// lsl when mean ≤ nominal, usl otherwise.
pub fn max_std_for_target(mean: f64, target_ppk: f64, lsl: f64, usl: f64) -> Result<f64> {
    require_positive_target(target_ppk)?;
    SpecLimits::two_sided(lsl, usl)?;
    let nominal = (lsl + usl) / 2.0;
    let binding = if mean <= nominal { lsl } else { usl };
    Ok((binding - mean).abs() / (3.0 * target_ppk))
}

/// One point of the critical σ curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CriticalPoint {
    pub mean: f64,
    pub max_std: f64,
}

/// Maximum σ over `points` evenly spaced means from lsl to usl
pub fn critical_std_curve(lsl: f64, usl: f64, target_ppk: f64, points: usize) -> Result<Vec<CriticalPoint>> {
    if points < 2 {
        return Err(StatsError::config("critical curve needs at least 2 points"));
    }
    linspace(lsl, usl, points)
        .into_iter()
        .map(|mean| {
            Ok(CriticalPoint {
                mean,
                max_std: max_std_for_target(mean, target_ppk, lsl, usl)?,
            })
        })
        .collect()
}

/// Uniform draw in [min, max)
pub fn uniform_between<R: Rng + ?Sized>(min: f64, max: f64, rng: &mut R) -> Result<f64> {
    if min > max {
        return Err(StatsError::config(
            "minimum must be strictly inferior to maximum",
        ));
    }
    Ok(min + rng.random::<f64>() * (max - min))
}

/// Search space for [`capability_sweep`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SweepSettings {
    pub mean_min: f64,
    pub mean_max: f64,
    pub std_min: f64,
    pub std_max: f64,
    /// Number of (mean, σ) pairs drawn
    pub draws: usize,
    /// Observations simulated per pair
    pub sample_size: usize,
}

impl SweepSettings {
    /// Means across the limits, σ from 0.1 up to a third of the tolerance
    pub fn across(limits: &SpecLimits, draws: usize) -> Result<Self> {
        let (Some(lsl), Some(usl)) = (limits.lsl, limits.usl) else {
            return Err(StatsError::config("sweep needs both LSL and USL"));
        };
        Ok(Self {
            mean_min: lsl,
            mean_max: usl,
            std_min: 0.1_f64.min((usl - lsl) / 3.0),
            std_max: (usl - lsl) / 3.0,
            draws,
            sample_size: 200,
        })
    }

    fn validate(&self) -> Result<()> {
        if self.mean_min > self.mean_max || self.std_min > self.std_max {
            return Err(StatsError::config(
                "minimum must be strictly inferior to maximum",
            ));
        }
        if !(self.std_min > 0.0) {
            return Err(StatsError::config("minimum σ must be strictly positive"));
        }
        if self.draws == 0 {
            return Err(StatsError::config("sweep needs at least one draw"));
        }
        if self.sample_size < 2 {
            return Err(StatsError::config("simulated samples need at least 2 values"));
        }
        Ok(())
    }
}

/// One simulated process in a sweep
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SweepPoint {
    pub mean: f64,
    pub std: f64,
    pub ppk: f64,
    pub meets: bool,
}

/// Monte Carlo exploration of the (mean, σ) plane
///
/// Each draw picks a mean and a σ uniformly in their ranges, simulates a
/// normal sample of `sample_size` values and records its fitted Ppk.
pub fn capability_sweep<R: Rng + ?Sized>(
    settings: &SweepSettings,
    limits: &SpecLimits,
    target_ppk: f64,
    rng: &mut R,
) -> Result<Vec<SweepPoint>> {
    settings.validate()?;
    require_positive_target(target_ppk)?;

    let mut points = Vec::with_capacity(settings.draws);
    for _ in 0..settings.draws {
        let mean = uniform_between(settings.mean_min, settings.mean_max, rng)?;
        let std = uniform_between(settings.std_min, settings.std_max, rng)?;
        let law = Normal::new(mean, std)
            .map_err(|e| StatsError::config(format!("invalid normal law: {}", e)))?;
        let sample: Vec<f64> = (0..settings.sample_size).map(|_| law.sample(rng)).collect();
        let check = meets_target(&sample, target_ppk, limits)?;
        points.push(SweepPoint {
            mean,
            std,
            ppk: check.ppk,
            meets: check.meets,
        });
    }
    tracing::debug!(draws = settings.draws, "capability sweep complete");
    Ok(points)
}
