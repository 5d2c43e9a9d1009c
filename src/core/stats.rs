//! Descriptive statistics and the normal-law fit used by every estimator

use serde::{Deserialize, Serialize};
use statrs::distribution::{ContinuousCDF, Normal};
use statrs::function::erf;
use statrs::function::gamma::ln_gamma;

use crate::core::error::{Result, StatsError};

/// Standard normal cumulative distribution function Φ(z)
pub fn phi(z: f64) -> f64 {
    0.5 * erf::erfc(-z / std::f64::consts::SQRT_2)
}

/// Standard normal quantile Φ⁻¹(p), `p` in (0, 1)
pub fn inverse_phi(p: f64) -> f64 {
    -std::f64::consts::SQRT_2 * erf::erfc_inv(2.0 * p)
}

fn require_finite(data: &[f64], min_len: usize) -> Result<()> {
    if data.len() < min_len {
        return Err(StatsError::data(format!(
            "at least {} value(s) needed, got {}",
            min_len,
            data.len()
        )));
    }
    if data.iter().any(|v| !v.is_finite()) {
        return Err(StatsError::data("sample contains NaN or infinite values"));
    }
    Ok(())
}

/// Arithmetic mean
pub fn mean(data: &[f64]) -> Result<f64> {
    require_finite(data, 1)?;
    Ok(data.iter().sum::<f64>() / data.len() as f64)
}

/// Standard deviation with denominator `n - ddof`
pub fn std_dev(data: &[f64], ddof: usize) -> Result<f64> {
    require_finite(data, ddof + 1)?;
    let m = mean(data)?;
    let ss: f64 = data.iter().map(|x| (x - m).powi(2)).sum();
    Ok((ss / (data.len() - ddof) as f64).sqrt())
}

/// Maximum-likelihood (population, ddof = 0) standard deviation
pub fn population_std(data: &[f64]) -> Result<f64> {
    std_dev(data, 0)
}

/// Central moments m2, m3, m4 (denominator n)
fn central_moments(data: &[f64]) -> Result<(f64, f64, f64)> {
    let m = mean(data)?;
    let n = data.len() as f64;
    let (mut s2, mut s3, mut s4) = (0.0, 0.0, 0.0);
    for &x in data {
        let d = x - m;
        let d2 = d * d;
        s2 += d2;
        s3 += d2 * d;
        s4 += d2 * d2;
    }
    Ok((s2 / n, s3 / n, s4 / n))
}

/// Biased sample skewness g₁ = m₃ / m₂^{3/2}
pub fn skewness(data: &[f64]) -> Result<f64> {
    require_finite(data, 3)?;
    let (m2, m3, _) = central_moments(data)?;
    if m2 <= 0.0 {
        return Err(StatsError::data("zero variance"));
    }
    Ok(m3 / m2.powf(1.5))
}

/// Biased Pearson kurtosis b₂ = m₄ / m₂² (3 for a normal law)
pub fn kurtosis(data: &[f64]) -> Result<f64> {
    require_finite(data, 4)?;
    let (m2, _, m4) = central_moments(data)?;
    if m2 <= 0.0 {
        return Err(StatsError::data("zero variance"));
    }
    Ok(m4 / (m2 * m2))
}

/// Quantile on sorted data with linear interpolation (R-7)
pub fn quantile_sorted(sorted: &[f64], p: f64) -> Result<f64> {
    require_finite(sorted, 1)?;
    if !(0.0..=1.0).contains(&p) {
        return Err(StatsError::config(format!("quantile {} outside [0, 1]", p)));
    }
    let n = sorted.len();
    let h = (n - 1) as f64 * p;
    let j = h.floor() as usize;
    let g = h - h.floor();
    if j + 1 >= n {
        Ok(sorted[n - 1])
    } else {
        Ok((1.0 - g) * sorted[j] + g * sorted[j + 1])
    }
}

/// Quantile of unsorted data
pub fn quantile(data: &[f64], p: f64) -> Result<f64> {
    let sorted = sorted_copy(data)?;
    quantile_sorted(&sorted, p)
}

pub fn median(data: &[f64]) -> Result<f64> {
    quantile(data, 0.5)
}

/// Sorted copy; rejects NaN so the comparison is total
pub fn sorted_copy(data: &[f64]) -> Result<Vec<f64>> {
    require_finite(data, 1)?;
    let mut sorted = data.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));
    Ok(sorted)
}

/// `count` evenly spaced values from `start` to `end` inclusive
pub fn linspace(start: f64, end: f64, count: usize) -> Vec<f64> {
    match count {
        0 => Vec::new(),
        1 => vec![start],
        _ => {
            let step = (end - start) / (count - 1) as f64;
            (0..count).map(|i| start + step * i as f64).collect()
        }
    }
}

/// Normal law fitted by maximum likelihood
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct NormalFit {
    pub mean: f64,
    pub std: f64,
}

impl NormalFit {
    /// Fit a sample: mean and ddof = 0 standard deviation
    pub fn fit(data: &[f64]) -> Result<Self> {
        require_finite(data, 2)?;
        let fit = Self {
            mean: mean(data)?,
            std: population_std(data)?,
        };
        tracing::trace!(mean = fit.mean, std = fit.std, n = data.len(), "normal fit");
        Ok(fit)
    }

    fn law(&self) -> Result<Normal> {
        Normal::new(self.mean, self.std)
            .map_err(|e| StatsError::data(format!("cannot build normal law: {}", e)))
    }

    /// P(X ≤ x)
    pub fn cdf(&self, x: f64) -> Result<f64> {
        Ok(self.law()?.cdf(x))
    }

    /// P(X > x)
    pub fn sf(&self, x: f64) -> Result<f64> {
        Ok(self.law()?.sf(x))
    }

    /// Inverse CDF
    pub fn quantile(&self, p: f64) -> Result<f64> {
        if !(0.0..=1.0).contains(&p) {
            return Err(StatsError::config(format!("probability {} outside [0, 1]", p)));
        }
        Ok(self.law()?.inverse_cdf(p))
    }
}

/// Search range of the generalized normal shape; a sample flatter than
/// β = 50 is reported at the upper bound
const GENNORM_BETA_RANGE: (f64, f64) = (0.1, 50.0);

/// Minimize a unimodal function over [lo, hi] by golden-section search
fn golden_section_min<F: Fn(f64) -> f64>(f: F, mut lo: f64, mut hi: f64, iterations: usize) -> f64 {
    let ratio = (5f64.sqrt() - 1.0) / 2.0;
    let mut c = hi - ratio * (hi - lo);
    let mut d = lo + ratio * (hi - lo);
    let mut fc = f(c);
    let mut fd = f(d);
    for _ in 0..iterations {
        if fc < fd {
            hi = d;
            d = c;
            fd = fc;
            c = hi - ratio * (hi - lo);
            fc = f(c);
        } else {
            lo = c;
            c = d;
            fc = fd;
            d = lo + ratio * (hi - lo);
            fd = f(d);
        }
    }
    (lo + hi) / 2.0
}

/// Generalized normal (type I) law fitted by maximum likelihood
///
/// Density β / (2αΓ(1/β)) · exp(−(|x − loc| / α)^β). For a fixed β the
/// location minimizes Σ|x − loc|^β and the scale has the closed form
/// α = (β/n · Σ|x − loc|^β)^(1/β), so only β is searched, on the profile
/// log-likelihood.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GenNormFit {
    pub beta: f64,
    pub loc: f64,
    pub scale: f64,
    pub log_likelihood: f64,
}

impl GenNormFit {
    pub fn fit(data: &[f64]) -> Result<Self> {
        require_finite(data, 3)?;
        let lo = data.iter().copied().fold(f64::INFINITY, f64::min);
        let hi = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        if hi - lo <= 0.0 {
            return Err(StatsError::data("generalized normal fit needs a non constant sample"));
        }

        let (beta_lo, beta_hi) = GENNORM_BETA_RANGE;
        let log_beta = golden_section_min(
            |t| -Self::profile(data, t.exp(), lo, hi).log_likelihood,
            beta_lo.ln(),
            beta_hi.ln(),
            80,
        );
        let fit = Self::profile(data, log_beta.exp(), lo, hi);
        if !fit.log_likelihood.is_finite() || !(fit.scale > 0.0) {
            return Err(StatsError::data("generalized normal fit did not converge"));
        }
        tracing::trace!(beta = fit.beta, loc = fit.loc, scale = fit.scale, "gennorm fit");
        Ok(fit)
    }

    /// Best location and scale for a fixed shape
    fn profile(data: &[f64], beta: f64, lo: f64, hi: f64) -> Self {
        let spread = |loc: f64| data.iter().map(|x| (x - loc).abs().powf(beta)).sum::<f64>();
        let loc = golden_section_min(spread, lo, hi, 80);
        let n = data.len() as f64;
        let scale = (beta * spread(loc) / n).powf(1.0 / beta);
        let log_likelihood = if scale > 0.0 {
            n * (beta.ln() - std::f64::consts::LN_2 - ln_gamma(1.0 / beta) - scale.ln()) - n / beta
        } else {
            f64::NEG_INFINITY
        };
        Self {
            beta,
            loc,
            scale,
            log_likelihood,
        }
    }

    /// Standard deviation of the fitted law
    pub fn std(&self) -> f64 {
        self.scale * (0.5 * (ln_gamma(3.0 / self.beta) - ln_gamma(1.0 / self.beta))).exp()
    }

    pub fn pdf(&self, x: f64) -> f64 {
        let z = (x - self.loc).abs() / self.scale;
        let log_norm =
            self.beta.ln() - std::f64::consts::LN_2 - self.scale.ln() - ln_gamma(1.0 / self.beta);
        (log_norm - z.powf(self.beta)).exp()
    }
}
