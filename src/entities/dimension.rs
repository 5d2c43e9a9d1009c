//! Dimension entity - one toleranced quantity in a stackup
//!
//! A dimension is immutable once built: the builder validates the limits,
//! the direction and the spread inputs, then derives the standard deviation
//! from whichever input the distribution family allows.

use rand::Rng;
use rand_distr::{Distribution as _, Gamma, Normal};
use serde::{Deserialize, Serialize};
use statrs::function::gamma::ln_gamma;
use std::fmt;
use std::str::FromStr;

use crate::core::error::{Result, StatsError};

/// Statistical law a dimension is drawn from
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "law")]
pub enum Distribution {
    /// Normal (Gaussian) law around the estimated mean
    #[default]
    Normal,
    /// Equiprobable over [lsl, usl]
    Uniform,
    /// Generalized normal (type I) with shape β: 1 is Laplace, 2 is normal
    GeneralizedNormal { beta: f64 },
}

impl Distribution {
    /// Parse a law name; `beta` is required for the generalized normal law
    pub fn parse(name: &str, beta: Option<f64>) -> Result<Self> {
        let law = match name.parse::<Distribution>()? {
            Distribution::GeneralizedNormal { .. } => Distribution::GeneralizedNormal {
                beta: beta.ok_or_else(|| {
                    StatsError::config("generalized normal law needs a 'beta' shape parameter")
                })?,
            },
            other => {
                if beta.is_some() {
                    return Err(StatsError::config(format!(
                        "'beta' only applies to the generalized normal law, not {}",
                        other
                    )));
                }
                other
            }
        };
        law.validate()?;
        Ok(law)
    }

    pub fn validate(&self) -> Result<()> {
        if let Distribution::GeneralizedNormal { beta } = self {
            if !(*beta > 0.0) || !beta.is_finite() {
                return Err(StatsError::config(
                    "generalized normal shape 'beta' must be strictly positive",
                ));
            }
        }
        Ok(())
    }

    pub fn is_uniform(&self) -> bool {
        matches!(self, Distribution::Uniform)
    }

    /// Law name as written in a stackup file
    pub fn name(&self) -> &'static str {
        match self {
            Distribution::Normal => "normal",
            Distribution::Uniform => "uniform",
            Distribution::GeneralizedNormal { .. } => "gennorm",
        }
    }

    /// Shape parameter of the generalized normal law
    pub fn beta(&self) -> Option<f64> {
        match self {
            Distribution::GeneralizedNormal { beta } => Some(*beta),
            _ => None,
        }
    }
}

impl FromStr for Distribution {
    type Err = StatsError;

    /// Law name only; a generalized normal parsed this way has β = 2
    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "norm" | "normal" | "gaussian" => Ok(Distribution::Normal),
            "uniform" | "equiprobable" => Ok(Distribution::Uniform),
            "gennorm" | "generalized_normal" | "generalized-normal" => {
                Ok(Distribution::GeneralizedNormal { beta: 2.0 })
            }
            other => Err(StatsError::NotImplemented(format!(
                "'{}' distribution for dimensions",
                other
            ))),
        }
    }
}

impl fmt::Display for Distribution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Distribution::Normal => write!(f, "normal"),
            Distribution::Uniform => write!(f, "uniform"),
            Distribution::GeneralizedNormal { beta } => write!(f, "gennorm(beta={})", beta),
        }
    }
}

/// One toleranced dimension
///
/// Reads and writes the stackup file form ([`DimensionSpec`]), so derived
/// values are never serialized.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "DimensionSpec", into = "DimensionSpec")]
pub struct Dimension {
    name: String,
    direction: i32,
    lsl: f64,
    usl: f64,
    nominal: f64,
    distribution: Distribution,
    mean_hat: f64,
    std_hat: Option<f64>,
    ppk_min: Option<f64>,
}

impl Dimension {
    /// Start building a dimension; `direction` is a signed integer coefficient
    pub fn builder(name: impl Into<String>, direction: i32, lsl: f64, usl: f64) -> DimensionBuilder {
        DimensionBuilder {
            name: name.into(),
            direction,
            lsl,
            usl,
            distribution: Distribution::Normal,
            mean_hat: None,
            std_hat: None,
            ppk_min: None,
        }
    }

    /// Normal dimension without spread information
    pub fn new(name: impl Into<String>, direction: i32, lsl: f64, usl: f64) -> Result<Self> {
        Self::builder(name, direction, lsl, usl).build()
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn direction(&self) -> i32 {
        self.direction
    }

    pub fn lsl(&self) -> f64 {
        self.lsl
    }

    pub fn usl(&self) -> f64 {
        self.usl
    }

    /// Midpoint of the limits
    pub fn nominal(&self) -> f64 {
        self.nominal
    }

    pub fn distribution(&self) -> Distribution {
        self.distribution
    }

    pub fn mean_hat(&self) -> f64 {
        self.mean_hat
    }

    pub fn std_hat(&self) -> Option<f64> {
        self.std_hat
    }

    pub fn ppk_min(&self) -> Option<f64> {
        self.ppk_min
    }

    /// Half of the tolerance interval
    pub fn half_tolerance(&self) -> f64 {
        (self.usl - self.lsl) / 2.0
    }

    /// Prepare a reusable sampler for this dimension's law
    pub fn sampler(&self) -> Result<DimensionSampler> {
        let require_std = || {
            self.std_hat.ok_or_else(|| {
                StatsError::config(format!(
                    "dimension '{}' needs std_hat or ppk_min to be drawn from a {} law",
                    self.name, self.distribution
                ))
            })
        };
        match self.distribution {
            Distribution::Normal => {
                let law = Normal::new(self.mean_hat, require_std()?)
                    .map_err(|e| StatsError::config(format!("dimension '{}': {}", self.name, e)))?;
                Ok(DimensionSampler::Normal(law))
            }
            Distribution::Uniform => Ok(DimensionSampler::Uniform {
                low: self.lsl,
                high: self.usl,
            }),
            Distribution::GeneralizedNormal { beta } => {
                let std = require_std()?;
                let log_scale = gennorm_log_scale(std, beta).ok_or_else(|| {
                    StatsError::config(format!(
                        "dimension '{}': no finite generalized normal scale for beta = {}",
                        self.name, beta
                    ))
                })?;
                let shape = Gamma::new(1.0 / beta, 1.0)
                    .map_err(|e| StatsError::config(format!("dimension '{}': {}", self.name, e)))?;
                Ok(DimensionSampler::GeneralizedNormal {
                    location: self.mean_hat,
                    log_scale,
                    inv_beta: 1.0 / beta,
                    shape,
                })
            }
        }
    }

    /// One random draw from the fitted law
    pub fn draw_random<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<f64> {
        Ok(self.sampler()?.sample(rng))
    }

    /// Signed term used in a stackup name: `a`, `+ b`, `- c`, `- 2*d`, `+ 3*e`, `2*f`
    pub fn signed_label(&self, first: bool) -> String {
        let coef = match self.direction {
            d if d < -1 => format!("- {}*", d.unsigned_abs()),
            -1 => "- ".to_string(),
            1 if first => String::new(),
            1 => "+ ".to_string(),
            d if first => format!("{}*", d),
            d => format!("+ {}*", d),
        };
        format!("{}{}", coef, self.name)
    }
}

/// Natural log of the scale α of a generalized normal law with standard
/// deviation `std`
///
/// Var = α² Γ(3/β) / Γ(1/β). Γ(3/β) overflows once β drops below about
/// 0.0175, so everything stays in log space.
pub fn gennorm_log_scale(std: f64, beta: f64) -> Option<f64> {
    let log_ratio = ln_gamma(1.0 / beta) - ln_gamma(3.0 / beta);
    if !log_ratio.is_finite() {
        return None;
    }
    Some(std.ln() + 0.5 * log_ratio)
}

/// Sampler prepared once per dimension
#[derive(Debug, Clone)]
pub enum DimensionSampler {
    Normal(Normal<f64>),
    Uniform {
        low: f64,
        high: f64,
    },
    GeneralizedNormal {
        location: f64,
        log_scale: f64,
        inv_beta: f64,
        shape: Gamma<f64>,
    },
}

impl DimensionSampler {
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> f64 {
        match self {
            DimensionSampler::Normal(law) => law.sample(rng),
            DimensionSampler::Uniform { low, high } => rng.random_range(*low..=*high),
            DimensionSampler::GeneralizedNormal {
                location,
                log_scale,
                inv_beta,
                shape,
            } => {
                // |X − μ| / α follows Gamma(1/β)^(1/β); the sign is symmetric
                let magnitude = (log_scale + inv_beta * shape.sample(rng).ln()).exp();
                let sign = if rng.random::<bool>() { 1.0 } else { -1.0 };
                location + sign * magnitude
            }
        }
    }
}

/// Builder for [`Dimension`]
#[derive(Debug, Clone)]
pub struct DimensionBuilder {
    name: String,
    direction: i32,
    lsl: f64,
    usl: f64,
    distribution: Distribution,
    mean_hat: Option<f64>,
    std_hat: Option<f64>,
    ppk_min: Option<f64>,
}

impl DimensionBuilder {
    pub fn distribution(mut self, distribution: Distribution) -> Self {
        self.distribution = distribution;
        self
    }

    pub fn mean_hat(mut self, mean: f64) -> Self {
        self.mean_hat = Some(mean);
        self
    }

    pub fn std_hat(mut self, std: f64) -> Self {
        self.std_hat = Some(std);
        self
    }

    pub fn ppk_min(mut self, ppk: f64) -> Self {
        self.ppk_min = Some(ppk);
        self
    }

    /// Validate and derive the standard deviation
    pub fn build(self) -> Result<Dimension> {
        let name = self.name;
        let err = |msg: &str| StatsError::config(format!("dimension '{}': {}", name, msg));

        if self.direction == 0 {
            return Err(err("direction must be a non null signed integer"));
        }
        if !self.lsl.is_finite() || !self.usl.is_finite() {
            return Err(err("limits must be finite"));
        }
        if self.lsl >= self.usl {
            return Err(err("lsl must be strictly inferior to usl"));
        }
        self.distribution.validate()?;
        if self.std_hat.is_some() && self.ppk_min.is_some() {
            return Err(err("ppk_min and std_hat can't be set at the same time"));
        }
        if self.distribution.is_uniform() && (self.std_hat.is_some() || self.ppk_min.is_some()) {
            return Err(err("uniform law takes neither std_hat nor ppk_min"));
        }
        if let Some(std) = self.std_hat {
            if !(std >= 0.0) || !std.is_finite() {
                return Err(err("std_hat must be a finite non-negative value"));
            }
        }
        if let Some(ppk) = self.ppk_min {
            if !(ppk > 0.0) || !ppk.is_finite() {
                return Err(err("ppk_min must be strictly positive"));
            }
        }
        if let Some(mean) = self.mean_hat {
            if !mean.is_finite() {
                return Err(err("mean_hat must be finite"));
            }
        }

        let nominal = (self.lsl + self.usl) / 2.0;
        let mean_hat = self.mean_hat.unwrap_or(nominal);

        let std_hat = if self.distribution.is_uniform() {
            Some(((self.usl - self.lsl).powi(2) / 12.0).sqrt())
        } else if let Some(ppk) = self.ppk_min {
            if mean_hat <= self.lsl || mean_hat >= self.usl {
                return Err(err("mean_hat must lie strictly between lsl and usl to derive std from ppk_min"));
            }
            let nearest = (self.usl - mean_hat).min(mean_hat - self.lsl);
            Some(nearest / (3.0 * ppk))
        } else {
            self.std_hat
        };

        Ok(Dimension {
            name,
            direction: self.direction,
            lsl: self.lsl,
            usl: self.usl,
            nominal,
            distribution: self.distribution,
            mean_hat,
            std_hat,
            ppk_min: self.ppk_min,
        })
    }
}

/// Raw dimension as written in a stackup file
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DimensionSpec {
    pub name: String,
    pub direction: i32,
    pub lsl: f64,
    pub usl: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distribution: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub beta: Option<f64>,
    #[serde(default, alias = "mean", skip_serializing_if = "Option::is_none")]
    pub mean_hat: Option<f64>,
    #[serde(default, alias = "std", skip_serializing_if = "Option::is_none")]
    pub std_hat: Option<f64>,
    #[serde(default, alias = "ppk", skip_serializing_if = "Option::is_none")]
    pub ppk_min: Option<f64>,
}

impl From<Dimension> for DimensionSpec {
    /// Only the inputs are kept: a σ derived from ppk_min or from a
    /// uniform law is rebuilt on load
    fn from(dim: Dimension) -> Self {
        let std_hat = if dim.ppk_min.is_some() || dim.distribution.is_uniform() {
            None
        } else {
            dim.std_hat
        };
        Self {
            name: dim.name,
            direction: dim.direction,
            lsl: dim.lsl,
            usl: dim.usl,
            distribution: Some(dim.distribution.name().to_string()),
            beta: dim.distribution.beta(),
            mean_hat: Some(dim.mean_hat),
            std_hat,
            ppk_min: dim.ppk_min,
        }
    }
}

impl TryFrom<DimensionSpec> for Dimension {
    type Error = StatsError;

    fn try_from(spec: DimensionSpec) -> Result<Self> {
        let distribution = match spec.distribution.as_deref() {
            Some(name) => Distribution::parse(name, spec.beta)?,
            None if spec.beta.is_some() => Distribution::parse("gennorm", spec.beta)?,
            None => Distribution::Normal,
        };
        let mut builder = Dimension::builder(spec.name, spec.direction, spec.lsl, spec.usl)
            .distribution(distribution);
        if let Some(mean) = spec.mean_hat {
            builder = builder.mean_hat(mean);
        }
        if let Some(std) = spec.std_hat {
            builder = builder.std_hat(std);
        }
        if let Some(ppk) = spec.ppk_min {
            builder = builder.ppk_min(ppk);
        }
        builder.build()
    }
}
