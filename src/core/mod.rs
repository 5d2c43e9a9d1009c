//! Core module - statistics engine, sample model and configuration

pub mod capability;
pub mod config;
pub mod error;
pub mod normality;
pub mod population;
pub mod probplot;
pub mod sample;
pub mod stats;
pub mod threshold;

pub use capability::{
    batch_capability, batch_capability_table, capability_from_sample, defect_rate,
    one_sided_capability, two_sided_capability, CapabilityEstimate, SpecLimits,
};
pub use config::Config;
pub use error::{Result, StatsError};
pub use normality::{
    batch, BatchOutcome, NormalityResults, NormalityTest, TargetLaw, TestOutcome, TestSelection,
};
pub use population::PopulationAnalysis;
pub use probplot::{probability_plot, HenryLine, ProbabilityPlot};
pub use sample::{GroupedSample, LongTable, Sample};
pub use stats::{GenNormFit, NormalFit};
pub use threshold::{
    capability_sweep, critical_std_curve, max_std_for_target, meets_target, SweepSettings,
    ThresholdCheck,
};
