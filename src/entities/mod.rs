//! Entity type definitions

pub mod dimension;
pub mod stackup;

pub use dimension::{Dimension, DimensionBuilder, Distribution};
pub use stackup::{MonteCarloSummary, ReportOptions, Stackup, StackupDocument, StackupReport};
