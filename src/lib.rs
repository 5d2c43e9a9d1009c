//! tolstack: tolerance stackup and process capability analysis
//!
//! Worst-case, root-sum-square and Monte Carlo stackups of toleranced
//! dimensions, long-term capability (Ppk) estimation, a normality test
//! battery and helpers for multi-cavity populations.

pub mod cli;
pub mod core;
pub mod entities;
