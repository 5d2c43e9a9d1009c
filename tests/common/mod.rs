//! Shared test helpers for integration tests

#![allow(dead_code)]

use assert_cmd::cargo;
use assert_cmd::Command;
use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use tolstack::entities::{Dimension, Stackup};

/// Stackup file with three normal dimensions derived from ppk_min
pub const GAP_STACKUP_YAML: &str = "\
title: gap at the housing
dimensions:
  - { name: a, direction: 1, lsl: 5, usl: 10, ppk_min: 1.33 }
  - { name: b, direction: 1, lsl: 6, usl: 12, ppk_min: 1.0 }
  - { name: c, direction: -1, lsl: 9, usl: 11, ppk_min: 1.5 }
";

/// Helper to get a tolstack command
///
/// Runs with a clean environment so config overrides from the host never leak in.
pub fn tolstack() -> Command {
    let mut cmd = Command::new(cargo::cargo_bin!("tolstack"));
    cmd.env_remove("TOLSTACK_SEED")
        .env_remove("TOLSTACK_DRAWS")
        .env_remove("TOLSTACK_ALPHA")
        .env_remove("RUST_LOG");
    cmd
}

/// Write `content` to `name` inside a fresh temp directory
pub fn write_fixture(name: &str, content: &str) -> (TempDir, PathBuf) {
    let tmp = TempDir::new().unwrap();
    let path = tmp.path().join(name);
    fs::write(&path, content).unwrap();
    (tmp, path)
}

/// The three-dimension gap stackup written to a temp file
pub fn gap_stackup_file() -> (TempDir, PathBuf) {
    write_fixture("gap.yaml", GAP_STACKUP_YAML)
}

/// The same stackup built through the library
pub fn gap_stackup() -> Stackup {
    Stackup::new(vec![
        Dimension::builder("a", 1, 5.0, 10.0).ppk_min(1.33).build().unwrap(),
        Dimension::builder("b", 1, 6.0, 12.0).ppk_min(1.0).build().unwrap(),
        Dimension::builder("c", -1, 9.0, 11.0).ppk_min(1.5).build().unwrap(),
    ])
    .unwrap()
}

/// Deterministic, roughly bell-shaped values around `center`
///
/// Quantiles of a normal law at evenly spaced probabilities, so every
/// normality test accepts them.
pub fn normal_quantiles(center: f64, std: f64, n: usize) -> Vec<f64> {
    (1..=n)
        .map(|i| {
            let p = (i as f64 - 0.5) / n as f64;
            center + std * tolstack::core::stats::inverse_phi(p)
        })
        .collect()
}

/// Wide CSV with one column per named sample
pub fn wide_csv(columns: &[(&str, Vec<f64>)]) -> String {
    let mut out = columns
        .iter()
        .map(|(name, _)| *name)
        .collect::<Vec<_>>()
        .join(",");
    out.push('\n');
    let rows = columns.iter().map(|(_, v)| v.len()).max().unwrap_or(0);
    for i in 0..rows {
        let cells: Vec<String> = columns
            .iter()
            .map(|(_, v)| v.get(i).map(|x| x.to_string()).unwrap_or_default())
            .collect();
        out.push_str(&cells.join(","));
        out.push('\n');
    }
    out
}

/// Long CSV with `category,value` rows
pub fn long_csv(groups: &[(&str, Vec<f64>)]) -> String {
    let mut out = String::from("category,value\n");
    for (name, values) in groups {
        for v in values {
            out.push_str(&format!("{},{}\n", name, v));
        }
    }
    out
}
