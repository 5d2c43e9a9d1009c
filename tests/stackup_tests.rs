//! Stackup analysis tests - library scenarios and the text report

mod common;

use common::{gap_stackup, GAP_STACKUP_YAML};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tolstack::core::stats;
use tolstack::entities::stackup::ReportOptions;
use tolstack::entities::{Dimension, Distribution, Stackup, StackupDocument};

#[test]
fn test_compare_report_snapshot() {
    let text = gap_stackup().compare().unwrap().to_string();
    insta::assert_snapshot!("compare_report", text);
}

#[test]
fn test_worst_case_brackets_nominal() {
    let stackup = Stackup::new(vec![Dimension::new("a", 1, 5.0, 10.0).unwrap()]).unwrap();
    let wc = stackup.worst_case();
    assert_eq!((wc.min, wc.max), (5.0, 10.0));
    assert_eq!(stackup.nominal(), 7.5);
    assert!(wc.min <= stackup.nominal() && stackup.nominal() <= wc.max);
}

#[test]
fn test_equal_seeds_give_equal_populations() {
    let stackup = gap_stackup();
    let a = stackup.monte_carlo(1_000, &mut StdRng::seed_from_u64(2024)).unwrap();
    let b = stackup.monte_carlo(1_000, &mut StdRng::seed_from_u64(2024)).unwrap();
    let c = stackup.monte_carlo(1_000, &mut StdRng::seed_from_u64(2025)).unwrap();
    assert_eq!(a, b);
    assert_ne!(a, c);
}

#[test]
fn test_monte_carlo_mean_converges_to_nominal() {
    let stackup = gap_stackup();
    let draws = 100_000;
    let population = stackup.monte_carlo(draws, &mut StdRng::seed_from_u64(7)).unwrap();
    let mean = stats::mean(&population).unwrap();
    let std = stackup.statistical_spread().unwrap();
    let standard_error = std / (draws as f64).sqrt();
    assert!(
        (mean - stackup.nominal()).abs() < 3.0 * standard_error,
        "mean {} too far from {}",
        mean,
        stackup.nominal()
    );
}

#[test]
fn test_monte_carlo_spread_matches_rss() {
    let stackup = gap_stackup();
    let population = stackup.monte_carlo(50_000, &mut StdRng::seed_from_u64(99)).unwrap();
    let std = stats::population_std(&population).unwrap();
    let expected = stackup.statistical_spread().unwrap();
    assert!((std - expected).abs() / expected < 0.02);
}

#[test]
fn test_report_with_target_limits() {
    let stackup = gap_stackup();
    let options = ReportOptions {
        draws: 20_000,
        lsl: Some(3.0),
        usl: Some(10.0),
        ..ReportOptions::default()
    };
    let report = stackup.report(&options, &mut StdRng::seed_from_u64(1)).unwrap();
    let text = report.to_string();

    assert!(text.starts_with("Stackup: a + b - c\nNominal: 6.500\n"));
    assert!(text.contains("Monte Carlo (20000 draws) - mean "));
    assert!(text.contains("Defect rate: "));
    // Both targets sit 2.9σ from the mean: about 3600 dppm
    let dppm = report.defect_rate.unwrap();
    assert!(dppm > 100.0 && dppm < 10_000.0, "dppm = {}", dppm);
    let yield_percent = report.monte_carlo.yield_percent.unwrap();
    assert!(yield_percent > 99.0 && yield_percent <= 100.0);
}

#[test]
fn test_report_write_to_sink() {
    let stackup = gap_stackup();
    let report = stackup
        .report(&ReportOptions::default(), &mut StdRng::seed_from_u64(3))
        .unwrap();
    let mut out = Vec::new();
    report.write_to(&mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text.lines().count(), 6);
    assert!(!text.contains("Defect rate"));
    assert!(text.ends_with('\n'));
}

#[test]
fn test_document_round_trip_to_report() {
    let doc = StackupDocument::from_yaml_str(GAP_STACKUP_YAML).unwrap();
    assert_eq!(doc.title.as_deref(), Some("gap at the housing"));
    let stackup = doc.stackup().unwrap();
    assert_eq!(stackup, gap_stackup());
}

#[test]
fn test_document_rejects_bad_dimension() {
    let yaml = "dimensions:\n  - { name: a, direction: 0, lsl: 5, usl: 10 }\n";
    let err = StackupDocument::from_yaml_str(yaml).unwrap_err();
    assert!(err.to_string().contains("direction"));

    let yaml = "dimensions:\n  - { name: a, direction: 1, lsl: 10, usl: 5 }\n";
    assert!(StackupDocument::from_yaml_str(yaml).is_err());
}

#[test]
fn test_mixed_laws_stackup() {
    let stackup = Stackup::new(vec![
        Dimension::builder("housing", 1, 20.0, 20.4)
            .std_hat(0.05)
            .build()
            .unwrap(),
        Dimension::builder("spacer", -2, 4.9, 5.1)
            .distribution(Distribution::Uniform)
            .build()
            .unwrap(),
        Dimension::builder("clip", -1, 0.9, 1.1)
            .distribution(Distribution::GeneralizedNormal { beta: 8.0 })
            .std_hat(0.03)
            .build()
            .unwrap(),
    ])
    .unwrap();
    assert_eq!(stackup.name(), "housing - 2*spacer - clip");
    assert!((stackup.nominal() - (20.2 - 10.0 - 1.0)).abs() < 1e-12);

    let population = stackup.monte_carlo(10_000, &mut StdRng::seed_from_u64(5)).unwrap();
    let wc = stackup.worst_case();
    // 0.1 beyond the worst case is more than 4σ of the stackup
    let inside = population
        .iter()
        .filter(|&&x| x >= wc.min - 0.1 && x <= wc.max + 0.1)
        .count();
    assert!(inside as f64 / population.len() as f64 > 0.999);

    let contributions = stackup.sensitivity();
    let total: f64 = contributions.iter().map(|c| c.percent).sum();
    assert!((total - 100.0).abs() < 1e-9);
    assert_eq!(contributions[1].name, "spacer");
}

#[test]
fn test_statistical_needs_std() {
    let stackup = Stackup::new(vec![
        Dimension::new("a", 1, 5.0, 10.0).unwrap(),
        Dimension::builder("b", 1, 1.0, 2.0).std_hat(0.1).build().unwrap(),
    ])
    .unwrap();
    assert!(stackup.compare().unwrap_err().is_configuration());
    // Worst case and tolerance interval still work
    assert!((stackup.tolerance_interval_spread() - (6.25f64 + 0.25).sqrt()).abs() < 1e-12);
}
