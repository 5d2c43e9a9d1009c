//! Shared helper functions for CLI commands

use console::style;
use miette::{IntoDiagnostic, Result, WrapErr};
use rand::rngs::StdRng;
use rand::SeedableRng;
use std::fs::File;
use std::io::{self, Read};
use std::path::Path;

/// PRNG seeded from `seed`, or from the OS when absent
pub fn make_rng(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_rng(&mut rand::rng()),
    }
}

/// Open a data file; `-` reads stdin
pub fn open_input(path: &Path) -> Result<Box<dyn Read>> {
    if path.as_os_str() == "-" {
        return Ok(Box::new(io::stdin()));
    }
    let file = File::open(path)
        .into_diagnostic()
        .wrap_err_with(|| format!("cannot open {}", path.display()))?;
    Ok(Box::new(file))
}

/// Fixed-precision number
pub fn format_value(x: f64, precision: usize) -> String {
    format!("{:.*}", precision, x)
}

/// p-value with 4 decimals, tiny values shown as a bound
pub fn format_p_value(p: f64) -> String {
    if p < 1e-4 {
        "<0.0001".to_string()
    } else {
        format!("{:.4}", p)
    }
}

/// Green check or red cross
pub fn status_mark(ok: bool) -> String {
    if ok {
        style("✓").green().to_string()
    } else {
        style("✗").red().to_string()
    }
}

/// Plain yes/no for tables that may be piped
pub fn yes_no(ok: bool) -> &'static str {
    if ok {
        "yes"
    } else {
        "no"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::Rng;

    #[test]
    fn test_seeded_rng_is_reproducible() {
        let a: Vec<f64> = make_rng(Some(42)).random_iter().take(5).collect();
        let b: Vec<f64> = make_rng(Some(42)).random_iter().take(5).collect();
        assert_eq!(a, b);
    }

    #[test]
    fn test_format_p_value() {
        assert_eq!(format_p_value(0.0664), "0.0664");
        assert_eq!(format_p_value(1e-9), "<0.0001");
    }

    #[test]
    fn test_format_value() {
        assert_eq!(format_value(2.46887, 3), "2.469");
        assert_eq!(format_value(13.0, 1), "13.0");
    }

    #[test]
    fn test_missing_input_file() {
        assert!(open_input(Path::new("/nonexistent/data.csv")).is_err());
    }
}
