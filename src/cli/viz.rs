//! Terminal visualization
//!
//! Histograms and range bars use block characters; the probability plot is
//! drawn with braille dots on a drawille canvas.

use console::style;
use drawille::Canvas;

use crate::core::capability::SpecLimits;
use crate::core::probplot::{ppf_transform, tick_label, ProbabilityPlot, PROBABILITY_TICKS};

const BAR_MAX_WIDTH: usize = 50;

/// Default canvas size for probability plots
pub const PLOT_WIDTH: u32 = 100;
pub const PLOT_HEIGHT: u32 = 48;

/// Histogram of Monte Carlo samples with optional target limit markers
///
/// Bins whose center lies outside the limits are drawn hatched in red.
pub fn render_histogram(samples: &[f64], bins: usize, limits: Option<&SpecLimits>) -> String {
    if samples.is_empty() || bins == 0 {
        return String::new();
    }

    let min = samples.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = samples.iter().cloned().fold(f64::NEG_INFINITY, f64::max);

    // Widen the view so both limits are visible
    let (mut range_min, mut range_max) = (min, max);
    if let Some(l) = limits {
        let margin = match (l.lsl, l.usl) {
            (Some(lsl), Some(usl)) => (usl - lsl) * 0.1,
            _ => (max - min) * 0.1,
        };
        if let Some(lsl) = l.lsl {
            range_min = range_min.min(lsl - margin);
        }
        if let Some(usl) = l.usl {
            range_max = range_max.max(usl + margin);
        }
    }
    let range = range_max - range_min;
    if range <= 0.0 {
        return String::new();
    }
    let bin_width = range / bins as f64;
    let bin_of = |x: f64| (((x - range_min) / bin_width) as usize).min(bins - 1);

    let mut counts = vec![0usize; bins];
    for &sample in samples {
        counts[bin_of(sample)] += 1;
    }
    let max_count = counts.iter().copied().max().unwrap_or(1).max(1);

    let lsl_bin = limits.and_then(|l| l.lsl).map(bin_of);
    let usl_bin = limits.and_then(|l| l.usl).map(bin_of);

    let mut lines = Vec::with_capacity(bins + 4);
    lines.push(format!(
        "   {} ({} samples, {} bins):",
        style("Distribution Histogram").bold(),
        samples.len(),
        bins
    ));
    lines.push(String::new());

    for (i, &count) in counts.iter().enumerate() {
        let bar_width = (count as f64 / max_count as f64 * BAR_MAX_WIDTH as f64) as usize;
        let bin_center = range_min + (i as f64 + 0.5) * bin_width;
        let in_spec = limits.map_or(true, |l| l.contains(bin_center));

        let bar = if in_spec {
            style("█".repeat(bar_width)).green()
        } else {
            style("░".repeat(bar_width)).red()
        };
        let marker = match (Some(i) == lsl_bin, Some(i) == usl_bin) {
            (true, true) => " ◄LSL/USL",
            (true, false) => " ◄LSL",
            (false, true) => " ◄USL",
            _ => "",
        };
        // Pad by char count, the bar is multi-byte
        let padding = " ".repeat(BAR_MAX_WIDTH - bar_width);

        lines.push(format!(
            "   {:>8.3} │{}{}│ {:>5}{}",
            bin_center,
            bar,
            padding,
            count,
            style(marker).cyan()
        ));
    }

    lines.push(format!("   {:>8} └{}┘", "", "─".repeat(BAR_MAX_WIDTH)));
    if let Some(l) = limits {
        let fmt_limit = |v: Option<f64>| v.map_or_else(|| "-".to_string(), |v| format!("{:.3}", v));
        lines.push(format!(
            "   {} LSL={}  USL={}  (█ in-spec, ░ out-of-spec)",
            style("Legend:").dim(),
            fmt_limit(l.lsl),
            fmt_limit(l.usl)
        ));
    }
    lines.join("\n")
}

/// One-line bar placing a [min, max] result range against two limits
pub fn render_range_bar(min: f64, max: f64, lower_limit: f64, upper_limit: f64) -> String {
    let bar_width = 60usize;
    let margin = (upper_limit - lower_limit) * 0.1;
    let view_min = lower_limit.min(min) - margin;
    let view_max = upper_limit.max(max) + margin;
    let view_range = view_max - view_min;
    if view_range <= 0.0 {
        return String::new();
    }

    let pos = |x: f64| (((x - view_min) / view_range * bar_width as f64) as usize).min(bar_width - 1);
    let (pos_lower, pos_upper) = (pos(lower_limit), pos(upper_limit));
    let (pos_min, pos_max) = (pos(min), pos(max));

    let mut bar = vec!['─'; bar_width];
    bar[pos_lower] = '│';
    bar[pos_upper] = '│';
    for cell in bar.iter_mut().take(pos_max + 1).skip(pos_min) {
        *cell = if *cell == '│' { '╋' } else { '═' };
    }
    bar[pos_min] = if bar[pos_min] == '╋' { '╟' } else { '[' };
    bar[pos_max] = if bar[pos_max] == '╋' { '╢' } else { ']' };

    format!(
        "  LSL={:.3}  USL={:.3}\n  {}\n  Min={:.4}  Max={:.4}",
        lower_limit,
        upper_limit,
        bar.into_iter().collect::<String>(),
        min,
        max
    )
}

/// Normal probability plot on a probit axis
///
/// Observations are dots, the fitted normal is a line. The vertical axis is
/// linear in z = Φ⁻¹(p), labelled at the standard probability ticks.
pub fn render_probability_plot(plot: &ProbabilityPlot, width: u32, height: u32) -> String {
    let x_min = plot.observed.first().copied().unwrap_or(0.0);
    let x_max = plot.observed.last().copied().unwrap_or(1.0);
    let x_span = (x_max - x_min).max(f64::EPSILON);

    let z_low = ppf_transform(PROBABILITY_TICKS[0]);
    let z_high = ppf_transform(PROBABILITY_TICKS[PROBABILITY_TICKS.len() - 1]);
    let z_span = z_high - z_low;

    let x_scale = (width - 1) as f64;
    let to_px = |x: f64| ((x - x_min) / x_span * x_scale).round().clamp(0.0, x_scale) as u32;
    let to_py = |p: f64| {
        let z = ppf_transform(p).clamp(z_low, z_high);
        ((z_high - z) / z_span * (height - 1) as f64).round() as u32
    };

    let mut canvas = Canvas::new(width, height);
    for (&x, &p) in plot.observed.iter().zip(&plot.observed_probability) {
        canvas.set(to_px(x), to_py(p));
    }
    for (segment_x, segment_p) in plot
        .theoretical_x
        .windows(2)
        .zip(plot.theoretical_probability.windows(2))
    {
        canvas.line(
            to_px(segment_x[0]),
            to_py(segment_p[0]),
            to_px(segment_x[1]),
            to_py(segment_p[1]),
        );
    }

    // Braille rows hold 4 pixels; label the row nearest each tick
    let frame = canvas.frame();
    let rows: Vec<&str> = frame.lines().collect();
    let mut labels = vec![String::new(); rows.len()];
    for &tick in PROBABILITY_TICKS.iter() {
        let row = (to_py(tick) / 4) as usize;
        if let Some(label) = labels.get_mut(row) {
            if label.is_empty() {
                *label = tick_label(tick);
            }
        }
    }

    let mut out = Vec::with_capacity(rows.len() + 2);
    out.push(format!(
        "{} (mean {:.4}, std {:.4})",
        style("Normal probability plot").bold(),
        plot.fit.mean,
        plot.fit.std
    ));
    for (row, label) in rows.iter().zip(&labels) {
        out.push(format!("{:>8} ┤{}", label, row));
    }
    out.push(format!("{:>8}  {:<w$.3}{:>.3}", "", x_min, x_max, w = (width / 2) as usize));
    out.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::normality::TestSelection;
    use crate::core::probplot::probability_plot;

    #[test]
    fn test_histogram_counts_all_samples() {
        let samples: Vec<f64> = (0..100).map(|i| i as f64 / 10.0).collect();
        let text = render_histogram(&samples, 10, None);
        let total: usize = text
            .lines()
            .filter(|l| l.contains('│'))
            .filter_map(|l| l.rsplit('│').next())
            .filter_map(|tail| tail.split_whitespace().next())
            .filter_map(|n| n.parse::<usize>().ok())
            .sum();
        assert_eq!(total, 100);
    }

    #[test]
    fn test_histogram_marks_limits() {
        let samples: Vec<f64> = (0..50).map(|i| 5.0 + i as f64 / 10.0).collect();
        let limits = SpecLimits::two_sided(6.0, 9.0).unwrap();
        let text = render_histogram(&samples, 20, Some(&limits));
        assert!(text.contains("◄LSL"));
        assert!(text.contains("◄USL"));
        assert!(text.contains("Legend:"));
    }

    #[test]
    fn test_histogram_empty() {
        assert!(render_histogram(&[], 10, None).is_empty());
    }

    #[test]
    fn test_range_bar() {
        let bar = render_range_bar(2.0, 8.0, 0.0, 10.0);
        assert!(bar.contains('['));
        assert!(bar.contains(']'));
        assert!(bar.contains("LSL=0.000"));
    }

    #[test]
    fn test_probability_plot_render() {
        let data = [9.8, 10.1, 10.0, 9.7, 10.4, 10.2, 9.9, 10.3, 10.0, 9.6];
        let plot = probability_plot(&data, &TestSelection::classic()).unwrap();
        let text = render_probability_plot(&plot, PLOT_WIDTH, PLOT_HEIGHT);
        assert!(text.contains("0.1 %"));
        assert!(text.contains("99.9 %"));
        assert!(text.contains("mean 10.0000"));
    }
}
