//! Horizontal bar charts for daily series.

use fit_core::SeriesPoint;
use std::fmt::Write;

const FULL: char = '█';
const NEGATIVE: char = '░';

/// Render one row per point, bars scaled so the largest magnitude spans
/// `width` cells. Negative values use a lighter bar.
pub fn render(title: &str, unit: &str, points: &[SeriesPoint], width: usize) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{} ({})", title, unit);

    if points.is_empty() {
        let _ = writeln!(out, "  (no days in range)");
        return out;
    }

    let max = points
        .iter()
        .map(|p| p.value.abs())
        .fold(0.0_f64, f64::max);

    for point in points {
        let cells = if max > 0.0 {
            ((point.value.abs() / max) * width as f64).round() as usize
        } else {
            0
        };
        let fill = if point.value < 0.0 { NEGATIVE } else { FULL };
        let bar: String = std::iter::repeat(fill).take(cells).collect();
        let _ = writeln!(
            out,
            "{} │{:<width$} {}",
            point.date,
            bar,
            format_value(point.value),
            width = width
        );
    }

    let total: f64 = points.iter().fold(0.0, |acc, p| acc + p.value);
    let _ = writeln!(
        out,
        "{} days, total {} {}, max {} {}",
        points.len(),
        format_value(total),
        unit,
        format_value(max),
        unit
    );
    out
}

/// Whole numbers without decimals, everything else with two
pub fn format_value(value: f64) -> String {
    if value.fract() == 0.0 {
        format!("{:.0}", value)
    } else {
        format!("{:.2}", value)
    }
}
