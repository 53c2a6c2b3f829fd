//! Display formatting for counts and rates.

/// Formats a count for display: millions as `1.5M`, thousands as `2.5K`,
/// anything smaller as a plain integer. Non-finite input yields `None`.
pub fn format_count(n: f64) -> Option<String> {
    if !n.is_finite() {
        return None;
    }
    if n >= 1_000_000.0 {
        Some(format!("{:.1}M", n / 1_000_000.0))
    } else if n >= 1_000.0 {
        Some(format!("{:.1}K", n / 1_000.0))
    } else {
        Some(format!("{}", n as i64))
    }
}

/// Formats a 0.0–1.0 rate as a percentage with two decimals, e.g. `12.34%`.
pub fn percent(rate: f64) -> String {
    format!("{:.2}%", rate * 100.0)
}
