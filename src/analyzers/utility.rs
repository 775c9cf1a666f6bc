/// Sum of whole-minute delays, pinned at the `i64` bounds instead of wrapping.
pub fn total_minutes(values: &[i64]) -> i64 {
    values.iter().fold(0i64, |acc, v| acc.saturating_add(*v))
}

/// Mean of whole-minute delays. Returns 0.0 for empty input.
pub fn mean_minutes(values: &[i64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let sum: i128 = values.iter().map(|v| i128::from(*v)).sum();
    sum as f64 / values.len() as f64
}

/// `part / total * 100`, or 0.0 when there is nothing to divide by.
pub fn pct(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        (part as f64 / total as f64) * 100.0
    }
}
