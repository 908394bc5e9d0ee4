//! Helpers for picking numbers out of loosely formatted tool output.

pub fn line_with_label<'a>(text: &'a str, label: &str) -> Option<&'a str> {
    text.lines()
        .map(str::trim)
        .find(|line| line.split_whitespace().next() == Some(label))
}

pub fn columns(line: &str) -> Vec<&str> {
    line.split_whitespace().collect()
}

pub fn parse_u64(input: &str) -> Option<u64> {
    input.trim().parse::<u64>().ok()
}

pub fn parse_f64_loose(input: &str) -> Option<f64> {
    let trimmed = input.trim();
    if let Ok(v) = trimmed.parse::<f64>() {
        return v.is_finite().then_some(v);
    }

    // Some locales print load averages with a decimal comma.
    trimmed
        .replace(',', ".")
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

/// `part / whole * 100` rounded half away from zero, or `None` when the
/// ratio is undefined.
pub fn percent(part: f64, whole: f64) -> Option<u64> {
    if whole.is_nan() || whole <= 0.0 || !part.is_finite() || part < 0.0 {
        return None;
    }
    Some(((part / whole) * 100.0).round() as u64)
}
