const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// `1,234.56MB`. Values at or above 1024 TB stay in TB.
pub fn bytes_to_human(bytes: u64) -> String {
    let mut power = 0;
    let mut scale = 1_u64;
    while power + 1 < UNITS.len() && bytes / scale >= 1024 {
        scale *= 1024;
        power += 1;
    }

    let value = bytes as f64 / scale as f64;
    format!("{}{}", group_thousands(&format!("{value:.2}")), UNITS[power])
}

fn group_thousands(fixed: &str) -> String {
    let (int_part, frac_part) = fixed.split_once('.').unwrap_or((fixed, ""));
    let mut grouped = String::with_capacity(fixed.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    if !frac_part.is_empty() {
        grouped.push('.');
        grouped.push_str(frac_part);
    }
    grouped
}
