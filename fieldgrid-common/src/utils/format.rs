//! Human-readable formatting helpers.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Format a byte count with binary (1024) units, e.g. `1536` → `"1.5 KB"`.
///
/// `precision` caps the number of decimals; trailing zeros are dropped so
/// whole numbers render without a fraction (`2048` → `"2 KB"`).
pub fn format_bytes(bytes: u64, precision: usize) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    let mut rendered = format!("{value:.precision$}");
    if rendered.contains('.') {
        rendered = rendered
            .trim_end_matches('0')
            .trim_end_matches('.')
            .to_string();
    }
    format!("{rendered} {}", UNITS[unit])
}
