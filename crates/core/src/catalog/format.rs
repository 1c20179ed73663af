//! Size formatting and tag parsing.

const UNITS: [&str; 4] = ["Bytes", "KB", "MB", "GB"];

/// Format a byte count with 1024-based units and up to two decimals.
///
/// Trailing zeros are dropped: `1536` → `1.5 KB`, `2048` → `2 KB`.
#[must_use]
pub fn format_file_size(bytes: u64) -> String {
    if bytes == 0 {
        return "0 Bytes".to_string();
    }

    let mut unit = 0;
    let mut divisor: u128 = 1;
    while unit + 1 < UNITS.len() && u128::from(bytes) >= divisor * 1024 {
        divisor *= 1024;
        unit += 1;
    }

    // Hundredths, rounded half up.
    let hundredths = (u128::from(bytes) * 100 + divisor / 2) / divisor;
    let whole = hundredths / 100;
    let frac = hundredths % 100;

    let number = if frac == 0 {
        whole.to_string()
    } else if frac % 10 == 0 {
        format!("{whole}.{}", frac / 10)
    } else {
        format!("{whole}.{frac:02}")
    };

    format!("{number} {}", UNITS[unit])
}

/// Split a comma-separated tag list, trimming and dropping empty entries.
#[must_use]
pub fn parse_tags(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|tag| !tag.is_empty())
        .map(String::from)
        .collect()
}
