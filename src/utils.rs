//! Display helpers shared by the session report and the CLI.
//!
//! Everything here is pure so the rendered numbers can be checked without
//! converting any images.

use crate::constants::{SIZE_BASE, SIZE_UNITS};

/// Format a byte count with binary prefixes
///
/// # Arguments
/// * `bytes` - Size in bytes
///
/// # Returns
/// * Human-readable size rounded to two decimals with trailing zeros
///   trimmed (e.g. "0 Bytes", "1.5 KB", "1 MB")
pub fn format_size(bytes: u64) -> String {
    if bytes == 0 {
        return format!("0 {}", SIZE_UNITS[0]);
    }

    let mut size = bytes as f64;
    let mut unit_index = 0;

    while size >= SIZE_BASE && unit_index < SIZE_UNITS.len() - 1 {
        size /= SIZE_BASE;
        unit_index += 1;
    }

    format!("{} {}", round_two_decimals(size), SIZE_UNITS[unit_index])
}

/// Format a signed byte delta, used for savings that may be negative.
pub fn format_signed_size(bytes: i64) -> String {
    if bytes < 0 {
        format!("-{}", format_size(bytes.unsigned_abs()))
    } else {
        format_size(bytes as u64)
    }
}

/// Percentage reduction from `original` to `converted`
///
/// # Returns
/// * Two-decimal string such as "50.00"; a negative value means the output
///   grew. Returns "0" when either size is zero.
pub fn percentage_reduction(original: u64, converted: u64) -> String {
    if original == 0 || converted == 0 {
        return "0".to_string();
    }
    let reduction = (original as f64 - converted as f64) / original as f64 * 100.0;
    format!("{:.2}", reduction)
}

/// Progress of a run as an integer percentage, `round(100 * completed / total)`.
pub fn progress_percent(completed: usize, total: usize) -> u8 {
    if total == 0 {
        return 0;
    }
    let completed = completed.min(total);
    (completed as f64 * 100.0 / total as f64).round() as u8
}

/// `"file"` or `"files"` depending on `count`.
pub fn pluralize_files(count: usize) -> &'static str {
    if count == 1 {
        "file"
    } else {
        "files"
    }
}

fn round_two_decimals(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
