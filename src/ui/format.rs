//! Display text for metrics records.

use crate::folder_metrics::MetricsRecord;

/// Bytes per megabyte as the console reports sizes.
pub const BYTES_PER_MB: u64 = 1024 * 1024;

/// Text shown when there is no size to report.
pub const ZERO_SIZE: &str = "0 MB";

/// Format a record's size for display.
///
/// `None` and a literal `"0"` size both read `"0 MB"`. Otherwise the size is
/// shown in megabytes with two decimals, prefixed with `~` when the aggregate
/// is approximate.
pub fn format_size(record: Option<&MetricsRecord>) -> String {
    let Some(record) = record else {
        return ZERO_SIZE.to_string();
    };

    if record.size() == "0" {
        return ZERO_SIZE.to_string();
    }

    let prefix = if record.is_approximate() { "~" } else { "" };
    format!("{}{} MB", prefix, megabytes_fixed2(record.bytes()))
}

/// Asset count shown next to the size. Missing records count as zero.
pub fn format_count(record: Option<&MetricsRecord>) -> u64 {
    record.map(|r| r.total_assets).unwrap_or(0)
}

/// `bytes / 1 MiB` with exactly two decimals, ties rounded up.
///
/// Computed on integers: the quotient of a byte count by a power of two is
/// exact, so halfway cases are real and must round away from zero.
fn megabytes_fixed2(bytes: u64) -> String {
    let divisor = BYTES_PER_MB as u128;
    let hundredths = (bytes as u128 * 100 + divisor / 2) / divisor;
    format!("{}.{:02}", hundredths / 100, hundredths % 100)
}
