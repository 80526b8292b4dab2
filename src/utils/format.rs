//! Size formatting

const KB: u64 = 1024;
const MB: u64 = 1024 * 1024;
const GB: u64 = 1024 * 1024 * 1024;

/// Human-readable size: "N bytes", or KB/MB/GB rounded to one decimal.
pub fn format_size(size: u64) -> String {
    if size < KB {
        format!("{} bytes", size)
    } else if size < MB {
        format!("{} KB", one_decimal(size as f64 / KB as f64))
    } else if size < GB {
        format!("{} MB", one_decimal(size as f64 / MB as f64))
    } else {
        format!("{} GB", one_decimal(size as f64 / GB as f64))
    }
}

/// One decimal, halves rounded away from zero.
fn one_decimal(value: f64) -> String {
    let rounded = format!("{:.1}", (value * 10.0).round() / 10.0);
    match rounded.strip_suffix(".0") {
        Some(whole) => whole.to_string(),
        None => rounded,
    }
}
