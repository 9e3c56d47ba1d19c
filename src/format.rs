//! Human-readable byte sizes.

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

fn scaled(bytes: u64, base: f64) -> String {
    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= base && unit < UNITS.len() - 1 {
        value /= base;
        unit += 1;
    }
    format!("{:.2} {}", value, UNITS[unit])
}

/// 1024-based size, e.g. `1.50 KB` for 1536 bytes.
pub fn human_readable(bytes: u64) -> String {
    scaled(bytes, 1024.0)
}

/// 1000-based size, as disk vendors count.
pub fn human_readable_si(bytes: u64) -> String {
    scaled(bytes, 1000.0)
}
