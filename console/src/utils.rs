//! Utility functions

use serde::{Deserialize, Serialize};

/// Version information for the console agent
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VersionInfo {
    pub version: String,
    pub git_hash: String,
    pub build_time: String,
}

/// Get version information
pub fn version_info() -> VersionInfo {
    VersionInfo {
        version: env!("CARGO_PKG_VERSION").to_string(),
        git_hash: option_env!("GIT_HASH").unwrap_or("unknown").to_string(),
        build_time: option_env!("BUILD_TIME").unwrap_or("unknown").to_string(),
    }
}

/// Parse a Kubernetes resource quantity into bytes.
///
/// Supports binary suffixes (Ki, Mi, Gi, Ti, Pi, Ei), decimal suffixes
/// (k, K, M, G, T, P, E) and plain integers.
pub fn parse_quantity(quantity: &str) -> Option<u64> {
    let quantity = quantity.trim();
    if quantity.is_empty() {
        return None;
    }

    let (number, multiplier): (&str, u64) = if let Some(prefix) = quantity.strip_suffix('i') {
        // Split on the char boundary, not a byte index
        let (at, unit) = prefix.char_indices().last()?;
        let factor: u64 = match unit {
            'K' => 1 << 10,
            'M' => 1 << 20,
            'G' => 1 << 30,
            'T' => 1 << 40,
            'P' => 1 << 50,
            'E' => 1 << 60,
            _ => return None,
        };
        (&prefix[..at], factor)
    } else {
        match quantity.chars().last()? {
            'k' | 'K' => (&quantity[..quantity.len() - 1], 1_000),
            'M' => (&quantity[..quantity.len() - 1], 1_000_000),
            'G' => (&quantity[..quantity.len() - 1], 1_000_000_000),
            'T' => (&quantity[..quantity.len() - 1], 1_000_000_000_000),
            'P' => (&quantity[..quantity.len() - 1], 1_000_000_000_000_000),
            'E' => (&quantity[..quantity.len() - 1], 1_000_000_000_000_000_000),
            _ => (quantity, 1),
        }
    };

    let value: u64 = number.trim().parse().ok()?;
    value.checked_mul(multiplier)
}

/// Render a byte count with binary units, two decimal places
pub fn prettify_bytes(bytes: u64) -> String {
    const UNITS: [&str; 6] = ["B", "KiB", "MiB", "GiB", "TiB", "PiB"];

    let mut value = bytes as f64;
    let mut unit = 0;
    while value >= 1024.0 && unit < UNITS.len() - 1 {
        value /= 1024.0;
        unit += 1;
    }

    if unit == 0 {
        format!("{} {}", bytes, UNITS[unit])
    } else {
        format!("{:.2} {}", value, UNITS[unit])
    }
}
