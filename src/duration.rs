use std::time::Duration;

use crate::error::{Result, StevedoreError};

/// Parse a duration string like "150ms", "10s", "2m" or "1h".
///
/// A bare number is taken as milliseconds.
pub fn parse_duration(s: &str) -> Result<Duration> {
    let s = s.trim();

    // Try to parse as raw milliseconds first
    if let Ok(millis) = s.parse::<u64>() {
        return Ok(Duration::from_millis(millis));
    }

    // Otherwise parse with suffix
    let (num_part, suffix) = split_number_suffix(s)?;
    let seconds_per_unit = match suffix.to_lowercase().as_str() {
        "ms" => 0.001,
        "s" | "sec" | "secs" => 1.0,
        "m" | "min" | "mins" => 60.0,
        "h" | "hr" | "hrs" => 3600.0,
        _ => {
            return Err(StevedoreError::InvalidDuration {
                value: s.to_string(),
                message: format!("Unknown duration suffix: {suffix}"),
            });
        }
    };

    let base: f64 = num_part
        .parse()
        .map_err(|_| StevedoreError::InvalidDuration {
            value: s.to_string(),
            message: "Invalid number format".to_string(),
        })?;

    Duration::try_from_secs_f64(base * seconds_per_unit).map_err(|e| {
        StevedoreError::InvalidDuration {
            value: s.to_string(),
            message: e.to_string(),
        }
    })
}

/// Split a duration string into number and suffix parts
fn split_number_suffix(s: &str) -> Result<(&str, &str)> {
    let split_pos = s
        .char_indices()
        .find(|(_, ch)| ch.is_alphabetic())
        .map_or(s.len(), |(i, _)| i);

    let (num, suffix) = s.split_at(split_pos);
    if num.is_empty() {
        return Err(StevedoreError::InvalidDuration {
            value: s.to_string(),
            message: "No number found".to_string(),
        });
    }

    Ok((num.trim(), suffix))
}

/// Format a duration in the largest unit that keeps it readable
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        format!("{millis}ms")
    } else if millis < 60_000 {
        format!("{:.1}s", duration.as_secs_f64())
    } else if millis < 3_600_000 {
        format!("{:.1}m", duration.as_secs_f64() / 60.0)
    } else {
        format!("{:.1}h", duration.as_secs_f64() / 3600.0)
    }
}
