//! Parsing of timeout values such as "30", "45s", "2m" or "1500ms".

use std::time::Duration;

/// Parses a timeout. A bare integer is a number of seconds.
///
/// Rejects zero, negative and malformed values.
pub(crate) fn parse_timeout(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("must not be empty".to_string());
    }

    if let Ok(secs) = s.parse::<i64>() {
        return seconds(secs);
    }

    let duration = parse_duration(s)?;
    if duration.is_zero() {
        return Err("must be greater than 0".to_string());
    }
    Ok(duration)
}

/// Converts whole seconds into a timeout, rejecting values that are not positive.
pub(crate) fn seconds(secs: i64) -> Result<Duration, String> {
    u64::try_from(secs)
        .ok()
        .filter(|secs| *secs > 0)
        .map(Duration::from_secs)
        .ok_or_else(|| format!("must be greater than 0 (got {secs})"))
}

pub(crate) fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();

    // Find where the number ends and the unit begins
    let num_end = s
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(s.len());

    let (num_str, unit) = s.split_at(num_end);
    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("invalid duration number: {:?}", s))?;

    let multiplier = match unit.trim() {
        "ms" => 1e-3,
        "s" | "" => 1.0,
        "m" => 60.0,
        "h" => 3600.0,
        _ => return Err(format!("unknown duration unit: {}", unit)),
    };

    let secs = num * multiplier;
    if !secs.is_finite() {
        return Err(format!("out of range: {:?}", s));
    }
    Duration::try_from_secs_f64(secs).map_err(|e| format!("out of range: {:?} ({e})", s))
}
