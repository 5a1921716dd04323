//! Date and duration text handling.
//!
//! Dates travel through the engine as millisecond epoch instants; this
//! module owns the conversions between that representation and the ISO-8601
//! text forms used by literals and rendered cells. Duration literals come in
//! two spellings: the compact form used in expression text (`30s`, `1h`,
//! `2d`) and the ISO-8601 form used by the duration-rounding functions
//! (`PT5M`, `P1DT12H`).

use chrono::{DateTime, TimeZone, Utc};

/// Render an epoch-millisecond instant as ISO-8601 UTC with milliseconds,
/// e.g. `2014-02-22T12:12:12.888Z`.
pub fn format_iso_utc(ms: i64) -> String {
    match Utc.timestamp_millis_opt(ms).single() {
        Some(dt) => dt.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string(),
        // Out-of-range instants cannot be rendered as a calendar date
        None => ms.to_string(),
    }
}

/// Parse an ISO-8601 date-time with an explicit zone designator into epoch
/// milliseconds. Accepts `Z` or a numeric offset, with or without
/// fractional seconds.
pub fn parse_iso(text: &str) -> Option<i64> {
    DateTime::parse_from_rfc3339(text)
        .ok()
        .map(|dt| dt.timestamp_millis())
}

/// Render a millisecond duration compactly: a whole number of weeks, days,
/// hours, minutes or seconds uses that unit's suffix, anything else falls
/// back to milliseconds.
pub fn format_duration(ms: i64) -> String {
    const UNITS: [(i64, &str); 5] = [
        (604_800_000, "w"),
        (86_400_000, "d"),
        (3_600_000, "h"),
        (60_000, "m"),
        (1_000, "s"),
    ];
    if ms != 0 {
        for (unit_ms, suffix) in UNITS {
            if ms % unit_ms == 0 {
                return format!("{}{}", ms / unit_ms, suffix);
            }
        }
    }
    format!("{}ms", ms)
}

/// Parse a compact duration literal (`500ms`, `30s`, `5m`, `2h`, `7d`, `1w`)
/// into milliseconds.
pub fn parse_simple_duration(text: &str) -> Option<i64> {
    let text = text.trim();
    let digits_end = text
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| i)?;
    if digits_end == 0 {
        return None;
    }
    let magnitude: i64 = text[..digits_end].parse().ok()?;
    let unit_ms = match &text[digits_end..] {
        "ms" => 1,
        "s" => 1_000,
        "m" => 60_000,
        "h" => 3_600_000,
        "d" => 86_400_000,
        "w" => 604_800_000,
        _ => return None,
    };
    magnitude.checked_mul(unit_ms)
}

/// Parse an ISO-8601 duration (`PT5M`, `P1DT2H30M`, `P2W`) into
/// milliseconds.
///
/// Year and month designators are rejected: duration rounding is pure
/// millisecond arithmetic and has no calendar to interpret them against.
/// Seconds may carry a fractional part down to millisecond precision.
pub fn parse_iso_duration(text: &str) -> Option<i64> {
    let text = text.trim();
    let rest = text.strip_prefix('P').or_else(|| text.strip_prefix('p'))?;
    if rest.is_empty() {
        return None;
    }

    let mut total_ms: i64 = 0;
    let mut in_time = false;
    let mut number = String::new();
    let mut seen_component = false;

    for c in rest.chars() {
        match c {
            'T' | 't' => {
                if in_time || !number.is_empty() {
                    return None;
                }
                in_time = true;
            }
            '0'..='9' | '.' => number.push(c),
            designator => {
                if number.is_empty() {
                    return None;
                }
                let unit_ms: i64 = match (designator.to_ascii_uppercase(), in_time) {
                    ('W', false) => 604_800_000,
                    ('D', false) => 86_400_000,
                    ('H', true) => 3_600_000,
                    ('M', true) => 60_000,
                    ('S', true) => 1_000,
                    // Calendar units (years, months) and misplaced
                    // designators are not valid here
                    _ => return None,
                };
                let value: f64 = number.parse().ok()?;
                number.clear();
                seen_component = true;
                total_ms = total_ms.checked_add((value * unit_ms as f64).round() as i64)?;
            }
        }
    }

    if !number.is_empty() || !seen_component {
        return None;
    }
    Some(total_ms)
}

/// Parse either duration spelling: ISO-8601 when the text starts with `P`,
/// otherwise the compact literal form.
pub fn parse_duration(text: &str) -> Option<i64> {
    let trimmed = text.trim();
    if trimmed.starts_with('P') || trimmed.starts_with('p') {
        parse_iso_duration(trimmed)
    } else {
        parse_simple_duration(trimmed)
    }
}
