//! Evaluation environment for one query.
//!
//! The [`ExpressionContext`] is built once when a query is compiled and
//! shared read-only by every function that needs it: date functions resolve
//! their working timezone from it exactly once, current-time functions read
//! its reference instant, and equality functions pick up the string
//! case-sensitivity it carries.

use chrono::{DateTime, FixedOffset, Local, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;

use super::error::{BindResult, ExprError};
use super::values::CaseSensitivity;

/// How date functions resolve their working timezone.
///
/// The policy is declarative; [`ExpressionContext::resolve_zone`] turns it
/// into a concrete [`ResolvedZone`] once per query, so per-row evaluation
/// never touches zone lookup.
#[derive(Debug, Clone, PartialEq)]
pub enum TimeZonePolicy {
    /// Coordinated universal time
    Utc,
    /// A fixed offset from UTC in minutes (positive east)
    Offset { minutes: i32 },
    /// A named zone id such as `Europe/London`
    Named(String),
    /// The zone of the machine running the evaluation
    Local,
}

/// A timezone policy resolved to something chrono can do arithmetic in.
#[derive(Debug, Clone)]
pub enum ResolvedZone {
    Utc,
    Fixed(FixedOffset),
    Named(Tz),
    Local,
}

impl ResolvedZone {
    /// The wall-clock date-time of an epoch-millisecond instant in this
    /// zone. Instants outside chrono's representable range return `None`.
    pub fn to_local(&self, ms: i64) -> Option<NaiveDateTime> {
        match self {
            ResolvedZone::Utc => Utc.timestamp_millis_opt(ms).single().map(|dt| dt.naive_utc()),
            ResolvedZone::Fixed(offset) => offset
                .timestamp_millis_opt(ms)
                .single()
                .map(|dt| dt.naive_local()),
            ResolvedZone::Named(tz) => {
                tz.timestamp_millis_opt(ms).single().map(|dt| dt.naive_local())
            }
            ResolvedZone::Local => Local
                .timestamp_millis_opt(ms)
                .single()
                .map(|dt| dt.naive_local()),
        }
    }

    /// The epoch-millisecond instant of a wall-clock date-time in this
    /// zone. Ambiguous wall-clock times (DST fold) resolve to the earlier
    /// instant; skipped times return `None`.
    pub fn from_local(&self, local: NaiveDateTime) -> Option<i64> {
        match self {
            ResolvedZone::Utc => Some(Utc.from_utc_datetime(&local).timestamp_millis()),
            ResolvedZone::Fixed(offset) => offset
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.timestamp_millis()),
            ResolvedZone::Named(tz) => tz
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.timestamp_millis()),
            ResolvedZone::Local => Local
                .from_local_datetime(&local)
                .earliest()
                .map(|dt| dt.timestamp_millis()),
        }
    }

    /// Parse date-time text against a chrono format pattern in this zone.
    pub fn parse_with_pattern(&self, text: &str, pattern: &str) -> Option<i64> {
        // A pattern carrying its own zone designator wins over the policy
        if let Ok(dt) = DateTime::parse_from_str(text, pattern) {
            return Some(dt.timestamp_millis());
        }
        let naive = NaiveDateTime::parse_from_str(text, pattern)
            .ok()
            .or_else(|| {
                chrono::NaiveDate::parse_from_str(text, pattern)
                    .ok()
                    .and_then(|d| d.and_hms_opt(0, 0, 0))
            })?;
        self.from_local(naive)
    }

    /// Render an instant with a chrono format pattern in this zone.
    pub fn format_with_pattern(&self, ms: i64, pattern: &str) -> Option<String> {
        self.to_local(ms).map(|dt| dt.format(pattern).to_string())
    }
}

/// Carries the evaluation environment for one query: timezone policy, the
/// reference instant used by current-time functions and the string
/// case-sensitivity for equality functions. Immutable once built.
#[derive(Debug, Clone)]
pub struct ExpressionContext {
    timezone: TimeZonePolicy,
    reference_time_ms: i64,
    case_sensitivity: CaseSensitivity,
}

impl ExpressionContext {
    pub fn new(
        timezone: TimeZonePolicy,
        reference_time_ms: i64,
        case_sensitivity: CaseSensitivity,
    ) -> Self {
        Self {
            timezone,
            reference_time_ms,
            case_sensitivity,
        }
    }

    /// A UTC context with case-insensitive string comparison, the defaults
    /// the surrounding engine uses when the session specifies nothing.
    pub fn with_reference_time(reference_time_ms: i64) -> Self {
        Self::new(
            TimeZonePolicy::Utc,
            reference_time_ms,
            CaseSensitivity::Insensitive,
        )
    }

    pub fn timezone(&self) -> &TimeZonePolicy {
        &self.timezone
    }

    /// The instant current-time functions report, fixed for the whole query
    /// so every row sees the same "now".
    pub fn reference_time_ms(&self) -> i64 {
        self.reference_time_ms
    }

    pub fn case_sensitivity(&self) -> CaseSensitivity {
        self.case_sensitivity
    }

    /// Resolve the timezone policy to a concrete zone.
    ///
    /// Called once per date function at bind time; a bad zone id is a
    /// bind-time failure, not a runtime error value.
    pub fn resolve_zone(&self) -> BindResult<ResolvedZone> {
        resolve_policy(&self.timezone)
    }
}

/// Resolve a policy outside a context, used when a date function takes an
/// explicit zone argument that overrides the context's policy.
pub fn resolve_policy(policy: &TimeZonePolicy) -> BindResult<ResolvedZone> {
    match policy {
        TimeZonePolicy::Utc => Ok(ResolvedZone::Utc),
        TimeZonePolicy::Offset { minutes } => FixedOffset::east_opt(minutes * 60)
            .map(ResolvedZone::Fixed)
            .ok_or_else(|| {
                ExprError::parse(format!("Invalid timezone offset '{}' minutes", minutes))
            }),
        TimeZonePolicy::Named(id) => id
            .parse::<Tz>()
            .map(ResolvedZone::Named)
            .map_err(|_| ExprError::parse(format!("Unknown timezone id '{}'", id))),
        TimeZonePolicy::Local => Ok(ResolvedZone::Local),
    }
}

/// Parse a zone argument as written in an expression: `UTC`, `Z`, a
/// `+hhmm`/`-hh:mm` offset, or a named zone id.
pub fn parse_zone_argument(text: &str) -> BindResult<ResolvedZone> {
    let trimmed = text.trim();
    if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("utc") || trimmed == "Z" {
        return Ok(ResolvedZone::Utc);
    }
    if let Some(offset) = parse_offset(trimmed) {
        return Ok(ResolvedZone::Fixed(offset));
    }
    resolve_policy(&TimeZonePolicy::Named(trimmed.to_string()))
}

fn parse_offset(text: &str) -> Option<FixedOffset> {
    let (sign, rest) = match *text.as_bytes().first()? {
        b'+' => (1, &text[1..]),
        b'-' => (-1, &text[1..]),
        _ => return None,
    };
    let digits: String = rest.chars().filter(|c| *c != ':').collect();
    if digits.len() != 4 || !digits.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hours: i32 = digits[..2].parse().ok()?;
    let minutes: i32 = digits[2..].parse().ok()?;
    FixedOffset::east_opt(sign * (hours * 3600 + minutes * 60))
}
