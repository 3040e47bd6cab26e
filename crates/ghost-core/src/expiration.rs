//! Expiration time computation for share links.
//!
//! The backend expects a naive local timestamp plus the IANA zone it should be
//! interpreted in, so the offset never travels inside the timestamp itself.

use std::path::Path;

use chrono::{Days, Duration, Local, NaiveDateTime, TimeZone, Timelike};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

use crate::models::Lifetime;

/// Zone reported when the local zone cannot be detected.
pub const DEFAULT_TIMEZONE: &str = "Asia/Karachi";

/// Wire format of naive timestamps, e.g. `2025-09-27T15:40:59`.
pub const NAIVE_TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

const ZONEINFO_MARKER: &str = "zoneinfo/";

/// Absolute expiration plus the zone it was computed in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExpirationResult {
    #[serde(with = "naive_timestamp")]
    pub expires_at: Option<NaiveDateTime>,
    pub timezone: String,
}

/// Compute the expiration for `lifetime` from the current local time.
pub fn calculate_expiration(lifetime: Lifetime) -> ExpirationResult {
    calculate_expiration_at(lifetime, Local::now().naive_local(), detect_timezone())
}

/// Compute the expiration for `lifetime` relative to an explicit `now`.
///
/// `now` is a wall-clock time in `timezone`, truncated to whole seconds.
/// Minute and hour lifetimes add elapsed time, so the result is a real local
/// time even across a DST change. Day lifetimes keep the wall-clock time.
pub fn calculate_expiration_at(
    lifetime: Lifetime,
    now: NaiveDateTime,
    timezone: impl Into<String>,
) -> ExpirationResult {
    let timezone = timezone.into();
    let now = truncate_to_seconds(now);
    let expires_at = lifetime.duration().and_then(|duration| {
        match (lifetime.calendar_days(), timezone.parse::<Tz>()) {
            (Some(days), _) => now.checked_add_days(Days::new(days)),
            (None, Ok(zone)) => add_elapsed(now, duration, zone),
            (None, Err(_)) => now.checked_add_signed(duration),
        }
    });
    ExpirationResult {
        expires_at,
        timezone,
    }
}

fn add_elapsed(now: NaiveDateTime, duration: Duration, zone: Tz) -> Option<NaiveDateTime> {
    match zone.from_local_datetime(&now).earliest() {
        Some(instant) => instant
            .checked_add_signed(duration)
            .map(|expires| expires.naive_local()),
        None => now.checked_add_signed(duration),
    }
}

/// Format a naive timestamp without any offset or zone suffix.
pub fn format_naive_timestamp(value: &NaiveDateTime) -> String {
    value.format(NAIVE_TIMESTAMP_FORMAT).to_string()
}

/// Parse a naive timestamp in the wire format.
pub fn parse_naive_timestamp(raw: &str) -> Result<NaiveDateTime, chrono::ParseError> {
    NaiveDateTime::parse_from_str(raw.trim(), NAIVE_TIMESTAMP_FORMAT)
}

/// Detect the caller's IANA time zone, falling back to [`DEFAULT_TIMEZONE`].
///
/// Candidates are `TZ`, the platform zone, `/etc/timezone`, then the
/// `/etc/localtime` link target.
pub fn detect_timezone() -> String {
    let candidates = [
        std::env::var("TZ").ok(),
        iana_time_zone::get_timezone().ok(),
        std::fs::read_to_string("/etc/timezone").ok(),
        std::fs::read_link("/etc/localtime")
            .ok()
            .and_then(|target| zone_from_localtime_target(&target)),
    ];
    resolve_timezone(candidates)
}

/// Pick the first candidate naming a known IANA zone.
pub fn resolve_timezone(candidates: impl IntoIterator<Item = Option<String>>) -> String {
    let detected = candidates
        .into_iter()
        .flatten()
        .find_map(|candidate| parse_zone_name(&candidate));
    detected.unwrap_or_else(|| {
        tracing::warn!("Could not detect timezone, using fallback {DEFAULT_TIMEZONE}");
        DEFAULT_TIMEZONE.to_string()
    })
}

fn parse_zone_name(raw: &str) -> Option<String> {
    let name = raw.trim().trim_start_matches(':');
    if name.is_empty() {
        return None;
    }
    name.parse::<Tz>().ok().map(|zone| zone.name().to_string())
}

fn zone_from_localtime_target(target: &Path) -> Option<String> {
    let target = target.to_string_lossy();
    let index = target.find(ZONEINFO_MARKER)?;
    Some(target[index + ZONEINFO_MARKER.len()..].to_string())
}

fn truncate_to_seconds(value: NaiveDateTime) -> NaiveDateTime {
    value.with_nanosecond(0).unwrap_or(value)
}

/// Serde adapter for `Option<NaiveDateTime>` in the wire format.
pub(crate) mod naive_timestamp {
    use chrono::NaiveDateTime;
    use serde::{Deserialize, Deserializer, Serializer};

    use super::{format_naive_timestamp, parse_naive_timestamp};

    pub fn serialize<S: Serializer>(
        value: &Option<NaiveDateTime>,
        serializer: S,
    ) -> Result<S::Ok, S::Error> {
        match value {
            Some(value) => serializer.serialize_str(&format_naive_timestamp(value)),
            None => serializer.serialize_none(),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(
        deserializer: D,
    ) -> Result<Option<NaiveDateTime>, D::Error> {
        Option::<String>::deserialize(deserializer)?
            .map(|raw| parse_naive_timestamp(&raw).map_err(serde::de::Error::custom))
            .transpose()
    }
}
