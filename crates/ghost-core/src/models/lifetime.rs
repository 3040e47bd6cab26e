//! Share lifetime selector

use std::fmt;
use std::str::FromStr;

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::error::Error;

/// How long a share link stays valid before the backend expires it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Lifetime {
    /// No expiration
    #[default]
    #[serde(rename = "", alias = "none")]
    None,
    #[serde(rename = "5m")]
    FiveMinutes,
    #[serde(rename = "30m")]
    ThirtyMinutes,
    #[serde(rename = "1h")]
    OneHour,
    #[serde(rename = "4h")]
    FourHours,
    #[serde(rename = "12h")]
    TwelveHours,
    #[serde(rename = "1d")]
    OneDay,
    #[serde(rename = "3d")]
    ThreeDays,
    #[serde(rename = "7d")]
    SevenDays,
}

impl Lifetime {
    /// Every selectable lifetime, in menu order.
    pub const ALL: [Self; 9] = [
        Self::None,
        Self::FiveMinutes,
        Self::ThirtyMinutes,
        Self::OneHour,
        Self::FourHours,
        Self::TwelveHours,
        Self::OneDay,
        Self::ThreeDays,
        Self::SevenDays,
    ];

    /// Short selector code (`5m`, `1h`, ...). `None` is spelled `none`.
    #[must_use]
    pub const fn code(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::FiveMinutes => "5m",
            Self::ThirtyMinutes => "30m",
            Self::OneHour => "1h",
            Self::FourHours => "4h",
            Self::TwelveHours => "12h",
            Self::OneDay => "1d",
            Self::ThreeDays => "3d",
            Self::SevenDays => "7d",
        }
    }

    /// Human label shown in the lifetime menu.
    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::None => "No Limit",
            Self::FiveMinutes => "5 Minute",
            Self::ThirtyMinutes => "30 Minute",
            Self::OneHour => "1 Hour",
            Self::FourHours => "4 Hour",
            Self::TwelveHours => "12 Hour",
            Self::OneDay => "1 Day",
            Self::ThreeDays => "3 Day",
            Self::SevenDays => "7 Day",
        }
    }

    /// Time-to-live mapped from the selector, `None` for no limit.
    #[must_use]
    pub fn duration(self) -> Option<Duration> {
        match self {
            Self::None => None,
            Self::FiveMinutes => Some(Duration::minutes(5)),
            Self::ThirtyMinutes => Some(Duration::minutes(30)),
            Self::OneHour => Some(Duration::hours(1)),
            Self::FourHours => Some(Duration::hours(4)),
            Self::TwelveHours => Some(Duration::hours(12)),
            Self::OneDay => Some(Duration::days(1)),
            Self::ThreeDays => Some(Duration::days(3)),
            Self::SevenDays => Some(Duration::days(7)),
        }
    }

    /// Whole calendar days for day-based lifetimes; these keep the wall clock
    /// time across DST changes.
    #[must_use]
    pub const fn calendar_days(self) -> Option<u64> {
        match self {
            Self::OneDay => Some(1),
            Self::ThreeDays => Some(3),
            Self::SevenDays => Some(7),
            _ => None,
        }
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Lifetime {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let value = s.trim().to_ascii_lowercase();
        if value.is_empty() {
            return Ok(Self::None);
        }
        Self::ALL
            .into_iter()
            .find(|lifetime| lifetime.code() == value)
            .ok_or_else(|| {
                let options = Self::ALL.map(Self::code).join(", ");
                Error::InvalidInput(format!("unknown lifetime '{s}' (expected one of: {options})"))
            })
    }
}
