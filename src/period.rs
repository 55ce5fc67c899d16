//! Time-bucketing of offers by their shift start.
//!
//! Buckets are computed on demand from `shift_start_at` and never stored. A
//! record without a start time has no bucket at all, so it drops out of every
//! time-bucketed aggregate instead of landing on the epoch.

use crate::error::ConfigError;
use crate::types::ShiftOffer;
use chrono::{Datelike, NaiveDate};
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Granularity used to group offers for ranking queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Period {
    #[default]
    Week,
    Month,
    Year,
}

impl Period {
    pub const ALL: [Period; 3] = [Period::Week, Period::Month, Period::Year];

    pub fn as_str(self) -> &'static str {
        match self {
            Period::Week => "week",
            Period::Month => "month",
            Period::Year => "year",
        }
    }

    /// Bucket key of a record: ISO week number, month number or calendar year.
    pub fn bucket(self, offer: &ShiftOffer) -> Option<i32> {
        let start = offer.shift_start_at?;
        Some(match self {
            Period::Week => start.iso_week().week() as i32,
            Period::Month => start.month() as i32,
            Period::Year => start.year(),
        })
    }
}

impl FromStr for Period {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "week" | "WEEK" => Ok(Period::Week),
            "month" | "MONTH" => Ok(Period::Month),
            "year" | "YEAR" => Ok(Period::Year),
            other => Err(ConfigError::InvalidPeriod {
                token: other.to_string(),
            }),
        }
    }
}

impl fmt::Display for Period {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Period {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Year and month together; orders chronologically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MonthPeriod {
    pub year: i32,
    pub month: u32,
}

impl MonthPeriod {
    pub fn of(offer: &ShiftOffer) -> Option<Self> {
        let start = offer.shift_start_at?;
        Some(MonthPeriod {
            year: start.year(),
            month: start.month(),
        })
    }
}

impl fmt::Display for MonthPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for MonthPeriod {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

pub fn calendar_date(offer: &ShiftOffer) -> Option<NaiveDate> {
    offer.shift_start_at.map(|t| t.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDateTime;

    fn offer_starting(s: &str) -> ShiftOffer {
        ShiftOffer {
            shift_start_at: NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").ok(),
            ..ShiftOffer::default()
        }
    }

    #[test]
    fn buckets_follow_iso_week_rules() {
        // 2021-01-03 is a Sunday that still belongs to ISO week 53 of 2020.
        let offer = offer_starting("2021-01-03 09:00:00");
        assert_eq!(Period::Week.bucket(&offer), Some(53));
        assert_eq!(Period::Month.bucket(&offer), Some(1));
        assert_eq!(Period::Year.bucket(&offer), Some(2021));
    }

    #[test]
    fn missing_start_has_no_bucket() {
        let offer = ShiftOffer::default();
        for period in Period::ALL {
            assert_eq!(period.bucket(&offer), None);
        }
        assert_eq!(MonthPeriod::of(&offer), None);
        assert_eq!(calendar_date(&offer), None);
    }

    #[test]
    fn month_period_renders_and_orders() {
        let dec = MonthPeriod { year: 2023, month: 12 };
        let jan = MonthPeriod { year: 2024, month: 1 };
        assert!(dec < jan);
        assert_eq!(jan.to_string(), "2024-01");
    }

    #[test]
    fn period_tokens() {
        assert_eq!("month".parse::<Period>(), Ok(Period::Month));
        assert_eq!(
            "fortnight".parse::<Period>(),
            Err(ConfigError::InvalidPeriod {
                token: "fortnight".to_string()
            })
        );
    }
}
