//! Calendar values
//!
//! A report date carries a flavor alongside the timestamp: a bare date, a
//! bare time of day, or a full date-time. The flavor decides how the value
//! is rendered and which components are meaningful.

use chrono::{NaiveDate, NaiveDateTime, NaiveTime};

/// Which parts of a [`DateValue`] are meaningful
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum DateFlavor {
    /// Calendar date only
    Date,
    /// Time of day only
    Time,
    /// Date and time of day
    DateTime,
}

/// A calendar value with its display flavor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct DateValue {
    /// The timestamp; for [`DateFlavor::Time`] the date part is the anchor day
    pub datetime: NaiveDateTime,
    /// Display flavor
    pub flavor: DateFlavor,
}

impl DateValue {
    /// Anchor day used for time-only values
    fn anchor() -> NaiveDate {
        NaiveDate::from_ymd_opt(1899, 12, 30).unwrap_or_default()
    }

    /// Create a date-flavored value at midnight
    pub fn from_date(date: NaiveDate) -> Self {
        Self {
            datetime: date.and_time(NaiveTime::MIN),
            flavor: DateFlavor::Date,
        }
    }

    /// Create a time-flavored value on the anchor day
    pub fn from_time(time: NaiveTime) -> Self {
        Self {
            datetime: Self::anchor().and_time(time),
            flavor: DateFlavor::Time,
        }
    }

    /// Create a date-time-flavored value
    pub fn from_datetime(datetime: NaiveDateTime) -> Self {
        Self {
            datetime,
            flavor: DateFlavor::DateTime,
        }
    }

    /// The calendar date component
    pub fn date(&self) -> NaiveDate {
        self.datetime.date()
    }

    /// The time-of-day component
    pub fn time(&self) -> NaiveTime {
        self.datetime.time()
    }
}
