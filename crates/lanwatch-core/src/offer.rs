//! Offer codes and their duration semantics.
//!
//! An offer is a named, billable allotment of network access. Most offers
//! are fixed durations; `DAY` and `NIGHT` are wall-clock bounded: they end
//! at a fixed local clock time computed from the session's start date, not
//! after a fixed elapsed time.

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};
use serde::{Deserialize, Serialize};

/// Local clock hour at which a `DAY` offer ends.
pub const DAY_END_HOUR: u32 = 18;
/// Local clock hour at which a `NIGHT` offer ends (the following morning).
pub const NIGHT_END_HOUR: u32 = 6;

/// The enumerated set of offer codes a device can be billed under.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Offer {
    #[serde(rename = "1H")]
    OneHour,
    #[serde(rename = "3H")]
    ThreeHours,
    #[serde(rename = "DAY")]
    Day,
    #[serde(rename = "NIGHT")]
    Night,
    #[serde(rename = "1S")]
    OneWeek,
    #[serde(rename = "2S")]
    TwoWeeks,
    #[serde(rename = "3S")]
    ThreeWeeks,
    #[serde(rename = "1M")]
    OneMonth,
}

impl Default for Offer {
    fn default() -> Self {
        Self::OneHour
    }
}

impl Offer {
    /// Parse an offer code. Unknown codes fall back to the shortest
    /// defined offer.
    pub fn parse(code: &str) -> Self {
        match code.trim().to_ascii_uppercase().as_str() {
            "1H" => Self::OneHour,
            "3H" => Self::ThreeHours,
            "DAY" => Self::Day,
            "NIGHT" => Self::Night,
            "1S" => Self::OneWeek,
            "2S" => Self::TwoWeeks,
            "3S" => Self::ThreeWeeks,
            "1M" => Self::OneMonth,
            _ => Self::OneHour,
        }
    }

    /// The wire code for this offer.
    pub fn code(&self) -> &'static str {
        match self {
            Self::OneHour => "1H",
            Self::ThreeHours => "3H",
            Self::Day => "DAY",
            Self::Night => "NIGHT",
            Self::OneWeek => "1S",
            Self::TwoWeeks => "2S",
            Self::ThreeWeeks => "3S",
            Self::OneMonth => "1M",
        }
    }

    /// Fixed elapsed duration of this offer, or `None` for the
    /// wall-clock-bounded offers.
    pub fn fixed_duration(&self) -> Option<Duration> {
        match self {
            Self::OneHour => Some(Duration::hours(1)),
            Self::ThreeHours => Some(Duration::hours(3)),
            Self::OneWeek => Some(Duration::days(7)),
            Self::TwoWeeks => Some(Duration::days(14)),
            Self::ThreeWeeks => Some(Duration::days(21)),
            Self::OneMonth => Some(Duration::days(30)),
            Self::Day | Self::Night => None,
        }
    }

    /// The boundary at which a session started at `start` under this
    /// offer ends. For `DAY`/`NIGHT` this is the next occurrence of the
    /// fixed local clock time strictly after `start`.
    pub fn ends_at<Tz: TimeZone>(&self, start: &DateTime<Tz>) -> DateTime<Tz> {
        match self {
            Self::Day => next_clock(start, DAY_END_HOUR),
            Self::Night => next_clock(start, NIGHT_END_HOUR),
            _ => {
                start.clone() + self.fixed_duration().unwrap_or_else(|| Duration::hours(1))
            }
        }
    }

    /// `ends_at` for UTC timestamps. Wall-clock boundaries are computed
    /// through the process-local timezone.
    pub fn ends_at_utc(&self, start: DateTime<Utc>) -> DateTime<Utc> {
        match self.fixed_duration() {
            Some(d) => start + d,
            None => self
                .ends_at(&start.with_timezone(&Local))
                .with_timezone(&Utc),
        }
    }
}

/// Next occurrence of `hour:00:00` strictly after `start`, in `start`'s
/// timezone.
fn next_clock<Tz: TimeZone>(start: &DateTime<Tz>, hour: u32) -> DateTime<Tz> {
    let tz = start.timezone();
    if let Some(t) = at_clock(&tz, start.date_naive(), hour) {
        if t > *start {
            return t;
        }
    }
    start
        .date_naive()
        .succ_opt()
        .and_then(|d| at_clock(&tz, d, hour))
        .unwrap_or_else(|| start.clone() + Duration::hours(24))
}

fn at_clock<Tz: TimeZone>(tz: &Tz, date: NaiveDate, hour: u32) -> Option<DateTime<Tz>> {
    let naive = date.and_hms_opt(hour, 0, 0)?;
    tz.from_local_datetime(&naive).earliest()
}
