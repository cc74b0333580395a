//! Daily observation models

use chrono::{DateTime, Duration, NaiveDate, NaiveDateTime, Utc};
use rust_decimal::Decimal;
use std::fmt;

/// The calendar day a run collects for: the day before the run, at midnight.
/// Every observation of one run carries the same date.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ObservationDate(NaiveDate);

impl ObservationDate {
    pub fn from_run_time(run_time: DateTime<Utc>) -> Self {
        Self((run_time - Duration::days(1)).date_naive())
    }

    #[cfg(test)]
    pub fn from_ymd(year: i32, month: u32, day: u32) -> Self {
        Self(NaiveDate::from_ymd_opt(year, month, day).expect("valid calendar date"))
    }

    /// Midnight of the observation day, as stored in `PRICE_HISTORY_COMPLETE.TIMESTAMP`
    pub fn timestamp(&self) -> NaiveDateTime {
        self.0.and_time(chrono::NaiveTime::MIN)
    }

    /// `DD-MM-YYYY`, the format the history endpoint expects
    pub fn api_format(&self) -> String {
        self.0.format("%d-%m-%Y").to_string()
    }
}

impl fmt::Display for ObservationDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

/// One successfully collected price/market-cap/volume figure set for an asset
#[derive(Debug, Clone, PartialEq)]
pub struct Observation {
    pub asset_id: i64,
    pub timestamp: NaiveDateTime,
    pub price_usd: Decimal,
    pub market_cap_usd: Decimal,
    pub volume_24h_usd: Decimal,
}
