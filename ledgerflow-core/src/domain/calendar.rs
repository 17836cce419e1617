// ledgerflow-core/src/domain/calendar.rs
//
// Calendar spine for the date dimension. Independent of the dates observed in the facts.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::domain::error::DomainError;

/// A calendar month, the atomic time grain of the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    year: i32,
    month: u32,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Result<Self, DomainError> {
        if !(1..=12).contains(&month) {
            return Err(DomainError::InvalidHorizon(format!(
                "month {} is out of range 1..=12",
                month
            )));
        }
        // Rejects years chrono cannot represent.
        NaiveDate::from_ymd_opt(year, month, 1)
            .ok_or_else(|| DomainError::InvalidHorizon(format!("year {} is out of range", year)))?;
        Ok(Self { year, month })
    }

    pub fn year(&self) -> i32 {
        self.year
    }

    pub fn month(&self) -> u32 {
        self.month
    }

    /// First calendar day of the month. Always valid by construction.
    pub fn first_day(&self) -> NaiveDate {
        NaiveDate::from_ymd_opt(self.year, self.month, 1).unwrap_or(NaiveDate::MIN)
    }

    pub fn succ(&self) -> Self {
        if self.month == 12 {
            Self {
                year: self.year + 1,
                month: 1,
            }
        } else {
            Self {
                year: self.year,
                month: self.month + 1,
            }
        }
    }
}

impl FromStr for YearMonth {
    type Err = DomainError;

    /// Parses `YYYY-MM`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || DomainError::InvalidHorizon(format!("'{}' is not a YYYY-MM month", s));
        let (y, m) = s.trim().split_once('-').ok_or_else(invalid)?;
        let year: i32 = y.parse().map_err(|_| invalid())?;
        let month: u32 = m.parse().map_err(|_| invalid())?;
        YearMonth::new(year, month)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.year, self.month)
    }
}

impl Serialize for YearMonth {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for YearMonth {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}

/// Inclusive range of months.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawHorizon")]
pub struct MonthHorizon {
    pub start: YearMonth,
    pub end: YearMonth,
}

impl MonthHorizon {
    pub fn new(start: YearMonth, end: YearMonth) -> Result<Self, DomainError> {
        if start > end {
            return Err(DomainError::InvalidHorizon(format!(
                "start {} is after end {}",
                start, end
            )));
        }
        Ok(Self { start, end })
    }

    pub fn months(&self) -> impl Iterator<Item = YearMonth> + '_ {
        std::iter::successors(Some(self.start), move |current| {
            let next = current.succ();
            (next <= self.end).then_some(next)
        })
    }

    pub fn len(&self) -> usize {
        let span = (self.end.year - self.start.year) * 12 + self.end.month as i32
            - self.start.month as i32;
        span as usize + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    pub fn rows(&self) -> Vec<CalendarRow> {
        self.months().map(CalendarRow::from).collect()
    }
}

#[derive(Deserialize)]
struct RawHorizon {
    start: YearMonth,
    end: YearMonth,
}

impl TryFrom<RawHorizon> for MonthHorizon {
    type Error = DomainError;

    fn try_from(raw: RawHorizon) -> Result<Self, Self::Error> {
        Self::new(raw.start, raw.end)
    }
}

impl Default for MonthHorizon {
    fn default() -> Self {
        Self {
            start: YearMonth {
                year: 2023,
                month: 1,
            },
            end: YearMonth {
                year: 2025,
                month: 12,
            },
        }
    }
}

/// One row of the date dimension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CalendarRow {
    pub date: NaiveDate,
    /// Stable human-readable label, e.g. `Mar 2024`.
    pub month_id: String,
    pub year: i32,
    pub month: u32,
    pub month_name: String,
}

impl From<YearMonth> for CalendarRow {
    fn from(ym: YearMonth) -> Self {
        let date = ym.first_day();
        Self {
            date,
            month_id: date.format("%b %Y").to_string(),
            year: date.year(),
            month: date.month(),
            month_name: date.format("%B").to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    #[test]
    fn test_parse_year_month() -> Result<()> {
        let ym: YearMonth = "2024-03".parse()?;
        assert_eq!((ym.year(), ym.month()), (2024, 3));
        assert_eq!(ym.to_string(), "2024-03");
        assert!("2024-13".parse::<YearMonth>().is_err());
        assert!("2024/03".parse::<YearMonth>().is_err());
        Ok(())
    }

    #[test]
    fn test_default_horizon_is_contiguous() {
        let horizon = MonthHorizon::default();
        let rows = horizon.rows();

        assert_eq!(rows.len(), 36);
        assert_eq!(horizon.len(), 36);
        for pair in rows.windows(2) {
            let expected = YearMonth::new(pair[0].year, pair[0].month)
                .map(|ym| ym.succ().first_day())
                .ok();
            assert_eq!(Some(pair[1].date), expected, "gap or duplicate after {:?}", pair[0]);
        }
        assert_eq!(rows[0].date, NaiveDate::from_ymd_opt(2023, 1, 1).unwrap_or_default());
        assert_eq!(rows[35].month_id, "Dec 2025");
    }

    #[test]
    fn test_single_month_horizon() -> Result<()> {
        let m: YearMonth = "2024-02".parse()?;
        let horizon = MonthHorizon::new(m, m)?;
        assert_eq!(horizon.rows().len(), 1);
        Ok(())
    }

    #[test]
    fn test_inverted_horizon_rejected() -> Result<()> {
        let res = MonthHorizon::new("2025-01".parse()?, "2024-12".parse()?);
        assert!(matches!(res, Err(DomainError::InvalidHorizon(_))));
        Ok(())
    }

    #[test]
    fn test_calendar_labels() -> Result<()> {
        let horizon = MonthHorizon::new("2024-11".parse()?, "2025-02".parse()?)?;
        let labels: Vec<String> = horizon
            .rows()
            .iter()
            .map(|r| format!("{} {} {}-{} {}", r.date, r.month_id, r.year, r.month, r.month_name))
            .collect();
        insta::assert_snapshot!(labels.join("\n"), @r"
        2024-11-01 Nov 2024 2024-11 November
        2024-12-01 Dec 2024 2024-12 December
        2025-01-01 Jan 2025 2025-1 January
        2025-02-01 Feb 2025 2025-2 February
        ");
        Ok(())
    }
}
