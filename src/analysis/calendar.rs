//! Calendar bucketing of dated items.
//!
//! [`DatedList`] files every pushed item under the (year, month) of its
//! timestamp in a chosen time zone, and answers per-month counts and
//! month-on-month / quarter-on-quarter rates of change.
//!
//! Queries distinguish three outcomes:
//! - `Err(_)` for an invalid month,
//! - `Ok(None)` when the month lies outside the observed date window,
//! - `Ok(Some(value))` otherwise, where a rate may be `NaN` (no history) or
//!   infinite (growth from zero).

use std::collections::BTreeMap;

use chrono::{DateTime, Datelike, Local, TimeZone, Utc};
use thiserror::Error;

use crate::utils::{month_to_quarter, safe_rate_of_change};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CalendarError {
    #[error("month must be in [1..12] range, got {0}")]
    InvalidMonth(u32),
    #[error("timestamp {0} cannot be represented as a calendar date")]
    InvalidTimestamp(i64),
    #[error("{year}-{month:02} has no representable start of month")]
    InvalidDate { year: i32, month: u32 },
}

fn check_month(month: u32) -> Result<usize, CalendarError> {
    if (1..=12).contains(&month) {
        Ok((month - 1) as usize)
    } else {
        Err(CalendarError::InvalidMonth(month))
    }
}

/// Items of a single year, split by month.
#[derive(Debug, Clone)]
pub struct YearlyItemList<T> {
    months: [Vec<T>; 12],
}

impl<T> Default for YearlyItemList<T> {
    fn default() -> Self {
        Self {
            months: std::array::from_fn(|_| Vec::new()),
        }
    }
}

impl<T> YearlyItemList<T> {
    fn push(&mut self, month: u32, item: T) -> Result<(), CalendarError> {
        let idx = check_month(month)?;
        self.months[idx].push(item);
        Ok(())
    }

    /// Items of a month (1..=12).
    pub fn monthly_items(&self, month: u32) -> Result<&[T], CalendarError> {
        Ok(&self.months[check_month(month)?])
    }

    /// Item count of a month (1..=12).
    pub fn monthly_item_count(&self, month: u32) -> Result<usize, CalendarError> {
        Ok(self.monthly_items(month)?.len())
    }

    /// Item count of a zero-based quarter (0..=3).
    pub fn quarterly_item_count(&self, quarter: u32) -> usize {
        let start = (quarter.min(3) * 3) as usize;
        self.months[start..start + 3].iter().map(Vec::len).sum()
    }

    /// Items across the whole year.
    pub fn item_count(&self) -> usize {
        self.months.iter().map(Vec::len).sum()
    }

    /// Change against the previous month of the same year; `NaN` for January.
    pub fn month_on_month_change(&self, month: u32) -> Result<f64, CalendarError> {
        let idx = check_month(month)?;
        if idx == 0 {
            return Ok(f64::NAN);
        }
        Ok(safe_rate_of_change(
            self.months[idx - 1].len() as f64,
            self.months[idx].len() as f64,
        ))
    }

    /// Change against the previous quarter of the same year; `NaN` for Q0.
    pub fn quarter_on_quarter_change(&self, month: u32) -> Result<f64, CalendarError> {
        check_month(month)?;
        let quarter = month_to_quarter(month);
        if quarter == 0 {
            return Ok(f64::NAN);
        }
        Ok(safe_rate_of_change(
            self.quarterly_item_count(quarter - 1) as f64,
            self.quarterly_item_count(quarter) as f64,
        ))
    }
}

/// Items in calendar order: years, then months.
///
/// Bucketing uses `Tz` (the local zone by default). Items are only ever
/// appended; the observed window is the span between the earliest and latest
/// pushed timestamps.
#[derive(Debug, Clone)]
pub struct DatedList<T, Tz: TimeZone = Local> {
    years: BTreeMap<i32, YearlyItemList<T>>,
    min_date: Option<i64>,
    max_date: Option<i64>,
    tz: Tz,
    now: Option<DateTime<Utc>>,
}

impl<T> DatedList<T, Local> {
    /// An empty list bucketed in the local zone.
    pub fn new() -> Self {
        Self::with_timezone(Local)
    }
}

impl<T> Default for DatedList<T, Local> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, Tz: TimeZone> DatedList<T, Tz> {
    /// An empty list bucketed in `tz`.
    pub fn with_timezone(tz: Tz) -> Self {
        Self {
            years: BTreeMap::new(),
            min_date: None,
            max_date: None,
            tz,
            now: None,
        }
    }

    /// Builds a list from `items`, reading each timestamp (epoch millis) with `epoch`.
    pub fn from_items<I, F>(items: I, tz: Tz, epoch: F) -> Result<Self, CalendarError>
    where
        I: IntoIterator<Item = T>,
        F: Fn(&T) -> i64,
    {
        let mut list = Self::with_timezone(tz);
        for item in items {
            let timestamp = epoch(&item);
            list.push(item, timestamp)?;
        }
        Ok(list)
    }

    /// Pins "now" for future-month checks instead of reading the clock.
    pub fn frozen_at(mut self, now: DateTime<Utc>) -> Self {
        self.now = Some(now);
        self
    }

    /// Files `item` under the month of `timestamp` (epoch millis).
    pub fn push(&mut self, item: T, timestamp: i64) -> Result<(), CalendarError> {
        let date = self
            .tz
            .timestamp_millis_opt(timestamp)
            .single()
            .ok_or(CalendarError::InvalidTimestamp(timestamp))?;

        self.years
            .entry(date.year())
            .or_default()
            .push(date.month(), item)?;

        self.min_date = Some(self.min_date.map_or(timestamp, |min| min.min(timestamp)));
        self.max_date = Some(self.max_date.map_or(timestamp, |max| max.max(timestamp)));
        Ok(())
    }

    /// Whether nothing was pushed yet.
    pub fn is_empty(&self) -> bool {
        self.years.is_empty()
    }

    /// Number of pushed items.
    pub fn len(&self) -> usize {
        self.years.values().map(YearlyItemList::item_count).sum()
    }

    /// Earliest pushed timestamp (epoch millis).
    pub fn min_date(&self) -> Option<i64> {
        self.min_date
    }

    /// Latest pushed timestamp (epoch millis).
    pub fn max_date(&self) -> Option<i64> {
        self.max_date
    }

    /// Years holding at least one item, most recent first.
    pub fn active_years(&self) -> Vec<i32> {
        self.years.keys().rev().copied().collect()
    }

    /// Items of `year`, if it has any.
    pub fn year(&self, year: i32) -> Option<&YearlyItemList<T>> {
        self.years.get(&year)
    }

    /// Whether the month overlaps the observed window and has started.
    pub fn is_date_within_range(&self, year: i32, month: u32) -> Result<bool, CalendarError> {
        check_month(month)?;
        let (Some(min_date), Some(max_date)) = (self.min_date, self.max_date) else {
            return Ok(false);
        };

        let month_start = self.month_start(year, month)?;
        let next_month_start = if month == 12 {
            self.month_start(year + 1, 1)?
        } else {
            self.month_start(year, month + 1)?
        };
        let now = self.now.unwrap_or_else(Utc::now).timestamp_millis();

        Ok(month_start <= now && min_date < next_month_start && max_date >= month_start)
    }

    /// Items pushed for the month, `None` outside the observed window.
    pub fn monthly_items(&self, year: i32, month: u32) -> Result<Option<&[T]>, CalendarError> {
        if !self.is_date_within_range(year, month)? {
            return Ok(None);
        }
        match self.years.get(&year) {
            Some(items) => items.monthly_items(month).map(Some),
            None => Ok(Some(&[][..])),
        }
    }

    /// Item count of the month, `None` outside the observed window.
    pub fn monthly_item_count(&self, year: i32, month: u32) -> Result<Option<usize>, CalendarError> {
        Ok(self.monthly_items(year, month)?.map(<[T]>::len))
    }

    /// Month-on-month change. January compares against December of the
    /// previous year, and is `NaN` when that year has no items.
    pub fn month_on_month_change(&self, year: i32, month: u32) -> Result<Option<f64>, CalendarError> {
        if !self.is_date_within_range(year, month)? {
            return Ok(None);
        }
        let Some(items) = self.years.get(&year) else {
            return Ok(Some(f64::NAN));
        };
        if month > 1 {
            return items.month_on_month_change(month).map(Some);
        }

        let change = match self.years.get(&(year - 1)) {
            Some(prev_year) => safe_rate_of_change(
                prev_year.monthly_item_count(12)? as f64,
                items.monthly_item_count(1)? as f64,
            ),
            None => f64::NAN,
        };
        Ok(Some(change))
    }

    /// Quarter-on-quarter change. Q0 compares against Q3 of the previous
    /// year, and is `NaN` when that year has no items.
    pub fn quarter_on_quarter_change(&self, year: i32, month: u32) -> Result<Option<f64>, CalendarError> {
        if !self.is_date_within_range(year, month)? {
            return Ok(None);
        }
        let Some(items) = self.years.get(&year) else {
            return Ok(Some(f64::NAN));
        };
        if month_to_quarter(month) > 0 {
            return items.quarter_on_quarter_change(month).map(Some);
        }

        let change = match self.years.get(&(year - 1)) {
            Some(prev_year) => safe_rate_of_change(
                prev_year.quarterly_item_count(3) as f64,
                items.quarterly_item_count(0) as f64,
            ),
            None => f64::NAN,
        };
        Ok(Some(change))
    }

    fn month_start(&self, year: i32, month: u32) -> Result<i64, CalendarError> {
        // Midnight can fall into a DST gap; the first hour after it then starts the month.
        self.tz
            .with_ymd_and_hms(year, month, 1, 0, 0, 0)
            .earliest()
            .or_else(|| self.tz.with_ymd_and_hms(year, month, 1, 1, 0, 0).earliest())
            .map(|start| start.timestamp_millis())
            .ok_or(CalendarError::InvalidDate { year, month })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn millis(year: i32, month: u32, day: u32) -> i64 {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn far_future() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2100, 1, 1, 0, 0, 0).unwrap()
    }

    fn list_of(dates: &[(i32, u32, u32)]) -> DatedList<(i32, u32, u32), Utc> {
        DatedList::from_items(dates.iter().copied(), Utc, |&(y, m, d)| millis(y, m, d))
            .unwrap()
            .frozen_at(far_future())
    }

    #[test]
    fn test_bucketing_and_active_years() {
        let list = list_of(&[(2015, 3, 1), (2016, 1, 5), (2016, 1, 20), (2014, 12, 31)]);

        assert_eq!(list.active_years(), vec![2016, 2015, 2014]);
        assert_eq!(list.len(), 4);
        assert_eq!(list.monthly_item_count(2016, 1).unwrap(), Some(2));
        assert_eq!(list.monthly_item_count(2015, 3).unwrap(), Some(1));
        assert_eq!(list.monthly_item_count(2015, 4).unwrap(), Some(0));
    }

    #[test]
    fn test_active_years_is_restartable() {
        let list = list_of(&[(2015, 3, 1), (2016, 1, 5)]);
        assert_eq!(list.active_years(), list.active_years());
    }

    #[test]
    fn test_push_order_does_not_matter() {
        let dates = [(2015, 3, 1), (2016, 1, 5), (2016, 1, 20), (2014, 12, 31), (2015, 7, 7)];
        let mut reversed = dates;
        reversed.reverse();

        let forward = list_of(&dates);
        let backward = list_of(&reversed);

        assert_eq!(forward.active_years(), backward.active_years());
        for year in forward.active_years() {
            for month in 1..=12 {
                assert_eq!(
                    forward.monthly_item_count(year, month).unwrap(),
                    backward.monthly_item_count(year, month).unwrap()
                );
            }
        }
    }

    #[test]
    fn test_invalid_month_is_an_error() {
        let list = list_of(&[(2015, 3, 1)]);
        assert_eq!(list.monthly_item_count(2015, 0), Err(CalendarError::InvalidMonth(0)));
        assert_eq!(list.month_on_month_change(2015, 13), Err(CalendarError::InvalidMonth(13)));
    }

    #[test]
    fn test_out_of_range_is_not_zero() {
        let list = list_of(&[(2015, 3, 10), (2015, 6, 10)]);

        assert_eq!(list.monthly_item_count(2015, 2).unwrap(), None);
        assert_eq!(list.monthly_item_count(2015, 7).unwrap(), None);
        assert_eq!(list.monthly_item_count(2015, 4).unwrap(), Some(0));
        assert_eq!(list.month_on_month_change(2015, 7).unwrap(), None);
    }

    #[test]
    fn test_empty_list_has_no_range() {
        let list: DatedList<u8, Utc> = DatedList::with_timezone(Utc);
        assert!(list.is_empty());
        assert_eq!(list.is_date_within_range(2015, 1).unwrap(), false);
        assert_eq!(list.monthly_item_count(2015, 1).unwrap(), None);
    }

    #[test]
    fn test_future_months_are_out_of_range() {
        let now = Utc.with_ymd_and_hms(2015, 5, 15, 0, 0, 0).unwrap();
        let list = DatedList::from_items([millis(2015, 1, 1), millis(2015, 12, 1)], Utc, |&ts| ts)
            .unwrap()
            .frozen_at(now);

        assert_eq!(list.is_date_within_range(2015, 5).unwrap(), true);
        assert_eq!(list.is_date_within_range(2015, 6).unwrap(), false);
    }

    #[test]
    fn test_month_on_month_change() {
        let list = list_of(&[
            (2015, 1, 1),
            (2015, 2, 1),
            (2015, 2, 2),
            (2015, 3, 1),
            (2015, 5, 1),
        ]);

        assert!(list.month_on_month_change(2015, 1).unwrap().unwrap().is_nan());
        assert_eq!(list.month_on_month_change(2015, 2).unwrap(), Some(1.0));
        assert_eq!(list.month_on_month_change(2015, 3).unwrap(), Some(-0.5));
        assert_eq!(list.month_on_month_change(2015, 4).unwrap(), Some(-1.0));
        assert_eq!(list.month_on_month_change(2015, 5).unwrap(), Some(f64::INFINITY));
    }

    #[test]
    fn test_january_compares_with_previous_december() {
        let list = list_of(&[(2014, 12, 1), (2014, 12, 2), (2015, 1, 3)]);
        assert_eq!(list.month_on_month_change(2015, 1).unwrap(), Some(-0.5));
    }

    #[test]
    fn test_quarter_on_quarter_change() {
        let list = list_of(&[
            (2014, 11, 1),
            (2015, 1, 1),
            (2015, 2, 1),
            (2015, 4, 1),
            (2015, 5, 1),
            (2015, 6, 1),
            (2015, 8, 1),
        ]);

        assert_eq!(list.quarter_on_quarter_change(2015, 2).unwrap(), Some(1.0));
        assert_eq!(list.quarter_on_quarter_change(2015, 5).unwrap(), Some(0.5));
        assert_eq!(list.quarter_on_quarter_change(2015, 8).unwrap(), Some(-(1.0 - 1.0 / 3.0)));
    }

    #[test]
    fn test_first_quarter_without_history_is_nan() {
        let list = list_of(&[(2015, 1, 1), (2015, 4, 1)]);
        assert!(list.quarter_on_quarter_change(2015, 2).unwrap().unwrap().is_nan());
        assert_eq!(list.quarter_on_quarter_change(2015, 4).unwrap(), Some(0.0));
    }

    #[test]
    fn test_year_without_items_inside_window() {
        let list = list_of(&[(2014, 6, 1), (2016, 6, 1)]);

        assert_eq!(list.monthly_item_count(2015, 6).unwrap(), Some(0));
        assert!(list.month_on_month_change(2015, 6).unwrap().unwrap().is_nan());
    }
}
