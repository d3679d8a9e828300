//! Per-month activity table of a contributor.

use chrono::TimeZone;
use serde::{Deserialize, Serialize};

use super::calendar::{CalendarError, DatedList};
use super::userdata::UserStats;

/// Serialised form of a rate of change. JSON has no NaN or infinities, so
/// they get their own tags instead of collapsing into `null`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum RateOfChange {
    Value(f64),
    /// Growth from zero.
    Infinite,
    NegInfinite,
    /// Nothing earlier to compare with.
    NoHistory,
}

impl From<f64> for RateOfChange {
    fn from(rate: f64) -> Self {
        if rate.is_nan() {
            RateOfChange::NoHistory
        } else if rate == f64::INFINITY {
            RateOfChange::Infinite
        } else if rate == f64::NEG_INFINITY {
            RateOfChange::NegInfinite
        } else {
            RateOfChange::Value(rate)
        }
    }
}

impl From<RateOfChange> for f64 {
    fn from(rate: RateOfChange) -> Self {
        match rate {
            RateOfChange::Value(value) => value,
            RateOfChange::Infinite => f64::INFINITY,
            RateOfChange::NegInfinite => f64::NEG_INFINITY,
            RateOfChange::NoHistory => f64::NAN,
        }
    }
}

/// `None` stays `null`; any rate goes through [`RateOfChange`].
mod tagged_rate {
    use serde::{Deserialize, Deserializer, Serialize, Serializer};

    use super::RateOfChange;

    pub fn serialize<S: Serializer>(rate: &Option<f64>, serializer: S) -> Result<S::Ok, S::Error> {
        rate.map(RateOfChange::from).serialize(serializer)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<f64>, D::Error> {
        Ok(Option::<RateOfChange>::deserialize(deserializer)?.map(f64::from))
    }
}

/// Count and trend of one dated table in one month. Every field is `None`
/// when the month lies outside the observed window.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct ActivityCell {
    pub count: Option<usize>,
    #[serde(with = "tagged_rate")]
    pub month_on_month: Option<f64>,
    #[serde(with = "tagged_rate")]
    pub quarter_on_quarter: Option<f64>,
}

impl ActivityCell {
    pub fn of<T, Tz: TimeZone>(list: &DatedList<T, Tz>, year: i32, month: u32) -> Result<Self, CalendarError> {
        Ok(Self {
            count: list.monthly_item_count(year, month)?,
            month_on_month: list.month_on_month_change(year, month)?,
            quarter_on_quarter: list.quarter_on_quarter_change(year, month)?,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MonthActivity {
    pub month: u32,
    pub commits: ActivityCell,
    pub comments: ActivityCell,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YearActivity {
    pub year: i32,
    pub months: Vec<MonthActivity>,
}

/// Commits and written comments per month, for every year with commits,
/// most recent year first.
pub fn monthly_activity<Tz: TimeZone>(stats: &UserStats<'_, Tz>) -> Result<Vec<YearActivity>, CalendarError> {
    let commits = stats.dated_commit_table();
    let comments = stats.dated_comment_table();

    commits
        .active_years()
        .into_iter()
        .map(|year| -> Result<YearActivity, CalendarError> {
            let months = (1..=12)
                .map(|month| -> Result<MonthActivity, CalendarError> {
                    Ok(MonthActivity {
                        month,
                        commits: ActivityCell::of(commits, year, month)?,
                        comments: ActivityCell::of(comments, year, month)?,
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            Ok(YearActivity { year, months })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Comment, CommitComments, CommitRecord, UserRecord};
    use chrono::Utc;
    use pretty_assertions::assert_eq;

    fn millis(year: i32, month: u32, day: u32) -> i64 {
        Utc.with_ymd_and_hms(year, month, day, 12, 0, 0)
            .unwrap()
            .timestamp_millis()
    }

    fn commit_on(date: i64) -> CommitRecord {
        CommitRecord {
            created_on_date: date,
            ..Default::default()
        }
    }

    #[test]
    fn test_monthly_activity_table() {
        let record = UserRecord {
            commits: vec![
                commit_on(millis(2015, 11, 3)),
                commit_on(millis(2016, 1, 4)),
                commit_on(millis(2016, 2, 5)),
                commit_on(millis(2016, 2, 6)),
            ],
            comments_written: vec![CommitComments {
                commit: commit_on(millis(2016, 2, 1)),
                comments_by_user: vec![Comment::default(); 2],
            }],
            ..Default::default()
        };
        let stats = UserStats::with_timezone(&record, Utc)
            .unwrap()
            .frozen_at(Utc.with_ymd_and_hms(2016, 3, 15, 0, 0, 0).unwrap());

        let table = monthly_activity(&stats).unwrap();
        assert_eq!(table.iter().map(|y| y.year).collect::<Vec<_>>(), vec![2016, 2015]);
        assert!(table.iter().all(|y| y.months.len() == 12));

        let y2016 = &table[0].months;
        assert_eq!(y2016[0].commits.count, Some(1));
        assert_eq!(y2016[1].commits.count, Some(2));
        assert_eq!(y2016[1].commits.month_on_month, Some(1.0));
        // after the last commit
        assert_eq!(y2016[2].commits, ActivityCell::default());

        assert_eq!(y2016[1].comments.count, Some(2));
        assert_eq!(y2016[0].comments.count, None);

        let y2015 = &table[1].months;
        assert_eq!(y2015[9].commits.count, None);
        assert_eq!(y2015[10].commits.count, Some(1));
        // January against an empty December
        assert_eq!(y2016[0].commits.month_on_month, Some(f64::INFINITY));
    }

    #[test]
    fn test_cell_json_keeps_special_rates_apart() {
        let cell = ActivityCell {
            count: Some(3),
            month_on_month: Some(f64::INFINITY),
            quarter_on_quarter: Some(f64::NAN),
        };
        let json = serde_json::to_value(cell).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "count": 3,
                "month_on_month": {"kind": "infinite"},
                "quarter_on_quarter": {"kind": "no_history"}
            })
        );

        let back: ActivityCell = serde_json::from_value(json).unwrap();
        assert_eq!(back.month_on_month, Some(f64::INFINITY));
        assert!(back.quarter_on_quarter.is_some_and(f64::is_nan));

        let declined = ActivityCell {
            count: Some(0),
            month_on_month: Some(f64::NEG_INFINITY),
            quarter_on_quarter: Some(-0.5),
        };
        let json = serde_json::to_value(declined).unwrap();
        assert_eq!(json["month_on_month"], serde_json::json!({"kind": "neg_infinite"}));
        assert_eq!(json["quarter_on_quarter"], serde_json::json!({"kind": "value", "value": -0.5}));
        assert_eq!(serde_json::from_value::<ActivityCell>(json).unwrap(), declined);

        let outside = serde_json::to_value(ActivityCell::default()).unwrap();
        assert_eq!(
            outside,
            serde_json::json!({"count": null, "month_on_month": null, "quarter_on_quarter": null})
        );
        assert_eq!(serde_json::from_value::<ActivityCell>(outside).unwrap(), ActivityCell::default());
    }

    #[test]
    fn test_no_commits_no_table() {
        let record = UserRecord::default();
        let stats = UserStats::with_timezone(&record, Utc).unwrap();
        assert!(monthly_activity(&stats).unwrap().is_empty());
    }
}
