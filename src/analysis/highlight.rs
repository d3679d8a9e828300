//! Percentile-style highlighting of overview table cells.
//!
//! A highlighter collects the values of one metric over the selected part of
//! the population, sorts them best-first and removes duplicates. The first
//! positions of that ladder are ranked `top-1..top-5`, the last positions
//! `bottom-5..bottom-1`. A value is ranked by the position of its first
//! occurrence, so ties share a tier.

use std::fmt;
use std::str::FromStr;

use once_cell::unsync::OnceCell;
use serde::{Deserialize, Serialize, Serializer};

use super::selection::InclusionSet;
use crate::types::OverviewRecord;

/// Number of ladder positions ranked at each end.
pub const TIER_WINDOW: usize = 5;

/// Best to worst.
const TOP_COLORS: [&str; TIER_WINDOW] = ["#beffec", "#eeffed", "#f9feee", "#fefcee", "#fffaee"];
/// Worst to best.
const BOTTOM_COLORS: [&str; TIER_WINDOW] = ["#ffcdf3", "#ffdff6", "#ffe0f0", "#ffc2d4", "#fff0ef"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct HighlightOptions {
    pub use_ascending_sort: bool,
    pub ignore_zeroes: bool,
    pub highlight_positive_entries: bool,
    pub highlight_negative_entries: bool,
}

impl Default for HighlightOptions {
    fn default() -> Self {
        Self {
            use_ascending_sort: false,
            ignore_zeroes: false,
            highlight_positive_entries: true,
            highlight_negative_entries: true,
        }
    }
}

/// Rank bucket of a highlighted value. `Top(1)` is the best value,
/// `Bottom(1)` the worst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HighlightTier {
    Top(u8),
    Bottom(u8),
    None,
}

impl HighlightTier {
    pub fn is_top(self) -> bool {
        matches!(self, HighlightTier::Top(_))
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, HighlightTier::Bottom(_))
    }

    /// Cell background for the tier.
    pub fn color(self) -> Option<&'static str> {
        match self {
            HighlightTier::Top(rank) => TOP_COLORS.get(usize::from(rank).checked_sub(1)?).copied(),
            HighlightTier::Bottom(rank) => {
                BOTTOM_COLORS.get(usize::from(rank).checked_sub(1)?).copied()
            }
            HighlightTier::None => None,
        }
    }
}

impl fmt::Display for HighlightTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HighlightTier::Top(rank) => write!(f, "top-{rank}"),
            HighlightTier::Bottom(rank) => write!(f, "bottom-{rank}"),
            HighlightTier::None => f.write_str("none"),
        }
    }
}

impl Serialize for HighlightTier {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Records a metric never ranks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IgnoreRule {
    /// Contributors without any commits; their received-comment numbers are meaningless.
    WithoutCommits,
}

impl IgnoreRule {
    pub fn ignores(self, record: &OverviewRecord) -> bool {
        match self {
            IgnoreRule::WithoutCommits => record.commit_count == 0,
        }
    }
}

/// The numeric columns of the overview table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum OverviewMetric {
    ReviewCountPlus2,
    ReviewCountPlus1,
    ReviewCountMinus1,
    ReviewCountMinus2,
    AllCommentsWritten,
    AllCommentsReceived,
    CommitCount,
    ReceivedCommentRatio,
    ReviewCommentRatio,
    AddedAsReviewerToCount,
    SelfReviewedCommitCount,
    AverageTimeInCodeReview,
}

impl OverviewMetric {
    pub const ALL: [OverviewMetric; 12] = [
        OverviewMetric::ReviewCountPlus2,
        OverviewMetric::ReviewCountPlus1,
        OverviewMetric::ReviewCountMinus1,
        OverviewMetric::ReviewCountMinus2,
        OverviewMetric::AllCommentsWritten,
        OverviewMetric::AllCommentsReceived,
        OverviewMetric::CommitCount,
        OverviewMetric::ReceivedCommentRatio,
        OverviewMetric::ReviewCommentRatio,
        OverviewMetric::AddedAsReviewerToCount,
        OverviewMetric::SelfReviewedCommitCount,
        OverviewMetric::AverageTimeInCodeReview,
    ];

    /// Field name in the overview export.
    pub fn key(self) -> &'static str {
        match self {
            OverviewMetric::ReviewCountPlus2 => "reviewCountPlus2",
            OverviewMetric::ReviewCountPlus1 => "reviewCountPlus1",
            OverviewMetric::ReviewCountMinus1 => "reviewCountMinus1",
            OverviewMetric::ReviewCountMinus2 => "reviewCountMinus2",
            OverviewMetric::AllCommentsWritten => "allCommentsWritten",
            OverviewMetric::AllCommentsReceived => "allCommentsReceived",
            OverviewMetric::CommitCount => "commitCount",
            OverviewMetric::ReceivedCommentRatio => "receivedCommentRatio",
            OverviewMetric::ReviewCommentRatio => "reviewCommentRatio",
            OverviewMetric::AddedAsReviewerToCount => "addedAsReviewerToCount",
            OverviewMetric::SelfReviewedCommitCount => "selfReviewedCommitCount",
            OverviewMetric::AverageTimeInCodeReview => "averageTimeInCodeReview",
        }
    }

    pub fn value(self, record: &OverviewRecord) -> f64 {
        match self {
            OverviewMetric::ReviewCountPlus2 => record.review_count_plus2 as f64,
            OverviewMetric::ReviewCountPlus1 => record.review_count_plus1 as f64,
            OverviewMetric::ReviewCountMinus1 => record.review_count_minus1 as f64,
            OverviewMetric::ReviewCountMinus2 => record.review_count_minus2 as f64,
            OverviewMetric::AllCommentsWritten => record.all_comments_written as f64,
            OverviewMetric::AllCommentsReceived => record.all_comments_received as f64,
            OverviewMetric::CommitCount => record.commit_count as f64,
            OverviewMetric::ReceivedCommentRatio => record.received_comment_ratio,
            OverviewMetric::ReviewCommentRatio => record.review_comment_ratio,
            OverviewMetric::AddedAsReviewerToCount => record.added_as_reviewer_to_count as f64,
            OverviewMetric::SelfReviewedCommitCount => record.self_reviewed_commit_count as f64,
            OverviewMetric::AverageTimeInCodeReview => record.average_time_in_code_review as f64,
        }
    }

    /// The column's table preset applied on top of `base`.
    pub fn table_options(self, base: HighlightOptions) -> HighlightOptions {
        match self {
            OverviewMetric::AllCommentsReceived | OverviewMetric::ReceivedCommentRatio => {
                HighlightOptions {
                    use_ascending_sort: true,
                    ..base
                }
            }
            OverviewMetric::CommitCount => HighlightOptions {
                ignore_zeroes: true,
                ..base
            },
            OverviewMetric::SelfReviewedCommitCount => HighlightOptions {
                use_ascending_sort: true,
                ignore_zeroes: true,
                highlight_positive_entries: false,
                ..base
            },
            OverviewMetric::AverageTimeInCodeReview => HighlightOptions {
                use_ascending_sort: true,
                ignore_zeroes: true,
                ..base
            },
            _ => base,
        }
    }

    pub fn ignore_rule(self) -> Option<IgnoreRule> {
        match self {
            OverviewMetric::AllCommentsReceived | OverviewMetric::ReceivedCommentRatio => {
                Some(IgnoreRule::WithoutCommits)
            }
            _ => None,
        }
    }
}

impl fmt::Display for OverviewMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for OverviewMetric {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        OverviewMetric::ALL
            .into_iter()
            .find(|metric| metric.key() == value)
            .ok_or_else(|| {
                let known: Vec<&str> = OverviewMetric::ALL.iter().map(|m| m.key()).collect();
                format!("invalid metric '{value}', expected one of: {}", known.join(", "))
            })
    }
}

/// Sorted unique metric values, best first.
#[derive(Debug, Clone, PartialEq)]
pub struct HighlightLadder {
    values: Vec<f64>,
    options: HighlightOptions,
}

impl HighlightLadder {
    /// Builds a ladder from raw values. `NaN` values cannot be ranked and are dropped.
    pub fn from_values<I>(values: I, options: HighlightOptions) -> Self
    where
        I: IntoIterator<Item = f64>,
    {
        let mut values: Vec<f64> = values.into_iter().filter(|v| !v.is_nan()).collect();
        values.sort_by(|l, r| {
            let ordering = l.total_cmp(r);
            if options.use_ascending_sort {
                ordering
            } else {
                ordering.reverse()
            }
        });
        values.dedup();
        Self { values, options }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Tier of `value`. The top check runs first: with a single unique value
    /// that value is `Top(1)`. A ladder shorter than the window leaves its
    /// last rung for the bottom tiers.
    pub fn tier_for_value(&self, value: f64) -> HighlightTier {
        let len = self.values.len();
        let Some(idx) = self.values.iter().position(|&v| v == value) else {
            return HighlightTier::None;
        };

        let top_window = if len < TIER_WINDOW {
            len.saturating_sub(1).max(1)
        } else {
            TIER_WINDOW
        };
        if self.options.highlight_positive_entries && idx < top_window {
            return HighlightTier::Top((idx + 1) as u8);
        }

        let bottom_window = TIER_WINDOW.min(len);
        if self.options.highlight_negative_entries && idx >= len - bottom_window {
            return HighlightTier::Bottom((len - idx) as u8);
        }

        HighlightTier::None
    }
}

/// Assigns highlight tiers for one metric over the selected population.
///
/// The ladder is derived lazily on first use and cached. The highlighter
/// borrows both the population and the selection, so neither can change
/// while a cached ladder is alive; build a new highlighter after a change.
pub struct PercentileHighlighter<'a> {
    population: &'a [OverviewRecord],
    selection: &'a InclusionSet,
    metric: OverviewMetric,
    options: HighlightOptions,
    ignore: Option<Box<dyn Fn(&OverviewRecord) -> bool + 'a>>,
    ladder: OnceCell<HighlightLadder>,
}

impl<'a> PercentileHighlighter<'a> {
    pub fn new(
        population: &'a [OverviewRecord],
        selection: &'a InclusionSet,
        metric: OverviewMetric,
    ) -> Self {
        Self {
            population,
            selection,
            metric,
            options: HighlightOptions::default(),
            ignore: None,
            ladder: OnceCell::new(),
        }
    }

    /// A highlighter configured with the metric's table preset on top of `base`.
    pub fn for_table(
        population: &'a [OverviewRecord],
        selection: &'a InclusionSet,
        metric: OverviewMetric,
        base: HighlightOptions,
    ) -> Self {
        let highlighter = Self::new(population, selection, metric).with_options(metric.table_options(base));
        match metric.ignore_rule() {
            Some(rule) => highlighter.ignore_when(move |record| rule.ignores(record)),
            None => highlighter,
        }
    }

    pub fn with_options(mut self, options: HighlightOptions) -> Self {
        self.options = options;
        self.ladder = OnceCell::new();
        self
    }

    pub fn ascending(self, use_ascending_sort: bool) -> Self {
        let options = HighlightOptions {
            use_ascending_sort,
            ..self.options
        };
        self.with_options(options)
    }

    pub fn ignore_zeroes(self, ignore_zeroes: bool) -> Self {
        let options = HighlightOptions {
            ignore_zeroes,
            ..self.options
        };
        self.with_options(options)
    }

    pub fn highlight_positive_entries(self, highlight_positive_entries: bool) -> Self {
        let options = HighlightOptions {
            highlight_positive_entries,
            ..self.options
        };
        self.with_options(options)
    }

    pub fn highlight_negative_entries(self, highlight_negative_entries: bool) -> Self {
        let options = HighlightOptions {
            highlight_negative_entries,
            ..self.options
        };
        self.with_options(options)
    }

    /// Excludes records for which `ignore` returns true from ranking.
    pub fn ignore_when<F>(mut self, ignore: F) -> Self
    where
        F: Fn(&OverviewRecord) -> bool + 'a,
    {
        self.ignore = Some(Box::new(ignore));
        self.ladder = OnceCell::new();
        self
    }

    pub fn metric(&self) -> OverviewMetric {
        self.metric
    }

    pub fn options(&self) -> HighlightOptions {
        self.options
    }

    fn is_filtered(&self, record: &OverviewRecord) -> bool {
        let value = self.metric.value(record);
        if self.options.ignore_zeroes && (value == 0.0 || value.is_nan()) {
            return true;
        }
        if self.ignore.as_ref().is_some_and(|ignore| ignore(record)) {
            return true;
        }
        !self.selection.contains(&record.identifier)
    }

    pub fn ladder(&self) -> &HighlightLadder {
        self.ladder.get_or_init(|| {
            let values = self
                .population
                .iter()
                .filter(|record| !self.is_filtered(record))
                .map(|record| self.metric.value(record));
            HighlightLadder::from_values(values, self.options)
        })
    }

    pub fn tier(&self, record: &OverviewRecord) -> HighlightTier {
        let ladder = self.ladder();
        if ladder.is_empty() || self.is_filtered(record) {
            return HighlightTier::None;
        }
        ladder.tier_for_value(self.metric.value(record))
    }

    /// Tier of every population record, in population order.
    pub fn tiers(&self) -> Vec<(&'a str, HighlightTier)> {
        self.population
            .iter()
            .map(|record| (record.identifier.as_str(), self.tier(record)))
            .collect()
    }
}
