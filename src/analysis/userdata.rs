//! Derived statistics for a single contributor.
//!
//! [`UserStats`] borrows one [`UserRecord`] and answers every query a
//! profile page needs. Counts that involve other people are scoped to an
//! [`InclusionSet`] passed per call, so the same stats can be reused while
//! the selection changes.

use std::collections::BTreeSet;
use std::time::Duration;

use chrono::{DateTime, Local, NaiveDate, TimeZone, Utc};
use serde::Serialize;

use super::calendar::{CalendarError, DatedList};
use super::selection::InclusionSet;
use crate::types::{Comment, CommitComments, CommitRecord, PatchSetKind, ReviewerEntry, UserRecord};

pub const DEFAULT_HIGH_PATCH_SET_COUNT_THRESHOLD: usize = 5;

/// A comment the user wrote, dated by the commit it was written on.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DatedComment<'a> {
    pub commit: &'a CommitRecord,
    pub comment: &'a Comment,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DatedPatchSetCount<'a> {
    /// Epoch milliseconds of the commit.
    pub date: i64,
    pub count: usize,
    pub commit: &'a CommitRecord,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProjectActivity {
    pub url: String,
    pub name: String,
    pub commit_count: u64,
    pub comments_written: u64,
}

fn rework_count(commit: &CommitRecord) -> usize {
    commit.patch_set_count_for_kind(PatchSetKind::Rework)
}

/// Most frequently added reviewers first, ties broken by email.
fn sort_by_added_as_reviewer_count(entries: &mut [&ReviewerEntry]) {
    entries.sort_by(|l, r| {
        r.added_as_reviewer_count()
            .cmp(&l.added_as_reviewer_count())
            .then_with(|| l.identity.email.cmp(&r.identity.email))
    });
}

fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        f64::NAN
    } else {
        numerator as f64 / denominator as f64
    }
}

pub struct UserStats<'a, Tz: TimeZone = Local> {
    record: &'a UserRecord,
    commit_table: DatedList<&'a CommitRecord, Tz>,
    comment_table: DatedList<DatedComment<'a>, Tz>,
    tz: Tz,
}

impl<'a> UserStats<'a, Local> {
    pub fn new(record: &'a UserRecord) -> Result<Self, CalendarError> {
        Self::with_timezone(record, Local)
    }
}

impl<'a, Tz: TimeZone> UserStats<'a, Tz> {
    /// Buckets commits and written comments by month in `tz`.
    ///
    /// Every written comment is filed separately, so monthly comment counts
    /// are comments and not commits that received comments.
    pub fn with_timezone(record: &'a UserRecord, tz: Tz) -> Result<Self, CalendarError> {
        let commit_table =
            DatedList::from_items(record.commits.iter(), tz.clone(), |commit| commit.created_on_date)?;

        let comments = record.comments_written.iter().flat_map(|written| {
            written.comments_by_user.iter().map(move |comment| DatedComment {
                commit: &written.commit,
                comment,
            })
        });
        let comment_table =
            DatedList::from_items(comments, tz.clone(), |dated| dated.commit.created_on_date)?;

        Ok(Self {
            record,
            commit_table,
            comment_table,
            tz,
        })
    }

    /// Pins "now" of both dated tables.
    pub fn frozen_at(self, now: DateTime<Utc>) -> Self {
        Self {
            commit_table: self.commit_table.frozen_at(now),
            comment_table: self.comment_table.frozen_at(now),
            ..self
        }
    }

    pub fn record(&self) -> &'a UserRecord {
        self.record
    }

    pub fn identifier(&self) -> &'a str {
        &self.record.identity.identifier
    }

    pub fn printable_name(&self) -> String {
        self.record.identity.printable_name()
    }

    pub fn dated_commit_table(&self) -> &DatedList<&'a CommitRecord, Tz> {
        &self.commit_table
    }

    pub fn dated_comment_table(&self) -> &DatedList<DatedComment<'a>, Tz> {
        &self.comment_table
    }

    pub fn commit_count(&self) -> usize {
        self.record.commits.len()
    }

    pub fn abandoned_commit_count(&self) -> u64 {
        self.record.abandoned_commit_count
    }

    pub fn in_review_commit_count(&self) -> u64 {
        self.record.in_review_commit_count
    }

    pub fn self_reviewed_commit_count(&self) -> u64 {
        self.record.self_reviewed_commit_count
    }

    pub fn average_time_in_code_review(&self) -> Duration {
        Duration::from_millis(self.record.average_time_in_code_review)
    }

    pub fn first_active_date(&self) -> Option<i64> {
        self.record.first_active_date
    }

    pub fn last_active_date(&self) -> Option<i64> {
        self.record.last_active_date
    }

    pub fn active_day_count(&self) -> u32 {
        self.record.active_day_count
    }

    /// Approvals with `score` the user gave to selected people.
    pub fn reviews_given_for_score(&self, score: i32, inclusion: &InclusionSet) -> u64 {
        sum_selected(&self.record.review_requestors, inclusion, |entry| {
            entry.approval_data.approvals_for_score(score)
        })
    }

    /// Approvals with `score` selected people gave to the user.
    pub fn reviews_received_for_score(&self, score: i32, inclusion: &InclusionSet) -> u64 {
        sum_selected(&self.record.reviewers_for_own_commits, inclusion, |entry| {
            entry.approval_data.approvals_for_score(score)
        })
    }

    pub fn comments_written_count(&self, inclusion: &InclusionSet) -> u64 {
        sum_selected(&self.record.review_requestors, inclusion, |entry| {
            entry.approval_data.comment_count
        })
    }

    pub fn all_comments_received(&self, inclusion: &InclusionSet) -> u64 {
        sum_selected(&self.record.reviewers_for_own_commits, inclusion, |entry| {
            entry.approval_data.comment_count
        })
    }

    pub fn added_as_reviewer_to_count(&self, inclusion: &InclusionSet) -> u64 {
        sum_selected(&self.record.review_requestors, inclusion, |entry| {
            entry.approval_data.added_as_reviewer_count
        })
    }

    /// Comments received per commit; `NaN` without commits.
    pub fn received_comment_ratio(&self, inclusion: &InclusionSet) -> f64 {
        ratio(self.all_comments_received(inclusion), self.commit_count() as u64)
    }

    /// Comments written per review request; `NaN` if the user was never
    /// added as a reviewer by a selected person.
    pub fn review_comment_ratio(&self, inclusion: &InclusionSet) -> f64 {
        ratio(
            self.comments_written_count(inclusion),
            self.added_as_reviewer_to_count(inclusion),
        )
    }

    pub fn reviewer_data_for_own_commits(&self) -> Vec<&'a ReviewerEntry> {
        let mut entries: Vec<_> = self.record.reviewers_for_own_commits.iter().collect();
        sort_by_added_as_reviewer_count(&mut entries);
        entries
    }

    /// Reviewers of the user's commits, most approvals first.
    pub fn reviewer_approval_data_for_own_commits(&self) -> Vec<&'a ReviewerEntry> {
        let mut entries: Vec<_> = self.record.reviewers_for_own_commits.iter().collect();
        entries.sort_by(|l, r| r.approval_count().cmp(&l.approval_count()));
        entries
    }

    pub fn filtered_reviewer_data_for_own_commits(&self, inclusion: &InclusionSet) -> Vec<&'a ReviewerEntry> {
        self.reviewer_data_for_own_commits()
            .into_iter()
            .filter(|entry| inclusion.contains_identity(&entry.identity))
            .collect()
    }

    /// Selected people who asked the user for reviews.
    pub fn review_requestors(&self, inclusion: &InclusionSet) -> Vec<&'a ReviewerEntry> {
        let mut entries: Vec<_> = self
            .record
            .review_requestors
            .iter()
            .filter(|entry| inclusion.contains_identity(&entry.identity))
            .collect();
        sort_by_added_as_reviewer_count(&mut entries);
        entries
    }

    /// Selected people the user reviewed with or was reviewed by, plus the user.
    pub fn team_identities(&self, inclusion: &InclusionSet) -> BTreeSet<&'a str> {
        let mut team: BTreeSet<&'a str> = self
            .filtered_reviewer_data_for_own_commits(inclusion)
            .into_iter()
            .chain(self.review_requestors(inclusion))
            .filter_map(|entry| entry.identity.identifier())
            .collect();
        team.insert(self.identifier());
        team
    }

    /// Commits that kept being reworked after review started, most reworked first.
    ///
    /// A commit qualifies when it has more than `threshold` rework patch sets
    /// and more than `threshold` patch sets follow (and include) the first one
    /// commented on by someone other than the owner.
    pub fn commits_with_high_patch_set_count(&self, threshold: usize) -> Vec<&'a CommitRecord> {
        let mut commits: Vec<_> = self
            .record
            .commits
            .iter()
            .filter(|commit| rework_count(commit) > threshold)
            .filter(|commit| {
                commit
                    .first_patch_set_index_with_non_author_review()
                    .is_some_and(|idx| commit.patch_sets.len() - idx > threshold)
            })
            .collect();
        commits.sort_by(|l, r| rework_count(r).cmp(&rework_count(l)));
        commits
    }

    pub fn dated_commits_with_high_patch_set_count(&self, threshold: usize) -> Vec<DatedPatchSetCount<'a>> {
        self.commits_with_high_patch_set_count(threshold)
            .into_iter()
            .map(|commit| DatedPatchSetCount {
                date: commit.created_on_date,
                count: rework_count(commit),
                commit,
            })
            .collect()
    }

    /// Highest rework patch set count over all commits.
    pub fn max_patch_set_count(&self) -> usize {
        self.record.commits.iter().map(rework_count).max().unwrap_or(0)
    }

    /// Commits the user was added to as a reviewer, owned by selected people.
    pub fn added_as_reviewer_to_with_filter(&self, inclusion: &InclusionSet) -> Vec<&'a CommitRecord> {
        self.record
            .added_as_reviewer_to
            .iter()
            .filter(|commit| inclusion.contains_identity(&commit.owner))
            .collect()
    }

    pub fn per_project_data(&self, inclusion: &InclusionSet) -> Vec<ProjectActivity> {
        self.record
            .projects
            .iter()
            .map(|project| ProjectActivity {
                url: project.url.clone(),
                name: project.name.clone(),
                commit_count: project.commit_count_for_user,
                comments_written: sum_selected(&project.review_requestors, inclusion, |entry| {
                    entry.approval_data.comment_count
                }),
            })
            .collect()
    }

    /// Commits with comments written by the user, oldest first.
    pub fn commits_with_written_comments_sorted_by_date(&self) -> Vec<&'a CommitComments> {
        let mut written: Vec<_> = self.record.comments_written.iter().collect();
        written.sort_by_key(|item| item.commit.created_on_date);
        written
    }

    /// One date per comment the user wrote on someone else's patch set.
    pub fn review_comment_dates(&self) -> Result<Vec<NaiveDate>, CalendarError> {
        let me = &self.record.identity;
        let mut dates = Vec::new();
        for written in &self.record.comments_written {
            for patch_set in &written.commit.patch_sets {
                if patch_set.author.is_same_as(me) {
                    continue;
                }
                for comment in &patch_set.comments {
                    if comment.reviewer.is_same_as(me) {
                        dates.push(self.local_date(patch_set.created_on_date)?);
                    }
                }
            }
        }
        Ok(dates)
    }

    fn local_date(&self, timestamp: i64) -> Result<NaiveDate, CalendarError> {
        self.tz
            .timestamp_millis_opt(timestamp)
            .single()
            .map(|date| date.date_naive())
            .ok_or(CalendarError::InvalidTimestamp(timestamp))
    }
}

fn sum_selected<F>(entries: &[ReviewerEntry], inclusion: &InclusionSet, count: F) -> u64
where
    F: Fn(&ReviewerEntry) -> u32,
{
    entries
        .iter()
        .filter(|entry| inclusion.contains_identity(&entry.identity))
        .map(|entry| u64::from(count(entry)))
        .sum()
}
