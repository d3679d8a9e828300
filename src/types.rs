//! # Common Types
//!
//! This module contains the record types loaded from the review-statistics
//! JSON export: identities, reviewer relationships, commits with their patch
//! sets, the per-contributor overview rows and the full per-user records.
//!
//! All of them are plain immutable snapshots. Derived numbers live in
//! [`crate::analysis`], never on the records themselves.

use std::collections::HashMap;

use serde::{Deserialize, Deserializer, Serialize};

/// A single contributor.
///
/// `identifier` is the only stable join key. `email` and `username` are kept
/// for display and for matching records exported before identifiers existed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct Identity {
    pub identifier: String,
    pub name: String,
    pub username: String,
    pub email: String,
}

impl Identity {
    /// The identifier, or `None` for legacy records that only carry an
    /// email and/or username.
    pub fn identifier(&self) -> Option<&str> {
        non_empty(&self.identifier)
    }

    pub fn email(&self) -> Option<&str> {
        non_empty(&self.email)
    }

    pub fn username(&self) -> Option<&str> {
        non_empty(&self.username)
    }

    /// Whether both identities refer to the same contributor: by identifier
    /// when both have one, otherwise by email, then by username.
    pub fn is_same_as(&self, other: &Identity) -> bool {
        if let (Some(l), Some(r)) = (self.identifier(), other.identifier()) {
            return l == r;
        }
        if let (Some(l), Some(r)) = (self.email(), other.email()) {
            return l == r;
        }
        matches!((self.username(), other.username()), (Some(l), Some(r)) if l == r)
    }

    pub fn short_printable_name(&self) -> &str {
        if self.name.is_empty() {
            "Anonymous Coward"
        } else {
            &self.name
        }
    }

    /// Name followed by the username in parentheses, or just the username
    /// when the name is missing.
    pub fn printable_name(&self) -> String {
        match self.username() {
            Some(username) if self.name.is_empty() => username.to_string(),
            Some(username) => format!("{} ({})", self.short_printable_name(), username),
            None => self.short_printable_name().to_string(),
        }
    }
}

fn non_empty(value: &str) -> Option<&str> {
    if value.is_empty() {
        None
    } else {
        Some(value)
    }
}

/// Review interaction counters between two contributors.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ApprovalData {
    pub added_as_reviewer_count: u32,
    pub approval_count: u32,
    /// Number of approvals per score, keyed by the score as a string ("2", "-1", ...).
    pub approvals: HashMap<String, u32>,
    pub comment_count: u32,
}

impl ApprovalData {
    pub fn approvals_for_score(&self, score: i32) -> u32 {
        self.approvals.get(&score.to_string()).copied().unwrap_or(0)
    }
}

/// Reduced approval data attached to overview reviewer lists.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewData {
    pub added_as_reviewer_count: u32,
    pub approval_count: u32,
}

/// One end of a review relationship.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ReviewerEntry {
    pub identity: Identity,
    pub approval_data: ApprovalData,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub review_data: Option<ReviewData>,
}

impl ReviewerEntry {
    /// Approvals given in this relationship. Overview exports carry the
    /// count in `reviewData`; full user records carry it in `approvalData`.
    pub fn approval_count(&self) -> u32 {
        self.review_data
            .as_ref()
            .map(|review| review.approval_count)
            .unwrap_or(self.approval_data.approval_count)
    }

    pub fn added_as_reviewer_count(&self) -> u32 {
        self.review_data
            .as_ref()
            .map(|review| review.added_as_reviewer_count)
            .unwrap_or(self.approval_data.added_as_reviewer_count)
    }
}

/// Kind of change a patch set carries. Missing and unrecognised kinds load
/// as `Unknown` and never count as rework.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PatchSetKind {
    Rework,
    TrivialRebase,
    NoCodeChange,
    NoChange,
    #[default]
    #[serde(other)]
    Unknown,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Comment {
    pub reviewer: Identity,
    pub file: String,
    pub line: i64,
    pub message: String,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PatchSet {
    pub number: u32,
    pub kind: PatchSetKind,
    pub author: Identity,
    /// Epoch milliseconds.
    pub created_on_date: i64,
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommitRecord {
    pub url: String,
    pub commit_number: u64,
    pub subject: String,
    pub owner: Identity,
    /// Epoch milliseconds.
    pub created_on_date: i64,
    pub patch_sets: Vec<PatchSet>,
    pub project: String,
}

impl CommitRecord {
    pub fn patch_set_count_for_kind(&self, kind: PatchSetKind) -> usize {
        self.patch_sets.iter().filter(|ps| ps.kind == kind).count()
    }

    /// Index of the first patch set carrying a comment from someone other
    /// than the commit owner.
    pub fn first_patch_set_index_with_non_author_review(&self) -> Option<usize> {
        self.patch_sets.iter().position(|patch_set| {
            patch_set
                .comments
                .iter()
                .any(|comment| !comment.reviewer.is_same_as(&self.owner))
        })
    }
}

/// One row of the whole-population overview export.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct OverviewRecord {
    pub identifier: String,
    pub identity: Identity,
    pub commit_count: u64,
    pub review_count_plus2: u64,
    pub review_count_plus1: u64,
    pub review_count_minus1: u64,
    pub review_count_minus2: u64,
    pub all_comments_written: u64,
    pub all_comments_received: u64,
    #[serde(deserialize_with = "nan_when_null", default = "nan")]
    pub received_comment_ratio: f64,
    #[serde(deserialize_with = "nan_when_null", default = "nan")]
    pub review_comment_ratio: f64,
    pub added_as_reviewer_to_count: u64,
    pub self_reviewed_commit_count: u64,
    pub abandoned_commit_count: u64,
    /// Milliseconds.
    pub average_time_in_code_review: u64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_active_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<i64>,
    pub my_reviewer_list: Vec<ReviewerEntry>,
}

/// Comments a user wrote on (or received for) a single commit.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct CommitComments {
    pub commit: CommitRecord,
    pub comments_by_user: Vec<Comment>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ProjectRecord {
    pub url: String,
    pub name: String,
    pub commit_count_for_user: u64,
    pub review_requestors: Vec<ReviewerEntry>,
}

/// The full per-user export behind a profile page.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct UserRecord {
    pub identity: Identity,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub first_active_date: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub last_active_date: Option<i64>,
    pub active_day_count: u32,
    pub commits: Vec<CommitRecord>,
    pub comments_written: Vec<CommitComments>,
    pub comments_received: Vec<CommitComments>,
    /// People who added this user as a reviewer, with what the user did for them.
    pub review_requestors: Vec<ReviewerEntry>,
    /// People reviewing this user's commits.
    pub reviewers_for_own_commits: Vec<ReviewerEntry>,
    pub added_as_reviewer_to: Vec<CommitRecord>,
    pub projects: Vec<ProjectRecord>,
    pub abandoned_commit_count: u64,
    pub in_review_commit_count: u64,
    pub self_reviewed_commit_count: u64,
    /// Milliseconds.
    pub average_time_in_code_review: u64,
}

fn nan() -> f64 {
    f64::NAN
}

fn nan_when_null<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<f64>::deserialize(deserializer)?.unwrap_or(f64::NAN))
}
