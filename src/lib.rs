//! # Code Review Statistics Library
//!
//! `reviewstats` derives statistics from Gerrit-style code-review exports:
//! per-contributor counts and ratios, calendar-bucketed activity trends,
//! percentile highlighting for overview tables and a thresholded
//! collaboration graph of who reviews whom.
//!
//! ## Features
//!
//! - Month and quarter bucketing with rate-of-change math
//! - Top-5 / bottom-5 highlighting of any overview column
//! - Collaboration graph construction for force-directed layouts
//! - Per-user aggregation scoped to the contributors in analysis
//! - TOML configuration and JSON loaders
//!
//! ## Example
//!
//! ```
//! use reviewstats::analysis::{
//!     CollaborationGraphBuilder, HighlightTier, InclusionSet, OverviewMetric, PercentileHighlighter,
//! };
//! use reviewstats::types::OverviewRecord;
//!
//! let population: Vec<OverviewRecord> = serde_json::from_str(
//!     r#"[
//!         {"identifier": "a", "identity": {"identifier": "a"}, "commitCount": 4,
//!          "myReviewerList": [{"identity": {"identifier": "b"}, "reviewData": {"approvalCount": 3}}]},
//!         {"identifier": "b", "identity": {"identifier": "b"}, "commitCount": 8}
//!     ]"#,
//! )?;
//! let selection = InclusionSet::all_of(&population);
//!
//! let graph = CollaborationGraphBuilder::default().build(&population, &selection)?;
//! assert_eq!(graph.links.len(), 1);
//!
//! let highlighter = PercentileHighlighter::new(&population, &selection, OverviewMetric::CommitCount);
//! assert_eq!(highlighter.tier(&population[1]), HighlightTier::Top(1));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod analysis;
pub mod app;
pub mod config;
pub mod loader;
pub mod types;
pub mod utils;

// Re-export main types for convenience
pub use app::Dashboard;
pub use config::{load_config, ReviewStatsConfig};
pub use loader::{load_overview, load_userdata, LoadError};
pub use types::{Identity, OverviewRecord, UserRecord};
