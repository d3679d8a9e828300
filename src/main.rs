//! Code Review Statistics Tool
//!
//! Prints collaboration graphs, highlight tiers and activity tables derived
//! from review-statistics JSON exports.
//!
//! # Usage
//!
//! ```bash
//! reviewstats graph --overview overview.json --threshold 0.2
//! reviewstats highlight --overview overview.json --metric commitCount
//! reviewstats monthly --userdata jdoe.json
//! ```

use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;

use reviewstats::analysis::{monthly_activity, HighlightTier, InclusionSet, OverviewMetric, UserStats};
use reviewstats::config::{default_config_path, load_config};
use reviewstats::{load_overview, load_userdata, Dashboard};

#[derive(Parser, Debug)]
#[command(name = "reviewstats")]
#[command(about = "Code-review statistics and collaboration graphs")]
struct Args {
    /// Config file; defaults to the user config directory
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print the collaboration graph as JSON
    Graph {
        #[arg(long)]
        overview: PathBuf,

        /// Fraction of the strongest link a link must reach to be kept
        #[arg(long)]
        threshold: Option<f64>,

        /// Contributors to include; everyone when omitted
        #[arg(long, num_args = 1..)]
        select: Vec<String>,

        /// Contributor pinned to the centre of the layout
        #[arg(long)]
        center: Option<String>,
    },
    /// Print the highlight tier of every contributor for one column
    Highlight {
        #[arg(long)]
        overview: PathBuf,

        /// Column key, e.g. commitCount or reviewCountPlus2
        #[arg(long)]
        metric: OverviewMetric,
    },
    /// Print the per-month activity table of one contributor
    Monthly {
        #[arg(long)]
        userdata: PathBuf,
    },
    /// Print the headline numbers of one contributor
    Profile {
        #[arg(long)]
        userdata: PathBuf,

        /// Contributors counted as peers; everyone when omitted
        #[arg(long, num_args = 1..)]
        select: Vec<String>,
    },
}

#[derive(Serialize)]
struct TierRow<'a> {
    identifier: &'a str,
    value: f64,
    tier: HighlightTier,
}

#[derive(Serialize)]
struct Profile<'a> {
    identifier: &'a str,
    name: String,
    commit_count: usize,
    reviews_given_plus2: u64,
    reviews_received_plus2: u64,
    comments_written: u64,
    comments_received: u64,
    received_comment_ratio: f64,
    review_comment_ratio: f64,
    average_time_in_code_review_secs: u64,
    max_patch_set_count: usize,
    high_patch_set_count_commits: usize,
    team: Vec<&'a str>,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive("reviewstats=info".parse()?),
        )
        .init();

    let args = Args::parse();
    let config_path = args.config.unwrap_or_else(default_config_path);
    let mut config = load_config(&config_path)
        .with_context(|| format!("failed to load config from {}", config_path.display()))?;

    match args.command {
        Command::Graph {
            overview,
            threshold,
            select,
            center,
        } => {
            if let Some(threshold) = threshold {
                config.graph.relative_link_value_threshold = threshold;
            }
            if center.is_some() {
                config.graph.centered_identifier = center;
            }
            config.validate()?;

            let mut dashboard = Dashboard::new(load_overview(&overview)?, config);
            if !select.is_empty() {
                dashboard.set_selection(InclusionSet::from_identifiers(select));
            }
            let graph = dashboard.collaboration_graph()?;
            log::info!(
                "graph has {} nodes and {} links",
                graph.nodes.len(),
                graph.links.len()
            );
            println!("{}", serde_json::to_string_pretty(graph)?);
        }
        Command::Highlight { overview, metric } => {
            let dashboard = Dashboard::new(load_overview(&overview)?, config);
            let highlighter = dashboard.highlighter(metric);
            let rows: Vec<TierRow> = dashboard
                .population()
                .iter()
                .map(|record| TierRow {
                    identifier: &record.identifier,
                    value: metric.value(record),
                    tier: highlighter.tier(record),
                })
                .collect();
            println!("{}", serde_json::to_string_pretty(&rows)?);
        }
        Command::Monthly { userdata } => {
            let record = load_userdata(&userdata)?;
            let stats = UserStats::new(&record)?;
            println!("{}", serde_json::to_string_pretty(&monthly_activity(&stats)?)?);
        }
        Command::Profile { userdata, select } => {
            let record = load_userdata(&userdata)?;
            let stats = UserStats::new(&record)?;
            let inclusion = if select.is_empty() {
                everyone_in(&record)
            } else {
                InclusionSet::from_identifiers(select)
            };
            let threshold = config.userdata.high_patch_set_count_threshold;

            let profile = Profile {
                identifier: stats.identifier(),
                name: stats.printable_name(),
                commit_count: stats.commit_count(),
                reviews_given_plus2: stats.reviews_given_for_score(2, &inclusion),
                reviews_received_plus2: stats.reviews_received_for_score(2, &inclusion),
                comments_written: stats.comments_written_count(&inclusion),
                comments_received: stats.all_comments_received(&inclusion),
                received_comment_ratio: stats.received_comment_ratio(&inclusion),
                review_comment_ratio: stats.review_comment_ratio(&inclusion),
                average_time_in_code_review_secs: stats.average_time_in_code_review().as_secs(),
                max_patch_set_count: stats.max_patch_set_count(),
                high_patch_set_count_commits: stats.commits_with_high_patch_set_count(threshold).len(),
                team: stats.team_identities(&inclusion).into_iter().collect(),
            };
            println!("{}", serde_json::to_string_pretty(&profile)?);
        }
    }

    Ok(())
}

/// Everyone the record mentions, for when no selection was given.
fn everyone_in(record: &reviewstats::UserRecord) -> InclusionSet {
    record
        .review_requestors
        .iter()
        .chain(&record.reviewers_for_own_commits)
        .filter_map(|entry| entry.identity.identifier())
        .chain(record.identity.identifier())
        .collect()
}
