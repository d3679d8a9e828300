//! Collaboration graph: who approves whose changes.
//!
//! Construction happens in two stages. [`create_identity_graph`] copies the
//! selected part of the population and turns every non-zero approval
//! relationship into a link. [`CollaborationGraphBuilder`] then drops links
//! that are weak relative to the strongest one and derives the per-node
//! numbers a force layout needs (connection counts, radius, colour).
//!
//! Graphs are rebuilt from scratch whenever the population or the selection
//! changes. Nodes are owned copies, so the caller may mutate them freely.

use log::debug;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use super::selection::InclusionSet;
use crate::types::{Identity, OverviewRecord};
use crate::utils::median_excluding_zeroes;

pub const DEFAULT_RELATIVE_LINK_VALUE_THRESHOLD: f64 = 0.1;

/// Radius of a node when no commit median is available.
pub const MIN_NODE_RADIUS: f64 = 3.0;

/// Added to the relative weight of every link to get its layout strength.
const BASE_LINK_STRENGTH: f64 = 0.1;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    #[error("reviewer '{reviewer}' of '{owner}' does not match any contributor")]
    UnresolvedIdentity { owner: String, reviewer: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Links weaker than this fraction of the strongest link are dropped.
    pub relative_link_value_threshold: f64,
    /// Node pinned to the centre of the layout.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub centered_identifier: Option<String>,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            relative_link_value_threshold: DEFAULT_RELATIVE_LINK_VALUE_THRESHOLD,
            centered_identifier: None,
        }
    }
}

/// A link between two nodes, by node index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct IdentityLink {
    pub source: usize,
    pub target: usize,
    pub value: u32,
}

/// Selected contributors and their raw approval links.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct IdentityGraph {
    pub nodes: Vec<OverviewRecord>,
    pub links: Vec<IdentityLink>,
}

impl IdentityGraph {
    pub fn source(&self, link: &IdentityLink) -> &OverviewRecord {
        &self.nodes[link.source]
    }

    pub fn target(&self, link: &IdentityLink) -> &OverviewRecord {
        &self.nodes[link.target]
    }

    /// Strongest link with both ends selected, `None` without such links.
    pub fn max_link_value(&self, inclusion: &InclusionSet) -> Option<u32> {
        self.links
            .iter()
            .filter(|link| {
                inclusion.contains(&self.source(link).identifier)
                    && inclusion.contains(&self.target(link).identifier)
            })
            .map(|link| link.value)
            .max()
    }

    /// Links reaching `threshold` of `max_link_value`; none when there is no maximum.
    pub fn links_above_threshold(&self, max_link_value: Option<u32>, threshold: f64) -> Vec<IdentityLink> {
        let Some(max) = max_link_value.filter(|&max| max > 0) else {
            return Vec::new();
        };
        self.links
            .iter()
            .filter(|link| f64::from(link.value) / f64::from(max) >= threshold)
            .copied()
            .collect()
    }
}

fn resolve_identity(identity: &Identity, nodes: &[OverviewRecord]) -> Option<usize> {
    if let Some(identifier) = identity.identifier() {
        if let Some(idx) = nodes.iter().position(|node| node.identifier == identifier) {
            return Some(idx);
        }
    }
    if let Some(email) = identity.email() {
        if let Some(idx) = nodes.iter().position(|node| node.identity.email() == Some(email)) {
            debug!("resolved reviewer by email: {email}");
            return Some(idx);
        }
    }
    let username = identity.username()?;
    let idx = nodes
        .iter()
        .position(|node| node.identity.username() == Some(username))?;
    debug!("resolved reviewer by username: {username}");
    Some(idx)
}

fn identity_label(identity: &Identity) -> String {
    identity
        .identifier()
        .or_else(|| identity.email())
        .or_else(|| identity.username())
        .unwrap_or("<anonymous>")
        .to_string()
}

/// Copies the selected contributors and links each of them to the selected
/// reviewers that approved their changes at least once.
pub fn create_identity_graph(
    population: &[OverviewRecord],
    inclusion: &InclusionSet,
) -> Result<IdentityGraph, GraphError> {
    let nodes: Vec<OverviewRecord> = population
        .iter()
        .filter(|record| inclusion.contains(&record.identifier))
        .cloned()
        .collect();

    let mut links = Vec::new();
    for (source, node) in nodes.iter().enumerate() {
        for reviewer in &node.my_reviewer_list {
            let value = reviewer.approval_count();
            if value == 0 {
                continue;
            }
            if let Some(identifier) = reviewer.identity.identifier() {
                if !inclusion.contains(identifier) {
                    continue;
                }
            }

            let target = match resolve_identity(&reviewer.identity, &nodes) {
                Some(target) => target,
                // Legacy entries without an identifier may point at someone deselected.
                None if reviewer.identity.identifier().is_none()
                    && resolve_identity(&reviewer.identity, population).is_some() =>
                {
                    continue
                }
                None => {
                    return Err(GraphError::UnresolvedIdentity {
                        owner: node.identifier.clone(),
                        reviewer: identity_label(&reviewer.identity),
                    })
                }
            };
            links.push(IdentityLink { source, target, value });
        }
    }

    debug!("identity graph: {} nodes, {} links", nodes.len(), links.len());
    Ok(IdentityGraph { nodes, links })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ConnectivityRamp {
    /// Fewer connections than the median node.
    Low,
    /// At least as many connections as the median node.
    High,
}

impl ConnectivityRamp {
    pub const LEN: usize = 4;

    /// From fewer to more connections.
    pub fn colors(self) -> [&'static str; Self::LEN] {
        match self {
            ConnectivityRamp::Low => ["#e6550d", "#fd8d3c", "#fdae6b", "#fdd0a2"],
            ConnectivityRamp::High => ["#c7e9c0", "#a1d99b", "#74c476", "#31a354"],
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct NodeColor {
    pub ramp: ConnectivityRamp,
    pub index: usize,
}

impl NodeColor {
    pub fn hex(&self) -> &'static str {
        self.ramp.colors()[self.index]
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GraphNode {
    pub record: OverviewRecord,
    /// Sum of the values of all surviving links touching the node.
    pub connection_count: u64,
    pub radius: f64,
    pub color: NodeColor,
    pub pinned: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GraphLink {
    pub source: usize,
    pub target: usize,
    pub value: u32,
    /// `value` relative to the strongest link.
    pub relative_weight: f64,
    pub strength: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize)]
pub struct GraphStats {
    pub max_link_value: Option<u32>,
    pub max_connection_count: u64,
    pub median_connection_count: Option<u64>,
    pub median_commit_count: Option<u64>,
}

/// Thresholded collaboration graph ready for layout.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct CollaborationGraph {
    pub nodes: Vec<GraphNode>,
    pub links: Vec<GraphLink>,
    pub stats: GraphStats,
}

impl CollaborationGraph {
    pub fn node(&self, identifier: &str) -> Option<&GraphNode> {
        self.nodes.iter().find(|node| node.record.identifier == identifier)
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }
}

pub fn node_radius(commit_count: u64, median_commit_count: Option<u64>) -> f64 {
    match median_commit_count {
        Some(median) if median > 0 => {
            MIN_NODE_RADIUS + 2.0 * (commit_count as f64 / median as f64).sqrt()
        }
        _ => MIN_NODE_RADIUS,
    }
}

pub fn node_color(
    connection_count: u64,
    median_connection_count: Option<u64>,
    max_connection_count: u64,
) -> NodeColor {
    let count = connection_count as f64;
    let relative = count / median_connection_count.unwrap_or(0) as f64;
    let (ramp, relative) = if relative >= 1.0 {
        (ConnectivityRamp::High, count / max_connection_count as f64)
    } else {
        (ConnectivityRamp::Low, relative)
    };

    let index = if relative.is_nan() {
        0
    } else {
        ((relative * ConnectivityRamp::LEN as f64).floor() as usize).min(ConnectivityRamp::LEN - 1)
    };
    NodeColor { ramp, index }
}

pub struct CollaborationGraphBuilder {
    config: GraphConfig,
}

impl CollaborationGraphBuilder {
    pub fn new(config: GraphConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &GraphConfig {
        &self.config
    }

    pub fn build(
        &self,
        population: &[OverviewRecord],
        inclusion: &InclusionSet,
    ) -> Result<CollaborationGraph, GraphError> {
        let graph = create_identity_graph(population, inclusion)?;
        Ok(self.layout_data(graph, inclusion))
    }

    /// Thresholds the links of `graph` and derives node sizes and colours.
    pub fn layout_data(&self, graph: IdentityGraph, inclusion: &InclusionSet) -> CollaborationGraph {
        let max_link_value = graph.max_link_value(inclusion);
        let links: Vec<GraphLink> = graph
            .links_above_threshold(max_link_value, self.config.relative_link_value_threshold)
            .into_iter()
            .map(|link| {
                let relative_weight = max_link_value
                    .map(|max| f64::from(link.value) / f64::from(max))
                    .unwrap_or(0.0);
                GraphLink {
                    source: link.source,
                    target: link.target,
                    value: link.value,
                    relative_weight,
                    strength: BASE_LINK_STRENGTH + relative_weight,
                }
            })
            .collect();

        let mut connection_counts = vec![0u64; graph.nodes.len()];
        for link in &links {
            connection_counts[link.source] += u64::from(link.value);
            // a self-approval touches its node once
            if link.target != link.source {
                connection_counts[link.target] += u64::from(link.value);
            }
        }
        let commit_counts: Vec<u64> = graph.nodes.iter().map(|node| node.commit_count).collect();

        let stats = GraphStats {
            max_link_value,
            max_connection_count: connection_counts.iter().copied().max().unwrap_or(0),
            median_connection_count: median_excluding_zeroes(&connection_counts),
            median_commit_count: median_excluding_zeroes(&commit_counts),
        };

        let centered = self.config.centered_identifier.as_deref();
        let nodes: Vec<GraphNode> = graph
            .nodes
            .into_iter()
            .zip(connection_counts)
            .map(|(record, connection_count)| GraphNode {
                radius: node_radius(record.commit_count, stats.median_commit_count),
                color: node_color(
                    connection_count,
                    stats.median_connection_count,
                    stats.max_connection_count,
                ),
                pinned: centered == Some(record.identifier.as_str()),
                connection_count,
                record,
            })
            .collect();

        debug!(
            "collaboration graph: {} nodes, {} links kept at threshold {}",
            nodes.len(),
            links.len(),
            self.config.relative_link_value_threshold
        );
        CollaborationGraph { nodes, links, stats }
    }
}

impl Default for CollaborationGraphBuilder {
    fn default() -> Self {
        Self::new(GraphConfig::default())
    }
}
