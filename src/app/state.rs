use log::{debug, info};

use crate::analysis::{
    CacheManager, CollaborationGraph, CollaborationGraphBuilder, GraphCacheKey, GraphError, InclusionSet,
    OverviewMetric, PercentileHighlighter,
};
use crate::config::ReviewStatsConfig;
use crate::types::OverviewRecord;

/// Session state behind the overview pages: the loaded population, the
/// users currently in analysis and the settings.
///
/// Collaboration graphs are memoized per selection, keeping the most
/// recently used few. Replacing the population or the config starts a new
/// generation, which invalidates every cached graph.
pub struct Dashboard {
    population: Vec<OverviewRecord>,
    selection: InclusionSet,
    config: ReviewStatsConfig,
    generation: u64,
    graph_cache: CacheManager,
}

impl Dashboard {
    /// Starts a session with every contributor selected.
    pub fn new(population: Vec<OverviewRecord>, config: ReviewStatsConfig) -> Self {
        info!("session started with {} contributors", population.len());
        Self {
            selection: InclusionSet::all_of(&population),
            population,
            config,
            generation: 0,
            graph_cache: CacheManager::new(),
        }
    }

    pub fn population(&self) -> &[OverviewRecord] {
        &self.population
    }

    pub fn selection(&self) -> &InclusionSet {
        &self.selection
    }

    pub fn config(&self) -> &ReviewStatsConfig {
        &self.config
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn contributor(&self, identifier: &str) -> Option<&OverviewRecord> {
        self.population.iter().find(|record| record.identifier == identifier)
    }

    /// Replaces the population and selects all of it.
    pub fn set_population(&mut self, population: Vec<OverviewRecord>) {
        self.selection = InclusionSet::all_of(&population);
        self.population = population;
        self.next_generation();
    }

    pub fn set_config(&mut self, config: ReviewStatsConfig) {
        self.config = config;
        self.next_generation();
    }

    pub fn set_selection(&mut self, selection: InclusionSet) {
        self.selection = selection;
    }

    pub fn set_user_selected(&mut self, identifier: &str, selected: bool) {
        self.selection = self.selection.with_user(identifier, selected);
    }

    pub fn toggle_user(&mut self, identifier: &str) {
        self.selection = self.selection.toggled(identifier);
    }

    pub fn select_all(&mut self) {
        self.selection = InclusionSet::all_of(&self.population);
    }

    pub fn select_none(&mut self) {
        self.selection = InclusionSet::none();
    }

    pub fn is_all_selected(&self) -> bool {
        self.selection.is_all_selected(self.population.len())
    }

    /// The collaboration graph of the current selection.
    pub fn collaboration_graph(&mut self) -> Result<&CollaborationGraph, GraphError> {
        let key = GraphCacheKey {
            selection: self.selection.clone(),
            generation: self.generation,
        };
        let builder = CollaborationGraphBuilder::new(self.config.graph.clone());
        let population = &self.population;
        let selection = &self.selection;
        self.graph_cache
            .get_or_try_insert_with(key, || builder.build(population, selection))
    }

    /// A highlighter for the overview table column of `metric`.
    pub fn highlighter(&self, metric: OverviewMetric) -> PercentileHighlighter<'_> {
        PercentileHighlighter::for_table(&self.population, &self.selection, metric, self.config.highlighter)
    }

    fn next_generation(&mut self) {
        self.generation += 1;
        self.graph_cache.clear();
        debug!("session generation {}", self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::{HighlightTier, DEFAULT_GRAPH_CACHE_CAPACITY};
    use crate::types::{Identity, ReviewData, ReviewerEntry};
    use pretty_assertions::assert_eq;

    fn contributor(identifier: &str, commit_count: u64, reviewers: &[(&str, u32)]) -> OverviewRecord {
        OverviewRecord {
            identifier: identifier.to_string(),
            identity: Identity {
                identifier: identifier.to_string(),
                ..Default::default()
            },
            commit_count,
            my_reviewer_list: reviewers
                .iter()
                .map(|&(id, approvals)| ReviewerEntry {
                    identity: Identity {
                        identifier: id.to_string(),
                        ..Default::default()
                    },
                    review_data: Some(ReviewData {
                        added_as_reviewer_count: approvals,
                        approval_count: approvals,
                    }),
                    ..Default::default()
                })
                .collect(),
            ..Default::default()
        }
    }

    fn dashboard() -> Dashboard {
        Dashboard::new(
            vec![
                contributor("a", 4, &[("b", 3)]),
                contributor("b", 2, &[("a", 5)]),
                contributor("c", 0, &[("a", 1)]),
            ],
            ReviewStatsConfig::default(),
        )
    }

    #[test]
    fn test_starts_with_everyone_selected() {
        let dashboard = dashboard();
        assert!(dashboard.is_all_selected());
        assert_eq!(dashboard.generation(), 0);
        assert!(dashboard.contributor("b").is_some());
    }

    #[test]
    fn test_graph_follows_selection() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.collaboration_graph().unwrap().nodes.len(), 3);

        dashboard.toggle_user("c");
        assert_eq!(dashboard.collaboration_graph().unwrap().nodes.len(), 2);

        dashboard.toggle_user("c");
        assert_eq!(dashboard.collaboration_graph().unwrap().links.len(), 3);
    }

    #[test]
    fn test_graph_cache_stays_bounded() {
        let ids: Vec<String> = (0..DEFAULT_GRAPH_CACHE_CAPACITY + 5).map(|i| format!("u{i}")).collect();
        let population = ids.iter().map(|id| contributor(id, 1, &[])).collect();
        let mut dashboard = Dashboard::new(population, ReviewStatsConfig::default());

        for id in &ids {
            dashboard.set_selection(InclusionSet::from_identifiers([id.as_str()]));
            assert_eq!(dashboard.collaboration_graph().unwrap().nodes.len(), 1);
        }
        assert_eq!(dashboard.graph_cache.len(), DEFAULT_GRAPH_CACHE_CAPACITY);
    }

    #[test]
    fn test_config_change_rebuilds_graph() {
        let mut dashboard = dashboard();
        assert_eq!(dashboard.collaboration_graph().unwrap().links.len(), 3);

        let mut config = ReviewStatsConfig::default();
        config.graph.relative_link_value_threshold = 0.5;
        dashboard.set_config(config);

        assert_eq!(dashboard.generation(), 1);
        assert_eq!(dashboard.collaboration_graph().unwrap().links.len(), 2);
    }

    #[test]
    fn test_new_population_resets_selection() {
        let mut dashboard = dashboard();
        dashboard.select_none();
        assert!(dashboard.collaboration_graph().unwrap().is_empty());

        dashboard.set_population(vec![contributor("z", 1, &[])]);
        assert!(dashboard.is_all_selected());
        assert_eq!(dashboard.collaboration_graph().unwrap().nodes.len(), 1);
    }

    #[test]
    fn test_highlighter_uses_current_selection() {
        let mut dashboard = dashboard();
        dashboard.set_user_selected("a", false);

        let highlighter = dashboard.highlighter(OverviewMetric::CommitCount);
        // commit count ignores zeroes
        assert_eq!(highlighter.ladder().values(), &[2.0]);
        assert_eq!(highlighter.tier(&dashboard.population()[1]), HighlightTier::Top(1));
        assert_eq!(highlighter.tier(&dashboard.population()[0]), HighlightTier::None);
    }
}
