mod activity;
mod cache;
pub mod calendar;
pub mod graph;
pub mod highlight;
mod selection;
pub mod userdata;


pub use activity::{monthly_activity, ActivityCell, MonthActivity, RateOfChange, YearActivity};
pub use cache::{CacheManager, GraphCacheKey, DEFAULT_GRAPH_CACHE_CAPACITY};
pub use calendar::{CalendarError, DatedList, YearlyItemList};
pub use graph::{
    create_identity_graph, CollaborationGraph, CollaborationGraphBuilder, ConnectivityRamp, GraphConfig,
    GraphError, GraphLink, GraphNode, GraphStats, IdentityGraph, IdentityLink, NodeColor,
};
pub use highlight::{HighlightLadder, HighlightOptions, HighlightTier, OverviewMetric, PercentileHighlighter};
pub use selection::InclusionSet;
pub use userdata::{
    DatedComment, DatedPatchSetCount, ProjectActivity, UserStats, DEFAULT_HIGH_PATCH_SET_COUNT_THRESHOLD,
};
