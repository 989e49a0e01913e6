//! Metrics definitions for metadata resolution.

use shared::metrics_defs::{MetricDef, MetricType};

pub const MATCH_EXACT: MetricDef = MetricDef {
    name: "metadata.match.exact",
    metric_type: MetricType::Counter,
    description: "Requests resolved by the exact structural lookup",
};

pub const MATCH_FUZZY: MetricDef = MetricDef {
    name: "metadata.match.fuzzy",
    metric_type: MetricType::Counter,
    description: "Requests resolved by the ordered fuzzy scan",
};

pub const MATCH_MISS: MetricDef = MetricDef {
    name: "metadata.match.miss",
    metric_type: MetricType::Counter,
    description: "Requests that matched no registered operation",
};

pub const ALL_METRICS: &[MetricDef] = &[MATCH_EXACT, MATCH_FUZZY, MATCH_MISS];
