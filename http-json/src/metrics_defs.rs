use shared::metrics_defs::{MetricDef, MetricType};

pub const FETCH_DURATION: MetricDef = MetricDef {
    name: "fetch.duration",
    metric_type: MetricType::Histogram,
    description: "Duration of a poll cycle in seconds, fetch and decode included.",
};

pub const FETCH_ERRORS: MetricDef = MetricDef {
    name: "fetch.errors",
    metric_type: MetricType::Counter,
    description: "Failed poll cycles. Tagged with kind (transport, io, decode).",
};

pub const EVENTS_BUILT: MetricDef = MetricDef {
    name: "events.built",
    metric_type: MetricType::Counter,
    description: "Events successfully built from a response.",
};

pub const ALL_METRICS: &[MetricDef] = &[FETCH_DURATION, FETCH_ERRORS, EVENTS_BUILT];
