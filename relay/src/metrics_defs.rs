use shared::metrics_defs::{MetricDef, MetricType};

pub const REQUESTS: MetricDef = MetricDef {
    name: "relay.requests",
    metric_type: MetricType::Counter,
    description: "Handled webhook requests. Tagged with outcome.",
};

pub const FORWARD_DURATION: MetricDef = MetricDef {
    name: "relay.forward.duration",
    metric_type: MetricType::Histogram,
    description: "Time spent waiting on the downstream endpoint in seconds. Tagged with status.",
};

pub const SIGNATURE_MISMATCH: MetricDef = MetricDef {
    name: "relay.signature.mismatch",
    metric_type: MetricType::Counter,
    description: "Requests whose webhook signature was missing or did not verify",
};

pub const ALL_METRICS: &[MetricDef] = &[REQUESTS, FORWARD_DURATION, SIGNATURE_MISMATCH];
