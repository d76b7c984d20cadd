use prometheus::{
    Encoder, HistogramVec, IntCounter, IntCounterVec, IntGauge, Opts, Registry, TextEncoder,
};

#[derive(Clone)]
pub struct Metrics {
    registry: Registry,
    pub assignments_total: IntCounterVec,
    pub assignment_latency_seconds: HistogramVec,
    pub live_assignments: IntGauge,
    pub dispatch_queue_depth: IntGauge,
    pub refunds_total: IntCounterVec,
    pub notifications_failed_total: IntCounter,
}

impl Metrics {
    pub fn new() -> Self {
        let registry = Registry::new();

        let assignments_total = IntCounterVec::new(
            Opts::new("assignments_total", "Assignment attempts by outcome"),
            &["outcome"],
        )
        .expect("valid assignments_total metric");

        let assignment_latency_seconds = HistogramVec::new(
            prometheus::HistogramOpts::new(
                "assignment_latency_seconds",
                "Latency of assignment validation and commit in seconds",
            ),
            &["outcome"],
        )
        .expect("valid assignment_latency_seconds metric");

        let live_assignments =
            IntGauge::new("live_assignments", "Assignments currently holding a driver and vehicle")
                .expect("valid live_assignments metric");

        let dispatch_queue_depth = IntGauge::new(
            "dispatch_queue_depth",
            "Orders waiting for assignment at the last unfiltered queue read",
        )
        .expect("valid dispatch_queue_depth metric");

        let refunds_total = IntCounterVec::new(
            Opts::new("refunds_total", "Refunds requested during cancellation by outcome"),
            &["outcome"],
        )
        .expect("valid refunds_total metric");

        let notifications_failed_total = IntCounter::new(
            "notifications_failed_total",
            "Notifications that could not be delivered",
        )
        .expect("valid notifications_failed_total metric");

        registry
            .register(Box::new(assignments_total.clone()))
            .expect("register assignments_total");
        registry
            .register(Box::new(assignment_latency_seconds.clone()))
            .expect("register assignment_latency_seconds");
        registry
            .register(Box::new(live_assignments.clone()))
            .expect("register live_assignments");
        registry
            .register(Box::new(dispatch_queue_depth.clone()))
            .expect("register dispatch_queue_depth");
        registry
            .register(Box::new(refunds_total.clone()))
            .expect("register refunds_total");
        registry
            .register(Box::new(notifications_failed_total.clone()))
            .expect("register notifications_failed_total");

        Self {
            registry,
            assignments_total,
            assignment_latency_seconds,
            live_assignments,
            dispatch_queue_depth,
            refunds_total,
            notifications_failed_total,
        }
    }

    pub fn encode(&self) -> Result<String, String> {
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();

        TextEncoder::new()
            .encode(&metric_families, &mut buffer)
            .map_err(|err| format!("failed to encode metrics: {err}"))?;

        String::from_utf8(buffer).map_err(|err| format!("metrics are not valid utf8: {err}"))
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
