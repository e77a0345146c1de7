use opentelemetry::{
    KeyValue, global,
    metrics::{Counter, Histogram},
};

/// `/detect` instruments, recorded through the global meter provider.
///
/// Without a provider installed every call is a no-op.
#[derive(Clone)]
pub struct DetectMetrics {
    duration: Histogram<f64>,
    requests: Counter<u64>,
    degraded: Counter<u64>,
    detections: Counter<u64>,
}

impl DetectMetrics {
    pub fn new(meter_name: &'static str) -> Self {
        let meter = global::meter(meter_name);
        let latency_buckets = [
            0.01, 0.025, 0.05, 0.075, 0.1, 0.15, 0.2, 0.3, 0.5, 0.75, 1.0, 2.0, 5.0,
        ];

        Self {
            duration: meter
                .f64_histogram("detect_duration_seconds")
                .with_description("Time to serve one /detect request (upload, decode, inference)")
                .with_unit("s")
                .with_boundaries(latency_buckets.to_vec())
                .build(),
            requests: meter
                .u64_counter("detect_requests_total")
                .with_description("Total /detect requests")
                .build(),
            degraded: meter
                .u64_counter("detect_degraded_total")
                .with_description("Requests answered with a warning instead of detections")
                .build(),
            detections: meter
                .u64_counter("detect_detections_total")
                .with_description("Total detections returned")
                .build(),
        }
    }

    pub fn record_success(&self, elapsed_secs: f64, detections: usize) {
        self.requests.add(1, &[]);
        self.duration.record(elapsed_secs, &[]);
        self.detections.add(detections as u64, &[]);
    }

    pub fn record_degraded(&self, elapsed_secs: f64, kind: &'static str) {
        self.requests.add(1, &[]);
        self.duration.record(elapsed_secs, &[]);
        self.degraded.add(1, &[KeyValue::new("reason", kind)]);
    }
}

impl Default for DetectMetrics {
    fn default() -> Self {
        Self::new("gateway")
    }
}
