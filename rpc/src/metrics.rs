//! Prometheus metrics for the verification API.
//!
//! [`RpcMetrics`] owns a dedicated [`Registry`] that the `/metrics` endpoint
//! encodes into the Prometheus text exposition format.

use prometheus::{
    register_int_counter_vec_with_registry, register_int_counter_with_registry, Encoder,
    IntCounter, IntCounterVec, Opts, Registry, TextEncoder,
};

pub struct RpcMetrics {
    pub registry: Registry,

    // ── Counters ────────────────────────────────────────────────────────
    /// Submissions by outcome: `accepted` or the refusal code.
    pub submissions: IntCounterVec,
    /// Review attempts by outcome: `approved`, `rejected` or the refusal code.
    pub reviews: IntCounterVec,
    /// Review queue pages served.
    pub queue_listings: IntCounter,
    /// Status projections served.
    pub status_queries: IntCounter,
}

impl RpcMetrics {
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let submissions = register_int_counter_vec_with_registry!(
            Opts::new(
                "vetting_submissions_total",
                "Verification submissions by outcome"
            ),
            &["outcome"],
            registry
        )?;
        let reviews = register_int_counter_vec_with_registry!(
            Opts::new("vetting_reviews_total", "Review decisions by outcome"),
            &["outcome"],
            registry
        )?;
        let queue_listings = register_int_counter_with_registry!(
            Opts::new(
                "vetting_queue_listings_total",
                "Review queue pages served"
            ),
            registry
        )?;
        let status_queries = register_int_counter_with_registry!(
            Opts::new(
                "vetting_status_queries_total",
                "Verification status projections served"
            ),
            registry
        )?;

        Ok(Self {
            registry,
            submissions,
            reviews,
            queue_listings,
            status_queries,
        })
    }

    pub fn record_submission(&self, outcome: &str) {
        self.submissions.with_label_values(&[outcome]).inc();
    }

    pub fn record_review(&self, outcome: &str) {
        self.reviews.with_label_values(&[outcome]).inc();
    }

    /// Encode every registered metric in the text exposition format.
    pub fn encode(&self) -> Result<String, prometheus::Error> {
        let mut buf = Vec::new();
        TextEncoder::new().encode(&self.registry.gather(), &mut buf)?;
        String::from_utf8(buf).map_err(|e| prometheus::Error::Msg(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counters_appear_in_exposition() {
        let metrics = RpcMetrics::new().unwrap();
        metrics.record_submission("accepted");
        metrics.record_submission("missing_required_document");
        metrics.record_review("approved");
        metrics.queue_listings.inc();

        let text = metrics.encode().unwrap();
        assert!(text.contains("vetting_submissions_total{outcome=\"accepted\"} 1"));
        assert!(text.contains("vetting_reviews_total{outcome=\"approved\"} 1"));
        assert!(text.contains("vetting_queue_listings_total 1"));
    }

    #[test]
    fn registries_are_independent() {
        let a = RpcMetrics::new().unwrap();
        let b = RpcMetrics::new().unwrap();
        a.status_queries.inc();
        assert_eq!(a.status_queries.get(), 1);
        assert_eq!(b.status_queries.get(), 0);
    }
}
