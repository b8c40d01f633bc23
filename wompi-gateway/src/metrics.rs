use anyhow::Result;
use axum::body::Body;
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::Response;
use prometheus::{Encoder, IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Clone)]
pub struct GatewayMetrics {
    registry: Registry,
    webhook_events: IntCounterVec,
    acceptance_token_requests: IntCounterVec,
}

impl GatewayMetrics {
    pub fn new() -> Result<Self> {
        let registry = Registry::new();
        let webhook_events = IntCounterVec::new(
            Opts::new(
                "wompi_webhook_events_total",
                "Inbound Wompi webhooks grouped by outcome",
            ),
            &["outcome"],
        )?;
        let acceptance_token_requests = IntCounterVec::new(
            Opts::new(
                "wompi_acceptance_token_requests_total",
                "Acceptance token lookups grouped by result",
            ),
            &["result"],
        )?;
        registry.register(Box::new(webhook_events.clone()))?;
        registry.register(Box::new(acceptance_token_requests.clone()))?;
        Ok(Self {
            registry,
            webhook_events,
            acceptance_token_requests,
        })
    }

    pub fn record_webhook(&self, outcome: &str) {
        self.webhook_events.with_label_values(&[outcome]).inc();
    }

    pub fn record_acceptance_token(&self, ok: bool) {
        let result = if ok { "ok" } else { "error" };
        self.acceptance_token_requests.with_label_values(&[result]).inc();
    }

    pub fn webhook_count(&self, outcome: &str) -> u64 {
        self.webhook_events.with_label_values(&[outcome]).get()
    }

    pub fn render(&self) -> Result<Response> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        let response = Response::builder()
            .status(StatusCode::OK)
            .header(
                header::CONTENT_TYPE,
                HeaderValue::from_static("text/plain; version=0.0.4"),
            )
            .body(Body::from(buffer))?;
        Ok(response)
    }
}
