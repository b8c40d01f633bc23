use std::sync::Arc;

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod handlers;
pub mod metrics;
pub mod models;
pub mod payment_method;
pub mod webhook;

pub use client::{Endpoint, KeyKind, WompiClient};
pub use config::{Environment, KeySet, WompiConfig};
pub use error::{WompiError, WompiResult};
pub use gateway::{GatewayResponse, PaymentData, PaymentExtra, PaymentGateway, TransactionKind, WompiGateway};
pub use metrics::GatewayMetrics;
pub use webhook::{LoggingOrderEvents, OrderAction, OrderEvents, WebhookOutcome};

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<WompiConfig>,
    pub gateway: Arc<WompiGateway>,
    pub order_events: Arc<dyn OrderEvents>,
    pub metrics: Arc<GatewayMetrics>,
}

impl AppState {
    pub fn new(config: WompiConfig, order_events: Arc<dyn OrderEvents>) -> anyhow::Result<Self> {
        let config = Arc::new(config);
        let client = WompiClient::new(&config)?;
        Ok(Self {
            gateway: Arc::new(WompiGateway::new(client, config.clone())),
            config,
            order_events,
            metrics: Arc::new(GatewayMetrics::new()?),
        })
    }
}
