use axum::http::StatusCode;
use serde::Deserialize;
use serde_json::Value;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;
use tracing::{info, warn};

use crate::config::{Environment, WompiConfig};
use crate::models::{Transaction, TransactionStatus};

pub const TRANSACTION_UPDATED: &str = "transaction.updated";
pub const ACCEPTED_BODY: &str = "[accepted]";
pub const INVALID_CHECKSUM_BODY: &str = "Invalid Checksum.";

// Checksum inputs are rendered the way they appear on the wire: strings verbatim,
// numbers in decimal, absent values as nothing. Wompi always signs id, status,
// amount and timestamp, so a payload missing one of them never verifies.
fn wire_text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(text)) => text.clone(),
        Some(Value::Number(number)) => number.to_string(),
        Some(Value::Bool(flag)) => flag.to_string(),
        _ => String::new(),
    }
}

fn event_timestamp(payload: &Value) -> Option<&Value> {
    payload
        .get("timestamp")
        .filter(|value| !value.is_null())
        .or_else(|| payload.pointer("/data/timestamp"))
}

/// SHA-256 hex of `{id}-{status}-{amount_in_cents}{timestamp}{event_key}` over `data.transaction`.
pub fn generate_checksum(payload: &Value, event_key: &str) -> String {
    let transaction = payload.pointer("/data/transaction");
    let field = |name: &str| wire_text(transaction.and_then(|txn| txn.get(name)));
    let input = format!(
        "{}-{}-{}{}{}",
        field("id"),
        field("status"),
        field("amount_in_cents"),
        wire_text(event_timestamp(payload)),
        event_key
    );
    hex::encode(Sha256::digest(input.as_bytes()))
}

pub fn verify_checksum(payload: &Value, event_key: &str) -> bool {
    let Some(provided) = payload
        .pointer("/signature/checksum")
        .and_then(Value::as_str)
    else {
        return false;
    };
    let expected = generate_checksum(payload, event_key);
    expected.as_bytes().ct_eq(provided.as_bytes()).into()
}

/// What the host order should do after a transaction update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderAction {
    /// Payment still in flight; nothing changes.
    Acknowledge,
    /// Record the capture and move the order forward.
    CaptureAndAdvance,
    /// Keep the order from progressing.
    Hold,
}

impl OrderAction {
    pub fn for_status(status: TransactionStatus) -> Self {
        match status {
            TransactionStatus::Pending => OrderAction::Acknowledge,
            TransactionStatus::Approved => OrderAction::CaptureAndAdvance,
            TransactionStatus::Declined | TransactionStatus::Voided | TransactionStatus::Error => {
                OrderAction::Hold
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            OrderAction::Acknowledge => "acknowledge",
            OrderAction::CaptureAndAdvance => "capture_and_advance",
            OrderAction::Hold => "hold",
        }
    }
}

/// Host order state machine, driven by verified transaction updates.
#[async_trait::async_trait]
pub trait OrderEvents: Send + Sync {
    async fn apply(&self, transaction: &Transaction, action: OrderAction) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Default)]
pub struct LoggingOrderEvents;

#[async_trait::async_trait]
impl OrderEvents for LoggingOrderEvents {
    async fn apply(&self, transaction: &Transaction, action: OrderAction) -> anyhow::Result<()> {
        info!(
            transaction_id = %transaction.id,
            reference = transaction.reference.as_deref().unwrap_or_default(),
            status = %transaction.status,
            amount_in_cents = transaction.amount_in_cents,
            action = action.as_str(),
            "Wompi transaction update"
        );
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WebhookOutcome {
    Malformed,
    InvalidChecksum,
    Ignored,
    Dispatched(OrderAction),
    /// Verified, but the update could not be decoded or applied.
    Degraded,
}

impl WebhookOutcome {
    pub fn label(&self) -> &'static str {
        match self {
            WebhookOutcome::Malformed => "malformed",
            WebhookOutcome::InvalidChecksum => "invalid_checksum",
            WebhookOutcome::Ignored => "ignored",
            WebhookOutcome::Dispatched(_) => "dispatched",
            WebhookOutcome::Degraded => "degraded",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            WebhookOutcome::InvalidChecksum => StatusCode::BAD_REQUEST,
            _ => StatusCode::OK,
        }
    }

    pub fn body(&self) -> &'static str {
        match self {
            WebhookOutcome::InvalidChecksum => INVALID_CHECKSUM_BODY,
            _ => ACCEPTED_BODY,
        }
    }
}

#[derive(Deserialize)]
struct TransactionData {
    transaction: Transaction,
}

pub async fn process_webhook(
    config: &WompiConfig,
    events: &dyn OrderEvents,
    body: &[u8],
) -> WebhookOutcome {
    let payload: Value = match serde_json::from_slice(body) {
        Ok(payload) => payload,
        Err(err) => {
            warn!(error = %err, "Cannot parse Wompi webhook body");
            return WebhookOutcome::Malformed;
        }
    };

    let environment = Environment::from_webhook(payload.get("environment").and_then(Value::as_str));
    let event_key = &config.keys(environment).event_key;
    if !verify_checksum(&payload, event_key) {
        warn!(environment = ?environment, "Wompi webhook checksum mismatch");
        return WebhookOutcome::InvalidChecksum;
    }

    let event = payload.get("event").and_then(Value::as_str).unwrap_or_default();
    if event != TRANSACTION_UPDATED {
        info!(event, "Ignoring Wompi webhook event");
        return WebhookOutcome::Ignored;
    }

    let data = match payload.get("data").cloned().map(serde_json::from_value::<TransactionData>) {
        Some(Ok(data)) => data,
        Some(Err(err)) => {
            warn!(error = %err, "Cannot decode Wompi transaction update");
            return WebhookOutcome::Degraded;
        }
        None => {
            warn!("Wompi transaction update without data");
            return WebhookOutcome::Degraded;
        }
    };

    let action = OrderAction::for_status(data.transaction.status);
    match events.apply(&data.transaction, action).await {
        Ok(()) => WebhookOutcome::Dispatched(action),
        Err(err) => {
            warn!(error = %err, transaction_id = %data.transaction.id, "Failed to apply Wompi transaction update");
            WebhookOutcome::Degraded
        }
    }
}
