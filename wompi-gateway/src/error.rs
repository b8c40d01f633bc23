use common_money::MoneyError;
use thiserror::Error;

use crate::payment_method::PaymentMethodType;

pub type WompiResult<T> = Result<T, WompiError>;

#[derive(Debug, Error)]
pub enum WompiError {
    #[error("missing fields for {context}: {}", fields.join(", "))]
    MissingFields { context: String, fields: Vec<String> },
    #[error("payment type {0} is not active")]
    UnsupportedPaymentType(String),
    #[error("invalid payment data: {0}")]
    InvalidPaymentData(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("rejected by gateway: {0}")]
    GatewayValidation(String),
    #[error("unexpected gateway status {status}: {body}")]
    Unknown { status: u16, body: String },
    #[error("{operation} is not supported for payment type {payment_type}")]
    OperationUnsupported {
        operation: &'static str,
        payment_type: PaymentMethodType,
    },
    #[error("Refund Not supported by Wompi.")]
    RefundUnsupported,
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error(transparent)]
    Amount(#[from] MoneyError),
    #[error("gateway request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("malformed gateway response: {0}")]
    Decode(String),
}

impl WompiError {
    /// Classify a non-2xx gateway response, keeping the raw body as the message.
    pub fn from_status(status: u16, body: String) -> Self {
        match status {
            401 => Self::Unauthorized(body),
            404 => Self::NotFound(body),
            422 => Self::GatewayValidation(body),
            _ => Self::Unknown { status, body },
        }
    }

    pub(crate) fn missing(context: impl Into<String>, fields: Vec<String>) -> Self {
        Self::MissingFields {
            context: context.into(),
            fields,
        }
    }

    /// True for errors raised because the gateway cannot perform the operation at all.
    pub fn is_capability(&self) -> bool {
        matches!(
            self,
            Self::OperationUnsupported { .. } | Self::RefundUnsupported
        )
    }
}
