use std::sync::Arc;

use bigdecimal::BigDecimal;
use common_money::{from_minor_units, normalize_scale, to_minor_units};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{info, warn};
use uuid::Uuid;

use crate::client::WompiClient;
use crate::config::WompiConfig;
use crate::error::{WompiError, WompiResult};
use crate::models::{AddressData, ShippingAddress, Transaction, TransactionDraft, TransactionStatus, DEFAULT_CURRENCY};
use crate::payment_method::payment_type_of;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransactionKind {
    Auth,
    Capture,
    Refund,
    Void,
}

/// Gateway-specific data the storefront attaches to a payment.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PaymentExtra {
    pub acceptance_token: Option<String>,
    pub payment_method: Option<Value>,
}

#[derive(Debug, Clone)]
pub struct PaymentData {
    /// Gateway transaction id, once one exists.
    pub token: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub customer_email: String,
    pub customer_id: Option<String>,
    /// Host payment identifier, sent as the transaction reference.
    pub reference: String,
    pub shipping: Option<AddressData>,
    pub data: PaymentExtra,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GatewayResponse {
    pub is_success: bool,
    pub action_required: bool,
    pub transaction_id: Option<String>,
    pub amount: BigDecimal,
    pub currency: String,
    pub error: Option<String>,
    pub kind: TransactionKind,
    pub raw_response: Value,
    pub customer_id: Option<String>,
}

impl GatewayResponse {
    fn from_transaction(transaction: &Transaction, kind: TransactionKind, success: bool) -> Self {
        Self {
            is_success: success,
            action_required: transaction.status == TransactionStatus::Pending,
            transaction_id: Some(transaction.id.clone()),
            amount: from_minor_units(transaction.amount_in_cents),
            currency: transaction.currency.clone(),
            error: None,
            kind,
            raw_response: serde_json::to_value(transaction).unwrap_or(Value::Null),
            customer_id: None,
        }
    }

    fn failure(payment: &PaymentData, kind: TransactionKind, err: &WompiError) -> Self {
        Self {
            is_success: false,
            action_required: false,
            transaction_id: payment.token.clone(),
            amount: normalize_scale(&payment.amount),
            currency: payment.currency.clone(),
            error: Some(err.to_string()),
            kind,
            raw_response: Value::Object(Default::default()),
            customer_id: payment.customer_id.clone(),
        }
    }
}

/// Operations the host platform calls on a payment gateway. None of them fail:
/// gateway errors come back as unsuccessful responses.
#[async_trait::async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn authorize(&self, payment: &PaymentData) -> GatewayResponse;
    async fn process_payment(&self, payment: &PaymentData) -> GatewayResponse;
    async fn capture(&self, payment: &PaymentData) -> GatewayResponse;
    async fn void(&self, payment: &PaymentData) -> GatewayResponse;
    async fn refund(&self, payment: &PaymentData) -> GatewayResponse;
}

#[derive(Clone)]
pub struct WompiGateway {
    client: WompiClient,
    config: Arc<WompiConfig>,
}

impl WompiGateway {
    pub fn new(client: WompiClient, config: Arc<WompiConfig>) -> Self {
        Self { client, config }
    }

    pub fn client(&self) -> &WompiClient {
        &self.client
    }

    pub fn get_client_token(&self) -> String {
        Uuid::new_v4().to_string()
    }

    pub fn supported_currencies(&self) -> &[String] {
        &self.config.supported_currencies
    }

    fn authorize_kind(&self) -> TransactionKind {
        if self.config.auto_capture {
            TransactionKind::Capture
        } else {
            TransactionKind::Auth
        }
    }

    fn draft_for(payment: &PaymentData) -> WompiResult<TransactionDraft> {
        Ok(TransactionDraft {
            acceptance_token: payment.data.acceptance_token.clone(),
            amount_in_cents: Some(to_minor_units(&payment.amount)?),
            currency: Some(DEFAULT_CURRENCY.to_string()),
            customer_email: Some(payment.customer_email.clone()),
            reference: Some(payment.reference.clone()),
            payment_method: payment.data.payment_method.clone(),
            shipping_address: payment.shipping.as_ref().map(ShippingAddress::from),
        })
    }

    async fn create(&self, payment: &PaymentData) -> WompiResult<Transaction> {
        let payload = Self::draft_for(payment)?.build()?;
        self.client.create_transaction(&payload).await
    }

    async fn void_payment(&self, payment: &PaymentData) -> WompiResult<Transaction> {
        let payment_type = payment
            .data
            .payment_method
            .as_ref()
            .and_then(payment_type_of)
            .ok_or_else(|| WompiError::UnsupportedPaymentType("unknown".into()))?;
        let id = payment
            .token
            .as_deref()
            .ok_or_else(|| WompiError::missing("void", vec!["token".into()]))?;
        self.client.void_transaction(id, payment_type).await
    }
}

#[async_trait::async_trait]
impl PaymentGateway for WompiGateway {
    async fn authorize(&self, payment: &PaymentData) -> GatewayResponse {
        let kind = self.authorize_kind();
        match self.create(payment).await {
            Ok(transaction) => {
                info!(transaction_id = %transaction.id, status = %transaction.status, reference = %payment.reference, "Wompi transaction authorized");
                let mut response = GatewayResponse::from_transaction(&transaction, kind, true);
                response.customer_id = payment.customer_id.clone();
                response
            }
            Err(err) => {
                warn!(error = %err, reference = %payment.reference, "Wompi authorize failed");
                GatewayResponse::failure(payment, kind, &err)
            }
        }
    }

    async fn process_payment(&self, payment: &PaymentData) -> GatewayResponse {
        self.authorize(payment).await
    }

    async fn capture(&self, payment: &PaymentData) -> GatewayResponse {
        let kind = TransactionKind::Capture;
        let Some(id) = payment.token.as_deref() else {
            let err = WompiError::missing("capture", vec!["token".into()]);
            return GatewayResponse::failure(payment, kind, &err);
        };
        match self.client.retrieve_transaction(id).await {
            Ok(transaction) => {
                GatewayResponse::from_transaction(&transaction, kind, transaction.is_approved())
            }
            Err(err) => {
                warn!(error = %err, transaction_id = id, "Wompi capture failed");
                GatewayResponse::failure(payment, kind, &err)
            }
        }
    }

    async fn void(&self, payment: &PaymentData) -> GatewayResponse {
        let kind = TransactionKind::Void;
        match self.void_payment(payment).await {
            Ok(transaction) => {
                info!(transaction_id = %transaction.id, status = %transaction.status, "Wompi transaction voided");
                GatewayResponse::from_transaction(&transaction, kind, true)
            }
            Err(err) if err.is_capability() => {
                info!(error = %err, "Wompi void not available");
                GatewayResponse::failure(payment, kind, &err)
            }
            Err(err) => {
                warn!(error = %err, "Wompi void failed");
                GatewayResponse::failure(payment, kind, &err)
            }
        }
    }

    async fn refund(&self, payment: &PaymentData) -> GatewayResponse {
        let payment_type = payment.data.payment_method.as_ref().and_then(payment_type_of);
        if let Some(payment_type) = payment_type.filter(|kind| !kind.supports_refund()) {
            info!(%payment_type, transaction_id = payment.token.as_deref().unwrap_or_default(), "Wompi refund requested for non-refundable payment");
        }
        GatewayResponse::failure(payment, TransactionKind::Refund, &WompiError::RefundUnsupported)
    }
}
