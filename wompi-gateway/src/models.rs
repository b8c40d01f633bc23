use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::{WompiError, WompiResult};
use crate::payment_method::PaymentMethod;

pub const DEFAULT_CURRENCY: &str = "COP";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TransactionStatus {
    Pending,
    Approved,
    Declined,
    Voided,
    Error,
}

impl TransactionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionStatus::Pending => "PENDING",
            TransactionStatus::Approved => "APPROVED",
            TransactionStatus::Declined => "DECLINED",
            TransactionStatus::Voided => "VOIDED",
            TransactionStatus::Error => "ERROR",
        }
    }
}

impl fmt::Display for TransactionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Transaction as reported by the gateway. Only ever read back, never changed locally.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Transaction {
    pub id: String,
    pub created_at: Option<String>,
    #[serde(deserialize_with = "number_or_string")]
    pub amount_in_cents: i64,
    pub reference: Option<String>,
    #[serde(default = "default_currency")]
    pub currency: String,
    pub payment_method_type: Option<String>,
    pub payment_method: Option<Value>,
    pub status: TransactionStatus,
    pub status_message: Option<String>,
    pub customer_email: Option<String>,
    pub shipping_address: Option<Value>,
    pub redirect_url: Option<String>,
    pub payment_source_id: Option<Value>,
    pub payment_link_id: Option<Value>,
    pub customer_data: Option<Value>,
    pub bill_id: Option<Value>,
}

impl Transaction {
    pub fn is_pending(&self) -> bool {
        self.status == TransactionStatus::Pending
    }

    pub fn is_approved(&self) -> bool {
        self.status == TransactionStatus::Approved
    }
}

fn default_currency() -> String {
    DEFAULT_CURRENCY.to_string()
}

// Webhooks have been seen sending `amount_in_cents` as a string.
fn number_or_string<'de, D>(deserializer: D) -> Result<i64, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Raw {
        Number(i64),
        Text(String),
    }

    match Raw::deserialize(deserializer)? {
        Raw::Number(value) => Ok(value),
        Raw::Text(text) => text.trim().parse().map_err(serde::de::Error::custom),
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AcceptanceToken {
    pub acceptance_token: String,
    pub permalink: String,
}

#[derive(Debug, Deserialize)]
pub(crate) struct MerchantData {
    pub presigned_acceptance: AcceptanceToken,
}

#[derive(Debug, Clone, Serialize)]
pub struct CardDetails {
    pub number: String,
    pub cvc: String,
    pub exp_month: String,
    pub exp_year: String,
    pub card_holder: String,
}

impl CardDetails {
    pub fn validate(&self) -> WompiResult<()> {
        let fields = [
            ("number", &self.number),
            ("cvc", &self.cvc),
            ("exp_month", &self.exp_month),
            ("exp_year", &self.exp_year),
            ("card_holder", &self.card_holder),
        ];
        let missing: Vec<String> = fields
            .iter()
            .filter(|(_, value)| value.trim().is_empty())
            .map(|(name, _)| name.to_string())
            .collect();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(WompiError::missing("card tokenization", missing))
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardToken {
    pub id: String,
    pub created_at: Option<String>,
    pub brand: Option<String>,
    pub name: Option<String>,
    pub last_four: Option<String>,
    pub bin: Option<String>,
    pub exp_year: Option<String>,
    pub exp_month: Option<String>,
    pub card_holder: Option<String>,
    pub expires_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinancialInstitution {
    pub financial_institution_code: String,
    pub financial_institution_name: String,
}

/// Address as the host platform stores it.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AddressData {
    pub first_name: String,
    pub last_name: String,
    pub street_address_1: String,
    pub street_address_2: String,
    pub city: String,
    pub city_area: String,
    pub postal_code: String,
    pub country: String,
    pub phone: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShippingAddress {
    pub address_line_1: String,
    pub address_line_2: String,
    pub country: String,
    pub region: String,
    pub city: String,
    pub name: String,
    pub phone_number: String,
    pub postal_code: String,
}

impl From<&AddressData> for ShippingAddress {
    fn from(address: &AddressData) -> Self {
        Self {
            address_line_1: address.street_address_1.clone(),
            address_line_2: address.street_address_2.clone(),
            country: address.country.clone(),
            region: address.city_area.clone(),
            city: address.city.clone(),
            name: format!("{} {}", address.first_name, address.last_name),
            phone_number: address.phone.clone(),
            postal_code: address.postal_code.clone(),
        }
    }
}

/// Transaction-creation fields gathered from the host before validation.
#[derive(Debug, Clone, Default)]
pub struct TransactionDraft {
    pub acceptance_token: Option<String>,
    pub amount_in_cents: Option<i64>,
    pub currency: Option<String>,
    pub customer_email: Option<String>,
    pub reference: Option<String>,
    pub payment_method: Option<Value>,
    pub shipping_address: Option<ShippingAddress>,
}

impl TransactionDraft {
    pub const REQUIRED_FIELDS: [&'static str; 6] = [
        "acceptance_token",
        "amount_in_cents",
        "currency",
        "customer_email",
        "reference",
        "payment_method",
    ];

    /// Check top-level keys first, then the payment method descriptor.
    pub fn build(self) -> WompiResult<TransactionPayload> {
        let acceptance_token = non_blank(self.acceptance_token);
        let currency = non_blank(self.currency);
        let customer_email = non_blank(self.customer_email);
        let reference = non_blank(self.reference);
        let raw_method = self.payment_method.filter(|value| !value.is_null());
        let provided = [
            acceptance_token.is_some(),
            self.amount_in_cents.is_some(),
            currency.is_some(),
            customer_email.is_some(),
            reference.is_some(),
            raw_method.is_some(),
        ];
        let missing: Vec<String> = Self::REQUIRED_FIELDS
            .iter()
            .zip(provided)
            .filter(|(_, ok)| !ok)
            .map(|(name, _)| name.to_string())
            .collect();

        let (
            Some(acceptance_token),
            Some(amount_in_cents),
            Some(currency),
            Some(customer_email),
            Some(reference),
            Some(raw_method),
        ) = (
            acceptance_token,
            self.amount_in_cents,
            currency,
            customer_email,
            reference,
            raw_method,
        )
        else {
            return Err(WompiError::missing("transaction", missing));
        };
        let payment_method = PaymentMethod::from_value(&raw_method)?;

        Ok(TransactionPayload {
            acceptance_token,
            amount_in_cents,
            currency,
            customer_email,
            reference,
            payment_method,
            shipping_address: self.shipping_address,
        })
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.filter(|text| !text.trim().is_empty())
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TransactionPayload {
    pub acceptance_token: String,
    pub amount_in_cents: i64,
    pub currency: String,
    pub customer_email: String,
    pub reference: String,
    pub payment_method: PaymentMethod,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shipping_address: Option<ShippingAddress>,
}
