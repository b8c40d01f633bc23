use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::{WompiError, WompiResult};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethodType {
    Card,
    Nequi,
    Pse,
    BancolombiaTransfer,
    BancolombiaCollect,
}

impl PaymentMethodType {
    pub const ACTIVE: [PaymentMethodType; 5] = [
        PaymentMethodType::Card,
        PaymentMethodType::BancolombiaTransfer,
        PaymentMethodType::Nequi,
        PaymentMethodType::Pse,
        PaymentMethodType::BancolombiaCollect,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            PaymentMethodType::Card => "CARD",
            PaymentMethodType::Nequi => "NEQUI",
            PaymentMethodType::Pse => "PSE",
            PaymentMethodType::BancolombiaTransfer => "BANCOLOMBIA_TRANSFER",
            PaymentMethodType::BancolombiaCollect => "BANCOLOMBIA_COLLECT",
        }
    }

    /// Keys a descriptor of this type must carry, `type` included.
    pub fn required_fields(&self) -> &'static [&'static str] {
        match self {
            PaymentMethodType::Card => &["type", "token"],
            PaymentMethodType::Nequi => &["type", "phone_number"],
            PaymentMethodType::Pse => &[
                "type",
                "user_type",
                "user_legal_id_type",
                "user_legal_id",
                "financial_institution_code",
                "payment_description",
            ],
            PaymentMethodType::BancolombiaTransfer => {
                &["type", "user_type", "payment_description"]
            }
            PaymentMethodType::BancolombiaCollect => &["type"],
        }
    }

    pub fn supports_void(&self) -> bool {
        matches!(self, PaymentMethodType::Card)
    }

    pub fn supports_refund(&self) -> bool {
        false
    }
}

impl fmt::Display for PaymentMethodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PaymentMethodType {
    type Err = WompiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        PaymentMethodType::ACTIVE
            .into_iter()
            .find(|kind| kind.as_str() == s)
            .ok_or_else(|| WompiError::UnsupportedPaymentType(s.to_string()))
    }
}

/// PSE sends a numeric person type, Bancolombia transfer a label such as `PERSON`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserType {
    Code(u8),
    Label(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    Card {
        token: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        installments: Option<u32>,
    },
    Nequi {
        phone_number: String,
    },
    Pse {
        user_type: UserType,
        user_legal_id_type: String,
        user_legal_id: String,
        financial_institution_code: String,
        payment_description: String,
    },
    BancolombiaTransfer {
        user_type: UserType,
        payment_description: String,
    },
    BancolombiaCollect,
}

impl PaymentMethod {
    /// Validate a raw descriptor and build the typed payment method from it.
    pub fn from_value(descriptor: &Value) -> WompiResult<Self> {
        let kind = validate_payment_method(descriptor)?;
        serde_json::from_value(descriptor.clone()).map_err(|err| {
            WompiError::InvalidPaymentData(format!("payment type {kind}: {err}"))
        })
    }

    pub fn payment_type(&self) -> PaymentMethodType {
        match self {
            PaymentMethod::Card { .. } => PaymentMethodType::Card,
            PaymentMethod::Nequi { .. } => PaymentMethodType::Nequi,
            PaymentMethod::Pse { .. } => PaymentMethodType::Pse,
            PaymentMethod::BancolombiaTransfer { .. } => PaymentMethodType::BancolombiaTransfer,
            PaymentMethod::BancolombiaCollect => PaymentMethodType::BancolombiaCollect,
        }
    }
}

/// Check that a descriptor names an active payment type and carries every
/// field that type requires. All missing fields are reported at once.
pub fn validate_payment_method(descriptor: &Value) -> WompiResult<PaymentMethodType> {
    let fields = descriptor.as_object();
    let raw_type = fields
        .and_then(|map| map.get("type"))
        .and_then(Value::as_str)
        .unwrap_or_default();
    let kind: PaymentMethodType = raw_type.parse()?;

    let missing: Vec<String> = kind
        .required_fields()
        .iter()
        .filter(|field| !fields.is_some_and(|map| map.contains_key(**field)))
        .map(|field| field.to_string())
        .collect();
    if !missing.is_empty() {
        return Err(WompiError::missing(format!("payment type {kind}"), missing));
    }
    Ok(kind)
}

/// Payment type named by a raw descriptor, if any.
pub fn payment_type_of(descriptor: &Value) -> Option<PaymentMethodType> {
    descriptor
        .get("type")
        .and_then(Value::as_str)
        .and_then(|raw| raw.parse().ok())
}
