use reqwest::{Client, Method};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::config::WompiConfig;
use crate::error::{WompiError, WompiResult};
use crate::models::{
    AcceptanceToken, CardDetails, CardToken, FinancialInstitution, MerchantData, Transaction,
    TransactionPayload,
};
use crate::payment_method::PaymentMethodType;

/// Which merchant key signs a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyKind {
    /// Low-sensitivity lookups and tokenization.
    Public,
    /// Transaction mutation.
    Private,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub method: Method,
    pub path: String,
    pub key: KeyKind,
}

impl Endpoint {
    fn new(method: Method, path: impl Into<String>, key: KeyKind) -> Self {
        Self {
            method,
            path: path.into(),
            key,
        }
    }

    pub fn tokenize_card() -> Self {
        Self::new(Method::POST, "tokens/cards", KeyKind::Public)
    }

    pub fn financial_institutions() -> Self {
        Self::new(Method::GET, "pse/financial_institutions", KeyKind::Public)
    }

    pub fn acceptance_token(public_key: &str) -> Self {
        Self::new(Method::GET, format!("merchants/{public_key}"), KeyKind::Public)
    }

    pub fn retrieve_transaction(id: &str) -> Self {
        Self::new(Method::GET, format!("transactions/{id}"), KeyKind::Public)
    }

    pub fn create_transaction() -> Self {
        Self::new(Method::POST, "transactions", KeyKind::Private)
    }

    pub fn void_transaction(id: &str) -> Self {
        Self::new(Method::POST, format!("transactions/{id}/void"), KeyKind::Private)
    }
}

#[derive(Debug, Deserialize)]
struct Envelope<T> {
    data: T,
}

#[derive(Debug, Deserialize)]
struct VoidData {
    transaction: Transaction,
}

#[derive(Clone)]
pub struct WompiClient {
    http: Client,
    base_url: String,
    public_key: String,
    private_key: String,
}

impl WompiClient {
    pub fn new(config: &WompiConfig) -> WompiResult<Self> {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(http: Client, config: &WompiConfig) -> WompiResult<Self> {
        let keys = config.active_keys();
        if keys.public_key.is_empty() {
            return Err(WompiError::Configuration("Invalid key for Wompi".into()));
        }
        if keys.private_key.is_empty() {
            return Err(WompiError::Configuration("Invalid Secret for Wompi".into()));
        }
        Ok(Self {
            http,
            base_url: config.base_url().trim_end_matches('/').to_string(),
            public_key: keys.public_key.clone(),
            private_key: keys.private_key.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn url_for(&self, endpoint: &Endpoint) -> String {
        format!("{}/{}", self.base_url, endpoint.path)
    }

    pub fn authorization_for(&self, key: KeyKind) -> String {
        let secret = match key {
            KeyKind::Public => &self.public_key,
            KeyKind::Private => &self.private_key,
        };
        format!("Bearer {secret}")
    }

    async fn send<B, T>(&self, endpoint: Endpoint, body: Option<&B>) -> WompiResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let url = self.url_for(&endpoint);
        debug!(method = %endpoint.method, path = %endpoint.path, key = ?endpoint.key, "Wompi request");
        let mut request = self
            .http
            .request(endpoint.method.clone(), &url)
            .header(reqwest::header::AUTHORIZATION, self.authorization_for(endpoint.key));
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), path = %endpoint.path, "Wompi request failed");
            return Err(WompiError::from_status(status.as_u16(), text));
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes)
            .map_err(|err| WompiError::Decode(format!("{}: {err}", endpoint.path)))
    }

    pub async fn tokenize_card(&self, card: &CardDetails) -> WompiResult<CardToken> {
        card.validate()?;
        let envelope: Envelope<CardToken> = self.send(Endpoint::tokenize_card(), Some(card)).await?;
        Ok(envelope.data)
    }

    pub async fn financial_institutions(&self) -> WompiResult<Vec<FinancialInstitution>> {
        let envelope: Envelope<Vec<FinancialInstitution>> = self
            .send::<(), _>(Endpoint::financial_institutions(), None)
            .await?;
        Ok(envelope.data)
    }

    pub async fn acceptance_token(&self) -> WompiResult<AcceptanceToken> {
        let envelope: Envelope<MerchantData> = self
            .send::<(), _>(Endpoint::acceptance_token(&self.public_key), None)
            .await?;
        Ok(envelope.data.presigned_acceptance)
    }

    pub async fn create_transaction(&self, payload: &TransactionPayload) -> WompiResult<Transaction> {
        let envelope: Envelope<Transaction> = self
            .send(Endpoint::create_transaction(), Some(payload))
            .await?;
        debug!(transaction_id = %envelope.data.id, status = %envelope.data.status, "Wompi transaction created");
        Ok(envelope.data)
    }

    pub async fn retrieve_transaction(&self, id: &str) -> WompiResult<Transaction> {
        let envelope: Envelope<Transaction> = self
            .send::<(), _>(Endpoint::retrieve_transaction(id), None)
            .await?;
        Ok(envelope.data)
    }

    /// Void is only offered for card payments; other types fail before any request is made.
    pub async fn void_transaction(
        &self,
        id: &str,
        payment_type: PaymentMethodType,
    ) -> WompiResult<Transaction> {
        if !payment_type.supports_void() {
            return Err(WompiError::OperationUnsupported {
                operation: "void",
                payment_type,
            });
        }
        let envelope: Envelope<VoidData> = self
            .send::<(), _>(Endpoint::void_transaction(id), None)
            .await?;
        Ok(envelope.data.transaction)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{KeySet, SANDBOX_URL};

    fn config(public_key: &str, private_key: &str) -> WompiConfig {
        WompiConfig {
            use_sandbox: true,
            sandbox: KeySet {
                public_key: public_key.into(),
                private_key: private_key.into(),
                event_key: "test_event_key".into(),
            },
            production: KeySet::default(),
            supported_currencies: vec!["COP".into()],
            auto_capture: true,
            base_url_override: None,
            host: "127.0.0.1".into(),
            port: 0,
        }
    }

    #[test]
    fn endpoints_select_keys_by_sensitivity() {
        assert_eq!(Endpoint::tokenize_card().key, KeyKind::Public);
        assert_eq!(Endpoint::financial_institutions().key, KeyKind::Public);
        assert_eq!(Endpoint::acceptance_token("pub").key, KeyKind::Public);
        assert_eq!(Endpoint::acceptance_token("pub").path, "merchants/pub");
        assert_eq!(Endpoint::create_transaction().key, KeyKind::Private);
        assert_eq!(Endpoint::void_transaction("t-1").path, "transactions/t-1/void");
        assert_eq!(Endpoint::void_transaction("t-1").key, KeyKind::Private);
    }

    #[test]
    fn bearer_header_uses_selected_key() {
        let client = WompiClient::new(&config("test_public_key", "test_private_key")).unwrap();
        assert_eq!(client.authorization_for(KeyKind::Public), "Bearer test_public_key");
        assert_eq!(client.authorization_for(KeyKind::Private), "Bearer test_private_key");
        assert_eq!(client.base_url(), SANDBOX_URL);
        assert_eq!(client.url_for(&Endpoint::create_transaction()), format!("{SANDBOX_URL}/transactions"));
    }

    #[test]
    fn trailing_slash_trimmed_from_override() {
        let mut config = config("pub", "prv");
        config.base_url_override = Some("http://localhost:9999/v1/".into());
        let client = WompiClient::new(&config).unwrap();
        assert_eq!(client.base_url(), "http://localhost:9999/v1");
        assert_eq!(
            client.url_for(&Endpoint::retrieve_transaction("t-1")),
            "http://localhost:9999/v1/transactions/t-1"
        );
    }

    #[test]
    fn missing_keys_rejected() {
        assert!(matches!(
            WompiClient::new(&config("", "secret")),
            Err(WompiError::Configuration(_))
        ));
        assert!(matches!(
            WompiClient::new(&config("public", "")),
            Err(WompiError::Configuration(_))
        ));
    }
}
