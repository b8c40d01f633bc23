use httpmock::prelude::*;
use serde_json::{json, Value};

use wompi_gateway::models::{CardDetails, TransactionDraft, TransactionStatus};
use wompi_gateway::payment_method::PaymentMethodType;
use wompi_gateway::{KeySet, WompiClient, WompiConfig, WompiError};

fn config(base_url: String) -> WompiConfig {
    WompiConfig {
        use_sandbox: true,
        sandbox: KeySet {
            public_key: "pub_test_key".into(),
            private_key: "prv_test_key".into(),
            event_key: "test123".into(),
        },
        production: KeySet::default(),
        supported_currencies: vec!["COP".into()],
        auto_capture: true,
        base_url_override: Some(base_url),
        host: "127.0.0.1".into(),
        port: 0,
    }
}

fn client(server: &MockServer) -> WompiClient {
    WompiClient::new(&config(server.base_url())).unwrap()
}

fn transaction(id: &str, status: &str) -> Value {
    json!({
        "id": id,
        "created_at": "2024-01-14T16:17:05.000Z",
        "amount_in_cents": 2500000,
        "reference": "22234ed4",
        "currency": "COP",
        "payment_method_type": "CARD",
        "payment_method": {"type": "CARD", "extra": {"last_four": "4242"}},
        "status": status,
        "status_message": null,
        "customer_email": "pepito_perez@example.com",
        "redirect_url": null
    })
}

#[tokio::test]
async fn tokenize_card_uses_public_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/tokens/cards")
                .header("Authorization", "Bearer pub_test_key")
                .json_body_partial(json!({"number": "4242424242424242", "card_holder": "Pedro Pérez"}).to_string());
            then.status(201).json_body(json!({
                "status": "CREATED",
                "data": {
                    "id": "tok_test_1234",
                    "created_at": "2024-01-14T16:17:05.000Z",
                    "brand": "VISA",
                    "name": "VISA-4242",
                    "last_four": "4242",
                    "bin": "424242",
                    "exp_year": "28",
                    "exp_month": "08",
                    "card_holder": "Pedro Pérez",
                    "expires_at": "2024-07-12T16:17:05.000Z"
                }
            }));
        })
        .await;

    let card = CardDetails {
        number: "4242424242424242".into(),
        cvc: "123".into(),
        exp_month: "08".into(),
        exp_year: "28".into(),
        card_holder: "Pedro Pérez".into(),
    };
    let token = client(&server).tokenize_card(&card).await.unwrap();
    mock.assert_async().await;
    assert_eq!(token.id, "tok_test_1234");
    assert_eq!(token.last_four.as_deref(), Some("4242"));
}

#[tokio::test]
async fn financial_institutions_listed() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/pse/financial_institutions")
                .header("Authorization", "Bearer pub_test_key");
            then.status(200).json_body(json!({
                "data": [
                    {"financial_institution_code": "1", "financial_institution_name": "Banco que aprueba"},
                    {"financial_institution_code": "2", "financial_institution_name": "Banco que rechaza"}
                ]
            }));
        })
        .await;

    let banks = client(&server).financial_institutions().await.unwrap();
    mock.assert_async().await;
    assert_eq!(banks.len(), 2);
    assert_eq!(banks[1].financial_institution_name, "Banco que rechaza");
}

#[tokio::test]
async fn acceptance_token_from_merchant() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/merchants/pub_test_key")
                .header("Authorization", "Bearer pub_test_key");
            then.status(200).json_body(json!({
                "data": {
                    "id": 1,
                    "name": "Tienda Wompi",
                    "presigned_acceptance": {
                        "acceptance_token": "eyJhbGciOiJIUzI1NiJ9.acceptance",
                        "permalink": "https://wompi.co/wp-content/uploads/2019/09/TERMINOS-Y-CONDICIONES.pdf",
                        "type": "END_USER_POLICY"
                    }
                }
            }));
        })
        .await;

    let token = client(&server).acceptance_token().await.unwrap();
    mock.assert_async().await;
    assert_eq!(token.acceptance_token, "eyJhbGciOiJIUzI1NiJ9.acceptance");
    assert!(token.permalink.ends_with(".pdf"));
}

#[tokio::test]
async fn create_transaction_uses_private_key() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/transactions")
                .header("Authorization", "Bearer prv_test_key")
                .json_body_partial(
                    json!({
                        "acceptance_token": "acc_123",
                        "amount_in_cents": 2500000,
                        "currency": "COP",
                        "payment_method": {"type": "CARD", "token": "tok_test_1234", "installments": 1}
                    })
                    .to_string(),
                );
            then.status(201).json_body(json!({"data": transaction("1234-1610641025-49201", "PENDING")}));
        })
        .await;

    let payload = TransactionDraft {
        acceptance_token: Some("acc_123".into()),
        amount_in_cents: Some(2_500_000),
        currency: Some("COP".into()),
        customer_email: Some("pepito_perez@example.com".into()),
        reference: Some("22234ed4".into()),
        payment_method: Some(json!({"type": "CARD", "token": "tok_test_1234", "installments": 1})),
        shipping_address: None,
    }
    .build()
    .unwrap();

    let created = client(&server).create_transaction(&payload).await.unwrap();
    mock.assert_async().await;
    assert_eq!(created.id, "1234-1610641025-49201");
    assert!(created.is_pending());
}

#[tokio::test]
async fn retrieve_transaction_by_id() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/transactions/1234-1610641025-49201")
                .header("Authorization", "Bearer pub_test_key");
            then.status(200).json_body(json!({"data": transaction("1234-1610641025-49201", "APPROVED")}));
        })
        .await;

    let found = client(&server)
        .retrieve_transaction("1234-1610641025-49201")
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(found.status, TransactionStatus::Approved);
    assert_eq!(found.amount_in_cents, 2_500_000);
}

#[tokio::test]
async fn void_card_transaction() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/transactions/1234-1610641025-49201/void")
                .header("Authorization", "Bearer prv_test_key");
            then.status(201).json_body(json!({
                "data": {"transaction": transaction("1234-1610641025-49201", "VOIDED")}
            }));
        })
        .await;

    let voided = client(&server)
        .void_transaction("1234-1610641025-49201", PaymentMethodType::Card)
        .await
        .unwrap();
    mock.assert_async().await;
    assert_eq!(voided.status, TransactionStatus::Voided);
}

#[tokio::test]
async fn void_non_card_rejected_before_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(POST).path_contains("/void");
            then.status(201);
        })
        .await;

    let err = client(&server)
        .void_transaction("1234", PaymentMethodType::Nequi)
        .await
        .unwrap_err();
    mock.assert_hits_async(0).await;
    assert!(err.is_capability());
    assert!(err.to_string().contains("NEQUI"));
}

#[tokio::test]
async fn error_statuses_are_classified() {
    let server = MockServer::start_async().await;
    for (id, status) in [("t401", 401), ("t404", 404), ("t422", 422), ("t500", 500)] {
        server
            .mock_async(move |when, then| {
                when.method(GET).path(format!("/transactions/{id}"));
                then.status(status).body(format!("{{\"error\":{{\"type\":\"status_{status}\"}}}}"));
            })
            .await;
    }

    let client = client(&server);
    let unauthorized = client.retrieve_transaction("t401").await.unwrap_err();
    assert!(matches!(unauthorized, WompiError::Unauthorized(ref body) if body.contains("status_401")));
    assert!(matches!(
        client.retrieve_transaction("t404").await.unwrap_err(),
        WompiError::NotFound(_)
    ));
    assert!(matches!(
        client.retrieve_transaction("t422").await.unwrap_err(),
        WompiError::GatewayValidation(_)
    ));
    assert!(matches!(
        client.retrieve_transaction("t500").await.unwrap_err(),
        WompiError::Unknown { status: 500, .. }
    ));
}

#[tokio::test]
async fn undecodable_body_is_decode_error() {
    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/transactions/broken");
            then.status(200).body("<html>maintenance</html>");
        })
        .await;

    let err = client(&server).retrieve_transaction("broken").await.unwrap_err();
    assert!(matches!(err, WompiError::Decode(_)));
}
