//! Common test utilities

#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use tower::util::ServiceExt;
use withdrawal_ledger::api::{self, AppState};
use withdrawal_ledger::ledger::Ledger;
use withdrawal_ledger::publish::{BatchPublisher, BatchQueue, InMemoryTransport, TopicAddress};
use withdrawal_ledger::WithdrawalHandler;

pub struct TestApp {
    pub router: Router,
    pub handler: Arc<WithdrawalHandler>,
    pub transport: Arc<InMemoryTransport>,
}

/// Build the API over an in-memory ledger and transport
pub fn setup_app(ledger: Ledger, batch_size: usize, queue_capacity: usize) -> TestApp {
    let transport = Arc::new(InMemoryTransport::new());
    let publisher = BatchPublisher::new(
        Arc::new(BatchQueue::new(queue_capacity)),
        transport.clone(),
        TopicAddress::new("af-south-1", "000000000000", "withdrawals"),
        batch_size,
    )
    .expect("valid publisher settings");

    let handler = Arc::new(WithdrawalHandler::new(ledger, Arc::new(publisher)));
    let router = api::create_router().with_state(AppState::new(handler.clone()));

    TestApp {
        router,
        handler,
        transport,
    }
}

/// Send a request and return status plus body text
pub async fn send(router: &Router, method: &str, uri: &str) -> (StatusCode, String) {
    let req = Request::builder()
        .method(method)
        .uri(uri)
        .body(Body::empty())
        .unwrap();
    let response = router.clone().oneshot(req).await.unwrap();
    let status = response.status();
    let body = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, String::from_utf8(body.to_vec()).unwrap())
}

/// Create an account through the API and return its ID
pub async fn create_account(router: &Router, balance: &str) -> i64 {
    let (status, body) = send(router, "POST", &format!("/add?balance={}", balance)).await;
    assert_eq!(status, StatusCode::CREATED, "Account creation failed: {}", body);
    let json: serde_json::Value = serde_json::from_str(&body).unwrap();
    json["account_id"].as_i64().unwrap()
}
