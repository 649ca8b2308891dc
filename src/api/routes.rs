//! API Routes
//!
//! HTTP endpoint definitions.

use axum::{
    extract::{Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use std::sync::Arc;

use crate::domain::AccountId;
use crate::error::AppError;
use crate::handlers::WithdrawalHandler;

/// Shared state handed to every route
#[derive(Clone)]
pub struct AppState {
    pub handler: Arc<WithdrawalHandler>,
}

impl AppState {
    pub fn new(handler: Arc<WithdrawalHandler>) -> Self {
        Self { handler }
    }
}

// =========================================================================
// Request/Response types
// =========================================================================

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AmountQuery {
    pub account_id: i64,
    pub amount: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AddQuery {
    pub balance: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BalanceQuery {
    pub account_id: i64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountResponse {
    pub account_id: AccountId,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BalanceResponse {
    pub account_id: AccountId,
    pub balance: Decimal,
}

fn parse_decimal(field: &str, value: &str) -> Result<Decimal, AppError> {
    Decimal::from_str(value.trim())
        .map_err(|e| AppError::InvalidRequest(format!("Invalid {}: {}", field, e)))
}

// =========================================================================
// API Router
// =========================================================================

/// Create the API router
pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/withdraw", post(withdraw))
        .route("/deposit", post(deposit))
        .route("/add", post(add_account))
        .route("/balance", get(get_balance))
}

/// POST /withdraw?accountId=&amount=
///
/// Responds with the withdrawal result text.
async fn withdraw(
    State(state): State<AppState>,
    Query(query): Query<AmountQuery>,
) -> Result<(StatusCode, String), AppError> {
    let amount = parse_decimal("amount", &query.amount)?;
    let result = state
        .handler
        .withdraw(AccountId::new(query.account_id), amount)
        .await;

    let status = if result.is_success() {
        StatusCode::OK
    } else if result.is_client_error() {
        StatusCode::BAD_REQUEST
    } else {
        StatusCode::INTERNAL_SERVER_ERROR
    };

    Ok((status, result.to_string()))
}

/// POST /deposit?accountId=&amount=
async fn deposit(
    State(state): State<AppState>,
    Query(query): Query<AmountQuery>,
) -> Result<Json<BalanceResponse>, AppError> {
    let amount = parse_decimal("amount", &query.amount)?;
    let account_id = AccountId::new(query.account_id);
    let balance = state.handler.deposit(account_id, amount).await?;

    Ok(Json(BalanceResponse {
        account_id,
        balance: balance.value(),
    }))
}

/// POST /add?balance=
async fn add_account(
    State(state): State<AppState>,
    Query(query): Query<AddQuery>,
) -> Result<(StatusCode, Json<CreateAccountResponse>), AppError> {
    let balance = parse_decimal("balance", &query.balance)?;
    let account_id = state.handler.add(balance).await?;

    Ok((StatusCode::CREATED, Json(CreateAccountResponse { account_id })))
}

/// GET /balance?accountId=
async fn get_balance(
    State(state): State<AppState>,
    Query(query): Query<BalanceQuery>,
) -> Result<Json<BalanceResponse>, AppError> {
    let account_id = AccountId::new(query.account_id);
    let balance = state.handler.balance(account_id).await?;

    Ok(Json(BalanceResponse {
        account_id,
        balance: balance.value(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_decimal() {
        assert_eq!(parse_decimal("amount", " 30.00 ").unwrap(), Decimal::new(3000, 2));
        assert!(matches!(
            parse_decimal("amount", "3O.00"),
            Err(AppError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_amount_query_field_names() {
        let query: AmountQuery =
            serde_json::from_str(r#"{"accountId": 4, "amount": "1.50"}"#).unwrap();
        assert_eq!(query.account_id, 4);
        assert_eq!(query.amount, "1.50");
    }
}
