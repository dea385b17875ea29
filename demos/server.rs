//! Simple REST API server example for the reward ledger.
//!
//! Run with: `cargo run --example server`
//!
//! ## Endpoints
//!
//! - `POST /users` - Register a user with an opening points balance
//! - `GET /users/{id}` - Get a user's balance
//! - `POST /rewards` - Create a reward
//! - `GET /rewards` - List rewards
//! - `POST /purchases` - Create a purchase (debits points, status `pending`)
//! - `POST /purchases/{id}/approve` - Approve a pending purchase
//! - `POST /purchases/{id}/reject` - Reject a pending purchase (refund)
//! - `POST /purchases/{id}/complete` - Complete an approved purchase
//! - `POST /purchases/{id}/cancel` - Cancel a pending/approved purchase (refund)
//! - `GET /purchases` - List purchases
//!
//! ## Example Usage
//!
//! ```bash
//! curl -X POST http://localhost:3000/users \
//!   -H "Content-Type: application/json" \
//!   -d '{"id": 1, "points": 200}'
//!
//! curl -X POST http://localhost:3000/rewards \
//!   -H "Content-Type: application/json" \
//!   -d '{"name": "Coffee voucher", "price": 80, "available": true}'
//!
//! curl -X POST http://localhost:3000/purchases \
//!   -H "Content-Type: application/json" \
//!   -d '{"user_id": 1, "reward_id": 1}'
//!
//! curl -X POST http://localhost:3000/purchases/1/approve
//! ```

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use reward_ledger_rs::{
    LedgerError, Purchase, PurchaseId, PurchaseLedger, Reward, RewardCatalog, RewardDraft,
    RewardId, UserDirectory, UserId,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::net::TcpListener;

// === Request/Response DTOs ===

/// Request body for registering a user.
#[derive(Debug, Deserialize)]
pub struct RegisterUserRequest {
    pub id: u64,
    pub points: i64,
}

/// Request body for creating a reward.
#[derive(Debug, Deserialize)]
pub struct CreateRewardRequest {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: i64,
    pub available: bool,
    #[serde(default)]
    pub stock: Option<i64>,
}

/// Request body for creating a purchase.
#[derive(Debug, Deserialize)]
pub struct CreatePurchaseRequest {
    pub user_id: u64,
    pub reward_id: u64,
}

/// Response body for user balances.
#[derive(Debug, Serialize)]
pub struct BalanceResponse {
    pub id: u64,
    pub points: i64,
}

/// Response body for errors.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

// === Application State ===

/// Shared application state containing the ledger engine.
#[derive(Clone)]
pub struct AppState {
    pub ledger: Arc<PurchaseLedger>,
}

// === Error Handling ===

/// Wrapper for converting `LedgerError` into HTTP responses.
pub struct AppError(LedgerError);

impl From<LedgerError> for AppError {
    fn from(err: LedgerError) -> Self {
        AppError(err)
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code) = match &self.0 {
            LedgerError::EmptyName => (StatusCode::BAD_REQUEST, "EMPTY_NAME"),
            LedgerError::NegativePrice => (StatusCode::BAD_REQUEST, "NEGATIVE_PRICE"),
            LedgerError::NegativeStock => (StatusCode::BAD_REQUEST, "NEGATIVE_STOCK"),
            LedgerError::NegativeBalance => (StatusCode::BAD_REQUEST, "NEGATIVE_BALANCE"),
            LedgerError::UserNotFound(_) => (StatusCode::NOT_FOUND, "USER_NOT_FOUND"),
            LedgerError::RewardNotFound(_) => (StatusCode::NOT_FOUND, "REWARD_NOT_FOUND"),
            LedgerError::PurchaseNotFound(_) => (StatusCode::NOT_FOUND, "PURCHASE_NOT_FOUND"),
            LedgerError::RewardUnavailable => {
                (StatusCode::UNPROCESSABLE_ENTITY, "REWARD_UNAVAILABLE")
            }
            LedgerError::OutOfStock => (StatusCode::UNPROCESSABLE_ENTITY, "OUT_OF_STOCK"),
            LedgerError::InsufficientPoints { .. } => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INSUFFICIENT_POINTS")
            }
            LedgerError::InvalidTransition { .. } => (StatusCode::CONFLICT, "INVALID_TRANSITION"),
            LedgerError::VersionConflict { .. } => (StatusCode::CONFLICT, "VERSION_CONFLICT"),
        };

        (
            status,
            Json(ErrorResponse {
                error: self.0.to_string(),
                code: code.to_string(),
            }),
        )
            .into_response()
    }
}

// === Handlers ===

/// POST /users - Register a user.
async fn register_user(
    State(state): State<AppState>,
    Json(request): Json<RegisterUserRequest>,
) -> Result<StatusCode, AppError> {
    state
        .ledger
        .directory()
        .register(UserId(request.id), request.points)?;
    Ok(StatusCode::CREATED)
}

/// GET /users/{id} - Get a user's balance.
async fn get_balance(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<BalanceResponse>, AppError> {
    let points = state.ledger.directory().balance(UserId(id))?;
    Ok(Json(BalanceResponse { id, points }))
}

/// POST /rewards - Create a reward.
async fn create_reward(
    State(state): State<AppState>,
    Json(request): Json<CreateRewardRequest>,
) -> Result<(StatusCode, Json<Reward>), AppError> {
    let reward = state.ledger.catalog().create(RewardDraft {
        name: request.name,
        description: request.description,
        price: request.price,
        available: request.available,
        stock: request.stock,
    })?;
    Ok((StatusCode::CREATED, Json(reward)))
}

/// GET /rewards - List all rewards.
async fn list_rewards(State(state): State<AppState>) -> Json<Vec<Reward>> {
    Json(state.ledger.catalog().list())
}

/// POST /purchases - Create a purchase.
async fn create_purchase(
    State(state): State<AppState>,
    Json(request): Json<CreatePurchaseRequest>,
) -> Result<(StatusCode, Json<Purchase>), AppError> {
    let purchase = state
        .ledger
        .create(UserId(request.user_id), RewardId(request.reward_id))?;
    Ok((StatusCode::CREATED, Json(purchase)))
}

/// POST /purchases/{id}/approve
async fn approve_purchase(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Purchase>, AppError> {
    Ok(Json(state.ledger.approve(PurchaseId(id))?))
}

/// POST /purchases/{id}/reject
async fn reject_purchase(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Purchase>, AppError> {
    Ok(Json(state.ledger.reject(PurchaseId(id))?))
}

/// POST /purchases/{id}/complete
async fn complete_purchase(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Purchase>, AppError> {
    Ok(Json(state.ledger.complete(PurchaseId(id))?))
}

/// POST /purchases/{id}/cancel
async fn cancel_purchase(
    State(state): State<AppState>,
    Path(id): Path<u64>,
) -> Result<Json<Purchase>, AppError> {
    Ok(Json(state.ledger.cancel(PurchaseId(id))?))
}

/// GET /purchases - List all purchases.
async fn list_purchases(State(state): State<AppState>) -> Json<Vec<Purchase>> {
    Json(state.ledger.list())
}

// === Router ===

fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/users", post(register_user))
        .route("/users/{id}", get(get_balance))
        .route("/rewards", post(create_reward).get(list_rewards))
        .route("/purchases", post(create_purchase).get(list_purchases))
        .route("/purchases/{id}/approve", post(approve_purchase))
        .route("/purchases/{id}/reject", post(reject_purchase))
        .route("/purchases/{id}/complete", post(complete_purchase))
        .route("/purchases/{id}/cancel", post(cancel_purchase))
        .with_state(state)
}

// === Main ===

#[tokio::main]
async fn main() {
    let catalog = Arc::new(RewardCatalog::new());
    let directory = Arc::new(UserDirectory::new());
    let state = AppState {
        ledger: Arc::new(PurchaseLedger::new(catalog, directory)),
    };

    let app = create_router(state);

    let listener = TcpListener::bind("127.0.0.1:3000").await.unwrap();
    println!("Reward ledger API server running on http://127.0.0.1:3000");
    println!();
    println!("Endpoints:");
    println!("  POST /users                     - Register a user");
    println!("  GET  /users/:id                 - Get a balance");
    println!("  POST /rewards                   - Create a reward");
    println!("  GET  /rewards                   - List rewards");
    println!("  POST /purchases                 - Create a purchase");
    println!("  POST /purchases/:id/approve     - Approve a purchase");
    println!("  POST /purchases/:id/reject      - Reject a purchase");
    println!("  POST /purchases/:id/complete    - Complete a purchase");
    println!("  POST /purchases/:id/cancel      - Cancel a purchase");
    println!("  GET  /purchases                 - List purchases");

    axum::serve(listener, app).await.unwrap();
}
