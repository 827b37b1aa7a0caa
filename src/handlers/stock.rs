use axum::{
    extract::{Json, Query, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Router,
};
use rust_decimal::Decimal;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;
use validator::Validate;

use crate::entities::stock_transaction::TransactionKind;
use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::stock_ledger::{AdjustOptions, TransactionFilter};

#[derive(Debug, Deserialize, Validate)]
pub struct AdjustStockRequest {
    pub company_id: Uuid,
    pub part_id: Uuid,
    pub location_id: Uuid,
    /// receipt | issue | adjustment | return
    pub kind: String,
    /// Positive for receipt/issue/return; signed net delta for adjustment.
    pub quantity: i32,
    pub unit_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub reference: Option<String>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct TransferStockRequest {
    pub company_id: Uuid,
    pub part_id: Uuid,
    pub from_location_id: Uuid,
    pub to_location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub unit_cost: Option<Decimal>,
    pub reason: Option<String>,
    pub notes: Option<String>,
    pub reference: Option<String>,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ReserveStockRequest {
    pub company_id: Uuid,
    pub part_id: Uuid,
    pub location_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub reference: Option<String>,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CountStockRequest {
    pub company_id: Uuid,
    pub part_id: Uuid,
    pub location_id: Uuid,
    #[validate(range(min = 0))]
    pub counted_quantity: i32,
    pub notes: Option<String>,
    pub user_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub struct StockFilters {
    pub company_id: Uuid,
    pub part_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

#[derive(Debug, Deserialize)]
pub struct TransactionFilters {
    pub company_id: Uuid,
    pub part_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
    pub reference_type: Option<String>,
    pub reference_id: Option<Uuid>,
}

/// Create the stock router
pub fn stock_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_stock))
        .route("/adjustments", post(adjust_stock))
        .route("/transfers", post(transfer_stock))
        .route("/reservations", post(reserve_stock))
        .route("/releases", post(release_stock))
        .route("/counts", post(count_stock))
        .route("/transactions", get(list_transactions))
}

pub async fn adjust_stock(
    State(state): State<AppState>,
    Json(payload): Json<AdjustStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;
    let kind = TransactionKind::from_str(&payload.kind)
        .ok_or_else(|| ServiceError::InvalidTransactionType(payload.kind.clone()))?;

    let transaction = state
        .services
        .stock_ledger
        .adjust(
            payload.company_id,
            payload.part_id,
            payload.location_id,
            payload.quantity,
            kind,
            AdjustOptions {
                unit_cost: payload.unit_cost,
                reason: payload.reason,
                notes: payload.notes,
                reference: payload.reference,
                reference_type: payload.reference_type,
                reference_id: payload.reference_id,
                related_id: None,
                user_id: payload.user_id,
            },
        )
        .await?;

    Ok((StatusCode::CREATED, Json(transaction)))
}

pub async fn transfer_stock(
    State(state): State<AppState>,
    Json(payload): Json<TransferStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let (transfer_out, transfer_in) = state
        .services
        .stock_ledger
        .transfer(
            payload.company_id,
            payload.part_id,
            payload.from_location_id,
            payload.to_location_id,
            payload.quantity,
            AdjustOptions {
                unit_cost: payload.unit_cost,
                reason: payload.reason,
                notes: payload.notes,
                reference: payload.reference,
                user_id: payload.user_id,
                ..Default::default()
            },
        )
        .await?;

    let response = json!({
        "transfer_out": transfer_out,
        "transfer_in": transfer_in,
    });
    Ok((StatusCode::CREATED, Json(response)))
}

pub async fn reserve_stock(
    State(state): State<AppState>,
    Json(payload): Json<ReserveStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let stock = state
        .services
        .stock_ledger
        .reserve(
            payload.company_id,
            payload.part_id,
            payload.location_id,
            payload.quantity,
            AdjustOptions {
                reference: payload.reference,
                user_id: payload.user_id,
                ..Default::default()
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(stock)))
}

pub async fn release_stock(
    State(state): State<AppState>,
    Json(payload): Json<ReserveStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let stock = state
        .services
        .stock_ledger
        .release(
            payload.company_id,
            payload.part_id,
            payload.location_id,
            payload.quantity,
            AdjustOptions {
                reference: payload.reference,
                user_id: payload.user_id,
                ..Default::default()
            },
        )
        .await?;

    Ok((StatusCode::OK, Json(stock)))
}

pub async fn count_stock(
    State(state): State<AppState>,
    Json(payload): Json<CountStockRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let result = state
        .services
        .stock_ledger
        .count(
            payload.company_id,
            payload.part_id,
            payload.location_id,
            payload.counted_quantity,
            AdjustOptions {
                notes: payload.notes,
                user_id: payload.user_id,
                ..Default::default()
            },
        )
        .await?;

    let response = json!({
        "stock": result.stock,
        "adjustment": result.adjustment,
    });
    Ok((StatusCode::OK, Json(response)))
}

pub async fn list_stock(
    State(state): State<AppState>,
    Query(filters): Query<StockFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let records = state
        .services
        .stock_ledger
        .list_stock(filters.company_id, filters.part_id, filters.location_id)
        .await?;

    let response = json!({
        "total": records.len(),
        "stock": records,
    });
    Ok((StatusCode::OK, Json(response)))
}

pub async fn list_transactions(
    State(state): State<AppState>,
    Query(filters): Query<TransactionFilters>,
) -> Result<impl IntoResponse, ServiceError> {
    let transactions = state
        .services
        .stock_ledger
        .list_transactions(
            filters.company_id,
            TransactionFilter {
                part_id: filters.part_id,
                location_id: filters.location_id,
                reference_type: filters.reference_type,
                reference_id: filters.reference_id,
            },
        )
        .await?;

    let response = json!({
        "total": transactions.len(),
        "transactions": transactions,
    });
    Ok((StatusCode::OK, Json(response)))
}
