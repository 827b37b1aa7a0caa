use axum::{
    extract::{Json, Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Router,
};
use serde::Deserialize;
use uuid::Uuid;
use validator::Validate;

use crate::errors::ServiceError;
use crate::handlers::AppState;
use crate::services::receiving::ReceiveLineRequest;

#[derive(Debug, Deserialize, Validate)]
pub struct ReceivePurchaseOrderRequest {
    pub company_id: Uuid,
    /// Destination stock location for every received line.
    pub location_id: Uuid,
    pub user_id: Uuid,
    #[validate(length(min = 1))]
    pub lines: Vec<ReceiveLineRequest>,
}

/// Create the purchase order router
pub fn purchase_order_router() -> Router<AppState> {
    Router::new().route("/:id/receive", post(receive_purchase_order))
}

pub async fn receive_purchase_order(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(payload): Json<ReceivePurchaseOrderRequest>,
) -> Result<impl IntoResponse, ServiceError> {
    payload.validate()?;

    let outcome = state
        .services
        .receiving
        .receive_purchase_order(
            payload.company_id,
            id,
            payload.location_id,
            payload.lines,
            payload.user_id,
        )
        .await?;

    Ok((StatusCode::OK, Json(outcome)))
}
