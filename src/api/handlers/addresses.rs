use axum::extract::State;
use axum::Json;

use crate::api::ApiResponse;
use crate::errors::AppError;
use crate::models::WatchedAddress;
use crate::AppState;

pub async fn list(
    State(state): State<AppState>,
) -> Result<Json<ApiResponse<Vec<WatchedAddress>>>, AppError> {
    let addresses = state.store.list_watched_addresses().await?;
    Ok(Json(ApiResponse::ok(addresses)))
}
