use axum::extract::{Path, Query, State};
use axum::Json;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::api::ApiResponse;
use crate::errors::AppError;
use crate::models::{Trade, TradeStatus};
use crate::AppState;

const DEFAULT_PAGE_SIZE: i64 = 20;
const MAX_PAGE_SIZE: i64 = 100;

#[derive(Debug, Deserialize)]
pub struct TradeQuery {
    pub page: Option<i64>,
    pub page_size: Option<i64>,
    pub status: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct TradePage {
    pub items: Vec<Trade>,
    pub total: i64,
    pub page: i64,
    pub page_size: i64,
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<TradeQuery>,
) -> Result<Json<ApiResponse<TradePage>>, AppError> {
    let page = query.page.unwrap_or(1);
    if page < 1 {
        return Err(AppError::BadRequest("page must be >= 1".into()));
    }

    let page_size = query.page_size.unwrap_or(DEFAULT_PAGE_SIZE);
    if !(1..=MAX_PAGE_SIZE).contains(&page_size) {
        return Err(AppError::BadRequest(format!(
            "page_size must be between 1 and {MAX_PAGE_SIZE}"
        )));
    }

    let status = query
        .status
        .as_deref()
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<TradeStatus>())
        .transpose()
        .map_err(AppError::BadRequest)?;

    let (items, total) = state.store.list_trades(page, page_size, status).await?;

    Ok(Json(ApiResponse::ok(TradePage {
        items,
        total,
        page,
        page_size,
    })))
}

pub async fn detail(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<Trade>>, AppError> {
    match state.store.get_trade(id).await? {
        Some(trade) => Ok(Json(ApiResponse::ok(trade))),
        None => Err(AppError::NotFound(format!("trade {id}"))),
    }
}
