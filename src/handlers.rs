/// HTTP 핸들러
/// 쓰기는 입찰 엔진으로, 읽기는 query 모듈로 위임한다.
// region:    --- Imports
use crate::bidding::error::BidError;
use crate::database::DatabaseManager;
use crate::engine::{BidEngine, BidOutcome};
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

// endregion: --- Imports

pub type AppState = (Arc<BidEngine>, Arc<DatabaseManager>);

// region:    --- Commands

/// 입찰 요청
#[derive(Debug, Deserialize)]
pub struct PlaceBidCommand {
    pub item_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    /// 함께 설정할 자동 입찰 상한
    pub proxy_max: Option<i64>,
}

/// 자동 입찰 상한 설정 요청
#[derive(Debug, Deserialize)]
pub struct SetProxyBidCommand {
    pub item_id: i64,
    pub bidder_id: i64,
    pub max_amount: i64,
}

#[derive(Debug, Deserialize)]
pub struct BidHistoryParams {
    pub cursor: Option<i64>,
    pub limit: Option<i64>,
}

// endregion: --- Commands

// region:    --- Responses

/// 입찰 실패 분류 -> HTTP 상태 코드
fn error_response(e: &BidError) -> Response {
    let status = match e {
        BidError::AuctionNotOpen
        | BidError::ItemClosed
        | BidError::BidTooLow { .. }
        | BidError::SelfOutbid
        | BidError::InvalidProxyCeiling { .. } => StatusCode::BAD_REQUEST,
        BidError::UnknownItem(_) | BidError::UnknownAuction(_) => StatusCode::NOT_FOUND,
        BidError::Busy => StatusCode::CONFLICT,
        BidError::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
    };
    let mut body = serde_json::json!({
        "error": e.to_string(),
        "code": e.code(),
    });
    // 재입찰에 필요한 최소 입찰가를 함께 알려준다
    if let BidError::BidTooLow { minimum } = e {
        body["minimum_bid"] = serde_json::json!(minimum);
    }
    (status, Json(body)).into_response()
}

fn outcome_response(message: &str, outcome: &BidOutcome) -> Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "message": message,
            "item_id": outcome.item_id,
            "current_price": outcome.new_price,
            "winner_id": outcome.winner_id,
            "is_winning": outcome.is_winning,
            "end_time": outcome.end_time,
            "extended": outcome.extended,
            "bid_count": outcome.bid_count,
        })),
    )
        .into_response()
}

fn internal_error(e: sqlx::Error) -> Response {
    error!("{:<12} --> 조회 실패: {:?}", "Query", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(serde_json::json!({
            "error": "조회에 실패했습니다",
            "code": "QUERY_FAILED"
        })),
    )
        .into_response()
}

fn not_found(what: &str) -> Response {
    (
        StatusCode::NOT_FOUND,
        Json(serde_json::json!({
            "error": format!("존재하지 않는 {what}입니다"),
            "code": "NOT_FOUND"
        })),
    )
        .into_response()
}

// endregion: --- Responses

// region:    --- Command Handlers

/// 입찰 요청 처리
pub async fn handle_bid(
    State((engine, _db_manager)): State<AppState>,
    Json(cmd): Json<PlaceBidCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 입찰 요청 처리 시작: {:?}", "Command", cmd);

    match engine
        .place_bid(cmd.item_id, cmd.bidder_id, cmd.amount, cmd.proxy_max)
        .await
    {
        Ok(outcome) => outcome_response("입찰이 성공적으로 처리되었습니다.", &outcome),
        Err(e) => error_response(&e),
    }
}

/// 자동 입찰 상한 설정 처리
pub async fn handle_proxy_bid(
    State((engine, _db_manager)): State<AppState>,
    Json(cmd): Json<SetProxyBidCommand>,
) -> impl IntoResponse {
    info!("{:<12} --> 자동 입찰 설정 시작: {:?}", "Command", cmd);

    match engine
        .set_proxy_bid(cmd.item_id, cmd.bidder_id, cmd.max_amount)
        .await
    {
        Ok(outcome) => outcome_response("자동 입찰 상한이 설정되었습니다.", &outcome),
        Err(e) => error_response(&e),
    }
}

/// 경매 수동 개시 처리
pub async fn handle_open_auction(
    State((_engine, db_manager)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    info!("{:<12} --> 경매 개시 요청 id: {}", "Command", auction_id);

    match crate::query::handlers::get_auction(&db_manager, auction_id).await {
        Ok(None) => return not_found("경매"),
        Err(e) => return internal_error(e),
        Ok(Some(_)) => {}
    }
    match crate::query::handlers::open_auction(&db_manager, auction_id).await {
        Ok(true) => (
            StatusCode::OK,
            Json(serde_json::json!({ "message": "경매가 개시되었습니다." })),
        )
            .into_response(),
        Ok(false) => (
            StatusCode::BAD_REQUEST,
            Json(serde_json::json!({
                "error": "대기 중인 경매만 개시할 수 있습니다",
                "code": "NOT_SCHEDULED"
            })),
        )
            .into_response(),
        Err(e) => internal_error(e),
    }
}

// endregion: --- Command Handlers

// region:    --- Query Handlers

/// 모든 상품 조회 처리
pub async fn handle_get_items(State((_engine, db_manager)): State<AppState>) -> impl IntoResponse {
    match crate::query::handlers::get_all_items(&db_manager).await {
        Ok(items) => (StatusCode::OK, Json(items)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 상품 조회 처리
pub async fn handle_get_item(
    State((_engine, db_manager)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    match crate::query::handlers::get_item(&db_manager, item_id).await {
        Ok(Some(item)) => (StatusCode::OK, Json(item)).into_response(),
        Ok(None) => not_found("상품"),
        Err(e) => internal_error(e),
    }
}

/// 입찰 이력 조회 처리
pub async fn handle_get_item_bids(
    State((_engine, db_manager)): State<AppState>,
    Path(item_id): Path<i64>,
    Query(params): Query<BidHistoryParams>,
) -> impl IntoResponse {
    // 페이지 크기: 기본 50, 최대 100
    let limit = params.limit.unwrap_or(50).clamp(1, 100);
    match crate::query::handlers::get_item_bids(&db_manager, item_id, params.cursor, limit).await {
        Ok(bids) => {
            let next_cursor = (bids.len() as i64 == limit).then(|| bids.last().map(|b| b.id));
            (
                StatusCode::OK,
                Json(serde_json::json!({
                    "bids": bids,
                    "next_cursor": next_cursor.flatten(),
                })),
            )
                .into_response()
        }
        Err(e) => internal_error(e),
    }
}

/// 자동 입찰 조회 처리
pub async fn handle_get_item_proxy_bids(
    State((_engine, db_manager)): State<AppState>,
    Path(item_id): Path<i64>,
) -> impl IntoResponse {
    match crate::query::handlers::get_item_proxy_bids(&db_manager, item_id).await {
        Ok(proxy_bids) => (StatusCode::OK, Json(proxy_bids)).into_response(),
        Err(e) => internal_error(e),
    }
}

/// 경매 조회 처리
pub async fn handle_get_auction(
    State((_engine, db_manager)): State<AppState>,
    Path(auction_id): Path<i64>,
) -> impl IntoResponse {
    match crate::query::handlers::get_auction(&db_manager, auction_id).await {
        Ok(Some(auction)) => (StatusCode::OK, Json(auction)).into_response(),
        Ok(None) => not_found("경매"),
        Err(e) => internal_error(e),
    }
}

// endregion: --- Query Handlers
