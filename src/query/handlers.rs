/// 조회 핸들러
/// 응답 직렬화용 뷰 구조체로 바로 읽는다. 입찰 단위 테이블은 노출하지 않는다.
// region:    --- Imports
use super::queries;
use crate::database::DatabaseManager;
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::Error as SqlxError;
use sqlx::FromRow;
use tracing::info;

// endregion: --- Imports

// region:    --- Views

#[derive(Debug, Serialize, FromRow)]
pub struct ItemView {
    pub id: i64,
    pub auction_id: i64,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub current_price: i64,
    pub reserve_price: Option<i64>,
    pub current_winner_id: Option<i64>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub bid_count: i64,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct BidView {
    pub id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub kind: String,
    pub bid_time: DateTime<Utc>,
    pub is_winning: bool,
}

#[derive(Debug, Serialize, FromRow)]
pub struct ProxyBidView {
    pub id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub max_amount: i64,
    pub committed_amount: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize, FromRow)]
pub struct AuctionView {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub anti_snipe_threshold_secs: i64,
    pub anti_snipe_extension_secs: i64,
    pub created_at: DateTime<Utc>,
}

// endregion: --- Views

// region:    --- Query Handlers

/// 모든 상품 조회
pub async fn get_all_items(db_manager: &DatabaseManager) -> Result<Vec<ItemView>, SqlxError> {
    info!("{:<12} --> 모든 상품 조회", "Query");
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ItemView>(queries::GET_ALL_ITEMS)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 조회
pub async fn get_item(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Option<ItemView>, SqlxError> {
    info!("{:<12} --> 상품 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(|tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ItemView>(queries::GET_ITEM)
                    .bind(item_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 입찰 이력 조회 (최신순, cursor = 마지막으로 본 입찰 id)
pub async fn get_item_bids(
    db_manager: &DatabaseManager,
    item_id: i64,
    cursor: Option<i64>,
    limit: i64,
) -> Result<Vec<BidView>, SqlxError> {
    info!("{:<12} --> 입찰 이력 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query_as::<_, BidView>(queries::GET_ITEM_BIDS)
                    .bind(item_id)
                    .bind(cursor)
                    .bind(limit)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 상품 자동 입찰 조회
pub async fn get_item_proxy_bids(
    db_manager: &DatabaseManager,
    item_id: i64,
) -> Result<Vec<ProxyBidView>, SqlxError> {
    info!("{:<12} --> 자동 입찰 조회 id: {}", "Query", item_id);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query_as::<_, ProxyBidView>(queries::GET_ITEM_PROXY_BIDS)
                    .bind(item_id)
                    .fetch_all(&mut **tx)
                    .await
            })
        })
        .await
}

/// 경매 조회
pub async fn get_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<Option<AuctionView>, SqlxError> {
    info!("{:<12} --> 경매 조회 id: {}", "Query", auction_id);
    db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query_as::<_, AuctionView>(queries::GET_AUCTION)
                    .bind(auction_id)
                    .fetch_optional(&mut **tx)
                    .await
            })
        })
        .await
}

/// 경매 수동 개시. SCHEDULED 상태였을 때만 true.
pub async fn open_auction(
    db_manager: &DatabaseManager,
    auction_id: i64,
) -> Result<bool, SqlxError> {
    info!("{:<12} --> 경매 개시 id: {}", "Query", auction_id);
    let result = db_manager
        .transaction(move |tx| {
            Box::pin(async move {
                sqlx::query(queries::OPEN_AUCTION)
                    .bind(auction_id)
                    .execute(&mut **tx)
                    .await
            })
        })
        .await?;
    Ok(result.rows_affected() > 0)
}

// endregion: --- Query Handlers
