/// Postgres 저장소
/// 커밋은 단일 트랜잭션에서 version 조건부 UPDATE로 보호된다.
/// 조건이 빗나가면 아무것도 쓰지 않고 Conflict를 돌려준다.
// region:    --- Imports
use super::{CommitOutcome, ItemCommit, ItemSnapshot, ItemStore, StoreError};
use crate::auction::{Auction, AuctionStatus};
use crate::bidding::model::{
    AuctionItem, Bid, BidKind, IncrementSchedule, IncrementTier, ItemStatus, ProxyBid,
};
use crate::database::DatabaseManager;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::FromRow;
use std::sync::Arc;

// endregion: --- Imports

// region:    --- Queries

const SELECT_ITEM: &str = r#"
    SELECT id, auction_id, title, description, starting_price, current_price, reserve_price,
           increment_schedule, current_winner_id, end_time, status, bid_count, version, created_at
    FROM items
    WHERE id = $1
"#;

const SELECT_ACTIVE_PROXIES: &str = r#"
    SELECT id, item_id, bidder_id, max_amount, committed_amount, is_active, created_at
    FROM proxy_bids
    WHERE item_id = $1 AND is_active = true
    ORDER BY created_at
"#;

const SELECT_AUCTION: &str = r#"
    SELECT id, title, status, start_time, end_time,
           anti_snipe_threshold_secs, anti_snipe_extension_secs, created_at
    FROM auctions
    WHERE id = $1
"#;

/// 버전이 일치할 때만 상품 상태를 갱신한다 (CAS)
const UPDATE_ITEM_CAS: &str = r#"
    UPDATE items
    SET current_price = $1, current_winner_id = $2, end_time = $3, bid_count = $4,
        version = version + 1
    WHERE id = $5 AND version = $6
"#;

const REVOKE_WINNING: &str =
    "UPDATE bids SET is_winning = false WHERE item_id = $1 AND is_winning = true";

const INSERT_BID: &str = r#"
    INSERT INTO bids (item_id, bidder_id, amount, kind, bid_time, is_winning)
    VALUES ($1, $2, $3, $4, $5, $6)
"#;

const UPSERT_PROXY_BID: &str = r#"
    INSERT INTO proxy_bids (item_id, bidder_id, max_amount, committed_amount, is_active, created_at)
    VALUES ($1, $2, $3, $4, $5, $6)
    ON CONFLICT (item_id, bidder_id) DO UPDATE
    SET max_amount = EXCLUDED.max_amount,
        committed_amount = EXCLUDED.committed_amount,
        is_active = EXCLUDED.is_active,
        created_at = EXCLUDED.created_at
"#;

/// 경매 마감은 앞으로만 움직인다
const PUSH_AUCTION_END: &str =
    "UPDATE auctions SET end_time = $1 WHERE id = $2 AND end_time < $1";

const SELECT_BID_HISTORY: &str = r#"
    SELECT id, item_id, bidder_id, amount, kind, bid_time, is_winning
    FROM bids
    WHERE item_id = $1 AND ($2::BIGINT IS NULL OR id < $2)
    ORDER BY id DESC
    LIMIT $3
"#;

// endregion: --- Queries

// region:    --- Rows

/// 영속 계층 row. 경계에서 검증을 거쳐 도메인 모델로 변환된다.
#[derive(FromRow)]
pub(crate) struct ItemRow {
    pub id: i64,
    pub auction_id: i64,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub current_price: i64,
    pub reserve_price: Option<i64>,
    pub increment_schedule: serde_json::Value,
    pub current_winner_id: Option<i64>,
    pub end_time: DateTime<Utc>,
    pub status: String,
    pub bid_count: i64,
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl ItemRow {
    fn into_domain(self) -> Result<(AuctionItem, i64), StoreError> {
        let status = ItemStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Unavailable(format!("잘못된 상품 상태: {}", self.status)))?;
        let tiers: Vec<IncrementTier> = serde_json::from_value(self.increment_schedule)
            .map_err(|e| StoreError::Unavailable(format!("잘못된 입찰 단위 테이블: {e}")))?;
        let increment_schedule = IncrementSchedule::new(tiers)
            .map_err(|e| StoreError::Unavailable(e.to_string()))?;
        Ok((
            AuctionItem {
                id: self.id,
                auction_id: self.auction_id,
                title: self.title,
                description: self.description,
                starting_price: self.starting_price,
                current_price: self.current_price,
                reserve_price: self.reserve_price,
                increment_schedule,
                current_winner_id: self.current_winner_id,
                end_time: self.end_time,
                status,
                bid_count: self.bid_count,
                created_at: self.created_at,
            },
            self.version,
        ))
    }
}

#[derive(FromRow)]
pub(crate) struct ProxyBidRow {
    pub id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub max_amount: i64,
    pub committed_amount: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

impl ProxyBidRow {
    fn into_domain(self) -> ProxyBid {
        ProxyBid {
            id: self.id,
            item_id: self.item_id,
            bidder_id: self.bidder_id,
            max_amount: self.max_amount,
            committed_amount: self.committed_amount,
            is_active: self.is_active,
            created_at: self.created_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct AuctionRow {
    pub id: i64,
    pub title: String,
    pub status: String,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub anti_snipe_threshold_secs: i64,
    pub anti_snipe_extension_secs: i64,
    pub created_at: DateTime<Utc>,
}

impl AuctionRow {
    fn into_domain(self) -> Result<Auction, StoreError> {
        let status = AuctionStatus::parse(&self.status)
            .ok_or_else(|| StoreError::Unavailable(format!("잘못된 경매 상태: {}", self.status)))?;
        Ok(Auction {
            id: self.id,
            title: self.title,
            status,
            start_time: self.start_time,
            end_time: self.end_time,
            anti_snipe_threshold_secs: self.anti_snipe_threshold_secs,
            anti_snipe_extension_secs: self.anti_snipe_extension_secs,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
pub(crate) struct BidRow {
    pub id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub kind: String,
    pub bid_time: DateTime<Utc>,
    pub is_winning: bool,
}

impl BidRow {
    fn into_domain(self) -> Result<Bid, StoreError> {
        let kind = BidKind::parse(&self.kind)
            .ok_or_else(|| StoreError::Unavailable(format!("잘못된 입찰 종류: {}", self.kind)))?;
        Ok(Bid {
            id: self.id,
            item_id: self.item_id,
            bidder_id: self.bidder_id,
            amount: self.amount,
            kind,
            bid_time: self.bid_time,
            is_winning: self.is_winning,
        })
    }
}

// endregion: --- Rows

// region:    --- Postgres Item Store

pub struct PostgresItemStore {
    db: Arc<DatabaseManager>,
}

impl PostgresItemStore {
    pub fn new(db: Arc<DatabaseManager>) -> Self {
        Self { db }
    }
}

fn unavailable(e: sqlx::Error) -> StoreError {
    StoreError::Unavailable(e.to_string())
}

#[async_trait]
impl ItemStore for PostgresItemStore {
    async fn load_item(&self, item_id: i64) -> Result<ItemSnapshot, StoreError> {
        let (item_row, proxy_rows) = self
            .db
            .transaction(move |tx| {
                Box::pin(async move {
                    let item = sqlx::query_as::<_, ItemRow>(SELECT_ITEM)
                        .bind(item_id)
                        .fetch_optional(&mut **tx)
                        .await?;
                    let proxies = sqlx::query_as::<_, ProxyBidRow>(SELECT_ACTIVE_PROXIES)
                        .bind(item_id)
                        .fetch_all(&mut **tx)
                        .await?;
                    Ok::<_, sqlx::Error>((item, proxies))
                })
            })
            .await
            .map_err(unavailable)?;

        let (item, version) = item_row.ok_or(StoreError::NotFound)?.into_domain()?;
        Ok(ItemSnapshot {
            item,
            active_proxies: proxy_rows.into_iter().map(ProxyBidRow::into_domain).collect(),
            version,
        })
    }

    async fn load_auction(&self, auction_id: i64) -> Result<Auction, StoreError> {
        let row = sqlx::query_as::<_, AuctionRow>(SELECT_AUCTION)
            .bind(auction_id)
            .fetch_optional(self.db.pool())
            .await
            .map_err(unavailable)?;
        row.ok_or(StoreError::NotFound)?.into_domain()
    }

    async fn commit(
        &self,
        item_id: i64,
        expected_version: i64,
        commit: ItemCommit,
    ) -> Result<CommitOutcome, StoreError> {
        self.db
            .transaction(move |tx| {
                Box::pin(async move {
                    let updated = sqlx::query(UPDATE_ITEM_CAS)
                        .bind(commit.new_price)
                        .bind(commit.winner_id)
                        .bind(commit.end_time)
                        .bind(commit.bid_count)
                        .bind(item_id)
                        .bind(expected_version)
                        .execute(&mut **tx)
                        .await?;
                    if updated.rows_affected() == 0 {
                        // 다른 입찰이 먼저 커밋됨: 아무것도 쓰지 않고 충돌 보고
                        return Ok(CommitOutcome::Conflict);
                    }

                    if commit.revoke_winning {
                        sqlx::query(REVOKE_WINNING)
                            .bind(item_id)
                            .execute(&mut **tx)
                            .await?;
                    }

                    for bid in &commit.bids {
                        sqlx::query(INSERT_BID)
                            .bind(item_id)
                            .bind(bid.bidder_id)
                            .bind(bid.amount)
                            .bind(bid.kind.as_str())
                            .bind(bid.bid_time)
                            .bind(bid.is_winning)
                            .execute(&mut **tx)
                            .await?;
                    }

                    for update in &commit.proxy_updates {
                        sqlx::query(UPSERT_PROXY_BID)
                            .bind(item_id)
                            .bind(update.bidder_id)
                            .bind(update.max_amount)
                            .bind(update.committed_amount)
                            .bind(update.is_active)
                            .bind(update.registered_at)
                            .execute(&mut **tx)
                            .await?;
                    }

                    if let Some((auction_id, new_end)) = commit.push_auction_end {
                        sqlx::query(PUSH_AUCTION_END)
                            .bind(new_end)
                            .bind(auction_id)
                            .execute(&mut **tx)
                            .await?;
                    }

                    Ok::<_, sqlx::Error>(CommitOutcome::Committed)
                })
            })
            .await
            .map_err(unavailable)
    }

    async fn bid_history(
        &self,
        item_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Bid>, StoreError> {
        let rows = sqlx::query_as::<_, BidRow>(SELECT_BID_HISTORY)
            .bind(item_id)
            .bind(cursor)
            .bind(limit)
            .fetch_all(self.db.pool())
            .await
            .map_err(unavailable)?;
        rows.into_iter().map(BidRow::into_domain).collect()
    }
}

// endregion: --- Postgres Item Store
