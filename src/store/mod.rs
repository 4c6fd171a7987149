/// 영속 인터페이스
/// 엔진이 소비하는 좁은 계약: 스냅샷 로드, 버전 CAS 커밋, 원장 조회.
/// 커밋은 가격/낙찰자/마감/원장/자동입찰을 하나의 단위로 반영한다.
/// 부분 반영은 어떤 경로로도 관찰될 수 없어야 한다.
pub mod memory;
pub mod postgres;

// region:    --- Imports
use crate::auction::Auction;
use crate::bidding::model::{AuctionItem, Bid, NewBid, ProxyBid, ProxyBidUpdate};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

// endregion: --- Imports

// region:    --- Store Types

/// 상품 스냅샷: 상품 + 활성 자동 입찰 + CAS 버전
#[derive(Debug, Clone)]
pub struct ItemSnapshot {
    pub item: AuctionItem,
    pub active_proxies: Vec<ProxyBid>,
    pub version: i64,
}

/// 한 번의 입찰 수락이 만들어내는 원자적 변경 집합
#[derive(Debug, Clone, PartialEq)]
pub struct ItemCommit {
    pub new_price: i64,
    pub winner_id: Option<i64>,
    pub end_time: DateTime<Utc>,
    /// 커밋 후 누적 입찰 수
    pub bid_count: i64,
    pub bids: Vec<NewBid>,
    pub proxy_updates: Vec<ProxyBidUpdate>,
    /// 새 낙찰 기록이 생기면 기존 is_winning 표시를 먼저 번복한다
    pub revoke_winning: bool,
    /// 상품 연장이 경매 마감을 넘어서면 경매 마감도 민다 (앞으로만)
    pub push_auction_end: Option<(i64, DateTime<Utc>)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CommitOutcome {
    Committed,
    /// 버전 불일치: 호출자가 새 스냅샷으로 전체 계산을 다시 수행해야 한다
    Conflict,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("레코드를 찾을 수 없습니다")]
    NotFound,
    #[error("저장소 사용 불가: {0}")]
    Unavailable(String),
}

// endregion: --- Store Types

// region:    --- Item Store Trait

#[async_trait]
pub trait ItemStore: Send + Sync {
    /// 상품 스냅샷 조회 (활성 자동 입찰 포함)
    async fn load_item(&self, item_id: i64) -> Result<ItemSnapshot, StoreError>;

    /// 경매 조회
    async fn load_auction(&self, auction_id: i64) -> Result<Auction, StoreError>;

    /// 버전이 일치할 때만 변경 집합 전체를 원자적으로 반영한다
    async fn commit(
        &self,
        item_id: i64,
        expected_version: i64,
        commit: ItemCommit,
    ) -> Result<CommitOutcome, StoreError>;

    /// 입찰 이력: 최신순, cursor(마지막으로 본 입찰 id) 기반 키셋 페이지네이션
    async fn bid_history(
        &self,
        item_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Bid>, StoreError>;
}

// endregion: --- Item Store Trait
