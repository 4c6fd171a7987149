/// 커밋 이후 외부로 발행되는 타입드 이벤트
/// 전달/팬아웃은 외부 협력자의 책임이며 엔진의 정합성과는 분리된다.
// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

// endregion: --- Imports

// region:    --- Auction Event

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub enum AuctionEvent {
    // 입찰 수락 이벤트
    BidAccepted {
        item_id: i64,
        bidder_id: i64,
        amount: i64,
        new_price: i64,
        winner_id: i64,
        bid_count: i64,
        timestamp: DateTime<Utc>,
    },
    // 자동 입찰 상한 설정 이벤트
    ProxyBidSet {
        item_id: i64,
        bidder_id: i64,
        max_amount: i64,
        timestamp: DateTime<Utc>,
    },
    // 최고 입찰자 교체 이벤트
    Outbid {
        item_id: i64,
        previous_winner_id: i64,
        new_price: i64,
        timestamp: DateTime<Utc>,
    },
    // 스나이핑 방지 연장 이벤트
    AuctionExtended {
        item_id: i64,
        auction_id: i64,
        new_end_time: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    },
    // 낙찰 이벤트
    ItemSold {
        item_id: i64,
        winner_id: i64,
        final_price: i64,
        timestamp: DateTime<Utc>,
    },
    // 유찰 이벤트
    ItemUnsold {
        item_id: i64,
        timestamp: DateTime<Utc>,
    },
}

impl AuctionEvent {
    /// 파티셔닝 키로 쓰이는 상품 id
    pub fn item_id(&self) -> i64 {
        match self {
            AuctionEvent::BidAccepted { item_id, .. }
            | AuctionEvent::ProxyBidSet { item_id, .. }
            | AuctionEvent::Outbid { item_id, .. }
            | AuctionEvent::AuctionExtended { item_id, .. }
            | AuctionEvent::ItemSold { item_id, .. }
            | AuctionEvent::ItemUnsold { item_id, .. } => *item_id,
        }
    }
}

// endregion: --- Auction Event

// region:    --- Event Publisher

/// 이벤트 발행 트레이트. 커밋 이후에만 호출된다.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String>;
}

/// 테스트용 인메모리 발행자
#[derive(Default)]
pub struct InMemoryEventPublisher(Mutex<Vec<AuctionEvent>>);

impl InMemoryEventPublisher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn published(&self) -> Vec<AuctionEvent> {
        self.0.lock().expect("lock").clone()
    }
}

#[async_trait]
impl EventPublisher for InMemoryEventPublisher {
    async fn publish(&self, event: &AuctionEvent) -> Result<(), String> {
        self.0.lock().expect("lock").push(event.clone());
        Ok(())
    }
}

// endregion: --- Event Publisher
