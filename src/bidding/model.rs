/// 입찰 도메인 모델
/// 영속 계층(row)과 분리된 고정 타입 모델로, 저장소 경계에서 검증 후 생성된다.
// region:    --- Imports
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

// endregion: --- Imports

// region:    --- Item Status

/// 상품 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ItemStatus {
    Active,
    Sold,
    Unsold,
}

impl ItemStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ItemStatus::Active => "ACTIVE",
            ItemStatus::Sold => "SOLD",
            ItemStatus::Unsold => "UNSOLD",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "ACTIVE" => Some(ItemStatus::Active),
            "SOLD" => Some(ItemStatus::Sold),
            "UNSOLD" => Some(ItemStatus::Unsold),
            _ => None,
        }
    }

    /// 종료 상태 여부
    pub fn is_terminal(&self) -> bool {
        !matches!(self, ItemStatus::Active)
    }
}

// endregion: --- Item Status

// region:    --- Increment Schedule

/// 입찰 단위 구간 (threshold 이상 가격 구간에 increment 적용)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct IncrementTier {
    pub threshold: i64,
    pub increment: i64,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("잘못된 입찰 단위 테이블: {0}")]
pub struct InvalidIncrementSchedule(pub String);

/// 입찰 단위 테이블: 가격 구간 -> 최소 증가액 (공식이 아닌 테이블 조회)
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct IncrementSchedule(Vec<IncrementTier>);

impl IncrementSchedule {
    /// 검증 후 생성: 첫 구간은 0부터, 구간은 오름차순, 증가액은 양수
    pub fn new(tiers: Vec<IncrementTier>) -> Result<Self, InvalidIncrementSchedule> {
        if tiers.is_empty() {
            return Err(InvalidIncrementSchedule("빈 테이블".into()));
        }
        if tiers[0].threshold != 0 {
            return Err(InvalidIncrementSchedule(
                "첫 구간의 threshold는 0이어야 합니다".into(),
            ));
        }
        for pair in tiers.windows(2) {
            if pair[0].threshold >= pair[1].threshold {
                return Err(InvalidIncrementSchedule(
                    "구간은 오름차순이어야 합니다".into(),
                ));
            }
        }
        if tiers.iter().any(|t| t.increment <= 0) {
            return Err(InvalidIncrementSchedule("증가액은 양수여야 합니다".into()));
        }
        Ok(Self(tiers))
    }

    /// 가격 이하의 가장 큰 threshold 구간의 증가액 반환
    pub fn increment_for(&self, price: i64) -> i64 {
        self.0
            .iter()
            .rev()
            .find(|t| t.threshold <= price)
            .map(|t| t.increment)
            .unwrap_or_else(|| self.0[0].increment)
    }

}

impl Default for IncrementSchedule {
    fn default() -> Self {
        Self(vec![
            IncrementTier { threshold: 0, increment: 1 },
            IncrementTier { threshold: 100, increment: 5 },
            IncrementTier { threshold: 500, increment: 10 },
            IncrementTier { threshold: 1000, increment: 25 },
        ])
    }
}

// endregion: --- Increment Schedule

// region:    --- Auction Item

/// 경매 상품
#[derive(Debug, Clone, Serialize)]
pub struct AuctionItem {
    pub id: i64,
    pub auction_id: i64,
    pub title: String,
    pub description: String,
    pub starting_price: i64,
    pub current_price: i64,
    /// 최저 낙찰가 (미달 시 유찰)
    pub reserve_price: Option<i64>,
    pub increment_schedule: IncrementSchedule,
    pub current_winner_id: Option<i64>,
    pub end_time: DateTime<Utc>,
    pub status: ItemStatus,
    pub bid_count: i64,
    pub created_at: DateTime<Utc>,
}

impl AuctionItem {
    /// 최소 입찰가 = 현재 가격 + 현재 가격 구간의 입찰 단위
    pub fn minimum_acceptable(&self) -> i64 {
        self.current_price + self.increment_schedule.increment_for(self.current_price)
    }

    /// 종료 시점의 결과 상태
    pub fn close_outcome(&self) -> ItemStatus {
        close_outcome(self.current_winner_id, self.current_price, self.reserve_price)
    }
}

/// 낙찰자가 있고 최저 낙찰가를 충족하면 SOLD, 아니면 UNSOLD
pub fn close_outcome(
    winner_id: Option<i64>,
    current_price: i64,
    reserve_price: Option<i64>,
) -> ItemStatus {
    match winner_id {
        Some(_) if reserve_price.map_or(true, |r| current_price >= r) => ItemStatus::Sold,
        _ => ItemStatus::Unsold,
    }
}

// endregion: --- Auction Item

// region:    --- Bid

/// 입찰 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BidKind {
    /// 사용자가 직접 제출한 입찰
    Manual,
    /// 자동 입찰 경쟁으로 시스템이 생성한 입찰
    Proxy,
}

impl BidKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BidKind::Manual => "MANUAL",
            BidKind::Proxy => "PROXY",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "MANUAL" => Some(BidKind::Manual),
            "PROXY" => Some(BidKind::Proxy),
            _ => None,
        }
    }
}

/// 입찰 기록 (append-only 원장, is_winning만 번복 가능)
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Bid {
    pub id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub amount: i64,
    pub kind: BidKind,
    pub bid_time: DateTime<Utc>,
    pub is_winning: bool,
}

/// 커밋 대기 중인 신규 입찰 기록
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewBid {
    pub bidder_id: i64,
    pub amount: i64,
    pub kind: BidKind,
    pub bid_time: DateTime<Utc>,
    pub is_winning: bool,
}

// endregion: --- Bid

// region:    --- Proxy Bid

/// 자동 입찰: (상품, 입찰자)당 활성 레코드는 최대 1개
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyBid {
    pub id: i64,
    pub item_id: i64,
    pub bidder_id: i64,
    pub max_amount: i64,
    /// 현재 투입된 금액 (항상 max_amount 이하)
    pub committed_amount: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// 커밋 대기 중인 자동 입찰 upsert: (상품, 입찰자) 기준으로 생성/교체된다
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProxyBidUpdate {
    pub bidder_id: i64,
    pub max_amount: i64,
    pub committed_amount: i64,
    pub is_active: bool,
    /// 동률 판정에 쓰이는 등록 시각. 교체 시 갱신되어 기득권을 잃는다.
    pub registered_at: DateTime<Utc>,
}

// endregion: --- Proxy Bid

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn schedule() -> IncrementSchedule {
        IncrementSchedule::default()
    }

    #[test]
    fn increment_lookup_uses_largest_threshold_at_or_below_price() {
        let s = schedule();
        assert_eq!(s.increment_for(0), 1);
        assert_eq!(s.increment_for(99), 1);
        assert_eq!(s.increment_for(100), 5);
        assert_eq!(s.increment_for(650), 10);
        assert_eq!(s.increment_for(1000), 25);
        assert_eq!(s.increment_for(50_000), 25);
    }

    #[test]
    fn schedule_rejects_missing_zero_tier_and_unordered_tiers() {
        assert!(IncrementSchedule::new(vec![]).is_err());
        assert!(IncrementSchedule::new(vec![IncrementTier {
            threshold: 10,
            increment: 1
        }])
        .is_err());
        assert!(IncrementSchedule::new(vec![
            IncrementTier { threshold: 0, increment: 1 },
            IncrementTier { threshold: 0, increment: 5 },
        ])
        .is_err());
        assert!(IncrementSchedule::new(vec![IncrementTier {
            threshold: 0,
            increment: 0
        }])
        .is_err());
    }

    fn item(winner: Option<i64>, price: i64, reserve: Option<i64>) -> AuctionItem {
        AuctionItem {
            id: 1,
            auction_id: 1,
            title: "테스트 상품".into(),
            description: String::new(),
            starting_price: 100,
            current_price: price,
            reserve_price: reserve,
            increment_schedule: schedule(),
            current_winner_id: winner,
            end_time: Utc.with_ymd_and_hms(2025, 1, 1, 12, 0, 0).unwrap(),
            status: ItemStatus::Active,
            bid_count: 0,
            created_at: Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap(),
        }
    }

    #[test]
    fn close_outcome_requires_winner_and_reserve() {
        assert_eq!(item(None, 100, None).close_outcome(), ItemStatus::Unsold);
        assert_eq!(item(Some(7), 200, None).close_outcome(), ItemStatus::Sold);
        assert_eq!(
            item(Some(7), 200, Some(300)).close_outcome(),
            ItemStatus::Unsold
        );
        assert_eq!(
            item(Some(7), 300, Some(300)).close_outcome(),
            ItemStatus::Sold
        );
    }

    #[test]
    fn minimum_acceptable_follows_schedule() {
        assert_eq!(item(None, 100, None).minimum_acceptable(), 105);
        assert_eq!(item(None, 650, None).minimum_acceptable(), 660);
    }
}

// endregion: --- Tests
