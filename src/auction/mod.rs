/// 경매 모델과 상태 기계
/// 경매 상태는 시계 비교와 관리자 명령으로만 전이한다. 상품 단위 입찰 상태는
/// 소유하지 않는다. 다만 상품 마감 연장이 경매 마감을 함께 밀 수 있다.
pub mod events;

// region:    --- Imports
use crate::bidding::anti_snipe::AntiSnipePolicy;
use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

// endregion: --- Imports

// region:    --- Auction Status

/// 경매 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AuctionStatus {
    Scheduled,
    Live,
    Ended,
}

impl AuctionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuctionStatus::Scheduled => "SCHEDULED",
            AuctionStatus::Live => "LIVE",
            AuctionStatus::Ended => "ENDED",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "SCHEDULED" => Some(AuctionStatus::Scheduled),
            "LIVE" => Some(AuctionStatus::Live),
            "ENDED" => Some(AuctionStatus::Ended),
            _ => None,
        }
    }
}

/// 시계 기준 다음 상태.
/// SCHEDULED -> LIVE: 시작 시각 도달. LIVE -> ENDED: 마감 도달 + 모든 상품 종결.
/// ENDED는 최종 상태다.
pub fn next_status(
    current: AuctionStatus,
    start_time: DateTime<Utc>,
    end_time: DateTime<Utc>,
    now: DateTime<Utc>,
    all_items_terminal: bool,
) -> AuctionStatus {
    match current {
        AuctionStatus::Scheduled if now >= start_time => AuctionStatus::Live,
        AuctionStatus::Live if now >= end_time && all_items_terminal => AuctionStatus::Ended,
        other => other,
    }
}

// endregion: --- Auction Status

// region:    --- Auction

/// 경매
#[derive(Debug, Clone, Serialize)]
pub struct Auction {
    pub id: i64,
    pub title: String,
    pub status: AuctionStatus,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub anti_snipe_threshold_secs: i64,
    pub anti_snipe_extension_secs: i64,
    pub created_at: DateTime<Utc>,
}

impl Auction {
    /// 입찰 가능 창: LIVE이고 now ∈ [start_time, end_time)
    pub fn is_open(&self, now: DateTime<Utc>) -> bool {
        self.status == AuctionStatus::Live && now >= self.start_time && now < self.end_time
    }

    pub fn anti_snipe_policy(&self) -> AntiSnipePolicy {
        AntiSnipePolicy {
            threshold: Duration::seconds(self.anti_snipe_threshold_secs),
            extension: Duration::seconds(self.anti_snipe_extension_secs),
        }
    }
}

// endregion: --- Auction

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn t(min: i64) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap() + Duration::minutes(min)
    }

    #[test]
    fn scheduled_goes_live_at_start_time() {
        assert_eq!(
            next_status(AuctionStatus::Scheduled, t(0), t(60), t(-1), true),
            AuctionStatus::Scheduled
        );
        assert_eq!(
            next_status(AuctionStatus::Scheduled, t(0), t(60), t(0), true),
            AuctionStatus::Live
        );
    }

    #[test]
    fn live_ends_only_when_all_items_are_terminal() {
        assert_eq!(
            next_status(AuctionStatus::Live, t(0), t(60), t(61), false),
            AuctionStatus::Live
        );
        assert_eq!(
            next_status(AuctionStatus::Live, t(0), t(60), t(61), true),
            AuctionStatus::Ended
        );
    }

    #[test]
    fn ended_is_terminal() {
        assert_eq!(
            next_status(AuctionStatus::Ended, t(0), t(60), t(0), false),
            AuctionStatus::Ended
        );
    }

    #[test]
    fn open_window_is_half_open() {
        let auction = Auction {
            id: 1,
            title: "테스트".into(),
            status: AuctionStatus::Live,
            start_time: t(0),
            end_time: t(60),
            anti_snipe_threshold_secs: 60,
            anti_snipe_extension_secs: 120,
            created_at: t(-60),
        };
        assert!(!auction.is_open(t(-1)));
        assert!(auction.is_open(t(0)));
        assert!(auction.is_open(t(59)));
        assert!(!auction.is_open(t(60)));
    }
}

// endregion: --- Tests
