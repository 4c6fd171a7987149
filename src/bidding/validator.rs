/// 입찰 검증기 (순수 함수)
/// 상품/경매 스냅샷과 입찰 단위 테이블에 대해 입찰 시도를 검사한다. 부수효과 없음.
// region:    --- Imports
use crate::auction::Auction;
use crate::bidding::error::BidError;
use crate::bidding::model::{AuctionItem, ProxyBid};
use crate::bidding::BidAttempt;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Validator

/// 입찰 시도 검증. `own_proxy`는 시도자의 기존 활성 자동 입찰.
pub fn validate(
    item: &AuctionItem,
    own_proxy: Option<&ProxyBid>,
    auction: &Auction,
    attempt: &BidAttempt,
    now: DateTime<Utc>,
) -> Result<(), BidError> {
    // 경매 창: status가 LIVE이고 now ∈ [start_time, end_time)
    if !auction.is_open(now) {
        return Err(BidError::AuctionNotOpen);
    }

    // 상품: ACTIVE이고 마감 전 (스케줄러 반영 전이라도 시계 기준으로 마감 처리)
    if item.status.is_terminal() || now >= item.end_time {
        return Err(BidError::ItemClosed);
    }

    // 최소 입찰가: 수동 금액 또는 자동 입찰 상한이 이를 충족해야 한다
    let minimum = item.minimum_acceptable();
    let effective = attempt.amount.unwrap_or_else(|| attempt.ceiling());
    if effective < minimum {
        return Err(BidError::BidTooLow { minimum });
    }

    // 최고 입찰자 본인: 자신의 유효 상한을 초과하는 시도만 허용 (상한 인상)
    if item.current_winner_id == Some(attempt.bidder_id) {
        let own_ceiling = own_proxy
            .filter(|p| p.is_active)
            .map(|p| p.max_amount)
            .unwrap_or(item.current_price);
        if attempt.ceiling() <= own_ceiling {
            return Err(BidError::SelfOutbid);
        }
    }

    // 자동 입찰 상한은 수동 금액 이상이어야 한다
    if let (Some(amount), Some(ceiling)) = (attempt.amount, attempt.proxy_max) {
        if ceiling < amount {
            return Err(BidError::InvalidProxyCeiling { ceiling, amount });
        }
    }

    Ok(())
}

// endregion: --- Validator

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::AuctionStatus;
    use crate::bidding::model::{IncrementSchedule, ItemStatus};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    fn auction(status: AuctionStatus) -> Auction {
        Auction {
            id: 1,
            title: "테스트 경매".into(),
            status,
            start_time: now() - Duration::hours(1),
            end_time: now() + Duration::hours(1),
            anti_snipe_threshold_secs: 60,
            anti_snipe_extension_secs: 120,
            created_at: now() - Duration::days(1),
        }
    }

    fn item(price: i64, winner: Option<i64>) -> AuctionItem {
        AuctionItem {
            id: 10,
            auction_id: 1,
            title: "테스트 상품".into(),
            description: String::new(),
            starting_price: 100,
            current_price: price,
            reserve_price: None,
            increment_schedule: IncrementSchedule::default(),
            current_winner_id: winner,
            end_time: now() + Duration::minutes(30),
            status: ItemStatus::Active,
            bid_count: 0,
            created_at: now() - Duration::days(1),
        }
    }

    #[test]
    fn rejects_when_auction_is_not_live() {
        let err = validate(
            &item(100, None),
            None,
            &auction(AuctionStatus::Scheduled),
            &BidAttempt::manual(1, 200),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, BidError::AuctionNotOpen);
    }

    #[test]
    fn rejects_outside_auction_window() {
        let mut a = auction(AuctionStatus::Live);
        a.start_time = now() + Duration::minutes(5);
        let err = validate(
            &item(100, None),
            None,
            &a,
            &BidAttempt::manual(1, 200),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, BidError::AuctionNotOpen);
    }

    #[test]
    fn rejects_closed_item_even_before_sweep() {
        let mut it = item(100, None);
        it.end_time = now() - Duration::seconds(1);
        let err = validate(
            &it,
            None,
            &auction(AuctionStatus::Live),
            &BidAttempt::manual(1, 200),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, BidError::ItemClosed);
    }

    #[test]
    fn rejects_bid_below_minimum_with_computed_minimum() {
        // 현재 가격 650 -> 단위 10 -> 최소 660
        let err = validate(
            &item(650, None),
            None,
            &auction(AuctionStatus::Live),
            &BidAttempt::manual(1, 655),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, BidError::BidTooLow { minimum: 660 });
    }

    #[test]
    fn accepts_bid_at_exact_minimum() {
        assert!(validate(
            &item(650, None),
            None,
            &auction(AuctionStatus::Live),
            &BidAttempt::manual(1, 660),
            now(),
        )
        .is_ok());
    }

    #[test]
    fn proxy_only_ceiling_must_reach_minimum() {
        let err = validate(
            &item(650, None),
            None,
            &auction(AuctionStatus::Live),
            &BidAttempt::proxy_only(1, 655),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, BidError::BidTooLow { minimum: 660 });
        assert!(validate(
            &item(650, None),
            None,
            &auction(AuctionStatus::Live),
            &BidAttempt::proxy_only(1, 660),
            now(),
        )
        .is_ok());
    }

    #[test]
    fn leader_plain_rebid_is_rejected_but_ceiling_raise_is_allowed() {
        let it = item(200, Some(1));
        let own = ProxyBid {
            id: 1,
            item_id: 10,
            bidder_id: 1,
            max_amount: 300,
            committed_amount: 200,
            is_active: true,
            created_at: now() - Duration::minutes(5),
        };
        // 기존 상한 300 이하로는 거절
        let err = validate(
            &it,
            Some(&own),
            &auction(AuctionStatus::Live),
            &BidAttempt::proxy_only(1, 300),
            now(),
        )
        .unwrap_err();
        assert_eq!(err, BidError::SelfOutbid);
        // 상한 인상은 허용
        assert!(validate(
            &it,
            Some(&own),
            &auction(AuctionStatus::Live),
            &BidAttempt::proxy_only(1, 400),
            now(),
        )
        .is_ok());
        // 자동 입찰 없는 최고 입찰자의 단순 재입찰도 상한(현재 가격) 초과면 허용
        assert!(validate(
            &it,
            None,
            &auction(AuctionStatus::Live),
            &BidAttempt::manual(1, 250),
            now(),
        )
        .is_ok());
    }

    #[test]
    fn rejects_proxy_ceiling_below_manual_amount() {
        let err = validate(
            &item(100, None),
            None,
            &auction(AuctionStatus::Live),
            &BidAttempt::with_proxy(1, 200, 150),
            now(),
        )
        .unwrap_err();
        assert_eq!(
            err,
            BidError::InvalidProxyCeiling {
                ceiling: 150,
                amount: 200
            }
        );
    }
}

// endregion: --- Tests
