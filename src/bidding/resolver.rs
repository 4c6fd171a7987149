/// 자동 입찰 해소기 (순수 함수)
/// 오름차순 2위가+단위 방식: 새 공개 가격은 min(1위 상한, 2위 상한 + 입찰 단위).
/// 경쟁 자동 입찰이 없는 수동 낙찰은 명시 금액이 그대로 가격 바닥이다.
/// 같은 입력이면 항상 같은 결과를 내므로 재시도가 멱등하다.
// region:    --- Imports
use crate::bidding::model::{AuctionItem, BidKind, NewBid, ProxyBid, ProxyBidUpdate};
use crate::bidding::BidAttempt;
use chrono::{DateTime, Utc};

// endregion: --- Imports

// region:    --- Resolution

/// 해소 결과: 새 가격/낙찰자, 추가할 입찰 기록, 자동 입찰 갱신, 밀려난 입찰자
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub winner_id: i64,
    pub new_price: i64,
    pub bids: Vec<NewBid>,
    pub proxy_updates: Vec<ProxyBidUpdate>,
    /// 낙찰자가 바뀐 경우 이전 낙찰자
    pub outbid_bidder_id: Option<i64>,
}

/// 경합 후보: 활성 자동 입찰 + (자동 입찰 없는) 현 최고 입찰자의 암묵 상한 + 이번 시도
struct Candidate {
    bidder_id: i64,
    ceiling: i64,
    registered_at: DateTime<Utc>,
}

// endregion: --- Resolution

// region:    --- Resolver

/// 이번 시도와 다른 입찰자들의 활성 자동 입찰을 함께 해소한다.
/// `attempt`는 이미 검증을 통과한 상태여야 한다.
pub fn resolve(
    item: &AuctionItem,
    active_proxies: &[ProxyBid],
    attempt: &BidAttempt,
    now: DateTime<Utc>,
) -> Resolution {
    let mut candidates: Vec<Candidate> = Vec::new();

    for p in active_proxies.iter().filter(|p| p.is_active) {
        if p.bidder_id == attempt.bidder_id {
            // 이번 시도로 교체되므로 기존 레코드는 후보에서 제외
            continue;
        }
        candidates.push(Candidate {
            bidder_id: p.bidder_id,
            ceiling: p.max_amount,
            registered_at: p.created_at,
        });
    }

    // 자동 입찰 없는 현 최고 입찰자: 암묵 상한 = 현재 가격, 등록 시각은 모든 후보보다 앞선다
    if let Some(winner) = item.current_winner_id {
        if winner != attempt.bidder_id
            && !candidates.iter().any(|c| c.bidder_id == winner)
        {
            candidates.push(Candidate {
                bidder_id: winner,
                ceiling: item.current_price,
                registered_at: DateTime::<Utc>::MIN_UTC,
            });
        }
    }

    candidates.push(Candidate {
        bidder_id: attempt.bidder_id,
        ceiling: attempt.ceiling(),
        registered_at: now,
    });

    // 상한 내림차순, 동률이면 먼저 등록된 쪽(기득권)이 앞선다
    candidates.sort_by(|a, b| {
        b.ceiling
            .cmp(&a.ceiling)
            .then(a.registered_at.cmp(&b.registered_at))
    });

    let top = &candidates[0];
    let second = candidates.get(1);
    let winner_id = top.bidder_id;

    let mut new_price = match second {
        // 경쟁자가 없으면 명시 입찰 금액이 그대로 가격 (가공의 단위를 얹지 않는다)
        None => attempt.amount.unwrap_or(item.current_price),
        Some(s) => {
            let increment = item.increment_schedule.increment_for(s.ceiling);
            (s.ceiling + increment).min(top.ceiling)
        }
    };
    // 공개 가격은 단조 비감소
    new_price = new_price.max(item.current_price);

    // 경쟁 자동 입찰이 없는 수동 낙찰은 명시 금액이 그대로 바닥이 된다
    let rival_proxy_exists = active_proxies
        .iter()
        .any(|p| p.is_active && p.bidder_id != attempt.bidder_id);
    if winner_id == attempt.bidder_id && !rival_proxy_exists {
        if let Some(amount) = attempt.amount {
            new_price = new_price.max(amount);
        }
    }

    let price_moved = new_price > item.current_price;
    let winner_changed = item.current_winner_id != Some(winner_id);
    let outbid_bidder_id = item
        .current_winner_id
        .filter(|prev| *prev != winner_id);

    // 입찰 기록: 수동 입찰 1건 + (가격/낙찰자가 수동 금액만으로 설명되지 않으면) 시스템 입찰 1건
    let mut bids: Vec<NewBid> = Vec::new();
    if let Some(amount) = attempt.amount {
        bids.push(NewBid {
            bidder_id: attempt.bidder_id,
            amount,
            kind: BidKind::Manual,
            bid_time: now,
            is_winning: false,
        });
    }
    let manual_explains = winner_id == attempt.bidder_id && attempt.amount == Some(new_price);
    if !manual_explains && (price_moved || winner_changed) {
        bids.push(NewBid {
            bidder_id: winner_id,
            amount: new_price,
            kind: BidKind::Proxy,
            bid_time: now,
            is_winning: false,
        });
    }
    // 낙찰 기록 표시: 낙찰자의 새 가격 기록 중 마지막 것
    if let Some(winning) = bids
        .iter_mut()
        .rev()
        .find(|b| b.bidder_id == winner_id && b.amount == new_price)
    {
        winning.is_winning = true;
    }

    // 자동 입찰 갱신: 이번 시도의 상한 생성/교체 + 기존 레코드의 투입액/소진 반영
    let mut proxy_updates: Vec<ProxyBidUpdate> = Vec::new();
    if let Some(max_amount) = attempt.proxy_max {
        proxy_updates.push(ProxyBidUpdate {
            bidder_id: attempt.bidder_id,
            max_amount,
            committed_amount: if winner_id == attempt.bidder_id {
                new_price
            } else {
                max_amount.min(new_price)
            },
            is_active: max_amount >= new_price,
            registered_at: now,
        });
    }
    for p in active_proxies.iter().filter(|p| p.is_active) {
        if p.bidder_id == attempt.bidder_id {
            continue;
        }
        let committed = if p.bidder_id == winner_id {
            new_price
        } else {
            p.max_amount.min(new_price)
        };
        // 상한이 새 가격에 못 미치면 소진 처리하되 감사용으로 보존
        let still_active = p.max_amount >= new_price;
        if committed != p.committed_amount || still_active != p.is_active {
            proxy_updates.push(ProxyBidUpdate {
                bidder_id: p.bidder_id,
                max_amount: p.max_amount,
                committed_amount: committed,
                is_active: still_active,
                registered_at: p.created_at,
            });
        }
    }

    Resolution {
        winner_id,
        new_price,
        bids,
        proxy_updates,
        outbid_bidder_id,
    }
}

// endregion: --- Resolver

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bidding::model::{IncrementSchedule, IncrementTier, ItemStatus};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    /// 500 미만 구간에서 단위 10인 테이블
    fn schedule() -> IncrementSchedule {
        IncrementSchedule::new(vec![
            IncrementTier { threshold: 0, increment: 10 },
            IncrementTier { threshold: 500, increment: 25 },
        ])
        .unwrap()
    }

    fn item(price: i64, winner: Option<i64>) -> AuctionItem {
        AuctionItem {
            id: 10,
            auction_id: 1,
            title: "해소기 테스트".into(),
            description: String::new(),
            starting_price: 50,
            current_price: price,
            reserve_price: None,
            increment_schedule: schedule(),
            current_winner_id: winner,
            end_time: now() + Duration::hours(1),
            status: ItemStatus::Active,
            bid_count: 0,
            created_at: now() - Duration::days(1),
        }
    }

    fn proxy(bidder_id: i64, max: i64, committed: i64, minutes_ago: i64) -> ProxyBid {
        ProxyBid {
            id: bidder_id,
            item_id: 10,
            bidder_id,
            max_amount: max,
            committed_amount: committed,
            is_active: true,
            created_at: now() - Duration::minutes(minutes_ago),
        }
    }

    #[test]
    fn uncontested_manual_bid_prices_at_exactly_the_amount() {
        let r = resolve(&item(50, None), &[], &BidAttempt::manual(1, 120), now());
        assert_eq!(r.winner_id, 1);
        assert_eq!(r.new_price, 120);
        assert_eq!(r.bids.len(), 1);
        assert_eq!(r.bids[0].kind, BidKind::Manual);
        assert!(r.bids[0].is_winning);
        assert_eq!(r.outbid_bidder_id, None);
    }

    #[test]
    fn higher_proxy_defends_against_lower_proxy_at_second_plus_increment() {
        // A 상한 100 (기존), B 상한 80 (이번 시도): A 낙찰, 가격 min(100, 80+10)=90
        let a = proxy(1, 100, 50, 10);
        let r = resolve(
            &item(50, Some(1)),
            &[a],
            &BidAttempt::proxy_only(2, 80),
            now(),
        );
        assert_eq!(r.winner_id, 1);
        assert_eq!(r.new_price, 90);
        // A에게 시스템 입찰이 귀속된다
        let system = r.bids.iter().find(|b| b.kind == BidKind::Proxy).unwrap();
        assert_eq!(system.bidder_id, 1);
        assert_eq!(system.amount, 90);
        assert!(system.is_winning);
        // B의 자동 입찰은 소진 처리
        let b_update = r.proxy_updates.iter().find(|p| p.bidder_id == 2).unwrap();
        assert!(!b_update.is_active);
        assert_eq!(b_update.committed_amount, 80);
    }

    #[test]
    fn equal_ceilings_tie_break_to_the_earlier_registration() {
        let a = proxy(1, 150, 60, 10);
        let r = resolve(
            &item(60, Some(1)),
            &[a],
            &BidAttempt::proxy_only(2, 150),
            now(),
        );
        assert_eq!(r.winner_id, 1);
        assert_eq!(r.new_price, 150);
        // 동률 상한은 가격과 같으므로 소진되지 않는다
        let b_update = r.proxy_updates.iter().find(|p| p.bidder_id == 2).unwrap();
        assert!(b_update.is_active);
    }

    #[test]
    fn incoming_proxy_overtakes_incumbent_proxy() {
        // A 상한 100 (기존), B가 수동 110 + 상한 200: B 낙찰, 가격 min(200, 100+10)=110
        let a = proxy(1, 100, 100, 10);
        let r = resolve(
            &item(100, Some(1)),
            &[a],
            &BidAttempt::with_proxy(2, 110, 200),
            now(),
        );
        assert_eq!(r.winner_id, 2);
        assert_eq!(r.new_price, 110);
        assert_eq!(r.outbid_bidder_id, Some(1));
        // 수동 금액이 새 가격을 그대로 설명하므로 시스템 입찰은 없다
        assert_eq!(r.bids.len(), 1);
        assert!(r.bids[0].is_winning);
        // A는 상한까지 밀렸고 소진되었다
        let a_update = r.proxy_updates.iter().find(|p| p.bidder_id == 1).unwrap();
        assert_eq!(a_update.committed_amount, 100);
        assert!(!a_update.is_active);
    }

    #[test]
    fn winner_pays_second_plus_increment_when_proxy_competition_moves_price() {
        // A 상한 300 (기존), B가 수동 110 + 상한 250: A 낙찰, 가격 min(300, 250+10)=260
        let a = proxy(1, 300, 100, 10);
        let r = resolve(
            &item(100, Some(1)),
            &[a],
            &BidAttempt::with_proxy(2, 110, 250),
            now(),
        );
        assert_eq!(r.winner_id, 1);
        assert_eq!(r.new_price, 260);
        // B의 수동 기록 + A의 시스템 기록
        assert_eq!(r.bids.len(), 2);
        assert_eq!(r.bids[0].kind, BidKind::Manual);
        assert!(!r.bids[0].is_winning);
        assert_eq!(r.bids[1].kind, BidKind::Proxy);
        assert!(r.bids[1].is_winning);
    }

    #[test]
    fn manual_bid_over_manual_leader_prices_at_the_full_amount() {
        // 경쟁 자동 입찰이 없으면 명시 금액이 그대로 가격이 된다 (가공의 단위 없음)
        let r = resolve(&item(100, Some(1)), &[], &BidAttempt::manual(2, 200), now());
        assert_eq!(r.winner_id, 2);
        assert_eq!(r.new_price, 200);
        assert_eq!(r.outbid_bidder_id, Some(1));
        // 수동 금액이 가격을 그대로 설명하므로 기록은 1건
        assert_eq!(r.bids.len(), 1);
        assert_eq!(r.bids[0].kind, BidKind::Manual);
        assert!(r.bids[0].is_winning);
    }

    #[test]
    fn proxy_only_set_on_untouched_item_keeps_price_but_takes_the_lead() {
        let r = resolve(&item(50, None), &[], &BidAttempt::proxy_only(1, 400), now());
        assert_eq!(r.winner_id, 1);
        assert_eq!(r.new_price, 50);
        // 원장에 낙찰 기록이 남도록 시스템 입찰을 만든다
        assert_eq!(r.bids.len(), 1);
        assert_eq!(r.bids[0].kind, BidKind::Proxy);
        assert!(r.bids[0].is_winning);
        let update = &r.proxy_updates[0];
        assert_eq!(update.committed_amount, 50);
        assert!(update.is_active);
    }

    #[test]
    fn leader_raising_own_ceiling_changes_nothing_public() {
        let own = proxy(1, 200, 120, 10);
        let r = resolve(
            &item(120, Some(1)),
            &[own],
            &BidAttempt::proxy_only(1, 500),
            now(),
        );
        assert_eq!(r.winner_id, 1);
        assert_eq!(r.new_price, 120);
        assert!(r.bids.is_empty());
        assert_eq!(r.outbid_bidder_id, None);
        // 상한 교체만 반영된다
        assert_eq!(r.proxy_updates.len(), 1);
        assert_eq!(r.proxy_updates[0].max_amount, 500);
    }

    #[test]
    fn replay_with_identical_inputs_is_deterministic() {
        let proxies = vec![proxy(1, 300, 100, 10), proxy(3, 180, 90, 5)];
        let attempt = BidAttempt::with_proxy(2, 110, 250);
        let it = item(100, Some(1));
        let first = resolve(&it, &proxies, &attempt, now());
        let second = resolve(&it, &proxies, &attempt, now());
        assert_eq!(first, second);
    }
}

// endregion: --- Tests
