/// 입찰 엔진
/// 스냅샷 로드 → 검증 → 해소 → 연장 → CAS 커밋을 버전 충돌 시
/// 재시도하는 낙관적 동시성 루프. 이벤트/알림은 커밋 이후에만 나간다.
// region:    --- Imports
use crate::auction::events::{AuctionEvent, EventPublisher};
use crate::bidding::anti_snipe;
use crate::bidding::error::BidError;
use crate::bidding::{resolver, validator, BidAttempt};
use crate::clock::Clock;
use crate::notification::{Notification, NotificationDispatcher};
use crate::store::{CommitOutcome, ItemCommit, ItemStore, StoreError};
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{error, warn};

// endregion: --- Imports

// region:    --- Bid Outcome

/// 수락된 입찰/상한 설정의 결과
#[derive(Debug, Clone, PartialEq)]
pub struct BidOutcome {
    pub item_id: i64,
    pub new_price: i64,
    pub winner_id: i64,
    /// 시도자가 현재 최고 입찰자인지
    pub is_winning: bool,
    pub end_time: DateTime<Utc>,
    /// 스나이핑 방지 연장이 발동했는지
    pub extended: bool,
    pub bid_count: i64,
}

// endregion: --- Bid Outcome

// region:    --- Bid Engine

const MAX_RETRIES: i32 = 100;

pub struct BidEngine {
    store: Arc<dyn ItemStore>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl BidEngine {
    pub fn new(
        store: Arc<dyn ItemStore>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            store,
            clock,
            events,
            notifier,
        }
    }

    /// 수동 입찰 (자동 입찰 상한 동시 설정 가능)
    pub async fn place_bid(
        &self,
        item_id: i64,
        bidder_id: i64,
        amount: i64,
        proxy_max: Option<i64>,
    ) -> Result<BidOutcome, BidError> {
        let attempt = match proxy_max {
            Some(max) => BidAttempt::with_proxy(bidder_id, amount, max),
            None => BidAttempt::manual(bidder_id, amount),
        };
        self.submit(item_id, attempt).await
    }

    /// 자동 입찰 상한 설정. 금액 변동 없는 입찰 시도로 같은 경로를 탄다.
    pub async fn set_proxy_bid(
        &self,
        item_id: i64,
        bidder_id: i64,
        max_amount: i64,
    ) -> Result<BidOutcome, BidError> {
        self.submit(item_id, BidAttempt::proxy_only(bidder_id, max_amount))
            .await
    }

    async fn submit(&self, item_id: i64, attempt: BidAttempt) -> Result<BidOutcome, BidError> {
        for retry in 0..MAX_RETRIES {
            let snapshot = self.store.load_item(item_id).await.map_err(|e| match e {
                StoreError::NotFound => BidError::UnknownItem(item_id),
                other => other.into(),
            })?;
            let auction = self
                .store
                .load_auction(snapshot.item.auction_id)
                .await
                .map_err(|e| match e {
                    StoreError::NotFound => BidError::UnknownAuction(snapshot.item.auction_id),
                    other => other.into(),
                })?;

            let now = self.clock.now();
            let own_proxy = snapshot
                .active_proxies
                .iter()
                .find(|p| p.bidder_id == attempt.bidder_id);
            validator::validate(&snapshot.item, own_proxy, &auction, &attempt, now)?;

            let resolution =
                resolver::resolve(&snapshot.item, &snapshot.active_proxies, &attempt, now);
            let extension =
                anti_snipe::extend(snapshot.item.end_time, now, &auction.anti_snipe_policy());

            let bid_count = snapshot.item.bid_count + resolution.bids.len() as i64;
            let commit = ItemCommit {
                new_price: resolution.new_price,
                winner_id: Some(resolution.winner_id),
                end_time: extension.new_end_time,
                bid_count,
                revoke_winning: resolution.bids.iter().any(|b| b.is_winning),
                bids: resolution.bids.clone(),
                proxy_updates: resolution.proxy_updates.clone(),
                push_auction_end: (extension.new_end_time > auction.end_time)
                    .then_some((auction.id, extension.new_end_time)),
            };

            match self.store.commit(item_id, snapshot.version, commit).await? {
                CommitOutcome::Committed => {
                    self.announce(item_id, &auction, &attempt, &resolution, &extension, bid_count, now)
                        .await;
                    return Ok(BidOutcome {
                        item_id,
                        new_price: resolution.new_price,
                        winner_id: resolution.winner_id,
                        is_winning: resolution.winner_id == attempt.bidder_id,
                        end_time: extension.new_end_time,
                        extended: extension.triggered,
                        bid_count,
                    });
                }
                CommitOutcome::Conflict => {
                    warn!("{:<12} --> 버전 충돌, 재시도 {}", "BidEngine", retry + 1);
                    continue;
                }
            }
        }
        Err(BidError::Busy)
    }

    /// 커밋된 결과를 바깥으로 알린다. 실패는 기록만 하고 결과에 영향 없음.
    #[allow(clippy::too_many_arguments)]
    async fn announce(
        &self,
        item_id: i64,
        auction: &crate::auction::Auction,
        attempt: &BidAttempt,
        resolution: &resolver::Resolution,
        extension: &anti_snipe::Extension,
        bid_count: i64,
        now: DateTime<Utc>,
    ) {
        let mut events: Vec<AuctionEvent> = Vec::new();
        if let Some(amount) = attempt.amount {
            events.push(AuctionEvent::BidAccepted {
                item_id,
                bidder_id: attempt.bidder_id,
                amount,
                new_price: resolution.new_price,
                winner_id: resolution.winner_id,
                bid_count,
                timestamp: now,
            });
        }
        if let Some(max_amount) = attempt.proxy_max {
            events.push(AuctionEvent::ProxyBidSet {
                item_id,
                bidder_id: attempt.bidder_id,
                max_amount,
                timestamp: now,
            });
        }
        if let Some(previous_winner_id) = resolution.outbid_bidder_id {
            events.push(AuctionEvent::Outbid {
                item_id,
                previous_winner_id,
                new_price: resolution.new_price,
                timestamp: now,
            });
        }
        if extension.triggered {
            events.push(AuctionEvent::AuctionExtended {
                item_id,
                auction_id: auction.id,
                new_end_time: extension.new_end_time,
                timestamp: now,
            });
        }

        for event in &events {
            if let Err(e) = self.events.publish(event).await {
                error!("{:<12} --> 이벤트 발행 실패: {}", "BidEngine", e);
            }
        }

        if let Some(previous_winner_id) = resolution.outbid_bidder_id {
            let notification =
                Notification::outbid(previous_winner_id, item_id, resolution.new_price, now);
            if let Err(e) = self.notifier.dispatch(&notification).await {
                error!("{:<12} --> 알림 전달 실패: {}", "BidEngine", e);
            }
        }
        if extension.triggered {
            // 연장으로 선두 지위가 계속 도전받게 되는 현 선두에게 알린다
            let notification = Notification::extended(
                resolution.winner_id,
                item_id,
                extension.new_end_time,
                now,
            );
            if let Err(e) = self.notifier.dispatch(&notification).await {
                error!("{:<12} --> 알림 전달 실패: {}", "BidEngine", e);
            }
        }
    }
}

// endregion: --- Bid Engine
