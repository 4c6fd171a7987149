/// 인메모리 저장소
/// 테스트 및 단일 프로세스 구동용. Postgres 구현과 동일한 CAS 의미를
/// 하나의 뮤텍스 아래에서 제공한다.
// region:    --- Imports
use super::{CommitOutcome, ItemCommit, ItemSnapshot, ItemStore, StoreError};
use crate::auction::Auction;
use crate::bidding::model::{AuctionItem, Bid, ProxyBid};
use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Mutex;

// endregion: --- Imports

// region:    --- In-Memory Store

#[derive(Default)]
struct Inner {
    items: BTreeMap<i64, (AuctionItem, i64)>,
    auctions: BTreeMap<i64, Auction>,
    /// 상품별 원장 (append-only)
    bids: BTreeMap<i64, Vec<Bid>>,
    /// (상품, 입찰자)당 1개
    proxies: BTreeMap<(i64, i64), ProxyBid>,
    next_bid_id: i64,
    next_proxy_id: i64,
}

#[derive(Default)]
pub struct InMemoryItemStore(Mutex<Inner>);

impl InMemoryItemStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert_auction(&self, auction: Auction) {
        self.0
            .lock()
            .expect("lock")
            .auctions
            .insert(auction.id, auction);
    }

    pub fn insert_item(&self, item: AuctionItem) {
        self.0.lock().expect("lock").items.insert(item.id, (item, 0));
    }

    /// 테스트 검증용 상품 조회
    pub fn item(&self, item_id: i64) -> Option<AuctionItem> {
        self.0
            .lock()
            .expect("lock")
            .items
            .get(&item_id)
            .map(|(item, _)| item.clone())
    }

    /// 테스트 검증용 경매 조회
    pub fn auction(&self, auction_id: i64) -> Option<Auction> {
        self.0.lock().expect("lock").auctions.get(&auction_id).cloned()
    }
}

#[async_trait]
impl ItemStore for InMemoryItemStore {
    async fn load_item(&self, item_id: i64) -> Result<ItemSnapshot, StoreError> {
        let inner = self.0.lock().expect("lock");
        let (item, version) = inner.items.get(&item_id).ok_or(StoreError::NotFound)?;
        let active_proxies = inner
            .proxies
            .values()
            .filter(|p| p.item_id == item_id && p.is_active)
            .cloned()
            .collect();
        Ok(ItemSnapshot {
            item: item.clone(),
            active_proxies,
            version: *version,
        })
    }

    async fn load_auction(&self, auction_id: i64) -> Result<Auction, StoreError> {
        self.0
            .lock()
            .expect("lock")
            .auctions
            .get(&auction_id)
            .cloned()
            .ok_or(StoreError::NotFound)
    }

    async fn commit(
        &self,
        item_id: i64,
        expected_version: i64,
        commit: ItemCommit,
    ) -> Result<CommitOutcome, StoreError> {
        let mut inner = self.0.lock().expect("lock");

        let version = match inner.items.get(&item_id) {
            Some((_, v)) => *v,
            None => return Err(StoreError::NotFound),
        };
        if version != expected_version {
            return Ok(CommitOutcome::Conflict);
        }

        if commit.revoke_winning {
            if let Some(ledger) = inner.bids.get_mut(&item_id) {
                for bid in ledger.iter_mut() {
                    bid.is_winning = false;
                }
            }
        }

        for new_bid in &commit.bids {
            inner.next_bid_id += 1;
            let id = inner.next_bid_id;
            inner.bids.entry(item_id).or_default().push(Bid {
                id,
                item_id,
                bidder_id: new_bid.bidder_id,
                amount: new_bid.amount,
                kind: new_bid.kind,
                bid_time: new_bid.bid_time,
                is_winning: new_bid.is_winning,
            });
        }

        for update in &commit.proxy_updates {
            inner.next_proxy_id += 1;
            let id = inner.next_proxy_id;
            let entry = inner
                .proxies
                .entry((item_id, update.bidder_id))
                .or_insert_with(|| ProxyBid {
                    id,
                    item_id,
                    bidder_id: update.bidder_id,
                    max_amount: 0,
                    committed_amount: 0,
                    is_active: false,
                    created_at: update.registered_at,
                });
            entry.max_amount = update.max_amount;
            entry.committed_amount = update.committed_amount;
            entry.is_active = update.is_active;
            entry.created_at = update.registered_at;
        }

        if let Some((auction_id, new_end)) = commit.push_auction_end {
            if let Some(auction) = inner.auctions.get_mut(&auction_id) {
                if auction.end_time < new_end {
                    auction.end_time = new_end;
                }
            }
        }

        let (item, version) = inner.items.get_mut(&item_id).expect("checked above");
        item.current_price = commit.new_price;
        item.current_winner_id = commit.winner_id;
        item.end_time = commit.end_time;
        item.bid_count = commit.bid_count;
        *version += 1;

        Ok(CommitOutcome::Committed)
    }

    async fn bid_history(
        &self,
        item_id: i64,
        cursor: Option<i64>,
        limit: i64,
    ) -> Result<Vec<Bid>, StoreError> {
        let inner = self.0.lock().expect("lock");
        let mut bids: Vec<Bid> = inner
            .bids
            .get(&item_id)
            .map(|ledger| {
                ledger
                    .iter()
                    .filter(|b| cursor.map_or(true, |c| b.id < c))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();
        bids.sort_by(|a, b| b.id.cmp(&a.id));
        bids.truncate(limit.max(0) as usize);
        Ok(bids)
    }
}

// endregion: --- In-Memory Store

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::AuctionStatus;
    use crate::bidding::model::{BidKind, IncrementSchedule, ItemStatus, NewBid};
    use chrono::{Duration, TimeZone, Utc};

    fn seed(store: &InMemoryItemStore) {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        store.insert_auction(Auction {
            id: 1,
            title: "테스트 경매".into(),
            status: AuctionStatus::Live,
            start_time: now - Duration::hours(1),
            end_time: now + Duration::hours(1),
            anti_snipe_threshold_secs: 60,
            anti_snipe_extension_secs: 120,
            created_at: now - Duration::days(1),
        });
        store.insert_item(AuctionItem {
            id: 10,
            auction_id: 1,
            title: "테스트 상품".into(),
            description: String::new(),
            starting_price: 100,
            current_price: 100,
            reserve_price: None,
            increment_schedule: IncrementSchedule::default(),
            current_winner_id: None,
            end_time: now + Duration::minutes(30),
            status: ItemStatus::Active,
            bid_count: 0,
            created_at: now - Duration::days(1),
        });
    }

    fn commit_for(price: i64, bidder: i64) -> ItemCommit {
        let now = Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap();
        ItemCommit {
            new_price: price,
            winner_id: Some(bidder),
            end_time: now + Duration::minutes(30),
            bid_count: 1,
            bids: vec![NewBid {
                bidder_id: bidder,
                amount: price,
                kind: BidKind::Manual,
                bid_time: now,
                is_winning: true,
            }],
            proxy_updates: vec![],
            revoke_winning: true,
            push_auction_end: None,
        }
    }

    #[tokio::test]
    async fn commit_applies_only_on_matching_version() {
        let store = InMemoryItemStore::new();
        seed(&store);

        let outcome = store.commit(10, 0, commit_for(105, 1)).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Committed);

        // 이전 버전으로는 충돌
        let outcome = store.commit(10, 0, commit_for(200, 2)).await.unwrap();
        assert_eq!(outcome, CommitOutcome::Conflict);

        let snapshot = store.load_item(10).await.unwrap();
        assert_eq!(snapshot.item.current_price, 105);
        assert_eq!(snapshot.version, 1);
    }

    #[tokio::test]
    async fn bid_history_pages_most_recent_first() {
        let store = InMemoryItemStore::new();
        seed(&store);
        for (i, price) in [105_i64, 110, 115, 120].iter().enumerate() {
            store
                .commit(10, i as i64, commit_for(*price, i as i64 + 1))
                .await
                .unwrap();
        }

        let first = store.bid_history(10, None, 2).await.unwrap();
        assert_eq!(
            first.iter().map(|b| b.amount).collect::<Vec<_>>(),
            vec![120, 115]
        );
        let second = store
            .bid_history(10, Some(first.last().unwrap().id), 2)
            .await
            .unwrap();
        assert_eq!(
            second.iter().map(|b| b.amount).collect::<Vec<_>>(),
            vec![110, 105]
        );
        // 마지막 커밋의 기록만 낙찰 표시
        let all = store.bid_history(10, None, 10).await.unwrap();
        assert_eq!(all.iter().filter(|b| b.is_winning).count(), 1);
        assert!(all[0].is_winning);
    }
}

// endregion: --- Tests
