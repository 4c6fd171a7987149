/// 생애주기 스케줄러
/// 1초 주기로 경매 개시/종료와 상품 마감을 쓸어낸다. 상품 마감 판정은
/// 행 잠금 아래에서 다시 읽은 스냅샷으로 수행하므로 막판 연장과
/// 경합해도 잘못 닫는 일이 없다.
// region:    --- Imports
use crate::auction::events::{AuctionEvent, EventPublisher};
use crate::bidding::model::{self, ItemStatus};
use crate::clock::Clock;
use crate::notification::{Notification, NotificationDispatcher};
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Row};
use std::sync::Arc;
use tokio::time::{interval, Duration};
use tracing::{debug, error, info};

// endregion: --- Imports

// region:    --- Queries

const OPEN_DUE_AUCTIONS: &str = r#"
    UPDATE auctions SET status = 'LIVE'
    WHERE status = 'SCHEDULED' AND start_time <= $1 AND end_time > $1
"#;

const SELECT_DUE_ITEM_IDS: &str =
    "SELECT id FROM items WHERE status = 'ACTIVE' AND end_time <= $1";

/// 행 잠금 아래에서 마감 대상 스냅샷을 다시 읽는다
const LOCK_DUE_ITEM: &str = r#"
    SELECT current_winner_id, current_price, reserve_price
    FROM items
    WHERE id = $1 AND status = 'ACTIVE' AND end_time <= $2
    FOR UPDATE
"#;

const CLOSE_ITEM: &str = "UPDATE items SET status = $2, version = version + 1 WHERE id = $1";

const DEACTIVATE_ITEM_PROXIES: &str =
    "UPDATE proxy_bids SET is_active = false WHERE item_id = $1 AND is_active = true";

const SELECT_ITEM_BIDDERS: &str = "SELECT DISTINCT bidder_id FROM bids WHERE item_id = $1";

/// 활성 상품이 하나도 남지 않은 경매만 종료한다
const END_DUE_AUCTIONS: &str = r#"
    UPDATE auctions SET status = 'ENDED'
    WHERE status = 'LIVE' AND end_time <= $1
      AND NOT EXISTS (
          SELECT 1 FROM items
          WHERE items.auction_id = auctions.id AND items.status = 'ACTIVE'
      )
"#;

// endregion: --- Queries

// region:    --- Closed Item

/// 커밋된 상품 마감 결과. 이벤트/알림은 커밋 이후 이걸로 만든다.
struct ClosedItem {
    item_id: i64,
    outcome: ItemStatus,
    winner_id: Option<i64>,
    final_price: i64,
    bidders: Vec<i64>,
}

// endregion: --- Closed Item

// region:    --- Lifecycle Scheduler

pub struct LifecycleScheduler {
    pool: Arc<PgPool>,
    clock: Arc<dyn Clock>,
    events: Arc<dyn EventPublisher>,
    notifier: Arc<dyn NotificationDispatcher>,
}

impl LifecycleScheduler {
    pub fn new(
        pool: Arc<PgPool>,
        clock: Arc<dyn Clock>,
        events: Arc<dyn EventPublisher>,
        notifier: Arc<dyn NotificationDispatcher>,
    ) -> Self {
        Self {
            pool,
            clock,
            events,
            notifier,
        }
    }

    /// 스케줄러 시작
    pub async fn start(self: Arc<Self>) {
        info!("{:<12} --> 생애주기 스케줄러 시작", "Scheduler");
        tokio::spawn(async move {
            let mut interval = interval(Duration::from_secs(1)); // 1초마다 실행
            loop {
                interval.tick().await;
                if let Err(e) = self.sweep().await {
                    error!("{:<12} --> 생애주기 스윕 중 오류 발생: {:?}", "Scheduler", e);
                }
            }
        });
    }

    /// 한 번의 스윕: 경매 개시 -> 상품 마감 -> 경매 종료
    async fn sweep(&self) -> Result<(), sqlx::Error> {
        let now = self.clock.now();

        // SCHEDULED -> LIVE
        sqlx::query(OPEN_DUE_AUCTIONS)
            .bind(now)
            .execute(&*self.pool)
            .await?;

        // 마감 시각이 지난 활성 상품을 하나씩 닫는다
        let due: Vec<i64> = sqlx::query(SELECT_DUE_ITEM_IDS)
            .bind(now)
            .fetch_all(&*self.pool)
            .await?
            .into_iter()
            .map(|row| row.get("id"))
            .collect();
        for item_id in due {
            if let Some(closed) = self.close_item(item_id, now).await? {
                self.announce_closed(&closed, now).await;
            }
        }

        // LIVE -> ENDED
        sqlx::query(END_DUE_AUCTIONS)
            .bind(now)
            .execute(&*self.pool)
            .await?;

        debug!("{:<12} --> 생애주기 스윕 완료", "Scheduler");
        Ok(())
    }

    /// 상품 하나를 트랜잭션으로 마감한다.
    /// 잠금 후 재확인에서 빠졌으면(그 사이 연장됨) None.
    async fn close_item(
        &self,
        item_id: i64,
        now: DateTime<Utc>,
    ) -> Result<Option<ClosedItem>, sqlx::Error> {
        let mut tx = self.pool.begin().await?;

        let row = sqlx::query(LOCK_DUE_ITEM)
            .bind(item_id)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await?;
        let Some(row) = row else {
            tx.rollback().await?;
            return Ok(None);
        };

        let winner_id: Option<i64> = row.get("current_winner_id");
        let current_price: i64 = row.get("current_price");
        let reserve_price: Option<i64> = row.get("reserve_price");

        let outcome = model::close_outcome(winner_id, current_price, reserve_price);

        sqlx::query(CLOSE_ITEM)
            .bind(item_id)
            .bind(outcome.as_str())
            .execute(&mut *tx)
            .await?;
        sqlx::query(DEACTIVATE_ITEM_PROXIES)
            .bind(item_id)
            .execute(&mut *tx)
            .await?;
        let bidders: Vec<i64> = sqlx::query(SELECT_ITEM_BIDDERS)
            .bind(item_id)
            .fetch_all(&mut *tx)
            .await?
            .into_iter()
            .map(|row| row.get("bidder_id"))
            .collect();

        tx.commit().await?;
        info!(
            "{:<12} --> 상품 마감 id: {}, 결과: {}",
            "Scheduler",
            item_id,
            outcome.as_str()
        );

        Ok(Some(ClosedItem {
            item_id,
            outcome,
            winner_id,
            final_price: current_price,
            bidders,
        }))
    }

    /// 마감 결과를 바깥으로 알린다. 실패는 기록만 한다.
    async fn announce_closed(&self, closed: &ClosedItem, now: DateTime<Utc>) {
        let event = match (closed.outcome, closed.winner_id) {
            (ItemStatus::Sold, Some(winner_id)) => AuctionEvent::ItemSold {
                item_id: closed.item_id,
                winner_id,
                final_price: closed.final_price,
                timestamp: now,
            },
            _ => AuctionEvent::ItemUnsold {
                item_id: closed.item_id,
                timestamp: now,
            },
        };
        if let Err(e) = self.events.publish(&event).await {
            error!("{:<12} --> 이벤트 발행 실패: {}", "Scheduler", e);
        }

        let sold_to = match closed.outcome {
            ItemStatus::Sold => closed.winner_id,
            _ => None,
        };
        for bidder_id in &closed.bidders {
            let notification = if Some(*bidder_id) == sold_to {
                Notification::won(*bidder_id, closed.item_id, closed.final_price, now)
            } else {
                Notification::lost(*bidder_id, closed.item_id, now)
            };
            if let Err(e) = self.notifier.dispatch(&notification).await {
                error!("{:<12} --> 알림 전달 실패: {}", "Scheduler", e);
            }
        }
    }
}

// endregion: --- Lifecycle Scheduler
