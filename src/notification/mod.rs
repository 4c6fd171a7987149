/// 사용자 알림
/// 밀려남/낙찰/유찰을 특정 사용자에게 전달한다. 전달 실패는 기록만 하고
/// 이미 커밋된 입찰 결과에는 영향을 주지 않는다.
// region:    --- Imports
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Mutex;

// endregion: --- Imports

// region:    --- Notification

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum NotificationKind {
    /// 더 높은 입찰에 밀려남
    Outbid,
    /// 낙찰
    Won,
    /// 유찰 (최소 낙찰가 미달 포함)
    Lost,
    /// 스나이핑 방지로 마감 연장
    Extended,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Notification {
    pub user_id: i64,
    pub item_id: i64,
    pub kind: NotificationKind,
    pub message: String,
    pub timestamp: DateTime<Utc>,
}

impl Notification {
    pub fn outbid(user_id: i64, item_id: i64, new_price: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            item_id,
            kind: NotificationKind::Outbid,
            message: format!("더 높은 입찰이 들어왔습니다. 현재 가격: {new_price}"),
            timestamp,
        }
    }

    pub fn won(user_id: i64, item_id: i64, final_price: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            item_id,
            kind: NotificationKind::Won,
            message: format!("낙찰되었습니다. 최종 가격: {final_price}"),
            timestamp,
        }
    }

    pub fn lost(user_id: i64, item_id: i64, timestamp: DateTime<Utc>) -> Self {
        Self {
            user_id,
            item_id,
            kind: NotificationKind::Lost,
            message: "낙찰에 실패했습니다".to_string(),
            timestamp,
        }
    }

    pub fn extended(
        user_id: i64,
        item_id: i64,
        new_end_time: DateTime<Utc>,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            user_id,
            item_id,
            kind: NotificationKind::Extended,
            message: format!("마감이 {new_end_time}로 연장되었습니다"),
            timestamp,
        }
    }
}

// endregion: --- Notification

// region:    --- Notification Dispatcher

/// 알림 전달 트레이트. 커밋 이후에만 호출된다.
#[async_trait]
pub trait NotificationDispatcher: Send + Sync {
    async fn dispatch(&self, notification: &Notification) -> Result<(), String>;
}

/// 테스트용 인메모리 디스패처
#[derive(Default)]
pub struct InMemoryNotificationDispatcher(Mutex<Vec<Notification>>);

impl InMemoryNotificationDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn dispatched(&self) -> Vec<Notification> {
        self.0.lock().expect("lock").clone()
    }
}

#[async_trait]
impl NotificationDispatcher for InMemoryNotificationDispatcher {
    async fn dispatch(&self, notification: &Notification) -> Result<(), String> {
        self.0.lock().expect("lock").push(notification.clone());
        Ok(())
    }
}

// endregion: --- Notification Dispatcher
