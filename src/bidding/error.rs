/// 입찰 실패 분류
/// 입력 오류(재입찰로 해소), 상태 오류(해당 시도에 대해 종결),
/// 동시성 경합(내부 재시도 후 Busy), 저장소 장애(Unavailable)로 나뉜다.
// region:    --- Imports
use crate::store::StoreError;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Bid Error

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum BidError {
    #[error("경매가 진행 중이 아닙니다")]
    AuctionNotOpen,
    #[error("이미 종료된 상품입니다")]
    ItemClosed,
    #[error("존재하지 않는 상품입니다: {0}")]
    UnknownItem(i64),
    #[error("존재하지 않는 경매입니다: {0}")]
    UnknownAuction(i64),
    #[error("입찰 금액이 최소 입찰가 {minimum}보다 낮습니다")]
    BidTooLow { minimum: i64 },
    #[error("이미 최고 입찰자입니다")]
    SelfOutbid,
    #[error("자동 입찰 상한 {ceiling}이 입찰 금액 {amount}보다 낮습니다")]
    InvalidProxyCeiling { ceiling: i64, amount: i64 },
    #[error("동시 입찰 경합으로 처리하지 못했습니다. 다시 시도해주세요")]
    Busy,
    #[error("저장소를 사용할 수 없습니다: {0}")]
    Unavailable(String),
}

impl BidError {
    /// 클라이언트 응답용 오류 코드
    pub fn code(&self) -> &'static str {
        match self {
            BidError::AuctionNotOpen => "NOT_OPEN",
            BidError::ItemClosed => "ITEM_CLOSED",
            BidError::UnknownItem(_) => "UNKNOWN_ITEM",
            BidError::UnknownAuction(_) => "UNKNOWN_AUCTION",
            BidError::BidTooLow { .. } => "LOW_BID",
            BidError::SelfOutbid => "SELF_OUTBID",
            BidError::InvalidProxyCeiling { .. } => "INVALID_PROXY_CEILING",
            BidError::Busy => "MAX_RETRIES_EXCEEDED",
            BidError::Unavailable(_) => "UNAVAILABLE",
        }
    }
}

impl From<StoreError> for BidError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::NotFound => BidError::Unavailable("레코드를 찾을 수 없습니다".into()),
            StoreError::Unavailable(msg) => BidError::Unavailable(msg),
        }
    }
}

// endregion: --- Bid Error
