/// 입찰 판정 코어: 데이터 모델, 검증기, 자동 입찰 해소기, 스나이핑 방지 연장기
/// 모두 순수 함수로, 동시성 조정은 engine 모듈이 담당한다.
pub mod anti_snipe;
pub mod error;
pub mod model;
pub mod resolver;
pub mod validator;

// region:    --- Bid Attempt

/// 입찰 시도: 수동 입찰, 수동 + 자동 상한, 자동 상한만(상한 설정) 세 가지 형태
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BidAttempt {
    pub bidder_id: i64,
    /// 수동 입찰 금액 (자동 입찰 상한만 설정하는 경우 None)
    pub amount: Option<i64>,
    /// 자동 입찰 상한
    pub proxy_max: Option<i64>,
}

impl BidAttempt {
    /// 수동 입찰
    pub fn manual(bidder_id: i64, amount: i64) -> Self {
        Self {
            bidder_id,
            amount: Some(amount),
            proxy_max: None,
        }
    }

    /// 수동 입찰 + 자동 입찰 상한
    pub fn with_proxy(bidder_id: i64, amount: i64, proxy_max: i64) -> Self {
        Self {
            bidder_id,
            amount: Some(amount),
            proxy_max: Some(proxy_max),
        }
    }

    /// 자동 입찰 상한 설정 (금액 변동 없는 입찰 시도로 취급)
    pub fn proxy_only(bidder_id: i64, proxy_max: i64) -> Self {
        Self {
            bidder_id,
            amount: None,
            proxy_max: Some(proxy_max),
        }
    }

    /// 이 시도의 유효 상한: 자동 입찰 상한이 없으면 수동 금액 자체
    pub fn ceiling(&self) -> i64 {
        self.proxy_max.or(self.amount).unwrap_or(0)
    }
}

// endregion: --- Bid Attempt
