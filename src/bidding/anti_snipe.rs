/// 스나이핑 방지 연장기 (순수 함수)
/// 마감 임박 입찰이 들어오면 마감 시각을 now + extension으로 민다.
/// 반복 연장에 상한을 두지 않는 것은 의도된 정책이다. 지속 경합 시
/// 입찰마다 온전한 연장이 새로 주어진다.
// region:    --- Imports
use chrono::{DateTime, Duration, Utc};

// endregion: --- Imports

// region:    --- Anti-Snipe

/// 경매별 연장 정책. 기본값: 임계 60초, 연장 120초.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AntiSnipePolicy {
    pub threshold: Duration,
    pub extension: Duration,
}

impl Default for AntiSnipePolicy {
    fn default() -> Self {
        Self {
            threshold: Duration::seconds(60),
            extension: Duration::seconds(120),
        }
    }
}

/// 연장 판정 결과
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extension {
    pub new_end_time: DateTime<Utc>,
    pub triggered: bool,
}

/// 남은 시간이 임계 이하면 now + extension으로 연장한다.
/// 마감은 앞으로만 움직인다. 절대 당겨지지 않는다.
pub fn extend(end_time: DateTime<Utc>, now: DateTime<Utc>, policy: &AntiSnipePolicy) -> Extension {
    if end_time - now <= policy.threshold {
        Extension {
            new_end_time: (now + policy.extension).max(end_time),
            triggered: true,
        }
    } else {
        Extension {
            new_end_time: end_time,
            triggered: false,
        }
    }
}

// endregion: --- Anti-Snipe

// region:    --- Tests

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 1, 12, 0, 0).unwrap()
    }

    #[test]
    fn bid_inside_threshold_extends_to_now_plus_extension() {
        let end = now() + Duration::seconds(30);
        let ext = extend(end, now(), &AntiSnipePolicy::default());
        assert!(ext.triggered);
        assert_eq!(ext.new_end_time, now() + Duration::seconds(120));
    }

    #[test]
    fn bid_outside_threshold_leaves_end_time_unchanged() {
        let end = now() + Duration::seconds(90);
        let ext = extend(end, now(), &AntiSnipePolicy::default());
        assert!(!ext.triggered);
        assert_eq!(ext.new_end_time, end);
    }

    #[test]
    fn extension_never_moves_the_end_time_backward() {
        // 연장폭이 임계보다 짧게 설정되어도 마감은 당겨지지 않는다
        let policy = AntiSnipePolicy {
            threshold: Duration::seconds(300),
            extension: Duration::seconds(60),
        };
        let end = now() + Duration::seconds(200);
        let ext = extend(end, now(), &policy);
        assert!(ext.triggered);
        assert_eq!(ext.new_end_time, end);
    }

    #[test]
    fn repeated_snipes_each_get_a_fresh_extension() {
        let policy = AntiSnipePolicy::default();
        let mut end = now() + Duration::seconds(30);
        let mut t = now();
        for _ in 0..5 {
            let ext = extend(end, t, &policy);
            assert!(ext.triggered);
            assert!(ext.new_end_time >= end);
            end = ext.new_end_time;
            // 다음 스나이핑은 새 마감 10초 전
            t = end - Duration::seconds(10);
        }
        assert_eq!(end, t + Duration::seconds(10));
    }
}

// endregion: --- Tests
