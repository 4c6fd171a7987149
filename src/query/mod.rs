/// 읽기 전용 조회 경로
/// 엔진을 거치지 않고 현재 스냅샷을 그대로 읽는다. 쓰기와 경합하지 않는다.
pub mod handlers;
pub mod queries;
