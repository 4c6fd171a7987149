// region:    --- Imports
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use bidding_service::clock::SystemClock;
use bidding_service::database::DatabaseManager;
use bidding_service::engine::BidEngine;
use bidding_service::handlers;
use bidding_service::message_broker::{
    KafkaEventPublisher, KafkaManager, KafkaNotificationDispatcher, EVENTS_TOPIC,
    NOTIFICATIONS_TOPIC,
};
use bidding_service::scheduler::LifecycleScheduler;
use bidding_service::store::postgres::PostgresItemStore;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Main
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // logging 초기화
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .without_time()
        .with_target(false)
        .init();

    // DatabaseManager 생성
    let db_manager = Arc::new(DatabaseManager::new().await);

    // 데이터베이스 초기화
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // Kafka 매니저 생성 및 토픽 생성
    let kafka_manager = Arc::new(KafkaManager::new());
    kafka_manager.create_topic(EVENTS_TOPIC, 5, 1).await?;
    kafka_manager.create_topic(NOTIFICATIONS_TOPIC, 5, 1).await?;
    info!("{:<12} --> Kafka 초기화 성공", "Main");

    // 입찰 엔진 조립
    let clock = Arc::new(SystemClock);
    let events = Arc::new(KafkaEventPublisher::new(kafka_manager.get_producer()));
    let notifier = Arc::new(KafkaNotificationDispatcher::new(
        kafka_manager.get_producer(),
    ));
    let store = Arc::new(PostgresItemStore::new(Arc::clone(&db_manager)));
    let engine = Arc::new(BidEngine::new(
        store,
        clock.clone(),
        events.clone(),
        notifier.clone(),
    ));

    // 생애주기 스케줄러 시작
    let scheduler = Arc::new(LifecycleScheduler::new(
        db_manager.get_pool(),
        clock,
        events,
        notifier,
    ));
    scheduler.start().await;

    // 테스트 페이지를 위한 cors 설정
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    // 라우터 설정
    let routes_all = Router::new()
        .route("/bid", post(handlers::handle_bid))
        .route("/proxy-bid", post(handlers::handle_proxy_bid))
        .route("/items", get(handlers::handle_get_items))
        .route("/items/:id", get(handlers::handle_get_item))
        .route("/items/:id/bids", get(handlers::handle_get_item_bids))
        .route(
            "/items/:id/proxy-bids",
            get(handlers::handle_get_item_proxy_bids),
        )
        .route("/auctions/:id", get(handlers::handle_get_auction))
        .route("/auctions/:id/open", post(handlers::handle_open_auction))
        .layer(cors)
        .layer(DefaultBodyLimit::max(1024 * 1024 * 20)) // 동시성을 위한 바디 사이즈 증가(20MB)
        .with_state((engine, db_manager));

    // 리스너 생성(로컬 호스트의 3000번 포트를 사용)
    let listener = TcpListener::bind("0.0.0.0:3000").await.unwrap();
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr().unwrap()
    );

    // 서버 실행
    if let Err(err) = axum::serve(listener, routes_all.into_make_service()).await {
        error!("{:<12} --> Server error: {}", "Main", err);
    }
    Ok(())
}
// endregion: --- Main
