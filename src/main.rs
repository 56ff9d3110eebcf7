// region:    --- Imports
use auction_lifecycle::config::AppConfig;
use auction_lifecycle::database::DatabaseManager;
use auction_lifecycle::handlers;
use auction_lifecycle::repository::{AuctionRepository, PostgresAuctionStore};
use std::sync::Arc;
use tokio::net::TcpListener;
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

    // 설정 로드
    let config = AppConfig::from_env().map_err(|e| {
        error!("{:<12} --> 설정 로드 실패: {}", "Main", e);
        e
    })?;

    // DatabaseManager 생성 및 스키마 초기화
    let db_manager = Arc::new(DatabaseManager::new(&config).await?);
    if let Err(e) = db_manager.initialize_database().await {
        error!("{:<12} --> 데이터베이스 초기화 실패: {:?}", "Main", e);
        return Err(e.into());
    }
    info!("{:<12} --> 데이터베이스 초기화 성공", "Main");

    // 경매 저장소 생성 (자동 종료 스케줄러 시작)
    let store = Arc::new(PostgresAuctionStore::new(Arc::clone(&db_manager)));
    let repository = Arc::new(AuctionRepository::new(store, config.auction_interval));
    info!(
        "{:<12} --> 경매 유지 시간: {:?}",
        "Main",
        repository.auction_interval()
    );

    let routes_all = handlers::router(Arc::clone(&repository));

    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "{:<12} --> Web Server: Listening on {}",
        "Main",
        listener.local_addr()?
    );

    // 서버 실행 (Ctrl+C 시 종료)
    if let Err(err) = axum::serve(listener, routes_all.into_make_service())
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!("{:<12} --> 종료 신호 대기 실패: {}", "Main", e);
            }
        })
        .await
    {
        error!("{:<12} --> Server error: {}", "Main", err);
    }

    repository.shutdown();
    repository.wait_stopped().await;
    info!("{:<12} --> 서버 종료", "Main");
    Ok(())
}
// endregion: --- Main
