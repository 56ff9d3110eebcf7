/// 경매 저장소
/// 저장소 생성 시 경매 자동 종료 스케줄러가 한 번만 시작되고, shutdown 으로 중지된다.
// region:    --- Imports
use crate::auction::model::{Auction, AuctionStatus};
use crate::config::resolve_auction_interval;
use crate::error::AuctionError;
use crate::scheduler::{AuctionScheduler, SchedulerHandle, SchedulerState, DEFAULT_CHECK_CADENCE};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

// endregion: --- Imports

// region:    --- Modules
pub mod memory;
pub mod postgres;
mod queries;

pub use memory::InMemoryAuctionStore;
pub use postgres::PostgresAuctionStore;

// endregion: --- Modules

// region:    --- Auction Store Trait
/// 경매 저장소 트레이트
/// 포그라운드 요청과 스케줄러가 동시에 호출하므로 레코드 단위 원자성을 보장해야 한다.
#[async_trait]
pub trait AuctionStore: Send + Sync {
    /// 경매 저장. 중복 id 는 Storage 오류
    async fn create(&self, auction: &Auction) -> Result<(), AuctionError>;

    async fn find_by_id(&self, id: &str) -> Result<Auction, AuctionError>;

    /// status = ACTIVE 이고 생성 시각이 cutoff 이하인 경매 조회 (순서 없음)
    async fn find_active_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Auction>, AuctionError>;

    /// 버전 검사 없이 상태 변경. COMPLETED -> ACTIVE 는 InvalidTransition
    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<(), AuctionError>;
}
// endregion: --- Auction Store Trait

// region:    --- Auction Repository
/// 경매 저장소 핸들. 스케줄러 태스크를 소유한다.
pub struct AuctionRepository<S> {
    store: Arc<S>,
    auction_interval: Duration,
    check_cadence: Duration,
    scheduler: SchedulerHandle,
}

impl<S: AuctionStore + 'static> AuctionRepository<S> {
    /// 저장소 생성 및 스케줄러 시작. tokio 런타임 안에서 호출해야 한다.
    pub fn new(store: Arc<S>, auction_interval: Duration) -> Self {
        Self::with_check_cadence(store, auction_interval, DEFAULT_CHECK_CADENCE)
    }

    /// AUCTION_INTERVAL 환경 변수로 유지 시간을 정하여 생성
    pub fn from_env(store: Arc<S>) -> Self {
        Self::new(store, resolve_auction_interval())
    }

    pub fn with_check_cadence(
        store: Arc<S>,
        auction_interval: Duration,
        check_cadence: Duration,
    ) -> Self {
        let repository = Self {
            store,
            auction_interval,
            check_cadence,
            scheduler: SchedulerHandle::new(),
        };
        repository.start_closer();
        repository
    }

    /// 자동 종료 스케줄러 시작. 저장소당 한 번만 시작되며 이후 호출은 false
    pub fn start_closer(&self) -> bool {
        self.scheduler.start(AuctionScheduler::new(
            Arc::clone(&self.store),
            self.auction_interval,
            self.check_cadence,
        ))
    }

    pub async fn create_auction(&self, auction: &Auction) -> Result<(), AuctionError> {
        info!("{:<12} --> 경매 생성 id: {}", "Repository", auction.id);
        self.store.create(auction).await
    }

    pub async fn find_auction_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
        self.store.find_by_id(id).await
    }

    /// 사용자 요청에 의한 경매 종료
    pub async fn close_auction(&self, id: &str) -> Result<(), AuctionError> {
        info!("{:<12} --> 경매 종료 요청 id: {}", "Repository", id);
        self.store.update_status(id, AuctionStatus::Completed).await
    }

    pub fn auction_interval(&self) -> Duration {
        self.auction_interval
    }

    pub fn scheduler_state(&self) -> SchedulerState {
        self.scheduler.state()
    }

    /// 스케줄러 중지. 저장소 연결은 닫지 않는다.
    pub fn shutdown(&self) {
        self.scheduler.shutdown();
    }

    pub async fn wait_stopped(&self) {
        self.scheduler.wait_stopped().await;
    }
}
// endregion: --- Auction Repository
