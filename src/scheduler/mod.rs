/// 경매 자동 종료 스케줄러
/// 일정 주기(check cadence)마다 유지 시간이 지난 ACTIVE 경매를 찾아 COMPLETED로 변경한다.
/// 저장소 오류는 해당 주기(또는 해당 경매)에만 영향을 주며, 스케줄러는 취소 신호로만 종료된다.
// region:    --- Imports
use crate::auction::model::AuctionStatus;
use crate::repository::AuctionStore;
use chrono::{DateTime, SubsecRound, Utc};
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::Arc;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

// endregion: --- Imports

/// 만료 검사 주기
pub const DEFAULT_CHECK_CADENCE: Duration = Duration::from_secs(10);

// region:    --- Expiry Cutoff
/// 종료 대상 기준 시각 계산 (now - auction_interval)
/// 생성 시각과 같은 초 단위로 절삭한다.
pub fn expiry_cutoff(now: DateTime<Utc>, auction_interval: Duration) -> DateTime<Utc> {
    let lifetime = chrono::Duration::from_std(auction_interval).unwrap_or(chrono::Duration::MAX);
    now.checked_sub_signed(lifetime)
        .map(|cutoff| cutoff.trunc_subsecs(0))
        .unwrap_or(DateTime::<Utc>::MIN_UTC)
}
// endregion: --- Expiry Cutoff

// region:    --- Auction Scheduler
/// 한 번의 검사 결과
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct CloseReport {
    pub candidates: usize,
    pub closed: usize,
    pub failed: usize,
}

/// 경매 상태 업데이트 스케줄러
pub struct AuctionScheduler<S> {
    store: Arc<S>,
    auction_interval: Duration,
    check_cadence: Duration,
}

impl<S: AuctionStore + 'static> AuctionScheduler<S> {
    pub fn new(store: Arc<S>, auction_interval: Duration, check_cadence: Duration) -> Self {
        Self {
            store,
            auction_interval,
            check_cadence,
        }
    }

    /// 취소될 때까지 주기적으로 만료된 경매를 종료
    pub async fn run(self, token: CancellationToken) {
        let mut ticker = interval_at(Instant::now() + self.check_cadence, self.check_cadence);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        info!(
            "{:<12} --> 경매 종료 스케줄러 시작 (interval: {:?}, cadence: {:?})",
            "Scheduler", self.auction_interval, self.check_cadence
        );

        loop {
            tokio::select! {
                _ = token.cancelled() => {
                    info!("{:<12} --> 경매 종료 스케줄러 중지", "Scheduler");
                    return;
                }
                _ = ticker.tick() => {
                    self.close_expired_auctions().await;
                }
            }
        }
    }

    /// 현재 시각 기준으로 만료된 경매 종료
    pub async fn close_expired_auctions(&self) -> CloseReport {
        self.close_expired_auctions_at(Utc::now()).await
    }

    /// 주어진 시각 기준으로 만료된 경매 종료
    pub async fn close_expired_auctions_at(&self, now: DateTime<Utc>) -> CloseReport {
        let cutoff = expiry_cutoff(now, self.auction_interval);

        let expired = match self.store.find_active_older_than(cutoff).await {
            Ok(expired) => expired,
            Err(e) => {
                error!(
                    "{:<12} --> 만료된 경매 조회 중 오류 발생: {:?}",
                    "Scheduler", e
                );
                return CloseReport::default();
            }
        };

        let mut report = CloseReport {
            candidates: expired.len(),
            ..CloseReport::default()
        };

        for auction in expired {
            match self
                .store
                .update_status(&auction.id, AuctionStatus::Completed)
                .await
            {
                Ok(()) => {
                    report.closed += 1;
                    info!(
                        "{:<12} --> 경매 자동 종료: {} - {}",
                        "Scheduler", auction.id, auction.product_name
                    );
                }
                Err(e) => {
                    report.failed += 1;
                    error!(
                        "{:<12} --> 경매 종료 중 오류 발생 id: {}: {:?}",
                        "Scheduler", auction.id, e
                    );
                }
            }
        }

        debug!("{:<12} --> 만료 검사 완료: {:?}", "Scheduler", report);
        report
    }
}
// endregion: --- Auction Scheduler

// region:    --- Scheduler Handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchedulerState {
    NotStarted,
    Running,
    Stopped,
}

impl SchedulerState {
    fn as_u8(self) -> u8 {
        match self {
            Self::NotStarted => 0,
            Self::Running => 1,
            Self::Stopped => 2,
        }
    }

    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::NotStarted,
            1 => Self::Running,
            _ => Self::Stopped,
        }
    }
}

/// 스케줄러 태스크 소유 핸들
/// NotStarted -> Running 전이는 한 번만 일어나며, Stopped 이후 재시작할 수 없다.
/// 핸들이 drop 되면 스케줄러도 취소된다.
pub struct SchedulerHandle {
    state: Arc<AtomicU8>,
    token: CancellationToken,
    stopped: CancellationToken,
}

impl SchedulerHandle {
    pub fn new() -> Self {
        Self {
            state: Arc::new(AtomicU8::new(SchedulerState::NotStarted.as_u8())),
            token: CancellationToken::new(),
            stopped: CancellationToken::new(),
        }
    }

    pub fn state(&self) -> SchedulerState {
        SchedulerState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// 스케줄러 시작. 이미 시작되었거나 중지된 경우 false를 반환한다.
    /// tokio 런타임 안에서 호출해야 한다.
    pub fn start<S: AuctionStore + 'static>(&self, scheduler: AuctionScheduler<S>) -> bool {
        if self
            .state
            .compare_exchange(
                SchedulerState::NotStarted.as_u8(),
                SchedulerState::Running.as_u8(),
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .is_err()
        {
            warn!(
                "{:<12} --> 스케줄러가 이미 시작되었습니다 (state: {:?})",
                "Scheduler",
                self.state()
            );
            return false;
        }

        let state = Arc::clone(&self.state);
        let token = self.token.clone();
        // 태스크가 끝나면 (panic 포함) 모든 대기자에게 알린다
        let stopped = self.stopped.clone().drop_guard();
        tokio::spawn(async move {
            let _stopped = stopped;
            scheduler.run(token).await;
            state.store(SchedulerState::Stopped.as_u8(), Ordering::Release);
        });
        true
    }

    /// 취소 신호 전송. 진행 중인 검사는 중단하지 않는다.
    pub fn shutdown(&self) {
        self.token.cancel();
    }

    /// 스케줄러 태스크가 종료될 때까지 대기. 여러 곳에서 동시에 호출할 수 있다.
    pub async fn wait_stopped(&self) {
        if self.state() == SchedulerState::NotStarted {
            return;
        }
        self.stopped.cancelled().await;
        if self.state() != SchedulerState::Stopped {
            error!("{:<12} --> 스케줄러 태스크 비정상 종료", "Scheduler");
            self.state
                .store(SchedulerState::Stopped.as_u8(), Ordering::Release);
        }
    }
}

impl Default for SchedulerHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for SchedulerHandle {
    fn drop(&mut self) {
        self.token.cancel();
    }
}
// endregion: --- Scheduler Handle

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auction::model::{Auction, ProductCondition};
    use crate::error::AuctionError;
    use crate::repository::memory::InMemoryAuctionStore;
    use async_trait::async_trait;
    use std::collections::HashSet;
    use std::sync::atomic::AtomicUsize;

    fn test_auction(name: &str, created_secs_ago: i64, now: DateTime<Utc>) -> Auction {
        let mut auction = Auction::create(
            name,
            "Electronics",
            "Scheduler test auction description",
            ProductCondition::New,
        )
        .unwrap();
        auction.timestamp = (now - chrono::Duration::seconds(created_secs_ago)).trunc_subsecs(0);
        auction
    }

    /// 특정 경매의 상태 변경 또는 조회를 실패시키는 저장소
    struct FlakyStore {
        inner: InMemoryAuctionStore,
        failing_ids: HashSet<String>,
        failing_queries: AtomicUsize,
    }

    #[async_trait]
    impl AuctionStore for FlakyStore {
        async fn create(&self, auction: &Auction) -> Result<(), AuctionError> {
            self.inner.create(auction).await
        }

        async fn find_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
            self.inner.find_by_id(id).await
        }

        async fn find_active_older_than(
            &self,
            cutoff: DateTime<Utc>,
        ) -> Result<Vec<Auction>, AuctionError> {
            let remaining = self.failing_queries.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failing_queries.store(remaining - 1, Ordering::SeqCst);
                return Err(AuctionError::storage("connection refused"));
            }
            self.inner.find_active_older_than(cutoff).await
        }

        async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<(), AuctionError> {
            if self.failing_ids.contains(id) {
                return Err(AuctionError::storage("write failed"));
            }
            self.inner.update_status(id, status).await
        }
    }

    #[test]
    fn cutoff_truncates_to_whole_seconds() {
        let now = DateTime::<Utc>::from_timestamp(1_000, 700_000_000).unwrap();
        let cutoff = expiry_cutoff(now, Duration::from_secs(2));
        assert_eq!(cutoff.timestamp(), 998);
        assert_eq!(cutoff.timestamp_subsec_nanos(), 0);
    }

    #[tokio::test]
    async fn every_waiter_sees_the_scheduler_stopped() {
        let store = Arc::new(InMemoryAuctionStore::new());
        let handle = SchedulerHandle::new();

        // 시작 전에는 바로 반환
        handle.wait_stopped().await;
        assert_eq!(handle.state(), SchedulerState::NotStarted);

        assert!(handle.start(AuctionScheduler::new(
            store,
            Duration::from_secs(60),
            Duration::from_millis(50),
        )));
        handle.shutdown();

        let waiter = || async {
            handle.wait_stopped().await;
            handle.state()
        };
        let (first, second, third) = tokio::join!(waiter(), waiter(), waiter());

        assert_eq!(first, SchedulerState::Stopped);
        assert_eq!(second, SchedulerState::Stopped);
        assert_eq!(third, SchedulerState::Stopped);
    }

    #[tokio::test]
    async fn auction_is_closed_exactly_at_its_expiry_second() {
        let store = Arc::new(InMemoryAuctionStore::new());
        let mut auction = test_auction("Boundary", 0, Utc::now());
        auction.timestamp = DateTime::<Utc>::from_timestamp(1_000, 0).unwrap();
        store.create(&auction).await.unwrap();

        let scheduler = AuctionScheduler::new(
            Arc::clone(&store),
            Duration::from_secs(2),
            DEFAULT_CHECK_CADENCE,
        );

        let before = DateTime::<Utc>::from_timestamp(1_001, 999_000_000).unwrap();
        assert_eq!(scheduler.close_expired_auctions_at(before).await.candidates, 0);
        assert_eq!(
            store.find_by_id(&auction.id).await.unwrap().status,
            AuctionStatus::Active
        );

        let at_expiry = DateTime::<Utc>::from_timestamp(1_002, 0).unwrap();
        let report = scheduler.close_expired_auctions_at(at_expiry).await;
        assert_eq!(report.closed, 1);
        assert_eq!(
            store.find_by_id(&auction.id).await.unwrap().status,
            AuctionStatus::Completed
        );
    }

    #[test]
    fn cutoff_saturates_for_huge_intervals() {
        let cutoff = expiry_cutoff(Utc::now(), Duration::from_secs(u64::MAX));
        assert_eq!(cutoff, DateTime::<Utc>::MIN_UTC);
    }

    #[tokio::test]
    async fn closes_only_expired_active_auctions() {
        let now = Utc::now();
        let store = Arc::new(InMemoryAuctionStore::new());
        let expired = test_auction("Expired", 60, now);
        let fresh = test_auction("Fresh", 5, now);
        store.create(&expired).await.unwrap();
        store.create(&fresh).await.unwrap();

        let scheduler = AuctionScheduler::new(
            Arc::clone(&store),
            Duration::from_secs(30),
            DEFAULT_CHECK_CADENCE,
        );
        let report = scheduler.close_expired_auctions_at(now).await;

        assert_eq!(
            report,
            CloseReport {
                candidates: 1,
                closed: 1,
                failed: 0
            }
        );
        assert_eq!(
            store.find_by_id(&expired.id).await.unwrap().status,
            AuctionStatus::Completed
        );
        assert_eq!(
            store.find_by_id(&fresh.id).await.unwrap().status,
            AuctionStatus::Active
        );
    }

    #[tokio::test]
    async fn one_failing_update_does_not_abort_the_batch() {
        let now = Utc::now();
        let auctions: Vec<Auction> = (0..4)
            .map(|i| test_auction(&format!("Batch {}", i), 120, now))
            .collect();

        let inner = InMemoryAuctionStore::new();
        for auction in &auctions {
            inner.create(auction).await.unwrap();
        }
        let store = Arc::new(FlakyStore {
            inner,
            failing_ids: HashSet::from([auctions[1].id.clone()]),
            failing_queries: AtomicUsize::new(0),
        });

        let scheduler = AuctionScheduler::new(
            Arc::clone(&store),
            Duration::from_secs(60),
            DEFAULT_CHECK_CADENCE,
        );
        let report = scheduler.close_expired_auctions_at(now).await;

        assert_eq!(report.candidates, 4);
        assert_eq!(report.closed, 3);
        assert_eq!(report.failed, 1);
        for (i, auction) in auctions.iter().enumerate() {
            let status = store.find_by_id(&auction.id).await.unwrap().status;
            if i == 1 {
                assert_eq!(status, AuctionStatus::Active);
            } else {
                assert_eq!(status, AuctionStatus::Completed);
            }
        }
    }

    #[tokio::test]
    async fn failed_scan_is_retried_on_the_next_tick() {
        let now = Utc::now();
        let inner = InMemoryAuctionStore::new();
        let auction = test_auction("Retry", 120, now);
        inner.create(&auction).await.unwrap();
        let store = Arc::new(FlakyStore {
            inner,
            failing_ids: HashSet::new(),
            failing_queries: AtomicUsize::new(1),
        });

        let scheduler = AuctionScheduler::new(
            Arc::clone(&store),
            Duration::from_secs(60),
            DEFAULT_CHECK_CADENCE,
        );

        assert_eq!(
            scheduler.close_expired_auctions_at(now).await,
            CloseReport::default()
        );
        assert_eq!(
            store.find_by_id(&auction.id).await.unwrap().status,
            AuctionStatus::Active
        );

        let report = scheduler.close_expired_auctions_at(now).await;
        assert_eq!(report.closed, 1);
        assert_eq!(
            store.find_by_id(&auction.id).await.unwrap().status,
            AuctionStatus::Completed
        );
    }

    #[tokio::test]
    async fn handle_starts_once_and_stops_on_shutdown() {
        let store = Arc::new(InMemoryAuctionStore::new());
        let handle = SchedulerHandle::new();
        assert_eq!(handle.state(), SchedulerState::NotStarted);

        let scheduler = |store: &Arc<InMemoryAuctionStore>| {
            AuctionScheduler::new(
                Arc::clone(store),
                Duration::from_secs(60),
                Duration::from_millis(50),
            )
        };

        assert!(handle.start(scheduler(&store)));
        assert_eq!(handle.state(), SchedulerState::Running);
        assert!(!handle.start(scheduler(&store)));

        handle.shutdown();
        handle.wait_stopped().await;
        assert_eq!(handle.state(), SchedulerState::Stopped);

        assert!(!handle.start(scheduler(&store)));
        assert_eq!(handle.state(), SchedulerState::Stopped);
    }
}
