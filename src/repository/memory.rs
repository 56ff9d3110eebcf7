// region:    --- Imports
use super::AuctionStore;
use crate::auction::model::{Auction, AuctionStatus};
use crate::error::AuctionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tokio::sync::RwLock;

// endregion: --- Imports

// region:    --- In Memory Store
/// 메모리 기반 경매 저장소 (테스트 및 로컬 실행용)
#[derive(Debug, Default)]
pub struct InMemoryAuctionStore {
    auctions: RwLock<HashMap<String, Auction>>,
}

impl InMemoryAuctionStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.auctions.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.auctions.read().await.is_empty()
    }
}

#[async_trait]
impl AuctionStore for InMemoryAuctionStore {
    async fn create(&self, auction: &Auction) -> Result<(), AuctionError> {
        let mut auctions = self.auctions.write().await;
        if auctions.contains_key(&auction.id) {
            return Err(AuctionError::storage(format!(
                "duplicate key: auction {} already exists",
                auction.id
            )));
        }
        auctions.insert(auction.id.clone(), auction.clone());
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
        self.auctions
            .read()
            .await
            .get(id)
            .cloned()
            .ok_or_else(|| AuctionError::NotFound(id.to_string()))
    }

    async fn find_active_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Auction>, AuctionError> {
        Ok(self
            .auctions
            .read()
            .await
            .values()
            .filter(|a| a.status == AuctionStatus::Active && a.timestamp <= cutoff)
            .cloned()
            .collect())
    }

    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<(), AuctionError> {
        let mut auctions = self.auctions.write().await;
        let auction = auctions
            .get_mut(id)
            .ok_or_else(|| AuctionError::NotFound(id.to_string()))?;
        if !auction.status.can_transition_to(status) {
            return Err(AuctionError::InvalidTransition {
                id: id.to_string(),
                from: auction.status,
                to: status,
            });
        }
        auction.status = status;
        Ok(())
    }
}
// endregion: --- In Memory Store
