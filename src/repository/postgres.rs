// region:    --- Imports
use super::{queries, AuctionStore};
use crate::auction::model::{Auction, AuctionStatus, ProductCondition};
use crate::database::DatabaseManager;
use crate::error::AuctionError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::error;

// endregion: --- Imports

// region:    --- Auction Row
/// auctions 테이블 레코드. 생성 시각은 epoch 초로 저장한다.
#[derive(Debug, sqlx::FromRow)]
struct AuctionRow {
    id: String,
    product_name: String,
    category: String,
    description: String,
    condition: i16,
    status: i16,
    timestamp: i64,
}

impl TryFrom<AuctionRow> for Auction {
    type Error = AuctionError;

    fn try_from(row: AuctionRow) -> Result<Self, Self::Error> {
        let timestamp = DateTime::<Utc>::from_timestamp(row.timestamp, 0).ok_or_else(|| {
            AuctionError::storage(format!("invalid timestamp for auction {}", row.id))
        })?;
        let condition = ProductCondition::from_code(row.condition)
            .map_err(|e| AuctionError::storage(e.to_string()))?;
        Ok(Self {
            status: AuctionStatus::from_code(row.status)?,
            condition,
            timestamp,
            id: row.id,
            product_name: row.product_name,
            category: row.category,
            description: row.description,
        })
    }
}
// endregion: --- Auction Row

// region:    --- Postgres Store
/// PostgreSQL 경매 저장소
pub struct PostgresAuctionStore {
    db_manager: Arc<DatabaseManager>,
}

impl PostgresAuctionStore {
    pub fn new(db_manager: Arc<DatabaseManager>) -> Self {
        Self { db_manager }
    }
}

#[async_trait]
impl AuctionStore for PostgresAuctionStore {
    async fn create(&self, auction: &Auction) -> Result<(), AuctionError> {
        sqlx::query(queries::INSERT_AUCTION)
            .bind(&auction.id)
            .bind(&auction.product_name)
            .bind(&auction.category)
            .bind(&auction.description)
            .bind(auction.condition.code())
            .bind(auction.status.code())
            .bind(auction.timestamp.timestamp())
            .execute(self.db_manager.pool())
            .await
            .map_err(|e| {
                error!("{:<12} --> 경매 저장 실패: {:?}", "Postgres", e);
                AuctionError::from(e)
            })?;
        Ok(())
    }

    async fn find_by_id(&self, id: &str) -> Result<Auction, AuctionError> {
        sqlx::query_as::<_, AuctionRow>(queries::GET_AUCTION)
            .bind(id)
            .fetch_optional(self.db_manager.pool())
            .await?
            .ok_or_else(|| AuctionError::NotFound(id.to_string()))?
            .try_into()
    }

    async fn find_active_older_than(
        &self,
        cutoff: DateTime<Utc>,
    ) -> Result<Vec<Auction>, AuctionError> {
        sqlx::query_as::<_, AuctionRow>(queries::GET_ACTIVE_AUCTIONS_OLDER_THAN)
            .bind(AuctionStatus::Active.code())
            .bind(cutoff.timestamp())
            .fetch_all(self.db_manager.pool())
            .await?
            .into_iter()
            .map(Auction::try_from)
            .collect()
    }

    async fn update_status(&self, id: &str, status: AuctionStatus) -> Result<(), AuctionError> {
        let id = id.to_string();
        self.db_manager
            .transaction(move |tx| {
                Box::pin(async move {
                    let current = sqlx::query_scalar::<_, i16>(queries::GET_AUCTION_STATUS_FOR_UPDATE)
                        .bind(&id)
                        .fetch_optional(&mut **tx)
                        .await?
                        .ok_or_else(|| AuctionError::NotFound(id.clone()))?;
                    let current = AuctionStatus::from_code(current)?;

                    if !current.can_transition_to(status) {
                        return Err(AuctionError::InvalidTransition {
                            id,
                            from: current,
                            to: status,
                        });
                    }
                    if current != status {
                        sqlx::query(queries::UPDATE_AUCTION_STATUS)
                            .bind(status.code())
                            .bind(&id)
                            .execute(&mut **tx)
                            .await?;
                    }
                    Ok(())
                })
            })
            .await
    }
}
// endregion: --- Postgres Store
