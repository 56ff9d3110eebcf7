// region:    --- Imports
use crate::error::AuctionError;
use chrono::{DateTime, SubsecRound, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

// endregion: --- Imports

// region:    --- Enums
/// 상품 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ProductCondition {
    New,
    Used,
}

impl ProductCondition {
    pub fn code(self) -> i16 {
        match self {
            Self::New => 1,
            Self::Used => 2,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, AuctionError> {
        match code {
            1 => Ok(Self::New),
            2 => Ok(Self::Used),
            other => Err(AuctionError::Validation(format!(
                "unknown product condition code: {}",
                other
            ))),
        }
    }
}

/// 경매 상태 (ACTIVE -> COMPLETED 단방향)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuctionStatus {
    Active,
    Completed,
}

impl AuctionStatus {
    pub fn code(self) -> i16 {
        match self {
            Self::Active => 0,
            Self::Completed => 1,
        }
    }

    pub fn from_code(code: i16) -> Result<Self, AuctionError> {
        match code {
            0 => Ok(Self::Active),
            1 => Ok(Self::Completed),
            other => Err(AuctionError::storage(format!(
                "unknown auction status code: {}",
                other
            ))),
        }
    }

    /// 상태 전이 가능 여부. 완료된 경매는 다시 활성화될 수 없다.
    pub fn can_transition_to(self, next: AuctionStatus) -> bool {
        !matches!((self, next), (Self::Completed, Self::Active))
    }
}

impl fmt::Display for AuctionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Active => write!(f, "ACTIVE"),
            Self::Completed => write!(f, "COMPLETED"),
        }
    }
}
// endregion: --- Enums

// region:    --- Auction Model
/// 경매 모델
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Auction {
    pub id: String,
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
    pub status: AuctionStatus,
    pub timestamp: DateTime<Utc>,
}

impl Auction {
    /// 경매 생성. 상태는 항상 ACTIVE로 시작한다.
    pub fn create(
        product_name: impl Into<String>,
        category: impl Into<String>,
        description: impl Into<String>,
        condition: ProductCondition,
    ) -> Result<Self, AuctionError> {
        let auction = Self {
            id: Uuid::new_v4().to_string(),
            product_name: product_name.into(),
            category: category.into(),
            description: description.into(),
            condition,
            status: AuctionStatus::Active,
            timestamp: Utc::now().trunc_subsecs(0),
        };
        auction.validate()?;
        Ok(auction)
    }

    /// 입력값 검증
    pub fn validate(&self) -> Result<(), AuctionError> {
        if self.product_name.chars().count() <= 1 {
            return Err(AuctionError::Validation(
                "product_name must be longer than 1 character".to_string(),
            ));
        }
        if self.category.chars().count() <= 2 {
            return Err(AuctionError::Validation(
                "category must be longer than 2 characters".to_string(),
            ));
        }
        if self.description.chars().count() <= 10 {
            return Err(AuctionError::Validation(
                "description must be longer than 10 characters".to_string(),
            ));
        }
        Ok(())
    }
}
// endregion: --- Auction Model
