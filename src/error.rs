// region:    --- Imports
use crate::auction::model::AuctionStatus;
use thiserror::Error;

// endregion: --- Imports

// region:    --- Auction Error
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// 경매 저장소 및 도메인 오류
#[derive(Debug, Error)]
pub enum AuctionError {
    #[error("auction not found: {0}")]
    NotFound(String),

    #[error("storage error: {message}")]
    Storage {
        message: String,
        #[source]
        source: Option<BoxError>,
    },

    #[error("invalid auction: {0}")]
    Validation(String),

    #[error("invalid status transition for auction {id}: {from} -> {to}")]
    InvalidTransition {
        id: String,
        from: AuctionStatus,
        to: AuctionStatus,
    },
}

impl AuctionError {
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage {
            message: message.into(),
            source: None,
        }
    }

    /// 에러 응답에 사용하는 코드
    pub fn code(&self) -> &'static str {
        match self {
            Self::NotFound(_) => "NOT_FOUND",
            Self::Storage { .. } => "STORAGE_ERROR",
            Self::Validation(_) => "BAD_REQUEST",
            Self::InvalidTransition { .. } => "INVALID_STATUS",
        }
    }
}

impl From<sqlx::Error> for AuctionError {
    fn from(e: sqlx::Error) -> Self {
        Self::Storage {
            message: e.to_string(),
            source: Some(Box::new(e)),
        }
    }
}
// endregion: --- Auction Error
