// region:    --- Imports
use crate::auction::model::{Auction, ProductCondition};
use crate::error::AuctionError;
use crate::repository::{AuctionRepository, AuctionStore};
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tracing::{error, info};

// endregion: --- Imports

// region:    --- Router
/// 경매 API 라우터
pub fn router<S: AuctionStore + 'static>(repository: Arc<AuctionRepository<S>>) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/auction", post(handle_create_auction::<S>))
        .route("/auction/:id", get(handle_get_auction::<S>))
        .route("/auction/:id/close", post(handle_close_auction::<S>))
        .layer(cors)
        .with_state(repository)
}
// endregion: --- Router

// region:    --- Error Response
impl IntoResponse for AuctionError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuctionError::NotFound(_) => StatusCode::NOT_FOUND,
            AuctionError::Validation(_) => StatusCode::BAD_REQUEST,
            AuctionError::InvalidTransition { .. } => StatusCode::CONFLICT,
            AuctionError::Storage { .. } => {
                error!("{:<12} --> 저장소 오류: {:?}", "Handler", self);
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };
        (
            status,
            Json(serde_json::json!({
                "error": self.to_string(),
                "code": self.code()
            })),
        )
            .into_response()
    }
}
// endregion: --- Error Response

// region:    --- Command Handlers
/// 경매 생성 요청
#[derive(Debug, Deserialize)]
pub struct CreateAuctionRequest {
    pub product_name: String,
    pub category: String,
    pub description: String,
    pub condition: ProductCondition,
}

/// 경매 생성
pub async fn handle_create_auction<S: AuctionStore + 'static>(
    State(repository): State<Arc<AuctionRepository<S>>>,
    Json(req): Json<CreateAuctionRequest>,
) -> Result<impl IntoResponse, AuctionError> {
    info!("{:<12} --> 경매 생성 요청: {:?}", "Command", req);
    let auction = Auction::create(
        req.product_name,
        req.category,
        req.description,
        req.condition,
    )?;
    repository.create_auction(&auction).await?;
    Ok((StatusCode::CREATED, Json(auction)))
}

/// 경매 종료
pub async fn handle_close_auction<S: AuctionStore + 'static>(
    State(repository): State<Arc<AuctionRepository<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Auction>, AuctionError> {
    info!("{:<12} --> 경매 종료 요청 id: {}", "Command", id);
    repository.close_auction(&id).await?;
    Ok(Json(repository.find_auction_by_id(&id).await?))
}

// endregion: --- Command Handlers

// region:    --- Query Handlers
/// 경매 조회
pub async fn handle_get_auction<S: AuctionStore + 'static>(
    State(repository): State<Arc<AuctionRepository<S>>>,
    Path(id): Path<String>,
) -> Result<Json<Auction>, AuctionError> {
    info!("{:<12} --> 경매 조회 id: {}", "HandlerQuery", id);
    Ok(Json(repository.find_auction_by_id(&id).await?))
}
// endregion: --- Query Handlers
