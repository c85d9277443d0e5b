//! HTTP surface for the rating jobs, the inspection report and the recipe feed.
pub mod api_structs;
pub mod error;

use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection, QueryRejection},
        Path, Query, State
    },
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router
};
use subtle::ConstantTimeEq;
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use self::{
    api_structs::{
        CronQuery, CronResponse, DebugResponse, RateRecipeRequest, RateRecipeResponse, RecalculateResponse,
        TopRecipesQuery, TopRecipesResponse
    },
    error::ApiError
};
use crate::{
    database::{db_structs::NewVote, RecipeStore},
    model::{
        inspect::inspect_store,
        structures::{star_rating::StarRating, update_scope::UpdateScope},
        BatchUpdater, RatingParameters
    }
};

const DEFAULT_TOP_LIMIT: i64 = 20;
const MAX_TOP_LIMIT: i64 = 100;

#[derive(Clone)]
pub struct AppState {
    pub store: Arc<dyn RecipeStore>,
    pub params: RatingParameters,
    /// Shared secret the scheduler must present. `None` rejects every
    /// scheduled call.
    pub cron_secret: Option<String>
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/api/cron/update-ratings", get(cron_update_handler))
        .route("/api/ratings/recalculate", post(recalculate_handler))
        .route("/api/ratings/debug", get(debug_handler))
        .route("/api/recipes/top", get(top_recipes_handler))
        .route("/api/recipes/{id}/ratings", post(rate_recipe_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(Arc::new(state))
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "service": "recipe-ratings"
    }))
}

/// Compares in constant time for equal-length inputs
fn is_authorized(expected: Option<&str>, provided: Option<&str>) -> bool {
    match (expected, provided) {
        (Some(expected), Some(provided)) => {
            !expected.is_empty() && bool::from(expected.as_bytes().ct_eq(provided.as_bytes()))
        }
        _ => false
    }
}

async fn cron_update_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<CronQuery>, QueryRejection>
) -> Result<Json<CronResponse>, ApiError> {
    let Query(query) = query?;
    if !is_authorized(state.cron_secret.as_deref(), query.secret.as_deref()) {
        warn!("Rejected scheduled rating update with missing or invalid secret");
        return Err(ApiError::Unauthorized);
    }

    let report = BatchUpdater::new(state.store.clone(), state.params)
        .run(UpdateScope::AllRecipes)
        .await?;

    Ok(Json(CronResponse::from(&report)))
}

async fn recalculate_handler(State(state): State<Arc<AppState>>) -> Result<Json<RecalculateResponse>, ApiError> {
    info!("Manual rating recalculation requested");

    let report = BatchUpdater::new(state.store.clone(), state.params)
        .run(UpdateScope::RatedOnly)
        .await?;

    Ok(Json(RecalculateResponse::from(&report)))
}

async fn debug_handler(State(state): State<Arc<AppState>>) -> Result<Json<DebugResponse>, ApiError> {
    let report = inspect_store(state.store.as_ref(), &state.params).await?;

    Ok(Json(DebugResponse { success: true, report }))
}

async fn top_recipes_handler(
    State(state): State<Arc<AppState>>,
    query: Result<Query<TopRecipesQuery>, QueryRejection>
) -> Result<Json<TopRecipesResponse>, ApiError> {
    let Query(query) = query?;
    let limit = query.limit.unwrap_or(DEFAULT_TOP_LIMIT).clamp(1, MAX_TOP_LIMIT);
    let recipes = state.store.top_recipes(limit).await?;

    Ok(Json(TopRecipesResponse { success: true, recipes }))
}

async fn rate_recipe_handler(
    State(state): State<Arc<AppState>>,
    path: Result<Path<i32>, PathRejection>,
    body: Result<Json<RateRecipeRequest>, JsonRejection>
) -> Result<(StatusCode, Json<RateRecipeResponse>), ApiError> {
    // Malformed ids and bodies get the same JSON error shape as bad ratings
    let Path(recipe_id) = path?;
    let Json(body) = body?;

    let rating = StarRating::try_from(body.value)
        .map_err(|_| ApiError::BadRequest(format!("Rating must be between 1 and 5, got {}", body.value)))?;

    let user_id = body.user_id.trim();
    if user_id.is_empty() {
        return Err(ApiError::BadRequest("userId is required".to_string()));
    }

    let vote = NewVote {
        recipe_id,
        user_id: user_id.to_string(),
        rating
    };
    let recipe = state.store.record_vote(&vote).await?;

    info!(recipe_id, rating = rating.value(), "Vote recorded");
    Ok((StatusCode::CREATED, Json(RateRecipeResponse { success: true, recipe })))
}

/// Binds `addr` and serves until ctrl-c
pub async fn serve(addr: &str, state: AppState) -> Result<(), std::io::Error> {
    let router = create_router(state);
    let listener = tokio::net::TcpListener::bind(addr).await?;

    info!("API server listening on {}", addr);
    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        warn!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }

    info!("Shutdown signal received");
}
