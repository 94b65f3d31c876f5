//! Student progress and favorites routes.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::CatalogMaterial;
use crate::error::{AppError, AppResult};
use crate::models::progress::{self, validate_completion};
use crate::models::{FavoriteAction, Material, StudentProgress, User};
use crate::state::AppState;

/// Create the progress router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/{id}/progress", get(get_progress))
        .route(
            "/api/users/{id}/progress/{material_id}",
            post(mark_complete),
        )
        .route("/api/users/{id}/favorites", get(list_favorites))
        .route(
            "/api/users/{id}/favorites/{material_id}",
            post(toggle_favorite),
        )
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompletionRequest {
    #[serde(default)]
    pub time_spent: i32,
    #[serde(default)]
    pub grade: f64,
}

#[derive(Debug, Deserialize)]
pub struct FavoriteRequest {
    pub action: FavoriteAction,
}

#[derive(Debug, Serialize)]
pub struct FavoritesResponse {
    pub materials: Vec<CatalogMaterial>,
}

/// GET /api/users/{id}/progress
async fn get_progress(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<StudentProgress>> {
    Ok(Json(StudentProgress::for_user(state.db(), id).await?))
}

/// POST /api/users/{id}/progress/{material_id}
async fn mark_complete(
    State(state): State<AppState>,
    Path((id, material_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<CompletionRequest>,
) -> AppResult<StatusCode> {
    validate_completion(request.time_spent, request.grade)
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    if User::find_by_id(state.db(), id).await?.is_none() {
        return Err(AppError::NotFound("user".to_string()));
    }
    if Material::find_by_id(state.db(), material_id).await?.is_none() {
        return Err(AppError::NotFound("material".to_string()));
    }

    progress::mark_complete(
        state.db(),
        id,
        material_id,
        request.time_spent,
        request.grade,
    )
    .await?;

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/users/{id}/favorites
async fn list_favorites(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<FavoritesResponse>> {
    let materials = progress::favorites(state.db(), id).await?;
    Ok(Json(FavoritesResponse { materials }))
}

/// POST /api/users/{id}/favorites/{material_id}
async fn toggle_favorite(
    State(state): State<AppState>,
    Path((id, material_id)): Path<(Uuid, Uuid)>,
    Json(request): Json<FavoriteRequest>,
) -> AppResult<StatusCode> {
    if request.action == FavoriteAction::Add {
        if User::find_by_id(state.db(), id).await?.is_none() {
            return Err(AppError::NotFound("user".to_string()));
        }
        if Material::find_by_id(state.db(), material_id).await?.is_none() {
            return Err(AppError::NotFound("material".to_string()));
        }
    }

    progress::toggle_favorite(state.db(), id, material_id, request.action).await?;
    Ok(StatusCode::NO_CONTENT)
}
