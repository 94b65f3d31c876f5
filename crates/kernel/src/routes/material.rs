//! Material route handlers.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::material::{CreateMaterial, UpdateMaterial, validate_rating};
use crate::models::{Material, User};
use crate::state::AppState;

/// Create the material router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/materials", post(create_material))
        .route(
            "/api/materials/{id}",
            get(get_material).put(update_material),
        )
        .route("/api/materials/{id}/ratings", post(rate_material))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterialRequest {
    /// Acting author; the update only applies to materials they own.
    pub author_id: Uuid,
    #[serde(flatten)]
    pub changes: UpdateMaterial,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RateRequest {
    pub user_id: Uuid,
    pub rating: i16,
}

/// POST /api/materials
async fn create_material(
    State(state): State<AppState>,
    Json(input): Json<CreateMaterial>,
) -> AppResult<(StatusCode, Json<Material>)> {
    if input.title.trim().is_empty() {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }
    if User::find_by_id(state.db(), input.author_id).await?.is_none() {
        return Err(AppError::NotFound("author".to_string()));
    }

    let material = Material::create(state.db(), input).await?;
    tracing::info!(material_id = %material.id, author_id = %material.author_id, "material created");

    Ok((StatusCode::CREATED, Json(material)))
}

/// GET /api/materials/{id}
async fn get_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<Material>> {
    let material = Material::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("material".to_string()))?;

    Ok(Json(material))
}

/// PUT /api/materials/{id}
async fn update_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateMaterialRequest>,
) -> AppResult<Json<Material>> {
    if request
        .changes
        .title
        .as_deref()
        .is_some_and(|t| t.trim().is_empty())
    {
        return Err(AppError::BadRequest("title must not be empty".to_string()));
    }

    let material = Material::update(state.db(), id, request.author_id, request.changes)
        .await?
        .ok_or_else(|| AppError::NotFound("material".to_string()))?;

    Ok(Json(material))
}

/// POST /api/materials/{id}/ratings
async fn rate_material(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<RateRequest>,
) -> AppResult<StatusCode> {
    validate_rating(request.rating).map_err(|e| AppError::BadRequest(e.to_string()))?;

    if Material::find_by_id(state.db(), id).await?.is_none() {
        return Err(AppError::NotFound("material".to_string()));
    }
    if User::find_by_id(state.db(), request.user_id).await?.is_none() {
        return Err(AppError::NotFound("user".to_string()));
    }

    Material::rate(state.db(), id, request.user_id, request.rating).await?;
    Ok(StatusCode::NO_CONTENT)
}
