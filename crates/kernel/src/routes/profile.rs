//! Profile routes: view and edit a user's profile, specializations and avatar.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::{get, put},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{Material, MaterialStatus, User};
use crate::state::AppState;

/// Create the profile router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/users/{id}/profile", get(get_profile).put(update_profile))
        .route(
            "/api/users/{id}/specializations",
            put(replace_specializations),
        )
        .route("/api/users/{id}/avatar", put(update_avatar))
        .route("/api/users/{id}/materials", get(list_user_materials))
}

// =============================================================================
// Response Types
// =============================================================================

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProfileResponse {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub specializations: Vec<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SpecializationsResponse {
    pub specializations: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct MaterialsResponse {
    pub materials: Vec<Material>,
}

// =============================================================================
// Request Types
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: String,
    #[serde(default)]
    pub specializations: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SpecializationsRequest {
    pub specializations: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AvatarRequest {
    pub avatar_url: String,
}

#[derive(Debug, Deserialize)]
pub struct UserMaterialsQuery {
    pub status: Option<MaterialStatus>,
}

// =============================================================================
// Handlers
// =============================================================================

/// GET /api/users/{id}/profile
async fn get_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ProfileResponse>> {
    let user = User::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    let specializations = match User::specializations(state.db(), id).await {
        Ok(list) => list,
        Err(e) => {
            tracing::warn!(error = %e, user_id = %id, "specialization lookup failed");
            Vec::new()
        }
    };

    Ok(Json(ProfileResponse {
        id: user.id,
        email: user.email,
        full_name: user.full_name,
        role: user.role,
        avatar_url: user.avatar_url,
        is_verified: user.is_verified,
        specializations,
        created_at: user.created_at,
    }))
}

/// PUT /api/users/{id}/profile
async fn update_profile(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<UpdateProfileRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let full_name = request.full_name.trim();
    if full_name.is_empty() {
        return Err(AppError::BadRequest("full name must not be empty".to_string()));
    }

    if !User::update_profile(state.db(), id, full_name, &request.specializations).await? {
        return Err(AppError::NotFound("user".to_string()));
    }

    tracing::info!(user_id = %id, "profile updated");
    get_profile(State(state), Path(id)).await
}

/// PUT /api/users/{id}/specializations
async fn replace_specializations(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<SpecializationsRequest>,
) -> AppResult<Json<SpecializationsResponse>> {
    let user = User::find_by_id(state.db(), id)
        .await?
        .ok_or_else(|| AppError::NotFound("user".to_string()))?;

    if !user.is_teacher() {
        return Err(AppError::BadRequest(
            "only teachers have specializations".to_string(),
        ));
    }

    let specializations =
        User::replace_specializations(state.db(), id, &request.specializations).await?;

    Ok(Json(SpecializationsResponse { specializations }))
}

/// PUT /api/users/{id}/avatar
async fn update_avatar(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<AvatarRequest>,
) -> AppResult<Json<ProfileResponse>> {
    let url = request.avatar_url.trim();
    if url.is_empty() {
        return Err(AppError::BadRequest("avatar URL must not be empty".to_string()));
    }

    if !User::update_avatar(state.db(), id, url).await? {
        return Err(AppError::NotFound("user".to_string()));
    }

    get_profile(State(state), Path(id)).await
}

/// GET /api/users/{id}/materials
async fn list_user_materials(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<UserMaterialsQuery>,
) -> AppResult<Json<MaterialsResponse>> {
    let materials = Material::list_by_author(state.db(), id, query.status).await?;
    Ok(Json(MaterialsResponse { materials }))
}
