//! Administration routes: platform statistics, user management and subjects.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::catalog::PageRequest;
use crate::error::{AppError, AppResult};
use crate::models::admin::{self, ManagedUser, PlatformStats};
use crate::models::{Role, Subject};
use crate::state::AppState;

/// Create the admin router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/admin/stats", get(platform_stats))
        .route("/api/admin/users", get(list_users))
        .route("/api/admin/users/{id}/block", post(block_user))
        .route("/api/admin/subjects", post(create_subject))
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct UserListParams {
    pub role: Option<Role>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub users: Vec<ManagedUser>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Deserialize)]
pub struct BlockRequest {
    #[serde(default)]
    pub reason: String,
}

/// GET /api/admin/stats
async fn platform_stats(State(state): State<AppState>) -> AppResult<Json<PlatformStats>> {
    Ok(Json(PlatformStats::collect(state.db()).await?))
}

/// GET /api/admin/users
async fn list_users(
    State(state): State<AppState>,
    Query(params): Query<UserListParams>,
) -> AppResult<Json<UserListResponse>> {
    let page = state.page_window(PageRequest::new(params.page, params.limit));
    let result = admin::list_users(state.db(), params.role, page).await?;

    Ok(Json(UserListResponse {
        users: result.items,
        total: result.total,
        page: result.page.page,
        limit: result.page.limit,
    }))
}

/// POST /api/admin/users/{id}/block
async fn block_user(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<BlockRequest>,
) -> AppResult<StatusCode> {
    if !admin::block_user(state.db(), id, request.reason.trim()).await? {
        return Err(AppError::NotFound("user".to_string()));
    }

    tracing::info!(user_id = %id, "user blocked");
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/admin/subjects
async fn create_subject(
    State(state): State<AppState>,
    Json(subject): Json<Subject>,
) -> AppResult<(StatusCode, Json<Subject>)> {
    if subject.id.trim().is_empty() || subject.name.trim().is_empty() {
        return Err(AppError::BadRequest(
            "subject id and name are required".to_string(),
        ));
    }

    if !Subject::create(state.db(), &subject).await? {
        return Err(AppError::Conflict(format!("subject '{}' already exists", subject.id)));
    }

    Ok((StatusCode::CREATED, Json(subject)))
}
