//! Catalog route handlers.

use axum::{
    Json, Router,
    extract::{Query, State},
    routing::get,
};
use serde::Serialize;

use crate::catalog::{CatalogMaterial, MaterialFilters, Teacher, TeacherFilters};
use crate::error::AppResult;
use crate::models::Subject;
use crate::state::AppState;

/// Create the catalog router.
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/api/catalog/materials", get(search_materials))
        .route("/api/catalog/teachers", get(search_teachers))
        .route("/api/catalog/subjects", get(list_subjects))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterialSearchResponse {
    pub materials: Vec<CatalogMaterial>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct TeacherSearchResponse {
    pub teachers: Vec<Teacher>,
    pub total: i64,
    pub page: u32,
    pub limit: u32,
}

#[derive(Debug, Serialize)]
pub struct SubjectsResponse {
    pub subjects: Vec<Subject>,
}

/// GET /api/catalog/materials
async fn search_materials(
    State(state): State<AppState>,
    Query(filters): Query<MaterialFilters>,
) -> AppResult<Json<MaterialSearchResponse>> {
    let page = state.page_window(filters.page_request());
    let result = state.catalog().search_materials(&filters, page).await?;

    Ok(Json(MaterialSearchResponse {
        has_more: result.has_more(),
        total: result.total,
        page: result.page.page,
        limit: result.page.limit,
        materials: result.items,
    }))
}

/// GET /api/catalog/teachers
async fn search_teachers(
    State(state): State<AppState>,
    Query(filters): Query<TeacherFilters>,
) -> AppResult<Json<TeacherSearchResponse>> {
    let page = state.page_window(filters.page_request());
    let result = state.catalog().search_teachers(&filters, page).await?;

    Ok(Json(TeacherSearchResponse {
        total: result.total,
        page: result.page.page,
        limit: result.page.limit,
        teachers: result.items,
    }))
}

/// GET /api/catalog/subjects
async fn list_subjects(State(state): State<AppState>) -> AppResult<Json<SubjectsResponse>> {
    let subjects = state.catalog().list_subjects().await?;
    Ok(Json(SubjectsResponse { subjects }))
}
