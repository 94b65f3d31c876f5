//! Material model and ratings.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

/// Publication state of a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MaterialStatus {
    #[default]
    Draft,
    Published,
}

impl MaterialStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            MaterialStatus::Draft => "draft",
            MaterialStatus::Published => "published",
        }
    }
}

/// Who may open a material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Access {
    #[default]
    Open,
    Link,
    Private,
}

impl Access {
    pub fn as_str(&self) -> &'static str {
        match self {
            Access::Open => "open",
            Access::Link => "link",
            Access::Private => "private",
        }
    }
}

/// Lowest accepted rating.
pub const MIN_RATING: i16 = 1;

/// Highest accepted rating.
pub const MAX_RATING: i16 = 5;

/// Material record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    pub id: Uuid,
    pub title: String,
    pub subject_id: String,
    pub level: Option<String>,
    pub author_id: Uuid,
    pub status: String,
    pub access: String,
    pub share_url: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a material.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMaterial {
    pub title: String,
    pub subject_id: String,
    pub level: Option<String>,
    pub author_id: Uuid,
    #[serde(default)]
    pub status: MaterialStatus,
    #[serde(default)]
    pub access: Access,
}

/// Input for updating a material. Absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateMaterial {
    pub title: Option<String>,
    pub subject_id: Option<String>,
    pub level: Option<String>,
    pub status: Option<MaterialStatus>,
    pub access: Option<Access>,
}

impl Material {
    pub fn is_published(&self) -> bool {
        self.status == MaterialStatus::Published.as_str()
    }

    /// Create a new material.
    pub async fn create(pool: &PgPool, input: CreateMaterial) -> Result<Self> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            INSERT INTO materials (id, title, subject_id, level, author_id, status, access)
            VALUES ($1, $2, $3, $4, $5, $6, $7)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.title)
        .bind(&input.subject_id)
        .bind(&input.level)
        .bind(input.author_id)
        .bind(input.status.as_str())
        .bind(input.access.as_str())
        .fetch_one(pool)
        .await
        .context("failed to create material")?;

        Ok(material)
    }

    /// Find a material by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let material = sqlx::query_as::<_, Material>("SELECT * FROM materials WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch material by id")?;

        Ok(material)
    }

    /// An author's materials, most recently updated first.
    pub async fn list_by_author(
        pool: &PgPool,
        author_id: Uuid,
        status: Option<MaterialStatus>,
    ) -> Result<Vec<Self>> {
        let materials = sqlx::query_as::<_, Material>(
            r#"
            SELECT * FROM materials
            WHERE author_id = $1 AND ($2::text IS NULL OR status = $2)
            ORDER BY updated_at DESC, id
            "#,
        )
        .bind(author_id)
        .bind(status.map(|s| s.as_str()))
        .fetch_all(pool)
        .await
        .context("failed to list materials by author")?;

        Ok(materials)
    }

    /// Update a material owned by `author_id`.
    ///
    /// Returns the updated row, or None when no material with that id belongs
    /// to the author.
    pub async fn update(
        pool: &PgPool,
        id: Uuid,
        author_id: Uuid,
        input: UpdateMaterial,
    ) -> Result<Option<Self>> {
        let material = sqlx::query_as::<_, Material>(
            r#"
            UPDATE materials SET
                title = COALESCE($3, title),
                subject_id = COALESCE($4, subject_id),
                level = COALESCE($5, level),
                status = COALESCE($6, status),
                access = COALESCE($7, access),
                updated_at = now()
            WHERE id = $1 AND author_id = $2
            RETURNING *
            "#,
        )
        .bind(id)
        .bind(author_id)
        .bind(&input.title)
        .bind(&input.subject_id)
        .bind(&input.level)
        .bind(input.status.map(|s| s.as_str()))
        .bind(input.access.map(|a| a.as_str()))
        .fetch_optional(pool)
        .await
        .context("failed to update material")?;

        Ok(material)
    }

    /// Record or replace `user_id`'s rating of a material.
    pub async fn rate(pool: &PgPool, material_id: Uuid, user_id: Uuid, rating: i16) -> Result<()> {
        validate_rating(rating)?;

        sqlx::query(
            r#"
            INSERT INTO material_ratings (material_id, user_id, rating)
            VALUES ($1, $2, $3)
            ON CONFLICT (material_id, user_id) DO UPDATE SET
                rating = EXCLUDED.rating,
                created_at = now()
            "#,
        )
        .bind(material_id)
        .bind(user_id)
        .bind(rating)
        .execute(pool)
        .await
        .context("failed to rate material")?;

        Ok(())
    }
}

/// Reject ratings outside 1..=5.
pub fn validate_rating(rating: i16) -> Result<()> {
    if !(MIN_RATING..=MAX_RATING).contains(&rating) {
        anyhow::bail!("rating must be between {MIN_RATING} and {MAX_RATING}, got {rating}");
    }
    Ok(())
}
