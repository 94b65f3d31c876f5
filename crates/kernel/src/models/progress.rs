//! Student progress, completions and favorites.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use uuid::Uuid;

use crate::catalog::{CatalogMaterial, MaterialRow};

/// Highest grade a completion can carry.
pub const MAX_GRADE: f64 = 5.0;

/// Number of recent completions listed in a progress summary.
pub const RECENT_COMPLETIONS: i64 = 5;

/// Aggregated learning progress of one student.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StudentProgress {
    pub completed_topics: i64,
    /// Mean grade, 0 when nothing is completed.
    pub average_grade: f64,
    /// Whole hours spent across all completions.
    pub learning_hours: i64,
    /// Average grade as a percentage of the maximum grade.
    pub success_rate: f64,
    pub current_materials: Vec<ProgressMaterial>,
}

/// A recently completed material.
#[derive(Debug, Clone, PartialEq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ProgressMaterial {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub progress: f64,
    pub last_activity: DateTime<Utc>,
}

/// Favorite list change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FavoriteAction {
    Add,
    Remove,
}

impl StudentProgress {
    /// Fill derived fields from the raw aggregates.
    fn from_aggregates(completed: i64, average_grade: f64, seconds: i64) -> Self {
        let success_rate = if completed > 0 {
            average_grade / MAX_GRADE * 100.0
        } else {
            0.0
        };

        Self {
            completed_topics: completed,
            average_grade,
            learning_hours: seconds / 3600,
            success_rate,
            current_materials: Vec::new(),
        }
    }

    /// Progress summary for a student.
    pub async fn for_user(pool: &PgPool, user_id: Uuid) -> Result<Self> {
        let (completed, average_grade, seconds): (i64, f64, i64) = sqlx::query_as(
            r#"
            SELECT COUNT(*),
                   COALESCE(AVG(grade), 0)::float8,
                   COALESCE(SUM(time_spent), 0)::int8
            FROM material_completions
            WHERE user_id = $1
            "#,
        )
        .bind(user_id)
        .fetch_one(pool)
        .await
        .context("failed to aggregate completions")?;

        let mut progress = Self::from_aggregates(completed, average_grade, seconds);

        progress.current_materials = sqlx::query_as::<_, ProgressMaterial>(
            r#"
            SELECT m.id, m.title, m.subject_id AS subject,
                   100::float8 AS progress, mc.last_activity
            FROM material_completions mc
            JOIN materials m ON m.id = mc.material_id
            WHERE mc.user_id = $1
            ORDER BY mc.last_activity DESC, m.id
            LIMIT $2
            "#,
        )
        .bind(user_id)
        .bind(RECENT_COMPLETIONS)
        .fetch_all(pool)
        .await
        .context("failed to fetch recent completions")?;

        Ok(progress)
    }
}

/// Validate completion input: time spent is non-negative, grade within 0..=5.
pub fn validate_completion(time_spent: i32, grade: f64) -> Result<()> {
    if time_spent < 0 {
        anyhow::bail!("time spent must not be negative");
    }
    if !(0.0..=MAX_GRADE).contains(&grade) {
        anyhow::bail!("grade must be between 0 and {MAX_GRADE}");
    }
    Ok(())
}

/// Record a completed material, replacing time and grade on repeat.
pub async fn mark_complete(
    pool: &PgPool,
    user_id: Uuid,
    material_id: Uuid,
    time_spent: i32,
    grade: f64,
) -> Result<()> {
    validate_completion(time_spent, grade)?;

    sqlx::query(
        r#"
        INSERT INTO material_completions (user_id, material_id, time_spent, grade)
        VALUES ($1, $2, $3, $4)
        ON CONFLICT (user_id, material_id) DO UPDATE SET
            time_spent = EXCLUDED.time_spent,
            grade = EXCLUDED.grade,
            last_activity = now()
        "#,
    )
    .bind(user_id)
    .bind(material_id)
    .bind(time_spent)
    .bind(grade)
    .execute(pool)
    .await
    .context("failed to mark material complete")?;

    Ok(())
}

/// A user's favorite published materials, newest favorite first.
pub async fn favorites(pool: &PgPool, user_id: Uuid) -> Result<Vec<CatalogMaterial>> {
    let rows = sqlx::query_as::<_, MaterialRow>(
        r#"
        SELECT m.id, m.title, m.subject_id AS subject, m.level,
               u.id AS author_id, u.full_name AS author_name,
               COALESCE(r.avg_rating, 0)::float8 AS rating,
               COALESCE(r.rating_count, 0) AS students_count
        FROM favorite_materials fm
        JOIN materials m ON m.id = fm.material_id
        JOIN users u ON u.id = m.author_id
        LEFT JOIN (
            SELECT material_id, AVG(rating) AS avg_rating, COUNT(DISTINCT user_id) AS rating_count
            FROM material_ratings
            GROUP BY material_id
        ) r ON r.material_id = m.id
        WHERE fm.user_id = $1 AND m.status = 'published'
        ORDER BY fm.created_at DESC, m.id
        "#,
    )
    .bind(user_id)
    .fetch_all(pool)
    .await
    .context("failed to fetch favorites")?;

    Ok(rows.into_iter().map(CatalogMaterial::from).collect())
}

/// Add or remove a favorite. Adding twice is a no-op.
pub async fn toggle_favorite(
    pool: &PgPool,
    user_id: Uuid,
    material_id: Uuid,
    action: FavoriteAction,
) -> Result<()> {
    match action {
        FavoriteAction::Add => {
            sqlx::query(
                "INSERT INTO favorite_materials (user_id, material_id) VALUES ($1, $2) ON CONFLICT DO NOTHING",
            )
            .bind(user_id)
            .bind(material_id)
            .execute(pool)
            .await
            .context("failed to add favorite")?;
        }
        FavoriteAction::Remove => {
            sqlx::query("DELETE FROM favorite_materials WHERE user_id = $1 AND material_id = $2")
                .bind(user_id)
                .bind(material_id)
                .execute(pool)
                .await
                .context("failed to remove favorite")?;
        }
    }

    Ok(())
}
