//! Subject model.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;

/// Subject record, keyed by a short code such as `math`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub icon: Option<String>,
}

impl Subject {
    /// List all subjects ordered by name.
    pub async fn list(pool: &PgPool) -> Result<Vec<Self>> {
        let subjects =
            sqlx::query_as::<_, Subject>("SELECT id, name, icon FROM subjects ORDER BY name, id")
                .fetch_all(pool)
                .await
                .context("failed to list subjects")?;

        Ok(subjects)
    }

    /// Insert a subject. Returns false when the code is already taken.
    pub async fn create(pool: &PgPool, subject: &Subject) -> Result<bool> {
        let result = sqlx::query(
            "INSERT INTO subjects (id, name, icon) VALUES ($1, $2, $3) ON CONFLICT (id) DO NOTHING",
        )
        .bind(&subject.id)
        .bind(&subject.name)
        .bind(&subject.icon)
        .execute(pool)
        .await
        .context("failed to create subject")?;

        Ok(result.rows_affected() > 0)
    }
}
