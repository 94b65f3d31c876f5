//! User model, profile updates and teacher specializations.

use std::fmt;
use std::str::FromStr;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{PgConnection, PgPool};
use uuid::Uuid;

/// Account role, stored as lowercase text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Student,
    Teacher,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Student => "student",
            Role::Teacher => "teacher",
            Role::Admin => "admin",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "student" => Ok(Role::Student),
            "teacher" => Ok(Role::Teacher),
            "admin" => Ok(Role::Admin),
            other => anyhow::bail!("unknown role: {other}"),
        }
    }
}

/// User record.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub full_name: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub is_verified: bool,
    pub is_blocked: bool,
    pub block_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for creating a user. Credentials are hashed by the caller.
#[derive(Debug, Deserialize)]
pub struct CreateUser {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
}

impl User {
    /// Parsed role. Rows are constrained to known roles, so this only fails
    /// on a schema mismatch.
    pub fn role(&self) -> Result<Role> {
        self.role.parse()
    }

    pub fn is_teacher(&self) -> bool {
        self.role == Role::Teacher.as_str()
    }

    /// Find a user by ID.
    pub async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = $1")
            .bind(id)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by id")?;

        Ok(user)
    }

    /// Find a user by email.
    pub async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Self>> {
        let user = sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = $1")
            .bind(email)
            .fetch_optional(pool)
            .await
            .context("failed to fetch user by email")?;

        Ok(user)
    }

    /// Whether an account already uses `email`.
    pub async fn email_exists(pool: &PgPool, email: &str) -> Result<bool> {
        let exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM users WHERE email = $1)")
                .bind(email)
                .fetch_one(pool)
                .await
                .context("failed to check email")?;

        Ok(exists)
    }

    /// Create a new user.
    pub async fn create(pool: &PgPool, input: CreateUser) -> Result<Self> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, role)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING *
            "#,
        )
        .bind(Uuid::now_v7())
        .bind(&input.email)
        .bind(&input.password_hash)
        .bind(&input.full_name)
        .bind(input.role.as_str())
        .fetch_one(pool)
        .await
        .context("failed to create user")?;

        Ok(user)
    }

    /// Update the display name and, for teachers, the specialization set.
    ///
    /// Runs in one transaction. Returns false when the user does not exist.
    pub async fn update_profile(
        pool: &PgPool,
        id: Uuid,
        full_name: &str,
        specializations: &[String],
    ) -> Result<bool> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;

        let role: Option<String> = sqlx::query_scalar(
            "UPDATE users SET full_name = $1, updated_at = now() WHERE id = $2 RETURNING role",
        )
        .bind(full_name)
        .bind(id)
        .fetch_optional(&mut *tx)
        .await
        .context("failed to update profile")?;

        let Some(role) = role else {
            return Ok(false);
        };

        if role == Role::Teacher.as_str() {
            write_specializations(&mut *tx, id, specializations).await?;
        }

        tx.commit().await.context("failed to commit transaction")?;

        Ok(true)
    }

    /// Replace a user's specialization set in one transaction.
    pub async fn replace_specializations(
        pool: &PgPool,
        id: Uuid,
        subjects: &[String],
    ) -> Result<Vec<String>> {
        let mut tx = pool.begin().await.context("failed to start transaction")?;
        let written = write_specializations(&mut *tx, id, subjects).await?;
        tx.commit().await.context("failed to commit transaction")?;

        Ok(written)
    }

    /// A user's specializations in ascending order. Unknown users have none.
    pub async fn specializations(pool: &PgPool, id: Uuid) -> Result<Vec<String>> {
        let subjects: Vec<String> = sqlx::query_scalar(
            "SELECT subject FROM teacher_specializations WHERE user_id = $1 ORDER BY subject",
        )
        .bind(id)
        .fetch_all(pool)
        .await
        .context("failed to fetch specializations")?;

        Ok(subjects)
    }

    /// Set the avatar URL. Returns false when the user does not exist.
    pub async fn update_avatar(pool: &PgPool, id: Uuid, url: &str) -> Result<bool> {
        let result =
            sqlx::query("UPDATE users SET avatar_url = $1, updated_at = now() WHERE id = $2")
                .bind(url)
                .bind(id)
                .execute(pool)
                .await
                .context("failed to update avatar")?;

        Ok(result.rows_affected() > 0)
    }
}

/// Delete-then-insert the specialization set on an open transaction.
async fn write_specializations(
    conn: &mut PgConnection,
    id: Uuid,
    subjects: &[String],
) -> Result<Vec<String>> {
    let subjects = normalize_specializations(subjects);

    sqlx::query("DELETE FROM teacher_specializations WHERE user_id = $1")
        .bind(id)
        .execute(&mut *conn)
        .await
        .context("failed to delete existing specializations")?;

    for subject in &subjects {
        sqlx::query("INSERT INTO teacher_specializations (user_id, subject) VALUES ($1, $2)")
            .bind(id)
            .bind(subject)
            .execute(&mut *conn)
            .await
            .context("failed to insert specialization")?;
    }

    Ok(subjects)
}

/// Trim entries, drop empty ones and remove duplicates. Result is sorted.
pub fn normalize_specializations(subjects: &[String]) -> Vec<String> {
    let mut normalized: Vec<String> = subjects
        .iter()
        .map(|s| s.trim())
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect();
    normalized.sort();
    normalized.dedup();
    normalized
}
