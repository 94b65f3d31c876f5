//! Paydeya test utilities.
//!
//! Fixture builders that insert users, materials, ratings and
//! specializations with raw SQL, independent of the kernel's models.

use anyhow::{Context, Result};
use sqlx::PgPool;
use uuid::Uuid;

/// Short random suffix for names and codes that must not collide between tests.
pub fn unique_suffix() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Create a test user with default values.
pub fn test_user(full_name: &str) -> TestUser {
    let id = Uuid::now_v7();
    TestUser {
        id,
        email: format!("{}@test.paydeya.local", id.simple()),
        full_name: full_name.to_string(),
        role: "student".to_string(),
        avatar_url: None,
        specializations: Vec::new(),
    }
}

/// A test user builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub avatar_url: Option<String>,
    pub specializations: Vec<String>,
}

impl TestUser {
    /// Make this user a teacher.
    pub fn teacher(mut self) -> Self {
        self.role = "teacher".to_string();
        self
    }

    /// Make this user an admin.
    pub fn admin(mut self) -> Self {
        self.role = "admin".to_string();
        self
    }

    pub fn with_avatar(mut self, url: &str) -> Self {
        self.avatar_url = Some(url.to_string());
        self
    }

    /// Add specializations, inserted with the user.
    pub fn with_specializations(mut self, subjects: &[&str]) -> Self {
        self.specializations
            .extend(subjects.iter().map(|s| s.to_string()));
        self
    }

    /// Insert the user and its specializations.
    pub async fn insert(self, pool: &PgPool) -> Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO users (id, email, password_hash, full_name, role, avatar_url)
            VALUES ($1, $2, 'not-a-real-hash', $3, $4, $5)
            "#,
        )
        .bind(self.id)
        .bind(&self.email)
        .bind(&self.full_name)
        .bind(&self.role)
        .bind(&self.avatar_url)
        .execute(pool)
        .await
        .context("failed to insert test user")?;

        for subject in &self.specializations {
            sqlx::query(
                "INSERT INTO teacher_specializations (user_id, subject) VALUES ($1, $2)",
            )
            .bind(self.id)
            .bind(subject)
            .execute(pool)
            .await
            .context("failed to insert test specialization")?;
        }

        Ok(self)
    }
}

/// Create a published test material with default values.
pub fn test_material(title: &str, subject: &str, author_id: Uuid) -> TestMaterial {
    TestMaterial {
        id: Uuid::now_v7(),
        title: title.to_string(),
        subject: subject.to_string(),
        level: None,
        author_id,
        status: "published".to_string(),
    }
}

/// A test material builder for creating test fixtures.
#[derive(Debug, Clone)]
pub struct TestMaterial {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub level: Option<String>,
    pub author_id: Uuid,
    pub status: String,
}

impl TestMaterial {
    pub fn with_level(mut self, level: &str) -> Self {
        self.level = Some(level.to_string());
        self
    }

    /// Set as draft.
    pub fn draft(mut self) -> Self {
        self.status = "draft".to_string();
        self
    }

    /// Insert the material.
    pub async fn insert(self, pool: &PgPool) -> Result<Self> {
        sqlx::query(
            r#"
            INSERT INTO materials (id, title, subject_id, level, author_id, status)
            VALUES ($1, $2, $3, $4, $5, $6)
            "#,
        )
        .bind(self.id)
        .bind(&self.title)
        .bind(&self.subject)
        .bind(&self.level)
        .bind(self.author_id)
        .bind(&self.status)
        .execute(pool)
        .await
        .context("failed to insert test material")?;

        Ok(self)
    }
}

/// Insert a rating of `material_id` by `user_id`.
pub async fn insert_rating(
    pool: &PgPool,
    material_id: Uuid,
    user_id: Uuid,
    rating: i16,
) -> Result<()> {
    sqlx::query("INSERT INTO material_ratings (material_id, user_id, rating) VALUES ($1, $2, $3)")
        .bind(material_id)
        .bind(user_id)
        .bind(rating)
        .execute(pool)
        .await
        .context("failed to insert test rating")?;

    Ok(())
}
