//! Platform statistics and user management.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sea_query::{Alias, Asterisk, Expr, JoinType, Order, Query, SelectStatement};
use sea_query_binder::SqlxValues;
use serde::Serialize;
use sqlx::PgPool;
use uuid::Uuid;

use super::user::Role;
use crate::catalog::{PageRequest, PredicateSet, SearchPage, Statement, apply_window, col};

/// Platform-wide counters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct PlatformStats {
    pub total_users: i64,
    pub total_materials: i64,
    /// Teachers with at least one material.
    pub active_teachers: i64,
    pub published_materials: i64,
}

impl PlatformStats {
    pub async fn collect(pool: &PgPool) -> Result<Self> {
        let stats = sqlx::query_as::<_, PlatformStats>(
            r#"
            SELECT
                (SELECT COUNT(*) FROM users) AS total_users,
                (SELECT COUNT(*) FROM materials) AS total_materials,
                (SELECT COUNT(DISTINCT u.id)
                   FROM users u JOIN materials m ON m.author_id = u.id
                  WHERE u.role = 'teacher') AS active_teachers,
                (SELECT COUNT(*) FROM materials WHERE status = 'published') AS published_materials
            "#,
        )
        .fetch_one(pool)
        .await
        .context("failed to collect platform stats")?;

        Ok(stats)
    }
}

/// One row of the admin user listing.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct ManagedUser {
    pub id: Uuid,
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub is_verified: bool,
    pub is_blocked: bool,
    pub block_reason: Option<String>,
    pub created_at: DateTime<Utc>,
    pub materials_count: i64,
}

/// Admin user listing with an optional role filter.
pub struct UserListQuery {
    predicates: PredicateSet,
    page: PageRequest,
}

impl UserListQuery {
    pub fn new(role: Option<Role>, page: PageRequest) -> Self {
        let mut predicates = PredicateSet::new();
        predicates.push_some("role", role, |role| col("u", "role").eq(role.as_str()));
        Self { predicates, page }
    }

    fn base(&self) -> SelectStatement {
        let mut query = Query::select();
        query.from_as(Alias::new("users"), Alias::new("u"));
        self.predicates.apply(&mut query);
        query
    }

    pub fn build_count(&self) -> Statement {
        let mut query = self.base();
        query.expr(Expr::col(Asterisk).count());
        Statement::render(&query)
    }

    pub fn build(&self) -> Statement {
        let mut query = self.base();
        query
            .columns([
                (Alias::new("u"), Alias::new("id")),
                (Alias::new("u"), Alias::new("email")),
                (Alias::new("u"), Alias::new("full_name")),
                (Alias::new("u"), Alias::new("role")),
                (Alias::new("u"), Alias::new("is_verified")),
                (Alias::new("u"), Alias::new("is_blocked")),
                (Alias::new("u"), Alias::new("block_reason")),
                (Alias::new("u"), Alias::new("created_at")),
            ])
            .expr_as(
                Expr::cust("COALESCE(mc.materials_count, 0)"),
                Alias::new("materials_count"),
            )
            .join_subquery(
                JoinType::LeftJoin,
                Query::select()
                    .column(Alias::new("author_id"))
                    .expr_as(Expr::cust("COUNT(*)"), Alias::new("materials_count"))
                    .from(Alias::new("materials"))
                    .group_by_col(Alias::new("author_id"))
                    .to_owned(),
                Alias::new("mc"),
                col("mc", "author_id").equals((Alias::new("u"), Alias::new("id"))),
            )
            .order_by((Alias::new("u"), Alias::new("created_at")), Order::Desc)
            .order_by((Alias::new("u"), Alias::new("id")), Order::Asc);

        apply_window(&mut query, &self.page);
        Statement::render(&query)
    }
}

/// List users for administration, newest first.
pub async fn list_users(
    pool: &PgPool,
    role: Option<Role>,
    page: PageRequest,
) -> Result<SearchPage<ManagedUser>> {
    let (count, fetch) = {
        let query = UserListQuery::new(role, page);
        (query.build_count(), query.build())
    };

    let total: i64 = sqlx::query_scalar_with(&count.sql, SqlxValues(count.values))
        .fetch_one(pool)
        .await
        .context("failed to count users")?;

    let items: Vec<ManagedUser> = sqlx::query_as_with(&fetch.sql, SqlxValues(fetch.values))
        .fetch_all(pool)
        .await
        .context("failed to list users")?;

    Ok(SearchPage { items, total, page })
}

/// Block a user with a reason. Returns false when the user does not exist.
pub async fn block_user(pool: &PgPool, user_id: Uuid, reason: &str) -> Result<bool> {
    let result = sqlx::query(
        "UPDATE users SET is_blocked = TRUE, block_reason = $1, updated_at = now() WHERE id = $2",
    )
    .bind(reason)
    .bind(user_id)
    .execute(pool)
    .await
    .context("failed to block user")?;

    Ok(result.rows_affected() > 0)
}
