//! Catalog filter criteria, paging window, and result entities.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Page used when the caller does not supply one.
pub const DEFAULT_PAGE: u32 = 1;

/// Page size used when the caller does not supply one.
pub const DEFAULT_LIMIT: u32 = 20;

/// 1-indexed page number and page size.
///
/// A limit of 0 means "no limit": no LIMIT or OFFSET clause is emitted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PageRequest {
    pub page: u32,
    pub limit: u32,
}

impl Default for PageRequest {
    fn default() -> Self {
        Self {
            page: DEFAULT_PAGE,
            limit: DEFAULT_LIMIT,
        }
    }
}

impl PageRequest {
    /// Build a window from optional request parameters, defaulting unset ones.
    pub fn new(page: Option<u32>, limit: Option<u32>) -> Self {
        Self {
            page: page.unwrap_or(DEFAULT_PAGE),
            limit: limit.unwrap_or(DEFAULT_LIMIT),
        }
    }

    /// Cap a nonzero page size at `max`.
    pub fn capped(self, max: u32) -> Self {
        if self.limit > max && max > 0 {
            tracing::warn!(
                requested = self.limit,
                capped = max,
                "page size exceeds maximum, capping"
            );
            Self { limit: max, ..self }
        } else {
            self
        }
    }

    /// LIMIT value, if any.
    pub fn sql_limit(&self) -> Option<u64> {
        (self.limit > 0).then_some(u64::from(self.limit))
    }

    /// OFFSET value: `(page - 1) * limit`, only when both page and limit are positive.
    pub fn sql_offset(&self) -> Option<u64> {
        (self.page > 0 && self.limit > 0)
            .then(|| u64::from(self.page - 1) * u64::from(self.limit))
    }

    /// Whether rows remain past this page.
    pub fn has_more(&self, total: i64) -> bool {
        self.limit > 0 && i64::from(self.page) * i64::from(self.limit) < total
    }
}

/// Search criteria for published materials.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct MaterialFilters {
    /// Case-insensitive substring matched against title and author name.
    pub search: Option<String>,
    /// Subject code.
    pub subject: Option<String>,
    /// Difficulty level.
    pub level: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl MaterialFilters {
    pub fn search(&self) -> Option<&str> {
        present(&self.search)
    }

    pub fn subject(&self) -> Option<&str> {
        present(&self.subject)
    }

    pub fn level(&self) -> Option<&str> {
        present(&self.level)
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Search criteria for teachers.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TeacherFilters {
    /// Case-insensitive substring matched against the teacher's name.
    pub search: Option<String>,
    /// Subject code the teacher must specialize in.
    pub subject: Option<String>,
    pub page: Option<u32>,
    pub limit: Option<u32>,
}

impl TeacherFilters {
    pub fn search(&self) -> Option<&str> {
        present(&self.search)
    }

    pub fn subject(&self) -> Option<&str> {
        present(&self.subject)
    }

    pub fn page_request(&self) -> PageRequest {
        PageRequest::new(self.page, self.limit)
    }
}

/// Treat empty and whitespace-only values as absent.
fn present(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

/// Material author projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Author {
    pub id: Uuid,
    pub name: String,
}

/// Published material as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CatalogMaterial {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    pub author: Author,
    /// Mean rating, 0 when unrated.
    pub rating: f64,
    /// Distinct users who rated the material.
    pub students_count: i64,
}

/// Teacher as listed in the catalog.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Teacher {
    pub id: Uuid,
    pub name: String,
    /// Subject codes in ascending order.
    pub specializations: Vec<String>,
    /// Mean rating across the teacher's published materials, 0 when unrated.
    pub rating: f64,
    pub materials_count: i64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar_url: Option<String>,
}

/// One page of results and the total number of matches.
#[derive(Debug, Clone)]
pub struct SearchPage<T> {
    pub items: Vec<T>,
    pub total: i64,
    pub page: PageRequest,
}

impl<T> SearchPage<T> {
    pub fn has_more(&self) -> bool {
        self.page.has_more(self.total)
    }
}
