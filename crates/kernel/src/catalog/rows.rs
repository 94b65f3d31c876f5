//! Row shapes returned by catalog page statements and their mapping into
//! result entities.

use std::collections::HashMap;

use uuid::Uuid;

use super::types::{Author, CatalogMaterial, Teacher};

/// One row of the material page statement.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct MaterialRow {
    pub id: Uuid,
    pub title: String,
    pub subject: String,
    pub level: Option<String>,
    pub author_id: Uuid,
    pub author_name: String,
    pub rating: Option<f64>,
    pub students_count: Option<i64>,
}

impl From<MaterialRow> for CatalogMaterial {
    fn from(row: MaterialRow) -> Self {
        Self {
            id: row.id,
            title: row.title,
            subject: row.subject,
            level: row.level,
            author: Author {
                id: row.author_id,
                name: row.author_name,
            },
            rating: row.rating.unwrap_or(0.0),
            students_count: row.students_count.unwrap_or(0),
        }
    }
}

/// One row of the teacher page statement, before specializations are attached.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct TeacherRow {
    pub id: Uuid,
    pub full_name: String,
    pub avatar_url: Option<String>,
    pub materials_count: Option<i64>,
    pub rating: Option<f64>,
}

impl TeacherRow {
    /// Build the teacher entity, taking its specializations out of `lookup`.
    pub fn into_teacher(self, lookup: &mut HashMap<Uuid, Vec<String>>) -> Teacher {
        Teacher {
            specializations: lookup.remove(&self.id).unwrap_or_default(),
            id: self.id,
            name: self.full_name,
            rating: self.rating.unwrap_or(0.0),
            materials_count: self.materials_count.unwrap_or(0),
            avatar_url: self.avatar_url,
        }
    }
}

/// Group `(user_id, subject)` pairs into per-teacher lists.
///
/// Pairs must arrive ordered by subject within each teacher; that order is kept.
pub fn group_specializations(
    pairs: impl IntoIterator<Item = (Uuid, String)>,
) -> HashMap<Uuid, Vec<String>> {
    let mut grouped: HashMap<Uuid, Vec<String>> = HashMap::new();
    for (user_id, subject) in pairs {
        grouped.entry(user_id).or_default().push(subject);
    }
    grouped
}
