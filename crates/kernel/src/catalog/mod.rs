//! Catalog search module.
//!
//! This module provides:
//! - CatalogService: runs material and teacher searches
//! - MaterialSearchQuery / TeacherSearchQuery: SeaQuery-based SQL generation
//! - Row mapping into catalog entities
//! - Types: filters, paging window, result entities

mod catalog_service;
mod query_builder;
mod rows;
pub mod types;

pub use catalog_service::CatalogService;
pub use query_builder::{
    MaterialSearchQuery, PredicateSet, Statement, TeacherSearchQuery, apply_window, col,
};
pub use rows::{MaterialRow, TeacherRow};
pub use types::{
    Author, CatalogMaterial, DEFAULT_LIMIT, DEFAULT_PAGE, MaterialFilters, PageRequest,
    SearchPage, Teacher, TeacherFilters,
};
