//! Paydeya Kernel Library
//!
//! Catalog search, data access and HTTP routes of the Paydeya backend.
//! The main entry point for running the server is the `paydeya` binary.

pub mod catalog;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod routes;
pub mod state;

pub use config::Config;
pub use state::AppState;
