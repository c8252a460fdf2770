//! Patient administration service
//!
//! A small HTTP service managing the Patient aggregate (patient, name,
//! given names) with:
//! - CRUD operations over a PostgreSQL store
//! - FHIR-style birth date search (two-letter prefix + date tokens)
//! - Partial updates with "absent means unchanged" merge semantics

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod logging;
pub mod models;
pub mod state;

pub use config::Config;
pub use error::{Error, Result};
pub use state::AppState;
