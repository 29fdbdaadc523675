//! Repository layer abstractions and SQLite persistence implementations.
//!
//! # Responsibility
//! - Define use-case oriented data access contracts for the catalogue
//!   (`CatalogRepository`) and for identities/grants (`AccountRepository`).
//! - Isolate SQLite query details from service orchestration.
//!
//! # Invariants
//! - Repository writes run model `validate()` before persistence.
//! - Every write is atomic: it either fully applies or leaves no trace.
//! - Relational rule breaks surface as `RepoError::Integrity`, not as raw
//!   SQLite errors.

pub mod account_repo;
pub mod catalog_repo;
pub mod error;
mod sql;

pub use error::{EntityKind, IntegrityViolation, RepoError, RepoResult};
