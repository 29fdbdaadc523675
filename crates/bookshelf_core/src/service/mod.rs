//! Core use-case services.
//!
//! # Responsibility
//! - Orchestrate repository calls into use-case level APIs: relationship
//!   queries, access control and permission-gated book mutations.
//! - Translate repository errors into the caller-facing taxonomy.
//!
//! # Invariants
//! - Mutations check a fine-grained permission, never the role directly.
//! - Services stay storage-agnostic; they only see repository traits.

pub mod access_service;
pub mod book_service;
pub mod error;
pub mod query_service;
pub mod request;
