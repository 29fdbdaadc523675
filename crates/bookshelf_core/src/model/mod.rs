//! Domain model for the library catalogue and its access-control records.
//!
//! # Responsibility
//! - Define canonical data structures shared by repositories, services and
//!   views.
//! - Own field-level validation that every write path must run.
//!
//! # Invariants
//! - Every record is identified by a stable UUID.
//! - Relationships are expressed by id references, never by embedded copies.

pub mod account;
pub mod catalog;
pub mod validation;
