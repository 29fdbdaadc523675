//! Core domain logic for the bookshelf library catalogue.
//! This crate is the single source of truth for catalogue and access rules.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod seed;
pub mod service;
pub mod view;

pub use config::{AppConfig, ConfigError};
pub use db::{open_db, open_db_in_memory, DbError, DbResult};
pub use logging::{default_log_level, init_logging, logging_status, LoggingError};
pub use model::account::{Group, Identity, IdentityId, Permission, Role, UserProfile};
pub use model::catalog::{
    Author, AuthorId, Book, BookId, BookWithAuthor, Librarian, LibrarianId, Library, LibraryId,
};
pub use model::validation::ValidationError;
pub use repo::account_repo::{AccountRepository, SqliteAccountRepository};
pub use repo::catalog_repo::{AuthorBookCount, CatalogRepository, SqliteCatalogRepository};
pub use repo::{EntityKind, IntegrityViolation, RepoError, RepoResult};
pub use seed::{
    assign_roles, seed_sample_data, setup_permissions, Dataset, PermissionReport, RoleReport,
    SeedCounts, SeedReport, ADMIN_EMAIL, ADMIN_USERNAME,
};
pub use service::access_service::{has_permission, has_role, AccessService, Registration};
pub use service::book_service::{BookForm, BookService};
pub use service::error::{AmbiguousMatch, Requirement, ServiceError, ServiceResult};
pub use service::query_service::{MatchPolicy, QueryService};
pub use service::request::RequestContext;
pub use view::{Site, ViewOutcome};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}

#[cfg(test)]
mod tests {
    use super::core_version;

    #[test]
    fn version_is_not_empty() {
        assert!(!core_version().is_empty());
    }
}
