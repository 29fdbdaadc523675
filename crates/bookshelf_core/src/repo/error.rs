//! Repository error taxonomy.

use crate::db::DbError;
use crate::model::validation::ValidationError;
use rusqlite::ErrorCode;
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity family named by not-found and ambiguity reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Author,
    Book,
    Library,
    Librarian,
    Identity,
    Profile,
    Group,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Book => "book",
            Self::Library => "library",
            Self::Librarian => "librarian",
            Self::Identity => "identity",
            Self::Profile => "profile",
            Self::Group => "group",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A write that would break a relational rule of the store.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum IntegrityViolation {
    /// Book references an author that does not exist.
    DanglingAuthor(Uuid),
    /// Holding or librarian references a library that does not exist.
    UnknownLibrary(Uuid),
    /// Holding references a book that does not exist.
    UnknownBook(Uuid),
    /// Grant or membership references an identity that does not exist.
    UnknownIdentity(Uuid),
    /// Library already has its one librarian.
    LibraryAlreadyStaffed { library: Uuid, librarian: Uuid },
    DuplicateLibraryName(String),
    DuplicateUsername(String),
    /// Constraint rejected by SQLite itself (e.g. a concurrent writer won).
    Constraint(String),
}

impl Display for IntegrityViolation {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::DanglingAuthor(id) => write!(f, "author does not exist: {id}"),
            Self::UnknownLibrary(id) => write!(f, "library does not exist: {id}"),
            Self::UnknownBook(id) => write!(f, "book does not exist: {id}"),
            Self::UnknownIdentity(id) => write!(f, "identity does not exist: {id}"),
            Self::LibraryAlreadyStaffed { library, librarian } => write!(
                f,
                "library {library} already has librarian {librarian}"
            ),
            Self::DuplicateLibraryName(name) => write!(f, "library name already in use: {name}"),
            Self::DuplicateUsername(name) => write!(f, "username already in use: {name}"),
            Self::Constraint(message) => write!(f, "constraint violated: {message}"),
        }
    }
}

impl Error for IntegrityViolation {}

/// Generic repository error for persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    Db(DbError),
    NotFound { kind: EntityKind, key: String },
    Integrity(IntegrityViolation),
    InvalidData(String),
}

impl RepoError {
    pub(crate) fn not_found(kind: EntityKind, key: impl Display) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::Db(err) => write!(f, "{err}"),
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::Integrity(err) => write!(f, "integrity violation: {err}"),
            Self::InvalidData(message) => write!(f, "invalid persisted data: {message}"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Db(err) => Some(err),
            Self::Integrity(err) => Some(err),
            Self::NotFound { .. } => None,
            Self::InvalidData(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

impl From<IntegrityViolation> for RepoError {
    fn from(value: IntegrityViolation) -> Self {
        Self::Integrity(value)
    }
}

impl From<DbError> for RepoError {
    fn from(value: DbError) -> Self {
        Self::Db(value)
    }
}

impl From<rusqlite::Error> for RepoError {
    fn from(value: rusqlite::Error) -> Self {
        match &value {
            rusqlite::Error::SqliteFailure(failure, message)
                if failure.code == ErrorCode::ConstraintViolation =>
            {
                let detail = message.clone().unwrap_or_else(|| failure.to_string());
                Self::Integrity(IntegrityViolation::Constraint(detail))
            }
            _ => Self::Db(DbError::Sqlite(value)),
        }
    }
}
