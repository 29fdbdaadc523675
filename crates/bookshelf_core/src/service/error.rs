//! Service-level error taxonomy.

use crate::model::account::{IdentityId, Permission, Role};
use crate::model::validation::ValidationError;
use crate::repo::{EntityKind, IntegrityViolation, RepoError};
use serde::Serialize;
use std::error::Error;
use std::fmt::{Display, Formatter};
use uuid::Uuid;

pub type ServiceResult<T> = Result<T, ServiceError>;

/// Name lookup that matched more than one record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AmbiguousMatch {
    pub kind: EntityKind,
    pub key: String,
    pub candidates: usize,
    /// Earliest-inserted candidate, used when the caller accepts first match.
    pub chosen: Uuid,
}

impl Display for AmbiguousMatch {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} name `{}` matches {} records; using first match {}",
            self.kind, self.key, self.candidates, self.chosen
        )
    }
}

/// Access requirement an identity failed to meet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Role(Role),
    Permission(Permission),
}

impl Display for Requirement {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Role(role) => write!(f, "role `{role}`"),
            Self::Permission(permission) => write!(f, "permission `{permission}`"),
        }
    }
}

/// Caller-facing error for service operations. Every variant is recoverable.
#[derive(Debug)]
pub enum ServiceError {
    NotFound {
        kind: EntityKind,
        key: String,
    },
    AmbiguousMatch(AmbiguousMatch),
    Integrity(IntegrityViolation),
    PermissionDenied {
        identity: IdentityId,
        requirement: Requirement,
    },
    AuthenticationRequired,
    Validation(ValidationError),
    Repo(RepoError),
}

impl ServiceError {
    pub(crate) fn not_found(kind: EntityKind, key: impl Display) -> Self {
        Self::NotFound {
            kind,
            key: key.to_string(),
        }
    }
}

impl Display for ServiceError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NotFound { kind, key } => write!(f, "{kind} not found: {key}"),
            Self::AmbiguousMatch(details) => write!(f, "ambiguous match: {details}"),
            Self::Integrity(err) => write!(f, "integrity violation: {err}"),
            Self::PermissionDenied {
                identity,
                requirement,
            } => write!(f, "identity {identity} lacks {requirement}"),
            Self::AuthenticationRequired => write!(f, "authentication required"),
            Self::Validation(err) => write!(f, "{err}"),
            Self::Repo(err) => write!(f, "{err}"),
        }
    }
}

impl Error for ServiceError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Integrity(err) => Some(err),
            Self::Validation(err) => Some(err),
            Self::Repo(err) => Some(err),
            _ => None,
        }
    }
}

impl From<RepoError> for ServiceError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::NotFound { kind, key } => Self::NotFound { kind, key },
            RepoError::Integrity(violation) => Self::Integrity(violation),
            RepoError::Validation(err) => Self::Validation(err),
            other => Self::Repo(other),
        }
    }
}

impl From<ValidationError> for ServiceError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}
