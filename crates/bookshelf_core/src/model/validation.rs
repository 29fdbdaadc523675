//! Field validation errors shared by catalogue and account models.

use std::error::Error;
use std::fmt::{Display, Formatter};

/// Rejected field value on a model write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ValidationError {
    EmptyAuthorName,
    EmptyBookTitle,
    EmptyLibraryName,
    EmptyLibrarianName,
    InvalidUsername(String),
    InvalidEmail(String),
    UnknownRole(String),
    UnknownPermission(String),
}

impl Display for ValidationError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::EmptyAuthorName => write!(f, "author name must not be empty"),
            Self::EmptyBookTitle => write!(f, "book title must not be empty"),
            Self::EmptyLibraryName => write!(f, "library name must not be empty"),
            Self::EmptyLibrarianName => write!(f, "librarian name must not be empty"),
            Self::InvalidUsername(value) => write!(
                f,
                "invalid username `{value}`: use 1-150 letters, digits and @/./+/-/_"
            ),
            Self::InvalidEmail(value) => write!(f, "invalid email address `{value}`"),
            Self::UnknownRole(value) => {
                write!(f, "unknown role `{value}`; expected admin|librarian|member")
            }
            Self::UnknownPermission(value) => write!(f, "unknown permission `{value}`"),
        }
    }
}

impl Error for ValidationError {}

pub(crate) fn is_blank(value: &str) -> bool {
    value.trim().is_empty()
}
