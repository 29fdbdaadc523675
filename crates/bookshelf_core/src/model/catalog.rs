//! Catalogue domain model: authors, books, libraries and librarians.
//!
//! # Responsibility
//! - Define the records held by the entity store.
//! - Validate required text fields before persistence.
//!
//! # Invariants
//! - A `Book` always names exactly one author (`author_uuid`).
//! - A `Librarian` staffs exactly one library; a library has at most one.
//! - Names and titles are non-blank.

use crate::model::validation::{is_blank, ValidationError};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

pub type AuthorId = Uuid;
pub type BookId = Uuid;
pub type LibraryId = Uuid;
pub type LibrarianId = Uuid;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Author {
    pub uuid: AuthorId,
    pub name: String,
}

impl Author {
    /// Creates a new author with a generated stable ID.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) {
            return Err(ValidationError::EmptyAuthorName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Book {
    pub uuid: BookId,
    pub title: String,
    /// Owning author. Deleting the author deletes the book.
    pub author_uuid: AuthorId,
}

impl Book {
    /// Creates a new book for `author_uuid` with a generated stable ID.
    ///
    /// The author reference is checked by the store, not here.
    pub fn new(title: impl Into<String>, author_uuid: AuthorId) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            title: title.into(),
            author_uuid,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.title) {
            return Err(ValidationError::EmptyBookTitle);
        }
        Ok(())
    }
}

/// Book joined with its author's display name, for listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookWithAuthor {
    pub book: Book,
    pub author_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Library {
    pub uuid: LibraryId,
    /// Unique across all libraries.
    pub name: String,
}

impl Library {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) {
            return Err(ValidationError::EmptyLibraryName);
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Librarian {
    pub uuid: LibrarianId,
    pub name: String,
    pub library_uuid: LibraryId,
}

impl Librarian {
    pub fn new(name: impl Into<String>, library_uuid: LibraryId) -> Self {
        Self {
            uuid: Uuid::new_v4(),
            name: name.into(),
            library_uuid,
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        if is_blank(&self.name) {
            return Err(ValidationError::EmptyLibrarianName);
        }
        Ok(())
    }
}
