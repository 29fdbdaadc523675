//! Relationship query use-cases.
//!
//! # Responsibility
//! - Answer the catalogue's relationship questions by name or title:
//!   books by author, books in library, librarian of library, libraries
//!   holding a book, authors represented in a library.
//! - Surface ambiguous name matches to the caller instead of hiding them.
//!
//! # Invariants
//! - All operations are read-only.
//! - Result sets are sorted by name/title, then id.
//! - Author names and book titles are not unique; the earliest-inserted
//!   record wins and an `AmbiguousMatch` warning rides along with the value.

use crate::model::catalog::{Author, AuthorId, Book, BookWithAuthor, Librarian, Library};
use crate::repo::catalog_repo::{AuthorBookCount, CatalogRepository};
use crate::repo::EntityKind;
use crate::service::error::{AmbiguousMatch, ServiceError, ServiceResult};
use log::warn;
use serde::Serialize;

/// How to treat a name that matches more than one record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatchPolicy {
    /// Take the earliest-inserted match and report the ambiguity.
    #[default]
    FirstMatch,
    /// Fail with `ServiceError::AmbiguousMatch`.
    Strict,
}

/// Query value plus an optional ambiguity warning.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Lookup<T> {
    pub value: T,
    pub warning: Option<AmbiguousMatch>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AuthorBooks {
    pub author: Author,
    pub books: Vec<Book>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibraryBooks {
    pub library: Library,
    pub books: Vec<BookWithAuthor>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BookLibraries {
    pub book: Book,
    pub libraries: Vec<Library>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LibrarySummary {
    pub library: Library,
    pub librarian: Option<Librarian>,
    pub book_count: usize,
    pub author_count: usize,
}

/// Read-only relationship queries over a catalogue repository.
pub struct QueryService<R: CatalogRepository> {
    repo: R,
}

impl<R: CatalogRepository> QueryService<R> {
    pub fn new(repo: R) -> Self {
        Self { repo }
    }

    /// Resolves an author by exact name.
    ///
    /// # Errors
    /// - `NotFound` when no author carries `name`.
    /// - `AmbiguousMatch` when several do and `policy` is `Strict`.
    pub fn resolve_author(&self, name: &str, policy: MatchPolicy) -> ServiceResult<Lookup<Author>> {
        let candidates = self.repo.find_authors_by_name(name)?;
        pick_first(EntityKind::Author, name, candidates, policy, |author| {
            author.uuid
        })
    }

    /// Books written by the author named `name`.
    ///
    /// With several same-named authors the first one's books are returned
    /// and `warning` is set.
    pub fn books_by_author(&self, name: &str) -> ServiceResult<Lookup<AuthorBooks>> {
        let Lookup {
            value: author,
            warning,
        } = self.resolve_author(name, MatchPolicy::FirstMatch)?;
        let books = self.repo.books_by_author(author.uuid)?;
        Ok(Lookup {
            value: AuthorBooks { author, books },
            warning,
        })
    }

    /// Books written by the author with stable id `id`.
    pub fn books_by_author_id(&self, id: AuthorId) -> ServiceResult<AuthorBooks> {
        let author = self
            .repo
            .get_author(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Author, id))?;
        let books = self.repo.books_by_author(author.uuid)?;
        Ok(AuthorBooks { author, books })
    }

    pub fn books_in_library(&self, name: &str) -> ServiceResult<LibraryBooks> {
        let library = self.library_by_name(name)?;
        let books = self.repo.books_in_library(library.uuid)?;
        Ok(LibraryBooks { library, books })
    }

    /// The librarian paired with the library named `name`.
    ///
    /// # Errors
    /// - `NotFound { kind: Library }` when the library does not exist.
    /// - `NotFound { kind: Librarian }` when it exists but is unstaffed.
    pub fn librarian_of_library(&self, name: &str) -> ServiceResult<Librarian> {
        let library = self.library_by_name(name)?;
        self.repo
            .librarian_for_library(library.uuid)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Librarian, name))
    }

    pub fn libraries_containing_book(&self, title: &str) -> ServiceResult<Lookup<BookLibraries>> {
        let candidates = self.repo.find_books_by_title(title)?;
        let Lookup {
            value: book,
            warning,
        } = pick_first(
            EntityKind::Book,
            title,
            candidates,
            MatchPolicy::FirstMatch,
            |book| book.uuid,
        )?;
        let libraries = self.repo.libraries_for_book(book.uuid)?;
        Ok(Lookup {
            value: BookLibraries { book, libraries },
            warning,
        })
    }

    /// Distinct authors of the books held by the library named `library_name`.
    pub fn authors_with_books_in(&self, library_name: &str) -> ServiceResult<Vec<Author>> {
        let library = self.library_by_name(library_name)?;
        Ok(self.repo.authors_in_library(library.uuid)?)
    }

    pub fn book_count_by_author(&self) -> ServiceResult<Vec<AuthorBookCount>> {
        Ok(self.repo.book_counts_by_author()?)
    }

    pub fn library_summary(&self, name: &str) -> ServiceResult<LibrarySummary> {
        let library = self.library_by_name(name)?;
        let book_count = self.repo.books_in_library(library.uuid)?.len();
        let author_count = self.repo.authors_in_library(library.uuid)?.len();
        let librarian = self.repo.librarian_for_library(library.uuid)?;
        Ok(LibrarySummary {
            library,
            librarian,
            book_count,
            author_count,
        })
    }

    fn library_by_name(&self, name: &str) -> ServiceResult<Library> {
        self.repo
            .find_library_by_name(name)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Library, name))
    }
}

fn pick_first<T>(
    kind: EntityKind,
    key: &str,
    candidates: Vec<T>,
    policy: MatchPolicy,
    id_of: impl Fn(&T) -> uuid::Uuid,
) -> ServiceResult<Lookup<T>> {
    let total = candidates.len();
    let Some(first) = candidates.into_iter().next() else {
        return Err(ServiceError::not_found(kind, key));
    };
    if total == 1 {
        return Ok(Lookup {
            value: first,
            warning: None,
        });
    }

    let ambiguity = AmbiguousMatch {
        kind,
        key: key.to_string(),
        candidates: total,
        chosen: id_of(&first),
    };
    if policy == MatchPolicy::Strict {
        return Err(ServiceError::AmbiguousMatch(ambiguity));
    }
    warn!(
        "event=lookup_ambiguous module=query status=warn kind={} candidates={} chosen={}",
        kind, total, ambiguity.chosen
    );
    Ok(Lookup {
        value: first,
        warning: Some(ambiguity),
    })
}
