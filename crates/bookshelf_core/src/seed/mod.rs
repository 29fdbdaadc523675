//! Out-of-band provisioning scripts.
//!
//! # Responsibility
//! - Populate sample catalogue data.
//! - Install the role-group permission policy and sync identities into it.
//! - Guarantee an `admin` identity and a profile for every identity.
//!
//! # Invariants
//! - Every script is idempotent: records are matched by their logical key
//!   (author name, book title, library name, librarian name) and never
//!   duplicated.
//! - Each script runs in one immediate transaction. Integrity failures of a
//!   single record are logged and skipped; any other failure rolls the whole
//!   batch back.

pub mod permissions;
pub mod roles;
pub mod sample_data;

pub use permissions::{setup_permissions, GroupPolicy, PermissionReport};
pub use roles::{assign_roles, RoleReport, ADMIN_EMAIL, ADMIN_USERNAME};
pub use sample_data::{seed_sample_data, Dataset};

use crate::model::catalog::{Author, AuthorId, Book, Librarian, Library};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::{RepoError, RepoResult};
use log::warn;
use serde::Serialize;

/// Per-entity outcome counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub created: usize,
    pub existing: usize,
    pub skipped: usize,
}

impl SeedCounts {
    pub fn total(&self) -> usize {
        self.created + self.existing + self.skipped
    }
}

/// Outcome of `seed_sample_data`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SeedReport {
    pub dataset: Dataset,
    pub authors: SeedCounts,
    pub books: SeedCounts,
    pub libraries: SeedCounts,
    pub holdings: SeedCounts,
    pub librarians: SeedCounts,
}

impl SeedReport {
    pub fn created(&self) -> usize {
        self.sections().iter().map(|counts| counts.created).sum()
    }

    pub fn skipped(&self) -> usize {
        self.sections().iter().map(|counts| counts.skipped).sum()
    }

    fn sections(&self) -> [SeedCounts; 5] {
        [
            self.authors,
            self.books,
            self.libraries,
            self.holdings,
            self.librarians,
        ]
    }
}

/// Turns an integrity failure into a skipped record.
pub(crate) fn skip_on_integrity<T>(
    counts: &mut SeedCounts,
    entity: &str,
    result: RepoResult<T>,
) -> RepoResult<Option<T>> {
    match result {
        Ok(value) => Ok(Some(value)),
        Err(RepoError::Integrity(violation)) => {
            warn!(
                "event=seed_skip module=seed status=skipped entity={} reason=\"{}\"",
                entity, violation
            );
            counts.skipped += 1;
            Ok(None)
        }
        Err(err) => Err(err),
    }
}

/// Earliest author named `name`, created when missing.
pub fn get_or_create_author<R: CatalogRepository + ?Sized>(
    repo: &R,
    name: &str,
    counts: &mut SeedCounts,
) -> RepoResult<Author> {
    if let Some(author) = repo.find_authors_by_name(name)?.into_iter().next() {
        counts.existing += 1;
        return Ok(author);
    }
    let author = Author::new(name);
    repo.create_author(&author)?;
    counts.created += 1;
    Ok(author)
}

/// Earliest book titled `title`, created for `author` when missing. An
/// existing book keeps its author.
pub fn get_or_create_book<R: CatalogRepository + ?Sized>(
    repo: &R,
    title: &str,
    author: AuthorId,
    counts: &mut SeedCounts,
) -> RepoResult<Option<Book>> {
    if let Some(book) = repo.find_books_by_title(title)?.into_iter().next() {
        counts.existing += 1;
        return Ok(Some(book));
    }
    let book = Book::new(title, author);
    let created = skip_on_integrity(counts, "book", repo.create_book(&book, &[]))?;
    if created.is_some() {
        counts.created += 1;
    }
    Ok(created.map(|_| book))
}

/// Library named `name`, created when missing.
pub fn get_or_create_library<R: CatalogRepository + ?Sized>(
    repo: &R,
    name: &str,
    counts: &mut SeedCounts,
) -> RepoResult<Library> {
    if let Some(library) = repo.find_library_by_name(name)? {
        counts.existing += 1;
        return Ok(library);
    }
    let library = Library::new(name);
    repo.create_library(&library)?;
    counts.created += 1;
    Ok(library)
}

/// Earliest librarian named `name`, created for `library` when missing.
///
/// A librarian of that name staffing another library is left in place and
/// counted as skipped.
pub fn get_or_create_librarian<R: CatalogRepository + ?Sized>(
    repo: &R,
    name: &str,
    library: &Library,
    counts: &mut SeedCounts,
) -> RepoResult<Option<Librarian>> {
    if let Some(current) = repo.find_librarians_by_name(name)?.into_iter().next() {
        if current.library_uuid == library.uuid {
            counts.existing += 1;
            return Ok(Some(current));
        }
        warn!(
            "event=seed_skip module=seed status=skipped entity=librarian reason=\"already staffs {}\"",
            current.library_uuid
        );
        counts.skipped += 1;
        return Ok(None);
    }
    let librarian = Librarian::new(name, library.uuid);
    let created = skip_on_integrity(counts, "librarian", repo.create_librarian(&librarian))?;
    if created.is_some() {
        counts.created += 1;
    }
    Ok(created.map(|_| librarian))
}
