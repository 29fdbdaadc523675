//! Permission-gated book mutations.
//!
//! # Invariants
//! - Each mutation checks its fine-grained permission before touching the
//!   store; the caller's role is never consulted.
//! - `edit_book` replaces title and author only; library holdings stay.

use crate::model::account::Permission;
use crate::model::catalog::{AuthorId, Book, BookId, LibraryId};
use crate::repo::account_repo::AccountRepository;
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::EntityKind;
use crate::service::access_service::AccessService;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::request::RequestContext;
use log::info;
use serde::{Deserialize, Serialize};

/// Submitted book form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookForm {
    pub title: String,
    pub author_uuid: AuthorId,
    /// Libraries that should hold a newly added book.
    #[serde(default)]
    pub library_uuids: Vec<LibraryId>,
}

impl BookForm {
    pub fn new(title: impl Into<String>, author_uuid: AuthorId) -> Self {
        Self {
            title: title.into(),
            author_uuid,
            library_uuids: Vec::new(),
        }
    }

    pub fn with_libraries(mut self, libraries: impl IntoIterator<Item = LibraryId>) -> Self {
        self.library_uuids = libraries.into_iter().collect();
        self
    }

    /// Form pre-filled from an existing book.
    pub fn from_book(book: &Book) -> Self {
        Self::new(book.title.clone(), book.author_uuid)
    }
}

/// Book create/update/delete behind `can_*_book` permissions.
pub struct BookService<C: CatalogRepository, A: AccountRepository> {
    catalog: C,
    access: AccessService<A>,
}

impl<C: CatalogRepository, A: AccountRepository> BookService<C, A> {
    pub fn new(catalog: C, accounts: A) -> Self {
        Self {
            catalog,
            access: AccessService::new(accounts),
        }
    }

    /// Creates a book and its holdings. Requires `can_add_book`.
    ///
    /// # Errors
    /// - `Integrity(DanglingAuthor)` when the author does not exist.
    /// - `Integrity(UnknownLibrary)` when a holding names a missing library.
    pub fn add_book(&self, ctx: &RequestContext, form: &BookForm) -> ServiceResult<Book> {
        let actor = self.access.require_permission(ctx, Permission::AddBook)?;
        let book = Book::new(form.title.trim(), form.author_uuid);
        self.catalog.create_book(&book, &form.library_uuids)?;
        info!(
            "event=book_add module=book status=ok actor={} book={}",
            actor.uuid, book.uuid
        );
        Ok(book)
    }

    /// Loads a book for editing. Requires `can_change_book`.
    pub fn book_for_edit(&self, ctx: &RequestContext, id: BookId) -> ServiceResult<Book> {
        self.access.require_permission(ctx, Permission::ChangeBook)?;
        self.load(id)
    }

    /// Replaces title and author of book `id`. Requires `can_change_book`.
    pub fn edit_book(&self, ctx: &RequestContext, id: BookId, form: &BookForm) -> ServiceResult<Book> {
        let actor = self.access.require_permission(ctx, Permission::ChangeBook)?;
        let mut book = self.load(id)?;
        book.title = form.title.trim().to_string();
        book.author_uuid = form.author_uuid;
        self.catalog.update_book(&book)?;
        info!(
            "event=book_edit module=book status=ok actor={} book={}",
            actor.uuid, book.uuid
        );
        Ok(book)
    }

    /// Loads a book for delete confirmation. Requires `can_delete_book`.
    pub fn book_for_delete(&self, ctx: &RequestContext, id: BookId) -> ServiceResult<Book> {
        self.access.require_permission(ctx, Permission::DeleteBook)?;
        self.load(id)
    }

    /// Deletes book `id` and its holdings. Requires `can_delete_book`.
    pub fn delete_book(&self, ctx: &RequestContext, id: BookId) -> ServiceResult<Book> {
        let actor = self.access.require_permission(ctx, Permission::DeleteBook)?;
        let book = self.load(id)?;
        self.catalog.delete_book(id)?;
        info!(
            "event=book_delete module=book status=ok actor={} book={}",
            actor.uuid, id
        );
        Ok(book)
    }

    fn load(&self, id: BookId) -> ServiceResult<Book> {
        self.catalog
            .get_book(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Book, id))
    }
}
