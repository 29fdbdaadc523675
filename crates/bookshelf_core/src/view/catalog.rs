//! Public catalogue pages and permission-gated book forms.

use crate::model::account::Permission;
use crate::model::catalog::{Book, BookId, LibraryId};
use crate::repo::catalog_repo::CatalogRepository;
use crate::repo::{EntityKind, IntegrityViolation};
use crate::service::book_service::BookForm;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::request::RequestContext;
use crate::view::{book_detail_url, Site, ViewOutcome, BOOK_LIST_URL};
use serde_json::json;

pub fn list_books(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    let books = site.catalog().list_books()?;
    Ok(ViewOutcome::render(
        "list_books",
        json!({
            "books": books,
            "authenticated": ctx.is_authenticated(),
        }),
    ))
}

pub fn library_list(site: &Site<'_>, _ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    let libraries = site.catalog().list_libraries()?;
    Ok(ViewOutcome::render(
        "library_list",
        json!({ "libraries": libraries }),
    ))
}

/// Library with its books, librarian and distinct author count.
pub fn library_detail(
    site: &Site<'_>,
    ctx: &RequestContext,
    id: LibraryId,
) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, library_page(site, id))
}

/// Book with the libraries holding it.
pub fn book_detail(
    site: &Site<'_>,
    ctx: &RequestContext,
    id: BookId,
) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, book_page(site, id))
}

/// Book creation form. Requires `can_add_book`.
///
/// `None` renders the empty form; a submitted form is saved and redirects
/// to the book list. An unknown author re-renders the form with an error.
pub fn add_book_view(
    site: &Site<'_>,
    ctx: &RequestContext,
    form: Option<BookForm>,
) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, add_book_page(site, ctx, form))
}

/// Book edit form. Requires `can_change_book`.
pub fn edit_book_view(
    site: &Site<'_>,
    ctx: &RequestContext,
    id: BookId,
    form: Option<BookForm>,
) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, edit_book_page(site, ctx, id, form))
}

/// Delete confirmation. Requires `can_delete_book`; the book is removed only
/// when `confirmed`.
pub fn delete_book_view(
    site: &Site<'_>,
    ctx: &RequestContext,
    id: BookId,
    confirmed: bool,
) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, delete_book_page(site, ctx, id, confirmed))
}

fn library_page(site: &Site<'_>, id: LibraryId) -> ServiceResult<ViewOutcome> {
    let catalog = site.catalog();
    let library = catalog
        .get_library(id)?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Library, id))?;
    let summary = site.queries().library_summary(&library.name)?;
    let books = catalog.books_in_library(library.uuid)?;
    Ok(ViewOutcome::render(
        "library_detail",
        json!({
            "library": library,
            "books": books,
            "librarian": summary.librarian,
            "book_count": summary.book_count,
            "author_count": summary.author_count,
        }),
    ))
}

fn book_page(site: &Site<'_>, id: BookId) -> ServiceResult<ViewOutcome> {
    let catalog = site.catalog();
    let book = catalog
        .get_book_with_author(id)?
        .ok_or_else(|| ServiceError::not_found(EntityKind::Book, id))?;
    let libraries = catalog.libraries_for_book(id)?;
    Ok(ViewOutcome::render(
        "book_detail",
        json!({
            "book": book,
            "libraries": libraries,
        }),
    ))
}

fn add_book_page(
    site: &Site<'_>,
    ctx: &RequestContext,
    form: Option<BookForm>,
) -> ServiceResult<ViewOutcome> {
    let Some(form) = form else {
        site.access().require_permission(ctx, Permission::AddBook)?;
        return book_form_page(site, "Add", None, None, None);
    };
    match site.books().add_book(ctx, &form) {
        Ok(book) => Ok(ViewOutcome::redirect(
            BOOK_LIST_URL,
            Some(format!("Book \"{}\" added successfully!", book.title)),
        )),
        Err(err) if is_form_error(&err) => {
            book_form_page(site, "Add", None, Some(&form), Some(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

fn edit_book_page(
    site: &Site<'_>,
    ctx: &RequestContext,
    id: BookId,
    form: Option<BookForm>,
) -> ServiceResult<ViewOutcome> {
    let books = site.books();
    let Some(form) = form else {
        let book = books.book_for_edit(ctx, id)?;
        let prefilled = BookForm::from_book(&book);
        return book_form_page(site, "Edit", Some(&book), Some(&prefilled), None);
    };
    match books.edit_book(ctx, id, &form) {
        Ok(book) => Ok(ViewOutcome::redirect(
            book_detail_url(book.uuid),
            Some("Book updated successfully!".to_string()),
        )),
        Err(err) if is_form_error(&err) => {
            let book = books.book_for_edit(ctx, id)?;
            book_form_page(site, "Edit", Some(&book), Some(&form), Some(err.to_string()))
        }
        Err(err) => Err(err),
    }
}

fn delete_book_page(
    site: &Site<'_>,
    ctx: &RequestContext,
    id: BookId,
    confirmed: bool,
) -> ServiceResult<ViewOutcome> {
    let books = site.books();
    if !confirmed {
        let book = books.book_for_delete(ctx, id)?;
        return Ok(ViewOutcome::render(
            "book_confirm_delete",
            json!({
                "book": book,
                "action": "Delete",
            }),
        ));
    }
    let book = books.delete_book(ctx, id)?;
    Ok(ViewOutcome::redirect(
        BOOK_LIST_URL,
        Some(format!("Book \"{}\" deleted successfully!", book.title)),
    ))
}

fn book_form_page(
    site: &Site<'_>,
    action: &str,
    book: Option<&Book>,
    form: Option<&BookForm>,
    error: Option<String>,
) -> ServiceResult<ViewOutcome> {
    let catalog = site.catalog();
    let authors = catalog.list_authors()?;
    let libraries = catalog.list_libraries()?;
    Ok(ViewOutcome::render(
        "book_form",
        json!({
            "action": action,
            "book": book,
            "form": form,
            "authors": authors,
            "libraries": libraries,
            "error": error,
        }),
    ))
}

/// Errors caused by the submitted values rather than by access or storage.
///
/// Raw SQLite constraint failures are not among them: the repository checks
/// every rule a form can break up front, so those only come from races.
fn is_form_error(err: &ServiceError) -> bool {
    matches!(
        err,
        ServiceError::Validation(_)
            | ServiceError::Integrity(
                IntegrityViolation::DanglingAuthor(_) | IntegrityViolation::UnknownLibrary(_)
            )
    )
}
