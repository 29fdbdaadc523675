//! Catalogue repository contracts and SQLite implementation.
//!
//! # Responsibility
//! - Provide CRUD for authors, books, libraries and librarians.
//! - Provide relationship traversals (author -> books, library <-> books,
//!   library -> librarian) used by the query layer.
//!
//! # Invariants
//! - Book writes reject a missing author (`DanglingAuthor`).
//! - A library has at most one librarian (`LibraryAlreadyStaffed`).
//! - Name lookups return rows in insertion order so "first match" is stable.
//! - Listings are ordered by name/title, then id.

use crate::model::catalog::{
    Author, AuthorId, Book, BookId, BookWithAuthor, Librarian, LibrarianId, Library, LibraryId,
};
use crate::repo::error::{EntityKind, IntegrityViolation, RepoError, RepoResult};
use crate::repo::sql::{count, exists, parse_uuid, write_atomically};
use rusqlite::types::Value;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};

const AUTHOR_SELECT_SQL: &str = "SELECT uuid, name FROM authors";
const BOOK_SELECT_SQL: &str = "SELECT uuid, title, author_uuid FROM books";
const BOOK_WITH_AUTHOR_SELECT_SQL: &str = "SELECT
    b.uuid AS uuid,
    b.title AS title,
    b.author_uuid AS author_uuid,
    a.name AS author_name
FROM books b
INNER JOIN authors a ON a.uuid = b.author_uuid";
const LIBRARY_SELECT_SQL: &str = "SELECT uuid, name FROM libraries";
const LIBRARIAN_SELECT_SQL: &str = "SELECT uuid, name, library_uuid FROM librarians";

/// Author paired with the number of books they wrote.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct AuthorBookCount {
    pub author: Author,
    pub book_count: u64,
}

/// Repository interface for the catalogue entity store.
pub trait CatalogRepository {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId>;
    fn update_author(&self, author: &Author) -> RepoResult<()>;
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;
    /// Exact-name matches in insertion order.
    fn find_authors_by_name(&self, name: &str) -> RepoResult<Vec<Author>>;
    fn list_authors(&self) -> RepoResult<Vec<Author>>;
    /// Deletes the author together with their books and those books' holdings.
    fn delete_author(&self, id: AuthorId) -> RepoResult<()>;
    fn book_counts_by_author(&self) -> RepoResult<Vec<AuthorBookCount>>;

    /// Creates a book and shelves it in `holdings` atomically.
    fn create_book(&self, book: &Book, holdings: &[LibraryId]) -> RepoResult<BookId>;
    fn update_book(&self, book: &Book) -> RepoResult<()>;
    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;
    fn get_book_with_author(&self, id: BookId) -> RepoResult<Option<BookWithAuthor>>;
    /// Exact-title matches in insertion order.
    fn find_books_by_title(&self, title: &str) -> RepoResult<Vec<Book>>;
    fn list_books(&self) -> RepoResult<Vec<BookWithAuthor>>;
    /// Most recently added books first.
    fn recent_books(&self, limit: u32) -> RepoResult<Vec<BookWithAuthor>>;
    fn books_by_author(&self, author: AuthorId) -> RepoResult<Vec<Book>>;
    fn delete_book(&self, id: BookId) -> RepoResult<()>;
    fn count_books(&self) -> RepoResult<u64>;

    fn create_library(&self, library: &Library) -> RepoResult<LibraryId>;
    fn update_library(&self, library: &Library) -> RepoResult<()>;
    fn get_library(&self, id: LibraryId) -> RepoResult<Option<Library>>;
    fn find_library_by_name(&self, name: &str) -> RepoResult<Option<Library>>;
    fn list_libraries(&self) -> RepoResult<Vec<Library>>;
    /// Deletes the library together with its librarian and holdings.
    fn delete_library(&self, id: LibraryId) -> RepoResult<()>;
    fn count_libraries(&self) -> RepoResult<u64>;

    /// Shelves a book in a library. Shelving twice is a no-op.
    fn add_book_to_library(&self, library: LibraryId, book: BookId) -> RepoResult<()>;
    /// Returns whether a holding was removed.
    fn remove_book_from_library(&self, library: LibraryId, book: BookId) -> RepoResult<bool>;
    fn books_in_library(&self, library: LibraryId) -> RepoResult<Vec<BookWithAuthor>>;
    fn libraries_for_book(&self, book: BookId) -> RepoResult<Vec<Library>>;
    /// Distinct authors of the books held by `library`.
    fn authors_in_library(&self, library: LibraryId) -> RepoResult<Vec<Author>>;
    /// Distinct books held across all of `libraries`.
    fn count_distinct_books_in(&self, libraries: &[LibraryId]) -> RepoResult<u64>;

    fn create_librarian(&self, librarian: &Librarian) -> RepoResult<LibrarianId>;
    fn update_librarian(&self, librarian: &Librarian) -> RepoResult<()>;
    fn get_librarian(&self, id: LibrarianId) -> RepoResult<Option<Librarian>>;
    fn librarian_for_library(&self, library: LibraryId) -> RepoResult<Option<Librarian>>;
    /// Librarians named exactly `name`, earliest first.
    fn find_librarians_by_name(&self, name: &str) -> RepoResult<Vec<Librarian>>;
    fn list_librarians(&self) -> RepoResult<Vec<Librarian>>;
    fn delete_librarian(&self, id: LibrarianId) -> RepoResult<()>;
    /// Libraries whose librarian carries exactly `name`.
    fn libraries_staffed_by(&self, name: &str) -> RepoResult<Vec<Library>>;
}

/// SQLite-backed catalogue repository.
pub struct SqliteCatalogRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteCatalogRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl CatalogRepository for SqliteCatalogRepository<'_> {
    fn create_author(&self, author: &Author) -> RepoResult<AuthorId> {
        author.validate()?;
        write_atomically(self.conn, |conn| {
            conn.execute(
                "INSERT INTO authors (uuid, name) VALUES (?1, ?2);",
                params![author.uuid.to_string(), author.name.as_str()],
            )?;
            Ok(author.uuid)
        })
    }

    fn update_author(&self, author: &Author) -> RepoResult<()> {
        author.validate()?;
        let changed = self.conn.execute(
            "UPDATE authors SET name = ?1 WHERE uuid = ?2;",
            params![author.name.as_str(), author.uuid.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Author, author.uuid));
        }
        Ok(())
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        query_optional(
            self.conn,
            &format!("{AUTHOR_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            parse_author_row,
        )
    }

    fn find_authors_by_name(&self, name: &str) -> RepoResult<Vec<Author>> {
        query_all(
            self.conn,
            &format!("{AUTHOR_SELECT_SQL} WHERE name = ?1 ORDER BY rowid ASC;"),
            [name],
            parse_author_row,
        )
    }

    fn list_authors(&self) -> RepoResult<Vec<Author>> {
        query_all(
            self.conn,
            &format!("{AUTHOR_SELECT_SQL} ORDER BY name ASC, uuid ASC;"),
            [],
            parse_author_row,
        )
    }

    fn delete_author(&self, id: AuthorId) -> RepoResult<()> {
        write_atomically(self.conn, |conn| {
            let changed = conn.execute("DELETE FROM authors WHERE uuid = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::not_found(EntityKind::Author, id));
            }
            Ok(())
        })
    }

    fn book_counts_by_author(&self) -> RepoResult<Vec<AuthorBookCount>> {
        query_all(
            self.conn,
            "SELECT a.uuid AS uuid, a.name AS name, COUNT(b.uuid) AS book_count
             FROM authors a
             LEFT JOIN books b ON b.author_uuid = a.uuid
             GROUP BY a.uuid, a.name
             ORDER BY a.name ASC, a.uuid ASC;",
            [],
            |row| {
                let book_count: i64 = row.get("book_count")?;
                Ok(AuthorBookCount {
                    author: parse_author_row(row)?,
                    book_count: u64::try_from(book_count).map_err(|_| {
                        RepoError::InvalidData(format!("negative book count {book_count}"))
                    })?,
                })
            },
        )
    }

    fn create_book(&self, book: &Book, holdings: &[LibraryId]) -> RepoResult<BookId> {
        book.validate()?;
        write_atomically(self.conn, |conn| {
            ensure_author_exists(conn, book.author_uuid)?;
            conn.execute(
                "INSERT INTO books (uuid, title, author_uuid) VALUES (?1, ?2, ?3);",
                params![
                    book.uuid.to_string(),
                    book.title.as_str(),
                    book.author_uuid.to_string(),
                ],
            )?;
            for library in holdings {
                ensure_library_exists(conn, *library)?;
                insert_holding(conn, *library, book.uuid)?;
            }
            Ok(book.uuid)
        })
    }

    fn update_book(&self, book: &Book) -> RepoResult<()> {
        book.validate()?;
        write_atomically(self.conn, |conn| {
            ensure_author_exists(conn, book.author_uuid)?;
            let changed = conn.execute(
                "UPDATE books SET title = ?1, author_uuid = ?2 WHERE uuid = ?3;",
                params![
                    book.title.as_str(),
                    book.author_uuid.to_string(),
                    book.uuid.to_string(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(EntityKind::Book, book.uuid));
            }
            Ok(())
        })
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        query_optional(
            self.conn,
            &format!("{BOOK_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            parse_book_row,
        )
    }

    fn get_book_with_author(&self, id: BookId) -> RepoResult<Option<BookWithAuthor>> {
        query_optional(
            self.conn,
            &format!("{BOOK_WITH_AUTHOR_SELECT_SQL} WHERE b.uuid = ?1;"),
            [id.to_string()],
            parse_book_with_author_row,
        )
    }

    fn find_books_by_title(&self, title: &str) -> RepoResult<Vec<Book>> {
        query_all(
            self.conn,
            &format!("{BOOK_SELECT_SQL} WHERE title = ?1 ORDER BY rowid ASC;"),
            [title],
            parse_book_row,
        )
    }

    fn list_books(&self) -> RepoResult<Vec<BookWithAuthor>> {
        query_all(
            self.conn,
            &format!("{BOOK_WITH_AUTHOR_SELECT_SQL} ORDER BY b.title ASC, b.uuid ASC;"),
            [],
            parse_book_with_author_row,
        )
    }

    fn recent_books(&self, limit: u32) -> RepoResult<Vec<BookWithAuthor>> {
        query_all(
            self.conn,
            &format!("{BOOK_WITH_AUTHOR_SELECT_SQL} ORDER BY b.rowid DESC LIMIT ?1;"),
            [i64::from(limit)],
            parse_book_with_author_row,
        )
    }

    fn books_by_author(&self, author: AuthorId) -> RepoResult<Vec<Book>> {
        query_all(
            self.conn,
            &format!("{BOOK_SELECT_SQL} WHERE author_uuid = ?1 ORDER BY title ASC, uuid ASC;"),
            [author.to_string()],
            parse_book_row,
        )
    }

    fn delete_book(&self, id: BookId) -> RepoResult<()> {
        write_atomically(self.conn, |conn| {
            let changed = conn.execute("DELETE FROM books WHERE uuid = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::not_found(EntityKind::Book, id));
            }
            Ok(())
        })
    }

    fn count_books(&self) -> RepoResult<u64> {
        count(self.conn, "SELECT COUNT(*) FROM books;", [])
    }

    fn create_library(&self, library: &Library) -> RepoResult<LibraryId> {
        library.validate()?;
        write_atomically(self.conn, |conn| {
            if exists(
                conn,
                "SELECT EXISTS(SELECT 1 FROM libraries WHERE name = ?1);",
                [library.name.as_str()],
            )? {
                return Err(IntegrityViolation::DuplicateLibraryName(library.name.clone()).into());
            }
            conn.execute(
                "INSERT INTO libraries (uuid, name) VALUES (?1, ?2);",
                params![library.uuid.to_string(), library.name.as_str()],
            )?;
            Ok(library.uuid)
        })
    }

    fn update_library(&self, library: &Library) -> RepoResult<()> {
        library.validate()?;
        write_atomically(self.conn, |conn| {
            if exists(
                conn,
                "SELECT EXISTS(SELECT 1 FROM libraries WHERE name = ?1 AND uuid <> ?2);",
                params![library.name.as_str(), library.uuid.to_string()],
            )? {
                return Err(IntegrityViolation::DuplicateLibraryName(library.name.clone()).into());
            }
            let changed = conn.execute(
                "UPDATE libraries SET name = ?1 WHERE uuid = ?2;",
                params![library.name.as_str(), library.uuid.to_string()],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(EntityKind::Library, library.uuid));
            }
            Ok(())
        })
    }

    fn get_library(&self, id: LibraryId) -> RepoResult<Option<Library>> {
        query_optional(
            self.conn,
            &format!("{LIBRARY_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            parse_library_row,
        )
    }

    fn find_library_by_name(&self, name: &str) -> RepoResult<Option<Library>> {
        query_optional(
            self.conn,
            &format!("{LIBRARY_SELECT_SQL} WHERE name = ?1;"),
            [name],
            parse_library_row,
        )
    }

    fn list_libraries(&self) -> RepoResult<Vec<Library>> {
        query_all(
            self.conn,
            &format!("{LIBRARY_SELECT_SQL} ORDER BY name ASC, uuid ASC;"),
            [],
            parse_library_row,
        )
    }

    fn delete_library(&self, id: LibraryId) -> RepoResult<()> {
        write_atomically(self.conn, |conn| {
            let changed =
                conn.execute("DELETE FROM libraries WHERE uuid = ?1;", [id.to_string()])?;
            if changed == 0 {
                return Err(RepoError::not_found(EntityKind::Library, id));
            }
            Ok(())
        })
    }

    fn count_libraries(&self) -> RepoResult<u64> {
        count(self.conn, "SELECT COUNT(*) FROM libraries;", [])
    }

    fn add_book_to_library(&self, library: LibraryId, book: BookId) -> RepoResult<()> {
        write_atomically(self.conn, |conn| {
            ensure_library_exists(conn, library)?;
            if !exists(
                conn,
                "SELECT EXISTS(SELECT 1 FROM books WHERE uuid = ?1);",
                [book.to_string()],
            )? {
                return Err(IntegrityViolation::UnknownBook(book).into());
            }
            insert_holding(conn, library, book)
        })
    }

    fn remove_book_from_library(&self, library: LibraryId, book: BookId) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM library_books WHERE library_uuid = ?1 AND book_uuid = ?2;",
            params![library.to_string(), book.to_string()],
        )?;
        Ok(changed > 0)
    }

    fn books_in_library(&self, library: LibraryId) -> RepoResult<Vec<BookWithAuthor>> {
        query_all(
            self.conn,
            &format!(
                "{BOOK_WITH_AUTHOR_SELECT_SQL}
                 INNER JOIN library_books lb ON lb.book_uuid = b.uuid
                 WHERE lb.library_uuid = ?1
                 ORDER BY b.title ASC, b.uuid ASC;"
            ),
            [library.to_string()],
            parse_book_with_author_row,
        )
    }

    fn libraries_for_book(&self, book: BookId) -> RepoResult<Vec<Library>> {
        query_all(
            self.conn,
            "SELECT l.uuid AS uuid, l.name AS name
             FROM libraries l
             INNER JOIN library_books lb ON lb.library_uuid = l.uuid
             WHERE lb.book_uuid = ?1
             ORDER BY l.name ASC, l.uuid ASC;",
            [book.to_string()],
            parse_library_row,
        )
    }

    fn authors_in_library(&self, library: LibraryId) -> RepoResult<Vec<Author>> {
        query_all(
            self.conn,
            "SELECT DISTINCT a.uuid AS uuid, a.name AS name
             FROM authors a
             INNER JOIN books b ON b.author_uuid = a.uuid
             INNER JOIN library_books lb ON lb.book_uuid = b.uuid
             WHERE lb.library_uuid = ?1
             ORDER BY a.name ASC, a.uuid ASC;",
            [library.to_string()],
            parse_author_row,
        )
    }

    fn count_distinct_books_in(&self, libraries: &[LibraryId]) -> RepoResult<u64> {
        if libraries.is_empty() {
            return Ok(0);
        }
        let placeholders = vec!["?"; libraries.len()].join(", ");
        let bind_values: Vec<Value> = libraries
            .iter()
            .map(|id| Value::Text(id.to_string()))
            .collect();
        count(
            self.conn,
            &format!(
                "SELECT COUNT(DISTINCT book_uuid)
                 FROM library_books
                 WHERE library_uuid IN ({placeholders});"
            ),
            params_from_iter(bind_values),
        )
    }

    fn create_librarian(&self, librarian: &Librarian) -> RepoResult<LibrarianId> {
        librarian.validate()?;
        write_atomically(self.conn, |conn| {
            ensure_library_unstaffed(conn, librarian)?;
            conn.execute(
                "INSERT INTO librarians (uuid, name, library_uuid) VALUES (?1, ?2, ?3);",
                params![
                    librarian.uuid.to_string(),
                    librarian.name.as_str(),
                    librarian.library_uuid.to_string(),
                ],
            )?;
            Ok(librarian.uuid)
        })
    }

    fn update_librarian(&self, librarian: &Librarian) -> RepoResult<()> {
        librarian.validate()?;
        write_atomically(self.conn, |conn| {
            ensure_library_unstaffed(conn, librarian)?;
            let changed = conn.execute(
                "UPDATE librarians SET name = ?1, library_uuid = ?2 WHERE uuid = ?3;",
                params![
                    librarian.name.as_str(),
                    librarian.library_uuid.to_string(),
                    librarian.uuid.to_string(),
                ],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(EntityKind::Librarian, librarian.uuid));
            }
            Ok(())
        })
    }

    fn get_librarian(&self, id: LibrarianId) -> RepoResult<Option<Librarian>> {
        query_optional(
            self.conn,
            &format!("{LIBRARIAN_SELECT_SQL} WHERE uuid = ?1;"),
            [id.to_string()],
            parse_librarian_row,
        )
    }

    fn librarian_for_library(&self, library: LibraryId) -> RepoResult<Option<Librarian>> {
        query_optional(
            self.conn,
            &format!("{LIBRARIAN_SELECT_SQL} WHERE library_uuid = ?1;"),
            [library.to_string()],
            parse_librarian_row,
        )
    }

    fn find_librarians_by_name(&self, name: &str) -> RepoResult<Vec<Librarian>> {
        query_all(
            self.conn,
            &format!("{LIBRARIAN_SELECT_SQL} WHERE name = ?1 ORDER BY rowid ASC;"),
            [name],
            parse_librarian_row,
        )
    }

    fn list_librarians(&self) -> RepoResult<Vec<Librarian>> {
        query_all(
            self.conn,
            &format!("{LIBRARIAN_SELECT_SQL} ORDER BY name ASC, uuid ASC;"),
            [],
            parse_librarian_row,
        )
    }

    fn delete_librarian(&self, id: LibrarianId) -> RepoResult<()> {
        let changed = self
            .conn
            .execute("DELETE FROM librarians WHERE uuid = ?1;", [id.to_string()])?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Librarian, id));
        }
        Ok(())
    }

    fn libraries_staffed_by(&self, name: &str) -> RepoResult<Vec<Library>> {
        query_all(
            self.conn,
            "SELECT l.uuid AS uuid, l.name AS name
             FROM libraries l
             INNER JOIN librarians r ON r.library_uuid = l.uuid
             WHERE r.name = ?1
             ORDER BY l.name ASC, l.uuid ASC;",
            [name],
            parse_library_row,
        )
    }
}

fn query_all<T, P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(parse(row)?);
    }
    Ok(items)
}

fn query_optional<T, P: rusqlite::Params>(
    conn: &Connection,
    sql: &str,
    params: P,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query(params)?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

fn ensure_author_exists(conn: &Connection, author: AuthorId) -> RepoResult<()> {
    if exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM authors WHERE uuid = ?1);",
        [author.to_string()],
    )? {
        Ok(())
    } else {
        Err(IntegrityViolation::DanglingAuthor(author).into())
    }
}

fn ensure_library_exists(conn: &Connection, library: LibraryId) -> RepoResult<()> {
    if exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM libraries WHERE uuid = ?1);",
        [library.to_string()],
    )? {
        Ok(())
    } else {
        Err(IntegrityViolation::UnknownLibrary(library).into())
    }
}

/// Rejects pairing `librarian` with a library already staffed by someone else.
fn ensure_library_unstaffed(conn: &Connection, librarian: &Librarian) -> RepoResult<()> {
    ensure_library_exists(conn, librarian.library_uuid)?;
    let current: Option<String> = conn
        .query_row(
            "SELECT uuid FROM librarians WHERE library_uuid = ?1;",
            [librarian.library_uuid.to_string()],
            |row| row.get(0),
        )
        .optional()?;
    match current {
        Some(uuid_text) => {
            let current_id = parse_uuid(&uuid_text, "librarians.uuid")?;
            if current_id == librarian.uuid {
                Ok(())
            } else {
                Err(IntegrityViolation::LibraryAlreadyStaffed {
                    library: librarian.library_uuid,
                    librarian: current_id,
                }
                .into())
            }
        }
        None => Ok(()),
    }
}

fn insert_holding(conn: &Connection, library: LibraryId, book: BookId) -> RepoResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO library_books (library_uuid, book_uuid) VALUES (?1, ?2);",
        params![library.to_string(), book.to_string()],
    )?;
    Ok(())
}

fn parse_author_row(row: &Row<'_>) -> RepoResult<Author> {
    let uuid_text: String = row.get("uuid")?;
    let author = Author {
        uuid: parse_uuid(&uuid_text, "authors.uuid")?,
        name: row.get("name")?,
    };
    author.validate()?;
    Ok(author)
}

fn parse_book_row(row: &Row<'_>) -> RepoResult<Book> {
    let uuid_text: String = row.get("uuid")?;
    let author_text: String = row.get("author_uuid")?;
    let book = Book {
        uuid: parse_uuid(&uuid_text, "books.uuid")?,
        title: row.get("title")?,
        author_uuid: parse_uuid(&author_text, "books.author_uuid")?,
    };
    book.validate()?;
    Ok(book)
}

fn parse_book_with_author_row(row: &Row<'_>) -> RepoResult<BookWithAuthor> {
    Ok(BookWithAuthor {
        book: parse_book_row(row)?,
        author_name: row.get("author_name")?,
    })
}

fn parse_library_row(row: &Row<'_>) -> RepoResult<Library> {
    let uuid_text: String = row.get("uuid")?;
    let library = Library {
        uuid: parse_uuid(&uuid_text, "libraries.uuid")?,
        name: row.get("name")?,
    };
    library.validate()?;
    Ok(library)
}

fn parse_librarian_row(row: &Row<'_>) -> RepoResult<Librarian> {
    let uuid_text: String = row.get("uuid")?;
    let library_text: String = row.get("library_uuid")?;
    let librarian = Librarian {
        uuid: parse_uuid(&uuid_text, "librarians.uuid")?,
        name: row.get("name")?,
        library_uuid: parse_uuid(&library_text, "librarians.library_uuid")?,
    };
    librarian.validate()?;
    Ok(librarian)
}
