use bookshelf_core::db::open_db_in_memory;
use bookshelf_core::{
    Author, Book, CatalogRepository, EntityKind, Librarian, Library, MatchPolicy, QueryService,
    ServiceError, SqliteCatalogRepository,
};
use rusqlite::Connection;

fn titles<'a>(books: impl IntoIterator<Item = &'a Book>) -> Vec<&'a str> {
    books.into_iter().map(|book| book.title.as_str()).collect()
}

/// George Orwell with "1984" and "Animal Farm", both held by "City".
fn seed_orwell(conn: &Connection) -> (Author, Library) {
    let repo = SqliteCatalogRepository::new(conn);
    let orwell = Author::new("George Orwell");
    repo.create_author(&orwell).unwrap();
    let city = Library::new("City");
    repo.create_library(&city).unwrap();
    for title in ["1984", "Animal Farm"] {
        repo.create_book(&Book::new(title, orwell.uuid), &[city.uuid])
            .unwrap();
    }
    (orwell, city)
}

#[test]
fn orwell_city_scenario() {
    let conn = open_db_in_memory().unwrap();
    let (orwell, city) = seed_orwell(&conn);
    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));

    let in_city = queries.books_in_library("City").unwrap();
    assert_eq!(
        titles(in_city.books.iter().map(|entry| &entry.book)),
        vec!["1984", "Animal Farm"]
    );

    let authors = queries.authors_with_books_in("City").unwrap();
    assert_eq!(authors, vec![orwell]);

    let err = queries.librarian_of_library("City").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::Librarian,
            ..
        }
    ));

    let repo = SqliteCatalogRepository::new(&conn);
    let librarian = Librarian::new("Bob Smith", city.uuid);
    repo.create_librarian(&librarian).unwrap();
    assert_eq!(queries.librarian_of_library("City").unwrap(), librarian);
}

#[test]
fn missing_library_is_distinguished_from_missing_librarian() {
    let conn = open_db_in_memory().unwrap();
    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));

    let err = queries.librarian_of_library("Nowhere").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::Library,
            ..
        }
    ));
}

#[test]
fn books_by_author_contains_every_book_of_the_author() {
    let conn = open_db_in_memory().unwrap();
    let (orwell, _) = seed_orwell(&conn);
    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));

    let lookup = queries.books_by_author("George Orwell").unwrap();
    assert!(lookup.warning.is_none());
    assert_eq!(lookup.value.author, orwell);
    assert_eq!(titles(&lookup.value.books), vec!["1984", "Animal Farm"]);

    let by_id = queries.books_by_author_id(orwell.uuid).unwrap();
    assert_eq!(by_id.books, lookup.value.books);
}

#[test]
fn unknown_author_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));

    let err = queries.books_by_author("Nobody").unwrap_err();
    assert!(matches!(
        err,
        ServiceError::NotFound {
            kind: EntityKind::Author,
            ..
        }
    ));
}

#[test]
fn deleted_author_is_not_found_afterwards() {
    let conn = open_db_in_memory().unwrap();
    let (orwell, _) = seed_orwell(&conn);
    let repo = SqliteCatalogRepository::new(&conn);
    repo.delete_author(orwell.uuid).unwrap();

    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));
    assert!(matches!(
        queries.books_by_author("George Orwell"),
        Err(ServiceError::NotFound { .. })
    ));
    assert!(queries
        .books_in_library("City")
        .unwrap()
        .books
        .is_empty());
}

#[test]
fn ambiguous_author_uses_first_match_and_warns() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteCatalogRepository::new(&conn);
    let first = Author::new("John Smith");
    let second = Author::new("John Smith");
    repo.create_author(&first).unwrap();
    repo.create_author(&second).unwrap();
    repo.create_book(&Book::new("First Book", first.uuid), &[])
        .unwrap();
    repo.create_book(&Book::new("Second Book", second.uuid), &[])
        .unwrap();

    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));
    let lookup = queries.books_by_author("John Smith").unwrap();
    assert_eq!(lookup.value.author.uuid, first.uuid);
    assert_eq!(titles(&lookup.value.books), vec!["First Book"]);

    let warning = lookup.warning.expect("ambiguity is reported");
    assert_eq!(warning.kind, EntityKind::Author);
    assert_eq!(warning.candidates, 2);
    assert_eq!(warning.chosen, first.uuid);

    let err = queries
        .resolve_author("John Smith", MatchPolicy::Strict)
        .unwrap_err();
    assert!(matches!(err, ServiceError::AmbiguousMatch(details) if details.candidates == 2));
}

#[test]
fn libraries_containing_book_is_reverse_of_books_in_library() {
    let conn = open_db_in_memory().unwrap();
    let (orwell, city) = seed_orwell(&conn);
    let repo = SqliteCatalogRepository::new(&conn);
    let central = Library::new("Central");
    repo.create_library(&central).unwrap();
    let nineteen = repo.find_books_by_title("1984").unwrap().remove(0);
    repo.add_book_to_library(central.uuid, nineteen.uuid).unwrap();

    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));
    let lookup = queries.libraries_containing_book("1984").unwrap();
    assert!(lookup.warning.is_none());
    assert_eq!(lookup.value.book.author_uuid, orwell.uuid);
    assert_eq!(lookup.value.libraries, vec![central.clone(), city.clone()]);

    for library in [&central, &city] {
        let held = queries.books_in_library(&library.name).unwrap();
        assert!(held.books.iter().any(|entry| entry.book.uuid == nineteen.uuid));
    }
}

#[test]
fn authors_in_library_are_distinct() {
    let conn = open_db_in_memory().unwrap();
    let (orwell, city) = seed_orwell(&conn);
    let repo = SqliteCatalogRepository::new(&conn);
    let austen = Author::new("Jane Austen");
    repo.create_author(&austen).unwrap();
    repo.create_book(&Book::new("Emma", austen.uuid), &[city.uuid])
        .unwrap();

    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));
    let authors = queries.authors_with_books_in("City").unwrap();
    assert_eq!(authors, vec![orwell, austen]);
}

#[test]
fn book_counts_and_library_summary() {
    let conn = open_db_in_memory().unwrap();
    let (orwell, city) = seed_orwell(&conn);
    let repo = SqliteCatalogRepository::new(&conn);
    let king = Author::new("Stephen King");
    repo.create_author(&king).unwrap();
    repo.create_librarian(&Librarian::new("Bob Smith", city.uuid))
        .unwrap();

    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));
    let counts: Vec<(String, u64)> = queries
        .book_count_by_author()
        .unwrap()
        .into_iter()
        .map(|entry| (entry.author.name, entry.book_count))
        .collect();
    assert_eq!(
        counts,
        vec![
            (orwell.name.clone(), 2),
            ("Stephen King".to_string(), 0)
        ]
    );

    let summary = queries.library_summary("City").unwrap();
    assert_eq!(summary.library, city);
    assert_eq!(summary.book_count, 2);
    assert_eq!(summary.author_count, 1);
    assert_eq!(
        summary.librarian.map(|librarian| librarian.name),
        Some("Bob Smith".to_string())
    );
}

#[test]
fn query_results_serialize_to_json() {
    let conn = open_db_in_memory().unwrap();
    seed_orwell(&conn);
    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));

    let value = serde_json::to_value(queries.books_by_author("George Orwell").unwrap()).unwrap();
    assert_eq!(value["value"]["author"]["name"], "George Orwell");
    assert_eq!(value["value"]["books"][0]["title"], "1984");
    assert!(value["warning"].is_null());
}
