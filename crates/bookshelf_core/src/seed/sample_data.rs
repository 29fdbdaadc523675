//! Sample catalogue datasets.

use crate::model::catalog::Library;
use crate::repo::catalog_repo::{CatalogRepository, SqliteCatalogRepository};
use crate::repo::RepoResult;
use crate::seed::{
    get_or_create_author, get_or_create_book, get_or_create_librarian, get_or_create_library,
    skip_on_integrity, SeedReport,
};
use log::info;
use serde::Serialize;
use rusqlite::{Connection, TransactionBehavior};
use std::collections::HashMap;

/// Which sample dataset to load.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Dataset {
    /// 3 authors, 5 books, 2 libraries, 2 librarians.
    #[default]
    Basic,
    /// 5 authors, 9 books, 4 libraries, 4 librarians.
    Extended,
}

impl Dataset {
    fn as_str(self) -> &'static str {
        match self {
            Self::Basic => "basic",
            Self::Extended => "extended",
        }
    }

    fn records(self) -> &'static SampleData {
        match self {
            Self::Basic => &BASIC,
            Self::Extended => &EXTENDED,
        }
    }
}

struct SampleData {
    authors: &'static [&'static str],
    /// `(title, author name)`
    books: &'static [(&'static str, &'static str)],
    /// `(library name, held titles)`
    libraries: &'static [(&'static str, &'static [&'static str])],
    /// `(librarian name, library name)`
    librarians: &'static [(&'static str, &'static str)],
}

const HP_STONE: &str = "Harry Potter and the Sorcerer's Stone";
const HP_CHAMBER: &str = "Harry Potter and the Chamber of Secrets";
const NINETEEN_EIGHTY_FOUR: &str = "1984";
const ANIMAL_FARM: &str = "Animal Farm";
const ORIENT_EXPRESS: &str = "Murder on the Orient Express";
const NONE_REMAINED: &str = "And Then There Were None";
const THE_SHINING: &str = "The Shining";
const PRIDE: &str = "Pride and Prejudice";
const SENSE: &str = "Sense and Sensibility";

const ROWLING: &str = "J.K. Rowling";
const ORWELL: &str = "George Orwell";
const CHRISTIE: &str = "Agatha Christie";
const KING: &str = "Stephen King";
const AUSTEN: &str = "Jane Austen";

static BASIC: SampleData = SampleData {
    authors: &[ROWLING, ORWELL, CHRISTIE],
    books: &[
        (HP_STONE, ROWLING),
        (HP_CHAMBER, ROWLING),
        (NINETEEN_EIGHTY_FOUR, ORWELL),
        (ANIMAL_FARM, ORWELL),
        (ORIENT_EXPRESS, CHRISTIE),
    ],
    libraries: &[
        (
            "Central Library",
            &[HP_STONE, HP_CHAMBER, NINETEEN_EIGHTY_FOUR],
        ),
        (
            "City Library",
            &[NINETEEN_EIGHTY_FOUR, ANIMAL_FARM, ORIENT_EXPRESS],
        ),
    ],
    librarians: &[
        ("Alice Johnson", "Central Library"),
        ("Bob Smith", "City Library"),
    ],
};

static EXTENDED: SampleData = SampleData {
    authors: &[ROWLING, ORWELL, CHRISTIE, KING, AUSTEN],
    books: &[
        (HP_STONE, ROWLING),
        (HP_CHAMBER, ROWLING),
        (NINETEEN_EIGHTY_FOUR, ORWELL),
        (ANIMAL_FARM, ORWELL),
        (ORIENT_EXPRESS, CHRISTIE),
        (NONE_REMAINED, CHRISTIE),
        (THE_SHINING, KING),
        (PRIDE, AUSTEN),
        (SENSE, AUSTEN),
    ],
    libraries: &[
        (
            "Central Public Library",
            &[HP_STONE, NINETEEN_EIGHTY_FOUR, THE_SHINING, PRIDE],
        ),
        (
            "City Library",
            &[HP_CHAMBER, ANIMAL_FARM, ORIENT_EXPRESS, NONE_REMAINED],
        ),
        (
            "University Library",
            &[NINETEEN_EIGHTY_FOUR, ANIMAL_FARM, PRIDE, SENSE, THE_SHINING],
        ),
        (
            "Community Library",
            &[ORIENT_EXPRESS, THE_SHINING, HP_STONE],
        ),
    ],
    librarians: &[
        ("Alice Johnson", "Central Public Library"),
        ("Bob Smith", "City Library"),
        ("Carol Williams", "University Library"),
        ("David Brown", "Community Library"),
    ],
};

/// Loads `dataset` in one transaction.
///
/// Existing records are reused by name or title. A librarian already on
/// staff elsewhere, or a library already staffed by someone else, is skipped
/// with a warning.
///
/// # Errors
/// Any non-integrity failure rolls back the whole batch.
pub fn seed_sample_data(conn: &mut Connection, dataset: Dataset) -> RepoResult<SeedReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let mut report = load(&SqliteCatalogRepository::new(&tx), dataset.records())?;
    report.dataset = dataset;
    tx.commit()?;

    info!(
        "event=seed_sample_data module=seed status=ok dataset={} created={} skipped={}",
        dataset.as_str(),
        report.created(),
        report.skipped()
    );
    Ok(report)
}

fn load<R: CatalogRepository>(repo: &R, data: &SampleData) -> RepoResult<SeedReport> {
    let mut report = SeedReport::default();

    let mut authors = HashMap::new();
    for name in data.authors {
        let author = get_or_create_author(repo, name, &mut report.authors)?;
        authors.insert(*name, author.uuid);
    }

    let mut books = HashMap::new();
    for (title, author_name) in data.books {
        let Some(author) = authors.get(author_name).copied() else {
            report.books.skipped += 1;
            continue;
        };
        if let Some(book) = get_or_create_book(repo, title, author, &mut report.books)? {
            books.insert(*title, book.uuid);
        }
    }

    let mut libraries: HashMap<&str, Library> = HashMap::new();
    for (name, titles) in data.libraries {
        let library = get_or_create_library(repo, name, &mut report.libraries)?;
        let held = repo.books_in_library(library.uuid)?;
        for title in titles.iter() {
            let Some(book) = books.get(title).copied() else {
                report.holdings.skipped += 1;
                continue;
            };
            if held.iter().any(|entry| entry.book.uuid == book) {
                report.holdings.existing += 1;
                continue;
            }
            let added = skip_on_integrity(
                &mut report.holdings,
                "holding",
                repo.add_book_to_library(library.uuid, book),
            )?;
            if added.is_some() {
                report.holdings.created += 1;
            }
        }
        libraries.insert(*name, library);
    }

    for (name, library_name) in data.librarians {
        let Some(library) = libraries.get(library_name) else {
            report.librarians.skipped += 1;
            continue;
        };
        get_or_create_librarian(repo, name, library, &mut report.librarians)?;
    }

    Ok(report)
}
