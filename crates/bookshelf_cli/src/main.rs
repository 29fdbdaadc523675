//! `bookshelf` provisioning and query CLI.
//!
//! # Responsibility
//! - Run the provisioning scripts (sample data, permissions, roles) against a
//!   database file.
//! - Register identities and change roles out-of-band.
//! - Answer the relationship queries, printing JSON to stdout.

use bookshelf_core::{
    assign_roles, init_logging, open_db, seed_sample_data, setup_permissions, AccessService,
    AccountRepository, AppConfig, Dataset, QueryService, Role, SqliteAccountRepository,
    SqliteCatalogRepository,
};
use clap::{Parser, Subcommand, ValueEnum};
use log::info;
use rusqlite::Connection;
use serde::Serialize;
use std::error::Error;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "bookshelf", version, about = "Library catalogue provisioning and queries")]
struct Args {
    /// SQLite database file
    #[arg(long, env = "BOOKSHELF_DB", default_value = bookshelf_core::config::DEFAULT_DB_PATH)]
    db: PathBuf,

    /// trace|debug|info|warn|error
    #[arg(long, env = "BOOKSHELF_LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Absolute directory for rolling log files; file logging is off when unset
    #[arg(long, env = "BOOKSHELF_LOG_DIR")]
    log_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load sample authors, books, libraries and librarians
    Seed {
        /// Load the larger dataset
        #[arg(long)]
        extended: bool,
    },
    /// Install role-group permissions and sync identities into them
    SetupPermissions,
    /// Ensure the admin identity and backfill missing profiles
    AssignRoles,
    /// Create an identity with the member role
    Register {
        username: String,
        #[arg(long)]
        email: Option<String>,
    },
    /// Change an identity's role
    AssignRole { username: String, role: String },
    /// Run a relationship query
    Query {
        #[arg(value_enum)]
        kind: QueryKind,
        /// Author name, library name or book title
        arg: Option<String>,
    },
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum QueryKind {
    BooksByAuthor,
    BooksInLibrary,
    Librarian,
    LibrariesWithBook,
    AuthorsInLibrary,
    AuthorCounts,
}

fn main() {
    let args = Args::parse();
    if let Err(err) = run(args) {
        eprintln!("error: {err}");
        std::process::exit(1);
    }
}

fn run(args: Args) -> Result<(), Box<dyn Error>> {
    let mut config = AppConfig::new(&args.db).with_log_level(args.log_level);
    if let Some(dir) = args.log_dir {
        config = config.with_log_dir(dir);
    }
    let config = config.validate()?;
    if let Some(dir) = config.log_dir() {
        init_logging(config.log_level(), dir)?;
    }

    let mut conn = open_db(config.db_path())?;
    match args.command {
        Command::Seed { extended } => {
            let dataset = if extended {
                Dataset::Extended
            } else {
                Dataset::Basic
            };
            print_json(&seed_sample_data(&mut conn, dataset)?)
        }
        Command::SetupPermissions => print_json(&setup_permissions(&mut conn)?),
        Command::AssignRoles => print_json(&assign_roles(&mut conn)?),
        Command::Register { username, email } => {
            let access = AccessService::new(SqliteAccountRepository::new(&conn));
            print_json(&access.register(&username, email.as_deref())?)
        }
        Command::AssignRole { username, role } => assign_role(&conn, &username, &role),
        Command::Query { kind, arg } => query(&conn, kind, arg.as_deref()),
    }
}

fn assign_role(conn: &Connection, username: &str, role: &str) -> Result<(), Box<dyn Error>> {
    let role = Role::parse(role)?;
    let repo = SqliteAccountRepository::new(conn);
    let identity = repo
        .find_identity_by_username(username)?
        .ok_or_else(|| format!("no identity named `{username}`"))?;
    repo.ensure_profile(identity.uuid)?;
    let profile = repo.set_role(identity.uuid, role)?;
    info!(
        "event=cli_assign_role module=cli status=ok identity={} role={}",
        identity.uuid, role
    );
    print_json(&profile)
}

fn query(conn: &Connection, kind: QueryKind, arg: Option<&str>) -> Result<(), Box<dyn Error>> {
    let queries = QueryService::new(SqliteCatalogRepository::new(conn));
    let key = || arg.ok_or_else(|| format!("query `{kind:?}` needs an argument"));
    match kind {
        QueryKind::BooksByAuthor => {
            let lookup = queries.books_by_author(key()?)?;
            if let Some(warning) = &lookup.warning {
                eprintln!("warning: {warning}");
            }
            print_json(&lookup.value)
        }
        QueryKind::BooksInLibrary => print_json(&queries.books_in_library(key()?)?),
        QueryKind::Librarian => print_json(&queries.librarian_of_library(key()?)?),
        QueryKind::LibrariesWithBook => {
            let lookup = queries.libraries_containing_book(key()?)?;
            if let Some(warning) = &lookup.warning {
                eprintln!("warning: {warning}");
            }
            print_json(&lookup.value)
        }
        QueryKind::AuthorsInLibrary => print_json(&queries.authors_with_books_in(key()?)?),
        QueryKind::AuthorCounts => print_json(&queries.book_count_by_author()?),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), Box<dyn Error>> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
