use bookshelf_core::db::open_db_in_memory;
use bookshelf_core::{
    has_permission, has_role, AccessService, AccountRepository, Author, BookForm, BookService,
    CatalogRepository, Identity, IdentityId, IntegrityViolation, Library, Permission, QueryService,
    RequestContext, Requirement, Role, ServiceError, SqliteAccountRepository,
    SqliteCatalogRepository, ValidationError,
};
use rusqlite::Connection;
use uuid::Uuid;

fn register(conn: &Connection, username: &str) -> IdentityId {
    AccessService::new(SqliteAccountRepository::new(conn))
        .register(username, None)
        .unwrap()
        .identity
        .uuid
}

fn register_with_role(conn: &Connection, username: &str, role: Role) -> IdentityId {
    let id = register(conn, username);
    SqliteAccountRepository::new(conn).set_role(id, role).unwrap();
    id
}

fn group_names(conn: &Connection, id: IdentityId) -> Vec<String> {
    SqliteAccountRepository::new(conn)
        .identity_groups(id)
        .unwrap()
        .into_iter()
        .map(|group| group.name)
        .collect()
}

#[test]
fn register_creates_member_profile_and_group_membership() {
    let conn = open_db_in_memory().unwrap();
    let access = AccessService::new(SqliteAccountRepository::new(&conn));

    let registration = access
        .register("reader", Some("reader@example.com"))
        .unwrap();
    assert_eq!(registration.identity.username, "reader");
    assert_eq!(
        registration.identity.email.as_deref(),
        Some("reader@example.com")
    );
    assert_eq!(registration.profile.role, Role::Member);
    assert_eq!(
        registration.profile.identity_uuid,
        registration.identity.uuid
    );
    assert_eq!(group_names(&conn, registration.identity.uuid), vec!["Members"]);
    assert!(access.has_role(registration.identity.uuid, Role::Member));
}

#[test]
fn register_rejects_duplicates_and_malformed_input() {
    let conn = open_db_in_memory().unwrap();
    let access = AccessService::new(SqliteAccountRepository::new(&conn));
    access.register("reader", None).unwrap();

    assert!(matches!(
        access.register("reader", None),
        Err(ServiceError::Integrity(IntegrityViolation::DuplicateUsername(_)))
    ));
    assert!(matches!(
        access.register("has space", None),
        Err(ServiceError::Validation(ValidationError::InvalidUsername(_)))
    ));
    assert!(matches!(
        access.register("writer", Some("not-an-email")),
        Err(ServiceError::Validation(ValidationError::InvalidEmail(_)))
    ));
    assert_eq!(access.repo().count_identities().unwrap(), 1);
}

#[test]
fn has_role_is_false_for_unknown_or_profileless_identities() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::new(&conn);

    assert!(!has_role(&repo, Uuid::new_v4(), Role::Member));

    let orphan = Identity::new("orphan", None);
    conn.execute(
        "INSERT INTO identities (uuid, username) VALUES (?1, ?2);",
        [orphan.uuid.to_string(), orphan.username.clone()],
    )
    .unwrap();
    for role in Role::ALL {
        assert!(!has_role(&repo, orphan.uuid, role));
    }
}

#[test]
fn role_policy_drives_group_permissions() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::new(&conn);
    let admin = register_with_role(&conn, "admin", Role::Admin);
    let librarian = register_with_role(&conn, "alice", Role::Librarian);
    let member = register(&conn, "reader");

    for permission in Permission::ALL {
        assert!(has_permission(&repo, admin, permission));
    }
    assert!(has_permission(&repo, librarian, Permission::AddBook));
    assert!(has_permission(&repo, librarian, Permission::ChangeBook));
    assert!(!has_permission(&repo, librarian, Permission::DeleteBook));
    assert!(has_permission(&repo, member, Permission::ViewBook));
    assert!(!has_permission(&repo, member, Permission::AddBook));
    assert!(!has_permission(&repo, Uuid::new_v4(), Permission::ViewBook));
}

#[test]
fn set_role_moves_group_membership() {
    let conn = open_db_in_memory().unwrap();
    let id = register(&conn, "reader");
    assert_eq!(group_names(&conn, id), vec!["Members"]);

    let profile = SqliteAccountRepository::new(&conn)
        .set_role(id, Role::Librarian)
        .unwrap();
    assert_eq!(profile.role, Role::Librarian);
    assert!(profile.updated_at >= profile.created_at);
    assert_eq!(group_names(&conn, id), vec!["Librarians"]);
}

#[test]
fn direct_grants_and_superuser_override_role_policy() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::new(&conn);
    let member = register(&conn, "reader");

    repo.grant_permission(member, Permission::DeleteBook).unwrap();
    assert!(has_permission(&repo, member, Permission::DeleteBook));
    assert!(has_role(&repo, member, Role::Member));

    assert!(repo.revoke_permission(member, Permission::DeleteBook).unwrap());
    assert!(!has_permission(&repo, member, Permission::DeleteBook));
    // Group grants survive a direct revoke.
    assert!(!repo.revoke_permission(member, Permission::ViewBook).unwrap());
    assert!(has_permission(&repo, member, Permission::ViewBook));

    repo.set_staff_flags(member, true, true).unwrap();
    assert_eq!(
        repo.effective_permissions(member).unwrap().len(),
        Permission::ALL.len()
    );
}

#[test]
fn grant_to_unknown_identity_is_an_integrity_error() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::new(&conn);
    let err = repo
        .grant_permission(Uuid::new_v4(), Permission::AddBook)
        .unwrap_err();
    assert!(matches!(
        err,
        bookshelf_core::RepoError::Integrity(IntegrityViolation::UnknownIdentity(_))
    ));
}

#[test]
fn assign_role_requires_admin_actor() {
    let conn = open_db_in_memory().unwrap();
    let admin = register_with_role(&conn, "admin", Role::Admin);
    let member = register(&conn, "reader");
    let target = register(&conn, "target");
    let access = AccessService::new(SqliteAccountRepository::new(&conn));

    let err = access
        .assign_role(
            &RequestContext::authenticated(member, "/roles"),
            target,
            Role::Librarian,
        )
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::PermissionDenied {
            requirement: Requirement::Role(Role::Admin),
            ..
        }
    ));
    assert!(access.has_role(target, Role::Member));

    let err = access
        .assign_role(&RequestContext::anonymous("/roles"), target, Role::Librarian)
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthenticationRequired));

    let profile = access
        .assign_role(
            &RequestContext::authenticated(admin, "/roles"),
            target,
            Role::Librarian,
        )
        .unwrap();
    assert_eq!(profile.role, Role::Librarian);
    assert!(access.has_role(target, Role::Librarian));
    assert!(!access.has_role(target, Role::Member));
}

#[test]
fn admin_grants_and_revokes_direct_permissions() {
    let conn = open_db_in_memory().unwrap();
    let admin = register_with_role(&conn, "admin", Role::Admin);
    let member = register(&conn, "reader");
    let access = AccessService::new(SqliteAccountRepository::new(&conn));
    let ctx = RequestContext::authenticated(admin, "/grants");

    access
        .grant_permission(&ctx, member, Permission::AddBook)
        .unwrap();
    assert!(access.permissions_of(member).unwrap().contains(&Permission::AddBook));

    assert!(access
        .revoke_permission(&ctx, member, Permission::AddBook)
        .unwrap());
    assert!(!access.has_permission(member, Permission::AddBook));

    let err = access
        .grant_permission(&ctx, Uuid::new_v4(), Permission::AddBook)
        .unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));
}

#[test]
fn stale_identity_is_treated_as_unauthenticated() {
    let conn = open_db_in_memory().unwrap();
    let access = AccessService::new(SqliteAccountRepository::new(&conn));
    let err = access
        .authenticate(&RequestContext::authenticated(Uuid::new_v4(), "/profile"))
        .unwrap_err();
    assert!(matches!(err, ServiceError::AuthenticationRequired));
}

#[test]
fn add_book_is_gated_by_permission_not_role() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::new(&conn);
    let author = Author::new("George Orwell");
    catalog.create_author(&author).unwrap();
    let city = Library::new("City");
    catalog.create_library(&city).unwrap();

    let member = register(&conn, "reader");
    let admin = register_with_role(&conn, "admin", Role::Admin);
    let books = BookService::new(
        SqliteCatalogRepository::new(&conn),
        SqliteAccountRepository::new(&conn),
    );
    let form = BookForm::new("Animal Farm", author.uuid).with_libraries([city.uuid]);

    let err = books
        .add_book(&RequestContext::authenticated(member, "/books/add"), &form)
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::PermissionDenied {
            requirement: Requirement::Permission(Permission::AddBook),
            ..
        }
    ));
    assert_eq!(catalog.count_books().unwrap(), 0);

    let book = books
        .add_book(&RequestContext::authenticated(admin, "/books/add"), &form)
        .unwrap();

    let queries = QueryService::new(SqliteCatalogRepository::new(&conn));
    let in_city = queries.books_in_library("City").unwrap();
    assert!(in_city.books.iter().any(|entry| entry.book.uuid == book.uuid));
    let by_author = queries.books_by_author("George Orwell").unwrap();
    assert!(by_author.value.books.contains(&book));

    // A member granted the permission directly may add books too.
    SqliteAccountRepository::new(&conn)
        .grant_permission(member, Permission::AddBook)
        .unwrap();
    books
        .add_book(
            &RequestContext::authenticated(member, "/books/add"),
            &BookForm::new("1984", author.uuid),
        )
        .unwrap();
    assert_eq!(catalog.count_books().unwrap(), 2);
}

#[test]
fn edit_and_delete_need_their_own_permissions() {
    let conn = open_db_in_memory().unwrap();
    let catalog = SqliteCatalogRepository::new(&conn);
    let author = Author::new("Agatha Christie");
    catalog.create_author(&author).unwrap();

    let librarian = register_with_role(&conn, "alice", Role::Librarian);
    let books = BookService::new(
        SqliteCatalogRepository::new(&conn),
        SqliteAccountRepository::new(&conn),
    );
    let ctx = RequestContext::authenticated(librarian, "/books");
    let book = books
        .add_book(&ctx, &BookForm::new("Murder on the Orient Express", author.uuid))
        .unwrap();

    let edited = books
        .edit_book(&ctx, book.uuid, &BookForm::new("Death on the Nile", author.uuid))
        .unwrap();
    assert_eq!(edited.title, "Death on the Nile");

    let err = books
        .edit_book(&ctx, book.uuid, &BookForm::new("Orphan", Uuid::new_v4()))
        .unwrap_err();
    assert!(matches!(
        err,
        ServiceError::Integrity(IntegrityViolation::DanglingAuthor(_))
    ));

    let err = books.delete_book(&ctx, book.uuid).unwrap_err();
    assert!(matches!(
        err,
        ServiceError::PermissionDenied {
            requirement: Requirement::Permission(Permission::DeleteBook),
            ..
        }
    ));
    assert!(catalog.get_book(book.uuid).unwrap().is_some());
}

#[test]
fn every_role_round_trips_through_profiles_and_groups() {
    let conn = open_db_in_memory().unwrap();
    let repo = SqliteAccountRepository::new(&conn);
    let id = register(&conn, "reader");

    for role in Role::ALL {
        repo.set_role(id, role).unwrap();
        assert_eq!(repo.get_profile(id).unwrap().unwrap().role, role);
        let group = repo.role_group(role).unwrap();
        assert_eq!(group.role, Some(role));
        assert_eq!(group.name, role.group_name());
    }
}
