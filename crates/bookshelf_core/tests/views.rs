use bookshelf_core::db::open_db_in_memory;
use bookshelf_core::view::{
    add_book_view, admin_view, book_detail, check_permissions_view, delete_book_view,
    edit_book_view, librarian_view, library_detail, library_list, list_books, member_view,
    profile_view, register_view, RegisterForm,
};
use bookshelf_core::{
    AccessService, AccountRepository, AppConfig, Author, Book, BookForm, CatalogRepository,
    IdentityId, Librarian, Library, Permission, RequestContext, Role, Site,
    SqliteAccountRepository, SqliteCatalogRepository, ViewOutcome,
};
use rusqlite::Connection;
use uuid::Uuid;

struct Fixture {
    author: Author,
    central: Library,
    book: Book,
}

fn seed_catalog(conn: &Connection) -> Fixture {
    let repo = SqliteCatalogRepository::new(conn);
    let author = Author::new("J.K. Rowling");
    repo.create_author(&author).unwrap();
    let central = Library::new("Central Library");
    repo.create_library(&central).unwrap();
    let book = Book::new("Harry Potter and the Sorcerer's Stone", author.uuid);
    repo.create_book(&book, &[central.uuid]).unwrap();
    repo.create_librarian(&Librarian::new("alice", central.uuid))
        .unwrap();
    Fixture {
        author,
        central,
        book,
    }
}

fn user(conn: &Connection, username: &str, role: Role) -> IdentityId {
    let access = AccessService::new(SqliteAccountRepository::new(conn));
    let id = access.register(username, None).unwrap().identity.uuid;
    access.repo().set_role(id, role).unwrap();
    id
}

fn as_user(id: IdentityId, path: &str) -> RequestContext {
    RequestContext::authenticated(id, path)
}

fn rendered(outcome: ViewOutcome) -> (String, serde_json::Map<String, serde_json::Value>) {
    match outcome {
        ViewOutcome::Rendered { template, context } => (template, context),
        other => panic!("expected rendered outcome, got {other:?}"),
    }
}

#[test]
fn anonymous_gated_views_redirect_to_login_with_next() {
    let conn = open_db_in_memory().unwrap();
    let site = Site::new(&conn);
    let ctx = RequestContext::anonymous("/relationship/admin/dashboard/");

    let outcome = admin_view(&site, &ctx).unwrap();
    assert_eq!(
        outcome,
        ViewOutcome::Redirected {
            location: "/relationship/login/?next=%2Frelationship%2Fadmin%2Fdashboard%2F"
                .to_string(),
            flash: None,
        }
    );

    let outcome = add_book_view(&site, &RequestContext::anonymous("/books/add/"), None).unwrap();
    assert!(matches!(outcome, ViewOutcome::Redirected { location, .. } if location.starts_with("/relationship/login/?next=")));
}

#[test]
fn custom_login_url_is_used_for_redirects() {
    let conn = open_db_in_memory().unwrap();
    let site = Site::new(&conn).with_login_url("/login/");
    let outcome = profile_view(&site, &RequestContext::anonymous("/profile/")).unwrap();
    assert_eq!(
        outcome,
        ViewOutcome::redirect("/login/?next=%2Fprofile%2F", None)
    );
}

#[test]
fn dashboards_check_roles() {
    let conn = open_db_in_memory().unwrap();
    seed_catalog(&conn);
    let site = Site::new(&conn);
    let admin = user(&conn, "root", Role::Admin);
    let member = user(&conn, "reader", Role::Member);

    let (template, context) = rendered(admin_view(&site, &as_user(admin, "/admin/")).unwrap());
    assert_eq!(template, "relationship_app/admin_view.html");
    assert_eq!(context["role"], "Admin");
    assert_eq!(context["total_users"], 2);
    assert_eq!(context["total_books"], 1);
    assert_eq!(context["total_libraries"], 1);

    let outcome = admin_view(&site, &as_user(member, "/admin/")).unwrap();
    assert!(matches!(outcome, ViewOutcome::Forbidden { .. }));

    let (template, context) = rendered(member_view(&site, &as_user(member, "/member/")).unwrap());
    assert_eq!(template, "relationship_app/member_view.html");
    assert_eq!(context["available_books"], 1);
    assert_eq!(context["recent_books"].as_array().unwrap().len(), 1);

    let outcome = member_view(&site, &as_user(admin, "/member/")).unwrap();
    assert!(matches!(outcome, ViewOutcome::Forbidden { .. }));
}

#[test]
fn librarian_dashboard_lists_libraries_staffed_under_username() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_catalog(&conn);
    let site = Site::new(&conn);
    let alice = user(&conn, "alice", Role::Librarian);

    let (_, context) = rendered(librarian_view(&site, &as_user(alice, "/librarian/")).unwrap());
    assert_eq!(context["libraries"][0]["name"], fixture.central.name.as_str());
    assert_eq!(context["total_books_in_charge"], 1);
}

#[test]
fn profile_and_permission_pages() {
    let conn = open_db_in_memory().unwrap();
    let site = Site::new(&conn);
    let librarian = user(&conn, "alice", Role::Librarian);

    let (template, context) =
        rendered(profile_view(&site, &as_user(librarian, "/profile/")).unwrap());
    assert_eq!(template, "relationship_app/profile.html");
    assert_eq!(context["role_display"], "Librarian");
    assert_eq!(context["is_librarian"], true);
    assert_eq!(context["is_admin"], false);

    let (template, context) =
        rendered(check_permissions_view(&site, &as_user(librarian, "/permissions/")).unwrap());
    assert_eq!(template, "relationship_app/permissions_check.html");
    assert_eq!(context["permissions"]["can_add_book"], true);
    assert_eq!(context["permissions"]["can_change_book"], true);
    assert_eq!(context["permissions"]["can_delete_book"], false);
    assert_eq!(context["permissions"]["can_view_book"], true);
    assert_eq!(context["all_permissions"].as_array().unwrap().len(), 3);
    assert_eq!(context["is_superuser"], false);
}

#[test]
fn profile_view_backfills_missing_profile() {
    let conn = open_db_in_memory().unwrap();
    let site = Site::new(&conn);
    let orphan = Uuid::new_v4();
    conn.execute(
        "INSERT INTO identities (uuid, username) VALUES (?1, 'orphan');",
        [orphan.to_string()],
    )
    .unwrap();

    let (_, context) = rendered(profile_view(&site, &as_user(orphan, "/profile/")).unwrap());
    assert_eq!(context["is_member"], true);
    assert!(SqliteAccountRepository::new(&conn)
        .get_profile(orphan)
        .unwrap()
        .is_some());
}

#[test]
fn public_browsing_needs_no_login() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_catalog(&conn);
    let site = Site::new(&conn);
    let ctx = RequestContext::anonymous("/books/");

    let (template, context) = rendered(list_books(&site, &ctx).unwrap());
    assert_eq!(template, "relationship_app/list_books.html");
    assert_eq!(context["books"][0]["author_name"], "J.K. Rowling");

    let (_, context) = rendered(library_list(&site, &ctx).unwrap());
    assert_eq!(context["libraries"].as_array().unwrap().len(), 1);

    let (template, context) =
        rendered(library_detail(&site, &ctx, fixture.central.uuid).unwrap());
    assert_eq!(template, "relationship_app/library_detail.html");
    assert_eq!(context["book_count"], 1);
    assert_eq!(context["author_count"], 1);
    assert_eq!(context["librarian"]["name"], "alice");

    let (_, context) = rendered(book_detail(&site, &ctx, fixture.book.uuid).unwrap());
    assert_eq!(context["libraries"][0]["name"], "Central Library");

    assert!(matches!(
        book_detail(&site, &ctx, Uuid::new_v4()).unwrap(),
        ViewOutcome::NotFound { .. }
    ));
    assert!(matches!(
        library_detail(&site, &ctx, Uuid::new_v4()).unwrap(),
        ViewOutcome::NotFound { .. }
    ));
}

#[test]
fn add_book_form_flow() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_catalog(&conn);
    let site = Site::new(&conn);
    let librarian = user(&conn, "alice", Role::Librarian);
    let member = user(&conn, "reader", Role::Member);
    let ctx = as_user(librarian, "/books/add/");

    let (template, context) = rendered(add_book_view(&site, &ctx, None).unwrap());
    assert_eq!(template, "relationship_app/book_form.html");
    assert_eq!(context["action"], "Add");
    assert_eq!(context["authors"].as_array().unwrap().len(), 1);

    let form = BookForm::new("Harry Potter and the Chamber of Secrets", fixture.author.uuid)
        .with_libraries([fixture.central.uuid]);
    let outcome = add_book_view(&site, &ctx, Some(form.clone())).unwrap();
    assert_eq!(
        outcome,
        ViewOutcome::redirect(
            "/relationship/books/",
            Some("Book \"Harry Potter and the Chamber of Secrets\" added successfully!".to_string())
        )
    );
    assert_eq!(SqliteCatalogRepository::new(&conn).count_books().unwrap(), 2);

    let dangling = BookForm::new("Lost", Uuid::new_v4());
    let (template, context) = rendered(add_book_view(&site, &ctx, Some(dangling)).unwrap());
    assert_eq!(template, "relationship_app/book_form.html");
    assert!(context["error"].as_str().unwrap().contains("author does not exist"));
    assert_eq!(context["form"]["title"], "Lost");

    let outcome = add_book_view(&site, &as_user(member, "/books/add/"), Some(form)).unwrap();
    assert!(matches!(outcome, ViewOutcome::Forbidden { .. }));
    assert_eq!(SqliteCatalogRepository::new(&conn).count_books().unwrap(), 2);
}

#[test]
fn edit_and_delete_views() {
    let conn = open_db_in_memory().unwrap();
    let fixture = seed_catalog(&conn);
    let site = Site::new(&conn);
    let librarian = user(&conn, "alice", Role::Librarian);
    let admin = user(&conn, "root", Role::Admin);
    let id = fixture.book.uuid;

    let (_, context) =
        rendered(edit_book_view(&site, &as_user(librarian, "/edit/"), id, None).unwrap());
    assert_eq!(context["action"], "Edit");
    assert_eq!(context["form"]["title"], fixture.book.title.as_str());

    let form = BookForm::new("Harry Potter and the Philosopher's Stone", fixture.author.uuid);
    let outcome = edit_book_view(&site, &as_user(librarian, "/edit/"), id, Some(form)).unwrap();
    assert_eq!(
        outcome,
        ViewOutcome::redirect(
            format!("/relationship/book/{id}/"),
            Some("Book updated successfully!".to_string())
        )
    );

    let outcome =
        edit_book_view(&site, &as_user(librarian, "/edit/"), Uuid::new_v4(), None).unwrap();
    assert!(matches!(outcome, ViewOutcome::NotFound { .. }));

    let outcome = delete_book_view(&site, &as_user(librarian, "/delete/"), id, true).unwrap();
    assert!(matches!(outcome, ViewOutcome::Forbidden { .. }));

    let (template, _) =
        rendered(delete_book_view(&site, &as_user(admin, "/delete/"), id, false).unwrap());
    assert_eq!(template, "relationship_app/book_confirm_delete.html");

    let outcome = delete_book_view(&site, &as_user(admin, "/delete/"), id, true).unwrap();
    assert!(matches!(outcome, ViewOutcome::Redirected { flash: Some(_), .. }));
    assert!(SqliteCatalogRepository::new(&conn)
        .get_book(id)
        .unwrap()
        .is_none());
}

#[test]
fn register_view_creates_member_and_redirects_to_login() {
    let conn = open_db_in_memory().unwrap();
    let site = Site::new(&conn);
    let ctx = RequestContext::anonymous("/register/");

    let (template, _) = rendered(register_view(&site, &ctx, None).unwrap());
    assert_eq!(template, "relationship_app/register.html");

    let form = RegisterForm::new("newreader", Some("new@example.com".to_string()));
    let outcome = register_view(&site, &ctx, Some(form.clone())).unwrap();
    assert!(matches!(
        outcome,
        ViewOutcome::Redirected { ref location, .. } if location == "/relationship/login/"
    ));

    let repo = SqliteAccountRepository::new(&conn);
    let identity = repo.find_identity_by_username("newreader").unwrap().unwrap();
    assert_eq!(repo.get_profile(identity.uuid).unwrap().unwrap().role, Role::Member);

    let (_, context) = rendered(register_view(&site, &ctx, Some(form)).unwrap());
    assert!(context["error"]
        .as_str()
        .unwrap()
        .contains("username already in use"));
}

#[test]
fn permission_page_separates_direct_grants() {
    let conn = open_db_in_memory().unwrap();
    let site = Site::new(&conn);
    let member = user(&conn, "reader", Role::Member);
    site.access()
        .repo()
        .grant_permission(member, Permission::DeleteBook)
        .unwrap();

    let (_, context) =
        rendered(check_permissions_view(&site, &as_user(member, "/permissions/")).unwrap());
    let details = context["permission_details"].as_array().unwrap();
    assert_eq!(details.len(), 4);

    let delete = details
        .iter()
        .find(|entry| entry["codename"] == "can_delete_book")
        .unwrap();
    assert_eq!(delete["description"], "Can delete book");
    assert_eq!(delete["granted"], true);
    assert_eq!(delete["direct"], true);

    let view = details
        .iter()
        .find(|entry| entry["codename"] == "can_view_book")
        .unwrap();
    assert_eq!(view["granted"], true);
    assert_eq!(view["direct"], false);

    let add = details
        .iter()
        .find(|entry| entry["codename"] == "can_add_book")
        .unwrap();
    assert_eq!(add["granted"], false);
}

#[test]
fn site_from_config_uses_configured_login_url() {
    let conn = open_db_in_memory().unwrap();
    let config = AppConfig::default()
        .with_login_url("/accounts/login/")
        .validate()
        .unwrap();
    let site = Site::from_config(&conn, &config);
    assert_eq!(site.login_url(), "/accounts/login/");

    let outcome = member_view(&site, &RequestContext::anonymous("/member/")).unwrap();
    assert_eq!(
        outcome,
        ViewOutcome::redirect("/accounts/login/?next=%2Fmember%2F", None)
    );
}
