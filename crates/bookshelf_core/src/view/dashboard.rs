//! Role dashboards and account pages.

use crate::model::account::{Permission, Role};
use crate::repo::account_repo::AccountRepository;
use crate::repo::catalog_repo::CatalogRepository;
use crate::service::error::ServiceResult;
use crate::service::request::RequestContext;
use crate::view::{Site, ViewOutcome};
use serde_json::{json, Map, Value};

const RECENT_BOOKS_LIMIT: u32 = 5;

/// Site totals for admins.
pub fn admin_view(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, admin_page(site, ctx))
}

/// Libraries whose librarian carries the caller's username.
pub fn librarian_view(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, librarian_page(site, ctx))
}

pub fn member_view(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, member_page(site, ctx))
}

/// Profile page for any signed-in identity. A missing profile is created
/// with the member role.
pub fn profile_view(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, profile_page(site, ctx))
}

/// The caller's book permissions, effective codenames and staff flags.
/// Each permission also reports whether it is granted directly.
pub fn check_permissions_view(
    site: &Site<'_>,
    ctx: &RequestContext,
) -> ServiceResult<ViewOutcome> {
    site.finish(ctx, permissions_page(site, ctx))
}

fn admin_page(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    let access = site.access();
    let user = access.require_role(ctx, Role::Admin)?;
    let catalog = site.catalog();
    let total_users = access.repo().count_identities()?;
    let total_books = catalog.count_books()?;
    let total_libraries = catalog.count_libraries()?;
    Ok(ViewOutcome::render(
        "admin_view",
        json!({
            "user": user,
            "role": Role::Admin.display_name(),
            "total_users": total_users,
            "total_books": total_books,
            "total_libraries": total_libraries,
        }),
    ))
}

fn librarian_page(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    let user = site.access().require_role(ctx, Role::Librarian)?;
    let catalog = site.catalog();
    let libraries = catalog.libraries_staffed_by(&user.username)?;
    let ids: Vec<_> = libraries.iter().map(|library| library.uuid).collect();
    let books_in_charge = catalog.count_distinct_books_in(&ids)?;
    Ok(ViewOutcome::render(
        "librarian_view",
        json!({
            "user": user,
            "role": Role::Librarian.display_name(),
            "libraries": libraries,
            "total_books_in_charge": books_in_charge,
        }),
    ))
}

fn member_page(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    let user = site.access().require_role(ctx, Role::Member)?;
    let catalog = site.catalog();
    let available_books = catalog.count_books()?;
    let available_libraries = catalog.count_libraries()?;
    let recent_books = catalog.recent_books(RECENT_BOOKS_LIMIT)?;
    Ok(ViewOutcome::render(
        "member_view",
        json!({
            "user": user,
            "role": Role::Member.display_name(),
            "available_books": available_books,
            "available_libraries": available_libraries,
            "recent_books": recent_books,
        }),
    ))
}

fn profile_page(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    let access = site.access();
    let user = access.authenticate(ctx)?;
    let profile = access.profile(user.uuid)?;
    Ok(ViewOutcome::render(
        "profile",
        json!({
            "user": user,
            "role_display": profile.role.display_name(),
            "is_admin": profile.is_admin(),
            "is_librarian": profile.is_librarian(),
            "is_member": profile.is_member(),
            "profile": profile,
        }),
    ))
}

fn permissions_page(site: &Site<'_>, ctx: &RequestContext) -> ServiceResult<ViewOutcome> {
    let access = site.access();
    let user = access.authenticate(ctx)?;
    let granted = access.permissions_of(user.uuid)?;
    let direct = access.repo().direct_permissions(user.uuid)?;

    let mut flags = Map::new();
    let mut details = Vec::new();
    for permission in Permission::ALL {
        flags.insert(
            permission.codename().to_string(),
            Value::Bool(granted.contains(&permission)),
        );
        details.push(json!({
            "codename": permission.codename(),
            "description": permission.description(),
            "granted": granted.contains(&permission),
            "direct": direct.contains(&permission),
        }));
    }
    let all_permissions: Vec<&str> = granted
        .iter()
        .map(|permission| permission.codename())
        .collect();

    Ok(ViewOutcome::render(
        "permissions_check",
        json!({
            "is_staff": user.is_staff,
            "is_superuser": user.is_superuser,
            "user": user,
            "permissions": flags,
            "permission_details": details,
            "all_permissions": all_permissions,
        }),
    ))
}
