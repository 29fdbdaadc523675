//! Admin bootstrap and profile backfill.

use crate::model::account::{Identity, IdentityId, Role};
use crate::repo::account_repo::{AccountRepository, SqliteAccountRepository};
use crate::repo::RepoResult;
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_EMAIL: &str = "admin@library.com";

/// Outcome of `assign_roles`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleReport {
    pub admin: IdentityId,
    pub admin_created: bool,
    /// Member profiles created for identities that had none.
    pub profiles_created: usize,
}

/// Ensures the `admin` identity exists with the admin role, then gives every
/// identity without a profile a member profile.
pub fn assign_roles(conn: &mut Connection) -> RepoResult<RoleReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let report = apply(&SqliteAccountRepository::new(&tx))?;
    tx.commit()?;

    info!(
        "event=assign_roles module=seed status=ok admin_created={} profiles_created={}",
        report.admin_created, report.profiles_created
    );
    Ok(report)
}

fn apply<A: AccountRepository>(repo: &A) -> RepoResult<RoleReport> {
    let (admin, admin_created) = match repo.find_identity_by_username(ADMIN_USERNAME)? {
        Some(existing) => {
            repo.ensure_profile(existing.uuid)?;
            repo.set_role(existing.uuid, Role::Admin)?;
            (existing.uuid, false)
        }
        None => {
            let identity = Identity::new(ADMIN_USERNAME, Some(ADMIN_EMAIL.to_string()));
            repo.create_identity(&identity, Role::Admin)?;
            (identity.uuid, true)
        }
    };

    let mut profiles_created = 0;
    for identity in repo.list_identities()? {
        let (_, created) = repo.ensure_profile(identity.uuid)?;
        if created {
            profiles_created += 1;
        }
    }

    Ok(RoleReport {
        admin,
        admin_created,
        profiles_created,
    })
}
