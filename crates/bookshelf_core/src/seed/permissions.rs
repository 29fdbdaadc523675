//! Role-group permission policy installer.

use crate::model::account::{Permission, Role};
use crate::repo::account_repo::{AccountRepository, SqliteAccountRepository};
use crate::repo::RepoResult;
use log::info;
use rusqlite::{Connection, TransactionBehavior};
use serde::Serialize;

/// Permissions held by one role group after setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GroupPolicy {
    pub role: Role,
    pub group: String,
    pub permissions: Vec<Permission>,
}

/// Outcome of `setup_permissions`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PermissionReport {
    pub groups: Vec<GroupPolicy>,
    /// Identities joined to their role group.
    pub synced: usize,
    /// Identities left untouched because they have no profile.
    pub without_profile: usize,
}

/// Resets each role group to its policy permissions, then joins every
/// profiled identity to its role group and sets staff flags
/// (admin: staff and superuser, librarian: staff).
pub fn setup_permissions(conn: &mut Connection) -> RepoResult<PermissionReport> {
    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let report = apply(&SqliteAccountRepository::new(&tx))?;
    tx.commit()?;

    info!(
        "event=setup_permissions module=seed status=ok groups={} synced={} without_profile={}",
        report.groups.len(),
        report.synced,
        report.without_profile
    );
    Ok(report)
}

fn apply<A: AccountRepository>(repo: &A) -> RepoResult<PermissionReport> {
    let mut report = PermissionReport::default();

    for role in Role::ALL {
        let group = repo.role_group(role)?;
        repo.set_group_permissions(group.uuid, role.policy_permissions())?;
        let permissions = repo.group_permissions(group.uuid)?.into_iter().collect();
        report.groups.push(GroupPolicy {
            role,
            group: group.name,
            permissions,
        });
    }

    for identity in repo.list_identities()? {
        let Some(profile) = repo.get_profile(identity.uuid)? else {
            report.without_profile += 1;
            continue;
        };
        let group = repo.role_group(profile.role)?;
        repo.add_identity_to_group(identity.uuid, group.uuid)?;
        match profile.role {
            Role::Admin => repo.set_staff_flags(identity.uuid, true, true)?,
            Role::Librarian => repo.set_staff_flags(identity.uuid, true, identity.is_superuser)?,
            Role::Member => {}
        }
        report.synced += 1;
    }

    Ok(report)
}
