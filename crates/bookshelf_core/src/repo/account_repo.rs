//! Identity, profile and permission-grant repository.
//!
//! # Responsibility
//! - Persist identities together with their one-to-one role profile.
//! - Persist role groups, group permissions, memberships and direct grants.
//! - Resolve the effective permission set of an identity.
//!
//! # Invariants
//! - `create_identity` writes identity, profile and role-group membership in
//!   one transaction; no identity is ever visible without its profile.
//! - `set_role` keeps role-group membership in step with the profile role.
//! - Superusers resolve to every permission.

use crate::model::account::{
    Group, GroupId, Identity, IdentityId, Permission, Role, UserProfile,
};
use crate::repo::error::{EntityKind, IntegrityViolation, RepoError, RepoResult};
use crate::repo::sql::{bool_to_int, count, exists, int_to_bool, parse_uuid, write_atomically};
use rusqlite::{params, Connection, Row};
use std::collections::BTreeSet;
use uuid::Uuid;

const IDENTITY_SELECT_SQL: &str = "SELECT
    uuid,
    username,
    email,
    is_staff,
    is_superuser,
    created_at
FROM identities";
const PROFILE_SELECT_SQL: &str = "SELECT
    uuid,
    identity_uuid,
    role,
    created_at,
    updated_at
FROM user_profiles";
const GROUP_SELECT_SQL: &str = "SELECT uuid, name, role FROM auth_groups";

/// Repository interface for identities and access grants.
pub trait AccountRepository {
    /// Creates the identity, its profile with `role`, and joins the role group.
    fn create_identity(&self, identity: &Identity, role: Role) -> RepoResult<UserProfile>;
    fn get_identity(&self, id: IdentityId) -> RepoResult<Option<Identity>>;
    fn find_identity_by_username(&self, username: &str) -> RepoResult<Option<Identity>>;
    fn list_identities(&self) -> RepoResult<Vec<Identity>>;
    fn count_identities(&self) -> RepoResult<u64>;
    fn set_staff_flags(&self, id: IdentityId, is_staff: bool, is_superuser: bool)
        -> RepoResult<()>;

    fn get_profile(&self, identity: IdentityId) -> RepoResult<Option<UserProfile>>;
    /// Returns the profile, creating a member profile when missing.
    /// The flag is `true` when a profile was created.
    fn ensure_profile(&self, identity: IdentityId) -> RepoResult<(UserProfile, bool)>;
    /// Changes the role and moves the identity into the matching role group.
    fn set_role(&self, identity: IdentityId, role: Role) -> RepoResult<UserProfile>;

    fn role_group(&self, role: Role) -> RepoResult<Group>;
    fn group_permissions(&self, group: GroupId) -> RepoResult<BTreeSet<Permission>>;
    /// Replaces the group's permission set.
    fn set_group_permissions(&self, group: GroupId, permissions: &[Permission])
        -> RepoResult<()>;
    fn add_identity_to_group(&self, identity: IdentityId, group: GroupId) -> RepoResult<()>;
    fn identity_groups(&self, identity: IdentityId) -> RepoResult<Vec<Group>>;

    fn grant_permission(&self, identity: IdentityId, permission: Permission) -> RepoResult<()>;
    /// Removes a direct grant. Group grants are untouched.
    fn revoke_permission(&self, identity: IdentityId, permission: Permission)
        -> RepoResult<bool>;
    fn direct_permissions(&self, identity: IdentityId) -> RepoResult<BTreeSet<Permission>>;
    /// Direct grants plus group grants; every permission for superusers.
    fn effective_permissions(&self, identity: IdentityId) -> RepoResult<BTreeSet<Permission>>;
}

/// SQLite-backed account repository.
pub struct SqliteAccountRepository<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteAccountRepository<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self { conn }
    }
}

impl AccountRepository for SqliteAccountRepository<'_> {
    fn create_identity(&self, identity: &Identity, role: Role) -> RepoResult<UserProfile> {
        identity.validate()?;
        write_atomically(self.conn, |conn| {
            if exists(
                conn,
                "SELECT EXISTS(SELECT 1 FROM identities WHERE username = ?1);",
                [identity.username.as_str()],
            )? {
                return Err(
                    IntegrityViolation::DuplicateUsername(identity.username.clone()).into(),
                );
            }
            conn.execute(
                "INSERT INTO identities (uuid, username, email, is_staff, is_superuser)
                 VALUES (?1, ?2, ?3, ?4, ?5);",
                params![
                    identity.uuid.to_string(),
                    identity.username.as_str(),
                    identity.email.as_deref(),
                    bool_to_int(identity.is_staff),
                    bool_to_int(identity.is_superuser),
                ],
            )?;
            insert_profile(conn, identity.uuid, role)?;
            join_role_group(conn, identity.uuid, role)?;
            load_profile(conn, identity.uuid)?
                .ok_or_else(|| RepoError::not_found(EntityKind::Profile, identity.uuid))
        })
    }

    fn get_identity(&self, id: IdentityId) -> RepoResult<Option<Identity>> {
        load_one(
            self.conn,
            &format!("{IDENTITY_SELECT_SQL} WHERE uuid = ?1;"),
            &id.to_string(),
            parse_identity_row,
        )
    }

    fn find_identity_by_username(&self, username: &str) -> RepoResult<Option<Identity>> {
        load_one(
            self.conn,
            &format!("{IDENTITY_SELECT_SQL} WHERE username = ?1;"),
            username,
            parse_identity_row,
        )
    }

    fn list_identities(&self) -> RepoResult<Vec<Identity>> {
        let mut stmt = self
            .conn
            .prepare(&format!("{IDENTITY_SELECT_SQL} ORDER BY username ASC;"))?;
        let mut rows = stmt.query([])?;
        let mut identities = Vec::new();
        while let Some(row) = rows.next()? {
            identities.push(parse_identity_row(row)?);
        }
        Ok(identities)
    }

    fn count_identities(&self) -> RepoResult<u64> {
        count(self.conn, "SELECT COUNT(*) FROM identities;", [])
    }

    fn set_staff_flags(
        &self,
        id: IdentityId,
        is_staff: bool,
        is_superuser: bool,
    ) -> RepoResult<()> {
        let changed = self.conn.execute(
            "UPDATE identities SET is_staff = ?1, is_superuser = ?2 WHERE uuid = ?3;",
            params![bool_to_int(is_staff), bool_to_int(is_superuser), id.to_string()],
        )?;
        if changed == 0 {
            return Err(RepoError::not_found(EntityKind::Identity, id));
        }
        Ok(())
    }

    fn get_profile(&self, identity: IdentityId) -> RepoResult<Option<UserProfile>> {
        load_profile(self.conn, identity)
    }

    fn ensure_profile(&self, identity: IdentityId) -> RepoResult<(UserProfile, bool)> {
        write_atomically(self.conn, |conn| {
            if let Some(profile) = load_profile(conn, identity)? {
                return Ok((profile, false));
            }
            ensure_identity_exists(conn, identity)?;
            insert_profile(conn, identity, Role::default())?;
            join_role_group(conn, identity, Role::default())?;
            let profile = load_profile(conn, identity)?
                .ok_or_else(|| RepoError::not_found(EntityKind::Profile, identity))?;
            Ok((profile, true))
        })
    }

    fn set_role(&self, identity: IdentityId, role: Role) -> RepoResult<UserProfile> {
        write_atomically(self.conn, |conn| {
            let changed = conn.execute(
                "UPDATE user_profiles
                 SET
                    role = ?1,
                    updated_at = (strftime('%s', 'now') * 1000)
                 WHERE identity_uuid = ?2;",
                params![role.as_str(), identity.to_string()],
            )?;
            if changed == 0 {
                return Err(RepoError::not_found(EntityKind::Profile, identity));
            }
            conn.execute(
                "DELETE FROM identity_groups
                 WHERE identity_uuid = ?1
                   AND group_uuid IN (SELECT uuid FROM auth_groups WHERE role IS NOT NULL);",
                [identity.to_string()],
            )?;
            join_role_group(conn, identity, role)?;
            load_profile(conn, identity)?
                .ok_or_else(|| RepoError::not_found(EntityKind::Profile, identity))
        })
    }

    fn role_group(&self, role: Role) -> RepoResult<Group> {
        load_one(
            self.conn,
            &format!("{GROUP_SELECT_SQL} WHERE role = ?1;"),
            role.as_str(),
            parse_group_row,
        )?
        .ok_or_else(|| RepoError::not_found(EntityKind::Group, role.group_name()))
    }

    fn group_permissions(&self, group: GroupId) -> RepoResult<BTreeSet<Permission>> {
        load_permissions(
            self.conn,
            "SELECT permission_codename FROM group_permissions WHERE group_uuid = ?1;",
            group,
        )
    }

    fn set_group_permissions(
        &self,
        group: GroupId,
        permissions: &[Permission],
    ) -> RepoResult<()> {
        write_atomically(self.conn, |conn| {
            if !exists(
                conn,
                "SELECT EXISTS(SELECT 1 FROM auth_groups WHERE uuid = ?1);",
                [group.to_string()],
            )? {
                return Err(RepoError::not_found(EntityKind::Group, group));
            }
            conn.execute(
                "DELETE FROM group_permissions WHERE group_uuid = ?1;",
                [group.to_string()],
            )?;
            for permission in permissions {
                conn.execute(
                    "INSERT OR IGNORE INTO group_permissions (group_uuid, permission_codename)
                     VALUES (?1, ?2);",
                    params![group.to_string(), permission.codename()],
                )?;
            }
            Ok(())
        })
    }

    fn add_identity_to_group(&self, identity: IdentityId, group: GroupId) -> RepoResult<()> {
        write_atomically(self.conn, |conn| {
            ensure_identity_exists(conn, identity)?;
            conn.execute(
                "INSERT OR IGNORE INTO identity_groups (identity_uuid, group_uuid)
                 VALUES (?1, ?2);",
                params![identity.to_string(), group.to_string()],
            )?;
            Ok(())
        })
    }

    fn identity_groups(&self, identity: IdentityId) -> RepoResult<Vec<Group>> {
        let mut stmt = self.conn.prepare(
            "SELECT g.uuid AS uuid, g.name AS name, g.role AS role
             FROM auth_groups g
             INNER JOIN identity_groups ig ON ig.group_uuid = g.uuid
             WHERE ig.identity_uuid = ?1
             ORDER BY g.name ASC;",
        )?;
        let mut rows = stmt.query([identity.to_string()])?;
        let mut groups = Vec::new();
        while let Some(row) = rows.next()? {
            groups.push(parse_group_row(row)?);
        }
        Ok(groups)
    }

    fn grant_permission(&self, identity: IdentityId, permission: Permission) -> RepoResult<()> {
        write_atomically(self.conn, |conn| {
            ensure_identity_exists(conn, identity)?;
            conn.execute(
                "INSERT OR IGNORE INTO identity_permissions (identity_uuid, permission_codename)
                 VALUES (?1, ?2);",
                params![identity.to_string(), permission.codename()],
            )?;
            Ok(())
        })
    }

    fn revoke_permission(
        &self,
        identity: IdentityId,
        permission: Permission,
    ) -> RepoResult<bool> {
        let changed = self.conn.execute(
            "DELETE FROM identity_permissions
             WHERE identity_uuid = ?1 AND permission_codename = ?2;",
            params![identity.to_string(), permission.codename()],
        )?;
        Ok(changed > 0)
    }

    fn direct_permissions(&self, identity: IdentityId) -> RepoResult<BTreeSet<Permission>> {
        load_permissions(
            self.conn,
            "SELECT permission_codename FROM identity_permissions WHERE identity_uuid = ?1;",
            identity,
        )
    }

    fn effective_permissions(&self, identity: IdentityId) -> RepoResult<BTreeSet<Permission>> {
        let Some(found) = self.get_identity(identity)? else {
            return Ok(BTreeSet::new());
        };
        if found.is_superuser {
            return Ok(Permission::ALL.into_iter().collect());
        }
        load_permissions(
            self.conn,
            "SELECT permission_codename
             FROM identity_permissions
             WHERE identity_uuid = ?1
             UNION
             SELECT gp.permission_codename
             FROM group_permissions gp
             INNER JOIN identity_groups ig ON ig.group_uuid = gp.group_uuid
             WHERE ig.identity_uuid = ?1;",
            identity,
        )
    }
}

fn load_one<T>(
    conn: &Connection,
    sql: &str,
    key: &str,
    parse: impl Fn(&Row<'_>) -> RepoResult<T>,
) -> RepoResult<Option<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([key])?;
    match rows.next()? {
        Some(row) => Ok(Some(parse(row)?)),
        None => Ok(None),
    }
}

fn load_profile(conn: &Connection, identity: IdentityId) -> RepoResult<Option<UserProfile>> {
    load_one(
        conn,
        &format!("{PROFILE_SELECT_SQL} WHERE identity_uuid = ?1;"),
        &identity.to_string(),
        parse_profile_row,
    )
}

fn load_permissions(
    conn: &Connection,
    sql: &str,
    owner: Uuid,
) -> RepoResult<BTreeSet<Permission>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([owner.to_string()])?;
    let mut permissions = BTreeSet::new();
    while let Some(row) = rows.next()? {
        let codename: String = row.get(0)?;
        permissions.insert(Permission::parse(&codename).map_err(|_| {
            RepoError::InvalidData(format!("invalid permission codename `{codename}`"))
        })?);
    }
    Ok(permissions)
}

fn ensure_identity_exists(conn: &Connection, identity: IdentityId) -> RepoResult<()> {
    if exists(
        conn,
        "SELECT EXISTS(SELECT 1 FROM identities WHERE uuid = ?1);",
        [identity.to_string()],
    )? {
        Ok(())
    } else {
        Err(IntegrityViolation::UnknownIdentity(identity).into())
    }
}

fn insert_profile(conn: &Connection, identity: IdentityId, role: Role) -> RepoResult<()> {
    conn.execute(
        "INSERT INTO user_profiles (uuid, identity_uuid, role) VALUES (?1, ?2, ?3);",
        params![
            Uuid::new_v4().to_string(),
            identity.to_string(),
            role.as_str()
        ],
    )?;
    Ok(())
}

/// Joins the group bound to `role`. A missing role group is tolerated so
/// identities can exist before provisioning has run.
fn join_role_group(conn: &Connection, identity: IdentityId, role: Role) -> RepoResult<()> {
    conn.execute(
        "INSERT OR IGNORE INTO identity_groups (identity_uuid, group_uuid)
         SELECT ?1, uuid FROM auth_groups WHERE role = ?2;",
        params![identity.to_string(), role.as_str()],
    )?;
    Ok(())
}

fn parse_identity_row(row: &Row<'_>) -> RepoResult<Identity> {
    let uuid_text: String = row.get("uuid")?;
    let identity = Identity {
        uuid: parse_uuid(&uuid_text, "identities.uuid")?,
        username: row.get("username")?,
        email: row.get("email")?,
        is_staff: int_to_bool(row.get("is_staff")?, "identities.is_staff")?,
        is_superuser: int_to_bool(row.get("is_superuser")?, "identities.is_superuser")?,
        created_at: row.get("created_at")?,
    };
    identity.validate()?;
    Ok(identity)
}

fn parse_profile_row(row: &Row<'_>) -> RepoResult<UserProfile> {
    let uuid_text: String = row.get("uuid")?;
    let identity_text: String = row.get("identity_uuid")?;
    let role_text: String = row.get("role")?;
    Ok(UserProfile {
        uuid: parse_uuid(&uuid_text, "user_profiles.uuid")?,
        identity_uuid: parse_uuid(&identity_text, "user_profiles.identity_uuid")?,
        role: parse_role(&role_text, "user_profiles.role")?,
        created_at: row.get("created_at")?,
        updated_at: row.get("updated_at")?,
    })
}

fn parse_group_row(row: &Row<'_>) -> RepoResult<Group> {
    let uuid_text: String = row.get("uuid")?;
    let role = match row.get::<_, Option<String>>("role")? {
        Some(value) => Some(parse_role(&value, "auth_groups.role")?),
        None => None,
    };
    Ok(Group {
        uuid: parse_uuid(&uuid_text, "auth_groups.uuid")?,
        name: row.get("name")?,
        role,
    })
}

fn parse_role(value: &str, column: &str) -> RepoResult<Role> {
    Role::parse(value)
        .map_err(|_| RepoError::InvalidData(format!("invalid role `{value}` in {column}")))
}
