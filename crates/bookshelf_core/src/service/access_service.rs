//! Role and permission checks over the account repository.
//!
//! # Responsibility
//! - Answer `has_role` / `has_permission` for an identity.
//! - Turn a `RequestContext` into an authenticated identity or an
//!   access error.
//! - Own the administrative account use-cases: registration, role
//!   assignment, direct grants.
//!
//! # Invariants
//! - Predicates never fail: storage errors are logged and the check denies.
//! - Mutating use-cases check permissions, dashboards check roles.
//! - Only admins may assign roles or change direct grants.

use crate::model::account::{Identity, IdentityId, Permission, Role, UserProfile};
use crate::repo::account_repo::AccountRepository;
use crate::repo::EntityKind;
use crate::service::error::{Requirement, ServiceError, ServiceResult};
use crate::service::request::RequestContext;
use log::{error, info, warn};
use serde::Serialize;
use std::collections::BTreeSet;

/// Returns whether `identity`'s profile carries `role`.
///
/// Unknown identities and identities without a profile have no role.
pub fn has_role<A: AccountRepository + ?Sized>(repo: &A, identity: IdentityId, role: Role) -> bool {
    match repo.get_profile(identity) {
        Ok(Some(profile)) => profile.role == role,
        Ok(None) => false,
        Err(err) => {
            error!(
                "event=role_check module=access status=error role={} error={}",
                role, err
            );
            false
        }
    }
}

/// Returns whether `identity` holds `permission` directly, through a group,
/// or as a superuser.
pub fn has_permission<A: AccountRepository + ?Sized>(
    repo: &A,
    identity: IdentityId,
    permission: Permission,
) -> bool {
    match repo.effective_permissions(identity) {
        Ok(granted) => granted.contains(&permission),
        Err(err) => {
            error!(
                "event=permission_check module=access status=error permission={} error={}",
                permission, err
            );
            false
        }
    }
}

/// Identity and profile created by `register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registration {
    pub identity: Identity,
    pub profile: UserProfile,
}

/// Access-control use-cases.
pub struct AccessService<A: AccountRepository> {
    repo: A,
}

impl<A: AccountRepository> AccessService<A> {
    pub fn new(repo: A) -> Self {
        Self { repo }
    }

    pub fn repo(&self) -> &A {
        &self.repo
    }

    pub fn has_role(&self, identity: IdentityId, role: Role) -> bool {
        has_role(&self.repo, identity, role)
    }

    pub fn has_permission(&self, identity: IdentityId, permission: Permission) -> bool {
        has_permission(&self.repo, identity, permission)
    }

    /// Resolves the request's identity.
    ///
    /// # Errors
    /// - `AuthenticationRequired` for anonymous requests and for identities
    ///   the store no longer knows.
    pub fn authenticate(&self, ctx: &RequestContext) -> ServiceResult<Identity> {
        let Some(id) = ctx.identity() else {
            return Err(ServiceError::AuthenticationRequired);
        };
        match self.repo.get_identity(id)? {
            Some(identity) => Ok(identity),
            None => {
                warn!(
                    "event=authenticate module=access status=stale identity={}",
                    id
                );
                Err(ServiceError::AuthenticationRequired)
            }
        }
    }

    /// Authenticates and checks `role`.
    pub fn require_role(&self, ctx: &RequestContext, role: Role) -> ServiceResult<Identity> {
        let identity = self.authenticate(ctx)?;
        if !self.has_role(identity.uuid, role) {
            return Err(denied(identity.uuid, Requirement::Role(role)));
        }
        Ok(identity)
    }

    /// Authenticates and checks `permission`.
    pub fn require_permission(
        &self,
        ctx: &RequestContext,
        permission: Permission,
    ) -> ServiceResult<Identity> {
        let identity = self.authenticate(ctx)?;
        if !self.has_permission(identity.uuid, permission) {
            return Err(denied(identity.uuid, Requirement::Permission(permission)));
        }
        Ok(identity)
    }

    /// Creates an identity with a member profile and Members group membership.
    ///
    /// # Errors
    /// - `Validation` for a malformed username or email.
    /// - `Integrity(DuplicateUsername)` when the username is taken.
    pub fn register(&self, username: &str, email: Option<&str>) -> ServiceResult<Registration> {
        let email = email
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .map(str::to_string);
        let draft = Identity::new(username.trim(), email);
        draft.validate()?;
        let profile = self.repo.create_identity(&draft, Role::Member)?;
        let identity = self
            .repo
            .get_identity(draft.uuid)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Identity, draft.uuid))?;
        info!(
            "event=register module=access status=ok identity={}",
            identity.uuid
        );
        Ok(Registration { identity, profile })
    }

    /// Profile of `identity`, backfilling a member profile when missing.
    pub fn profile(&self, identity: IdentityId) -> ServiceResult<UserProfile> {
        let (profile, created) = self.repo.ensure_profile(identity)?;
        if created {
            info!(
                "event=profile_backfill module=access status=ok identity={}",
                identity
            );
        }
        Ok(profile)
    }

    /// Effective permission set of `identity`.
    pub fn permissions_of(&self, identity: IdentityId) -> ServiceResult<BTreeSet<Permission>> {
        Ok(self.repo.effective_permissions(identity)?)
    }

    /// Moves `target` to `role`. The acting identity must be an admin.
    pub fn assign_role(
        &self,
        ctx: &RequestContext,
        target: IdentityId,
        role: Role,
    ) -> ServiceResult<UserProfile> {
        let actor = self.require_role(ctx, Role::Admin)?;
        self.ensure_identity(target)?;
        let profile = self.repo.set_role(target, role)?;
        info!(
            "event=assign_role module=access status=ok actor={} target={} role={}",
            actor.uuid, target, role
        );
        Ok(profile)
    }

    /// Grants `permission` directly to `target`. The acting identity must be
    /// an admin.
    pub fn grant_permission(
        &self,
        ctx: &RequestContext,
        target: IdentityId,
        permission: Permission,
    ) -> ServiceResult<()> {
        let actor = self.require_role(ctx, Role::Admin)?;
        self.ensure_identity(target)?;
        self.repo.grant_permission(target, permission)?;
        info!(
            "event=grant_permission module=access status=ok actor={} target={} permission={}",
            actor.uuid, target, permission
        );
        Ok(())
    }

    /// Removes a direct grant from `target`; group grants stay. Returns
    /// whether a grant was removed.
    pub fn revoke_permission(
        &self,
        ctx: &RequestContext,
        target: IdentityId,
        permission: Permission,
    ) -> ServiceResult<bool> {
        let actor = self.require_role(ctx, Role::Admin)?;
        self.ensure_identity(target)?;
        let removed = self.repo.revoke_permission(target, permission)?;
        info!(
            "event=revoke_permission module=access status=ok actor={} target={} permission={} removed={}",
            actor.uuid, target, permission, removed
        );
        Ok(removed)
    }

    fn ensure_identity(&self, id: IdentityId) -> ServiceResult<Identity> {
        self.repo
            .get_identity(id)?
            .ok_or_else(|| ServiceError::not_found(EntityKind::Identity, id))
    }
}

fn denied(identity: IdentityId, requirement: Requirement) -> ServiceError {
    warn!(
        "event=access_denied module=access status=denied identity={} requirement=\"{}\"",
        identity, requirement
    );
    ServiceError::PermissionDenied {
        identity,
        requirement,
    }
}
