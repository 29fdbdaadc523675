//! Per-request identity context handed in by the session layer.

use crate::model::account::IdentityId;

/// Identity and path of one inbound request.
///
/// The session collaborator decides who is logged in; this type only carries
/// the answer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    identity: Option<IdentityId>,
    path: String,
}

impl RequestContext {
    pub fn anonymous(path: impl Into<String>) -> Self {
        Self {
            identity: None,
            path: path.into(),
        }
    }

    pub fn authenticated(identity: IdentityId, path: impl Into<String>) -> Self {
        Self {
            identity: Some(identity),
            path: path.into(),
        }
    }

    pub fn identity(&self) -> Option<IdentityId> {
        self.identity
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some()
    }

    /// Requested path, used as the `next` target after login.
    pub fn path(&self) -> &str {
        &self.path
    }
}
