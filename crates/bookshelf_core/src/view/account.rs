//! Self-service registration page.

use crate::repo::IntegrityViolation;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::request::RequestContext;
use crate::view::{Site, ViewOutcome};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Submitted registration form. Credentials stay with the identity provider.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterForm {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

impl RegisterForm {
    pub fn new(username: impl Into<String>, email: Option<String>) -> Self {
        Self {
            username: username.into(),
            email,
        }
    }
}

/// Creates a member identity and redirects to the login page.
///
/// Invalid or taken usernames re-render the form with the error.
pub fn register_view(
    site: &Site<'_>,
    _ctx: &RequestContext,
    form: Option<RegisterForm>,
) -> ServiceResult<ViewOutcome> {
    let Some(form) = form else {
        return Ok(register_page(None, None));
    };
    match site
        .access()
        .register(&form.username, form.email.as_deref())
    {
        Ok(_) => Ok(ViewOutcome::redirect(
            site.login_url(),
            Some("Registration successful! Please login with your credentials.".to_string()),
        )),
        Err(
            err @ (ServiceError::Validation(_)
            | ServiceError::Integrity(IntegrityViolation::DuplicateUsername(_))),
        ) => Ok(register_page(Some(&form), Some(err.to_string()))),
        Err(err) => Err(err),
    }
}

fn register_page(form: Option<&RegisterForm>, error: Option<String>) -> ViewOutcome {
    ViewOutcome::render(
        "register",
        json!({
            "form": form,
            "error": error,
        }),
    )
}
