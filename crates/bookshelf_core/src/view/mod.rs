//! Request handlers for the library site.
//!
//! # Responsibility
//! - Gate each handler behind its role or permission.
//! - Hand the rendering collaborator a template name plus a JSON context;
//!   no HTML is built here.
//! - Map access failures to outcomes: anonymous requests redirect to the
//!   login page with `next`, denied requests become `Forbidden`, unknown ids
//!   become `NotFound`.
//!
//! # Invariants
//! - Handlers are free functions over `(&Site, &RequestContext, ..)`.
//! - Storage failures are returned as `Err`, never turned into an outcome.

pub mod account;
pub mod catalog;
pub mod dashboard;

use crate::config::{AppConfig, DEFAULT_LOGIN_URL};
use crate::model::catalog::BookId;
use crate::repo::account_repo::SqliteAccountRepository;
use crate::repo::catalog_repo::SqliteCatalogRepository;
use crate::service::access_service::AccessService;
use crate::service::book_service::BookService;
use crate::service::error::{ServiceError, ServiceResult};
use crate::service::query_service::QueryService;
use crate::service::request::RequestContext;
use log::debug;
use rusqlite::Connection;
use serde_json::{Map, Value};

pub use account::{register_view, RegisterForm};
pub use catalog::{
    add_book_view, book_detail, delete_book_view, edit_book_view, library_detail, library_list,
    list_books,
};
pub use dashboard::{admin_view, check_permissions_view, librarian_view, member_view, profile_view};

const TEMPLATE_PREFIX: &str = "relationship_app/";
pub(crate) const BOOK_LIST_URL: &str = "/relationship/books/";

/// Result of one handler call.
#[derive(Debug, Clone, PartialEq)]
pub enum ViewOutcome {
    Rendered {
        template: String,
        context: Map<String, Value>,
    },
    Redirected {
        location: String,
        /// One-shot message shown on the next page.
        flash: Option<String>,
    },
    Forbidden {
        reason: String,
    },
    NotFound {
        message: String,
    },
}

impl ViewOutcome {
    /// Renders `relationship_app/<name>.html`. Non-object contexts are
    /// wrapped under `value`.
    pub fn render(name: &str, context: Value) -> Self {
        let context = match context {
            Value::Object(map) => map,
            other => {
                let mut map = Map::new();
                map.insert("value".to_string(), other);
                map
            }
        };
        Self::Rendered {
            template: format!("{TEMPLATE_PREFIX}{name}.html"),
            context,
        }
    }

    pub fn redirect(location: impl Into<String>, flash: Option<String>) -> Self {
        Self::Redirected {
            location: location.into(),
            flash,
        }
    }

    pub fn template(&self) -> Option<&str> {
        match self {
            Self::Rendered { template, .. } => Some(template),
            _ => None,
        }
    }

    pub fn context(&self) -> Option<&Map<String, Value>> {
        match self {
            Self::Rendered { context, .. } => Some(context),
            _ => None,
        }
    }
}

/// Per-request handle on the store plus site-wide settings.
pub struct Site<'conn> {
    conn: &'conn Connection,
    login_url: String,
}

impl<'conn> Site<'conn> {
    pub fn new(conn: &'conn Connection) -> Self {
        Self {
            conn,
            login_url: DEFAULT_LOGIN_URL.to_string(),
        }
    }

    pub fn from_config(conn: &'conn Connection, config: &AppConfig) -> Self {
        Self {
            conn,
            login_url: config.login_url().to_string(),
        }
    }

    pub fn with_login_url(mut self, login_url: impl Into<String>) -> Self {
        self.login_url = login_url.into();
        self
    }

    pub fn login_url(&self) -> &str {
        &self.login_url
    }

    pub fn catalog(&self) -> SqliteCatalogRepository<'conn> {
        SqliteCatalogRepository::new(self.conn)
    }

    pub fn access(&self) -> AccessService<SqliteAccountRepository<'conn>> {
        AccessService::new(SqliteAccountRepository::new(self.conn))
    }

    pub fn queries(&self) -> QueryService<SqliteCatalogRepository<'conn>> {
        QueryService::new(self.catalog())
    }

    pub fn books(
        &self,
    ) -> BookService<SqliteCatalogRepository<'conn>, SqliteAccountRepository<'conn>> {
        BookService::new(self.catalog(), SqliteAccountRepository::new(self.conn))
    }

    /// Login URL carrying the request path as `next`.
    pub fn login_redirect_url(&self, ctx: &RequestContext) -> String {
        let separator = if self.login_url.contains('?') { '&' } else { '?' };
        format!(
            "{}{}next={}",
            self.login_url,
            separator,
            urlencoding::encode(ctx.path())
        )
    }

    /// Maps access errors of a handler body onto outcomes.
    fn finish(
        &self,
        ctx: &RequestContext,
        result: ServiceResult<ViewOutcome>,
    ) -> ServiceResult<ViewOutcome> {
        match result {
            Ok(outcome) => Ok(outcome),
            Err(ServiceError::AuthenticationRequired) => {
                debug!(
                    "event=view_login_redirect module=view status=redirect path={}",
                    ctx.path()
                );
                Ok(ViewOutcome::redirect(self.login_redirect_url(ctx), None))
            }
            Err(err @ ServiceError::PermissionDenied { .. }) => Ok(ViewOutcome::Forbidden {
                reason: err.to_string(),
            }),
            Err(err @ ServiceError::NotFound { .. }) => Ok(ViewOutcome::NotFound {
                message: err.to_string(),
            }),
            Err(err) => Err(err),
        }
    }
}

pub(crate) fn book_detail_url(id: BookId) -> String {
    format!("/relationship/book/{id}/")
}
