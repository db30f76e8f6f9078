mod context;
mod error;
mod request_ext;
pub mod basic;
pub mod registry;

use std::fmt;
use std::sync::Arc;

use hyper::http::request::Parts;
use hyper::HeaderMap;

pub use context::RequestContext;
pub use error::{Cause, Error};
pub use registry::SchemeRegistry;

/// Scheme options as they appear in the configuration file, keyed by option name.
pub type Options = toml::Table;

/// Builds an access controller from its scheme options.
pub type Constructor = fn(&Options) -> Result<Arc<dyn AccessController>, Error>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Resource {
    pub resource_type: String,
    pub name: String,
}

/// A single authorization requirement of a request: an action on a resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Access {
    pub resource: Resource,
    pub action: String,
}

impl Access {
    pub fn new(resource_type: &str, name: &str, action: &str) -> Self {
        Self {
            resource: Resource {
                resource_type: resource_type.to_string(),
                name: name.to_string(),
            },
            action: action.to_string(),
        }
    }
}

impl fmt::Display for Access {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}",
            self.resource.resource_type, self.resource.name, self.action
        )
    }
}

/// The authenticated identity attached to a request context.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct UserInfo {
    pub name: String,
}

/// Decides whether a request may proceed.
///
/// On success the returned context carries the caller identity. A failure
/// exposing a [`Challenge`] (see [`Error::as_challenge`]) must be rendered to
/// the client as `401 Unauthorized`; any other failure is an internal error.
#[cfg_attr(test, mockall::automock)]
pub trait AccessController: Send + Sync {
    fn authorized(
        &self,
        context: &RequestContext,
        access: &[Access],
    ) -> Result<RequestContext, Error>;
}

/// An authorization failure able to prompt the client for credentials.
///
/// The cause of the failure is available through [`std::error::Error::source`].
pub trait Challenge: std::error::Error + Send + Sync {
    /// Sets the challenge headers on the response. The status code is left to the caller.
    fn set_headers(&self, request: &Parts, headers: &mut HeaderMap);
}
