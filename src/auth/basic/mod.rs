//! Static credential access controller.
//!
//! A single realm and a single username/password pair, compared against the
//! HTTP Basic credentials of each request. Credentials travel in clear text:
//! this scheme must only be served over TLS.


use std::fmt;
use std::sync::Arc;

use hyper::header::{HeaderValue, WWW_AUTHENTICATE};
use hyper::http::request::Parts;
use hyper::HeaderMap;
use tracing::error;

use super::request_ext::HeaderExt;
use super::{
    Access, AccessController, Cause, Challenge, Error, Options, RequestContext, UserInfo,
};

pub const SCHEME_NAME: &str = "basic";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Config {
    pub realm: String,
    pub user: String,
    pub password: String,
}

fn required_string(options: &Options, key: &str) -> Result<String, Error> {
    match options.get(key) {
        Some(toml::Value::String(value)) => Ok(value.clone()),
        _ => Err(Error::Configuration(format!(
            "\"{key}\" must be set for basic access controller"
        ))),
    }
}

impl TryFrom<&Options> for Config {
    type Error = Error;

    fn try_from(options: &Options) -> Result<Self, Self::Error> {
        let realm = required_string(options, "realm")?;
        let user = required_string(options, "user")?;
        let password = required_string(options, "password")?;

        Ok(Self {
            realm,
            user,
            password,
        })
    }
}

pub fn new_access_controller(options: &Options) -> Result<Arc<dyn AccessController>, Error> {
    let config = Config::try_from(options)?;
    Ok(Arc::new(BasicAccessController::new(config)))
}

pub struct BasicAccessController {
    config: Config,
}

impl BasicAccessController {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    fn challenge(&self, cause: Cause) -> Error {
        Error::Challenge(Box::new(BasicChallenge {
            realm: self.config.realm.clone(),
            cause,
        }))
    }
}

impl AccessController for BasicAccessController {
    fn authorized(
        &self,
        context: &RequestContext,
        _access: &[Access],
    ) -> Result<RequestContext, Error> {
        let request = context.request()?;

        let Some((username, password)) = request.basic_auth() else {
            return Err(self.challenge(Cause::InvalidCredential));
        };

        // NOTE: plain equality, the comparison time depends on the input
        if username != self.config.user || password != self.config.password {
            context.logger().in_scope(|| {
                error!("error authenticating user \"{username}\"");
            });
            return Err(self.challenge(Cause::AuthenticationFailure));
        }

        Ok(context.with_user(UserInfo { name: username }))
    }
}

#[derive(Debug)]
pub struct BasicChallenge {
    realm: String,
    cause: Cause,
}

impl fmt::Display for BasicChallenge {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "basic authentication challenge for realm \"{}\": {}",
            self.realm, self.cause
        )
    }
}

impl std::error::Error for BasicChallenge {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.cause)
    }
}

impl Challenge for BasicChallenge {
    fn set_headers(&self, _request: &Parts, headers: &mut HeaderMap) {
        let value = format!("Basic realm=\"{}\"", self.realm);
        match HeaderValue::from_str(&value) {
            Ok(value) => {
                headers.insert(WWW_AUTHENTICATE, value);
            }
            Err(error) => error!("Invalid challenge header for realm {}: {error}", self.realm),
        }
    }
}
