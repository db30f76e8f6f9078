use std::fmt;

use super::Challenge;

/// Reason an authentication attempt was turned into a challenge.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Cause {
    InvalidCredential,
    AuthenticationFailure,
}

impl fmt::Display for Cause {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Cause::InvalidCredential => write!(f, "invalid authorization credential"),
            Cause::AuthenticationFailure => write!(f, "authentication failure"),
        }
    }
}

impl std::error::Error for Cause {}

#[derive(Debug)]
pub enum Error {
    Configuration(String),
    SchemeNotFound(String),
    DuplicateScheme(String),
    RequestExtraction(String),
    Challenge(Box<dyn Challenge>),
}

impl Error {
    pub fn as_challenge(&self) -> Option<&dyn Challenge> {
        match self {
            Error::Challenge(challenge) => Some(challenge.as_ref()),
            _ => None,
        }
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Configuration(err) => write!(f, "{err}"),
            Error::SchemeNotFound(name) => write!(f, "auth scheme not found: {name}"),
            Error::DuplicateScheme(name) => {
                write!(f, "auth scheme registered more than once: {name}")
            }
            Error::RequestExtraction(err) => write!(f, "Request extraction error: {err}"),
            Error::Challenge(challenge) => write!(f, "{challenge}"),
        }
    }
}

impl std::error::Error for Error {}
