use crate::command::server;
use crate::{auth, configuration};
use std::fmt;

#[derive(Debug)]
pub enum Error {
    Configuration(configuration::Error),
    Auth(auth::Error),
    Server(server::Error),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Configuration(err) => write!(f, "Configuration error: {err}"),
            Error::Auth(err) => write!(f, "Auth error: {err}"),
            Error::Server(err) => write!(f, "Server error: {err}"),
        }
    }
}

impl From<configuration::Error> for Error {
    fn from(err: configuration::Error) -> Self {
        Error::Configuration(err)
    }
}

impl From<auth::Error> for Error {
    fn from(err: auth::Error) -> Self {
        Error::Auth(err)
    }
}

impl From<server::Error> for Error {
    fn from(err: server::Error) -> Self {
        Error::Server(err)
    }
}
