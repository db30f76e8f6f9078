use crate::auth;
use opentelemetry_otlp::ExporterBuildError;
use rustls_pki_types::pem;
use std::{fmt, io};
use tracing::debug;

#[derive(Debug)]
pub enum Error {
    Io(io::Error),
    MissingExpectedTLSSection(String),
    ConfigurationFileFormat(String),
    MultipleAuthSchemes(String),
    Auth(auth::Error),
    Tls(String),
    ExporterInit(ExporterBuildError),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Io(err) => write!(f, "IO error: {err}"),
            Error::MissingExpectedTLSSection(error) => {
                write!(f, "Missing expected TLS section: {error}")
            }
            Error::ConfigurationFileFormat(error) => {
                write!(f, "Configuration file format error.")?;
                write!(f, "{error}")
            }
            Error::MultipleAuthSchemes(schemes) => {
                write!(f, "Only one auth scheme can be configured, found: {schemes}")
            }
            Error::Auth(error) => write!(f, "Auth error: {error}"),
            Error::Tls(error) => {
                write!(f, "TLS error: {error}")
            }
            Error::ExporterInit(error) => {
                write!(f, "Exporter initialization error: {error}")
            }
        }
    }
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        Error::Io(err)
    }
}

impl From<toml::de::Error> for Error {
    fn from(error: toml::de::Error) -> Self {
        debug!("TOML error: {error}");
        Error::ConfigurationFileFormat(error.to_string())
    }
}

impl From<auth::Error> for Error {
    fn from(error: auth::Error) -> Self {
        Error::Auth(error)
    }
}

impl From<rustls::Error> for Error {
    fn from(err: rustls::Error) -> Self {
        Error::Tls(err.to_string())
    }
}

impl From<pem::Error> for Error {
    fn from(err: pem::Error) -> Self {
        Error::Tls(err.to_string())
    }
}

impl From<ExporterBuildError> for Error {
    fn from(error: ExporterBuildError) -> Self {
        Error::ExporterInit(error)
    }
}
