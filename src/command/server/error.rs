use std::{fmt, io};

use hyper::StatusCode;
use serde_json::json;

use crate::auth;

#[derive(Debug)]
pub enum Error {
    Initialization(String),
    Execution(String),
    // mappable to classical HTTP responses
    Auth(auth::Error),
    NotFound,
    Unsupported,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            Error::Initialization(err) | Error::Execution(err) => write!(f, "{err}"),
            Error::Auth(err) => write!(f, "{err}"),
            Error::NotFound => write!(f, "Not Found"),
            Error::Unsupported => write!(f, "Unsupported operation"),
        }
    }
}

impl From<auth::Error> for Error {
    fn from(error: auth::Error) -> Self {
        Error::Auth(error)
    }
}

impl From<hyper::http::Error> for Error {
    fn from(error: hyper::http::Error) -> Self {
        Error::Execution(error.to_string())
    }
}

impl From<io::Error> for Error {
    fn from(error: io::Error) -> Self {
        Error::Execution(error.to_string())
    }
}

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Auth(err) if err.as_challenge().is_some() => StatusCode::UNAUTHORIZED,
            Error::NotFound => StatusCode::NOT_FOUND,
            Error::Unsupported => StatusCode::METHOD_NOT_ALLOWED,
            Error::Initialization(_) | Error::Execution(_) | Error::Auth(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    pub fn as_json(&self, request_id: Option<&str>) -> serde_json::Value {
        let code = match self.status_code() {
            StatusCode::UNAUTHORIZED => "UNAUTHORIZED",
            StatusCode::NOT_FOUND => "NOT_FOUND",
            StatusCode::METHOD_NOT_ALLOWED => "UNSUPPORTED",
            _ => "INTERNAL_SERVER_ERROR",
        };

        let detail = request_id.map_or(json!({}), |request_id| json!({ "request_id": request_id }));

        json!({
            "errors": [{
                "code": code,
                "message": self.to_string(),
                "detail": detail,
            }]
        })
    }
}
