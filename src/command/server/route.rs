use hyper::{Method, Uri};

use crate::auth::Access;

const ACTION_PULL: &str = "pull";
const ACTION_PUSH: &str = "push";
const ACTION_DELETE: &str = "delete";

const REPOSITORY_ENDPOINTS: [&str; 4] = ["/blobs/", "/manifests/", "/referrers/", "/tags/list"];

#[derive(Debug, PartialEq)]
pub enum Route<'a> {
    ApiVersion,
    ListCatalog,
    Repository {
        namespace: &'a str,
        action: &'static str,
    },
    Unknown,
}

fn repository_action(method: &Method) -> Option<&'static str> {
    match *method {
        Method::GET | Method::HEAD => Some(ACTION_PULL),
        Method::POST | Method::PUT | Method::PATCH => Some(ACTION_PUSH),
        Method::DELETE => Some(ACTION_DELETE),
        _ => None,
    }
}

pub fn parse<'a>(method: &Method, uri: &'a Uri) -> Route<'a> {
    match uri.path() {
        "/v2" | "/v2/" => return Route::ApiVersion,
        "/v2/_catalog" => return Route::ListCatalog,
        _ => {}
    }

    let Some(path) = uri.path().strip_prefix("/v2/") else {
        return Route::Unknown;
    };

    let Some(action) = repository_action(method) else {
        return Route::Unknown;
    };

    let namespace = REPOSITORY_ENDPOINTS
        .iter()
        .filter_map(|endpoint| path.rfind(endpoint))
        .max()
        .map(|index| &path[..index]);

    match namespace {
        Some(namespace) if !namespace.is_empty() => Route::Repository { namespace, action },
        _ => Route::Unknown,
    }
}

impl Route<'_> {
    /// Access records a client must hold for this route.
    pub fn access(&self) -> Vec<Access> {
        match self {
            Route::ListCatalog => vec![Access::new("registry", "catalog", "*")],
            Route::Repository { namespace, action } => {
                vec![Access::new("repository", namespace, action)]
            }
            Route::ApiVersion | Route::Unknown => Vec::new(),
        }
    }
}
