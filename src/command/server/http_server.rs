use std::convert::Infallible;
use std::fmt::Debug;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};

use hyper::header::{HeaderValue, CONTENT_TYPE};
use hyper::http::request::Parts;
use hyper::server::conn::http1;
use hyper::service::service_fn;
use hyper::{Method, Request, Response, StatusCode};
use hyper_util::rt::TokioIo;
use tokio::io::{AsyncRead, AsyncWrite};
use tokio::pin;
use tracing::{debug, error, info, instrument, Span};
use uuid::Uuid;

use crate::command::server::error::Error;
use crate::command::server::response_body::ResponseBody;
use crate::command::server::route::{self, Route};
use crate::command::server::ServerContext;

static API_VERSION_HEADER: &str = "docker-distribution-api-version";
static API_VERSION: &str = "registry/2.0";

pub async fn serve_request<S>(
    stream: TokioIo<S>,
    context: Arc<ServerContext>,
    timeouts: Arc<[Duration; 2]>,
    remote_address: SocketAddr,
) where
    S: Unpin + AsyncWrite + AsyncRead + Send + Debug + 'static,
{
    let conn = http1::Builder::new().serve_connection(
        stream,
        service_fn(move |request| handle_request(Arc::clone(&context), request)),
    );
    pin!(conn);

    for (iter, sleep_duration) in timeouts.iter().enumerate() {
        debug!("iter = {iter} sleep_duration = {sleep_duration:?}");
        tokio::select! {
            res = conn.as_mut() => {
                match res {
                    Ok(()) => debug!("connection from {remote_address} closed"),
                    Err(error) => debug!("error serving connection from {remote_address}: {error}"),
                }
                break;
            }
            () = tokio::time::sleep(*sleep_duration) => {
                debug!("iter = {iter} got timeout_interval, calling conn.graceful_shutdown");
                conn.as_mut().graceful_shutdown();
            }
        }
    }
}

#[instrument(
    skip(context, request),
    fields(request_id = tracing::field::Empty, user = tracing::field::Empty)
)]
pub async fn handle_request<B>(
    context: Arc<ServerContext>,
    request: Request<B>,
) -> Result<Response<ResponseBody>, Infallible> {
    let start_time = Instant::now();
    let request_id = Uuid::new_v4().to_string();
    Span::current().record("request_id", request_id.as_str());

    let (parts, _body) = request.into_parts();
    let parts = Arc::new(parts);

    let response = match router(&context, Arc::clone(&parts)) {
        Ok(response) => response,
        Err(error) => error_to_response(&error, &parts, &request_id),
    };

    let elapsed = start_time.elapsed();
    let status = response.status();
    let log = format!("{elapsed:?} - {status} {} {}", parts.method, parts.uri.path());

    if status.is_server_error() {
        error!("{log}");
    } else {
        info!("{log}");
    }

    Ok(response)
}

fn router(context: &ServerContext, parts: Arc<Parts>) -> Result<Response<ResponseBody>, Error> {
    let route = route::parse(&parts.method, &parts.uri);
    let access = route.access();

    let request_context =
        context.authorize_request(Arc::clone(&parts), &access, Span::current())?;

    if let Some(user) = request_context.user() {
        Span::current().record("user", user.name.as_str());
    }

    let response = match route {
        Route::ApiVersion => Response::builder()
            .status(StatusCode::OK)
            .header(API_VERSION_HEADER, API_VERSION)
            .body(ResponseBody::empty())?,
        Route::ListCatalog | Route::Repository { .. } => Response::builder()
            .status(StatusCode::NO_CONTENT)
            .body(ResponseBody::empty())?,
        Route::Unknown if [Method::GET, Method::HEAD].contains(&parts.method) => {
            return Err(Error::NotFound)
        }
        Route::Unknown => return Err(Error::Unsupported),
    };

    Ok(response)
}

fn error_to_response(error: &Error, parts: &Parts, request_id: &str) -> Response<ResponseBody> {
    let body = error.as_json(Some(request_id)).to_string();

    let mut response = Response::new(ResponseBody::fixed(body.into_bytes()));
    *response.status_mut() = error.status_code();
    response
        .headers_mut()
        .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

    if let Error::Auth(auth_error) = error {
        match auth_error.as_challenge() {
            Some(challenge) => challenge.set_headers(parts, response.headers_mut()),
            None => error!("Access controller failure: {auth_error}"),
        }
    }

    response
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{self, MockAccessController};
    use crate::command::server::server_context::tests::create_test_server_context;
    use base64::prelude::BASE64_STANDARD;
    use base64::Engine;
    use http_body_util::BodyExt;
    use hyper::header::{AUTHORIZATION, WWW_AUTHENTICATE};

    fn build_request(method: Method, uri: &str, credentials: Option<(&str, &str)>) -> Request<()> {
        let mut request = Request::builder().method(method).uri(uri);
        if let Some((username, password)) = credentials {
            let encoded = BASE64_STANDARD.encode(format!("{username}:{password}"));
            request = request.header(AUTHORIZATION, format!("Basic {encoded}"));
        }
        request.body(()).unwrap()
    }

    async fn response_json(response: Response<ResponseBody>) -> serde_json::Value {
        let body = response.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&body).unwrap()
    }

    #[tokio::test]
    async fn test_no_credentials() {
        let context = Arc::new(create_test_server_context());
        let request = build_request(Method::GET, "/v2/", None);

        let response = handle_request(context, request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"The-Shire\""
        );
        assert!(response.headers().get(API_VERSION_HEADER).is_none());

        let json = response_json(response).await;
        assert_eq!(json["errors"][0]["code"], "UNAUTHORIZED");
        assert_eq!(
            json["errors"][0]["message"],
            "basic authentication challenge for realm \"The-Shire\": invalid authorization credential"
        );
    }

    #[tokio::test]
    async fn test_valid_credentials() {
        let context = Arc::new(create_test_server_context());
        let request = build_request(Method::GET, "/v2/", Some(("bilbo", "baggins")));

        let response = handle_request(context, request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(response.headers().get(API_VERSION_HEADER).unwrap(), API_VERSION);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());
    }

    #[tokio::test]
    async fn test_wrong_password() {
        let context = Arc::new(create_test_server_context());
        let request = build_request(Method::GET, "/v2/", Some(("bilbo", "wrongpass")));

        let response = handle_request(context, request).await.unwrap();

        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(
            response.headers().get(WWW_AUTHENTICATE).unwrap(),
            "Basic realm=\"The-Shire\""
        );
    }

    #[tokio::test]
    async fn test_repository_routes() {
        let context = Arc::new(create_test_server_context());

        let request = build_request(
            Method::PUT,
            "/v2/library/alpine/manifests/latest",
            Some(("bilbo", "baggins")),
        );
        let response = handle_request(Arc::clone(&context), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NO_CONTENT);

        let request = build_request(Method::GET, "/v2/library/alpine/manifests/latest", None);
        let response = handle_request(context, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_unknown_route() {
        let context = Arc::new(create_test_server_context());

        let request = build_request(Method::GET, "/unknown", Some(("bilbo", "baggins")));
        let response = handle_request(Arc::clone(&context), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);

        // authentication comes before routing
        let request = build_request(Method::POST, "/unknown", Some(("bilbo", "baggins")));
        let response = handle_request(Arc::clone(&context), request).await.unwrap();
        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);

        let request = build_request(Method::GET, "/unknown", None);
        let response = handle_request(context, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn test_controller_internal_failure() {
        let mut controller = MockAccessController::new();
        controller.expect_authorized().returning(|_, _| {
            Err(auth::Error::RequestExtraction(
                "no request found in context".to_string(),
            ))
        });
        let context = Arc::new(ServerContext::new(Some(Arc::new(controller))));

        let request = build_request(Method::GET, "/v2/", Some(("bilbo", "baggins")));
        let response = handle_request(context, request).await.unwrap();

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        assert!(response.headers().get(WWW_AUTHENTICATE).is_none());

        let json = response_json(response).await;
        assert_eq!(json["errors"][0]["code"], "INTERNAL_SERVER_ERROR");
    }

    #[tokio::test]
    async fn test_no_access_controller() {
        let context = Arc::new(ServerContext::new(None));
        let request = build_request(Method::GET, "/v2/", None);

        let response = handle_request(context, request).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }
}
