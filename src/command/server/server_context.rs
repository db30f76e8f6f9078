use std::sync::Arc;

use hyper::http::request::Parts;
use tracing::{debug, Span};

use crate::auth::{Access, AccessController, RequestContext};
use crate::command::server::error::Error;

pub struct ServerContext {
    access_controller: Option<Arc<dyn AccessController>>,
}

impl ServerContext {
    pub fn new(access_controller: Option<Arc<dyn AccessController>>) -> Self {
        Self { access_controller }
    }

    /// Runs the configured access controller against the request.
    ///
    /// Without access controller every request is let through anonymously.
    pub fn authorize_request(
        &self,
        parts: Arc<Parts>,
        access: &[Access],
        logger: Span,
    ) -> Result<RequestContext, Error> {
        let context = RequestContext::new(parts, logger);

        for record in access {
            debug!("Required access: {record}");
        }

        let Some(access_controller) = &self.access_controller else {
            return Ok(context);
        };

        Ok(access_controller.authorized(&context, access)?)
    }
}

#[cfg(test)]
pub mod tests {
    use super::*;
    use crate::auth::{self, MockAccessController, SchemeRegistry};
    use hyper::Request;

    pub fn create_test_server_context() -> ServerContext {
        let options = toml::from_str(
            r#"
            realm = "The-Shire"
            user = "bilbo"
            password = "baggins"
        "#,
        )
        .unwrap();

        let registry = SchemeRegistry::with_builtin_schemes().unwrap();
        let access_controller = registry.build("basic", &options).unwrap();
        ServerContext::new(Some(access_controller))
    }

    fn build_parts() -> Arc<Parts> {
        let (parts, ()) = Request::builder().uri("/v2/").body(()).unwrap().into_parts();
        Arc::new(parts)
    }

    #[test]
    fn test_authorize_request_without_controller() {
        let context = ServerContext::new(None);

        let request_context = context
            .authorize_request(build_parts(), &[], Span::none())
            .unwrap();
        assert!(request_context.user().is_none());
    }

    #[test]
    fn test_authorize_request_forwards_access() {
        let mut controller = MockAccessController::new();
        controller
            .expect_authorized()
            .withf(|_, access| {
                access.len() == 1 && access[0] == Access::new("repository", "alpine", "pull")
            })
            .times(1)
            .returning(|context, _| {
                Ok(context.with_user(auth::UserInfo {
                    name: "bilbo".to_string(),
                }))
            });

        let context = ServerContext::new(Some(Arc::new(controller)));
        let access = [Access::new("repository", "alpine", "pull")];

        let request_context = context
            .authorize_request(build_parts(), &access, Span::none())
            .unwrap();
        assert_eq!(request_context.user().map(|u| u.name.as_str()), Some("bilbo"));
    }

    #[test]
    fn test_authorize_request_challenge() {
        let context = create_test_server_context();

        let Err(Error::Auth(error)) = context.authorize_request(build_parts(), &[], Span::none())
        else {
            panic!("Expected an auth error");
        };
        assert!(error.as_challenge().is_some());
    }
}
