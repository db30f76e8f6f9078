use std::sync::Arc;

use hyper::http::request::Parts;
use tracing::Span;

use super::{Error, UserInfo};

/// Request-scoped values handed to access controllers: the inbound request,
/// the span used as the request logger and, once established, the caller identity.
#[derive(Clone, Debug)]
pub struct RequestContext {
    request: Option<Arc<Parts>>,
    logger: Span,
    user: Option<UserInfo>,
}

impl Default for RequestContext {
    fn default() -> Self {
        Self {
            request: None,
            logger: Span::none(),
            user: None,
        }
    }
}

impl RequestContext {
    pub fn new(request: Arc<Parts>, logger: Span) -> Self {
        Self {
            request: Some(request),
            logger,
            user: None,
        }
    }

    pub fn request(&self) -> Result<&Parts, Error> {
        self.request
            .as_deref()
            .ok_or_else(|| Error::RequestExtraction("no request found in context".to_string()))
    }

    pub fn logger(&self) -> &Span {
        &self.logger
    }

    #[must_use]
    pub fn with_user(&self, user: UserInfo) -> Self {
        Self {
            user: Some(user),
            ..self.clone()
        }
    }

    pub fn user(&self) -> Option<&UserInfo> {
        self.user.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hyper::Request;

    fn build_parts() -> Arc<Parts> {
        let (parts, ()) = Request::builder().uri("/v2/").body(()).unwrap().into_parts();
        Arc::new(parts)
    }

    #[test]
    fn test_request_missing() {
        let context = RequestContext::default();
        let error = context.request().unwrap_err();
        assert!(matches!(error, Error::RequestExtraction(_)));
        assert!(error.as_challenge().is_none());
    }

    #[test]
    fn test_request_present() {
        let context = RequestContext::new(build_parts(), Span::none());
        assert_eq!(context.request().unwrap().uri.path(), "/v2/");
    }

    #[test]
    fn test_with_user_leaves_original_untouched() {
        let context = RequestContext::new(build_parts(), Span::none());
        let user_context = context.with_user(UserInfo {
            name: "bilbo".to_string(),
        });

        assert_eq!(context.user(), None);
        assert_eq!(user_context.user().map(|u| u.name.as_str()), Some("bilbo"));
        assert!(user_context.request().is_ok());
    }
}
