use base64::alphabet;
use base64::engine::{GeneralPurpose, GeneralPurposeConfig};
use base64::Engine;
use hyper::header::{AsHeaderName, AUTHORIZATION};
use hyper::http::request::Parts;

static BASIC_PREFIX: &str = "Basic ";

// non-canonical trailing bits are tolerated, as most HTTP clients and servers do
const BASIC_CREDENTIALS: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_allow_trailing_bits(true),
);

pub trait HeaderExt {
    fn get_header<K: AsHeaderName>(&self, header: K) -> Option<String>;
    fn basic_auth(&self) -> Option<(String, String)>;
}

impl HeaderExt for Parts {
    fn get_header<K>(&self, header: K) -> Option<String>
    where
        K: AsHeaderName,
    {
        self.headers
            .get(header)
            .and_then(|header| header.to_str().ok())
            .map(ToString::to_string)
    }

    fn basic_auth(&self) -> Option<(String, String)> {
        let authorization = self.get_header(AUTHORIZATION)?;

        // the scheme name is case-insensitive
        let prefix = authorization.get(..BASIC_PREFIX.len())?;
        if !prefix.eq_ignore_ascii_case(BASIC_PREFIX) {
            return None;
        }

        let value = BASIC_CREDENTIALS
            .decode(&authorization[BASIC_PREFIX.len()..])
            .ok()?;
        // credentials that are not UTF-8 can never match, let them fail the comparison
        let value = String::from_utf8_lossy(&value);

        let (username, password) = value.split_once(':')?;
        Some((username.to_string(), password.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::prelude::BASE64_STANDARD;
    use hyper::Request;

    fn build_parts(authorization: Option<&str>) -> Parts {
        let mut request = Request::builder();
        if let Some(authorization) = authorization {
            request = request.header(AUTHORIZATION, authorization);
        }
        let (parts, ()) = request.body(()).unwrap().into_parts();
        parts
    }

    #[test]
    fn test_basic_auth() {
        let encoded = BASE64_STANDARD.encode("bilbo:baggins");
        let parts = build_parts(Some(&format!("Basic {encoded}")));
        assert_eq!(
            parts.basic_auth(),
            Some(("bilbo".to_string(), "baggins".to_string()))
        );
    }

    #[test]
    fn test_basic_auth_scheme_case_insensitive() {
        let encoded = BASE64_STANDARD.encode("bilbo:baggins");
        let parts = build_parts(Some(&format!("basic {encoded}")));
        assert_eq!(
            parts.basic_auth(),
            Some(("bilbo".to_string(), "baggins".to_string()))
        );
    }

    #[test]
    fn test_basic_auth_password_with_colon() {
        let encoded = BASE64_STANDARD.encode("bilbo:bag:gins");
        let parts = build_parts(Some(&format!("Basic {encoded}")));
        assert_eq!(
            parts.basic_auth(),
            Some(("bilbo".to_string(), "bag:gins".to_string()))
        );
    }

    #[test]
    fn test_basic_auth_non_canonical_padding() {
        // "bilbo:baggins" encodes to "YmlsYm86YmFnZ2lucw==", the last symbol carries unused bits
        let parts = build_parts(Some("Basic YmlsYm86YmFnZ2lucx=="));
        assert_eq!(
            parts.basic_auth(),
            Some(("bilbo".to_string(), "baggins".to_string()))
        );
    }

    #[test]
    fn test_basic_auth_non_utf8() {
        let encoded = BASE64_STANDARD.encode(b"bilbo:bag\xffgins");
        let parts = build_parts(Some(&format!("Basic {encoded}")));
        assert_eq!(
            parts.basic_auth(),
            Some(("bilbo".to_string(), "bag\u{fffd}gins".to_string()))
        );
    }

    #[test]
    fn test_basic_auth_invalid() {
        assert_eq!(build_parts(None).basic_auth(), None);
        assert_eq!(build_parts(Some("Bearer token")).basic_auth(), None);
        assert_eq!(build_parts(Some("Basic !!not-base64!!")).basic_auth(), None);
        assert_eq!(build_parts(Some("Basic")).basic_auth(), None);

        let no_colon = BASE64_STANDARD.encode("bilbo");
        assert_eq!(
            build_parts(Some(&format!("Basic {no_colon}"))).basic_auth(),
            None
        );
    }
}
