use axum::http::{HeaderMap, header};

/// Raw bearer token of the current request, attached to every GraphQL
/// request as context data. Decoding is deferred to the resolvers that
/// actually need a caller, so public queries never fail on a stale token.
#[derive(Debug, Clone, Default)]
pub struct Credential(pub Option<String>);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self(Some(token.into()))
    }

    /// Read `Authorization: Bearer <token>`. Any other shape counts as absent.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let token = headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::to_string);
        Self(token)
    }

    pub fn token(&self) -> Option<&str> {
        self.0.as_deref()
    }
}
