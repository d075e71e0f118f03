use axum::{
    async_trait,
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use std::convert::Infallible;
use uuid::Uuid;

/// Per-request caller context handed explicitly to every upstream call.
///
/// Built from the incoming `Authorization: Bearer` header. Requests without
/// one fall back to the service token configured on the API client.
#[derive(Debug, Clone)]
pub struct SessionContext {
    token: Option<String>,
    pub request_id: Uuid,
}

impl SessionContext {
    pub fn anonymous() -> Self {
        Self {
            token: None,
            request_id: Uuid::new_v4(),
        }
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        Self {
            token: Some(token.into()),
            request_id: Uuid::new_v4(),
        }
    }

    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref()
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for SessionContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let token = parts
            .headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);

        Ok(match token {
            Some(t) => Self::with_token(t),
            None => Self::anonymous(),
        })
    }
}
