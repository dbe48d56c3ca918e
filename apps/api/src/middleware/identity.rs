//! Identity extraction for Axum handlers
//!
//! The core never authenticates. A trusted gateway at the edge verifies the
//! caller and forwards the opaque external user ID in a header; this
//! extractor makes it available to handlers and rejects requests where the
//! edge did not establish identity.
//!
//! # Usage
//!
//! ```rust,ignore
//! use crate::middleware::Identity;
//!
//! async fn handler(Identity(user_id): Identity) -> impl IntoResponse {
//!     format!("hello, {}", user_id)
//! }
//! ```

use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

use crate::error::ApiError;
use crate::models::profile::MAX_EXTERNAL_USER_ID_LEN;

/// Header the trusted gateway uses to forward the verified identity
pub const EXTERNAL_USER_ID_HEADER: &str = "x-external-user-id";

/// The authenticated external user ID, as established at the edge
///
/// Any user ID appearing in a request body is ignored in favor of this.
#[derive(Debug, Clone)]
pub struct Identity(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for Identity
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let value = parts
            .headers
            .get(EXTERNAL_USER_ID_HEADER)
            .ok_or(ApiError::Unauthorized)?;

        let user_id = value.to_str().map_err(|_| ApiError::Unauthorized)?.trim();

        if user_id.is_empty() || user_id.len() > MAX_EXTERNAL_USER_ID_LEN {
            return Err(ApiError::Unauthorized);
        }

        Ok(Identity(user_id.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    async fn extract(request: Request<()>) -> Result<Identity, ApiError> {
        let (mut parts, _) = request.into_parts();
        Identity::from_request_parts(&mut parts, &()).await
    }

    #[tokio::test]
    async fn test_extracts_user_id() {
        let request = Request::builder()
            .header(EXTERNAL_USER_ID_HEADER, "user-42")
            .body(())
            .unwrap();
        let identity = extract(request).await.unwrap();
        assert_eq!(identity.0, "user-42");
    }

    #[tokio::test]
    async fn test_missing_header_is_unauthorized() {
        let request = Request::builder().body(()).unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_empty_header_is_unauthorized() {
        let request = Request::builder()
            .header(EXTERNAL_USER_ID_HEADER, "  ")
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::Unauthorized)
        ));
    }

    #[tokio::test]
    async fn test_oversized_header_is_unauthorized() {
        let request = Request::builder()
            .header(EXTERNAL_USER_ID_HEADER, "a".repeat(256))
            .body(())
            .unwrap();
        assert!(matches!(
            extract(request).await,
            Err(ApiError::Unauthorized)
        ));
    }
}
