//! Axum extractor for the request context.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use std::convert::Infallible;

use super::RequestContext;

/// Reads the context installed by the grouping middleware.
///
/// A request that never passed through the middleware yields the background
/// context; logging through it then fails loudly instead of being rejected.
impl<S> FromRequestParts<S> for RequestContext
where
    S: Send + Sync,
{
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestContext>()
            .cloned()
            .unwrap_or_default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::Request;

    #[tokio::test]
    async fn test_extracts_installed_context() {
        let mut req = Request::new(());
        req.extensions_mut()
            .insert(RequestContext::background().with_group("5"));
        let (mut parts, _) = req.into_parts();

        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert_eq!(ctx.group(), Some("5"));
    }

    #[tokio::test]
    async fn test_missing_context_is_background() {
        let (mut parts, _) = Request::new(()).into_parts();
        let ctx = RequestContext::from_request_parts(&mut parts, &()).await.unwrap();
        assert!(ctx.logger().is_none());
    }
}
