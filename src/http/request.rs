//! Request handling.
//!
//! # Responsibilities
//! - Generate unique request ID (UUID v4)
//! - Extract the client id and ordered query pairs from the query string
//!
//! # Design Decisions
//! - Request ID added as early as possible for tracing
//! - An incoming `x-request-id` is kept, not replaced
//! - Query pairs keep their inbound order and duplicates

use axum::http::{HeaderName, HeaderValue, Request};
use tower_http::request_id::{MakeRequestId, RequestId};
use uuid::Uuid;

use crate::routing::ids::ClientId;

pub const X_REQUEST_ID: HeaderName = HeaderName::from_static("x-request-id");

/// Query parameter carrying the client id.
pub const CLIENT_ID_PARAM: &str = "client-id";

/// Generates UUID v4 request ids.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRequestId;

impl MakeRequestId for UuidRequestId {
    fn make_request_id<B>(&mut self, _request: &Request<B>) -> Option<RequestId> {
        HeaderValue::from_str(&Uuid::new_v4().to_string())
            .ok()
            .map(RequestId::new)
    }
}

/// Client id parameter present but not a non-negative integer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidClientId(pub String);

/// Decode a raw query string into ordered pairs.
pub fn query_pairs(raw: Option<&str>) -> Vec<(String, String)> {
    raw.map(|q| url::form_urlencoded::parse(q.as_bytes()).into_owned().collect())
        .unwrap_or_default()
}

/// First `client-id` parameter, if any.
pub fn client_id(pairs: &[(String, String)]) -> Result<Option<ClientId>, InvalidClientId> {
    match pairs.iter().find(|(k, _)| k == CLIENT_ID_PARAM) {
        None => Ok(None),
        Some((_, v)) if v.is_empty() => Ok(None),
        Some((_, v)) => v
            .parse::<ClientId>()
            .map(Some)
            .map_err(|_| InvalidClientId(v.clone())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_query_pairs_keep_order() {
        let pairs = query_pairs(Some("b=2&client-id=100&a=x%20y&b=3"));
        assert_eq!(
            pairs,
            vec![
                ("b".to_string(), "2".to_string()),
                ("client-id".to_string(), "100".to_string()),
                ("a".to_string(), "x y".to_string()),
                ("b".to_string(), "3".to_string()),
            ]
        );
        assert!(query_pairs(None).is_empty());
    }

    #[test]
    fn test_client_id() {
        assert_eq!(client_id(&query_pairs(Some("client-id=7"))), Ok(Some(ClientId(7))));
        assert_eq!(client_id(&query_pairs(Some("x=1"))), Ok(None));
        assert_eq!(client_id(&query_pairs(Some("client-id="))), Ok(None));
        assert_eq!(
            client_id(&query_pairs(Some("client-id=abc"))),
            Err(InvalidClientId("abc".to_string()))
        );
        assert!(client_id(&query_pairs(Some("client-id=-4"))).is_err());
    }
}
