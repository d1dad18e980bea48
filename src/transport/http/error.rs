//! Maps the service error taxonomy onto HTTP responses.

use crate::app::cart_service::CartError;
use crate::transport::http::types::ApiResponse;
use axum::http::StatusCode;
use axum::Json;
use serde_json::json;

/// Every taxonomy error becomes a structured envelope with a stable `kind`
/// tag in `data` and a human-readable `error` string. Storage failures are
/// logged with full detail and surfaced as 500, never as success.
pub fn error_response(err: &CartError) -> (StatusCode, Json<ApiResponse>) {
    let status = match err {
        CartError::InvalidInput(_) | CartError::MissingReference(_) => StatusCode::BAD_REQUEST,
        CartError::NotFound { .. } => StatusCode::NOT_FOUND,
        CartError::IdentityMismatch { .. } | CartError::CartClosed(_) => StatusCode::CONFLICT,
        CartError::Transient(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    let mut data = json!({ "kind": err.kind() });
    if let CartError::IdentityMismatch { product_id, canonical_name, expected_name } = err {
        data = json!({
            "kind": err.kind(),
            "product_id": product_id,
            "canonical_name": canonical_name,
            "expected_name": expected_name,
        });
    }

    if let CartError::Transient(inner) = err {
        tracing::error!(error = %inner, "storage failure");
    }

    let mut response = ApiResponse::err(err.to_string());
    response.data = Some(data);
    (status, Json(response))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn statuses_follow_the_taxonomy() {
        let cases = vec![
            (CartError::InvalidInput("x".into()), StatusCode::BAD_REQUEST),
            (
                CartError::NotFound { what: "product", key: "7".into() },
                StatusCode::NOT_FOUND,
            ),
            (
                CartError::IdentityMismatch {
                    product_id: 7,
                    canonical_name: "Red Scarf".into(),
                    expected_name: "socks".into(),
                },
                StatusCode::CONFLICT,
            ),
            (CartError::CartClosed("c1".into()), StatusCode::CONFLICT),
            (CartError::MissingReference("x".into()), StatusCode::BAD_REQUEST),
            (
                CartError::Transient(anyhow::anyhow!("connection refused")),
                StatusCode::INTERNAL_SERVER_ERROR,
            ),
        ];
        for (err, expected) in cases {
            let (status, body) = error_response(&err);
            assert_eq!(status, expected, "for {:?}", err);
            assert!(!body.0.success);
            assert_eq!(body.0.data.as_ref().unwrap()["kind"], err.kind());
        }
    }

    #[test]
    fn mismatch_payload_carries_both_names() {
        let err = CartError::IdentityMismatch {
            product_id: 7,
            canonical_name: "Red Scarf".into(),
            expected_name: "socks".into(),
        };
        let (_, body) = error_response(&err);
        let data = body.0.data.unwrap();
        assert_eq!(data["product_id"], 7);
        assert_eq!(data["canonical_name"], "Red Scarf");
        assert_eq!(data["expected_name"], "socks");
    }
}
