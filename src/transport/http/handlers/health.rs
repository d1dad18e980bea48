use crate::transport::http::types::{ApiResponse, AppState};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Root endpoint: service banner plus the endpoint list, so an agent (or a
/// human with curl) can discover the surface without the Swagger UI.
pub async fn root_handler() -> impl IntoResponse {
    Json(ApiResponse::ok(json!({
        "message": "agent-cart-api is running",
        "endpoints": [
            "GET /products?search={term}&id={id}",
            "POST /cart",
            "GET /cart?id={cart_id}",
            "POST /cart/items",
            "PATCH /cart/items",
            "DELETE /cart/items?cart_id={cart_id}&product_id={product_id}",
            "POST /cart/close?cart_id={cart_id}",
            "GET /manifest"
        ]
    })))
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Service is healthy (DB reachable)", body = ApiResponse),
        (status = 503, description = "Service is unhealthy (DB unreachable)", body = ApiResponse)
    )
)]
pub async fn healthcheck_handler(State(state): State<AppState>) -> impl IntoResponse {
    match sqlx::query("SELECT 1").execute(state.cart_service.pool()).await {
        Ok(_) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({ "status": "ok" }))),
        )
            .into_response(),
        Err(e) => (
            StatusCode::SERVICE_UNAVAILABLE,
            Json(ApiResponse::err(format!("DB ping failed: {}", e))),
        )
            .into_response(),
    }
}
