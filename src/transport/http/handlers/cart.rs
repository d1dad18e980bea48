use crate::app::cart_service::CartError;
use crate::transport::http::error::error_response;
use crate::transport::http::types::{
    ApiResponse, AppState, CloseCartQuery, CloseCartRequest, CreateCartRequest, GetCartQuery,
    json_422,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/cart",
    request_body = CreateCartRequest,
    responses(
        (status = 200, description = "Existing active cart resumed", body = ApiResponse),
        (status = 201, description = "New cart created", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse),
        (status = 500, description = "Storage failure", body = ApiResponse)
    )
)]
pub async fn create_cart_handler(
    State(state): State<AppState>,
    request: Result<Json<CreateCartRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => return json_422(e, "{\"user_phone\": \"...\"}").into_response(),
    };

    match state.cart_service.resume_or_create(request.user_phone.as_deref()).await {
        Ok((cart, resumed)) => {
            let status = if resumed { StatusCode::OK } else { StatusCode::CREATED };
            (
                status,
                Json(ApiResponse::ok(json!({
                    "cart_id": cart.id,
                    "status": cart.status,
                    "resumed": resumed,
                }))),
            )
                .into_response()
        }
        Err(e) => error_response(&e).into_response(),
    }
}

#[utoipa::path(
    get,
    path = "/cart",
    params(
        ("id" = String, Query, description = "Cart id")
    ),
    responses(
        (status = 200, description = "Cart contents with subtotals and total", body = ApiResponse),
        (status = 400, description = "Missing cart id", body = ApiResponse),
        (status = 500, description = "Storage failure", body = ApiResponse)
    )
)]
pub async fn get_cart_handler(
    State(state): State<AppState>,
    Query(params): Query<GetCartQuery>,
) -> impl IntoResponse {
    let Some(cart_id) = params.id.as_deref().map(str::trim).filter(|s| !s.is_empty()) else {
        let err = CartError::InvalidInput("missing cart id (?id=...)".to_string());
        return error_response(&err).into_response();
    };

    // Read-only: an unknown cart id is an empty cart, not an error.
    match state.cart_service.get_cart(cart_id).await {
        Ok(summary) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({
                "cart_id": cart_id,
                "items": summary.items,
                "total": summary.total,
                "currency": "USD",
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[utoipa::path(
    post,
    path = "/cart/close",
    params(
        ("cart_id" = Option<String>, Query, description = "Cart id (may also be given in the body)")
    ),
    request_body = CloseCartRequest,
    responses(
        (status = 200, description = "Cart closed; final item list and total", body = ApiResponse),
        (status = 400, description = "No resolvable cart reference", body = ApiResponse),
        (status = 500, description = "Storage failure", body = ApiResponse)
    )
)]
pub async fn close_cart_handler(
    State(state): State<AppState>,
    Query(params): Query<CloseCartQuery>,
    request: Result<Json<CloseCartRequest>, JsonRejection>,
) -> impl IntoResponse {
    // cart_id resolves query-first, then body; an empty or invalid body is
    // fine when the query param is present.
    let body = request.map(|Json(b)| b).ok();
    let cart_id = params
        .cart_id
        .or_else(|| body.as_ref().and_then(|b| b.cart_id.clone()));
    let identity = body.as_ref().and_then(|b| b.identity.clone());

    match state
        .cart_service
        .close_cart(cart_id.as_deref(), identity.as_deref())
        .await
    {
        Ok(closed) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({
                "cart_id": closed.cart_id,
                "status": "closed",
                "items": closed.summary.items,
                "total": closed.summary.total,
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
