use crate::app::cart_service::{CartError, SetReceipt};
use crate::transport::http::error::error_response;
use crate::transport::http::types::{
    AddItemRequest, ApiResponse, AppState, RemoveItemQuery, SetQuantityRequest, json_422,
};
use axum::extract::rejection::JsonRejection;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

#[utoipa::path(
    post,
    path = "/cart/items",
    request_body = AddItemRequest,
    responses(
        (status = 200, description = "Quantity incremented; canonical name and new total", body = ApiResponse),
        (status = 404, description = "Product or cart not found", body = ApiResponse),
        (status = 409, description = "Expected-name mismatch or cart closed", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse),
        (status = 500, description = "Storage failure", body = ApiResponse)
    )
)]
pub async fn add_item_handler(
    State(state): State<AppState>,
    request: Result<Json<AddItemRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"cart_id\": \"...\", \"product_id\": 1, \"quantity\": 1}")
                .into_response()
        }
    };

    let quantity = request.quantity.unwrap_or(1);
    match state
        .cart_service
        .add_item(
            &request.cart_id,
            request.product_id,
            quantity,
            request.expected_name.as_deref(),
        )
        .await
    {
        Ok(receipt) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({
                "cart_id": request.cart_id,
                "product_id": request.product_id,
                "added": receipt.product_name,
                "total": receipt.total,
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[utoipa::path(
    patch,
    path = "/cart/items",
    request_body = SetQuantityRequest,
    responses(
        (status = 200, description = "Exact quantity stored, or line deleted when <= 0", body = ApiResponse),
        (status = 404, description = "Product or cart not found", body = ApiResponse),
        (status = 409, description = "Expected-name mismatch or cart closed", body = ApiResponse),
        (status = 422, description = "Invalid JSON body", body = ApiResponse),
        (status = 500, description = "Storage failure", body = ApiResponse)
    )
)]
pub async fn set_quantity_handler(
    State(state): State<AppState>,
    request: Result<Json<SetQuantityRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(request) = match request {
        Ok(v) => v,
        Err(e) => {
            return json_422(e, "{\"cart_id\": \"...\", \"product_id\": 1, \"quantity\": 3}")
                .into_response()
        }
    };

    match state
        .cart_service
        .set_item_quantity(
            &request.cart_id,
            request.product_id,
            request.quantity,
            request.expected_name.as_deref(),
        )
        .await
    {
        Ok(SetReceipt::Deleted) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({
                "cart_id": request.cart_id,
                "product_id": request.product_id,
                "deleted": true,
            }))),
        )
            .into_response(),
        Ok(SetReceipt::Quantity(quantity)) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({
                "cart_id": request.cart_id,
                "product_id": request.product_id,
                "quantity": quantity,
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}

#[utoipa::path(
    delete,
    path = "/cart/items",
    params(
        ("cart_id" = String, Query, description = "Cart id"),
        ("product_id" = i32, Query, description = "Product id to remove")
    ),
    responses(
        (status = 200, description = "Delete attempted; `removed` reports whether a row existed", body = ApiResponse),
        (status = 400, description = "Missing cart_id or product_id", body = ApiResponse),
        (status = 500, description = "Storage failure", body = ApiResponse)
    )
)]
pub async fn remove_item_handler(
    State(state): State<AppState>,
    Query(params): Query<RemoveItemQuery>,
) -> impl IntoResponse {
    let (Some(cart_id), Some(product_id)) = (params.cart_id, params.product_id) else {
        let err =
            CartError::InvalidInput("missing cart_id or product_id query parameter".to_string());
        return error_response(&err).into_response();
    };

    match state.cart_service.remove_item(&cart_id, product_id).await {
        Ok(removed) => (
            StatusCode::OK,
            Json(ApiResponse::ok(json!({
                "cart_id": cart_id,
                "product_id": product_id,
                "removed": removed,
            }))),
        )
            .into_response(),
        Err(e) => error_response(&e).into_response(),
    }
}
