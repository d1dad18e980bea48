use crate::transport::http::types::{ApiResponse, AppState, ProductsQuery};
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

/// Search results stay tiny on purpose: three compact hits keep the
/// consuming agent's context small.
const SEARCH_LIMIT: i64 = 3;

#[utoipa::path(
    get,
    path = "/products",
    params(
        ("search" = Option<String>, Query, description = "Filter by name or category"),
        ("id" = Option<i32>, Query, description = "Fetch one product by id (detail view)")
    ),
    responses(
        (status = 200, description = "Product detail or compact hit list", body = ApiResponse),
        (status = 404, description = "Product id not found", body = ApiResponse),
        (status = 500, description = "Storage failure", body = ApiResponse)
    )
)]
pub async fn products_handler(
    State(state): State<AppState>,
    Query(params): Query<ProductsQuery>,
) -> impl IntoResponse {
    let catalog = state.cart_service.catalog();

    // Detail-by-id takes precedence over search.
    if let Some(id) = params.id {
        return match catalog.get_by_id(id).await {
            Ok(Some(product)) => {
                (StatusCode::OK, Json(ApiResponse::ok(json!(product)))).into_response()
            }
            Ok(None) => (
                StatusCode::NOT_FOUND,
                Json(ApiResponse::err(format!("product {} not found", id))),
            )
                .into_response(),
            Err(e) => storage_error(&e),
        };
    }

    match catalog.search(params.search.as_deref(), SEARCH_LIMIT).await {
        Ok(hits) => {
            (StatusCode::OK, Json(ApiResponse::ok(json!({ "products": hits })))).into_response()
        }
        Err(e) => storage_error(&e),
    }
}

fn storage_error(e: &anyhow::Error) -> axum::response::Response {
    tracing::error!(error = %e, "catalog query failed");
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ApiResponse::err(format!("storage failure: {}", e))),
    )
        .into_response()
}
