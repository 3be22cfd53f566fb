use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dto::shops::{
        ActivateShopRequest, CompanyInfo, ContactShopRequest, RegisterShopRequest, ShopDetail,
        ShopDirectory, ShopRegistered,
    },
    error::AppResult,
    models::Shop,
    response::ApiResponse,
    services::shop_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_shops))
        .route("/register", post(register_shop))
        .route("/activate", post(activate_shop))
        .route("/cvr/{cvr}", get(cvr_lookup))
        .route("/{id}", get(get_shop))
        .route("/{id}/contact", post(contact_shop))
}

#[utoipa::path(
    get,
    path = "/api/shops",
    responses(
        (status = 200, description = "Active shops grouped by postcode", body = ApiResponse<ShopDirectory>)
    ),
    tag = "Shops"
)]
pub async fn list_shops(State(state): State<AppState>) -> AppResult<Json<ApiResponse<ShopDirectory>>> {
    let resp = shop_service::list_shops(&state).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/shops/{id}",
    params(("id" = i32, Path, description = "Shop id")),
    responses(
        (status = 200, description = "Shop detail", body = ApiResponse<ShopDetail>),
        (status = 404, description = "Shop not found or inactive")
    ),
    tag = "Shops"
)]
pub async fn get_shop(
    State(state): State<AppState>,
    Path(id): Path<i32>,
) -> AppResult<Json<ApiResponse<ShopDetail>>> {
    let resp = shop_service::get_shop(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/shops/{id}/contact",
    params(("id" = i32, Path, description = "Shop id")),
    request_body = ContactShopRequest,
    responses(
        (status = 200, description = "Message forwarded to the shop"),
        (status = 404, description = "Shop not found or inactive"),
        (status = 422, description = "Invalid message")
    ),
    tag = "Shops"
)]
pub async fn contact_shop(
    State(state): State<AppState>,
    Path(id): Path<i32>,
    Json(payload): Json<ContactShopRequest>,
) -> AppResult<Json<ApiResponse<()>>> {
    let resp = shop_service::contact_shop(&state, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/shops/register",
    request_body = RegisterShopRequest,
    responses(
        (status = 200, description = "Shop created, activation mail sent", body = ApiResponse<ShopRegistered>),
        (status = 422, description = "Invalid or duplicate fields")
    ),
    tag = "Shops"
)]
pub async fn register_shop(
    State(state): State<AppState>,
    Json(payload): Json<RegisterShopRequest>,
) -> AppResult<Json<ApiResponse<ShopRegistered>>> {
    let resp = shop_service::register_shop(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/shops/activate",
    request_body = ActivateShopRequest,
    responses(
        (status = 200, description = "Shop activated", body = ApiResponse<Shop>),
        (status = 400, description = "Invalid or expired link"),
        (status = 409, description = "Already active"),
        (status = 422, description = "Password too short")
    ),
    tag = "Shops"
)]
pub async fn activate_shop(
    State(state): State<AppState>,
    Json(payload): Json<ActivateShopRequest>,
) -> AppResult<Json<ApiResponse<Shop>>> {
    let resp = shop_service::activate_shop(&state, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/shops/cvr/{cvr}",
    params(("cvr" = String, Path, description = "Eight digit CVR number")),
    responses(
        (status = 200, description = "Company found in the registry", body = ApiResponse<CompanyInfo>),
        (status = 400, description = "Malformed CVR number"),
        (status = 404, description = "No single active company"),
        (status = 502, description = "Registry unavailable")
    ),
    tag = "Shops"
)]
pub async fn cvr_lookup(
    State(state): State<AppState>,
    Path(cvr): Path<String>,
) -> AppResult<Json<ApiResponse<CompanyInfo>>> {
    let resp = shop_service::cvr_lookup(&state, &cvr).await?;
    Ok(Json(resp))
}
