use axum::{
    Form, Json, Router,
    extract::State,
    http::{HeaderName, HeaderValue},
    response::AppendHeaders,
    routing::{get, post},
};

use crate::{
    basket::form::BasketCommand,
    dto::basket::{AddToBasketRequest, BasketLineAdded, BasketUpdated, BasketView},
    error::AppResult,
    response::ApiResponse,
    services::basket_service,
    session::{BasketSession, SessionCookie},
    state::AppState,
};

/// JSON body plus the `Set-Cookie` of a freshly issued session.
pub type WithSession<T> = (
    AppendHeaders<Vec<(HeaderName, HeaderValue)>>,
    Json<ApiResponse<T>>,
);

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(view_basket).post(add_to_basket))
        .route("/update", post(update_basket))
}

#[utoipa::path(
    get,
    path = "/api/basket",
    responses(
        (status = 200, description = "Basket with live prices", body = ApiResponse<BasketView>)
    ),
    tag = "Basket"
)]
pub async fn view_basket(
    State(state): State<AppState>,
    cookie: SessionCookie,
) -> AppResult<WithSession<BasketView>> {
    let mut session = BasketSession::load(state.sessions.as_ref(), cookie).await?;
    let resp = basket_service::view_basket(state.catalog.as_ref(), &mut session).await?;
    session.persist(state.sessions.as_ref()).await?;
    Ok((session.cookie_headers()?, Json(resp)))
}

#[utoipa::path(
    post,
    path = "/api/basket",
    request_body = AddToBasketRequest,
    responses(
        (status = 200, description = "Product added", body = ApiResponse<BasketLineAdded>),
        (status = 400, description = "Unknown product, color or size"),
        (status = 409, description = "Basket changed concurrently")
    ),
    tag = "Basket"
)]
pub async fn add_to_basket(
    State(state): State<AppState>,
    cookie: SessionCookie,
    Json(payload): Json<AddToBasketRequest>,
) -> AppResult<WithSession<BasketLineAdded>> {
    let mut session = BasketSession::load(state.sessions.as_ref(), cookie).await?;
    let resp = basket_service::add_to_basket(state.catalog.as_ref(), &mut session, payload).await?;
    session.persist(state.sessions.as_ref()).await?;
    Ok((session.cookie_headers()?, Json(resp)))
}

/// Form-encoded basket edit: `action=update|order` with `count_<p>_<c>_<s>`
/// fields, `action=remove_<p>_<c>_<s>` or `action=clear`.
#[utoipa::path(
    post,
    path = "/api/basket/update",
    request_body(content = String, content_type = "application/x-www-form-urlencoded"),
    responses(
        (status = 200, description = "Basket after the edit", body = ApiResponse<BasketUpdated>),
        (status = 400, description = "Missing or unknown action"),
        (status = 409, description = "Basket changed concurrently")
    ),
    tag = "Basket"
)]
pub async fn update_basket(
    State(state): State<AppState>,
    cookie: SessionCookie,
    Form(fields): Form<Vec<(String, String)>>,
) -> AppResult<WithSession<BasketUpdated>> {
    let command = BasketCommand::from_form(&fields)?;
    let mut session = BasketSession::load(state.sessions.as_ref(), cookie).await?;
    let resp = basket_service::update_basket(state.catalog.as_ref(), &mut session, command).await?;
    session.persist(state.sessions.as_ref()).await?;
    Ok((session.cookie_headers()?, Json(resp)))
}
