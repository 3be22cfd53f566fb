use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod basket;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod shops;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/basket", basket::router())
        .nest("/orders", orders::route())
        .nest("/shops", shops::router())
        .nest("/auth", auth::router())
}
