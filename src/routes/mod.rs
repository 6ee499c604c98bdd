use axum::Router;

use crate::state::AppState;

pub mod auth;
pub mod builds;
pub mod cart;
pub mod catalog;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod returns;
pub mod staff;
pub mod wallet;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .merge(catalog::router())
        .nest("/auth", auth::router())
        .nest("/builds", builds::router())
        .nest("/cart", cart::router())
        .nest("/orders", orders::router())
        .nest("/returns", returns::router())
        .nest("/wallet", wallet::router())
        .nest("/staff", staff::router())
}
