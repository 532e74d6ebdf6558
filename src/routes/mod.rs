use axum::{Router, routing::get};

use crate::state::AppState;

pub mod blog;
pub mod competitions;
pub mod doc;
pub mod health;
pub mod notifications;
pub mod orders;
pub mod params;
pub mod products;
pub mod push;
pub mod search;
pub mod services;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/shop/products", products::router())
        .route("/shop/categories", get(products::list_categories))
        .nest("/shop/orders", orders::router())
        .nest("/services", services::router())
        .nest("/notifications", notifications::router())
        .nest("/push", push::router())
        .nest("/competitions", competitions::router())
        .nest("/blog", blog::router())
        .nest("/search", search::router())
}
