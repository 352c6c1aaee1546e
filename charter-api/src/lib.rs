use axum::{
    http::Method,
    middleware::from_fn_with_state,
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

pub mod availability;
pub mod bookings;
pub mod dashboard;
pub mod error;
pub mod middleware;
pub mod oauth;
pub mod state;

pub use state::AppState;

pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
            axum::http::header::USER_AGENT,
        ]);

    let admin = from_fn_with_state(state.clone(), middleware::admin_auth_middleware);

    Router::new()
        .route("/health", get(health))
        .merge(oauth::routes())
        .merge(availability::routes())
        // GET is the admin dashboard; POST is the public booking flow
        .route(
            "/api/bookings",
            get(dashboard::list_bookings)
                .route_layer(admin)
                .post(bookings::create_booking),
        )
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "ok" }))
}
