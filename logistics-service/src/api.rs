use axum::{
    middleware,
    routing::{get, patch, post},
    Router,
};
use diesel_async::{pooled_connection::bb8::Pool, AsyncPgConnection};
use std::sync::Arc;
use tower_http::{
    cors::CorsLayer,
    trace::{DefaultMakeSpan, DefaultOnResponse, TraceLayer},
};
use tracing::Level;

use crate::config::Config;
use crate::error::attach_error_details;
use crate::{courier, debug, districts, leads, offline, production, search, sessions, trucks, webhooks};

pub type DbPool = Pool<AsyncPgConnection>;

#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    pub config: Arc<Config>,
}

fn open_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any)
}

pub fn create_router(state: AppState) -> Router {
    // Search and CRM widget endpoints are called from other origins.
    let cross_origin = Router::new()
        .route("/api/search/address", get(search::search_addresses))
        .route("/api/amocrm/disconnect", post(webhooks::disconnect))
        .route("/api/amocrm/widget/disable", post(webhooks::widget_disable))
        .layer(open_cors());

    Router::new()
        .route("/api/leads", get(leads::list_leads))
        .route("/api/leads/:id", get(leads::get_lead))
        .route(
            "/api/truck-assignments",
            post(trucks::assign_truck).get(trucks::list_assignments),
        )
        .route("/api/districts", get(districts::list_districts))
        .route("/api/districts/:id", patch(districts::update_district))
        .route("/api/products", get(production::list_products))
        .route("/api/production-orders", get(production::list_orders))
        .route("/api/production-orders/generate", post(production::generate_orders))
        .route(
            "/api/production-sessions",
            get(sessions::get_session).put(sessions::upsert_session),
        )
        .route("/api/drivers/:driver_id/orders", get(courier::driver_orders))
        .route("/api/debug/stats", get(debug::stats))
        .route("/api/debug/assignments", get(debug::list_assignments))
        .route("/api/debug/assignments/status", post(debug::set_assignment_status))
        .route("/api/debug/visibility", get(debug::check_visibility))
        .route("/sw.js", get(offline::service_worker))
        .route("/health", get(health_check))
        .merge(cross_origin)
        .with_state(state.clone())
        .layer(middleware::map_response_with_state(state, attach_error_details))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(DefaultMakeSpan::new().level(Level::INFO))
                .on_response(DefaultOnResponse::new().level(Level::INFO)),
        )
}

pub async fn health_check() -> &'static str {
    "OK"
}
