use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use tower_http::cors::CorsLayer;

use crate::{
    handlers, metrics, observability,
    state::AppState,
    validation::{rules, validate_request},
};

/// Attach a validation chain to a single route
macro_rules! guarded {
    ($state:expr, $method_router:expr, $chain:expr) => {
        $method_router.route_layer(middleware::from_fn_with_state(
            $state.guard($chain),
            validate_request,
        ))
    };
}

pub fn observability_routes() -> Router<AppState> {
    Router::new().route("/metrics", get(metrics::metrics_endpoint))
}

pub fn health_routes() -> Router<AppState> {
    Router::new().route("/health", get(handlers::health_check))
}

pub fn client_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/clients/:id",
            guarded!(state, get(handlers::get_client), rules::client_by_id()),
        )
        .route(
            "/api/clients/:id/contacts",
            guarded!(state, get(handlers::list_client_contacts), rules::client_by_id()),
        )
        .route(
            "/api/contacts/:id",
            guarded!(state, get(handlers::get_contact), rules::contact_by_id()),
        )
}

pub fn ticket_routes(state: &AppState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/tickets",
            guarded!(state, get(handlers::list_tickets), rules::list_tickets())
                .merge(guarded!(state, post(handlers::create_ticket), rules::create_ticket())),
        )
        .route(
            "/api/tickets/from-email",
            guarded!(
                state,
                post(handlers::create_ticket_from_email),
                rules::ticket_from_email()
            ),
        )
        .route(
            "/api/tickets/:id",
            guarded!(state, get(handlers::get_ticket), rules::ticket_by_id()),
        )
        .route(
            "/api/tickets/:id/state",
            guarded!(state, put(handlers::update_ticket_state), rules::update_ticket_state()),
        )
        .route(
            "/api/tickets/:id/time-entries",
            guarded!(state, post(handlers::create_time_entry), rules::create_time_entry()),
        )
}

/// The complete application router
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(health_routes())
        .merge(observability_routes())
        .merge(client_routes(&state))
        .merge(ticket_routes(&state))
        .fallback(handlers::route_not_found)
        .layer(middleware::from_fn(observability::request_logger))
        .layer(CorsLayer::permissive())
        .with_state(state)
}
