//! Route Configuration
//!
//! Configures all HTTP routes for the API.

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};

use super::handlers;
use crate::presentation::middleware::{validate_access_token, validate_refresh_token};
use crate::startup::AppState;

/// Create the main API router
pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api/v1", api_routes(state.clone()))
        .with_state(state)
}

/// API v1 routes
fn api_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .nest("/auth", auth_routes())
        .merge(me_routes(state))
}

/// Authentication routes (public)
fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/register", post(handlers::auth::register))
        .route("/login", post(handlers::auth::login))
        .route(
            "/verification",
            get(handlers::auth::verify_email).post(handlers::auth::send_verification),
        )
        .route("/password/forgot", post(handlers::auth::forgot_password))
        .route("/password/reset", post(handlers::auth::reset_password))
}

/// `/me` routes: everything requires a valid access token except the
/// email-change link (its token is the credential) and the
/// refresh-for-access exchange (which presents a refresh token).
fn me_routes(state: AppState) -> Router<AppState> {
    let protected = Router::new()
        .route(
            "/me",
            get(handlers::user::get_info).post(handlers::user::update_info),
        )
        .route(
            "/me/email",
            get(handlers::user::get_current_email).post(handlers::user::request_email_change),
        )
        .route("/me/password", post(handlers::user::change_password))
        .route(
            "/me/picture",
            post(handlers::user::set_picture).delete(handlers::user::delete_picture),
        )
        .route("/me/delete", post(handlers::user::delete_account))
        .route(
            "/me/session",
            get(handlers::session::list_sessions).delete(handlers::session::end_current_session),
        )
        .route(
            "/me/session/other",
            delete(handlers::session::end_other_sessions),
        )
        .route(
            "/me/session/refresh_token",
            post(handlers::session::generate_refresh_token),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            validate_access_token,
        ));

    let refresh = Router::new()
        .route(
            "/me/session/access_token",
            post(handlers::session::generate_access_token),
        )
        .route_layer(middleware::from_fn_with_state(state, validate_refresh_token));

    let public = Router::new().route(
        "/me/email/verification",
        get(handlers::user::verify_email_change),
    );

    protected.merge(refresh).merge(public)
}
