use axum::body::Bytes;
use axum::http::{header, HeaderMap, StatusCode};
use axum::response::{Html, IntoResponse, Response};
use taxipark_model::Driver;
use taxipark_store::{StoreConnection, StoreError};
use tera::Context;
use tracing::error;

use crate::auth;
use crate::AppState;

pub mod accounts;
pub mod cars;
pub mod drivers;
pub mod manufacturers;
pub mod pages;

pub const LOGIN_PATH: &str = "/accounts/login/";

pub(crate) fn see_other(location: &str) -> Response {
    (StatusCode::SEE_OTHER, [(header::LOCATION, location.to_string())]).into_response()
}

pub(crate) fn not_found() -> Response {
    (StatusCode::NOT_FOUND, "not found").into_response()
}

pub(crate) fn internal_error(err: &dyn std::fmt::Display) -> Response {
    error!("request failed: {err}");
    (StatusCode::INTERNAL_SERVER_ERROR, "internal error").into_response()
}

pub(crate) fn render(
    state: &AppState,
    status: StatusCode,
    template: &str,
    ctx: &Context,
) -> Response {
    match state.templates.render(template, ctx) {
        Ok(body) => (status, Html(body)).into_response(),
        Err(e) => internal_error(&e),
    }
}

/// Every page context carries `user`; templates use it for the navigation
/// header.
pub(crate) fn base_context(user: Option<&Driver>) -> Context {
    let mut ctx = Context::new();
    ctx.insert("user", &user);
    ctx
}

/// Form bodies are decoded to ordered pairs, not a map: repeated keys carry
/// the multi-select inputs and their order is meaningful.
pub(crate) fn form_pairs(body: &Bytes) -> Result<Vec<(String, String)>, Response> {
    serde_urlencoded::from_bytes::<Vec<(String, String)>>(body)
        .map_err(|_| (StatusCode::BAD_REQUEST, "malformed form body").into_response())
}

pub(crate) async fn acquire(state: &AppState) -> Result<StoreConnection, Response> {
    state.store.acquire().await.map_err(|e| internal_error(&e))
}

/// Gate for every record page: anonymous requests are redirected to the
/// login form.
pub(crate) async fn require_login(
    state: &AppState,
    headers: &HeaderMap,
) -> Result<Driver, Response> {
    match auth::authenticated_driver(&state.store, &state.config, headers).await {
        Some(driver) => Ok(driver),
        None => Err(see_other(LOGIN_PATH)),
    }
}

/// Fallback mapping for store errors the handler does not turn into a form
/// re-render.
pub(crate) fn store_error_response(err: &StoreError) -> Response {
    match err {
        StoreError::NotFound(_) => not_found(),
        other => internal_error(other),
    }
}
