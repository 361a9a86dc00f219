use axum::extract::{RawForm, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::Response;
use tracing::info;

use super::{acquire, base_context, form_pairs, internal_error, render, see_other, LOGIN_PATH};
use crate::auth;
use crate::AppState;

fn login_page(state: &AppState, status: StatusCode, username: &str, error: Option<&str>) -> Response {
    let mut ctx = base_context(None);
    ctx.insert("username", username);
    ctx.insert("error", &error);
    render(state, status, "registration/login.html", &ctx)
}

pub async fn login_form_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    if auth::authenticated_driver(&state.store, &state.config, &headers)
        .await
        .is_some()
    {
        return see_other("/");
    }
    login_page(&state, StatusCode::OK, "", None)
}

pub async fn login_submit_handler(
    State(state): State<AppState>,
    RawForm(body): RawForm,
) -> Response {
    let pairs = match form_pairs(&body) {
        Ok(pairs) => pairs,
        Err(resp) => return resp,
    };
    let field = |name: &str| {
        pairs
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.clone())
            .unwrap_or_default()
    };
    let username = field("username");
    let password = field("password");

    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let credentials = match taxipark_store::drivers::find_credentials(&db.conn, &username) {
        Ok(found) => found,
        Err(e) => return internal_error(&e),
    };
    // One message for unknown username and wrong password; the form does not
    // reveal which usernames exist.
    let Some((driver, hash)) = credentials else {
        return login_page(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &username,
            Some("Please enter a correct username and password."),
        );
    };
    if !auth::verify_password(&hash, &password) {
        return login_page(
            &state,
            StatusCode::UNPROCESSABLE_ENTITY,
            &username,
            Some("Please enter a correct username and password."),
        );
    }

    let token = match auth::issue_session(&state.config.session_secret, driver.id) {
        Ok(token) => token,
        Err(e) => return internal_error(&e),
    };
    let cookie = match HeaderValue::from_str(&auth::session_set_cookie(&token)) {
        Ok(v) => v,
        Err(e) => return internal_error(&e),
    };
    info!(username = %driver.username, "login");
    let mut resp = see_other("/");
    resp.headers_mut().insert(header::SET_COOKIE, cookie);
    resp
}

pub async fn logout_handler(State(_state): State<AppState>) -> Response {
    let mut resp = see_other(LOGIN_PATH);
    if let Ok(cookie) = HeaderValue::from_str(&auth::session_clear_cookie()) {
        resp.headers_mut().insert(header::SET_COOKIE, cookie);
    }
    resp
}
