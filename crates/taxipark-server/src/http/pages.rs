use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use taxipark_store::aggregate_counts;

use super::{acquire, base_context, internal_error, render, require_login};
use crate::AppState;

pub async fn healthz_handler() -> impl IntoResponse {
    (StatusCode::OK, "ok")
}

/// Landing page with live record counts. The three counts are independent
/// reads of current state, not a snapshot.
pub async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let counts = match aggregate_counts(&db.conn) {
        Ok(counts) => counts,
        Err(e) => return internal_error(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("num_drivers", &counts.num_drivers);
    ctx.insert("num_cars", &counts.num_cars);
    ctx.insert("num_manufacturers", &counts.num_manufacturers);
    render(&state, StatusCode::OK, "taxi/index.html", &ctx)
}
