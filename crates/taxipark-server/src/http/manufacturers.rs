use axum::extract::{Path, Query, RawForm, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use std::collections::HashMap;
use taxipark_model::{Driver, FieldErrors, ManufacturerForm, ManufacturerId};
use taxipark_store::{manufacturers, StoreError};

use super::{
    acquire, base_context, form_pairs, render, require_login, see_other, store_error_response,
};
use crate::AppState;

pub(crate) fn form_page(
    state: &AppState,
    user: &Driver,
    status: StatusCode,
    heading: &str,
    action: &str,
    form: &ManufacturerForm,
    errors: &FieldErrors,
) -> Response {
    let mut ctx = base_context(Some(user));
    ctx.insert("heading", heading);
    ctx.insert("action", action);
    ctx.insert("name", &form.name);
    ctx.insert("country", &form.country);
    ctx.insert("errors", errors);
    render(state, status, "taxi/manufacturer_form.html", &ctx)
}

pub async fn list_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let search_term = params.get("name").map(String::as_str).unwrap_or("");
    let list = match manufacturers::list(&db.conn, Some(search_term)) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("manufacturer_list", &list);
    ctx.insert("search_term", search_term);
    render(&state, StatusCode::OK, "taxi/manufacturer_list.html", &ctx)
}

pub async fn create_form_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    form_page(
        &state,
        &user,
        StatusCode::OK,
        "Add manufacturer",
        "/manufacturers/create/",
        &ManufacturerForm::default(),
        &FieldErrors::new(),
    )
}

pub async fn create_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let pairs = match form_pairs(&body) {
        Ok(pairs) => pairs,
        Err(resp) => return resp,
    };
    let form = ManufacturerForm::from_pairs(&pairs);
    if let Err(errors) = form.validate() {
        return form_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Add manufacturer",
            "/manufacturers/create/",
            &form,
            &errors,
        );
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match manufacturers::create(&db.conn, &form.name, &form.country) {
        Ok(_) => see_other("/manufacturers/"),
        Err(StoreError::Constraint(errors)) => form_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Add manufacturer",
            "/manufacturers/create/",
            &form,
            &errors,
        ),
        Err(e) => store_error_response(&e),
    }
}

pub async fn update_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let manufacturer = match manufacturers::get(&db.conn, ManufacturerId(id)) {
        Ok(m) => m,
        Err(e) => return store_error_response(&e),
    };
    let form = ManufacturerForm {
        name: manufacturer.name,
        country: manufacturer.country,
    };
    form_page(
        &state,
        &user,
        StatusCode::OK,
        "Update manufacturer",
        &format!("/manufacturers/{id}/update/"),
        &form,
        &FieldErrors::new(),
    )
}

pub async fn update_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let pairs = match form_pairs(&body) {
        Ok(pairs) => pairs,
        Err(resp) => return resp,
    };
    let form = ManufacturerForm::from_pairs(&pairs);
    if let Err(errors) = form.validate() {
        return form_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Update manufacturer",
            &format!("/manufacturers/{id}/update/"),
            &form,
            &errors,
        );
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match manufacturers::update(&db.conn, ManufacturerId(id), &form.name, &form.country) {
        Ok(_) => see_other("/manufacturers/"),
        Err(e) => store_error_response(&e),
    }
}

pub async fn delete_confirm_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let manufacturer = match manufacturers::get(&db.conn, ManufacturerId(id)) {
        Ok(m) => m,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("manufacturer", &manufacturer);
    render(
        &state,
        StatusCode::OK,
        "taxi/manufacturer_confirm_delete.html",
        &ctx,
    )
}

pub async fn delete_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = require_login(&state, &headers).await {
        return resp;
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match manufacturers::delete(&db.conn, ManufacturerId(id)) {
        Ok(()) => see_other("/manufacturers/"),
        Err(e) => store_error_response(&e),
    }
}
