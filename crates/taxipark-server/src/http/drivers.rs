use axum::extract::{Path, Query, RawForm, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use std::collections::HashMap;
use taxipark_model::{Driver, DriverCreationForm, DriverId, DriverLicenseUpdateForm, FieldErrors};
use taxipark_store::drivers::{self, NewDriver};
use taxipark_store::StoreError;

use super::{
    acquire, base_context, form_pairs, internal_error, render, require_login, see_other,
    store_error_response,
};
use crate::auth;
use crate::AppState;

fn creation_form_page(
    state: &AppState,
    user: &Driver,
    status: StatusCode,
    form: &DriverCreationForm,
    errors: &FieldErrors,
) -> Response {
    let mut ctx = base_context(Some(user));
    ctx.insert("username", &form.username);
    ctx.insert("first_name", &form.first_name);
    ctx.insert("last_name", &form.last_name);
    ctx.insert("license_number", &form.license_number);
    ctx.insert("errors", errors);
    render(state, status, "taxi/driver_form.html", &ctx)
}

fn license_form_page(
    state: &AppState,
    user: &Driver,
    status: StatusCode,
    driver: &Driver,
    license_number: &str,
    errors: &FieldErrors,
) -> Response {
    let mut ctx = base_context(Some(user));
    ctx.insert("driver", driver);
    ctx.insert("license_number", license_number);
    ctx.insert("errors", errors);
    render(state, status, "taxi/driver_license_update_form.html", &ctx)
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
    let search_term = params.get("username").map(String::as_str).unwrap_or("");
    let list = match drivers::list(&db.conn, Some(search_term)) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("driver_list", &list);
    ctx.insert("search_term", search_term);
    render(&state, StatusCode::OK, "taxi/driver_list.html", &ctx)
}

pub async fn detail_handler(
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
    let detail = match drivers::detail(&db.conn, DriverId(id)) {
        Ok(detail) => detail,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("driver", &detail.driver);
    ctx.insert("cars", &detail.cars);
    render(&state, StatusCode::OK, "taxi/driver_detail.html", &ctx)
}

pub async fn create_form_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    creation_form_page(
        &state,
        &user,
        StatusCode::OK,
        &DriverCreationForm::default(),
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
    let form = DriverCreationForm::from_pairs(&pairs);
    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => {
            return creation_form_page(
                &state,
                &user,
                StatusCode::UNPROCESSABLE_ENTITY,
                &form,
                &errors,
            )
        }
    };
    let password_hash = match auth::hash_password(&data.password) {
        Ok(hash) => hash,
        Err(e) => return internal_error(&e),
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let new = NewDriver {
        username: data.username,
        password_hash,
        first_name: data.first_name,
        last_name: data.last_name,
        license_number: data.license_number,
        is_superuser: false,
    };
    match drivers::create(&db.conn, &new) {
        Ok(driver) => see_other(&format!("/drivers/{}/", driver.id.0)),
        Err(StoreError::Constraint(errors)) => creation_form_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            &form,
            &errors,
        ),
        Err(e) => store_error_response(&e),
    }
}

pub async fn license_form_handler(
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
    let driver = match drivers::get(&db.conn, DriverId(id)) {
        Ok(driver) => driver,
        Err(e) => return store_error_response(&e),
    };
    let license = driver.license_number.as_str().to_string();
    license_form_page(
        &state,
        &user,
        StatusCode::OK,
        &driver,
        &license,
        &FieldErrors::new(),
    )
}

pub async fn license_submit_handler(
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
    let form = DriverLicenseUpdateForm::from_pairs(&pairs);
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let driver = match drivers::get(&db.conn, DriverId(id)) {
        Ok(driver) => driver,
        Err(e) => return store_error_response(&e),
    };
    let license = match form.validate() {
        Ok(license) => license,
        Err(errors) => {
            return license_form_page(
                &state,
                &user,
                StatusCode::UNPROCESSABLE_ENTITY,
                &driver,
                &form.license_number,
                &errors,
            )
        }
    };
    match drivers::update_license(&db.conn, DriverId(id), &license) {
        Ok(_) => see_other(&format!("/drivers/{id}/")),
        Err(StoreError::Constraint(errors)) => license_form_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            &driver,
            &form.license_number,
            &errors,
        ),
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
    let driver = match drivers::get(&db.conn, DriverId(id)) {
        Ok(driver) => driver,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("driver", &driver);
    render(
        &state,
        StatusCode::OK,
        "taxi/driver_confirm_delete.html",
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
    match drivers::delete(&db.conn, DriverId(id)) {
        Ok(()) => see_other("/drivers/"),
        Err(e) => store_error_response(&e),
    }
}
