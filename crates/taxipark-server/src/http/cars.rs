use axum::extract::{Path, Query, RawForm, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use std::collections::HashMap;
use taxipark_model::{CarForm, CarId, Driver, FieldErrors};
use taxipark_store::{cars, drivers, manufacturers, StoreConnection, StoreError};

use super::{
    acquire, base_context, form_pairs, render, require_login, see_other, store_error_response,
};
use crate::AppState;

/// The car form needs every manufacturer and driver for its select and
/// checkbox inputs. The back office renders the same form with its own
/// heading and action.
pub(crate) fn form_page(
    state: &AppState,
    user: &Driver,
    db: &StoreConnection,
    status: StatusCode,
    heading: &str,
    action: &str,
    form: &CarForm,
    errors: &FieldErrors,
) -> Response {
    let manufacturer_list = match manufacturers::list(&db.conn, None) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let driver_list = match drivers::list(&db.conn, None) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let selected_manufacturer: i64 = form.manufacturer.parse().unwrap_or(0);
    let selected_drivers: Vec<i64> = form
        .drivers
        .iter()
        .filter_map(|raw| raw.parse().ok())
        .collect();
    let mut ctx = base_context(Some(user));
    ctx.insert("heading", heading);
    ctx.insert("action", action);
    ctx.insert("model", &form.model);
    ctx.insert("manufacturers", &manufacturer_list);
    ctx.insert("drivers", &driver_list);
    ctx.insert("selected_manufacturer", &selected_manufacturer);
    ctx.insert("selected_drivers", &selected_drivers);
    ctx.insert("errors", errors);
    render(state, status, "taxi/car_form.html", &ctx)
}

pub(crate) fn form_from_car(db: &StoreConnection, id: CarId) -> Result<CarForm, StoreError> {
    let car = cars::get(&db.conn, id)?;
    let assigned = cars::drivers_of(&db.conn, id)?;
    Ok(CarForm {
        model: car.model,
        manufacturer: car.manufacturer_id.0.to_string(),
        drivers: assigned.iter().map(|d| d.id.0.to_string()).collect(),
    })
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
    let search_term = params.get("model").map(String::as_str).unwrap_or("");
    let list = match cars::list(&db.conn, Some(search_term)) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("car_list", &list);
    ctx.insert("search_term", search_term);
    render(&state, StatusCode::OK, "taxi/car_list.html", &ctx)
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
    let detail = match cars::detail(&db.conn, CarId(id)) {
        Ok(detail) => detail,
        Err(e) => return store_error_response(&e),
    };
    let assigned = detail.drivers.iter().any(|d| d.id == user.id);
    let mut ctx = base_context(Some(&user));
    ctx.insert("car", &detail.car);
    ctx.insert("manufacturer", &detail.manufacturer);
    ctx.insert("drivers", &detail.drivers);
    ctx.insert("assigned", &assigned);
    render(&state, StatusCode::OK, "taxi/car_detail.html", &ctx)
}

pub async fn create_form_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    form_page(
        &state,
        &user,
        &db,
        StatusCode::OK,
        "Add car",
        "/cars/create/",
        &CarForm::default(),
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
    let form = CarForm::from_pairs(&pairs);
    let mut db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => {
            return form_page(
                &state,
                &user,
                &db,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Add car",
                "/cars/create/",
                &form,
                &errors,
            )
        }
    };
    match cars::create(&mut db.conn, &data) {
        Ok(car) => see_other(&format!("/cars/{}/", car.id.0)),
        Err(StoreError::Constraint(errors)) => form_page(
            &state,
            &user,
            &db,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Add car",
            "/cars/create/",
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
    let form = match form_from_car(&db, CarId(id)) {
        Ok(form) => form,
        Err(e) => return store_error_response(&e),
    };
    form_page(
        &state,
        &user,
        &db,
        StatusCode::OK,
        "Update car",
        &format!("/cars/{id}/update/"),
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
    let form = CarForm::from_pairs(&pairs);
    let mut db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => {
            return form_page(
                &state,
                &user,
                &db,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Update car",
                &format!("/cars/{id}/update/"),
                &form,
                &errors,
            )
        }
    };
    match cars::update(&mut db.conn, CarId(id), &data) {
        Ok(car) => see_other(&format!("/cars/{}/", car.id.0)),
        Err(StoreError::Constraint(errors)) => form_page(
            &state,
            &user,
            &db,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Update car",
            &format!("/cars/{id}/update/"),
            &form,
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
    let car = match cars::get(&db.conn, CarId(id)) {
        Ok(car) => car,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("car", &car);
    render(&state, StatusCode::OK, "taxi/car_confirm_delete.html", &ctx)
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
    match cars::delete(&db.conn, CarId(id)) {
        Ok(()) => see_other("/cars/"),
        Err(e) => store_error_response(&e),
    }
}

/// Assign or remove the current user on this car, then return to the detail
/// page.
pub async fn toggle_assign_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_login(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let mut db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match cars::toggle_driver(&mut db.conn, CarId(id), user.id) {
        Ok(_) => see_other(&format!("/cars/{id}/")),
        Err(e) => store_error_response(&e),
    }
}
