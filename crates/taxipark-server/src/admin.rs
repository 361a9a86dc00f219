//! Back office for superusers. Non-superusers get a 404 on every admin
//! route, so the surface does not reveal itself to regular accounts.

use axum::extract::{Path, RawForm, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::Response;
use axum::routing::get;
use axum::Router;
use serde::Serialize;
use taxipark_model::{
    Car, CarForm, CarId, Driver, DriverChangeForm, DriverCreationForm, DriverId, FieldErrors,
    Manufacturer, ManufacturerForm, ManufacturerId,
};
use taxipark_store::drivers::NewDriver;
use taxipark_store::{cars, drivers, manufacturers, StoreError};

use crate::http::{
    acquire, base_context, form_pairs, internal_error, not_found, render, see_other,
    store_error_response,
};
use crate::{auth, AppState};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(index_handler))
        .route("/taxi/driver/", get(driver_list_handler))
        .route(
            "/taxi/driver/add/",
            get(driver_add_form_handler).post(driver_add_submit_handler),
        )
        .route(
            "/taxi/driver/:id/change/",
            get(driver_change_form_handler).post(driver_change_submit_handler),
        )
        .route(
            "/taxi/driver/:id/delete/",
            get(driver_delete_confirm_handler).post(driver_delete_submit_handler),
        )
        .route("/taxi/car/", get(car_list_handler))
        .route(
            "/taxi/car/add/",
            get(car_add_form_handler).post(car_add_submit_handler),
        )
        .route(
            "/taxi/car/:id/change/",
            get(car_change_form_handler).post(car_change_submit_handler),
        )
        .route(
            "/taxi/car/:id/delete/",
            get(car_delete_confirm_handler).post(car_delete_submit_handler),
        )
        .route("/taxi/manufacturer/", get(manufacturer_list_handler))
        .route(
            "/taxi/manufacturer/add/",
            get(manufacturer_add_form_handler).post(manufacturer_add_submit_handler),
        )
        .route(
            "/taxi/manufacturer/:id/change/",
            get(manufacturer_change_form_handler).post(manufacturer_change_submit_handler),
        )
        .route(
            "/taxi/manufacturer/:id/delete/",
            get(manufacturer_delete_confirm_handler).post(manufacturer_delete_submit_handler),
        )
}

async fn require_superuser(state: &AppState, headers: &HeaderMap) -> Result<Driver, Response> {
    match auth::authenticated_driver(&state.store, &state.config, headers).await {
        Some(driver) if driver.is_superuser => Ok(driver),
        _ => Err(not_found()),
    }
}

fn confirm_delete_page(
    state: &AppState,
    user: &Driver,
    object: &str,
    action: &str,
    back: &str,
) -> Response {
    let mut ctx = base_context(Some(user));
    ctx.insert("object", object);
    ctx.insert("action", action);
    ctx.insert("back", back);
    render(state, StatusCode::OK, "admin/confirm_delete.html", &ctx)
}

async fn index_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let ctx = base_context(Some(&user));
    render(&state, StatusCode::OK, "admin/index.html", &ctx)
}

// Drivers.

async fn driver_list_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let list = match drivers::list(&db.conn, None) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("driver_list", &list);
    render(&state, StatusCode::OK, "admin/driver_list.html", &ctx)
}

fn driver_add_page(
    state: &AppState,
    user: &Driver,
    status: StatusCode,
    form: &DriverCreationForm,
    errors: &FieldErrors,
) -> Response {
    let mut ctx = base_context(Some(user));
    ctx.insert("heading", "Add driver");
    ctx.insert("action", "/admin/taxi/driver/add/");
    ctx.insert("creating", &true);
    ctx.insert("username", &form.username);
    ctx.insert("first_name", &form.first_name);
    ctx.insert("last_name", &form.last_name);
    ctx.insert("license_number", &form.license_number);
    ctx.insert("errors", errors);
    render(state, status, "admin/driver_form.html", &ctx)
}

fn driver_change_page(
    state: &AppState,
    user: &Driver,
    status: StatusCode,
    id: DriverId,
    form: &DriverChangeForm,
    errors: &FieldErrors,
) -> Response {
    let mut ctx = base_context(Some(user));
    ctx.insert("heading", "Change driver");
    ctx.insert("action", &format!("/admin/taxi/driver/{}/change/", id.0));
    ctx.insert("creating", &false);
    ctx.insert("username", &form.username);
    ctx.insert("first_name", &form.first_name);
    ctx.insert("last_name", &form.last_name);
    ctx.insert("license_number", &form.license_number);
    ctx.insert("is_superuser", &form.is_superuser);
    ctx.insert("errors", errors);
    render(state, status, "admin/driver_form.html", &ctx)
}

async fn driver_add_form_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    driver_add_page(
        &state,
        &user,
        StatusCode::OK,
        &DriverCreationForm::default(),
        &FieldErrors::new(),
    )
}

async fn driver_add_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
            return driver_add_page(&state, &user, StatusCode::UNPROCESSABLE_ENTITY, &form, &errors)
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
        Ok(_) => see_other("/admin/taxi/driver/"),
        Err(StoreError::Constraint(errors)) => {
            driver_add_page(&state, &user, StatusCode::UNPROCESSABLE_ENTITY, &form, &errors)
        }
        Err(e) => store_error_response(&e),
    }
}

async fn driver_change_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
    let form = DriverChangeForm {
        username: driver.username.clone(),
        first_name: driver.first_name.clone(),
        last_name: driver.last_name.clone(),
        license_number: driver.license_number.as_str().to_string(),
        is_superuser: driver.is_superuser,
    };
    driver_change_page(
        &state,
        &user,
        StatusCode::OK,
        DriverId(id),
        &form,
        &FieldErrors::new(),
    )
}

async fn driver_change_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let pairs = match form_pairs(&body) {
        Ok(pairs) => pairs,
        Err(resp) => return resp,
    };
    let form = DriverChangeForm::from_pairs(&pairs);
    let data = match form.validate() {
        Ok(data) => data,
        Err(errors) => {
            return driver_change_page(
                &state,
                &user,
                StatusCode::UNPROCESSABLE_ENTITY,
                DriverId(id),
                &form,
                &errors,
            )
        }
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match drivers::update_profile(&db.conn, DriverId(id), &data) {
        Ok(_) => see_other("/admin/taxi/driver/"),
        Err(StoreError::Constraint(errors)) => driver_change_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            DriverId(id),
            &form,
            &errors,
        ),
        Err(e) => store_error_response(&e),
    }
}

async fn driver_delete_confirm_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
    confirm_delete_page(
        &state,
        &user,
        &driver.to_string(),
        &format!("/admin/taxi/driver/{id}/delete/"),
        "/admin/taxi/driver/",
    )
}

async fn driver_delete_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = require_superuser(&state, &headers).await {
        return resp;
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match drivers::delete(&db.conn, DriverId(id)) {
        Ok(()) => see_other("/admin/taxi/driver/"),
        Err(e) => store_error_response(&e),
    }
}

// Cars.

#[derive(Debug, Serialize)]
struct CarRow {
    car: Car,
    manufacturer: Manufacturer,
}

async fn car_list_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let list = match cars::list(&db.conn, None) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let mut rows = Vec::with_capacity(list.len());
    for car in list {
        let manufacturer = match manufacturers::get(&db.conn, car.manufacturer_id) {
            Ok(m) => m,
            Err(e) => return store_error_response(&e),
        };
        rows.push(CarRow { car, manufacturer });
    }
    let mut ctx = base_context(Some(&user));
    ctx.insert("car_list", &rows);
    render(&state, StatusCode::OK, "admin/car_list.html", &ctx)
}

async fn car_add_form_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    crate::http::cars::form_page(
        &state,
        &user,
        &db,
        StatusCode::OK,
        "Add car",
        "/admin/taxi/car/add/",
        &CarForm::default(),
        &FieldErrors::new(),
    )
}

async fn car_add_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
            return crate::http::cars::form_page(
                &state,
                &user,
                &db,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Add car",
                "/admin/taxi/car/add/",
                &form,
                &errors,
            )
        }
    };
    match cars::create(&mut db.conn, &data) {
        Ok(_) => see_other("/admin/taxi/car/"),
        Err(StoreError::Constraint(errors)) => crate::http::cars::form_page(
            &state,
            &user,
            &db,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Add car",
            "/admin/taxi/car/add/",
            &form,
            &errors,
        ),
        Err(e) => store_error_response(&e),
    }
}

async fn car_change_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let form = match crate::http::cars::form_from_car(&db, CarId(id)) {
        Ok(form) => form,
        Err(e) => return store_error_response(&e),
    };
    crate::http::cars::form_page(
        &state,
        &user,
        &db,
        StatusCode::OK,
        "Change car",
        &format!("/admin/taxi/car/{id}/change/"),
        &form,
        &FieldErrors::new(),
    )
}

async fn car_change_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
            return crate::http::cars::form_page(
                &state,
                &user,
                &db,
                StatusCode::UNPROCESSABLE_ENTITY,
                "Change car",
                &format!("/admin/taxi/car/{id}/change/"),
                &form,
                &errors,
            )
        }
    };
    match cars::update(&mut db.conn, CarId(id), &data) {
        Ok(_) => see_other("/admin/taxi/car/"),
        Err(StoreError::Constraint(errors)) => crate::http::cars::form_page(
            &state,
            &user,
            &db,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Change car",
            &format!("/admin/taxi/car/{id}/change/"),
            &form,
            &errors,
        ),
        Err(e) => store_error_response(&e),
    }
}

async fn car_delete_confirm_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
    confirm_delete_page(
        &state,
        &user,
        &car.to_string(),
        &format!("/admin/taxi/car/{id}/delete/"),
        "/admin/taxi/car/",
    )
}

async fn car_delete_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = require_superuser(&state, &headers).await {
        return resp;
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match cars::delete(&db.conn, CarId(id)) {
        Ok(()) => see_other("/admin/taxi/car/"),
        Err(e) => store_error_response(&e),
    }
}

// Manufacturers.

async fn manufacturer_list_handler(State(state): State<AppState>, headers: HeaderMap) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    let list = match manufacturers::list(&db.conn, None) {
        Ok(list) => list,
        Err(e) => return store_error_response(&e),
    };
    let mut ctx = base_context(Some(&user));
    ctx.insert("manufacturer_list", &list);
    render(&state, StatusCode::OK, "admin/manufacturer_list.html", &ctx)
}

async fn manufacturer_add_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    crate::http::manufacturers::form_page(
        &state,
        &user,
        StatusCode::OK,
        "Add manufacturer",
        "/admin/taxi/manufacturer/add/",
        &ManufacturerForm::default(),
        &FieldErrors::new(),
    )
}

async fn manufacturer_add_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let pairs = match form_pairs(&body) {
        Ok(pairs) => pairs,
        Err(resp) => return resp,
    };
    let form = ManufacturerForm::from_pairs(&pairs);
    if let Err(errors) = form.validate() {
        return crate::http::manufacturers::form_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Add manufacturer",
            "/admin/taxi/manufacturer/add/",
            &form,
            &errors,
        );
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match manufacturers::create(&db.conn, &form.name, &form.country) {
        Ok(_) => see_other("/admin/taxi/manufacturer/"),
        Err(e) => store_error_response(&e),
    }
}

async fn manufacturer_change_form_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
    crate::http::manufacturers::form_page(
        &state,
        &user,
        StatusCode::OK,
        "Change manufacturer",
        &format!("/admin/taxi/manufacturer/{id}/change/"),
        &form,
        &FieldErrors::new(),
    )
}

async fn manufacturer_change_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
    RawForm(body): RawForm,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
        Ok(user) => user,
        Err(resp) => return resp,
    };
    let pairs = match form_pairs(&body) {
        Ok(pairs) => pairs,
        Err(resp) => return resp,
    };
    let form = ManufacturerForm::from_pairs(&pairs);
    if let Err(errors) = form.validate() {
        return crate::http::manufacturers::form_page(
            &state,
            &user,
            StatusCode::UNPROCESSABLE_ENTITY,
            "Change manufacturer",
            &format!("/admin/taxi/manufacturer/{id}/change/"),
            &form,
            &errors,
        );
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match manufacturers::update(&db.conn, ManufacturerId(id), &form.name, &form.country) {
        Ok(_) => see_other("/admin/taxi/manufacturer/"),
        Err(e) => store_error_response(&e),
    }
}

async fn manufacturer_delete_confirm_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    let user = match require_superuser(&state, &headers).await {
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
    confirm_delete_page(
        &state,
        &user,
        &manufacturer.to_string(),
        &format!("/admin/taxi/manufacturer/{id}/delete/"),
        "/admin/taxi/manufacturer/",
    )
}

async fn manufacturer_delete_submit_handler(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(id): Path<i64>,
) -> Response {
    if let Err(resp) = require_superuser(&state, &headers).await {
        return resp;
    }
    let db = match acquire(&state).await {
        Ok(db) => db,
        Err(resp) => return resp,
    };
    match manufacturers::delete(&db.conn, ManufacturerId(id)) {
        Ok(()) => see_other("/admin/taxi/manufacturer/"),
        Err(e) => store_error_response(&e),
    }
}
