#![forbid(unsafe_code)]

use axum::routing::{get, post};
use axum::Router;
use std::sync::Arc;
use taxipark_store::Store;
use tera::Tera;

pub mod admin;
pub mod auth;
pub mod config;
pub mod http;
pub mod templates;

pub use config::ServerConfig;

pub const CRATE_NAME: &str = "taxipark-server";

#[derive(Debug, Clone)]
pub struct AppState {
    pub store: Store,
    pub config: Arc<ServerConfig>,
    pub templates: Arc<Tera>,
}

impl AppState {
    pub fn new(store: Store, config: ServerConfig) -> Result<Self, tera::Error> {
        Ok(Self {
            store,
            config: Arc::new(config),
            templates: Arc::new(templates::build()?),
        })
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(http::pages::healthz_handler))
        .route("/", get(http::pages::index_handler))
        .route(
            "/accounts/login/",
            get(http::accounts::login_form_handler).post(http::accounts::login_submit_handler),
        )
        .route(
            "/accounts/logout/",
            get(http::accounts::logout_handler).post(http::accounts::logout_handler),
        )
        .route("/manufacturers/", get(http::manufacturers::list_handler))
        .route(
            "/manufacturers/create/",
            get(http::manufacturers::create_form_handler)
                .post(http::manufacturers::create_submit_handler),
        )
        .route(
            "/manufacturers/:id/update/",
            get(http::manufacturers::update_form_handler)
                .post(http::manufacturers::update_submit_handler),
        )
        .route(
            "/manufacturers/:id/delete/",
            get(http::manufacturers::delete_confirm_handler)
                .post(http::manufacturers::delete_submit_handler),
        )
        .route("/cars/", get(http::cars::list_handler))
        .route("/cars/:id/", get(http::cars::detail_handler))
        .route(
            "/cars/create/",
            get(http::cars::create_form_handler).post(http::cars::create_submit_handler),
        )
        .route(
            "/cars/:id/update/",
            get(http::cars::update_form_handler).post(http::cars::update_submit_handler),
        )
        .route(
            "/cars/:id/delete/",
            get(http::cars::delete_confirm_handler).post(http::cars::delete_submit_handler),
        )
        .route(
            "/cars/:id/toggle-assign/",
            post(http::cars::toggle_assign_handler),
        )
        .route("/drivers/", get(http::drivers::list_handler))
        .route("/drivers/:id/", get(http::drivers::detail_handler))
        .route(
            "/drivers/create/",
            get(http::drivers::create_form_handler).post(http::drivers::create_submit_handler),
        )
        .route(
            "/drivers/:id/update/",
            get(http::drivers::license_form_handler).post(http::drivers::license_submit_handler),
        )
        .route(
            "/drivers/:id/delete/",
            get(http::drivers::delete_confirm_handler).post(http::drivers::delete_submit_handler),
        )
        .nest("/admin", admin::router())
        .with_state(state)
}
