use crate::handlers;
use crate::state::AppState;
use axum::{routing::{get, post}, Router};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/admin",
            get(handlers::admin_page).post(handlers::update_admin_config),
        )
        .route("/admin/createitemtype", post(handlers::create_item_type))
        .route(
            "/admin/setitemtypeactive",
            post(handlers::set_item_type_active),
        )
        .route("/user", get(handlers::dashboard))
        .route(
            "/user/countitem",
            get(handlers::count_item).post(handlers::count_item),
        )
        .route(
            "/user/options",
            get(handlers::options_page).post(handlers::update_options),
        )
        .route(
            "/user/options/",
            get(handlers::options_page).post(handlers::update_options),
        )
        .route("/user/options/timezones", get(handlers::timezones))
        .route("/user/options/timezones/", get(handlers::timezones))
        .with_state(state)
}
