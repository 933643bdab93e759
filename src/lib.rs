pub mod app;
pub mod auth;
pub mod cache;
pub mod clock;
pub mod config;
pub mod day;
pub mod errors;
pub mod handlers;
pub mod models;
pub mod site_config;
pub mod state;
pub mod storage;
pub mod timezones;
pub mod ui;
pub mod user_options;

pub use app::router;
pub use config::Settings;
pub use state::AppState;
pub use storage::{JsonStore, load_data, resolve_data_path};
