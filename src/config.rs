use crate::storage::resolve_data_path;
use std::{env, fmt::Display, path::PathBuf, str::FromStr};
use tracing::{info, warn};

/// Process settings read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Settings {
    pub port: u16,
    pub data_path: PathBuf,
    pub login_url: String,
    pub logout_url: String,
    pub user_header: String,
    pub admin_header: String,
    pub cache_capacity: u64,
}

impl Settings {
    pub fn load() -> Self {
        Self {
            port: try_load("PORT", 8080),
            data_path: resolve_data_path(),
            login_url: try_load("LOGIN_URL", "/login".to_string()),
            logout_url: try_load("LOGOUT_URL", "/logout".to_string()),
            user_header: try_load("AUTH_USER_HEADER", "x-auth-user".to_string()),
            admin_header: try_load("AUTH_ADMIN_HEADER", "x-auth-admin".to_string()),
            cache_capacity: try_load("CACHE_CAPACITY", 10_000),
        }
    }
}

fn try_load<T>(key: &str, default: T) -> T
where
    T: FromStr + Display,
    T::Err: Display,
{
    match env::var(key) {
        Ok(raw) => raw.parse().unwrap_or_else(|err| {
            warn!("invalid {key} value {raw:?}: {err}, using default: {default}");
            default
        }),
        Err(_) => {
            info!("{key} not set, using default: {default}");
            default
        }
    }
}
