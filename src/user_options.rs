use crate::cache::{Cache, add_json, get_json};
use crate::errors::AppError;
use crate::models::{User, UserOptions};
use crate::storage::Datastore;
use std::time::Duration;
use tracing::error;

const OPTIONS_TTL: Duration = Duration::from_secs(30);

fn options_key(user: &User) -> String {
    format!("{}-options", user.email)
}

/// Options for `user`, created with the default timezone on first access.
pub async fn get_user_options(
    cache: &dyn Cache,
    store: &dyn Datastore,
    user: &User,
) -> Result<UserOptions, AppError> {
    let key = options_key(user);
    if let Some(options) = get_json::<UserOptions>(cache, &key).await {
        return Ok(options);
    }

    let options = match store.find_user_options(&user.email).await? {
        Some(options) => options,
        None => {
            let options = UserOptions::with_default_timezone(&user.email);
            store.save_user_options(&options).await?;
            options
        }
    };

    match add_json(cache, &key, &options, OPTIONS_TTL).await {
        Ok(true) => {}
        Ok(false) => error!("error adding user options to cache for {}", user.email),
        Err(err) => error!("error adding user options to cache for {}: {err}", user.email),
    }

    Ok(options)
}

/// Stores `timezone` as given; unknown zones are caught when the day boundary
/// is computed.
pub async fn set_timezone(
    cache: &dyn Cache,
    store: &dyn Datastore,
    user: &User,
    timezone: &str,
) -> Result<UserOptions, AppError> {
    let mut options = get_user_options(cache, store, user).await?;
    options.timezone = timezone.to_string();
    store.save_user_options(&options).await?;

    match cache.delete(&options_key(user)).await {
        Ok(true) => {}
        Ok(false) => error!(
            "error deleting user options from cache for user {}",
            user.email
        ),
        Err(err) => error!(
            "error deleting user options from cache for user {}: {err}",
            user.email
        ),
    }

    Ok(options)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaCache;
    use crate::models::DEFAULT_TIMEZONE;
    use crate::storage::JsonStore;

    #[tokio::test]
    async fn first_access_creates_default_record() {
        let cache = MokaCache::new(16);
        let store = JsonStore::in_memory();
        let user = User::new("ada@example.com", false);

        let options = get_user_options(&cache, &store, &user).await.unwrap();
        assert_eq!(options.timezone, DEFAULT_TIMEZONE);
        let stored = store.find_user_options("ada@example.com").await.unwrap();
        assert_eq!(stored, Some(options));
    }

    #[tokio::test]
    async fn cache_miss_reads_stored_record() {
        let cache = MokaCache::new(16);
        let store = JsonStore::in_memory();
        let user = User::new("ada@example.com", false);

        get_user_options(&cache, &store, &user).await.unwrap();
        cache.delete(&options_key(&user)).await.unwrap();
        let again = get_user_options(&cache, &store, &user).await.unwrap();
        assert_eq!(again.timezone, DEFAULT_TIMEZONE);
    }

    #[tokio::test]
    async fn set_timezone_is_visible_immediately() {
        let cache = MokaCache::new(16);
        let store = JsonStore::in_memory();
        let user = User::new("ada@example.com", false);

        get_user_options(&cache, &store, &user).await.unwrap();
        set_timezone(&cache, &store, &user, "Europe/Paris")
            .await
            .unwrap();

        let options = get_user_options(&cache, &store, &user).await.unwrap();
        assert_eq!(options.timezone, "Europe/Paris");
    }

    #[tokio::test]
    async fn set_timezone_accepts_unknown_names() {
        let cache = MokaCache::new(16);
        let store = JsonStore::in_memory();
        let user = User::new("ada@example.com", false);

        let options = set_timezone(&cache, &store, &user, "Mars/Olympus")
            .await
            .unwrap();
        assert_eq!(options.timezone, "Mars/Olympus");
    }
}
