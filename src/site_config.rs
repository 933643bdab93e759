use crate::cache::{Cache, add_json, get_json, replace_json};
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::ConfigurationData;
use crate::storage::Datastore;
use std::time::Duration;
use tracing::{debug, error};

const CONFIG_KEY: &str = "config_data";
const CONFIG_TTL: Duration = Duration::from_secs(30);

pub struct ConfigUpdate {
    pub title: String,
    pub description: String,
    pub analytics_id: Option<String>,
}

/// Current site configuration, or the built-in defaults when none is saved.
pub async fn get_current_config(
    cache: &dyn Cache,
    store: &dyn Datastore,
) -> Result<ConfigurationData, AppError> {
    if let Some(data) = get_json::<ConfigurationData>(cache, CONFIG_KEY).await {
        return Ok(data);
    }

    match store.load_config().await? {
        Some(data) => {
            match add_json(cache, CONFIG_KEY, &data, CONFIG_TTL).await {
                Ok(true) => {}
                Ok(false) => error!("error adding config_data to cache"),
                Err(err) => error!("error adding config_data to cache: {err}"),
            }
            Ok(data)
        }
        None => Ok(ConfigurationData::default()),
    }
}

pub async fn update_config(
    cache: &dyn Cache,
    store: &dyn Datastore,
    clock: &dyn Clock,
    update: ConfigUpdate,
    editor: &str,
) -> Result<ConfigurationData, AppError> {
    let mut data = get_current_config(cache, store).await?;
    let now = clock.now();
    data.title = update.title;
    data.description = update.description;
    data.analytics_id = update.analytics_id;
    data.created.get_or_insert(now);
    data.last_modified = Some(now);
    data.last_modified_by = Some(editor.to_string());

    store.save_config(&data).await?;
    match replace_json(cache, CONFIG_KEY, &data, CONFIG_TTL).await {
        Ok(true) => {}
        Ok(false) => debug!("config_data was not cached, nothing to replace"),
        Err(err) => error!("error replacing config_data in cache: {err}"),
    }
    Ok(data)
}
