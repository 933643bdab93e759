use crate::cache::{Cache, add_json, get_json};
use std::time::Duration;
use tracing::error;

const TIMEZONES_KEY: &str = "timezones";
const TIMEZONES_TTL: Duration = Duration::from_secs(60);

pub fn timezone_names() -> Vec<String> {
    let mut names: Vec<String> = chrono_tz::TZ_VARIANTS
        .iter()
        .map(|tz| tz.name().to_string())
        .collect();
    names.sort();
    names
}

pub async fn timezone_catalog(cache: &dyn Cache) -> Vec<String> {
    if let Some(names) = get_json::<Vec<String>>(cache, TIMEZONES_KEY).await {
        return names;
    }

    let names = timezone_names();
    match add_json(cache, TIMEZONES_KEY, &names, TIMEZONES_TTL).await {
        Ok(true) => {}
        Ok(false) => error!("error adding timezones to cache"),
        Err(err) => error!("error adding timezones to cache: {err}"),
    }
    names
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::MokaCache;

    #[test]
    fn names_are_sorted_and_include_default() {
        let names = timezone_names();
        assert!(names.windows(2).all(|pair| pair[0] <= pair[1]));
        assert!(names.iter().any(|name| name == "US/Pacific"));
        assert!(names.iter().any(|name| name == "Africa/Abidjan"));
    }

    #[tokio::test]
    async fn catalog_is_cached() {
        let cache = MokaCache::new(16);
        let first = timezone_catalog(&cache).await;
        assert!(cache.get(TIMEZONES_KEY).await.unwrap().is_some());
        assert_eq!(timezone_catalog(&cache).await, first);
    }
}
