use crate::cache::Cache;
use crate::clock::Clock;
use crate::errors::AppError;
use crate::models::{DEFAULT_TIMEZONE, User};
use crate::storage::Datastore;
use crate::user_options::get_user_options;
use chrono::{DateTime, Duration, LocalResult, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use tracing::warn;

pub fn resolve_timezone(name: &str) -> Tz {
    match name.parse::<Tz>() {
        Ok(tz) => tz,
        Err(_) => {
            warn!("invalid timezone {name:?}, using {DEFAULT_TIMEZONE}");
            default_timezone()
        }
    }
}

fn default_timezone() -> Tz {
    chrono_tz::US::Pacific
}

/// UTC instant of local midnight on the date `now` falls on in `tz`.
pub fn start_of_day_at(tz: Tz, now: DateTime<Utc>) -> DateTime<Utc> {
    let midnight = now
        .with_timezone(&tz)
        .date_naive()
        .and_time(NaiveTime::MIN);

    match tz.from_local_datetime(&midnight) {
        LocalResult::Single(start) | LocalResult::Ambiguous(start, _) => start.with_timezone(&Utc),
        LocalResult::None => {
            // midnight sits in a DST gap: read it with the offset in force before the gap
            let before = tz
                .offset_from_utc_datetime(&(midnight - Duration::days(1)))
                .fix();
            let utc = midnight - Duration::seconds(i64::from(before.local_minus_utc()));
            Utc.from_utc_datetime(&utc)
        }
    }
}

/// Lower bound for the user's "today" queries.
pub async fn start_of_day(
    cache: &dyn Cache,
    store: &dyn Datastore,
    clock: &dyn Clock,
    user: &User,
) -> Result<DateTime<Utc>, AppError> {
    let options = get_user_options(cache, store, user).await?;
    let tz = resolve_timezone(&options.timezone);
    Ok(start_of_day_at(tz, clock.now()))
}
