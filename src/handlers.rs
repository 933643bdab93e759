use crate::auth::{AdminUser, CurrentUser, MaybeUser};
use crate::cache::{add_json, get_json};
use crate::day::start_of_day;
use crate::errors::AppError;
use crate::models::{
    ConfigForm, CountItemParams, CreateItemTypeForm, DEFAULT_TIMEZONE, DayCount, ItemType,
    ItemTypeActiveForm, OptionsForm, TimezonesResponse,
};
use crate::site_config::{ConfigUpdate, get_current_config, update_config};
use crate::state::AppState;
use crate::timezones::timezone_catalog;
use crate::ui::{html_escape, render_admin, render_dashboard, render_landing, render_options};
use crate::user_options::{get_user_options, set_timezone};
use axum::{
    Form, Json,
    extract::State,
    response::{Html, IntoResponse, Redirect, Response},
};
use std::time::Duration;
use tracing::{error, info};

const ADMIN_ITEM_LIMIT: usize = 100;
const DASHBOARD_ITEM_LIMIT: usize = 5;
const ACTIVE_TYPES_KEY: &str = "active_types";
const ACTIVE_TYPES_TTL: Duration = Duration::from_secs(30);

pub async fn index(
    State(state): State<AppState>,
    MaybeUser(user): MaybeUser,
) -> Result<Response, AppError> {
    if user.is_some() {
        return Ok(Redirect::to("/user").into_response());
    }

    let config = get_current_config(state.cache.as_ref(), state.store.as_ref()).await?;
    let login_url = state.identity.login_url("/");
    Ok(Html(render_landing(&config, &login_url)).into_response())
}

pub async fn admin_page(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
) -> Result<Html<String>, AppError> {
    let items = state.store.list_item_types(false, ADMIN_ITEM_LIMIT).await?;
    let config = get_current_config(state.cache.as_ref(), state.store.as_ref()).await?;
    let logout_url = state.identity.logout_url("/");
    Ok(Html(render_admin(&config, &items, &logout_url)))
}

pub async fn update_admin_config(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    form: Option<Form<ConfigForm>>,
) -> Result<Redirect, AppError> {
    let form = form_or_default(form);
    let (Some(title), Some(description)) = (form.title, form.description) else {
        return Err(AppError::server(
            "both title and description are required params",
        ));
    };

    let update = ConfigUpdate {
        title,
        description,
        analytics_id: form.ga_account_id.filter(|id| !id.trim().is_empty()),
    };
    update_config(
        state.cache.as_ref(),
        state.store.as_ref(),
        state.clock.as_ref(),
        update,
        &admin.email,
    )
    .await?;
    info!("site configuration updated by {}", admin.email);
    Ok(Redirect::to("/admin"))
}

/// Responds with the stored (escaped) name, or an empty body when no name was given.
pub async fn create_item_type(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    form: Option<Form<CreateItemTypeForm>>,
) -> Result<String, AppError> {
    let form = form_or_default(form);
    let name = form
        .name
        .map(|name| html_escape(name.trim()))
        .unwrap_or_default();
    if name.is_empty() {
        return Ok(name);
    }

    state.store.insert_item_type(&name, state.clock.now()).await?;
    invalidate_active_types(&state).await;
    info!("created item type {name}");
    Ok(name)
}

pub async fn set_item_type_active(
    State(state): State<AppState>,
    AdminUser(_admin): AdminUser,
    form: Option<Form<ItemTypeActiveForm>>,
) -> Result<Redirect, AppError> {
    let form = form_or_default(form);
    let id = form
        .id
        .as_deref()
        .and_then(|id| id.trim().parse::<u64>().ok())
        .ok_or_else(|| AppError::server("item type id is missing or invalid"))?;
    let active = form
        .active
        .as_deref()
        .and_then(|active| active.trim().parse::<bool>().ok())
        .ok_or_else(|| AppError::server("active flag is missing or invalid"))?;

    let item = state.store.set_item_type_active(id, active).await?;
    invalidate_active_types(&state).await;
    info!("item type {} is now {}", item.name, if active { "active" } else { "inactive" });
    Ok(Redirect::to("/admin"))
}

pub async fn dashboard(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let types = active_types(&state).await?;
    let since = start_of_day(
        state.cache.as_ref(),
        state.store.as_ref(),
        state.clock.as_ref(),
        &user,
    )
    .await?;

    let mut counts = Vec::with_capacity(types.len());
    for item_type in types {
        let count = state
            .store
            .count_items_since(item_type.id, &user.email, since)
            .await?;
        counts.push(DayCount {
            name: item_type.name,
            count,
        });
    }

    let config = get_current_config(state.cache.as_ref(), state.store.as_ref()).await?;
    let logout_url = state.identity.logout_url("/");
    Ok(Html(render_dashboard(
        &config,
        &counts,
        user.is_admin,
        &logout_url,
    )))
}

/// Records one event and responds with today's running total as plain text.
pub async fn count_item(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    params: Option<Form<CountItemParams>>,
) -> Result<String, AppError> {
    let params = form_or_default(params);
    let Some(type_name) = params.type_name else {
        return Err(AppError::server("type passed to count_item is missing"));
    };

    let Some(item_type) = state.store.find_active_item_type(&type_name).await? else {
        return Err(AppError::server(format!(
            "no active type for name {type_name:?} could be found"
        )));
    };

    let since = start_of_day(
        state.cache.as_ref(),
        state.store.as_ref(),
        state.clock.as_ref(),
        &user,
    )
    .await?;
    let total = state
        .store
        .record_item(item_type.id, &user.email, state.clock.now(), since)
        .await?;

    info!(
        "added new item of type: {}, new total: {total}",
        item_type.name
    );
    Ok(total.to_string())
}

pub async fn options_page(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Html<String>, AppError> {
    let options = get_user_options(state.cache.as_ref(), state.store.as_ref(), &user).await?;
    let config = get_current_config(state.cache.as_ref(), state.store.as_ref()).await?;
    let logout_url = state.identity.logout_url("/");
    Ok(Html(render_options(
        &config,
        &options.timezone,
        user.is_admin,
        &logout_url,
    )))
}

pub async fn update_options(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
    form: Option<Form<OptionsForm>>,
) -> Result<Redirect, AppError> {
    let form = form_or_default(form);
    let timezone = form
        .timezone
        .unwrap_or_else(|| DEFAULT_TIMEZONE.to_string());
    info!("timezone for user {} set to {timezone}", user.nickname);

    set_timezone(state.cache.as_ref(), state.store.as_ref(), &user, &timezone).await?;
    Ok(Redirect::to("/user/options"))
}

pub async fn timezones(
    State(state): State<AppState>,
    CurrentUser(user): CurrentUser,
) -> Result<Json<TimezonesResponse>, AppError> {
    let timezones = timezone_catalog(state.cache.as_ref()).await;
    let options = get_user_options(state.cache.as_ref(), state.store.as_ref(), &user).await?;
    Ok(Json(TimezonesResponse {
        user_timezone: options.timezone,
        timezones,
    }))
}

async fn active_types(state: &AppState) -> Result<Vec<ItemType>, AppError> {
    let cache = state.cache.as_ref();
    if let Some(types) = get_json::<Vec<ItemType>>(cache, ACTIVE_TYPES_KEY).await {
        return Ok(types);
    }

    let types = state
        .store
        .list_item_types(true, DASHBOARD_ITEM_LIMIT)
        .await?;
    match add_json(cache, ACTIVE_TYPES_KEY, &types, ACTIVE_TYPES_TTL).await {
        Ok(true) => {}
        Ok(false) => error!("error adding active_types to cache"),
        Err(err) => error!("error adding active_types to cache: {err}"),
    }
    Ok(types)
}

async fn invalidate_active_types(state: &AppState) {
    if let Err(err) = state.cache.delete(ACTIVE_TYPES_KEY).await {
        error!("error deleting active_types from cache: {err}");
    }
}

/// A request without a urlencoded body reads as a form with every field absent.
fn form_or_default<T: Default>(form: Option<Form<T>>) -> T {
    form.map(|Form(form)| form).unwrap_or_default()
}
