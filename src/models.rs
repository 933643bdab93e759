use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub const DEFAULT_TIMEZONE: &str = "US/Pacific";
pub const DEFAULT_TITLE: &str = "Daily Count";
pub const DEFAULT_DESCRIPTION: &str =
    "Track and graph all of your daily bodily functions. Sign in to get started.";

/// Site-wide metadata edited from the admin page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfigurationData {
    pub title: String,
    pub description: String,
    #[serde(default)]
    pub analytics_id: Option<String>,
    /// `None` until the record is first persisted.
    #[serde(default)]
    pub created: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified: Option<DateTime<Utc>>,
    #[serde(default)]
    pub last_modified_by: Option<String>,
}

impl Default for ConfigurationData {
    fn default() -> Self {
        Self {
            title: DEFAULT_TITLE.to_string(),
            description: DEFAULT_DESCRIPTION.to_string(),
            analytics_id: None,
            created: None,
            last_modified: None,
            last_modified_by: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemType {
    pub id: u64,
    pub name: String,
    pub active: bool,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CountedItem {
    pub id: u64,
    pub item_type_id: u64,
    pub user: String,
    pub created: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserOptions {
    pub user: String,
    pub timezone: String,
}

impl UserOptions {
    pub fn with_default_timezone(user: &str) -> Self {
        Self {
            user: user.to_string(),
            timezone: DEFAULT_TIMEZONE.to_string(),
        }
    }
}

/// Identity handed to handlers by the auth guards.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct User {
    pub email: String,
    pub nickname: String,
    pub is_admin: bool,
}

impl User {
    pub fn new(email: impl Into<String>, is_admin: bool) -> Self {
        let email = email.into();
        let nickname = email.split('@').next().unwrap_or_default().to_string();
        Self {
            email,
            nickname,
            is_admin,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct ConfigForm {
    pub title: Option<String>,
    pub description: Option<String>,
    pub ga_account_id: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateItemTypeForm {
    pub name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct ItemTypeActiveForm {
    pub id: Option<String>,
    pub active: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct CountItemParams {
    #[serde(rename = "type")]
    pub type_name: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct OptionsForm {
    pub timezone: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct TimezonesResponse {
    pub user_timezone: String,
    pub timezones: Vec<String>,
}

/// One row of the dashboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DayCount {
    pub name: String,
    pub count: u64,
}
