//! Session guards.
//!
//! Handlers opt in per method by taking [`CurrentUser`] or [`AdminUser`] as
//! an argument. Without a session a browser `GET` is sent to the login page;
//! any other method is refused with 403.

use crate::config::Settings;
use crate::errors::AppError;
use crate::models::User;
use crate::state::AppState;
use async_trait::async_trait;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum::http::{HeaderMap, Method};
use axum::response::{IntoResponse, Redirect, Response};
use percent_encoding::{NON_ALPHANUMERIC, utf8_percent_encode};
use std::convert::Infallible;

pub trait IdentityProvider: Send + Sync {
    fn current_user(&self, headers: &HeaderMap) -> Option<User>;
    fn login_url(&self, continue_to: &str) -> String;
    fn logout_url(&self, continue_to: &str) -> String;
}

/// Trusts identity headers injected by an authenticating reverse proxy.
#[derive(Debug, Clone)]
pub struct HeaderIdentity {
    user_header: String,
    admin_header: String,
    login_url: String,
    logout_url: String,
}

impl HeaderIdentity {
    pub fn new(settings: &Settings) -> Self {
        Self {
            user_header: settings.user_header.clone(),
            admin_header: settings.admin_header.clone(),
            login_url: settings.login_url.clone(),
            logout_url: settings.logout_url.clone(),
        }
    }
}

impl IdentityProvider for HeaderIdentity {
    fn current_user(&self, headers: &HeaderMap) -> Option<User> {
        let email = headers
            .get(self.user_header.as_str())?
            .to_str()
            .ok()?
            .trim();
        if email.is_empty() {
            return None;
        }
        let is_admin = headers
            .get(self.admin_header.as_str())
            .and_then(|value| value.to_str().ok())
            .is_some_and(|value| matches!(value.trim(), "true" | "1"));
        Some(User::new(email, is_admin))
    }

    fn login_url(&self, continue_to: &str) -> String {
        with_continue(&self.login_url, continue_to)
    }

    fn logout_url(&self, continue_to: &str) -> String {
        with_continue(&self.logout_url, continue_to)
    }
}

fn with_continue(base: &str, continue_to: &str) -> String {
    let separator = if base.contains('?') { '&' } else { '?' };
    format!(
        "{base}{separator}continue={}",
        utf8_percent_encode(continue_to, NON_ALPHANUMERIC)
    )
}

#[derive(Debug)]
pub enum AuthRejection {
    Login(String),
    Forbidden,
}

impl IntoResponse for AuthRejection {
    fn into_response(self) -> Response {
        match self {
            AuthRejection::Login(url) => Redirect::to(&url).into_response(),
            AuthRejection::Forbidden => AppError::forbidden().into_response(),
        }
    }
}

fn unauthenticated(parts: &Parts, state: &AppState) -> AuthRejection {
    if parts.method == Method::GET {
        let target = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str())
            .unwrap_or("/");
        AuthRejection::Login(state.identity.login_url(target))
    } else {
        AuthRejection::Forbidden
    }
}

/// Any signed-in user.
pub struct CurrentUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.identity.current_user(&parts.headers) {
            Some(user) => Ok(Self(user)),
            None => Err(unauthenticated(parts, state)),
        }
    }
}

/// A signed-in user with the administrator flag.
pub struct AdminUser(pub User);

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AuthRejection;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        match state.identity.current_user(&parts.headers) {
            Some(user) if user.is_admin => Ok(Self(user)),
            Some(_) => Err(AuthRejection::Forbidden),
            None => Err(unauthenticated(parts, state)),
        }
    }
}

pub struct MaybeUser(pub Option<User>);

#[async_trait]
impl FromRequestParts<AppState> for MaybeUser {
    type Rejection = Infallible;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        Ok(Self(state.identity.current_user(&parts.headers)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn identity() -> HeaderIdentity {
        HeaderIdentity {
            user_header: "x-auth-user".to_string(),
            admin_header: "x-auth-admin".to_string(),
            login_url: "/login".to_string(),
            logout_url: "https://auth.example.com/logout?app=dc".to_string(),
        }
    }

    #[test]
    fn reads_user_and_admin_flag() {
        let mut headers = HeaderMap::new();
        headers.insert("x-auth-user", HeaderValue::from_static("ada@example.com"));
        headers.insert("x-auth-admin", HeaderValue::from_static("true"));

        let user = identity().current_user(&headers).unwrap();
        assert_eq!(user.email, "ada@example.com");
        assert!(user.is_admin);
    }

    #[test]
    fn missing_or_blank_header_is_anonymous() {
        let mut headers = HeaderMap::new();
        assert!(identity().current_user(&headers).is_none());
        headers.insert("x-auth-user", HeaderValue::from_static("  "));
        assert!(identity().current_user(&headers).is_none());
    }

    #[test]
    fn admin_flag_defaults_to_false() {
        let mut headers = HeaderMap::new();
        headers.insert("x-auth-user", HeaderValue::from_static("ada@example.com"));
        headers.insert("x-auth-admin", HeaderValue::from_static("no"));
        assert!(!identity().current_user(&headers).unwrap().is_admin);
    }

    #[test]
    fn urls_carry_encoded_continue_target() {
        assert_eq!(
            identity().login_url("/user/countitem?type=water"),
            "/login?continue=%2Fuser%2Fcountitem%3Ftype%3Dwater"
        );
        assert_eq!(
            identity().logout_url("/"),
            "https://auth.example.com/logout?app=dc&continue=%2F"
        );
    }
}
