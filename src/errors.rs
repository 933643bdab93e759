use axum::http::StatusCode;
use tracing::error;

#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    pub fn forbidden() -> Self {
        Self {
            status: StatusCode::FORBIDDEN,
            message: "Forbidden".to_string(),
        }
    }

    /// Generic 500 for a missing parameter or an unknown entity.
    pub fn server(message: impl Into<String>) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: message.into(),
        }
    }

    pub fn internal(err: impl std::error::Error) -> Self {
        Self {
            status: StatusCode::INTERNAL_SERVER_ERROR,
            message: err.to_string(),
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("datastore io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("datastore encoding error: {0}")]
    Encoding(#[from] serde_json::Error),

    #[error("no item type with id {0}")]
    UnknownItemType(u64),
}

#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    #[error("cache value for {key} could not be encoded: {source}")]
    Encoding {
        key: String,
        #[source]
        source: serde_json::Error,
    },
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        Self::internal(err)
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if self.status.is_server_error() {
            error!(status = %self.status, "{}", self.message);
            let reason = self.status.canonical_reason().unwrap_or("Server Error");
            return (self.status, reason).into_response();
        }
        (self.status, self.message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::response::IntoResponse;

    #[test]
    fn server_errors_hide_their_message() {
        let response = AppError::server("no active type for name \"tea\"").into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn store_errors_become_internal() {
        let err: AppError = StoreError::UnknownItemType(7).into();
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.message, "no item type with id 7");
    }
}
