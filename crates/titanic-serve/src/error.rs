use serde::Serialize;
use thiserror::Error;
use titanic_core::TitanicError;
use warp::http::StatusCode;
use warp::reply::{Reply, Response};

/// An error reply: HTTP status plus a machine-readable reason code.
#[derive(Debug, Clone, Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub status: StatusCode,
    pub code: &'static str,
    pub message: String,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
    message: &'a str,
}

impl ApiError {
    pub fn new(status: StatusCode, code: &'static str, message: impl Into<String>) -> Self {
        Self {
            status,
            code,
            message: message.into(),
        }
    }

    /// The request body is not a JSON array of records.
    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, "malformed_payload", message)
    }

    /// No model is loaded.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self::new(StatusCode::SERVICE_UNAVAILABLE, "model_unavailable", message)
    }

    pub fn internal(message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, "internal_error", message)
    }

    #[must_use]
    pub fn is_client_error(&self) -> bool {
        self.status.is_client_error()
    }
}

impl From<TitanicError> for ApiError {
    fn from(err: TitanicError) -> Self {
        if err.is_client_error() {
            return Self::new(StatusCode::BAD_REQUEST, err.code(), err.to_string());
        }
        match err {
            TitanicError::ModelNotFitted => Self::unavailable(err.to_string()),
            other => {
                tracing::error!(error = %other, "internal error while serving request");
                Self::internal(other.to_string())
            }
        }
    }
}

impl Reply for ApiError {
    fn into_response(self) -> Response {
        let body = ErrorBody {
            error: self.code,
            message: &self.message,
        };
        warp::reply::with_status(warp::reply::json(&body), self.status).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_faults_map_to_400() {
        let err = ApiError::from(TitanicError::MissingColumn {
            columns: vec!["Sex".into()],
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.code, "missing_column");
        assert!(err.is_client_error());

        let err = ApiError::from(TitanicError::UnknownCategory {
            column: "Sex".into(),
            value: "x".into(),
        });
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn server_faults_map_to_5xx() {
        let err = ApiError::from(TitanicError::ModelNotFitted);
        assert_eq!(err.status, StatusCode::SERVICE_UNAVAILABLE);

        let err = ApiError::from(TitanicError::ArtifactCorrupt("bad".into()));
        assert_eq!(err.status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.code, "internal_error");
        assert!(!err.is_client_error());
    }

    #[test]
    fn reply_carries_status_and_code() {
        let res = ApiError::malformed("expected an array").into_response();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }
}
