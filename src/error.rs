use crate::maud_conveniences::alert;
use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};
use snafu::Snafu;
use std::{num::ParseIntError, sync::Arc};

pub type VaxResult<T> = Result<T, VaxError>;

pub const CONFLICT_MESSAGE: &str =
    "This record was changed by someone else since it was loaded. Reload it and try again.";

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum VaxError {
    #[snafu(display("Unable to retrieve env var `{}`", name))]
    BadEnvVar {
        source: dotenvy::Error,
        name: &'static str,
    },
    #[snafu(display("Unable to parse env var `{}` as a number", name))]
    ParseEnvNumber {
        source: ParseIntError,
        name: &'static str,
    },
    #[snafu(display("API base url {:?} is unusable: {}", url, reason))]
    InvalidBaseUrl { url: String, reason: String },
    #[snafu(display("Error talking to the vaccination backend"))]
    Http { source: reqwest::Error },
    #[snafu(display("Unable to decode the backend response"))]
    DecodeResponse { source: reqwest::Error },
    #[snafu(display("Backend returned {}: {}", status, message.as_deref().unwrap_or("no message")))]
    Api {
        status: u16,
        message: Option<String>,
    },
    #[snafu(display("Not found: {}", message.as_deref().unwrap_or("no message")))]
    NotFound { message: Option<String> },
    #[snafu(display("Conflicting update: {}", message.as_deref().unwrap_or("no message")))]
    Conflict { message: Option<String> },
    #[snafu(display("{}", source))]
    SharedFetch { source: Arc<VaxError> },
    #[snafu(display("Error with multipart form input"))]
    Multipart {
        source: axum::extract::multipart::MultipartError,
    },
    #[snafu(display("Error with CSVs"))]
    Csv { source: csv::Error },
    #[snafu(display("Error with ZIPs"))]
    Zip { source: zip::result::ZipError },
    #[snafu(display("IO error"))]
    Io { source: std::io::Error },
    #[snafu(display("Error joining blocking task"))]
    Join { source: tokio::task::JoinError },
    #[snafu(display("Error with hashing/password verification"))]
    Bcrypt { source: bcrypt::BcryptError },
    #[snafu(display("Error with sessions"))]
    TowerSession {
        source: axum_login::tower_sessions::session::Error,
    },
}

impl VaxError {
    /// Text for the person who triggered the request: the backend's own message when it sent one,
    /// otherwise `fallback`.
    pub fn user_message(&self, fallback: &str) -> String {
        match self {
            Self::Api {
                message: Some(message),
                ..
            }
            | Self::NotFound {
                message: Some(message),
            } => message.clone(),
            Self::Conflict { .. } => CONFLICT_MESSAGE.to_string(),
            Self::SharedFetch { source } => source.user_message(fallback),
            _ => fallback.to_string(),
        }
    }

    pub fn is_conflict(&self) -> bool {
        match self {
            Self::Conflict { .. } => true,
            Self::SharedFetch { source } => source.is_conflict(),
            _ => false,
        }
    }

    pub fn from_shared(shared: Arc<Self>) -> Self {
        Arc::try_unwrap(shared).unwrap_or_else(|source| Self::SharedFetch { source })
    }
}

impl From<axum_login::Error<crate::auth::backend::VaxAuthBackend>> for VaxError {
    fn from(value: axum_login::Error<crate::auth::backend::VaxAuthBackend>) -> Self {
        match value {
            axum_login::Error::Session(source) => Self::TowerSession { source },
            axum_login::Error::Backend(backend) => backend,
        }
    }
}

impl IntoResponse for VaxError {
    #[allow(clippy::match_same_arms)]
    fn into_response(self) -> Response {
        const ISE: StatusCode = StatusCode::INTERNAL_SERVER_ERROR; //internal server error
        const NF: StatusCode = StatusCode::NOT_FOUND; //not found
        const BG: StatusCode = StatusCode::BAD_GATEWAY; //upstream misbehaved
        const BI: StatusCode = StatusCode::BAD_REQUEST; //bad input

        let status_code = match &self {
            Self::BadEnvVar { .. } | Self::ParseEnvNumber { .. } => ISE,
            Self::InvalidBaseUrl { .. } => ISE,
            Self::Http { .. } | Self::DecodeResponse { .. } => BG,
            Self::Api { status, .. } => StatusCode::from_u16(*status).unwrap_or(BG),
            Self::NotFound { .. } => NF,
            Self::Conflict { .. } => StatusCode::CONFLICT,
            Self::SharedFetch { .. } => BG,
            Self::Multipart { source } => source.status(),
            Self::Csv { .. } | Self::Zip { .. } | Self::Io { .. } => ISE,
            Self::Join { .. } | Self::Bcrypt { .. } | Self::TowerSession { .. } => ISE,
        };
        let status_code = if status_code.is_success() { BI } else { status_code };

        error!(?self, "Error!");
        (
            status_code,
            Html(alert("Portal Error", self.user_message(&self.to_string()))),
        )
            .into_response()
    }
}
