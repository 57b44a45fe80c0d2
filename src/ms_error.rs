// Error types shared by the server, the client and the game engine

use axum::http::{StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::SetLoggerError;
use serde_json::json;
use thiserror::Error;

/// Failures while reading bootstrap settings from the environment.
#[derive(Error, Debug, PartialEq, Eq)]
pub enum SettingsError {
    /// A required variable is not set.
    #[error("environment variable {0} is not set")]
    MissingVar(&'static str),

    /// A variable is set to something we cannot use.
    #[error("environment variable {var} has an invalid value {value:?}")]
    InvalidValue { var: &'static str, value: String },
}

/// Failures while loading TLS material for the dev server.
#[derive(Error, Debug)]
pub enum TlsError {
    #[error("cannot read {what} '{path}': {source}")]
    Read {
        what: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("certificate chain in '{0}' is empty")]
    EmptyChain(String),

    #[error("no private key found in '{0}'")]
    NoPrivateKey(String),

    #[error("invalid TLS configuration: {0}")]
    Config(#[from] rustls::Error),
}

/// Failures while initialising the logger.
#[derive(Error, Debug)]
pub enum LoggerError {
    #[error("logger initialization error: {0}")]
    Init(#[from] SetLoggerError),

    #[error("cannot open log file '{path}': {source}")]
    File {
        path: String,
        #[source]
        source: std::io::Error,
    },
}

/// Rule violations raised by the game engine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GameError {
    #[error("cell {0},{1} does not exist")]
    CellOutOfRange(usize, usize),

    #[error("game is already finished")]
    GameFinished,

    #[error("cell is already uncovered")]
    CellAlreadyUncovered,

    #[error("board size must be between 1 and {max} in both directions")]
    InvalidSize { max: usize },
}

/// Errors returned by the HTTP API; each maps onto a status code and a
/// `{"detail": ...}` body.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Invalid username/password.")]
    InvalidCredentials,

    #[error("Authentication credentials were not provided.")]
    NotAuthenticated,

    #[error("You do not have permission to perform this action.")]
    PermissionDenied,

    #[error("Not found.")]
    NotFound,

    #[error("{0}")]
    BadRequest(String),

    #[error(transparent)]
    Game(#[from] GameError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::InvalidCredentials | ApiError::NotAuthenticated => StatusCode::UNAUTHORIZED,
            ApiError::PermissionDenied => StatusCode::FORBIDDEN,
            ApiError::NotFound | ApiError::Game(GameError::CellOutOfRange(_, _)) => {
                StatusCode::NOT_FOUND
            }
            ApiError::BadRequest(_) | ApiError::Game(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "detail": self.to_string() }));
        if status == StatusCode::UNAUTHORIZED {
            // Basic is the first authenticator, so it names the challenge
            (status, [(header::WWW_AUTHENTICATE, "Basic realm=\"api\"")], body).into_response()
        } else {
            (status, body).into_response()
        }
    }
}

/// Failures seen by the API client.
#[derive(Error, Debug)]
pub enum ClientError {
    #[error("HTTP client error: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-success status; `detail` carries the
    /// server's explanation when it sent one.
    #[error("server returned {status}: {detail}")]
    Status { status: u16, detail: String },

    #[error("not signed in")]
    NotSignedIn,
}
