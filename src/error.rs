use thiserror::Error;
use actix_web::{ResponseError, HttpResponse, http::StatusCode};
use serde_json::json;

#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    Auth(#[from] AuthError),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Domain errors for the seven auth endpoints.
///
/// Status codes and messages mirror the API this service replaces, including
/// its quirks: register-time validation failures and login against an unknown
/// email answer 200 with an `{"err": ...}` body, and the refresh path answers
/// bare 401/403 with no body at all. Existing clients match on these, so they
/// are load-bearing.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Please fill in all required fields")]
    MissingRegistrationFields,

    #[error("Password must be up to 6 characters")]
    PasswordTooShort,

    #[error("Email has already been registered")]
    EmailTaken,

    #[error("Please add email and password")]
    MissingCredentials,

    #[error("User not found, please signup")]
    UnknownEmail,

    #[error("Invalid email or password")]
    InvalidCredentials,

    #[error("Please provide email, name and avatar")]
    MissingProfileFields,

    #[error("Email has already been registered with a password")]
    EmailUsesPassword,

    #[error("User Not Found")]
    UnknownUser,

    #[error("No refresh token cookie")]
    NoRefreshCookie,

    #[error("Refresh token reuse detected")]
    ReuseDetected,

    #[error("Invalid refresh token")]
    InvalidRefreshToken,

    #[error("Refresh token subject mismatch")]
    TokenOwnerMismatch,

    #[error("Token signing failed: {0}")]
    Signing(#[from] jsonwebtoken::errors::Error),

    #[error("Password hashing failed: {0}")]
    Hashing(#[from] bcrypt::BcryptError),
}

impl AuthError {
    /// The bodiless responses of the refresh path: the legacy API set a
    /// status and ended the request without JSON.
    fn is_bare(&self) -> bool {
        matches!(
            self,
            AuthError::NoRefreshCookie
                | AuthError::ReuseDetected
                | AuthError::InvalidRefreshToken
                | AuthError::TokenOwnerMismatch
        )
    }

    fn status(&self) -> StatusCode {
        match self {
            AuthError::MissingRegistrationFields
            | AuthError::PasswordTooShort
            | AuthError::EmailTaken
            | AuthError::UnknownEmail => StatusCode::OK,
            AuthError::MissingCredentials
            | AuthError::InvalidCredentials
            | AuthError::MissingProfileFields
            | AuthError::EmailUsesPassword
            | AuthError::UnknownUser => StatusCode::BAD_REQUEST,
            AuthError::NoRefreshCookie => StatusCode::UNAUTHORIZED,
            AuthError::ReuseDetected
            | AuthError::InvalidRefreshToken
            | AuthError::TokenOwnerMismatch => StatusCode::FORBIDDEN,
            AuthError::Signing(_) | AuthError::Hashing(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Error, Debug)]
pub enum DatabaseError {
    #[error("Connection error: {0}")]
    ConnectionError(String),

    #[error("Query error: {0}")]
    QueryError(String),

    #[error("Record not found")]
    NotFound,

    #[error("Duplicate record")]
    Duplicate,
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            sqlx::Error::RowNotFound => AppError::Database(DatabaseError::NotFound),
            sqlx::Error::Database(db) if db.code().as_deref() == Some("23505") => {
                AppError::Database(DatabaseError::Duplicate)
            }
            _ => AppError::Database(DatabaseError::QueryError(err.to_string())),
        }
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        AppError::Config(err.to_string())
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal(err.to_string())
    }
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let status = self.status_code();
        if let AppError::Auth(e) = self {
            if e.is_bare() {
                return HttpResponse::build(status).finish();
            }
        }
        HttpResponse::build(status).json(json!({ "err": self.to_string() }))
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Auth(e) => e.status(),
            AppError::Database(DatabaseError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Config(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io;

    #[test]
    fn test_error_conversion() {
        let io_err = io::Error::new(io::ErrorKind::NotFound, "file not found");
        let app_err: AppError = io_err.into();
        assert!(matches!(app_err, AppError::Internal(_)));

        let config_err = config::ConfigError::NotFound(String::from("key not found"));
        let app_err: AppError = config_err.into();
        assert!(matches!(app_err, AppError::Config(_)));

        let db_err = sqlx::Error::RowNotFound;
        let app_err: AppError = db_err.into();
        assert!(matches!(app_err, AppError::Database(DatabaseError::NotFound)));
    }

    #[test]
    fn test_observed_status_codes() {
        // Legacy 200-with-err responses
        for e in [
            AuthError::MissingRegistrationFields,
            AuthError::PasswordTooShort,
            AuthError::EmailTaken,
            AuthError::UnknownEmail,
        ] {
            assert_eq!(AppError::Auth(e).status_code(), StatusCode::OK);
        }

        assert_eq!(
            AppError::Auth(AuthError::MissingCredentials).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth(AuthError::EmailUsesPassword).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth(AuthError::UnknownUser).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::Auth(AuthError::NoRefreshCookie).status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::Auth(AuthError::ReuseDetected).status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(
            AppError::Auth(AuthError::InvalidRefreshToken).status_code(),
            StatusCode::FORBIDDEN
        );
    }

    #[test]
    fn test_refresh_path_errors_have_no_body() {
        assert!(AuthError::NoRefreshCookie.is_bare());
        assert!(AuthError::ReuseDetected.is_bare());
        assert!(AuthError::TokenOwnerMismatch.is_bare());
        assert!(!AuthError::EmailTaken.is_bare());
        assert!(!AuthError::InvalidCredentials.is_bare());
    }

    #[test]
    fn test_error_display() {
        let err = AppError::Auth(AuthError::EmailTaken);
        assert_eq!(err.to_string(), "Email has already been registered");

        let err = AppError::Auth(AuthError::PasswordTooShort);
        assert_eq!(err.to_string(), "Password must be up to 6 characters");

        let err = AppError::Database(DatabaseError::NotFound);
        assert_eq!(err.to_string(), "Database error: Record not found");
    }
}
