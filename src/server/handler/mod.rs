//! This module holds the handler of friendgraph

use std::fmt::{Display, Formatter};

use actix_toolbox::tb_middleware::actix_session::{SessionGetError, SessionInsertError};
use actix_toolbox::tb_middleware::Session;
use actix_web::body::BoxBody;
use actix_web::error::{JsonPayloadError, QueryPayloadError};
use actix_web::HttpResponse;
use log::{debug, error, trace};
use serde::{Deserialize, Serialize};
use serde_repr::Serialize_repr;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

pub use crate::server::handler::accounts::*;
pub use crate::server::handler::auth::*;
pub use crate::server::handler::relationships::*;

use crate::graph::{GraphError, StoreError, ValidationReason};

pub mod accounts;
pub mod auth;
pub mod relationships;

/// The result that is used throughout the complete api.
pub type ApiResult<T> = Result<T, ApiError>;

/// A uuid taken from the path
#[derive(Deserialize, IntoParams)]
#[into_params(parameter_in = Path)]
pub struct PathUuid {
    pub(crate) uuid: Uuid,
}

/// Retrieve the uuid of the logged-in account from the session
pub(crate) fn session_uuid(session: &Session) -> ApiResult<Uuid> {
    session.get("uuid")?.ok_or(ApiError::SessionCorrupt)
}

#[derive(Serialize_repr, ToSchema)]
#[repr(u16)]
pub(crate) enum ApiStatusCode {
    Unauthenticated = 1000,
    LoginFailed = 1001,
    UsernameAlreadyOccupied = 1002,
    InvalidUsername = 1003,
    InvalidDisplayName = 1004,
    InvalidPassword = 1005,
    InvalidJson = 1006,
    InvalidQuery = 1007,
    SessionCorrupt = 1008,

    TargetNotFound = 1100,
    CannotFriendSelf = 1101,
    CannotBlockSelf = 1102,
    RelationshipExists = 1103,
    AlreadyBlocked = 1104,
    InvalidPagination = 1105,
    RelationshipNotFound = 1106,

    InternalServerError = 2000,
    DatabaseError = 2001,
    SessionError = 2002,
}

impl From<ValidationReason> for ApiStatusCode {
    fn from(value: ValidationReason) -> Self {
        match value {
            ValidationReason::TargetNotFound => Self::TargetNotFound,
            ValidationReason::CannotFriendSelf => Self::CannotFriendSelf,
            ValidationReason::CannotBlockSelf => Self::CannotBlockSelf,
            ValidationReason::RelationshipExists => Self::RelationshipExists,
            ValidationReason::AlreadyBlocked => Self::AlreadyBlocked,
            ValidationReason::InvalidPagination => Self::InvalidPagination,
        }
    }
}

#[derive(Serialize, ToSchema)]
pub(crate) struct ApiErrorResponse {
    #[schema(example = "Error message is here")]
    message: String,
    #[schema(example = 1000)]
    status_code: ApiStatusCode,
}

impl ApiErrorResponse {
    fn new(status_code: ApiStatusCode, message: String) -> Self {
        Self {
            message,
            status_code,
        }
    }
}

/// This enum holds all possible error types that can occur in the API
#[derive(Debug)]
pub enum ApiError {
    /// The user is not allowed to access the resource
    Unauthenticated,
    /// Login was not successful. Can be caused by incorrect username / password
    LoginFailed,
    /// The username is already occupied
    UsernameAlreadyOccupied,
    /// The username is empty, too long or contains invalid characters
    InvalidUsername,
    /// The display name is empty or too long
    InvalidDisplayName,
    /// The password is empty
    InvalidPassword,
    /// The body could not be parsed
    InvalidJson(JsonPayloadError),
    /// The query could not be parsed
    InvalidQuery(QueryPayloadError),
    /// The session does not hold a valid account
    SessionCorrupt,
    /// A value could not be read from the session
    SessionGet(SessionGetError),
    /// A value could not be written to the session
    SessionInsert(SessionInsertError),

    /// A precondition of a relationship operation is not met
    Validation(ValidationReason),
    /// The relationship does not exist or is not visible to the caller
    RelationshipNotFound,

    /// All errors that are thrown by the database
    DatabaseError(rorm::Error),
    /// An invalid hash is retrieved from the database
    InvalidHash(argon2::password_hash::Error),
}

impl Display for ApiError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthenticated => write!(f, "Unauthenticated"),
            ApiError::LoginFailed => write!(f, "The login was not successful"),
            ApiError::UsernameAlreadyOccupied => write!(f, "Username is already occupied"),
            ApiError::InvalidUsername => write!(
                f,
                "Username must consist of 1 to 20 lowercase letters, digits or underscores"
            ),
            ApiError::InvalidDisplayName => write!(f, "Invalid display name"),
            ApiError::InvalidPassword => write!(f, "Invalid password"),
            ApiError::InvalidJson(err) => write!(f, "Invalid json: {err}"),
            ApiError::InvalidQuery(err) => write!(f, "Invalid query: {err}"),
            ApiError::SessionCorrupt => write!(f, "Corrupt session"),
            ApiError::SessionGet(_) | ApiError::SessionInsert(_) => {
                write!(f, "Session error occurred")
            }
            ApiError::Validation(reason) => write!(f, "{reason}"),
            ApiError::RelationshipNotFound => write!(f, "Relationship not found"),
            ApiError::DatabaseError(_) => write!(f, "Database error occurred"),
            ApiError::InvalidHash(_) => write!(f, "Internal server error"),
        }
    }
}

impl actix_web::ResponseError for ApiError {
    fn error_response(&self) -> HttpResponse<BoxBody> {
        match self {
            ApiError::Unauthenticated => {
                trace!("Unauthenticated");

                HttpResponse::Unauthorized().json(ApiErrorResponse::new(
                    ApiStatusCode::Unauthenticated,
                    self.to_string(),
                ))
            }
            ApiError::LoginFailed => {
                debug!("Login request failed");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::LoginFailed,
                    self.to_string(),
                ))
            }
            ApiError::UsernameAlreadyOccupied => {
                debug!("Username is already occupied");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::UsernameAlreadyOccupied,
                    self.to_string(),
                ))
            }
            ApiError::InvalidUsername => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::InvalidUsername,
                self.to_string(),
            )),
            ApiError::InvalidDisplayName => HttpResponse::BadRequest().json(
                ApiErrorResponse::new(ApiStatusCode::InvalidDisplayName, self.to_string()),
            ),
            ApiError::InvalidPassword => HttpResponse::BadRequest().json(ApiErrorResponse::new(
                ApiStatusCode::InvalidPassword,
                self.to_string(),
            )),
            ApiError::InvalidJson(err) => {
                debug!("Received invalid json: {err}");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::InvalidJson,
                    self.to_string(),
                ))
            }
            ApiError::InvalidQuery(err) => {
                debug!("Received invalid query: {err}");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::InvalidQuery,
                    self.to_string(),
                ))
            }
            ApiError::SessionCorrupt => {
                debug!("Session without account uuid");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    ApiStatusCode::SessionCorrupt,
                    self.to_string(),
                ))
            }
            ApiError::SessionGet(err) => {
                error!("Could not read from session: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::SessionError,
                    self.to_string(),
                ))
            }
            ApiError::SessionInsert(err) => {
                error!("Could not write to session: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::SessionError,
                    self.to_string(),
                ))
            }
            ApiError::Validation(reason) => {
                debug!("Relationship request rejected: {reason}");

                HttpResponse::BadRequest().json(ApiErrorResponse::new(
                    (*reason).into(),
                    self.to_string(),
                ))
            }
            ApiError::RelationshipNotFound => {
                trace!("Relationship not found");

                HttpResponse::NotFound().json(ApiErrorResponse::new(
                    ApiStatusCode::RelationshipNotFound,
                    self.to_string(),
                ))
            }
            ApiError::DatabaseError(err) => {
                error!("Database error: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::DatabaseError,
                    self.to_string(),
                ))
            }
            ApiError::InvalidHash(err) => {
                error!("Got invalid password hash from db: {err}");

                HttpResponse::InternalServerError().json(ApiErrorResponse::new(
                    ApiStatusCode::InternalServerError,
                    self.to_string(),
                ))
            }
        }
    }
}

impl From<rorm::Error> for ApiError {
    fn from(value: rorm::Error) -> Self {
        Self::DatabaseError(value)
    }
}

impl From<argon2::password_hash::Error> for ApiError {
    fn from(value: argon2::password_hash::Error) -> Self {
        Self::InvalidHash(value)
    }
}

impl From<SessionGetError> for ApiError {
    fn from(value: SessionGetError) -> Self {
        Self::SessionGet(value)
    }
}

impl From<SessionInsertError> for ApiError {
    fn from(value: SessionInsertError) -> Self {
        Self::SessionInsert(value)
    }
}

impl From<GraphError> for ApiError {
    fn from(value: GraphError) -> Self {
        match value {
            GraphError::Validation(reason) => Self::Validation(reason),
            GraphError::NotFound => Self::RelationshipNotFound,
            GraphError::Store(StoreError::Database(err)) => Self::DatabaseError(err),
            GraphError::Store(StoreError::PairOccupied) => {
                Self::Validation(ValidationReason::RelationshipExists)
            }
        }
    }
}
