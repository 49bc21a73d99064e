//! Error handlers of the extractors, so their failures are reported as [ApiError]

use actix_web::error::{JsonPayloadError, PathError, QueryPayloadError};
use actix_web::HttpRequest;

use crate::server::handler::ApiError;

pub(crate) fn json_extractor_error(err: JsonPayloadError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::InvalidJson(err).into()
}

pub(crate) fn query_extractor_error(
    err: QueryPayloadError,
    _req: &HttpRequest,
) -> actix_web::Error {
    ApiError::InvalidQuery(err).into()
}

/// Every path parameter identifies a relationship, a malformed one can't exist
pub(crate) fn path_extractor_error(_err: PathError, _req: &HttpRequest) -> actix_web::Error {
    ApiError::RelationshipNotFound.into()
}
