//! This module holds the middleware definitions

pub(crate) use authentication_required::AuthenticationRequired;
pub(crate) use extractor_error::{json_extractor_error, path_extractor_error, query_extractor_error};

mod authentication_required;
mod extractor_error;
