//! This module holds the definition of the swagger declaration

use utoipa::openapi::security::{ApiKey, ApiKeyValue, SecurityScheme};
use utoipa::{Modify, OpenApi};

use crate::models::RelationshipStatus;
use crate::server::handler;

struct CookieSecurity;

impl Modify for CookieSecurity {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        if let Some(components) = openapi.components.as_mut() {
            components.add_security_scheme(
                "session_cookie",
                SecurityScheme::ApiKey(ApiKey::Cookie(ApiKeyValue::new("id"))),
            )
        }
    }
}

/// Helper struct for the openapi definitions.
#[derive(OpenApi)]
#[openapi(
    paths(
        handler::register_account,
        handler::get_me,
        handler::login,
        handler::logout,
        handler::send_friend_request,
        handler::get_incoming_requests,
        handler::get_sent_requests,
        handler::get_friend_request,
        handler::accept_friend_request,
        handler::reject_friend_request,
        handler::block_account,
        handler::get_friends,
    ),
    components(schemas(
        handler::AccountRegistrationRequest,
        handler::ApiErrorResponse,
        handler::ApiStatusCode,
        handler::LoginRequest,
        handler::AccountResponse,
        handler::CreateFriendRequest,
        handler::CreateBlockRequest,
        handler::RelationshipResponse,
        handler::FriendRequestsResponse,
        handler::FriendResponse,
        handler::FriendsResponse,
        RelationshipStatus,
    )),
    modifiers(&CookieSecurity)
)]
pub struct ApiDoc;
