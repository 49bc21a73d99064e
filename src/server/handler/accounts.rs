//! All handlers for the account endpoints live in here

use actix_toolbox::tb_middleware::Session;
use actix_web::web::{Data, Json};
use actix_web::{get, post, HttpResponse};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHasher};
use rand::thread_rng;
use rorm::{insert, query, Database, FieldAccess, Model};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::graph::AccountSummary;
use crate::models::{Account, AccountInsert};
use crate::server::handler::{session_uuid, ApiError, ApiErrorResponse, ApiResult};

const MAX_USERNAME_LENGTH: usize = 20;
const MAX_DISPLAY_NAME_LENGTH: usize = 255;

/// Usernames consist of lowercase ascii letters, digits and underscores
fn is_valid_username(username: &str) -> bool {
    !username.is_empty()
        && username.len() <= MAX_USERNAME_LENGTH
        && username
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

fn is_valid_display_name(display_name: &str) -> bool {
    !display_name.trim().is_empty() && display_name.chars().count() <= MAX_DISPLAY_NAME_LENGTH
}

/// The content to register a new account
#[derive(Debug, Deserialize, ToSchema)]
pub struct AccountRegistrationRequest {
    #[schema(example = "user123")]
    username: String,
    #[schema(example = "Herbert")]
    display_name: String,
    #[schema(example = "super-secure-password")]
    password: String,
}

/// Register a new account
///
/// The `username` may only contain lowercase letters, digits and underscores.
#[utoipa::path(
    tag = "Accounts",
    responses(
        (status = 200, description = "Account got created"),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    request_body = AccountRegistrationRequest,
)]
#[post("/api/v1/accounts/register")]
pub async fn register_account(
    req: Json<AccountRegistrationRequest>,
    db: Data<Database>,
) -> ApiResult<HttpResponse> {
    if !is_valid_username(&req.username) {
        return Err(ApiError::InvalidUsername);
    }

    if !is_valid_display_name(&req.display_name) {
        return Err(ApiError::InvalidDisplayName);
    }

    if req.password.is_empty() {
        return Err(ApiError::InvalidPassword);
    }

    let mut tx = db.start_transaction().await?;

    if query!(&mut tx, (Account::F.uuid,))
        .condition(Account::F.username.equals(&req.username))
        .optional()
        .await?
        .is_some()
    {
        return Err(ApiError::UsernameAlreadyOccupied);
    }

    let salt = SaltString::generate(&mut thread_rng());
    let password_hash = Argon2::default()
        .hash_password(req.password.as_bytes(), &salt)?
        .to_string();

    insert!(&mut tx, AccountInsert)
        .single(&AccountInsert {
            uuid: Uuid::new_v4(),
            username: req.username.clone(),
            display_name: req.display_name.trim().to_string(),
            password_hash,
            last_login: None,
        })
        .await?;

    tx.commit().await?;

    Ok(HttpResponse::Ok().finish())
}

/// The public data of an account
#[derive(Serialize, Deserialize, ToSchema, Clone, Debug, PartialEq, Eq)]
pub struct AccountResponse {
    pub(crate) uuid: Uuid,
    #[schema(example = "user123")]
    pub(crate) username: String,
    #[schema(example = "Herbert")]
    pub(crate) display_name: String,
}

impl From<AccountSummary> for AccountResponse {
    fn from(value: AccountSummary) -> Self {
        Self {
            uuid: value.uuid,
            username: value.username,
            display_name: value.display_name,
        }
    }
}

/// Returns the account that is currently logged-in
#[utoipa::path(
    tag = "Accounts",
    context_path = "/api/v1",
    responses(
        (status = 200, description = "Returns the account data of the current user", body = AccountResponse),
        (status = 400, description = "Client error", body = ApiErrorResponse),
        (status = 500, description = "Server error", body = ApiErrorResponse),
    ),
    security(("session_cookie" = []))
)]
#[get("/accounts/me")]
pub async fn get_me(db: Data<Database>, session: Session) -> ApiResult<Json<AccountResponse>> {
    let uuid = session_uuid(&session)?;

    let (username, display_name) = query!(
        db.as_ref(),
        (Account::F.username, Account::F.display_name)
    )
    .condition(Account::F.uuid.equals(uuid))
    .optional()
    .await?
    .ok_or(ApiError::SessionCorrupt)?;

    Ok(Json(AccountResponse {
        uuid,
        username,
        display_name,
    }))
}
