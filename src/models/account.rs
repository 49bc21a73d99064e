use rorm::{Model, Patch};
use uuid::Uuid;

/// A user account
///
/// The relationship graph only ever references accounts by their uuid.
#[derive(Model)]
pub struct Account {
    /// The primary key of an account
    #[rorm(primary_key)]
    pub uuid: Uuid,

    /// The login name of the account.
    ///
    /// Restricted to lowercase letters, digits and underscores.
    #[rorm(max_length = 20, unique)]
    pub username: String,

    /// The name that is displayed for this user
    #[rorm(max_length = 255)]
    pub display_name: String,

    /// The argon2 hash of the password
    #[rorm(max_length = 1024)]
    pub password_hash: String,

    /// The last time the user has logged in
    pub last_login: Option<chrono::NaiveDateTime>,

    /// The point in time the account was registered
    #[rorm(auto_create_time)]
    pub created_at: chrono::NaiveDateTime,
}

#[derive(Patch)]
#[rorm(model = "Account")]
pub(crate) struct AccountInsert {
    pub(crate) uuid: Uuid,
    pub(crate) username: String,
    pub(crate) display_name: String,
    pub(crate) password_hash: String,
    pub(crate) last_login: Option<chrono::NaiveDateTime>,
}
