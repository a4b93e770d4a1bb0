//! User API management

use std::ops::Deref;

use axum::Extension;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::password::generate;
use crate::password::hash;
use crate::password::verify;
use crate::storage::AuditEntry;
use crate::storage::CreateUserValues;
use crate::storage::Database;
use crate::storage::Storage;
use crate::users::Role;
use crate::users::User;

use super::AuditTrail;
use super::CurrentUser;
use super::Error;
use super::Form;
use super::JwtKeys;
use super::Success;
use super::current_user::Token;
use super::current_user::generate_token;
use super::parse_required_text;

/// The user response information
///
/// A subset of all the information, ready to be serialized for the outside world
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserResponse {
    /// The user ID
    pub id: Uuid,

    /// The username
    pub username: String,

    /// The role of the user
    pub role: Role,

    /// First name
    pub first_name: String,

    /// Last name
    pub last_name: String,

    /// The password, if generated
    // Password should only be added when newly generated
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

impl UserResponse {
    /// Create a user response from a [`User`](User)
    fn from_user(user: User) -> Self {
        Self {
            id: user.id,
            username: user.username,
            role: user.role,
            first_name: user.first_name,
            last_name: user.last_name,
            password: None,
        }
    }

    /// Create a user response from multiple [`User`](User)s
    fn from_user_multiple(users: Vec<User>) -> Vec<Self> {
        users.into_iter().map(Self::from_user).collect()
    }
}

/// Login form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginForm {
    /// Username of the user
    username: String,
    /// Password of the user
    password: String,
}

/// Get a token for a user "session"
///
/// The token can then be used to access the rest of the API routes by using it in the
/// `Authorization` header
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -d '{ "username": "admin", "password": "verysecret" }' \
///     http://localhost:6000/api/users/token
/// ```
///
/// Response
/// ```json
/// { "data": { "token_type": "Bearer", "access_token": "some token", "expires_in": 3600 } }
/// ```
pub async fn token(
    Extension(jwt_keys): Extension<JwtKeys>,
    Extension(storage): Extension<Database>,
    Form(form): Form<LoginForm>,
) -> Result<Success<Token>, Error> {
    let user = storage
        .find_single_user_by_username(&form.username)
        .await
        .map_err(Error::internal_server_error)?
        .filter(|user| verify(&user.hashed_password, &form.password))
        .ok_or_else(|| Error::bad_request("Invalid user"))?;

    let token = generate_token(&jwt_keys, &user)?;

    Ok(Success::ok(token))
}

/// List all users
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users
/// ```
///
/// Response:
/// ```json
/// { "data": [ { "id": "<uuid>", "username": "some-username" ... } ] }
/// ```
pub async fn list(
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
) -> Result<Success<Vec<UserResponse>>, Error> {
    current_user.role.is_allowed(Role::Admin)?;

    let users = storage
        .find_all_users()
        .await
        .map_err(Error::internal_server_error)?;

    Ok(Success::ok(UserResponse::from_user_multiple(users)))
}

/// Get the current user
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     http://localhost:6000/api/users/me
/// ```
pub async fn me(current_user: CurrentUser) -> Result<Success<UserResponse>, Error> {
    current_user.role.is_allowed(Role::Manager)?;

    Ok(Success::ok(UserResponse::from_user(
        current_user.deref().clone(),
    )))
}

/// Create user form
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserForm {
    /// Role of the new user
    role: Role,
    /// Username of the new user
    username: String,
    /// First name of the new user
    first_name: String,
    /// Last name of the new user
    last_name: String,
    /// Optional password of the new user
    ///
    /// When not provided a new password will be generated and returned in the response, this will
    /// be the only time the password is visible
    password: Option<String>,
}

/// Create a user based on the [`CreateUserForm`](CreateUserForm) form
///
/// Request:
/// ```sh
/// curl -v -H 'Content-Type: application/json' \
///     -H 'Authorization: Bearer tokentokentoken' \
///     -d '{ "role": "manager", "username": "jane", "firstName": "Jane", "lastName": "Doe" }' \
///     http://localhost:6000/api/users
/// ```
///
/// Response
/// ```json
/// { "data": { "id": "<uuid>", "username": "jane", "password": "veryverysecret" ... } }
/// ```
pub async fn create(
    audit_trail: AuditTrail,
    Extension(storage): Extension<Database>,
    current_user: CurrentUser,
    Form(form): Form<CreateUserForm>,
) -> Result<Success<UserResponse>, Error> {
    current_user.role.is_allowed(Role::Admin)?;

    let username = parse_required_text(&form.username)
        .ok_or_else(|| Error::bad_request("Username is required"))?;

    let existing_user = storage
        .find_single_user_by_username(&username)
        .await
        .map_err(Error::internal_server_error)?;

    if existing_user.is_some() {
        return Err(Error::bad_request("User already exists"));
    }

    let (is_generated, password) = if let Some(password) = form.password {
        (false, password)
    } else {
        (true, generate())
    };

    let hashed_password = hash(&password).map_err(Error::internal_server_error)?;

    let values = CreateUserValues {
        session_id: &Uuid::new_v4(),
        role: form.role,
        username: &username,
        hashed_password: &hashed_password,
        first_name: form.first_name.trim(),
        last_name: form.last_name.trim(),
    };

    let user = storage
        .create_user(&values)
        .await
        .map_err(Error::internal_server_error)?;

    audit_trail.register(AuditEntry::CreateUser(&user)).await;

    let mut response = UserResponse::from_user(user);

    // only add the generated password, its the only time the password is known to anybody
    if is_generated {
        response.password = Some(password);
    }

    Ok(Success::created(response))
}
