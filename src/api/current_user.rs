//! Current user service
//!
//! Get the current user from the request based on the Authorization header. The current user is
//! the explicit context for actions on behalf of somebody, like creating a meeting.

use std::ops::Deref;
use std::sync::Arc;

use axum::Extension;
use axum::RequestPartsExt;
use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use axum_extra::TypedHeader;
use axum_extra::headers::Authorization;
use axum_extra::headers::authorization::Bearer;
use jsonwebtoken::DecodingKey;
use jsonwebtoken::EncodingKey;
use serde::Deserialize;
use serde::Serialize;
use uuid::Uuid;

use crate::api::Error;
use crate::storage::Database;
use crate::storage::Storage;
use crate::users::User;

/// Seconds a token stays valid
const TOKEN_LIFETIME: i64 = 3600;

/// The keys used for encoding/decoding JWT tokens
#[derive(Clone)]
pub struct JwtKeys {
    /// The encoding key
    encoding: EncodingKey,

    /// The decoding key
    decoding: DecodingKey,
}

impl JwtKeys {
    /// Create new encoding/decoding keys, derived from a secret
    pub fn new(secret: &[u8]) -> Self {
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
        }
    }
}

/// The JWT claims to identify a user
#[derive(Debug, Deserialize, Serialize)]
struct Claims {
    /// The user ID
    sub: Uuid,

    /// Expiration as UNIX timestamp
    exp: i64,

    /// A session ID, used to invalidate tokens before they expire
    jti: Uuid,
}

/// Token information served to the user
#[derive(Debug, Serialize)]
pub struct Token {
    /// Type of the token: Bearer
    #[allow(clippy::struct_field_names)] // `type` is a reserved keyword
    token_type: String,

    /// In how many seconds does the token expire
    expires_in: i64,

    /// The access token to provide to follow up requests in the Authorization header
    #[allow(clippy::struct_field_names)]
    access_token: String,
}

/// Current user service
#[derive(Clone)]
pub struct CurrentUser {
    /// The authenticated user
    user: Arc<User>,
}

impl Deref for CurrentUser {
    type Target = User;

    fn deref(&self) -> &Self::Target {
        &self.user
    }
}

/// Generate a token for the outside world for a given user
pub fn generate_token(jwt_keys: &JwtKeys, user: &User) -> Result<Token, Error> {
    use jsonwebtoken::Header;
    use jsonwebtoken::encode;

    let claims = Claims {
        sub: user.id,
        exp: chrono::Utc::now().timestamp() + TOKEN_LIFETIME,
        jti: user.session_id,
    };

    let access_token = encode(&Header::default(), &claims, &jwt_keys.encoding)
        .map_err(Error::internal_server_error)?;

    Ok(Token {
        token_type: "Bearer".to_string(),
        expires_in: TOKEN_LIFETIME,
        access_token,
    })
}

/// Decode and validate the claims of a bearer token
fn decode_claims(jwt_keys: &JwtKeys, token: &str) -> Result<Claims, Error> {
    use jsonwebtoken::Validation;
    use jsonwebtoken::decode;

    decode::<Claims>(token, &jwt_keys.decoding, &Validation::default())
        .map(|token_data| token_data.claims)
        .map_err(|err| Error::forbidden(format!("Invalid token: {err}")))
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let TypedHeader(Authorization(bearer)) =
            TypedHeader::<Authorization<Bearer>>::from_request_parts(parts, state)
                .await
                .map_err(|_| Error::forbidden("Missing API token"))?;

        let Extension(jwt_keys) = parts
            .extract::<Extension<JwtKeys>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get JWT keys"))?;

        let Extension(storage) = parts
            .extract::<Extension<Database>>()
            .await
            .map_err(|_| Error::internal_server_error("Could not get the storage"))?;

        let claims = decode_claims(&jwt_keys, bearer.token())?;

        let user = storage
            .find_single_user_by_id(&claims.sub)
            .await
            .map_err(|_| Error::forbidden("Could not find user"))?
            .ok_or_else(|| Error::forbidden("Could not find user"))?;

        // a new session ID invalidates all earlier tokens
        if claims.jti != user.session_id {
            return Err(Error::forbidden("Token expired"));
        }

        Ok(CurrentUser {
            user: Arc::new(user),
        })
    }
}
