use crate::{
    AppData,
    structs::{User, UserRole},
};
use actix_web::{
    Error, FromRequest, HttpRequest, ResponseError, dev::Payload, http::StatusCode, web,
};
use chrono::Utc;
use futures::future::{Ready, ready};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use thiserror::Error;

pub const TOKEN_COOKIE: &str = "token";

const TOKEN_LIFETIME_SECS: i64 = 3600 * 12;

#[derive(Debug, Error)]
pub enum JwtError {
    #[error("JWT secret not set")]
    SecretNotSet,
    #[error("Error calculating expiration time")]
    ExpirationError,
    #[error("Error encoding the JWT")]
    JwtEncodingError,
    #[error("Error decoding the JWT")]
    JwtDecodingError,
    #[error("JWT has expired")]
    JwtExpired,
    #[error("Token not found in request")]
    TokenNotFound,
}

impl ResponseError for JwtError {
    fn status_code(&self) -> StatusCode {
        match self {
            JwtError::TokenNotFound | JwtError::JwtExpired | JwtError::JwtDecodingError => {
                StatusCode::UNAUTHORIZED
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(serde::Serialize, serde::Deserialize, Debug, Clone)]
pub struct Claims {
    pub sub: i64,
    pub name: String,
    pub usertype: UserRole,
    pub exp: usize,
}

impl Claims {
    #[must_use]
    pub fn role(&self) -> UserRole {
        self.usertype
    }
}

fn now() -> Result<usize, JwtError> {
    usize::try_from(Utc::now().timestamp()).map_err(|_| JwtError::ExpirationError)
}

/// Issues a token valid for twelve hours.
///
/// # Errors
///
/// Fails when `secret` is empty or the token cannot be encoded.
pub fn create_jwt(user: &User, secret: &str) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::SecretNotSet);
    }

    let expiration = Utc::now()
        .timestamp()
        .checked_add(TOKEN_LIFETIME_SECS)
        .and_then(|exp| usize::try_from(exp).ok())
        .ok_or(JwtError::ExpirationError)?;

    let claims = Claims {
        sub: user.id,
        name: user.name.clone(),
        usertype: user.usertype,
        exp: expiration,
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| JwtError::JwtEncodingError)
}

/// # Errors
///
/// Fails when `secret` is empty, or the token is malformed, badly signed
/// or expired.
pub fn decode_jwt(token: &str, secret: &str) -> Result<Claims, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::SecretNotSet);
    }

    let decoding_key = DecodingKey::from_secret(secret.as_bytes());
    let token_data = decode::<Claims>(token, &decoding_key, &Validation::default())
        .map_err(|err| match err.kind() {
            jsonwebtoken::errors::ErrorKind::ExpiredSignature => JwtError::JwtExpired,
            _ => JwtError::JwtDecodingError,
        })?;

    if token_data.claims.exp < now()? {
        return Err(JwtError::JwtExpired);
    }

    Ok(token_data.claims)
}

/// Reads the claims from the `token` cookie, using the secret in `AppData`.
///
/// # Errors
///
/// Fails when the cookie is missing or its token does not decode.
pub fn read_jwt(req: &HttpRequest) -> Result<Claims, JwtError> {
    let cookie = req.cookie(TOKEN_COOKIE).ok_or(JwtError::TokenNotFound)?;

    let data = req
        .app_data::<web::Data<AppData>>()
        .ok_or(JwtError::SecretNotSet)?;

    decode_jwt(cookie.value(), &data.jwt_secret)
}

/// The authenticated user of the current request.
///
/// Take `Option<AuthUser>` to accept anonymous requests as well.
#[derive(Debug)]
pub struct AuthUser {
    pub claims: Claims,
}

impl FromRequest for AuthUser {
    type Error = Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        let result = read_jwt(req)
            .map(|claims| AuthUser { claims })
            .map_err(Error::from);

        ready(result)
    }
}
