/// JWT validation for the blog service
///
/// Token issuance lives outside this service; requests carry a bearer token
/// signed with RS256 by the credential issuer, and this module only verifies
/// it against the issuer's public key.
///
/// The validation key is loaded once at startup and immutable afterwards.
use jsonwebtoken::{decode, Algorithm, DecodingKey, TokenData, Validation};
use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// JWT algorithm - RS256 only, no symmetric fallback
const JWT_ALGORITHM: Algorithm = Algorithm::RS256;

/// JWT claims structure - standard claims plus identity fields
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (user ID as UUID string)
    pub sub: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Token type: "access" or "refresh"
    pub token_type: String,
    /// Email address
    pub email: String,
    /// Username (display name)
    pub username: String,
}

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("JWT validation key not initialized")]
    KeysNotInitialized,

    #[error("token is not an access token")]
    WrongTokenType,

    #[error("token validation failed: {0}")]
    Jwt(#[from] jsonwebtoken::errors::Error),
}

/// Thread-safe global storage for the validation key
static JWT_DECODING_KEY: OnceCell<DecodingKey> = OnceCell::new();

/// Initialize the validation key from a PEM-formatted RSA public key.
///
/// Must be called during startup before any token validation. Subsequent
/// calls are ignored.
pub fn initialize_validation_key(public_key_pem: &str) -> Result<(), AuthError> {
    let key = DecodingKey::from_rsa_pem(public_key_pem.as_bytes())?;
    let _ = JWT_DECODING_KEY.set(key);
    Ok(())
}

/// Validate a bearer token and return its claims.
///
/// Rejects expired tokens, tokens signed with any algorithm other than
/// RS256, and refresh tokens presented in place of access tokens.
pub fn validate_token(token: &str) -> Result<TokenData<Claims>, AuthError> {
    let key = JWT_DECODING_KEY
        .get()
        .ok_or(AuthError::KeysNotInitialized)?;

    let mut validation = Validation::new(JWT_ALGORITHM);
    validation.validate_exp = true;

    let data = decode::<Claims>(token, key, &validation)?;

    if data.claims.token_type != "access" {
        return Err(AuthError::WrongTokenType);
    }

    Ok(data)
}
