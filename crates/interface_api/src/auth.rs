//! Authentication and authorization
//!
//! Bearer tokens are HS256 JWTs issued by the identity provider. The token's
//! subject, email and name become the [`SessionContext`] passed into intake and
//! review calls.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use core_kernel::SessionContext;

/// JWT claims
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenClaims {
    /// Subject (user ID)
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    /// User's roles
    #[serde(default)]
    pub roles: Vec<String>,
    /// Expiration timestamp
    pub exp: i64,
    /// Issued at timestamp
    pub iat: i64,
}

impl TokenClaims {
    /// Session of the user this token was issued to
    pub fn session(&self) -> SessionContext {
        let mut session = SessionContext::new(self.sub.as_str());
        session.email = self.email.clone();
        session.display_name = self.name.clone();
        session
    }
}

/// Auth errors
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid token")]
    InvalidToken,
    #[error("Token expired")]
    TokenExpired,
    #[error("Missing permission: {0}")]
    MissingPermission(String),
}

/// Creates a new JWT token for a session
///
/// # Arguments
///
/// * `session` - The user the token identifies
/// * `roles` - User's roles
/// * `secret` - JWT secret key
/// * `expiration_secs` - Token validity in seconds
pub fn create_token(
    session: &SessionContext,
    roles: Vec<String>,
    secret: &str,
    expiration_secs: u64,
) -> Result<String, AuthError> {
    let now = Utc::now();
    let exp = now + Duration::seconds(expiration_secs as i64);

    let claims = TokenClaims {
        sub: session.uid.to_string(),
        email: session.email.clone(),
        name: session.display_name.clone(),
        roles,
        exp: exp.timestamp(),
        iat: now.timestamp(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|_| AuthError::InvalidToken)
}

/// Validates a JWT token
pub fn validate_token(token: &str, secret: &str) -> Result<TokenClaims, AuthError> {
    let token_data = decode::<TokenClaims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map_err(|e| match e.kind() {
        ErrorKind::ExpiredSignature => AuthError::TokenExpired,
        _ => AuthError::InvalidToken,
    })?;

    Ok(token_data.claims)
}

/// Checks if user has required role
pub fn has_role(claims: &TokenClaims, required_role: &str) -> bool {
    claims.roles.iter().any(|r| r == required_role || r == "admin")
}

/// Fails with `MissingPermission` unless the user has `required_role`
pub fn require_role(claims: &TokenClaims, required_role: &str) -> Result<(), AuthError> {
    if has_role(claims, required_role) {
        Ok(())
    } else {
        Err(AuthError::MissingPermission(required_role.to_string()))
    }
}

/// Permission definitions
pub mod permissions {
    pub const CLAIM_READ: &str = "claim:read";
    pub const CLAIM_SUBMIT: &str = "claim:submit";
    pub const CLAIM_REVIEW: &str = "claim:review";
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret";

    fn reviewer() -> SessionContext {
        SessionContext::new("u-7")
            .with_email("reviewer@insurer.example")
            .with_display_name("Riley Reviewer")
    }

    #[test]
    fn test_round_trip_preserves_session() {
        let token = create_token(&reviewer(), vec![permissions::CLAIM_REVIEW.into()], SECRET, 60).unwrap();
        let claims = validate_token(&token, SECRET).unwrap();
        assert_eq!(claims.session(), reviewer());
        assert!(has_role(&claims, permissions::CLAIM_REVIEW));
        assert!(require_role(&claims, permissions::CLAIM_SUBMIT).is_err());
    }

    #[test]
    fn test_wrong_secret_is_invalid() {
        let token = create_token(&reviewer(), vec![], SECRET, 60).unwrap();
        assert!(matches!(validate_token(&token, "other"), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn test_admin_has_every_role() {
        let claims = TokenClaims {
            sub: "root".into(),
            email: None,
            name: None,
            roles: vec!["admin".into()],
            exp: 0,
            iat: 0,
        };
        assert!(has_role(&claims, permissions::CLAIM_REVIEW));
    }
}
