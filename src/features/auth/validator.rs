use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};

use super::model::{Claims, CurrentUser};
use crate::core::error::AppError;

/// Verifies HS256 access tokens signed with the shared secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    validation: Validation,
    default_user_id: i64,
}

impl JwtValidator {
    pub fn new(secret: &str, default_user_id: i64) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = 60;

        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
            default_user_id,
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<CurrentUser, AppError> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map_err(|e| AppError::Unauthorized(e.to_string()))?;

        let claims = token_data.claims;
        if claims.user_id <= 0 {
            return Err(AppError::Unauthorized("Invalid user id in token".to_string()));
        }

        Ok(CurrentUser {
            id: claims.user_id,
            username: claims.username,
        })
    }

    /// Resolves the caller from an optional `Authorization` header value.
    ///
    /// Anything other than a valid bearer token yields the default user.
    pub fn resolve(&self, authorization: Option<&str>) -> CurrentUser {
        let Some(token) = authorization.and_then(|h| h.strip_prefix("Bearer ")) else {
            return CurrentUser::guest(self.default_user_id);
        };

        match self.validate_token(token.trim()) {
            Ok(user) => user,
            Err(e) => {
                tracing::debug!("Ignoring invalid bearer token: {}", e);
                CurrentUser::guest(self.default_user_id)
            }
        }
    }
}
