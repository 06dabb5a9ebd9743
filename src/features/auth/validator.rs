use std::time::Duration;

use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::model::AuthenticatedUser;
use crate::core::error::AppError;

/// Validates HS256 access tokens signed with the shared secret
pub struct JwtValidator {
    decoding_key: DecodingKey,
    leeway: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub email: String,
    pub exp: u64,
}

impl JwtValidator {
    pub fn new(secret: &str, leeway: Duration) -> Self {
        Self {
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            leeway: leeway.as_secs(),
        }
    }

    pub fn validate_token(&self, token: &str) -> Result<AuthenticatedUser, AppError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.leeway = self.leeway;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|e| AppError::Auth(e.to_string()))?;

        let claims = token_data.claims;
        let user_id = Uuid::parse_str(&claims.sub)
            .map_err(|_| AppError::Auth("Token subject is not a valid user ID".to_string()))?;

        Ok(AuthenticatedUser {
            user_id,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};

    const SECRET: &str = "test-secret";

    fn token(sub: &str, exp: u64, secret: &str) -> String {
        let claims = Claims {
            sub: sub.to_string(),
            email: "agent@example.com".to_string(),
            exp,
        };
        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(secret.as_bytes()),
        )
        .unwrap()
    }

    fn in_one_hour() -> u64 {
        (chrono::Utc::now().timestamp() + 3600) as u64
    }

    #[test]
    fn test_valid_token() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let id = Uuid::new_v4();

        let user = validator
            .validate_token(&token(&id.to_string(), in_one_hour(), SECRET))
            .unwrap();

        assert_eq!(user.user_id, id);
        assert_eq!(user.email, "agent@example.com");
    }

    #[test]
    fn test_rejects_wrong_secret_and_expired_token() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let id = Uuid::new_v4().to_string();

        let wrong_secret = token(&id, in_one_hour(), "other-secret");
        assert!(matches!(
            validator.validate_token(&wrong_secret),
            Err(AppError::Auth(_))
        ));

        let expired = token(&id, 1_000, SECRET);
        assert!(validator.validate_token(&expired).is_err());
    }

    #[test]
    fn test_rejects_non_uuid_subject() {
        let validator = JwtValidator::new(SECRET, Duration::from_secs(0));
        let result = validator.validate_token(&token("user-42", in_one_hour(), SECRET));
        assert!(result.is_err());
    }
}
