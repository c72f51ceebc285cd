//! JWT (JSON Web Token) issuing and verification.

use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use courier_config::AuthConfig;

use crate::types::{TokenError, TokenResult};

/// JWT claims structure
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String, // Subject (user public ID)
    pub exp: usize,  // Expiration time
    pub iat: usize,  // Issued at
    pub iss: String, // Issuer
    pub aud: String, // Audience
}

/// Verifies bearer tokens and issues them for local tooling.
pub struct TokenVerifier {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
    token_duration: Duration,
}

impl TokenVerifier {
    /// Create a new token verifier
    pub fn new(secret: &str, issuer: String, audience: String) -> Self {
        let encoding_key = EncodingKey::from_secret(secret.as_ref());
        let decoding_key = DecodingKey::from_secret(secret.as_ref());

        Self {
            encoding_key,
            decoding_key,
            issuer,
            audience,
            token_duration: Duration::from_secs(24 * 60 * 60), // 24 hours default
        }
    }

    /// Build a verifier from the auth section of the app config
    pub fn from_config(config: &AuthConfig) -> Self {
        Self::new(
            &config.jwt_secret,
            config.jwt_issuer.clone(),
            config.jwt_audience.clone(),
        )
    }

    /// Set custom token duration
    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.token_duration = duration;
        self
    }

    /// Generate a new JWT token for the given subject
    pub fn generate_token(&self, subject: &str) -> TokenResult<String> {
        let now = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .map_err(|_| TokenError::TokenCreationFailed("System time error".to_string()))?;

        let exp = now + self.token_duration;

        let claims = Claims {
            sub: subject.to_string(),
            exp: exp.as_secs() as usize,
            iat: now.as_secs() as usize,
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|_| TokenError::TokenCreationFailed("Failed to encode token".to_string()))
    }

    /// Validate and decode a JWT token
    pub fn verify_token(&self, token: &str) -> TokenResult<Claims> {
        let mut validation = Validation::new(jsonwebtoken::Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(token, &self.decoding_key, &validation)
            .map_err(|err| TokenError::InvalidToken(format!("Token validation failed: {}", err)))?;

        Ok(token_data.claims)
    }
}
