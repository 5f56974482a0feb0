use chrono::{ DateTime, TimeZone, Utc };
use jsonwebtoken::{ decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation };
use serde::{ Deserialize, Serialize };

use crate::error::{ AppError, Result };

const ISSUER: &str = "launchpad";

/// Claims carried by a session token. `sub` is the lower-case wallet address.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: u64,
    pub exp: u64,
    pub iss: String,
}

impl Claims {
    pub fn expires_at(&self) -> DateTime<Utc> {
        Utc.timestamp_opt(self.exp as i64, 0).single().unwrap_or_else(Utc::now)
    }
}

/// Issues and validates HS256 bearer tokens.
#[derive(Clone)]
pub struct JwtManager {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_secs: u64,
}

impl JwtManager {
    pub fn new(secret: &str, expiry_secs: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expiry_secs,
        }
    }

    pub fn issue(&self, address: &str) -> Result<(String, Claims)> {
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: address.to_lowercase(),
            iat: now,
            exp: now + self.expiry_secs,
            iss: ISSUER.to_string(),
        };

        let token = self.sign(&claims)?;
        Ok((token, claims))
    }

    fn sign(&self, claims: &Claims) -> Result<String> {
        encode(&Header::new(Algorithm::HS256), claims, &self.encoding_key).map_err(|e|
            AppError::Internal(format!("Failed to sign token: {}", e))
        )
    }

    pub fn validate(&self, token: &str) -> Result<Claims> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[ISSUER]);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!(error = %e, "JWT validation failed");
                AppError::Unauthorized("Invalid or expired token".to_string())
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SECRET: &str = "test-secret-key-for-testing-only-0000";

    #[test]
    fn test_issue_and_validate() {
        let manager = JwtManager::new(SECRET, 3600);
        let (token, claims) = manager
            .issue("0x742d35Cc6634C0532925a3b844Bc9e7595f0bEb0")
            .unwrap();

        let validated = manager.validate(&token).unwrap();
        assert_eq!(validated.sub, "0x742d35cc6634c0532925a3b844bc9e7595f0beb0");
        assert_eq!(validated.exp, claims.exp);
    }

    #[test]
    fn test_rejects_other_secret() {
        let issuer = JwtManager::new(SECRET, 3600);
        let other = JwtManager::new("another-secret-key-for-testing-0000", 3600);
        let (token, _) = issuer.issue("0xabc").unwrap();

        assert!(matches!(other.validate(&token), Err(AppError::Unauthorized(_))));
    }

    #[test]
    fn test_rejects_expired_token() {
        let manager = JwtManager::new(SECRET, 3600);
        let now = Utc::now().timestamp() as u64;
        let claims = Claims {
            sub: "0xabc".to_string(),
            iat: now - 7200,
            exp: now - 3600,
            iss: ISSUER.to_string(),
        };
        let token = manager.sign(&claims).unwrap();

        assert!(manager.validate(&token).is_err());
    }
}
