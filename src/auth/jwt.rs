//! JWT token validation
//! 令牌由统一认证服务签发，这里只负责校验并解析调用者身份

use crate::{config::AppConfig, error::AppError};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// JWT claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    /// Subject (numeric user ID)
    pub sub: String,

    /// Username
    pub username: String,

    /// User roles
    #[serde(default)]
    pub roles: Vec<String>,

    /// Issued at
    pub iat: i64,

    /// Expiration
    pub exp: i64,

    /// JWT ID (unique token identifier)
    pub jti: String,
}

/// JWT service
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl JwtService {
    /// Create JWT service from config
    pub fn from_config(config: &AppConfig) -> Result<Self, AppError> {
        let secret = config.security.jwt_secret.expose_secret();

        // Ensure secret is at least 32 bytes for HS256
        if secret.len() < 32 {
            return Err(AppError::Config("JWT secret too short (min 32 chars)".to_string()));
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
        })
    }

    /// Issue an access token (used by tooling and tests)
    pub fn generate_access_token(
        &self,
        user_id: i64,
        username: &str,
        roles: Vec<String>,
        ttl_secs: i64,
    ) -> Result<String, AppError> {
        let now = Utc::now();
        let expiration = now + Duration::seconds(ttl_secs);

        let claims = Claims {
            sub: user_id.to_string(),
            username: username.to_string(),
            roles,
            iat: now.timestamp(),
            exp: expiration.timestamp(),
            jti: Uuid::new_v4().to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(|e| {
            tracing::error!("Failed to encode access token: {:?}", e);
            AppError::Internal(format!("Failed to encode access token: {}", e))
        })
    }

    /// Validate and decode token
    pub fn validate_token(&self, token: &str) -> Result<Claims, AppError> {
        let validation = Validation::new(Algorithm::HS256);

        decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::debug!("Token validation failed: {}", e);
                AppError::Unauthorized
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{
        DatabaseConfig, LoggingConfig, PaginationConfig, SecurityConfig, ServerConfig,
    };
    use secrecy::Secret;

    fn config_with_secret(secret: &str) -> AppConfig {
        AppConfig {
            server: ServerConfig {
                addr: "127.0.0.1:0".to_string(),
                graceful_shutdown_timeout_secs: 1,
                body_limit_bytes: 1024,
            },
            database: DatabaseConfig {
                url: Secret::new("postgresql://localhost/test".to_string()),
                max_connections: 1,
                min_connections: 1,
                acquire_timeout_secs: 1,
                idle_timeout_secs: 1,
                max_lifetime_secs: 1,
            },
            logging: LoggingConfig {
                level: "debug".to_string(),
                format: "pretty".to_string(),
            },
            security: SecurityConfig {
                jwt_secret: Secret::new(secret.to_string()),
                admin_role: "admin".to_string(),
            },
            pagination: PaginationConfig::default(),
        }
    }

    #[test]
    fn test_round_trip_claims() {
        let service =
            JwtService::from_config(&config_with_secret("test-secret-key-for-testing-only-min-32"))
                .unwrap();

        let token = service
            .generate_access_token(42, "alice", vec!["admin".to_string()], 300)
            .unwrap();
        let claims = service.validate_token(&token).unwrap();

        assert_eq!(claims.sub, "42");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.roles, vec!["admin".to_string()]);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service =
            JwtService::from_config(&config_with_secret("test-secret-key-for-testing-only-min-32"))
                .unwrap();

        // 超过默认 60 秒的 leeway
        let token = service.generate_access_token(1, "bob", vec![], -3600).unwrap();
        assert!(matches!(service.validate_token(&token), Err(AppError::Unauthorized)));
    }

    #[test]
    fn test_foreign_signature_rejected() {
        let ours =
            JwtService::from_config(&config_with_secret("test-secret-key-for-testing-only-min-32"))
                .unwrap();
        let theirs =
            JwtService::from_config(&config_with_secret("another-secret-key-for-testing-min-32"))
                .unwrap();

        let token = theirs.generate_access_token(1, "bob", vec![], 300).unwrap();
        assert!(ours.validate_token(&token).is_err());
    }

    #[test]
    fn test_short_secret_rejected() {
        assert!(JwtService::from_config(&config_with_secret("short")).is_err());
    }
}
