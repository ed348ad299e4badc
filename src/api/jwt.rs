use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Global cached JwtService instance
static JWT_SERVICE: OnceLock<JwtService> = OnceLock::new();

const ACCESS_TOKEN_TYPE: &str = "access";
const REFRESH_TOKEN_TYPE: &str = "refresh";

/// Get the cached JwtService instance
///
/// The service is initialized once on first use and reused for all subsequent requests.
pub fn get_jwt_service() -> &'static JwtService {
    JWT_SERVICE.get_or_init(JwtService::from_config)
}

/// Token claims; `sub` carries the user id
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub jti: String,
    pub token_type: String,
}

impl Claims {
    pub fn user_id(&self) -> Result<i64, jsonwebtoken::errors::Error> {
        self.sub.parse().map_err(|_| {
            jsonwebtoken::errors::Error::from(jsonwebtoken::errors::ErrorKind::InvalidSubject)
        })
    }
}

/// JWT Service for generating and validating tokens
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    access_token_minutes: u64,
    refresh_token_days: u64,
}

impl JwtService {
    pub fn new(secret: &str, access_token_minutes: u64, refresh_token_days: u64) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            access_token_minutes,
            refresh_token_days,
        }
    }

    /// Create JwtService from config
    pub fn from_config() -> Self {
        let config = crate::config::get_config();

        // 获取 JWT secret，如果为空则生成一个安全的随机值
        let jwt_secret = Some(config.auth.jwt_secret.clone())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| {
                use tracing::warn;
                warn!(
                    "JWT secret not configured or empty, generating secure random token. \
                     Issued tokens will not survive a restart."
                );
                crate::utils::generate_secure_token(32)
            });

        Self::new(
            &jwt_secret,
            config.auth.access_token_minutes,
            config.auth.refresh_token_days,
        )
    }

    /// Access token lifetime in seconds
    pub fn access_token_seconds(&self) -> u64 {
        self.access_token_minutes * 60
    }

    fn generate(
        &self,
        user_id: i64,
        lifetime: Duration,
        token_type: &str,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id.to_string(),
            iat: now.timestamp(),
            exp: (now + lifetime).timestamp(),
            jti: uuid::Uuid::new_v4().to_string(),
            token_type: token_type.to_string(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
    }

    /// Generate Access Token (short-lived)
    pub fn generate_access_token(&self, user_id: i64) -> Result<String, jsonwebtoken::errors::Error> {
        self.generate(
            user_id,
            Duration::minutes(self.access_token_minutes as i64),
            ACCESS_TOKEN_TYPE,
        )
    }

    /// Generate Refresh Token (long-lived)
    pub fn generate_refresh_token(
        &self,
        user_id: i64,
    ) -> Result<String, jsonwebtoken::errors::Error> {
        self.generate(
            user_id,
            Duration::days(self.refresh_token_days as i64),
            REFRESH_TOKEN_TYPE,
        )
    }

    fn validate(
        &self,
        token: &str,
        token_type: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        let token_data = decode::<Claims>(token, &self.decoding_key, &Validation::default())?;

        // Verify token type
        if token_data.claims.token_type != token_type {
            return Err(jsonwebtoken::errors::Error::from(
                jsonwebtoken::errors::ErrorKind::InvalidToken,
            ));
        }

        Ok(token_data.claims)
    }

    /// Validate Access Token
    pub fn validate_access_token(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        self.validate(token, ACCESS_TOKEN_TYPE)
    }

    /// Validate Refresh Token
    pub fn validate_refresh_token(
        &self,
        token: &str,
    ) -> Result<Claims, jsonwebtoken::errors::Error> {
        self.validate(token, REFRESH_TOKEN_TYPE)
    }
}
