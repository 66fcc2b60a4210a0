use crate::error::{AppError, AppResult};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use serde::{Deserialize, Serialize};

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String, // admin_id
    pub username: String,
    pub exp: i64,
    pub iat: i64,
}

/// 请求级别的登录上下文，由会话中间件写入 request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAdmin {
    pub id: i32,
    pub username: String,
}

#[derive(Clone)]
pub struct SessionService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expires_in: i64,
    cookie_name: String,
}

impl SessionService {
    pub fn new(secret: &str, expires_in: i64, cookie_name: &str) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            expires_in,
            cookie_name: cookie_name.to_string(),
        }
    }

    pub fn issue(&self, admin_id: i32, username: &str) -> AppResult<String> {
        let now = Utc::now();
        let exp = now + Duration::seconds(self.expires_in);

        let claims = Claims {
            sub: admin_id.to_string(),
            username: username.to_string(),
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::default(), &claims, &self.encoding_key).map_err(AppError::JwtError)
    }

    pub fn verify(&self, token: &str) -> AppResult<AuthenticatedAdmin> {
        let validation = Validation::new(Algorithm::HS256);
        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(AppError::JwtError)?;

        let id = claims
            .sub
            .parse::<i32>()
            .map_err(|_| AppError::AuthError("Invalid session subject".to_string()))?;

        Ok(AuthenticatedAdmin {
            id,
            username: claims.username,
        })
    }

    pub fn expires_in(&self) -> i64 {
        self.expires_in
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }
}
