//! 会话令牌服务
//!
//! HS256 签名的会话令牌，固定 7 天有效期，不支持刷新。
//! 令牌同时通过 Authorization 头和 HttpOnly Cookie 两种途径传递。

use chrono::{Duration, Utc};
use http::HeaderMap;
use http::header::{AUTHORIZATION, COOKIE};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use ring::rand::{SecureRandom, SystemRandom};
use serde::{Deserialize, Serialize};
use shared::error::AppError;
use thiserror::Error;

/// 会话 Cookie 名称
pub const SESSION_COOKIE: &str = "admin_session";

/// 会话有效期（天），固定值，签发后不可延长
pub const SESSION_TTL_DAYS: i64 = 7;

/// 会话配置
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// 签名密钥（至少 32 字节）
    pub secret: String,
    /// 令牌签发者
    pub issuer: String,
    /// 令牌受众
    pub audience: String,
}

/// 存储在令牌中的会话 Claims
///
/// 角色信息仅作参考；每次请求都按 `sub` 重新查库解析，
/// 角色或能力变更在下一次请求即生效。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    /// 账户 ID (Subject)
    pub sub: String,
    /// 账户邮箱
    pub email: String,
    /// 签发时的角色 slug
    pub role_slug: String,
    /// 签发时的角色 id；角色引用悬空时为空
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role_id: Option<String>,
    /// 过期时间戳
    pub exp: i64,
    /// 签发时间戳
    pub iat: i64,
    /// 签发者
    pub iss: String,
    /// 受众
    pub aud: String,
}

/// 会话错误
#[derive(Error, Debug)]
pub enum SessionError {
    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token expired")]
    ExpiredToken,

    #[error("Invalid signature")]
    InvalidSignature,

    #[error("Token generation failed: {0}")]
    GenerationFailed(String),

    #[error("Key generation failed")]
    KeyGenerationFailed,
}

impl From<SessionError> for AppError {
    fn from(err: SessionError) -> Self {
        match err {
            SessionError::ExpiredToken => AppError::token_expired(),
            SessionError::InvalidToken(_) | SessionError::InvalidSignature => {
                AppError::invalid_token("Invalid token")
            }
            SessionError::GenerationFailed(msg) => AppError::internal(msg),
            SessionError::KeyGenerationFailed => {
                AppError::internal("Key generation failed")
            }
        }
    }
}

/// 生成可打印的会话密钥（64 字符），用于配置提示
pub fn generate_session_secret() -> Result<String, SessionError> {
    let allowed_chars =
        "ABCDEFGHIJKLMNOPQRSTUVWXYZabcdefghijklmnopqrstuvwxyz0123456789!@#$%^&*()-_=+";

    let rng = SystemRandom::new();
    let mut key = String::with_capacity(64);

    for _ in 0..64 {
        let mut byte = [0u8; 1];
        rng.fill(&mut byte)
            .map_err(|_| SessionError::KeyGenerationFailed)?;
        let idx = (byte[0] as usize) % allowed_chars.len();
        key.push(allowed_chars.as_bytes()[idx] as char);
    }

    Ok(key)
}

/// 会话令牌服务
#[derive(Clone)]
pub struct SessionService {
    config: SessionConfig,
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
}

impl SessionService {
    pub fn new(config: SessionConfig) -> Self {
        let encoding_key = EncodingKey::from_secret(config.secret.as_bytes());
        let decoding_key = DecodingKey::from_secret(config.secret.as_bytes());

        Self {
            config,
            encoding_key,
            decoding_key,
        }
    }

    /// 为账户签发会话令牌
    pub fn issue(
        &self,
        admin_id: &str,
        email: &str,
        role_slug: &str,
        role_id: Option<&str>,
    ) -> Result<String, SessionError> {
        self.issue_with_lifetime(
            admin_id,
            email,
            role_slug,
            role_id,
            Duration::days(SESSION_TTL_DAYS),
        )
    }

    fn issue_with_lifetime(
        &self,
        admin_id: &str,
        email: &str,
        role_slug: &str,
        role_id: Option<&str>,
        lifetime: Duration,
    ) -> Result<String, SessionError> {
        let now = Utc::now();
        let expiration = now + lifetime;

        let claims = SessionClaims {
            sub: admin_id.to_string(),
            email: email.to_string(),
            role_slug: role_slug.to_string(),
            role_id: role_id.map(str::to_string),
            exp: expiration.timestamp(),
            iat: now.timestamp(),
            iss: self.config.issuer.clone(),
            aud: self.config.audience.clone(),
        };

        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| SessionError::GenerationFailed(e.to_string()))
    }

    /// 验证并解码令牌
    pub fn validate(&self, token: &str) -> Result<SessionClaims, SessionError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&[&self.config.audience]);
        validation.set_issuer(&[&self.config.issuer]);
        validation.set_required_spec_claims(&["sub", "exp", "iat", "iss", "aud"]);

        let token_data =
            decode::<SessionClaims>(token, &self.decoding_key, &validation).map_err(|e| {
                match e.kind() {
                    ErrorKind::ExpiredSignature => SessionError::ExpiredToken,
                    ErrorKind::InvalidSignature => SessionError::InvalidSignature,
                    ErrorKind::InvalidToken => SessionError::InvalidToken(e.to_string()),
                    _ => SessionError::InvalidToken(format!("Token validation failed: {}", e)),
                }
            })?;

        Ok(token_data.claims)
    }

    /// 构造会话 Cookie (HttpOnly, SameSite=Lax)
    pub fn session_cookie(&self, token: &str) -> String {
        format!(
            "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
            SESSION_COOKIE,
            token,
            SESSION_TTL_DAYS * 86400
        )
    }

    /// 构造登出用的过期 Cookie
    pub fn expired_cookie(&self) -> String {
        format!(
            "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
            SESSION_COOKIE
        )
    }
}

/// 从 Authorization 头提取令牌
pub fn extract_bearer(header: &str) -> Option<&str> {
    header.strip_prefix("Bearer ")
}

/// 从请求头提取会话令牌：Authorization 优先，Cookie 兜底
pub fn token_from_headers(headers: &HeaderMap) -> Option<String> {
    if let Some(auth) = headers.get(AUTHORIZATION)
        && let Ok(value) = auth.to_str()
        && let Some(token) = extract_bearer(value)
    {
        return Some(token.to_string());
    }

    let cookies = headers.get(COOKIE)?.to_str().ok()?;
    cookies.split(';').find_map(|pair| {
        let (name, value) = pair.trim().split_once('=')?;
        if name == SESSION_COOKIE && !value.is_empty() {
            Some(value.to_string())
        } else {
            None
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use http::HeaderValue;

    fn test_service() -> SessionService {
        SessionService::new(SessionConfig {
            secret: "test-secret-at-least-32-characters!!".to_string(),
            issuer: "cityhop-admin".to_string(),
            audience: "cityhop-admin-ui".to_string(),
        })
    }

    #[test]
    fn test_issue_and_validate() {
        let service = test_service();
        let token = service
            .issue("admin:abc", "ops@example.com", "super-admin", Some("role:alpha"))
            .unwrap();
        let claims = service.validate(&token).unwrap();

        assert_eq!(claims.sub, "admin:abc");
        assert_eq!(claims.email, "ops@example.com");
        assert_eq!(claims.role_slug, "super-admin");
        assert_eq!(claims.role_id.as_deref(), Some("role:alpha"));
        assert_eq!(claims.iss, "cityhop-admin");
        assert_eq!(claims.aud, "cityhop-admin-ui");
        assert_eq!(claims.exp - claims.iat, SESSION_TTL_DAYS * 86400);
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = test_service();
        let token = service
            .issue_with_lifetime(
                "admin:abc",
                "ops@example.com",
                "viewer",
                None,
                Duration::days(-1),
            )
            .unwrap();
        match service.validate(&token) {
            Err(SessionError::ExpiredToken) => {}
            other => panic!("expected ExpiredToken, got {:?}", other.map(|c| c.sub)),
        }
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let service = test_service();
        let other = SessionService::new(SessionConfig {
            secret: "a-different-secret-also-32-chars-long!!".to_string(),
            issuer: "cityhop-admin".to_string(),
            audience: "cityhop-admin-ui".to_string(),
        });

        let token = service
            .issue("admin:abc", "ops@example.com", "viewer", None)
            .unwrap();
        assert!(matches!(
            other.validate(&token),
            Err(SessionError::InvalidSignature)
        ));
    }

    #[test]
    fn test_wrong_audience_rejected() {
        let service = test_service();
        let other = SessionService::new(SessionConfig {
            secret: "test-secret-at-least-32-characters!!".to_string(),
            issuer: "cityhop-admin".to_string(),
            audience: "someone-else".to_string(),
        });

        let token = service
            .issue("admin:abc", "ops@example.com", "viewer", None)
            .unwrap();
        assert!(other.validate(&token).is_err());
    }

    #[test]
    fn test_extract_bearer() {
        assert_eq!(extract_bearer("Bearer abc123"), Some("abc123"));
        assert_eq!(extract_bearer("bearer abc123"), None);
        assert_eq!(extract_bearer("abc123"), None);
    }

    #[test]
    fn test_token_from_authorization_header() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        assert_eq!(token_from_headers(&headers), Some("tok-1".to_string()));
    }

    #[test]
    fn test_token_from_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(
            COOKIE,
            HeaderValue::from_static("theme=dark; admin_session=tok-2; lang=en"),
        );
        assert_eq!(token_from_headers(&headers), Some("tok-2".to_string()));
    }

    #[test]
    fn test_authorization_takes_priority_over_cookie() {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static("Bearer tok-1"));
        headers.insert(COOKIE, HeaderValue::from_static("admin_session=tok-2"));
        assert_eq!(token_from_headers(&headers), Some("tok-1".to_string()));
    }

    #[test]
    fn test_cookie_strings() {
        let service = test_service();
        let cookie = service.session_cookie("tok");
        assert!(cookie.starts_with("admin_session=tok;"));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("Max-Age=604800"));

        let expired = service.expired_cookie();
        assert!(expired.contains("Max-Age=0"));
    }

    #[test]
    fn test_generated_secret_is_printable() {
        let secret = generate_session_secret().unwrap();
        assert_eq!(secret.len(), 64);
        assert!(secret.chars().all(|c| c.is_ascii_graphic()));
    }
}
