use crate::auth::session::{SessionConfig, generate_session_secret};
use shared::error::AppError;

/// 服务器配置
///
/// # 环境变量
///
/// | 环境变量 | 默认值 | 说明 |
/// |----------|--------|------|
/// | SESSION_SECRET | (必填) | 会话签名密钥，至少 32 字符 |
/// | DATABASE_PATH | (必填) | 嵌入式数据库目录 |
/// | HTTP_PORT | 3000 | HTTP 服务端口 |
/// | ENVIRONMENT | development | 运行环境 |
/// | SESSION_ISSUER | cityhop-admin | 令牌签发者 |
/// | SESSION_AUDIENCE | cityhop-admin-ui | 令牌受众 |
/// | ROOT_ADMIN_EMAIL | (可选) | 种子超管账户邮箱 |
/// | ROOT_ADMIN_PASSWORD | (可选) | 种子超管账户密码 |
///
/// # 示例
///
/// ```ignore
/// SESSION_SECRET=... DATABASE_PATH=/data/cityhop-admin HTTP_PORT=8080 cargo run
/// ```
#[derive(Debug, Clone)]
pub struct Config {
    /// 会话签名密钥
    pub session_secret: String,
    /// 嵌入式数据库目录
    pub database_path: String,
    /// HTTP API 服务端口
    pub http_port: u16,
    /// 运行环境: development | staging | production
    pub environment: String,
    /// 会话令牌签发者
    pub session_issuer: String,
    /// 会话令牌受众
    pub session_audience: String,
    /// 种子超管邮箱 (可选，与密码成对出现才生效)
    pub root_admin_email: Option<String>,
    /// 种子超管密码 (可选)
    pub root_admin_password: Option<String>,
}

impl Config {
    /// 从环境变量加载配置
    ///
    /// SESSION_SECRET 和 DATABASE_PATH 缺失时直接报错，启动必须失败。
    pub fn from_env() -> Result<Self, AppError> {
        let session_secret = match std::env::var("SESSION_SECRET") {
            Ok(secret) if secret.len() >= 32 => secret,
            Ok(_) => {
                return Err(AppError::config(
                    "SESSION_SECRET must be at least 32 characters long",
                ));
            }
            Err(_) => {
                let hint = generate_session_secret()
                    .map(|s| format!(" Generate one with e.g.: SESSION_SECRET={}", s))
                    .unwrap_or_default();
                return Err(AppError::config(format!(
                    "SESSION_SECRET environment variable must be set.{}",
                    hint
                )));
            }
        };

        let database_path = std::env::var("DATABASE_PATH").map_err(|_| {
            AppError::config("DATABASE_PATH environment variable must be set")
        })?;

        Ok(Self {
            session_secret,
            database_path,
            http_port: std::env::var("HTTP_PORT")
                .ok()
                .and_then(|p| p.parse().ok())
                .unwrap_or(3000),
            environment: std::env::var("ENVIRONMENT").unwrap_or_else(|_| "development".into()),
            session_issuer: std::env::var("SESSION_ISSUER")
                .unwrap_or_else(|_| "cityhop-admin".into()),
            session_audience: std::env::var("SESSION_AUDIENCE")
                .unwrap_or_else(|_| "cityhop-admin-ui".into()),
            root_admin_email: std::env::var("ROOT_ADMIN_EMAIL").ok(),
            root_admin_password: std::env::var("ROOT_ADMIN_PASSWORD").ok(),
        })
    }

    /// 使用自定义值构造配置，不读取环境变量
    ///
    /// 常用于测试场景
    pub fn with_overrides(
        database_path: impl Into<String>,
        http_port: u16,
        session_secret: impl Into<String>,
    ) -> Self {
        Self {
            session_secret: session_secret.into(),
            database_path: database_path.into(),
            http_port,
            environment: "test".to_string(),
            session_issuer: "cityhop-admin".to_string(),
            session_audience: "cityhop-admin-ui".to_string(),
            root_admin_email: None,
            root_admin_password: None,
        }
    }

    /// 构造会话服务配置
    pub fn session_config(&self) -> SessionConfig {
        SessionConfig {
            secret: self.session_secret.clone(),
            issuer: self.session_issuer.clone(),
            audience: self.session_audience.clone(),
        }
    }

    /// 是否生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }

    /// 是否开发环境
    pub fn is_development(&self) -> bool {
        self.environment == "development"
    }
}
