//! CityHop Admin Server - 出租车预订站点管理后台
//!
//! # 架构概述
//!
//! 本模块是管理后台的主入口，提供以下核心功能：
//!
//! - **认证** (`auth`): 会话令牌 + Argon2 认证，能力矩阵授权
//! - **审计** (`audit`): 变更差异快照、查询与 CSV 导出
//! - **数据库** (`db`): 嵌入式 SurrealDB 存储
//! - **HTTP API** (`api`): RESTful API 接口
//!
//! # 模块结构
//!
//! ```text
//! admin-server/src/
//! ├── core/          # 配置、状态、服务器
//! ├── auth/          # 会话、能力、认证引擎
//! ├── audit/         # 审计日志
//! ├── api/           # HTTP 路由和处理器
//! ├── db/            # 数据库层
//! └── utils/         # 工具函数
//! ```

pub mod api;
pub mod audit;
pub mod auth;
pub mod core;
pub mod db;
pub mod utils;

// Re-export 公共类型
pub use auth::{Capability, CapabilitySet, CurrentActor, SessionService};
pub use crate::core::{Config, Server, ServerState};
pub use utils::{AppError, AppResult};

// Re-export unified error types from shared
pub use utils::{ApiResponse, ErrorCategory, ErrorCode};

// Re-export logger functions
pub use utils::logger::{init_logger, init_logger_with_file};

// Security logging macro - 支持 tracing 格式说明符
#[macro_export]
macro_rules! security_log {
    ($level:expr, $event:expr, $($key:ident = $value:expr),*) => {
        tracing::info!(
            target: "security",
            level = $level,
            event = $event,
            $($key = $value),*
        );
    };
}

pub fn print_banner() {
    println!(
        r#"
   ______ _  __          __  __
  / ____/(_)/ /_ __  __ / / / /____   ____
 / /    / // __// / / // /_/ // __ \ / __ \
/ /___ / // /_ / /_/ // __  // /_/ // /_/ /
\____//_/ \__/ \__, //_/ /_/ \____// .___/
              /____/              /_/
    "#
    );
}

/// 初始化运行环境 (dotenv + 日志)
///
/// 日志在配置加载之前初始化，LOG_LEVEL / LOG_DIR 直接读环境变量，
/// 这样配置错误本身也能被记录下来。
pub fn setup_environment() -> Result<(), AppError> {
    if let Err(e) = dotenv::dotenv()
        && !e.not_found()
    {
        return Err(AppError::config(format!("Failed to load .env: {}", e)));
    }

    let log_level = std::env::var("LOG_LEVEL").ok();
    let log_dir = std::env::var("LOG_DIR").ok();
    init_logger_with_file(log_level.as_deref(), log_dir.as_deref());

    Ok(())
}
