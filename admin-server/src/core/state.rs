use std::sync::Arc;

use surrealdb::Surreal;
use surrealdb::engine::local::Db;

use crate::audit::AuditRecorder;
use crate::auth::{AuthEngine, SessionService};
use crate::core::Config;
use crate::db::{DbService, bootstrap};
use crate::utils::AppError;

/// 服务器状态 - 持有所有服务的单例引用
///
/// ServerState 是管理后台的核心数据结构，持有所有服务的共享引用。
/// 克隆成本极低：数据库句柄与会话服务内部都是 Arc。
///
/// # 服务组件
///
/// | 字段 | 类型 | 说明 |
/// |------|------|------|
/// | config | Config | 配置项 (不可变) |
/// | db | Surreal<Db> | 嵌入式数据库 |
/// | sessions | Arc<SessionService> | 会话令牌签发与校验 |
/// | engine | AuthEngine | 认证与角色解析 |
/// | audit | AuditRecorder | 审计日志写入与查询 |
///
/// # 使用示例
///
/// ```ignore
/// // 获取数据库连接
/// let db = state.get_db();
///
/// // 校验会话令牌
/// let actor = state.get_engine().authenticate(&token).await?;
/// ```
#[derive(Clone)]
pub struct ServerState {
    /// 服务器配置
    pub config: Config,
    /// 嵌入式数据库 (SurrealDB)
    pub db: Surreal<Db>,
    /// 会话服务 (Arc 共享所有权)
    pub sessions: Arc<SessionService>,
    /// 认证引擎
    pub engine: AuthEngine,
    /// 审计记录器
    pub audit: AuditRecorder,
}

impl ServerState {
    /// 初始化服务器状态
    ///
    /// 按顺序初始化：
    /// 1. 数据库 (RocksDB 引擎, schema 与索引)
    /// 2. 种子数据 (内置角色 + 可选 root 账户)
    /// 3. 会话服务、认证引擎、审计记录器
    pub async fn initialize(config: &Config) -> Result<Self, AppError> {
        let db_service = DbService::new(&config.database_path).await?;

        bootstrap::seed(&db_service, config).await?;

        let sessions = Arc::new(SessionService::new(config.session_config()));
        let engine = AuthEngine::new(&db_service, sessions.clone());
        let audit = AuditRecorder::new(db_service.db());

        Ok(Self {
            config: config.clone(),
            db: db_service.db(),
            sessions,
            engine,
            audit,
        })
    }

    /// 获取数据库连接 (浅拷贝)
    pub fn get_db(&self) -> Surreal<Db> {
        self.db.clone()
    }

    /// 获取会话服务
    pub fn get_sessions(&self) -> Arc<SessionService> {
        self.sessions.clone()
    }

    /// 获取认证引擎
    pub fn get_engine(&self) -> AuthEngine {
        self.engine.clone()
    }

    /// 获取审计记录器
    pub fn get_audit(&self) -> AuditRecorder {
        self.audit.clone()
    }
}
