//! 认证引擎
//!
//! 令牌校验、账户加载、角色解析。角色不进令牌：每次请求都按 `sub`
//! 重新查库，角色或能力矩阵的变更在下一次请求即生效。

use std::sync::Arc;

use serde::Serialize;
use shared::error::AppError;
use thiserror::Error;

use crate::auth::capability::{Capability, CapabilitySet};
use crate::auth::session::{SessionError, SessionService};
use crate::db::DbService;
use crate::db::models::{Admin, DEFAULT_ROLE_SLUG, Role};
use crate::db::repository::{AdminRepository, RepoError, RoleRepository};

/// 认证错误
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("{0}")]
    InvalidCredential(#[from] SessionError),

    /// 令牌有效但账户不存在或已停用
    #[error("Account not found or disabled")]
    ActorNotFound,

    #[error("Store error: {0}")]
    Store(#[from] RepoError),
}

impl From<AuthError> for AppError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidCredential(e) => e.into(),
            // 对外不区分账户不存在与令牌无效
            AuthError::ActorNotFound => AppError::invalid_token("Invalid token"),
            AuthError::Store(e) => e.into(),
        }
    }
}

/// 角色解析结果
///
/// Unresolved 是显式状态，不是错误：引用悬空且 slug 缓存失效时
/// 账户仍可认证，但能力矩阵为空，所有检查按拒绝处理。
#[derive(Debug, Clone)]
pub enum RoleResolution {
    Resolved(Role),
    Unresolved,
}

/// 当前请求的操作者上下文
///
/// 由认证中间件构建并注入请求扩展，处理函数直接以参数接收。
#[derive(Debug, Clone, Serialize)]
pub struct CurrentActor {
    pub id: String,
    pub email: String,
    pub display_name: String,
    pub role_id: Option<String>,
    pub role_slug: String,
    pub role_name: String,
    pub capabilities: CapabilitySet,
    pub is_super_admin: bool,
}

impl CurrentActor {
    /// 从账户与角色解析结果构建上下文
    pub fn new(admin: &Admin, resolution: RoleResolution) -> Self {
        let id = admin
            .id
            .as_ref()
            .map(|id| id.to_string())
            .unwrap_or_default();

        match resolution {
            RoleResolution::Resolved(role) => Self {
                id,
                email: admin.email.clone(),
                display_name: admin.display_name.clone(),
                role_id: role.id.as_ref().map(|id| id.to_string()),
                role_slug: role.slug.clone(),
                role_name: role.name.clone(),
                capabilities: role.capabilities,
                is_super_admin: role.is_super_admin,
            },
            RoleResolution::Unresolved => Self {
                id,
                email: admin.email.clone(),
                display_name: admin.display_name.clone(),
                role_id: admin.role.as_ref().map(|id| id.to_string()),
                role_slug: admin.role_slug.clone(),
                role_name: "Unknown".to_string(),
                capabilities: CapabilitySet::new(),
                is_super_admin: false,
            },
        }
    }

    /// 能力检查：超管角色短路，其余查矩阵，缺失条目即拒绝
    pub fn allows(&self, capability: Capability) -> bool {
        self.is_super_admin || self.capabilities.allows(capability)
    }
}

/// 认证引擎
#[derive(Clone)]
pub struct AuthEngine {
    admins: AdminRepository,
    roles: RoleRepository,
    sessions: Arc<SessionService>,
}

impl AuthEngine {
    pub fn new(db: &DbService, sessions: Arc<SessionService>) -> Self {
        Self {
            admins: AdminRepository::new(db.db()),
            roles: RoleRepository::new(db.db()),
            sessions,
        }
    }

    /// 校验令牌并构建操作者上下文
    pub async fn authenticate(&self, token: &str) -> Result<CurrentActor, AuthError> {
        let claims = self.sessions.validate(token)?;

        let admin = match self.admins.find_by_id(&claims.sub).await {
            Ok(Some(admin)) => admin,
            Ok(None) => return Err(AuthError::ActorNotFound),
            // 无法解析的 sub 按账户不存在处理
            Err(RepoError::Validation(_)) => return Err(AuthError::ActorNotFound),
            Err(e) => return Err(AuthError::Store(e)),
        };

        if !admin.is_active {
            return Err(AuthError::ActorNotFound);
        }

        let resolution = self.resolve_role(&admin).await?;
        Ok(CurrentActor::new(&admin, resolution))
    }

    /// 解析账户的角色
    ///
    /// 顺序：角色引用 -> slug 缓存 -> 默认角色。默认角色只用于从未
    /// 分配过角色的账户；引用悬空不回落默认，避免静默扩权或缩权。
    /// 已软删角色照常解析。
    pub async fn resolve_role(&self, admin: &Admin) -> Result<RoleResolution, AuthError> {
        if let Some(role_id) = &admin.role {
            if let Some(role) = self.roles.find_by_id(&role_id.to_string()).await? {
                return Ok(RoleResolution::Resolved(role));
            }
            // 引用悬空：slug 缓存兜底
            if !admin.role_slug.is_empty()
                && let Some(role) = self.roles.find_by_slug(&admin.role_slug).await?
            {
                return Ok(RoleResolution::Resolved(role));
            }
            return Ok(RoleResolution::Unresolved);
        }

        if !admin.role_slug.is_empty() {
            return match self.roles.find_by_slug(&admin.role_slug).await? {
                Some(role) => Ok(RoleResolution::Resolved(role)),
                None => Ok(RoleResolution::Unresolved),
            };
        }

        match self.roles.find_by_slug(DEFAULT_ROLE_SLUG).await? {
            Some(role) => Ok(RoleResolution::Resolved(role)),
            None => Ok(RoleResolution::Unresolved),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn actor_with(capabilities: CapabilitySet, is_super_admin: bool) -> CurrentActor {
        CurrentActor {
            id: "admin:test".to_string(),
            email: "test@example.com".to_string(),
            display_name: "Test".to_string(),
            role_id: None,
            role_slug: "test".to_string(),
            role_name: "Test".to_string(),
            capabilities,
            is_super_admin,
        }
    }

    #[test]
    fn test_super_admin_bypasses_matrix() {
        let actor = actor_with(CapabilitySet::new(), true);
        assert!(actor.allows(Capability::PublishContent));
        assert!(actor.allows(Capability::ManageSettings));
    }

    #[test]
    fn test_missing_capability_denied() {
        let actor = actor_with(
            CapabilitySet::new().grant(Capability::ViewContent),
            false,
        );
        assert!(actor.allows(Capability::ViewContent));
        assert!(!actor.allows(Capability::PublishContent));
        assert!(!actor.allows(Capability::ViewAuditLog));
    }

    #[test]
    fn test_unresolved_role_denies_everything() {
        let admin = Admin {
            id: Some("admin:orphan".parse().unwrap()),
            email: "orphan@example.com".to_string(),
            display_name: "Orphan".to_string(),
            secret_hash: String::new(),
            role: Some("role:gone".parse().unwrap()),
            role_slug: "gone".to_string(),
            is_active: true,
            created_at: 0,
        };
        let actor = CurrentActor::new(&admin, RoleResolution::Unresolved);

        assert_eq!(actor.role_name, "Unknown");
        assert_eq!(actor.role_slug, "gone");
        assert!(!actor.is_super_admin);
        assert!(!actor.allows(Capability::ViewContent));
    }
}
