//! Startup Seeding
//!
//! 每次启动幂等执行：内置角色按 slug 查找，缺失才创建，已有记录不覆盖。
//! 种子阶段没有操作者身份，不产生审计记录。

use crate::auth::capability::{Capability, CapabilitySet};
use crate::core::Config;
use crate::db::DbService;
use crate::db::models::{AdminCreate, Role};
use crate::db::repository::{AdminRepository, RoleRepository};
use crate::utils::slug::slugify;
use shared::error::AppError;
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use uuid::Uuid;

/// Seed built-in roles and the root admin account
pub async fn seed(db: &DbService, config: &Config) -> Result<(), AppError> {
    let handle = db.db();
    let roles = RoleRepository::new(handle.clone());
    let admins = AdminRepository::new(handle.clone());

    // 受保护的超管角色：能力矩阵为空，is_super_admin 短路所有检查
    let super_admin = ensure_role(
        &roles,
        &handle,
        "Super Admin",
        CapabilitySet::new(),
        true,
        true,
    )
    .await?;

    // 默认角色：未分配角色的账户解析到这里
    ensure_role(
        &roles,
        &handle,
        "Viewer",
        CapabilitySet::new().grant(Capability::ViewContent),
        false,
        false,
    )
    .await?;

    ensure_role(
        &roles,
        &handle,
        "Editor",
        CapabilitySet::new()
            .grant(Capability::ViewContent)
            .grant(Capability::CreateContent)
            .grant(Capability::EditContent)
            .deny(Capability::PublishContent)
            .deny(Capability::DeleteContent),
        false,
        false,
    )
    .await?;

    // Root admin from environment, bound to the protected role
    if let Some(email) = &config.root_admin_email
        && let Some(password) = &config.root_admin_password
    {
        if admins.find_by_email(email).await?.is_none() {
            let payload = AdminCreate {
                email: email.clone(),
                password: password.clone(),
                display_name: None,
                role: super_admin.id.clone(),
            };
            admins.create(payload).await?;
            tracing::info!(email = %email, "Seeded root admin");
        }
    } else {
        tracing::debug!("ROOT_ADMIN_EMAIL not set, skipping root admin seed");
    }

    Ok(())
}

/// 按 slug 查找角色，缺失则创建并返回
///
/// 绕过 RoleRepository::create，种子角色需要写 is_protected 标记。
async fn ensure_role(
    roles: &RoleRepository,
    db: &Surreal<Db>,
    name: &str,
    capabilities: CapabilitySet,
    is_super_admin: bool,
    is_protected: bool,
) -> Result<Role, AppError> {
    let slug = slugify(name);
    if let Some(existing) = roles.find_by_slug(&slug).await? {
        return Ok(existing);
    }

    let id = RecordId::from_table_key("role", Uuid::new_v4().simple().to_string());

    let mut result = db
        .query(
            r#"CREATE $id SET
                name = $name,
                slug = $slug,
                capabilities = $capabilities,
                is_super_admin = $is_super_admin,
                is_protected = $is_protected,
                is_active = true,
                created_at = $created_at
            RETURN AFTER"#,
        )
        .bind(("id", id))
        .bind(("name", name.to_string()))
        .bind(("slug", slug.clone()))
        .bind(("capabilities", capabilities))
        .bind(("is_super_admin", is_super_admin))
        .bind(("is_protected", is_protected))
        .bind(("created_at", now_millis()))
        .await
        .map_err(|e| AppError::database(format!("Failed to seed role '{}': {}", slug, e)))?;

    let created: Option<Role> = result
        .take(0)
        .map_err(|e| AppError::database(format!("Failed to seed role '{}': {}", slug, e)))?;

    tracing::info!(slug = %slug, "Seeded role");

    created.ok_or_else(|| AppError::database(format!("Failed to seed role '{}'", slug)))
}
