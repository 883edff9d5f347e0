//! Role Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Role, RoleCreate, RoleUpdate};
use crate::utils::slug::slugify;
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use uuid::Uuid;

#[derive(Clone)]
pub struct RoleRepository {
    base: BaseRepository,
}

impl RoleRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all active roles
    pub async fn find_all(&self) -> RepoResult<Vec<Role>> {
        let roles: Vec<Role> = self
            .base
            .db()
            .query("SELECT * FROM role WHERE is_active = true ORDER BY name")
            .await?
            .take(0)?;
        Ok(roles)
    }

    /// Find role by id
    ///
    /// 不过滤 is_active：已停用角色仍需要被账户解析到。
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Role>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let role: Option<Role> = self.base.db().select(thing).await?;
        Ok(role)
    }

    /// Find role by slug
    pub async fn find_by_slug(&self, slug: &str) -> RepoResult<Option<Role>> {
        let slug_owned = slug.to_string();
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM role WHERE slug = $slug LIMIT 1")
            .bind(("slug", slug_owned))
            .await?;
        let roles: Vec<Role> = result.take(0)?;
        Ok(roles.into_iter().next())
    }

    /// Create a new role
    ///
    /// slug 由 name 派生；受保护标记只在启动种子阶段写入。
    pub async fn create(&self, data: RoleCreate) -> RepoResult<Role> {
        let slug = slugify(&data.name);
        if slug.is_empty() {
            return Err(RepoError::Validation(format!(
                "Role name '{}' yields an empty slug",
                data.name
            )));
        }

        // Check duplicate slug
        if self.find_by_slug(&slug).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Role slug '{}' already exists",
                slug
            )));
        }

        let id = RecordId::from_table_key("role", Uuid::new_v4().simple().to_string());

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE $id SET
                    name = $name,
                    slug = $slug,
                    capabilities = $capabilities,
                    is_super_admin = $is_super_admin,
                    is_protected = false,
                    is_active = true,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("id", id))
            .bind(("name", data.name))
            .bind(("slug", slug))
            .bind(("capabilities", data.capabilities))
            .bind(("is_super_admin", data.is_super_admin))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<Role> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create role".to_string()))
    }

    /// Update a role
    ///
    /// 改名会重新派生 slug。受保护角色一律拒绝。
    pub async fn update(&self, id: &str, data: RoleUpdate) -> RepoResult<Role> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Role {} not found", id)))?;

        if existing.is_protected() {
            return Err(RepoError::Protected(format!(
                "Role '{}' is protected and cannot be modified",
                existing.slug
            )));
        }

        // Re-derive slug on rename, checking for collisions
        let slug = if let Some(ref new_name) = data.name {
            let new_slug = slugify(new_name);
            if new_slug.is_empty() {
                return Err(RepoError::Validation(format!(
                    "Role name '{}' yields an empty slug",
                    new_name
                )));
            }
            if new_slug != existing.slug && self.find_by_slug(&new_slug).await?.is_some() {
                return Err(RepoError::Duplicate(format!(
                    "Role slug '{}' already exists",
                    new_slug
                )));
            }
            Some(new_slug)
        } else {
            None
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    name = $name OR name,
                    slug = $slug OR slug,
                    capabilities = IF $has_capabilities THEN $capabilities ELSE capabilities END,
                    is_super_admin = IF $has_is_super_admin THEN $is_super_admin ELSE is_super_admin END,
                    is_active = IF $has_is_active THEN $is_active ELSE is_active END
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("name", data.name))
            .bind(("slug", slug))
            .bind(("has_capabilities", data.capabilities.is_some()))
            .bind(("capabilities", data.capabilities))
            .bind(("has_is_super_admin", data.is_super_admin.is_some()))
            .bind(("is_super_admin", data.is_super_admin))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .await?;

        result
            .take::<Option<Role>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Role {} not found", id)))
    }

    /// Soft delete a role
    ///
    /// 置 is_active = false；引用它的账户在解析时仍能取到能力矩阵。
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Role {} not found", id)))?;

        if existing.is_protected() {
            return Err(RepoError::Protected(format!(
                "Role '{}' is protected and cannot be deleted",
                existing.slug
            )));
        }

        self.base
            .db()
            .query("UPDATE $thing SET is_active = false")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
