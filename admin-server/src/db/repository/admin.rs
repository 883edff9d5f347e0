//! Admin Repository

use super::{BaseRepository, RepoError, RepoResult};
use crate::db::models::{Admin, AdminCreate, AdminUpdate, Role};
use shared::util::now_millis;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use uuid::Uuid;

/// 邮箱规范形式：去首尾空白并折叠为小写
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

#[derive(Clone)]
pub struct AdminRepository {
    base: BaseRepository,
}

impl AdminRepository {
    pub fn new(db: Surreal<Db>) -> Self {
        Self {
            base: BaseRepository::new(db),
        }
    }

    /// Find all admin accounts including disabled ones
    pub async fn find_all(&self) -> RepoResult<Vec<Admin>> {
        let admins: Vec<Admin> = self
            .base
            .db()
            .query("SELECT * FROM admin ORDER BY email")
            .await?
            .take(0)?;
        Ok(admins)
    }

    /// Find admin by id
    pub async fn find_by_id(&self, id: &str) -> RepoResult<Option<Admin>> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let admin: Option<Admin> = self.base.db().select(thing).await?;
        Ok(admin)
    }

    /// Find admin by email (大小写不敏感，存储时已折叠为小写)
    pub async fn find_by_email(&self, email: &str) -> RepoResult<Option<Admin>> {
        let email_owned = normalize_email(email);
        let mut result = self
            .base
            .db()
            .query("SELECT * FROM admin WHERE email = $email LIMIT 1")
            .bind(("email", email_owned))
            .await?;
        let admins: Vec<Admin> = result.take(0)?;
        Ok(admins.into_iter().next())
    }

    /// 按 id 取角色记录，分配时校验并缓存 slug
    async fn fetch_role(&self, role_id: &RecordId) -> RepoResult<Role> {
        let role: Option<Role> = self.base.db().select(role_id.clone()).await?;
        let role =
            role.ok_or_else(|| RepoError::Validation(format!("Role {} not found", role_id)))?;
        if !role.is_active {
            return Err(RepoError::Validation(format!(
                "Role {} is not active",
                role_id
            )));
        }
        Ok(role)
    }

    /// Create a new admin account
    pub async fn create(&self, data: AdminCreate) -> RepoResult<Admin> {
        // 存小写规范形式，登录时同样折叠后比对
        let email = normalize_email(&data.email);

        // Check duplicate email
        if self.find_by_email(&email).await?.is_some() {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already exists",
                email
            )));
        }

        // Hash password
        let secret_hash = Admin::hash_password(&data.password)
            .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?;

        let display_name = data.display_name_or_default();

        // 分配角色时缓存 slug；未分配时留空，解析阶段回落到默认角色
        let role_slug = match &data.role {
            Some(role_id) => self.fetch_role(role_id).await?.slug,
            None => String::new(),
        };

        let id = RecordId::from_table_key("admin", Uuid::new_v4().simple().to_string());

        let mut result = self
            .base
            .db()
            .query(
                r#"CREATE $id SET
                    email = $email,
                    display_name = $display_name,
                    secret_hash = $secret_hash,
                    role = $role,
                    role_slug = $role_slug,
                    is_active = true,
                    created_at = $created_at
                RETURN AFTER"#,
            )
            .bind(("id", id))
            .bind(("email", email))
            .bind(("display_name", display_name))
            .bind(("secret_hash", secret_hash))
            .bind(("role", data.role))
            .bind(("role_slug", role_slug))
            .bind(("created_at", now_millis()))
            .await?;

        let created: Option<Admin> = result.take(0)?;
        created.ok_or_else(|| RepoError::Database("Failed to create admin".to_string()))
    }

    /// Update an admin account
    pub async fn update(&self, id: &str, data: AdminUpdate) -> RepoResult<Admin> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        let existing = self
            .find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Admin {} not found", id)))?;

        // Check duplicate email if changing
        let email = data.email.as_deref().map(normalize_email);
        if let Some(ref new_email) = email
            && new_email != &existing.email
            && self.find_by_email(new_email).await?.is_some()
        {
            return Err(RepoError::Duplicate(format!(
                "Email '{}' already exists",
                new_email
            )));
        }

        let secret_hash = if let Some(ref password) = data.password {
            Some(
                Admin::hash_password(password)
                    .map_err(|e| RepoError::Database(format!("Failed to hash password: {}", e)))?,
            )
        } else {
            None
        };

        // 角色变更时重新缓存 slug
        let role_slug = match &data.role {
            Some(role_id) => Some(self.fetch_role(role_id).await?.slug),
            None => None,
        };

        let mut result = self
            .base
            .db()
            .query(
                r#"UPDATE $thing SET
                    email = $email OR email,
                    display_name = $display_name OR display_name,
                    secret_hash = $secret_hash OR secret_hash,
                    role = IF $has_role THEN $role ELSE role END,
                    role_slug = IF $has_role THEN $role_slug ELSE role_slug END,
                    is_active = IF $has_is_active THEN $is_active ELSE is_active END
                RETURN AFTER"#,
            )
            .bind(("thing", thing))
            .bind(("email", email))
            .bind(("display_name", data.display_name))
            .bind(("secret_hash", secret_hash))
            .bind(("has_role", data.role.is_some()))
            .bind(("role", data.role))
            .bind(("role_slug", role_slug))
            .bind(("has_is_active", data.is_active.is_some()))
            .bind(("is_active", data.is_active))
            .await?;

        result
            .take::<Option<Admin>>(0)?
            .ok_or_else(|| RepoError::NotFound(format!("Admin {} not found", id)))
    }

    /// Hard delete an admin account
    pub async fn delete(&self, id: &str) -> RepoResult<bool> {
        let thing: RecordId = id
            .parse()
            .map_err(|_| RepoError::Validation(format!("Invalid ID: {}", id)))?;
        self.find_by_id(id)
            .await?
            .ok_or_else(|| RepoError::NotFound(format!("Admin {} not found", id)))?;

        self.base
            .db()
            .query("DELETE $thing")
            .bind(("thing", thing))
            .await?;
        Ok(true)
    }
}
