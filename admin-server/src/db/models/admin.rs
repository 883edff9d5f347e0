//! Admin Account Model

use super::serde_helpers;
use super::{AdminId, RoleId};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Admin account matching SurrealDB schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Admin {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<AdminId>,
    pub email: String,
    pub display_name: String,
    #[serde(skip_serializing)]
    pub secret_hash: String,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub role: Option<RoleId>,
    /// 角色 slug 缓存，分配角色时写入；查询列表时免去 join
    #[serde(default)]
    pub role_slug: String,
    #[serde(
        default = "default_true",
        deserialize_with = "serde_helpers::bool_true"
    )]
    pub is_active: bool,
    /// Unix millis
    #[serde(default)]
    pub created_at: i64,
}

fn default_true() -> bool {
    true
}

/// Create admin payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminCreate {
    #[validate(email(message = "invalid email address"))]
    pub email: String,
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: String,
    #[validate(length(min = 1, max = 80))]
    pub display_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub role: Option<RoleId>,
}

impl AdminCreate {
    /// display_name 缺省时取邮箱 @ 前的本地段
    pub fn display_name_or_default(&self) -> String {
        match &self.display_name {
            Some(name) if !name.trim().is_empty() => name.trim().to_string(),
            _ => self
                .email
                .split('@')
                .next()
                .unwrap_or(&self.email)
                .to_string(),
        }
    }
}

/// Update admin payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct AdminUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "invalid email address"))]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 8, max = 128, message = "password must be 8-128 characters"))]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 80))]
    pub display_name: Option<String>,
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub role: Option<RoleId>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

impl Admin {
    /// Verify password using argon2
    pub fn verify_password(&self, password: &str) -> Result<bool, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHash, PasswordVerifier},
        };

        let parsed_hash = PasswordHash::new(&self.secret_hash)?;
        Ok(Argon2::default()
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }

    /// Hash password using argon2
    pub fn hash_password(password: &str) -> Result<String, argon2::password_hash::Error> {
        use argon2::{
            Argon2,
            password_hash::{PasswordHasher, SaltString, rand_core::OsRng},
        };

        let salt = SaltString::generate(&mut OsRng);
        let argon2 = Argon2::default();
        let password_hash = argon2.hash_password(password.as_bytes(), &salt)?;
        Ok(password_hash.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_and_verify() {
        let hash = Admin::hash_password("correct horse battery").unwrap();
        let admin = Admin {
            id: None,
            email: "ops@example.com".to_string(),
            display_name: "Ops".to_string(),
            secret_hash: hash,
            role: None,
            role_slug: String::new(),
            is_active: true,
            created_at: 0,
        };
        assert!(admin.verify_password("correct horse battery").unwrap());
        assert!(!admin.verify_password("wrong password").unwrap());
    }

    #[test]
    fn test_display_name_defaults_to_email_local_part() {
        let payload = AdminCreate {
            email: "jamie.lee@cityhop.example".to_string(),
            password: "longenough".to_string(),
            display_name: None,
            role: None,
        };
        assert_eq!(payload.display_name_or_default(), "jamie.lee");

        let named = AdminCreate {
            display_name: Some("  Jamie Lee  ".to_string()),
            ..payload
        };
        assert_eq!(named.display_name_or_default(), "Jamie Lee");
    }

    #[test]
    fn test_create_payload_validation() {
        let bad_email = AdminCreate {
            email: "not-an-email".to_string(),
            password: "longenough".to_string(),
            display_name: None,
            role: None,
        };
        assert!(bad_email.validate().is_err());

        let short_password = AdminCreate {
            email: "ok@example.com".to_string(),
            password: "short".to_string(),
            display_name: None,
            role: None,
        };
        assert!(short_password.validate().is_err());

        let valid = AdminCreate {
            email: "ok@example.com".to_string(),
            password: "longenough".to_string(),
            display_name: None,
            role: None,
        };
        assert!(valid.validate().is_ok());
    }

    #[test]
    fn test_secret_hash_never_serialized() {
        let admin = Admin {
            id: None,
            email: "ops@example.com".to_string(),
            display_name: "Ops".to_string(),
            secret_hash: "$argon2id$secret".to_string(),
            role: None,
            role_slug: String::new(),
            is_active: true,
            created_at: 0,
        };
        let json = serde_json::to_value(&admin).unwrap();
        assert!(json.get("secret_hash").is_none());
    }
}
