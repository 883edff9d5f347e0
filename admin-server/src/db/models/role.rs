//! Role Model

use super::RoleId;
use super::serde_helpers;
use crate::auth::capability::CapabilitySet;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// 受保护角色的 slug，不可改名、不可停用、不可删除
pub const PROTECTED_ROLE_SLUG: &str = "super-admin";

/// 未分配角色的账户按此角色解析
pub const DEFAULT_ROLE_SLUG: &str = "viewer";

/// Role matching SurrealDB schema
///
/// `capabilities` 缺失条目视为拒绝；`is_super_admin` 为真时矩阵被短路，
/// 所有能力检查直接通过。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Role {
    #[serde(default, with = "serde_helpers::option_record_id")]
    pub id: Option<RoleId>,
    pub name: String,
    /// 由 name 派生，唯一，作为 API 引用键
    pub slug: String,
    #[serde(default)]
    pub capabilities: CapabilitySet,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_super_admin: bool,
    #[serde(default, deserialize_with = "serde_helpers::bool_false")]
    pub is_protected: bool,
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

impl Role {
    pub fn is_protected(&self) -> bool {
        self.is_protected || self.slug == PROTECTED_ROLE_SLUG
    }
}

/// Create role payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleCreate {
    #[validate(length(min = 1, max = 60, message = "role name must be 1-60 characters"))]
    pub name: String,
    #[serde(default)]
    pub capabilities: CapabilitySet,
    #[serde(default)]
    pub is_super_admin: bool,
}

/// Update role payload
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct RoleUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 60, message = "role name must be 1-60 characters"))]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub capabilities: Option<CapabilitySet>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_super_admin: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_active: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::capability::Capability;

    #[test]
    fn test_deserialize_with_defaults() {
        let role: Role = serde_json::from_str(
            r#"{"name": "Viewer", "slug": "viewer"}"#,
        )
        .unwrap();
        assert!(role.capabilities.is_empty());
        assert!(!role.is_super_admin);
        assert!(!role.is_protected);
        assert!(role.is_active);
    }

    #[test]
    fn test_capability_matrix_from_json() {
        let role: Role = serde_json::from_str(
            r#"{
                "name": "Editor",
                "slug": "editor",
                "capabilities": {"view-content": true, "publish-content": false}
            }"#,
        )
        .unwrap();
        assert!(role.capabilities.allows(Capability::ViewContent));
        assert!(!role.capabilities.allows(Capability::PublishContent));
        assert!(!role.capabilities.allows(Capability::DeleteContent));
    }

    #[test]
    fn test_protected_by_slug() {
        let role: Role = serde_json::from_str(
            r#"{"name": "Super Admin", "slug": "super-admin"}"#,
        )
        .unwrap();
        assert!(role.is_protected());
    }
}
