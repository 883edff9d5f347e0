//! Audit Log Types

use http::HeaderMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use surrealdb::RecordId;

use crate::db::models::Admin;
use crate::db::models::serde_helpers;

/// 审计动作（封闭枚举）
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditAction {
    Create,
    Update,
    Delete,
    Publish,
    Unpublish,
    Schedule,
    Restore,
    Login,
    Logout,
}

impl AuditAction {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditAction::Create => "create",
            AuditAction::Update => "update",
            AuditAction::Delete => "delete",
            AuditAction::Publish => "publish",
            AuditAction::Unpublish => "unpublish",
            AuditAction::Schedule => "schedule",
            AuditAction::Restore => "restore",
            AuditAction::Login => "login",
            AuditAction::Logout => "logout",
        }
    }
}

impl fmt::Display for AuditAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审计资源类型（封闭枚举）
///
/// 账户与角色变更共用 `actor-or-role`，资源 id 区分具体记录。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AuditResource {
    ContentItem,
    Category,
    Tag,
    Media,
    Redirect,
    ActorOrRole,
    System,
    Booking,
    Route,
    City,
    Airport,
    SeoConfig,
}

impl AuditResource {
    pub const fn as_str(&self) -> &'static str {
        match self {
            AuditResource::ContentItem => "content-item",
            AuditResource::Category => "category",
            AuditResource::Tag => "tag",
            AuditResource::Media => "media",
            AuditResource::Redirect => "redirect",
            AuditResource::ActorOrRole => "actor-or-role",
            AuditResource::System => "system",
            AuditResource::Booking => "booking",
            AuditResource::Route => "route",
            AuditResource::City => "city",
            AuditResource::Airport => "airport",
            AuditResource::SeoConfig => "seo-config",
        }
    }
}

impl fmt::Display for AuditResource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 审计日志条目，只追加，写入后永不修改
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    #[serde(
        default,
        skip_serializing_if = "Option::is_none",
        with = "serde_helpers::option_record_id"
    )]
    pub id: Option<RecordId>,
    /// 操作者 id ("admin:xxx")，非强制外键，悬空只降级显示
    pub actor: String,
    pub action: AuditAction,
    pub resource_type: AuditResource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resource_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub details: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ip_address: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_agent: Option<String>,
    /// Unix millis，服务端赋值
    pub created_at: i64,
}

/// 请求元数据（IP 与 User-Agent）
#[derive(Debug, Clone, Default)]
pub struct RequestMeta {
    pub ip: Option<String>,
    pub user_agent: Option<String>,
}

impl RequestMeta {
    /// 从请求头提取：X-Forwarded-For 首项优先，X-Real-IP 兜底
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let ip = headers
            .get("x-forwarded-for")
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(',').next())
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .or_else(|| {
                headers
                    .get("x-real-ip")
                    .and_then(|v| v.to_str().ok())
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            });

        let user_agent = headers
            .get(http::header::USER_AGENT)
            .and_then(|v| v.to_str().ok())
            .map(|s| s.to_string());

        Self { ip, user_agent }
    }
}

/// 审计日志查询参数
#[derive(Debug, Clone, Deserialize)]
pub struct AuditQuery {
    pub actor_id: Option<String>,
    pub action: Option<AuditAction>,
    pub resource_type: Option<AuditResource>,
    /// Unix millis，闭区间
    pub start_date: Option<i64>,
    pub end_date: Option<i64>,
    #[serde(default = "default_page")]
    pub page: i64,
    #[serde(default = "default_limit")]
    pub limit: i64,
}

// Default 与 query-string 缺省保持一致
impl Default for AuditQuery {
    fn default() -> Self {
        Self {
            actor_id: None,
            action: None,
            resource_type: None,
            start_date: None,
            end_date: None,
            page: default_page(),
            limit: default_limit(),
        }
    }
}

fn default_page() -> i64 {
    1
}

fn default_limit() -> i64 {
    50
}

/// 分页信息
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Pagination {
    pub page: i64,
    pub limit: i64,
    pub total: i64,
    pub pages: i64,
}

impl Pagination {
    pub fn new(page: i64, limit: i64, total: i64) -> Self {
        let page = page.max(1);
        let limit = limit.max(1);
        Self {
            page,
            limit,
            total,
            pages: total.saturating_add(limit - 1) / limit,
        }
    }
}

/// 列表响应里的条目，附带解析后的操作者显示字段
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntryView {
    pub id: Option<String>,
    pub actor: String,
    /// 操作者显示名，引用悬空时为 "Unknown"
    pub actor_name: String,
    pub actor_email: String,
    pub action: AuditAction,
    pub resource_type: AuditResource,
    pub resource_id: Option<String>,
    pub details: Option<Value>,
    pub ip_address: Option<String>,
    pub user_agent: Option<String>,
    pub created_at: i64,
}

impl AuditEntryView {
    pub fn from_entry(entry: AuditEntry, actor: Option<&Admin>) -> Self {
        let (actor_name, actor_email) = match actor {
            Some(admin) => (admin.display_name.clone(), admin.email.clone()),
            None => ("Unknown".to_string(), String::new()),
        };

        Self {
            id: entry.id.map(|id| id.to_string()),
            actor: entry.actor,
            actor_name,
            actor_email,
            action: entry.action,
            resource_type: entry.resource_type,
            resource_id: entry.resource_id,
            details: entry.details,
            ip_address: entry.ip_address,
            user_agent: entry.user_agent,
            created_at: entry.created_at,
        }
    }
}

/// 审计日志列表响应
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditListResponse {
    pub entries: Vec<AuditEntryView>,
    pub pagination: Pagination,
}
