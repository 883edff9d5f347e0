//! 审计日志记录器
//!
//! Append-only 设计，没有任何删除/更新接口。
//! 写入失败不得影响业务操作的结果：调用方通过 [`AuditRecorder::record_logged`]
//! 落盘，失败只进诊断日志。

use std::collections::{HashMap, HashSet};

use serde_json::Value;
use surrealdb::engine::local::Db;
use surrealdb::{RecordId, Surreal};
use thiserror::Error;

use super::types::{
    AuditAction, AuditEntry, AuditEntryView, AuditListResponse, AuditQuery, AuditResource,
    Pagination, RequestMeta,
};
use crate::db::models::Admin;
use shared::error::{AppError, ErrorCode};
use shared::util::now_millis;

/// 审计错误
#[derive(Debug, Error)]
pub enum AuditError {
    /// 条目必须归属于某个操作者
    #[error("audit entry requires an actor id")]
    MissingActor,

    #[error("Database error: {0}")]
    Database(String),
}

impl From<surrealdb::Error> for AuditError {
    fn from(err: surrealdb::Error) -> Self {
        AuditError::Database(err.to_string())
    }
}

impl From<AuditError> for AppError {
    fn from(err: AuditError) -> Self {
        match err {
            AuditError::MissingActor => {
                AppError::with_message(ErrorCode::AuditWriteFailed, err.to_string())
            }
            AuditError::Database(msg) => AppError::database(msg),
        }
    }
}

/// COUNT 结果
#[derive(Debug, serde::Deserialize)]
struct CountResult {
    total: i64,
}

/// 审计日志记录器 (SurrealDB)
#[derive(Clone)]
pub struct AuditRecorder {
    db: Surreal<Db>,
}

impl AuditRecorder {
    pub fn new(db: Surreal<Db>) -> Self {
        Self { db }
    }

    /// 追加一条审计日志
    ///
    /// 只在业务变更提交成功后调用；被拒绝或失败的请求不产生条目。
    pub async fn record(
        &self,
        actor_id: &str,
        action: AuditAction,
        resource: AuditResource,
        resource_id: Option<String>,
        details: Option<Value>,
        meta: &RequestMeta,
    ) -> Result<AuditEntry, AuditError> {
        if actor_id.trim().is_empty() {
            return Err(AuditError::MissingActor);
        }

        let entry = AuditEntry {
            id: None,
            actor: actor_id.to_string(),
            action,
            resource_type: resource,
            resource_id,
            details,
            ip_address: meta.ip.clone(),
            user_agent: meta.user_agent.clone(),
            created_at: now_millis(),
        };

        let mut result = self
            .db
            .query("CREATE audit_log CONTENT $data")
            .bind(("data", entry))
            .await?;
        let created: Option<AuditEntry> = result.take(0)?;

        created.ok_or_else(|| AuditError::Database("Failed to persist audit entry".to_string()))
    }

    /// 追加审计日志，失败只记诊断日志
    ///
    /// 业务操作此时已提交，审计写入失败不能再改变它的结果。
    pub async fn record_logged(
        &self,
        actor_id: &str,
        action: AuditAction,
        resource: AuditResource,
        resource_id: Option<String>,
        details: Option<Value>,
        meta: &RequestMeta,
    ) {
        if let Err(e) = self
            .record(actor_id, action, resource, resource_id, details, meta)
            .await
        {
            tracing::error!(
                target: "audit",
                actor = %actor_id,
                action = %action,
                resource = %resource,
                error = %e,
                "Failed to write audit entry"
            );
        }
    }

    /// 查询审计日志，创建时间倒序，分页
    pub async fn query(&self, q: &AuditQuery) -> Result<AuditListResponse, AuditError> {
        let page = q.page.max(1);
        let limit = q.limit.max(1);
        let start = page_start(page, limit);

        let where_clause = filter_clause(q);
        let count_sql = format!(
            "SELECT count() as total FROM audit_log{} GROUP ALL",
            where_clause
        );
        let select_sql = format!(
            "SELECT * FROM audit_log{} ORDER BY created_at DESC LIMIT {} START {}",
            where_clause, limit, start
        );
        let sql = format!("{}; {}", count_sql, select_sql);

        let mut result = bind_filters(self.db.query(&sql), q).await?;

        let count_result: Vec<CountResult> = result.take(0)?;
        let total = count_result.first().map(|c| c.total).unwrap_or(0);

        let records: Vec<AuditEntry> = result.take(1)?;
        let actors = self.resolve_actors(&records).await?;

        let entries = records
            .into_iter()
            .map(|entry| {
                let admin = actors.get(&entry.actor);
                AuditEntryView::from_entry(entry, admin)
            })
            .collect();

        Ok(AuditListResponse {
            entries,
            pagination: Pagination::new(page, limit, total),
        })
    }

    /// 导出过滤结果为 CSV，创建时间倒序，不分页
    ///
    /// 列序固定：Timestamp, Actor, Action, Resource Type, Resource ID,
    /// Details, IP Address。缺失值序列化为空字符串。
    pub async fn export_csv(&self, q: &AuditQuery) -> Result<String, AuditError> {
        let where_clause = filter_clause(q);
        let sql = format!(
            "SELECT * FROM audit_log{} ORDER BY created_at DESC",
            where_clause
        );

        let mut result = bind_filters(self.db.query(&sql), q).await?;
        let records: Vec<AuditEntry> = result.take(0)?;
        let actors = self.resolve_actors(&records).await?;

        let mut csv = String::from(
            "Timestamp,Actor,Action,Resource Type,Resource ID,Details,IP Address\n",
        );

        for entry in records {
            let actor = match actors.get(&entry.actor) {
                Some(admin) => format!("{} ({})", admin.display_name, admin.email),
                None => "Unknown".to_string(),
            };
            let details = match &entry.details {
                Some(Value::String(s)) => s.clone(),
                Some(other) => other.to_string(),
                None => String::new(),
            };

            let row = [
                format_timestamp(entry.created_at),
                actor,
                entry.action.as_str().to_string(),
                entry.resource_type.as_str().to_string(),
                entry
                    .resource_id
                    .as_deref()
                    .map(short_resource_id)
                    .unwrap_or_default()
                    .to_string(),
                details,
                entry.ip_address.unwrap_or_default(),
            ];

            let line: Vec<String> = row.iter().map(|field| csv_field(field)).collect();
            csv.push_str(&line.join(","));
            csv.push('\n');
        }

        Ok(csv)
    }

    /// 批量解析操作者引用，悬空的引用直接缺位（显示层降级为 Unknown）
    async fn resolve_actors(
        &self,
        entries: &[AuditEntry],
    ) -> Result<HashMap<String, Admin>, AuditError> {
        let ids: Vec<RecordId> = entries
            .iter()
            .map(|e| e.actor.as_str())
            .collect::<HashSet<_>>()
            .into_iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let mut result = self
            .db
            .query("SELECT * FROM admin WHERE id INSIDE $ids")
            .bind(("ids", ids))
            .await?;
        let admins: Vec<Admin> = result.take(0)?;

        let mut map = HashMap::new();
        for admin in admins {
            let Some(id) = admin.id.clone() else { continue };
            map.insert(id.to_string(), admin);
        }
        Ok(map)
    }
}

/// 组装过滤条件 WHERE 子句
fn filter_clause(q: &AuditQuery) -> String {
    let mut conditions = Vec::new();

    if q.actor_id.is_some() {
        conditions.push("actor = $actor");
    }
    if q.action.is_some() {
        conditions.push("action = $action");
    }
    if q.resource_type.is_some() {
        conditions.push("resource_type = $resource_type");
    }
    if q.start_date.is_some() {
        conditions.push("created_at >= $start");
    }
    if q.end_date.is_some() {
        conditions.push("created_at <= $end");
    }

    if conditions.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", conditions.join(" AND "))
    }
}

/// 绑定过滤参数，与 [`filter_clause`] 的占位符一一对应
fn bind_filters<'a, C: surrealdb::Connection>(
    mut qb: surrealdb::method::Query<'a, C>,
    q: &AuditQuery,
) -> surrealdb::method::Query<'a, C> {
    if let Some(ref actor_id) = q.actor_id {
        qb = qb.bind(("actor", actor_id.clone()));
    }
    if let Some(action) = q.action {
        qb = qb.bind(("action", action.as_str().to_string()));
    }
    if let Some(resource_type) = q.resource_type {
        qb = qb.bind(("resource_type", resource_type.as_str().to_string()));
    }
    if let Some(start) = q.start_date {
        qb = qb.bind(("start", start));
    }
    if let Some(end) = q.end_date {
        qb = qb.bind(("end", end));
    }
    qb
}

/// START 偏移；page/limit 来自查询串，极端值走饱和运算
fn page_start(page: i64, limit: i64) -> i64 {
    (page.max(1) - 1).saturating_mul(limit.max(1))
}

/// RFC 3339 时间戳（UTC）
fn format_timestamp(millis: i64) -> String {
    chrono::DateTime::from_timestamp_millis(millis)
        .map(|dt| dt.to_rfc3339())
        .unwrap_or_default()
}

/// 资源 id 短格式：去掉表名前缀
fn short_resource_id(id: &str) -> &str {
    id.split_once(':').map(|(_, key)| key).unwrap_or(id)
}

/// CSV 字段转义：含逗号/引号/换行时加引号，内部引号翻倍
fn csv_field(field: &str) -> String {
    if field.contains(',') || field.contains('"') || field.contains('\n') || field.contains('\r') {
        format!("\"{}\"", field.replace('"', "\"\""))
    } else {
        field.to_string()
    }
}
