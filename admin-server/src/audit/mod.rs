//! 审计日志模块
//!
//! 记录每一次成功提交的管理端变更：谁、做了什么、对哪个资源。
//! 被拒绝或失败的请求不产生条目；写入失败不回滚业务操作。

pub mod diff;
pub mod recorder;
pub mod types;

pub use diff::{create_delete_details, create_diff, create_snapshot};
pub use recorder::{AuditError, AuditRecorder};
pub use types::{
    AuditAction, AuditEntry, AuditEntryView, AuditListResponse, AuditQuery, AuditResource,
    Pagination, RequestMeta,
};
