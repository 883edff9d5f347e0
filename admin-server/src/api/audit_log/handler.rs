//! Audit Log API Handlers

use axum::{
    extract::{Query, State},
    http::header,
    response::IntoResponse,
};

use crate::audit::{AuditListResponse, AuditQuery};
use crate::core::ServerState;
use crate::utils::{ApiResponse, AppResult};

/// GET /api/audit-log — 查询审计日志
pub async fn list(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<ApiResponse<AuditListResponse>> {
    let response = state.get_audit().query(&query).await?;
    Ok(ApiResponse::success(response))
}

/// GET /api/audit-log/export — 按当前过滤条件导出 CSV
///
/// 导出不分页, 页码参数被忽略。
pub async fn export(
    State(state): State<ServerState>,
    Query(query): Query<AuditQuery>,
) -> AppResult<impl IntoResponse> {
    let csv = state.get_audit().export_csv(&query).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"audit-log.csv\"",
            ),
        ],
        csv,
    ))
}
