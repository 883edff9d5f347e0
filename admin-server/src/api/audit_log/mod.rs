//! Audit Log API 模块 (审计日志查询、导出)

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/audit-log", routes())
}

fn routes() -> Router<ServerState> {
    Router::new()
        .route("/", get(handler::list))
        .route("/export", get(handler::export))
        .route_layer(middleware::from_fn(require_capability(
            Capability::ViewAuditLog,
        )))
}
