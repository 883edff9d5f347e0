//! Role API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

/// Role router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/roles", routes())
}

fn routes() -> Router<ServerState> {
    // 读取路由: view-actors (角色列表与账户管理同屏)
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/capabilities", get(handler::capabilities))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_capability(
            Capability::ViewActors,
        )));

    // 管理路由: assign-role
    let manage_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .route(
            "/{id}",
            axum::routing::put(handler::update).delete(handler::delete),
        )
        .layer(middleware::from_fn(require_capability(
            Capability::AssignRole,
        )));

    read_routes.merge(manage_routes)
}
