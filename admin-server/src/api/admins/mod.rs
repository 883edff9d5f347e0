//! Admin Account API Module

mod handler;

use axum::{Router, middleware, routing::get};

use crate::auth::{Capability, require_capability};
use crate::core::ServerState;

/// Admin account router
pub fn router() -> Router<ServerState> {
    Router::new().nest("/api/admins", routes())
}

fn routes() -> Router<ServerState> {
    // 读取路由: view-actors
    let read_routes = Router::new()
        .route("/", get(handler::list))
        .route("/{id}", get(handler::get_by_id))
        .layer(middleware::from_fn(require_capability(
            Capability::ViewActors,
        )));

    // 管理路由按操作拆分, 每个动作对应独立能力
    let create_routes = Router::new()
        .route("/", axum::routing::post(handler::create))
        .layer(middleware::from_fn(require_capability(
            Capability::CreateActor,
        )));

    let update_routes = Router::new()
        .route("/{id}", axum::routing::put(handler::update))
        .layer(middleware::from_fn(require_capability(
            Capability::EditActor,
        )));

    let delete_routes = Router::new()
        .route("/{id}", axum::routing::delete(handler::delete))
        .layer(middleware::from_fn(require_capability(
            Capability::DeleteActor,
        )));

    read_routes
        .merge(create_routes)
        .merge(update_routes)
        .merge(delete_routes)
}
