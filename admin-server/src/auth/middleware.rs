//! 认证与能力检查中间件

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::auth::capability::Capability;
use crate::auth::engine::CurrentActor;
use crate::auth::session::token_from_headers;
use crate::core::ServerState;
use crate::security_log;
use shared::error::AppError;

/// 会话中间件，要求已登录
///
/// 令牌来源：`Authorization: Bearer <token>` 优先，`admin_session`
/// Cookie 兜底。认证成功后将 [`CurrentActor`] 注入请求扩展。
///
/// # 跳过认证的路径
///
/// - `OPTIONS *` (CORS 预检)
/// - 非 `/api/` 路径
/// - `/api/auth/login`
/// - `/api/health`
pub async fn require_session(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = req.uri().path();

    // 允许 CORS 预检的 OPTIONS 请求 (跳过认证)
    if req.method() == http::Method::OPTIONS {
        return Ok(next.run(req).await);
    }

    // 非 API 路由跳过认证 (让它们正常返回 404)
    if !path.starts_with("/api/") {
        return Ok(next.run(req).await);
    }

    // 公共 API 路由跳过认证
    let is_public_api_route = path == "/api/auth/login" || path == "/api/health";
    if is_public_api_route {
        return Ok(next.run(req).await);
    }

    let Some(token) = token_from_headers(req.headers()) else {
        security_log!("WARN", "session_missing", uri = format!("{:?}", req.uri()));
        return Err(AppError::unauthorized());
    };

    match state.get_engine().authenticate(&token).await {
        Ok(actor) => {
            req.extensions_mut().insert(actor);
            Ok(next.run(req).await)
        }
        Err(e) => {
            security_log!(
                "WARN",
                "session_rejected",
                error = format!("{}", e),
                uri = format!("{:?}", req.uri())
            );
            Err(AppError::from(e))
        }
    }
}

/// 能力检查中间件
///
/// 必须套在 [`require_session`] 之内，依赖扩展里的 [`CurrentActor`]。
/// 拒绝响应会指名缺失的能力；认证失败则保持不透明，两者刻意不同。
///
/// # 用法
///
/// ```ignore
/// use axum::middleware;
/// Router::new()
///     .route("/api/admins", get(handler::list))
///     .route_layer(middleware::from_fn(require_capability(Capability::ViewActors)));
/// ```
pub fn require_capability(
    capability: Capability,
) -> impl Fn(
    Request,
    Next,
) -> std::pin::Pin<Box<dyn std::future::Future<Output = Result<Response, AppError>> + Send>>
+ Clone {
    move |req: Request, next: Next| {
        Box::pin(async move {
            let actor = req
                .extensions()
                .get::<CurrentActor>()
                .ok_or(AppError::unauthorized())?;

            if !actor.allows(capability) {
                security_log!(
                    "WARN",
                    "capability_denied",
                    actor_id = actor.id.clone(),
                    email = actor.email.clone(),
                    required_capability = capability.as_str()
                );
                return Err(AppError::capability_required(capability.as_str()));
            }

            Ok(next.run(req).await)
        })
    }
}
