//! CurrentActor Extractor
//!
//! Lets protected handlers receive the authenticated actor as a parameter.

use axum::{extract::FromRequestParts, http::request::Parts};

use crate::auth::engine::CurrentActor;
use crate::auth::session::token_from_headers;
use crate::core::ServerState;
use crate::security_log;
use shared::error::AppError;

/// Session extractor
///
/// 中间件已注入时直接复用扩展里的上下文；否则从请求头取令牌走完整认证。
impl FromRequestParts<ServerState> for CurrentActor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &ServerState,
    ) -> Result<Self, Self::Rejection> {
        // Check if already extracted (from middleware)
        if let Some(actor) = parts.extensions.get::<CurrentActor>() {
            return Ok(actor.clone());
        }

        let Some(token) = token_from_headers(&parts.headers) else {
            security_log!("WARN", "session_missing", uri = format!("{:?}", parts.uri));
            return Err(AppError::unauthorized());
        };

        match state.get_engine().authenticate(&token).await {
            Ok(actor) => {
                // Store in extensions for potential reuse
                parts.extensions.insert(actor.clone());
                Ok(actor)
            }
            Err(e) => {
                security_log!(
                    "WARN",
                    "session_rejected",
                    error = format!("{}", e),
                    uri = format!("{:?}", parts.uri)
                );
                Err(AppError::from(e))
            }
        }
    }
}
