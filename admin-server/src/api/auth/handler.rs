//! Authentication Handlers
//!
//! Handles login, session introspection and logout

use std::time::Duration;

use axum::{
    Json,
    extract::State,
    http::{HeaderMap, header},
    response::IntoResponse,
};

use crate::audit::{AuditAction, AuditResource, RequestMeta};
use crate::auth::CurrentActor;
use crate::core::ServerState;
use crate::db::repository::AdminRepository;
use crate::security_log;
use crate::utils::{ApiResponse, AppError, AppResult};

// Re-use shared DTOs for API consistency
use shared::client::{ActorInfo, LoginRequest, LoginResponse};

/// Fixed delay for authentication to prevent timing attacks
const AUTH_FIXED_DELAY_MS: u64 = 500;

/// Login handler
///
/// Authenticates credentials, issues the session token and sets the
/// `admin_session` cookie. Failed attempts go to the security log only;
/// the audit trail records committed actions, not rejected ones.
pub async fn login(
    State(state): State<ServerState>,
    headers: HeaderMap,
    Json(req): Json<LoginRequest>,
) -> AppResult<impl IntoResponse> {
    let email = req.email.trim().to_lowercase();

    let repo = AdminRepository::new(state.get_db());
    let admin = repo.find_by_email(&email).await?;

    // Fixed delay to prevent timing attacks (before checking result)
    tokio::time::sleep(Duration::from_millis(AUTH_FIXED_DELAY_MS)).await;

    // Unified error message to prevent account enumeration
    let admin = match admin {
        Some(a) => {
            let password_valid = a
                .verify_password(&req.password)
                .map_err(|e| AppError::internal(format!("Password verification failed: {}", e)))?;

            if !password_valid {
                security_log!("WARN", "login_failed", email = email.clone(), reason = "invalid_credentials");
                return Err(AppError::invalid_credentials());
            }

            // Disabled status is only revealed after the password checks out
            if !a.is_active {
                security_log!("WARN", "login_failed", email = email.clone(), reason = "account_disabled");
                return Err(AppError::account_disabled());
            }

            a
        }
        None => {
            security_log!("WARN", "login_failed", email = email.clone(), reason = "unknown_account");
            return Err(AppError::invalid_credentials());
        }
    };

    let resolution = state.get_engine().resolve_role(&admin).await?;
    let actor = CurrentActor::new(&admin, resolution);

    let sessions = state.get_sessions();
    let token = sessions.issue(
        &actor.id,
        &actor.email,
        &actor.role_slug,
        actor.role_id.as_deref(),
    )?;
    let cookie = sessions.session_cookie(&token);

    let meta = RequestMeta::from_headers(&headers);
    state
        .get_audit()
        .record_logged(
            &actor.id,
            AuditAction::Login,
            AuditResource::System,
            None,
            None,
            &meta,
        )
        .await;

    tracing::info!(
        actor_id = %actor.id,
        email = %actor.email,
        role = %actor.role_slug,
        "Actor logged in"
    );

    let response = LoginResponse {
        token,
        actor: actor_info(&actor),
    };

    Ok((
        [(header::SET_COOKIE, cookie)],
        ApiResponse::success(response),
    ))
}

/// Get current actor info
///
/// The extractor re-validates the session, so the role and capability
/// matrix here are current, not the snapshot from login time.
pub async fn me(actor: CurrentActor) -> AppResult<ApiResponse<ActorInfo>> {
    Ok(ApiResponse::success(actor_info(&actor)))
}

/// Logout handler
///
/// Expires the session cookie. The token itself stays valid until its
/// expiry; clients are expected to drop it.
pub async fn logout(
    State(state): State<ServerState>,
    headers: HeaderMap,
    actor: CurrentActor,
) -> AppResult<impl IntoResponse> {
    let meta = RequestMeta::from_headers(&headers);
    state
        .get_audit()
        .record_logged(
            &actor.id,
            AuditAction::Logout,
            AuditResource::System,
            None,
            None,
            &meta,
        )
        .await;

    tracing::info!(actor_id = %actor.id, email = %actor.email, "Actor logged out");

    Ok((
        [(header::SET_COOKIE, state.get_sessions().expired_cookie())],
        ApiResponse::ok(),
    ))
}

/// Project the actor context into the client-facing DTO
fn actor_info(actor: &CurrentActor) -> ActorInfo {
    ActorInfo {
        id: actor.id.clone(),
        email: actor.email.clone(),
        display_name: actor.display_name.clone(),
        role_slug: actor.role_slug.clone(),
        role_name: actor.role_name.clone(),
        capabilities: actor
            .capabilities
            .granted()
            .map(|c| c.as_str().to_string())
            .collect(),
        is_super_admin: actor.is_super_admin,
    }
}
