//! Role API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use validator::Validate;

use crate::audit::{
    AuditAction, AuditResource, RequestMeta, create_delete_details, create_diff, create_snapshot,
};
use crate::auth::{ALL_CAPABILITIES, CurrentActor};
use crate::core::ServerState;
use crate::db::models::{Role, RoleCreate, RoleUpdate};
use crate::db::repository::{RepoError, RoleRepository};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

/// List active roles
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Role>>> {
    let repo = RoleRepository::new(state.get_db());
    let roles = repo.find_all().await?;
    Ok(ApiResponse::success(roles))
}

/// List every capability the server knows
///
/// Drives the role editor's checkbox matrix; the set is fixed at
/// compile time.
pub async fn capabilities() -> ApiResponse<Vec<&'static str>> {
    let caps: Vec<&'static str> = ALL_CAPABILITIES.iter().map(|c| c.as_str()).collect();
    ApiResponse::success(caps)
}

/// Get role by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Role>> {
    let repo = RoleRepository::new(state.get_db());
    let role = repo.find_by_id(&id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::RoleNotFound, format!("Role {} not found", id))
    })?;
    Ok(ApiResponse::success(role))
}

/// Create a new role
pub async fn create(
    State(state): State<ServerState>,
    actor: CurrentActor,
    headers: HeaderMap,
    Json(payload): Json<RoleCreate>,
) -> AppResult<ApiResponse<Role>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // 只有超管能铸造新的超管角色
    if payload.is_super_admin && !actor.is_super_admin {
        return Err(AppError::permission_denied(
            "Only a super admin can grant the super admin flag",
        ));
    }

    let repo = RoleRepository::new(state.get_db());
    let created = repo.create(payload).await.map_err(|e| match e {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::RoleSlugExists, msg),
        other => other.into(),
    })?;

    let resource_id = created.id.as_ref().map(|id| id.to_string());
    let meta = RequestMeta::from_headers(&headers);
    state
        .get_audit()
        .record_logged(
            &actor.id,
            AuditAction::Create,
            AuditResource::ActorOrRole,
            resource_id.clone(),
            Some(create_snapshot(&created, AuditResource::ActorOrRole)),
            &meta,
        )
        .await;

    tracing::info!(
        actor_id = %actor.id,
        role_id = ?resource_id,
        slug = %created.slug,
        "Role created"
    );

    Ok(ApiResponse::success(created))
}

/// Update a role
///
/// The repository rejects changes to the protected role before
/// anything else, so the audit trail only sees committed updates.
pub async fn update(
    State(state): State<ServerState>,
    actor: CurrentActor,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<RoleUpdate>,
) -> AppResult<ApiResponse<Role>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    // 同样的上限：非超管不能把既有角色抬成超管
    if payload.is_super_admin == Some(true) && !actor.is_super_admin {
        return Err(AppError::permission_denied(
            "Only a super admin can grant the super admin flag",
        ));
    }

    let repo = RoleRepository::new(state.get_db());
    let before = repo.find_by_id(&id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::RoleNotFound, format!("Role {} not found", id))
    })?;

    let updated = repo.update(&id, payload).await.map_err(|e| match e {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::RoleSlugExists, msg),
        other => other.into(),
    })?;

    let resource_id = updated.id.as_ref().map(|id| id.to_string());
    let meta = RequestMeta::from_headers(&headers);
    state
        .get_audit()
        .record_logged(
            &actor.id,
            AuditAction::Update,
            AuditResource::ActorOrRole,
            resource_id,
            Some(create_diff(&before, &updated, AuditResource::ActorOrRole)),
            &meta,
        )
        .await;

    Ok(ApiResponse::success(updated))
}

/// Soft-delete a role
///
/// Accounts still referencing the role keep resolving it for
/// capability checks; it only disappears from the assignment list.
pub async fn delete(
    State(state): State<ServerState>,
    actor: CurrentActor,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let repo = RoleRepository::new(state.get_db());
    let existing = repo.find_by_id(&id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::RoleNotFound, format!("Role {} not found", id))
    })?;

    let result = repo.delete(&id).await?;

    if result {
        let resource_id = existing.id.as_ref().map(|id| id.to_string());
        let meta = RequestMeta::from_headers(&headers);
        state
            .get_audit()
            .record_logged(
                &actor.id,
                AuditAction::Delete,
                AuditResource::ActorOrRole,
                resource_id,
                Some(create_delete_details(&existing.name)),
                &meta,
            )
            .await;

        tracing::info!(actor_id = %actor.id, slug = %existing.slug, "Role deleted");
    }

    Ok(ApiResponse::success(result))
}
