//! Admin Account API Handlers

use axum::{
    Json,
    extract::{Path, State},
    http::HeaderMap,
};
use validator::Validate;

use crate::audit::{
    AuditAction, AuditResource, RequestMeta, create_delete_details, create_diff, create_snapshot,
};
use crate::auth::{Capability, CurrentActor};
use crate::core::ServerState;
use crate::db::models::{Admin, AdminCreate, AdminUpdate};
use crate::db::repository::{AdminRepository, RepoError};
use crate::utils::{ApiResponse, AppError, AppResult, ErrorCode};

/// List all admin accounts
///
/// Secret hashes never leave the serializer.
pub async fn list(State(state): State<ServerState>) -> AppResult<ApiResponse<Vec<Admin>>> {
    let repo = AdminRepository::new(state.get_db());
    let admins = repo.find_all().await?;
    Ok(ApiResponse::success(admins))
}

/// Get admin account by id
pub async fn get_by_id(
    State(state): State<ServerState>,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<Admin>> {
    let repo = AdminRepository::new(state.get_db());
    let admin = repo.find_by_id(&id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::ActorNotFound, format!("Admin {} not found", id))
    })?;
    Ok(ApiResponse::success(admin))
}

/// Create a new admin account
pub async fn create(
    State(state): State<ServerState>,
    actor: CurrentActor,
    headers: HeaderMap,
    Json(payload): Json<AdminCreate>,
) -> AppResult<ApiResponse<Admin>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    let repo = AdminRepository::new(state.get_db());
    let created = repo.create(payload).await.map_err(|e| match e {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::ActorEmailExists, msg),
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
        admin_id = ?resource_id,
        email = %created.email,
        "Admin account created"
    );

    Ok(ApiResponse::success(created))
}

/// Update an admin account
///
/// Role reassignment requires assign-role on top of edit-actor; the
/// gate sits here because the route layer only sees the method, not
/// which fields the payload touches.
pub async fn update(
    State(state): State<ServerState>,
    actor: CurrentActor,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(payload): Json<AdminUpdate>,
) -> AppResult<ApiResponse<Admin>> {
    payload
        .validate()
        .map_err(|e| AppError::validation(e.to_string()))?;

    if payload.role.is_some() && !actor.allows(Capability::AssignRole) {
        return Err(AppError::capability_required(
            Capability::AssignRole.as_str(),
        ));
    }

    let repo = AdminRepository::new(state.get_db());
    let before = repo.find_by_id(&id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::ActorNotFound, format!("Admin {} not found", id))
    })?;

    let updated = repo.update(&id, payload).await.map_err(|e| match e {
        RepoError::Duplicate(msg) => AppError::with_message(ErrorCode::ActorEmailExists, msg),
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

/// Delete an admin account
///
/// Hard delete; audit entries keep the actor id and still render with
/// an "Unknown" name afterwards.
pub async fn delete(
    State(state): State<ServerState>,
    actor: CurrentActor,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> AppResult<ApiResponse<bool>> {
    let repo = AdminRepository::new(state.get_db());
    let existing = repo.find_by_id(&id).await?.ok_or_else(|| {
        AppError::with_message(ErrorCode::ActorNotFound, format!("Admin {} not found", id))
    })?;

    // Actors cannot remove their own account
    let target_id = existing
        .id
        .as_ref()
        .map(|id| id.to_string())
        .unwrap_or_default();
    if target_id == actor.id {
        return Err(AppError::cannot_delete_self());
    }

    let result = repo.delete(&id).await?;

    if result {
        let meta = RequestMeta::from_headers(&headers);
        state
            .get_audit()
            .record_logged(
                &actor.id,
                AuditAction::Delete,
                AuditResource::ActorOrRole,
                Some(target_id),
                Some(create_delete_details(&existing.email)),
                &meta,
            )
            .await;

        tracing::info!(
            actor_id = %actor.id,
            email = %existing.email,
            "Admin account deleted"
        );
    }

    Ok(ApiResponse::success(result))
}
