// Vault membership handlers

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use vaultd_core::service::MembershipError;

use crate::{
    error::AppError,
    state::AppState,
    types::{AddMemberRequest, MembershipResponse},
};

/// Add a member to a vault.
/// (POST /vaults/{vault_id}/members)
pub(crate) async fn add_member_handler(
    State(state): State<AppState>,
    Path(vault_id): Path<String>,
    Json(payload): Json<AddMemberRequest>,
) -> Result<StatusCode, AppError> {
    if payload.user.trim().is_empty() {
        return Err(AppError::bad_request("user id must not be empty"));
    }

    state.membership.add(&vault_id, &payload.user).await?;
    Ok(StatusCode::OK)
}

/// Check vault membership.
/// (GET /vaults/{vault_id}/members/{member_id})
pub(crate) async fn check_membership_handler(
    State(state): State<AppState>,
    Path((vault_id, member_id)): Path<(String, String)>,
) -> Result<Json<MembershipResponse>, AppError> {
    state.membership.check(&vault_id, &member_id).await?;

    Ok(Json(MembershipResponse {
        message: format!("success! user {member_id} is a member of vault {vault_id}"),
    }))
}

/// Remove a member from a vault.
/// (POST /vaults/{vault_id}/members/{member_id}/remove)
pub(crate) async fn remove_member_handler(
    State(state): State<AppState>,
    Path((vault_id, member_id)): Path<(String, String)>,
) -> Result<StatusCode, AppError> {
    state
        .membership
        .remove(&vault_id, &member_id)
        .await
        .map_err(|err| match err {
            MembershipError::NotFound { vault, user } => {
                AppError::cannot_remove_nonmember(&vault, &user)
            }
            other => AppError::from(other),
        })?;

    Ok(StatusCode::OK)
}
