use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{extractors::AdminUser, password::hash_password},
    common::{parse_id, ApiJson, MessageResponse},
    error::ApiError,
    state::AppState,
    users::{
        dto::{PublicUser, UpdateUserRequest, UserListResponse, UserResponse},
        repo_types::UserPatch,
        validation::{non_blank, parse_email, parse_role},
    },
};

const USER_NOT_FOUND: &str = "User not found";

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/users", get(list_users))
        .route(
            "/users/:id",
            get(get_user).put(update_user).delete(delete_user),
        )
}

#[instrument(skip(state), fields(admin_id = %admin.0.id))]
pub async fn list_users(
    State(state): State<AppState>,
    admin: AdminUser,
) -> Result<Json<UserListResponse>, ApiError> {
    let users = state
        .users
        .list()
        .await
        .map_err(|e| ApiError::internal("Server error", e))?;
    Ok(Json(UserListResponse {
        success: true,
        users: users.into_iter().map(PublicUser::from).collect(),
    }))
}

#[instrument(skip(state), fields(admin_id = %admin.0.id))]
pub async fn get_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let user = state
        .users
        .find_by_id(id)
        .await
        .map_err(|e| ApiError::internal("Server error", e))?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;
    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

/// Turns the request into a patch: blank strings are ignored, the rest is validated.
fn build_patch(req: UpdateUserRequest) -> Result<UserPatch, ApiError> {
    let email = non_blank(req.email)
        .map(|e| parse_email(&e))
        .transpose()?;
    let role = non_blank(req.role)
        .map(|r| parse_role(&r))
        .transpose()?;
    let password_hash = req
        .password
        .filter(|p| !p.is_empty())
        .map(|p| hash_password(&p))
        .transpose()
        .map_err(|e| ApiError::internal("Server error", e))?;

    Ok(UserPatch {
        name: non_blank(req.name),
        email,
        role,
        password_hash,
    })
}

#[instrument(skip(state, payload), fields(admin_id = %admin.0.id))]
pub async fn update_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
    ApiJson(payload): ApiJson<UpdateUserRequest>,
) -> Result<Json<UserResponse>, ApiError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let patch = build_patch(payload)?;
    let password_changed = patch.password_hash.is_some();

    let user = state
        .users
        .update(id, patch)
        .await?
        .ok_or_else(|| ApiError::not_found(USER_NOT_FOUND))?;

    info!(user_id = %user.id, role = %user.role, password_changed, "user updated");
    Ok(Json(UserResponse {
        success: true,
        user: user.into(),
    }))
}

#[instrument(skip(state), fields(admin_id = %admin.0.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    admin: AdminUser,
    Path(id): Path<String>,
) -> Result<Json<MessageResponse>, ApiError> {
    let id = parse_id(&id, USER_NOT_FOUND)?;
    let deleted = state
        .users
        .delete(id)
        .await
        .map_err(|e| ApiError::internal("Server error", e))?;
    if !deleted {
        return Err(ApiError::not_found(USER_NOT_FOUND));
    }
    info!(user_id = %id, "user deleted");
    Ok(Json(MessageResponse::ok("User deleted successfully")))
}
