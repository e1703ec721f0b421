//! Account management handlers.
//!
//! Every route here sits behind the `ManageUsers` capability layer, so the
//! handlers only deal with the request itself.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};
use tracing::instrument;
use utoipa::ToSchema;

use crate::api::error::{ApiError, ErrorBody};
use crate::api::handlers::pagination::PaginationQuery;
use crate::api::routes::ApiState;
use crate::auth::models::AuthContext;
use crate::auth::user::{
    CreateUserRequest, ResetPasswordRequest, UpdateStatusRequest, UpdateUserRequest, User,
};
use crate::auth::user_service::MAX_PAGE_SIZE;
use crate::domain::UserId;

/// Response for the user listing.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ListUsersResponse {
    pub users: Vec<User>,
    pub total: i64,
    pub limit: i64,
    pub offset: i64,
}

fn parse_user_id(id: &str) -> Result<UserId, ApiError> {
    UserId::parse(id).map_err(|_| ApiError::not_found(format!("User '{}' not found", id)))
}

#[utoipa::path(
    post,
    path = "/api/v1/users",
    request_body = CreateUserRequest,
    responses(
        (status = 201, description = "User created", body = User),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 403, description = "Missing ManageUsers capability", body = ErrorBody),
        (status = 409, description = "Email or username already in use", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
#[instrument(skip(state, payload), fields(username = %payload.username, actor = %context.user_id))]
pub async fn create_user(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Json(payload): Json<CreateUserRequest>,
) -> Result<(StatusCode, Json<User>), ApiError> {
    let user = state.user_service.create_user(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(
    get,
    path = "/api/v1/users",
    params(PaginationQuery),
    responses(
        (status = 200, description = "Page of users", body = ListUsersResponse),
        (status = 403, description = "Missing ManageUsers capability", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
#[instrument(skip(state), fields(limit = %query.limit, offset = %query.offset))]
pub async fn list_users(
    State(state): State<ApiState>,
    Query(query): Query<PaginationQuery>,
) -> Result<Json<ListUsersResponse>, ApiError> {
    let (limit, offset) = query.clamp(MAX_PAGE_SIZE);
    let (users, total) = state.user_service.list_users(limit, offset).await?;

    Ok(Json(ListUsersResponse { users, total, limit, offset }))
}

#[utoipa::path(
    get,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    responses(
        (status = 200, description = "User found", body = User),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
#[instrument(skip(state), fields(target_user_id = %id))]
pub async fn get_user(
    State(state): State<ApiState>,
    Path(id): Path<String>,
) -> Result<Json<User>, ApiError> {
    let user_id = parse_user_id(&id)?;
    Ok(Json(state.user_service.get_user(&user_id).await?))
}

#[utoipa::path(
    patch,
    path = "/api/v1/users/{id}",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateUserRequest,
    responses(
        (status = 200, description = "User updated", body = User),
        (status = 400, description = "Validation error", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody),
        (status = 409, description = "Email or username already in use", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
#[instrument(skip(state, payload), fields(target_user_id = %id))]
pub async fn update_user(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateUserRequest>,
) -> Result<Json<User>, ApiError> {
    let user_id = parse_user_id(&id)?;
    Ok(Json(state.user_service.update_user(&user_id, payload).await?))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/status",
    params(("id" = String, Path, description = "User ID")),
    request_body = UpdateStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = User),
        (status = 400, description = "Cannot deactivate your own account", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
#[instrument(skip(state, payload), fields(target_user_id = %id, actor = %context.user_id))]
pub async fn update_user_status(
    State(state): State<ApiState>,
    Extension(context): Extension<AuthContext>,
    Path(id): Path<String>,
    Json(payload): Json<UpdateStatusRequest>,
) -> Result<Json<User>, ApiError> {
    let user_id = parse_user_id(&id)?;
    let user = state.user_service.set_status(&context.user_id, &user_id, payload.status).await?;
    Ok(Json(user))
}

#[utoipa::path(
    put,
    path = "/api/v1/users/{id}/password",
    params(("id" = String, Path, description = "User ID")),
    request_body = ResetPasswordRequest,
    responses(
        (status = 204, description = "Password reset"),
        (status = 400, description = "Password too short", body = ErrorBody),
        (status = 404, description = "User not found", body = ErrorBody)
    ),
    security(("bearerAuth" = [])),
    tag = "users"
)]
#[instrument(skip(state, payload), fields(target_user_id = %id))]
pub async fn reset_user_password(
    State(state): State<ApiState>,
    Path(id): Path<String>,
    Json(payload): Json<ResetPasswordRequest>,
) -> Result<StatusCode, ApiError> {
    let user_id = parse_user_id(&id)?;
    state.user_service.reset_password(&user_id, &payload.new_password).await?;
    Ok(StatusCode::NO_CONTENT)
}
