use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{HeaderMap, HeaderValue, header},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use validator::Validate;

use crate::error::{UserError, UserResult};
use crate::models::{
    AuthResponse, ChangePasswordRequest, ChangeRoleRequest, ImportSummary, LoginRequest,
    UserResponse,
};
use crate::repository::UserRepository;
use crate::service::{AuthContext, UserService};
use crate::tokens::TokenRepository;

/// Create the users router with all HTTP endpoints
pub fn users_router<R, T>(service: Arc<UserService<R, T>>) -> Router
where
    R: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    Router::new()
        .route("/generate", get(generate_users))
        .route("/batch", post(upload_batch))
        .route("/me", get(current_user))
        .route("/roles", post(change_role))
        .route("/change-password", post(change_password))
        .route("/{username}", get(get_user))
        .with_state(service)
}

/// Create the auth router (login/logout)
pub fn auth_router<R, T>(service: Arc<UserService<R, T>>) -> Router
where
    R: UserRepository + 'static,
    T: TokenRepository + 'static,
{
    Router::new()
        .route("/", post(login))
        .route("/logout", post(logout))
        .with_state(service)
}

#[derive(Debug, Deserialize)]
struct GenerateParams {
    count: i64,
}

/// Generate a synthetic user dataset, served as a JSON file download
///
/// GET /users/generate?count=N
async fn generate_users<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    Query(params): Query<GenerateParams>,
) -> UserResult<impl IntoResponse> {
    let max = service.bulk_config().max_generation_count;
    if params.count <= 0 || params.count as usize > max {
        return Err(UserError::Validation(format!(
            "Count must be a positive integer no greater than {max}"
        )));
    }

    let count = params.count as usize;
    let users = service.generate_users(count).await?;

    let disposition = format!("attachment; filename=generated_{count}_users.json");
    let disposition = HeaderValue::from_str(&disposition)
        .map_err(|e| UserError::Internal(e.to_string()))?;

    Ok((
        AppendHeaders([(header::CONTENT_DISPOSITION, disposition)]),
        Json(users),
    ))
}

/// Import an uploaded JSON dataset of user records
///
/// POST /users/batch
async fn upload_batch<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    body: Bytes,
) -> UserResult<Json<ImportSummary>> {
    let summary = service.upload_batch(&body).await?;
    Ok(Json(summary))
}

/// Profile of the authenticated caller
///
/// GET /users/me
async fn current_user<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    headers: HeaderMap,
) -> UserResult<Json<UserResponse>> {
    let ctx = caller(&service, &headers).await?;
    let user = service.current_user(&ctx).await?;
    Ok(Json(user))
}

/// Look up a user by username (admin only)
///
/// GET /users/:username
async fn get_user<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    headers: HeaderMap,
    Path(username): Path<String>,
) -> UserResult<Json<UserResponse>> {
    let ctx = caller(&service, &headers).await?;
    let user = service.get_user_by_username(&ctx, &username).await?;
    Ok(Json(user))
}

/// Change another user's role (admin only)
///
/// POST /users/roles
async fn change_role<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    headers: HeaderMap,
    Json(input): Json<ChangeRoleRequest>,
) -> UserResult<Json<UserResponse>> {
    input
        .validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let ctx = caller(&service, &headers).await?;
    let user = service.change_role(&ctx, input).await?;
    Ok(Json(user))
}

/// Change password response
#[derive(Debug, Serialize)]
struct MessageResponse {
    message: String,
}

/// Change the caller's own password
///
/// POST /users/change-password
async fn change_password<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    headers: HeaderMap,
    Json(input): Json<ChangePasswordRequest>,
) -> UserResult<Json<MessageResponse>> {
    input
        .validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let ctx = caller(&service, &headers).await?;
    service
        .change_password(&ctx, &input.current_password, &input.new_password)
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// User login
///
/// POST /auth
async fn login<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    Json(input): Json<LoginRequest>,
) -> UserResult<Json<AuthResponse>> {
    input
        .validate()
        .map_err(|e| UserError::Validation(e.to_string()))?;

    let response = service.authenticate(&input.email, &input.password).await?;
    Ok(Json(response))
}

/// User logout
///
/// POST /auth/logout
async fn logout<R: UserRepository, T: TokenRepository>(
    State(service): State<Arc<UserService<R, T>>>,
    headers: HeaderMap,
) -> UserResult<Json<MessageResponse>> {
    let ctx = caller(&service, &headers).await?;
    service.logout(&ctx).await?;

    Ok(Json(MessageResponse {
        message: "Logged out".to_string(),
    }))
}

/// Resolve the `Authorization: Bearer ...` header into a caller identity.
async fn caller<R: UserRepository, T: TokenRepository>(
    service: &UserService<R, T>,
    headers: &HeaderMap,
) -> UserResult<AuthContext> {
    let bearer = headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.strip_prefix("Bearer "));

    service.resolve_token(bearer).await
}
