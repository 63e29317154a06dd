use utoipa::OpenApi;

use domain_users::models::{
    AuthResponse, ChangePasswordRequest, ChangeRoleRequest, GeneratedUser, Gender, ImportSummary,
    LoginRequest, Permission, Role, UserResponse, UserStatus,
};

/// OpenAPI document for the user management API
#[derive(OpenApi)]
#[openapi(
    info(
        title = "User Management API",
        description = "User management with bulk generation/import and token-based auth"
    ),
    components(schemas(
        AuthResponse,
        ChangePasswordRequest,
        ChangeRoleRequest,
        GeneratedUser,
        Gender,
        ImportSummary,
        LoginRequest,
        Permission,
        Role,
        UserResponse,
        UserStatus,
    ))
)]
pub struct ApiDoc;
