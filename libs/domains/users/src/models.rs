use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;
use validator::Validate;

/// Permission tags attached to roles.
///
/// Resolution is a table lookup on [`Role::permissions`]; there is no
/// dynamic dispatch involved.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    AdminRead,
    AdminUpdate,
    AdminCreate,
    AdminDelete,
    ManagementRead,
    ManagementUpdate,
    ManagementCreate,
    ManagementDelete,
}

impl Permission {
    /// Canonical string form, e.g. for audit logs.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::AdminRead => "admin:read",
            Permission::AdminUpdate => "admin:update",
            Permission::AdminCreate => "admin:create",
            Permission::AdminDelete => "admin:delete",
            Permission::ManagementRead => "management:read",
            Permission::ManagementUpdate => "management:update",
            Permission::ManagementCreate => "management:create",
            Permission::ManagementDelete => "management:delete",
        }
    }
}

/// User roles
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Ordinary user, no special permissions.
    #[default]
    User,
    /// Privileged user with management permissions.
    Manager,
    /// Administrator with the highest level of permissions.
    Admin,
}

impl Role {
    /// Fixed permission set for each role.
    pub fn permissions(&self) -> &'static [Permission] {
        const USER: &[Permission] = &[];
        const MANAGER: &[Permission] = &[
            Permission::ManagementRead,
            Permission::ManagementUpdate,
            Permission::ManagementCreate,
            Permission::ManagementDelete,
        ];
        const ADMIN: &[Permission] = &[
            Permission::AdminRead,
            Permission::AdminUpdate,
            Permission::AdminCreate,
            Permission::AdminDelete,
        ];

        match self {
            Role::User => USER,
            Role::Manager => MANAGER,
            Role::Admin => ADMIN,
        }
    }

    pub fn has_permission(&self, permission: Permission) -> bool {
        self.permissions().contains(&permission)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Role::User => write!(f, "user"),
            Role::Manager => write!(f, "manager"),
            Role::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "user" => Ok(Role::User),
            "manager" => Ok(Role::Manager),
            "admin" => Ok(Role::Admin),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum UserStatus {
    Online,
    #[default]
    Offline,
}

/// User entity as persisted by the store.
///
/// `username` and `email` are unique across all persisted records; the
/// uniqueness constraint belongs to the store and is only observed here.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct User {
    /// Unique identifier
    pub id: Uuid,
    pub firstname: String,
    pub lastname: Option<String>,
    pub birth_date: Option<NaiveDate>,
    pub city: Option<String>,
    pub country: Option<String>,
    pub avatar: Option<String>,
    pub company: Option<String>,
    pub job_position: Option<String>,
    pub mobile: Option<String>,
    /// Unique username
    pub username: String,
    /// Unique email
    pub email: String,
    /// Credential secret, stored only in hashed form (never exposed)
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: Role,
    pub status: UserStatus,
    pub gender: Gender,
    pub enabled: bool,
    pub account_non_locked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Build a persisted-shape record from an import candidate.
    ///
    /// The credential must already be hashed; imported accounts start
    /// enabled and unlocked.
    pub fn from_candidate(candidate: GeneratedUser, password_hash: String) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::now_v7(),
            firstname: candidate.firstname,
            lastname: candidate.lastname,
            birth_date: candidate.birth_date,
            city: candidate.city,
            country: candidate.country,
            avatar: candidate.avatar,
            company: candidate.company,
            job_position: candidate.job_position,
            mobile: candidate.mobile,
            username: candidate.username,
            email: candidate.email,
            password_hash,
            role: candidate.role,
            status: UserStatus::Offline,
            gender: candidate.gender,
            enabled: true,
            account_non_locked: true,
            created_at: now,
            updated_at: now,
        }
    }
}

/// Synthetic user record produced by the generator, and equally the
/// candidate shape parsed back from an uploaded dataset.
///
/// Carries a plaintext password and no persisted identifier; hashing and
/// identity assignment happen at import time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct GeneratedUser {
    pub firstname: String,
    #[serde(default)]
    pub lastname: Option<String>,
    #[serde(default)]
    pub birth_date: Option<NaiveDate>,
    #[serde(default)]
    pub city: Option<String>,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar: Option<String>,
    #[serde(default)]
    pub company: Option<String>,
    #[serde(default)]
    pub job_position: Option<String>,
    #[serde(default)]
    pub mobile: Option<String>,
    pub username: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub role: Role,
    pub gender: Gender,
}

/// Outcome of one bulk import request.
///
/// `total_records == successfully_imported + failed_to_import` always holds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
pub struct ImportSummary {
    pub total_records: usize,
    pub successfully_imported: usize,
    pub failed_to_import: usize,
}

/// User response DTO (without the password hash)
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub firstname: String,
    pub lastname: Option<String>,
    pub username: String,
    pub email: String,
    pub role: Role,
    pub status: UserStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            firstname: user.firstname,
            lastname: user.lastname,
            username: user.username,
            email: user.email,
            role: user.role,
            status: user.status,
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

/// DTO for user login
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct LoginRequest {
    #[validate(length(min = 1, max = 80))]
    pub email: String,
    #[validate(length(min = 1))]
    pub password: String,
}

/// Response after a successful login
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct AuthResponse {
    pub user: UserResponse,
    pub token: String,
}

/// DTO for changing another user's role (admin only)
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangeRoleRequest {
    #[validate(email, length(max = 80))]
    pub email: String,
    pub role: Role,
}

/// DTO for changing the caller's own password
#[derive(Debug, Clone, Deserialize, Validate, ToSchema)]
pub struct ChangePasswordRequest {
    #[validate(length(min = 1))]
    pub current_password: String,
    #[validate(length(min = 8, max = 128))]
    pub new_password: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn role_permission_tables() {
        assert!(Role::User.permissions().is_empty());
        assert!(Role::Manager.has_permission(Permission::ManagementUpdate));
        assert!(!Role::Manager.has_permission(Permission::AdminUpdate));
        assert!(Role::Admin.has_permission(Permission::AdminRead));
        assert!(!Role::Admin.has_permission(Permission::ManagementRead));
    }

    #[test]
    fn role_round_trips_through_str() {
        for role in [Role::User, Role::Manager, Role::Admin] {
            let parsed: Role = role.to_string().parse().unwrap();
            assert_eq!(parsed, role);
        }
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn candidate_becomes_enabled_unlocked_user() {
        let candidate = GeneratedUser {
            firstname: "Ada".to_string(),
            lastname: Some("Lovelace".to_string()),
            birth_date: None,
            city: None,
            country: None,
            avatar: None,
            company: None,
            job_position: None,
            mobile: None,
            username: "ada01".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            role: Role::Manager,
            gender: Gender::Female,
        };

        let user = User::from_candidate(candidate, "hashed".to_string());

        assert!(user.enabled);
        assert!(user.account_non_locked);
        assert_eq!(user.status, UserStatus::Offline);
        assert_eq!(user.password_hash, "hashed");
        assert_eq!(user.role, Role::Manager);
    }

    #[test]
    fn password_hash_is_never_serialized() {
        let candidate = GeneratedUser {
            firstname: "Ada".to_string(),
            lastname: None,
            birth_date: None,
            city: None,
            country: None,
            avatar: None,
            company: None,
            job_position: None,
            mobile: None,
            username: "ada01".to_string(),
            email: "ada@example.com".to_string(),
            password: "secret".to_string(),
            role: Role::User,
            gender: Gender::Female,
        };
        let user = User::from_candidate(candidate, "hashed".to_string());

        let json = serde_json::to_string(&user).unwrap();
        assert!(!json.contains("hashed"));
    }
}
