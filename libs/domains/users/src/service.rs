use chrono::Utc;
use rand::distr::Alphanumeric;
use rand::Rng;
use std::sync::Arc;
use uuid::Uuid;

use crate::bulk::{BulkConfig, BulkPipeline};
use crate::error::{UserError, UserResult};
use crate::hasher::{Argon2Hasher, CredentialHasher};
use crate::models::{
    AuthResponse, ChangeRoleRequest, GeneratedUser, ImportSummary, Permission, Role, User,
    UserResponse, UserStatus,
};
use crate::repository::UserRepository;
use crate::tokens::{TokenLedger, TokenRepository};

const TOKEN_LENGTH: usize = 48;

/// Identity attached to one request.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub id: Uuid,
    pub username: String,
    pub role: Role,
}

/// Caller identity, resolved once per request and passed explicitly.
///
/// There is no ambient "current user"; every operation that cares about the
/// caller takes one of these.
#[derive(Debug, Clone)]
pub enum AuthContext {
    Anonymous,
    Authenticated(CurrentUser),
}

impl AuthContext {
    /// The authenticated caller, or [`UserError::NotAuthenticated`].
    pub fn require(&self) -> UserResult<&CurrentUser> {
        match self {
            AuthContext::Authenticated(user) => Ok(user),
            AuthContext::Anonymous => Err(UserError::NotAuthenticated),
        }
    }

    /// The authenticated caller, further required to hold `permission`.
    pub fn require_permission(&self, permission: Permission) -> UserResult<&CurrentUser> {
        let user = self.require()?;
        if !user.role.has_permission(permission) {
            return Err(UserError::Forbidden(permission.as_str()));
        }
        Ok(user)
    }
}

/// Service layer for user operations
pub struct UserService<R: UserRepository + 'static, T: TokenRepository> {
    repository: Arc<R>,
    ledger: TokenLedger<T>,
    hasher: Arc<dyn CredentialHasher>,
    pipeline: BulkPipeline<R>,
}

impl<R: UserRepository + 'static, T: TokenRepository> UserService<R, T> {
    pub fn new(repository: R, tokens: T) -> Self {
        Self::with_parts(
            Arc::new(repository),
            Arc::new(tokens),
            Arc::new(Argon2Hasher),
            BulkConfig::default(),
        )
    }

    pub fn with_parts(
        repository: Arc<R>,
        tokens: Arc<T>,
        hasher: Arc<dyn CredentialHasher>,
        config: BulkConfig,
    ) -> Self {
        let pipeline = BulkPipeline::new(Arc::clone(&repository), Arc::clone(&hasher), config);
        Self {
            repository,
            ledger: TokenLedger::new(tokens),
            hasher,
            pipeline,
        }
    }

    pub fn bulk_config(&self) -> &BulkConfig {
        self.pipeline.config()
    }

    /// Generate synthetic user records without persisting anything.
    pub async fn generate_users(&self, count: usize) -> UserResult<Vec<GeneratedUser>> {
        self.pipeline.generate_users(count).await
    }

    /// Parse an uploaded JSON dataset and import it through the pipeline.
    pub async fn upload_batch(&self, raw: &[u8]) -> UserResult<ImportSummary> {
        if raw.is_empty() {
            return Err(UserError::Validation(
                "No user data provided to upload".to_string(),
            ));
        }

        let records: Vec<GeneratedUser> = serde_json::from_slice(raw)
            .map_err(|e| UserError::Validation(format!("Malformed user dataset: {e}")))?;

        self.pipeline.import_users(records).await
    }

    /// Authenticate by email (falling back to username), mark the account
    /// online, revoke any previously valid tokens and issue a fresh one.
    pub async fn authenticate(&self, identifier: &str, password: &str) -> UserResult<AuthResponse> {
        let user = match self.repository.get_by_email(identifier).await? {
            Some(user) => Some(user),
            None => self.repository.get_by_username(identifier).await?,
        };
        let Some(mut user) = user else {
            return Err(UserError::InvalidCredentials);
        };

        if !user.enabled || !user.account_non_locked {
            return Err(UserError::InvalidCredentials);
        }
        if !self.hasher.verify(password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        user.status = UserStatus::Online;
        user.updated_at = Utc::now();
        let user = self.repository.update(user).await?;

        self.ledger.revoke_all(user.id).await?;
        let token = self.ledger.issue(user.id, opaque_token()).await?;

        tracing::info!(user_id = %user.id, username = %user.username, "User logged in");
        Ok(AuthResponse {
            user: user.into(),
            token: token.token,
        })
    }

    /// Mark the caller offline and revoke all of their tokens.
    pub async fn logout(&self, ctx: &AuthContext) -> UserResult<()> {
        let current = ctx.require()?;

        if let Some(mut user) = self.repository.get_by_id(current.id).await? {
            user.status = UserStatus::Offline;
            user.updated_at = Utc::now();
            self.repository.update(user).await?;
        }

        self.ledger.revoke_all(current.id).await?;
        tracing::info!(user_id = %current.id, "User logged out");
        Ok(())
    }

    /// Profile of the authenticated caller.
    pub async fn current_user(&self, ctx: &AuthContext) -> UserResult<UserResponse> {
        let current = ctx.require()?;
        let user = self
            .repository
            .get_by_id(current.id)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("User {}", current.id)))?;
        Ok(user.into())
    }

    /// Look up any user's profile by username. Requires `admin:read`.
    pub async fn get_user_by_username(
        &self,
        ctx: &AuthContext,
        username: &str,
    ) -> UserResult<UserResponse> {
        ctx.require_permission(Permission::AdminRead)?;
        let user = self
            .repository
            .get_by_username(username)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("User '{username}'")))?;
        Ok(user.into())
    }

    /// Change another user's role. Requires `admin:update`.
    pub async fn change_role(
        &self,
        ctx: &AuthContext,
        request: ChangeRoleRequest,
    ) -> UserResult<UserResponse> {
        let caller = ctx.require_permission(Permission::AdminUpdate)?;

        let mut user = self
            .repository
            .get_by_email(&request.email)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("User '{}'", request.email)))?;

        user.role = request.role;
        user.updated_at = Utc::now();
        let user = self.repository.update(user).await?;

        tracing::info!(
            user_id = %user.id,
            role = %user.role,
            changed_by = %caller.id,
            "Changed user role"
        );
        Ok(user.into())
    }

    /// Change the caller's own password after verifying the current one.
    pub async fn change_password(
        &self,
        ctx: &AuthContext,
        current_password: &str,
        new_password: &str,
    ) -> UserResult<()> {
        let current = ctx.require()?;
        let mut user = self
            .repository
            .get_by_id(current.id)
            .await?
            .ok_or_else(|| UserError::NotFound(format!("User {}", current.id)))?;

        if !self.hasher.verify(current_password, &user.password_hash)? {
            return Err(UserError::InvalidCredentials);
        }

        user.password_hash = self.hasher.hash(new_password)?;
        user.updated_at = Utc::now();
        self.repository.update(user).await?;

        tracing::info!(user_id = %current.id, "Changed password");
        Ok(())
    }

    /// Resolve a bearer token to a caller identity.
    ///
    /// Anything short of a valid token backed by an existing user resolves
    /// to [`AuthContext::Anonymous`], never to an error.
    pub async fn resolve_token(&self, bearer: Option<&str>) -> UserResult<AuthContext> {
        let Some(bearer) = bearer else {
            return Ok(AuthContext::Anonymous);
        };

        let Some(token) = self.ledger.find_valid(bearer).await? else {
            return Ok(AuthContext::Anonymous);
        };

        let Some(user) = self.repository.get_by_id(token.user_id).await? else {
            return Ok(AuthContext::Anonymous);
        };

        Ok(AuthContext::Authenticated(CurrentUser {
            id: user.id,
            username: user.username,
            role: user.role,
        }))
    }

    /// Create one user directly, hashing the given plaintext password.
    pub async fn create_user(&self, candidate: GeneratedUser) -> UserResult<UserResponse> {
        let password_hash = self.hasher.hash(&candidate.password)?;
        let user = self
            .repository
            .create(User::from_candidate(candidate, password_hash))
            .await?;
        Ok(user.into())
    }
}

fn opaque_token() -> String {
    let mut rng = rand::rng();
    (0..TOKEN_LENGTH)
        .map(|_| rng.sample(Alphanumeric) as char)
        .collect()
}
