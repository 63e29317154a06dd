use async_trait::async_trait;
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::{UserError, UserResult};
use crate::models::User;

/// Repository trait for User persistence.
///
/// The membership lookups exist so the import pipeline can check a whole
/// batch with two queries instead of N point lookups.
#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Create a single user
    async fn create(&self, user: User) -> UserResult<User>;

    /// Get a user by ID
    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>>;

    /// Get a user by email
    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>>;

    /// Get a user by username
    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>>;

    /// Update an existing user
    async fn update(&self, user: User) -> UserResult<User>;

    /// Which of the given emails already belong to persisted users
    async fn existing_emails(&self, emails: &HashSet<String>) -> UserResult<HashSet<String>>;

    /// Which of the given usernames already belong to persisted users
    async fn existing_usernames(&self, usernames: &HashSet<String>)
        -> UserResult<HashSet<String>>;

    /// Persist a batch in one call.
    ///
    /// The whole batch is rejected with [`UserError::Duplicate`] if any
    /// record violates the username/email uniqueness constraint; nothing is
    /// inserted in that case.
    async fn insert_many(&self, users: Vec<User>) -> UserResult<Vec<User>>;

    /// Total number of persisted users
    async fn count(&self) -> UserResult<usize>;
}

/// In-memory implementation of UserRepository (development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryUserRepository {
    users: Arc<RwLock<HashMap<Uuid, User>>>,
}

impl InMemoryUserRepository {
    pub fn new() -> Self {
        Self {
            users: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn create(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if users.values().any(|u| u.email == user.email) {
            return Err(UserError::Duplicate(user.email));
        }
        if users.values().any(|u| u.username == user.username) {
            return Err(UserError::Duplicate(user.username));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, username = %user.username, "Created user");
        Ok(user)
    }

    async fn get_by_id(&self, id: Uuid) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.get(&id).cloned())
    }

    async fn get_by_email(&self, email: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.email == email).cloned())
    }

    async fn get_by_username(&self, username: &str) -> UserResult<Option<User>> {
        let users = self.users.read().await;
        Ok(users.values().find(|u| u.username == username).cloned())
    }

    async fn update(&self, user: User) -> UserResult<User> {
        let mut users = self.users.write().await;

        if !users.contains_key(&user.id) {
            return Err(UserError::NotFound(format!("User {}", user.id)));
        }

        users.insert(user.id, user.clone());

        tracing::info!(user_id = %user.id, "Updated user");
        Ok(user)
    }

    async fn existing_emails(&self, emails: &HashSet<String>) -> UserResult<HashSet<String>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| emails.contains(&u.email))
            .map(|u| u.email.clone())
            .collect())
    }

    async fn existing_usernames(
        &self,
        usernames: &HashSet<String>,
    ) -> UserResult<HashSet<String>> {
        let users = self.users.read().await;
        Ok(users
            .values()
            .filter(|u| usernames.contains(&u.username))
            .map(|u| u.username.clone())
            .collect())
    }

    async fn insert_many(&self, batch: Vec<User>) -> UserResult<Vec<User>> {
        let mut users = self.users.write().await;

        // Validate the whole batch before touching the map, so a conflict
        // rejects the batch atomically.
        let mut batch_emails: HashSet<&str> = HashSet::with_capacity(batch.len());
        let mut batch_usernames: HashSet<&str> = HashSet::with_capacity(batch.len());
        for user in &batch {
            if users.values().any(|u| u.email == user.email)
                || !batch_emails.insert(user.email.as_str())
            {
                return Err(UserError::Duplicate(user.email.clone()));
            }
            if users.values().any(|u| u.username == user.username)
                || !batch_usernames.insert(user.username.as_str())
            {
                return Err(UserError::Duplicate(user.username.clone()));
            }
        }

        for user in &batch {
            users.insert(user.id, user.clone());
        }

        tracing::debug!(count = batch.len(), "Bulk-inserted users");
        Ok(batch)
    }

    async fn count(&self) -> UserResult<usize> {
        let users = self.users.read().await;
        Ok(users.len())
    }
}
