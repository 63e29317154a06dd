use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::error::UserResult;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum TokenType {
    #[default]
    Bearer,
}

/// Bearer token row.
///
/// State machine: `valid` (both flags false) -> `revoked` (both flags true),
/// one-directional and terminal. Rows are never physically deleted.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Token {
    pub id: Uuid,
    pub user_id: Uuid,
    pub token: String,
    pub token_type: TokenType,
    pub expired: bool,
    pub revoked: bool,
    pub created_at: DateTime<Utc>,
}

impl Token {
    pub fn new(user_id: Uuid, token: String) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            token,
            token_type: TokenType::Bearer,
            expired: false,
            revoked: false,
            created_at: Utc::now(),
        }
    }

    /// A token is valid iff it is neither expired nor revoked.
    pub fn is_valid(&self) -> bool {
        !self.expired && !self.revoked
    }
}

/// Repository trait for Token persistence
#[async_trait]
pub trait TokenRepository: Send + Sync {
    /// Persist a single token
    async fn save(&self, token: Token) -> UserResult<Token>;

    /// Persist a batch of tokens in one write
    async fn save_all(&self, tokens: Vec<Token>) -> UserResult<()>;

    /// All currently-valid tokens for a user
    async fn find_valid_by_user(&self, user_id: Uuid) -> UserResult<Vec<Token>>;

    /// Look up a token row by its opaque string
    async fn find_by_token(&self, token: &str) -> UserResult<Option<Token>>;
}

/// In-memory implementation of TokenRepository (development/testing)
#[derive(Debug, Default, Clone)]
pub struct InMemoryTokenRepository {
    tokens: Arc<RwLock<HashMap<Uuid, Token>>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self {
            tokens: Arc::new(RwLock::new(HashMap::new())),
        }
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn save(&self, token: Token) -> UserResult<Token> {
        let mut tokens = self.tokens.write().await;
        tokens.insert(token.id, token.clone());
        Ok(token)
    }

    async fn save_all(&self, batch: Vec<Token>) -> UserResult<()> {
        let mut tokens = self.tokens.write().await;
        for token in batch {
            tokens.insert(token.id, token);
        }
        Ok(())
    }

    async fn find_valid_by_user(&self, user_id: Uuid) -> UserResult<Vec<Token>> {
        let tokens = self.tokens.read().await;
        Ok(tokens
            .values()
            .filter(|t| t.user_id == user_id && t.is_valid())
            .cloned()
            .collect())
    }

    async fn find_by_token(&self, token: &str) -> UserResult<Option<Token>> {
        let tokens = self.tokens.read().await;
        Ok(tokens.values().find(|t| t.token == token).cloned())
    }
}

/// Issues bearer tokens and sweeps previously-valid ones per user.
///
/// `issue` and `revoke_all` are not serialized against each other: a token
/// issued while a sweep is in flight may or may not be swept. Callers that
/// need strict ordering must serialize issue/revoke per user externally.
#[derive(Debug, Clone)]
pub struct TokenLedger<T: TokenRepository> {
    repository: Arc<T>,
}

impl<T: TokenRepository> TokenLedger<T> {
    pub fn new(repository: Arc<T>) -> Self {
        Self { repository }
    }

    /// Create exactly one new valid token for the user.
    ///
    /// Other tokens for the same user are untouched; multiple simultaneously
    /// valid tokens per user are allowed.
    pub async fn issue(&self, user_id: Uuid, token: String) -> UserResult<Token> {
        let token = self.repository.save(Token::new(user_id, token)).await?;
        tracing::debug!(user_id = %user_id, token_id = %token.id, "Issued token");
        Ok(token)
    }

    /// Look up a token by its opaque string, returning it only while valid.
    pub async fn find_valid(&self, token: &str) -> UserResult<Option<Token>> {
        Ok(self
            .repository
            .find_by_token(token)
            .await?
            .filter(Token::is_valid))
    }

    /// Mark every currently-valid token for the user expired and revoked,
    /// persisting the batch in a single bulk write. No-op when the user has
    /// no valid tokens.
    pub async fn revoke_all(&self, user_id: Uuid) -> UserResult<()> {
        let mut valid = self.repository.find_valid_by_user(user_id).await?;
        if valid.is_empty() {
            return Ok(());
        }

        for token in &mut valid {
            token.expired = true;
            token.revoked = true;
        }

        let swept = valid.len();
        self.repository.save_all(valid).await?;
        tracing::debug!(user_id = %user_id, swept, "Revoked user tokens");
        Ok(())
    }
}
