use std::sync::Arc;

use tokio::sync::RwLock;

/// Bearer token shared by every request a client issues. Cloning yields
/// another handle to the same token.
#[derive(Debug, Clone, Default)]
pub struct AuthSession {
    token: Arc<RwLock<Option<String>>>,
}

impl AuthSession {
    pub fn anonymous() -> Self {
        Self::default()
    }

    pub fn with_token(token: impl Into<String>) -> Self {
        let token = token.into();
        let token = if token.trim().is_empty() {
            None
        } else {
            Some(token)
        };
        Self {
            token: Arc::new(RwLock::new(token)),
        }
    }

    pub async fn token(&self) -> Option<String> {
        self.token.read().await.clone()
    }

    pub async fn set_token(&self, token: impl Into<String>) {
        *self.token.write().await = Some(token.into());
    }

    /// Drops the token; returns whether one was present.
    pub async fn clear(&self) -> bool {
        self.token.write().await.take().is_some()
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token.read().await.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn clones_share_the_same_token() {
        let session = AuthSession::with_token("abc");
        let other = session.clone();

        assert!(other.clear().await);
        assert_eq!(session.token().await, None);
        assert!(!session.clear().await);
    }

    #[tokio::test]
    async fn blank_token_is_treated_as_anonymous() {
        let session = AuthSession::with_token("   ");
        assert!(!session.is_authenticated().await);
        session.set_token("fresh").await;
        assert_eq!(session.token().await.as_deref(), Some("fresh"));
    }
}
