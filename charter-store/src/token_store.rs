use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use charter_core::oauth::AccessToken;
use charter_core::repository::TokenRepository;
use charter_core::{CoreError, CoreResult};

/// Process-local token records. Lost on restart.
#[derive(Default)]
pub struct InMemoryTokenRepository {
    tokens: RwLock<HashMap<String, AccessToken>>,
}

impl InMemoryTokenRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl TokenRepository for InMemoryTokenRepository {
    async fn load(&self, domain: &str) -> CoreResult<Option<AccessToken>> {
        Ok(self.tokens.read().await.get(domain).cloned())
    }

    async fn save(&self, token: &AccessToken) -> CoreResult<()> {
        self.tokens.write().await.insert(token.domain.clone(), token.clone());
        Ok(())
    }
}

/// Read path: configured override first, then the persisted record for the domain.
/// Written only by the OAuth callback.
pub struct TokenStore {
    override_token: Option<String>,
    repository: Arc<dyn TokenRepository>,
}

impl TokenStore {
    pub fn new(override_token: Option<String>, repository: Arc<dyn TokenRepository>) -> Self {
        Self {
            override_token: override_token.filter(|t| !t.trim().is_empty()),
            repository,
        }
    }

    pub async fn get(&self, domain: &str) -> CoreResult<Option<AccessToken>> {
        if let Some(value) = &self.override_token {
            return Ok(Some(AccessToken {
                value: value.clone(),
                scopes: Vec::new(),
                vendor_id: None,
                domain: domain.to_string(),
                acquired_at: Utc::now(),
            }));
        }
        self.repository.load(domain).await
    }

    /// Like [`get`](Self::get) but absence is a `NotAuthenticated` error.
    pub async fn require(&self, domain: &str) -> CoreResult<AccessToken> {
        self.get(domain)
            .await?
            .ok_or_else(|| CoreError::NotAuthenticated(domain.to_string()))
    }

    pub async fn put(&self, token: AccessToken) -> CoreResult<()> {
        self.repository.save(&token).await?;
        tracing::info!(
            domain = %token.domain,
            scopes = token.scopes.len(),
            vendor_id = ?token.vendor_id,
            "provider token stored"
        );
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn token(domain: &str, value: &str) -> AccessToken {
        AccessToken {
            value: value.into(),
            scopes: vec!["BOOKING_READ".into()],
            vendor_id: Some("77".into()),
            domain: domain.into(),
            acquired_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn absence_is_not_authenticated() {
        let store = TokenStore::new(None, Arc::new(InMemoryTokenRepository::new()));
        assert!(store.get("charters").await.unwrap().is_none());
        assert!(matches!(store.require("charters").await, Err(CoreError::NotAuthenticated(_))));
    }

    #[tokio::test]
    async fn put_overwrites_per_domain() {
        let store = TokenStore::new(None, Arc::new(InMemoryTokenRepository::new()));
        store.put(token("charters", "first")).await.unwrap();
        store.put(token("charters", "second")).await.unwrap();
        store.put(token("other", "third")).await.unwrap();

        assert_eq!(store.require("charters").await.unwrap().value, "second");
        assert_eq!(store.require("other").await.unwrap().value, "third");
    }

    #[tokio::test]
    async fn override_wins_over_persisted_token() {
        let repo = Arc::new(InMemoryTokenRepository::new());
        repo.save(&token("charters", "persisted")).await.unwrap();

        let store = TokenStore::new(Some("from-env".into()), repo.clone());
        assert_eq!(store.require("charters").await.unwrap().value, "from-env");

        let blank = TokenStore::new(Some("  ".into()), repo);
        assert_eq!(blank.require("charters").await.unwrap().value, "persisted");
    }
}
