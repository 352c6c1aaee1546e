use async_trait::async_trait;
use redis::AsyncCommands;
use tracing::info;

use charter_core::oauth::AccessToken;
use charter_core::repository::TokenRepository;
use charter_core::{CoreError, CoreResult};

/// Token records as JSON under `provider_token:{domain}`.
#[derive(Clone)]
pub struct RedisTokenRepository {
    client: redis::Client,
}

impl RedisTokenRepository {
    pub fn new(connection_string: &str) -> Result<Self, redis::RedisError> {
        let client = redis::Client::open(connection_string)?;
        Ok(Self { client })
    }

    pub fn key(domain: &str) -> String {
        format!("provider_token:{}", domain)
    }

    async fn connection(&self) -> CoreResult<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| CoreError::Transport(format!("redis: {}", e)))
    }
}

#[async_trait]
impl TokenRepository for RedisTokenRepository {
    async fn load(&self, domain: &str) -> CoreResult<Option<AccessToken>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn
            .get(Self::key(domain))
            .await
            .map_err(|e| CoreError::Transport(format!("redis: {}", e)))?;

        raw.map(|json| {
            serde_json::from_str(&json).map_err(|e| CoreError::Decode(format!("stored token for {}: {}", domain, e)))
        })
        .transpose()
    }

    async fn save(&self, token: &AccessToken) -> CoreResult<()> {
        let json = serde_json::to_string(token).map_err(|e| CoreError::Decode(e.to_string()))?;
        let mut conn = self.connection().await?;
        conn.set::<_, _, ()>(Self::key(&token.domain), json)
            .await
            .map_err(|e| CoreError::Transport(format!("redis: {}", e)))?;
        info!("Token persisted to redis for domain {}", token.domain);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_is_namespaced_by_domain() {
        assert_eq!(RedisTokenRepository::key("charters"), "provider_token:charters");
    }

    #[test]
    fn rejects_malformed_url() {
        assert!(RedisTokenRepository::new("not a url").is_err());
    }
}
