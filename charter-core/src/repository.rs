use async_trait::async_trait;

use crate::oauth::AccessToken;
use crate::CoreResult;

/// Persisted provider tokens, one record per operator domain.
#[async_trait]
pub trait TokenRepository: Send + Sync {
    async fn load(&self, domain: &str) -> CoreResult<Option<AccessToken>>;

    /// Replaces any previous record for the token's domain.
    async fn save(&self, token: &AccessToken) -> CoreResult<()>;
}
