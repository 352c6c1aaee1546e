use std::collections::HashMap;
use std::time::Duration;

use chrono::Utc;
use tokio::sync::Mutex;

use charter_core::oauth::OAuthState;
use charter_core::{CoreError, CoreResult};

/// One-time-use install states. A state is consumed by the first callback that presents it.
pub struct OAuthStateStore {
    ttl: Duration,
    states: Mutex<HashMap<String, OAuthState>>,
}

impl OAuthStateStore {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            states: Mutex::new(HashMap::new()),
        }
    }

    pub async fn issue(&self, domain: &str) -> OAuthState {
        let state = OAuthState::issue(domain);
        let mut states = self.states.lock().await;
        self.purge_expired(&mut states);
        states.insert(state.nonce.clone(), state.clone());
        state
    }

    /// Removes the state whether or not it validates, so a nonce can never be replayed.
    pub async fn consume(&self, nonce: &str, domain: &str) -> CoreResult<OAuthState> {
        let mut states = self.states.lock().await;
        let state = states
            .remove(nonce)
            .ok_or_else(|| CoreError::Signature("unknown or already used state".into()))?;

        if self.is_expired(&state) {
            return Err(CoreError::Signature("state expired".into()));
        }
        if state.domain != domain {
            return Err(CoreError::Signature(format!(
                "state was issued for {}, not {}",
                state.domain, domain
            )));
        }
        Ok(state)
    }

    pub async fn len(&self) -> usize {
        self.states.lock().await.len()
    }

    fn is_expired(&self, state: &OAuthState) -> bool {
        let age = Utc::now().signed_duration_since(state.issued_at);
        age.to_std().map(|a| a > self.ttl).unwrap_or(false)
    }

    fn purge_expired(&self, states: &mut HashMap<String, OAuthState>) {
        states.retain(|_, s| !self.is_expired(s));
    }
}
