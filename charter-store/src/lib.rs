pub mod app_config;
pub mod http;
pub mod oauth_client;
pub mod oauth_state;
pub mod payment;
pub mod provider;
pub mod redis_repo;
pub mod token_store;

pub use oauth_client::TokenExchangeClient;
pub use oauth_state::OAuthStateStore;
pub use payment::StripeCheckoutGateway;
pub use provider::ProviderClient;
pub use redis_repo::RedisTokenRepository;
pub use token_store::{InMemoryTokenRepository, TokenStore};
