use std::sync::Arc;
use std::time::Duration;

use charter_catalog::{AvailabilityPricingFetcher, CategoryNames};
use charter_core::payment::PaymentGateway;
use charter_core::repository::TokenRepository;
use charter_core::supplier::BookingProvider;
use charter_order::{AggregatorConfig, BookingAggregator, BookingOrchestrator, OrchestratorConfig};
use charter_store::app_config::Config;
use charter_store::{
    InMemoryTokenRepository, OAuthStateStore, ProviderClient, RedisTokenRepository, StripeCheckoutGateway,
    TokenExchangeClient, TokenStore,
};

#[derive(Clone)]
pub struct AuthConfig {
    pub secret: String,
}

#[derive(Clone)]
pub struct OAuthSettings {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub host_template: String,
    pub enforce_state: bool,
}

#[derive(Clone)]
pub struct BookingDefaults {
    pub product_id: String,
    pub option_id: String,
    pub unit_id: String,
}

#[derive(Clone)]
pub struct AppState {
    /// Operator domain served by this instance.
    pub domain: String,
    pub provider: Arc<dyn BookingProvider>,
    pub tokens: Arc<TokenStore>,
    pub oauth_states: Arc<OAuthStateStore>,
    pub token_exchange: Arc<TokenExchangeClient>,
    pub pricing: Arc<AvailabilityPricingFetcher>,
    pub orchestrator: Arc<BookingOrchestrator>,
    pub aggregator: Arc<BookingAggregator>,
    pub oauth: OAuthSettings,
    pub booking: BookingDefaults,
    pub page_size: u32,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn from_config(config: &Config) -> anyhow::Result<Self> {
        let provider = Arc::new(ProviderClient::new(&config.provider)?);

        let repository: Arc<dyn TokenRepository> = match &config.token.redis_url {
            Some(url) => {
                tracing::info!("Token records persisted to redis");
                Arc::new(RedisTokenRepository::new(url)?)
            }
            None => {
                tracing::warn!("No token.redis_url set; provider tokens live in memory only");
                Arc::new(InMemoryTokenRepository::new())
            }
        };
        let tokens = Arc::new(TokenStore::new(config.token.access_token_override.clone(), repository));

        let gateway: Option<Arc<dyn PaymentGateway>> = match &config.payment.secret_key {
            Some(key) if !key.trim().is_empty() => Some(Arc::new(StripeCheckoutGateway::new(
                &config.payment.api_base_url,
                key,
                config.provider.request_timeout_ms,
            )?)),
            _ => {
                tracing::warn!("No payment.secret_key set; bookings will skip checkout");
                None
            }
        };

        let orchestrator = BookingOrchestrator::new(
            provider.clone(),
            gateway,
            OrchestratorConfig {
                hold_minutes: config.booking.hold_minutes,
                reference_prefix: config.booking.reference_prefix.clone(),
                success_url: config.checkout_success_url(),
                cancel_url: config.checkout_cancel_url(),
            },
        );

        let aggregator = BookingAggregator::new(
            provider.clone(),
            AggregatorConfig {
                max_concurrency: config.aggregator.max_concurrency,
                detail_timeout: Duration::from_millis(config.aggregator.detail_timeout_ms),
                overall_timeout: Duration::from_millis(config.aggregator.overall_timeout_ms),
                default_currency: config.provider.currency.clone(),
            },
        );

        let pricing = AvailabilityPricingFetcher::new(
            provider.clone(),
            CategoryNames::from_config(&config.catalog.category_names),
            config.provider.activity_id.clone(),
        );

        Ok(Self {
            domain: config.provider.domain.clone(),
            provider,
            tokens,
            oauth_states: Arc::new(OAuthStateStore::new(Duration::from_secs(config.oauth.state_ttl_seconds))),
            token_exchange: Arc::new(TokenExchangeClient::new(
                &config.provider.host_template,
                &config.oauth,
                config.provider.request_timeout_ms,
            )?),
            pricing: Arc::new(pricing),
            orchestrator: Arc::new(orchestrator),
            aggregator: Arc::new(aggregator),
            oauth: OAuthSettings {
                client_id: config.oauth.client_id.clone(),
                client_secret: config.oauth.client_secret.clone(),
                redirect_uri: config.oauth_redirect_uri(),
                host_template: config.provider.host_template.clone(),
                enforce_state: config.oauth.enforce_state,
            },
            booking: BookingDefaults {
                product_id: config.booking.product_id.clone(),
                option_id: config.booking.option_id.clone(),
                unit_id: config.booking.unit_id.clone(),
            },
            page_size: config.aggregator.page_size,
            auth: AuthConfig {
                secret: config.auth.jwt_secret.clone(),
            },
        })
    }
}
