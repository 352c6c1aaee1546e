use serde::Deserialize;
use std::collections::HashMap;
use std::env;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    pub server: ServerConfig,
    pub provider: ProviderConfig,
    pub oauth: OAuthConfig,
    #[serde(default)]
    pub token: TokenConfig,
    #[serde(default)]
    pub payment: PaymentConfig,
    pub booking: BookingConfig,
    #[serde(default)]
    pub aggregator: AggregationConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    pub auth: AuthConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    /// Public origin; OAuth and checkout redirect URLs hang off it unless set explicitly.
    pub public_url: String,
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProviderConfig {
    /// Operator domain, e.g. `charters` for `charters.bokun.io`.
    pub domain: String,
    #[serde(default = "default_host_template")]
    pub host_template: String,
    pub octo_base_url: String,
    pub native_base_url: String,
    /// Overrides the per-domain host for GraphQL calls.
    #[serde(default)]
    pub graphql_base_url: Option<String>,
    #[serde(default)]
    pub octo_api_key: String,
    #[serde(default = "default_capabilities")]
    pub octo_capabilities: Vec<String>,
    #[serde(default)]
    pub access_key: String,
    #[serde(default)]
    pub secret_key: String,
    pub activity_id: String,
    #[serde(default)]
    pub booking_channel_uuid: Option<String>,
    #[serde(default = "default_lang")]
    pub lang: String,
    #[serde(default = "default_currency")]
    pub currency: String,
    #[serde(default = "default_request_timeout")]
    pub request_timeout_ms: u64,
}

fn default_host_template() -> String {
    "https://{domain}.bokun.io".to_string()
}
fn default_capabilities() -> Vec<String> {
    vec!["octo/pricing".to_string()]
}
fn default_lang() -> String {
    "EN".to_string()
}
fn default_currency() -> String {
    "EUR".to_string()
}
fn default_request_timeout() -> u64 {
    15_000
}

#[derive(Debug, Deserialize, Clone)]
pub struct OAuthConfig {
    pub client_id: String,
    pub client_secret: String,
    /// Defaults to `{server.public_url}/callback`.
    #[serde(default)]
    pub redirect_uri: Option<String>,
    #[serde(default = "default_state_ttl")]
    pub state_ttl_seconds: u64,
    #[serde(default = "default_true")]
    pub enforce_state: bool,
}

fn default_state_ttl() -> u64 {
    600
}
fn default_true() -> bool {
    true
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct TokenConfig {
    /// Runtime secret that wins over any persisted token.
    #[serde(default)]
    pub access_token_override: Option<String>,
    #[serde(default)]
    pub redis_url: Option<String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct PaymentConfig {
    /// Checkout is skipped entirely when unset.
    #[serde(default)]
    pub secret_key: Option<String>,
    #[serde(default = "default_payment_base")]
    pub api_base_url: String,
    /// Templates with a `{booking_id}` placeholder. Default to pages under `server.public_url`.
    #[serde(default)]
    pub success_url: Option<String>,
    #[serde(default)]
    pub cancel_url: Option<String>,
}

impl Default for PaymentConfig {
    fn default() -> Self {
        Self {
            secret_key: None,
            api_base_url: default_payment_base(),
            success_url: None,
            cancel_url: None,
        }
    }
}

fn default_payment_base() -> String {
    "https://api.stripe.com".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct BookingConfig {
    pub product_id: String,
    #[serde(default = "default_option")]
    pub option_id: String,
    #[serde(default = "default_unit")]
    pub unit_id: String,
    #[serde(default = "default_hold")]
    pub hold_minutes: u32,
    #[serde(default = "default_prefix")]
    pub reference_prefix: String,
}

fn default_option() -> String {
    "DEFAULT".to_string()
}
fn default_unit() -> String {
    "adult".to_string()
}
fn default_hold() -> u32 {
    30
}
fn default_prefix() -> String {
    "CHR".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct AggregationConfig {
    pub max_concurrency: usize,
    pub detail_timeout_ms: u64,
    pub overall_timeout_ms: u64,
    pub page_size: u32,
}

impl Default for AggregationConfig {
    fn default() -> Self {
        Self {
            max_concurrency: 8,
            detail_timeout_ms: 5_000,
            overall_timeout_ms: 20_000,
            page_size: 50,
        }
    }
}

#[derive(Debug, Deserialize, Clone, Default)]
pub struct CatalogConfig {
    /// Pricing category id → display name. Keys are strings because TOML tables are.
    #[serde(default)]
    pub category_names: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Clone)]
pub struct AuthConfig {
    pub jwt_secret: String,
}

impl Config {
    pub fn load() -> Result<Self, config::ConfigError> {
        let run_mode = env::var("RUN_MODE").unwrap_or_else(|_| "development".into());

        let s = config::Config::builder()
            .add_source(config::File::with_name("config/default"))
            // Optional per-environment overrides
            .add_source(config::File::with_name(&format!("config/{}", run_mode)).required(false))
            // Never checked in
            .add_source(config::File::with_name("config/local").required(false))
            // e.g. `CHARTER__PROVIDER__SECRET_KEY=...`
            .add_source(config::Environment::with_prefix("CHARTER").separator("__"))
            .build()?;

        let cfg: Config = s.try_deserialize()?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn public_path(&self, path: &str) -> String {
        format!("{}{}", self.server.public_url.trim_end_matches('/'), path)
    }

    pub fn oauth_redirect_uri(&self) -> String {
        self.oauth
            .redirect_uri
            .clone()
            .unwrap_or_else(|| self.public_path("/callback"))
    }

    pub fn checkout_success_url(&self) -> String {
        self.payment
            .success_url
            .clone()
            .unwrap_or_else(|| self.public_path("/booking/success?booking_id={booking_id}"))
    }

    pub fn checkout_cancel_url(&self) -> String {
        self.payment
            .cancel_url
            .clone()
            .unwrap_or_else(|| self.public_path("/booking/cancelled?booking_id={booking_id}"))
    }

    pub fn validate(&self) -> Result<(), config::ConfigError> {
        charter_core::oauth::validate_domain(&self.provider.domain)
            .map_err(|e| config::ConfigError::Message(e.to_string()))?;
        if self.aggregator.max_concurrency == 0 {
            return Err(config::ConfigError::Message(
                "aggregator.max_concurrency must be at least 1".into(),
            ));
        }
        Ok(())
    }
}
