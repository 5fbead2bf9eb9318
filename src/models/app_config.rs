use crate::error::DexcomError;
use crate::services::{OAuthClient, ReadingsFetcher, SessionController, http};
use oauth2::{ClientId, ClientSecret, RedirectUrl};
use reqwest::Url;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

pub const DEFAULT_REDIRECT_URI: &str = "http://localhost:8501";
pub const DEFAULT_BASE_URL: &str = "https://sandbox-api.dexcom.com";
pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:8501";
pub const DEFAULT_HTTP_TIMEOUT_SECS: u64 = 30;

const AUTHORIZE_PATH: &str = "/v2/oauth2/login";
const TOKEN_PATH: &str = "/v2/oauth2/token";
const EGVS_PATH: &str = "/v2/users/self/egvs";

#[derive(Clone, Debug)]
pub struct Credentials {
    pub client_id: ClientId,
    pub client_secret: ClientSecret,
    pub redirect_uri: RedirectUrl,
}

#[derive(Clone, Debug)]
pub struct DexcomEndpoints {
    pub authorize: Url,
    pub token: Url,
    pub egvs: Url,
}

impl DexcomEndpoints {
    pub fn from_base(base_url: &str) -> Result<Self, DexcomError> {
        let base = Url::parse(base_url).map_err(|e| {
            DexcomError::Configuration(format!("DEXCOM_BASE_URL is not a valid URL: {e}"))
        })?;
        let join = |path: &str| {
            base.join(path).map_err(|e| {
                DexcomError::Configuration(format!("cannot build endpoint {path}: {e}"))
            })
        };

        Ok(Self {
            authorize: join(AUTHORIZE_PATH)?,
            token: join(TOKEN_PATH)?,
            egvs: join(EGVS_PATH)?,
        })
    }
}

#[derive(Clone, Debug)]
pub struct AppConfig {
    pub credentials: Credentials,
    pub endpoints: DexcomEndpoints,
    pub http_timeout: Duration,
    pub bind_addr: String,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, DexcomError> {
        use dotenvy::dotenv;
        use std::env;

        dotenv().ok();

        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds the configuration from any key/value source. Blank values count
    /// as missing.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, DexcomError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let value = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        let client_id = value("DEXCOM_CLIENT_ID");
        let client_secret = value("DEXCOM_CLIENT_SECRET");

        let (client_id, client_secret) = match (client_id, client_secret) {
            (Some(id), Some(secret)) => (id, secret),
            (id, secret) => {
                let missing: Vec<&str> = [
                    id.is_none().then_some("DEXCOM_CLIENT_ID"),
                    secret.is_none().then_some("DEXCOM_CLIENT_SECRET"),
                ]
                .into_iter()
                .flatten()
                .collect();
                return Err(DexcomError::Configuration(format!(
                    "missing Dexcom app credentials: {}",
                    missing.join(", ")
                )));
            }
        };

        let redirect_uri = value("DEXCOM_REDIRECT_URI")
            .unwrap_or_else(|| DEFAULT_REDIRECT_URI.to_string());
        let redirect_uri = RedirectUrl::new(redirect_uri).map_err(|e| {
            DexcomError::Configuration(format!("DEXCOM_REDIRECT_URI is not a valid URL: {e}"))
        })?;

        let base_url = value("DEXCOM_BASE_URL").unwrap_or_else(|| DEFAULT_BASE_URL.to_string());
        let endpoints = DexcomEndpoints::from_base(&base_url)?;

        let http_timeout = match value("DEXCOM_HTTP_TIMEOUT_SECS") {
            Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
                DexcomError::Configuration(format!("DEXCOM_HTTP_TIMEOUT_SECS must be seconds: {e}"))
            })?,
            None => DEFAULT_HTTP_TIMEOUT_SECS,
        };

        let bind_addr = value("BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string());

        Ok(Self {
            credentials: Credentials {
                client_id: ClientId::new(client_id),
                client_secret: ClientSecret::new(client_secret),
                redirect_uri,
            },
            endpoints,
            http_timeout: Duration::from_secs(http_timeout),
            bind_addr,
        })
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub oauth: OAuthClient,
    pub fetcher: ReadingsFetcher,
    /// Held across a callback's load, state commit and exchange so that two
    /// deliveries of the same redirect cannot both see the pending state.
    pub callback_gate: Arc<Mutex<()>>,
}

impl AppState {
    pub fn new(config: AppConfig) -> Result<Self, DexcomError> {
        let client = http::build_client(config.http_timeout)?;

        Ok(Self {
            oauth: OAuthClient::new(
                client.clone(),
                config.credentials.clone(),
                config.endpoints.clone(),
            ),
            fetcher: ReadingsFetcher::new(client, config.endpoints.clone()),
            callback_gate: Arc::new(Mutex::new(())),
            config,
        })
    }

    pub fn controller(&self) -> SessionController<'_> {
        SessionController::new(&self.oauth, &self.fetcher)
    }
}
