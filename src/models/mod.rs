pub mod app_config;
pub mod oauth;
pub mod readings;
pub mod session;

pub use app_config::{AppConfig, AppState, Credentials, DexcomEndpoints};
pub use oauth::{CallbackParams, OAuthRequest, TokenState};
pub use readings::{GlucoseRange, LoadedReadings, RangeQuery, Reading};
pub use session::{Notice, NoticeLevel, SessionContext, SessionPhase};
