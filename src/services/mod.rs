pub mod chart;
pub mod export;
pub mod http;
pub mod oauth_client;
pub mod readings_fetcher;
pub mod session_controller;
pub mod summary;

pub use chart::{ChartSeries, to_chart_series};
pub use oauth_client::OAuthClient;
pub use readings_fetcher::ReadingsFetcher;
pub use session_controller::{CallbackDecision, SessionAction, SessionController, Transition};
pub use summary::{GlucoseSummary, summarize};
