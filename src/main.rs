use dexcom_dashboard_server::models::app_config::DEFAULT_BIND_ADDR;
use dexcom_dashboard_server::{AppConfig, AppState, app, config_error_app};
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    if json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_target(true))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(false))
            .init();
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let (router, bind_addr) = match AppConfig::from_env() {
        Ok(config) => {
            let bind_addr = config.bind_addr.clone();
            info!(
                client_id = %config.credentials.client_id.as_str(),
                redirect_uri = %config.credentials.redirect_uri.as_str(),
                api = %config.endpoints.egvs,
                "configuration loaded"
            );
            (app(AppState::new(config)?), bind_addr)
        }
        Err(err) => {
            error!(error = %err, "cannot start the dashboard until the configuration is fixed");
            let bind_addr =
                std::env::var("BIND_ADDR").unwrap_or_else(|_| DEFAULT_BIND_ADDR.to_string());
            (config_error_app(&err), bind_addr)
        }
    };

    let listener = tokio::net::TcpListener::bind(&bind_addr).await?;
    info!("listening on http://{}", bind_addr);
    axum::serve(listener, router.into_make_service()).await?;

    Ok(())
}
