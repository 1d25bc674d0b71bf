use std::sync::Arc;

use smartmoney::api::router::create_router;
use smartmoney::config::AppConfig;
use smartmoney::db::{self, DomainStore, PgStore};
use smartmoney::execution::{SubmissionQueue, SwapRunner, TradeExecutor};
use smartmoney::gateway::{HttpGateway, MarketGateway};
use smartmoney::services::{
    run_periodic, PeriodicPass, PositionCloseMonitor, ProfitExitMonitor, SignalDetector,
};
use smartmoney::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let metrics_handle = smartmoney::metrics::init_metrics()?;

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    tracing::info!("Database connected, migrations applied");

    let store: Arc<dyn DomainStore> = Arc::new(PgStore::new(pool));
    let gateway: Arc<dyn MarketGateway> = Arc::new(HttpGateway::from_config(&config)?);
    let pipeline = Arc::new(config.pipeline.clone());

    // One queue for every pass so submissions from a wallet never interleave.
    let swaps = SwapRunner::new(gateway.clone(), SubmissionQueue::new(), pipeline.clone());

    let executor = TradeExecutor::new(
        gateway.clone(),
        store.clone(),
        swaps.clone(),
        pipeline.clone(),
    );
    let detector: Arc<dyn PeriodicPass> = Arc::new(SignalDetector::new(
        gateway.clone(),
        store.clone(),
        executor,
        pipeline.clone(),
    ));
    let profit_exit: Arc<dyn PeriodicPass> = Arc::new(ProfitExitMonitor::new(
        gateway.clone(),
        store.clone(),
        swaps,
        pipeline.clone(),
    ));
    let position_close: Arc<dyn PeriodicPass> = Arc::new(PositionCloseMonitor::new(
        gateway,
        store.clone(),
        pipeline.clone(),
    ));

    let mut passes = vec![
        tokio::spawn(run_periodic(detector, config.detect_interval_secs)),
        tokio::spawn(run_periodic(profit_exit, config.profit_exit_interval_secs)),
        tokio::spawn(run_periodic(position_close, config.position_close_interval_secs)),
    ];

    tracing::info!(
        chains = pipeline.chains.len(),
        reference_tokens = pipeline.reference_symbols.len(),
        dust_threshold = %pipeline.dust_threshold,
        "Copy-trading passes scheduled"
    );

    if config.api_enabled {
        let state = AppState {
            store,
            metrics_handle,
            api_token: config.api_token.clone(),
        };
        let router = create_router(state);

        let addr = format!("{}:{}", config.host, config.port);
        let listener = tokio::net::TcpListener::bind(&addr).await?;
        tracing::info!("Server listening on {addr}");
        axum::serve(listener, router).await?;
    } else {
        tracing::info!("Reporting API disabled (API_ENABLED=false)");
        // The scheduler loops never return; wait on them so the process stays up.
        if let Some(first) = passes.pop() {
            first.await?;
        }
    }

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let json = std::env::var("LOG_FORMAT").is_ok_and(|f| f.eq_ignore_ascii_case("json"));

    let registry = tracing_subscriber::registry().with(filter);
    if json {
        registry.with(fmt::layer().json()).init();
    } else {
        registry.with(fmt::layer()).init();
    }
}
