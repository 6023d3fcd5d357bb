use clap::Parser; // for cli
use std::sync::Arc;
use std::time::Duration;

use memtime_dashboard::rate_limit::{
    Clock, DisabledStorage, FileStorage, Scheduler, Storage, SystemClock, TokioScheduler,
};
use memtime_dashboard::{
    AppState, Args, Dashboard, MemtimeClient, NotificationCenter, RateLimitGuard, handlers,
};

// this is main async function with tokio
#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // parse cli arguments
    let args = Args::parse();

    pretty_env_logger::formatted_timed_builder()
        .parse_filters(&args.log_filter)
        .init();

    let clock: Arc<dyn Clock> = Arc::new(SystemClock);
    let scheduler: Arc<dyn Scheduler> = Arc::new(TokioScheduler::current());
    let storage = open_storage(&args);

    let notifications = NotificationCenter::new(clock.clone(), scheduler.clone());
    let guard = RateLimitGuard::init(
        storage,
        scheduler,
        clock,
        Arc::new(notifications.clone()),
    );

    let api = MemtimeClient::new(
        reqwest::Client::new(),
        &args.api_url,
        &args.api_key,
        Duration::from_secs(args.cache_ttl),
    );

    // creating shared state
    let state = Arc::new(AppState {
        dashboard: Dashboard::new(api, guard),
        notifications,
    });

    let app = handlers::router(state.clone());

    let addr = format!("0.0.0.0:{}", args.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    log::info!("Dashboard running on http://localhost:{}", args.port);
    log::info!("Forwarding to Memtime at {}", state.dashboard.api().base_url());
    log::info!("Cache TTL: {} seconds", args.cache_ttl);
    if state.guard().is_limited() {
        log::info!(
            "Rate limit cooldown still running: {}s left",
            state.guard().state().remaining_seconds
        );
    }

    axum::serve(listener, app).await?;
    Ok(())
}

// storage trouble only costs us persistence across restarts
fn open_storage(args: &Args) -> Arc<dyn Storage> {
    if args.no_persist {
        log::info!("Rate limit persistence disabled");
        return Arc::new(DisabledStorage);
    }
    match FileStorage::open(&args.storage_file) {
        Ok(storage) => {
            log::info!("Rate limit state kept in {}", storage.path().display());
            Arc::new(storage)
        }
        Err(e) => {
            log::warn!(
                "Cannot use {} for rate limit state, keeping it in memory: {}",
                args.storage_file.display(),
                e
            );
            Arc::new(DisabledStorage)
        }
    }
}
