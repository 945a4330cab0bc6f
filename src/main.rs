use chrono::Utc;

use softstake::api::router::create_router;
use softstake::config::AppConfig;
use softstake::db::{self, reward_config_repo};
use softstake::services::granter::run_reward_granter;
use softstake::AppState;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = AppConfig::from_env()?;
    let addr = format!("{}:{}", config.host, config.port);

    tracing::info!("Connecting to database...");
    let pool = db::init_pool(&config.database_url).await?;
    sqlx::migrate!("./migrations").run(&pool).await?;
    tracing::info!("Database connected");

    let metrics_handle = softstake::metrics::init_metrics();

    // First boot on an empty database: seed the initial reward config so
    // the engine is operational without a manual admin call.
    if config.seed_config {
        let seed = reward_config_repo::NewRewardConfig {
            min_holding_hours: config.seed_min_holding_hours,
            min_balance_threshold: config.seed_min_balance_threshold,
            rate_per_500_units: config.seed_rate_per_500_units,
            max_daily_amount: config.seed_max_daily_amount,
            snapshot_interval_hours: config.seed_snapshot_interval_hours,
            tolerance_percentage: config.seed_tolerance_percentage,
            effective_from: Utc::now(),
        };
        if let Some(seeded) = reward_config_repo::seed_if_empty(&pool, &seed).await? {
            tracing::info!(
                threshold = %seeded.min_balance_threshold,
                rate = %seeded.rate_per_500_units,
                "Seeded initial reward config"
            );
        }
    }

    // Background reward granter
    if config.granter_enabled {
        let granter_pool = pool.clone();
        let interval = config.granter_interval_secs;
        tokio::spawn(async move {
            run_reward_granter(granter_pool, interval).await;
        });
    } else {
        tracing::info!("Reward granter disabled (GRANTER_ENABLED=false)");
    }

    let state = AppState {
        db: pool,
        config,
        metrics_handle,
    };
    let router = create_router(state);

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    tracing::info!("Server listening on {addr}");
    axum::serve(listener, router).await?;

    Ok(())
}

fn init_tracing() {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    tracing_subscriber::registry()
        .with(EnvFilter::from_default_env())
        .with(fmt::layer())
        .init();
}
