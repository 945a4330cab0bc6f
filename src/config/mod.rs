use rust_decimal::Decimal;
use std::env;

/// Process-level configuration, read from the environment once at startup.
/// Distinct from the domain `RewardConfig`, which is versioned, time-scoped
/// and lives in Postgres; the `seed_*` values only initialize the first
/// `reward_configs` row on an empty database.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub database_url: String,
    pub host: String,
    pub port: u16,

    // Background reward granter
    pub granter_enabled: bool,
    pub granter_interval_secs: u64,

    // Bootstrap reward parameters (first boot only)
    pub seed_config: bool,
    pub seed_min_holding_hours: i32,
    pub seed_min_balance_threshold: Decimal,
    pub seed_rate_per_500_units: Decimal,
    pub seed_max_daily_amount: Decimal,
    pub seed_snapshot_interval_hours: i32,
    pub seed_tolerance_percentage: Decimal,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        Ok(Self {
            database_url: env::var("DATABASE_URL")
                .map_err(|_| anyhow::anyhow!("DATABASE_URL must be set"))?,
            host: env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: env::var("PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()?,

            granter_enabled: env::var("GRANTER_ENABLED")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            granter_interval_secs: env::var("GRANTER_INTERVAL_SECS")
                .unwrap_or_else(|_| "3600".into())
                .parse()
                .unwrap_or(3600),

            seed_config: env::var("SEED_CONFIG")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            seed_min_holding_hours: env::var("SEED_MIN_HOLDING_HOURS")
                .unwrap_or_else(|_| "24".into())
                .parse()
                .unwrap_or(24),
            seed_min_balance_threshold: env::var("SEED_MIN_BALANCE_THRESHOLD")
                .unwrap_or_else(|_| "500".into())
                .parse()
                .unwrap_or(Decimal::from(500)),
            seed_rate_per_500_units: env::var("SEED_RATE_PER_500_UNITS")
                .unwrap_or_else(|_| "1".into())
                .parse()
                .unwrap_or(Decimal::ONE),
            seed_max_daily_amount: env::var("SEED_MAX_DAILY_AMOUNT")
                .unwrap_or_else(|_| "10".into())
                .parse()
                .unwrap_or(Decimal::from(10)),
            seed_snapshot_interval_hours: env::var("SEED_SNAPSHOT_INTERVAL_HOURS")
                .unwrap_or_else(|_| "12".into())
                .parse()
                .unwrap_or(12),
            seed_tolerance_percentage: env::var("SEED_TOLERANCE_PERCENTAGE")
                .unwrap_or_else(|_| "5".into())
                .parse()
                .unwrap_or(Decimal::from(5)),
        })
    }
}
