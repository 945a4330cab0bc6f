use rust_decimal::Decimal;

use crate::models::RewardConfig;

/// Balance step size the reward rate is quoted against.
const REWARD_UNIT_SIZE: i64 = 500;

/// Compute the daily reward for an eligible basis balance.
///
/// `amount = min(floor(basis / 500) * rate_per_500_units, max_daily_amount)`,
/// zero when the basis sits below the minimum balance threshold. Pure —
/// eligibility itself is the caller's concern.
pub fn compute_reward(basis_balance: Decimal, config: &RewardConfig) -> Decimal {
    if basis_balance < config.min_balance_threshold {
        return Decimal::ZERO;
    }

    let units = (basis_balance / Decimal::from(REWARD_UNIT_SIZE)).floor();
    (units * config.rate_per_500_units).min(config.max_daily_amount)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
