use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::models::RewardConfig;

/// The open-period half of the tracker state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenPeriod {
    pub started_at: DateTime<Utc>,
    pub threshold_at_start: Decimal,
    pub min_balance_observed: Decimal,
}

/// Per-wallet tracker state: either no period is running, or exactly one
/// open period with a running balance floor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TrackerState {
    NoPeriod,
    Open(OpenPeriod),
}

/// What a single sample application did, so the persistence layer knows
/// which rows to write.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transition {
    /// Below threshold with no period running — nothing to record.
    Unchanged,
    /// A new period opened at the sample time.
    Opened(OpenPeriod),
    /// The open period survived; the floor may have ratcheted down.
    Continued { min_balance_observed: Decimal },
    /// The open period closed at the sample time.
    Closed { ended_at: DateTime<Utc> },
    /// The open period closed and a new one opened at the same timestamp
    /// (the sample broke tolerance but still meets the entry threshold).
    ClosedAndReopened {
        ended_at: DateTime<Utc>,
        reopened: OpenPeriod,
    },
}

/// Apply one balance sample to a wallet's tracker state.
///
/// Tolerance rule: a sample keeps an open period alive only if it clears
/// BOTH `floor * (1 - tol)` and `threshold_at_start * (1 - tol)`. The floor
/// only ever ratchets down (`min(floor, balance)`), so a transient spike
/// cannot raise it; the threshold-at-start check stops a wallet from
/// draining below the entry threshold through many small tolerance-sized
/// steps without ever breaking the period.
pub fn apply_sample(
    state: &TrackerState,
    balance: Decimal,
    observed_at: DateTime<Utc>,
    config: &RewardConfig,
) -> (TrackerState, Transition) {
    let threshold = config.min_balance_threshold;
    let factor = config.tolerance_factor();

    match state {
        TrackerState::NoPeriod => {
            if balance >= threshold {
                let opened = OpenPeriod {
                    started_at: observed_at,
                    threshold_at_start: threshold,
                    min_balance_observed: balance,
                };
                (TrackerState::Open(opened.clone()), Transition::Opened(opened))
            } else {
                (TrackerState::NoPeriod, Transition::Unchanged)
            }
        }
        TrackerState::Open(open) => {
            let holds_floor = balance >= open.min_balance_observed * factor;
            let holds_start = balance >= open.threshold_at_start * factor;

            if holds_floor && holds_start {
                let floor = open.min_balance_observed.min(balance);
                let next = OpenPeriod {
                    min_balance_observed: floor,
                    ..open.clone()
                };
                (
                    TrackerState::Open(next),
                    Transition::Continued {
                        min_balance_observed: floor,
                    },
                )
            } else if balance >= threshold {
                // Tolerance broken but still above the entry threshold:
                // close and immediately reopen at the same timestamp.
                let reopened = OpenPeriod {
                    started_at: observed_at,
                    threshold_at_start: threshold,
                    min_balance_observed: balance,
                };
                (
                    TrackerState::Open(reopened.clone()),
                    Transition::ClosedAndReopened {
                        ended_at: observed_at,
                        reopened,
                    },
                )
            } else {
                (
                    TrackerState::NoPeriod,
                    Transition::Closed {
                        ended_at: observed_at,
                    },
                )
            }
        }
    }
}

/// A reconstructed period, as produced by [`replay`]. `ended_at = None`
/// is the trailing still-open period (at most one, always last).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PeriodSpan {
    pub started_at: DateTime<Utc>,
    pub ended_at: Option<DateTime<Utc>>,
    pub min_balance_observed: Decimal,
    pub threshold_at_start: Decimal,
}

/// Rebuild a wallet's full period history from its ordered sample history.
///
/// Pure function of (samples, config): running it any number of times over
/// the same input yields the same spans, which is what makes out-of-order
/// arrivals safe — the pipeline just re-runs this from the affected point.
/// `samples` must be sorted ascending by observation time.
pub fn replay(samples: &[(DateTime<Utc>, Decimal)], config: &RewardConfig) -> Vec<PeriodSpan> {
    let mut spans = Vec::new();
    let mut state = TrackerState::NoPeriod;

    for &(observed_at, balance) in samples {
        let (next, transition) = apply_sample(&state, balance, observed_at, config);

        match transition {
            Transition::Closed { ended_at } => {
                if let TrackerState::Open(open) = &state {
                    spans.push(PeriodSpan {
                        started_at: open.started_at,
                        ended_at: Some(ended_at),
                        min_balance_observed: open.min_balance_observed,
                        threshold_at_start: open.threshold_at_start,
                    });
                }
            }
            Transition::ClosedAndReopened { ended_at, .. } => {
                if let TrackerState::Open(open) = &state {
                    spans.push(PeriodSpan {
                        started_at: open.started_at,
                        ended_at: Some(ended_at),
                        min_balance_observed: open.min_balance_observed,
                        threshold_at_start: open.threshold_at_start,
                    });
                }
            }
            Transition::Unchanged | Transition::Opened(_) | Transition::Continued { .. } => {}
        }

        state = next;
    }

    if let TrackerState::Open(open) = state {
        spans.push(PeriodSpan {
            started_at: open.started_at,
            ended_at: None,
            min_balance_observed: open.min_balance_observed,
            threshold_at_start: open.threshold_at_start,
        });
    }

    spans
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, TimeZone};
    use uuid::Uuid;

    fn test_config() -> RewardConfig {
        RewardConfig {
            id: Uuid::new_v4(),
            min_holding_hours: 24,
            min_balance_threshold: Decimal::from(500),
            rate_per_500_units: Decimal::ONE,
            max_daily_amount: Decimal::from(10),
            snapshot_interval_hours: 12,
            tolerance_percentage: Decimal::from(5),
            effective_from: Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap(),
            created_at: None,
        }
    }

    fn t0() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap()
    }

    fn hours(h: i64) -> Duration {
        Duration::hours(h)
    }

    fn samples(points: &[(i64, i64)]) -> Vec<(DateTime<Utc>, Decimal)> {
        points
            .iter()
            .map(|&(h, b)| (t0() + hours(h), Decimal::from(b)))
            .collect()
    }

    #[test]
    fn test_opens_at_threshold() {
        let cfg = test_config();
        let (state, transition) =
            apply_sample(&TrackerState::NoPeriod, Decimal::from(500), t0(), &cfg);

        assert!(matches!(transition, Transition::Opened(_)));
        match state {
            TrackerState::Open(open) => {
                assert_eq!(open.started_at, t0());
                assert_eq!(open.min_balance_observed, Decimal::from(500));
                assert_eq!(open.threshold_at_start, Decimal::from(500));
            }
            _ => panic!("expected open state"),
        }
    }

    #[test]
    fn test_below_threshold_stays_no_period() {
        let cfg = test_config();
        let (state, transition) =
            apply_sample(&TrackerState::NoPeriod, Decimal::from(499), t0(), &cfg);

        assert_eq!(state, TrackerState::NoPeriod);
        assert_eq!(transition, Transition::Unchanged);
    }

    #[test]
    fn test_dip_within_tolerance_keeps_period_open() {
        let cfg = test_config();
        // 600 → 580: 580 >= 600*0.95 = 570 and >= 500*0.95 = 475
        let spans = replay(&samples(&[(0, 600), (12, 580)]), &cfg);

        assert_eq!(spans.len(), 1);
        assert!(spans[0].ended_at.is_none());
        assert_eq!(spans[0].min_balance_observed, Decimal::from(580));
    }

    #[test]
    fn test_floor_never_increases() {
        let cfg = test_config();
        // Spike back to 620 after dipping to 580: floor must stay 580.
        let spans = replay(&samples(&[(0, 600), (12, 580), (24, 620)]), &cfg);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].min_balance_observed, Decimal::from(580));
    }

    #[test]
    fn test_scenario_a_close_and_reopen() {
        // Spec'd walkthrough: (t0,600), (t0+12h,580), (t0+25h,550).
        // Floor after sample 2 is 580; 550 < 580*0.95 = 551 breaks the
        // period, but 550 >= 500 reopens one at the same timestamp.
        let cfg = test_config();
        let spans = replay(&samples(&[(0, 600), (12, 580), (25, 550)]), &cfg);

        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].started_at, t0());
        assert_eq!(spans[0].ended_at, Some(t0() + hours(25)));
        assert_eq!(spans[0].min_balance_observed, Decimal::from(580));

        assert_eq!(spans[1].started_at, t0() + hours(25));
        assert!(spans[1].ended_at.is_none());
        assert_eq!(spans[1].min_balance_observed, Decimal::from(550));
    }

    #[test]
    fn test_scenario_b_flat_hold() {
        // Exactly 500 for 48h with zero dips: one open period spanning it.
        let cfg = test_config();
        let spans = replay(
            &samples(&[(0, 500), (12, 500), (24, 500), (36, 500), (48, 500)]),
            &cfg,
        );

        assert_eq!(spans.len(), 1);
        assert!(spans[0].ended_at.is_none());
        assert_eq!(spans[0].started_at, t0());
        assert_eq!(spans[0].min_balance_observed, Decimal::from(500));
    }

    #[test]
    fn test_boiling_frog_drain_breaks_period() {
        // Each step stays within 5% of the previous floor, but the
        // threshold-at-start check still catches the cumulative drain:
        // 500*0.95 = 475, so the first sample below 475 must break it.
        let cfg = test_config();
        let spans = replay(
            &samples(&[(0, 500), (12, 480), (24, 460), (36, 445)]),
            &cfg,
        );

        // 480 survives (>= 475); 460 < 475 breaks, below 500 → no reopen;
        // 445 stays out.
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].ended_at, Some(t0() + hours(24)));
        assert_eq!(spans[0].min_balance_observed, Decimal::from(480));
    }

    #[test]
    fn test_drop_to_zero_closes_without_reopen() {
        let cfg = test_config();
        let spans = replay(&samples(&[(0, 600), (12, 0)]), &cfg);

        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].ended_at, Some(t0() + hours(12)));
    }

    #[test]
    fn test_at_most_one_open_span() {
        let cfg = test_config();
        let spans = replay(
            &samples(&[(0, 600), (12, 100), (24, 700), (36, 650), (48, 50), (60, 900)]),
            &cfg,
        );

        let open = spans.iter().filter(|s| s.ended_at.is_none()).count();
        assert_eq!(open, 1);
        assert!(spans.last().unwrap().ended_at.is_none(), "open span must be last");
    }

    #[test]
    fn test_replay_is_idempotent() {
        let cfg = test_config();
        let history = samples(&[
            (0, 600),
            (12, 580),
            (25, 550),
            (36, 540),
            (48, 100),
            (60, 800),
        ]);

        let first = replay(&history, &cfg);
        let second = replay(&history, &cfg);

        assert_eq!(first, second);
    }

    #[test]
    fn test_reopened_period_has_fresh_start() {
        let cfg = test_config();
        let spans = replay(&samples(&[(0, 1000), (12, 550)]), &cfg);

        // 550 < 1000*0.95 breaks tolerance, 550 >= 500 reopens.
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[1].started_at, t0() + hours(12));
        assert_eq!(spans[1].threshold_at_start, Decimal::from(500));
    }

    #[test]
    fn test_empty_history_yields_no_spans() {
        let cfg = test_config();
        assert!(replay(&[], &cfg).is_empty());
    }
}
