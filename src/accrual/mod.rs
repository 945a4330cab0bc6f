pub mod calculator;
pub mod tracker;

pub use calculator::compute_reward;
pub use tracker::{apply_sample, replay, OpenPeriod, PeriodSpan, Transition, TrackerState};
