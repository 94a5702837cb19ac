//! Qualification filter.
//!
//! A pure predicate over a load and its profit report. Clauses are checked
//! in a fixed order and the first failure is reported.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::profit::ProfitReport;
use crate::types::LoadRecord;

/// Thresholds a load must meet to be tracked as a deal.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QualificationThresholds {
    /// When false every load qualifies.
    pub enabled: bool,
    pub min_rate_per_mile: f64,
    pub max_deadhead: u32,
    pub min_total_rate: f64,
    pub max_total_rate: f64,
    /// Percent.
    pub min_profit_margin: f64,
    pub min_net_profit: f64,
}

impl Default for QualificationThresholds {
    fn default() -> Self {
        Self {
            enabled: true,
            min_rate_per_mile: 1.80,
            max_deadhead: 150,
            min_total_rate: 2000.0,
            max_total_rate: 15_000.0,
            min_profit_margin: 10.0,
            min_net_profit: 200.0,
        }
    }
}

/// The first clause a load failed.
#[derive(Debug, Clone, PartialEq)]
pub enum RejectionReason {
    RatePerMileTooLow { actual: f64, min: f64 },
    DeadheadTooLong { actual: u32, max: u32 },
    TotalRateTooLow { actual: f64, min: f64 },
    TotalRateTooHigh { actual: f64, max: f64 },
    MarginTooThin { actual: f64, min: f64 },
    ProfitTooLow { actual: f64, min: f64 },
}

impl fmt::Display for RejectionReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectionReason::RatePerMileTooLow { actual, min } => {
                write!(f, "rate ${actual:.2}/mi below ${min:.2}/mi")
            }
            RejectionReason::DeadheadTooLong { actual, max } => {
                write!(f, "deadhead {actual} mi exceeds {max} mi")
            }
            RejectionReason::TotalRateTooLow { actual, min } => {
                write!(f, "total rate ${actual:.0} below ${min:.0}")
            }
            RejectionReason::TotalRateTooHigh { actual, max } => {
                write!(f, "total rate ${actual:.0} above ${max:.0}")
            }
            RejectionReason::MarginTooThin { actual, min } => {
                write!(f, "margin {actual:.1}% below {min:.1}%")
            }
            RejectionReason::ProfitTooLow { actual, min } => {
                write!(f, "net profit ${actual:.2} below ${min:.2}")
            }
        }
    }
}

/// Check every clause, stopping at the first failure.
pub fn check(
    load: &LoadRecord,
    report: &ProfitReport,
    thresholds: &QualificationThresholds,
) -> Result<(), RejectionReason> {
    if !thresholds.enabled {
        return Ok(());
    }

    if load.rate_per_mile < thresholds.min_rate_per_mile {
        return Err(RejectionReason::RatePerMileTooLow {
            actual: load.rate_per_mile,
            min: thresholds.min_rate_per_mile,
        });
    }
    if load.deadhead_miles > thresholds.max_deadhead {
        return Err(RejectionReason::DeadheadTooLong {
            actual: load.deadhead_miles,
            max: thresholds.max_deadhead,
        });
    }
    if load.total_rate < thresholds.min_total_rate {
        return Err(RejectionReason::TotalRateTooLow {
            actual: load.total_rate,
            min: thresholds.min_total_rate,
        });
    }
    if load.total_rate > thresholds.max_total_rate {
        return Err(RejectionReason::TotalRateTooHigh {
            actual: load.total_rate,
            max: thresholds.max_total_rate,
        });
    }
    if report.profit_margin < thresholds.min_profit_margin {
        return Err(RejectionReason::MarginTooThin {
            actual: report.profit_margin,
            min: thresholds.min_profit_margin,
        });
    }
    if report.net_profit < thresholds.min_net_profit {
        return Err(RejectionReason::ProfitTooLow {
            actual: report.net_profit,
            min: thresholds.min_net_profit,
        });
    }

    Ok(())
}

pub fn qualifies(load: &LoadRecord, report: &ProfitReport, thresholds: &QualificationThresholds) -> bool {
    check(load, report, thresholds).is_ok()
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
