//! Evaluation model — cost estimation, profitability, scoring, qualification.
//!
//! Everything in here is a pure function of a load and an explicit
//! configuration value: no shared state, no caching, no I/O.

pub mod costs;
pub mod filter;
pub mod profit;
pub mod score;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::LoadRecord;
use costs::{CostBreakdown, CostModelConfig};
use filter::QualificationThresholds;
use profit::ProfitReport;
use score::ScoringConfig;

/// Division that yields 0 instead of a fault when the divisor is not positive.
pub(crate) fn safe_div(numerator: f64, denominator: f64) -> f64 {
    if denominator > 0.0 {
        numerator / denominator
    } else {
        0.0
    }
}

/// Round to cent precision, halves rounding up.
pub(crate) fn round_cents(value: f64) -> f64 {
    (value * 100.0 + 0.5).floor() / 100.0
}

// ---------------------------------------------------------------------------
// Evaluation
// ---------------------------------------------------------------------------

/// Everything `evaluate` reads. Callers own their copy and may change it
/// between calls.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EvaluationConfig {
    pub profit_engine: CostModelConfig,
    pub scoring: ScoringConfig,
    pub filters: QualificationThresholds,
}

/// Result of running one load through the whole model.
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Unrounded per-layer costs (all zero when the engine is off).
    pub costs: CostBreakdown,
    pub report: ProfitReport,
    pub score: f64,
    pub qualifies: bool,
}

/// Run a load through cost estimation, profitability, scoring and the
/// qualification filter. Total: never panics, never returns NaN.
pub fn evaluate(load: &LoadRecord, config: &EvaluationConfig) -> Evaluation {
    let (costs, report) = profit::calculate(load, &config.profit_engine);

    let score = score::compute(load, &report, &config.scoring);
    let qualifies = filter::qualifies(load, &report, &config.filters);

    debug!(
        load = %load.key(),
        net_profit = format!("${:.2}", report.net_profit),
        margin = format!("{:.1}%", report.profit_margin),
        score,
        recommendation = %report.recommendation,
        qualifies,
        "Load evaluated"
    );

    Evaluation {
        costs,
        report,
        score,
        qualifies,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
