//! One scan pass: evaluate every record, keep the ones that qualify.

use anyhow::Result;
use chrono::{DateTime, Utc};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::engine::ledger::{DealLedger, EXCELLENT_SCORE, HIGH_VALUE_RATE};
use crate::engine::source::{self, LoadSource};
use crate::model::filter::{self, RejectionReason};
use crate::model::{self, EvaluationConfig};
use crate::types::{Deal, LoadRecord};

/// What happened to one load during a cycle.
#[derive(Debug, Clone)]
pub enum DecisionRecord {
    /// Passed the filter and was recorded in the ledger.
    Qualified { deal: Arc<Deal> },
    /// Failed a filter clause.
    Rejected { load_key: String, reason: RejectionReason },
}

/// Summary of a complete scan cycle.
#[derive(Debug, Clone)]
pub struct CycleReport {
    pub cycle_number: u64,
    pub loads_scanned: usize,
    pub qualified: usize,
    pub rejected: usize,
    /// Qualified deals scoring at or above the Excellent threshold.
    pub excellent: usize,
    /// Qualified deals at or above the HighValue rate.
    pub high_value: usize,
    /// Mean net profit over qualified deals.
    pub avg_profit: f64,
    /// Sum of posted rates over qualified deals.
    pub total_revenue: f64,
    pub timestamp: DateTime<Utc>,
}

impl fmt::Display for CycleReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "cycle {} | {} scanned | {} qualified ({} excellent, {} high value) | avg ${:.0} | revenue ${:.0}",
            self.cycle_number,
            self.loads_scanned,
            self.qualified,
            self.excellent,
            self.high_value,
            self.avg_profit,
            self.total_revenue,
        )
    }
}

/// Evaluate `records` in order, inserting qualifying loads into the ledger.
pub fn run_cycle(
    records: Vec<LoadRecord>,
    config: &EvaluationConfig,
    ledger: &mut DealLedger,
    cycle_number: u64,
) -> (CycleReport, Vec<DecisionRecord>) {
    let loads_scanned = records.len();
    let mut decisions = Vec::with_capacity(loads_scanned);
    let mut qualified: Vec<Arc<Deal>> = Vec::new();

    for load in records {
        let evaluation = model::evaluate(&load, config);
        if evaluation.qualifies {
            let deal = ledger.record(load, evaluation.report, evaluation.score);
            qualified.push(Arc::clone(&deal));
            decisions.push(DecisionRecord::Qualified { deal });
            continue;
        }

        // Re-run the clauses only to name the one that failed.
        if let Err(reason) = filter::check(&load, &evaluation.report, &config.filters) {
            debug!(load = %load.key(), %reason, "Load rejected");
            decisions.push(DecisionRecord::Rejected {
                load_key: load.key(),
                reason,
            });
        }
    }

    let total_profit: f64 = qualified.iter().map(|d| d.report.net_profit).sum();
    let report = CycleReport {
        cycle_number,
        loads_scanned,
        qualified: qualified.len(),
        rejected: loads_scanned - qualified.len(),
        excellent: qualified.iter().filter(|d| d.score >= EXCELLENT_SCORE).count(),
        high_value: qualified
            .iter()
            .filter(|d| d.load.total_rate >= HIGH_VALUE_RATE)
            .count(),
        avg_profit: if qualified.is_empty() {
            0.0
        } else {
            total_profit / qualified.len() as f64
        },
        total_revenue: qualified.iter().map(|d| d.load.total_rate).sum(),
        timestamp: Utc::now(),
    };

    info!(
        cycle = report.cycle_number,
        scanned = report.loads_scanned,
        qualified = report.qualified,
        rejected = report.rejected,
        "Scan cycle evaluated"
    );

    (report, decisions)
}

/// Pull fresh records from a source and run a cycle over the valid ones.
pub async fn scan(
    source: &dyn LoadSource,
    config: &EvaluationConfig,
    ledger: &mut DealLedger,
    cycle_number: u64,
) -> Result<(CycleReport, Vec<DecisionRecord>)> {
    let records = source::collect_valid(source).await?;
    Ok(run_cycle(records, config, ledger, cycle_number))
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
