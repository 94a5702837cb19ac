//! Shared types for the LOADSCOPE analyzer.
//!
//! These types form the data model used across all modules.
//! The `model` pipeline reads them, the `engine` stores them, and
//! neither depends on the other's internals.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::model::profit::ProfitReport;

// ---------------------------------------------------------------------------
// Load record
// ---------------------------------------------------------------------------

/// A freight-load posting as produced by the extraction collaborator.
///
/// Immutable once produced. `total_rate` and `rate_per_mile` must both be
/// positive; sources call [`LoadRecord::validate`] before handing records
/// to the pipeline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoadRecord {
    /// Posting identifier as seen on the load board (may be empty).
    #[serde(default)]
    pub id: String,
    pub origin: String,
    pub destination: String,
    /// Posted total revenue in USD.
    pub total_rate: f64,
    /// Posted revenue per loaded mile in USD.
    pub rate_per_mile: f64,
    /// Empty miles to reach the origin.
    #[serde(default)]
    pub deadhead_miles: u32,
    #[serde(default)]
    pub equipment: String,
    #[serde(default)]
    pub weight: String,
    #[serde(default)]
    pub length: String,
    #[serde(default)]
    pub company: String,
    #[serde(default)]
    pub credit_score: Option<u32>,
    #[serde(default)]
    pub days_to_pay: Option<u32>,
}

impl fmt::Display for LoadRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} → {} (${:.0} | ${:.2}/mi | DH {})",
            self.origin, self.destination, self.total_rate, self.rate_per_mile, self.deadhead_miles,
        )
    }
}

impl LoadRecord {
    /// Reject records the pipeline's contract does not accept.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if !(self.total_rate.is_finite() && self.total_rate > 0.0) {
            return Err(ScoutError::InvalidInput {
                field: "total_rate",
                value: self.total_rate,
            });
        }
        if !(self.rate_per_mile.is_finite() && self.rate_per_mile > 0.0) {
            return Err(ScoutError::InvalidInput {
                field: "rate_per_mile",
                value: self.rate_per_mile,
            });
        }
        Ok(())
    }

    /// Stable identity used for de-duplication across scans.
    /// Falls back to the posting's visible fields when no id was extracted.
    pub fn key(&self) -> String {
        if !self.id.is_empty() {
            return self.id.clone();
        }
        format!(
            "{}|{}|{:.2}|{:.2}|{}",
            self.origin, self.destination, self.total_rate, self.rate_per_mile, self.deadhead_miles
        )
    }

    /// Short "credit score • days to pay" summary.
    pub fn credit_info(&self) -> String {
        match (self.credit_score, self.days_to_pay) {
            (Some(cs), Some(dtp)) if cs > 0 => format!("{cs} CS • {dtp} DTP"),
            (Some(cs), None) if cs > 0 => format!("{cs} CS"),
            _ => "No Credit Info".to_string(),
        }
    }

    /// Helper to build a test/sample load with sensible defaults.
    #[cfg(test)]
    pub fn sample() -> Self {
        LoadRecord {
            id: "DAT-0001".to_string(),
            origin: "Dallas, TX".to_string(),
            destination: "Atlanta, GA".to_string(),
            total_rate: 3000.0,
            rate_per_mile: 2.0,
            deadhead_miles: 50,
            equipment: "V".to_string(),
            weight: "42k lbs".to_string(),
            length: "53 ft".to_string(),
            company: "Acme Logistics".to_string(),
            credit_score: Some(96),
            days_to_pay: Some(31),
        }
    }
}

// ---------------------------------------------------------------------------
// Recommendation ladder
// ---------------------------------------------------------------------------

/// Profitability tier assigned by the profit calculator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Recommendation {
    Excellent,
    VeryGood,
    Good,
    Marginal,
    BreakEven,
    Loss,
    /// The profit engine is switched off; no costs were computed.
    Disabled,
}

impl Recommendation {
    /// Walk the ladder top-down; first matching rung wins.
    pub fn classify(net_profit: f64, profit_margin: f64) -> Self {
        if net_profit > 1000.0 && profit_margin > 20.0 {
            Recommendation::Excellent
        } else if net_profit > 500.0 && profit_margin > 15.0 {
            Recommendation::VeryGood
        } else if net_profit > 300.0 && profit_margin > 10.0 {
            Recommendation::Good
        } else if net_profit > 100.0 && profit_margin > 5.0 {
            Recommendation::Marginal
        } else if net_profit > 0.0 {
            Recommendation::BreakEven
        } else {
            Recommendation::Loss
        }
    }
}

impl fmt::Display for Recommendation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Recommendation::Excellent => write!(f, "EXCELLENT"),
            Recommendation::VeryGood => write!(f, "VERY_GOOD"),
            Recommendation::Good => write!(f, "GOOD"),
            Recommendation::Marginal => write!(f, "MARGINAL"),
            Recommendation::BreakEven => write!(f, "BREAK_EVEN"),
            Recommendation::Loss => write!(f, "LOSS"),
            Recommendation::Disabled => write!(f, "CALCULATION_DISABLED"),
        }
    }
}

// ---------------------------------------------------------------------------
// Deal
// ---------------------------------------------------------------------------

/// Immutable snapshot of a qualifying load, created at ledger insertion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Deal {
    pub id: Uuid,
    pub load: LoadRecord,
    pub report: ProfitReport,
    /// Composite score, 0–100 with one decimal.
    pub score: f64,
    pub timestamp: DateTime<Utc>,
}

impl Deal {
    pub fn new(load: LoadRecord, report: ProfitReport, score: f64) -> Self {
        Self::at(load, report, score, Utc::now())
    }

    /// Build a deal with an explicit observation time.
    pub fn at(load: LoadRecord, report: ProfitReport, score: f64, timestamp: DateTime<Utc>) -> Self {
        Deal {
            id: Uuid::new_v4(),
            load,
            report,
            score,
            timestamp,
        }
    }

    pub fn tier(&self) -> DealTier {
        DealTier::from_score(self.score)
    }
}

impl fmt::Display for Deal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {} | score {:.1} | net ${:.2} ({:.1}%) | {}",
            self.tier(),
            self.load,
            self.score,
            self.report.net_profit,
            self.report.profit_margin,
            self.report.recommendation,
        )
    }
}

/// Display tier of a deal, derived from its score alone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DealTier {
    Excellent,
    Premium,
    Good,
}

impl DealTier {
    pub fn from_score(score: f64) -> Self {
        if score >= 95.0 {
            DealTier::Excellent
        } else if score >= 85.0 {
            DealTier::Premium
        } else {
            DealTier::Good
        }
    }
}

impl fmt::Display for DealTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DealTier::Excellent => write!(f, "EXCELLENT"),
            DealTier::Premium => write!(f, "PREMIUM"),
            DealTier::Good => write!(f, "GOOD DEAL"),
        }
    }
}

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Domain-specific error types for LOADSCOPE.
#[derive(Debug, thiserror::Error)]
pub enum ScoutError {
    #[error("Invalid load record: {field} must be positive, got {value}")]
    InvalidInput { field: &'static str, value: f64 },

    #[error("Configuration error: {0}")]
    Config(String),
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
