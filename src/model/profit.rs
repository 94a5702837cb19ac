//! Profitability calculator.
//!
//! Turns a layered cost estimate into market- and risk-adjusted profit
//! figures, per-mile costs, and a recommendation tier.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::costs::{self, CostBreakdown, CostEstimate, CostModelConfig};
use super::{round_cents, safe_div};
use crate::types::{LoadRecord, Recommendation};

/// Per-mile cost figures over total (loaded + deadhead) miles.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerMileCosts {
    /// Risk-adjusted total cost per mile.
    pub total: f64,
    pub layers: CostBreakdown,
}

/// Derived profitability figures for one load. Monetary fields are
/// rounded to the cent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProfitReport {
    pub estimated_distance: f64,
    pub total_miles: f64,
    pub costs: CostBreakdown,
    /// Plain sum of the seven layers, before market and risk adjustment.
    pub total_costs: f64,
    pub risk_adjusted_costs: f64,
    pub adjusted_revenue: f64,
    pub net_profit: f64,
    /// Percent of adjusted revenue.
    pub profit_margin: f64,
    /// Rate per loaded mile at which adjusted revenue covers adjusted cost.
    pub break_even_rate: f64,
    pub risk_adjusted_profit: f64,
    pub per_mile: PerMileCosts,
    pub recommendation: Recommendation,
    pub revenue_per_mile: f64,
    pub profit_per_mile: f64,
    // Scoring inputs. Absent when the engine is bypassed.
    pub cost_efficiency_ratio: Option<f64>,
    pub risk_assessment_score: Option<f64>,
    pub mathematical_accuracy: Option<f64>,
}

impl fmt::Display for ProfitReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} | net ${:.2} ({:.1}%) | costs ${:.2} | break-even ${:.2}/mi | {:.0} mi",
            self.recommendation,
            self.net_profit,
            self.profit_margin,
            self.risk_adjusted_costs,
            self.break_even_rate,
            self.total_miles,
        )
    }
}

impl ProfitReport {
    /// Report used when the profit engine is switched off: the whole rate
    /// counts as profit and no layer is priced.
    pub fn bypass(total_rate: f64) -> Self {
        Self {
            estimated_distance: 0.0,
            total_miles: 0.0,
            costs: CostBreakdown::default(),
            total_costs: 0.0,
            risk_adjusted_costs: 0.0,
            adjusted_revenue: total_rate,
            net_profit: total_rate,
            profit_margin: 100.0,
            break_even_rate: 0.0,
            risk_adjusted_profit: total_rate,
            per_mile: PerMileCosts::default(),
            recommendation: Recommendation::Disabled,
            revenue_per_mile: 0.0,
            profit_per_mile: 0.0,
            cost_efficiency_ratio: None,
            risk_assessment_score: None,
            mathematical_accuracy: None,
        }
    }

    /// Profit figures for an already-priced load.
    pub fn from_estimate(load: &LoadRecord, estimate: &CostEstimate, config: &CostModelConfig) -> Self {
        let trip = &estimate.distance;
        let costs = &estimate.breakdown;
        let math = &config.math;

        let total_costs = costs.total();
        let market_adjusted_costs = total_costs * math.market_volatility_factor;
        let risk_adjusted_costs = market_adjusted_costs * math.risk_assessment_weight;

        let adjusted_revenue = if config.risk.enabled {
            load.total_rate * config.risk.customer_payment_risk
        } else {
            load.total_rate
        };

        let net_profit = adjusted_revenue - risk_adjusted_costs;
        let profit_margin = safe_div(net_profit, adjusted_revenue) * 100.0;
        let break_even_rate = safe_div(risk_adjusted_costs, trip.estimated);

        let per_mile = PerMileCosts {
            total: round_cents(safe_div(risk_adjusted_costs, trip.total_miles)),
            layers: costs.map(|cost| round_cents(safe_div(cost, trip.total_miles))),
        };

        let risk_share = safe_div(costs.risk, total_costs);

        Self {
            estimated_distance: round_cents(trip.estimated),
            total_miles: round_cents(trip.total_miles),
            costs: costs.map(round_cents),
            total_costs: round_cents(total_costs),
            risk_adjusted_costs: round_cents(risk_adjusted_costs),
            adjusted_revenue: round_cents(adjusted_revenue),
            net_profit: round_cents(net_profit),
            profit_margin: round_cents(profit_margin),
            break_even_rate: round_cents(break_even_rate),
            risk_adjusted_profit: round_cents(net_profit),
            per_mile,
            recommendation: Recommendation::classify(net_profit, profit_margin),
            revenue_per_mile: round_cents(safe_div(adjusted_revenue, trip.estimated)),
            profit_per_mile: round_cents(safe_div(net_profit, trip.estimated)),
            cost_efficiency_ratio: Some(round_cents(safe_div(net_profit, risk_adjusted_costs))),
            // Not clamped: an oversized risk layer can drive this negative.
            risk_assessment_score: Some(((1.0 - risk_share) * 100.0 + 0.5).floor()),
            mathematical_accuracy: Some((math.distance_accuracy_factor * 100.0 + 0.5).floor()),
        }
    }
}

/// Price and assess a load, honouring the engine's global switch.
/// Returns the unrounded layer costs (all zero when bypassed) with the report.
pub fn calculate(load: &LoadRecord, config: &CostModelConfig) -> (CostBreakdown, ProfitReport) {
    if !config.enabled {
        return (CostBreakdown::default(), ProfitReport::bypass(load.total_rate));
    }
    let estimate = costs::estimate(load, config);
    let report = ProfitReport::from_estimate(load, &estimate, config);
    (estimate.breakdown, report)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
