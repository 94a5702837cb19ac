//! Composite load scoring.
//!
//! Four primary components, each on a curve shaped for that metric, are
//! combined with normalised weights. Risk and cost-efficiency signals from
//! the profit report are blended in at a fixed 20%, then an accuracy bonus
//! and a confidence discount are applied.

use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::debug;

use super::profit::ProfitReport;
use super::safe_div;
use crate::types::LoadRecord;

/// Score returned for every load while scoring is switched off.
pub const NEUTRAL_SCORE: f64 = 50.0;

const PRIMARY_SHARE: f64 = 0.8;
const SUPPLEMENTARY_SHARE: f64 = 0.2;
const RATE_CURVE_EXPONENT: f64 = 0.7;
const DEADHEAD_PENALTY_EXPONENT: f64 = 1.5;
const LOGISTIC_STEEPNESS: f64 = 6.0;
const LOGISTIC_MIDPOINT: f64 = 0.5;

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Relative weights of the four primary components. Any positive scale works.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoreWeights {
    pub rate_per_mile: f64,
    pub profit_margin: f64,
    pub deadhead_efficiency: f64,
    pub total_rate: f64,
}

impl Default for ScoreWeights {
    fn default() -> Self {
        Self {
            rate_per_mile: 40.0,
            profit_margin: 30.0,
            deadhead_efficiency: 20.0,
            total_rate: 10.0,
        }
    }
}

impl ScoreWeights {
    /// Weights rescaled to sum to 1. All zero when they sum to zero.
    pub fn normalized(&self) -> Self {
        let total = self.rate_per_mile + self.profit_margin + self.deadhead_efficiency + self.total_rate;
        let scale = |w: f64| if total != 0.0 { w / total } else { 0.0 };
        Self {
            rate_per_mile: scale(self.rate_per_mile),
            profit_margin: scale(self.profit_margin),
            deadhead_efficiency: scale(self.deadhead_efficiency),
            total_rate: scale(self.total_rate),
        }
    }
}

/// Scoring switch, weights, and the bounds each curve is fitted to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    pub enabled: bool,
    pub weights: ScoreWeights,
    pub min_considered_rate: f64,
    pub max_considered_rate: f64,
    pub target_margin: f64,
    pub max_margin: f64,
    pub max_acceptable_deadhead: f64,
    pub min_total_rate: f64,
    pub max_total_rate: f64,
}

impl Default for ScoringConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            weights: ScoreWeights::default(),
            min_considered_rate: 1.0,
            max_considered_rate: 5.0,
            target_margin: 25.0,
            max_margin: 50.0,
            max_acceptable_deadhead: 200.0,
            min_total_rate: 1500.0,
            max_total_rate: 10_000.0,
        }
    }
}

// ---------------------------------------------------------------------------
// Component curves
// ---------------------------------------------------------------------------

/// Position of `value` within `[min, max]`, clamped to 0–1.
fn unit_interval(value: f64, min: f64, max: f64) -> f64 {
    safe_div(value - min, max - min).clamp(0.0, 1.0)
}

/// Concave: early gains above the floor count most.
fn rate_per_mile_score(rate: f64, config: &ScoringConfig) -> f64 {
    unit_interval(rate, config.min_considered_rate, config.max_considered_rate)
        .powf(RATE_CURVE_EXPONENT)
        * 100.0
}

/// Linear to 70 at target, then square-root returns up to 100 at max.
fn profit_margin_score(margin: f64, config: &ScoringConfig) -> f64 {
    if margin <= 0.0 {
        0.0
    } else if margin <= config.target_margin {
        safe_div(margin, config.target_margin) * 70.0
    } else {
        let excess = safe_div(margin - config.target_margin, config.max_margin - config.target_margin).min(1.0);
        70.0 + excess.sqrt() * 30.0
    }
}

/// Convex penalty: the first empty miles cost the most.
fn deadhead_score(deadhead: f64, config: &ScoringConfig) -> f64 {
    let ratio = safe_div(deadhead, config.max_acceptable_deadhead).min(1.0);
    (1.0 - ratio).powf(DEADHEAD_PENALTY_EXPONENT) * 100.0
}

/// Logistic over the normalised total rate.
fn total_rate_score(total_rate: f64, config: &ScoringConfig) -> f64 {
    let normalized = unit_interval(total_rate, config.min_total_rate, config.max_total_rate);
    100.0 / (1.0 + (-LOGISTIC_STEEPNESS * (normalized - LOGISTIC_MIDPOINT)).exp())
}

// ---------------------------------------------------------------------------
// Score card
// ---------------------------------------------------------------------------

/// Every component behind a composite score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreCard {
    pub rate_per_mile: f64,
    pub profit_margin: f64,
    pub deadhead_efficiency: f64,
    pub total_rate: f64,
    /// Weighted sum of the four primary components.
    pub weighted_primary: f64,
    pub risk_assessment: f64,
    pub cost_efficiency: f64,
    pub accuracy_bonus: f64,
    pub confidence_discount: f64,
    /// Final score, clamped to 0–100 with one decimal.
    pub total: f64,
}

impl fmt::Display for ScoreCard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:.1} (rpm {:.0} | margin {:.0} | DH {:.0} | rate {:.0} | risk {:.0} | eff {:.0})",
            self.total,
            self.rate_per_mile,
            self.profit_margin,
            self.deadhead_efficiency,
            self.total_rate,
            self.risk_assessment,
            self.cost_efficiency,
        )
    }
}

/// Compute every component and the composite, ignoring the enable switch.
pub fn score_card(load: &LoadRecord, report: &ProfitReport, config: &ScoringConfig) -> ScoreCard {
    let rate_per_mile = rate_per_mile_score(load.rate_per_mile, config);
    let profit_margin = profit_margin_score(report.profit_margin, config);
    let deadhead_efficiency = deadhead_score(f64::from(load.deadhead_miles), config);
    let total_rate = total_rate_score(load.total_rate, config);

    let w = config.weights.normalized();
    let weighted_primary = rate_per_mile * w.rate_per_mile
        + profit_margin * w.profit_margin
        + deadhead_efficiency * w.deadhead_efficiency
        + total_rate * w.total_rate;

    let risk_assessment = report.risk_assessment_score.unwrap_or(100.0);
    let cost_efficiency = report
        .cost_efficiency_ratio
        .map(|ratio| (ratio * 50.0).clamp(0.0, 100.0))
        .unwrap_or(50.0);

    let blended = weighted_primary * PRIMARY_SHARE
        + (risk_assessment + cost_efficiency) / 2.0 * SUPPLEMENTARY_SHARE;

    let accuracy_bonus = report
        .mathematical_accuracy
        .map(|accuracy| (accuracy - 90.0) * 0.2)
        .unwrap_or(0.0);
    let accuracy = report.mathematical_accuracy.unwrap_or(95.0);
    let uncertainty = (100.0 - accuracy).abs() * 0.1;
    let confidence_discount = uncertainty * 0.05;

    let raw = blended + accuracy_bonus - confidence_discount;
    // max/min rather than clamp: a NaN from a nonsensical config lands on 0.
    let total = (raw.max(0.0).min(100.0) * 10.0 + 0.5).floor() / 10.0;

    ScoreCard {
        rate_per_mile,
        profit_margin,
        deadhead_efficiency,
        total_rate,
        weighted_primary,
        risk_assessment,
        cost_efficiency,
        accuracy_bonus,
        confidence_discount,
        total,
    }
}

/// Composite score for a load, or [`NEUTRAL_SCORE`] when scoring is off.
pub fn compute(load: &LoadRecord, report: &ProfitReport, config: &ScoringConfig) -> f64 {
    if !config.enabled {
        return NEUTRAL_SCORE;
    }
    let card = score_card(load, report, config);
    debug!(load = %load.key(), card = %card, "Load scored");
    card.total
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::costs::CostModelConfig;
    use crate::model::profit;

    fn load(total_rate: f64, rate_per_mile: f64, deadhead_miles: u32) -> LoadRecord {
        LoadRecord {
            total_rate,
            rate_per_mile,
            deadhead_miles,
            ..LoadRecord::sample()
        }
    }

    fn scored(load: &LoadRecord, config: &ScoringConfig) -> f64 {
        let report = profit::calculate(load, &CostModelConfig::default()).1;
        compute(load, &report, config)
    }

    #[test]
    fn test_rate_curve_is_concave_and_clamped() {
        let config = ScoringConfig::default();
        assert_eq!(rate_per_mile_score(0.5, &config), 0.0);
        assert_eq!(rate_per_mile_score(7.0, &config), 100.0);
        let quarter = rate_per_mile_score(2.0, &config);
        assert!((quarter - 0.25_f64.powf(0.7) * 100.0).abs() < 1e-9);
        assert!(quarter > 25.0);
    }

    #[test]
    fn test_margin_curve_pieces() {
        let config = ScoringConfig::default();
        assert_eq!(profit_margin_score(-5.0, &config), 0.0);
        assert!((profit_margin_score(12.5, &config) - 35.0).abs() < 1e-9);
        assert!((profit_margin_score(25.0, &config) - 70.0).abs() < 1e-9);
        // Quarter of the excess range gives half of the remaining 30.
        assert!((profit_margin_score(31.25, &config) - 85.0).abs() < 1e-9);
        assert!((profit_margin_score(80.0, &config) - 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_deadhead_curve() {
        let config = ScoringConfig::default();
        assert_eq!(deadhead_score(0.0, &config), 100.0);
        assert_eq!(deadhead_score(200.0, &config), 0.0);
        assert_eq!(deadhead_score(500.0, &config), 0.0);
        assert!((deadhead_score(50.0, &config) - 0.75_f64.powf(1.5) * 100.0).abs() < 1e-9);
    }

    #[test]
    fn test_total_rate_logistic_midpoint() {
        let config = ScoringConfig::default();
        assert!((total_rate_score(5750.0, &config) - 50.0).abs() < 1e-9);
        assert!(total_rate_score(1000.0, &config) < 5.0);
        assert!(total_rate_score(20_000.0, &config) > 95.0);
    }

    #[test]
    fn test_weights_normalize() {
        let w = ScoreWeights::default().normalized();
        assert!((w.rate_per_mile - 0.4).abs() < 1e-12);
        let total = w.rate_per_mile + w.profit_margin + w.deadhead_efficiency + w.total_rate;
        assert!((total - 1.0).abs() < 1e-12);
    }

    #[test]
    fn test_zero_weights_do_not_fault() {
        let config = ScoringConfig {
            weights: ScoreWeights {
                rate_per_mile: 0.0,
                profit_margin: 0.0,
                deadhead_efficiency: 0.0,
                total_rate: 0.0,
            },
            ..ScoringConfig::default()
        };
        let score = scored(&LoadRecord::sample(), &config);
        assert!((0.0..=100.0).contains(&score));
    }

    #[test]
    fn test_score_invariant_under_weight_rescaling() {
        let base = ScoringConfig::default();
        let loads = [
            LoadRecord::sample(),
            load(6000.0, 4.0, 20),
            load(2500.0, 3.1, 140),
            load(12_000.0, 2.8, 0),
        ];
        for factor in [0.5, 2.0, 4.0] {
            let scaled = ScoringConfig {
                weights: ScoreWeights {
                    rate_per_mile: base.weights.rate_per_mile * factor,
                    profit_margin: base.weights.profit_margin * factor,
                    deadhead_efficiency: base.weights.deadhead_efficiency * factor,
                    total_rate: base.weights.total_rate * factor,
                },
                ..base.clone()
            };
            for l in &loads {
                assert_eq!(scored(l, &base), scored(l, &scaled));
            }
        }
    }

    #[test]
    fn test_score_always_in_range() {
        let config = ScoringConfig::default();
        for (rate, rpm, dh) in [
            (500.0, 0.5, 900),
            (3000.0, 2.0, 50),
            (50_000.0, 12.0, 0),
            (9000.0, 3.5, 10),
        ] {
            let score = scored(&load(rate, rpm, dh), &config);
            assert!((0.0..=100.0).contains(&score), "score {score} out of range");
            assert_eq!((score * 10.0).round() / 10.0, score);
        }
    }

    #[test]
    fn test_disabled_scoring_is_neutral() {
        let config = ScoringConfig {
            enabled: false,
            ..ScoringConfig::default()
        };
        assert_eq!(scored(&LoadRecord::sample(), &config), 50.0);
        assert_eq!(scored(&load(14_000.0, 6.0, 0), &config), 50.0);
    }

    #[test]
    fn test_better_load_scores_higher() {
        let config = ScoringConfig::default();
        let weak = scored(&LoadRecord::sample(), &config);
        let strong = scored(&load(9000.0, 4.5, 5), &config);
        assert!(strong > weak);
    }

    #[test]
    fn test_bypass_report_uses_neutral_supplements() {
        let l = LoadRecord::sample();
        let card = score_card(&l, &ProfitReport::bypass(l.total_rate), &ScoringConfig::default());
        assert_eq!(card.risk_assessment, 100.0);
        assert_eq!(card.cost_efficiency, 50.0);
        assert_eq!(card.accuracy_bonus, 0.0);
        assert!((card.confidence_discount - 0.025).abs() < 1e-12);
    }

    #[test]
    fn test_score_card_components_for_sample() {
        let l = LoadRecord::sample();
        let report = profit::calculate(&l, &CostModelConfig::default()).1;
        let card = score_card(&l, &report, &ScoringConfig::default());

        assert_eq!(card.profit_margin, 0.0);
        assert_eq!(card.risk_assessment, 90.0);
        assert_eq!(card.cost_efficiency, 0.0);
        assert!((card.accuracy_bonus - 1.0).abs() < 1e-9);
        let expected = card.weighted_primary * 0.8 + 45.0 * 0.2 + 1.0 - 0.025;
        assert!((card.total - expected).abs() <= 0.05 + 1e-9);
    }
}
