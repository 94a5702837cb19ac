//! Configuration loading from TOML.
//!
//! Reads `config.toml` (or the file named by `LOADSCOPE_CONFIG`) and
//! deserializes into strongly-typed structs. Every table is optional; a
//! missing field takes the cost model's stock value.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use tracing::warn;

use crate::engine::ledger::LedgerConfig;
use crate::model::costs::CostModelConfig;
use crate::model::filter::QualificationThresholds;
use crate::model::score::ScoringConfig;
use crate::model::EvaluationConfig;
use crate::types::ScoutError;

pub const DEFAULT_CONFIG_PATH: &str = "config.toml";
pub const CONFIG_PATH_ENV: &str = "LOADSCOPE_CONFIG";

/// Top-level application configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub agent: AgentConfig,
    pub source: SourceConfig,
    pub ledger: LedgerConfig,
    pub profit_engine: CostModelConfig,
    pub scoring: ScoringConfig,
    pub filters: QualificationThresholds,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub name: String,
    pub scan_interval_secs: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            name: "LOADSCOPE-001".to_string(),
            scan_interval_secs: 2,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    /// JSON array of extracted load records.
    pub loads_path: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            loads_path: "demos/loads.json".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn load(path: &str) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {path}"))?;
        Self::parse(&contents).with_context(|| format!("Failed to parse config file: {path}"))
    }

    pub fn parse(contents: &str) -> Result<Self> {
        let config: AppConfig = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    /// Path from `LOADSCOPE_CONFIG`, else `config.toml`.
    pub fn path_from_env() -> String {
        std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string())
    }

    /// Reject only the knobs that would stop the scan loop from running.
    pub fn validate(&self) -> Result<(), ScoutError> {
        if self.agent.scan_interval_secs == 0 {
            return Err(ScoutError::Config("agent.scan_interval_secs must be positive".into()));
        }
        if self.ledger.capacity == 0 {
            return Err(ScoutError::Config("ledger.capacity must be positive".into()));
        }
        Ok(())
    }

    /// Re-read the file, keeping `self` when the new contents are unusable.
    pub fn reload(&self, path: &str) -> Self {
        match Self::load(path) {
            Ok(fresh) => fresh,
            Err(e) => {
                warn!(error = format!("{e:#}"), path, "Config reload failed, keeping previous configuration");
                self.clone()
            }
        }
    }

    /// The slice of configuration the evaluation pipeline reads.
    pub fn evaluation(&self) -> EvaluationConfig {
        EvaluationConfig {
            profit_engine: self.profit_engine.clone(),
            scoring: self.scoring.clone(),
            filters: self.filters.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::ledger::{DealCategory, DealFilter, DealLedger};
    use crate::model::profit::ProfitReport;
    use crate::types::LoadRecord;

    fn temp_path() -> String {
        let mut p = std::env::temp_dir();
        p.push(format!("loadscope_test_config_{}.toml", uuid::Uuid::new_v4()));
        p.to_string_lossy().to_string()
    }

    #[test]
    fn test_load_config() {
        // Requires config.toml in the working directory; skipped otherwise.
        if let Ok(cfg) = AppConfig::load("config.toml") {
            assert_eq!(cfg.agent.name, "LOADSCOPE-001");
            assert!(cfg.agent.scan_interval_secs > 0);
            assert_eq!(cfg.ledger.capacity, 50);
            assert!(cfg.profit_engine.enabled);
        }
    }

    #[test]
    fn test_empty_file_is_all_defaults() {
        let cfg = AppConfig::parse("").unwrap();
        assert_eq!(cfg, AppConfig::default());
        assert_eq!(cfg.evaluation(), EvaluationConfig::default());
    }

    #[test]
    fn test_partial_tables_merge_with_defaults() {
        let cfg = AppConfig::parse(
            r#"
            [agent]
            scan_interval_secs = 30

            [profit_engine.fuel]
            cost_per_gallon = 4.25

            [filters]
            min_net_profit = 350.0
            "#,
        )
        .unwrap();
        assert_eq!(cfg.agent.scan_interval_secs, 30);
        assert_eq!(cfg.agent.name, "LOADSCOPE-001");
        assert_eq!(cfg.profit_engine.fuel.cost_per_gallon, 4.25);
        assert_eq!(cfg.profit_engine.fuel.loaded_mpg, 6.5);
        assert_eq!(cfg.filters.min_net_profit, 350.0);
        assert_eq!(cfg.filters.max_deadhead, 150);
    }

    #[test]
    fn test_zero_interval_rejected() {
        let err = AppConfig::parse("[agent]\nscan_interval_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("scan_interval_secs"));
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = AppConfig::parse("[ledger]\ncapacity = 0\n").unwrap_err();
        assert!(err.to_string().contains("capacity"));
    }

    #[test]
    fn test_out_of_range_values_are_accepted() {
        let cfg = AppConfig::parse("[profit_engine.fuel]\ncost_per_gallon = -3.0\n").unwrap();
        assert_eq!(cfg.profit_engine.fuel.cost_per_gallon, -3.0);
    }

    #[test]
    fn test_huge_recent_window_is_usable() {
        let cfg = AppConfig::parse("[ledger]\nrecent_window_secs = 9223372036854775807\n").unwrap();
        let mut ledger = DealLedger::new(cfg.ledger.clone());
        ledger.record(LoadRecord::sample(), ProfitReport::bypass(3000.0), 50.0);
        let recent = ledger.query(DealCategory::All, DealFilter::Recent, 10);
        assert_eq!(recent.len(), 1);
    }

    #[test]
    fn test_reload_keeps_previous_on_bad_edit() {
        let path = temp_path();
        fs::write(&path, "[filters]\nmin_net_profit = 400.0\n").unwrap();
        let first = AppConfig::load(&path).unwrap();

        fs::write(&path, "[filters\nmin_net_profit = ").unwrap();
        let kept = first.reload(&path);
        assert_eq!(kept, first);

        fs::write(&path, "[filters]\nmin_net_profit = 900.0\n").unwrap();
        let fresh = kept.reload(&path);
        assert_eq!(fresh.filters.min_net_profit, 900.0);

        fs::remove_file(&path).unwrap();
    }
}
