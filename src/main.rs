//! LOADSCOPE — Freight load profitability estimator
//!
//! Entry point. Loads configuration, initialises structured logging,
//! and runs the periodic scan loop over the configured load source
//! with graceful shutdown.

use anyhow::Result;
use std::time::Duration;
use tracing::{error, info};

use loadscope::config::AppConfig;
use loadscope::engine::cycle::{self, CycleReport, DecisionRecord};
use loadscope::engine::ledger::{DealCategory, DealFilter, DealLedger};
use loadscope::engine::source::JsonFileSource;

const BANNER: &str = r#"
 _     ___    _    ____  ____   ____ ___  ____  _____
| |   / _ \  / \  |  _ \/ ___| / ___/ _ \|  _ \| ____|
| |  | | | |/ _ \ | | | \___ \| |  | | | | |_) |  _|
| |__| |_| / ___ \| |_| |___) | |__| |_| |  __/| |___
|_____\___/_/   \_\____/|____/ \____\___/|_|   |_____|

  Freight load profitability estimator
  v0.1.0
"#;

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (non-fatal if missing)
    let _ = dotenv::dotenv();

    let config_path = AppConfig::path_from_env();
    let mut cfg = AppConfig::load(&config_path)?;

    init_logging();

    println!("{BANNER}");
    info!(
        agent_name = %cfg.agent.name,
        scan_interval_secs = cfg.agent.scan_interval_secs,
        loads_path = %cfg.source.loads_path,
        ledger_capacity = cfg.ledger.capacity,
        "LOADSCOPE starting up"
    );

    let source = JsonFileSource::new(&cfg.source.loads_path);
    let mut ledger = DealLedger::new(cfg.ledger.clone());
    let mut cycle_number: u64 = 0;

    // -- Main loop -------------------------------------------------------

    // The interval and source path are fixed at startup; later edits to them
    // need a restart. Ledger settings are re-applied on every tick.
    let mut interval = tokio::time::interval(Duration::from_secs(cfg.agent.scan_interval_secs));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    info!(
        interval_secs = cfg.agent.scan_interval_secs,
        "Entering scan loop. Press Ctrl+C to stop."
    );

    loop {
        tokio::select! {
            _ = interval.tick() => {
                cfg = cfg.reload(&config_path);
                ledger.apply_config(cfg.ledger.clone());
                cycle_number += 1;

                match cycle::scan(&source, &cfg.evaluation(), &mut ledger, cycle_number).await {
                    Ok((report, decisions)) => {
                        log_decisions(&ledger, &decisions);
                        log_cycle_report(&report);
                    }
                    Err(e) => {
                        error!(error = format!("{e:#}"), cycle = cycle_number, "Cycle failed, continuing to next");
                    }
                }
            }
            _ = &mut shutdown => {
                info!("Shutdown signal received.");
                break;
            }
        }
    }

    let counts = ledger.counts();
    let best = ledger
        .query(DealCategory::All, DealFilter::All, ledger.config().capacity)
        .into_iter()
        .max_by(|a, b| a.score.total_cmp(&b.score));
    info!(
        cycles = cycle_number,
        deals = counts.all,
        excellent = counts.excellent,
        high_value = counts.high_value,
        best = best.map(|d| d.to_string()).unwrap_or_else(|| "none".to_string()),
        "LOADSCOPE shut down cleanly."
    );

    Ok(())
}

/// Log each qualified deal with its ranking and analysis.
fn log_decisions(ledger: &DealLedger, decisions: &[DecisionRecord]) {
    for decision in decisions {
        let DecisionRecord::Qualified { deal } = decision else {
            continue;
        };
        let ranking = ledger
            .rank_default(deal)
            .map(|r| r.to_string())
            .unwrap_or_else(|| "unranked".to_string());
        let (advice, position) = match ledger.analyze(deal) {
            Some(a) => (a.advice.to_string(), a.market_position.to_string()),
            None => ("-".to_string(), "-".to_string()),
        };
        info!(
            tier = %deal.tier(),
            route = format!("{} → {}", deal.load.origin, deal.load.destination),
            score = deal.score,
            report = %deal.report,
            credit = %deal.load.credit_info(),
            ranking = %ranking,
            advice = %advice,
            market = %position,
            "Qualified deal"
        );
    }
}

/// Log a human-readable cycle summary.
fn log_cycle_report(report: &CycleReport) {
    info!(
        cycle = report.cycle_number,
        scanned = report.loads_scanned,
        qualified = report.qualified,
        rejected = report.rejected,
        excellent = report.excellent,
        high_value = report.high_value,
        avg_profit = format!("${:.2}", report.avg_profit),
        revenue = format!("${:.2}", report.total_revenue),
        "Cycle complete"
    );
}

/// Initialise the `tracing` subscriber.
fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("loadscope=info"));

    let json_logging = std::env::var("LOADSCOPE_LOG_JSON").is_ok();

    if json_logging {
        fmt()
            .json()
            .with_env_filter(env_filter)
            .with_target(true)
            .with_thread_ids(true)
            .init();
    } else {
        fmt()
            .with_env_filter(env_filter)
            .with_target(true)
            .init();
    }
}
