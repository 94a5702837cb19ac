//! End-to-end simulation.
//!
//! Replays scripted load batches through the full pipeline
//! (source → evaluate → filter → ledger) across several scan cycles.

#[cfg(test)]
mod tests {
    use crate::mock_source::{load, profitable, MockSource};

    use loadscope::config::AppConfig;
    use loadscope::engine::cycle::{self, DecisionRecord};
    use loadscope::engine::ledger::{DealCategory, DealFilter, DealLedger};
    use loadscope::engine::source::JsonFileSource;
    use loadscope::model::filter::RejectionReason;
    use loadscope::model::{evaluate, EvaluationConfig};
    use loadscope::types::{LoadRecord, Recommendation};

    #[tokio::test]
    async fn test_ledger_stays_bounded_over_many_cycles() {
        let source = MockSource::new("mock");
        for batch in 0..6 {
            source.push_batch((0..10).map(|i| profitable(&format!("L-{batch}-{i}"))).collect());
        }

        let config = EvaluationConfig::default();
        let mut ledger = DealLedger::default();
        let mut qualified = 0;
        for n in 1..=6 {
            let (report, _) = cycle::scan(&source, &config, &mut ledger, n).await.unwrap();
            qualified += report.qualified;
        }

        assert_eq!(qualified, 60);
        let counts = ledger.counts();
        assert_eq!(counts.all, 50);
        assert_eq!(counts.recent, 50);
        assert_eq!(counts.premium, 50);
        assert_eq!(counts.high_value, 50);

        // The first ten deals were evicted; the newest sit at the end.
        let all = ledger.query(DealCategory::All, DealFilter::All, 50);
        assert_eq!(all.first().unwrap().load.id, "L-1-0");
        assert_eq!(all.last().unwrap().load.id, "L-5-9");
    }

    #[tokio::test]
    async fn test_config_change_between_cycles() {
        let source = MockSource::new("mock");
        source.push_batch(vec![profitable("A")]);
        source.push_batch(vec![profitable("B")]);

        let mut config = EvaluationConfig::default();
        let mut ledger = DealLedger::default();

        let (first, _) = cycle::scan(&source, &config, &mut ledger, 1).await.unwrap();
        assert_eq!(first.qualified, 1);

        config.filters.min_net_profit = 2000.0;
        let (second, decisions) = cycle::scan(&source, &config, &mut ledger, 2).await.unwrap();
        assert_eq!(second.qualified, 0);
        assert!(matches!(
            &decisions[0],
            DecisionRecord::Rejected { load_key, reason: RejectionReason::ProfitTooLow { .. } } if load_key == "B"
        ));
        assert_eq!(ledger.len(DealCategory::All), 1);
    }

    #[tokio::test]
    async fn test_source_failure_leaves_ledger_untouched() {
        let source = MockSource::new("mock");
        source.push_batch(vec![profitable("A")]);
        source.set_error("board offline");

        let mut ledger = DealLedger::default();
        let result = cycle::scan(&source, &EvaluationConfig::default(), &mut ledger, 1).await;
        assert!(result.is_err());
        assert_eq!(ledger.len(DealCategory::All), 0);

        source.clear_error();
        let (report, _) = cycle::scan(&source, &EvaluationConfig::default(), &mut ledger, 2)
            .await
            .unwrap();
        assert_eq!(report.qualified, 1);
    }

    #[tokio::test]
    async fn test_mixed_batch_decisions() {
        let source = MockSource::new("mock");
        source.push_batch(vec![
            profitable("WIN"),
            load("LOSS", 3000.0, 2.0, 50),
            load("FAR", 6000.0, 4.0, 400),
            load("ZERO", 3000.0, 0.0, 50),
        ]);

        let mut ledger = DealLedger::default();
        let (report, decisions) = cycle::scan(&source, &EvaluationConfig::default(), &mut ledger, 1)
            .await
            .unwrap();

        assert_eq!(report.loads_scanned, 3);
        assert_eq!(report.qualified, 1);
        assert_eq!(report.rejected, 2);
        assert!((report.avg_profit - 1515.66).abs() < 1e-9);

        let reasons: Vec<String> = decisions
            .iter()
            .filter_map(|d| match d {
                DecisionRecord::Rejected { reason, .. } => Some(reason.to_string()),
                DecisionRecord::Qualified { .. } => None,
            })
            .collect();
        assert_eq!(reasons.len(), 2);
        assert!(reasons[1].contains("deadhead 400 mi"));
    }

    #[tokio::test]
    async fn test_ranking_and_analysis_through_public_api() {
        let source = MockSource::new("mock");
        source.push_batch(vec![
            load("LOW", 4200.0, 2.8, 120),
            profitable("MID"),
            load("TOP", 9000.0, 6.0, 0),
        ]);

        let mut config = EvaluationConfig::default();
        config.filters.enabled = false;
        let mut ledger = DealLedger::default();
        cycle::scan(&source, &config, &mut ledger, 1).await.unwrap();

        let deals = ledger.query(DealCategory::All, DealFilter::All, 10);
        assert_eq!(deals.len(), 3);
        let top = deals.iter().find(|d| d.load.id == "TOP").unwrap();
        let low = deals.iter().find(|d| d.load.id == "LOW").unwrap();
        assert!(top.score > low.score);

        let ranking = ledger.rank_default(top).unwrap();
        assert_eq!(ranking.rank, 1);
        assert_eq!(ranking.window_size, 3);

        let analysis = ledger.analyze(top).unwrap();
        assert!(analysis.profit_vs_average > 0.0);
    }

    #[tokio::test]
    async fn test_json_file_source_end_to_end() {
        let mut path = std::env::temp_dir();
        path.push(format!("loadscope_sim_loads_{}.json", uuid::Uuid::new_v4()));
        let records: Vec<LoadRecord> = vec![
            profitable("J-1"),
            load("J-2", 3000.0, 2.0, 50),
            load("J-3", -5.0, 2.0, 50),
        ];
        std::fs::write(&path, serde_json::to_string(&records).unwrap()).unwrap();

        let source = JsonFileSource::new(&path);
        let mut ledger = DealLedger::default();
        let config = EvaluationConfig::default();

        let (first, _) = cycle::scan(&source, &config, &mut ledger, 1).await.unwrap();
        assert_eq!(first.loads_scanned, 2);
        assert_eq!(first.qualified, 1);

        // Nothing new on the board.
        let (second, _) = cycle::scan(&source, &config, &mut ledger, 2).await.unwrap();
        assert_eq!(second.loads_scanned, 0);
        assert_eq!(ledger.len(DealCategory::All), 1);

        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn test_app_config_drives_evaluation() {
        let cfg = AppConfig::parse(
            r#"
            [profit_engine]
            enabled = false

            [ledger]
            capacity = 2
            "#,
        )
        .unwrap();

        let eval = evaluate(&load("X", 3000.0, 2.0, 50), &cfg.evaluation());
        assert_eq!(eval.report.recommendation, Recommendation::Disabled);
        assert!(eval.qualifies);

        let mut ledger = DealLedger::new(cfg.ledger.clone());
        let records = (0..5).map(|i| load(&format!("X-{i}"), 3000.0, 2.0, 50)).collect();
        let (report, _) = cycle::run_cycle(records, &cfg.evaluation(), &mut ledger, 1);
        assert_eq!(report.qualified, 5);
        assert_eq!(ledger.len(DealCategory::All), 2);
    }
}
