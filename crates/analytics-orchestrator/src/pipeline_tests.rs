#[cfg(test)]
mod tests {
    use std::collections::{HashMap, HashSet};

    use async_trait::async_trait;
    use chrono::NaiveDate;

    use pricing_core::{
        InsightKind, Item, OrganicFlag, Priority, PricingError, PricingRepository, Quote,
        Supplier, Trend, Week, WeekStatus,
    };

    use crate::PricingAnalytics;

    #[derive(Default)]
    struct MockRepo {
        weeks: Vec<Week>,
        items: Vec<Item>,
        suppliers: Vec<Supplier>,
        quotes: HashMap<String, Vec<Quote>>,
        fail_weeks: HashSet<String>,
        fail_reference: bool,
    }

    #[async_trait]
    impl PricingRepository for MockRepo {
        async fn list_weeks(&self) -> Result<Vec<Week>, PricingError> {
            if self.fail_reference {
                return Err(PricingError::Repository("weeks unavailable".to_string()));
            }
            Ok(self.weeks.clone())
        }

        async fn list_items(&self) -> Result<Vec<Item>, PricingError> {
            Ok(self.items.clone())
        }

        async fn list_suppliers(&self) -> Result<Vec<Supplier>, PricingError> {
            Ok(self.suppliers.clone())
        }

        async fn list_quotes_for_week(&self, week_id: &str) -> Result<Vec<Quote>, PricingError> {
            if self.fail_weeks.contains(week_id) {
                return Err(PricingError::Repository(format!("week {week_id} unavailable")));
            }
            Ok(self.quotes.get(week_id).cloned().unwrap_or_default())
        }
    }

    fn week(id: &str, number: u32, status: WeekStatus) -> Week {
        Week {
            id: id.to_string(),
            week_number: number,
            status,
            start_date: NaiveDate::from_ymd_opt(2024, 1, 1).unwrap(),
            end_date: NaiveDate::from_ymd_opt(2024, 1, 7).unwrap(),
        }
    }

    fn item(id: &str, name: &str) -> Item {
        Item {
            id: id.to_string(),
            name: name.to_string(),
            category: "lettuce".to_string(),
            pack_size: "24ct".to_string(),
            organic_flag: OrganicFlag::Conv,
        }
    }

    fn supplier(id: &str, name: &str) -> Supplier {
        Supplier { id: id.to_string(), name: name.to_string() }
    }

    fn quote(week_id: &str, item_id: &str, supplier_id: &str, fob: f64) -> Quote {
        Quote {
            week_id: week_id.to_string(),
            item_id: item_id.to_string(),
            supplier_id: supplier_id.to_string(),
            supplier_name: None,
            supplier_fob: Some(fob),
            supplier_dlvd: None,
            rf_counter_fob: None,
            supplier_revised_fob: None,
            rf_final_fob: None,
        }
    }

    fn three_week_repo() -> MockRepo {
        MockRepo {
            weeks: vec![
                week("w1", 1, WeekStatus::Closed),
                week("w2", 2, WeekStatus::Closed),
                week("w3", 3, WeekStatus::Finalized),
            ],
            items: vec![item("i1", "Iceberg")],
            suppliers: vec![supplier("s1", "Valley Farms")],
            quotes: HashMap::from([
                ("w1".to_string(), vec![quote("w1", "i1", "s1", 10.0)]),
                ("w2".to_string(), vec![quote("w2", "i1", "s1", 11.0)]),
                ("w3".to_string(), vec![quote("w3", "i1", "s1", 9.0)]),
            ]),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn three_closed_weeks_end_to_end() {
        let repo = three_week_repo();
        let report = PricingAnalytics::new().run(&repo).await.unwrap();

        assert_eq!(report.current_week_number, None);

        assert_eq!(report.histories.len(), 1);
        let history = &report.histories[0];
        assert_eq!(history.weeks, vec![1, 2, 3]);
        assert_eq!(history.mean_prices, vec![10.0, 11.0, 9.0]);
        assert!((history.avg_price - 10.0).abs() < 1e-9);
        assert!((history.volatility - 1.0).abs() < 1e-9);

        // OLS over (1,10) (2,11) (3,9): slope -0.5, intercept 11, week 4 -> 9.0.
        assert_eq!(report.forecasts.len(), 1);
        let forecast = &report.forecasts[0];
        assert!((forecast.current_price - 9.0).abs() < 1e-9);
        assert!((forecast.forecast_price - 9.0).abs() < 1e-9);
        assert!((forecast.confidence - 25.0).abs() < 1e-9);
        assert_eq!(forecast.trend, Trend::Stable);

        // Single-source item: ranked but never scored for competitiveness.
        assert_eq!(report.supplier_stats.len(), 1);
        let stats = &report.supplier_stats[0];
        assert_eq!(stats.suppliers.len(), 1);
        assert_eq!(stats.suppliers[0].supplier_name, "Valley Farms");
        assert!((stats.suppliers[0].win_rate - 100.0).abs() < 1e-9);
        assert!((stats.suppliers[0].consistency - 100.0).abs() < 1e-9);
        assert!(stats.competitiveness.is_none());
        assert!(report.overall_competitiveness.is_none());

        let summary = report.summary.as_ref().unwrap();
        assert_eq!(summary.total_skus, 1);
        assert_eq!(summary.total_weeks, 3);
        assert_eq!(summary.price_decrease_count, 1);

        // 10 -> 9 is a -10% move: a declining-trend opportunity, no quotes.
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].kind, InsightKind::Opportunity);
        assert!(report.insights[0].title.starts_with("Declining Price Trend"));

        assert_eq!(report.momentum.len(), 1);
        assert!(report.momentum[0].momentum < 0.0);
    }

    #[tokio::test]
    async fn failed_week_is_skipped_not_fatal() {
        let mut repo = three_week_repo();
        repo.fail_weeks.insert("w2".to_string());

        let report = PricingAnalytics::new().run(&repo).await.unwrap();
        let history = &report.histories[0];
        assert_eq!(history.weeks, vec![1, 3]);
        assert_eq!(history.mean_prices, vec![10.0, 9.0]);
    }

    #[tokio::test]
    async fn reference_data_failure_aborts_the_run() {
        let repo = MockRepo { fail_reference: true, ..Default::default() };
        let result = PricingAnalytics::new().run(&repo).await;
        assert!(matches!(result, Err(PricingError::Repository(_))));
    }

    #[tokio::test]
    async fn empty_dataset_yields_empty_report() {
        let repo = MockRepo { items: vec![item("i1", "Iceberg")], ..Default::default() };
        let report = PricingAnalytics::new().run(&repo).await.unwrap();

        assert_eq!(report.current_week_number, None);
        assert!(report.histories.is_empty());
        assert!(report.forecasts.is_empty());
        assert!(report.insights.is_empty());
        assert!(report.summary.is_none());
    }

    #[tokio::test]
    async fn open_week_quotes_anchor_forecasts_and_insights() {
        let repo = MockRepo {
            weeks: vec![
                week("w1", 1, WeekStatus::Closed),
                week("w2", 2, WeekStatus::Closed),
                week("w3", 3, WeekStatus::Open),
            ],
            items: vec![item("i1", "Iceberg")],
            suppliers: vec![supplier("s1", "Valley Farms")],
            quotes: HashMap::from([
                ("w1".to_string(), vec![quote("w1", "i1", "s1", 10.0)]),
                ("w2".to_string(), vec![quote("w2", "i1", "s1", 10.0)]),
                ("w3".to_string(), vec![quote("w3", "i1", "s1", 12.0)]),
            ]),
            ..Default::default()
        };

        let report = PricingAnalytics::new().run(&repo).await.unwrap();
        assert_eq!(report.current_week_number, Some(3));

        // Flat history forecasts 10.0 with zero confidence; against a 12.0
        // current price that reads as a downward pull.
        let forecast = &report.forecasts[0];
        assert!((forecast.current_price - 12.0).abs() < 1e-9);
        assert!((forecast.forecast_price - 10.0).abs() < 1e-9);
        assert!((forecast.confidence - 0.0).abs() < 1e-9);
        assert_eq!(forecast.trend, Trend::Down);

        // Current avg 12 sits 20% above the historical 10: a high risk.
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].kind, InsightKind::Risk);
        assert_eq!(report.insights[0].priority, Priority::High);
    }

    #[tokio::test]
    async fn open_week_without_history_gets_degenerate_forecast() {
        let repo = MockRepo {
            weeks: vec![week("w1", 1, WeekStatus::Open)],
            items: vec![item("i1", "Iceberg")],
            suppliers: vec![supplier("s1", "Valley Farms")],
            quotes: HashMap::from([(
                "w1".to_string(),
                vec![quote("w1", "i1", "s1", 10.0)],
            )]),
            ..Default::default()
        };

        let report = PricingAnalytics::new().run(&repo).await.unwrap();
        assert_eq!(report.current_week_number, Some(1));
        assert!(report.histories.is_empty());
        assert!(report.summary.is_none());

        let forecast = &report.forecasts[0];
        assert!((forecast.forecast_price - 10.0).abs() < 1e-9);
        assert!((forecast.confidence - 0.0).abs() < 1e-9);
        assert_eq!(forecast.trend, Trend::Stable);
        assert!(forecast
            .factors
            .iter()
            .any(|f| f.contains("Insufficient historical data")));

        // A quoted item never vanishes silently: at least the summary fires.
        assert_eq!(report.insights.len(), 1);
        assert_eq!(report.insights[0].priority, Priority::Low);
    }

    #[tokio::test]
    async fn current_week_fetch_failure_degrades_to_history() {
        let mut repo = MockRepo {
            weeks: vec![
                week("w1", 1, WeekStatus::Closed),
                week("w2", 2, WeekStatus::Closed),
                week("w3", 3, WeekStatus::Open),
            ],
            items: vec![item("i1", "Iceberg")],
            suppliers: vec![supplier("s1", "Valley Farms")],
            quotes: HashMap::from([
                ("w1".to_string(), vec![quote("w1", "i1", "s1", 10.0)]),
                ("w2".to_string(), vec![quote("w2", "i1", "s1", 9.5)]),
            ]),
            ..Default::default()
        };
        repo.fail_weeks.insert("w3".to_string());

        let report = PricingAnalytics::new().run(&repo).await.unwrap();
        assert_eq!(report.current_week_number, Some(3));

        // No current quotes: the forecast falls back to the last history point.
        let forecast = &report.forecasts[0];
        assert!((forecast.current_price - 9.5).abs() < 1e-9);
        assert!((forecast.forecast_price - 9.0).abs() < 1e-9);
        assert_eq!(forecast.trend, Trend::Down);
    }

    #[tokio::test]
    async fn repeated_runs_are_byte_identical() {
        let mut repo = three_week_repo();
        repo.weeks.push(week("w4", 4, WeekStatus::Open));
        repo.items.push(item("i2", "Romaine"));
        repo.suppliers.push(supplier("s2", "Coastal Produce"));
        repo.quotes
            .get_mut("w1")
            .unwrap()
            .extend([quote("w1", "i1", "s2", 9.5), quote("w1", "i2", "s2", 14.0)]);
        repo.quotes
            .get_mut("w2")
            .unwrap()
            .extend([quote("w2", "i1", "s2", 11.5), quote("w2", "i2", "s2", 15.0)]);
        repo.quotes.insert(
            "w4".to_string(),
            vec![quote("w4", "i1", "s1", 9.0), quote("w4", "i1", "s2", 10.5)],
        );

        let analytics = PricingAnalytics::new();
        let first = analytics.run(&repo).await.unwrap();
        let second = analytics.run(&repo).await.unwrap();

        assert_eq!(
            serde_json::to_string(&first).unwrap(),
            serde_json::to_string(&second).unwrap()
        );
    }
}
