//! Full analytics pipeline: fetch, aggregate, summarize, forecast, advise.
//!
//! [`PricingAnalytics::run`] is the single entry point the portal backend
//! calls. It pulls reference data and quotes through the repository seam,
//! builds per-item histories from closed weeks, and fans the result out to
//! the statistics, forecast, and insight engines. One run produces one
//! self-contained [`AnalyticsReport`]; nothing is cached between runs.

use std::collections::HashMap;

use futures_util::future::join_all;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use forecast_engine::forecast_items;
use history_aggregator::aggregate;
use insight_engine::generate_insights;
use pricing_core::{
    AnalyticsConfig, CategoryRollup, Forecast, Insight, ItemHistory, ItemSupplierStats,
    MarketSummary, Momentum, PricingError, PricingRepository, Quote, VolatilityRollup, Week,
    WeekStatus,
};
use supplier_stats::{
    category_price_rollup, market_summary, momentum, overall_competitiveness, summarize,
    volatility_by_category,
};

pub mod export;

#[cfg(test)]
mod pipeline_tests;

/// Everything one analysis pass produces. Serializes directly as the portal
/// API payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsReport {
    /// Week number of the open week whose quotes fed the current-week rules,
    /// if one exists.
    pub current_week_number: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<MarketSummary>,
    pub histories: Vec<ItemHistory>,
    pub supplier_stats: Vec<ItemSupplierStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub overall_competitiveness: Option<f64>,
    pub category_rollups: Vec<CategoryRollup>,
    pub volatility_rollups: Vec<VolatilityRollup>,
    pub momentum: Vec<Momentum>,
    pub forecasts: Vec<Forecast>,
    pub insights: Vec<Insight>,
}

/// Orchestrates the analytics engines over a [`PricingRepository`].
pub struct PricingAnalytics {
    config: AnalyticsConfig,
}

impl PricingAnalytics {
    pub fn new() -> Self {
        Self { config: AnalyticsConfig::default() }
    }

    pub fn with_config(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AnalyticsConfig {
        &self.config
    }

    /// Run the whole pipeline once.
    ///
    /// Reference data failures abort the run; per-week quote failures are
    /// logged and that week is dropped from the history. A current-week
    /// fetch failure degrades to history-only forecasts and insights. With
    /// no closed weeks and no open week the report is simply empty.
    pub async fn run(&self, repo: &dyn PricingRepository) -> Result<AnalyticsReport, PricingError> {
        let (weeks, items, suppliers) = tokio::try_join!(
            repo.list_weeks(),
            repo.list_items(),
            repo.list_suppliers(),
        )?;

        let mut complete: Vec<Week> =
            weeks.iter().filter(|w| w.status.is_complete()).cloned().collect();
        complete.sort_by_key(|w| w.week_number);

        let fetches = complete.iter().map(|w| repo.list_quotes_for_week(&w.id));
        let results = join_all(fetches).await;

        let mut quotes_by_week: HashMap<String, Vec<Quote>> = HashMap::new();
        for (week, result) in complete.iter().zip(results) {
            match result {
                Ok(quotes) => {
                    quotes_by_week.insert(week.id.clone(), quotes);
                }
                Err(err) => {
                    warn!(week = week.week_number, error = %err, "skipping week: quote fetch failed");
                }
            }
        }

        let histories = aggregate(&complete, &items, &quotes_by_week, &suppliers);

        // The latest open week is the one currently under negotiation; its
        // quotes anchor forecasts and the current-week insight rules.
        let current_week = weeks
            .iter()
            .filter(|w| w.status == WeekStatus::Open)
            .max_by_key(|w| w.week_number);
        let current_quotes = match current_week {
            Some(week) => match repo.list_quotes_for_week(&week.id).await {
                Ok(quotes) => quotes,
                Err(err) => {
                    warn!(week = week.week_number, error = %err, "current week quote fetch failed; continuing with history only");
                    Vec::new()
                }
            },
            None => Vec::new(),
        };

        debug!(
            histories = histories.len(),
            current_quotes = current_quotes.len(),
            "running analytics engines"
        );

        let supplier_stats = summarize(&histories, &self.config);

        Ok(AnalyticsReport {
            current_week_number: current_week.map(|w| w.week_number),
            summary: market_summary(&histories),
            overall_competitiveness: overall_competitiveness(&supplier_stats),
            category_rollups: category_price_rollup(&histories),
            volatility_rollups: volatility_by_category(&histories),
            momentum: momentum(&histories),
            forecasts: forecast_items(&histories, &current_quotes, &items, &self.config),
            insights: generate_insights(&current_quotes, &items, &histories, &self.config.insight),
            supplier_stats,
            histories,
        })
    }
}

impl Default for PricingAnalytics {
    fn default() -> Self {
        Self::new()
    }
}
