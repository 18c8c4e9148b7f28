use crate::{InsightKind, Priority};
use serde::{Deserialize, Serialize};

/// Policy constants for the statistical summarizer and forecast engine.
///
/// These values reflect business tuning, not algorithmic necessity, so they
/// are carried as configuration rather than baked into the math.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsConfig {
    /// A supplier counts as consistent in a week when its price is within
    /// this multiple of the week's best price (1.05 = within 5%).
    pub consistency_band: f64,
    /// Competitiveness index = 100 - spread% * penalty, clamped to 0-100.
    pub spread_penalty: f64,
    /// Forecast trend band around the current price: above
    /// `current * (1 + band)` is up, below `current * (1 - band)` is down.
    pub trend_band: f64,
    pub insight: InsightConfig,
}

impl Default for AnalyticsConfig {
    fn default() -> Self {
        Self {
            consistency_band: 1.05,
            spread_penalty: 2.0,
            trend_band: 0.02,
            insight: InsightConfig::default(),
        }
    }
}

/// Thresholds and ordering for the insight rule engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightConfig {
    /// Minimum supplier spread% to flag a negotiation opportunity.
    pub spread_opportunity_pct: f64,
    /// Spread% above which the opportunity is high priority.
    pub spread_high_pct: f64,
    /// Suggested counter price as a fraction of the current average.
    pub counter_factor: f64,
    /// Impact figures are modeled per this many cases.
    pub lot_size: f64,
    /// Current avg above `historical avg * ratio` is a price-increase risk.
    pub risk_increase_ratio: f64,
    /// Increase% above which the risk is high priority.
    pub risk_high_pct: f64,
    /// Cheapest quote below `avg * ratio` earns a supplier recommendation.
    pub best_price_ratio: f64,
    /// Savings% above which the recommendation is high priority.
    pub savings_high_pct: f64,
    /// Minimum price below `avg * ratio` is flagged as an anomaly.
    pub anomaly_ratio: f64,
    /// Discount% above which the anomaly is high priority.
    pub anomaly_high_pct: f64,
    /// Historical volatility above this is a risk for items without
    /// current-week quotes.
    pub volatility_risk: f64,
    /// Volatility above this makes that risk high priority.
    pub volatility_high: f64,
    /// Sort order of priorities in the final list, most urgent first.
    pub priority_order: [Priority; 3],
    /// Sort order of insight kinds within equal priority.
    pub kind_order: [InsightKind; 4],
}

impl Default for InsightConfig {
    fn default() -> Self {
        Self {
            spread_opportunity_pct: 10.0,
            spread_high_pct: 20.0,
            counter_factor: 0.95,
            lot_size: 100.0,
            risk_increase_ratio: 1.05,
            risk_high_pct: 15.0,
            best_price_ratio: 0.98,
            savings_high_pct: 5.0,
            anomaly_ratio: 0.90,
            anomaly_high_pct: 15.0,
            volatility_risk: 2.0,
            volatility_high: 4.0,
            priority_order: [Priority::High, Priority::Medium, Priority::Low],
            kind_order: [
                InsightKind::Risk,
                InsightKind::Anomaly,
                InsightKind::Opportunity,
                InsightKind::Recommendation,
            ],
        }
    }
}

impl InsightConfig {
    /// Rank of a priority in the configured sort order (unlisted sorts last).
    pub fn priority_rank(&self, priority: Priority) -> usize {
        self.priority_order
            .iter()
            .position(|p| *p == priority)
            .unwrap_or(self.priority_order.len())
    }

    /// Rank of an insight kind in the configured sort order.
    pub fn kind_rank(&self, kind: InsightKind) -> usize {
        self.kind_order
            .iter()
            .position(|k| *k == kind)
            .unwrap_or(self.kind_order.len())
    }
}
