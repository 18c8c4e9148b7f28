use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Lifecycle state of a weekly negotiation cycle.
///
/// Only `Closed` and `Finalized` weeks carry complete data; `Open` weeks may
/// still be changing and must never feed historical statistics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WeekStatus {
    Open,
    Closed,
    Finalized,
}

impl WeekStatus {
    pub fn is_complete(&self) -> bool {
        matches!(self, WeekStatus::Closed | WeekStatus::Finalized)
    }
}

/// A weekly sourcing cycle.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Week {
    pub id: String,
    pub week_number: u32,
    pub status: WeekStatus,
    pub start_date: NaiveDate,
    pub end_date: NaiveDate,
}

/// Conventional vs organic produce.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum OrganicFlag {
    #[serde(rename = "CONV")]
    Conv,
    #[serde(rename = "ORG")]
    Org,
}

impl OrganicFlag {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrganicFlag::Conv => "CONV",
            OrganicFlag::Org => "ORG",
        }
    }
}

/// A SKU: the unit of analysis for every series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Item {
    pub id: String,
    pub name: String,
    pub category: String,
    pub pack_size: String,
    pub organic_flag: OrganicFlag,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Supplier {
    pub id: String,
    pub name: String,
}

/// One quote per (week, item, supplier), pre-joined with supplier identity
/// where the repository has it.
///
/// The price ladder mirrors the negotiation stages: initial FOB, optional
/// delivered price, RF counter, supplier revision, RF final.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Quote {
    pub week_id: String,
    pub item_id: String,
    pub supplier_id: String,
    #[serde(default)]
    pub supplier_name: Option<String>,
    #[serde(default)]
    pub supplier_fob: Option<f64>,
    #[serde(default)]
    pub supplier_dlvd: Option<f64>,
    #[serde(default)]
    pub rf_counter_fob: Option<f64>,
    #[serde(default)]
    pub supplier_revised_fob: Option<f64>,
    #[serde(default)]
    pub rf_final_fob: Option<f64>,
}

impl Quote {
    /// Resolve the price this quote contributes to aggregation.
    ///
    /// Precedence: `rf_final_fob` > `supplier_revised_fob` > `supplier_fob`.
    /// A level that is absent, zero, or negative does not count as a price;
    /// the next level is consulted. Returns `None` when no level holds a
    /// positive value, in which case the quote contributes nothing.
    pub fn effective_price(&self) -> Option<f64> {
        [self.rf_final_fob, self.supplier_revised_fob, self.supplier_fob]
            .into_iter()
            .flatten()
            .find(|p| *p > 0.0)
    }
}

/// Direction of a price series.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    pub fn as_str(&self) -> &'static str {
        match self {
            Trend::Up => "up",
            Trend::Down => "down",
            Trend::Stable => "stable",
        }
    }
}

/// A supplier's own effective price at each week it quoted for one item.
/// `weeks` and `prices` are parallel, index-aligned arrays.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierSeries {
    pub supplier_id: String,
    pub supplier_name: String,
    pub weeks: Vec<u32>,
    pub prices: Vec<f64>,
    /// Share of the item's aggregated weeks (0-100) where this supplier held
    /// the week's best price. A supplier absent half the weeks caps at 50.
    pub win_rate: f64,
}

/// Week-over-week movement of an item's mean price.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PriceChange {
    pub week: u32,
    pub change: f64,
    pub change_percent: f64,
}

/// Full multi-week pricing history for one item, aggregated from every
/// closed/finalized week with at least one valid quote.
///
/// `weeks` is strictly increasing with no duplicates; `mean_prices` is
/// parallel to it and holds the per-week mean of all valid supplier prices
/// (the canonical trend series). Best and average prices are also kept keyed
/// by week number for the competitiveness and spread calculations.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemHistory {
    pub item: Item,
    pub weeks: Vec<u32>,
    pub mean_prices: Vec<f64>,
    pub best_price_by_week: BTreeMap<u32, f64>,
    pub avg_price_by_week: BTreeMap<u32, f64>,
    pub suppliers: Vec<SupplierSeries>,
    /// Mean of the per-week mean prices across the whole history.
    pub avg_price: f64,
    /// Sample standard deviation of the mean-price series; 0 for n <= 1.
    pub volatility: f64,
    /// First-to-last change of the mean series, labelled with a 2% band.
    pub trend: Trend,
    pub price_changes: Vec<PriceChange>,
}

impl ItemHistory {
    /// Latest point of the mean-price series, if any.
    pub fn last_price(&self) -> Option<f64> {
        self.mean_prices.last().copied()
    }
}

/// Urgency of an insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Priority::High => "high",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

/// Category of a generated insight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Opportunity,
    Risk,
    Recommendation,
    Anomaly,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            InsightKind::Opportunity => "opportunity",
            InsightKind::Risk => "risk",
            InsightKind::Recommendation => "recommendation",
            InsightKind::Anomaly => "anomaly",
        }
    }
}

/// A single actionable finding. Ephemeral: regenerated on every analysis
/// pass, never persisted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Insight {
    #[serde(rename = "type")]
    pub kind: InsightKind,
    pub priority: Priority,
    pub title: String,
    pub description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub impact: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_id: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supplier_id: Option<String>,
}

/// Next-week price projection for one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Forecast {
    pub item_id: String,
    pub item_name: String,
    pub category: String,
    pub organic_flag: OrganicFlag,
    pub current_price: f64,
    pub forecast_price: f64,
    /// R²-derived confidence, 0-100. Zero for flat or insufficient series.
    pub confidence: f64,
    pub trend: Trend,
    pub factors: Vec<String>,
    pub volatility: f64,
    pub historical_weeks: Vec<u32>,
    pub historical_prices: Vec<f64>,
}

/// Per-supplier statistics for one item.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SupplierStats {
    pub supplier_id: String,
    pub supplier_name: String,
    pub avg_price: f64,
    /// Sample standard deviation of this supplier's prices; 0 for n <= 1.
    pub volatility: f64,
    /// Share of quoted weeks (0-100) within the competitive band of the
    /// week's best price.
    pub consistency: f64,
    pub win_rate: f64,
    pub weeks_quoted: usize,
}

/// Supplier ranking for one item, cheapest average first, plus the item's
/// competitiveness index when at least two suppliers qualify.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemSupplierStats {
    pub item_id: String,
    pub item_name: String,
    pub suppliers: Vec<SupplierStats>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub competitiveness: Option<f64>,
}

/// Average of an item category's best-price-by-week series.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CategoryRollup {
    pub category: String,
    pub avg_price: f64,
    pub sku_count: usize,
}

/// Mean supplier volatility per (category, CONV/ORG) group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VolatilityRollup {
    pub category: String,
    pub organic_flag: OrganicFlag,
    pub volatility: f64,
    pub sku_count: usize,
}

/// Whether an item's price changes are accelerating (positive momentum) or
/// decelerating, from a first/middle/last split of its best-price weeks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Momentum {
    pub item_id: String,
    pub item_name: String,
    pub organic_flag: OrganicFlag,
    pub early_change_pct: f64,
    pub late_change_pct: f64,
    pub momentum: f64,
}

/// Dataset-wide headline numbers for dashboards.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MarketSummary {
    pub total_skus: usize,
    pub total_weeks: usize,
    pub avg_price_change_pct: f64,
    pub price_increase_count: usize,
    pub price_decrease_count: usize,
    pub price_flat_count: usize,
    pub avg_volatility: f64,
}
