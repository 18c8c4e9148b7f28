//! Flat row views of forecasts and insights for CSV export and the report
//! JSON payload.

use serde::{Deserialize, Serialize};

use pricing_core::{Forecast, Insight, PricingError};

use crate::AnalyticsReport;

/// One forecast as a flat exportable row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ForecastRow {
    pub item_id: String,
    pub item_name: String,
    pub category: String,
    pub organic_flag: String,
    pub current_price: f64,
    pub forecast_price: f64,
    pub change_pct: f64,
    pub confidence: f64,
    pub trend: String,
    pub volatility: f64,
    /// Contributing factors joined with "; " for single-cell rendering.
    pub factors: String,
}

impl From<&Forecast> for ForecastRow {
    fn from(forecast: &Forecast) -> Self {
        let change_pct = if forecast.current_price > 0.0 {
            (forecast.forecast_price - forecast.current_price) / forecast.current_price * 100.0
        } else {
            0.0
        };
        Self {
            item_id: forecast.item_id.clone(),
            item_name: forecast.item_name.clone(),
            category: forecast.category.clone(),
            organic_flag: forecast.organic_flag.as_str().to_string(),
            current_price: forecast.current_price,
            forecast_price: forecast.forecast_price,
            change_pct,
            confidence: forecast.confidence,
            trend: forecast.trend.as_str().to_string(),
            volatility: forecast.volatility,
            factors: forecast.factors.join("; "),
        }
    }
}

/// One insight as a flat exportable row.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InsightRow {
    #[serde(rename = "type")]
    pub kind: String,
    pub priority: String,
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

impl From<&Insight> for InsightRow {
    fn from(insight: &Insight) -> Self {
        Self {
            kind: insight.kind.as_str().to_string(),
            priority: insight.priority.as_str().to_string(),
            title: insight.title.clone(),
            description: insight.description.clone(),
            action: insight.action.clone(),
            impact: insight.impact.clone(),
            item_id: insight.item_id.clone(),
            supplier_id: insight.supplier_id.clone(),
        }
    }
}

pub fn forecast_rows(forecasts: &[Forecast]) -> Vec<ForecastRow> {
    forecasts.iter().map(ForecastRow::from).collect()
}

pub fn insight_rows(insights: &[Insight]) -> Vec<InsightRow> {
    insights.iter().map(InsightRow::from).collect()
}

/// Serialize a report as pretty JSON for the API payload or file export.
pub fn report_json(report: &AnalyticsReport) -> Result<String, PricingError> {
    serde_json::to_string_pretty(report).map_err(|e| PricingError::Serialization(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pricing_core::{InsightKind, OrganicFlag, Priority, Trend};

    #[test]
    fn forecast_row_derives_change_percent() {
        let forecast = Forecast {
            item_id: "i1".to_string(),
            item_name: "Iceberg".to_string(),
            category: "lettuce".to_string(),
            organic_flag: OrganicFlag::Org,
            current_price: 10.0,
            forecast_price: 11.0,
            confidence: 80.0,
            trend: Trend::Up,
            factors: vec!["Strong upward trend".to_string(), "Strong historical pattern".to_string()],
            volatility: 0.5,
            historical_weeks: vec![1, 2],
            historical_prices: vec![9.5, 10.0],
        };
        let row = ForecastRow::from(&forecast);
        assert!((row.change_pct - 10.0).abs() < 1e-9);
        assert_eq!(row.organic_flag, "ORG");
        assert_eq!(row.trend, "up");
        assert_eq!(row.factors, "Strong upward trend; Strong historical pattern");
    }

    #[test]
    fn insight_row_keeps_optional_fields_optional() {
        let insight = Insight {
            kind: InsightKind::Risk,
            priority: Priority::High,
            title: "Price Increase: Iceberg".to_string(),
            description: "desc".to_string(),
            action: None,
            impact: None,
            item_id: Some("i1".to_string()),
            supplier_id: None,
        };
        let row = InsightRow::from(&insight);
        assert_eq!(row.kind, "risk");
        assert_eq!(row.priority, "high");
        assert!(row.action.is_none());

        let json = serde_json::to_string(&row).unwrap();
        assert!(!json.contains("action"));
        assert!(json.contains("\"type\":\"risk\""));
    }
}
