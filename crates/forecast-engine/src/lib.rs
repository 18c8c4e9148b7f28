//! Next-week price forecasting via ordinary least squares.
//!
//! Each item's mean-price history is regressed on week number; the fitted
//! line is extended one week past the latest observation. Confidence comes
//! from R², so a noisy fit reports low confidence and a flat series reports
//! zero rather than NaN.

use std::collections::HashMap;

use statrs::statistics::Statistics;
use tracing::debug;

use pricing_core::{AnalyticsConfig, Forecast, Item, ItemHistory, Quote, Trend};


/// Regression denominators below this are treated as degenerate.
const DENOMINATOR_EPSILON: f64 = 1e-4;

/// Slope magnitude beyond which the trend is called out as a factor.
const FACTOR_SLOPE: f64 = 0.1;

/// Historical volatility beyond which forecasts carry a volatility factor.
const FACTOR_VOLATILITY: f64 = 2.0;

/// Closed-form OLS fit of price on week number.
#[derive(Debug, Clone, Copy)]
pub struct Regression {
    pub slope: f64,
    pub intercept: f64,
    pub r_squared: f64,
}

/// Fit `prices` against `weeks`. Returns `None` for fewer than two points or
/// a numerically degenerate denominator (all weeks identical).
pub fn linear_regression(weeks: &[u32], prices: &[f64]) -> Option<Regression> {
    let n = prices.len();
    if n < 2 || weeks.len() != n {
        return None;
    }

    let nf = n as f64;
    let sum_x: f64 = weeks.iter().map(|w| *w as f64).sum();
    let sum_y: f64 = prices.iter().sum();
    let sum_xy: f64 = weeks.iter().zip(prices).map(|(w, p)| *w as f64 * p).sum();
    let sum_x2: f64 = weeks.iter().map(|w| (*w as f64).powi(2)).sum();

    let denominator = nf * sum_x2 - sum_x * sum_x;
    if denominator.abs() < DENOMINATOR_EPSILON {
        return None;
    }

    let slope = (nf * sum_xy - sum_x * sum_y) / denominator;
    let intercept = (sum_y - slope * sum_x) / nf;

    let mean_y = sum_y / nf;
    let ss_res: f64 = weeks
        .iter()
        .zip(prices)
        .map(|(w, p)| {
            let predicted = slope * *w as f64 + intercept;
            (p - predicted).powi(2)
        })
        .sum();
    let ss_tot: f64 = prices.iter().map(|p| (p - mean_y).powi(2)).sum();

    // A zero-variance series fits perfectly but predicts nothing; report
    // zero explained variance instead of NaN or a negative value.
    let r_squared = if ss_tot > 0.0 {
        (1.0 - ss_res / ss_tot).max(0.0)
    } else {
        0.0
    };

    Some(Regression { slope, intercept, r_squared })
}

/// Produce a forecast for every item with history or current-week quotes.
///
/// The current price is the mean of valid current-week quotes when any
/// exist, falling back to the last historical point. Items with fewer than
/// two history points still get a degenerate forecast (current price, zero
/// confidence) when current quotes exist, so sparse items degrade instead
/// of vanishing.
pub fn forecast_items(
    histories: &[ItemHistory],
    current_quotes: &[Quote],
    items: &[Item],
    cfg: &AnalyticsConfig,
) -> Vec<Forecast> {
    let history_by_item: HashMap<&str, &ItemHistory> =
        histories.iter().map(|h| (h.item.id.as_str(), h)).collect();

    let mut quotes_by_item: HashMap<&str, Vec<&Quote>> = HashMap::new();
    for quote in current_quotes {
        quotes_by_item.entry(quote.item_id.as_str()).or_default().push(quote);
    }

    let mut forecasts = Vec::new();

    // Items slice order keeps the output deterministic.
    for item in items {
        let history = history_by_item.get(item.id.as_str()).copied();
        let item_quotes = quotes_by_item.get(item.id.as_str()).map(|q| q.as_slice()).unwrap_or(&[]);

        if history.is_none() && item_quotes.is_empty() {
            continue;
        }

        let current_prices: Vec<f64> =
            item_quotes.iter().filter_map(|q| q.effective_price()).collect();
        let has_current_quotes = !current_prices.is_empty();

        let current_price = if has_current_quotes {
            (&current_prices[..]).mean()
        } else {
            match history.and_then(|h| h.last_price()) {
                Some(price) => price,
                None => continue,
            }
        };

        let usable = history.filter(|h| h.mean_prices.len() >= 2);
        let Some(history) = usable else {
            if has_current_quotes {
                forecasts.push(Forecast {
                    item_id: item.id.clone(),
                    item_name: item.name.clone(),
                    category: item.category.clone(),
                    organic_flag: item.organic_flag,
                    current_price,
                    forecast_price: current_price,
                    confidence: 0.0,
                    trend: Trend::Stable,
                    factors: vec!["Insufficient historical data for accurate forecast".to_string()],
                    volatility: 0.0,
                    historical_weeks: Vec::new(),
                    historical_prices: Vec::new(),
                });
            }
            continue;
        };

        let Some(fit) = linear_regression(&history.weeks, &history.mean_prices) else {
            continue;
        };

        let next_week = history.weeks.iter().copied().max().unwrap_or(0) + 1;
        let forecast_price = (fit.slope * next_week as f64 + fit.intercept).max(0.0);
        let confidence = (fit.r_squared * 100.0).clamp(0.0, 100.0);

        let trend = if forecast_price > current_price * (1.0 + cfg.trend_band) {
            Trend::Up
        } else if forecast_price < current_price * (1.0 - cfg.trend_band) {
            Trend::Down
        } else {
            Trend::Stable
        };

        let mut factors = Vec::new();
        if history.volatility > FACTOR_VOLATILITY {
            factors.push("High volatility detected".to_string());
        }
        if fit.slope > FACTOR_SLOPE {
            factors.push("Strong upward trend".to_string());
        } else if fit.slope < -FACTOR_SLOPE {
            factors.push("Declining trend".to_string());
        }
        if item_quotes.len() >= 3 {
            factors.push("Multiple competitive suppliers".to_string());
        } else if history.mean_prices.len() >= 4 {
            factors.push("Strong historical pattern".to_string());
        }

        forecasts.push(Forecast {
            item_id: item.id.clone(),
            item_name: item.name.clone(),
            category: item.category.clone(),
            organic_flag: item.organic_flag,
            current_price,
            forecast_price,
            confidence,
            trend,
            factors,
            volatility: history.volatility,
            historical_weeks: history.weeks.clone(),
            historical_prices: history.mean_prices.clone(),
        });
    }

    debug!(forecasts = forecasts.len(), "price forecasts generated");
    forecasts
}
