//! Rule-based insight generation over current-week quotes and history.
//!
//! Every rule is independently evaluable; an item may trigger several. Items
//! with valid quotes always yield at least one insight (a low-priority
//! summary when nothing else fires), and items quoted only in past weeks
//! still produce volatility and trend findings.

use std::collections::HashMap;

use statrs::statistics::Statistics;
use tracing::debug;

use pricing_core::{
    Insight, InsightConfig, InsightKind, Item, ItemHistory, Priority, Quote, Trend,
};


struct PricedQuote<'a> {
    quote: &'a Quote,
    price: f64,
}

/// Scan current-week quotes plus aggregated history and emit a ranked list
/// of findings. The final list is stably sorted by the configured priority
/// and kind orders; rule insertion order breaks ties.
pub fn generate_insights(
    current_quotes: &[Quote],
    items: &[Item],
    histories: &[ItemHistory],
    cfg: &InsightConfig,
) -> Vec<Insight> {
    let history_by_item: HashMap<&str, &ItemHistory> =
        histories.iter().map(|h| (h.item.id.as_str(), h)).collect();

    let mut quotes_by_item: HashMap<&str, Vec<&Quote>> = HashMap::new();
    for quote in current_quotes {
        quotes_by_item.entry(quote.item_id.as_str()).or_default().push(quote);
    }

    let mut insights = Vec::new();

    // Items with current-week quotes first, in items order for determinism.
    for item in items {
        let Some(item_quotes) = quotes_by_item.get(item.id.as_str()) else {
            continue;
        };
        let valid: Vec<PricedQuote> = item_quotes
            .iter()
            .filter_map(|q| q.effective_price().map(|price| PricedQuote { quote: q, price }))
            .collect();
        if valid.is_empty() {
            continue;
        }
        current_week_rules(item, &valid, history_by_item.get(item.id.as_str()).copied(), cfg, &mut insights);
    }

    // Items quoted only in past weeks still surface historical findings.
    for item in items {
        if quotes_by_item.contains_key(item.id.as_str()) {
            continue;
        }
        if let Some(history) = history_by_item.get(item.id.as_str()) {
            historical_rules(item, history, cfg, &mut insights);
        }
    }

    insights.sort_by_key(|i| (cfg.priority_rank(i.priority), cfg.kind_rank(i.kind)));

    debug!(insights = insights.len(), "insights generated");
    insights
}

fn current_week_rules(
    item: &Item,
    valid: &[PricedQuote],
    history: Option<&ItemHistory>,
    cfg: &InsightConfig,
    insights: &mut Vec<Insight>,
) {
    let prices: Vec<f64> = valid.iter().map(|v| v.price).collect();
    let avg_price = (&prices[..]).mean();
    let min_price = prices.iter().copied().fold(f64::INFINITY, f64::min);
    let max_price = prices.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let spread_pct = if prices.len() > 1 {
        (max_price - min_price) / avg_price * 100.0
    } else {
        0.0
    };

    let mut triggered = false;

    // Opportunity: wide supplier spread means negotiation room.
    if spread_pct > cfg.spread_opportunity_pct {
        let strong = spread_pct > cfg.spread_high_pct;
        insights.push(Insight {
            kind: InsightKind::Opportunity,
            priority: if strong { Priority::High } else { Priority::Medium },
            title: format!("Price Spread: {}", item.name),
            description: format!(
                "{spread_pct:.1}% spread between suppliers (${min_price:.2} - ${max_price:.2}). {} negotiation opportunity.",
                if strong { "Strong" } else { "Good" }
            ),
            action: Some(format!(
                "Consider countering at ${:.2}",
                avg_price * cfg.counter_factor
            )),
            impact: Some(format!(
                "Potential savings: ${:.2} per {:.0} cases",
                (max_price - min_price) * cfg.lot_size,
                cfg.lot_size
            )),
            item_id: Some(item.id.clone()),
            supplier_id: None,
        });
        triggered = true;
    }

    // Risk: current pricing sits well above the historical average.
    if let Some(history) = history {
        if history.avg_price > 0.0 && avg_price > history.avg_price * cfg.risk_increase_ratio {
            let increase_pct = (avg_price / history.avg_price - 1.0) * 100.0;
            insights.push(Insight {
                kind: InsightKind::Risk,
                priority: if increase_pct > cfg.risk_high_pct {
                    Priority::High
                } else {
                    Priority::Medium
                },
                title: format!("Price Increase: {}", item.name),
                description: format!(
                    "Current avg ${avg_price:.2} is {increase_pct:.1}% above historical avg (${:.2}).",
                    history.avg_price
                ),
                action: Some("Review market conditions and supplier costs".to_string()),
                impact: Some(format!(
                    "Cost impact: +${:.2} per {:.0} cases",
                    (avg_price - history.avg_price) * cfg.lot_size,
                    cfg.lot_size
                )),
                item_id: Some(item.id.clone()),
                supplier_id: None,
            });
            triggered = true;
        }
    }

    // Recommendation: a clearly cheapest supplier worth prioritizing.
    let best = valid.iter().min_by(|a, b| {
        a.price.partial_cmp(&b.price).unwrap_or(std::cmp::Ordering::Equal)
    });
    if let Some(best) = best.filter(|_| valid.len() > 1) {
        if best.price < avg_price * cfg.best_price_ratio {
            let savings_pct = (1.0 - best.price / avg_price) * 100.0;
            insights.push(Insight {
                kind: InsightKind::Recommendation,
                priority: if savings_pct > cfg.savings_high_pct {
                    Priority::High
                } else {
                    Priority::Medium
                },
                title: format!("Best Price: {}", supplier_label(best.quote)),
                description: format!(
                    "${:.2} is {savings_pct:.1}% below average (${avg_price:.2}).",
                    best.price
                ),
                action: Some("Consider prioritizing this supplier".to_string()),
                impact: None,
                item_id: Some(item.id.clone()),
                supplier_id: Some(best.quote.supplier_id.clone()),
            });
            triggered = true;
        }
    }

    // Anomaly: a quote far below the pack may be a data-entry or quality
    // concern; flag it, never auto-accept.
    if min_price < avg_price * cfg.anomaly_ratio && valid.len() > 1 {
        let low = valid.iter().find(|v| v.price == min_price);
        let discount_pct = (1.0 - min_price / avg_price) * 100.0;
        insights.push(Insight {
            kind: InsightKind::Anomaly,
            priority: if discount_pct > cfg.anomaly_high_pct {
                Priority::High
            } else {
                Priority::Medium
            },
            title: format!("Low Price Alert: {}", item.name),
            description: format!(
                "{} quoted ${min_price:.2}, {discount_pct:.1}% below average.",
                low.map(|v| supplier_label(v.quote)).unwrap_or_else(|| "Supplier".to_string())
            ),
            action: Some("Verify quality and terms before accepting".to_string()),
            impact: None,
            item_id: Some(item.id.clone()),
            supplier_id: low.map(|v| v.quote.supplier_id.clone()),
        });
        triggered = true;
    }

    // Fallback: an item with data never disappears silently.
    if !triggered {
        let range = if prices.len() > 1 {
            format!(", Range: ${min_price:.2} - ${max_price:.2}")
        } else {
            String::new()
        };
        let historical_note = match history {
            Some(h) => format!("Historical avg: ${:.2}.", h.avg_price),
            None => "No historical data available yet.".to_string(),
        };
        insights.push(Insight {
            kind: InsightKind::Recommendation,
            priority: Priority::Low,
            title: format!("Pricing Summary: {}", item.name),
            description: format!(
                "{} supplier{} submitted pricing. Average: ${avg_price:.2}{range}. {historical_note}",
                valid.len(),
                if valid.len() > 1 { "s" } else { "" }
            ),
            action: Some("Review pricing and proceed with negotiations".to_string()),
            impact: None,
            item_id: Some(item.id.clone()),
            supplier_id: None,
        });
    }
}

fn historical_rules(
    item: &Item,
    history: &ItemHistory,
    cfg: &InsightConfig,
    insights: &mut Vec<Insight>,
) {
    if history.avg_price <= 0.0 {
        return;
    }

    if history.volatility > cfg.volatility_risk {
        insights.push(Insight {
            kind: InsightKind::Risk,
            priority: if history.volatility > cfg.volatility_high {
                Priority::High
            } else {
                Priority::Medium
            },
            title: format!("Price Volatility: {}", item.name),
            description: format!(
                "Historical price volatility of ${:.2} indicates unstable pricing. Average historical price: ${:.2}.",
                history.volatility, history.avg_price
            ),
            action: Some("Monitor closely and negotiate stable pricing".to_string()),
            impact: None,
            item_id: Some(item.id.clone()),
            supplier_id: None,
        });
    }

    match history.trend {
        Trend::Up => insights.push(Insight {
            kind: InsightKind::Risk,
            priority: Priority::Medium,
            title: format!("Upward Price Trend: {}", item.name),
            description: format!(
                "Historical data shows upward pricing trend. Average: ${:.2}.",
                history.avg_price
            ),
            action: Some("Consider locking in pricing early".to_string()),
            impact: None,
            item_id: Some(item.id.clone()),
            supplier_id: None,
        }),
        Trend::Down => insights.push(Insight {
            kind: InsightKind::Opportunity,
            priority: Priority::Medium,
            title: format!("Declining Price Trend: {}", item.name),
            description: format!(
                "Historical data shows declining pricing trend. Average: ${:.2}.",
                history.avg_price
            ),
            action: Some("Good time to negotiate favorable pricing".to_string()),
            impact: None,
            item_id: Some(item.id.clone()),
            supplier_id: None,
        }),
        Trend::Stable => {}
    }
}

fn supplier_label(quote: &Quote) -> String {
    quote
        .supplier_name
        .clone()
        .unwrap_or_else(|| "Supplier".to_string())
}
