//! Statistical summaries over aggregated pricing histories.
//!
//! Derives per-supplier scalar statistics (average, volatility, consistency),
//! per-item supplier rankings, and the competitiveness index. Group rollups
//! live in [`rollups`].

use std::cmp::Ordering;

use statrs::statistics::Statistics;
use tracing::debug;

use pricing_core::{AnalyticsConfig, ItemHistory, ItemSupplierStats, SupplierStats};

pub mod rollups;

pub use rollups::*;


/// Compute per-supplier statistics and the competitiveness index for every
/// item history. Suppliers are ranked cheapest average first.
pub fn summarize(histories: &[ItemHistory], cfg: &AnalyticsConfig) -> Vec<ItemSupplierStats> {
    let stats: Vec<ItemSupplierStats> = histories
        .iter()
        .map(|history| summarize_item(history, cfg))
        .collect();
    debug!(items = stats.len(), "supplier statistics computed");
    stats
}

fn summarize_item(history: &ItemHistory, cfg: &AnalyticsConfig) -> ItemSupplierStats {
    let mut suppliers: Vec<SupplierStats> = history
        .suppliers
        .iter()
        .filter(|series| !series.prices.is_empty())
        .map(|series| {
            let avg_price = (&series.prices[..]).mean();
            let volatility = if series.prices.len() > 1 {
                (&series.prices[..]).std_dev()
            } else {
                0.0
            };

            // Consistency: share of quoted weeks within the competitive band
            // of that week's best price. Zero checkable weeks scores 0.
            let mut competitive = 0usize;
            let mut checked = 0usize;
            for (week, price) in series.weeks.iter().zip(series.prices.iter()) {
                if let Some(best) = history.best_price_by_week.get(week) {
                    if *best > 0.0 && *price > 0.0 {
                        checked += 1;
                        if *price <= best * cfg.consistency_band {
                            competitive += 1;
                        }
                    }
                }
            }
            let consistency = if checked > 0 {
                competitive as f64 / checked as f64 * 100.0
            } else {
                0.0
            };

            SupplierStats {
                supplier_id: series.supplier_id.clone(),
                supplier_name: series.supplier_name.clone(),
                avg_price,
                volatility,
                consistency,
                win_rate: series.win_rate,
                weeks_quoted: series.weeks.len(),
            }
        })
        .collect();

    // Rank 1 = cheapest on average. Stable sort: ties keep supplier-id order
    // from the aggregator.
    suppliers.sort_by(|a, b| a.avg_price.partial_cmp(&b.avg_price).unwrap_or(Ordering::Equal));

    let competitiveness = competitiveness_index(&suppliers, cfg);

    ItemSupplierStats {
        item_id: history.item.id.clone(),
        item_name: history.item.name.clone(),
        suppliers,
        competitiveness,
    }
}

/// Competitiveness index for one item: how close the two cheapest suppliers'
/// averages sit. 100 when tied, dropping by `spread_penalty` per spread
/// percent, clamped to 0-100. `None` when fewer than two suppliers have a
/// valid average; single-source items are excluded rather than scored 0.
fn competitiveness_index(suppliers: &[SupplierStats], cfg: &AnalyticsConfig) -> Option<f64> {
    let valid: Vec<&SupplierStats> = suppliers.iter().filter(|s| s.avg_price > 0.0).collect();
    if valid.len() < 2 {
        return None;
    }
    let cheapest = valid[0].avg_price;
    let second = valid[1].avg_price;
    let spread_pct = (second - cheapest) / cheapest * 100.0;
    Some((100.0 - spread_pct * cfg.spread_penalty).clamp(0.0, 100.0))
}

/// Mean competitiveness across all qualifying items. `None` when no item has
/// at least two valid suppliers.
pub fn overall_competitiveness(stats: &[ItemSupplierStats]) -> Option<f64> {
    let scores: Vec<f64> = stats.iter().filter_map(|s| s.competitiveness).collect();
    if scores.is_empty() {
        None
    } else {
        Some((&scores[..]).mean())
    }
}
