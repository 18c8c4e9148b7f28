//! Category, volatility, momentum, and dataset-level rollups consumed by
//! dashboards.

use std::collections::{BTreeMap, HashSet};

use statrs::statistics::Statistics;

use pricing_core::{CategoryRollup, ItemHistory, MarketSummary, Momentum, OrganicFlag, VolatilityRollup};

/// Below this first-to-last change (percent) a SKU counts as flat in the
/// market summary; absorbs rounding noise.
const FLAT_CHANGE_PCT: f64 = 0.01;

/// Average each category's best-price series: one average per SKU, then the
/// mean of SKU averages per category. Sorted most expensive first.
pub fn category_price_rollup(histories: &[ItemHistory]) -> Vec<CategoryRollup> {
    let mut groups: BTreeMap<&str, (Vec<f64>, usize)> = BTreeMap::new();

    for history in histories {
        let week_bests: Vec<f64> = history.best_price_by_week.values().copied().collect();
        if week_bests.is_empty() {
            continue;
        }
        let sku_avg = (&week_bests[..]).mean();
        let entry = groups.entry(history.item.category.as_str()).or_default();
        entry.0.push(sku_avg);
        entry.1 += 1;
    }

    let mut rollups: Vec<CategoryRollup> = groups
        .into_iter()
        .map(|(category, (sku_avgs, sku_count))| CategoryRollup {
            category: category.to_string(),
            avg_price: (&sku_avgs[..]).mean(),
            sku_count,
        })
        .filter(|c| c.avg_price > 0.0)
        .collect();

    rollups.sort_by(|a, b| b.avg_price.partial_cmp(&a.avg_price).unwrap_or(std::cmp::Ordering::Equal));
    rollups
}

/// Mean supplier volatility per (category, CONV/ORG) group.
pub fn volatility_by_category(histories: &[ItemHistory]) -> Vec<VolatilityRollup> {
    let mut groups: BTreeMap<(&str, OrganicFlag), (f64, usize)> = BTreeMap::new();

    for history in histories {
        let vols: Vec<f64> = history
            .suppliers
            .iter()
            .filter(|s| !s.prices.is_empty())
            .map(|s| supplier_volatility(&s.prices))
            .collect();
        if vols.is_empty() {
            continue;
        }
        let avg_vol = (&vols[..]).mean();
        let key = (history.item.category.as_str(), history.item.organic_flag);
        let entry = groups.entry(key).or_insert((0.0, 0));
        entry.0 += avg_vol;
        entry.1 += 1;
    }

    groups
        .into_iter()
        .map(|((category, organic_flag), (total, count))| VolatilityRollup {
            category: category.to_string(),
            organic_flag,
            volatility: total / count as f64,
            sku_count: count,
        })
        .collect()
}

fn supplier_volatility(prices: &[f64]) -> f64 {
    if prices.len() > 1 {
        prices.std_dev()
    } else {
        0.0
    }
}

/// Momentum per item: split the best-price weeks into first/middle/last and
/// compare the early change rate against the late one. Positive momentum
/// means price increases are accelerating. Items need at least three weeks
/// of best-price data and positive prices at all three probe points.
/// Sorted by absolute momentum, strongest swing first.
pub fn momentum(histories: &[ItemHistory]) -> Vec<Momentum> {
    let mut entries: Vec<Momentum> = histories
        .iter()
        .filter_map(|history| {
            let weeks: Vec<u32> = history.best_price_by_week.keys().copied().collect();
            if weeks.len() < 3 {
                return None;
            }
            let first = history.best_price_by_week[&weeks[0]];
            let mid = history.best_price_by_week[&weeks[weeks.len() / 2]];
            let last = history.best_price_by_week[&weeks[weeks.len() - 1]];
            if first <= 0.0 || mid <= 0.0 || last <= 0.0 {
                return None;
            }
            let early_change_pct = (mid - first) / first * 100.0;
            let late_change_pct = (last - mid) / mid * 100.0;
            Some(Momentum {
                item_id: history.item.id.clone(),
                item_name: history.item.name.clone(),
                organic_flag: history.item.organic_flag,
                early_change_pct,
                late_change_pct,
                momentum: late_change_pct - early_change_pct,
            })
        })
        .collect();

    entries.sort_by(|a, b| {
        b.momentum
            .abs()
            .partial_cmp(&a.momentum.abs())
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    entries
}

/// Headline numbers across the whole dataset. `None` when there is no
/// history at all, so callers can render an explicit empty state.
pub fn market_summary(histories: &[ItemHistory]) -> Option<MarketSummary> {
    if histories.is_empty() {
        return None;
    }

    let mut total_change = 0.0;
    let mut changed_skus = 0usize;
    let mut increases = 0usize;
    let mut decreases = 0usize;
    let mut flat = 0usize;
    let mut total_volatility = 0.0;
    let mut volatile_skus = 0usize;
    let mut all_weeks: HashSet<u32> = HashSet::new();

    for history in histories {
        all_weeks.extend(history.best_price_by_week.keys().copied());

        let bests: Vec<f64> = history.best_price_by_week.values().copied().collect();
        if bests.len() >= 2 {
            let first = bests[0];
            let last = bests[bests.len() - 1];
            if first > 0.0 && last > 0.0 {
                let change_pct = (last - first) / first * 100.0;
                total_change += change_pct;
                changed_skus += 1;
                if change_pct > FLAT_CHANGE_PCT {
                    increases += 1;
                } else if change_pct < -FLAT_CHANGE_PCT {
                    decreases += 1;
                } else {
                    flat += 1;
                }
            }
        }

        let vols: Vec<f64> = history
            .suppliers
            .iter()
            .filter(|s| !s.prices.is_empty())
            .map(|s| supplier_volatility(&s.prices))
            .collect();
        if !vols.is_empty() {
            total_volatility += (&vols[..]).mean();
            volatile_skus += 1;
        }
    }

    Some(MarketSummary {
        total_skus: histories.len(),
        total_weeks: all_weeks.len(),
        avg_price_change_pct: if changed_skus > 0 { total_change / changed_skus as f64 } else { 0.0 },
        price_increase_count: increases,
        price_decrease_count: decreases,
        price_flat_count: flat,
        avg_volatility: if volatile_skus > 0 { total_volatility / volatile_skus as f64 } else { 0.0 },
    })
}
