//! Historical aggregation of closed-week pricing data.
//!
//! Walks every closed/finalized week, resolves the effective price of each
//! quote, and builds one consistent per-item time series plus per-supplier
//! sub-series. Every other analytics engine consumes this output.

use std::collections::{BTreeMap, HashMap, HashSet};

use futures_util::future::join_all;
use statrs::statistics::Statistics;
use tracing::{debug, warn};

use pricing_core::{
    Item, ItemHistory, PriceChange, PricingError, PricingRepository, Quote, Supplier,
    SupplierSeries, Trend, Week,
};

/// First-to-last change (in percent) beyond which a history is labelled
/// up or down rather than stable.
const TREND_BAND_PCT: f64 = 2.0;

#[derive(Default)]
struct SupplierAcc {
    name: Option<String>,
    weeks: Vec<u32>,
    prices: Vec<f64>,
    best_price_wins: usize,
}

/// Fetch all reference data and quotes, then aggregate.
///
/// Per-week quote fetches are issued concurrently; a week whose fetch fails
/// is logged and skipped so partial upstream outages degrade the output
/// instead of aborting it. Zero closed/finalized weeks yields `Ok(vec![])`,
/// the explicit empty state.
pub async fn collect_history(
    repo: &dyn PricingRepository,
) -> Result<Vec<ItemHistory>, PricingError> {
    let (weeks, items, suppliers) = tokio::try_join!(
        repo.list_weeks(),
        repo.list_items(),
        repo.list_suppliers(),
    )?;

    let mut valid: Vec<Week> = weeks.into_iter().filter(|w| w.status.is_complete()).collect();
    valid.sort_by_key(|w| w.week_number);

    if valid.is_empty() {
        debug!("no closed/finalized weeks available for historical aggregation");
        return Ok(Vec::new());
    }

    debug!(
        weeks = valid.len(),
        items = items.len(),
        "aggregating historical pricing data"
    );

    let fetches = valid.iter().map(|w| repo.list_quotes_for_week(&w.id));
    let results = join_all(fetches).await;

    let mut quotes_by_week: HashMap<String, Vec<Quote>> = HashMap::new();
    for (week, result) in valid.iter().zip(results) {
        match result {
            Ok(quotes) => {
                quotes_by_week.insert(week.id.clone(), quotes);
            }
            Err(err) => {
                warn!(week = week.week_number, error = %err, "skipping week: quote fetch failed");
            }
        }
    }

    Ok(aggregate(&valid, &items, &quotes_by_week, &suppliers))
}

/// Build per-item histories from already-fetched data. Pure and
/// deterministic: identical inputs yield identical output.
///
/// Weeks that are not closed/finalized, weeks missing from `quotes_by_week`,
/// quotes without a positive effective price, and items with zero valid
/// weeks all contribute nothing. No week or item appears twice.
pub fn aggregate(
    weeks: &[Week],
    items: &[Item],
    quotes_by_week: &HashMap<String, Vec<Quote>>,
    suppliers: &[Supplier],
) -> Vec<ItemHistory> {
    let mut valid_weeks: Vec<&Week> = weeks.iter().filter(|w| w.status.is_complete()).collect();
    valid_weeks.sort_by_key(|w| w.week_number);

    // Guard against duplicate week numbers upstream; first one wins.
    let mut seen = HashSet::new();
    valid_weeks.retain(|w| seen.insert(w.week_number));

    let name_by_supplier: HashMap<&str, &str> = suppliers
        .iter()
        .map(|s| (s.id.as_str(), s.name.as_str()))
        .collect();

    let mut histories = Vec::new();

    for item in items {
        if let Some(history) = aggregate_item(item, &valid_weeks, quotes_by_week, &name_by_supplier)
        {
            histories.push(history);
        }
    }

    debug!(items = histories.len(), "historical aggregation complete");
    histories
}

fn aggregate_item(
    item: &Item,
    valid_weeks: &[&Week],
    quotes_by_week: &HashMap<String, Vec<Quote>>,
    name_by_supplier: &HashMap<&str, &str>,
) -> Option<ItemHistory> {
    let mut week_numbers: Vec<u32> = Vec::new();
    let mut mean_prices: Vec<f64> = Vec::new();
    let mut best_price_by_week: BTreeMap<u32, f64> = BTreeMap::new();
    let mut avg_price_by_week: BTreeMap<u32, f64> = BTreeMap::new();
    let mut supplier_accs: HashMap<String, SupplierAcc> = HashMap::new();

    for week in valid_weeks {
        let quotes = match quotes_by_week.get(&week.id) {
            Some(quotes) => quotes,
            None => continue, // fetch failed or week absent; skip, don't abort
        };

        let mut week_prices: Vec<(String, Option<String>, f64)> = Vec::new();
        for quote in quotes.iter().filter(|q| q.item_id == item.id) {
            if let Some(price) = quote.effective_price() {
                week_prices.push((quote.supplier_id.clone(), quote.supplier_name.clone(), price));
            }
        }

        if week_prices.is_empty() {
            continue;
        }

        let prices: Vec<f64> = week_prices.iter().map(|(_, _, p)| *p).collect();
        let best = prices.iter().copied().fold(f64::INFINITY, f64::min);
        let avg = (&prices[..]).mean();

        week_numbers.push(week.week_number);
        mean_prices.push(avg);
        best_price_by_week.insert(week.week_number, best);
        avg_price_by_week.insert(week.week_number, avg);

        for (supplier_id, supplier_name, price) in week_prices {
            let acc = supplier_accs.entry(supplier_id).or_default();
            if acc.name.is_none() {
                acc.name = supplier_name;
            }
            acc.weeks.push(week.week_number);
            acc.prices.push(price);
            if price == best {
                acc.best_price_wins += 1;
            }
        }
    }

    if week_numbers.is_empty() {
        return None;
    }

    let total_weeks = week_numbers.len();
    let mut suppliers: Vec<SupplierSeries> = supplier_accs
        .into_iter()
        .map(|(supplier_id, acc)| {
            let name = acc
                .name
                .or_else(|| name_by_supplier.get(supplier_id.as_str()).map(|n| n.to_string()))
                .unwrap_or_else(|| "Unknown".to_string());
            SupplierSeries {
                supplier_id,
                supplier_name: name,
                win_rate: acc.best_price_wins as f64 / total_weeks as f64 * 100.0,
                weeks: acc.weeks,
                prices: acc.prices,
            }
        })
        .collect();
    // Deterministic order; consumers re-sort by the comparator they need.
    suppliers.sort_by(|a, b| a.supplier_id.cmp(&b.supplier_id));

    let avg_price = (&mean_prices[..]).mean();
    let volatility = if mean_prices.len() > 1 {
        (&mean_prices[..]).std_dev()
    } else {
        0.0
    };

    let trend = trend_of(&mean_prices);
    let price_changes = price_changes_of(&week_numbers, &mean_prices);

    Some(ItemHistory {
        item: item.clone(),
        weeks: week_numbers,
        mean_prices,
        best_price_by_week,
        avg_price_by_week,
        suppliers,
        avg_price,
        volatility,
        trend,
        price_changes,
    })
}

fn trend_of(prices: &[f64]) -> Trend {
    if prices.len() < 2 {
        return Trend::Stable;
    }
    let first = prices[0];
    let last = prices[prices.len() - 1];
    if first <= 0.0 {
        return Trend::Stable;
    }
    let change_pct = (last - first) / first * 100.0;
    if change_pct > TREND_BAND_PCT {
        Trend::Up
    } else if change_pct < -TREND_BAND_PCT {
        Trend::Down
    } else {
        Trend::Stable
    }
}

fn price_changes_of(weeks: &[u32], prices: &[f64]) -> Vec<PriceChange> {
    let mut changes = Vec::new();
    for i in 1..prices.len() {
        let prev = prices[i - 1];
        if prev <= 0.0 {
            continue;
        }
        let change = prices[i] - prev;
        changes.push(PriceChange {
            week: weeks[i],
            change,
            change_percent: change / prev * 100.0,
        });
    }
    changes
}
