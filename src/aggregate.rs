use std::collections::{BTreeMap, BTreeSet};

use chrono::{Datelike, NaiveDate};
use rand::rngs::StdRng;
use rand::SeedableRng;

use crate::models::{
    AgeBin, CategoryRevenue, ChannelShare, Dataset, Kpis, MonthlyRevenue, ScatterPoint, TableRow,
    Transaction,
};
use crate::report::{format_currency, format_percent};

/// Scatter output is capped at this many points; larger sets are subsampled
/// with a fixed seed so the same filtered input always yields the same plot.
pub const SCATTER_CAP: usize = 500;
pub const SCATTER_SEED: u64 = 42;

/// The raw-data table shows at most this many rows.
pub const TABLE_CAP: usize = 200;

const AGE_BINS: usize = 20;

/// The four headline metrics. A missing column zeroes the metrics that need
/// it; an empty dataset yields all zeroes.
pub fn kpis(dataset: &Dataset) -> Kpis {
    let mut kpis = Kpis {
        total_orders: dataset.len(),
        ..Kpis::default()
    };

    if dataset.schema.purchase_amount {
        let amounts: Vec<f64> = dataset
            .rows
            .iter()
            .filter_map(|row| row.purchase_amount)
            .collect();
        kpis.total_revenue = amounts.iter().sum();
        if !amounts.is_empty() {
            kpis.avg_order_value = kpis.total_revenue / amounts.len() as f64;
        }
    }

    if dataset.schema.customer_id {
        let distinct: BTreeSet<i64> = dataset
            .rows
            .iter()
            .filter_map(|row| row.customer_id)
            .collect();
        kpis.unique_customers = distinct.len();
    }

    kpis
}

/// Total purchase amount per category, ascending by revenue.
pub fn revenue_by_category(dataset: &Dataset) -> Vec<CategoryRevenue> {
    if !(dataset.schema.category && dataset.schema.purchase_amount) {
        return Vec::new();
    }

    let mut totals: BTreeMap<String, f64> = BTreeMap::new();
    for row in &dataset.rows {
        if let Some(category) = &row.category {
            *totals.entry(category.clone()).or_insert(0.0) +=
                row.purchase_amount.unwrap_or(0.0);
        }
    }

    let mut series: Vec<CategoryRevenue> = totals
        .into_iter()
        .map(|(category, revenue)| CategoryRevenue { category, revenue })
        .collect();
    series.sort_by(|a, b| {
        a.revenue
            .partial_cmp(&b.revenue)
            .unwrap_or(std::cmp::Ordering::Equal)
    });
    series
}

/// Total purchase amount per channel, in the order channels first appear.
pub fn channel_distribution(dataset: &Dataset) -> Vec<ChannelShare> {
    if !(dataset.schema.channel && dataset.schema.purchase_amount) {
        return Vec::new();
    }

    let mut shares: Vec<ChannelShare> = Vec::new();
    for row in &dataset.rows {
        let Some(channel) = &row.channel else {
            continue;
        };
        let amount = row.purchase_amount.unwrap_or(0.0);
        match shares.iter_mut().find(|s| &s.channel == channel) {
            Some(share) => share.revenue += amount,
            None => shares.push(ChannelShare {
                channel: channel.clone(),
                revenue: amount,
            }),
        }
    }
    shares
}

/// Revenue resampled into calendar-month buckets, chronological. Buckets are
/// month boundaries, not rolling windows; months with no transactions are
/// simply absent.
pub fn monthly_trend(dataset: &Dataset) -> Vec<MonthlyRevenue> {
    if !(dataset.schema.date && dataset.schema.purchase_amount) {
        return Vec::new();
    }

    let mut buckets: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for row in &dataset.rows {
        let Some(date) = row.date else {
            continue;
        };
        let Some(month) = NaiveDate::from_ymd_opt(date.year(), date.month(), 1) else {
            continue;
        };
        *buckets.entry(month).or_insert(0.0) += row.purchase_amount.unwrap_or(0.0);
    }

    buckets
        .into_iter()
        .map(|(month, revenue)| MonthlyRevenue { month, revenue })
        .collect()
}

/// Discount vs. purchase amount points, tagged with category where present.
/// Sets strictly larger than [`SCATTER_CAP`] are subsampled without
/// replacement using [`SCATTER_SEED`]; a set of exactly the cap size is kept
/// whole.
pub fn discount_scatter(dataset: &Dataset) -> Vec<ScatterPoint> {
    if !(dataset.schema.discount && dataset.schema.purchase_amount) {
        return Vec::new();
    }

    let to_point = |row: &Transaction| -> Option<ScatterPoint> {
        Some(ScatterPoint {
            discount: row.discount?,
            purchase_amount: row.purchase_amount?,
            category: row.category.clone(),
        })
    };

    if dataset.len() > SCATTER_CAP {
        let mut rng = StdRng::seed_from_u64(SCATTER_SEED);
        rand::seq::index::sample(&mut rng, dataset.len(), SCATTER_CAP)
            .into_iter()
            .filter_map(|index| to_point(&dataset.rows[index]))
            .collect()
    } else {
        dataset.rows.iter().filter_map(to_point).collect()
    }
}

/// Ages bucketed into 20 equal-width bins spanning the observed min and max.
/// A single observed value collapses to one bin holding everything.
pub fn age_histogram(dataset: &Dataset) -> Vec<AgeBin> {
    if !dataset.schema.age {
        return Vec::new();
    }

    let ages: Vec<f64> = dataset
        .rows
        .iter()
        .filter_map(|row| row.age)
        .map(|age| age as f64)
        .collect();
    if ages.is_empty() {
        return Vec::new();
    }

    let min = ages.iter().cloned().fold(f64::INFINITY, f64::min);
    let max = ages.iter().cloned().fold(f64::NEG_INFINITY, f64::max);
    if min == max {
        return vec![AgeBin {
            lower: min,
            upper: max,
            count: ages.len(),
        }];
    }

    let width = (max - min) / AGE_BINS as f64;
    let mut bins: Vec<AgeBin> = (0..AGE_BINS)
        .map(|i| AgeBin {
            lower: min + width * i as f64,
            upper: min + width * (i + 1) as f64,
            count: 0,
        })
        .collect();

    for age in ages {
        let index = (((age - min) / width) as usize).min(AGE_BINS - 1);
        bins[index].count += 1;
    }
    bins
}

/// The first [`TABLE_CAP`] rows in original order, with purchase amounts
/// rendered as currency and discounts as whole percentages.
pub fn table_view(dataset: &Dataset) -> Vec<TableRow> {
    dataset
        .rows
        .iter()
        .take(TABLE_CAP)
        .map(|row| TableRow {
            customer_id: row.customer_id.map(|id| id.to_string()).unwrap_or_default(),
            date: row.date.map(|d| d.to_string()).unwrap_or_default(),
            category: row.category.clone().unwrap_or_default(),
            channel: row.channel.clone().unwrap_or_default(),
            gender: row.gender.clone().unwrap_or_default(),
            age: row.age.map(|a| a.to_string()).unwrap_or_default(),
            purchase_amount: row
                .purchase_amount
                .map(|amount| format_currency(amount, 2))
                .unwrap_or_default(),
            discount: row.discount.map(format_percent).unwrap_or_default(),
        })
        .collect()
}

/// Per-category row counts; supports the row-count conservation check and the
/// summary output.
pub fn orders_by_category(dataset: &Dataset) -> Vec<(String, usize)> {
    if !dataset.schema.category {
        return Vec::new();
    }
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for row in &dataset.rows {
        if let Some(category) = &row.category {
            *counts.entry(category.clone()).or_insert(0) += 1;
        }
    }
    counts.into_iter().collect()
}
