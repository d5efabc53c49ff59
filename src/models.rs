use std::collections::BTreeSet;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One customer purchase event. Every field is optional because the input
/// file may carry any subset of the known columns; presence is tracked once
/// per dataset in [`Schema`] rather than re-checked row by row.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Transaction {
    #[serde(rename = "Customer_ID")]
    pub customer_id: Option<i64>,
    #[serde(rename = "Date")]
    pub date: Option<NaiveDate>,
    #[serde(rename = "Category")]
    pub category: Option<String>,
    #[serde(rename = "Channel")]
    pub channel: Option<String>,
    #[serde(rename = "Gender")]
    pub gender: Option<String>,
    #[serde(rename = "Age")]
    pub age: Option<i64>,
    #[serde(rename = "Purchase_Amount")]
    pub purchase_amount: Option<f64>,
    #[serde(rename = "Discount")]
    pub discount: Option<f64>,
}

/// Which columns the source actually provided, decided once at load time from
/// the CSV header. Aggregations consult these flags and skip silently when a
/// required column is missing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Schema {
    pub customer_id: bool,
    pub date: bool,
    pub category: bool,
    pub channel: bool,
    pub gender: bool,
    pub age: bool,
    pub purchase_amount: bool,
    pub discount: bool,
}

impl Schema {
    /// Schema of the synthetic generator, which always emits every column.
    pub fn full() -> Self {
        Schema {
            customer_id: true,
            date: true,
            category: true,
            channel: true,
            gender: true,
            age: true,
            purchase_amount: true,
            discount: true,
        }
    }
}

/// The loaded transaction set plus its schema. Read-only after load; the
/// filter engine produces a fresh `Dataset` rather than mutating this one.
#[derive(Debug, Clone, Default)]
pub struct Dataset {
    pub rows: Vec<Transaction>,
    pub schema: Schema,
}

impl Dataset {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

/// Per-attribute allowed-value sets. `None` means the attribute is inactive
/// (no restriction); `Some` with an empty set is an explicit "match nothing"
/// selection, which is valid and yields zero rows.
#[derive(Debug, Clone, Default)]
pub struct FilterSelection {
    pub category: Option<BTreeSet<String>>,
    pub channel: Option<BTreeSet<String>>,
    pub gender: Option<BTreeSet<String>>,
}

impl FilterSelection {
    pub fn is_unrestricted(&self) -> bool {
        self.category.is_none() && self.channel.is_none() && self.gender.is_none()
    }
}

/// The four headline scalar metrics.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct Kpis {
    pub total_revenue: f64,
    pub avg_order_value: f64,
    pub total_orders: usize,
    pub unique_customers: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryRevenue {
    pub category: String,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChannelShare {
    pub channel: String,
    pub revenue: f64,
}

/// One calendar-month revenue bucket; `month` is the first day of the month.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MonthlyRevenue {
    pub month: NaiveDate,
    pub revenue: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScatterPoint {
    pub discount: f64,
    pub purchase_amount: f64,
    pub category: Option<String>,
}

/// One histogram bucket over the half-open age range `[lower, upper)`; the
/// final bucket is closed so the observed maximum is counted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AgeBin {
    pub lower: f64,
    pub upper: f64,
    pub count: usize,
}

/// One display-formatted row of the raw-data table.
#[derive(Debug, Clone, Default, Serialize)]
pub struct TableRow {
    pub customer_id: String,
    pub date: String,
    pub category: String,
    pub channel: String,
    pub gender: String,
    pub age: String,
    pub purchase_amount: String,
    pub discount: String,
}
