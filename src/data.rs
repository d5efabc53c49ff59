use std::path::Path;

use anyhow::Context;
use chrono::{Duration, NaiveDate};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::Exp;

use crate::models::{Dataset, Schema, Transaction};

/// Default location of the persisted dataset.
pub const DEFAULT_CSV: &str = "customer_shopping_behavior.csv";

/// Row count and seed of the synthetic fallback, chosen so repeated runs see
/// the identical dataset.
pub const SAMPLE_ROWS: usize = 2000;
pub const SAMPLE_SEED: u64 = 42;

const CATEGORIES: [&str; 6] = [
    "Electronics",
    "Clothing",
    "Home & Garden",
    "Sports",
    "Books",
    "Beauty",
];
const CHANNELS: [&str; 2] = ["Online", "In-Store"];
const GENDERS: [&str; 2] = ["Male", "Female"];

/// Loads the transaction set from `path`, falling back to the seeded
/// synthetic sample when the file does not exist. The fallback prints an
/// advisory and never fails.
pub fn load(path: &Path) -> anyhow::Result<Dataset> {
    if !path.exists() {
        eprintln!(
            "{} not found -- using generated sample data.",
            path.display()
        );
        return Ok(generate_sample(SAMPLE_ROWS));
    }
    read_csv(path)
}

/// Parses a CSV file, deciding column presence once from the header row.
pub fn read_csv(path: &Path) -> anyhow::Result<Dataset> {
    let mut reader = csv::Reader::from_path(path)
        .with_context(|| format!("failed to open {}", path.display()))?;

    let headers = reader
        .headers()
        .with_context(|| format!("failed to read header of {}", path.display()))?
        .clone();
    let has = |name: &str| headers.iter().any(|h| h == name);
    let schema = Schema {
        customer_id: has("Customer_ID"),
        date: has("Date"),
        category: has("Category"),
        channel: has("Channel"),
        gender: has("Gender"),
        age: has("Age"),
        purchase_amount: has("Purchase_Amount"),
        discount: has("Discount"),
    };

    let mut rows = Vec::new();
    for result in reader.deserialize::<Transaction>() {
        let row = result.with_context(|| format!("bad record in {}", path.display()))?;
        rows.push(row);
    }

    Ok(Dataset { rows, schema })
}

/// Writes a dataset back out as CSV with the canonical column names.
pub fn write_csv(dataset: &Dataset, path: &Path) -> anyhow::Result<()> {
    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("failed to create {}", path.display()))?;
    for row in &dataset.rows {
        writer.serialize(row)?;
    }
    writer.flush()?;
    Ok(())
}

/// Deterministically synthesizes `n` transactions from a fixed seed: ids in
/// [1000, 5000), dates across 2023, uniform categoricals, ages in [18, 65),
/// exponential purchase amounts (scale 80, offset 10), discounts in [0, 0.4].
pub fn generate_sample(n: usize) -> Dataset {
    let mut rng = StdRng::seed_from_u64(SAMPLE_SEED);
    let amount_dist = Exp::new(1.0 / 80.0).expect("valid exponential rate");
    let year_start = NaiveDate::from_ymd_opt(2023, 1, 1).expect("valid date");

    let mut rows = Vec::with_capacity(n);
    for _ in 0..n {
        rows.push(Transaction {
            customer_id: Some(rng.gen_range(1000..5000)),
            date: Some(year_start + Duration::days(rng.gen_range(0..365))),
            category: Some(CATEGORIES[rng.gen_range(0..CATEGORIES.len())].to_string()),
            channel: Some(CHANNELS[rng.gen_range(0..CHANNELS.len())].to_string()),
            gender: Some(GENDERS[rng.gen_range(0..GENDERS.len())].to_string()),
            age: Some(rng.gen_range(18..65)),
            purchase_amount: Some(round2(rng.sample(amount_dist) + 10.0)),
            discount: Some(round2(rng.gen_range(0.0..=0.4))),
        });
    }

    Dataset {
        rows,
        schema: Schema::full(),
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
