use std::collections::BTreeSet;
use std::path::PathBuf;

use anyhow::Context;
use clap::{Parser, Subcommand};

mod aggregate;
mod data;
mod filter;
mod models;
mod report;

use models::FilterSelection;

#[derive(Parser)]
#[command(name = "shopping-analytics")]
#[command(about = "Customer shopping behavior analytics", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write the deterministic synthetic dataset as CSV
    Sample {
        #[arg(long, default_value = data::DEFAULT_CSV)]
        out: PathBuf,
        #[arg(long, default_value_t = data::SAMPLE_ROWS)]
        rows: usize,
    },
    /// Print KPIs and chart tables for a filtered view
    Summary {
        #[arg(long, default_value = data::DEFAULT_CSV)]
        csv: PathBuf,
        /// Comma-separated category values to keep
        #[arg(long)]
        category: Option<String>,
        /// Comma-separated channel values to keep
        #[arg(long)]
        channel: Option<String>,
        /// Comma-separated gender values to keep
        #[arg(long)]
        gender: Option<String>,
        /// Emit the full derived-table bundle as JSON
        #[arg(long, default_value_t = false)]
        json: bool,
    },
    /// Generate the markdown dashboard
    Report {
        #[arg(long, default_value = data::DEFAULT_CSV)]
        csv: PathBuf,
        #[arg(long)]
        category: Option<String>,
        #[arg(long)]
        channel: Option<String>,
        #[arg(long)]
        gender: Option<String>,
        #[arg(long, default_value = "dashboard.md")]
        out: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Sample { out, rows } => {
            let dataset = data::generate_sample(rows);
            data::write_csv(&dataset, &out)?;
            println!("Wrote {} sample rows to {}.", rows, out.display());
        }
        Commands::Summary {
            csv,
            category,
            channel,
            gender,
            json,
        } => {
            let dataset = data::load(&csv)?;
            let selection = selection_from_args(category, channel, gender);
            let filtered = filter::apply(&dataset, &selection);
            let summary = report::summarize(&filtered, dataset.len());

            if json {
                println!("{}", serde_json::to_string_pretty(&summary)?);
                return Ok(());
            }

            println!(
                "{} of {} orders match the current filters.",
                report::format_count(summary.filtered_rows),
                report::format_count(summary.total_rows)
            );
            println!(
                "Total revenue {} | avg order {} | unique customers {}",
                report::format_currency(summary.kpis.total_revenue, 0),
                report::format_currency(summary.kpis.avg_order_value, 2),
                report::format_count(summary.kpis.unique_customers)
            );

            if summary.revenue_by_category.is_empty() {
                println!("No category revenue for this view.");
            } else {
                println!("Revenue by category:");
                for entry in &summary.revenue_by_category {
                    println!(
                        "- {}: {}",
                        entry.category,
                        report::format_currency(entry.revenue, 0)
                    );
                }
            }

            if !summary.channel_distribution.is_empty() {
                println!("Channel distribution:");
                for share in &summary.channel_distribution {
                    println!(
                        "- {}: {}",
                        share.channel,
                        report::format_currency(share.revenue, 0)
                    );
                }
            }

            for name in ["category", "channel", "gender"] {
                let values = filter::known_values(&dataset, name);
                if !values.is_empty() {
                    let joined: Vec<&str> = values.iter().map(String::as_str).collect();
                    println!("Known {} values: {}", name, joined.join(", "));
                }
            }
        }
        Commands::Report {
            csv,
            category,
            channel,
            gender,
            out,
        } => {
            let dataset = data::load(&csv)?;
            let selection = selection_from_args(category, channel, gender);
            let filtered = filter::apply(&dataset, &selection);
            let rendered = report::build_report(&filtered, dataset.len(), &selection);
            std::fs::write(&out, rendered)
                .with_context(|| format!("failed to write {}", out.display()))?;
            println!("Dashboard written to {}.", out.display());
        }
    }

    Ok(())
}

/// Turns the three optional comma-separated flags into a filter selection.
/// An omitted flag leaves the attribute unrestricted; an empty value is an
/// explicit empty selection.
fn selection_from_args(
    category: Option<String>,
    channel: Option<String>,
    gender: Option<String>,
) -> FilterSelection {
    FilterSelection {
        category: category.map(|v| parse_values(&v)),
        channel: channel.map(|v| parse_values(&v)),
        gender: gender.map(|v| parse_values(&v)),
    }
}

fn parse_values(raw: &str) -> BTreeSet<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn omitted_flags_leave_attributes_unrestricted() {
        let selection = selection_from_args(None, None, None);
        assert!(selection.is_unrestricted());
    }

    #[test]
    fn comma_lists_become_value_sets() {
        let selection =
            selection_from_args(Some("Books, Toys".to_string()), Some("Online".to_string()), None);
        let category = selection.category.unwrap();
        assert!(category.contains("Books"));
        assert!(category.contains("Toys"));
        assert_eq!(selection.channel.unwrap().len(), 1);
        assert!(selection.gender.is_none());
    }

    #[test]
    fn empty_flag_is_an_explicit_empty_selection() {
        let selection = selection_from_args(Some(String::new()), None, None);
        let category = selection.category.unwrap();
        assert!(category.is_empty());
    }
}
