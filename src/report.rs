use std::fmt::Write;

use serde::Serialize;

use crate::aggregate;
use crate::models::{
    AgeBin, CategoryRevenue, ChannelShare, Dataset, FilterSelection, Kpis, MonthlyRevenue,
    ScatterPoint, TableRow,
};

/// Every derived table for one filtered view, bundled for JSON output.
#[derive(Debug, Clone, Serialize)]
pub struct Summary {
    pub total_rows: usize,
    pub filtered_rows: usize,
    pub kpis: Kpis,
    pub revenue_by_category: Vec<CategoryRevenue>,
    pub channel_distribution: Vec<ChannelShare>,
    pub monthly_trend: Vec<MonthlyRevenue>,
    pub discount_scatter: Vec<ScatterPoint>,
    pub age_histogram: Vec<AgeBin>,
    pub table: Vec<TableRow>,
}

/// Runs every aggregation over the filtered set.
pub fn summarize(filtered: &Dataset, total_rows: usize) -> Summary {
    Summary {
        total_rows,
        filtered_rows: filtered.len(),
        kpis: aggregate::kpis(filtered),
        revenue_by_category: aggregate::revenue_by_category(filtered),
        channel_distribution: aggregate::channel_distribution(filtered),
        monthly_trend: aggregate::monthly_trend(filtered),
        discount_scatter: aggregate::discount_scatter(filtered),
        age_histogram: aggregate::age_histogram(filtered),
        table: aggregate::table_view(filtered),
    }
}

/// Renders the markdown dashboard: KPI block, one section per chart table,
/// and the capped raw-data table.
pub fn build_report(filtered: &Dataset, total_rows: usize, selection: &FilterSelection) -> String {
    let summary = summarize(filtered, total_rows);
    let mut output = String::new();

    let _ = writeln!(output, "# Customer Shopping Behavior");
    let _ = writeln!(output, "Filters: {}", selection_label(selection));
    let _ = writeln!(output);

    let _ = writeln!(output, "## Key Metrics");
    let _ = writeln!(
        output,
        "- Total Revenue: {}",
        format_currency(summary.kpis.total_revenue, 0)
    );
    let _ = writeln!(
        output,
        "- Avg. Order Value: {}",
        format_currency(summary.kpis.avg_order_value, 2)
    );
    let _ = writeln!(
        output,
        "- Total Orders: {}",
        format_count(summary.kpis.total_orders)
    );
    let _ = writeln!(
        output,
        "- Unique Customers: {}",
        format_count(summary.kpis.unique_customers)
    );

    let _ = writeln!(output);
    let _ = writeln!(output, "## Revenue by Category");
    if summary.revenue_by_category.is_empty() {
        let _ = writeln!(output, "No data for this view.");
    } else {
        for entry in &summary.revenue_by_category {
            let _ = writeln!(
                output,
                "- {}: {}",
                entry.category,
                format_currency(entry.revenue, 0)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Channel Distribution");
    if summary.channel_distribution.is_empty() {
        let _ = writeln!(output, "No data for this view.");
    } else {
        let total: f64 = summary.channel_distribution.iter().map(|s| s.revenue).sum();
        for share in &summary.channel_distribution {
            let fraction = if total > 0.0 { share.revenue / total } else { 0.0 };
            let _ = writeln!(
                output,
                "- {}: {} ({})",
                share.channel,
                format_currency(share.revenue, 0),
                format_percent(fraction)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Monthly Sales Trend");
    if summary.monthly_trend.is_empty() {
        let _ = writeln!(output, "No data for this view.");
    } else {
        for point in &summary.monthly_trend {
            let _ = writeln!(
                output,
                "- {}: {}",
                point.month.format("%B %Y"),
                format_currency(point.revenue, 0)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Discount vs. Purchase Amount");
    if summary.discount_scatter.is_empty() {
        let _ = writeln!(output, "No data for this view.");
    } else {
        let _ = writeln!(
            output,
            "Plotted {} of {} orders.",
            format_count(summary.discount_scatter.len()),
            format_count(summary.filtered_rows)
        );
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Customer Age Distribution");
    if summary.age_histogram.is_empty() {
        let _ = writeln!(output, "No data for this view.");
    } else {
        for bin in &summary.age_histogram {
            let _ = writeln!(
                output,
                "- {:.1} to {:.1}: {}",
                bin.lower,
                bin.upper,
                format_count(bin.count)
            );
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "## Raw Data");
    if summary.table.is_empty() {
        let _ = writeln!(output, "No records for this view.");
    } else {
        let _ = writeln!(
            output,
            "| Customer | Date | Category | Channel | Gender | Age | Amount | Discount |"
        );
        let _ = writeln!(output, "|---|---|---|---|---|---|---|---|");
        for row in &summary.table {
            let _ = writeln!(
                output,
                "| {} | {} | {} | {} | {} | {} | {} | {} |",
                row.customer_id,
                row.date,
                row.category,
                row.channel,
                row.gender,
                row.age,
                row.purchase_amount,
                row.discount
            );
        }
        let _ = writeln!(
            output,
            "Showing {} of {} records.",
            format_count(summary.table.len()),
            format_count(summary.filtered_rows)
        );
    }

    output
}

fn selection_label(selection: &FilterSelection) -> String {
    if selection.is_unrestricted() {
        return "all records".to_string();
    }
    let mut parts = Vec::new();
    for (name, values) in [
        ("Category", selection.category.as_ref()),
        ("Channel", selection.channel.as_ref()),
        ("Gender", selection.gender.as_ref()),
    ] {
        if let Some(values) = values {
            let joined: Vec<&str> = values.iter().map(String::as_str).collect();
            parts.push(format!("{} in [{}]", name, joined.join(", ")));
        }
    }
    parts.join("; ")
}

/// `$1,234.56` style currency with thousands separators.
pub fn format_currency(value: f64, decimals: usize) -> String {
    let rendered = format!("{:.*}", decimals, value.abs());
    let (int_part, frac_part) = match rendered.split_once('.') {
        Some((i, f)) => (i.to_string(), Some(f.to_string())),
        None => (rendered, None),
    };
    let grouped = group_thousands(&int_part);
    let sign = if value < 0.0 { "-" } else { "" };
    match frac_part {
        Some(frac) => format!("{sign}${grouped}.{frac}"),
        None => format!("{sign}${grouped}"),
    }
}

/// Renders a fraction as a whole percentage, e.g. `0.1` becomes `10%`.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.0}%", fraction * 100.0)
}

/// Integer count with thousands separators.
pub fn format_count(value: usize) -> String {
    group_thousands(&value.to_string())
}

fn group_thousands(digits: &str) -> String {
    let mut grouped = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }
    grouped
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data;
    use crate::models::Schema;

    #[test]
    fn currency_groups_thousands() {
        assert_eq!(format_currency(1234567.891, 2), "$1,234,567.89");
        assert_eq!(format_currency(999.4, 0), "$999");
        assert_eq!(format_currency(0.0, 2), "$0.00");
        assert_eq!(format_currency(-1234.5, 2), "-$1,234.50");
    }

    #[test]
    fn percent_renders_whole_numbers() {
        assert_eq!(format_percent(0.1), "10%");
        assert_eq!(format_percent(0.0), "0%");
        assert_eq!(format_percent(0.4), "40%");
    }

    #[test]
    fn count_groups_thousands() {
        assert_eq!(format_count(2000), "2,000");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(0), "0");
    }

    #[test]
    fn report_contains_every_section() {
        let dataset = data::generate_sample(100);
        let report = build_report(&dataset, dataset.len(), &FilterSelection::default());
        for heading in [
            "# Customer Shopping Behavior",
            "## Key Metrics",
            "## Revenue by Category",
            "## Channel Distribution",
            "## Monthly Sales Trend",
            "## Discount vs. Purchase Amount",
            "## Customer Age Distribution",
            "## Raw Data",
        ] {
            assert!(report.contains(heading), "missing {heading}");
        }
        assert!(report.contains("Filters: all records"));
        assert!(report.contains("Showing 100 of 100 records."));
    }

    #[test]
    fn empty_view_renders_no_data_lines() {
        let empty = Dataset {
            rows: Vec::new(),
            schema: Schema::full(),
        };
        let report = build_report(&empty, 50, &FilterSelection::default());
        assert!(report.contains("No data for this view."));
        assert!(report.contains("No records for this view."));
        assert!(report.contains("- Total Revenue: $0"));
        assert!(report.contains("- Total Orders: 0"));
    }

    #[test]
    fn selection_label_names_active_filters() {
        let selection = FilterSelection {
            category: Some(["Books".to_string(), "Toys".to_string()].into_iter().collect()),
            channel: Some(["Online".to_string()].into_iter().collect()),
            ..FilterSelection::default()
        };
        let report = build_report(
            &data::generate_sample(10),
            10,
            &selection,
        );
        assert!(report.contains("Category in [Books, Toys]; Channel in [Online]"));
    }

    #[test]
    fn summary_serializes_to_json() {
        let dataset = data::generate_sample(20);
        let summary = summarize(&dataset, dataset.len());
        let json = serde_json::to_string(&summary).unwrap();
        assert!(json.contains("\"total_revenue\""));
        assert!(json.contains("\"revenue_by_category\""));
        assert!(json.contains("\"age_histogram\""));
    }
}
