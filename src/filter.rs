use std::collections::BTreeSet;

use crate::models::{Dataset, FilterSelection, Transaction};

/// Attribute accessor shared by the filter engine and the known-value scan.
fn attribute<'a>(row: &'a Transaction, name: &str) -> Option<&'a str> {
    match name {
        "category" => row.category.as_deref(),
        "channel" => row.channel.as_deref(),
        "gender" => row.gender.as_deref(),
        _ => None,
    }
}

fn column_present(dataset: &Dataset, name: &str) -> bool {
    match name {
        "category" => dataset.schema.category,
        "channel" => dataset.schema.channel,
        "gender" => dataset.schema.gender,
        _ => false,
    }
}

/// Narrows `dataset` to rows matching every active attribute filter. Within
/// one attribute the allowed values combine as OR; across attributes as AND.
/// An attribute whose column the dataset lacks is skipped silently; an
/// explicit empty selection matches nothing. The input is never mutated.
pub fn apply(dataset: &Dataset, selection: &FilterSelection) -> Dataset {
    let active: Vec<(&str, &BTreeSet<String>)> = [
        ("category", selection.category.as_ref()),
        ("channel", selection.channel.as_ref()),
        ("gender", selection.gender.as_ref()),
    ]
    .into_iter()
    .filter_map(|(name, allowed)| allowed.map(|set| (name, set)))
    .filter(|(name, _)| column_present(dataset, name))
    .collect();

    if active.is_empty() {
        return dataset.clone();
    }

    let rows = dataset
        .rows
        .iter()
        .filter(|row| {
            active.iter().all(|(name, allowed)| {
                attribute(row, name).is_some_and(|value| allowed.contains(value))
            })
        })
        .cloned()
        .collect();

    Dataset {
        rows,
        schema: dataset.schema,
    }
}

/// Sorted distinct values of one categorical attribute, used to populate the
/// default "everything selected" state of a selector.
pub fn known_values(dataset: &Dataset, name: &str) -> BTreeSet<String> {
    dataset
        .rows
        .iter()
        .filter_map(|row| attribute(row, name))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Schema;

    fn row(category: &str, channel: &str, gender: &str) -> Transaction {
        Transaction {
            category: Some(category.to_string()),
            channel: Some(channel.to_string()),
            gender: Some(gender.to_string()),
            purchase_amount: Some(10.0),
            ..Transaction::default()
        }
    }

    fn dataset() -> Dataset {
        Dataset {
            rows: vec![
                row("Books", "Online", "Female"),
                row("Books", "In-Store", "Male"),
                row("Toys", "Online", "Female"),
                row("Sports", "In-Store", "Female"),
            ],
            schema: Schema::full(),
        }
    }

    fn set(values: &[&str]) -> BTreeSet<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    #[test]
    fn unrestricted_selection_keeps_everything() {
        let data = dataset();
        let filtered = apply(&data, &FilterSelection::default());
        assert_eq!(filtered.len(), data.len());
    }

    #[test]
    fn single_attribute_filters_by_membership() {
        let selection = FilterSelection {
            category: Some(set(&["Books"])),
            ..FilterSelection::default()
        };
        let filtered = apply(&dataset(), &selection);
        assert_eq!(filtered.len(), 2);
        assert!(filtered
            .rows
            .iter()
            .all(|r| r.category.as_deref() == Some("Books")));
    }

    #[test]
    fn attributes_combine_with_and() {
        let selection = FilterSelection {
            category: Some(set(&["Books", "Toys"])),
            channel: Some(set(&["Online"])),
            ..FilterSelection::default()
        };
        let filtered = apply(&dataset(), &selection);
        assert_eq!(filtered.len(), 2);
        assert!(filtered
            .rows
            .iter()
            .all(|r| r.channel.as_deref() == Some("Online")));
    }

    #[test]
    fn explicit_empty_selection_matches_nothing() {
        let selection = FilterSelection {
            category: Some(BTreeSet::new()),
            ..FilterSelection::default()
        };
        let filtered = apply(&dataset(), &selection);
        assert!(filtered.is_empty());
    }

    #[test]
    fn missing_column_is_skipped_silently() {
        let mut data = dataset();
        data.schema.gender = false;
        let selection = FilterSelection {
            gender: Some(set(&["Female"])),
            ..FilterSelection::default()
        };
        let filtered = apply(&data, &selection);
        assert_eq!(filtered.len(), data.len());
    }

    #[test]
    fn applying_twice_equals_applying_once() {
        let selection = FilterSelection {
            category: Some(set(&["Books"])),
            channel: Some(set(&["Online", "In-Store"])),
            ..FilterSelection::default()
        };
        let once = apply(&dataset(), &selection);
        let twice = apply(&once, &selection);
        assert_eq!(once.len(), twice.len());
        for (a, b) in once.rows.iter().zip(twice.rows.iter()) {
            assert_eq!(a.category, b.category);
            assert_eq!(a.channel, b.channel);
        }
    }

    #[test]
    fn wider_selection_is_a_superset() {
        let narrow = FilterSelection {
            category: Some(set(&["Books"])),
            ..FilterSelection::default()
        };
        let wide = FilterSelection {
            category: Some(set(&["Books", "Toys"])),
            ..FilterSelection::default()
        };
        let data = dataset();
        let small = apply(&data, &narrow);
        let large = apply(&data, &wide);
        assert!(small.len() <= large.len());
        for row in &small.rows {
            assert!(large
                .rows
                .iter()
                .any(|r| r.category == row.category && r.channel == row.channel));
        }
    }

    #[test]
    fn input_dataset_is_left_untouched() {
        let data = dataset();
        let before = data.len();
        let selection = FilterSelection {
            category: Some(set(&["Books"])),
            ..FilterSelection::default()
        };
        let _ = apply(&data, &selection);
        assert_eq!(data.len(), before);
    }

    #[test]
    fn known_values_are_sorted_and_distinct() {
        let values = known_values(&dataset(), "category");
        let expected: Vec<&str> = vec!["Books", "Sports", "Toys"];
        assert_eq!(values.iter().map(String::as_str).collect::<Vec<_>>(), expected);
    }
}
