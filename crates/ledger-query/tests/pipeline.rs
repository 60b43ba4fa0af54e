//! Aggregation, query and export over generated and fixed row sets.

use std::collections::{BTreeSet, HashMap};

use ledger_model::{Row, RowId, TableKey, TeamRoster, TextField};
use ledger_query::{
    CsvExportOptions, Filter, Sort, SortDirection, SortKey, export_csv, merge, query,
};
use proptest::prelude::*;

const LABELS: [&str; 4] = ["Eau", "Energie", "Mobilité", "Voirie"];
const NATURES: [&str; 3] = ["Etude", "Travaux", ""];

fn arb_row() -> impl Strategy<Value = Row> {
    (
        0..LABELS.len(),
        0..NATURES.len(),
        proptest::collection::vec(0u64..50, 3),
    )
        .prop_map(|(label, nature, contributions)| {
            let mut row = Row::new(RowId::FIRST, LABELS[label], 3);
            row.nature = NATURES[nature].to_string();
            row.contributions = contributions;
            row
        })
}

fn arb_rows(max: usize) -> impl Strategy<Value = Vec<Row>> {
    proptest::collection::vec(arb_row(), 0..max).prop_map(|mut rows| {
        for (index, row) in rows.iter_mut().enumerate() {
            row.id = RowId::new(index as u64 + 1);
        }
        rows
    })
}

fn arb_filter() -> impl Strategy<Value = Filter> {
    prop_oneof![
        "[a-zé]{0,3}".prop_map(Filter::search),
        (0..NATURES.len()).prop_map(|nature| Filter::Equals {
            field: TextField::Nature,
            value: NATURES[nature].parse().unwrap(),
        }),
        (0usize..3).prop_map(Filter::SlotPositive),
    ]
}

fn arb_sort() -> impl Strategy<Value = Option<Sort>> {
    let key = prop_oneof![
        Just(SortKey::Id),
        Just(SortKey::Field(TextField::Thematique)),
        Just(SortKey::Field(TextField::Nature)),
        (0usize..3).prop_map(SortKey::Slot),
        Just(SortKey::Total),
    ];
    let direction = prop_oneof![
        Just(SortDirection::Ascending),
        Just(SortDirection::Descending)
    ];
    proptest::option::of((key, direction).prop_map(|(key, direction)| Sort { key, direction }))
}

fn ids(items: &[&Row]) -> Vec<u64> {
    items.iter().map(|row| row.id.get()).collect()
}

proptest! {
    #[test]
    fn aggregated_slots_are_the_sum_over_sources(
        tables in proptest::collection::vec(arb_rows(6), 0..5),
    ) {
        let mut expected: HashMap<String, Vec<u64>> = HashMap::new();
        for row in tables.iter().flatten() {
            let sum = expected.entry(row.thematique.clone()).or_insert_with(|| vec![0; 3]);
            for (slot, value) in sum.iter_mut().zip(&row.contributions) {
                *slot += value;
            }
        }

        let keyed = tables
            .into_iter()
            .enumerate()
            .map(|(index, rows)| (TableKey::new(format!("t{index}")).unwrap(), rows));
        let merged = merge(keyed);

        prop_assert_eq!(merged.len(), expected.len());
        for aggregated in &merged {
            prop_assert_eq!(&aggregated.row.contributions, &expected[aggregated.key()]);
        }
    }

    #[test]
    fn output_is_the_intersection_of_each_filter(
        rows in arb_rows(20),
        filters in proptest::collection::vec(arb_filter(), 0..4),
    ) {
        let combined: BTreeSet<u64> =
            ids(&query(&rows, &filters, None, 1, usize::MAX).items).into_iter().collect();

        let mut expected: BTreeSet<u64> = rows.iter().map(|row| row.id.get()).collect();
        for filter in &filters {
            let alone: BTreeSet<u64> =
                ids(&query(&rows, std::slice::from_ref(filter), None, 1, usize::MAX).items)
                    .into_iter()
                    .collect();
            expected = expected.intersection(&alone).copied().collect();
        }
        prop_assert_eq!(combined, expected);
    }

    #[test]
    fn pages_concatenate_to_the_sorted_sequence(
        rows in arb_rows(30),
        filters in proptest::collection::vec(arb_filter(), 0..2),
        sort in arb_sort(),
        page_size in 1usize..7,
    ) {
        let full = query(&rows, &filters, sort, 1, usize::MAX);
        let first = query(&rows, &filters, sort, 1, page_size);
        prop_assert_eq!(first.total_pages, full.filtered.div_ceil(page_size));

        let mut concatenated = Vec::new();
        for page in 1..=first.total_pages {
            let result = query(&rows, &filters, sort, page, page_size);
            prop_assert_eq!(result.page, page);
            prop_assert!(result.items.len() <= page_size);
            concatenated.extend(ids(&result.items));
        }
        prop_assert_eq!(concatenated, ids(&full.items));
    }
}

#[test]
fn two_tables_with_one_key() {
    let mut left = Row::new(RowId::new(1), "X", 2);
    left.contributions = vec![2, 0];
    let mut right = Row::new(RowId::new(1), "X", 2);
    right.contributions = vec![0, 3];

    let merged = merge([
        (TableKey::new("t1").unwrap(), vec![left]),
        (TableKey::new("t2").unwrap(), vec![right]),
    ]);

    assert_eq!(merged.len(), 1);
    assert_eq!(merged[0].row.contributions, vec![2, 3]);
}

#[test]
fn csv_export_groups_thousands() {
    let roster = TeamRoster::new(["Nord", "Sud"]).unwrap();
    let mut first = Row::new(RowId::new(1), "Mobilité", 2);
    first.nature = "Etude".to_string();
    first.contributions = vec![1_500, 20];
    let mut second = Row::new(RowId::new(2), "Eau", 2);
    second.synthese = "phase 1; phase 2".to_string();
    second.nature = "Travaux".to_string();
    second.contributions = vec![0, 1_234_567];

    let options = CsvExportOptions {
        delimiter: b';',
        thousands_separator: Some(' '),
    };
    let mut out = Vec::new();
    export_csv(&[first, second], &roster, &mut out, &options).unwrap();

    insta::assert_snapshot!(String::from_utf8(out).unwrap(), @r#"
    id;thematique;origine;difficulte;synthese;nature;estimation;estimationComment;Nord;Sud;total
    1;Mobilité;;;;Etude;;;1 500;20;1 520
    2;Eau;;;"phase 1; phase 2";Travaux;;;0;1 234 567;1 234 567
    "#);
}
