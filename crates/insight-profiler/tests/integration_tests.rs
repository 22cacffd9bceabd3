//! Integration tests for the table profiler.
//!
//! These tests verify end-to-end behavior through the public API: building
//! tables, profiling them, and analyzing projects.

use insight_profiler::{
    Cell, Column, DatePattern, InMemoryTableStore, InferredType, JsonFileProfileSink, NamedTable,
    ProfileSink, ProfilerConfig, ProjectAnalyzer, ProjectId, Table, TableProfile, TableProfiler,
    load_csv, orders_to_table, profile,
};
use pretty_assertions::assert_eq;
use serde_json::{Value, json};
use std::io::Write;

// ============================================================================
// Helper Functions
// ============================================================================

fn table_from_records(records: Vec<Value>) -> Table {
    Table::from_records(&records).expect("Failed to build table")
}

fn single_column(name: &str, values: Vec<Cell>) -> Table {
    Table::new(vec![Column::new(name, values)]).expect("Failed to build table")
}

fn write_csv(content: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(".csv")
        .tempfile()
        .expect("Failed to create temp file");
    file.write_all(content.as_bytes())
        .expect("Failed to write CSV");
    file
}

fn orders_fixture() -> Vec<Value> {
    (0..12)
        .map(|i| {
            json!({
                "id": 1000 + i,
                "reference_id": 5000 + i,
                "status": {"name": if i % 3 == 0 { "Completed" } else { "Pending" }, "slug": "s"},
                "date": {"date": format!("2024-03-{:02} 10:15:00.000000", i + 1)},
                "total": {"amount": 100.0 + i as f64 * 10.0, "currency": "SAR"},
                "payment_method": if i % 2 == 0 { "mada" } else { "cod" },
                "items": [{"name": "Shirt", "quantity": 1 + i % 3}],
                "features": {"digitalable": false, "shippable": true}
            })
        })
        .collect()
}

// ============================================================================
// Profile Properties
// ============================================================================

#[test]
fn test_profile_is_deterministic() {
    let records: Vec<Value> = (0..300)
        .map(|i| json!({"id": i, "amount": (i * 7 % 50) as f64 / 2.0, "tag": format!("t{}", i % 4)}))
        .collect();
    let table = table_from_records(records);

    let first = serde_json::to_value(profile(&table)).unwrap();
    let second = serde_json::to_value(profile(&table)).unwrap();
    assert_eq!(first, second);
    assert_eq!(first["sample"].as_array().unwrap().len(), 15);
}

#[test]
fn test_null_count_plus_non_null_is_total_rows() {
    let table = table_from_records(vec![
        json!({"a": 1, "b": "x", "c": null}),
        json!({"a": null, "b": "", "c": 2.5}),
        json!({"a": 3, "c": "n/a"}),
        json!({"b": "y"}),
    ]);
    let result = profile(&table);

    for (column, col_profile) in table.columns().iter().zip(&result.columns) {
        assert_eq!(
            col_profile.null_count + column.non_null().count(),
            result.total_rows,
            "column {}",
            column.name
        );
    }
}

#[test]
fn test_mixed_type_detection() {
    let table = table_from_records(vec![
        json!({"v": 1}),
        json!({"v": "2"}),
        json!({"v": "Tag-3"}),
        json!({"v": null}),
    ]);
    let col = &profile(&table).columns[0];

    assert!(col.has_mixed_types);
    assert_eq!(col.inferred_type, InferredType::String);
    assert_eq!(col.null_count, 1);
    assert_eq!(col.unique_count, 3);

    let breakdown: Vec<(&str, usize)> = col
        .mixed_type_breakdown
        .iter()
        .map(|t| (t.type_name.as_str(), t.count))
        .collect();
    assert_eq!(breakdown, vec![("str", 2), ("int", 1)]);
}

#[test]
fn test_categorical_detection() {
    let statuses = ["paid", "pending", "shipped", "cancelled"];
    let table = single_column(
        "status",
        (0..100)
            .map(|i| {
                if i % 10 == 9 {
                    Cell::Null
                } else {
                    Cell::from(statuses[i % 4])
                }
            })
            .collect(),
    );
    let col = &profile(&table).columns[0];

    assert!(col.is_categorical);
    assert_eq!(col.null_count, 10);
    assert_eq!(col.categories.len(), 4);
    assert_eq!(
        col.categories.iter().map(|c| c.count).sum::<usize>(),
        100 - col.null_count
    );
    assert!(col.numerical_stats.is_none());
}

#[test]
fn test_numeric_row_pointers_follow_rows() {
    let values: Vec<f64> = (0..101).map(|i| ((i * 37) % 101) as f64).collect();
    let mut reversed = values.clone();
    reversed.reverse();

    for data in [values, reversed] {
        let table = single_column("v", data.iter().map(|v| Cell::Float(*v)).collect());
        let stats = profile(&table).columns[0].numerical_stats.clone().unwrap();

        let min_row = stats.min_row_index.unwrap();
        let max_row = stats.max_row_index.unwrap();
        assert_eq!(data[min_row], 0.0);
        assert_eq!(data[max_row], 100.0);
        assert_eq!(stats.min, Some(0.0));
        assert_eq!(stats.max, Some(100.0));
    }
}

#[test]
fn test_datetime_requires_strict_majority() {
    let column_with = |dates: usize| {
        single_column(
            "when",
            (0..100)
                .map(|i| {
                    if i < dates {
                        Cell::from(format!("2024-01-{:02}", i % 28 + 1))
                    } else {
                        Cell::from("n/a")
                    }
                })
                .collect(),
        )
    };

    let half = &profile(&column_with(50)).columns[0];
    assert_ne!(half.inferred_type, InferredType::Datetime);
    assert!(half.datetime_parts.is_none());

    let majority = &profile(&column_with(51)).columns[0];
    assert_eq!(majority.inferred_type, InferredType::Datetime);
    assert_eq!(majority.date_pattern, Some(DatePattern::Date));
    let parts = majority.datetime_parts.unwrap();
    assert!(parts.year && parts.month && parts.day);
    assert!(!parts.hour);
}

#[test]
fn test_empty_table() {
    let result = profile(&Table::empty());
    assert_eq!(result.total_rows, 0);
    assert_eq!(result.total_columns, 0);
    assert!(result.columns.is_empty());
    assert!(result.sample.is_empty());
    assert!(result.correlation_matrix.is_none());
}

#[test]
fn test_non_finite_values_serialize_as_strict_json() {
    let table = Table::new(vec![
        Column::new(
            "x",
            vec![
                Cell::Float(1.0),
                Cell::Float(f64::NAN),
                Cell::Float(f64::INFINITY),
                Cell::Float(2.0),
            ],
        ),
        Column::new(
            "y",
            vec![Cell::Float(3.0), Cell::Float(1.0), Cell::Float(2.0), Cell::Float(4.0)],
        ),
    ])
    .unwrap();
    let result = profile(&table);

    let text = serde_json::to_string(&result).unwrap();
    assert!(!text.contains("NaN"));
    assert!(!text.contains("Infinity"));

    let parsed: Value = serde_json::from_str(&text).unwrap();
    assert_eq!(parsed["columns"][0]["null_count"], json!(1));
    assert_eq!(parsed["columns"][0]["numerical_stats"]["max"], Value::Null);
    assert_eq!(parsed["head"][0]["x"], json!(1.0));
}

#[test]
fn test_constant_column_correlation_is_zero() {
    let table = Table::new(vec![
        Column::new("a", (1..=4).map(Cell::Int).collect()),
        Column::new("b", vec![Cell::Int(5); 4]),
    ])
    .unwrap();
    let matrix = profile(&table).correlation_matrix.unwrap();

    assert_eq!(matrix.columns, vec!["a", "b"]);
    assert_eq!(matrix.values[0][0], 1.0);
    assert_eq!(matrix.values[0][1], 0.0);
    assert_eq!(matrix.values[1][1], 0.0);
}

#[test]
fn test_seed_is_configurable() {
    let table = single_column("n", (0..1000).map(Cell::Int).collect());
    let default = profile(&table);
    let config = ProfilerConfig::builder().sample_seed(99).build().unwrap();
    let seeded = TableProfiler::new(config).unwrap().profile(&table);

    assert_eq!(default.sample.len(), 50);
    assert_eq!(seeded.sample.len(), 50);
    assert_ne!(default.sample, seeded.sample);
}

// ============================================================================
// CSV Loading
// ============================================================================

#[test]
fn test_profile_csv_file() {
    let mut csv = String::from("order_id,amount,status,created_at\n");
    for i in 0..12 {
        csv.push_str(&format!(
            "{},{:.1},{},2024-01-{:02}\n",
            i + 1,
            10.0 + i as f64 * 2.5,
            if i % 2 == 0 { "paid" } else { "new" },
            i + 1
        ));
    }
    let file = write_csv(&csv);

    let table = load_csv(file.path()).unwrap();
    let result = profile(&table);

    assert_eq!(result.total_rows, 12);
    assert_eq!(result.total_columns, 4);
    assert_eq!(result.head.len(), 1);
    assert!(result.sample.is_empty());

    let created = result.column("created_at").unwrap();
    assert_eq!(created.inferred_type, InferredType::Datetime);
    assert_eq!(created.date_range.as_ref().unwrap().min, "2024-01-01T00:00:00");

    let amount = result.column("amount").unwrap();
    assert_eq!(amount.inferred_type, InferredType::Floating);
    assert_eq!(amount.numerical_stats.as_ref().unwrap().max_row_index, Some(11));

    let status = result.column("status").unwrap();
    assert!(status.is_categorical);

    let matrix = result.correlation_matrix.unwrap();
    assert_eq!(matrix.columns, vec!["order_id", "amount"]);
    assert_eq!(matrix.values[0][1], 1.0);
}

#[test]
fn test_load_csv_missing_file() {
    assert!(load_csv("/definitely/not/here.csv").is_err());
}

// ============================================================================
// Orders and Projects
// ============================================================================

#[test]
fn test_profile_salla_orders() {
    let table = orders_to_table(&orders_fixture()).unwrap();
    let result = profile(&table);

    let status = result.column("status").unwrap();
    assert!(status.is_categorical);
    assert_eq!(status.categories[0].value, "Pending");
    assert_eq!(status.categories[0].count, 8);

    let order_date = result.column("order_date").unwrap();
    assert_eq!(order_date.inferred_type, InferredType::Datetime);

    let date = result.column("date").unwrap();
    assert_eq!(date.date_pattern, Some(DatePattern::Datetime));

    let price = result.column("avg_item_price").unwrap();
    assert_eq!(price.inferred_type, InferredType::Floating);
}

#[test]
fn test_project_analysis_persists_to_disk() {
    let dir = tempfile::tempdir().unwrap();
    let store = InMemoryTableStore::new();
    store.insert(ProjectId(42), orders_to_table(&orders_fixture()).unwrap());

    let analyzer = ProjectAnalyzer::new(
        TableProfiler::default(),
        store,
        JsonFileProfileSink::new(dir.path()).unwrap(),
    );

    let upload = table_from_records(vec![json!({"a": 1}), json!({"a": 2})]);
    let outcome = analyzer
        .analyze_and_store(ProjectId(42), Some(NamedTable::new("CSV", upload)))
        .unwrap();
    assert!(outcome.stored);
    assert_eq!(outcome.analysis.dataframes.len(), 2);

    let path = dir.path().join("project_42.json");
    let saved: Value = serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    assert_eq!(saved["project_id"], json!(42));
    assert_eq!(saved["dataframes"][0]["source"], json!("CSV"));
    assert_eq!(saved["dataframes"][1]["source"], json!("Salla"));
    assert_eq!(saved["dataframes"][1]["total_rows"], json!(12));

    let loaded = analyzer.sink().load_analysis(ProjectId(42)).unwrap().unwrap();
    let salla: &TableProfile = &loaded.dataframes[1].profile;
    assert_eq!(salla.total_columns, outcome.analysis.dataframes[1].profile.total_columns);
}
