//! Salla order normalization.
//!
//! Raw orders from the Salla admin API nest status, totals, items and
//! features in sub-objects. [`normalize_orders`] flattens them into one flat
//! record per order and [`orders_to_table`] turns those records into a
//! [`Table`] with derived calendar and pricing columns.

use chrono::{Datelike, NaiveDateTime};
use serde_json::{Map, Value, json};
use tracing::debug;

use crate::error::Result;
use crate::profiler::parse_datetime;
use crate::table::{Cell, Column, DeclaredType, Table};

/// Flatten raw Salla orders into analysis-ready records.
pub fn normalize_orders(orders: &[Value]) -> Vec<Value> {
    orders.iter().map(normalize_order).collect()
}

fn normalize_order(order: &Value) -> Value {
    let date = match order.get("date") {
        Some(Value::Object(obj)) => obj.get("date").cloned().unwrap_or(Value::Null),
        Some(Value::String(s)) => Value::String(s.clone()),
        Some(Value::Null) | None => Value::Null,
        Some(other) => Value::String(other.to_string()),
    };

    let total = object_field(order, "total");
    let status = object_field(order, "status");
    let exchange = object_field(order, "exchange_rate");
    let features = order.get("features").and_then(Value::as_object);

    let items: &[Value] = order
        .get("items")
        .and_then(Value::as_array)
        .map(Vec::as_slice)
        .unwrap_or(&[]);
    let names: Vec<&str> = items
        .iter()
        .filter_map(|item| item.get("name").and_then(Value::as_str))
        .filter(|name| !name.is_empty())
        .collect();

    json!({
        "id": field(order, "id"),
        "reference_id": field(order, "reference_id"),
        "status": nested(status, "name"),
        "status_slug": nested(status, "slug"),
        "date": date,
        "currency": nested(total, "currency"),
        "total": nested(total, "amount"),
        "can_cancel": order.get("can_cancel").cloned().unwrap_or(Value::Bool(false)),
        "can_reorder": order.get("can_reorder").cloned().unwrap_or(Value::Bool(false)),
        "payment_method": field(order, "payment_method"),
        "is_pending_payment": order.get("is_pending_payment").cloned().unwrap_or(Value::Bool(false)),
        "pending_payment_ends_at": field(order, "pending_payment_ends_at"),
        "items_count": items.len(),
        "total_quantity": total_quantity(items),
        "items_names": names.join(", "),
        "is_digital": features.map(|f| f.get("digitalable").cloned().unwrap_or(Value::Null)).unwrap_or(Value::Bool(false)),
        "is_shippable": features.map(|f| f.get("shippable").cloned().unwrap_or(Value::Null)).unwrap_or(Value::Bool(false)),
        "exchange_rate": nested(exchange, "rate"),
        "exchange_currency": nested(exchange, "exchange_currency"),
    })
}

fn field(order: &Value, key: &str) -> Value {
    order.get(key).cloned().unwrap_or(Value::Null)
}

fn object_field<'a>(order: &'a Value, key: &str) -> Option<&'a Map<String, Value>> {
    order.get(key).and_then(Value::as_object)
}

fn nested(obj: Option<&Map<String, Value>>, key: &str) -> Value {
    obj.and_then(|o| o.get(key)).cloned().unwrap_or(Value::Null)
}

/// Sum of item quantities, integral when every quantity is.
fn total_quantity(items: &[Value]) -> Value {
    let quantities: Vec<&Value> = items
        .iter()
        .filter_map(|item| item.get("quantity"))
        .filter(|q| q.as_f64().is_some_and(|v| v != 0.0))
        .collect();

    if quantities.iter().all(|q| q.is_i64()) {
        json!(quantities.iter().filter_map(|q| q.as_i64()).sum::<i64>())
    } else {
        json!(quantities.iter().filter_map(|q| q.as_f64()).sum::<f64>())
    }
}

/// Normalize orders and build a table with derived columns.
///
/// Adds `order_date`, `order_year`, `order_month`, `order_day` and
/// `order_day_of_week` (Monday = 0) when any `date` parses, plus
/// `avg_item_price` as `total / total_quantity` for positive quantities.
pub fn orders_to_table(orders: &[Value]) -> Result<Table> {
    let records = normalize_orders(orders);
    if records.is_empty() {
        return Ok(Table::empty());
    }

    let base = Table::from_records(&records)?;
    let mut columns: Vec<Column> = base.columns().to_vec();

    let dates: Vec<Option<NaiveDateTime>> = records
        .iter()
        .map(|r| {
            r.get("date")
                .and_then(Value::as_str)
                .and_then(parse_datetime)
                .map(|p| p.value)
        })
        .collect();

    if dates.iter().any(Option::is_some) {
        let part = |f: fn(&NaiveDateTime) -> i64| -> Vec<Cell> {
            dates.iter().map(|d| d.as_ref().map(f).into()).collect()
        };
        columns.push(Column::with_declared_type(
            "order_date",
            DeclaredType::Datetime,
            dates.iter().map(|d| (*d).into()).collect(),
        ));
        columns.push(integer_column("order_year", part(|d| d.year().into())));
        columns.push(integer_column("order_month", part(|d| d.month().into())));
        columns.push(integer_column("order_day", part(|d| d.day().into())));
        columns.push(integer_column(
            "order_day_of_week",
            part(|d| d.weekday().num_days_from_monday().into()),
        ));
    } else {
        debug!("No parseable order dates, skipping calendar columns");
    }

    let avg_item_price = records
        .iter()
        .map(|r| {
            let total = r.get("total").and_then(json_as_f64);
            let quantity = r.get("total_quantity").and_then(Value::as_f64);
            match (total, quantity) {
                (Some(t), Some(q)) if q > 0.0 => Cell::Float(t / q),
                _ => Cell::Null,
            }
        })
        .collect();
    columns.push(Column::with_declared_type(
        "avg_item_price",
        DeclaredType::Float,
        avg_item_price,
    ));

    Table::new(columns)
}

fn integer_column(name: &str, values: Vec<Cell>) -> Column {
    Column::with_declared_type(name, DeclaredType::Integer, values)
}

/// Amounts arrive as numbers or numeric strings.
fn json_as_f64(value: &Value) -> Option<f64> {
    match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => crate::utils::parse_numeric_string(s),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn sample_order() -> Value {
        json!({
            "id": 1001,
            "reference_id": 555,
            "status": {"name": "Completed", "slug": "completed"},
            "date": {"date": "2024-03-11 12:23:55.000000", "timezone": "Asia/Riyadh"},
            "total": {"amount": 300.0, "currency": "SAR"},
            "payment_method": "mada",
            "items": [
                {"name": "Shirt", "quantity": 2},
                {"name": "Hat", "quantity": 1},
                {"name": "", "quantity": 0}
            ],
            "features": {"digitalable": false, "shippable": true},
            "exchange_rate": {"rate": 1.0, "exchange_currency": "SAR"}
        })
    }

    #[test]
    fn test_normalize_order_flattens_fields() {
        let normalized = normalize_orders(&[sample_order()]);
        let order = &normalized[0];

        assert_eq!(order["status"], json!("Completed"));
        assert_eq!(order["status_slug"], json!("completed"));
        assert_eq!(order["date"], json!("2024-03-11 12:23:55.000000"));
        assert_eq!(order["currency"], json!("SAR"));
        assert_eq!(order["total"], json!(300.0));
        assert_eq!(order["items_count"], json!(3));
        assert_eq!(order["total_quantity"], json!(3));
        assert_eq!(order["items_names"], json!("Shirt, Hat"));
        assert_eq!(order["is_shippable"], json!(true));
        assert_eq!(order["can_cancel"], json!(false));
        assert_eq!(order["exchange_currency"], json!("SAR"));
    }

    #[test]
    fn test_normalize_sparse_order() {
        let normalized = normalize_orders(&[json!({"id": 7, "date": "2024-01-01"})]);
        let order = &normalized[0];

        assert_eq!(order["date"], json!("2024-01-01"));
        assert_eq!(order["status"], Value::Null);
        assert_eq!(order["items_count"], json!(0));
        assert_eq!(order["total_quantity"], json!(0));
        assert_eq!(order["items_names"], json!(""));
        assert_eq!(order["is_digital"], json!(false));
    }

    #[test]
    fn test_normalized_key_order() {
        let normalized = normalize_orders(&[sample_order()]);
        let keys: Vec<&str> = normalized[0]
            .as_object()
            .unwrap()
            .keys()
            .map(String::as_str)
            .collect();
        assert_eq!(&keys[..4], &["id", "reference_id", "status", "status_slug"]);
    }

    #[test]
    fn test_orders_to_table_derives_columns() {
        let table = orders_to_table(&[sample_order()]).unwrap();

        // 2024-03-11 is a Monday
        assert_eq!(table.column("order_day_of_week").unwrap().values[0], Cell::Int(0));
        assert_eq!(table.column("order_year").unwrap().values[0], Cell::Int(2024));
        assert_eq!(table.column("order_month").unwrap().values[0], Cell::Int(3));
        assert_eq!(table.column("avg_item_price").unwrap().values[0], Cell::Float(100.0));
        assert_eq!(
            table.column("order_date").unwrap().declared_type,
            DeclaredType::Datetime
        );
    }

    #[test]
    fn test_orders_to_table_zero_quantity_price_is_null() {
        let order = json!({"id": 1, "total": {"amount": 50}, "items": []});
        let table = orders_to_table(&[order]).unwrap();

        assert_eq!(table.column("avg_item_price").unwrap().values[0], Cell::Null);
        assert!(table.column("order_date").is_err());
    }

    #[test]
    fn test_orders_to_table_empty() {
        assert!(orders_to_table(&[]).unwrap().is_empty());
    }
}
