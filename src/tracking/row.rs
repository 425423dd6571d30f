//! History-row filtering

use std::collections::BTreeMap;

use serde_json::Value;

/// One recorded history row: field name to scalar, nested structure,
/// string, or null, exactly as the tracking service returns it.
pub type HistoryRow = serde_json::Map<String, Value>;

/// Reduce a history row to the scalar metrics the database accepts.
///
/// Strings and nested structures (objects and arrays) are dropped.
/// Remaining falsy values coerce to zero: `null` and `false` become
/// `0.0`, `true` becomes `1.0`, numbers pass through unchanged.
#[must_use]
pub fn filter_row(row: &HistoryRow) -> BTreeMap<String, f64> {
    let mut metrics = BTreeMap::new();
    for (key, value) in row {
        let v = match value {
            Value::Number(n) => match n.as_f64() {
                Some(v) => v,
                None => continue,
            },
            Value::Null | Value::Bool(false) => 0.0,
            Value::Bool(true) => 1.0,
            Value::String(_) | Value::Object(_) | Value::Array(_) => continue,
        };
        metrics.insert(key.clone(), v);
    }
    metrics
}
