//! Shared JSON value helpers.
//!
//! Field access by name (with dot notation), value comparison, and the
//! canonical string form used for group-key identity all live here so the
//! match evaluator, the sorter and the grouping engine cannot drift apart.

use serde_json::Value;
use std::cmp::Ordering;

/// Look up a (possibly nested) field on a record.
///
/// Supports plain names (`"age"`), nested objects (`"address.city"`) and
/// array indices (`"items.0.name"`). Returns `None` for absent paths.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use featherbase_core::value_utils::get_nested_value;
///
/// let record = json!({"address": {"city": "NYC"}});
/// assert_eq!(get_nested_value(&record, "address.city"), Some(&json!("NYC")));
/// assert_eq!(get_nested_value(&record, "address.zip"), None);
/// ```
pub fn get_nested_value<'a>(record: &'a Value, path: &str) -> Option<&'a Value> {
    // Fast path for top-level fields
    if !path.contains('.') {
        return record.get(path);
    }

    let mut value = record;
    for part in path.split('.') {
        match value {
            Value::Object(map) => value = map.get(part)?,
            Value::Array(arr) => {
                if let Ok(index) = part.parse::<usize>() {
                    value = arr.get(index)?;
                } else {
                    return None;
                }
            }
            _ => return None,
        }
    }
    Some(value)
}

/// Equality with numeric awareness: `30` and `30.0` are the same value even
/// though serde_json stores them with different internal representations.
/// Everything else falls back to structural equality.
pub fn values_equal(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(fx), Some(fy)) => fx == fy,
            _ => x == y,
        },
        _ => a == b,
    }
}

/// Compare two JSON values of compatible type.
///
/// Numbers compare as f64, strings lexicographically, booleans with
/// `false < true`. Incompatible or non-scalar operands yield `None`.
///
/// # Examples
///
/// ```
/// use serde_json::json;
/// use std::cmp::Ordering;
/// use featherbase_core::value_utils::compare_values;
///
/// assert_eq!(compare_values(&json!(10), &json!(5)), Some(Ordering::Greater));
/// assert_eq!(compare_values(&json!("a"), &json!(1)), None);
/// ```
pub fn compare_values(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(n1), Value::Number(n2)) => {
            let f1 = n1.as_f64()?;
            let f2 = n2.as_f64()?;
            f1.partial_cmp(&f2)
        }
        (Value::String(s1), Value::String(s2)) => Some(s1.cmp(s2)),
        (Value::Bool(b1), Value::Bool(b2)) => Some(b1.cmp(b2)),
        _ => None,
    }
}

/// Total ordering over optional record values, used by the sorter.
///
/// Absent fields sort before any present value. Values of incompatible
/// types fall back to a fixed type priority so the ordering stays total:
/// null < number < string < bool < object < array.
pub fn compare_values_with_none(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Less,
        (Some(_), None) => Ordering::Greater,
        (Some(av), Some(bv)) => compare_values(av, bv)
            .unwrap_or_else(|| type_priority(av).cmp(&type_priority(bv))),
    }
}

fn type_priority(value: &Value) -> u8 {
    match value {
        Value::Null => 0,
        Value::Number(_) => 1,
        Value::String(_) => 2,
        Value::Bool(_) => 3,
        Value::Object(_) => 4,
        Value::Array(_) => 5,
    }
}

/// Canonical string form of a JSON value: object keys sorted alphabetically
/// at every level. Two logically equal values always produce the same
/// string, making it usable as a hash-map key for group identity.
pub fn canonical_json_string(value: &Value) -> String {
    match value {
        Value::Object(map) => {
            let mut pairs: Vec<_> = map.iter().collect();
            pairs.sort_by(|a, b| a.0.cmp(b.0));

            let inner: String = pairs
                .iter()
                .map(|(k, v)| format!("\"{}\":{}", k, canonical_json_string(v)))
                .collect::<Vec<_>>()
                .join(",");

            format!("{{{}}}", inner)
        }
        Value::Array(arr) => {
            let inner: String = arr
                .iter()
                .map(canonical_json_string)
                .collect::<Vec<_>>()
                .join(",");
            format!("[{}]", inner)
        }
        _ => value.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_get_nested_value_simple() {
        let record = json!({"name": "Alice", "age": 30});
        assert_eq!(get_nested_value(&record, "name"), Some(&json!("Alice")));
        assert_eq!(get_nested_value(&record, "missing"), None);
    }

    #[test]
    fn test_get_nested_value_paths() {
        let record = json!({
            "address": {"city": "NYC", "zip": 10001},
            "items": [{"name": "first"}, {"name": "second"}]
        });
        assert_eq!(get_nested_value(&record, "address.city"), Some(&json!("NYC")));
        assert_eq!(
            get_nested_value(&record, "items.1.name"),
            Some(&json!("second"))
        );
        assert_eq!(get_nested_value(&record, "items.5.name"), None);
        assert_eq!(get_nested_value(&record, "address.city.block"), None);
    }

    #[test]
    fn test_values_equal_numeric() {
        assert!(values_equal(&json!(30), &json!(30.0)));
        assert!(!values_equal(&json!(30), &json!(30.5)));
        assert!(values_equal(&json!("a"), &json!("a")));
        assert!(!values_equal(&json!(1), &json!(true)));
    }

    #[test]
    fn test_compare_values() {
        assert_eq!(compare_values(&json!(5), &json!(10)), Some(Ordering::Less));
        assert_eq!(
            compare_values(&json!(2.5), &json!(2)),
            Some(Ordering::Greater)
        );
        assert_eq!(
            compare_values(&json!("apple"), &json!("banana")),
            Some(Ordering::Less)
        );
        assert_eq!(
            compare_values(&json!(true), &json!(false)),
            Some(Ordering::Greater)
        );
        assert_eq!(compare_values(&json!("10"), &json!(10)), None);
        assert_eq!(compare_values(&json!([1]), &json!([1])), None);
    }

    #[test]
    fn test_compare_values_with_none() {
        assert_eq!(compare_values_with_none(None, None), Ordering::Equal);
        assert_eq!(
            compare_values_with_none(None, Some(&json!(0))),
            Ordering::Less
        );
        assert_eq!(
            compare_values_with_none(Some(&json!(0)), None),
            Ordering::Greater
        );
        // Incompatible types order by type priority: number < string
        assert_eq!(
            compare_values_with_none(Some(&json!(99)), Some(&json!("a"))),
            Ordering::Less
        );
    }

    #[test]
    fn test_canonical_json_string_key_order() {
        let v1 = json!({"a": 1, "b": {"y": 2, "x": 3}});
        let v2 = json!({"b": {"x": 3, "y": 2}, "a": 1});
        assert_eq!(canonical_json_string(&v1), canonical_json_string(&v2));
        assert_eq!(canonical_json_string(&v1), r#"{"a":1,"b":{"x":3,"y":2}}"#);
    }

    #[test]
    fn test_canonical_json_string_primitives() {
        assert_eq!(canonical_json_string(&json!(null)), "null");
        assert_eq!(canonical_json_string(&json!(32.5)), "32.5");
        assert_eq!(canonical_json_string(&json!("x")), "\"x\"");
        assert_eq!(canonical_json_string(&json!([1, "a"])), "[1,\"a\"]");
    }
}
