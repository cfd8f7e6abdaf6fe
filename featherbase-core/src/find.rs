// src/find.rs
// find() entry point: $match -> $sort -> $limit over an in-memory collection

use crate::error::Result;
use crate::find_options::{apply_limit, apply_sort, FindOptions};
use crate::log_debug;
use crate::query::apply_match;
use serde_json::Value;

/// Run a find query over an in-memory record sequence.
///
/// Stage order is fixed: `$match` → `$sort` → `$limit`. Absent stages are
/// no-ops, so empty options return every record as a fresh copy. The input
/// is never mutated; sorting is stable, so records with equal sort keys
/// keep their input order.
pub fn find(records: &[Value], options: &FindOptions) -> Result<Vec<Value>> {
    let mut result = match &options.filter {
        Some(filter) => {
            let kept = apply_match(records, filter)?;
            log_debug!("$match kept {} of {} records", kept.len(), records.len());
            kept
        }
        None => records.to_vec(),
    };

    if let Some(sort) = &options.sort {
        apply_sort(&mut result, sort);
    }

    if let Some(limit) = options.limit {
        result = apply_limit(result, limit);
    }

    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn people() -> Vec<Value> {
        vec![
            json!({"_id": 1, "name": "John", "age": 30}),
            json!({"_id": 2, "name": "Alice", "age": 25}),
            json!({"_id": 3, "name": "Bob", "age": 35}),
        ]
    }

    #[test]
    fn test_no_options_returns_all() {
        let data = people();
        let result = find(&data, &FindOptions::new()).unwrap();
        assert_eq!(result, data);
    }

    #[test]
    fn test_match_filters() {
        let options = FindOptions::from_json(&json!({"$match": {"age": {"$gte": 30}}})).unwrap();
        let result = find(&people(), &options).unwrap();

        assert_eq!(
            result,
            vec![
                json!({"_id": 1, "name": "John", "age": 30}),
                json!({"_id": 3, "name": "Bob", "age": 35}),
            ]
        );
    }

    #[test]
    fn test_sort_ascending() {
        let options = FindOptions::from_json(&json!({"$sort": {"age": 1}})).unwrap();
        let result = find(&people(), &options).unwrap();

        let ages: Vec<i64> = result.iter().map(|r| r["age"].as_i64().unwrap()).collect();
        assert_eq!(ages, vec![25, 30, 35]);
    }

    #[test]
    fn test_limit() {
        let options = FindOptions::new().with_limit(2);
        let result = find(&people(), &options).unwrap();
        assert_eq!(result, people()[..2].to_vec());
    }

    #[test]
    fn test_limit_edges() {
        assert!(find(&people(), &FindOptions::new().with_limit(0))
            .unwrap()
            .is_empty());
        assert_eq!(
            find(&people(), &FindOptions::new().with_limit(100))
                .unwrap()
                .len(),
            3
        );
    }

    #[test]
    fn test_all_stages_together() {
        let options = FindOptions::from_json(&json!({
            "$match": {"age": {"$gte": 30}},
            "$sort": {"age": -1},
            "$limit": 1
        }))
        .unwrap();
        let result = find(&people(), &options).unwrap();

        assert_eq!(result, vec![json!({"_id": 3, "name": "Bob", "age": 35})]);
    }

    #[test]
    fn test_input_not_mutated() {
        let data = people();
        let before = data.clone();
        let options = FindOptions::from_json(&json!({
            "$match": {"age": {"$lt": 100}},
            "$sort": {"age": -1}
        }))
        .unwrap();
        let _ = find(&data, &options).unwrap();
        assert_eq!(data, before);
    }

    #[test]
    fn test_unsupported_operator_surfaces() {
        let options =
            FindOptions::from_json(&json!({"$match": {"name": {"$regex": "^A"}}})).unwrap();
        let result = find(&people(), &options);
        assert!(result.is_err());
    }
}
