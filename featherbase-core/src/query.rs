// src/query.rs
//! Match-expression evaluation for MongoDB-style filters.
//!
//! A match expression is a JSON object whose keys are either field names or
//! the logical combinators `$and`/`$or`. Field conditions are literals
//! (equality) or one-key operator objects such as `{"$gte": 18}`. All
//! top-level conditions must hold for a record to match.
//!
//! Each comparison operator is its own [`operators::OperatorMatcher`]
//! implementation, dispatched through a registry, so the operator set stays
//! open to extension without touching the evaluation loop.

pub mod operators;

use crate::error::Result;
use serde_json::Value;

pub use operators::matches_filter;

/// Filter a record sequence through a match expression.
///
/// Both `find` and `aggregate` route their `$match` stage through this
/// function, which is what guarantees the two entry points share one
/// filtering semantics. The input slice is left untouched; matching
/// records are cloned into the result.
pub fn apply_match(records: &[Value], filter: &Value) -> Result<Vec<Value>> {
    let mut kept = Vec::with_capacity(records.len());
    for record in records {
        if matches_filter(record, filter)? {
            kept.push(record.clone());
        }
    }
    Ok(kept)
}
