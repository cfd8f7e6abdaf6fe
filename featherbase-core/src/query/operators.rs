// src/query/operators.rs
//! Match-expression operator implementations.
//!
//! Each operator is an independent [`OperatorMatcher`]; a registry maps
//! operator names to boxed implementations for dynamic dispatch. The
//! comparison set is intentionally a runtime-checked open set (`$in`/`$nin`
//! must accept arbitrary value types), unlike the accumulator operators of
//! the grouping engine, which form a closed enum.

use crate::error::{FeatherBaseError, Result};
use crate::value_utils::{compare_values, get_nested_value, values_equal};
use lazy_static::lazy_static;
use serde_json::Value;
use std::cmp::Ordering;
use std::collections::HashMap;

/// Interface implemented by every match operator.
pub trait OperatorMatcher: Send + Sync {
    /// Operator name including the `$` prefix, e.g. `"$gte"`.
    fn name(&self) -> &'static str;

    /// Evaluate the operator for one record.
    ///
    /// `record_value` is the value of the field the condition is attached
    /// to (`None` when the field is absent). `record` carries the whole
    /// record for the logical combinators, which recurse into sub-filters
    /// instead of looking at a single field.
    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        record: Option<&Value>,
    ) -> Result<bool>;
}

// ============================================================================
// COMPARISON OPERATORS
// ============================================================================

/// `$eq` - strict equality (numeric-aware: `30` equals `30.0`).
/// An absent field never equals anything expressible in a filter.
pub struct EqOperator;

impl OperatorMatcher for EqOperator {
    fn name(&self) -> &'static str {
        "$eq"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        Ok(record_value
            .map(|v| values_equal(v, filter_value))
            .unwrap_or(false))
    }
}

/// `$ne` - negation of `$eq`; true for absent fields.
pub struct NeOperator;

impl OperatorMatcher for NeOperator {
    fn name(&self) -> &'static str {
        "$ne"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        Ok(record_value
            .map(|v| !values_equal(v, filter_value))
            .unwrap_or(true))
    }
}

/// Shared body of the ordered comparisons; the predicate picks which
/// orderings count as a match. Absent or incomparable operands never match.
fn compare_with_predicate<F>(
    record_value: Option<&Value>,
    filter_value: &Value,
    predicate: F,
) -> Result<bool>
where
    F: Fn(Ordering) -> bool,
{
    match record_value {
        None => Ok(false),
        Some(v) => Ok(compare_values(v, filter_value)
            .map(predicate)
            .unwrap_or(false)),
    }
}

/// `$gt`
pub struct GtOperator;

impl OperatorMatcher for GtOperator {
    fn name(&self) -> &'static str {
        "$gt"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        compare_with_predicate(record_value, filter_value, |ord| ord == Ordering::Greater)
    }
}

/// `$gte`
pub struct GteOperator;

impl OperatorMatcher for GteOperator {
    fn name(&self) -> &'static str {
        "$gte"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        compare_with_predicate(record_value, filter_value, |ord| {
            matches!(ord, Ordering::Greater | Ordering::Equal)
        })
    }
}

/// `$lt`
pub struct LtOperator;

impl OperatorMatcher for LtOperator {
    fn name(&self) -> &'static str {
        "$lt"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        compare_with_predicate(record_value, filter_value, |ord| ord == Ordering::Less)
    }
}

/// `$lte`
pub struct LteOperator;

impl OperatorMatcher for LteOperator {
    fn name(&self) -> &'static str {
        "$lte"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        compare_with_predicate(record_value, filter_value, |ord| {
            matches!(ord, Ordering::Less | Ordering::Equal)
        })
    }
}

// ============================================================================
// SET MEMBERSHIP OPERATORS
// ============================================================================

/// `$in` - true iff the filter value is an array containing the record
/// value. A non-array filter value yields false rather than an error, and
/// an absent field is a member of nothing.
pub struct InOperator;

impl OperatorMatcher for InOperator {
    fn name(&self) -> &'static str {
        "$in"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        match filter_value {
            Value::Array(candidates) => Ok(record_value
                .map(|v| candidates.iter().any(|c| values_equal(v, c)))
                .unwrap_or(false)),
            _ => Ok(false),
        }
    }
}

/// `$nin` - negation of `$in` over an array filter value; like `$in`, a
/// non-array filter value yields false (not true), so the two operators are
/// only complementary when the filter value actually is a set.
pub struct NinOperator;

impl OperatorMatcher for NinOperator {
    fn name(&self) -> &'static str {
        "$nin"
    }

    fn matches(
        &self,
        record_value: Option<&Value>,
        filter_value: &Value,
        _record: Option<&Value>,
    ) -> Result<bool> {
        match filter_value {
            Value::Array(candidates) => Ok(!record_value
                .map(|v| candidates.iter().any(|c| values_equal(v, c)))
                .unwrap_or(false)),
            _ => Ok(false),
        }
    }
}

// ============================================================================
// LOGICAL COMBINATORS
// ============================================================================

/// `$and` - every sub-expression must match; short-circuits on the first
/// failure.
pub struct AndOperator;

impl OperatorMatcher for AndOperator {
    fn name(&self) -> &'static str {
        "$and"
    }

    fn matches(
        &self,
        _record_value: Option<&Value>,
        filter_value: &Value,
        record: Option<&Value>,
    ) -> Result<bool> {
        let record = record.ok_or_else(|| {
            FeatherBaseError::InvalidQuery("$and requires record context".to_string())
        })?;
        let conditions = filter_value.as_array().ok_or_else(|| {
            FeatherBaseError::InvalidQuery("$and requires an array of conditions".to_string())
        })?;

        for condition in conditions {
            if !matches_filter(record, condition)? {
                return Ok(false);
            }
        }
        Ok(true)
    }
}

/// `$or` - at least one sub-expression must match; short-circuits on the
/// first success.
pub struct OrOperator;

impl OperatorMatcher for OrOperator {
    fn name(&self) -> &'static str {
        "$or"
    }

    fn matches(
        &self,
        _record_value: Option<&Value>,
        filter_value: &Value,
        record: Option<&Value>,
    ) -> Result<bool> {
        let record = record.ok_or_else(|| {
            FeatherBaseError::InvalidQuery("$or requires record context".to_string())
        })?;
        let conditions = filter_value.as_array().ok_or_else(|| {
            FeatherBaseError::InvalidQuery("$or requires an array of conditions".to_string())
        })?;

        for condition in conditions {
            if matches_filter(record, condition)? {
                return Ok(true);
            }
        }
        Ok(false)
    }
}

// ============================================================================
// OPERATOR REGISTRY
// ============================================================================

lazy_static! {
    /// Registry of all match operators, initialized once and immutable
    /// thereafter. Implementations are required to be `Send + Sync`.
    pub static ref OPERATOR_REGISTRY: HashMap<&'static str, Box<dyn OperatorMatcher>> = {
        let mut registry: HashMap<&'static str, Box<dyn OperatorMatcher>> = HashMap::new();

        registry.insert("$eq", Box::new(EqOperator));
        registry.insert("$ne", Box::new(NeOperator));
        registry.insert("$gt", Box::new(GtOperator));
        registry.insert("$gte", Box::new(GteOperator));
        registry.insert("$lt", Box::new(LtOperator));
        registry.insert("$lte", Box::new(LteOperator));

        registry.insert("$in", Box::new(InOperator));
        registry.insert("$nin", Box::new(NinOperator));

        registry.insert("$and", Box::new(AndOperator));
        registry.insert("$or", Box::new(OrOperator));

        registry
    };
}

fn lookup(name: &str) -> Result<&'static dyn OperatorMatcher> {
    OPERATOR_REGISTRY
        .get(name)
        .map(|op| &**op)
        .ok_or_else(|| FeatherBaseError::UnsupportedOperator(name.to_string()))
}

/// Evaluate a match expression against one record.
///
/// Pure function of its two inputs. Unknown operator names fail with
/// [`FeatherBaseError::UnsupportedOperator`] and the error propagates to
/// the caller; it is never swallowed into a non-match.
pub fn matches_filter(record: &Value, filter: &Value) -> Result<bool> {
    let filter_obj = filter.as_object().ok_or_else(|| {
        FeatherBaseError::InvalidQuery("match expression must be an object".to_string())
    })?;

    for (key, condition) in filter_obj {
        if key.starts_with('$') {
            // Logical combinator over the whole record
            if !lookup(key)?.matches(None, condition, Some(record))? {
                return Ok(false);
            }
        } else {
            let record_value = get_nested_value(record, key);

            if let Value::Object(operator_obj) = condition {
                // Field condition like {"age": {"$gte": 18, "$lt": 65}};
                // every operator in the object must hold
                for (op_name, op_value) in operator_obj {
                    if !lookup(op_name)?.matches(record_value, op_value, Some(record))? {
                        return Ok(false);
                    }
                }
            } else {
                // Literal condition like {"name": "Alice"}
                if !EqOperator.matches(record_value, condition, Some(record))? {
                    return Ok(false);
                }
            }
        }
    }

    Ok(true)
}
