// src/find_options.rs
// Option parsing for the find/aggregate entry points, plus the sort and
// limit stage implementations they share.

use crate::aggregation::GroupSpec;
use crate::error::{FeatherBaseError, Result};
use crate::value_utils::{compare_values_with_none, get_nested_value};
use serde_json::Value;
use std::cmp::Ordering;

/// Ordered sort fields: `(field, direction)` with 1 ascending, -1
/// descending. Field order defines tie-break precedence.
pub type SortSpec = Vec<(String, i32)>;

/// Options for [`crate::find`]: `$match`, `$sort`, `$limit`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Match expression evaluated per record
    pub filter: Option<Value>,

    /// Stable multi-field sort
    pub sort: Option<SortSpec>,

    /// Maximum number of records to return
    pub limit: Option<usize>,
}

impl FindOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parse the JSON options shape `{"$match": …, "$sort": …, "$limit": …}`.
    pub fn from_json(options: &Value) -> Result<Self> {
        let obj = options.as_object().ok_or_else(|| {
            FeatherBaseError::InvalidQuery("find options must be an object".to_string())
        })?;

        let mut parsed = FindOptions::default();
        for (key, value) in obj {
            match key.as_str() {
                "$match" => parsed.filter = Some(value.clone()),
                "$sort" => parsed.sort = Some(parse_sort_spec(value)?),
                "$limit" => parsed.limit = Some(parse_limit(value)?),
                other => {
                    return Err(FeatherBaseError::InvalidQuery(format!(
                        "Unknown find option: {}",
                        other
                    )))
                }
            }
        }
        Ok(parsed)
    }
}

/// Options for [`crate::aggregate`]: `$match`, `$group`, `$sort`, `$limit`.
#[derive(Debug, Clone, Default)]
pub struct AggregateOptions {
    /// Match expression applied before grouping
    pub filter: Option<Value>,

    /// Group specification; when present, `$sort`/`$limit` operate on the
    /// grouped records rather than the original ones
    pub group: Option<GroupSpec>,

    pub sort: Option<SortSpec>,

    pub limit: Option<usize>,
}

impl AggregateOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter(mut self, filter: Value) -> Self {
        self.filter = Some(filter);
        self
    }

    pub fn with_group(mut self, group: GroupSpec) -> Self {
        self.group = Some(group);
        self
    }

    pub fn with_sort(mut self, sort: SortSpec) -> Self {
        self.sort = Some(sort);
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Parse the JSON options shape
    /// `{"$match": …, "$group": …, "$sort": …, "$limit": …}`.
    pub fn from_json(options: &Value) -> Result<Self> {
        let obj = options.as_object().ok_or_else(|| {
            FeatherBaseError::InvalidAggregation("aggregate options must be an object".to_string())
        })?;

        let mut parsed = AggregateOptions::default();
        for (key, value) in obj {
            match key.as_str() {
                "$match" => parsed.filter = Some(value.clone()),
                "$group" => parsed.group = Some(GroupSpec::from_json(value)?),
                "$sort" => parsed.sort = Some(parse_sort_spec(value)?),
                "$limit" => parsed.limit = Some(parse_limit(value)?),
                other => {
                    return Err(FeatherBaseError::InvalidAggregation(format!(
                        "Unknown aggregate option: {}",
                        other
                    )))
                }
            }
        }
        Ok(parsed)
    }
}

fn parse_sort_spec(spec: &Value) -> Result<SortSpec> {
    let obj = spec.as_object().ok_or_else(|| {
        FeatherBaseError::InvalidQuery("$sort must be an object".to_string())
    })?;

    let mut fields = Vec::with_capacity(obj.len());
    for (field, direction) in obj {
        match direction.as_i64() {
            Some(1) => fields.push((field.clone(), 1)),
            Some(-1) => fields.push((field.clone(), -1)),
            _ => {
                return Err(FeatherBaseError::InvalidQuery(
                    "Sort direction must be 1 or -1".to_string(),
                ))
            }
        }
    }
    Ok(fields)
}

fn parse_limit(value: &Value) -> Result<usize> {
    match value.as_i64() {
        // Negative limits clamp to zero: "give me at most N" with N <= 0
        // is an empty result, not an error
        Some(n) if n <= 0 => Ok(0),
        Some(n) => Ok(n as usize),
        None => Err(FeatherBaseError::InvalidQuery(
            "$limit must be an integer".to_string(),
        )),
    }
}

/// Compare two records under a sort specification.
///
/// The first field whose values differ decides, reversed for direction -1;
/// records equal on every sort field compare equal, so a stable sort
/// preserves their input order. Absent fields sort before present values.
pub fn compare_records(a: &Value, b: &Value, sort: &SortSpec) -> Ordering {
    for (field, direction) in sort {
        let va = get_nested_value(a, field);
        let vb = get_nested_value(b, field);

        let ordering = compare_values_with_none(va, vb);
        if ordering != Ordering::Equal {
            return if *direction == -1 {
                ordering.reverse()
            } else {
                ordering
            };
        }
    }
    Ordering::Equal
}

/// Stable in-place sort under a sort specification.
pub fn apply_sort(records: &mut [Value], sort: &SortSpec) {
    if sort.is_empty() {
        return;
    }
    // slice::sort_by is stable, which the equal-key ordering contract
    // depends on
    records.sort_by(|a, b| compare_records(a, b, sort));
}

/// Truncate to the first `limit` records. A limit of zero empties the
/// result; a limit beyond the length passes everything through.
pub fn apply_limit(mut records: Vec<Value>, limit: usize) -> Vec<Value> {
    records.truncate(limit);
    records
}
