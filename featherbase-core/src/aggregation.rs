// src/aggregation.rs
// Grouping engine and the aggregate() entry point

use crate::error::{FeatherBaseError, Result};
use crate::find_options::{apply_limit, apply_sort, AggregateOptions};
use crate::log_debug;
use crate::query::apply_match;
use crate::stats;
use crate::value_utils::{canonical_json_string, compare_values, get_nested_value};
use ahash::AHashMap;
use serde_json::{Map, Value};
use std::cmp::Ordering;

/// Run the aggregation pipeline over an in-memory record sequence.
///
/// Stage order is fixed: `$match` → `$group` → `$sort` → `$limit`. Absent
/// stages are no-ops; with no options at all every input record comes back
/// as a fresh copy. When `$group` is present, `$sort` and `$limit` operate
/// on the grouped records (one per distinct key), not the originals. The
/// input is never mutated.
pub fn aggregate(records: &[Value], options: &AggregateOptions) -> Result<Vec<Value>> {
    let mut result = match &options.filter {
        Some(filter) => apply_match(records, filter)?,
        None => records.to_vec(),
    };

    if let Some(group) = &options.group {
        let input_len = result.len();
        result = group.execute(&result);
        log_debug!("$group folded {} records into {} groups", input_len, result.len());
    }

    if let Some(sort) = &options.sort {
        apply_sort(&mut result, sort);
    }

    if let Some(limit) = options.limit {
        result = apply_limit(result, limit);
    }

    Ok(result)
}

/// How a group output field obtains its per-record value: a `"$name"`
/// reference resolves against each record, anything else is a constant.
#[derive(Debug, Clone)]
pub enum ValueRef {
    Field(String),
    Literal(Value),
}

impl ValueRef {
    fn from_json(value: &Value) -> Self {
        if let Some(s) = value.as_str() {
            if let Some(field) = s.strip_prefix('$') {
                return ValueRef::Field(field.to_string());
            }
        }
        ValueRef::Literal(value.clone())
    }

    fn resolve<'a>(&'a self, record: &'a Value) -> Option<&'a Value> {
        match self {
            ValueRef::Field(field) => get_nested_value(record, field),
            ValueRef::Literal(value) => Some(value),
        }
    }
}

/// Grouping key derivation.
#[derive(Debug, Clone)]
pub enum GroupId {
    /// `_id: null` - every record falls into one group
    Null,
    /// `_id: "$field"` - key is the record's field value
    Field(String),
    /// Any other literal - a constant key for every record
    Literal(Value),
}

/// Accumulator operators. A closed set: constructing one of these is only
/// possible for operators the engine actually implements, so "unsupported
/// accumulator" is a parse-time error and `execute` cannot fail.
#[derive(Debug, Clone)]
pub enum Accumulator {
    /// Running addition over resolved numeric values (`{"$sum": 1}` counts)
    Sum(ValueRef),
    /// Running sum and count, finalized as their quotient
    Avg(ValueRef),
    Min(ValueRef),
    Max(ValueRef),
    /// Collects all values, finalized by sorting
    Median(ValueRef),
    /// Collects all values, finalized with divisor N
    StdDevPop(ValueRef),
    /// Collects all values, finalized with divisor N-1
    StdDevSamp(ValueRef),
}

/// Per-group, per-field fold state.
#[derive(Debug, Clone)]
enum AccState {
    Sum {
        int: i64,
        float: f64,
        has_float: bool,
    },
    Avg {
        sum: f64,
        count: u64,
    },
    Extreme(Option<Value>),
    /// Full sample, kept until finalization; median and the standard
    /// deviations are not incrementally foldable without extra sufficient
    /// statistics, so the engine collects and defers
    Samples(Vec<f64>),
}

impl Accumulator {
    fn from_json(field: &str, definition: &Value) -> Result<Self> {
        let obj = match definition.as_object() {
            Some(obj) if obj.len() == 1 => obj,
            _ => {
                return Err(FeatherBaseError::UnsupportedFieldStructure(
                    field.to_string(),
                ))
            }
        };
        let (op, value) = obj.iter().next().unwrap();
        let source = ValueRef::from_json(value);

        match op.as_str() {
            "$sum" => Ok(Accumulator::Sum(source)),
            "$avg" => Ok(Accumulator::Avg(source)),
            "$min" => Ok(Accumulator::Min(source)),
            "$max" => Ok(Accumulator::Max(source)),
            "$median" => Ok(Accumulator::Median(source)),
            "$stdDevPop" => Ok(Accumulator::StdDevPop(source)),
            "$stdDevSamp" => Ok(Accumulator::StdDevSamp(source)),
            other => Err(FeatherBaseError::UnsupportedOperator(other.to_string())),
        }
    }

    fn init_state(&self) -> AccState {
        match self {
            Accumulator::Sum(_) => AccState::Sum {
                int: 0,
                float: 0.0,
                has_float: false,
            },
            Accumulator::Avg(_) => AccState::Avg { sum: 0.0, count: 0 },
            Accumulator::Min(_) | Accumulator::Max(_) => AccState::Extreme(None),
            Accumulator::Median(_) | Accumulator::StdDevPop(_) | Accumulator::StdDevSamp(_) => {
                AccState::Samples(Vec::new())
            }
        }
    }

    /// Fold one record into the state. Absent fields and values the
    /// operator cannot digest are skipped, never errors.
    fn fold(&self, state: &mut AccState, record: &Value) {
        match self {
            Accumulator::Sum(source) => {
                if let AccState::Sum {
                    int,
                    float,
                    has_float,
                } = state
                {
                    if let Some(v) = source.resolve(record) {
                        if let Some(n) = v.as_i64() {
                            *int = int.saturating_add(n);
                        } else if let Some(f) = v.as_f64() {
                            *float += f;
                            *has_float = true;
                        }
                    }
                }
            }
            Accumulator::Avg(source) => {
                if let AccState::Avg { sum, count } = state {
                    if let Some(f) = source.resolve(record).and_then(Value::as_f64) {
                        *sum += f;
                        *count += 1;
                    }
                }
            }
            Accumulator::Min(source) => {
                if let AccState::Extreme(current) = state {
                    fold_extreme(current, source.resolve(record), Ordering::Less);
                }
            }
            Accumulator::Max(source) => {
                if let AccState::Extreme(current) = state {
                    fold_extreme(current, source.resolve(record), Ordering::Greater);
                }
            }
            Accumulator::Median(source)
            | Accumulator::StdDevPop(source)
            | Accumulator::StdDevSamp(source) => {
                if let AccState::Samples(values) = state {
                    if let Some(f) = source.resolve(record).and_then(Value::as_f64) {
                        values.push(f);
                    }
                }
            }
        }
    }

    /// Turn the fold state into the output value, once per group after all
    /// records are folded. `$sum`/`$min`/`$max` are already final; the
    /// sample-collecting operators do their whole computation here.
    fn finalize(&self, state: AccState) -> Value {
        match state {
            AccState::Sum {
                int,
                float,
                has_float,
            } => {
                if has_float {
                    Value::from(float + int as f64)
                } else {
                    Value::from(int)
                }
            }
            AccState::Avg { sum, count } => {
                if count > 0 {
                    Value::from(sum / count as f64)
                } else {
                    Value::Null
                }
            }
            AccState::Extreme(current) => current.unwrap_or(Value::Null),
            AccState::Samples(mut values) => {
                let result = match self {
                    Accumulator::Median(_) => stats::median(&mut values),
                    Accumulator::StdDevPop(_) => stats::std_dev_population(&values),
                    Accumulator::StdDevSamp(_) => stats::std_dev_sample(&values),
                    _ => None,
                };
                result.map(Value::from).unwrap_or(Value::Null)
            }
        }
    }
}

/// Keep the extreme of `current` and `candidate`. The first resolved value
/// is always accepted, whatever its type; afterwards a candidate replaces
/// the holder only when it compares strictly in `wanted`'s direction.
fn fold_extreme(current: &mut Option<Value>, candidate: Option<&Value>, wanted: Ordering) {
    let candidate = match candidate {
        Some(v) => v,
        None => return,
    };
    match current {
        None => *current = Some(candidate.clone()),
        Some(held) => {
            if compare_values(candidate, held) == Some(wanted) {
                *current = Some(candidate.clone());
            }
        }
    }
}

/// A parsed `$group` specification: the key derivation plus the output
/// fields in declaration order.
#[derive(Debug, Clone)]
pub struct GroupSpec {
    id: GroupId,
    fields: Vec<(String, Accumulator)>,
}

impl GroupSpec {
    pub fn new(id: GroupId) -> Self {
        GroupSpec {
            id,
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, accumulator: Accumulator) -> Self {
        self.fields.push((name.into(), accumulator));
        self
    }

    /// Parse the JSON shape `{"_id": …, "out": {"$op": valueRef}, …}`.
    ///
    /// Unknown accumulator operators fail with `UnsupportedOperator`;
    /// output-field definitions that are not one-key operator objects fail
    /// with `UnsupportedFieldStructure`.
    pub fn from_json(spec: &Value) -> Result<Self> {
        let obj = spec.as_object().ok_or_else(|| {
            FeatherBaseError::InvalidAggregation("$group must be an object".to_string())
        })?;

        let id = match obj.get("_id") {
            None => {
                return Err(FeatherBaseError::InvalidAggregation(
                    "group specification must include _id".to_string(),
                ))
            }
            Some(Value::Null) => GroupId::Null,
            Some(value) => match value.as_str().and_then(|s| s.strip_prefix('$')) {
                Some(field) => GroupId::Field(field.to_string()),
                None => GroupId::Literal(value.clone()),
            },
        };

        let mut fields = Vec::new();
        for (name, definition) in obj {
            if name == "_id" {
                continue;
            }
            fields.push((name.clone(), Accumulator::from_json(name, definition)?));
        }

        Ok(GroupSpec { id, fields })
    }

    /// Partition the records by group key and fold every group through the
    /// output-field accumulators.
    ///
    /// Output order is first-encounter order of distinct keys; key identity
    /// is the canonical JSON string of the derived key value. Empty input
    /// yields no groups, including under `_id: null`.
    pub fn execute(&self, records: &[Value]) -> Vec<Value> {
        let mut slots: AHashMap<String, usize> = AHashMap::new();
        let mut groups: Vec<(Value, Vec<AccState>)> = Vec::new();

        for record in records {
            let key_value = self.group_key(record);
            let key = canonical_json_string(&key_value);

            let slot = match slots.get(&key) {
                Some(&slot) => slot,
                None => {
                    slots.insert(key, groups.len());
                    let states = self
                        .fields
                        .iter()
                        .map(|(_, accumulator)| accumulator.init_state())
                        .collect();
                    groups.push((key_value, states));
                    groups.len() - 1
                }
            };

            let (_, states) = &mut groups[slot];
            for ((_, accumulator), state) in self.fields.iter().zip(states.iter_mut()) {
                accumulator.fold(state, record);
            }
        }

        let mut results = Vec::with_capacity(groups.len());
        for (key_value, states) in groups {
            let mut group = Map::new();
            group.insert("_id".to_string(), key_value);
            for ((name, accumulator), state) in self.fields.iter().zip(states.into_iter()) {
                group.insert(name.clone(), accumulator.finalize(state));
            }
            results.push(Value::Object(group));
        }
        results
    }

    fn group_key(&self, record: &Value) -> Value {
        match &self.id {
            GroupId::Null => Value::Null,
            GroupId::Field(field) => get_nested_value(record, field)
                .cloned()
                .unwrap_or(Value::Null),
            GroupId::Literal(value) => value.clone(),
        }
    }
}
