//! Condition-object traversal
//!
//! Query objects map field paths either to a value or to an operator object
//! such as `{"$in": [1, 2]}`. The walker finds every operand position that
//! holds a field value and hands it to the visitor together with the field
//! path it constrains.
//!
//! Copyright (c) 2025 Docspec Team
//! Licensed under the Apache-2.0 license

use super::Slot;
use crate::value::{FieldKey, Location, Value};
use crate::Result;
use std::fmt;

/// Recognised query operators
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryOperator {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Ne,
    In,
    Nin,
    Or,
    And,
    Not,
    Nor,
    Size,
    All,
    ElemMatch,
}

impl QueryOperator {
    pub const ALL: [QueryOperator; 15] = [
        QueryOperator::Eq,
        QueryOperator::Gt,
        QueryOperator::Gte,
        QueryOperator::Lt,
        QueryOperator::Lte,
        QueryOperator::Ne,
        QueryOperator::In,
        QueryOperator::Nin,
        QueryOperator::Or,
        QueryOperator::And,
        QueryOperator::Not,
        QueryOperator::Nor,
        QueryOperator::Size,
        QueryOperator::All,
        QueryOperator::ElemMatch,
    ];

    pub fn token(&self) -> &'static str {
        match self {
            QueryOperator::Eq => "$eq",
            QueryOperator::Gt => "$gt",
            QueryOperator::Gte => "$gte",
            QueryOperator::Lt => "$lt",
            QueryOperator::Lte => "$lte",
            QueryOperator::Ne => "$ne",
            QueryOperator::In => "$in",
            QueryOperator::Nin => "$nin",
            QueryOperator::Or => "$or",
            QueryOperator::And => "$and",
            QueryOperator::Not => "$not",
            QueryOperator::Nor => "$nor",
            QueryOperator::Size => "$size",
            QueryOperator::All => "$all",
            QueryOperator::ElemMatch => "$elemMatch",
        }
    }

    pub fn parse(token: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|op| op.token() == token)
    }

    /// `$or` and `$and` hold a list of sub-queries
    pub fn is_composition(&self) -> bool {
        matches!(self, QueryOperator::Or | QueryOperator::And)
    }
}

impl fmt::Display for QueryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// Classification of a query object key
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryKey {
    Operator(QueryOperator),
    /// A field path
    Field(String),
    /// A `$` key outside the operator set; skipped
    Unrecognized(String),
}

impl QueryKey {
    pub fn classify(key: &str) -> Self {
        match QueryOperator::parse(key) {
            Some(op) => QueryKey::Operator(op),
            None if key.starts_with('$') => QueryKey::Unrecognized(key.to_string()),
            None => QueryKey::Field(key.to_string()),
        }
    }
}

/// One operand position of a query
#[derive(Debug)]
pub struct QueryVisit<'d> {
    /// Field path the operand constrains
    pub field_path: &'d str,
    /// Structural location of the operand within the query
    pub location: &'d Location,
    pub slot: Slot<'d>,
}

/// Visit every field operand of `query`
///
/// For a field whose value holds operators, each operator operand is visited,
/// once per element when the operand is an array. Otherwise an array value is
/// visited per element and any other value once.
pub fn walk_query<F>(query: &mut Value, mut visit: F) -> Result<()>
where
    F: FnMut(QueryVisit<'_>) -> Result<()>,
{
    walk(query, Location::root(), &mut visit)
}

fn walk<F>(query: &mut Value, location: Location, visit: &mut F) -> Result<()>
where
    F: FnMut(QueryVisit<'_>) -> Result<()>,
{
    if let Some(items) = query.as_array_mut() {
        for (index, item) in items.iter_mut().enumerate() {
            walk(item, location.child(FieldKey::Index(index)), visit)?;
        }
        return Ok(());
    }

    let keys: Vec<String> = match query.as_object() {
        Some(map) => map.keys().cloned().collect(),
        None => return Ok(()),
    };
    for key in keys {
        let field_key = FieldKey::Name(key.clone());
        let child = location.child(field_key.clone());
        match QueryKey::classify(&key) {
            QueryKey::Operator(op) => {
                if let Some(operand) = query.child_mut(&field_key) {
                    if op.is_composition() && !operand.is_array() {
                        tracing::debug!("{} operand is not a list of sub-queries", op);
                    }
                    walk(operand, child, visit)?;
                }
            }
            QueryKey::Unrecognized(token) => {
                tracing::debug!("Skipping unrecognized query token '{}'", token);
            }
            QueryKey::Field(field) => visit_field(&field, query, &field_key, child, visit)?,
        }
    }
    Ok(())
}

fn operator_keys(value: Option<&Value>) -> Vec<String> {
    value
        .and_then(Value::as_object)
        .map(|map| {
            map.keys()
                .filter(|key| matches!(QueryKey::classify(key), QueryKey::Operator(_)))
                .cloned()
                .collect()
        })
        .unwrap_or_default()
}

fn visit_field<F>(
    field: &str,
    container: &mut Value,
    key: &FieldKey,
    location: Location,
    visit: &mut F,
) -> Result<()>
where
    F: FnMut(QueryVisit<'_>) -> Result<()>,
{
    let operators = operator_keys(container.child(key));

    if !operators.is_empty() {
        let Some(value) = container.child_mut(key) else {
            return Ok(());
        };
        for op in operators {
            let op_key = FieldKey::Name(op);
            let op_location = location.child(op_key.clone());
            if value.child(&op_key).is_some_and(Value::is_array) {
                if let Some(operand) = value.child_mut(&op_key) {
                    visit_elements(field, operand, &op_location, visit)?;
                }
            } else {
                visit(QueryVisit {
                    field_path: field,
                    location: &op_location,
                    slot: Slot::new(value, &op_key),
                })?;
            }
        }
        return Ok(());
    }

    if container.child(key).is_some_and(Value::is_array) {
        if let Some(array) = container.child_mut(key) {
            visit_elements(field, array, &location, visit)?;
        }
        return Ok(());
    }

    visit(QueryVisit {
        field_path: field,
        location: &location,
        slot: Slot::new(container, key),
    })
}

fn visit_elements<F>(field: &str, array: &mut Value, location: &Location, visit: &mut F) -> Result<()>
where
    F: FnMut(QueryVisit<'_>) -> Result<()>,
{
    let count = array.as_array().map(Vec::len).unwrap_or(0);
    for index in 0..count {
        let key = FieldKey::Index(index);
        let element_location = location.child(key.clone());
        visit(QueryVisit {
            field_path: field,
            location: &element_location,
            slot: Slot::new(array, &key),
        })?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn operands(query: serde_json::Value) -> Vec<(String, Value)> {
        let mut query = Value::from(query);
        let mut seen = Vec::new();
        walk_query(&mut query, |visit| {
            let value = visit.slot.get().cloned().unwrap_or_default();
            seen.push((visit.field_path.to_string(), value));
            Ok(())
        })
        .unwrap();
        seen
    }

    fn entry(path: &str, value: serde_json::Value) -> (String, Value) {
        (path.to_string(), Value::from(value))
    }

    #[test]
    fn test_classify() {
        assert_eq!(QueryKey::classify("$in"), QueryKey::Operator(QueryOperator::In));
        assert_eq!(QueryKey::classify("$where"), QueryKey::Unrecognized("$where".into()));
        assert_eq!(QueryKey::classify("age"), QueryKey::Field("age".into()));
        assert_eq!(QueryOperator::parse("$elemMatch"), Some(QueryOperator::ElemMatch));
        assert_eq!(QueryOperator::ElemMatch.to_string(), "$elemMatch");
    }

    #[test]
    fn test_scalar_field() {
        assert_eq!(operands(json!({"age": "33"})), vec![entry("age", json!("33"))]);
    }

    #[test]
    fn test_array_field_is_visited_per_element() {
        assert_eq!(
            operands(json!({"tags": ["a", "b"]})),
            vec![entry("tags", json!("a")), entry("tags", json!("b"))]
        );
    }

    #[test]
    fn test_operator_operands() {
        assert_eq!(
            operands(json!({"age": {"$gt": "18", "$in": ["20", "30"]}})),
            vec![
                entry("age", json!("18")),
                entry("age", json!("20")),
                entry("age", json!("30")),
            ]
        );
    }

    #[test]
    fn test_non_operator_siblings_of_operators_are_skipped() {
        assert_eq!(
            operands(json!({"age": {"$gt": 1, "unit": "years"}})),
            vec![entry("age", json!(1))]
        );
    }

    #[test]
    fn test_object_without_operators_is_visited_whole() {
        assert_eq!(
            operands(json!({"address": {"city": "Oslo"}})),
            vec![entry("address", json!({"city": "Oslo"}))]
        );
    }

    #[test]
    fn test_composition_operators() {
        assert_eq!(
            operands(json!({"$or": [{"age": 1}, {"name": {"$ne": "x"}}], "$and": [{"b": true}]})),
            vec![
                entry("age", json!(1)),
                entry("name", json!("x")),
                entry("b", json!(true)),
            ]
        );
    }

    #[test]
    fn test_unrecognized_tokens_are_skipped() {
        assert!(operands(json!({"$where": {"age": 1}})).is_empty());
    }

    #[test]
    fn test_visitor_writes_back_into_query() {
        let mut query = Value::from(json!({"age": {"$in": ["1", "2"]}, "n": "3"}));
        walk_query(&mut query, |mut visit| {
            if let Some(Value::String(s)) = visit.slot.get().cloned() {
                visit.slot.set(Value::Number(s.parse().unwrap_or(f64::NAN)));
            }
            Ok(())
        })
        .unwrap();
        assert_eq!(query, Value::from(json!({"age": {"$in": [1, 2]}, "n": 3})));
    }
}
