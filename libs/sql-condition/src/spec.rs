// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The loosely-typed input surface of the compiler and the closed value slots it is parsed into.

use std::sync::Arc;

use indexmap::IndexMap;

use crate::{Condition, ConditionError, RawExpression, SqlValue, Subquery};

/// A condition specification as supplied by calling code.
///
/// Two shapes describe conditions:
/// - the *hash format*, a [`ConditionSpec::Map`] of column names to values (`{"status": 1}`)
/// - the *operator format*, a [`ConditionSpec::List`] whose first element is an operator token
///   (`["BETWEEN", "age", 18, 65]`)
///
/// A spec may also directly hold a constructed [`Condition`] or a [`RawExpression`]. The remaining
/// variants only appear as operands.
///
/// Specs are usually built from JSON (`serde_json::json!`) or from Rust values through the `From`
/// implementations.
#[derive(Debug, Clone, Default)]
pub enum ConditionSpec {
    #[default]
    Null,
    Value(SqlValue),
    List(Vec<ConditionSpec>),
    Map(IndexMap<String, ConditionSpec>),
    Raw(RawExpression),
    Subquery(Arc<dyn Subquery>),
    Condition(Box<Condition>),
}

impl ConditionSpec {
    /// A hash-format spec from `(column, value)` pairs (in order).
    pub fn hash<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<ConditionSpec>,
    {
        ConditionSpec::Map(
            entries
                .into_iter()
                .map(|(column, value)| (column.into(), value.into()))
                .collect(),
        )
    }

    /// An operator-format spec: `[operator, operand1, operand2, ...]`.
    pub fn operator(
        operator: &str,
        operands: impl IntoIterator<Item = impl Into<ConditionSpec>>,
    ) -> Self {
        let mut list = vec![ConditionSpec::Value(SqlValue::from(operator))];
        list.extend(operands.into_iter().map(Into::into));
        ConditionSpec::List(list)
    }

    pub fn raw(sql: impl Into<String>) -> Self {
        ConditionSpec::Raw(RawExpression::new(sql))
    }

    pub fn subquery(subquery: impl Subquery + 'static) -> Self {
        ConditionSpec::Subquery(Arc::new(subquery))
    }

    /// Empty specs (null, empty text, empty list or mapping) mean "no constraint".
    pub fn is_empty(&self) -> bool {
        match self {
            ConditionSpec::Null => true,
            ConditionSpec::Value(SqlValue::Text(text)) => text.is_empty(),
            ConditionSpec::List(items) => items.is_empty(),
            ConditionSpec::Map(entries) => entries.is_empty(),
            _ => false,
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            ConditionSpec::Null => "null".to_string(),
            ConditionSpec::Value(value) => format!("a {} value", value.type_name()),
            ConditionSpec::List(_) => "a list".to_string(),
            ConditionSpec::Map(_) => "a mapping".to_string(),
            ConditionSpec::Raw(_) => "a raw expression".to_string(),
            ConditionSpec::Subquery(_) => "a sub-query".to_string(),
            ConditionSpec::Condition(condition) => format!("a {} condition", condition.kind()),
        }
    }
}

/// The value slot of a condition (the right-hand side of `=`, the members of `IN`, the bounds of
/// `BETWEEN`, ...). Which variant applies is decided once, when the specification is parsed.
#[derive(Debug, Clone)]
pub enum Operand {
    Null,
    Value(SqlValue),
    List(Vec<Operand>),
    /// A row of a (possibly composite) `IN`, keyed by column name
    Row(IndexMap<String, Operand>),
    Raw(RawExpression),
    Subquery(Arc<dyn Subquery>),
}

impl Operand {
    pub(crate) fn from_spec(operator: &str, spec: ConditionSpec) -> Result<Self, ConditionError> {
        Ok(match spec {
            ConditionSpec::Null => Operand::Null,
            ConditionSpec::Value(value) => Operand::Value(value),
            ConditionSpec::List(items) => Operand::List(
                items
                    .into_iter()
                    .map(|item| Operand::from_spec(operator, item))
                    .collect::<Result<_, _>>()?,
            ),
            ConditionSpec::Map(entries) => Operand::Row(
                entries
                    .into_iter()
                    .map(|(key, value)| {
                        Ok::<_, ConditionError>((key, Operand::from_spec(operator, value)?))
                    })
                    .collect::<Result<_, _>>()?,
            ),
            ConditionSpec::Raw(raw) => Operand::Raw(raw),
            ConditionSpec::Subquery(subquery) => Operand::Subquery(subquery),
            ConditionSpec::Condition(condition) => {
                return Err(ConditionError::invalid_operand(
                    operator,
                    format!("a {} condition cannot be used as a value", condition.kind()),
                ));
            }
        })
    }

    /// Parse a scalar slot: anything but a list or a row.
    pub(crate) fn scalar_from_spec(
        operator: &str,
        spec: ConditionSpec,
    ) -> Result<Self, ConditionError> {
        let operand = Operand::from_spec(operator, spec)?;
        operand.ensure_scalar(operator)?;
        Ok(operand)
    }

    pub(crate) fn ensure_scalar(&self, operator: &str) -> Result<(), ConditionError> {
        match self {
            Operand::List(_) | Operand::Row(_) => Err(ConditionError::invalid_operand(
                operator,
                format!("expected a single value, got {}", self.describe()),
            )),
            _ => Ok(()),
        }
    }

    /// Coerce to a list of members (a single value is a list of one).
    pub(crate) fn members(&self) -> Vec<&Operand> {
        match self {
            Operand::List(items) => items.iter().collect(),
            other => vec![other],
        }
    }

    pub(crate) fn describe(&self) -> String {
        match self {
            Operand::Null => "null".to_string(),
            Operand::Value(value) => format!("a {} value", value.type_name()),
            Operand::List(_) => "a list".to_string(),
            Operand::Row(_) => "a row".to_string(),
            Operand::Raw(_) => "a raw expression".to_string(),
            Operand::Subquery(_) => "a sub-query".to_string(),
        }
    }
}

/// A column position: a plain column name (quoted when rendered), a raw SQL expression, or a
/// sub-query.
#[derive(Debug, Clone)]
pub enum Column {
    Name(String),
    Raw(RawExpression),
    Subquery(Arc<dyn Subquery>),
}

impl Column {
    pub(crate) fn from_spec(operator: &str, spec: ConditionSpec) -> Result<Self, ConditionError> {
        match spec {
            ConditionSpec::Value(SqlValue::Text(name)) if !name.is_empty() => Ok(Column::Name(name)),
            ConditionSpec::Raw(raw) => Ok(Column::Raw(raw)),
            ConditionSpec::Subquery(subquery) => Ok(Column::Subquery(subquery)),
            other => Err(ConditionError::invalid_operand(
                operator,
                format!("expected a column name, got {}", other.describe()),
            )),
        }
    }

    /// The key under which a row stores this column's value.
    pub(crate) fn row_key(&self) -> Option<&str> {
        match self {
            Column::Name(name) => Some(name),
            Column::Raw(raw) => Some(raw.as_str()),
            Column::Subquery(_) => None,
        }
    }
}

impl From<&str> for Column {
    fn from(name: &str) -> Self {
        Column::Name(name.to_string())
    }
}

impl From<String> for Column {
    fn from(name: String) -> Self {
        Column::Name(name)
    }
}

impl From<RawExpression> for Column {
    fn from(raw: RawExpression) -> Self {
        Column::Raw(raw)
    }
}

impl From<Arc<dyn Subquery>> for Column {
    fn from(subquery: Arc<dyn Subquery>) -> Self {
        Column::Subquery(subquery)
    }
}

/// Implement `From<scalar>` for `ConditionSpec` and `Operand` alike
macro_rules! impl_from_scalar {
    ($target:ident, $($scalar:ty),+) => {
        $(
            impl From<$scalar> for $target {
                fn from(value: $scalar) -> Self {
                    $target::Value(SqlValue::from(value))
                }
            }
        )+
    };
}

impl_from_scalar!(ConditionSpec, bool, i32, i64, f64, &str, String);
impl_from_scalar!(Operand, bool, i32, i64, f64, &str, String);

impl From<SqlValue> for ConditionSpec {
    fn from(value: SqlValue) -> Self {
        ConditionSpec::Value(value)
    }
}

impl From<SqlValue> for Operand {
    fn from(value: SqlValue) -> Self {
        Operand::Value(value)
    }
}

impl From<RawExpression> for ConditionSpec {
    fn from(raw: RawExpression) -> Self {
        ConditionSpec::Raw(raw)
    }
}

impl From<RawExpression> for Operand {
    fn from(raw: RawExpression) -> Self {
        Operand::Raw(raw)
    }
}

impl From<Arc<dyn Subquery>> for ConditionSpec {
    fn from(subquery: Arc<dyn Subquery>) -> Self {
        ConditionSpec::Subquery(subquery)
    }
}

impl From<Arc<dyn Subquery>> for Operand {
    fn from(subquery: Arc<dyn Subquery>) -> Self {
        Operand::Subquery(subquery)
    }
}

impl<T: Into<ConditionSpec>> From<Vec<T>> for ConditionSpec {
    fn from(items: Vec<T>) -> Self {
        ConditionSpec::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Operand>> From<Vec<T>> for Operand {
    fn from(items: Vec<T>) -> Self {
        Operand::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<ConditionSpec>> From<Option<T>> for ConditionSpec {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(ConditionSpec::Null)
    }
}

impl<T: Into<Operand>> From<Option<T>> for Operand {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Operand::Null)
    }
}

impl From<IndexMap<String, ConditionSpec>> for ConditionSpec {
    fn from(entries: IndexMap<String, ConditionSpec>) -> Self {
        ConditionSpec::Map(entries)
    }
}

impl From<IndexMap<String, Operand>> for Operand {
    fn from(entries: IndexMap<String, Operand>) -> Self {
        Operand::Row(entries)
    }
}

impl From<Condition> for ConditionSpec {
    fn from(condition: Condition) -> Self {
        ConditionSpec::Condition(Box::new(condition))
    }
}

impl From<serde_json::Value> for ConditionSpec {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ConditionSpec::Null,
            Value::Bool(value) => ConditionSpec::from(value),
            Value::Number(number) => match number.as_i64() {
                Some(value) => ConditionSpec::from(value),
                // u64 beyond i64::MAX, or a float
                None => ConditionSpec::from(number.as_f64().unwrap_or(f64::NAN)),
            },
            Value::String(value) => ConditionSpec::from(value),
            Value::Array(items) => {
                ConditionSpec::List(items.into_iter().map(ConditionSpec::from).collect())
            }
            Value::Object(entries) => ConditionSpec::Map(
                entries
                    .into_iter()
                    .map(|(key, value)| (key, ConditionSpec::from(value)))
                    .collect(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    use super::*;

    #[multiplatform_test]
    fn from_json_keeps_mapping_order() {
        let spec = ConditionSpec::from(json!({"b": 1, "a": [2, 3], "c": null}));

        match spec {
            ConditionSpec::Map(entries) => {
                assert_eq!(entries.keys().collect::<Vec<_>>(), vec!["b", "a", "c"]);
                assert!(matches!(entries["b"], ConditionSpec::Value(SqlValue::Int(1))));
                assert!(matches!(&entries["a"], ConditionSpec::List(items) if items.len() == 2));
                assert!(matches!(entries["c"], ConditionSpec::Null));
            }
            other => panic!("Expected a mapping, got {other:?}"),
        }
    }

    #[multiplatform_test]
    fn empty_specs() {
        assert!(ConditionSpec::Null.is_empty());
        assert!(ConditionSpec::from("").is_empty());
        assert!(ConditionSpec::from(json!([])).is_empty());
        assert!(ConditionSpec::from(json!({})).is_empty());
        assert!(!ConditionSpec::from(json!({"a": 1})).is_empty());
        assert!(!ConditionSpec::raw("1=1").is_empty());
    }

    #[multiplatform_test]
    fn conditions_are_not_values() {
        let condition = Condition::from(crate::Conjunction::and(Vec::<ConditionSpec>::new()));
        let error = Operand::from_spec("=", condition.into()).unwrap_err();
        assert!(matches!(error, ConditionError::InvalidOperand { .. }));
    }

    #[multiplatform_test]
    fn scalar_slots_reject_lists() {
        let error = Operand::scalar_from_spec("BETWEEN", json!([1, 2]).into()).unwrap_err();
        assert!(matches!(error, ConditionError::InvalidOperand { .. }));
    }
}
