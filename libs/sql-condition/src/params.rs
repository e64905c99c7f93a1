// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use tokio_postgres::types::ToSql;

use crate::{ConditionError, SqlValue};

/// How placeholders are named and rendered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "style", rename_all = "lowercase")]
pub enum PlaceholderStyle {
    /// `:p0`, `:p1`, ... (the parameter names are `p0`, `p1`, ...)
    Named { prefix: String },
    /// `$1`, `$2`, ... as expected by Postgres (the parameter names are `1`, `2`, ...)
    Positional,
}

impl Default for PlaceholderStyle {
    fn default() -> Self {
        PlaceholderStyle::Named {
            prefix: "p".to_string(),
        }
    }
}

impl PlaceholderStyle {
    fn name(&self, ordinal: usize) -> String {
        match self {
            PlaceholderStyle::Named { prefix } => format!("{prefix}{ordinal}"),
            PlaceholderStyle::Positional => (ordinal + 1).to_string(),
        }
    }

    fn render(&self, name: &str) -> String {
        match self {
            PlaceholderStyle::Named { .. } => format!(":{name}"),
            PlaceholderStyle::Positional => format!("${name}"),
        }
    }
}

/// The parameter sink: an ordered, append-only mapping from placeholder names to bound values.
///
/// A fresh instance is created for each top-level compilation and is handed over to the caller
/// along with the SQL text. The order of entries is the order in which values were bound, which
/// makes it safe to pass [`Parameters::as_pg_params`] to a driver that expects positional
/// parameters.
///
/// The sink doesn't know how its placeholders are rendered; that is up to the compiler binding
/// into it (see [`crate::CompilerOptions::placeholder`]).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Parameters {
    values: IndexMap<String, SqlValue>,
}

impl Parameters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Bind a value to a new, unique placeholder and return the placeholder as it must appear in
    /// the SQL text.
    ///
    /// Positional placeholders are numbered by the value's position in the sink, so `$n` always
    /// refers to the n-th entry of [`Parameters::as_pg_params`].
    pub fn bind(&mut self, style: &PlaceholderStyle, value: SqlValue) -> String {
        let mut ordinal = self.values.len();
        let mut name = style.name(ordinal);
        // Names inserted through `insert` may collide with generated named placeholders (never
        // with positional ones, since `insert` rejects numeric names)
        while self.values.contains_key(&name) {
            ordinal += 1;
            name = style.name(ordinal);
        }

        let placeholder = style.render(&name);
        self.values.insert(name, value);
        placeholder
    }

    /// Insert a value under an explicit name (without the `:` sigil). Returns the previous value
    /// if the name was already bound. Numeric names are reserved for positional placeholders.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        value: SqlValue,
    ) -> Result<Option<SqlValue>, ConditionError> {
        let name = name.into();
        if name.is_empty() || name.chars().all(|c| c.is_ascii_digit()) {
            return Err(ConditionError::InvalidParameterName(name));
        }

        Ok(self.values.insert(name, value))
    }

    pub fn get(&self, name: &str) -> Option<&SqlValue> {
        self.values.get(name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &SqlValue)> {
        self.values.iter().map(|(name, value)| (name.as_str(), value))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &SqlValue> {
        self.values.values()
    }

    /// The bound values in binding order, in the form expected by `tokio_postgres`.
    pub fn as_pg_params(&self) -> Vec<&(dyn ToSql + Sync)> {
        self.values
            .values()
            .map(|value| value as &(dyn ToSql + Sync))
            .collect()
    }

    pub fn into_inner(self) -> IndexMap<String, SqlValue> {
        self.values
    }
}

impl<'a> IntoIterator for &'a Parameters {
    type Item = (&'a String, &'a SqlValue);
    type IntoIter = indexmap::map::Iter<'a, String, SqlValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}

#[cfg(test)]
mod tests {
    use multiplatform_test::multiplatform_test;

    use super::*;

    #[multiplatform_test]
    fn named_placeholders() {
        let style = PlaceholderStyle::default();
        let mut params = Parameters::new();
        assert_eq!(params.bind(&style, SqlValue::from(1)), ":p0");
        assert_eq!(params.bind(&style, SqlValue::from("a")), ":p1");

        assert_eq!(params.names().collect::<Vec<_>>(), vec!["p0", "p1"]);
        assert_eq!(params.get("p1"), Some(&SqlValue::from("a")));
    }

    #[multiplatform_test]
    fn positional_placeholders() {
        let mut params = Parameters::new();
        assert_eq!(params.bind(&PlaceholderStyle::Positional, SqlValue::from(1)), "$1");
        assert_eq!(params.bind(&PlaceholderStyle::Positional, SqlValue::from(2)), "$2");
        assert_eq!(params.as_pg_params().len(), 2);
    }

    #[multiplatform_test]
    fn skips_explicitly_inserted_names() {
        let style = PlaceholderStyle::default();
        let mut params = Parameters::new();
        params.insert("p0", SqlValue::from("taken")).unwrap();

        assert_eq!(params.bind(&style, SqlValue::from(1)), ":p1");
        assert_eq!(params.bind(&style, SqlValue::from(2)), ":p2");
        assert_eq!(params.len(), 3);
    }

    #[multiplatform_test]
    fn positional_numbers_follow_sink_order() {
        let mut params = Parameters::new();
        params.insert("tenant", SqlValue::from(9)).unwrap();

        assert_eq!(params.bind(&PlaceholderStyle::Positional, SqlValue::from(1)), "$2");
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["tenant", "2"]);

        assert_eq!(
            params.insert("2", SqlValue::from(3)),
            Err(ConditionError::InvalidParameterName("2".to_string()))
        );
        assert!(params.insert("", SqlValue::from(3)).is_err());
        assert_eq!(params.get("2"), Some(&SqlValue::from(1)));
    }
}
