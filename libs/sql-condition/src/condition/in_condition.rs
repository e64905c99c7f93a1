// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use tracing::trace;

use crate::{
    BuildContext, Column, ConditionBuilder, ConditionError, ConditionSpec, Operand, Subquery,
};

use super::{Condition, Polarity, expect_operands, normalize_operator};

/// Set membership (`IN` / `NOT IN`) over a single column or a tuple of columns.
#[derive(Debug, Clone)]
pub struct In {
    polarity: Polarity,
    columns: Vec<Column>,
    values: Operand,
}

impl In {
    pub fn new(
        column: impl Into<Column>,
        operator: &str,
        values: impl Into<Operand>,
    ) -> Result<Self, ConditionError> {
        Self::composite([column], operator, values)
    }

    /// Membership of a tuple of columns. Each value is a row: either a mapping keyed by column
    /// name or a list in column order. An empty list of columns is allowed (and short-circuits).
    pub fn composite<C: Into<Column>>(
        columns: impl IntoIterator<Item = C>,
        operator: &str,
        values: impl Into<Operand>,
    ) -> Result<Self, ConditionError> {
        let operator = normalize_operator(operator);
        let polarity = Polarity::parse(&operator, "IN")?;
        let columns = columns.into_iter().map(Into::into).collect::<Vec<_>>();

        if columns.iter().any(|column| matches!(column, Column::Subquery(_))) {
            return Err(ConditionError::invalid_operand(
                &operator,
                "a sub-query cannot be used as the column of IN",
            ));
        }

        Ok(Self::with_polarity(columns, polarity, values.into()))
    }

    pub(crate) fn with_polarity(columns: Vec<Column>, polarity: Polarity, values: Operand) -> Self {
        Self {
            polarity,
            columns,
            values,
        }
    }

    /// Build from the operator format: `[IN, <column or list of columns>, <values or sub-query>]`.
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let [columns, values] = expect_operands(operator, operands)?;

        let columns = match columns {
            ConditionSpec::List(columns) => columns
                .into_iter()
                .map(|column| Column::from_spec(operator, column))
                .collect::<Result<Vec<_>, _>>()?,
            column => vec![Column::from_spec(operator, column)?],
        };
        let values = Operand::from_spec(operator, values)?;

        In::composite(columns, operator, values).map(Condition::In)
    }

    fn operator(&self) -> String {
        self.polarity.render("IN")
    }

    fn build_subquery(
        &self,
        subquery: &Arc<dyn Subquery>,
        context: &mut BuildContext<'_>,
    ) -> Result<String, ConditionError> {
        let columns = self.build_columns(context)?;
        let sql = subquery.build(context)?;

        Ok(format!("{columns} {} ({sql})", self.operator()))
    }

    fn build_columns(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        match self.columns.as_slice() {
            [column] => context.build_column(column),
            columns => {
                let columns = columns
                    .iter()
                    .map(|column| context.build_column(column))
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(format!("({})", columns.join(", ")))
            }
        }
    }

    /// `(c1, c2) IN ((p1, p2), (p3, p4))`. Missing entries are rendered as a literal NULL.
    fn build_composite(
        &self,
        rows: &[&Operand],
        context: &mut BuildContext<'_>,
    ) -> Result<String, ConditionError> {
        let operator = self.operator();
        let columns = self.build_columns(context)?;

        let mut tuples = Vec::with_capacity(rows.len());
        for row in rows {
            let mut elements = Vec::with_capacity(self.columns.len());

            for (index, column) in self.columns.iter().enumerate() {
                let entry = match row {
                    Operand::Row(entries) => column.row_key().and_then(|key| entries.get(key)),
                    Operand::List(entries) => entries.get(index),
                    other => {
                        return Err(ConditionError::invalid_operand(
                            &operator,
                            format!(
                                "composite IN expects each value to be a row, got {}",
                                other.describe()
                            ),
                        ));
                    }
                };

                let element = match entry {
                    None | Some(Operand::Null) => "NULL".to_string(),
                    Some(value) => context.build_scalar(&operator, value)?,
                };
                elements.push(element);
            }

            tuples.push(format!("({})", elements.join(", ")));
        }

        Ok(format!("{columns} {operator} ({})", tuples.join(", ")))
    }

    /// Bind each member. Nulls cannot take part in `IN (...)`, so they turn into a separate
    /// `IS [NOT] NULL` test.
    ///
    /// A single bound member collapses to `col = :p0` (`col <> :p0` for NOT IN), exactly what
    /// `["=", "col", value]` produces, rather than the compact `col=:p0` of a scalar hash entry.
    fn build_single(
        &self,
        column: &Column,
        rows: &[&Operand],
        context: &mut BuildContext<'_>,
    ) -> Result<String, ConditionError> {
        let operator = self.operator();
        let rendered_column = context.build_column(column)?;

        let mut placeholders = Vec::with_capacity(rows.len());
        let mut has_null = false;

        for row in rows {
            let value = match row {
                Operand::Row(entries) => column.row_key().and_then(|key| entries.get(key)),
                other => Some(*other),
            };

            match value {
                None | Some(Operand::Null) => has_null = true,
                Some(value @ (Operand::Value(_) | Operand::Raw(_))) => {
                    placeholders.push(context.build_scalar(&operator, value)?)
                }
                Some(value) => {
                    return Err(ConditionError::invalid_operand(
                        &operator,
                        format!("expected a single value, got {}", value.describe()),
                    ));
                }
            }
        }

        let membership = match placeholders.as_slice() {
            [] => None,
            [placeholder] => {
                let operator = if self.polarity.negated { "<>" } else { "=" };
                Some(format!("{rendered_column} {operator} {placeholder}"))
            }
            placeholders => Some(format!(
                "{rendered_column} {operator} ({})",
                placeholders.join(", ")
            )),
        };

        let null_test = has_null.then(|| {
            if self.polarity.negated {
                format!("{rendered_column} IS NOT NULL")
            } else {
                format!("{rendered_column} IS NULL")
            }
        });

        Ok(match (membership, null_test) {
            (Some(membership), Some(null_test)) => {
                let junction = if self.polarity.negated { "AND" } else { "OR" };
                format!("({membership} {junction} {null_test})")
            }
            (Some(clause), None) | (None, Some(clause)) => clause,
            (None, None) => self.polarity.empty_set(),
        })
    }
}

impl ConditionBuilder for In {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        if self.columns.is_empty() {
            trace!("IN without columns, short-circuiting");
            return Ok(self.polarity.empty_set());
        }

        if let Operand::Subquery(subquery) = &self.values {
            return self.build_subquery(subquery, context);
        }

        let rows = self.values.members();
        if rows.is_empty() {
            trace!("IN over an empty set, short-circuiting");
            return Ok(self.polarity.empty_set());
        }

        match self.columns.as_slice() {
            [column] => self.build_single(column, &rows, context),
            _ => self.build_composite(&rows, context),
        }
    }
}
