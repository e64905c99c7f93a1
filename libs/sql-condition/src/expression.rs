// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Debug, Display, Formatter};

use crate::{BuildContext, ConditionError, ConditionSpec};

/// A fragment of SQL that is trusted as-is. It is never escaped, quoted, or bound as a parameter,
/// so it must never be constructed from user input.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RawExpression(String);

impl RawExpression {
    pub fn new(sql: impl Into<String>) -> Self {
        Self(sql.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Display for RawExpression {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// A query that can be embedded in a condition (`IN (<subquery>)`, `EXISTS (<subquery>)`, etc.).
///
/// The query is owned by the caller; the compiler only asks it to render itself. Implementations
/// must bind their values through the given context so that they interleave correctly with the
/// values of the surrounding condition. The returned SQL must not be parenthesized; the caller
/// does that.
pub trait Subquery: Debug + Send + Sync {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError>;
}

/// A minimal `SELECT <columns> FROM <table> [WHERE <condition>]` sub-query. The condition is
/// compiled with the same compiler (and the same parameter sink) as the enclosing condition.
#[derive(Debug, Clone)]
pub struct SubSelect {
    table: String,
    columns: Vec<String>,
    condition: Option<ConditionSpec>,
}

impl SubSelect {
    pub fn new(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            columns: vec![],
            condition: None,
        }
    }

    pub fn column(mut self, column: impl Into<String>) -> Self {
        self.columns.push(column.into());
        self
    }

    pub fn filter(mut self, condition: impl Into<ConditionSpec>) -> Self {
        self.condition = Some(condition.into());
        self
    }
}

impl Subquery for SubSelect {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let columns = if self.columns.is_empty() {
            "*".to_string()
        } else {
            self.columns
                .iter()
                .map(|column| context.column_name(column))
                .collect::<Vec<_>>()
                .join(", ")
        };

        let mut sql = format!("SELECT {columns} FROM {}", context.table_name(&self.table));

        if let Some(condition) = &self.condition {
            let where_clause = context.compile(condition)?;
            if !where_clause.is_empty() {
                sql.push_str(" WHERE ");
                sql.push_str(&where_clause);
            }
        }

        Ok(sql)
    }
}
