// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{BuildContext, ConditionBuilder, ConditionError, ConditionSpec, WithContext};

use super::{Condition, Junction, join_clauses, normalize_operator};

/// `AND` / `OR` over any number of nested specifications. Nested specifications that compile to
/// nothing are skipped.
#[derive(Debug, Clone)]
pub struct Conjunction {
    operator: Junction,
    expressions: Vec<ConditionSpec>,
}

impl Conjunction {
    pub fn and(expressions: impl IntoIterator<Item = impl Into<ConditionSpec>>) -> Self {
        Self::with_junction(Junction::And, expressions)
    }

    pub fn or(expressions: impl IntoIterator<Item = impl Into<ConditionSpec>>) -> Self {
        Self::with_junction(Junction::Or, expressions)
    }

    pub fn new(
        operator: &str,
        expressions: impl IntoIterator<Item = impl Into<ConditionSpec>>,
    ) -> Result<Self, ConditionError> {
        let junction = match normalize_operator(operator).as_str() {
            "AND" => Junction::And,
            "OR" => Junction::Or,
            other => return Err(ConditionError::UnknownOperator(other.to_string())),
        };

        Ok(Self::with_junction(junction, expressions))
    }

    fn with_junction(
        operator: Junction,
        expressions: impl IntoIterator<Item = impl Into<ConditionSpec>>,
    ) -> Self {
        Self {
            operator,
            expressions: expressions.into_iter().map(Into::into).collect(),
        }
    }

    /// Build from the operator format: `[AND, <spec>, <spec>, ...]` (any number of operands).
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        Conjunction::new(operator, operands).map(Condition::Conjunction)
    }

    pub fn operator(&self) -> Junction {
        self.operator
    }
}

impl ConditionBuilder for Conjunction {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let mut clauses = Vec::with_capacity(self.expressions.len());

        for (index, expression) in self.expressions.iter().enumerate() {
            let clause = context
                .compile(expression)
                .with_context(format!("operand {} of {}", index + 1, self.operator))?;

            if !clause.is_empty() {
                clauses.push(clause);
            }
        }

        Ok(join_clauses(clauses, self.operator))
    }
}
