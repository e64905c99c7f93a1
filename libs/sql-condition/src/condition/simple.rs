// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    BuildContext, Column, ConditionBuilder, ConditionError, ConditionSpec, Operand,
};

use super::{Condition, expect_operands, normalize_operator};

/// Keyword operators accepted in addition to the symbolic ones.
const KEYWORD_OPERATORS: &[&str] = &[
    "IS",
    "IS NOT",
    "IS DISTINCT FROM",
    "IS NOT DISTINCT FROM",
    "SIMILAR TO",
    "NOT SIMILAR TO",
    "REGEXP",
    "NOT REGEXP",
    "RLIKE",
    "NOT RLIKE",
    "GLOB",
    "MATCH",
];

const OPERATOR_SYMBOLS: &str = "=<>!~@#&|^?-+*/%";

/// `<column> <operator> <value>` for any binary comparison operator.
#[derive(Debug, Clone)]
pub struct Simple {
    operator: String,
    column: Column,
    value: Operand,
}

impl Simple {
    pub fn new(
        column: impl Into<Column>,
        operator: &str,
        value: impl Into<Operand>,
    ) -> Result<Self, ConditionError> {
        let operator = normalize_operator(operator);
        if !Self::is_comparison_operator(&operator) {
            return Err(ConditionError::UnknownOperator(operator));
        }

        let value = value.into();
        value.ensure_scalar(&operator)?;

        Ok(Self {
            operator,
            column: column.into(),
            value,
        })
    }

    /// Build from the operator format: `[<operator>, <column>, <value>]`.
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let [column, value] = expect_operands(operator, operands)?;
        let column = Column::from_spec(operator, column)?;
        let value = Operand::scalar_from_spec(operator, value)?;

        Simple::new(column, operator, value).map(Condition::Simple)
    }

    /// Whether the (normalized) operator may be rendered as a binary comparison. Since the
    /// operator is emitted verbatim, anything outside of this set is rejected.
    pub fn is_comparison_operator(operator: &str) -> bool {
        let symbolic = !operator.is_empty()
            && operator.chars().all(|c| OPERATOR_SYMBOLS.contains(c))
            && !operator.contains("--")
            && !operator.contains("/*")
            && !operator.contains("*/");

        symbolic || KEYWORD_OPERATORS.contains(&operator)
    }

    pub fn operator(&self) -> &str {
        &self.operator
    }
}

impl ConditionBuilder for Simple {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let column = context.build_column(&self.column)?;
        let value = context.build_scalar(&self.operator, &self.value)?;

        Ok(format!("{column} {} {value}", self.operator))
    }
}
