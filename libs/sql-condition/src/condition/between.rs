// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{BuildContext, Column, ConditionBuilder, ConditionError, ConditionSpec, Operand};

use super::{Condition, Polarity, expect_operands, normalize_operator};

/// `<column> [NOT] BETWEEN <start> AND <end>`
#[derive(Debug, Clone)]
pub struct Between {
    polarity: Polarity,
    column: Column,
    start: Operand,
    end: Operand,
}

impl Between {
    pub fn new(
        column: impl Into<Column>,
        operator: &str,
        start: impl Into<Operand>,
        end: impl Into<Operand>,
    ) -> Result<Self, ConditionError> {
        let operator = normalize_operator(operator);
        let polarity = Polarity::parse(&operator, "BETWEEN")?;

        let start = start.into();
        let end = end.into();
        start.ensure_scalar(&operator)?;
        end.ensure_scalar(&operator)?;

        Ok(Self {
            polarity,
            column: column.into(),
            start,
            end,
        })
    }

    /// Build from the operator format: `[BETWEEN, <column>, <start>, <end>]`.
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let [column, start, end] = expect_operands(operator, operands)?;

        let column = Column::from_spec(operator, column)?;
        let start = Operand::scalar_from_spec(operator, start)?;
        let end = Operand::scalar_from_spec(operator, end)?;

        Between::new(column, operator, start, end).map(Condition::Between)
    }
}

impl ConditionBuilder for Between {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let operator = self.polarity.render("BETWEEN");

        let column = context.build_column(&self.column)?;
        let start = context.build_scalar(&operator, &self.start)?;
        let end = context.build_scalar(&operator, &self.end)?;

        Ok(format!("{column} {operator} {start} AND {end}"))
    }
}
