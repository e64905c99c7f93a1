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

/// `<value> [NOT] BETWEEN <start column> AND <end column>`: the value is bound, the bounds are
/// column references.
#[derive(Debug, Clone)]
pub struct BetweenColumns {
    polarity: Polarity,
    value: Operand,
    start: Column,
    end: Column,
}

impl BetweenColumns {
    pub fn new(
        value: impl Into<Operand>,
        operator: &str,
        start: impl Into<Column>,
        end: impl Into<Column>,
    ) -> Result<Self, ConditionError> {
        let operator = normalize_operator(operator);
        let polarity = Polarity::parse(&operator, "BETWEEN")?;

        let value = value.into();
        value.ensure_scalar(&operator)?;

        Ok(Self {
            polarity,
            value,
            start: start.into(),
            end: end.into(),
        })
    }

    /// Build from `[<value>, <start column>, <end column>]`, with `operator` being `BETWEEN` or
    /// `NOT BETWEEN`. Not registered under a token of its own (`BETWEEN` takes a column first), so
    /// it is only reachable through a custom registration or the typed constructor.
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let [value, start, end] = expect_operands(operator, operands)?;

        let value = Operand::scalar_from_spec(operator, value)?;
        let start = Column::from_spec(operator, start)?;
        let end = Column::from_spec(operator, end)?;

        BetweenColumns::new(value, operator, start, end).map(Condition::BetweenColumns)
    }
}

impl ConditionBuilder for BetweenColumns {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let operator = self.polarity.render("BETWEEN");

        let value = context.build_scalar(&operator, &self.value)?;
        let start = context.build_column(&self.start)?;
        let end = context.build_column(&self.end)?;

        Ok(format!("{value} {operator} {start} AND {end}"))
    }
}
