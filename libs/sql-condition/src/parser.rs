// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The format dispatcher: decides which input surface a specification uses and turns it into a
//! condition node.

use std::collections::HashMap;
use std::fmt::{Debug, Formatter};

use tracing::trace;

use crate::{
    Between, BuildContext, Condition, ConditionBuilder, ConditionError, ConditionSpec,
    Conjunction, Exists, Hash, In, Like, Not, Simple, SqlValue, condition::normalize_operator,
};

/// Constructs a node from the operands of an operator-format specification. The first argument is
/// the normalized operator token.
pub type ConditionConstructor =
    fn(&str, Vec<ConditionSpec>) -> Result<Condition, ConditionError>;

/// Maps operator tokens to node constructors. Tokens not in the registry fall back to a
/// [`Simple`] comparison, provided they look like a comparison operator.
#[derive(Clone)]
pub struct OperatorRegistry {
    constructors: HashMap<String, ConditionConstructor>,
}

impl OperatorRegistry {
    /// A registry without any operator (only [`Simple`] comparisons are recognized).
    pub fn empty() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    pub fn register(&mut self, operator: &str, constructor: ConditionConstructor) {
        self.constructors
            .insert(normalize_operator(operator), constructor);
    }

    pub fn get(&self, operator: &str) -> Option<ConditionConstructor> {
        self.constructors.get(&normalize_operator(operator)).copied()
    }

    /// Construct the node for an operator-format specification.
    pub fn parse(
        &self,
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let operator = normalize_operator(operator);

        let condition = match self.constructors.get(&operator) {
            Some(constructor) => constructor(&operator, operands),
            None if Simple::is_comparison_operator(&operator) => {
                Simple::from_operands(&operator, operands)
            }
            None => Err(ConditionError::UnknownOperator(operator.clone())),
        }?;

        trace!(operator = %operator, kind = condition.kind(), "Parsed operator format");
        Ok(condition)
    }
}

impl Default for OperatorRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();

        registry.register("AND", Conjunction::from_operands);
        registry.register("OR", Conjunction::from_operands);
        registry.register("NOT", Not::from_operands);
        registry.register("IN", In::from_operands);
        registry.register("NOT IN", In::from_operands);
        registry.register("BETWEEN", Between::from_operands);
        registry.register("NOT BETWEEN", Between::from_operands);
        for operator in [
            "LIKE",
            "NOT LIKE",
            "OR LIKE",
            "OR NOT LIKE",
            "ILIKE",
            "NOT ILIKE",
            "OR ILIKE",
            "OR NOT ILIKE",
        ] {
            registry.register(operator, Like::from_operands);
        }
        registry.register("EXISTS", Exists::from_operands);
        registry.register("NOT EXISTS", Exists::from_operands);

        registry
    }
}

impl Debug for OperatorRegistry {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let mut operators = self.constructors.keys().collect::<Vec<_>>();
        operators.sort();
        f.debug_struct("OperatorRegistry")
            .field("operators", &operators)
            .finish()
    }
}

/// Compile a specification of any format.
pub(crate) fn build_spec(
    spec: &ConditionSpec,
    context: &mut BuildContext<'_>,
) -> Result<String, ConditionError> {
    if spec.is_empty() {
        return Ok(String::new());
    }

    match spec {
        ConditionSpec::Condition(condition) => condition.build(context),
        ConditionSpec::Raw(raw) => Ok(raw.to_string()),
        ConditionSpec::List(items) => match items.split_first() {
            Some((ConditionSpec::Value(SqlValue::Text(operator)), operands)) => {
                let condition = context.registry().parse(operator, operands.to_vec())?;
                condition.build(context)
            }
            Some((first, _)) => Err(ConditionError::UnsupportedConditionShape(format!(
                "expected an operator as the first element of a list, got {}",
                first.describe()
            ))),
            None => Ok(String::new()),
        },
        ConditionSpec::Map(entries) => Hash::from_map(entries.clone())?.build(context),
        other => Err(ConditionError::UnsupportedConditionShape(format!(
            "{} is not a condition",
            other.describe()
        ))),
    }
}
