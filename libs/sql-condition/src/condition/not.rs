// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use tracing::debug;

use crate::{BuildContext, ConditionBuilder, ConditionError, ConditionSpec, WithContext};

use super::{Condition, expect_operands};

/// Negation of a nested specification.
#[derive(Debug, Clone)]
pub struct Not {
    inner: Box<ConditionSpec>,
}

impl Not {
    pub fn new(inner: impl Into<ConditionSpec>) -> Self {
        Self {
            inner: Box::new(inner.into()),
        }
    }

    /// Build from the operator format: `[NOT, <specification>]`.
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let [inner] = expect_operands(operator, operands)?;
        Ok(Condition::Not(Not::new(inner)))
    }
}

impl ConditionBuilder for Not {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let inner = context
            .compile(&self.inner)
            .with_context("operand of NOT".to_string())?;

        if inner.is_empty() {
            // The negation of "no constraint" is dropped rather than turned into "always false"
            debug!("NOT over an empty condition, dropping the negation");
            return Ok(String::new());
        }

        Ok(format!("NOT ({inner})"))
    }
}

#[cfg(test)]
mod tests {
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    use crate::Hash;

    use super::*;

    #[multiplatform_test]
    fn negates_nested_spec() {
        let condition = Not::new(json!({"status": "archived"}));
        assert_binding!(
            condition.to_sql().unwrap(),
            "NOT (status=:p0)",
            "archived"
        );

        let condition = Not::new(json!(["IN", "id", [1, 2]]));
        assert_binding!(condition.to_sql().unwrap(), "NOT (id IN (:p0, :p1))", 1, 2);
    }

    #[test_log::test]
    fn empty_inner() {
        assert_binding!(Not::new(json!({})).to_sql().unwrap(), "");
        assert_binding!(Not::new(json!(null)).to_sql().unwrap(), "");
        assert_binding!(
            Not::new(Hash::new(Vec::<(String, i64)>::new()).unwrap())
                .to_sql()
                .unwrap(),
            ""
        );
    }

    #[multiplatform_test]
    fn error_context() {
        let error = Not::new(json!(["FOO", "a", 1])).to_sql().unwrap_err();
        assert_eq!(error.root(), &ConditionError::UnknownOperator("FOO".to_string()));
        insta::assert_snapshot!(error, @"operand of NOT: Unknown operator 'FOO'");
    }

    #[multiplatform_test]
    fn enforces_arity() {
        let error = Not::from_operands("NOT", vec![]).unwrap_err();
        assert_eq!(error, ConditionError::arity("NOT", 1, 0));
    }
}
