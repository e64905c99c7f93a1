// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use crate::{BuildContext, ConditionBuilder, ConditionError, ConditionSpec, Subquery};

use super::{Condition, Polarity, expect_operands, normalize_operator};

/// `[NOT] EXISTS (<subquery>)`
#[derive(Debug, Clone)]
pub struct Exists {
    polarity: Polarity,
    subquery: Arc<dyn Subquery>,
}

impl Exists {
    pub fn new(operator: &str, subquery: Arc<dyn Subquery>) -> Result<Self, ConditionError> {
        let polarity = Polarity::parse(&normalize_operator(operator), "EXISTS")?;
        Ok(Self { polarity, subquery })
    }

    /// Build from the operator format: `[EXISTS, <subquery>]`.
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let [subquery] = expect_operands(operator, operands)?;

        match subquery {
            ConditionSpec::Subquery(subquery) => {
                Exists::new(operator, subquery).map(Condition::Exists)
            }
            other => Err(ConditionError::invalid_operand(
                operator,
                format!("expected a sub-query, got {}", other.describe()),
            )),
        }
    }
}

impl ConditionBuilder for Exists {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let sql = self.subquery.build(context)?;
        Ok(format!("{} ({sql})", self.polarity.render("EXISTS")))
    }
}

#[cfg(test)]
mod tests {
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    use crate::SubSelect;

    use super::*;

    fn orders() -> Arc<dyn Subquery> {
        Arc::new(
            SubSelect::new("orders")
                .column("id")
                .filter(json!({"status": "open"})),
        )
    }

    #[multiplatform_test]
    fn exists() {
        assert_binding!(
            Exists::new("EXISTS", orders()).unwrap().to_sql().unwrap(),
            "EXISTS (SELECT id FROM orders WHERE status=:p0)",
            "open"
        );
        assert_binding!(
            Exists::new("not exists", orders()).unwrap().to_sql().unwrap(),
            "NOT EXISTS (SELECT id FROM orders WHERE status=:p0)",
            "open"
        );
    }

    #[multiplatform_test]
    fn requires_subquery() {
        let error = Exists::from_operands("EXISTS", vec!["orders".into()]).unwrap_err();
        insta::assert_snapshot!(error, @"Invalid operand for 'EXISTS': expected a sub-query, got a text value");

        let error = Exists::from_operands("EXISTS", vec![]).unwrap_err();
        assert_eq!(error, ConditionError::arity("EXISTS", 1, 0));
    }
}
