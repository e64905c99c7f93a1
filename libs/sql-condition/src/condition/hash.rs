// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;

use crate::{BuildContext, Column, ConditionBuilder, ConditionError, ConditionSpec, Operand};

use super::{In, Junction, Polarity, join_clauses};

/// The hash format: a conjunction of per-column tests, in mapping order.
///
/// - a list or a sub-query becomes `<column> IN (...)`
/// - null becomes `<column> IS NULL`
/// - a raw expression becomes `<column>=<expression>`
/// - any other value is bound: `<column>=<placeholder>`
#[derive(Debug, Clone, Default)]
pub struct Hash {
    entries: IndexMap<String, Operand>,
}

impl Hash {
    pub fn new<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Result<Self, ConditionError>
    where
        K: Into<String>,
        V: Into<Operand>,
    {
        let entries = entries
            .into_iter()
            .map(|(column, value)| (column.into(), value.into()))
            .collect::<IndexMap<String, Operand>>();

        for (column, value) in &entries {
            if let Operand::Row(_) = value {
                return Err(ConditionError::invalid_operand(
                    column,
                    "a mapping cannot be compared to a column",
                ));
            }
        }

        Ok(Self { entries })
    }

    pub(crate) fn from_map(map: IndexMap<String, ConditionSpec>) -> Result<Self, ConditionError> {
        let entries = map
            .into_iter()
            .map(|(column, value)| {
                let value = Operand::from_spec(&column, value)?;
                Ok((column, value))
            })
            .collect::<Result<Vec<_>, ConditionError>>()?;

        Self::new(entries)
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl ConditionBuilder for Hash {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let mut clauses = Vec::with_capacity(self.entries.len());

        for (column, value) in &self.entries {
            let clause = match value {
                Operand::List(_) | Operand::Subquery(_) => In::with_polarity(
                    vec![Column::Name(column.clone())],
                    Polarity { negated: false },
                    value.clone(),
                )
                .build(context)?,
                Operand::Null => format!("{} IS NULL", context.column_name(column)),
                Operand::Raw(raw) => format!("{}={raw}", context.column_name(column)),
                Operand::Value(value) => {
                    let column = context.column_name(column);
                    let placeholder = context.bind(value.clone());
                    format!("{column}={placeholder}")
                }
                Operand::Row(_) => {
                    return Err(ConditionError::invalid_operand(
                        column,
                        "a mapping cannot be compared to a column",
                    ));
                }
            };

            clauses.push(clause);
        }

        Ok(join_clauses(clauses, Junction::And))
    }
}
