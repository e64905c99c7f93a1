// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! The condition tree. Each node kind lives in its own module along with its constructor (which
//! validates operands when parsing the operator format) and its builder.

use std::fmt::{Display, Formatter};

use crate::{BuildContext, ConditionBuilder, ConditionError, ConditionSpec};

pub mod between;
pub mod between_columns;
pub mod conjunction;
pub mod exists;
pub mod hash;
pub mod in_condition;
pub mod like;
pub mod not;
pub mod simple;

pub use between::Between;
pub use between_columns::BetweenColumns;
pub use conjunction::Conjunction;
pub use exists::Exists;
pub use hash::Hash;
pub use in_condition::In;
pub use like::{Like, LikeEscaping, LikeOperator};
pub use not::Not;
pub use simple::Simple;

/// A node of the condition tree. Nodes are immutable once constructed.
#[derive(Debug, Clone)]
pub enum Condition {
    Hash(Hash),
    Simple(Simple),
    In(In),
    Between(Between),
    BetweenColumns(BetweenColumns),
    Like(Like),
    Not(Not),
    Conjunction(Conjunction),
    Exists(Exists),
}

impl Condition {
    pub fn kind(&self) -> &'static str {
        match self {
            Condition::Hash(_) => "hash",
            Condition::Simple(_) => "simple",
            Condition::In(_) => "in",
            Condition::Between(_) => "between",
            Condition::BetweenColumns(_) => "between-columns",
            Condition::Like(_) => "like",
            Condition::Not(_) => "not",
            Condition::Conjunction(_) => "conjunction",
            Condition::Exists(_) => "exists",
        }
    }
}

impl ConditionBuilder for Condition {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        match self {
            Condition::Hash(condition) => condition.build(context),
            Condition::Simple(condition) => condition.build(context),
            Condition::In(condition) => condition.build(context),
            Condition::Between(condition) => condition.build(context),
            Condition::BetweenColumns(condition) => condition.build(context),
            Condition::Like(condition) => condition.build(context),
            Condition::Not(condition) => condition.build(context),
            Condition::Conjunction(condition) => condition.build(context),
            Condition::Exists(condition) => condition.build(context),
        }
    }
}

macro_rules! impl_into_condition {
    ($($variant:ident),+) => {
        $(
            impl From<$variant> for Condition {
                fn from(condition: $variant) -> Self {
                    Condition::$variant(condition)
                }
            }

            impl From<$variant> for ConditionSpec {
                fn from(condition: $variant) -> Self {
                    ConditionSpec::from(Condition::$variant(condition))
                }
            }
        )+
    };
}

impl_into_condition!(
    Hash,
    Simple,
    In,
    Between,
    BetweenColumns,
    Like,
    Not,
    Conjunction,
    Exists
);

/// The boolean operator joining several clauses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Junction {
    And,
    Or,
}

impl Junction {
    pub fn as_str(&self) -> &'static str {
        match self {
            Junction::And => "AND",
            Junction::Or => "OR",
        }
    }
}

impl Display for Junction {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An operator with a plain and a negated form (`IN`/`NOT IN`, `EXISTS`/`NOT EXISTS`, ...).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Polarity {
    pub negated: bool,
}

impl Polarity {
    /// Parse `<base>` or `NOT <base>` (the operator is expected to be normalized already).
    pub(crate) fn parse(operator: &str, base: &str) -> Result<Self, ConditionError> {
        if operator == base {
            Ok(Polarity { negated: false })
        } else if operator.strip_prefix("NOT ") == Some(base) {
            Ok(Polarity { negated: true })
        } else {
            Err(ConditionError::UnknownOperator(operator.to_string()))
        }
    }

    pub(crate) fn render(&self, base: &str) -> String {
        if self.negated {
            format!("NOT {base}")
        } else {
            base.to_string()
        }
    }

    /// The result of a membership test against an empty set: always false, or vacuously true.
    pub(crate) fn empty_set(&self) -> String {
        if self.negated {
            String::new()
        } else {
            "0=1".to_string()
        }
    }
}

/// Uppercase an operator token and collapse inner whitespace, so that `not  in` and `NOT IN`
/// are the same operator.
pub(crate) fn normalize_operator(operator: &str) -> String {
    operator
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_uppercase()
}

/// Destructure the operands of an operator with a fixed arity.
pub(crate) fn expect_operands<const N: usize>(
    operator: &str,
    operands: Vec<ConditionSpec>,
) -> Result<[ConditionSpec; N], ConditionError> {
    let actual = operands.len();
    <[ConditionSpec; N]>::try_from(operands)
        .map_err(|_| ConditionError::arity(operator, N, actual))
}

/// Join rendered clauses, parenthesizing each when there are more than one. Empty clauses must
/// have been removed already.
pub(crate) fn join_clauses(mut clauses: Vec<String>, junction: Junction) -> String {
    match clauses.len() {
        0 => String::new(),
        1 => clauses.remove(0),
        _ => clauses
            .iter()
            .map(|clause| format!("({clause})"))
            .collect::<Vec<_>>()
            .join(&format!(" {junction} ")),
    }
}
