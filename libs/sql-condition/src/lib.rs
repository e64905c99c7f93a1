// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

//! A compiler from declarative condition specifications to parameterized SQL `WHERE` fragments.
//!
//! Conditions are described either in the *hash format*, a mapping of column names to values
//! (`{"status": 1, "type": [1, 2]}`), or in the *operator format*, a list whose first element is
//! an operator token (`["BETWEEN", "age", 18, 65]`). The two can be nested freely inside
//! conjunctions and negations, and mixed with [Condition] nodes built through typed constructors
//! ([In::new], [Like::new], [Conjunction::and], ...).
//!
//! The [Compiler] turns such a specification into a [CompiledCondition]: an SQL fragment where
//! every value is replaced by a placeholder, along with the [Parameters] bound to those
//! placeholders. Values never appear in the SQL text; only column names (quoted according to the
//! configured [QuoteStyle]), operator keywords, and [RawExpression]s do.
//!
//! For example, `{"status": 1, "type": [1, 2]}` compiles to
//! `(status=:p0) AND (type IN (:p1, :p2))` with parameters `p0 = 1, p1 = 1, p2 = 2`.

#[macro_use]
mod test_util;

mod builder;
mod compiler;
pub mod condition;
mod config;
mod error;
mod expression;
mod params;
mod parser;
mod quote;
mod spec;
mod value;

pub use builder::{BuildContext, ConditionBuilder};
pub use compiler::{CompiledCondition, Compiler, compile};
pub use condition::{
    Between, BetweenColumns, Condition, Conjunction, Exists, Hash, In, Junction, Like,
    LikeEscaping, LikeOperator, Not, Simple,
};
pub use config::{
    CompilerOptions, ESCAPE_LIKE_VALUES_KEY, Environment, LIKE_ESCAPE_CHAR_KEY, MapEnvironment,
    PLACEHOLDER_PREFIX_KEY, PLACEHOLDER_STYLE_KEY, QUOTE_STYLE_KEY, SystemEnvironment,
    default_like_escaping,
};
pub use error::{ConditionError, ConfigError, WithContext};
pub use expression::{RawExpression, SubSelect, Subquery};
pub use params::{Parameters, PlaceholderStyle};
pub use parser::{ConditionConstructor, OperatorRegistry};
pub use quote::{IdentifierQuoter, QuoteStyle};
pub use spec::{Column, ConditionSpec, Operand};
pub use value::SqlValue;
