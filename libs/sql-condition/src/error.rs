// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use thiserror::Error;

/// Errors raised while turning a condition specification into SQL. All of them are fatal to the
/// compilation: no partial SQL is ever returned.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConditionError {
    #[error("Operator '{operator}' expects {expected} operand(s), but got {actual}")]
    ArityMismatch {
        operator: String,
        expected: String,
        actual: usize,
    },

    #[error("Unknown operator '{0}'")]
    UnknownOperator(String),

    #[error("Unsupported condition shape: {0}")]
    UnsupportedConditionShape(String),

    #[error("Invalid operand for '{operator}': {message}")]
    InvalidOperand { operator: String, message: String },

    #[error("Invalid parameter name '{0}': numeric names are reserved for positional placeholders")]
    InvalidParameterName(String),

    #[error("{0}: {1}")]
    WithContext(String, #[source] Box<ConditionError>),
}

impl ConditionError {
    pub(crate) fn arity(operator: &str, expected: impl ToString, actual: usize) -> Self {
        ConditionError::ArityMismatch {
            operator: operator.to_string(),
            expected: expected.to_string(),
            actual,
        }
    }

    pub(crate) fn invalid_operand(operator: &str, message: impl Into<String>) -> Self {
        ConditionError::InvalidOperand {
            operator: operator.to_string(),
            message: message.into(),
        }
    }

    pub fn with_context(self, context: String) -> ConditionError {
        ConditionError::WithContext(context, Box::new(self))
    }

    /// The underlying error, with all context layers stripped.
    pub fn root(&self) -> &ConditionError {
        match self {
            ConditionError::WithContext(_, source) => source.root(),
            _ => self,
        }
    }
}

pub trait WithContext {
    fn with_context(self, context: String) -> Self;
}

impl<T> WithContext for Result<T, ConditionError> {
    fn with_context(self, context: String) -> Result<T, ConditionError> {
        self.map_err(|e| e.with_context(context))
    }
}

/// Errors in the compiler configuration (see [`crate::CompilerOptions::from_env`]).
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error(
        "Invalid value for {key}: {value}. Expected true, 1, yes, on, enabled, enable OR false, 0, no, off, disabled, disable"
    )]
    InvalidBoolean { key: String, value: String },

    #[error("Invalid env value {env_value} for {env_key}: {message}")]
    InvalidEnum {
        env_key: &'static str,
        env_value: String,
        message: String,
    },
}
