// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use crate::{
    Column, CompilerOptions, ConditionError, ConditionSpec, IdentifierQuoter, Operand,
    OperatorRegistry, Parameters, SqlValue, parser,
};

#[cfg(test)]
use crate::QuoteStyle;

/// A trait for condition nodes that can render themselves into an SQL fragment.
///
/// Each node kind implements this trait; nested specifications are compiled through
/// [`BuildContext::compile`], so that a node may contain any other kind of condition. An empty
/// fragment means "no constraint".
pub trait ConditionBuilder {
    /// Build the SQL fragment, binding values into the context's parameters
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError>;

    /// Build the SQL fragment with default options and return it along with the bound parameters.
    /// This is useful for testing, where we want to assert on the generated SQL without setting up
    /// a [`crate::Compiler`].
    #[cfg(test)]
    fn to_sql(&self) -> Result<(String, Parameters), ConditionError>
    where
        Self: Sized,
    {
        let options = CompilerOptions::default();
        let registry = OperatorRegistry::default();
        let mut params = Parameters::new();

        let sql = {
            let mut context =
                BuildContext::new(&mut params, &QuoteStyle::None, &options, &registry);
            self.build(&mut context)?
        };

        Ok((sql, params))
    }
}

impl<T> ConditionBuilder for Box<T>
where
    T: ConditionBuilder,
{
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        self.as_ref().build(context)
    }
}

impl<T> ConditionBuilder for &T
where
    T: ConditionBuilder,
{
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        (**self).build(context)
    }
}

/// Everything a builder needs while rendering: the parameter sink (exclusively borrowed for the
/// duration of a compilation), the identifier quoter, the options, and the operator registry for
/// nested specifications.
pub struct BuildContext<'a> {
    params: &'a mut Parameters,
    quoter: &'a dyn IdentifierQuoter,
    options: &'a CompilerOptions,
    registry: &'a OperatorRegistry,
}

impl<'a> BuildContext<'a> {
    pub fn new(
        params: &'a mut Parameters,
        quoter: &'a dyn IdentifierQuoter,
        options: &'a CompilerOptions,
        registry: &'a OperatorRegistry,
    ) -> Self {
        Self {
            params,
            quoter,
            options,
            registry,
        }
    }

    /// Compile a nested specification (of any format) into an SQL fragment.
    pub fn compile(&mut self, spec: &ConditionSpec) -> Result<String, ConditionError> {
        parser::build_spec(spec, self)
    }

    /// Bind a value and return its placeholder, rendered in the configured placeholder style.
    pub fn bind(&mut self, value: SqlValue) -> String {
        self.params.bind(&self.options.placeholder, value)
    }

    pub fn params(&self) -> &Parameters {
        &*self.params
    }

    pub fn options(&self) -> &'a CompilerOptions {
        self.options
    }

    pub(crate) fn registry(&self) -> &'a OperatorRegistry {
        self.registry
    }

    /// Quote a column name, unless it is already an expression (such as a function call).
    pub fn column_name(&self, name: &str) -> String {
        if name.contains('(') {
            name.to_string()
        } else {
            self.quoter.quote_column(name)
        }
    }

    pub fn table_name(&self, name: &str) -> String {
        if name.contains('(') {
            name.to_string()
        } else {
            self.quoter.quote_table(name)
        }
    }

    pub(crate) fn build_column(&mut self, column: &Column) -> Result<String, ConditionError> {
        match column {
            Column::Name(name) => Ok(self.column_name(name)),
            Column::Raw(raw) => Ok(raw.to_string()),
            Column::Subquery(subquery) => Ok(format!("({})", subquery.build(self)?)),
        }
    }

    /// Render a scalar operand: NULL is emitted literally, raw expressions verbatim, sub-queries
    /// parenthesized, and everything else is bound.
    pub(crate) fn build_scalar(
        &mut self,
        operator: &str,
        operand: &Operand,
    ) -> Result<String, ConditionError> {
        match operand {
            Operand::Null => Ok("NULL".to_string()),
            Operand::Value(value) => Ok(self.bind(value.clone())),
            Operand::Raw(raw) => Ok(raw.to_string()),
            Operand::Subquery(subquery) => Ok(format!("({})", subquery.build(self)?)),
            Operand::List(_) | Operand::Row(_) => Err(ConditionError::invalid_operand(
                operator,
                format!("expected a single value, got {}", operand.describe()),
            )),
        }
    }
}
