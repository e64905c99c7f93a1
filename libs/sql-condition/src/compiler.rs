// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::sync::Arc;

use tracing::{debug, instrument};

use crate::{
    BuildContext, CompilerOptions, ConditionError, ConditionSpec, ConfigError, Environment,
    IdentifierQuoter, OperatorRegistry, Parameters,
};

/// The SQL fragment for a condition, along with the values bound to its placeholders.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledCondition {
    pub sql: String,
    pub params: Parameters,
}

impl CompiledCondition {
    /// An empty condition places no constraint (and should be left out of the `WHERE` clause).
    pub fn is_empty(&self) -> bool {
        self.sql.is_empty()
    }

    pub fn into_parts(self) -> (String, Parameters) {
        (self.sql, self.params)
    }
}

/// Compiles condition specifications into SQL fragments.
///
/// A compiler holds no per-compilation state: each call to [`Compiler::compile`] gets its own
/// parameter sink, so a single compiler may be shared across threads.
#[derive(Clone)]
pub struct Compiler {
    options: CompilerOptions,
    registry: OperatorRegistry,
    quoter: Arc<dyn IdentifierQuoter>,
}

impl Default for Compiler {
    fn default() -> Self {
        Self::new(CompilerOptions::default())
    }
}

impl Compiler {
    pub fn new(options: CompilerOptions) -> Self {
        let quoter: Arc<dyn IdentifierQuoter> = Arc::new(options.quote_style);

        Self {
            options,
            registry: OperatorRegistry::default(),
            quoter,
        }
    }

    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        Ok(Self::new(CompilerOptions::from_env(env)?))
    }

    /// Replace the quoter derived from [`CompilerOptions::quote_style`].
    pub fn with_quoter(mut self, quoter: impl IdentifierQuoter + 'static) -> Self {
        self.quoter = Arc::new(quoter);
        self
    }

    pub fn with_registry(mut self, registry: OperatorRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn registry_mut(&mut self) -> &mut OperatorRegistry {
        &mut self.registry
    }

    pub fn options(&self) -> &CompilerOptions {
        &self.options
    }

    #[instrument(name = "Compiler::compile", skip_all)]
    pub fn compile(
        &self,
        spec: impl Into<ConditionSpec>,
    ) -> Result<CompiledCondition, ConditionError> {
        let mut params = Parameters::new();
        let sql = self.compile_into(&spec.into(), &mut params)?;

        Ok(CompiledCondition { sql, params })
    }

    /// Compile into an existing parameter sink. Placeholder numbering continues after the
    /// entries already in the sink, so that several fragments of a statement can share it.
    /// Placeholders are rendered in this compiler's style regardless of how the sink was created.
    #[instrument(name = "Compiler::compile_into", skip_all)]
    pub fn compile_into(
        &self,
        spec: &ConditionSpec,
        params: &mut Parameters,
    ) -> Result<String, ConditionError> {
        let mut context =
            BuildContext::new(params, self.quoter.as_ref(), &self.options, &self.registry);
        let sql = context.compile(spec)?;

        debug!(sql = %sql, params = context.params().len(), "Compiled condition");
        Ok(sql)
    }
}

/// Compile with the default options: named placeholders and unquoted identifiers.
pub fn compile(spec: impl Into<ConditionSpec>) -> Result<CompiledCondition, ConditionError> {
    Compiler::default().compile(spec)
}

#[cfg(test)]
mod tests {
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    use crate::{
        MapEnvironment, PLACEHOLDER_STYLE_KEY, PlaceholderStyle, QUOTE_STYLE_KEY, QuoteStyle,
        SqlValue,
    };

    use super::*;

    struct Bracketed;

    impl IdentifierQuoter for Bracketed {
        fn quote_column(&self, name: &str) -> String {
            format!("[{name}]")
        }
    }

    #[multiplatform_test]
    fn compiles_with_defaults() {
        let compiled = compile(json!({"status": 1, "type": [1, 2]})).unwrap();

        assert_eq!(compiled.sql, "(status=:p0) AND (type IN (:p1, :p2))");
        assert_eq!(
            compiled.params.iter().collect::<Vec<_>>(),
            vec![
                ("p0", &SqlValue::Int(1)),
                ("p1", &SqlValue::Int(1)),
                ("p2", &SqlValue::Int(2))
            ]
        );
        assert!(!compiled.is_empty());
        assert!(compile(json!({})).unwrap().is_empty());
    }

    #[multiplatform_test]
    fn uses_env_options() {
        let env = MapEnvironment::from([
            (PLACEHOLDER_STYLE_KEY, "positional"),
            (QUOTE_STYLE_KEY, "double"),
        ]);
        let compiler = Compiler::from_env(&env).unwrap();
        assert_eq!(compiler.options().placeholder, PlaceholderStyle::Positional);
        assert_eq!(compiler.options().quote_style, QuoteStyle::Double);

        let (sql, params) = compiler
            .compile(json!(["BETWEEN", "age", 18, 65]))
            .unwrap()
            .into_parts();
        assert_eq!(sql, r#""age" BETWEEN $1 AND $2"#);
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[multiplatform_test]
    fn custom_quoter() {
        let compiler = Compiler::default().with_quoter(Bracketed);
        let compiled = compiler.compile(json!({"a": null})).unwrap();
        assert_eq!(compiled.sql, "[a] IS NULL");
    }

    #[multiplatform_test]
    fn continues_numbering() {
        let compiler = Compiler::default();
        let mut params = Parameters::new();

        let where_clause = compiler
            .compile_into(&json!({"a": 1}).into(), &mut params)
            .unwrap();
        let having_clause = compiler
            .compile_into(&json!([">", "COUNT(*)", 5]).into(), &mut params)
            .unwrap();

        assert_eq!(where_clause, "a=:p0");
        assert_eq!(having_clause, "COUNT(*) > :p1");
        assert_eq!(params.len(), 2);
    }

    #[multiplatform_test]
    fn compile_into_uses_compiler_placeholder_style() {
        let compiler = Compiler::new(CompilerOptions {
            placeholder: PlaceholderStyle::Positional,
            ..CompilerOptions::default()
        });
        let mut params = Parameters::new();

        let sql = compiler
            .compile_into(&json!({"a": 1}).into(), &mut params)
            .unwrap();
        let more = compiler
            .compile_into(&json!(["<", "b", 2]).into(), &mut params)
            .unwrap();

        assert_eq!(sql, "a=$1");
        assert_eq!(more, "b < $2");
        assert_eq!(params.names().collect::<Vec<_>>(), vec!["1", "2"]);
    }

    #[multiplatform_test]
    fn extends_registry() {
        let mut compiler = Compiler::default();
        compiler
            .registry_mut()
            .register("HAS KEY", |_, operands| {
                crate::Simple::from_operands("?", operands)
            });

        let compiled = compiler.compile(json!(["has key", "attrs", "color"])).unwrap();
        assert_eq!(compiled.sql, "attrs ? :p0");

        let compiler = Compiler::default().with_registry(OperatorRegistry::empty());
        assert!(compiler.compile(json!(["IN", "a", [1]])).is_err());
    }
}
