// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use indexmap::IndexMap;
use tracing::trace;

use crate::{
    BuildContext, Column, ConditionBuilder, ConditionError, ConditionSpec, Operand, SqlValue,
};

use super::{Condition, Junction, normalize_operator};

/// A LIKE operator token, decomposed: `[AND|OR] [NOT] LIKE|ILIKE`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LikeOperator {
    /// Joins the clauses when there are several values
    pub junction: Junction,
    pub negated: bool,
    pub case_insensitive: bool,
}

impl LikeOperator {
    pub fn parse(operator: &str) -> Result<Self, ConditionError> {
        let normalized = normalize_operator(operator);
        let unknown = || ConditionError::UnknownOperator(normalized.clone());

        let (junction, rest) = if let Some(rest) = normalized.strip_prefix("OR ") {
            (Junction::Or, rest)
        } else if let Some(rest) = normalized.strip_prefix("AND ") {
            (Junction::And, rest)
        } else {
            (Junction::And, normalized.as_str())
        };

        let (negated, core) = match rest.strip_prefix("NOT ") {
            Some(core) => (true, core),
            None => (false, rest),
        };

        let case_insensitive = match core {
            "LIKE" => false,
            "ILIKE" => true,
            _ => return Err(unknown()),
        };

        Ok(Self {
            junction,
            negated,
            case_insensitive,
        })
    }

    /// The operator of each clause, without the junction.
    pub fn core(&self) -> String {
        let like = if self.case_insensitive { "ILIKE" } else { "LIKE" };
        if self.negated {
            format!("NOT {like}")
        } else {
            like.to_string()
        }
    }
}

/// How LIKE values are escaped before being wrapped in `%...%`.
#[derive(Debug, Clone, Default, PartialEq)]
pub enum LikeEscaping {
    /// Use the compiler's escape mapping (if escaping of LIKE values is enabled)
    #[default]
    Default,
    /// Bind values as given: no escaping and no wrapping
    Disabled,
    /// Replace each listed character with its replacement
    Custom(IndexMap<char, String>),
}

impl LikeEscaping {
    fn from_spec(operator: &str, spec: ConditionSpec) -> Result<Self, ConditionError> {
        match spec {
            ConditionSpec::Null => Ok(LikeEscaping::Default),
            ConditionSpec::Value(SqlValue::Bool(false)) => Ok(LikeEscaping::Disabled),
            ConditionSpec::Map(entries) => entries
                .into_iter()
                .map(|(key, replacement)| {
                    let mut chars = key.chars();
                    let character = match (chars.next(), chars.next()) {
                        (Some(character), None) => character,
                        _ => {
                            return Err(ConditionError::invalid_operand(
                                operator,
                                format!("escape mapping keys must be single characters, got '{key}'"),
                            ));
                        }
                    };

                    match replacement {
                        ConditionSpec::Value(SqlValue::Text(replacement)) => {
                            Ok((character, replacement))
                        }
                        other => Err(ConditionError::invalid_operand(
                            operator,
                            format!("escape replacements must be text, got {}", other.describe()),
                        )),
                    }
                })
                .collect::<Result<IndexMap<_, _>, _>>()
                .map(LikeEscaping::Custom),
            other => Err(ConditionError::invalid_operand(
                operator,
                format!(
                    "expected an escape mapping or false, got {}",
                    other.describe()
                ),
            )),
        }
    }
}

/// Pattern matching of a column against one or more values. Each value becomes its own
/// `<column> [NOT] LIKE <pattern>` clause, joined by the operator's junction.
#[derive(Debug, Clone)]
pub struct Like {
    operator: LikeOperator,
    column: Column,
    values: Operand,
    escaping: LikeEscaping,
}

impl Like {
    pub fn new(
        column: impl Into<Column>,
        operator: &str,
        values: impl Into<Operand>,
    ) -> Result<Self, ConditionError> {
        let parsed = LikeOperator::parse(operator)?;
        let values = values.into();

        for value in values.members() {
            Self::validate_value(operator, value)?;
        }

        Ok(Self {
            operator: parsed,
            column: column.into(),
            values,
            escaping: LikeEscaping::Default,
        })
    }

    pub fn with_escaping(mut self, escaping: LikeEscaping) -> Self {
        self.escaping = escaping;
        self
    }

    /// Build from the operator format: `[LIKE, <column>, <value(s)>]` or
    /// `[LIKE, <column>, <value(s)>, <escape mapping or false>]`.
    pub fn from_operands(
        operator: &str,
        operands: Vec<ConditionSpec>,
    ) -> Result<Condition, ConditionError> {
        let actual = operands.len();
        let mut operands = operands.into_iter();

        let (column, values, escaping) = match (
            operands.next(),
            operands.next(),
            operands.next(),
            operands.next(),
        ) {
            (Some(column), Some(values), escaping, None) => (column, values, escaping),
            _ => return Err(ConditionError::arity(operator, "2 or 3", actual)),
        };

        let column = Column::from_spec(operator, column)?;
        let values = Operand::from_spec(operator, values)?;
        let escaping = match escaping {
            Some(escaping) => LikeEscaping::from_spec(operator, escaping)?,
            None => LikeEscaping::Default,
        };

        Like::new(column, operator, values)
            .map(|like| like.with_escaping(escaping))
            .map(Condition::Like)
    }

    pub fn operator(&self) -> &LikeOperator {
        &self.operator
    }

    fn validate_value(operator: &str, value: &Operand) -> Result<(), ConditionError> {
        match value {
            Operand::Value(value) if value.as_pattern_text().is_none() => {
                Err(ConditionError::invalid_operand(
                    operator,
                    format!("a {} value cannot be used as a pattern", value.type_name()),
                ))
            }
            Operand::Value(_) | Operand::Raw(_) | Operand::Subquery(_) => Ok(()),
            Operand::Null | Operand::List(_) | Operand::Row(_) => {
                Err(ConditionError::invalid_operand(
                    operator,
                    format!("{} cannot be used as a pattern", value.describe()),
                ))
            }
        }
    }
}

fn escape(value: &str, escaping: &IndexMap<char, String>) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match escaping.get(&c) {
            Some(replacement) => escaped.push_str(replacement),
            None => escaped.push(c),
        }
    }
    escaped
}

impl ConditionBuilder for Like {
    fn build(&self, context: &mut BuildContext<'_>) -> Result<String, ConditionError> {
        let members = self.values.members();
        if members.is_empty() {
            trace!("LIKE over an empty set, short-circuiting");
            return Ok(if self.operator.negated {
                String::new()
            } else {
                "0=1".to_string()
            });
        }

        let core = self.operator.core();
        let options = context.options();

        // The default mapping escapes with the same character the ESCAPE clause declares
        let default_escaping;
        let escaping = match &self.escaping {
            LikeEscaping::Default if options.escape_like_values => {
                default_escaping = options.effective_like_escaping();
                Some(&default_escaping)
            }
            LikeEscaping::Default | LikeEscaping::Disabled => None,
            LikeEscaping::Custom(escaping) => Some(escaping),
        };

        let escape_clause = match options.like_escape_character {
            Some('\'') => " ESCAPE ''''".to_string(),
            Some(c) => format!(" ESCAPE '{c}'"),
            None => String::new(),
        };

        let column = context.build_column(&self.column)?;

        let mut clauses = Vec::with_capacity(members.len());
        for member in members {
            let pattern = match member {
                Operand::Value(value) => {
                    let text = value.as_pattern_text().ok_or_else(|| {
                        ConditionError::invalid_operand(
                            &core,
                            format!("a {} value cannot be used as a pattern", value.type_name()),
                        )
                    })?;
                    let text = match escaping {
                        Some(escaping) => format!("%{}%", escape(&text, escaping)),
                        None => text,
                    };
                    context.bind(SqlValue::Text(text))
                }
                Operand::Raw(raw) => raw.to_string(),
                Operand::Subquery(subquery) => format!("({})", subquery.build(context)?),
                other => {
                    return Err(ConditionError::invalid_operand(
                        &core,
                        format!("{} cannot be used as a pattern", other.describe()),
                    ));
                }
            };

            clauses.push(format!("{column} {core} {pattern}{escape_clause}"));
        }

        Ok(clauses.join(&format!(" {} ", self.operator.junction)))
    }
}

#[cfg(test)]
mod tests {
    use multiplatform_test::multiplatform_test;
    use serde_json::json;

    use crate::{CompilerOptions, OperatorRegistry, Parameters, QuoteStyle, RawExpression};

    use super::*;

    fn build_with(
        condition: &Like,
        options: &CompilerOptions,
    ) -> Result<(String, Parameters), ConditionError> {
        let registry = OperatorRegistry::default();
        let mut params = Parameters::new();
        let sql = {
            let mut context = BuildContext::new(&mut params, &QuoteStyle::None, options, &registry);
            condition.build(&mut context)?
        };
        Ok((sql, params))
    }

    #[multiplatform_test]
    fn parses_operators() {
        assert_eq!(
            LikeOperator::parse("or not ilike").unwrap(),
            LikeOperator {
                junction: Junction::Or,
                negated: true,
                case_insensitive: true
            }
        );
        assert_eq!(LikeOperator::parse("NOT LIKE").unwrap().core(), "NOT LIKE");
        assert_eq!(LikeOperator::parse("LIKE").unwrap().junction, Junction::And);
        assert_eq!(
            LikeOperator::parse("SOUNDS LIKE").unwrap_err(),
            ConditionError::UnknownOperator("SOUNDS LIKE".to_string())
        );
    }

    #[multiplatform_test]
    fn escapes_and_wraps() {
        let condition = Like::new("name", "LIKE", "100%").unwrap();
        assert_binding!(condition.to_sql().unwrap(), "name LIKE :p0", r"%100\%%");

        let condition = Like::new("path", "LIKE", r"a_b\c").unwrap();
        assert_binding!(condition.to_sql().unwrap(), "path LIKE :p0", r"%a\_b\\c%");
    }

    #[multiplatform_test]
    fn several_values() {
        let condition = Like::new("name", "OR NOT LIKE", vec!["foo", "bar"]).unwrap();
        assert_binding!(
            condition.to_sql().unwrap(),
            "name NOT LIKE :p0 OR name NOT LIKE :p1",
            "%foo%",
            "%bar%"
        );

        let condition = Like::new("name", "ILIKE", vec!["a", "b"]).unwrap();
        assert_binding!(
            condition.to_sql().unwrap(),
            "name ILIKE :p0 AND name ILIKE :p1",
            "%a%",
            "%b%"
        );
    }

    #[multiplatform_test]
    fn raw_values_are_not_escaped() {
        let condition = Like::new(
            "name",
            "LIKE",
            vec![Operand::from("x"), RawExpression::new("CONCAT('%', nickname)").into()],
        )
        .unwrap();
        assert_binding!(
            condition.to_sql().unwrap(),
            "name LIKE :p0 AND name LIKE CONCAT('%', nickname)",
            "%x%"
        );
    }

    #[multiplatform_test]
    fn empty_values() {
        assert_binding!(
            Like::new("name", "LIKE", Vec::<String>::new()).unwrap().to_sql().unwrap(),
            "0=1"
        );
        assert_binding!(
            Like::new("name", "NOT LIKE", Vec::<String>::new()).unwrap().to_sql().unwrap(),
            ""
        );
    }

    #[multiplatform_test]
    fn escaping_modes() {
        let condition = Like::new("name", "LIKE", "50%")
            .unwrap()
            .with_escaping(LikeEscaping::Disabled);
        assert_binding!(condition.to_sql().unwrap(), "name LIKE :p0", "50%");

        let condition = Like::new("name", "LIKE", "a%b!")
            .unwrap()
            .with_escaping(LikeEscaping::Custom(IndexMap::from([
                ('%', "!%".to_string()),
                ('!', "!!".to_string()),
            ])));
        assert_binding!(condition.to_sql().unwrap(), "name LIKE :p0", "%a!%b!!%");

        let options = CompilerOptions {
            escape_like_values: false,
            ..CompilerOptions::default()
        };
        let condition = Like::new("name", "LIKE", "50%").unwrap();
        assert_binding!(build_with(&condition, &options).unwrap(), "name LIKE :p0", "50%");
    }

    #[multiplatform_test]
    fn escape_clause() {
        let condition = Like::new("name", "LIKE", "a").unwrap();

        let options = CompilerOptions {
            like_escape_character: Some('\\'),
            ..CompilerOptions::default()
        };
        assert_binding!(
            build_with(&condition, &options).unwrap(),
            r"name LIKE :p0 ESCAPE '\'",
            "%a%"
        );

        let options = CompilerOptions {
            like_escape_character: Some('\''),
            ..CompilerOptions::default()
        };
        assert_binding!(
            build_with(&condition, &options).unwrap(),
            "name LIKE :p0 ESCAPE ''''",
            "%a%"
        );
    }

    #[multiplatform_test]
    fn escapes_with_configured_character() {
        let options = CompilerOptions {
            like_escape_character: Some('!'),
            ..CompilerOptions::default()
        };

        let condition = Like::new("name", "LIKE", "100%!").unwrap();
        assert_binding!(
            build_with(&condition, &options).unwrap(),
            "name LIKE :p0 ESCAPE '!'",
            "%100!%!!%"
        );

        // A backslash is an ordinary character once another escape character is declared
        let condition = Like::new("path", "LIKE", r"a_b\c").unwrap();
        assert_binding!(
            build_with(&condition, &options).unwrap(),
            "path LIKE :p0 ESCAPE '!'",
            r"%a!_b\c%"
        );

        // An explicit mapping still wins
        let options = CompilerOptions {
            like_escaping: Some(IndexMap::from([('%', "#%".to_string())])),
            ..options
        };
        let condition = Like::new("name", "LIKE", "5%").unwrap();
        assert_binding!(
            build_with(&condition, &options).unwrap(),
            "name LIKE :p0 ESCAPE '!'",
            "%5#%%"
        );
    }

    #[multiplatform_test]
    fn numbers_are_patterns() {
        let condition = Like::new("code", "LIKE", 42).unwrap();
        assert_binding!(condition.to_sql().unwrap(), "code LIKE :p0", "%42%");

        assert!(matches!(
            Like::new("code", "LIKE", true).unwrap_err(),
            ConditionError::InvalidOperand { .. }
        ));
        assert!(matches!(
            Like::new("code", "LIKE", Operand::Null).unwrap_err(),
            ConditionError::InvalidOperand { .. }
        ));
    }

    #[multiplatform_test]
    fn from_operands() {
        let operands = |value: serde_json::Value| match ConditionSpec::from(value) {
            ConditionSpec::List(operands) => operands,
            other => panic!("Expected a list, got {other:?}"),
        };

        let condition = Like::from_operands("LIKE", operands(json!(["name", "50%", false]))).unwrap();
        assert_binding!(condition.to_sql().unwrap(), "name LIKE :p0", "50%");

        let condition =
            Like::from_operands("LIKE", operands(json!(["name", "a*", {"*": "\\*"}]))).unwrap();
        assert_binding!(condition.to_sql().unwrap(), "name LIKE :p0", r"%a\*%");

        assert_eq!(
            Like::from_operands("LIKE", operands(json!(["name"]))).unwrap_err(),
            ConditionError::arity("LIKE", "2 or 3", 1)
        );
        assert_eq!(
            Like::from_operands("LIKE", operands(json!(["name", "a", false, 1]))).unwrap_err(),
            ConditionError::arity("LIKE", "2 or 3", 4)
        );
        assert!(matches!(
            Like::from_operands("LIKE", operands(json!(["name", "a", {"ab": "x"}]))).unwrap_err(),
            ConditionError::InvalidOperand { .. }
        ));
    }
}
