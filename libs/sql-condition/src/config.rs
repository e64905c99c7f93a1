// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::collections::HashMap;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::{ConfigError, PlaceholderStyle, QuoteStyle};

pub const PLACEHOLDER_STYLE_KEY: &str = "SQL_CONDITION_PLACEHOLDER";
pub const PLACEHOLDER_PREFIX_KEY: &str = "SQL_CONDITION_PLACEHOLDER_PREFIX";
pub const QUOTE_STYLE_KEY: &str = "SQL_CONDITION_QUOTE_STYLE";
pub const LIKE_ESCAPE_CHAR_KEY: &str = "SQL_CONDITION_LIKE_ESCAPE_CHAR";
pub const ESCAPE_LIKE_VALUES_KEY: &str = "SQL_CONDITION_ESCAPE_LIKE_VALUES";

/// Source of configuration values.
pub trait Environment: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn enabled(&self, key: &str, default_value: bool) -> Result<bool, ConfigError> {
        match self.get(key) {
            Some(value) => match value.to_lowercase().as_str() {
                "true" | "1" | "yes" | "on" | "enabled" | "enable" => Ok(true),
                "false" | "0" | "no" | "off" | "disabled" | "disable" => Ok(false),
                _ => Err(ConfigError::InvalidBoolean {
                    key: key.to_string(),
                    value,
                }),
            },
            None => Ok(default_value),
        }
    }
}

pub struct SystemEnvironment;

impl Environment for SystemEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }
}

#[derive(Clone, Default)]
pub struct MapEnvironment {
    values: HashMap<String, String>,
}

impl Environment for MapEnvironment {
    fn get(&self, key: &str) -> Option<String> {
        self.values.get(key).cloned()
    }
}

impl<const N: usize> From<[(&str, &str); N]> for MapEnvironment {
    fn from(values: [(&str, &str); N]) -> Self {
        Self {
            values: HashMap::from_iter(
                values
                    .into_iter()
                    .map(|(k, v)| (k.to_string(), v.to_string())),
            ),
        }
    }
}

impl MapEnvironment {
    pub fn new() -> Self {
        Self::default()
    }
}

/// Options that shape the generated SQL.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompilerOptions {
    pub placeholder: PlaceholderStyle,
    pub quote_style: QuoteStyle,
    /// When set, every LIKE clause carries `ESCAPE '<char>'`
    pub like_escape_character: Option<char>,
    /// Apply the default escape mapping to LIKE values of nodes that don't specify their own
    /// escaping
    pub escape_like_values: bool,
    /// Characters of LIKE values that are replaced before the value is wrapped in `%...%`. When
    /// unset, the mapping is derived from the escape character (see
    /// [`CompilerOptions::effective_like_escaping`]).
    pub like_escaping: Option<IndexMap<char, String>>,
}

impl Default for CompilerOptions {
    fn default() -> Self {
        Self {
            placeholder: PlaceholderStyle::default(),
            quote_style: QuoteStyle::default(),
            like_escape_character: None,
            escape_like_values: true,
            like_escaping: None,
        }
    }
}

/// The mapping that escapes the LIKE wildcards and the escape character itself with `escape`.
pub fn default_like_escaping(escape: char) -> IndexMap<char, String> {
    IndexMap::from([
        ('%', format!("{escape}%")),
        ('_', format!("{escape}_")),
        (escape, format!("{escape}{escape}")),
    ])
}

impl CompilerOptions {
    /// The escape mapping applied to LIKE values: the explicit `like_escaping` if set, otherwise
    /// one built for `like_escape_character` (`\` when no character is configured, which is what
    /// LIKE assumes without an ESCAPE clause).
    pub fn effective_like_escaping(&self) -> IndexMap<char, String> {
        match &self.like_escaping {
            Some(escaping) => escaping.clone(),
            None => default_like_escaping(self.like_escape_character.unwrap_or('\\')),
        }
    }

    /// Read the options from the environment, falling back to the defaults for missing keys.
    pub fn from_env(env: &dyn Environment) -> Result<Self, ConfigError> {
        let defaults = Self::default();

        let prefix = env.get(PLACEHOLDER_PREFIX_KEY);
        if let Some(prefix) = &prefix {
            let valid = prefix.starts_with(|c: char| c.is_ascii_alphabetic() || c == '_')
                && prefix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_');
            if !valid {
                return Err(ConfigError::InvalidEnum {
                    env_key: PLACEHOLDER_PREFIX_KEY,
                    env_value: prefix.clone(),
                    message: "Expected letters, digits, and underscores, not starting with a digit"
                        .to_string(),
                });
            }
        }

        let placeholder = match env.get(PLACEHOLDER_STYLE_KEY) {
            Some(style) => match style.to_lowercase().as_str() {
                "named" => PlaceholderStyle::Named {
                    prefix: prefix.unwrap_or_else(|| "p".to_string()),
                },
                "positional" => PlaceholderStyle::Positional,
                _ => {
                    return Err(ConfigError::InvalidEnum {
                        env_key: PLACEHOLDER_STYLE_KEY,
                        env_value: style,
                        message: "Expected one of 'named' or 'positional'".to_string(),
                    });
                }
            },
            None => match prefix {
                Some(prefix) => PlaceholderStyle::Named { prefix },
                None => defaults.placeholder,
            },
        };

        let quote_style = match env.get(QUOTE_STYLE_KEY) {
            Some(style) => match style.to_lowercase().as_str() {
                "none" => QuoteStyle::None,
                "double" => QuoteStyle::Double,
                "backtick" => QuoteStyle::Backtick,
                _ => {
                    return Err(ConfigError::InvalidEnum {
                        env_key: QUOTE_STYLE_KEY,
                        env_value: style,
                        message: "Expected one of 'none', 'double', or 'backtick'".to_string(),
                    });
                }
            },
            None => defaults.quote_style,
        };

        let like_escape_character = match env.get(LIKE_ESCAPE_CHAR_KEY) {
            Some(value) => {
                let mut chars = value.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Some(c),
                    _ => {
                        return Err(ConfigError::InvalidEnum {
                            env_key: LIKE_ESCAPE_CHAR_KEY,
                            env_value: value,
                            message: "Expected a single character".to_string(),
                        });
                    }
                }
            }
            None => defaults.like_escape_character,
        };

        let escape_like_values = env.enabled(ESCAPE_LIKE_VALUES_KEY, defaults.escape_like_values)?;

        Ok(Self {
            placeholder,
            quote_style,
            like_escape_character,
            escape_like_values,
            like_escaping: defaults.like_escaping,
        })
    }
}

#[cfg(test)]
mod tests {
    use multiplatform_test::multiplatform_test;

    use super::*;

    #[multiplatform_test]
    fn defaults_without_env() {
        let options = CompilerOptions::from_env(&MapEnvironment::new()).unwrap();
        assert_eq!(options, CompilerOptions::default());
    }

    #[test]
    fn reads_process_env() {
        // The test process doesn't set any of these keys
        let options = CompilerOptions::from_env(&SystemEnvironment).unwrap();
        assert_eq!(options, CompilerOptions::default());
    }

    #[multiplatform_test]
    fn reads_env() {
        let env = MapEnvironment::from([
            (PLACEHOLDER_STYLE_KEY, "Positional"),
            (QUOTE_STYLE_KEY, "double"),
            (LIKE_ESCAPE_CHAR_KEY, "!"),
            (ESCAPE_LIKE_VALUES_KEY, "off"),
        ]);
        let options = CompilerOptions::from_env(&env).unwrap();

        assert_eq!(options.placeholder, PlaceholderStyle::Positional);
        assert_eq!(options.quote_style, QuoteStyle::Double);
        assert_eq!(options.like_escape_character, Some('!'));
        assert!(!options.escape_like_values);
    }

    #[multiplatform_test]
    fn prefix_implies_named() {
        let env = MapEnvironment::from([(PLACEHOLDER_PREFIX_KEY, "qp")]);
        let options = CompilerOptions::from_env(&env).unwrap();

        assert_eq!(
            options.placeholder,
            PlaceholderStyle::Named {
                prefix: "qp".to_string()
            }
        );
    }

    #[multiplatform_test]
    fn rejects_invalid_values() {
        let env = MapEnvironment::from([(QUOTE_STYLE_KEY, "brackets")]);
        assert!(matches!(
            CompilerOptions::from_env(&env),
            Err(ConfigError::InvalidEnum {
                env_key: QUOTE_STYLE_KEY,
                ..
            })
        ));

        let env = MapEnvironment::from([(LIKE_ESCAPE_CHAR_KEY, "!!")]);
        assert!(CompilerOptions::from_env(&env).is_err());

        let env = MapEnvironment::from([(PLACEHOLDER_PREFIX_KEY, "p; DROP")]);
        assert!(CompilerOptions::from_env(&env).is_err());

        let env = MapEnvironment::from([(PLACEHOLDER_PREFIX_KEY, "1")]);
        assert!(CompilerOptions::from_env(&env).is_err());

        let env = MapEnvironment::from([(ESCAPE_LIKE_VALUES_KEY, "maybe")]);
        assert!(matches!(
            CompilerOptions::from_env(&env),
            Err(ConfigError::InvalidBoolean { .. })
        ));
    }

    #[multiplatform_test]
    fn deserializes_partial_options() {
        let options: CompilerOptions = serde_json::from_str(
            r#"{"placeholder": {"style": "positional"}, "quote_style": "backtick"}"#,
        )
        .unwrap();

        assert_eq!(options.placeholder, PlaceholderStyle::Positional);
        assert_eq!(options.quote_style, QuoteStyle::Backtick);
        assert_eq!(options.like_escaping, None);
        assert_eq!(
            options.effective_like_escaping(),
            IndexMap::from([
                ('%', r"\%".to_string()),
                ('_', r"\_".to_string()),
                ('\\', r"\\".to_string()),
            ])
        );
    }

    #[multiplatform_test]
    fn escaping_follows_escape_character() {
        let env = MapEnvironment::from([(LIKE_ESCAPE_CHAR_KEY, "!")]);
        let options = CompilerOptions::from_env(&env).unwrap();

        assert_eq!(
            options.effective_like_escaping(),
            IndexMap::from([
                ('%', "!%".to_string()),
                ('_', "!_".to_string()),
                ('!', "!!".to_string()),
            ])
        );

        let explicit = IndexMap::from([('%', "#%".to_string())]);
        let options = CompilerOptions {
            like_escaping: Some(explicit.clone()),
            ..options
        };
        assert_eq!(options.effective_like_escaping(), explicit);
    }
}
