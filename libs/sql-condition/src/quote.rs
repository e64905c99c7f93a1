// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use serde::{Deserialize, Serialize};

/// Quotes identifiers (column and table names) for a particular SQL dialect.
///
/// Names that already contain a `(` are treated as expressions and never reach the quoter (see
/// [`crate::BuildContext::column_name`]).
pub trait IdentifierQuoter: Send + Sync {
    fn quote_column(&self, name: &str) -> String;

    fn quote_table(&self, name: &str) -> String {
        self.quote_column(name)
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStyle {
    /// Emit names as given
    #[default]
    None,
    /// `"schema"."table"` (Postgres, SQLite)
    Double,
    /// `` `schema`.`table` `` (MySQL)
    Backtick,
}

impl IdentifierQuoter for QuoteStyle {
    fn quote_column(&self, name: &str) -> String {
        match self {
            QuoteStyle::None => name.to_string(),
            QuoteStyle::Double => quote_parts(name, '"'),
            QuoteStyle::Backtick => quote_parts(name, '`'),
        }
    }
}

/// Quote each dot-separated part of a name. `*` and parts that are already quoted are left alone;
/// embedded quote characters are doubled.
fn quote_parts(name: &str, quote: char) -> String {
    name.split('.')
        .map(|part| {
            let already_quoted =
                part.len() >= 2 && part.starts_with(quote) && part.ends_with(quote);

            if part == "*" || already_quoted {
                part.to_string()
            } else {
                let escaped = part.replace(quote, &format!("{quote}{quote}"));
                format!("{quote}{escaped}{quote}")
            }
        })
        .collect::<Vec<_>>()
        .join(".")
}
