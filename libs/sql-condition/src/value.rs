// Copyright Exograph, Inc. All rights reserved.
//
// Use of this software is governed by the Business Source License
// included in the LICENSE file at the root of this repository.
//
// As of the Change Date specified in that file, in accordance with
// the Business Source License, use of this software will be governed
// by the Apache License, Version 2.0.

use std::fmt::{Display, Formatter};

use bytes::BytesMut;
use tokio_postgres::types::{IsNull, ToSql, Type, to_sql_checked};

/// A value bound to a placeholder. This is the only kind of value that ends up in the parameter
/// list; everything else (columns, raw expressions, NULL) is rendered into the SQL text itself.
///
/// Note that there is no `Null` variant: NULL is always emitted as a literal, so that we don't
/// depend on how a particular driver binds an untyped null.
#[derive(Debug, Clone, PartialEq)]
pub enum SqlValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
    Bytes(Vec<u8>),
    Json(serde_json::Value),
}

impl SqlValue {
    /// The textual form used as a LIKE pattern. Only text and numbers have a meaningful one.
    pub(crate) fn as_pattern_text(&self) -> Option<String> {
        match self {
            SqlValue::Text(value) => Some(value.clone()),
            SqlValue::Int(value) => Some(value.to_string()),
            SqlValue::Float(value) => Some(value.to_string()),
            SqlValue::Bool(_) | SqlValue::Bytes(_) | SqlValue::Json(_) => None,
        }
    }

    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            SqlValue::Bool(_) => "boolean",
            SqlValue::Int(_) => "integer",
            SqlValue::Float(_) => "float",
            SqlValue::Text(_) => "text",
            SqlValue::Bytes(_) => "bytes",
            SqlValue::Json(_) => "json",
        }
    }
}

impl Display for SqlValue {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            SqlValue::Bool(value) => value.fmt(f),
            SqlValue::Int(value) => value.fmt(f),
            SqlValue::Float(value) => value.fmt(f),
            SqlValue::Text(value) => value.fmt(f),
            SqlValue::Bytes(value) => write!(f, "<{} bytes>", value.len()),
            SqlValue::Json(value) => value.fmt(f),
        }
    }
}

impl ToSql for SqlValue {
    fn to_sql(
        &self,
        ty: &Type,
        out: &mut BytesMut,
    ) -> Result<IsNull, Box<dyn std::error::Error + Sync + Send>> {
        match self {
            SqlValue::Bool(value) => value.to_sql_checked(ty, out),
            // Integers are kept as i64 until we know the width of the target column
            SqlValue::Int(value) => match *ty {
                Type::INT2 => i16::try_from(*value)?.to_sql_checked(ty, out),
                Type::INT4 => i32::try_from(*value)?.to_sql_checked(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            SqlValue::Float(value) => match *ty {
                Type::FLOAT4 => (*value as f32).to_sql_checked(ty, out),
                _ => value.to_sql_checked(ty, out),
            },
            SqlValue::Text(value) => value.to_sql_checked(ty, out),
            SqlValue::Bytes(value) => value.as_slice().to_sql_checked(ty, out),
            SqlValue::Json(value) => value.to_sql_checked(ty, out),
        }
    }

    fn accepts(_ty: &Type) -> bool {
        // Each variant checks against the actual type in `to_sql`
        true
    }

    to_sql_checked!();
}

impl From<bool> for SqlValue {
    fn from(value: bool) -> Self {
        SqlValue::Bool(value)
    }
}

impl From<i32> for SqlValue {
    fn from(value: i32) -> Self {
        SqlValue::Int(value as i64)
    }
}

impl From<i64> for SqlValue {
    fn from(value: i64) -> Self {
        SqlValue::Int(value)
    }
}

impl From<f64> for SqlValue {
    fn from(value: f64) -> Self {
        SqlValue::Float(value)
    }
}

impl From<&str> for SqlValue {
    fn from(value: &str) -> Self {
        SqlValue::Text(value.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(value: String) -> Self {
        SqlValue::Text(value)
    }
}

impl From<Vec<u8>> for SqlValue {
    fn from(value: Vec<u8>) -> Self {
        SqlValue::Bytes(value)
    }
}

impl From<serde_json::Value> for SqlValue {
    fn from(value: serde_json::Value) -> Self {
        SqlValue::Json(value)
    }
}
