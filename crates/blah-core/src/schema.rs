//! Structural validation of untrusted documents.
//!
//! Wire types describe their own shape through serde derives
//! (`deny_unknown_fields`, literal tag enums, validated newtypes). This
//! module is the single boundary that turns a serde rejection into
//! [`CoreError::SchemaValidation`].

use serde::de::{self, DeserializeOwned, Deserializer};
use serde::Deserialize;
use serde_json::error::Category;
use serde_json::Value;

use crate::error::{CoreError, Result};

/// Validate a JSON value against the shape of `T`.
pub fn parse<T: DeserializeOwned>(value: Value) -> Result<T> {
    serde_json::from_value(value).map_err(|e| CoreError::SchemaValidation(e.to_string()))
}

/// Parse JSON text and validate it against the shape of `T`.
///
/// Text that is not JSON at all is a decode error; JSON of the wrong shape
/// is a schema error.
pub fn parse_str<T: DeserializeOwned>(json: &str) -> Result<T> {
    serde_json::from_str(json).map_err(|e| match e.classify() {
        Category::Data => CoreError::SchemaValidation(e.to_string()),
        Category::Syntax | Category::Eof | Category::Io => CoreError::Decode(e.to_string()),
    })
}

/// Deserialize a `Vec` that must hold at least one element.
///
/// Use with `#[serde(deserialize_with = "non_empty")]`.
pub fn non_empty<'de, D, T>(deserializer: D) -> std::result::Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    let items = Vec::<T>::deserialize(deserializer)?;
    if items.is_empty() {
        return Err(de::Error::invalid_length(0, &"at least one element"));
    }
    Ok(items)
}
