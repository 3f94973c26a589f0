//! Canonical JSON encoding for deterministic signing.
//!
//! Every signature in blah is made over the canonical form of a value:
//! - Object members sorted by key in ascending code-point order
//! - No whitespace
//! - Fields skipped by serde are omitted; `None` that is serialized becomes `null`
//! - Numbers must be finite; integers print exactly, floats print the way
//!   ECMAScript `Number#toString` does
//!
//! Two values that differ only in member order produce identical bytes.

use std::fmt::Display;

use serde::ser::{self, Serialize};
use serde_json::{Number, Value};

use crate::error::{CoreError, Result};

/// Canonicalize any serializable value to its canonical JSON string.
pub fn canonicalize<T: Serialize + ?Sized>(value: &T) -> Result<String> {
    value.serialize(FiniteCheck)?;
    let value =
        serde_json::to_value(value).map_err(|e| CoreError::Canonicalization(e.to_string()))?;
    Ok(canonicalize_value(&value))
}

/// Canonicalize a value to UTF-8 bytes. These are the exact bytes signed.
pub fn canonical_bytes<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>> {
    canonicalize(value).map(String::into_bytes)
}

/// Canonicalize an already-built JSON value.
///
/// `serde_json::Value` cannot hold non-finite numbers, so this is infallible.
pub fn canonicalize_value(value: &Value) -> String {
    let mut out = String::new();
    write_value(&mut out, value);
    out
}

fn write_value(out: &mut String, value: &Value) {
    match value {
        Value::Null => out.push_str("null"),
        Value::Bool(true) => out.push_str("true"),
        Value::Bool(false) => out.push_str("false"),
        Value::Number(n) => write_number(out, n),
        Value::String(s) => write_string(out, s),
        Value::Array(items) => {
            out.push('[');
            for (i, item) in items.iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_value(out, item);
            }
            out.push(']');
        }
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            // UTF-8 byte order equals code-point order
            entries.sort_by(|a, b| a.0.cmp(b.0));

            out.push('{');
            for (i, (key, item)) in entries.into_iter().enumerate() {
                if i > 0 {
                    out.push(',');
                }
                write_string(out, key);
                out.push(':');
                write_value(out, item);
            }
            out.push('}');
        }
    }
}

fn write_number(out: &mut String, n: &Number) {
    if let Some(i) = n.as_i64() {
        out.push_str(&i.to_string());
    } else if let Some(u) = n.as_u64() {
        out.push_str(&u.to_string());
    } else if let Some(f) = n.as_f64() {
        out.push_str(&format_float(f));
    }
}

/// Format a finite float the way `JSON.stringify` would.
fn format_float(f: f64) -> String {
    // Also covers -0
    if f == 0.0 {
        return "0".to_string();
    }

    let abs = f.abs();
    if (1e-6..1e21).contains(&abs) {
        return format!("{f}");
    }

    let s = format!("{f:e}");
    match s.split_once('e') {
        Some((mantissa, exp)) if !exp.starts_with('-') => format!("{mantissa}e+{exp}"),
        _ => s,
    }
}

fn write_string(out: &mut String, s: &str) {
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\u{08}' => out.push_str("\\b"),
            '\u{0c}' => out.push_str("\\f"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 => out.push_str(&format!("\\u{:04x}", c as u32)),
            c => out.push(c),
        }
    }
    out.push('"');
}

// ─────────────────────────────────────────────────────────────────────────────
// Finite-number check
// ─────────────────────────────────────────────────────────────────────────────

impl ser::Error for CoreError {
    fn custom<T: Display>(msg: T) -> Self {
        CoreError::Canonicalization(msg.to_string())
    }
}

/// Walks a value and fails on NaN or infinities.
///
/// `serde_json` quietly turns those into `null`, which would make two
/// different values sign identically.
struct FiniteCheck;

impl ser::Serializer for FiniteCheck {
    type Ok = ();
    type Error = CoreError;
    type SerializeSeq = Self;
    type SerializeTuple = Self;
    type SerializeTupleStruct = Self;
    type SerializeTupleVariant = Self;
    type SerializeMap = Self;
    type SerializeStruct = Self;
    type SerializeStructVariant = Self;

    fn serialize_bool(self, _: bool) -> Result<()> {
        Ok(())
    }

    fn serialize_i8(self, _: i8) -> Result<()> {
        Ok(())
    }

    fn serialize_i16(self, _: i16) -> Result<()> {
        Ok(())
    }

    fn serialize_i32(self, _: i32) -> Result<()> {
        Ok(())
    }

    fn serialize_i64(self, _: i64) -> Result<()> {
        Ok(())
    }

    fn serialize_i128(self, _: i128) -> Result<()> {
        Ok(())
    }

    fn serialize_u8(self, _: u8) -> Result<()> {
        Ok(())
    }

    fn serialize_u16(self, _: u16) -> Result<()> {
        Ok(())
    }

    fn serialize_u32(self, _: u32) -> Result<()> {
        Ok(())
    }

    fn serialize_u64(self, _: u64) -> Result<()> {
        Ok(())
    }

    fn serialize_u128(self, _: u128) -> Result<()> {
        Ok(())
    }

    fn serialize_f32(self, v: f32) -> Result<()> {
        self.serialize_f64(f64::from(v))
    }

    fn serialize_f64(self, v: f64) -> Result<()> {
        if v.is_finite() {
            Ok(())
        } else {
            Err(CoreError::Canonicalization(format!(
                "non-finite number {v} cannot be encoded"
            )))
        }
    }

    fn serialize_char(self, _: char) -> Result<()> {
        Ok(())
    }

    fn serialize_str(self, _: &str) -> Result<()> {
        Ok(())
    }

    fn serialize_bytes(self, _: &[u8]) -> Result<()> {
        Ok(())
    }

    fn serialize_none(self) -> Result<()> {
        Ok(())
    }

    fn serialize_some<T: ?Sized + Serialize>(self, value: &T) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_struct(self, _: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_unit_variant(self, _: &'static str, _: u32, _: &'static str) -> Result<()> {
        Ok(())
    }

    fn serialize_newtype_struct<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_newtype_variant<T: ?Sized + Serialize>(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(self)
    }

    fn serialize_seq(self, _: Option<usize>) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple(self, _: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_struct(self, _: &'static str, _: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_tuple_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self> {
        Ok(self)
    }

    fn serialize_map(self, _: Option<usize>) -> Result<Self> {
        Ok(self)
    }

    fn serialize_struct(self, _: &'static str, _: usize) -> Result<Self> {
        Ok(self)
    }

    fn serialize_struct_variant(
        self,
        _: &'static str,
        _: u32,
        _: &'static str,
        _: usize,
    ) -> Result<Self> {
        Ok(self)
    }
}

impl ser::SerializeSeq for FiniteCheck {
    type Ok = ();
    type Error = CoreError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTuple for FiniteCheck {
    type Ok = ();
    type Error = CoreError;

    fn serialize_element<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleStruct for FiniteCheck {
    type Ok = ();
    type Error = CoreError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeTupleVariant for FiniteCheck {
    type Ok = ();
    type Error = CoreError;

    fn serialize_field<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeMap for FiniteCheck {
    type Ok = ();
    type Error = CoreError;

    fn serialize_key<T: ?Sized + Serialize>(&mut self, key: &T) -> Result<()> {
        key.serialize(FiniteCheck)
    }

    fn serialize_value<T: ?Sized + Serialize>(&mut self, value: &T) -> Result<()> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStruct for FiniteCheck {
    type Ok = ();
    type Error = CoreError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}

impl ser::SerializeStructVariant for FiniteCheck {
    type Ok = ();
    type Error = CoreError;

    fn serialize_field<T: ?Sized + Serialize>(
        &mut self,
        _: &'static str,
        value: &T,
    ) -> Result<()> {
        value.serialize(FiniteCheck)
    }

    fn end(self) -> Result<()> {
        Ok(())
    }
}
