//! String encoding of property values.
//!
//! The control core exchanges every property value as a string. Typed access is a
//! two step affair: fetch the string, then decode it with [`PropertyValue::decode`].
//! A decode failure is a [`ParseFailure`], never a fabricated zero or `false`.
//!
//! Encoding follows the core's own conventions: booleans are written as `"1"` and
//! `"0"`, numbers with Rust's shortest round-trip formatting.

use crate::error::ParseFailure;

/// Type a property value is decoded to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Floating point number.
    Float,
    /// Signed integer.
    Integer,
    /// `1`/`0` or `true`/`false`.
    Bool,
    /// Raw string.
    Text,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            ValueKind::Float => "float",
            ValueKind::Integer => "integer",
            ValueKind::Bool => "bool",
            ValueKind::Text => "text",
        };
        write!(f, "{}", label)
    }
}

/// A type that can be stored in a string-encoded device property.
pub trait PropertyValue: Sized {
    /// Kind reported in parse failures.
    const KIND: ValueKind;

    /// Decode the core's string form.
    fn decode(raw: &str) -> Result<Self, ParseFailure>;

    /// Encode into the core's string form.
    fn encode(&self) -> String;

    /// Why this value must not be written, if it has no decodable encoding.
    fn rejection(&self) -> Option<&'static str> {
        None
    }
}

const NOT_FINITE: &str = "value must be a finite number";

fn decode_float(raw: &str) -> Result<f64, ParseFailure> {
    let value = raw
        .trim()
        .parse::<f64>()
        .map_err(|_| ParseFailure::new(raw, ValueKind::Float))?;
    // A device reporting NaN or inf has no usable reading.
    if !value.is_finite() {
        return Err(ParseFailure::new(raw, ValueKind::Float));
    }
    Ok(value)
}

impl PropertyValue for f64 {
    const KIND: ValueKind = ValueKind::Float;

    fn decode(raw: &str) -> Result<Self, ParseFailure> {
        decode_float(raw)
    }

    fn encode(&self) -> String {
        self.to_string()
    }

    fn rejection(&self) -> Option<&'static str> {
        (!self.is_finite()).then_some(NOT_FINITE)
    }
}

impl PropertyValue for f32 {
    const KIND: ValueKind = ValueKind::Float;

    fn decode(raw: &str) -> Result<Self, ParseFailure> {
        let value = raw
            .trim()
            .parse::<f32>()
            .map_err(|_| ParseFailure::new(raw, ValueKind::Float))?;
        if !value.is_finite() {
            return Err(ParseFailure::new(raw, ValueKind::Float));
        }
        Ok(value)
    }

    fn encode(&self) -> String {
        self.to_string()
    }

    fn rejection(&self) -> Option<&'static str> {
        (!self.is_finite()).then_some(NOT_FINITE)
    }
}

impl PropertyValue for i64 {
    const KIND: ValueKind = ValueKind::Integer;

    fn decode(raw: &str) -> Result<Self, ParseFailure> {
        raw.trim()
            .parse::<i64>()
            .map_err(|_| ParseFailure::new(raw, ValueKind::Integer))
    }

    fn encode(&self) -> String {
        self.to_string()
    }
}

impl PropertyValue for i32 {
    const KIND: ValueKind = ValueKind::Integer;

    fn decode(raw: &str) -> Result<Self, ParseFailure> {
        raw.trim()
            .parse::<i32>()
            .map_err(|_| ParseFailure::new(raw, ValueKind::Integer))
    }

    fn encode(&self) -> String {
        self.to_string()
    }
}

impl PropertyValue for bool {
    const KIND: ValueKind = ValueKind::Bool;

    fn decode(raw: &str) -> Result<Self, ParseFailure> {
        let trimmed = raw.trim();
        if trimmed == "1" || trimmed.eq_ignore_ascii_case("true") {
            Ok(true)
        } else if trimmed == "0" || trimmed.eq_ignore_ascii_case("false") {
            Ok(false)
        } else {
            Err(ParseFailure::new(raw, ValueKind::Bool))
        }
    }

    fn encode(&self) -> String {
        if *self { "1" } else { "0" }.to_string()
    }
}

impl PropertyValue for String {
    const KIND: ValueKind = ValueKind::Text;

    fn decode(raw: &str) -> Result<Self, ParseFailure> {
        Ok(raw.to_string())
    }

    fn encode(&self) -> String {
        self.clone()
    }
}
