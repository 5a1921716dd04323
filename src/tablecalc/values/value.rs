//! Core expression value type.
//!
//! This module contains [`Val`], the closed tagged value produced and
//! consumed by every generator in the engine. A `Val` is immutable once
//! created and every coercion on it is total: a conversion either yields a
//! value or yields `None`, it never raises. Only ill-formed *operations*
//! (division overflow, parse failure at evaluation time) escalate to the
//! dedicated [`Val::Err`] variant, which then propagates through composite
//! evaluation.

use serde::ser::Serializer;
use serde::Serialize;
use std::fmt;

use super::datetime;

/// A value in an expression cell.
///
/// This enum represents the complete, closed set of runtime value types the
/// expression engine can produce. Exhaustive matching over it replaces
/// dynamic type dispatch: every consumer is forced to handle all variants,
/// including the two terminal markers [`Val::Null`] and [`Val::Err`].
#[derive(Debug, Clone, PartialEq)]
pub enum Val {
    /// Absence of a value. Absorbed by most operations rather than failing.
    Null,
    /// An evaluation failure carrying a human-readable message.
    ///
    /// Err dominates Null: a binary operation with one Err operand yields
    /// that Err, while a Null operand is merely absorbed.
    Err(String),
    /// Boolean value (true/false)
    Boolean(bool),
    /// 8-bit signed integer
    Byte(i8),
    /// 16-bit signed integer
    Short(i16),
    /// 32-bit signed integer
    Integer(i32),
    /// 64-bit signed integer
    Long(i64),
    /// 32-bit floating point number
    Float(f32),
    /// 64-bit floating point number
    Double(f64),
    /// Instant in time as milliseconds since the Unix epoch.
    ///
    /// The zone a date renders in is resolved once per query from the
    /// expression context, never stored on the value itself.
    Date(i64),
    /// Length of time in milliseconds
    Duration(i64),
    /// UTF-8 string
    String(String),
    /// Opaque markup text, carried as-is and compared as a string
    Xml(String),
}

impl Val {
    /// The variants that carry a numeric value directly.
    ///
    /// Used for argument-type checks on numeric functions. Note that `Byte`
    /// and `Short` coerce numerically but are not part of this marker group;
    /// cross-type comparison handles them through the pair table instead.
    pub fn is_numeric(&self) -> bool {
        matches!(
            self,
            Val::Integer(_)
                | Val::Long(_)
                | Val::Float(_)
                | Val::Double(_)
                | Val::Date(_)
                | Val::Duration(_)
        )
    }

    /// True for every variant that represents an actual value, i.e. anything
    /// except the `Null` and `Err` terminal markers.
    pub fn is_value(&self) -> bool {
        !matches!(self, Val::Null | Val::Err(_))
    }

    /// True only for the `Err` variant
    pub fn is_err(&self) -> bool {
        matches!(self, Val::Err(_))
    }

    /// True only for the `Null` variant
    pub fn is_null(&self) -> bool {
        matches!(self, Val::Null)
    }

    /// True when the value coerces to a number.
    ///
    /// Unlike [`Val::is_numeric`] this includes booleans, bytes, shorts and
    /// strings whose content parses as a number, because those participate
    /// in numeric comparison and arithmetic once coerced.
    pub fn has_numeric_value(&self) -> bool {
        self.to_double().is_some()
    }

    /// True when the coerced numeric value carries a fractional part.
    ///
    /// Integral variants always return false; `Float`/`Double` (and strings
    /// holding decimal text) return true when the value is not a whole
    /// number. Used to pick long vs double comparison for mixed numerics.
    pub fn has_fractional_part(&self) -> bool {
        match self {
            Val::Float(v) => v.fract() != 0.0,
            Val::Double(v) => v.fract() != 0.0,
            Val::String(s) => match s.parse::<f64>() {
                Ok(v) => v.fract() != 0.0,
                Err(_) => false,
            },
            _ => false,
        }
    }

    /// Get the type name for error messages and debugging
    pub fn type_name(&self) -> &'static str {
        match self {
            Val::Null => "NULL",
            Val::Err(_) => "ERROR",
            Val::Boolean(_) => "BOOLEAN",
            Val::Byte(_) => "BYTE",
            Val::Short(_) => "SHORT",
            Val::Integer(_) => "INTEGER",
            Val::Long(_) => "LONG",
            Val::Float(_) => "FLOAT",
            Val::Double(_) => "DOUBLE",
            Val::Date(_) => "DATE",
            Val::Duration(_) => "DURATION",
            Val::String(_) => "STRING",
            Val::Xml(_) => "XML",
        }
    }

    /// Convert to a boolean, if the variant supports it.
    ///
    /// Numerics are true when non-zero; strings follow the conventional
    /// case-insensitive `"true"` test. Variants with no sensible boolean
    /// reading return `None` rather than an error.
    pub fn to_boolean(&self) -> Option<bool> {
        match self {
            Val::Boolean(b) => Some(*b),
            Val::Byte(v) => Some(*v != 0),
            Val::Short(v) => Some(*v != 0),
            Val::Integer(v) => Some(*v != 0),
            Val::Long(v) => Some(*v != 0),
            Val::Float(v) => Some(*v != 0.0),
            Val::Double(v) => Some(*v != 0.0),
            Val::String(s) => Some(s.eq_ignore_ascii_case("true")),
            Val::Date(_) | Val::Duration(_) | Val::Xml(_) | Val::Null | Val::Err(_) => None,
        }
    }

    /// Convert to a 32-bit integer, truncating any fractional part
    pub fn to_integer(&self) -> Option<i32> {
        match self {
            Val::Boolean(b) => Some(i32::from(*b)),
            Val::Byte(v) => Some(i32::from(*v)),
            Val::Short(v) => Some(i32::from(*v)),
            Val::Integer(v) => Some(*v),
            Val::Long(v) => i32::try_from(*v).ok(),
            Val::Float(v) => Some(*v as i32),
            Val::Double(v) => Some(*v as i32),
            Val::Date(ms) => i32::try_from(*ms).ok(),
            Val::Duration(ms) => i32::try_from(*ms).ok(),
            Val::String(s) => match s.parse::<i32>() {
                Ok(v) => Some(v),
                Err(_) => s.parse::<f64>().ok().map(|v| v as i32),
            },
            Val::Xml(_) | Val::Null | Val::Err(_) => None,
        }
    }

    /// Convert to a 64-bit integer, truncating any fractional part
    pub fn to_long(&self) -> Option<i64> {
        match self {
            Val::Boolean(b) => Some(i64::from(*b)),
            Val::Byte(v) => Some(i64::from(*v)),
            Val::Short(v) => Some(i64::from(*v)),
            Val::Integer(v) => Some(i64::from(*v)),
            Val::Long(v) => Some(*v),
            Val::Float(v) => Some(*v as i64),
            Val::Double(v) => Some(*v as i64),
            Val::Date(ms) => Some(*ms),
            Val::Duration(ms) => Some(*ms),
            Val::String(s) => match s.parse::<i64>() {
                Ok(v) => Some(v),
                Err(_) => s.parse::<f64>().ok().map(|v| v as i64),
            },
            Val::Xml(_) | Val::Null | Val::Err(_) => None,
        }
    }

    /// Convert to a 32-bit float
    pub fn to_float(&self) -> Option<f32> {
        self.to_double().map(|v| v as f32)
    }

    /// Convert to a 64-bit float.
    ///
    /// This is the workhorse coercion used by the arithmetic calculators;
    /// any variant that returns `Some` here can participate in numeric
    /// folds.
    pub fn to_double(&self) -> Option<f64> {
        match self {
            Val::Boolean(b) => Some(if *b { 1.0 } else { 0.0 }),
            Val::Byte(v) => Some(f64::from(*v)),
            Val::Short(v) => Some(f64::from(*v)),
            Val::Integer(v) => Some(f64::from(*v)),
            Val::Long(v) => Some(*v as f64),
            Val::Float(v) => Some(f64::from(*v)),
            Val::Double(v) => Some(*v),
            Val::Date(ms) => Some(*ms as f64),
            Val::Duration(ms) => Some(*ms as f64),
            Val::String(s) => s.parse::<f64>().ok(),
            Val::Xml(_) | Val::Null | Val::Err(_) => None,
        }
    }

    /// Convert this value to a string representation for display.
    ///
    /// Unlike `Debug` formatting this provides the clean cell text the
    /// surrounding result table renders: dates in ISO-8601 UTC, doubles
    /// without a trailing `.0`, Null as the empty string and errors with an
    /// `Err:` prefix.
    pub fn to_display_string(&self) -> String {
        match self {
            Val::Null => String::new(),
            Val::Err(message) => format!("Err: {}", message),
            Val::Boolean(b) => b.to_string(),
            Val::Byte(v) => v.to_string(),
            Val::Short(v) => v.to_string(),
            Val::Integer(v) => v.to_string(),
            Val::Long(v) => v.to_string(),
            Val::Float(v) => v.to_string(),
            Val::Double(v) => v.to_string(),
            Val::Date(ms) => datetime::format_iso_utc(*ms),
            Val::Duration(ms) => datetime::format_duration(*ms),
            Val::String(s) => s.clone(),
            Val::Xml(s) => s.clone(),
        }
    }

    /// The message carried by an `Err` value, if this is one
    pub fn err_message(&self) -> Option<&str> {
        match self {
            Val::Err(message) => Some(message),
            _ => None,
        }
    }

    /// Create an error value from anything printable
    pub fn err(message: impl Into<String>) -> Val {
        Val::Err(message.into())
    }

    /// Create a string value
    pub fn string(text: impl Into<String>) -> Val {
        Val::String(text.into())
    }
}

/// Display matches [`Val::to_display_string`] so values can be used directly
/// in format strings and joined cell output.
impl fmt::Display for Val {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_display_string())
    }
}

/// Custom Serialize implementation for Val.
///
/// Numbers serialize as numbers, Null as none, Date as an ISO-8601 string,
/// Duration as its millisecond count and Err as its rendered message. This
/// matches the cell format the surrounding result table ships to clients.
impl Serialize for Val {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Val::Null => serializer.serialize_none(),
            Val::Err(message) => serializer.serialize_str(&format!("Err: {}", message)),
            Val::Boolean(b) => serializer.serialize_bool(*b),
            Val::Byte(v) => serializer.serialize_i8(*v),
            Val::Short(v) => serializer.serialize_i16(*v),
            Val::Integer(v) => serializer.serialize_i32(*v),
            Val::Long(v) => serializer.serialize_i64(*v),
            Val::Float(v) => serializer.serialize_f32(*v),
            Val::Double(v) => serializer.serialize_f64(*v),
            Val::Date(ms) => serializer.serialize_str(&datetime::format_iso_utc(*ms)),
            Val::Duration(ms) => serializer.serialize_i64(*ms),
            Val::String(s) => serializer.serialize_str(s),
            Val::Xml(s) => serializer.serialize_str(s),
        }
    }
}

impl From<bool> for Val {
    fn from(v: bool) -> Self {
        Val::Boolean(v)
    }
}

impl From<i32> for Val {
    fn from(v: i32) -> Self {
        Val::Integer(v)
    }
}

impl From<i64> for Val {
    fn from(v: i64) -> Self {
        Val::Long(v)
    }
}

impl From<f64> for Val {
    fn from(v: f64) -> Self {
        Val::Double(v)
    }
}

impl From<&str> for Val {
    fn from(v: &str) -> Self {
        Val::String(v.to_string())
    }
}

impl From<String> for Val {
    fn from(v: String) -> Self {
        Val::String(v)
    }
}
