//! Generic comparison over [`Val`] instances.
//!
//! One comparator serves every equality and ordering function in the
//! catalogue. Same-variant pairs delegate to that variant's natural order;
//! mixed numeric pairs coerce to a common representation (long when neither
//! side has a fractional part, double otherwise); the remaining cross-type
//! pairs follow a fixed table, falling back to a string comparison when no
//! better reading exists. Null sorts last against everything.
//!
//! String comparisons honour a per-context case-sensitivity flag, selected
//! once by the caller rather than per call site.

use std::cmp::Ordering;

use super::value::Val;

/// Relative tolerance when a float is compared against a double. The two
/// widths render the same decimal differently, so exact comparison would
/// order `1.1f32` and `1.1f64` arbitrarily.
const FLOAT_DOUBLE_TOLERANCE: f64 = 0.000001;

/// Whether string content compares case-sensitively.
///
/// Equality and ordering functions read this off the expression context so a
/// whole query compares consistently.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CaseSensitivity {
    Sensitive,
    Insensitive,
}

impl CaseSensitivity {
    fn compare_str(self, a: &str, b: &str) -> Ordering {
        match self {
            CaseSensitivity::Sensitive => a.cmp(b),
            CaseSensitivity::Insensitive => {
                a.to_lowercase().cmp(&b.to_lowercase())
            }
        }
    }
}

/// Compare two values with the generic rules described in the module docs.
///
/// Null (on either side) sorts last; two Nulls are equal. The result is not
/// guaranteed transitive across mixed-type triples, so this comparator backs
/// equality and threshold functions, not sorting.
pub fn compare(a: &Val, b: &Val, case: CaseSensitivity) -> Ordering {
    match (a.is_null(), b.is_null()) {
        (true, true) => return Ordering::Equal,
        (true, false) => return Ordering::Greater,
        (false, true) => return Ordering::Less,
        (false, false) => {}
    }

    if same_variant(a, b) {
        return compare_same_variant(a, b, case);
    }

    if a.is_numeric() && b.is_numeric() {
        return if !a.has_fractional_part() && !b.has_fractional_part() {
            compare_as_long(a, b)
        } else if is_float_double_pair(a, b) {
            compare_as_double_with_tolerance(a, b)
        } else {
            compare_as_double(a, b)
        };
    }

    compare_cross_variant(a, b, case)
}

/// True when `compare` considers the two values equal.
pub fn equal(a: &Val, b: &Val, case: CaseSensitivity) -> bool {
    compare(a, b, case) == Ordering::Equal
}

fn same_variant(a: &Val, b: &Val) -> bool {
    std::mem::discriminant(a) == std::mem::discriminant(b)
}

fn is_float_double_pair(a: &Val, b: &Val) -> bool {
    matches!(
        (a, b),
        (Val::Float(_), Val::Double(_)) | (Val::Double(_), Val::Float(_))
    )
}

fn compare_same_variant(a: &Val, b: &Val, case: CaseSensitivity) -> Ordering {
    match (a, b) {
        (Val::Boolean(x), Val::Boolean(y)) => x.cmp(y),
        (Val::Byte(x), Val::Byte(y)) => x.cmp(y),
        (Val::Short(x), Val::Short(y)) => x.cmp(y),
        (Val::Integer(x), Val::Integer(y)) => x.cmp(y),
        (Val::Long(x), Val::Long(y)) => x.cmp(y),
        (Val::Float(x), Val::Float(y)) => x.total_cmp(y),
        (Val::Double(x), Val::Double(y)) => x.total_cmp(y),
        (Val::Date(x), Val::Date(y)) => x.cmp(y),
        (Val::Duration(x), Val::Duration(y)) => x.cmp(y),
        (Val::String(x), Val::String(y)) => case.compare_str(x, y),
        (Val::Xml(x), Val::Xml(y)) => case.compare_str(x, y),
        (Val::Err(x), Val::Err(y)) => case.compare_str(x, y),
        // Null/Null is handled before dispatch; anything else here would be
        // a variant mismatch
        _ => Ordering::Equal,
    }
}

/// Cross-type pair table. Pairs are symmetric; each arm names the common
/// representation both sides are read through.
fn compare_cross_variant(a: &Val, b: &Val, case: CaseSensitivity) -> Ordering {
    match (a, b) {
        // A boolean against a number reads the boolean as 0/1
        (Val::Boolean(_), Val::Integer(_) | Val::Long(_))
        | (Val::Integer(_) | Val::Long(_), Val::Boolean(_)) => compare_as_long(a, b),
        // A boolean against text reads the text as a boolean
        (Val::Boolean(_), Val::String(_)) | (Val::String(_), Val::Boolean(_)) => {
            compare_as_boolean(a, b)
        }
        // Text against a plain number may be numeric text ("1.23" vs 10):
        // numeric comparison first, string order as the tie-break
        (Val::String(_) | Val::Xml(_), _) | (_, Val::String(_) | Val::Xml(_))
            if text_vs_plain_number(a, b) =>
        {
            compare_as_double(a, b).then_with(|| compare_as_string(a, b, case))
        }
        // Dates and durations against numbers compare on the millisecond
        // magnitude; against text, the magnitude first then the text
        (Val::Date(_) | Val::Duration(_), Val::Byte(_) | Val::Short(_))
        | (Val::Byte(_) | Val::Short(_), Val::Date(_) | Val::Duration(_)) => {
            compare_as_long(a, b)
        }
        (Val::Date(_) | Val::Duration(_), Val::String(_))
        | (Val::String(_), Val::Date(_) | Val::Duration(_)) => {
            compare_as_long(a, b).then_with(|| compare_as_string(a, b, case))
        }
        // Bytes and shorts against wider numerics
        (Val::Byte(_) | Val::Short(_), Val::Integer(_) | Val::Long(_))
        | (Val::Integer(_) | Val::Long(_), Val::Byte(_) | Val::Short(_))
        | (Val::Byte(_), Val::Short(_))
        | (Val::Short(_), Val::Byte(_)) => compare_as_long(a, b),
        (Val::Byte(_) | Val::Short(_), Val::Float(_) | Val::Double(_))
        | (Val::Float(_) | Val::Double(_), Val::Byte(_) | Val::Short(_)) => {
            compare_as_double(a, b)
        }
        // No better reading: compare rendered text
        _ => compare_as_string(a, b, case),
    }
}

fn text_vs_plain_number(a: &Val, b: &Val) -> bool {
    fn is_text(v: &Val) -> bool {
        matches!(v, Val::String(_) | Val::Xml(_))
    }
    fn is_plain_number(v: &Val) -> bool {
        matches!(
            v,
            Val::Byte(_)
                | Val::Short(_)
                | Val::Integer(_)
                | Val::Long(_)
                | Val::Float(_)
                | Val::Double(_)
        )
    }
    (is_text(a) && is_plain_number(b)) || (is_plain_number(a) && is_text(b))
}

/// Compare through a fallible coercion, treating a failed coercion as
/// greater (missing values last).
fn compare_coerced<T: PartialOrd>(
    a: Option<T>,
    b: Option<T>,
    cmp: impl Fn(&T, &T) -> Ordering,
) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => cmp(&x, &y),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

fn compare_as_long(a: &Val, b: &Val) -> Ordering {
    compare_coerced(a.to_long(), b.to_long(), |x, y| x.cmp(y))
}

fn compare_as_double(a: &Val, b: &Val) -> Ordering {
    compare_coerced(a.to_double(), b.to_double(), |x, y| x.total_cmp(y))
}

fn compare_as_boolean(a: &Val, b: &Val) -> Ordering {
    compare_coerced(a.to_boolean(), b.to_boolean(), |x, y| x.cmp(y))
}

fn compare_as_string(a: &Val, b: &Val, case: CaseSensitivity) -> Ordering {
    case.compare_str(&a.to_display_string(), &b.to_display_string())
}

fn compare_as_double_with_tolerance(a: &Val, b: &Val) -> Ordering {
    if let (Some(x), Some(y)) = (a.to_double(), b.to_double()) {
        if (x - y).abs() < FLOAT_DOUBLE_TOLERANCE * y.abs() {
            return Ordering::Equal;
        }
    }
    compare_as_double(a, b)
}
