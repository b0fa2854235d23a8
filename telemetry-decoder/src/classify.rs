//! Field type classification
//!
//! Producers encode booleans inconsistently (native `true`/`false` or the numbers 0/1),
//! so classification normalises both to [`FieldKind::Boolean`]. Precedence, first
//! match wins:
//!
//! 1. all native booleans → boolean
//! 2. all values are `true`/`false`/`0`/`1`/`0.0`/`1.0` → boolean
//! 3. all numbers → numeric
//! 4. all strings → categorical
//! 5. anything else, including no values → unknown
//!
//! Rule 2 means a numeric field that only ever reported 0 and 1 in the sample is
//! classified as boolean. That ambiguity is accepted.

use crate::types::{FieldKind, FieldValue};

/// Classify a field from its observed (non-absent) values
pub fn classify<'a, I>(values: I) -> FieldKind
where
    I: IntoIterator<Item = &'a FieldValue>,
{
    let mut seen_any = false;
    let mut all_native_bool = true;
    let mut all_bool_like = true;
    let mut all_numeric = true;
    let mut all_text = true;

    for value in values {
        seen_any = true;
        all_native_bool &= matches!(value, FieldValue::Boolean(_));
        all_bool_like &= is_bool_like(value);
        all_numeric &= value.is_numeric();
        all_text &= matches!(value, FieldValue::Text(_));
    }

    if !seen_any {
        FieldKind::Unknown
    } else if all_native_bool || all_bool_like {
        FieldKind::Boolean
    } else if all_numeric {
        FieldKind::Numeric
    } else if all_text {
        FieldKind::Categorical
    } else {
        FieldKind::Unknown
    }
}

/// True for booleans and for numbers equal to 0 or 1
fn is_bool_like(value: &FieldValue) -> bool {
    match value {
        FieldValue::Boolean(_) => true,
        FieldValue::Integer(v) => *v == 0 || *v == 1,
        FieldValue::Float(v) => *v == 0.0 || *v == 1.0,
        FieldValue::Text(_) | FieldValue::Compound(_) => false,
    }
}

/// Plot coordinate for a boolean-classified value (1 for true-equivalent, else 0)
pub fn boolean_level(value: &FieldValue) -> u8 {
    match value.as_bool() {
        Some(true) => 1,
        _ => 0,
    }
}
