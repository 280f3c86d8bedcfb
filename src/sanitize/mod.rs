//! Request sanitization
//!
//! Untrusted request data is cleaned before any handler sees it:
//!
//! 1. Keys containing [`OPERATOR_PREFIX`] are dropped from every object at
//!    every depth, so a payload cannot smuggle query operators into the store.
//! 2. String leaves have script blocks removed and angle brackets escaped.
//!
//! The [`extractors`] module wires both steps into actix-web extractors.

use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{Map, Value};

pub mod extractors;

pub use extractors::{SanitizedJson, SanitizedQuery};

/// Character the store's query language reserves for operators.
pub const OPERATOR_PREFIX: char = '$';

lazy_static! {
    /// `<script>` blocks, including their content, across lines
    static ref SCRIPT_BLOCK: Regex = Regex::new(r"(?is)<script\b[^>]*>.*?</script\s*>").unwrap();
}

/// Sanitizes a JSON value in place.
///
/// Objects lose every key containing [`OPERATOR_PREFIX`]; surviving keys keep
/// their relative order. Arrays and objects are walked recursively and string
/// leaves go through [`neutralize_markup`]. Numbers, booleans and null are left
/// untouched.
pub fn sanitize_value(value: &mut Value) {
    match value {
        Value::Object(map) => sanitize_map(map),
        Value::Array(items) => items.iter_mut().for_each(sanitize_value),
        Value::String(s) => {
            let cleaned = neutralize_markup(s);
            if cleaned != *s {
                *s = cleaned;
            }
        }
        Value::Null | Value::Bool(_) | Value::Number(_) => {}
    }
}

/// Sanitizes the entries of a JSON object in place.
pub fn sanitize_map(map: &mut Map<String, Value>) {
    map.retain(|key, _| !is_operator_key(key));
    map.values_mut().for_each(sanitize_value);
}

pub fn is_operator_key(key: &str) -> bool {
    key.contains(OPERATOR_PREFIX)
}

/// Strips `<script>` blocks and escapes any remaining `<` / `>`.
pub fn neutralize_markup(input: &str) -> String {
    let without_scripts = SCRIPT_BLOCK.replace_all(input, "");
    without_scripts.replace('<', "&lt;").replace('>', "&gt;")
}
