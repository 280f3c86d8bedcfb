//! Validation of incoming user payloads.
//!
//! Rules live in [`rules`] as a flat table of named checks. Every rule runs
//! against every payload; failures are collected into [`ValidationErrors`]
//! rather than stopping at the first one.

use std::collections::BTreeMap;
use std::fmt;

pub mod rules;

pub use rules::{MAX_AGE, MIN_AGE, validate_user};

/// Field name → human-readable reason, one entry per failing field.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: BTreeMap<String, String>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records a failure. The first message for a field wins.
    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.fields
            .entry(field.to_string())
            .or_insert_with(|| message.into());
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn get(&self, field: &str) -> Option<&str> {
        self.fields.get(field).map(String::as_str)
    }

    pub fn fields(&self) -> &BTreeMap<String, String> {
        &self.fields
    }

    pub fn into_fields(self) -> BTreeMap<String, String> {
        self.fields
    }

    /// One-line summary used as the `error` string of the 400 envelope.
    pub fn summary(&self) -> String {
        match self.fields.len() {
            1 => "Validation failed for 1 field".to_string(),
            n => format!("Validation failed for {} fields", n),
        }
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.summary())?;
        for (field, message) in &self.fields {
            write!(f, "; {}: {}", field, message)?;
        }
        Ok(())
    }
}

impl std::error::Error for ValidationErrors {}
