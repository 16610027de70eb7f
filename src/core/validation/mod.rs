//! Validation of order form fields
//!
//! [`validators`] holds the pure per-field checks; [`ValidationReport`]
//! collects one invalid flag per field so the caller can mark the
//! offending inputs and decide pass/fail in one place.

pub mod validators;

use indexmap::IndexMap;
use serde::Serialize;
use serde::ser::{SerializeMap, Serializer};
use std::fmt;

pub use validators::{
    ORDER_TYPE_PLACEHOLDER, ORDER_TYPES, is_valid_file, is_valid_fiscal_year,
    is_valid_order_date, is_valid_order_number, is_valid_order_type, is_valid_title,
    normalize_title,
};

/// Form fields that can be flagged invalid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    FiscalYear,
    OrderType,
    OrderNumber,
    OrderDate,
    Title,
    File,
    /// Free-text search query
    Query,
}

impl Field {
    /// Name used in forms, templates and error details
    pub fn as_str(&self) -> &'static str {
        match self {
            Field::FiscalYear => "order_fy",
            Field::OrderType => "order_type",
            Field::OrderNumber => "order_number",
            Field::OrderDate => "order_date",
            Field::Title => "order_title",
            Field::File => "file",
            Field::Query => "q",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from field to "is invalid" flag
///
/// Fields are kept in the order they were checked. A report passes when
/// every recorded flag is false.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    invalid: IndexMap<Field, bool>,
}

impl ValidationReport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the outcome of a check
    pub fn record(&mut self, field: Field, valid: bool) {
        self.invalid.insert(field, !valid);
    }

    pub fn is_invalid(&self, field: Field) -> bool {
        self.invalid.get(&field).copied().unwrap_or(false)
    }

    pub fn passed(&self) -> bool {
        self.invalid.values().all(|flag| !flag)
    }

    /// Fields flagged invalid, in check order
    pub fn invalid_fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.invalid
            .iter()
            .filter(|(_, flag)| **flag)
            .map(|(field, _)| *field)
    }

    /// `Ok(())` when the report passed, otherwise the report itself
    pub fn into_result(self) -> Result<(), ValidationReport> {
        if self.passed() { Ok(()) } else { Err(self) }
    }
}

impl Serialize for ValidationReport {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.invalid.len()))?;
        for (field, flag) in &self.invalid {
            map.serialize_entry(field.as_str(), flag)?;
        }
        map.end()
    }
}
