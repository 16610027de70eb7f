//! Order records as exchanged with the Record API

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize};

/// Classification stamped on every order created from this front end
pub const DEFAULT_CLASSIFICATION: &str = "UNCLASSIFIED";

/// An order record owned by the Record API
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    /// Opaque identifier assigned by the Record API
    #[serde(deserialize_with = "opaque_id")]
    pub id: String,
    pub order_fy: String,
    pub order_type: String,
    pub order_number: String,
    /// `YYYY-MM-DD`, possibly followed by a time part
    #[serde(default)]
    pub order_date: String,
    pub order_title: String,
    #[serde(default)]
    pub classification: String,
    /// Address of the stored file in the object store
    pub order_location: String,
}

impl Order {
    /// Date part of `order_date` for display, empty when absent or unparsable
    pub fn display_date(&self) -> String {
        self.order_date
            .get(..10)
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok())
            .map(|d| d.format("%Y-%m-%d").to_string())
            .unwrap_or_default()
    }
}

/// Body of a create request: the order fields minus `id`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewOrder {
    pub classification: String,
    pub order_fy: String,
    pub order_type: String,
    pub order_number: String,
    pub order_date: NaiveDate,
    pub order_title: String,
    pub order_location: String,
}

/// Wire shape of list and search responses
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrderList {
    #[serde(default)]
    pub orders: Vec<Order>,
    #[serde(default)]
    pub total: usize,
}

/// Accept either a JSON string or number as the record id
fn opaque_id<'de, D: Deserializer<'de>>(deserializer: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Text(String),
        Number(serde_json::Number),
    }

    Ok(match RawId::deserialize(deserializer)? {
        RawId::Text(s) => s,
        RawId::Number(n) => n.to_string(),
    })
}
