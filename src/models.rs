// Core data structures for the coaster service

use serde::{Deserialize, Serialize};

/// A roller coaster record
///
/// Decoding is lenient: missing fields fall back to their zero value and
/// unknown fields are ignored. The `id` is never trusted from a request body;
/// the service overwrites it before anything is stored.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Coaster {
    pub id: String,
    pub name: String,
    pub manufacturer: String,
    pub in_park: String,
    pub height: i64,
}

impl Coaster {
    /// Create a coaster without an identifier
    pub fn new(
        name: impl Into<String>,
        manufacturer: impl Into<String>,
        in_park: impl Into<String>,
        height: i64,
    ) -> Self {
        Self {
            id: String::new(),
            name: name.into(),
            manufacturer: manufacturer.into(),
            in_park: in_park.into(),
            height,
        }
    }

    /// Decode a coaster from a raw JSON request body
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }

    /// Return a copy of this record keyed by `id`
    #[must_use]
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Compare every field except the identifier
    pub fn same_content(&self, other: &Coaster) -> bool {
        self.name == other.name
            && self.manufacturer == other.manufacturer
            && self.in_park == other.in_park
            && self.height == other.height
    }
}
