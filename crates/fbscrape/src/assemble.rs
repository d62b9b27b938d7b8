//! Record assembler: one output object per entity key.
//!
//! Requested keys always appear in the output. A key whose lookups all
//! failed maps to `{}`, which is how a caller tells "looked up, nothing
//! found" apart from "never looked up".

use crate::error::{ScrapeError, ScrapeResult};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Debug, Default)]
pub struct Assembler {
    records: Map<String, Value>,
}

impl Assembler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a key with an empty record if it is not there yet.
    pub fn request(&mut self, key: &str) {
        if !self.records.contains_key(key) {
            self.records.insert(key.to_string(), Value::Object(Map::new()));
        }
    }

    /// Union fields into the key's record. Colliding fields take the new value.
    pub fn absorb(&mut self, key: &str, fields: Map<String, Value>) {
        self.request(key);
        if let Some(Value::Object(record)) = self.records.get_mut(key) {
            for (name, value) in fields {
                record.insert(name, value);
            }
        }
    }

    /// Serialize a typed record and absorb its fields.
    pub fn absorb_record<T: Serialize>(&mut self, key: &str, record: &T) -> ScrapeResult<()> {
        match serde_json::to_value(record)? {
            Value::Object(fields) => {
                self.absorb(key, fields);
                Ok(())
            }
            other => Err(ScrapeError::Validation(format!(
                "record for {key} is not an object: {other}"
            ))),
        }
    }

    /// Set a single field on the key's record.
    pub fn set_field(&mut self, key: &str, name: &str, value: Value) {
        let mut fields = Map::new();
        fields.insert(name.to_string(), value);
        self.absorb(key, fields);
    }

    /// Record a per-entity failure. The key keeps whatever it already has.
    pub fn unavailable(&mut self, key: &str, error: &ScrapeError) {
        tracing::warn!(entity = key, "entity unavailable: {error}");
        self.request(key);
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// The assembled mapping, in request order.
    pub fn finish(self) -> Value {
        Value::Object(self.records)
    }
}
