//! Instances
//!
//! An instance is a dynamic document tagged with the class it claims to be:
//! an ordered field map plus a [`ClassId`]. Validation mutates the field
//! map in place (conversions, trimming, strict-remove, custom sanitizers).

use serde_json::{Map, Value};

use crate::schema::ClassId;

/// A class-tagged document under validation.
#[derive(Debug, Clone, PartialEq)]
pub struct Instance {
    class: ClassId,
    fields: Map<String, Value>,
}

impl Instance {
    /// Creates an empty instance of the given class.
    pub fn new(class: ClassId) -> Self {
        Self {
            class,
            fields: Map::new(),
        }
    }

    /// The class this instance claims to be.
    pub fn class(&self) -> &ClassId {
        &self.class
    }

    /// Sets one field, replacing any previous value.
    pub fn set(&mut self, field: impl Into<String>, value: Value) -> &mut Self {
        self.fields.insert(field.into(), value);
        self
    }

    /// Merges the entries of a JSON object into the instance, last write
    /// wins. Non-object values are ignored.
    pub fn assign(&mut self, values: Value) -> &mut Self {
        if let Value::Object(map) = values {
            for (field, value) in map {
                self.fields.insert(field, value);
            }
        }
        self
    }

    /// Reads one field.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field names in insertion order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    /// The field map.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    pub(crate) fn fields_mut(&mut self) -> &mut Map<String, Value> {
        &mut self.fields
    }

    /// Renders the instance's fields as a JSON object.
    pub fn to_value(&self) -> Value {
        Value::Object(self.fields.clone())
    }
}
