//! Structured record carried by the benchmark pipe.

use serde::{Deserialize, Serialize};

/// Name of the record returned before any client has written the pipe.
pub const DEFAULT_BLOB_NAME: &str = "BenchmarkPipeBlob";

/// Typed value of a single pipe element.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum PipeValue {
    Double(f64),
    Long(i64),
    String(String),
    DoubleArray(Vec<f64>),
    LongArray(Vec<i64>),
}

/// Named data element inside a blob.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeElement {
    pub name: String,
    pub value: PipeValue,
}

/// Multi-field record read from and written to the pipe.
///
/// Element order is preserved; names are not required to be unique, lookups
/// return the first match.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipeBlob {
    name: String,
    elements: Vec<PipeElement>,
}

impl PipeBlob {
    /// Creates an empty blob.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            elements: Vec::new(),
        }
    }

    /// Appends an element (builder style).
    pub fn with_element(mut self, name: impl Into<String>, value: PipeValue) -> Self {
        self.push(name, value);
        self
    }

    /// Appends an element.
    pub fn push(&mut self, name: impl Into<String>, value: PipeValue) {
        self.elements.push(PipeElement {
            name: name.into(),
            value,
        });
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn elements(&self) -> &[PipeElement] {
        &self.elements
    }

    /// Value of the first element named `name`.
    pub fn get(&self, name: &str) -> Option<&PipeValue> {
        self.elements
            .iter()
            .find(|e| e.name == name)
            .map(|e| &e.value)
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

impl Default for PipeBlob {
    fn default() -> Self {
        PipeBlob::new(DEFAULT_BLOB_NAME).with_element("Value", PipeValue::Double(0.0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_blob() {
        let blob = PipeBlob::default();
        assert_eq!(blob.name(), DEFAULT_BLOB_NAME);
        assert_eq!(blob.len(), 1);
        assert_eq!(blob.get("Value"), Some(&PipeValue::Double(0.0)));
    }

    #[test]
    fn test_builder_preserves_order() {
        let blob = PipeBlob::new("Scan")
            .with_element("Motor", PipeValue::String("m1".to_string()))
            .with_element("Positions", PipeValue::DoubleArray(vec![0.5, 1.5]))
            .with_element("Points", PipeValue::Long(2));

        let names: Vec<&str> = blob.elements().iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, vec!["Motor", "Positions", "Points"]);
        assert_eq!(blob.get("Points"), Some(&PipeValue::Long(2)));
        assert_eq!(blob.get("Missing"), None);
    }

    #[test]
    fn test_empty_blob() {
        let blob = PipeBlob::new("Empty");
        assert!(blob.is_empty());
    }

    #[test]
    fn test_json_shape() {
        let blob = PipeBlob::new("B").with_element("x", PipeValue::LongArray(vec![1, 2]));
        let json = serde_json::to_value(&blob).unwrap();
        assert_eq!(json["name"], "B");
        assert_eq!(json["elements"][0]["value"]["type"], "long_array");
        assert_eq!(json["elements"][0]["value"]["value"][1], 2);
    }
}
