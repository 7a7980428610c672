//! Sajili test utilities.
//!
//! Helpers for integration testing: registration and person document
//! builders, and assertion utilities for JSON listing responses.

use serde_json::{Map, Value, json};
use uuid::Uuid;

/// Create a test registration document of the given record type.
pub fn test_registration(record_type: &str) -> TestRegistration {
    TestRegistration {
        id: Uuid::now_v7().to_string(),
        record_type: record_type.to_string(),
        approval_status: Some("APPROVED".to_string()),
        fields: Map::new(),
    }
}

/// A registration document builder.
#[derive(Debug, Clone)]
pub struct TestRegistration {
    pub id: String,
    pub record_type: String,
    pub approval_status: Option<String>,
    pub fields: Map<String, Value>,
}

impl TestRegistration {
    /// Set a custom ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Mark as awaiting approval.
    pub fn pending(mut self) -> Self {
        self.approval_status = Some("PENDING".to_string());
        self
    }

    /// Set premise location fields; `None` stores an explicit null.
    pub fn at(mut self, location: &[(&str, Option<&str>)]) -> Self {
        for (field, value) in location {
            self.fields
                .insert(field.to_string(), value.map_or(Value::Null, |v| json!(v)));
        }
        self
    }

    /// Set the premise type.
    pub fn premise_type(self, premise_type: &str) -> Self {
        self.with_field("premise_type", json!(premise_type))
    }

    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Render the source document.
    pub fn to_document(&self) -> Value {
        let mut doc = self.fields.clone();
        doc.insert("id".to_string(), json!(self.id));
        doc.insert("record_type".to_string(), json!(self.record_type));
        if let Some(ref status) = self.approval_status {
            doc.insert("approval_status".to_string(), json!(status));
        }
        Value::Object(doc)
    }
}

/// Create a test person document.
pub fn test_person(record_type: &str, full_name: &str) -> TestPerson {
    TestPerson {
        id: Uuid::now_v7().to_string(),
        record_type: record_type.to_string(),
        full_name: full_name.to_string(),
        national_id: None,
        nationality: None,
        approval_status: Some("APPROVED".to_string()),
        fields: Map::new(),
    }
}

/// A person document builder.
#[derive(Debug, Clone)]
pub struct TestPerson {
    pub id: String,
    pub record_type: String,
    pub full_name: String,
    pub national_id: Option<String>,
    pub nationality: Option<String>,
    pub approval_status: Option<String>,
    pub fields: Map<String, Value>,
}

impl TestPerson {
    /// Set a custom ID.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    /// Set the identity key.
    pub fn with_national_id(mut self, national_id: &str) -> Self {
        self.national_id = Some(national_id.to_string());
        self
    }

    /// Set the recorded nationality (placeholders such as `noResult` included).
    pub fn with_nationality(mut self, nationality: &str) -> Self {
        self.nationality = Some(nationality.to_string());
        self
    }

    /// Mark as awaiting approval.
    pub fn pending(mut self) -> Self {
        self.approval_status = Some("PENDING".to_string());
        self
    }

    /// Set the age.
    pub fn aged(self, age: u32) -> Self {
        self.with_field("age", json!(age))
    }

    /// Set location fields; `None` stores an explicit null.
    pub fn at(mut self, location: &[(&str, Option<&str>)]) -> Self {
        for (field, value) in location {
            self.fields
                .insert(field.to_string(), value.map_or(Value::Null, |v| json!(v)));
        }
        self
    }

    /// Add a single field.
    pub fn with_field(mut self, name: &str, value: Value) -> Self {
        self.fields.insert(name.to_string(), value);
        self
    }

    /// Render the source document.
    pub fn to_document(&self) -> Value {
        let mut doc = self.fields.clone();
        doc.insert("id".to_string(), json!(self.id));
        doc.insert("record_type".to_string(), json!(self.record_type));
        doc.insert("full_name".to_string(), json!(self.full_name));
        if let Some(ref national_id) = self.national_id {
            doc.insert("national_id".to_string(), json!(national_id));
        }
        if let Some(ref nationality) = self.nationality {
            doc.insert("nationality".to_string(), json!(nationality));
        }
        if let Some(ref status) = self.approval_status {
            doc.insert("approval_status".to_string(), json!(status));
        }
        Value::Object(doc)
    }
}

/// Assertion helpers for JSON listing responses.
pub mod assert {
    use serde_json::Value;

    /// Assert that a JSON value has a specific key.
    pub fn has_key(value: &Value, key: &str) {
        assert!(
            value.get(key).is_some(),
            "Expected JSON to have key '{key}', got: {value}"
        );
    }

    /// Assert a successful listing envelope and return its entity array.
    pub fn listing<'a>(body: &'a Value, entity: &str) -> &'a Vec<Value> {
        assert_eq!(
            body["success"],
            Value::Bool(true),
            "Expected a success envelope, got: {body}"
        );
        has_key(body, "pagination");
        match body.get(entity).and_then(Value::as_array) {
            Some(rows) => rows,
            None => panic!("Expected '{entity}' array in: {body}"),
        }
    }

    /// Assert a failure envelope.
    pub fn failure(body: &Value) {
        assert_eq!(
            body["success"],
            Value::Bool(false),
            "Expected a failure envelope, got: {body}"
        );
        assert!(
            body["error"].as_str().is_some_and(|e| !e.is_empty()),
            "Expected an error message in: {body}"
        );
    }

    /// Assert that a string contains a substring.
    pub fn contains(haystack: &str, needle: &str) {
        assert!(
            haystack.contains(needle),
            "Expected string to contain '{needle}'\nActual: {haystack}"
        );
    }
}
