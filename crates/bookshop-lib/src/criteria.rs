//! Search criteria encoding
//!
//! Converts structured search criteria into query parameters. A field is
//! emitted only when it carries a value; absent and empty fields never
//! produce a parameter.

use serde::Serialize;

/// Query parameters for a search request, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueryParams(Vec<(String, String)>);

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `name=value` unless the value is absent or empty
    pub fn push_if_present(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|v| !v.is_empty()) {
            self.0.push((name.to_string(), value.to_string()));
        }
    }

    /// Add `name=true` for a set flag
    pub fn push_flag(&mut self, name: &str, set: bool) {
        if set {
            self.0.push((name.to_string(), "true".to_string()));
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.0
            .iter()
            .find(|(key, _)| key == name)
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn as_slice(&self) -> &[(String, String)] {
        &self.0
    }

    /// Render as `a=1&b=2` (for logging and request keys)
    pub fn to_query_string(&self) -> String {
        self.0
            .iter()
            .map(|(k, v)| format!("{}={}", k, v))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Search criteria that can be turned into query parameters
pub trait SearchCriteria {
    /// Encode every recognized, non-empty field
    fn to_query(&self) -> QueryParams;
}
