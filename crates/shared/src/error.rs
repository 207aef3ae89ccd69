use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error body returned by the backend on non-2xx responses. Every field is
/// optional because gateways and proxies answer with their own shapes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ApiErrorBody {
    #[serde(default)]
    pub status: Option<u16>,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub path: Option<String>,
}

impl ApiErrorBody {
    /// Best human-readable message carried by a raw response body.
    pub fn summarize(raw: &str) -> String {
        match serde_json::from_str::<ApiErrorBody>(raw) {
            Ok(body) => body
                .message
                .filter(|m| !m.trim().is_empty())
                .or(body.error)
                .unwrap_or_else(|| raw.trim().to_string()),
            Err(_) => raw.trim().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{field}: {message}")]
pub struct FieldError {
    pub field: &'static str,
    pub message: String,
}

impl FieldError {
    pub fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Client-side validation failures collected from a form. Displays the first
/// failure, which is what a form banner shows.
#[derive(Debug, Clone, Default, PartialEq, Eq, Error)]
#[error("{}", self.summary())]
pub struct ValidationErrors {
    errors: Vec<FieldError>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, field: &'static str, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    pub fn require(&mut self, field: &'static str, value: &str, message: &str) {
        if value.trim().is_empty() {
            self.push(field, message);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }

    pub fn has_field(&self, field: &str) -> bool {
        self.errors.iter().any(|e| e.field == field)
    }

    pub fn summary(&self) -> String {
        match self.errors.first() {
            Some(first) => first.message.clone(),
            None => "invalid input".to_string(),
        }
    }

    pub fn into_result<T>(self, value: impl FnOnce() -> T) -> Result<T, ValidationErrors> {
        if self.is_empty() {
            Ok(value())
        } else {
            Err(self)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn summarizes_spring_style_error_body() {
        let raw = r#"{"status":500,"error":"Internal Server Error","message":"Program not found","path":"/api/training/programs/9"}"#;
        assert_eq!(ApiErrorBody::summarize(raw), "Program not found");
    }

    #[test]
    fn summarize_falls_back_to_raw_text() {
        assert_eq!(ApiErrorBody::summarize(" bad gateway \n"), "bad gateway");
        assert_eq!(
            ApiErrorBody::summarize(r#"{"error":"Forbidden","message":""}"#),
            "Forbidden"
        );
    }

    #[test]
    fn validation_errors_display_first_failure() {
        let mut errors = ValidationErrors::new();
        errors.require("firstName", "  ", "First name is required");
        errors.require("lastName", "", "Last name is required");
        assert_eq!(errors.to_string(), "First name is required");
        assert!(errors.has_field("lastName"));
        assert_eq!(errors.errors().len(), 2);
    }
}
