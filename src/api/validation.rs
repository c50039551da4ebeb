use std::collections::BTreeMap;

use actix_web::HttpResponse;
use serde::Serialize;
use validator::ValidationErrors;

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub fields: serde_json::Value,
}

/// Outcome of a form submission: persisted, or rejected with field errors
#[derive(Debug)]
pub enum Submission<T> {
    Saved(T),
    Invalid(FieldErrors),
}

/// Field-level messages attached to a re-rendered form, keyed by input name
#[derive(Debug, Default, Clone, Serialize, PartialEq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_string()).or_default().push(message.into());
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn messages(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    /// All messages of one field as a single line, empty when valid
    pub fn joined(&self, field: &str) -> String {
        self.messages(field).join(" ")
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(validation_errors: ValidationErrors) -> Self {
        let mut errors = FieldErrors::new();
        for (field, field_errors) in validation_errors.field_errors() {
            for e in field_errors {
                let message = e
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| "Invalid.".to_string());
                errors.add(&field, message);
            }
        }
        errors
    }
}

fn bad_request(error: &str, fields: serde_json::Map<String, serde_json::Value>) -> actix_web::Error {
    let error_response = ErrorResponse {
        error: error.to_string(),
        fields: serde_json::Value::Object(fields),
    };
    actix_web::error::InternalError::from_response("", HttpResponse::BadRequest().json(error_response))
        .into()
}

/// Creates a configured QueryConfig with standardized error handling for the entire project
pub fn query_config() -> actix_web_validator::QueryConfig {
    actix_web_validator::QueryConfig::default().error_handler(|err, _req| {
        let mut fields = serde_json::Map::new();

        match err {
            actix_web_validator::Error::Validate(validation_errors) => {
                for (field, errors) in validation_errors.field_errors() {
                    let messages: Vec<String> = errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| format!("Validation error in field: {}", field))
                        })
                        .collect();
                    fields.insert(field.to_string(), serde_json::json!({"errors": messages}));
                }
                bad_request("Validation failed", fields)
            }
            actix_web_validator::Error::Deserialize(_) => {
                fields.insert(
                    "message".to_string(),
                    serde_json::json!("Invalid query string. Check parameter types"),
                );
                bad_request("Request validation failed", fields)
            }
            _ => {
                fields.insert("message".to_string(), serde_json::json!("Validation error"));
                bad_request("Validation failed", fields)
            }
        }
    })
}
