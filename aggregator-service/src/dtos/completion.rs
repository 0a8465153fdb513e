//! Completion request validation and response shape.
//!
//! The inbound body is validated field by field from raw JSON so that every
//! problem (missing, null, wrong type, blank, too long, unsupported model) is
//! reported against its field in a single response.

use crate::services::ModelRegistry;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::borrow::Cow;
use validator::{ValidationError, ValidationErrors};

pub const MODEL_MAX_LENGTH: usize = 50;

/// Key for errors that concern the payload as a whole.
pub const NON_FIELD_ERRORS: &str = "non_field_errors";

/// A validated completion request. `model` is lowercase and registered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CompletionRequest {
    pub model: String,
    pub prompt: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompletionResponse {
    pub model: String,
    pub response: String,
}

impl CompletionRequest {
    /// Validate an untyped payload against `registry`.
    pub fn from_payload(
        payload: &Value,
        registry: &ModelRegistry,
    ) -> Result<Self, ValidationErrors> {
        let mut errors = ValidationErrors::new();

        let Some(fields) = payload.as_object() else {
            errors.add(
                NON_FIELD_ERRORS,
                field_error(
                    "invalid",
                    format!(
                        "Invalid data. Expected a dictionary, but got {}.",
                        type_name(payload)
                    ),
                ),
            );
            return Err(errors);
        };

        let model = char_field(fields, "model", &mut errors)
            .and_then(|model| validate_model(model, registry, &mut errors));
        let prompt = char_field(fields, "prompt", &mut errors);

        match (model, prompt) {
            (Some(model), Some(prompt)) if errors.is_empty() => Ok(Self { model, prompt }),
            _ => Err(errors),
        }
    }
}

/// Length and registry checks; returns the normalized name.
fn validate_model(
    model: String,
    registry: &ModelRegistry,
    errors: &mut ValidationErrors,
) -> Option<String> {
    if model.chars().count() > MODEL_MAX_LENGTH {
        let mut error = field_error(
            "max_length",
            format!(
                "Ensure this field has no more than {} characters.",
                MODEL_MAX_LENGTH
            ),
        );
        error.add_param(Cow::from("max_length"), &MODEL_MAX_LENGTH);
        errors.add("model", error);
        return None;
    }

    if !registry.contains(&model) {
        let supported = registry.list_supported();
        let mut error = field_error(
            "unsupported_model",
            format!(
                "Unsupported model: '{}'. Available models: {}",
                model,
                supported.join(", ")
            ),
        );
        error.add_param(Cow::from("supported"), &supported);
        errors.add("model", error);
        return None;
    }

    Some(model.to_lowercase())
}

/// Required, non-null, string-like, trimmed and non-blank. Numbers are
/// accepted in their JSON spelling.
fn char_field(
    fields: &Map<String, Value>,
    name: &'static str,
    errors: &mut ValidationErrors,
) -> Option<String> {
    let raw = match fields.get(name) {
        None => {
            errors.add(name, field_error("required", "This field is required."));
            return None;
        }
        Some(Value::Null) => {
            errors.add(name, field_error("null", "This field may not be null."));
            return None;
        }
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        Some(_) => {
            errors.add(name, field_error("invalid", "Not a valid string."));
            return None;
        }
    };

    let value = raw.trim();
    if value.is_empty() {
        errors.add(name, field_error("blank", "This field may not be blank."));
        return None;
    }
    Some(value.to_string())
}

fn field_error(code: &'static str, message: impl Into<Cow<'static, str>>) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "NoneType",
        Value::Bool(_) => "bool",
        Value::Number(n) if n.is_f64() => "float",
        Value::Number(_) => "int",
        Value::String(_) => "str",
        Value::Array(_) => "list",
        Value::Object(_) => "dict",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProvidersConfig;
    use serde_json::json;
    use service_core::error::field_error_map;
    use std::collections::BTreeMap;

    fn registry() -> ModelRegistry {
        ModelRegistry::from_config(&ProvidersConfig::default())
    }

    fn errors_of(payload: Value) -> BTreeMap<String, Vec<String>> {
        let errors = CompletionRequest::from_payload(&payload, &registry()).unwrap_err();
        field_error_map(&errors)
    }

    #[test]
    fn normalizes_model_case_idempotently() {
        let registry = registry();
        let payload = json!({ "model": "GEMINI", "prompt": "x" });

        let first = CompletionRequest::from_payload(&payload, &registry).unwrap();
        let second = CompletionRequest::from_payload(&payload, &registry).unwrap();
        let expected = CompletionRequest {
            model: "gemini".to_string(),
            prompt: "x".to_string(),
        };
        assert_eq!(first, expected);
        assert_eq!(second, expected);

        let revalidated =
            CompletionRequest::from_payload(&serde_json::to_value(&first).unwrap(), &registry)
                .unwrap();
        assert_eq!(revalidated, expected);
    }

    #[test]
    fn unsupported_model_names_field_and_lists_models() {
        let errors = errors_of(json!({ "model": "gpt9", "prompt": "hi" }));
        assert_eq!(
            errors["model"],
            vec!["Unsupported model: 'gpt9'. Available models: chatgpt, gemini, claude"]
        );
        assert!(!errors.contains_key("prompt"));
    }

    #[test]
    fn empty_and_whitespace_prompts_are_blank() {
        for prompt in ["", "   \n"] {
            let errors = errors_of(json!({ "model": "claude", "prompt": prompt }));
            assert_eq!(errors["prompt"], vec!["This field may not be blank."]);
            assert_eq!(errors.len(), 1);
        }
    }

    #[test]
    fn missing_fields_are_all_reported() {
        let errors = errors_of(json!({}));
        assert_eq!(errors["model"], vec!["This field is required."]);
        assert_eq!(errors["prompt"], vec!["This field is required."]);
    }

    #[test]
    fn null_and_non_string_values_are_rejected() {
        let errors = errors_of(json!({ "model": null, "prompt": ["a"] }));
        assert_eq!(errors["model"], vec!["This field may not be null."]);
        assert_eq!(errors["prompt"], vec!["Not a valid string."]);
    }

    #[test]
    fn numeric_prompt_is_accepted_as_text() {
        let request =
            CompletionRequest::from_payload(&json!({ "model": "claude", "prompt": 42 }), &registry())
                .unwrap();
        assert_eq!(request.prompt, "42");
    }

    #[test]
    fn overlong_model_fails_length_check_first() {
        let errors = errors_of(json!({ "model": "g".repeat(51), "prompt": "hi" }));
        assert_eq!(
            errors["model"],
            vec!["Ensure this field has no more than 50 characters."]
        );
    }

    #[test]
    fn surrounding_whitespace_is_trimmed() {
        let request = CompletionRequest::from_payload(
            &json!({ "model": "  Claude ", "prompt": "  hello  " }),
            &registry(),
        )
        .unwrap();
        assert_eq!(request.model, "claude");
        assert_eq!(request.prompt, "hello");
    }

    #[test]
    fn non_object_payload_is_a_non_field_error() {
        let errors = errors_of(json!(["model", "prompt"]));
        assert_eq!(
            errors[NON_FIELD_ERRORS],
            vec!["Invalid data. Expected a dictionary, but got list."]
        );
    }
}
