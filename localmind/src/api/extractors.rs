use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use validator::ValidationErrors;

use crate::error::LocalMindError;

/// `axum::Json` whose rejections become `invalid_request` envelopes.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(LocalMindError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for LocalMindError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> LocalMindError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                LocalMindError::Validation(format!("Missing required field: {field}"))
            } else {
                LocalMindError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            LocalMindError::Validation(format!("JSON syntax error: {err}"))
        }
        JsonRejection::MissingJsonContentType(_) => LocalMindError::Validation(
            "Missing `Content-Type: application/json` header".to_string(),
        ),
        JsonRejection::BytesRejection(_) => {
            LocalMindError::Internal("Failed to read request body".to_string())
        }
        _ => LocalMindError::Validation(rejection.body_text()),
    }
}

impl From<ValidationErrors> for LocalMindError {
    fn from(errors: ValidationErrors) -> Self {
        let mut messages: Vec<String> = errors
            .field_errors()
            .into_iter()
            .flat_map(|(field, errs)| {
                errs.iter().map(move |e| match &e.message {
                    Some(message) => message.to_string(),
                    None => format!("Invalid value for {field}"),
                })
            })
            .collect();
        messages.sort();
        LocalMindError::Validation(messages.join("; "))
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
