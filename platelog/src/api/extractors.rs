use axum::extract::rejection::JsonRejection;
use axum::extract::FromRequest;
use validator::ValidationErrors;

use crate::error::PlatelogError;

/// `axum::Json` whose rejections use the API error body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(PlatelogError))]
pub struct AppJson<T>(pub T);

impl From<JsonRejection> for PlatelogError {
    fn from(rejection: JsonRejection) -> Self {
        map_json_rejection(rejection)
    }
}

impl From<ValidationErrors> for PlatelogError {
    fn from(errors: ValidationErrors) -> Self {
        let message = errors
            .field_errors()
            .values()
            .flat_map(|field| field.iter())
            .find_map(|error| error.message.as_ref().map(ToString::to_string))
            .unwrap_or_else(|| errors.to_string());
        PlatelogError::Validation(message)
    }
}

fn map_json_rejection(rejection: JsonRejection) -> PlatelogError {
    match rejection {
        JsonRejection::JsonDataError(err) => {
            let message = err.body_text();
            if let Some(field) = extract_missing_field(&message) {
                PlatelogError::Validation(format!("Missing required field: {field}"))
            } else {
                PlatelogError::Validation(format!("Invalid JSON: {message}"))
            }
        }
        JsonRejection::JsonSyntaxError(err) => {
            PlatelogError::Validation(format!("JSON syntax error: {}", err.body_text()))
        }
        JsonRejection::MissingJsonContentType(_) => PlatelogError::Validation(
            "Missing `Content-Type: application/json` header".to_string(),
        ),
        JsonRejection::BytesRejection(_) => {
            PlatelogError::Internal("Failed to read request body".to_string())
        }
        _ => PlatelogError::Validation(rejection.body_text()),
    }
}

fn extract_missing_field(message: &str) -> Option<&str> {
    let prefix = "missing field `";
    let start = message.find(prefix)? + prefix.len();
    let remaining = message.get(start..)?;
    let end = remaining.find('`')?;
    remaining.get(..end)
}
