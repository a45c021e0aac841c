// Local payload checks. Run before any request is built.

use serde_json::Value;

use crate::error::CoreError;
use crate::model::Payload;

fn to_object<P: Payload>(payload: &P) -> Result<serde_json::Map<String, Value>, CoreError> {
    match serde_json::to_value(payload) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(other) => Err(CoreError::Internal(format!(
            "payload serialized to {other}, expected an object"
        ))),
        Err(e) => Err(CoreError::Internal(format!("payload serialization: {e}"))),
    }
}

fn is_blank(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Every required field must be present and non-blank.
pub fn validate_draft<P: Payload>(draft: &P) -> Result<(), CoreError> {
    let body = to_object(draft)?;
    for field in P::REQUIRED {
        if body.get(*field).is_none_or(is_blank) {
            return Err(CoreError::validation(field, format!("{field} is required")));
        }
    }
    Ok(())
}

/// A patch must change something, and must not blank a required field.
pub fn validate_patch<P: Payload>(patch: &P) -> Result<(), CoreError> {
    let body = to_object(patch)?;
    if body.is_empty() {
        return Err(CoreError::Validation {
            field: None,
            message: "nothing to update".into(),
        });
    }
    for field in P::REQUIRED {
        if body.get(*field).is_some_and(is_blank) {
            return Err(CoreError::validation(
                field,
                format!("{field} cannot be blank"),
            ));
        }
    }
    Ok(())
}
