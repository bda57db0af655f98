/// Request body validation
///
/// Request bodies are declared as [`Form`] types: serde for the shape,
/// `validator` for the field rules. Every rule runs, and all violations are
/// reported together in a single 400 response.
///
/// Forms should mark their fields `#[serde(default)]` so a missing field
/// reaches its validation rule instead of failing deserialization.
///
/// # Example
///
/// ```
/// use serde::Deserialize;
/// use uptask_api::middleware::validation::{form_errors, Form};
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct NoteForm {
///     #[serde(default)]
///     #[validate(length(min = 1, message = "El texto es requerido"))]
///     text: String,
/// }
///
/// impl Form for NoteForm {}
///
/// let errors = form_errors(&NoteForm { text: String::new() });
/// assert_eq!(errors[0].field, "text");
/// ```

use crate::error::{ApiError, ApiResult, ValidationErrorDetail};
use axum::{
    async_trait,
    extract::{rejection::JsonRejection, FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationError};

/// A validated request body
pub trait Form: DeserializeOwned + Validate + Send {
    /// Name of `field` as the client sent it
    fn wire_name(field: &str) -> String {
        field.to_string()
    }
}

/// Runs the form's rules, returning every violation
pub fn form_errors<T: Form>(form: &T) -> Vec<ValidationErrorDetail> {
    let Err(errors) = form.validate() else {
        return Vec::new();
    };

    errors
        .field_errors()
        .into_iter()
        .flat_map(|(field, violations)| {
            let name = T::wire_name(&field.to_string());
            violations.iter().map(move |violation| {
                ValidationErrorDetail::new(
                    name.clone(),
                    violation
                        .message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| "Valor no válido".to_string()),
                )
            })
        })
        .collect()
}

/// Fails with every collected violation, ordered by field
pub fn reject_if_any(mut errors: Vec<ValidationErrorDetail>) -> ApiResult<()> {
    if errors.is_empty() {
        return Ok(());
    }
    errors.sort_by(|a, b| a.field.cmp(&b.field));
    Err(ApiError::ValidationFailure(errors))
}

/// Rejects values that are empty once surrounding whitespace is removed
///
/// Text fields are stored trimmed, so `"   "` counts as missing.
pub fn not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        Err(ValidationError::new("blank"))
    } else {
        Ok(())
    }
}

/// A rule violation carrying `message`, for hand-written rules
pub fn violation(code: &'static str, message: &'static str) -> ValidationError {
    let mut error = ValidationError::new(code);
    error.message = Some(message.into());
    error
}

/// Deserializes a JSON body, mapping rejections to 400
pub async fn extract_form<T, S>(req: Request, state: &S) -> ApiResult<T>
where
    T: Form,
    S: Send + Sync,
{
    let Json(form) = Json::<T>::from_request(req, state)
        .await
        .map_err(json_rejection)?;
    Ok(form)
}

fn json_rejection(rejection: JsonRejection) -> ApiError {
    ApiError::BadRequest(rejection.body_text())
}

/// JSON body extractor that enforces the form's rules
pub struct ValidJson<T>(pub T);

#[async_trait]
impl<T, S> FromRequest<S> for ValidJson<T>
where
    T: Form,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let form = extract_form::<T, S>(req, state).await?;
        reject_if_any(form_errors(&form))?;
        Ok(ValidJson(form))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use validator::ValidationErrors;

    #[derive(Debug, Deserialize, Validate)]
    #[serde(rename_all = "camelCase")]
    struct SampleForm {
        #[serde(default)]
        #[validate(length(min = 1, message = "El nombre es requerido"))]
        first_name: String,

        #[serde(default)]
        #[validate(email(message = "El email no es válido"))]
        email: String,
    }

    impl Form for SampleForm {
        fn wire_name(field: &str) -> String {
            match field {
                "first_name" => "firstName".to_string(),
                other => other.to_string(),
            }
        }
    }

    struct Manual(bool);

    impl Validate for Manual {
        fn validate(&self) -> Result<(), ValidationErrors> {
            let mut errors = ValidationErrors::new();
            if !self.0 {
                errors.add("flag", violation("required", "Falta la marca"));
            }
            if errors.errors().is_empty() {
                Ok(())
            } else {
                Err(errors)
            }
        }
    }

    impl<'de> Deserialize<'de> for Manual {
        fn deserialize<D: serde::Deserializer<'de>>(d: D) -> Result<Self, D::Error> {
            bool::deserialize(d).map(Manual)
        }
    }

    impl Form for Manual {}

    #[test]
    fn test_all_violations_reported_with_wire_names() {
        let form = SampleForm {
            first_name: String::new(),
            email: "nope".to_string(),
        };

        let errors = form_errors(&form);
        assert_eq!(errors.len(), 2);

        match reject_if_any(errors) {
            Err(ApiError::ValidationFailure(errors)) => {
                assert_eq!(errors[0], ValidationErrorDetail::new("email", "El email no es válido"));
                assert_eq!(
                    errors[1],
                    ValidationErrorDetail::new("firstName", "El nombre es requerido")
                );
            }
            other => panic!("unexpected: {:?}", other),
        }
    }

    #[test]
    fn test_valid_form_has_no_errors() {
        let form = SampleForm {
            first_name: "Ana".to_string(),
            email: "ana@x.com".to_string(),
        };
        assert!(form_errors(&form).is_empty());
        assert!(reject_if_any(Vec::new()).is_ok());
    }

    #[test]
    fn test_hand_written_rule() {
        assert_eq!(
            form_errors(&Manual(false)),
            vec![ValidationErrorDetail::new("flag", "Falta la marca")]
        );
        assert!(form_errors(&Manual(true)).is_empty());
    }

    #[test]
    fn test_not_blank() {
        assert!(not_blank("P1").is_ok());
        assert!(not_blank("  P1 ").is_ok());
        assert!(not_blank("").is_err());
        assert!(not_blank(" \t\n ").is_err());
    }
}
