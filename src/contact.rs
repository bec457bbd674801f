use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Deserializer, de};
use thiserror::Error;
use validator::{Validate, ValidationErrors};

const REQUIRED: &str = "required";
const EMAIL_SHAPE: &str = "email_shape";

/// `local@domain.tld`, no whitespace or extra `@`. Shape only, deliverability is not checked.
static EMAIL_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").expect("valid email pattern"));

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContactValidationError {
    #[error("All fields are required")]
    MissingField,
    #[error("Invalid email address")]
    InvalidEmail,
}

/// Body of `POST /api/contact`. Absent, `null`, `false` and `0` deserialize to
/// `None`; other numbers and `true` are read as their text.
#[derive(Debug, Default, Deserialize, Validate)]
pub struct ContactRequest {
    #[serde(default, deserialize_with = "scalar_text")]
    #[validate(required(code = "required"), length(min = 1, code = "required"))]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    #[validate(
        required(code = "required"),
        length(min = 1, code = "required"),
        regex(path = *EMAIL_PATTERN, code = "email_shape")
    )]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "scalar_text")]
    #[validate(required(code = "required"), length(min = 1, code = "required"))]
    pub description: Option<String>,
}

fn scalar_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    deserializer.deserialize_any(ScalarTextVisitor)
}

struct ScalarTextVisitor;

impl<'de> de::Visitor<'de> for ScalarTextVisitor {
    type Value = Option<String>;

    fn expecting(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.write_str("a string, number, boolean or null")
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        Ok(Some(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Self::Value, E> {
        Ok(Some(v))
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Self::Value, E> {
        Ok(v.then(|| "true".to_string()))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok((v != 0).then(|| v.to_string()))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        Ok((v != 0).then(|| v.to_string()))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        Ok((v != 0.0).then(|| v.to_string()))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_none<E: de::Error>(self) -> Result<Self::Value, E> {
        Ok(None)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Self::Value, D::Error> {
        deserializer.deserialize_any(self)
    }
}

/// A submission whose fields have all been checked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactSubmission {
    pub name: String,
    pub email: String,
    pub description: String,
}

impl ContactRequest {
    pub fn into_submission(self) -> Result<ContactSubmission, ContactValidationError> {
        if let Err(errors) = self.validate() {
            return Err(classify(&errors));
        }
        match (self.name, self.email, self.description) {
            (Some(name), Some(email), Some(description)) => Ok(ContactSubmission {
                name,
                email,
                description,
            }),
            _ => Err(ContactValidationError::MissingField),
        }
    }
}

// A missing field wins over a malformed email.
fn classify(errors: &ValidationErrors) -> ContactValidationError {
    let codes: Vec<&str> = errors
        .field_errors()
        .into_values()
        .flat_map(|errs| errs.iter().map(|e| e.code.as_ref()))
        .collect();
    if codes.contains(&REQUIRED) {
        ContactValidationError::MissingField
    } else if codes.contains(&EMAIL_SHAPE) {
        ContactValidationError::InvalidEmail
    } else {
        ContactValidationError::MissingField
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(
        name: Option<&str>,
        email: Option<&str>,
        description: Option<&str>,
    ) -> ContactRequest {
        ContactRequest {
            name: name.map(str::to_string),
            email: email.map(str::to_string),
            description: description.map(str::to_string),
        }
    }

    #[test]
    fn test_valid_submission() {
        let submission = request(Some("Ravi"), Some("ravi@example.com"), Some("Need a quote"))
            .into_submission()
            .unwrap();
        assert_eq!(
            submission,
            ContactSubmission {
                name: "Ravi".to_string(),
                email: "ravi@example.com".to_string(),
                description: "Need a quote".to_string(),
            }
        );
    }

    #[test]
    fn test_missing_fields() {
        let cases = [
            request(None, Some("x@x.com"), Some("hi")),
            request(Some(""), Some("x@x.com"), Some("hi")),
            request(Some("A"), None, Some("hi")),
            request(Some("A"), Some(""), Some("hi")),
            request(Some("A"), Some("x@x.com"), None),
            request(Some("A"), Some("x@x.com"), Some("")),
            request(None, None, None),
        ];
        for case in cases {
            assert_eq!(
                case.into_submission(),
                Err(ContactValidationError::MissingField)
            );
        }
    }

    #[test]
    fn test_missing_field_takes_priority_over_bad_email() {
        assert_eq!(
            request(Some(""), Some("not-an-email"), Some("hi")).into_submission(),
            Err(ContactValidationError::MissingField)
        );
    }

    #[test]
    fn test_email_shape() {
        for bad in [
            "not-an-email",
            "a@b",
            "@example.com",
            "ravi@.com",
            "ravi@example.",
            "ra vi@example.com",
            "ravi@@example.com",
            "ravi@exa mple.com",
        ] {
            assert_eq!(
                request(Some("A"), Some(bad), Some("hi")).into_submission(),
                Err(ContactValidationError::InvalidEmail),
                "{bad} should be rejected"
            );
        }
        for good in ["x@x.com", "first.last@sub.example.co.in", "a+tag@b.c"] {
            assert!(
                request(Some("A"), Some(good), Some("hi"))
                    .into_submission()
                    .is_ok(),
                "{good} should be accepted"
            );
        }
    }

    #[test]
    fn test_whitespace_counts_as_present() {
        assert!(
            request(Some(" "), Some("x@x.com"), Some(" "))
                .into_submission()
                .is_ok()
        );
    }

    #[test]
    fn test_deserialize_absent_and_null() {
        let req: ContactRequest =
            serde_json::from_str(r#"{"name": null, "email": "x@x.com"}"#).unwrap();
        assert!(req.name.is_none());
        assert!(req.description.is_none());
        assert_eq!(
            req.into_submission(),
            Err(ContactValidationError::MissingField)
        );
    }

    #[test]
    fn test_deserialize_scalars_as_text() {
        let req: ContactRequest =
            serde_json::from_str(r#"{"name": 42, "email": 123, "description": true}"#).unwrap();
        assert_eq!(req.name.as_deref(), Some("42"));
        assert_eq!(req.email.as_deref(), Some("123"));
        assert_eq!(req.description.as_deref(), Some("true"));
        assert_eq!(
            req.into_submission(),
            Err(ContactValidationError::InvalidEmail)
        );

        let req: ContactRequest =
            serde_json::from_str(r#"{"name": 0, "email": "x@x.com", "description": false}"#)
                .unwrap();
        assert!(req.name.is_none());
        assert!(req.description.is_none());

        assert!(
            serde_json::from_str::<ContactRequest>(r#"{"name": ["A"], "email": "x@x.com"}"#)
                .is_err()
        );
    }
}
