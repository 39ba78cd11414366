//! Data Transfer Objects - form payloads accepted by the server.

use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

/// Text fields are required after trimming surrounding whitespace.
fn validate_not_blank(value: &str) -> Result<(), ValidationError> {
    if value.trim().is_empty() {
        return Err(ValidationError::new("required").with_message("This field is required.".into()));
    }
    Ok(())
}

/// Request to sign up with the credential store.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SignupRequest {
    #[validate(length(min = 1, max = 150), custom(function = "validate_not_blank"))]
    pub username: String,
    #[validate(length(min = 8, message = "Password must be at least 8 characters"))]
    pub password: String,
}

/// Request to log in.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

/// Response containing authentication tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

/// Uploaded image: file name plus base64-encoded bytes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImagePayload {
    pub name: String,
    pub content: String,
}

/// Post create/edit form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct PostForm {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,
    #[serde(default)]
    pub group: Option<Uuid>,
    #[serde(default)]
    pub image: Option<ImagePayload>,
}

/// Comment form - text only.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(custom(function = "validate_not_blank"))]
    pub text: String,
}

/// `?page=` query parameter shared by every feed.
///
/// Kept as a raw string so malformed values fall back to the first page
/// instead of failing extraction.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PageQuery {
    pub page: Option<String>,
}

/// `?next=` query parameter of the login page.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_blank_post_text_is_rejected() {
        let form = PostForm {
            text: "   ".to_string(),
            ..Default::default()
        };
        let errors = form.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("text"));
    }

    #[test]
    fn test_post_form_accepts_text_only() {
        let form: PostForm = serde_json::from_str(r#"{"text": "Test post"}"#).unwrap();
        assert!(form.validate().is_ok());
        assert!(form.group.is_none());
    }

    #[test]
    fn test_missing_comment_text_is_rejected() {
        let form: CommentForm = serde_json::from_str("{}").unwrap();
        assert!(form.validate().is_err());
    }

    #[test]
    fn test_short_password_is_rejected() {
        let req = SignupRequest {
            username: "auth".to_string(),
            password: "short".to_string(),
        };
        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("password"));
    }
}
