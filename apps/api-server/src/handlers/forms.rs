//! Form contexts: field values plus per-field error messages for re-rendering.

use std::collections::BTreeMap;

use base64::{Engine, engine::general_purpose::STANDARD};
use serde::Serialize;
use uuid::Uuid;
use validator::ValidationErrors;

use yatube_core::domain::{Group, Post};
use yatube_core::services::{ImageUpload, PostDraft};
use yatube_shared::dto::PostForm;

pub type FieldErrors = BTreeMap<String, Vec<String>>;

const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Flatten validator output into `field -> messages`.
pub fn field_errors(errors: &ValidationErrors) -> FieldErrors {
    errors
        .field_errors()
        .into_iter()
        .map(|(field, errs)| {
            let messages = errs
                .iter()
                .map(|e| {
                    e.message
                        .as_ref()
                        .map(|m| m.to_string())
                        .unwrap_or_else(|| e.code.to_string())
                })
                .collect();
            (field.to_string(), messages)
        })
        .collect()
}

/// Post form as shown on the create/edit page.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PostFormView {
    pub text: String,
    pub group: Option<Uuid>,
    pub errors: FieldErrors,
}

impl PostFormView {
    pub fn from_post(post: &Post) -> Self {
        Self {
            text: post.text.clone(),
            group: post.group_id,
            errors: FieldErrors::new(),
        }
    }

    pub fn with_errors(form: &PostForm, errors: FieldErrors) -> Self {
        Self {
            text: form.text.clone(),
            group: form.group,
            errors,
        }
    }
}

/// Context of `posts/create_post.html`, used for both creating and editing.
#[derive(Debug, Clone, Serialize)]
pub struct PostFormContext {
    pub form: PostFormView,
    pub groups: Vec<Group>,
    pub is_edit: bool,
    pub post_id: Option<Uuid>,
}

/// Empty comment form shown under a post.
#[derive(Debug, Clone, Default, Serialize)]
pub struct CommentFormView {
    pub text: String,
}

/// Turn a submitted form into a draft, decoding the image payload.
///
/// Field errors are returned instead when the image is not valid base64
/// or has no usable file name.
pub fn into_draft(form: PostForm) -> Result<PostDraft, FieldErrors> {
    let image = match form.image {
        Some(payload) => {
            let content = STANDARD
                .decode(payload.content.trim())
                .ok()
                .filter(|bytes| !bytes.is_empty());
            match content {
                Some(content) if !payload.name.trim().is_empty() => Some(ImageUpload {
                    file_name: payload.name,
                    content,
                }),
                _ => {
                    let mut errors = FieldErrors::new();
                    errors.insert("image".to_string(), vec![INVALID_IMAGE.to_string()]);
                    return Err(errors);
                }
            }
        }
        None => None,
    };

    Ok(PostDraft {
        text: form.text,
        group_id: form.group,
        image,
    })
}
