use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Number of characters of the text shown when a post is displayed inline.
pub const POST_DISPLAY_CHARS: usize = 15;

/// Post entity - a short text entry, optionally tagged to a group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Post {
    pub id: Uuid,
    pub author_id: Uuid,
    pub text: String,
    pub group_id: Option<Uuid>,
    /// Path of the attached image relative to the media root, e.g. `posts/cat.jpg`.
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl Post {
    /// Create a new post.
    pub fn new(author_id: Uuid, text: String, group_id: Option<Uuid>) -> Self {
        Self {
            id: Uuid::new_v4(),
            author_id,
            text,
            group_id,
            image: None,
            created_at: Utc::now(),
        }
    }

    pub fn with_image(mut self, image: impl Into<String>) -> Self {
        self.image = Some(image.into());
        self
    }
}

impl fmt::Display for Post {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let preview: String = self.text.chars().take(POST_DISPLAY_CHARS).collect();
        f.write_str(&preview)
    }
}
