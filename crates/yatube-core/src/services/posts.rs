use std::collections::HashMap;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::domain::{Comment, Group, Post};
use crate::error::DomainError;
use crate::feed::{PostView, assemble_views};
use crate::ports::{
    CommentRepository, GroupRepository, MediaStorage, PostFilter, PostRepository, UserRepository,
};

/// Directory under the media root that holds post images.
pub const POST_IMAGE_DIR: &str = "posts";

/// An uploaded image file.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub content: Vec<u8>,
}

/// Validated post form data.
#[derive(Debug, Clone)]
pub struct PostDraft {
    pub text: String,
    pub group_id: Option<Uuid>,
    pub image: Option<ImageUpload>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum EditOutcome {
    Updated(Post),
    /// The editor is not the author; nothing was changed.
    NotAuthor(Post),
}

#[derive(Debug, Clone, Serialize)]
pub struct CommentView {
    pub id: Uuid,
    pub author: String,
    pub text: String,
    pub created_at: DateTime<Utc>,
}

/// Everything the post detail page shows.
#[derive(Debug, Clone, Serialize)]
pub struct PostDetail {
    pub post: PostView,
    pub author_post_count: u64,
    pub comments: Vec<CommentView>,
}

/// Post creation, editing, detail and comment submission.
#[derive(Clone)]
pub struct PostService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    comments: Arc<dyn CommentRepository>,
    media: Arc<dyn MediaStorage>,
}

impl PostService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        comments: Arc<dyn CommentRepository>,
        media: Arc<dyn MediaStorage>,
    ) -> Self {
        Self {
            users,
            groups,
            posts,
            comments,
            media,
        }
    }

    pub async fn find(&self, post_id: Uuid) -> Result<Post, DomainError> {
        self.posts
            .find_by_id(post_id)
            .await?
            .ok_or_else(|| DomainError::not_found("Post", post_id))
    }

    /// Choices for the group field of the post form.
    pub async fn group_choices(&self) -> Result<Vec<Group>, DomainError> {
        Ok(self.groups.list_all().await?)
    }

    pub async fn detail(&self, post_id: Uuid) -> Result<PostDetail, DomainError> {
        let post = self.find(post_id).await?;
        let author_post_count = self.posts.count(PostFilter::Author(post.author_id)).await?;

        let mut usernames: HashMap<Uuid, String> = HashMap::new();
        let mut comments = Vec::new();
        for comment in self.comments.find_by_post(post_id).await? {
            if !usernames.contains_key(&comment.author_id) {
                let author = self.users.find_by_id(comment.author_id).await?.ok_or_else(|| {
                    DomainError::Internal(format!(
                        "comment {} references a missing author",
                        comment.id
                    ))
                })?;
                usernames.insert(author.id, author.username);
            }
            comments.push(CommentView {
                id: comment.id,
                author: usernames[&comment.author_id].clone(),
                text: comment.text,
                created_at: comment.created_at,
            });
        }

        let post = assemble_views(self.users.as_ref(), self.groups.as_ref(), vec![post])
            .await?
            .remove(0);

        Ok(PostDetail {
            post,
            author_post_count,
            comments,
        })
    }

    async fn check_group(&self, group_id: Option<Uuid>) -> Result<(), DomainError> {
        if let Some(id) = group_id {
            if self.groups.find_by_id(id).await?.is_none() {
                return Err(DomainError::Validation(
                    "Select a valid choice. That choice is not one of the available choices."
                        .to_string(),
                ));
            }
        }
        Ok(())
    }

    async fn store_image(&self, image: &ImageUpload) -> Result<String, DomainError> {
        Ok(self
            .media
            .save(POST_IMAGE_DIR, &image.file_name, &image.content)
            .await?)
    }

    /// Best-effort removal of a stored image; failures are only logged.
    async fn discard_image(&self, path: &str, reason: &'static str) {
        if let Err(e) = self.media.remove(path).await {
            tracing::warn!(path = %path, error = %e, reason, "Failed to remove image");
        }
    }

    /// Publish a new post by `author_id`.
    pub async fn create(&self, author_id: Uuid, draft: PostDraft) -> Result<Post, DomainError> {
        self.check_group(draft.group_id).await?;

        let mut post = Post::new(author_id, draft.text, draft.group_id);
        if let Some(image) = &draft.image {
            post.image = Some(self.store_image(image).await?);
        }
        let stored = post.image.clone();

        match self.posts.create(post).await {
            Ok(post) => {
                tracing::info!(post_id = %post.id, %author_id, "Post created");
                Ok(post)
            }
            Err(e) => {
                if let Some(path) = stored {
                    self.discard_image(&path, "post insert failed").await;
                }
                Err(e.into())
            }
        }
    }

    /// Update text, group and (when a new one is uploaded) image in place.
    ///
    /// The replaced image file is removed only once the record is saved; if
    /// saving fails the new upload is removed instead.
    pub async fn edit(
        &self,
        post_id: Uuid,
        editor_id: Uuid,
        draft: PostDraft,
    ) -> Result<EditOutcome, DomainError> {
        let mut post = self.find(post_id).await?;
        if post.author_id != editor_id {
            tracing::warn!(%post_id, %editor_id, "Edit attempted by non-author");
            return Ok(EditOutcome::NotAuthor(post));
        }

        self.check_group(draft.group_id).await?;

        post.text = draft.text;
        post.group_id = draft.group_id;
        let (uploaded, previous) = match &draft.image {
            Some(image) => {
                let path = self.store_image(image).await?;
                let previous = post.image.replace(path.clone());
                (Some(path), previous)
            }
            None => (None, None),
        };

        match self.posts.update(post).await {
            Ok(post) => {
                if let Some(previous) = previous {
                    self.discard_image(&previous, "replaced").await;
                }
                tracing::info!(%post_id, "Post updated");
                Ok(EditOutcome::Updated(post))
            }
            Err(e) => {
                if let Some(path) = uploaded {
                    self.discard_image(&path, "post update failed").await;
                }
                Err(e.into())
            }
        }
    }

    /// Attach a comment by `author_id` to an existing post.
    pub async fn add_comment(
        &self,
        post_id: Uuid,
        author_id: Uuid,
        text: String,
    ) -> Result<Comment, DomainError> {
        let post = self.find(post_id).await?;
        let comment = self
            .comments
            .create(Comment::new(post.id, author_id, text))
            .await?;

        tracing::debug!(%post_id, comment_id = %comment.id, "Comment added");
        Ok(comment)
    }
}
