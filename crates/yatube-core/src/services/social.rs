use std::sync::Arc;

use uuid::Uuid;

use crate::domain::Follow;
use crate::error::{DomainError, RepoError};
use crate::ports::{FollowRepository, UserRepository};

/// What a follow request ended up doing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FollowOutcome {
    Created,
    AlreadyFollowing,
    SelfFollow,
}

/// Follow/unfollow membership on the social graph.
#[derive(Clone)]
pub struct SocialService {
    users: Arc<dyn UserRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl SocialService {
    pub fn new(users: Arc<dyn UserRepository>, follows: Arc<dyn FollowRepository>) -> Self {
        Self { users, follows }
    }

    async fn author_id(&self, username: &str) -> Result<Uuid, DomainError> {
        self.users
            .find_by_username(username)
            .await?
            .map(|author| author.id)
            .ok_or_else(|| DomainError::not_found("User", username))
    }

    /// Make `user_id` follow `username`. Repeating the call is a no-op.
    pub async fn follow(&self, user_id: Uuid, username: &str) -> Result<FollowOutcome, DomainError> {
        let author_id = self.author_id(username).await?;

        if self.follows.exists(user_id, author_id).await? {
            return Ok(FollowOutcome::AlreadyFollowing);
        }
        if author_id == user_id {
            tracing::debug!(%user_id, "Ignoring self-follow");
            return Ok(FollowOutcome::SelfFollow);
        }

        match self.follows.create(Follow::new(user_id, author_id)).await {
            Ok(_) => {
                tracing::info!(%user_id, %author_id, "Follow created");
                Ok(FollowOutcome::Created)
            }
            // A concurrent request inserted the same edge first.
            Err(RepoError::Constraint(_)) => Ok(FollowOutcome::AlreadyFollowing),
            Err(e) => Err(e.into()),
        }
    }

    /// Remove the `user_id` → `username` edge. Returns whether one existed.
    pub async fn unfollow(&self, user_id: Uuid, username: &str) -> Result<bool, DomainError> {
        let author_id = self.author_id(username).await?;

        let removed = self.follows.delete_pair(user_id, author_id).await?;
        if removed > 0 {
            tracing::info!(%user_id, %author_id, "Follow removed");
        }

        Ok(removed > 0)
    }
}
