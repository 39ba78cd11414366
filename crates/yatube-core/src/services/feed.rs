use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::domain::Group;
use crate::error::DomainError;
use crate::feed::{POSTS_PER_PAGE, Page, Paginator, PostView, assemble_views};
use crate::ports::{FollowRepository, GroupRepository, PostFilter, PostRepository, UserRepository};

/// Group page: the group and one page of its posts.
#[derive(Debug, Clone, Serialize)]
pub struct GroupFeed {
    pub group: Group,
    pub page_obj: Page<PostView>,
}

/// Author profile: the author, one page of their posts and the viewer's follow state.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileFeed {
    pub author: String,
    pub author_id: Uuid,
    pub post_count: u64,
    pub following: bool,
    pub page_obj: Page<PostView>,
}

/// Selects, orders and paginates posts for the four feed contexts.
#[derive(Clone)]
pub struct FeedService {
    users: Arc<dyn UserRepository>,
    groups: Arc<dyn GroupRepository>,
    posts: Arc<dyn PostRepository>,
    follows: Arc<dyn FollowRepository>,
}

impl FeedService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        groups: Arc<dyn GroupRepository>,
        posts: Arc<dyn PostRepository>,
        follows: Arc<dyn FollowRepository>,
    ) -> Self {
        Self {
            users,
            groups,
            posts,
            follows,
        }
    }

    /// One page of posts matching `filter`, newest first.
    pub async fn page(
        &self,
        filter: PostFilter,
        requested: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        let total = self.posts.count(filter).await?;
        let window = Paginator::new(total, POSTS_PER_PAGE).page(requested);

        let posts = self
            .posts
            .find_page(filter, window.offset, window.limit)
            .await?;
        let items = assemble_views(self.users.as_ref(), self.groups.as_ref(), posts).await?;

        tracing::debug!(?filter, page = window.number, items = items.len(), "Feed page assembled");

        Ok(Page::new(items, window, total))
    }

    pub async fn global(&self, requested: Option<&str>) -> Result<Page<PostView>, DomainError> {
        self.page(PostFilter::All, requested).await
    }

    pub async fn group(
        &self,
        slug: &str,
        requested: Option<&str>,
    ) -> Result<GroupFeed, DomainError> {
        let group = self
            .groups
            .find_by_slug(slug)
            .await?
            .ok_or_else(|| DomainError::not_found("Group", slug))?;

        let page_obj = self.page(PostFilter::Group(group.id), requested).await?;
        Ok(GroupFeed { group, page_obj })
    }

    /// Profile feed for `username`; `viewer` is the authenticated requester, if any.
    pub async fn profile(
        &self,
        username: &str,
        viewer: Option<Uuid>,
        requested: Option<&str>,
    ) -> Result<ProfileFeed, DomainError> {
        let author = self
            .users
            .find_by_username(username)
            .await?
            .ok_or_else(|| DomainError::not_found("User", username))?;

        let following = match viewer {
            Some(viewer_id) => self.follows.exists(viewer_id, author.id).await?,
            None => false,
        };

        let page_obj = self.page(PostFilter::Author(author.id), requested).await?;

        Ok(ProfileFeed {
            author: author.username,
            author_id: author.id,
            post_count: page_obj.total,
            following,
            page_obj,
        })
    }

    /// Posts by the authors `user_id` follows.
    pub async fn following(
        &self,
        user_id: Uuid,
        requested: Option<&str>,
    ) -> Result<Page<PostView>, DomainError> {
        self.page(PostFilter::FollowedBy(user_id), requested).await
    }
}
