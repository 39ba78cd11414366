//! Application services - the page-serving and social-feed logic on top of the ports.

mod feed;
mod posts;
mod social;

pub use feed::{FeedService, GroupFeed, ProfileFeed};
pub use posts::{CommentView, EditOutcome, ImageUpload, PostDetail, PostDraft, PostService};
pub use social::{FollowOutcome, SocialService};
