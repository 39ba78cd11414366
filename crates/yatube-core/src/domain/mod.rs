//! Domain entities - the core business objects.

mod comment;
mod follow;
mod group;
mod post;
mod user;

pub use comment::Comment;
pub use follow::Follow;
pub use group::Group;
pub use post::{POST_DISPLAY_CHARS, Post};
pub use user::User;
