//! Feed assembly - paging and the display shape of posts in a feed.

use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::{Group, Post};
use crate::error::DomainError;
use crate::ports::{GroupRepository, UserRepository};

/// Fixed number of posts on every feed page.
pub const POSTS_PER_PAGE: u64 = 10;

/// Splits a collection of `total` items into pages of `per_page`.
///
/// Page numbers are 1-based. Lookups are lenient: a missing or non-numeric
/// page number yields the first page, and a number outside `1..=num_pages`
/// yields the last page.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Paginator {
    total: u64,
    per_page: u64,
}

/// Resolved position of one page inside the collection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageWindow {
    pub number: u64,
    pub num_pages: u64,
    pub offset: u64,
    pub limit: u64,
}

impl Paginator {
    pub fn new(total: u64, per_page: u64) -> Self {
        Self {
            total,
            per_page: per_page.max(1),
        }
    }

    pub fn total(&self) -> u64 {
        self.total
    }

    /// Number of pages; an empty collection still has one empty page.
    pub fn num_pages(&self) -> u64 {
        if self.total == 0 {
            1
        } else {
            self.total.div_ceil(self.per_page)
        }
    }

    pub fn page(&self, requested: Option<&str>) -> PageWindow {
        let last = self.num_pages();
        let number = match requested.map(str::trim) {
            None => 1,
            Some(raw) => match raw.parse::<i64>() {
                Ok(n) if n < 1 => last,
                Ok(n) if n as u64 > last => last,
                Ok(n) => n as u64,
                // Integers too large for i64 are still out of range.
                Err(_) if is_integer(raw) => last,
                Err(_) => 1,
            },
        };

        PageWindow {
            number,
            num_pages: last,
            offset: (number - 1) * self.per_page,
            limit: self.per_page,
        }
    }
}

fn is_integer(raw: &str) -> bool {
    let digits = raw.strip_prefix(['+', '-']).unwrap_or(raw);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

/// One page of a feed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Page<T> {
    pub items: Vec<T>,
    pub number: u64,
    pub num_pages: u64,
    pub total: u64,
    pub has_previous: bool,
    pub has_next: bool,
}

impl<T> Page<T> {
    pub fn new(items: Vec<T>, window: PageWindow, total: u64) -> Self {
        Self {
            items,
            number: window.number,
            num_pages: window.num_pages,
            total,
            has_previous: window.number > 1,
            has_next: window.number < window.num_pages,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// Group reference as shown next to a post.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupRef {
    pub id: Uuid,
    pub title: String,
    pub slug: String,
}

impl From<&Group> for GroupRef {
    fn from(group: &Group) -> Self {
        Self {
            id: group.id,
            title: group.title.clone(),
            slug: group.slug.clone(),
        }
    }
}

/// A post with its author and group resolved for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PostView {
    pub id: Uuid,
    pub text: String,
    pub author: String,
    pub author_id: Uuid,
    pub group: Option<GroupRef>,
    pub image: Option<String>,
    pub created_at: DateTime<Utc>,
}

/// Resolve authors and groups for a batch of posts, preserving order.
pub async fn assemble_views(
    users: &dyn UserRepository,
    groups: &dyn GroupRepository,
    posts: Vec<Post>,
) -> Result<Vec<PostView>, DomainError> {
    let mut usernames: HashMap<Uuid, String> = HashMap::new();
    let mut group_refs: HashMap<Uuid, GroupRef> = HashMap::new();
    let mut views = Vec::with_capacity(posts.len());

    for post in posts {
        if !usernames.contains_key(&post.author_id) {
            let author = users.find_by_id(post.author_id).await?.ok_or_else(|| {
                DomainError::Internal(format!("post {} references a missing author", post.id))
            })?;
            usernames.insert(author.id, author.username);
        }

        let group = match post.group_id {
            Some(group_id) => {
                if !group_refs.contains_key(&group_id) {
                    // A dangling group reference is shown as ungrouped.
                    if let Some(group) = groups.find_by_id(group_id).await? {
                        group_refs.insert(group_id, GroupRef::from(&group));
                    }
                }
                group_refs.get(&group_id).cloned()
            }
            None => None,
        };

        views.push(PostView {
            id: post.id,
            author: usernames[&post.author_id].clone(),
            author_id: post.author_id,
            text: post.text,
            group,
            image: post.image,
            created_at: post.created_at,
        });
    }

    Ok(views)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fifteen_items_split_ten_and_five() {
        let paginator = Paginator::new(15, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 2);

        let first = paginator.page(None);
        assert_eq!((first.number, first.offset, first.limit), (1, 0, 10));

        let second = paginator.page(Some("2"));
        assert_eq!((second.number, second.offset), (2, 10));
        assert_eq!(paginator.total() - second.offset, 5);
    }

    #[test]
    fn test_non_numeric_page_is_first() {
        let paginator = Paginator::new(35, POSTS_PER_PAGE);
        assert_eq!(paginator.page(Some("abc")).number, 1);
        assert_eq!(paginator.page(Some("")).number, 1);
        assert_eq!(paginator.page(Some("1.5")).number, 1);
        assert_eq!(paginator.page(Some("-")).number, 1);
    }

    #[test]
    fn test_out_of_range_page_clamps_to_last() {
        let paginator = Paginator::new(35, POSTS_PER_PAGE);
        assert_eq!(paginator.page(Some("99")).number, 4);
        assert_eq!(paginator.page(Some("0")).number, 4);
        assert_eq!(paginator.page(Some("-3")).number, 4);
        assert_eq!(paginator.page(Some("99")).offset, 30);
        assert_eq!(paginator.page(Some("99999999999999999999")).number, 4);
        assert_eq!(paginator.page(Some("-99999999999999999999")).number, 4);
    }

    #[test]
    fn test_empty_collection_has_one_page() {
        let paginator = Paginator::new(0, POSTS_PER_PAGE);
        assert_eq!(paginator.num_pages(), 1);
        let window = paginator.page(Some("7"));
        assert_eq!((window.number, window.offset), (1, 0));
    }

    #[test]
    fn test_page_flags() {
        let paginator = Paginator::new(25, POSTS_PER_PAGE);
        let middle: Page<u8> = Page::new(vec![0; 10], paginator.page(Some("2")), 25);
        assert!(middle.has_previous);
        assert!(middle.has_next);

        let last: Page<u8> = Page::new(vec![0; 5], paginator.page(Some("3")), 25);
        assert!(!last.has_next);
        assert_eq!(last.len(), 5);
    }
}
