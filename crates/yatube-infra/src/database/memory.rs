//! In-memory repositories - used when no database is configured and in tests.
//!
//! Every repository is a view over one shared [`InMemoryDatabase`], so the post
//! repository can see follow edges when building the personalized feed.
//! Data is lost on process restart.

use std::marker::PhantomData;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use yatube_core::domain::{Comment, Follow, Group, Post, User};
use yatube_core::error::RepoError;
use yatube_core::ports::{
    BaseRepository, CommentRepository, FollowRepository, GroupRepository, PostFilter,
    PostRepository, UserRepository,
};

/// Tables backing the in-memory repositories, in insertion order.
#[derive(Default)]
pub struct InMemoryDatabase {
    users: RwLock<Vec<User>>,
    groups: RwLock<Vec<Group>>,
    posts: RwLock<Vec<Post>>,
    comments: RwLock<Vec<Comment>>,
    follows: RwLock<Vec<Follow>>,
}

impl InMemoryDatabase {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }
}

/// A row type stored in [`InMemoryDatabase`].
pub trait Record: Clone + Send + Sync + 'static {
    fn table(db: &InMemoryDatabase) -> &RwLock<Vec<Self>>;

    fn id(&self) -> Uuid;

    /// Whether `self` violates a unique constraint held by `other`.
    fn conflicts_with(&self, _other: &Self) -> bool {
        false
    }
}

impl Record for User {
    fn table(db: &InMemoryDatabase) -> &RwLock<Vec<Self>> {
        &db.users
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.username == other.username
    }
}

impl Record for Group {
    fn table(db: &InMemoryDatabase) -> &RwLock<Vec<Self>> {
        &db.groups
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.slug == other.slug
    }
}

impl Record for Post {
    fn table(db: &InMemoryDatabase) -> &RwLock<Vec<Self>> {
        &db.posts
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Comment {
    fn table(db: &InMemoryDatabase) -> &RwLock<Vec<Self>> {
        &db.comments
    }

    fn id(&self) -> Uuid {
        self.id
    }
}

impl Record for Follow {
    fn table(db: &InMemoryDatabase) -> &RwLock<Vec<Self>> {
        &db.follows
    }

    fn id(&self) -> Uuid {
        self.id
    }

    fn conflicts_with(&self, other: &Self) -> bool {
        self.user_id == other.user_id && self.author_id == other.author_id
    }
}

/// Generic in-memory repository over one table of [`InMemoryDatabase`].
pub struct InMemoryRepository<T> {
    db: Arc<InMemoryDatabase>,
    _record: PhantomData<T>,
}

impl<T> InMemoryRepository<T> {
    pub fn new(db: Arc<InMemoryDatabase>) -> Self {
        Self {
            db,
            _record: PhantomData,
        }
    }
}

/// In-memory user repository.
pub type InMemoryUserRepository = InMemoryRepository<User>;

/// In-memory group repository.
pub type InMemoryGroupRepository = InMemoryRepository<Group>;

/// In-memory post repository.
pub type InMemoryPostRepository = InMemoryRepository<Post>;

/// In-memory comment repository.
pub type InMemoryCommentRepository = InMemoryRepository<Comment>;

/// In-memory follow repository.
pub type InMemoryFollowRepository = InMemoryRepository<Follow>;

#[async_trait]
impl<T: Record> BaseRepository<T, Uuid> for InMemoryRepository<T> {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<T>, RepoError> {
        let rows = T::table(&self.db).read().await;
        Ok(rows.iter().find(|row| row.id() == id).cloned())
    }

    async fn create(&self, entity: T) -> Result<T, RepoError> {
        let mut rows = T::table(&self.db).write().await;
        if rows
            .iter()
            .any(|row| row.id() == entity.id() || entity.conflicts_with(row))
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        rows.push(entity.clone());
        Ok(entity)
    }

    async fn update(&self, entity: T) -> Result<T, RepoError> {
        let mut rows = T::table(&self.db).write().await;
        if rows
            .iter()
            .any(|row| row.id() != entity.id() && entity.conflicts_with(row))
        {
            return Err(RepoError::Constraint("Entity already exists".to_string()));
        }

        let slot = rows
            .iter_mut()
            .find(|row| row.id() == entity.id())
            .ok_or(RepoError::NotFound)?;
        *slot = entity.clone();
        Ok(entity)
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        let mut rows = T::table(&self.db).write().await;
        let before = rows.len();
        rows.retain(|row| row.id() != id);

        if rows.len() == before {
            return Err(RepoError::NotFound);
        }
        Ok(())
    }
}

#[async_trait]
impl UserRepository for InMemoryUserRepository {
    async fn find_by_username(&self, username: &str) -> Result<Option<User>, RepoError> {
        let users = self.db.users.read().await;
        Ok(users.iter().find(|u| u.username == username).cloned())
    }
}

#[async_trait]
impl GroupRepository for InMemoryGroupRepository {
    async fn find_by_slug(&self, slug: &str) -> Result<Option<Group>, RepoError> {
        let groups = self.db.groups.read().await;
        Ok(groups.iter().find(|g| g.slug == slug).cloned())
    }

    async fn list_all(&self) -> Result<Vec<Group>, RepoError> {
        let mut groups = self.db.groups.read().await.clone();
        groups.sort_by(|a, b| a.title.cmp(&b.title));
        Ok(groups)
    }
}

impl InMemoryPostRepository {
    /// Matching posts, newest first. Posts created at the same instant keep
    /// reverse insertion order.
    async fn select(&self, filter: PostFilter) -> Vec<Post> {
        let authors: Option<Vec<Uuid>> = match filter {
            PostFilter::FollowedBy(user_id) => Some(
                self.db
                    .follows
                    .read()
                    .await
                    .iter()
                    .filter(|f| f.user_id == user_id)
                    .map(|f| f.author_id)
                    .collect(),
            ),
            _ => None,
        };

        let posts = self.db.posts.read().await;
        let mut selected: Vec<Post> = posts
            .iter()
            .rev()
            .filter(|post| match filter {
                PostFilter::All => true,
                PostFilter::Group(group_id) => post.group_id == Some(group_id),
                PostFilter::Author(author_id) => post.author_id == author_id,
                PostFilter::FollowedBy(_) => authors
                    .as_ref()
                    .is_some_and(|ids| ids.contains(&post.author_id)),
            })
            .cloned()
            .collect();

        selected.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        selected
    }
}

#[async_trait]
impl PostRepository for InMemoryPostRepository {
    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        Ok(self.select(filter).await.len() as u64)
    }

    async fn find_page(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        Ok(self
            .select(filter)
            .await
            .into_iter()
            .skip(offset as usize)
            .take(limit as usize)
            .collect())
    }
}

#[async_trait]
impl CommentRepository for InMemoryCommentRepository {
    async fn find_by_post(&self, post_id: Uuid) -> Result<Vec<Comment>, RepoError> {
        let mut comments: Vec<Comment> = self
            .db
            .comments
            .read()
            .await
            .iter()
            .filter(|c| c.post_id == post_id)
            .cloned()
            .collect();
        comments.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        Ok(comments)
    }
}

#[async_trait]
impl FollowRepository for InMemoryFollowRepository {
    async fn find_pair(
        &self,
        user_id: Uuid,
        author_id: Uuid,
    ) -> Result<Option<Follow>, RepoError> {
        let follows = self.db.follows.read().await;
        Ok(follows
            .iter()
            .find(|f| f.user_id == user_id && f.author_id == author_id)
            .cloned())
    }

    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError> {
        let mut follows = self.db.follows.write().await;
        let before = follows.len();
        follows.retain(|f| !(f.user_id == user_id && f.author_id == author_id));
        Ok((before - follows.len()) as u64)
    }
}
