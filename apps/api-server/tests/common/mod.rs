//! Shared fixtures for the server integration tests.

#![allow(dead_code)]

use std::sync::Arc;
use std::time::Duration;

use actix_web::http::header;
use actix_web::web;
use async_trait::async_trait;
use tempfile::TempDir;
use uuid::Uuid;

use api_server::configure_app;
use api_server::state::{AppState, Repositories};
use yatube_core::RepoError;
use yatube_core::domain::{Follow, Group, Post, User};
use yatube_core::ports::{
    BaseRepository, FollowRepository, PasswordService, PostFilter, PostRepository, TokenService,
};
use yatube_infra::{
    Argon2PasswordService, InMemoryCache, JwtConfig, JwtTokenService, LocalMediaStorage,
};

pub struct Harness {
    pub state: AppState,
    pub tokens: Arc<dyn TokenService>,
    pub passwords: Arc<dyn PasswordService>,
    pub media: TempDir,
}

impl Harness {
    pub fn new() -> Self {
        let media = tempfile::tempdir().unwrap();
        let state = AppState::in_memory(media.path(), Duration::from_secs(20));
        Self::assemble(state, media)
    }

    /// State over custom repositories, with the in-memory cache and a temp media root.
    pub fn with_repos(repos: Repositories) -> Self {
        let media = tempfile::tempdir().unwrap();
        let state = AppState::from_parts(
            repos,
            Arc::new(InMemoryCache::new()),
            Arc::new(LocalMediaStorage::new(media.path())),
            Duration::from_secs(20),
            "memory",
        );
        Self::assemble(state, media)
    }

    fn assemble(state: AppState, media: TempDir) -> Self {
        Self {
            state,
            tokens: Arc::new(JwtTokenService::new(JwtConfig {
                secret: "test-secret".to_string(),
                ..JwtConfig::default()
            })),
            passwords: Arc::new(Argon2PasswordService::new()),
            media,
        }
    }

    pub fn configure(&self) -> impl FnOnce(&mut web::ServiceConfig) {
        configure_app(
            self.state.clone(),
            self.tokens.clone(),
            self.passwords.clone(),
        )
    }

    pub async fn user(&self, username: &str) -> User {
        self.state
            .repos
            .users
            .create(User::new(username.to_string(), "unusable".to_string()))
            .await
            .unwrap()
    }

    pub fn bearer(&self, user: &User) -> (header::HeaderName, String) {
        let token = self.tokens.generate_token(user.id, &user.username).unwrap();
        (header::AUTHORIZATION, format!("Bearer {}", token))
    }

    pub async fn group(&self, title: &str, slug: &str) -> Group {
        self.state
            .repos
            .groups
            .create(Group::new(
                title.to_string(),
                slug.to_string(),
                "Test description".to_string(),
            ))
            .await
            .unwrap()
    }

    pub async fn post(&self, author: &User, text: &str, group: Option<&Group>) -> Post {
        self.state
            .repos
            .posts
            .create(Post::new(author.id, text.to_string(), group.map(|g| g.id)))
            .await
            .unwrap()
    }

    pub async fn posts(&self, author: &User, count: usize, group: Option<&Group>) -> Vec<Post> {
        let mut created = Vec::with_capacity(count);
        for i in 0..count {
            created.push(self.post(author, &format!("Test post {}", i), group).await);
        }
        created
    }

    pub async fn post_count(&self) -> u64 {
        self.state.repos.posts.count(PostFilter::All).await.unwrap()
    }
}

pub fn location(resp: &actix_web::dev::ServiceResponse) -> String {
    resp.headers()
        .get(header::LOCATION)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Post store whose writes fail after seeding, for exercising rollback paths.
pub struct FailingWrites {
    pub inner: Arc<dyn PostRepository>,
}

#[async_trait]
impl BaseRepository<Post, Uuid> for FailingWrites {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Post>, RepoError> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, _entity: Post) -> Result<Post, RepoError> {
        Err(RepoError::Query("insert rejected".to_string()))
    }

    async fn update(&self, _entity: Post) -> Result<Post, RepoError> {
        Err(RepoError::Query("update rejected".to_string()))
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl PostRepository for FailingWrites {
    async fn count(&self, filter: PostFilter) -> Result<u64, RepoError> {
        self.inner.count(filter).await
    }

    async fn find_page(
        &self,
        filter: PostFilter,
        offset: u64,
        limit: u64,
    ) -> Result<Vec<Post>, RepoError> {
        self.inner.find_page(filter, offset, limit).await
    }
}

/// Follow store that never sees an existing edge before inserting, like a
/// request racing another one for the same pair.
pub struct StaleFollowReads {
    pub inner: Arc<dyn FollowRepository>,
}

#[async_trait]
impl BaseRepository<Follow, Uuid> for StaleFollowReads {
    async fn find_by_id(&self, id: Uuid) -> Result<Option<Follow>, RepoError> {
        self.inner.find_by_id(id).await
    }

    async fn create(&self, entity: Follow) -> Result<Follow, RepoError> {
        self.inner.create(entity).await
    }

    async fn update(&self, entity: Follow) -> Result<Follow, RepoError> {
        self.inner.update(entity).await
    }

    async fn delete(&self, id: Uuid) -> Result<(), RepoError> {
        self.inner.delete(id).await
    }
}

#[async_trait]
impl FollowRepository for StaleFollowReads {
    async fn find_pair(
        &self,
        _user_id: Uuid,
        _author_id: Uuid,
    ) -> Result<Option<Follow>, RepoError> {
        Ok(None)
    }

    async fn delete_pair(&self, user_id: Uuid, author_id: Uuid) -> Result<u64, RepoError> {
        self.inner.delete_pair(user_id, author_id).await
    }
}
