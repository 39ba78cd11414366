//! Application state - shared across all handlers.

use std::sync::Arc;
use std::time::Duration;

use yatube_core::ports::{
    Cache, CacheError, CommentRepository, FollowRepository, GroupRepository, MediaStorage, PostRepository,
    UserRepository,
};
use yatube_core::services::{FeedService, PostService, SocialService};
use yatube_infra::cache::InMemoryCache;
use yatube_infra::database::{
    InMemoryCommentRepository, InMemoryDatabase, InMemoryFollowRepository,
    InMemoryGroupRepository, InMemoryPostRepository, InMemoryUserRepository,
};
use yatube_infra::media::LocalMediaStorage;

#[cfg(feature = "postgres")]
use yatube_infra::database::{
    DatabaseConnections, PostgresCommentRepository, PostgresFollowRepository,
    PostgresGroupRepository, PostgresPostRepository, PostgresUserRepository,
};

use crate::config::AppConfig;
use crate::page_cache::PageCache;

/// One repository per record type, all backed by the same store.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn GroupRepository>,
    pub posts: Arc<dyn PostRepository>,
    pub comments: Arc<dyn CommentRepository>,
    pub follows: Arc<dyn FollowRepository>,
}

impl Repositories {
    pub fn in_memory() -> Self {
        let db = InMemoryDatabase::new();
        Self {
            users: Arc::new(InMemoryUserRepository::new(db.clone())),
            groups: Arc::new(InMemoryGroupRepository::new(db.clone())),
            posts: Arc::new(InMemoryPostRepository::new(db.clone())),
            comments: Arc::new(InMemoryCommentRepository::new(db.clone())),
            follows: Arc::new(InMemoryFollowRepository::new(db)),
        }
    }

    #[cfg(feature = "postgres")]
    pub fn postgres(connections: &DatabaseConnections) -> Self {
        let conn = &connections.main;
        Self {
            users: Arc::new(PostgresUserRepository::new(conn.clone())),
            groups: Arc::new(PostgresGroupRepository::new(conn.clone())),
            posts: Arc::new(PostgresPostRepository::new(conn.clone())),
            comments: Arc::new(PostgresCommentRepository::new(conn.clone())),
            follows: Arc::new(PostgresFollowRepository::new(conn.clone())),
        }
    }
}

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub repos: Repositories,
    pub feed: FeedService,
    pub social: SocialService,
    pub posts: PostService,
    pub pages: PageCache,
    /// Name of the record store in use, reported by the health check.
    pub storage: &'static str,
}

impl AppState {
    /// Wire services over the given adapters.
    pub fn from_parts(
        repos: Repositories,
        cache: Arc<dyn Cache>,
        media: Arc<dyn MediaStorage>,
        page_cache_ttl: Duration,
        storage: &'static str,
    ) -> Self {
        let feed = FeedService::new(
            repos.users.clone(),
            repos.groups.clone(),
            repos.posts.clone(),
            repos.follows.clone(),
        );
        let social = SocialService::new(repos.users.clone(), repos.follows.clone());
        let posts = PostService::new(
            repos.users.clone(),
            repos.groups.clone(),
            repos.posts.clone(),
            repos.comments.clone(),
            media,
        );

        Self {
            repos,
            feed,
            social,
            posts,
            pages: PageCache::new(cache, page_cache_ttl),
            storage,
        }
    }

    /// State backed entirely by in-memory adapters.
    pub fn in_memory(media_root: impl Into<std::path::PathBuf>, page_cache_ttl: Duration) -> Self {
        Self::from_parts(
            Repositories::in_memory(),
            Arc::new(InMemoryCache::new()),
            Arc::new(LocalMediaStorage::new(media_root)),
            page_cache_ttl,
            "memory",
        )
    }

    /// Build the application state with appropriate implementations.
    pub async fn new(config: &AppConfig) -> Result<Self, CacheError> {
        let cache = build_cache(config).await?;
        let media: Arc<dyn MediaStorage> = Arc::new(LocalMediaStorage::new(&config.media_root));

        #[cfg(feature = "postgres")]
        let (repos, storage) = {
            if let Some(db_config) = &config.database {
                let connected = match DatabaseConnections::init(db_config).await {
                    Ok(connections) => connections.ping().await.map(|_| connections),
                    Err(e) => Err(e),
                };
                match connected {
                    Ok(connections) => (Repositories::postgres(&connections), "postgres"),
                    Err(e) => {
                        tracing::error!(
                            "Failed to connect to database: {}. Using in-memory fallback.",
                            e
                        );
                        (Repositories::in_memory(), "memory")
                    }
                }
            } else {
                tracing::warn!("DATABASE_URL not set. Running without database (in-memory mode).");
                (Repositories::in_memory(), "memory")
            }
        };

        #[cfg(not(feature = "postgres"))]
        let (repos, storage) = {
            tracing::info!("Running without postgres feature - using in-memory repositories");
            (Repositories::in_memory(), "memory")
        };

        tracing::info!(
            storage,
            page_cache_secs = config.page_cache_ttl.as_secs(),
            "Application state initialized"
        );

        Ok(Self::from_parts(
            repos,
            cache,
            media,
            config.page_cache_ttl,
            storage,
        ))
    }
}

async fn build_cache(config: &AppConfig) -> Result<Arc<dyn Cache>, CacheError> {
    #[cfg(feature = "redis")]
    if let Some(url) = &config.redis_url {
        use yatube_infra::cache::{RedisCache, RedisConfig};

        let redis_config = RedisConfig {
            url: url.clone(),
            ..RedisConfig::from_env()
        };
        match RedisCache::new(redis_config.clone()).await {
            Ok(cache) => return Ok(Arc::new(cache)),
            Err(e) if redis_config.fallback_to_memory => {
                tracing::warn!(error = %e, "Redis unavailable, using in-memory page cache");
            }
            Err(e) => return Err(e),
        }
    }

    #[cfg(not(feature = "redis"))]
    if config.redis_url.is_some() {
        tracing::warn!("REDIS_URL set but the redis feature is disabled");
    }

    Ok(Arc::new(InMemoryCache::new()))
}
