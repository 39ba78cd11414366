//! # Yatube Infrastructure
//!
//! Concrete implementations of the ports defined in `yatube-core`.
//! This crate contains the record store, page cache, media and credential integrations.
//!
//! ## Feature Flags
//!
//! - `full` (default) - All features enabled
//! - `minimal` - No external dependencies, in-memory only
//! - `postgres` - PostgreSQL record store via SeaORM
//! - `auth` - JWT + Argon2 credential store
//! - `redis` - Redis-backed page cache

pub mod cache;
pub mod database;
pub mod media;

#[cfg(feature = "auth")]
pub mod auth;

// Re-exports - In-Memory
pub use cache::InMemoryCache;
pub use database::{DatabaseConnections, InMemoryDatabase};
pub use media::LocalMediaStorage;

#[cfg(feature = "auth")]
pub use auth::{Argon2PasswordService, JwtConfig, JwtTokenService};

// Re-exports - Redis
#[cfg(feature = "redis")]
pub use cache::{RedisCache, RedisConfig};
