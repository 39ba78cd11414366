//! # Yatube Core
//!
//! The domain layer of the blog.
//! This crate contains pure business logic with zero infrastructure dependencies:
//! records, ports, feed pagination and the services handlers call into.

pub mod domain;
pub mod error;
pub mod feed;
pub mod ports;
pub mod services;

pub use error::{DomainError, RepoError};
