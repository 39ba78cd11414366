//! # Yatube Shared
//!
//! Wire types shared by the server and its clients: form payloads,
//! the rendered page envelope and problem documents.

pub mod dto;
pub mod response;

pub use response::{ErrorResponse, Rendered};
