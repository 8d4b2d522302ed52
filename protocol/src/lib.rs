//! Wire types for the chirp user and post services
//!
//! - `api`: request/response DTOs per endpoint
//! - `common`: records shared across endpoints (posts, tokens, claims)

pub mod api;
pub mod common;
