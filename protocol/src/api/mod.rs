//! API DTOs module
//!
//! This module contains all API data transfer objects organized by domain:
//! - `auth`: login, registration and e-mail verification
//! - `post`: timeline posts

pub mod auth;
pub mod post;

pub use auth::*;
pub use post::*;
