//! Post API DTOs

use serde::{Deserialize, Serialize};
use validator::Validate;

pub use crate::common::Post;

/// Longest post the service accepts, in characters
pub const MAX_POST_LENGTH: usize = 140;

/// Create post request
///
/// Used for POST /api/posts
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePostRequest {
    #[validate(length(min = 1, max = 140))]
    pub content: String,
}

/// Create post response
pub type CreatePostResponse = Post;

/// Like post response; the service answers with the updated post
pub type LikePostResponse = Post;

/// List posts response (GET /api/posts)
pub type ListPostsResponse = Vec<Post>;
