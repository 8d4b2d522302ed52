//! Post service client
//!
//! The public operations never fail: a failed list is an empty feed, a failed
//! mutation is `None`/`false`, and the reason goes to the [`Notifier`] and the
//! trace log.

use chirp_protocol::api::{CreatePostRequest, LikePostResponse, ListPostsResponse, Post};
use reqwest::Method;
use std::sync::Arc;
use validator::Validate;

use crate::client::BaseClient;
use crate::config::Config;
use crate::error::Result;
use crate::session::AuthorizedSession;

const POSTS_ENDPOINT: &str = "/api/posts";

/// Transient user-facing messages
pub trait Notifier: Send + Sync {
    fn notify(&self, message: &str);
}

/// Authenticated client for the post service
#[derive(Clone)]
pub struct PostClient {
    base_client: BaseClient,
    access_token: String,
    notifier: Arc<dyn Notifier>,
}

impl std::fmt::Debug for PostClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PostClient")
            .field("base_url", &self.base_client.base_url())
            .finish_non_exhaustive()
    }
}

impl PostClient {
    pub fn new(
        config: &Config,
        session: &AuthorizedSession,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self> {
        Ok(Self {
            base_client: BaseClient::new(config.post_service_url.clone(), config.timeout)?,
            access_token: session.access_token.clone(),
            notifier,
        })
    }

    /// Posts in the order the service returns them; empty on failure
    pub async fn list(&self) -> Vec<Post> {
        match self.try_list().await {
            Ok(posts) => posts,
            Err(e) => {
                tracing::error!(error = %e, "failed to load posts");
                self.notifier.notify("Could not load posts");
                Vec::new()
            }
        }
    }

    /// The created post, or `None` after notifying why
    pub async fn create(&self, content: &str) -> Option<Post> {
        match self.try_create(content).await {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::error!(error = %e, "failed to create post");
                self.notifier
                    .notify(&format!("Could not publish post: {}", e.user_message()));
                None
            }
        }
    }

    /// Whether the post was deleted. The caller confirms with the user first.
    pub async fn remove(&self, id: i64) -> bool {
        match self.try_remove(id).await {
            Ok(()) => true,
            Err(e) => {
                tracing::error!(post_id = id, error = %e, "failed to delete post");
                self.notifier.notify("Could not delete post");
                false
            }
        }
    }

    /// The post with its updated like count, or `None` on failure
    pub async fn toggle_like(&self, id: i64) -> Option<Post> {
        match self.try_toggle_like(id).await {
            Ok(post) => Some(post),
            Err(e) => {
                tracing::error!(post_id = id, error = %e, "failed to like post");
                self.notifier.notify("Could not like post");
                None
            }
        }
    }

    async fn try_list(&self) -> Result<ListPostsResponse> {
        self.base_client
            .request_with_bearer::<(), _>(
                Method::GET,
                POSTS_ENDPOINT,
                None,
                &self.access_token,
                "Could not load posts",
            )
            .await
    }

    async fn try_create(&self, content: &str) -> Result<Post> {
        let request = CreatePostRequest {
            content: content.to_string(),
        };
        request.validate()?;

        self.base_client
            .request_with_bearer(
                Method::POST,
                POSTS_ENDPOINT,
                Some(&request),
                &self.access_token,
                "Could not create post",
            )
            .await
    }

    async fn try_remove(&self, id: i64) -> Result<()> {
        self.base_client
            .send::<()>(
                Method::DELETE,
                &format!("{}/{}", POSTS_ENDPOINT, id),
                None,
                Some(&self.access_token),
            )
            .await?
            .into_result("Could not delete post")?;
        Ok(())
    }

    async fn try_toggle_like(&self, id: i64) -> Result<LikePostResponse> {
        self.base_client
            .request_with_bearer::<(), _>(
                Method::POST,
                &format!("{}/{}/like", POSTS_ENDPOINT, id),
                None,
                &self.access_token,
                "Could not like post",
            )
            .await
    }
}
