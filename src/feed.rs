//! Home timeline controller
//!
//! Owns the signed-in session, the post client and the rendered page. Every
//! mutation is followed by a full re-fetch. Refreshes are ticketed: a response
//! is only applied if no newer refresh has been applied before it, so slow
//! responses from overlapping refreshes cannot overwrite newer ones.

use chirp_protocol::api::Post;
use chrono::Utc;
use std::future::Future;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use crate::error::{ChirpError, Result};
use crate::posts::PostClient;
use crate::render::{render_feed, FeedPage, PostAction};
use crate::session::AuthorizedSession;
use crate::validation::validate_post_content;

#[derive(Debug)]
pub struct FeedController {
    session: AuthorizedSession,
    posts: PostClient,
    page: Mutex<FeedPage>,
    sequence: AtomicU64,
}

impl FeedController {
    pub fn new(session: AuthorizedSession, posts: PostClient) -> Self {
        Self {
            session,
            posts,
            page: Mutex::new(FeedPage::default()),
            sequence: AtomicU64::new(0),
        }
    }

    pub fn session(&self) -> &AuthorizedSession {
        &self.session
    }

    /// Copy of what is currently shown
    pub fn page(&self) -> FeedPage {
        self.lock_page().clone()
    }

    /// Take the next refresh ticket
    pub fn begin_refresh(&self) -> u64 {
        self.sequence.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Render `posts` and show them if `ticket` is not older than what is
    /// already shown
    pub fn complete_refresh(&self, ticket: u64, posts: Vec<Post>) -> bool {
        let view = render_feed(&posts, &self.session, Utc::now());
        let mut page = self.lock_page();
        let applied = page.apply(ticket, posts, view);
        if !applied {
            tracing::debug!(
                ticket,
                shown = page.applied_ticket(),
                "discarding stale feed response"
            );
        }
        applied
    }

    /// Fetch and re-render the whole feed
    pub async fn refresh(&self) -> bool {
        let ticket = self.begin_refresh();
        let posts = self.posts.list().await;
        self.complete_refresh(ticket, posts)
    }

    /// Publish a post and re-fetch. `Ok(None)` means the service rejected it
    /// and the notifier has already been told.
    pub async fn create_post(&self, raw: &str) -> Result<Option<Post>> {
        let content = validate_post_content(raw)?;
        let created = self.posts.create(&content).await;
        if let Some(post) = &created {
            tracing::info!(post_id = post.id, "post published");
            self.refresh().await;
        }
        Ok(created)
    }

    pub async fn toggle_like(&self, id: i64) -> Result<Option<Post>> {
        self.require_binding(id, PostAction::Like)?;
        let liked = self.posts.toggle_like(id).await;
        self.refresh().await;
        Ok(liked)
    }

    /// Delete one of the viewer's posts and re-fetch. Confirmation is the
    /// caller's job.
    pub async fn delete_post(&self, id: i64) -> Result<bool> {
        self.require_binding(id, PostAction::Delete)?;
        let removed = self.posts.remove(id).await;
        if removed {
            tracing::info!(post_id = id, "post deleted");
            self.refresh().await;
        }
        Ok(removed)
    }

    /// Refresh every `interval` until `shutdown` resolves. Each tick spawns
    /// its own refresh; `on_update` sees every page that gets applied.
    pub async fn watch_until<F, S>(self: Arc<Self>, interval: Duration, on_update: F, shutdown: S)
    where
        F: Fn(&FeedPage) + Send + Sync + 'static,
        S: Future<Output = ()>,
    {
        let on_update = Arc::new(on_update);
        let start = tokio::time::Instant::now() + interval;
        let mut ticker = tokio::time::interval_at(start, interval);
        tokio::pin!(shutdown);

        loop {
            tokio::select! {
                _ = &mut shutdown => {
                    tracing::debug!("feed watch stopped");
                    break;
                }
                _ = ticker.tick() => {
                    let controller = Arc::clone(&self);
                    let on_update = Arc::clone(&on_update);
                    tokio::spawn(async move {
                        if controller.refresh().await {
                            on_update(&controller.page());
                        }
                    });
                }
            }
        }
    }

    /// [`FeedController::watch_until`] stopped by Ctrl-C
    pub async fn watch<F>(self: Arc<Self>, interval: Duration, on_update: F)
    where
        F: Fn(&FeedPage) + Send + Sync + 'static,
    {
        let ctrl_c = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::warn!(error = %e, "could not listen for Ctrl-C");
                std::future::pending::<()>().await;
            }
        };
        self.watch_until(interval, on_update, ctrl_c).await;
    }

    fn require_binding(&self, id: i64, action: PostAction) -> Result<()> {
        let page = self.lock_page();
        if page.view().binding(id, action).is_some() {
            return Ok(());
        }
        if page.posts().iter().any(|post| post.id == id) {
            return Err(ChirpError::authorization("You can only delete your own posts"));
        }
        Err(ChirpError::invalid_input(format!(
            "Post {} is not in your feed",
            id
        )))
    }

    fn lock_page(&self) -> MutexGuard<'_, FeedPage> {
        self.page.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::mocks::{authorized_session, RecordingNotifier};
    use crate::tests::utils::test_helpers::{post_json, sample_post, test_config};
    use serde_json::json;
    use std::sync::atomic::AtomicUsize;
    use wiremock::matchers::{body_json, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn controller_for(server: &MockServer, username: &str) -> FeedController {
        let config = test_config(&server.uri(), &server.uri());
        let session = authorized_session(username, "tok");
        let notifier = Arc::new(RecordingNotifier::default());
        let posts = PostClient::new(&config, &session, notifier).unwrap();
        FeedController::new(session, posts)
    }

    async fn mount_feed(server: &MockServer, feed: serde_json::Value) {
        Mock::given(method("GET"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(200).set_body_json(feed))
            .mount(server)
            .await;
    }

    #[test]
    fn test_stale_response_never_replaces_newer() {
        let session = authorized_session("ana", "tok");
        let config = test_config("http://localhost:1", "http://localhost:1");
        let posts = PostClient::new(&config, &session, Arc::new(RecordingNotifier::default()))
            .unwrap();
        let controller = FeedController::new(session, posts);

        let slow = controller.begin_refresh();
        let fast = controller.begin_refresh();
        assert!(fast > slow);

        let now = Utc::now();
        assert!(controller.complete_refresh(fast, vec![sample_post(2, "bob", "newer", now)]));
        assert!(!controller.complete_refresh(slow, vec![sample_post(1, "bob", "older", now)]));

        let page = controller.page();
        assert_eq!(page.posts().len(), 1);
        assert_eq!(page.posts()[0].content, "newer");
        assert_eq!(page.applied_ticket(), fast);
    }

    #[tokio::test]
    async fn test_refresh_renders_feed() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            json!([post_json(1, "ana", "mine", 0), post_json(2, "bob", "theirs", 2)]),
        )
        .await;

        let controller = controller_for(&server, "ana");
        assert!(controller.refresh().await);

        let page = controller.page();
        let view = page.view();
        assert!(view.html.contains("mine"));
        assert!(view.binding(1, PostAction::Delete).is_some());
        assert!(view.binding(2, PostAction::Delete).is_none());
    }

    #[tokio::test]
    async fn test_create_then_list_includes_content() {
        let server = MockServer::start().await;
        let content = "a".repeat(140);
        Mock::given(method("POST"))
            .and(path("/api/posts"))
            .and(body_json(json!({ "content": content.clone() })))
            .respond_with(ResponseTemplate::new(201).set_body_json(post_json(7, "ana", &content, 0)))
            .expect(1)
            .mount(&server)
            .await;
        mount_feed(&server, json!([post_json(7, "ana", &content, 0)])).await;

        let controller = controller_for(&server, "ana");
        let created = controller.create_post(&format!("  {}  ", content)).await.unwrap();

        assert_eq!(created.map(|p| p.id), Some(7));
        assert!(controller.page().posts().iter().any(|p| p.content == content));
    }

    #[tokio::test]
    async fn test_create_rejects_invalid_content_locally() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/posts"))
            .respond_with(ResponseTemplate::new(201))
            .expect(0)
            .mount(&server)
            .await;

        let controller = controller_for(&server, "ana");
        assert!(controller.create_post("   ").await.unwrap_err().is_validation_error());
        assert!(controller
            .create_post(&"a".repeat(141))
            .await
            .unwrap_err()
            .is_validation_error());
    }

    #[tokio::test]
    async fn test_delete_requires_own_post() {
        let server = MockServer::start().await;
        mount_feed(
            &server,
            json!([post_json(1, "ana", "mine", 0), post_json(2, "bob", "theirs", 0)]),
        )
        .await;
        Mock::given(method("DELETE"))
            .and(path("/api/posts/1"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"message": "Post deleted"})))
            .expect(1)
            .mount(&server)
            .await;

        let controller = controller_for(&server, "ana");
        controller.refresh().await;

        assert!(controller.delete_post(2).await.unwrap_err().is_auth_error());
        assert!(controller.delete_post(99).await.is_err());
        assert!(controller.delete_post(1).await.unwrap());
    }

    #[tokio::test]
    async fn test_like_refetches() {
        let server = MockServer::start().await;
        mount_feed(&server, json!([post_json(2, "bob", "theirs", 0)])).await;
        Mock::given(method("POST"))
            .and(path("/api/posts/2/like"))
            .respond_with(ResponseTemplate::new(200).set_body_json(post_json(2, "bob", "theirs", 1)))
            .expect(1)
            .mount(&server)
            .await;

        let controller = controller_for(&server, "ana");
        controller.refresh().await;
        let before = controller.page().applied_ticket();

        let liked = controller.toggle_like(2).await.unwrap();
        assert_eq!(liked.map(|p| p.like_count), Some(1));
        assert!(controller.page().applied_ticket() > before);
    }

    #[tokio::test]
    async fn test_watch_refreshes_until_shutdown() {
        let server = MockServer::start().await;
        mount_feed(&server, json!([post_json(1, "bob", "hi", 0)])).await;

        let controller = Arc::new(controller_for(&server, "ana"));
        let updates = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&updates);

        Arc::clone(&controller)
            .watch_until(
                Duration::from_millis(20),
                move |page| {
                    assert_eq!(page.posts().len(), 1);
                    counter.fetch_add(1, Ordering::SeqCst);
                },
                tokio::time::sleep(Duration::from_millis(150)),
            )
            .await;
        tokio::time::sleep(Duration::from_millis(100)).await;

        assert!(updates.load(Ordering::SeqCst) >= 2);
        assert!(controller.page().applied_ticket() >= 2);
    }
}
