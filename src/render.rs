//! Feed rendering
//!
//! Posts become markup plus the list of actions wired to each post. Every
//! render produces the whole feed; [`FeedPage`] swaps it in wholesale.

use chirp_protocol::api::Post;
use chrono::{DateTime, Utc};

use crate::session::AuthorizedSession;

pub const EMPTY_FEED_MESSAGE: &str = "No posts yet. Be the first to post!";

const FALLBACK_INITIAL: &str = "U";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PostAction {
    Like,
    Delete,
}

impl PostAction {
    fn element_prefix(self) -> &'static str {
        match self {
            PostAction::Like => "like",
            PostAction::Delete => "delete",
        }
    }
}

/// An action control rendered for one post
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionBinding {
    pub post_id: i64,
    pub action: PostAction,
    pub element_id: String,
}

impl ActionBinding {
    fn new(post_id: i64, action: PostAction) -> Self {
        Self {
            post_id,
            action,
            element_id: format!("{}-{}", action.element_prefix(), post_id),
        }
    }
}

/// Rendered feed container
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FeedView {
    pub html: String,
    pub bindings: Vec<ActionBinding>,
}

impl FeedView {
    pub fn binding(&self, post_id: i64, action: PostAction) -> Option<&ActionBinding> {
        self.bindings
            .iter()
            .find(|b| b.post_id == post_id && b.action == action)
    }
}

/// The page's feed container, the posts behind it and the refresh ticket it
/// was rendered for
#[derive(Debug, Clone, Default)]
pub struct FeedPage {
    posts: Vec<Post>,
    view: FeedView,
    applied_ticket: u64,
}

impl FeedPage {
    pub fn posts(&self) -> &[Post] {
        &self.posts
    }

    pub fn view(&self) -> &FeedView {
        &self.view
    }

    pub fn applied_ticket(&self) -> u64 {
        self.applied_ticket
    }

    /// Replace the container with `view` unless a newer ticket is already
    /// shown. Returns whether the view was applied.
    pub fn apply(&mut self, ticket: u64, posts: Vec<Post>, view: FeedView) -> bool {
        if ticket < self.applied_ticket {
            return false;
        }
        self.applied_ticket = ticket;
        self.posts = posts;
        self.view = view;
        true
    }
}

/// Neutralizes `&`, `<`, `>`, `"` and `'`
pub fn escape_html(text: &str) -> String {
    html_escape::encode_quoted_attribute(text).into_owned()
}

pub fn format_relative_time(created: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let seconds = (now - created).num_seconds();
    let minutes = seconds / 60;
    let hours = minutes / 60;
    let days = hours / 24;

    if seconds < 60 {
        "Now".to_string()
    } else if minutes < 60 {
        format!("{}m", minutes)
    } else if hours < 24 {
        format!("{}h", hours)
    } else if days < 7 {
        format!("{}d", days)
    } else {
        created.format("%-m/%-d/%Y").to_string()
    }
}

pub fn author_initial(name: &str) -> String {
    name.chars()
        .next()
        .map(|c| c.to_uppercase().collect())
        .unwrap_or_else(|| FALLBACK_INITIAL.to_string())
}

/// One post's markup and its bindings. Delete is only bound on the viewer's
/// own posts.
pub fn render_post(
    post: &Post,
    viewer: &AuthorizedSession,
    now: DateTime<Utc>,
) -> (String, Vec<ActionBinding>) {
    let author = escape_html(&post.username);
    let like = ActionBinding::new(post.id, PostAction::Like);
    let delete = viewer
        .owns(&post.username)
        .then(|| ActionBinding::new(post.id, PostAction::Delete));

    let mut html = format!(
        r#"<div class="post" data-post-id="{id}">
  <div class="post-avatar"><div class="avatar-circle">{initial}</div></div>
  <div class="post-content">
    <div class="post-header">
      <span class="post-author">{author}</span>
      <span class="post-username">@{author}</span>
      <span class="post-time">· {time}</span>
    </div>
    <div class="post-text">{content}</div>
    <div class="post-actions">
      <button class="action-btn like-btn" id="{like_id}">{likes}</button>
"#,
        id = post.id,
        initial = escape_html(&author_initial(&post.username)),
        author = author,
        time = format_relative_time(post.created_at, now),
        content = escape_html(&post.content),
        like_id = like.element_id,
        likes = if post.like_count > 0 {
            post.like_count.to_string()
        } else {
            String::new()
        },
    );
    if let Some(delete) = &delete {
        html.push_str(&format!(
            "      <button class=\"action-btn delete-btn\" id=\"{}\">Delete</button>\n",
            delete.element_id
        ));
    }
    html.push_str("    </div>\n  </div>\n</div>\n");

    let mut bindings = vec![like];
    bindings.extend(delete);
    (html, bindings)
}

pub fn render_feed(posts: &[Post], viewer: &AuthorizedSession, now: DateTime<Utc>) -> FeedView {
    if posts.is_empty() {
        return FeedView {
            html: format!(
                "<div class=\"no-posts\"><p>{}</p></div>\n",
                escape_html(EMPTY_FEED_MESSAGE)
            ),
            bindings: Vec::new(),
        };
    }

    let mut view = FeedView::default();
    for post in posts {
        let (html, bindings) = render_post(post, viewer, now);
        view.html.push_str(&html);
        view.bindings.extend(bindings);
    }
    view
}

/// Standalone page: header with the viewer's handle and avatar, then the feed
pub fn render_document(view: &FeedView, viewer: &AuthorizedSession) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>chirp - Home</title>
</head>
<body>
<header class="home-header">
  <div class="avatar-circle" id="userAvatar">{initial}</div>
  <span id="currentUserName">@{handle}</span>
</header>
<main id="postsContainer">
{feed}</main>
</body>
</html>
"#,
        initial = escape_html(&author_initial(viewer.user.shown_name())),
        handle = escape_html(viewer.username()),
        feed = view.html,
    )
}
