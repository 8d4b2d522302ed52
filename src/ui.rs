use chirp_protocol::api::Post;
use chrono::{DateTime, Utc};
use console::{strip_ansi_codes, Term};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::OwoColorize;
use std::time::Duration;
use unicode_width::UnicodeWidthStr;

use crate::error::Result;
use crate::posts::Notifier;
use crate::render::{author_initial, format_relative_time, EMPTY_FEED_MESSAGE};
use crate::session::AuthorizedSession;

/// Terminal output and prompts
pub struct UI {
    term: Term,
}

impl UI {
    pub fn new() -> Self {
        Self {
            term: Term::stdout(),
        }
    }

    /// Helper method to conditionally apply color based on terminal support
    fn colorize<F>(&self, text: &str, color_fn: F) -> String
    where
        F: FnOnce(&str) -> String,
    {
        if self.supports_color() {
            color_fn(text)
        } else {
            text.to_string()
        }
    }

    /// Print a success message (color only if supported)
    pub fn success(&self, message: &str) {
        let output = self.colorize(message, |m| m.green().bold().to_string());
        println!("{}", output);
    }

    /// Print an error message (color only if supported)
    pub fn error(&self, message: &str) {
        let output = self.colorize(message, |m| m.red().bold().to_string());
        eprintln!("{}", output);
    }

    pub fn warning(&self, message: &str) {
        let output = self.colorize(message, |m| m.yellow().bold().to_string());
        println!("{}", output);
    }

    pub fn info(&self, message: &str) {
        let output = self.colorize(message, |m| m.blue().bold().to_string());
        println!("{}", output);
    }

    pub fn format_auth_status(&self, authenticated: bool) -> String {
        if authenticated {
            self.colorize("Logged in", |t| t.green().to_string())
        } else {
            self.colorize("Not logged in", |t| t.red().to_string())
        }
    }

    /// Format user field with fallback for missing data
    pub fn format_user_field(&self, value: Option<String>) -> String {
        value.unwrap_or_else(|| "-".to_string())
    }

    /// Print a section header
    pub fn header(&self, title: &str) {
        let term_width = self.width();
        let title_len = title.width() + 4;
        let line_len = if term_width > title_len {
            (term_width - title_len) / 2
        } else {
            0
        };

        let line = "═".repeat(line_len.min(30));
        println!();
        if self.supports_color() {
            println!("{} {} {}", line.cyan(), title.cyan().bold(), line.cyan());
        } else {
            println!("{} {} {}", line, title, line);
        }
        println!();
    }

    /// Print a separator line
    pub fn separator(&self) {
        let line = "─".repeat(self.width().min(80));
        if self.supports_color() {
            println!("{}", line.dimmed());
        } else {
            println!("{}", line);
        }
    }

    /// Create a card-style display for information
    pub fn card(&self, title: &str, content: Vec<(&str, String)>) {
        let card_width = self.width().saturating_sub(4).clamp(50, 80);
        let supports_color = self.supports_color();

        println!("╭{}╮", "─".repeat(card_width - 2));
        let title_spaces = card_width.saturating_sub(title.width() + 4);
        if supports_color {
            println!("│ {} {}│", title.cyan().bold(), " ".repeat(title_spaces));
        } else {
            println!("│ {} {}│", title, " ".repeat(title_spaces));
        }
        println!("├{}┤", "─".repeat(card_width - 2));

        for (label, value) in content {
            // Strip ANSI codes for width calculations
            let content_width = strip_ansi_codes(label).width()
                + strip_ansi_codes(&value).width()
                + 4;
            let spaces = if content_width < card_width - 1 {
                card_width - content_width - 1
            } else {
                1
            };

            if supports_color {
                println!("│ {}: {}{}│", label.dimmed(), value, " ".repeat(spaces));
            } else {
                println!("│ {}: {}{}│", label, value, " ".repeat(spaces));
            }
        }

        println!("╰{}╯", "─".repeat(card_width - 2));
        println!();
    }

    /// Draw the timeline the way the home page lays it out
    pub fn print_feed(&self, posts: &[Post], viewer: &AuthorizedSession, now: DateTime<Utc>) {
        let avatar = author_initial(viewer.user.shown_name());
        self.header(&format!("[{}] @{}", avatar, viewer.username()));

        if posts.is_empty() {
            self.info(EMPTY_FEED_MESSAGE);
            return;
        }

        for post in posts {
            println!("{}", self.post_heading(post, now));
            println!("    {}", post.content);

            let mut actions = format!("    #{}  ♥ {}", post.id, post.like_count);
            if viewer.owns(&post.username) {
                actions.push_str("  (yours, `chirp delete` to remove)");
            }
            println!("{}", self.colorize(&actions, |a| a.dimmed().to_string()));
            self.separator();
        }
    }

    fn post_heading(&self, post: &Post, now: DateTime<Utc>) -> String {
        let initial = author_initial(&post.username);
        let time = format_relative_time(post.created_at, now);
        if self.supports_color() {
            format!(
                "[{}] {} {} · {}",
                initial.red().bold(),
                post.username.bold(),
                format!("@{}", post.username).dimmed(),
                time.dimmed()
            )
        } else {
            format!("[{}] {} @{} · {}", initial, post.username, post.username, time)
        }
    }

    pub fn input(&self, prompt: &str) -> Result<String> {
        Ok(Input::<String>::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty(true)
            .interact_text()?)
    }

    pub fn password(&self, prompt: &str) -> Result<String> {
        Ok(Password::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .allow_empty_password(true)
            .interact()?)
    }

    pub fn confirm(&self, prompt: &str) -> Result<bool> {
        Ok(Confirm::with_theme(&ColorfulTheme::default())
            .with_prompt(prompt)
            .default(false)
            .interact()?)
    }

    /// Spinner shown while a request is in flight
    pub fn spinner(&self, message: &str) -> ProgressBar {
        let pb = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::default_spinner().template("{spinner:.cyan} {msg}") {
            pb.set_style(style);
        }
        pb.set_message(message.to_string());
        pb.enable_steady_tick(Duration::from_millis(100));
        pb
    }

    /// Get terminal width for responsive layout
    pub fn width(&self) -> usize {
        self.term.size().1 as usize
    }

    /// Check if terminal supports color
    pub fn supports_color(&self) -> bool {
        self.term.features().colors_supported()
    }
}

impl Default for UI {
    fn default() -> Self {
        Self::new()
    }
}

impl Notifier for UI {
    fn notify(&self, message: &str) {
        self.warning(message);
    }
}
