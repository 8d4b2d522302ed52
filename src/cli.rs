use chrono::Utc;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use crate::auth::{AuthClient, AuthService};
use crate::config::{Config, ConfigService};
use crate::error::{ChirpError, Result};
use crate::feed::FeedController;
use crate::posts::PostClient;
use crate::render::{render_document, FeedPage};
use crate::session::{AuthorizedSession, SessionGuard};
use crate::store::TokenStore;
use crate::ui::UI;
use crate::validation::RegistrationForm;
use crate::{
    Commands, ConfigArgs, DeleteArgs, HomeArgs, LikeArgs, LoginArgs, LogoutArgs, PostArgs,
    RegisterArgs, ResendCodeArgs, VerifyArgs,
};

/// CLI handler for processing commands
pub struct CliHandler {
    config_path: Option<PathBuf>,
    ui: UI,
}

impl CliHandler {
    /// Create a new CLI handler with a custom config path
    pub fn with_config_path(config_path: Option<PathBuf>) -> Self {
        Self {
            config_path,
            ui: UI::new(),
        }
    }

    /// Load configuration using the handler's config path
    async fn load_config(&self) -> Result<Config> {
        if let Some(path) = &self.config_path {
            Config::load_from(path).await
        } else {
            Config::load().await
        }
    }

    async fn auth_service(&self) -> Result<AuthService> {
        let config = self.load_config().await?;
        let store = TokenStore::open(&config)?;
        AuthService::new(config, store)
    }

    /// Session guard for the timeline commands
    async fn feed_controller(&self) -> Result<(Config, Arc<FeedController>)> {
        let config = self.load_config().await?;
        let store = TokenStore::open(&config)?;
        let session = SessionGuard::require(&store)?;
        let posts = PostClient::new(&config, &session, Arc::new(UI::new()))?;
        Ok((config, Arc::new(FeedController::new(session, posts))))
    }

    /// Execute a CLI command
    pub async fn execute(&mut self, command: Commands) -> Result<()> {
        match command {
            Commands::Login(args) => self.handle_login(args).await,
            Commands::Register(args) => self.handle_register(args).await,
            Commands::Verify(args) => self.handle_verify(args).await,
            Commands::ResendCode(args) => self.handle_resend_code(args).await,
            Commands::Home(args) => self.handle_home(args).await,
            Commands::Post(args) => self.handle_post(args).await,
            Commands::Like(args) => self.handle_like(args).await,
            Commands::Delete(args) => self.handle_delete(args).await,
            Commands::Logout(args) => self.handle_logout(args).await,
            Commands::Status => self.handle_status().await,
            Commands::Config(args) => self.handle_config(args).await,
        }
    }

    async fn handle_login(&mut self, args: LoginArgs) -> Result<()> {
        let mut service = self.auth_service().await?;
        let identifier = match args.identifier {
            Some(identifier) => identifier,
            None => self.ui.input("Username or email")?,
        };
        let password = match args.password {
            Some(password) => password,
            None => self.ui.password("Password")?,
        };

        let spinner = self.ui.spinner("Logging in...");
        let result = service.login(&identifier, &password).await;
        spinner.finish_and_clear();

        let session = result?;
        self.ui
            .success(&format!("Welcome, @{}!", session.user.username));
        self.ui.info("Run `chirp home` to see the timeline");
        Ok(())
    }

    async fn handle_register(&mut self, args: RegisterArgs) -> Result<()> {
        let config = self.load_config().await?;
        let client = AuthClient::new(&config)?;

        let form = RegistrationForm {
            username: match args.username {
                Some(username) => username,
                None => self.ui.input("Username")?,
            },
            email: match args.email {
                Some(email) => email,
                None => self.ui.input("Email")?,
            },
            password: self.ui.password("Password")?,
            confirm_password: self.ui.password("Confirm password")?,
        };

        let spinner = self.ui.spinner("Creating account...");
        let result = client.register(&form).await;
        spinner.finish_and_clear();

        self.ui.success(&result?);
        self.ui.info(&format!(
            "Confirm it with `chirp verify --username {}`",
            form.username.trim()
        ));
        Ok(())
    }

    async fn handle_verify(&mut self, args: VerifyArgs) -> Result<()> {
        let config = self.load_config().await?;
        let client = AuthClient::new(&config)?;

        let username = match args.username {
            Some(username) => username,
            None => self.ui.input("Username")?,
        };
        let code = match args.code {
            Some(code) => code,
            None => self.ui.input("Verification code")?,
        };

        let message = client.verify_code(&username, &code).await?;
        self.ui.success(&message);
        self.ui.info("You can now log in with `chirp login`");
        Ok(())
    }

    async fn handle_resend_code(&mut self, args: ResendCodeArgs) -> Result<()> {
        let config = self.load_config().await?;
        let client = AuthClient::new(&config)?;

        let username = match args.username {
            Some(username) => username,
            None => self.ui.input("Username")?,
        };
        let message = client.resend_code(&username).await?;
        self.ui.success(&message);
        Ok(())
    }

    async fn handle_home(&mut self, args: HomeArgs) -> Result<()> {
        let (config, controller) = self.feed_controller().await?;

        let spinner = self.ui.spinner("Loading posts...");
        controller.refresh().await;
        spinner.finish_and_clear();

        let session = controller.session().clone();
        let page = controller.page();
        self.ui.print_feed(page.posts(), &session, Utc::now());
        if let Some(path) = &args.html {
            write_document(path, &page, &session).await?;
            self.ui.info(&format!("Timeline written to {}", path.display()));
        }

        if !args.watch {
            return Ok(());
        }

        self.ui.info(&format!(
            "Refreshing every {}s, press Ctrl-C to stop",
            config.refresh_interval
        ));
        let html = args.html.clone();
        controller
            .watch(
                Duration::from_secs(config.refresh_interval),
                move |page| {
                    UI::new().print_feed(page.posts(), &session, Utc::now());
                    if let Some(path) = html.clone() {
                        spawn_document_write(path, render_document(page.view(), &session));
                    }
                },
            )
            .await;
        Ok(())
    }

    async fn handle_post(&mut self, args: PostArgs) -> Result<()> {
        let (_, controller) = self.feed_controller().await?;
        let content = match args.content {
            Some(content) => content,
            None => self.ui.input("What's happening?")?,
        };

        if controller.create_post(&content).await?.is_some() {
            self.ui.success("Post published!");
            self.print_page(&controller);
        }
        Ok(())
    }

    async fn handle_like(&mut self, args: LikeArgs) -> Result<()> {
        let (_, controller) = self.feed_controller().await?;
        controller.refresh().await;

        if let Some(post) = controller.toggle_like(args.id).await? {
            self.ui.success(&format!(
                "Post #{} now has {} like(s)",
                post.id, post.like_count
            ));
            self.print_page(&controller);
        }
        Ok(())
    }

    async fn handle_delete(&mut self, args: DeleteArgs) -> Result<()> {
        let (_, controller) = self.feed_controller().await?;
        controller.refresh().await;

        if !args.force && !self.ui.confirm("Are you sure you want to delete this post?")? {
            self.ui.info("Delete cancelled");
            return Ok(());
        }

        if controller.delete_post(args.id).await? {
            self.ui.success("Post deleted");
            self.print_page(&controller);
        }
        Ok(())
    }

    async fn handle_logout(&mut self, args: LogoutArgs) -> Result<()> {
        let mut service = self.auth_service().await?;
        if !args.force && !self.ui.confirm("Are you sure you want to log out?")? {
            self.ui.info("Logout cancelled");
            return Ok(());
        }

        service.logout()?;
        self.ui.success("Logged out");
        Ok(())
    }

    async fn handle_status(&mut self) -> Result<()> {
        let service = self.auth_service().await?;
        let status = service.status();

        let mut rows = vec![
            ("Version", crate::version::format_version_info()),
            ("Session", self.ui.format_auth_status(status.authenticated)),
        ];
        if status.authenticated {
            rows.push(("Username", self.ui.format_user_field(status.username)));
            rows.push(("User id", self.ui.format_user_field(status.user_id)));
            let tokens = if status.session_complete {
                "complete"
            } else {
                "partial (log in again to refresh)"
            };
            rows.push(("Tokens", tokens.to_string()));
        }
        rows.push(("User service", status.user_service));
        rows.push(("Post service", status.post_service));

        self.ui.card("Status", rows);
        Ok(())
    }

    async fn handle_config(&mut self, args: ConfigArgs) -> Result<()> {
        let config = self.load_config().await?;
        let mut service = if let Some(path) = self.config_path.clone() {
            ConfigService::with_config_path(config, path)
        } else {
            ConfigService::new(config)
        };
        service.handle_config(args.command).await
    }

    fn print_page(&self, controller: &FeedController) {
        let page = controller.page();
        self.ui
            .print_feed(page.posts(), controller.session(), Utc::now());
    }
}

async fn write_document(path: &Path, page: &FeedPage, session: &AuthorizedSession) -> Result<()> {
    let document = render_document(page.view(), session);
    tokio::fs::write(path, document)
        .await
        .map_err(|e| ChirpError::storage_write(format!("Failed to write {}", path.display()), e))
}

/// Write the page off the refresh task; failures are only logged
fn spawn_document_write(path: PathBuf, document: String) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        if let Err(e) = tokio::fs::write(&path, document).await {
            tracing::error!(path = %path.display(), error = %e, "failed to write timeline page");
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::utils::test_helpers::create_temp_dir;

    #[tokio::test]
    async fn test_background_write_replaces_page() {
        let dir = create_temp_dir();
        let path = dir.path().join("timeline.html");

        spawn_document_write(path.clone(), "first".to_string()).await.unwrap();
        spawn_document_write(path.clone(), "second".to_string()).await.unwrap();

        assert_eq!(std::fs::read_to_string(&path).unwrap(), "second");
    }

    #[tokio::test]
    async fn test_background_write_failure_is_contained() {
        let dir = create_temp_dir();
        let path = dir.path().join("missing").join("timeline.html");

        spawn_document_write(path.clone(), "page".to_string()).await.unwrap();
        assert!(!path.exists());
    }
}
