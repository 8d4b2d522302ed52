use clap::{Args, Parser, Subcommand};
use std::path::{Path, PathBuf};

mod auth;
mod cli;
mod client;
mod config;
mod error;
mod feed;
mod posts;
mod render;
mod session;
mod store;
mod ui;
mod utils;
mod validation;
mod version;

#[cfg(test)]
mod tests;

use cli::CliHandler;
use ui::UI;
use version::CURRENT_VERSION;

#[derive(Parser)]
#[command(
    name = "chirp",
    about = "Terminal client for the chirp social feed",
    long_about = "chirp - Post short messages and follow the timeline from your terminal

WORKFLOW:
  1. Create an account and confirm it with the code sent by email
  2. Log in once; the session is kept until you log out
  3. Read the timeline, post, like and delete your own posts

QUICK START:
  chirp register                        # Create an account
  chirp verify --username <NAME>        # Confirm it with the emailed code
  chirp login                           # Start a session
  chirp home                            # Show the timeline
  chirp post \"hello\"                    # Publish a post (140 characters max)
  chirp home --watch                    # Keep the timeline refreshed",
    version = CURRENT_VERSION,
    arg_required_else_help = true
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Use this configuration file instead of the default one
    #[arg(long, global = true, env = "CHIRP_CONFIG")]
    pub config: Option<PathBuf>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in with your username or email
    #[command(aliases = &["signin"])]
    Login(LoginArgs),

    /// Create an account
    #[command(aliases = &["signup"])]
    Register(RegisterArgs),

    /// Confirm an account with the emailed code
    Verify(VerifyArgs),

    /// Send the verification code again
    ResendCode(ResendCodeArgs),

    /// Show the timeline
    #[command(aliases = &["feed"])]
    Home(HomeArgs),

    /// Publish a post
    Post(PostArgs),

    /// Like or unlike a post
    Like(LikeArgs),

    /// Delete one of your posts
    #[command(aliases = &["rm"])]
    Delete(DeleteArgs),

    /// End the session
    Logout(LogoutArgs),

    /// Show session and service settings
    #[command(aliases = &["st"])]
    Status,

    /// Configure settings
    #[command(aliases = &["cfg"])]
    Config(ConfigArgs),
}

#[derive(Args)]
pub struct LoginArgs {
    /// Username or email
    pub identifier: Option<String>,

    #[arg(long, env = "CHIRP_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

#[derive(Args)]
pub struct RegisterArgs {
    #[arg(short, long)]
    pub username: Option<String>,

    #[arg(short, long)]
    pub email: Option<String>,
}

#[derive(Args)]
pub struct VerifyArgs {
    #[arg(short, long)]
    pub username: Option<String>,

    /// The 6-digit code from the email
    pub code: Option<String>,
}

#[derive(Args)]
pub struct ResendCodeArgs {
    #[arg(short, long)]
    pub username: Option<String>,
}

#[derive(Args)]
pub struct HomeArgs {
    /// Keep refreshing until Ctrl-C
    #[arg(short, long)]
    pub watch: bool,

    /// Also write the timeline as an HTML page
    #[arg(long)]
    pub html: Option<PathBuf>,
}

#[derive(Args)]
pub struct PostArgs {
    /// Prompted for when omitted
    pub content: Option<String>,
}

#[derive(Args)]
pub struct LikeArgs {
    pub id: i64,
}

#[derive(Args)]
pub struct DeleteArgs {
    pub id: i64,

    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct LogoutArgs {
    #[arg(short, long)]
    pub force: bool,
}

#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub command: ConfigCommand,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    Show,
    SetUserService { url: String },
    SetPostService { url: String },
    SetTimeout { seconds: u64 },
    SetRefreshInterval { seconds: u64 },
    /// Log at debug level without passing --verbose
    SetVerbose {
        #[arg(action = clap::ArgAction::Set)]
        enabled: bool,
    },
    Reset,
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let verbose = cli.verbose || config_verbose(cli.config.as_deref());
    let log_level = if verbose { "debug" } else { "info" };
    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(format!("chirp={}", log_level))
        .with_target(false);
    subscriber.init();

    let mut handler = CliHandler::with_config_path(cli.config);

    if let Err(e) = handler.execute(cli.command).await {
        tracing::debug!(code = %e.code(), error = %e, "command failed");
        let ui = UI::new();
        ui.error(&format!("Error: {}", e.user_message()));
        if e.is_auth_error() {
            ui.info("Run `chirp login` to start a new session");
        } else if e.is_network_error() {
            ui.info("Check the service URLs with `chirp status`");
        }
        std::process::exit(1);
    }
}

/// The `verbose` key of the config file, read before logging starts. A broken
/// file is reported later by the command itself.
fn config_verbose(path: Option<&Path>) -> bool {
    let default_path = config::default_config_path();
    config::Config::from_file_and_env(Some(path.unwrap_or(&default_path)))
        .map(|config| config.verbose)
        .unwrap_or(false)
}
