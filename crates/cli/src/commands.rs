use anyhow::{Context, Result, bail};
use clap::Subcommand;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use storefront_core::{ProfileUpdate, RegisterRequest, User};
use storefront_http::ApiClient;
use storefront_session::{FileStorage, SessionController, SessionStore};
use tracing::{debug, info};

use crate::config::StorefrontConfig;

/// Environment variable naming the data directory
pub const STATE_DIR_ENV: &str = "STOREFRONT_STATE_DIR";

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and persist the session
    Login {
        /// Account username
        #[arg(short, long)]
        username: String,

        /// Account password
        #[arg(short, long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,
    },
    /// End the session
    Logout {
        /// Only discard local tokens, do not revoke the refresh token
        #[arg(long)]
        local: bool,
    },
    /// Show the logged-in user
    Whoami,
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        email: String,

        #[arg(short, long, env = "STOREFRONT_PASSWORD", hide_env_values = true)]
        password: String,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,

        /// Log in with the new account afterwards
        #[arg(long)]
        login: bool,
    },
    /// Exchange the refresh token for a new access token
    Refresh,
    /// Show or edit the profile
    Profile {
        #[command(subcommand)]
        command: ProfileCommands,
    },
    /// Print the unverified claims of the stored access token
    Token,
}

#[derive(Subcommand)]
pub enum ProfileCommands {
    /// Show the profile
    Show,
    /// Update profile fields
    Update {
        #[arg(long)]
        email: Option<String>,

        #[arg(long)]
        first_name: Option<String>,

        #[arg(long)]
        last_name: Option<String>,
    },
}

/// Data directory: explicit flag, then `STOREFRONT_STATE_DIR`, then the platform data dir
pub fn resolve_data_dir(data_dir: Option<PathBuf>) -> PathBuf {
    data_dir
        .or_else(|| std::env::var_os(STATE_DIR_ENV).map(PathBuf::from))
        .unwrap_or_else(|| {
            dirs::data_dir()
                .unwrap_or_else(|| PathBuf::from("."))
                .join("storefront")
        })
}

/// Objects shared by every command
struct Session {
    client: ApiClient,
    store: SessionStore,
}

impl Session {
    fn open(config: &StorefrontConfig, data_dir: &Path) -> Result<Self> {
        let mut builder = ApiClient::builder().base_url(&config.api.base_url);
        if config.api.timeout_secs > 0 {
            builder = builder.timeout(Duration::from_secs(config.api.timeout_secs));
        }
        let client = builder.build().context("Failed to create API client")?;

        let file = config.storage.file_path(data_dir);
        debug!("Using session file {}", file.display());
        let storage = FileStorage::open(&file)
            .with_context(|| format!("Failed to open session file {}", file.display()))?;
        let store = SessionStore::with_keys(Arc::new(storage), config.storage.keys());

        Ok(Self { client, store })
    }

    async fn controller(&self) -> SessionController {
        SessionController::start(Arc::new(self.client.clone()), self.store.clone()).await
    }
}

impl Commands {
    pub async fn execute(self, config: &StorefrontConfig, data_dir: &Path) -> Result<()> {
        let session = Session::open(config, data_dir)?;

        if matches!(self, Self::Token) {
            return print_token(&session.store);
        }

        let controller = session.controller().await;

        match self {
            Self::Login { username, password } => {
                if !controller.login(&username, &password).await {
                    bail!("Login failed");
                }
                let user = controller.user().context("Session has no user")?;
                println!("Logged in as {}", user.display_name());
            }
            Self::Logout { local } => {
                if !controller.is_authenticated() {
                    println!("Not logged in");
                    return Ok(());
                }
                if local {
                    controller.logout();
                } else {
                    controller.revoke_and_logout().await;
                }
                println!("Logged out");
            }
            Self::Whoami => print_user(&require_user(&controller)?),
            Self::Register {
                username,
                email,
                password,
                first_name,
                last_name,
                login,
            } => {
                let request = RegisterRequest {
                    username: username.clone(),
                    email,
                    password: password.clone(),
                    password_confirm: Some(password.clone()),
                    first_name,
                    last_name,
                };
                let registration = session
                    .client
                    .register(&request)
                    .await
                    .context("Registration failed")?;
                info!(username = %registration.user.username, "Account registered");
                println!(
                    "{}",
                    registration
                        .message
                        .as_deref()
                        .unwrap_or("Account created")
                );
                print_user(&registration.user);

                if login {
                    if !controller.login(&username, &password).await {
                        bail!("Account created but login failed");
                    }
                    println!("Logged in as {username}");
                }
            }
            Self::Refresh => {
                if !controller.refresh().await {
                    bail!("Token refresh failed");
                }
                println!("Access token refreshed");
            }
            Self::Profile { command } => match command {
                ProfileCommands::Show => print_user(&require_user(&controller)?),
                ProfileCommands::Update {
                    email,
                    first_name,
                    last_name,
                } => {
                    let update = ProfileUpdate {
                        email,
                        username: None,
                        first_name,
                        last_name,
                    };
                    if update.is_empty() {
                        bail!("Nothing to update");
                    }
                    require_user(&controller)?;
                    if !controller.update_profile(&update).await {
                        bail!("Profile update failed");
                    }
                    print_user(&require_user(&controller)?);
                }
            },
            Self::Token => print_token(&session.store)?,
        }

        Ok(())
    }
}

fn require_user(controller: &SessionController) -> Result<User> {
    controller
        .user()
        .context("Not logged in, run `storefront login` first")
}

fn print_user(user: &User) {
    println!("User: {}", user.display_name());
    println!("  ID: {}", user.id);
    println!("  Username: {}", user.username);
    println!("  Email: {}", user.email);
}

fn print_token(store: &SessionStore) -> Result<()> {
    let Some(token) = store.access_token()? else {
        println!("No access token stored");
        return Ok(());
    };

    let claims = storefront_core::decode(&token).context("Stored access token is malformed")?;
    match storefront_core::expires_at(&token) {
        Some(at) => println!("Expires: {} ({})", at.to_rfc3339(), expiry_label(&token)),
        None => println!("Expires: {}", claims.exp),
    }
    println!("Claims:");
    println!("{}", serde_json::to_string_pretty(&claims)?);
    Ok(())
}

fn expiry_label(token: &str) -> &'static str {
    if storefront_core::is_expired(token) {
        "expired"
    } else {
        "valid"
    }
}
