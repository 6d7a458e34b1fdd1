//! `apayctl`: log in, inspect the stored session and check routes from a shell.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use apay_config::ConfigLoader;
use apay_core::{
    ClientContext, Credentials, GuardPhase, NavigationSnapshot, Navigator, Render, RouteGuard,
};
use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(
    name = "apayctl",
    about = "Drive the A-Pay client session and route guard from a terminal"
)]
struct Cli {
    /// TOML configuration file (defaults to $APAY_CONFIG)
    #[arg(long, global = true)]
    config: Option<PathBuf>,
    /// Env file layered over the configuration (defaults to ./.env if present)
    #[arg(long, global = true)]
    env_file: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Authenticate against the backend and persist the session
    Login {
        #[arg(short, long)]
        user: String,
        #[arg(short, long)]
        password: String,
    },
    /// Forget the persisted session
    Logout,
    /// Print the persisted identity
    Whoami,
    /// Decide whether the current session may view a path
    Check { path: String },
    /// Follow the session and report guard output until interrupted
    Watch {
        /// Path the view starts on
        #[arg(long, default_value = "/")]
        path: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();
    let context = load_context(cli.config.as_deref(), cli.env_file.as_deref())?;

    match cli.command {
        Command::Login { user, password } => login(&context, user, password).await,
        Command::Logout => {
            context.logout().await;
            println!("logged out");
            Ok(())
        }
        Command::Whoami => whoami(&context).await,
        Command::Check { path } => check(&context, &path).await,
        Command::Watch { path } => watch(&context, &path).await,
    }
}

fn load_context(config: Option<&Path>, env_file: Option<&Path>) -> Result<ClientContext> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = config {
        loader = loader.with_config_file(path);
    }
    match env_file {
        Some(path) => loader = loader.with_env_file(path),
        None if Path::new(".env").is_file() => loader = loader.with_env_file(".env"),
        None => {}
    }

    let loaded = loader.load().context("failed to load configuration")?;
    tracing::debug!(
        server = %loaded.config.server_url,
        storage = %loaded.config.session.storage_dir.display(),
        "configuration loaded"
    );
    ClientContext::from_config(loaded.config).context("failed to initialise client")
}

async fn login(context: &ClientContext, user: String, password: String) -> Result<()> {
    let identity = context
        .login(&Credentials::new(user, password))
        .await
        .context("login failed")?;
    println!(
        "logged in as {} ({}), landing on {}",
        identity.username,
        identity.role,
        context.policy.landing(identity.role)
    );
    Ok(())
}

async fn whoami(context: &ClientContext) -> Result<()> {
    match context.store.current_identity().await {
        Some(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
        None => println!("anonymous"),
    }
    Ok(())
}

async fn check(context: &ClientContext, path: &str) -> Result<()> {
    context.store.current_identity().await;
    let mut guard = RouteGuard::new(context.policy.clone());
    guard.step(&context.store.state(), &NavigationSnapshot::at(path));

    match guard.phase() {
        GuardPhase::Authorized => println!("authorized"),
        GuardPhase::Unauthorized { redirect } => println!("redirect {redirect}"),
        GuardPhase::Init | GuardPhase::Evaluating => println!("pending"),
    }
    Ok(())
}

fn describe(render: Render) -> &'static str {
    match render {
        Render::Nothing => "nothing",
        Render::Loading => "loading",
        Render::Children => "content",
    }
}

async fn watch(context: &ClientContext, path: &str) -> Result<()> {
    let _sync = context.start_sync();
    let (runner, mut render) = context.guard_runner();
    let guard = runner.spawn();
    let mut navigation = context.navigator.subscribe();

    context.navigator.visit(path);
    context.store.current_identity().await;

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            result = &mut ctrl_c => {
                result.context("failed to listen for ctrl-c")?;
                break;
            }
            changed = render.changed() => {
                if changed.is_err() {
                    break;
                }
                let current = *render.borrow_and_update();
                println!("render {}", describe(current));
            }
            changed = navigation.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = navigation.borrow_and_update().clone();
                if let Some(path) = snapshot.resolved_path() {
                    println!("at {path}");
                }
            }
        }
    }

    guard.abort();
    Ok(())
}
