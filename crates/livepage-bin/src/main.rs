//! livepage entrypoint.
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use core_config::{Config, load_from};
use core_state::ProjectBinding;
use core_store::{DomainAllowList, FsStore, IdentityProvider, LocalIdentity, User};
use std::path::{Path, PathBuf};
use std::sync::Once;
use std::time::Duration;
use tracing::{error, info};
use tracing_appender::non_blocking::WorkerGuard;

mod projects;
mod runtime;

const LOG_FILE: &str = "livepage.log";

/// CLI arguments.
#[derive(Parser, Debug)]
#[command(name = "livepage", version, about = "Live paginated Typst preview")]
struct Args {
    /// Optional configuration file path (overrides discovery of `livepage.toml`).
    #[arg(long = "config", global = true)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Preview a local file, recompiling whenever it changes.
    Watch {
        path: PathBuf,
        /// Project that `:w` saves into.
        #[arg(long)]
        project: Option<String>,
        /// Preview output directory (defaults to `[output] dir`).
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Create a project and print its id and file path.
    New {
        #[arg(long)]
        title: Option<String>,
    },
    /// List your projects, most recently updated first.
    List,
    /// Delete a project.
    Delete { id: String },
    /// Copy a project's document into a local file.
    Checkout { id: String, path: PathBuf },
}

struct AppStartup {
    log_guard: Option<WorkerGuard>,
}

impl AppStartup {
    fn new() -> Self {
        Self { log_guard: None }
    }

    fn configure_logging(&mut self) -> Result<()> {
        let log_dir = Path::new(".");
        let log_path = log_dir.join(LOG_FILE);
        if log_path.exists() {
            let _ = std::fs::remove_file(&log_path);
        }

        let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
        let (nb_writer, guard) = tracing_appender::non_blocking(file_appender);
        match tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_ansi(false)
            .with_writer(nb_writer)
            .try_init()
        {
            Ok(_) => {
                self.log_guard = Some(guard);
            }
            Err(_err) => {
                // Global tracing subscriber already installed; drop guard so writer shuts down.
            }
        }

        Ok(())
    }

    fn install_panic_hook() {
        static HOOK: Once = Once::new();
        HOOK.call_once(|| {
            let default_panic = std::panic::take_hook();
            std::panic::set_hook(Box::new(move |info| {
                tracing::error!(target: "runtime.panic", ?info, "panic");
                default_panic(info);
            }));
        });
    }
}

fn identity_for(config: &Config) -> LocalIdentity {
    LocalIdentity::new(DomainAllowList::new(&config.file.session.allowed_domains))
}

async fn signed_in(identity: &LocalIdentity, config: &Config) -> Result<User> {
    let email = config
        .file
        .session
        .email
        .as_deref()
        .context("no account configured; set `email` under [session] in livepage.toml")?;
    Ok(identity.sign_in(email).await?)
}

async fn dispatch(args: Args) -> Result<()> {
    let config = load_from(args.config.clone())?;
    let store = FsStore::new(config.file.store.root_or_default());
    let identity = identity_for(&config);
    info!(
        target: "runtime.startup",
        config_override = args.config.is_some(),
        store_root = %store.root().display(),
        "bootstrap_complete"
    );

    match args.command {
        Command::Watch { path, project, out } => {
            let binding = match project {
                Some(id) => {
                    let user = signed_in(&identity, &config).await?;
                    let project = projects::find(&store, &user, &id).await?;
                    Some(ProjectBinding::new(project.id, project.path))
                }
                None => None,
            };
            let out = out.unwrap_or_else(|| config.file.output.dir.clone());
            runtime::watch(&config, store, runtime::WatchOptions { path, binding, out }).await
        }
        Command::New { title } => {
            let user = signed_in(&identity, &config).await?;
            projects::create(&store, &user, title).await
        }
        Command::List => {
            let user = signed_in(&identity, &config).await?;
            projects::list(&store, &user).await
        }
        Command::Delete { id } => {
            let user = signed_in(&identity, &config).await?;
            projects::delete(&store, &user, &id).await
        }
        Command::Checkout { id, path } => {
            let user = signed_in(&identity, &config).await?;
            projects::checkout(&store, &user, &id, &path).await
        }
    }
}

fn main() -> Result<()> {
    let args = Args::parse();
    let mut startup = AppStartup::new();
    startup.configure_logging()?;
    AppStartup::install_panic_hook();
    info!(target: "runtime", "startup");

    let rt = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("building tokio runtime")?;
    let result = rt.block_on(dispatch(args));
    // Stdin reads park a blocking thread until the next newline; do not wait for it.
    rt.shutdown_timeout(Duration::from_millis(200));

    if let Err(err) = &result {
        error!(target: "runtime", error = %format!("{err:#}"), "exit_with_error");
    }
    info!(target: "runtime", "exit");
    drop(startup);
    result
}
