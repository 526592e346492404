//! CLI entry point for the podhoard tool.

use std::process::ExitCode;
use std::sync::Arc;
use std::sync::atomic::Ordering;

use clap::Parser;
use dialoguer::{Input, Password};
use directories::BaseDirs;
use tracing::{debug, warn};

use podhoard::{
    CatalogProvider, DownloadEngine, LiveQueue, Retired, Settings, VideoPortal, discovery, report,
    settings::DEFAULT_SETTINGS_FILE, tui,
};

mod cli;

use cli::Args;

/// Process exit outcomes, one distinct code per early-exit condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ProcessExit {
    /// Normal completion, including the nothing-to-do case.
    Success = 0,
    /// Environment precondition failed (no home directory, broken prompt).
    Environment = 1,
    /// The settings file could not be parsed or validated.
    Settings = 2,
    /// The portal provider could not be constructed.
    ProviderInit = 3,
    /// Logging in failed at the transport/page level.
    LoginTransport = 4,
    /// The portal rejected the credentials.
    LoginIncorrect = 5,
    /// The course list could not be fetched.
    CourseList = 6,
}

impl From<ProcessExit> for ExitCode {
    fn from(exit: ProcessExit) -> Self {
        Self::from(exit as u8)
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    // Parse CLI arguments first (before tracing, so --help works without logs)
    let args = Args::parse();

    // Logs go to stderr at warn by default; stdout belongs to the live view.
    let default_level = if args.quiet {
        "error"
    } else {
        match args.verbose {
            0 => "warn",
            1 => "debug",
            _ => "trace",
        }
    };
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    debug!(?args, "CLI arguments parsed");

    run(args).await.into()
}

async fn run(args: Args) -> ProcessExit {
    // A user abort kills the whole run; in-flight partial files stay on disk.
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            println!("\nTerminated by user");
            std::process::exit(0);
        }
    });

    let Some(base_dirs) = BaseDirs::new() else {
        eprintln!("Could not determine the home directory");
        return ProcessExit::Environment;
    };
    let home = base_dirs.home_dir();

    let settings_path = args
        .settings
        .unwrap_or_else(|| home.join(DEFAULT_SETTINGS_FILE));
    let settings = match Settings::load(&settings_path) {
        Ok(settings) => settings,
        Err(err) if err.is_not_found() => {
            println!("Using default settings");
            Settings::default()
        }
        Err(err) => {
            eprintln!("{err}");
            return ProcessExit::Settings;
        }
    };

    let exclude = match settings.exclude_pattern() {
        Ok(exclude) => exclude,
        Err(err) => {
            eprintln!("{err}");
            return ProcessExit::Settings;
        }
    };

    // The concurrency limit comes from the settings file, so a bad value is
    // a settings failure.
    let engine = match DownloadEngine::new(settings.concurrent_downloads) {
        Ok(engine) => engine,
        Err(err) => {
            eprintln!("{err}");
            return ProcessExit::Settings;
        }
    };

    let provider: Arc<dyn CatalogProvider> =
        match VideoPortal::new(&settings.login_url, &settings.portal_url) {
            Ok(portal) => Arc::new(portal),
            Err(err) => {
                eprintln!("{err}");
                return ProcessExit::ProviderInit;
            }
        };

    let (username, password) = if settings.auto_login {
        (settings.username.clone(), settings.password.clone())
    } else {
        match prompt_credentials() {
            Ok(credentials) => credentials,
            Err(err) => {
                eprintln!("Could not read credentials: {err}");
                return ProcessExit::Environment;
            }
        }
    };

    println!("Logging on");
    match provider.login(&username, &password).await {
        Ok(true) => {}
        Ok(false) => {
            println!("Login incorrect");
            return ProcessExit::LoginIncorrect;
        }
        Err(err) => {
            eprintln!("{err}");
            return ProcessExit::LoginTransport;
        }
    }

    println!("Getting course list");
    let base_dir = settings.resolved_base_dir(home);
    let queue = match discovery::discover(provider.as_ref(), &base_dir, exclude.as_ref()).await {
        Ok(queue) => queue,
        Err(err) => {
            eprintln!("{err}");
            return ProcessExit::CourseList;
        }
    };

    println!("--------------------");
    println!("Downloading podcasts");
    println!("--------------------");

    if queue.is_empty() {
        println!("Nothing to do");
        return ProcessExit::Success;
    }

    let pool = engine.dispatch(&queue, Arc::clone(&provider));
    let live = Arc::new(LiveQueue::new(queue));
    let (renderer, stop) =
        tui::spawn_renderer(Arc::clone(&live), pool.monitor(), settings.progress_bar_size);

    pool.join().await;
    stop.store(true, Ordering::SeqCst);

    let retired = match renderer.await {
        Ok(retired) => retired,
        Err(err) => {
            warn!(error = %err, "renderer task failed");
            Retired::default()
        }
    };
    report::print_report(&retired);

    ProcessExit::Success
}

fn prompt_credentials() -> anyhow::Result<(String, String)> {
    let username: String = Input::new()
        .with_prompt("Please enter your username")
        .interact_text()?;
    let password = Password::new()
        .with_prompt("Please enter your password")
        .interact()?;
    Ok((username, password))
}
