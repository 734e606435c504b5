use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context as _;
use clap::{self, Parser, Subcommand};
use serde::Serialize;
use strum::IntoEnumIterator;
use tracing::info;
use tracing_subscriber::EnvFilter;
use url::Url;

use wingrox_core::auth::{
    CallbackHandler, CallbackOutcome, FormController, FormOutcome, GoogleExchange, RegisterForm,
    ResetPasswordForm,
};
use wingrox_core::downloads::{DownloadPage, DownloadState};
use wingrox_core::http::{HttpTransport, Session};
use wingrox_core::listing::ListQuery;
use wingrox_core::model::Specialty;
use wingrox_core::profile::ProfileView;
use wingrox_core::{coaches, ClientConfig, Context};

mod render;
use render::TerminalNavigator;

#[derive(clap::Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Base url of the WinGroX API
    #[arg(long, env = "WINGROX_API_URL", default_value = "http://localhost:5000")]
    api_url: String,

    /// Request deadline in seconds
    #[arg(long, env = "WINGROX_TIMEOUT_SECS", default_value_t = 15)]
    timeout: u64,

    /// Cookie file keeping the login session between runs
    #[arg(short, long)]
    session: Option<PathBuf>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(short, long, env = "RUST_LOG")]
    log_level: Option<String>,

    /// Emit logs as json lines
    #[arg(long)]
    log_json: bool,

    /// Print results as json
    #[arg(long)]
    json: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Browse the coach marketplace
    Coaches {
        /// Specialty filter, "All" for none
        #[arg(long)]
        specialty: Option<String>,
        #[arg(long, default_value_t = 1)]
        page: u32,
        #[arg(long)]
        limit: Option<u32>,
        /// List the specialty filter chips and exit
        #[arg(long)]
        chips: bool,
    },
    /// Show the signed-in user's profile
    Profile,
    /// End the current session
    Logout,
    /// List, and optionally save, the files bought in a checkout session
    Downloads {
        /// Download page url carrying ?session_id=...
        page_url: Url,
        /// Directory to save every file into
        #[arg(long)]
        save: Option<PathBuf>,
    },
    /// Create an account
    Register {
        #[arg(long)]
        name: String,
        #[arg(long)]
        email: String,
        #[arg(long)]
        phone: String,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Set a new password from a reset link
    ResetPassword {
        /// Reset page url carrying ?token=...
        page_url: Url,
        #[arg(long)]
        password: String,
        #[arg(long)]
        confirm: String,
    },
    /// Complete a Google sign-in from the callback url
    GoogleCallback {
        /// Callback url carrying #id_token=...
        callback_url: Url,
    },
}

fn init_logging(level: Option<&str>, json: bool) {
    let filter = level
        .and_then(|l| EnvFilter::try_new(l).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    if json {
        builder.json().init();
    } else {
        builder.init();
    }
}

async fn load_session(http: &HttpTransport, path: &PathBuf) -> anyhow::Result<()> {
    match tokio::fs::read_to_string(path).await {
        Ok(data) => {
            http.load_session(&data)?;
            info!("session loaded from {}", path.display());
            Ok(())
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e).with_context(|| format!("reading {}", path.display())),
    }
}

async fn save_session(http: &HttpTransport, path: &PathBuf) -> anyhow::Result<()> {
    let data = http.save_session()?;
    tokio::fs::write(path, data)
        .await
        .with_context(|| format!("writing {}", path.display()))
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

/// Print the form status and follow a success redirect. `false` when the
/// form was blocked or rejected.
async fn finish_form(outcome: FormOutcome, status: String) -> bool {
    println!("{}", status);
    match outcome {
        FormOutcome::Succeeded { redirect, .. } => {
            redirect.follow(&TerminalNavigator).await;
            true
        }
        FormOutcome::Superseded => true,
        FormOutcome::Invalid(_) | FormOutcome::Rejected(_) => false,
    }
}

async fn run(args: Args, ctx: Context, http: Arc<HttpTransport>) -> anyhow::Result<bool> {
    match args.command {
        Command::Coaches {
            specialty,
            page,
            limit,
            chips,
        } => {
            if chips {
                for chip in Specialty::iter() {
                    println!("{}", chip);
                }
                return Ok(true);
            }
            let query = ListQuery::new(limit.unwrap_or(ctx.config.page_size))
                .with_page(page)
                .with_filter(specialty.as_deref());
            let market = coaches::marketplace(ctx).with_query(query);
            let state = market.load().await;
            if args.json {
                if let Some(r) = state.result() {
                    print_json(&r.items)?;
                    return Ok(true);
                }
            }
            print!("{}", render::marketplace(&market, &state));
        }
        Command::Profile => {
            let state = ProfileView::new(ctx).load().await;
            match (&state, args.json) {
                (wingrox_core::profile::ProfileState::Loaded(p), true) => print_json(p)?,
                _ => println!("{}", render::profile(&state)),
            }
        }
        Command::Logout => {
            if let Err(e) = ProfileView::new(ctx).logout().await {
                log::warn!("server logout failed: {}", e);
            }
            http.clear_session()?;
            println!("Logged out.");
        }
        Command::Downloads { page_url, save } => {
            let view = DownloadPage::new(ctx);
            let state = view.load(&page_url).await;
            match (&state, args.json) {
                (DownloadState::Ready(files), true) => print_json(files)?,
                _ => println!("{}", render::downloads(&state)),
            }
            if let (DownloadState::Ready(files), Some(dir)) = (&state, save) {
                tokio::fs::create_dir_all(&dir).await?;
                for file in files {
                    match view.save_file(file, &dir).await {
                        Ok(path) => println!("saved {}", path.display()),
                        Err(e) => eprintln!("! {}: {}", file.display_name(), e),
                    }
                }
            }
            if matches!(state, DownloadState::Failure(_)) {
                return Ok(false);
            }
        }
        Command::Register {
            name,
            email,
            phone,
            password,
            confirm,
        } => {
            let controller = FormController::<RegisterForm>::new(ctx);
            let form = RegisterForm {
                name,
                email,
                phone,
                password,
                confirm_password: confirm,
            };
            let outcome = controller.submit(&form).await;
            return Ok(finish_form(outcome, render::form_status(&controller.status())).await);
        }
        Command::ResetPassword {
            page_url,
            password,
            confirm,
        } => {
            let controller = FormController::<ResetPasswordForm>::new(ctx);
            let form = ResetPasswordForm::from_url(&page_url, &password, &confirm);
            let outcome = controller.submit(&form).await;
            return Ok(finish_form(outcome, render::form_status(&controller.status())).await);
        }
        Command::GoogleCallback { callback_url } => {
            let handler = CallbackHandler::new(GoogleExchange::new(ctx));
            let outcome = handler.handle(&callback_url, &TerminalNavigator).await;
            info!("google callback: {:?}", outcome);
            return Ok(outcome == CallbackOutcome::SignedIn);
        }
    }
    Ok(true)
}

#[tokio::main]
async fn main() -> Result<ExitCode, anyhow::Error> {
    let args = Args::parse();
    init_logging(args.log_level.as_deref(), args.log_json);

    let config = ClientConfig::new(&args.api_url)
        .with_context(|| format!("invalid api url {}", args.api_url))?
        .with_request_timeout(Duration::from_secs(args.timeout.max(1)));
    info!("api: {}", config.base_url);

    let (ctx, http) = Context::with_http(config)?;
    let session = args.session.clone();
    if let Some(path) = &session {
        load_session(&http, path).await?;
    }

    let ok = run(args, ctx, http.clone()).await?;

    if let Some(path) = &session {
        save_session(&http, path).await?;
    }
    Ok(if ok { ExitCode::SUCCESS } else { ExitCode::FAILURE })
}
