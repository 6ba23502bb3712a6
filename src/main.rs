//! ga_reports CLI - Manage Google Analytics unsampled reports.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use tracing_subscriber::EnvFilter;

use ga_reports::auth::{authenticate, authorize_installed, Access, Api, Credentials, Scope};
use ga_reports::client::{build_client, ServiceHandle, DISCOVERY_ROOT};
use ga_reports::download::{self, FileStatus, ProgressSink};
use ga_reports::error::ErrorKind;
use ga_reports::ids::extract_file_id;
use ga_reports::locator::{self, Pick, ResourceRef, Selection};
use ga_reports::models::FileDescriptor;
use ga_reports::presenter::{self, SEPARATOR};
use ga_reports::prompt::{ConsolePrompt, Prompt};
use ga_reports::reports::{self, Confirmation, MetricsQuery};
use ga_reports::{Config, ReportError};

/// CLI tool for Google Analytics unsampled reports.
#[derive(Parser)]
#[command(name = "ga_reports")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to service account JSON key file.
    #[arg(long, env = "GOOGLE_APPLICATION_CREDENTIALS")]
    key_file: Option<PathBuf>,

    /// Service account email (defaults to the key file's client_email).
    #[arg(long, env = "GA_SERVICE_ACCOUNT")]
    service_account: Option<String>,

    /// Pre-issued OAuth access token, used instead of the key file.
    #[arg(long, env = "GOOGLE_OAUTH_ACCESS_TOKEN", hide_env_values = true)]
    access_token: Option<String>,

    /// Analytics account ID.
    #[arg(long, env = "GA_ACCOUNT_ID")]
    account_id: Option<String>,

    /// Web property ID (e.g. UA-296593-56).
    #[arg(long, env = "GA_WEB_PROPERTY_ID")]
    web_property_id: Option<String>,

    /// View (profile) ID.
    #[arg(long, env = "GA_PROFILE_ID")]
    profile_id: Option<String>,

    /// How to choose an unspecified account, property or view: first, <index> or name:<value>.
    #[arg(long, default_value = "first")]
    pick: Pick,

    /// Request timeout in seconds.
    #[arg(long, default_value_t = 30)]
    timeout_secs: u64,

    /// Retries for failed read requests.
    #[arg(long, default_value_t = 3)]
    retries: u32,

    /// Root URL of the API discovery service.
    #[arg(long, env = "GOOGLE_DISCOVERY_ROOT", default_value = DISCOVERY_ROOT, hide = true)]
    discovery_root: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the view the report commands operate on.
    Locate,

    /// Query a metric (sessions by default) for the view.
    Sessions {
        #[arg(long, default_value = "1daysAgo")]
        start_date: String,

        #[arg(long, default_value = "today")]
        end_date: String,

        #[arg(long, default_value = "ga:sessions")]
        metrics: String,
    },

    /// List unsampled reports of the view.
    List,

    /// Show one unsampled report.
    Get {
        /// Unsampled report ID.
        report_id: String,
    },

    /// Delete an unsampled report after confirmation.
    Delete {
        /// Unsampled report ID.
        report_id: String,
    },

    /// List Drive files.
    Files {
        /// OAuth client secret file; authorizes interactively instead of with the key file.
        #[arg(long)]
        client_secret: Option<PathBuf>,
    },

    /// Download Drive files to the local filesystem.
    Download {
        /// File URLs or IDs to download (default: every listed file).
        targets: Vec<String>,

        /// Local destination directory.
        #[arg(long, short = 't', default_value = ".")]
        to: PathBuf,

        /// OAuth client secret file; authorizes interactively instead of with the key file.
        #[arg(long)]
        client_secret: Option<PathBuf>,
    },
}

impl Cli {
    fn config(&self) -> Config {
        Config {
            account_id: self.account_id.clone(),
            web_property_id: self.web_property_id.clone(),
            profile_id: self.profile_id.clone(),
            key_file_path: self.key_file.clone(),
            service_account_identity: self.service_account.clone(),
            access_token: self.access_token.clone(),
            selection: Selection::uniform(self.pick.clone()),
            discovery_root: self.discovery_root.clone(),
            timeout: Duration::from_secs(self.timeout_secs),
            retries: self.retries,
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            let code = err
                .chain()
                .find_map(|e| e.downcast_ref::<ReportError>())
                .map(ReportError::exit_code)
                .unwrap_or(1);
            ExitCode::from(code)
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = cli.config();

    match cli.command {
        Commands::Locate => {
            let (_, target) = analytics(&config, Access::Read).await?;
            print_lines(presenter::resource(&target));
        }

        Commands::Sessions {
            start_date,
            end_date,
            metrics,
        } => {
            let (service, target) = analytics(&config, Access::Read).await?;
            let query = MetricsQuery {
                start_date,
                end_date,
                metrics,
            };
            let summary = reports::sessions(&service, &target, &query)
                .await
                .with_context(|| format!("Failed to query view {}", target))?;
            print_lines(presenter::sessions(&summary));
        }

        Commands::List => {
            let (service, target) = analytics(&config, Access::Read).await?;
            let list = reports::list_reports(&service, &target)
                .await
                .with_context(|| format!("Failed to list unsampled reports of {}", target))?;
            println!();
            print_lines(presenter::report_list(&list));
        }

        Commands::Get { report_id } => {
            let (service, target) = analytics(&config, Access::Read).await?;
            let report = reports::get_report(&service, &target, &report_id)
                .await
                .with_context(|| format!("Failed to get unsampled report {}", report_id))?;
            println!("\nUnsampled Report Details");
            println!("{}", SEPARATOR);
            match report {
                Some(report) => print_lines(presenter::report_detail(&report)),
                None => print_lines(presenter::report_missing()),
            }
        }

        Commands::Delete { report_id } => {
            let (service, target) = analytics(&config, Access::Edit).await?;
            let report = reports::get_report(&service, &target, &report_id)
                .await
                .with_context(|| format!("Failed to get unsampled report {}", report_id))?;

            println!("\nUnsampled Report Details");
            println!("{}", SEPARATOR);
            let Some(report) = report else {
                print_lines(presenter::report_missing());
                return Ok(ExitCode::SUCCESS);
            };
            print_lines(presenter::report_detail(&report));
            println!("{}", SEPARATOR);

            let answer = ConsolePrompt
                .ask(">> Do you really want to delete this unsampled report [ Y/N ]")
                .context("Failed to read confirmation")?;
            let outcome = reports::delete_report(
                &service,
                &target,
                &report_id,
                Confirmation::from_input(&answer),
            )
            .await
            .with_context(|| format!("Failed to delete unsampled report {}", report_id))?;
            print_lines(presenter::delete_outcome(outcome));
        }

        Commands::Files { client_secret } => {
            let service = drive(&config, client_secret).await?;
            let files = download::list_files(&service)
                .await
                .context("Failed to list files")?;
            print_lines(presenter::file_list(&files));
        }

        Commands::Download {
            targets,
            to,
            client_secret,
        } => {
            let service = drive(&config, client_secret).await?;

            let files: Vec<FileDescriptor> = if targets.is_empty() {
                download::list_files(&service)
                    .await
                    .context("Failed to list files")?
            } else {
                let mut files = Vec::with_capacity(targets.len());
                for target in &targets {
                    let file_id = extract_file_id(target)
                        .with_context(|| format!("Invalid file URL or ID: {}", target))?;
                    let file = download::get_file(&service, &file_id)
                        .await
                        .with_context(|| format!("Failed to get file: {}", file_id))?;
                    files.push(file);
                }
                files
            };

            std::fs::create_dir_all(&to)
                .with_context(|| format!("Failed to create directory: {:?}", to))?;

            println!("Downloading {} file(s) to {:?}...", files.len(), to);
            let report =
                download::download_all(&service, &files, &to, &mut ConsoleProgress::default())
                    .await;
            print_lines(presenter::download_summary(&report));

            if report.has_failures() {
                return Ok(ExitCode::from(ErrorKind::PartialWrite.exit_code()));
            }
        }
    }

    Ok(ExitCode::SUCCESS)
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{}", line);
    }
}

async fn service_account(config: &Config, scope: Scope) -> Result<Credentials> {
    if let Some(token) = &config.access_token {
        return Ok(Credentials::with_access_token(token.clone(), &[scope]));
    }

    let key_file = config.key_file()?;
    let credentials = authenticate(
        config.service_account_identity.as_deref(),
        key_file,
        &[scope],
        config.timeout,
    )
    .await
    .with_context(|| format!("Failed to authenticate with {:?}", key_file))?;
    Ok(credentials)
}

/// Authenticate, build the Analytics client and resolve the target view.
async fn analytics(config: &Config, access: Access) -> Result<(ServiceHandle, ResourceRef)> {
    let credentials = service_account(config, Scope::new(Api::Analytics, access)).await?;
    let service = build_client(
        credentials,
        Api::Analytics.name(),
        Api::Analytics.version(),
        &config.client_options(),
    )
    .await
    .context("Failed to build the Analytics client")?;

    let target = locator::resolve(&service, &config.partial_ref(), &config.selection)
        .await
        .context("Failed to resolve the target view")?;
    Ok((service, target))
}

async fn drive(config: &Config, client_secret: Option<PathBuf>) -> Result<ServiceHandle> {
    let scope = Scope::new(Api::Drive, Access::Read);
    let credentials = match client_secret {
        Some(path) => authorize_installed(&path, &[scope], &mut ConsolePrompt, config.timeout)
            .await
            .with_context(|| format!("Failed to authorize with {:?}", path))?,
        None => service_account(config, scope).await?,
    };

    let service = build_client(
        credentials,
        Api::Drive.name(),
        Api::Drive.version(),
        &config.client_options(),
    )
    .await
    .context("Failed to build the Drive client")?;
    Ok(service)
}

/// Progress bar per downloaded file.
#[derive(Default)]
struct ConsoleProgress {
    bar: Option<ProgressBar>,
}

impl ProgressSink for ConsoleProgress {
    fn file_started(&mut self, file: &FileDescriptor) {
        let bar = ProgressBar::new(100);
        if let Ok(style) = ProgressStyle::with_template("{msg:30!} [{bar:40}] {pos:>3}%") {
            bar.set_style(style);
        }
        bar.set_message(file.name.clone());
        self.bar = Some(bar);
    }

    fn progress(&mut self, _file: &FileDescriptor, percent: u8) {
        if let Some(bar) = &self.bar {
            bar.set_position(u64::from(percent));
        }
    }

    fn file_finished(&mut self, _file: &FileDescriptor, status: &FileStatus) {
        if let Some(bar) = self.bar.take() {
            match status {
                FileStatus::Downloaded { .. } => bar.finish(),
                _ => bar.abandon(),
            }
        }
    }
}
