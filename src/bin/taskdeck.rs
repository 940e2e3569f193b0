//! Command-line client for the taskdeck task and storage services.
//!
//! Usage:
//!
//! ```text
//! taskdeck [--config PATH] [--api-url URL] [--storage-url URL] [--token T]
//!          [--user NAME] [--log-level L] <command>
//! ```
//!
//! Commands are `list`, `add <content>`, `edit <id> <content>`,
//! `toggle <id>`, `delete <id>`, `attach <id> <path> [--content-type T]`
//! and `stats`. Every task command prints the refreshed list afterwards.
//! The process exits non-zero when the operation recorded an error.

use std::io::{self, Write};
use std::process::ExitCode;
use std::sync::Arc;

use camino::{Utf8Path, Utf8PathBuf};
use clap::{Parser, Subcommand};
use mockable::DefaultClock;
use taskdeck::config::{ClientCliArgs, ClientConfig, ConfigError};
use taskdeck::files::read_bytes;
use taskdeck::identity::adapters::StaticSession;
use taskdeck::task::adapters::http::{HttpBlobStore, HttpTaskStore, build_client};
use taskdeck::task::domain::{Task, TaskDomainError, TaskId, TaskStats, UploadFile};
use taskdeck::task::ports::{TaskStore, TaskStoreError};
use taskdeck::task::services::{OperationOutcome, TaskListController};
use thiserror::Error;
use tokio::runtime::Builder;
use tracing::{debug, error, info};
use tracing_subscriber::EnvFilter;

type HttpController =
    TaskListController<HttpTaskStore, HttpBlobStore, StaticSession, DefaultClock>;

#[derive(Debug, Parser)]
#[command(name = "taskdeck", version, about = "Manage tasks and their attachments")]
struct Cli {
    #[command(flatten)]
    client: ClientCliArgs,
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, PartialEq, Eq, Subcommand)]
enum Command {
    /// Show all tasks.
    List,
    /// Create a task.
    Add {
        /// Task text.
        content: String,
    },
    /// Replace a task's text.
    Edit {
        /// Task identifier.
        id: String,
        /// New task text.
        content: String,
    },
    /// Flip a task between open and completed.
    Toggle {
        /// Task identifier.
        id: String,
    },
    /// Delete a task and its attachment.
    Delete {
        /// Task identifier.
        id: String,
    },
    /// Upload a file and attach it to a task.
    Attach {
        /// Task identifier.
        id: String,
        /// File to upload.
        path: Utf8PathBuf,
        /// MIME type; guessed from the file extension when omitted.
        #[arg(long)]
        content_type: Option<String>,
    },
    /// Show task counts.
    Stats,
}

#[derive(Debug, Error)]
enum CliError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("failed to build HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("failed to start async runtime: {0}")]
    Runtime(#[source] io::Error),
    #[error("invalid task id: {0}")]
    TaskId(#[source] TaskDomainError),
    #[error("task {0} not found")]
    UnknownTask(TaskId),
    #[error("task content must not be blank")]
    BlankContent,
    #[error("failed to read {path}: {source}")]
    ReadAttachment { path: Utf8PathBuf, source: io::Error },
    #[error("invalid attachment: {0}")]
    Attachment(#[source] TaskDomainError),
    #[error("another upload is already running")]
    UploadBusy,
    #[error("failed to load stats: {0}")]
    Stats(#[source] TaskStoreError),
    #[error("{0}")]
    Operation(String),
    #[error("failed to write output: {0}")]
    Output(#[source] io::Error),
}

#[derive(Debug)]
enum Report {
    Tasks(Vec<Task>),
    Stats(TaskStats),
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!(error = %err, "command failed");
            writeln!(io::stderr().lock(), "taskdeck: {err}").ok();
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config = ClientConfig::load(&cli.client)?;
    init_tracing(&config.log_level);
    debug!(?config, "configuration loaded");

    let runtime = Builder::new_current_thread()
        .enable_all()
        .build()
        .map_err(CliError::Runtime)?;
    let report = runtime.block_on(execute(cli.command, &config))?;
    render(&report, &mut io::stdout().lock()).map_err(CliError::Output)
}

fn init_tracing(level: &str) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn connect(config: &ClientConfig) -> Result<(HttpTaskStore, HttpBlobStore), CliError> {
    let client = build_client(config.request_timeout).map_err(CliError::Client)?;
    let task_store = HttpTaskStore::new(client.clone(), config.api_url.clone());
    let blob_store = HttpBlobStore::new(client, config.storage_url.clone());
    let Some(token) = config.token.as_deref() else {
        return Ok((task_store, blob_store));
    };
    Ok((
        task_store.with_bearer_token(token),
        blob_store.with_bearer_token(token),
    ))
}

async fn execute(command: Command, config: &ClientConfig) -> Result<Report, CliError> {
    let (task_store, blob_store) = connect(config)?;
    let store = Arc::new(task_store);
    if command == Command::Stats {
        return store.stats().await.map(Report::Stats).map_err(CliError::Stats);
    }

    let controller = TaskListController::new(
        Arc::clone(&store),
        Arc::new(blob_store),
        Arc::new(StaticSession::from(config.user.clone())),
        Arc::new(DefaultClock),
    );
    match dispatch(&controller, command).await? {
        OperationOutcome::Skipped => Err(CliError::BlankContent),
        OperationOutcome::Rejected => Err(CliError::UploadBusy),
        OperationOutcome::Completed | OperationOutcome::Failed => controller.error().map_or_else(
            || Ok(Report::Tasks(controller.tasks())),
            |message| Err(CliError::Operation(message)),
        ),
    }
}

async fn dispatch(
    controller: &HttpController,
    command: Command,
) -> Result<OperationOutcome, CliError> {
    let outcome = match command {
        Command::List | Command::Stats => controller.fetch().await,
        Command::Add { content } => controller.add_task(&content).await,
        Command::Edit { id, content } => controller.save_edit(&parse_id(&id)?, &content).await,
        Command::Toggle { id } => {
            let task_id = parse_id(&id)?;
            let fetched = controller.fetch().await;
            if !fetched.is_completed() {
                return Ok(fetched);
            }
            let task = controller
                .task(&task_id)
                .ok_or_else(|| CliError::UnknownTask(task_id.clone()))?;
            controller.toggle_complete(&task_id, task.completed()).await
        }
        Command::Delete { id } => controller.delete_task(&parse_id(&id)?).await,
        Command::Attach {
            id,
            path,
            content_type,
        } => {
            let task_id = parse_id(&id)?;
            let file = load_attachment(&path, content_type)?;
            let attached = controller
                .attach(&task_id, &file, |progress| {
                    info!(%progress, "upload progress");
                })
                .await;
            if !attached.is_completed() {
                return Ok(attached);
            }
            controller.fetch().await
        }
    };
    Ok(outcome)
}

fn parse_id(raw: &str) -> Result<TaskId, CliError> {
    TaskId::new(raw).map_err(CliError::TaskId)
}

fn load_attachment(path: &Utf8Path, content_type: Option<String>) -> Result<UploadFile, CliError> {
    let bytes = read_bytes(path).map_err(|source| CliError::ReadAttachment {
        path: path.to_owned(),
        source,
    })?;
    let mime = content_type.unwrap_or_else(|| guess_content_type(path));
    UploadFile::new(path.file_name().unwrap_or_default(), mime, bytes)
        .map_err(CliError::Attachment)
}

/// MIME type for `path` by extension; `application/octet-stream` when
/// unknown.
fn guess_content_type(path: &Utf8Path) -> String {
    mime_guess::from_path(path)
        .first_or_octet_stream()
        .essence_str()
        .to_owned()
}

fn render(report: &Report, out: &mut impl Write) -> io::Result<()> {
    match report {
        Report::Stats(stats) => writeln!(
            out,
            "total: {}  completed: {}  pending: {}",
            stats.total, stats.completed, stats.pending
        ),
        Report::Tasks(tasks) if tasks.is_empty() => writeln!(out, "No tasks."),
        Report::Tasks(tasks) => {
            for task in tasks {
                render_task(task, out)?;
            }
            Ok(())
        }
    }
}

fn render_task(task: &Task, out: &mut impl Write) -> io::Result<()> {
    let mark = if task.completed() { 'x' } else { ' ' };
    write!(out, "[{mark}] {}  {}", task.id(), task.content())?;
    if let Some(url) = task.attachment_url() {
        write!(out, "  <{url}>")?;
    }
    writeln!(out)
}
