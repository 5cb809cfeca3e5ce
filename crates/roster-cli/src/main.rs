//! Roster CLI
//!
//! Serves the student records API and drives the registration and
//! management flows against a running server.

use std::net::SocketAddr;
use std::path::Path;
use std::process::ExitCode;

use chrono::Utc;
use clap::{Args, Parser, Subcommand};
use roster_core::{
    create_router, AppState, Config, FormField, HttpStore, ManagementFlow, MemoryStore,
    Notification, RegistrationFlow, RosterError, StudentRecord, SubmitOutcome, ViewStatus,
};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

/// Default port for the HTTP API server.
const DEFAULT_PORT: u16 = 3000;

/// Roster - student enrollment records
#[derive(Parser, Debug)]
#[command(name = "roster")]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to configuration file (default: roster.json in current directory)
    #[arg(short, long, value_name = "FILE", global = true)]
    config: Option<String>,

    /// Enable verbose output (sets log level to debug)
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP API until Ctrl+C
    Serve {
        /// Port to listen on
        #[arg(short, long, default_value_t = DEFAULT_PORT)]
        port: u16,

        /// Simulated store latency in milliseconds (overrides latencyMs)
        #[arg(long, value_name = "MS")]
        latency_ms: Option<u64>,
    },

    /// List students, optionally filtered
    List {
        /// Case-insensitive search over name, student id, email, course and section
        #[arg(short, long, value_name = "QUERY")]
        search: Option<String>,
    },

    /// Register a new student
    Register(RegisterArgs),

    /// Edit an existing student
    Update {
        /// Record id
        id: String,

        #[command(flatten)]
        fields: UpdateArgs,
    },

    /// Delete a student
    Delete {
        /// Record id
        id: String,

        /// Confirm the deletion
        #[arg(long)]
        yes: bool,
    },

    /// Show courses and their sections
    Courses,
}

#[derive(Args, Debug)]
struct RegisterArgs {
    #[arg(long)]
    first_name: String,
    #[arg(long)]
    last_name: String,
    #[arg(long)]
    email: String,
    #[arg(long)]
    student_id: String,
    #[arg(long)]
    contact_number: String,
    /// Course id, e.g. bsit
    #[arg(long)]
    course: String,
}

#[derive(Args, Debug, Default)]
struct UpdateArgs {
    #[arg(long)]
    first_name: Option<String>,
    #[arg(long)]
    last_name: Option<String>,
    #[arg(long)]
    email: Option<String>,
    #[arg(long)]
    student_id: Option<String>,
    #[arg(long)]
    contact_number: Option<String>,
    /// New course id; the section must then be given too
    #[arg(long)]
    course: Option<String>,
    #[arg(long)]
    section: Option<String>,
}

impl UpdateArgs {
    /// Field edits in application order. Course comes before section since
    /// changing course clears the section.
    fn edits(&self) -> Vec<(FormField, &str)> {
        [
            (FormField::FirstName, &self.first_name),
            (FormField::LastName, &self.last_name),
            (FormField::Email, &self.email),
            (FormField::StudentId, &self.student_id),
            (FormField::ContactNumber, &self.contact_number),
            (FormField::Course, &self.course),
            (FormField::Section, &self.section),
        ]
        .into_iter()
        .filter_map(|(field, value)| value.as_deref().map(|v| (field, v)))
        .collect()
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Priority: RUST_LOG env var > --verbose flag > default (info)
    let filter = if cli.verbose {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"))
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    tracing_subscriber::fmt().with_env_filter(filter).init();

    tracing::debug!(config = ?cli.config, "Config file");

    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::from(1)
        }
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref())?;

    match cli.command {
        Command::Serve { port, latency_ms } => serve(config, port, latency_ms).await,
        Command::List { search } => list(&config, search).await,
        Command::Register(args) => register(&config, args).await,
        Command::Update { id, fields } => update(&config, &id, &fields).await,
        Command::Delete { id, yes } => delete(&config, id, yes).await,
        Command::Courses => courses(&config).await,
    }
}

fn load_config(config_path: Option<&str>) -> anyhow::Result<Config> {
    match config_path {
        Some(path_str) => {
            let path = Path::new(path_str);
            if !path.exists() {
                anyhow::bail!(
                    "Config file not found: '{}'\n\nSuggestion: Check the path or remove the --config flag to use defaults",
                    path.display()
                );
            }
            Config::load_from_file(path).map_err(|e| anyhow::anyhow!("{e}"))
        }
        None => Config::load().map_err(|e| anyhow::anyhow!("{e}")),
    }
}

fn connect(config: &Config) -> anyhow::Result<HttpStore> {
    tracing::debug!(server = %config.server_url, timeout = ?config.request_timeout(), "Connecting");
    Ok(HttpStore::new(
        config.server_url.clone(),
        config.request_timeout(),
    )?)
}

// ============================================================================
// Commands
// ============================================================================

async fn serve(mut config: Config, port: u16, latency_ms: Option<u64>) -> anyhow::Result<()> {
    if let Some(latency_ms) = latency_ms {
        config.latency_ms = latency_ms;
    }

    let store = if config.seed_demo_data {
        MemoryStore::seeded()
    } else {
        MemoryStore::new()
    }
    .with_latency(config.latency());

    println!("Configuration loaded:");
    println!("  Latency: {}ms", config.latency_ms);
    println!("  Demo data: {}", config.seed_demo_data);
    println!("  Courses: {}", config.catalog().courses().len());

    let router = create_router(AppState::new(&config, store));

    let addr: SocketAddr = ([127, 0, 0, 1], port).into();
    let listener = TcpListener::bind(addr).await.map_err(|e| {
        anyhow::anyhow!(
            "Failed to bind to {addr}: {e}\n\nSuggestion: Try a different port with --port"
        )
    })?;

    println!("Roster API running on http://{addr}");
    println!("Press Ctrl+C to stop");

    axum::serve(listener, router)
        .with_graceful_shutdown(async {
            if tokio::signal::ctrl_c().await.is_ok() {
                tracing::info!("Received Ctrl+C, shutting down");
            }
        })
        .await?;

    Ok(())
}

async fn list(config: &Config, search: Option<String>) -> anyhow::Result<()> {
    let store = connect(config)?;
    let catalog = store.fetch_catalog().await?;
    let mut flow = ManagementFlow::new(store, catalog);

    flow.load().await;
    print_notifications(flow.drain_notifications());
    if flow.status() == ViewStatus::Failed {
        anyhow::bail!("Could not reach the server at {}", config.server_url);
    }

    if let Some(query) = search {
        flow.set_query(query);
    }

    if let Some(message) = flow.empty_message() {
        println!("{message}");
        return Ok(());
    }

    println!(
        "{:<8} {:<24} {:<10} {:<30} {:<28} {:<10} {}",
        "ID", "NAME", "STUDENT", "EMAIL", "COURSE", "SECTION", "REGISTERED"
    );
    for record in flow.visible() {
        print_row(record, flow.course_name(&record.course));
    }
    Ok(())
}

fn print_row(record: &StudentRecord, course_name: &str) {
    println!(
        "{:<8} {:<24} {:<10} {:<30} {:<28} {:<10} {}",
        record.id,
        record.full_name(),
        record.student_id,
        record.email,
        course_name,
        record.section,
        record.registration_date.format("%Y-%m-%d"),
    );
}

async fn register(config: &Config, args: RegisterArgs) -> anyhow::Result<()> {
    let store = connect(config)?;
    let catalog = store.fetch_catalog().await?;
    let mut flow = RegistrationFlow::new(store, catalog, config.section_strategy.build());

    flow.set_field(FormField::FirstName, args.first_name);
    flow.set_field(FormField::LastName, args.last_name);
    flow.set_field(FormField::Email, args.email);
    flow.set_field(FormField::StudentId, args.student_id);
    flow.set_field(FormField::ContactNumber, args.contact_number);
    flow.select_course(args.course.clone());

    let outcome = flow.submit(Utc::now()).await;
    print_notifications(flow.drain_notifications());

    match outcome {
        SubmitOutcome::Registered(record) => {
            println!("  id: {}  section: {}", record.id, record.section);
            Ok(())
        }
        SubmitOutcome::Invalid(errors) => Err(RosterError::validation(errors).into()),
        SubmitOutcome::NoSection => Err(RosterError::no_section(args.course).into()),
        SubmitOutcome::Failed(err) => Err(err.into()),
    }
}

async fn update(config: &Config, id: &str, fields: &UpdateArgs) -> anyhow::Result<()> {
    let edits = fields.edits();
    if edits.is_empty() {
        anyhow::bail!("Nothing to update\n\nSuggestion: Pass at least one field flag, e.g. --email");
    }

    let store = connect(config)?;
    let catalog = store.fetch_catalog().await?;
    let mut flow = ManagementFlow::new(store, catalog);

    flow.load().await;
    print_notifications(flow.drain_notifications());
    if flow.status() == ViewStatus::Failed {
        anyhow::bail!("Could not reach the server at {}", config.server_url);
    }

    if !flow.begin_edit(id) {
        return Err(RosterError::not_found(id).into());
    }
    if let Some(session) = flow.edit_session_mut() {
        for (field, value) in edits {
            session.set_field(field, value);
        }
    }

    let saved = flow.save_edit().await;
    print_notifications(flow.drain_notifications());

    if let Some(record) = saved {
        print_row(&record, flow.course_name(&record.course));
        return Ok(());
    }

    if let Some(session) = flow.edit_session() {
        if !session.errors().is_empty() {
            if session.form().section.is_empty() {
                println!(
                    "Sections for {}: {}",
                    flow.course_name(&session.form().course),
                    flow.available_sections().join(", ")
                );
            }
            return Err(RosterError::validation(session.errors().to_vec()).into());
        }
    }
    anyhow::bail!("Student '{id}' was not updated")
}

async fn delete(config: &Config, id: String, yes: bool) -> anyhow::Result<()> {
    let store = connect(config)?;
    let catalog = config.catalog();
    let mut flow = ManagementFlow::new(store, catalog);

    flow.request_delete(id.clone());
    if !yes {
        flow.cancel_delete();
        anyhow::bail!(
            "Refusing to delete '{id}' without confirmation\n\nSuggestion: Re-run with --yes"
        );
    }

    let deleted = flow.confirm_delete().await;
    print_notifications(flow.drain_notifications());
    if !deleted {
        anyhow::bail!("Student '{id}' was not deleted");
    }
    Ok(())
}

async fn courses(config: &Config) -> anyhow::Result<()> {
    let store = connect(config)?;
    let catalog = store.fetch_catalog().await?;

    for course in catalog.courses() {
        let sections = catalog.sections_for(&course.id);
        let sections = if sections.is_empty() {
            "(no sections)".to_string()
        } else {
            sections.join(", ")
        };
        println!("{:<8} {:<30} {}", course.id, course.name, sections);
    }
    Ok(())
}

fn print_notifications(notifications: Vec<Notification>) {
    for notification in notifications {
        if notification.is_error() {
            eprintln!("{notification}");
        } else {
            println!("{notification}");
        }
    }
}
