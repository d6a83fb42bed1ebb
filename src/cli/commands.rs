use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use tokio::runtime::Runtime;
use tracing::info;

use crate::admin::DocumentRegistry;
use crate::chat::{ChatController, CommandInput, WavFileInput};
use crate::client::HttpBackend;
use crate::config::Config;
use crate::models::{Message, Role};
use crate::notify::{self, Level, Notification};
use crate::session::{SessionStore, SharedStorage, TokenScope, shared};
use crate::storage::{LocalStorage, STORAGE_FILENAME};
use crate::utils::{format_path_with_tilde, sanitize_for_terminal};
use crate::{logging, tui};

#[derive(Parser)]
#[command(name = "vta-chat")]
#[command(version)]
#[command(about = "Terminal client for the Virtual Technical Assistant chatbot", long_about = None)]
pub struct Cli {
    #[command(flatten)]
    pub global: GlobalArgs,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Args, Debug, Clone)]
pub struct GlobalArgs {
    /// Backend base URL
    #[arg(long, global = true, env = "VTA_SERVER_URL")]
    pub server_url: Option<String>,

    /// Directory holding the token store and log file
    #[arg(long, global = true, env = "VTA_DATA_DIR")]
    pub data_dir: Option<PathBuf>,

    /// Command that streams WAV audio to stdout while recording
    #[arg(long, global = true, env = "VTA_RECORD_COMMAND")]
    pub record_command: Option<String>,

    /// Request timeout in seconds
    #[arg(long, global = true, env = "VTA_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Log in and store the access token
    Login(Credentials),
    /// Create an account, then log in
    Register(Credentials),
    /// Forget the stored access token
    Logout,
    /// List your chat threads
    Sessions,
    /// Start a new chat thread
    New,
    /// Print the transcript of a thread
    History {
        /// Thread id (see `sessions`)
        id: String,
    },
    /// Ask a question; starts a new thread unless --session is given
    Ask {
        #[arg(long)]
        session: Option<String>,
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Send a recorded WAV question
    Voice {
        #[arg(long)]
        session: Option<String>,
        wav: PathBuf,
    },
    /// Manage the documents behind the assistant
    #[command(subcommand)]
    Admin(AdminCommands),
    /// Show login state and storage location
    Status,
    /// Interactive chat (default)
    Chat,
}

#[derive(Subcommand)]
pub enum AdminCommands {
    /// Log in with an admin account
    Login(Credentials),
    /// Forget the stored admin token
    Logout,
    /// List uploaded manuals
    List,
    /// Upload a PDF manual
    Upload { file: PathBuf },
}

#[derive(Args, Debug, Clone)]
pub struct Credentials {
    pub email: String,

    /// Read from stdin when not given
    #[arg(long, env = "VTA_PASSWORD", hide_env_values = true)]
    pub password: Option<String>,
}

pub fn run() -> Result<()> {
    let cli = Cli::parse();
    let GlobalArgs { server_url, data_dir, record_command, timeout_secs } = cli.global;
    let config = Config::new(server_url, data_dir, record_command, timeout_secs)?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start async runtime")?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => {
            let _log_guard = logging::init_file(&config.log_path())?;
            run_chat(&config, &runtime)
        }
        command => {
            logging::init_stderr();
            runtime.block_on(execute(command, &config))
        }
    }
}

fn open_storage(config: &Config) -> Result<SharedStorage> {
    Ok(shared(LocalStorage::open(&config.data_dir)?))
}

fn backend(config: &Config) -> Result<Arc<HttpBackend>> {
    let backend = HttpBackend::new(config.server_url.clone(), config.timeout)
        .context("Failed to build HTTP client")?;
    Ok(Arc::new(backend))
}

fn chat_controller(config: &Config) -> Result<ChatController> {
    let session = SessionStore::open(open_storage(config)?, TokenScope::User)?;
    Ok(ChatController::new(backend(config)?, session))
}

fn document_registry(config: &Config) -> Result<DocumentRegistry> {
    let session = SessionStore::open(open_storage(config)?, TokenScope::Admin)?;
    Ok(DocumentRegistry::new(backend(config)?, session))
}

fn run_chat(config: &Config, runtime: &Runtime) -> Result<()> {
    let controller = chat_controller(config)?;
    let input = CommandInput::parse(&config.record_command).context("Invalid recorder command")?;
    info!(server = %config.server_url, "starting chat view");
    tui::run_interactive(controller, Box::new(input), runtime.handle().clone())
}

async fn execute(command: Commands, config: &Config) -> Result<()> {
    match command {
        Commands::Login(creds) => {
            let password = resolve_password(&creds)?;
            let mut controller = chat_controller(config)?;
            let notes = controller.login(&creds.email, &password).await;
            report(notes)
        }
        Commands::Register(creds) => {
            let password = resolve_password(&creds)?;
            let mut controller = chat_controller(config)?;
            let notes = controller.register(&creds.email, &password).await;
            report(notes)
        }
        Commands::Logout => {
            chat_controller(config)?.logout()?;
            println!("Logged out.");
            Ok(())
        }
        Commands::Sessions => list_sessions(config).await,
        Commands::New => new_thread(config).await,
        Commands::History { id } => show_history(config, &id).await,
        Commands::Ask { session, query } => {
            ask(config, session.as_deref(), &query.join(" ")).await
        }
        Commands::Voice { session, wav } => voice(config, session.as_deref(), &wav).await,
        Commands::Admin(command) => admin(command, config).await,
        Commands::Status => show_status(config),
        Commands::Chat => bail!("the chat view cannot run inside another command"),
    }
}

fn resolve_password(creds: &Credentials) -> Result<String> {
    if let Some(password) = &creds.password {
        return Ok(password.clone());
    }
    eprint!("Password for {}: ", creds.email);
    io::stderr().flush().context("Failed to write prompt")?;
    let mut line = String::new();
    io::stdin().lock().read_line(&mut line).context("Failed to read password")?;
    let password = line.trim_end_matches(['\r', '\n']).to_string();
    if password.is_empty() {
        bail!("A password is required");
    }
    Ok(password)
}

/// Print notifications; the first error becomes the command's failure
fn report(notes: Vec<Notification>) -> Result<()> {
    let mut failure = None;
    for note in notes {
        let level = note.level;
        match level {
            Level::Error if failure.is_none() => failure = Some(note),
            Level::Error => eprintln!("{}", note),
            Level::Success | Level::Info => println!("{}", note.description),
        }
    }
    match failure {
        Some(note) => bail!("{}", note),
        None => Ok(()),
    }
}

fn require_login(controller: &ChatController) -> Result<()> {
    if controller.is_logged_in() { Ok(()) } else { report(vec![Notification::login_required()]) }
}

async fn list_sessions(config: &Config) -> Result<()> {
    let mut controller = chat_controller(config)?;
    require_login(&controller)?;
    let actions = controller.refresh_sessions();
    report(controller.run(actions).await)?;

    let sessions = controller.registry().sessions();
    if sessions.is_empty() {
        println!("No chats yet.");
    }
    for session in sessions {
        let created = session
            .created_at_utc()
            .map(|ts| ts.format("%Y-%m-%d %H:%M").to_string())
            .unwrap_or_else(|| session.created_at.clone());
        println!(
            "{}  {}  {}",
            session.id,
            created,
            sanitize_for_terminal(session.display_title())
        );
    }
    Ok(())
}

async fn new_thread(config: &Config) -> Result<()> {
    let mut controller = chat_controller(config)?;
    let actions = controller.new_chat();
    report(controller.run(actions).await)?;
    if let Some(id) = controller.registry().active_id() {
        println!("{}", id);
    }
    Ok(())
}

async fn open_thread(controller: &mut ChatController, id: &str) -> Result<()> {
    let actions = controller.open_thread(id);
    report(controller.run(actions).await)
}

async fn show_history(config: &Config, id: &str) -> Result<()> {
    let mut controller = chat_controller(config)?;
    open_thread(&mut controller, id).await?;
    if controller.messages().is_empty() {
        println!("No messages in this chat.");
    }
    print_messages(controller.messages());
    Ok(())
}

async fn ask(config: &Config, session: Option<&str>, query: &str) -> Result<()> {
    let mut controller = chat_controller(config)?;
    if let Some(id) = session {
        open_thread(&mut controller, id).await?;
    }
    let before = controller.messages().len();
    let actions = controller.submit(query);
    let notes = controller.run(actions).await;
    finish_exchange(&controller, session, before);
    report(notes)
}

async fn voice(config: &Config, session: Option<&str>, wav: &Path) -> Result<()> {
    let mut controller = chat_controller(config)?;
    require_login(&controller)?;
    if let Some(id) = session {
        open_thread(&mut controller, id).await?;
    }
    let before = controller.messages().len();
    let mut input = WavFileInput::new(wav);
    let mut actions = controller.start_recording(&mut input);
    actions.extend(controller.stop_recording());
    let notes = controller.run(actions).await;
    finish_exchange(&controller, session, before);
    report(notes)
}

/// Print what the exchange appended; announce the thread when it was created for it
fn finish_exchange(controller: &ChatController, session: Option<&str>, before: usize) {
    if session.is_none()
        && let Some(id) = controller.registry().active_id()
    {
        eprintln!("Thread: {}", id);
    }
    let appended = controller.messages().get(before..).unwrap_or_default();
    print_messages(appended);
}

fn print_messages(messages: &[Message]) {
    for message in messages {
        let speaker = match message.role {
            Role::User => "You",
            Role::Assistant => "VTA",
        };
        println!("{}: {}", speaker, sanitize_for_terminal(&message.content));
        for (n, node) in message.source_nodes.iter().enumerate() {
            println!("  [{}] Relevance Score: {}", n + 1, node.display_score());
            let excerpt = sanitize_for_terminal(&node.text);
            let excerpt = excerpt.split_whitespace().collect::<Vec<_>>().join(" ");
            if !excerpt.is_empty() {
                println!("      {}", excerpt);
            }
        }
        println!();
    }
}

async fn admin(command: AdminCommands, config: &Config) -> Result<()> {
    let mut registry = document_registry(config)?;
    match command {
        AdminCommands::Login(creds) => {
            let password = resolve_password(&creds)?;
            let note = registry.login(&creds.email, &password).await;
            report(vec![note])
        }
        AdminCommands::Logout => {
            registry.logout()?;
            println!("Logged out of the admin dashboard.");
            Ok(())
        }
        AdminCommands::List => match registry.list().await {
            Ok(files) => {
                if files.is_empty() {
                    println!("No manuals uploaded.");
                }
                for file in files {
                    println!("{}", sanitize_for_terminal(&file.file_name));
                }
                Ok(())
            }
            Err(note) => report(vec![note]),
        },
        AdminCommands::Upload { file } => match registry.upload(&file).await {
            Ok(manual) => {
                println!("{}", notify::UPLOAD_SUCCESS);
                println!("{}", sanitize_for_terminal(&manual.file_name));
                Ok(())
            }
            Err(note) => report(vec![note]),
        },
    }
}

fn show_status(config: &Config) -> Result<()> {
    let storage = open_storage(config)?;
    let user = SessionStore::open(storage.clone(), TokenScope::User)?;
    let admin = SessionStore::open(storage, TokenScope::Admin)?;
    let yes_no = |logged_in: bool| if logged_in { "logged in" } else { "logged out" };

    println!("VTA Chat Status");
    println!("===============");
    println!("Server: {}", config.server_url);
    println!("Chat: {}", yes_no(user.is_logged_in()));
    println!("Admin: {}", yes_no(admin.is_logged_in()));
    println!();
    println!("Storage: {}", format_path_with_tilde(&config.data_dir.join(STORAGE_FILENAME)));
    println!("Log file: {}", format_path_with_tilde(&config.log_path()));
    Ok(())
}
