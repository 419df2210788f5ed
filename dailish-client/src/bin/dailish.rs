use std::path::PathBuf;
use std::sync::Arc;

use chrono::{Local, NaiveDate};
use clap::{Args, Parser, Subcommand};
use colored::*;
use dailish_client::config::{default_database_url, DEFAULT_SERVER_URL};
use dailish_client::{
    AccountDeletion, ClientDatabase, ClientError, HttpRemoteStore, MutationOutcome, SyncEngine,
    SyncEvent,
};
use dailish_core::export::{export_filename, format_deadline, is_overdue};
use dailish_core::models::parse_deadline;
use dailish_core::{
    ActiveSort, Filter, Icon, Priority, Rendered, Session, SortKey, Task, TaskDraft, TaskEdit,
    TaskError,
};
use dialoguer::{theme::ColorfulTheme, Confirm, Input, Password};
use tracing_subscriber::EnvFilter;

type Engine = SyncEngine<HttpRemoteStore>;

#[derive(Parser)]
#[command(name = "dailish")]
#[command(about = "Offline-first task list", long_about = None, version)]
struct Cli {
    /// Document server URL
    #[arg(long, global = true, env = "DAILISH_SERVER_URL", default_value = DEFAULT_SERVER_URL)]
    server: String,

    /// Local mirror database URL (defaults to the platform data directory)
    #[arg(long, global = true, env = "DAILISH_DATABASE_URL")]
    database: Option<String>,

    /// Skip the server and read from the local mirror
    #[arg(long, global = true)]
    offline: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Create a new list
    Signup(AccountArgs),
    /// Open an existing list
    Login(AccountArgs),
    /// Forget the signed-in user on this device
    Logout,
    /// Show the signed-in user
    Whoami,
    /// Show tasks
    List {
        #[arg(long, default_value_t = Filter::Active)]
        filter: Filter,
        #[arg(long, default_value_t = SortKey::Newest)]
        sort: SortKey,
        /// Group active tasks by category
        #[arg(long)]
        by_category: bool,
        #[arg(long)]
        search: Option<String>,
    },
    /// Add a task
    Add(TaskFields),
    /// Edit a task
    Edit {
        id: String,
        #[command(flatten)]
        fields: TaskFields,
        /// Remove the deadline
        #[arg(long, conflicts_with = "deadline")]
        clear_deadline: bool,
        /// Note recorded in the task's revision history
        #[arg(long)]
        note: Option<String>,
    },
    /// Toggle a task's completed state
    Done { id: String },
    /// Toggle a task's pinned state
    Pin { id: String },
    /// Delete a task
    Delete {
        id: String,
        /// Do not ask for confirmation
        #[arg(long)]
        yes: bool,
    },
    /// Write all tasks to a text file
    Export {
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// List categories, optionally matching some text
    Categories { text: Option<String> },
    /// Show or change the theme
    Theme { name: Option<String> },
    /// Delete a list and everything in it
    DeleteAccount {
        #[command(flatten)]
        account: AccountArgs,
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Args)]
struct AccountArgs {
    username: Option<String>,
    /// 4-digit PIN
    #[arg(long)]
    pin: Option<String>,
}

#[derive(Args)]
struct TaskFields {
    title: Option<String>,
    #[arg(long)]
    brief: Option<String>,
    #[arg(long)]
    category: Option<String>,
    /// Icon id (fa-briefcase) or label (Work)
    #[arg(long)]
    icon: Option<String>,
    #[arg(long)]
    priority: Option<Priority>,
    /// YYYY-MM-DD
    #[arg(long)]
    deadline: Option<String>,
}

impl TaskFields {
    fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.brief.is_none()
            && self.category.is_none()
            && self.icon.is_none()
            && self.priority.is_none()
            && self.deadline.is_none()
    }
}

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error(transparent)]
    Client(#[from] ClientError),
    #[error("{0}")]
    Prompt(#[from] dialoguer::Error),
    #[error("{0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Usage(String),
}

impl From<TaskError> for CliError {
    fn from(err: TaskError) -> Self {
        CliError::Client(err.into())
    }
}

impl CliError {
    fn user_message(&self) -> String {
        match self {
            CliError::Client(e) => e.user_message(),
            other => other.to_string(),
        }
    }
}

type CliResult<T> = Result<T, CliError>;

fn init_tracing() {
    if std::env::var_os("RUST_LOG").is_some() {
        tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::from_default_env())
            .with_writer(std::io::stderr)
            .init();
    }
}

#[tokio::main]
async fn main() {
    init_tracing();
    let cli = Cli::parse();

    if let Err(e) = run(cli).await {
        tracing::error!("{:?}", e);
        eprintln!("{} {}", "✗".red().bold(), e.user_message().red());
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> CliResult<()> {
    let database_url = match cli.database {
        Some(url) => url,
        None => default_database_url()?,
    };
    let db = ClientDatabase::new(&database_url).await?;
    db.run_migrations().await?;

    let engine = SyncEngine::new(
        Arc::new(HttpRemoteStore::new(cli.server)),
        Arc::new(db),
    );
    engine.set_online(!cli.offline);

    let dispatcher = engine.event_dispatcher();
    dispatcher.register_callback(print_notice)?;

    if !engine.database().welcome_shown().await? {
        println!("{}", "👋 Welcome to Dailish!".bold().cyan());
        println!(
            "{}",
            "Run `dailish signup` to start a list or `dailish login` to open one.".dimmed()
        );
        engine.database().mark_welcome_shown().await?;
    }

    let result = dispatch(&engine, cli.command).await;
    dispatcher.process_events()?;
    result
}

fn print_notice(event: &SyncEvent) {
    let Some(notice) = event.user_notice() else {
        return;
    };
    match event {
        SyncEvent::TaskCompleted { .. } => println!("🎉 {}", notice.green().bold()),
        SyncEvent::ServingCached { .. } | SyncEvent::NoCacheAvailable => {
            eprintln!("{} {}", "⚠".yellow(), notice.yellow())
        }
        // Failures are reported once, from the returned error.
        _ => {}
    }
}

async fn dispatch(engine: &Engine, command: Command) -> CliResult<()> {
    match command {
        Command::Signup(args) => signup(engine, args).await,
        Command::Login(args) => login(engine, args).await,
        Command::Logout => {
            engine.logout().await?;
            println!("👋 Signed out.");
            Ok(())
        }
        Command::Whoami => whoami(engine).await,
        Command::List {
            filter,
            sort,
            by_category,
            search,
        } => {
            let mut session = require_session(engine).await?;
            session.view.filter = filter;
            session.view.sort = sort;
            session.view.active_sort = if by_category {
                ActiveSort::Category
            } else {
                ActiveSort::Default
            };
            session.view.search = search.unwrap_or_default();
            print_session(&session);
            Ok(())
        }
        Command::Add(fields) => add(engine, fields).await,
        Command::Edit {
            id,
            fields,
            clear_deadline,
            note,
        } => edit(engine, &id, fields, clear_deadline, note).await,
        Command::Done { id } => {
            let mut session = require_session(engine).await?;
            let task_id = session.find_task(&id)?.id.clone();
            let outcome = engine.toggle_complete(&mut session, &task_id).await?;
            if let MutationOutcome::Applied {
                celebrate: false, ..
            } = outcome
            {
                println!("↩️  Marked as not completed.");
            }
            Ok(())
        }
        Command::Pin { id } => {
            let mut session = require_session(engine).await?;
            let task_id = session.find_task(&id)?.id.clone();
            engine.toggle_pin(&mut session, &task_id).await?;
            let pinned = session.find_task(task_id.as_str()).is_ok_and(|task| task.pinned);
            println!("{}", if pinned { "📌 Pinned." } else { "Unpinned." });
            Ok(())
        }
        Command::Delete { id, yes } => {
            let mut session = require_session(engine).await?;
            let task_id = session.find_task(&id)?.id.clone();
            let confirm = |prompt: &str| yes || ask(prompt);
            match engine.delete_task(&mut session, &task_id, &confirm).await? {
                MutationOutcome::Applied { .. } => println!("🗑️  Task deleted."),
                MutationOutcome::Declined => println!("Nothing deleted."),
            }
            Ok(())
        }
        Command::Export { output } => {
            let session = require_session(engine).await?;
            let text = engine.export(&session, Local::now().fixed_offset()).await?;
            let path = output.unwrap_or_else(|| PathBuf::from(export_filename(&session.username)));
            std::fs::write(&path, text)?;
            println!("📄 Exported to {}", path.display().to_string().green());
            Ok(())
        }
        Command::Categories { text } => {
            let session = require_session(engine).await?;
            let suggestions = session
                .view
                .categories
                .suggest(text.as_deref().unwrap_or_default(), &session.tasks);
            if suggestions.is_empty() {
                println!("No categories found.");
            }
            for (category, icon) in suggestions {
                println!("{} {}", category.bold(), format!("({})", icon.label()).dimmed());
            }
            Ok(())
        }
        Command::Theme { name } => {
            let db = engine.database();
            match name.map(|name| name.trim().to_lowercase()) {
                Some(name) if !name.is_empty() => {
                    db.set_theme(&name).await?;
                    println!("🎨 Theme set to {}", name.cyan());
                }
                _ => println!("🎨 {}", db.theme().await?.cyan()),
            }
            Ok(())
        }
        Command::DeleteAccount { account, yes } => delete_account(engine, account, yes).await,
    }
}

async fn require_session(engine: &Engine) -> CliResult<Session> {
    Ok(engine
        .resume_session()
        .await?
        .ok_or(ClientError::NoSession)?)
}

fn ask(prompt: &str) -> bool {
    Confirm::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .default(false)
        .interact()
        .unwrap_or(false)
}

fn prompt_username(username: Option<String>) -> CliResult<String> {
    match username {
        Some(username) => Ok(username),
        None => Ok(Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Username")
            .interact_text()?),
    }
}

fn prompt_pin(prompt: &str) -> CliResult<Option<String>> {
    let pin = Password::with_theme(&ColorfulTheme::default())
        .with_prompt(prompt)
        .allow_empty_password(true)
        .interact()?;
    Ok(Some(pin).filter(|pin| !pin.trim().is_empty()))
}

async fn signup(engine: &Engine, args: AccountArgs) -> CliResult<()> {
    let username = prompt_username(args.username)?;
    let pin = match args.pin {
        Some(pin) => Some(pin),
        None => prompt_pin("PIN (optional, 4 digits)")?,
    };

    let session = engine.create_account(&username, pin.as_deref()).await?;
    println!("✅ Created a list for {}", session.username.green().bold());
    Ok(())
}

async fn pin_for(engine: &Engine, username: &str, pin: Option<String>) -> CliResult<Option<String>> {
    if pin.is_some() || !engine.requires_pin(username).await? {
        return Ok(pin);
    }
    prompt_pin("PIN")
}

async fn login(engine: &Engine, args: AccountArgs) -> CliResult<()> {
    let username = prompt_username(args.username)?;
    let pin = pin_for(engine, &username, args.pin).await?;

    let session = engine.open_account(&username, pin.as_deref()).await?;
    println!("✅ Signed in as {}", session.username.green().bold());
    print_session(&session);
    Ok(())
}

async fn whoami(engine: &Engine) -> CliResult<()> {
    match engine.database().session_key().await? {
        Some(key) => {
            let username = key.username()?;
            println!("👤 {} {}", username.green().bold(), format!("({key})").dimmed());
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

async fn delete_account(engine: &Engine, args: AccountArgs, yes: bool) -> CliResult<()> {
    let username = match args.username {
        Some(username) => username,
        None => match engine.database().session_key().await? {
            Some(key) => key.username()?,
            None => prompt_username(None)?,
        },
    };
    let pin = pin_for(engine, &username, args.pin).await?;

    let confirm = |prompt: &str| {
        println!("{}", prompt.yellow());
        yes || ask("Delete this account permanently?")
    };
    match engine
        .delete_account(&username, pin.as_deref(), &confirm)
        .await?
    {
        AccountDeletion::Deleted => println!("🗑️  Your account has been deleted."),
        AccountDeletion::Declined => println!("Nothing deleted."),
    }
    Ok(())
}

fn parse_deadline_arg(value: &str) -> CliResult<NaiveDate> {
    parse_deadline(value).ok_or_else(|| CliError::Usage(format!("Invalid deadline: {value}")))
}

fn parse_icon_arg(value: &str) -> CliResult<Icon> {
    Icon::parse_lenient(value).ok_or_else(|| CliError::Usage(format!("Unknown icon: {value}")))
}

async fn add(engine: &Engine, fields: TaskFields) -> CliResult<()> {
    let mut session = require_session(engine).await?;

    let title = match fields.title {
        Some(title) => title,
        None => Input::with_theme(&ColorfulTheme::default())
            .with_prompt("Task title")
            .allow_empty(true)
            .interact_text()?,
    };
    let draft = TaskDraft {
        title,
        brief: fields.brief,
        category: fields.category,
        icon: fields.icon.as_deref().map(parse_icon_arg).transpose()?.unwrap_or_default(),
        priority: fields.priority.unwrap_or_default(),
        deadline: fields.deadline.as_deref().map(parse_deadline_arg).transpose()?,
    };

    engine.add_task(&mut session, draft).await?;
    println!("✅ Task added.");
    Ok(())
}

async fn edit(
    engine: &Engine,
    id: &str,
    fields: TaskFields,
    clear_deadline: bool,
    note: Option<String>,
) -> CliResult<()> {
    let mut session = require_session(engine).await?;
    let task = session.find_task(id)?.clone();
    let mut edit = TaskEdit::from_task(&task);

    if fields.is_empty() && !clear_deadline && note.is_none() {
        prompt_edit(&mut edit)?;
    } else {
        if let Some(title) = fields.title {
            edit.title = title;
        }
        if let Some(brief) = fields.brief {
            edit.brief = Some(brief);
        }
        if let Some(category) = fields.category {
            edit.category = Some(category);
        }
        if let Some(icon) = fields.icon.as_deref() {
            edit.icon = parse_icon_arg(icon)?;
        }
        if let Some(priority) = fields.priority {
            edit.priority = priority;
        }
        if let Some(deadline) = fields.deadline.as_deref() {
            edit.deadline = Some(parse_deadline_arg(deadline)?);
        }
        if clear_deadline {
            edit.deadline = None;
        }
        edit.revision_note = note;
    }

    session.view.begin_edit(task);
    engine.save_edit(&mut session, edit).await?;
    println!("✅ Task updated.");
    Ok(())
}

fn prompt_edit(edit: &mut TaskEdit) -> CliResult<()> {
    let theme = ColorfulTheme::default();
    let text = |prompt: &str, current: Option<&str>| -> CliResult<String> {
        Ok(Input::with_theme(&theme)
            .with_prompt(prompt)
            .default(current.unwrap_or_default().to_string())
            .allow_empty(true)
            .interact_text()?)
    };

    edit.title = text("Title", Some(&edit.title))?;
    edit.brief = Some(text("Details", edit.brief.as_deref())?);
    edit.category = Some(text("Category", edit.category.as_deref())?);
    let priority = text("Priority (high/medium/low)", Some(&edit.priority.to_string()))?;
    edit.priority = priority
        .parse()
        .map_err(|_| CliError::Usage(format!("Unknown priority: {priority}")))?;
    let deadline = text(
        "Deadline (YYYY-MM-DD, blank for none)",
        edit.deadline.map(|d| d.to_string()).as_deref(),
    )?;
    edit.deadline = match deadline.trim() {
        "" => None,
        value => Some(parse_deadline_arg(value)?),
    };
    edit.revision_note = Some(text("Revision note (optional)", None)?);
    Ok(())
}

fn print_session(session: &Session) {
    let today = Local::now().date_naive();
    let rendered = session.render();
    let prefix_len = session.id_prefix_len();

    match &rendered {
        Rendered::Empty => println!("📭 No tasks found."),
        Rendered::Flat(tasks) => {
            println!("{}", format!("📋 {}'s tasks", session.username).bold());
            println!("{}", "─".repeat(60).dimmed());
            for task in tasks {
                print_task(task, today, prefix_len);
            }
        }
        Rendered::Grouped(groups) => {
            for group in groups {
                println!(
                    "{} {}",
                    group.label.bold().cyan(),
                    format!("({})", group.icon.label()).dimmed()
                );
                println!("{}", "─".repeat(60).dimmed());
                for task in &group.tasks {
                    print_task(task, today, prefix_len);
                }
                println!();
            }
        }
    }
}

fn print_task(task: &Task, today: NaiveDate, prefix_len: usize) {
    let status = if task.completed { "✅" } else { "⏳" };
    let pin = if task.pinned { "📌" } else { "  " };
    let priority = match task.priority {
        Priority::High => "🔴",
        Priority::Medium => "🟡",
        Priority::Low => "🟢",
    };
    let id = task.id.prefix(prefix_len);
    let title = if task.completed {
        task.title.dimmed().strikethrough()
    } else {
        task.title.white().bold()
    };
    let deadline = format_deadline(task.deadline);
    let deadline = if !task.completed && is_overdue(task.deadline, today) {
        format!("{deadline} (Overdue)").red()
    } else {
        deadline.dimmed()
    };

    println!("{status} {pin} {priority} {} {title}  {deadline}", id.blue());
    let category = task.category_label().unwrap_or(dailish_core::view::UNCATEGORIZED);
    match task.brief_text() {
        Some(brief) => println!("        {} {}", category.cyan(), format!("- {brief}").dimmed()),
        None => println!("        {}", category.cyan()),
    }
}
