//! Command implementations for the CLI interface.
//!
//! This module contains the command handlers behind each subcommand. They
//! are a thin collaborator over the engine: resolve arguments, call into
//! the workflow/filter/analytics modules, render the result, and report
//! engine errors to the user. No workflow rule lives here.

use clap::Subcommand;
use clap_complete::{generate, Shell};

use std::fs;
use std::path::Path;

use chrono::{Local, NaiveDate, TimeZone, Utc};

use crate::analytics;
use crate::auth::Actor;
use crate::db::*;
use crate::fields::*;
use crate::filter::{filter_tasks, FilterState};
use crate::task::{NewDocument, NewMilestone, NewTask, TaskFieldUpdate};
use crate::workflow;

#[derive(Subcommand)]
pub enum Commands {
    /// Add a new work item (client role required).
    Add {
        /// Short title for the work item.
        title: String,
        /// Optional longer description.
        #[arg(long)]
        desc: Option<String>,
        /// Subcontractor user id responsible for the work.
        #[arg(long)]
        assignee: Option<String>,
        /// Priority: low | medium | high.
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: Option<String>,
        /// Start date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        start: Option<String>,
    },

    /// List work items through the saved filters.
    List {
        /// Ignore the saved filters and list everything.
        #[arg(long)]
        all: bool,
    },

    /// View a single work item with comments, documents and activity.
    View {
        /// Task ID to view.
        id: u64,
    },

    /// Update non-status fields on a work item.
    Update {
        /// Task ID to update.
        id: u64,
        #[arg(long)]
        title: Option<String>,
        #[arg(long)]
        desc: Option<String>,
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long, value_enum)]
        priority: Option<Priority>,
        #[arg(long)]
        due: Option<String>,
        #[arg(long)]
        start: Option<String>,
        /// Clear due date.
        #[arg(long)]
        clear_due: bool,
        /// Clear start date.
        #[arg(long)]
        clear_start: bool,
        /// Clear the assignee.
        #[arg(long)]
        clear_assignee: bool,
    },

    /// Move a work item to a new status (authorization applies).
    Move {
        /// Task ID to move.
        id: u64,
        /// Target status.
        #[arg(value_enum)]
        to: TaskStatus,
    },

    /// Note a delay on a work item (assignee only).
    Delay {
        /// Task ID to flag.
        id: u64,
        /// Reason for the delay.
        reason: String,
    },

    /// Add a comment to a work item.
    Comment {
        /// Task ID to comment on.
        id: u64,
        /// Comment text.
        content: String,
    },

    /// Record uploaded document metadata on a work item.
    Attach {
        /// Task ID to attach to.
        id: u64,
        /// Document file name.
        name: String,
        /// Document size in bytes.
        #[arg(long, default_value_t = 0)]
        size: u64,
        /// MIME type of the document.
        #[arg(long, default_value = "application/octet-stream")]
        mime: String,
    },

    /// Manage schedule milestones.
    Milestone {
        #[command(subcommand)]
        action: MilestoneAction,
    },

    /// Manage the saved task filters.
    Filter {
        #[command(subcommand)]
        action: FilterAction,
    },

    /// Show the flat audit trail of status transitions.
    Log {
        /// Restrict to one task.
        #[arg(long)]
        task: Option<u64>,
    },

    /// Per-subcontractor performance table.
    Performance,

    /// Overall project health ratios.
    Health,

    /// Create a timestamped backup of the database file.
    Backup,

    /// Generate shell completion scripts.
    Completions {
        /// Shell to generate completions for.
        #[arg(value_enum)]
        shell: Shell,
    },
}

#[derive(Subcommand)]
pub enum MilestoneAction {
    /// Add a milestone (client role required).
    Add {
        /// Milestone title.
        title: String,
        /// Due date: YYYY-MM-DD, "today", "tomorrow", or "in Nd".
        #[arg(long)]
        due: String,
        /// Initial status: pending | reached.
        #[arg(long, value_enum, default_value_t = MilestoneStatus::Pending)]
        status: MilestoneStatus,
    },
    /// List milestones.
    List,
}

#[derive(Subcommand)]
pub enum FilterAction {
    /// Replace the saved filters wholesale. Omitted flags clear that
    /// dimension.
    Set {
        #[arg(long)]
        assignee: Option<String>,
        #[arg(long, value_enum)]
        status: Option<TaskStatus>,
        /// Keep tasks due on or before this date.
        #[arg(long)]
        due_by: Option<String>,
    },
    /// Clear all saved filters.
    Clear,
    /// Show the saved filters.
    Show,
}

/// Exit with a message unless the global actor flags were given.
pub fn require_actor(actor: Option<Actor>) -> Actor {
    match actor {
        Some(a) => a,
        None => {
            eprintln!("This command needs an acting identity: pass --actor <id> and --role <client|subcontractor>.");
            std::process::exit(1);
        }
    }
}

fn parse_due_or_exit(s: &str) -> NaiveDate {
    let today = Local::now().date_naive();
    match parse_due_input(s, today) {
        Some(d) => d,
        None => {
            eprintln!("Unrecognised date '{s}'. Use YYYY-MM-DD, \"today\", \"tomorrow\", or \"in Nd\".");
            std::process::exit(1);
        }
    }
}

fn save_or_exit(db: &Database, db_path: &Path) {
    if let Err(e) = db.save(db_path) {
        eprintln!("Failed to save DB: {e}");
        std::process::exit(1);
    }
}

fn engine_err(e: workflow::WorkflowError) -> ! {
    eprintln!("{e}");
    std::process::exit(1);
}

fn now_utc() -> i64 {
    Utc::now().timestamp()
}

/// Add a new work item.
pub fn cmd_add(
    db: &mut Database,
    db_path: &Path,
    actor: &Actor,
    title: String,
    desc: Option<String>,
    assignee: Option<String>,
    priority: Option<Priority>,
    due: Option<String>,
    start: Option<String>,
) {
    let new = NewTask {
        title,
        description: desc,
        assigned_to: assignee,
        priority,
        due: due.as_deref().map(parse_due_or_exit),
        start: start.as_deref().map(parse_due_or_exit),
    };
    match workflow::create_task(db, new, actor, now_utc()) {
        Ok(id) => {
            save_or_exit(db, db_path);
            println!("Added task {id}");
        }
        Err(e) => engine_err(e),
    }
}

/// List work items through the saved filters.
pub fn cmd_list(db: &Database, all: bool) {
    let today = Local::now().date_naive();
    let empty = FilterState::default();
    let filters = if all { &empty } else { &db.filters };
    let filtered = filter_tasks(&db.tasks, filters);
    if !all && !db.filters.is_empty() {
        println!("({} of {} tasks match the saved filters)", filtered.len(), db.tasks.len());
    }
    print_table(&filtered, today);
}

/// View detailed information about a work item.
pub fn cmd_view(db: &Database, id: u64) {
    let Some(task) = db.get(id) else {
        eprintln!("Task {id} not found.");
        std::process::exit(1);
    };
    let today = Local::now().date_naive();
    println!("ID:           {}", task.id);
    println!("Title:        {}", task.title);
    println!("Status:       {}", format_status(task.status));
    println!("Priority:     {}", format_priority(task.priority));
    println!("Assignee:     {}", task.assigned_to.clone().unwrap_or_else(|| "-".into()));
    println!("Due:          {}", match task.due {
        Some(d) => format!("{d} ({})", format_due_relative(Some(d), today)),
        None => "-".into(),
    });
    println!("Start:        {}", task.start.map(|d| d.to_string()).unwrap_or_else(|| "-".into()));
    if task.is_delayed {
        println!(
            "Delayed:      yes ({}, noted by {})",
            task.delay_reason.as_deref().unwrap_or("-"),
            task.delay_noted_by.as_deref().unwrap_or("-"),
        );
    }
    println!("Created UTC:  {}", format_ts(task.created_at_utc));
    println!("Updated UTC:  {}", format_ts(task.updated_at_utc));
    println!("Description:\n{}\n", task.description.clone().unwrap_or_else(|| "-".into()));

    println!("Comments:");
    if task.comments.is_empty() {
        println!("  -");
    }
    for c in &task.comments {
        println!("  [{}] {}: {}", format_ts(c.timestamp), c.author_name, c.content);
    }

    println!("Documents:");
    if task.documents.is_empty() {
        println!("  -");
    }
    for d in &task.documents {
        println!("  {} ({} bytes, {}) uploaded by {}", d.name, d.size, d.mime_type, d.uploaded_by);
    }

    println!("Activity:");
    if task.activity_log.is_empty() {
        println!("  -");
    }
    for a in &task.activity_log {
        println!("  [{}] {} {}", format_ts(a.timestamp), a.actor_name, a.action);
    }
}

fn format_ts(ts: i64) -> String {
    Utc.timestamp_opt(ts, 0)
        .single()
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| ts.to_string())
}

/// Update non-status fields on a work item.
pub fn cmd_update(
    db: &mut Database,
    db_path: &Path,
    id: u64,
    title: Option<String>,
    desc: Option<String>,
    assignee: Option<String>,
    priority: Option<Priority>,
    due: Option<String>,
    start: Option<String>,
    clear_due: bool,
    clear_start: bool,
    clear_assignee: bool,
) {
    let changes = TaskFieldUpdate {
        title,
        description: desc,
        assigned_to: assignee,
        priority,
        due: due.as_deref().map(parse_due_or_exit),
        start: start.as_deref().map(parse_due_or_exit),
        clear_due,
        clear_start,
        clear_assignee,
    };
    match workflow::update_task_fields(db, id, changes, now_utc()) {
        Ok(()) => {
            save_or_exit(db, db_path);
            println!("Updated task {id}");
        }
        Err(e) => engine_err(e),
    }
}

/// Move a work item to a new status.
pub fn cmd_move(db: &mut Database, db_path: &Path, actor: &Actor, id: u64, to: TaskStatus) {
    match workflow::move_task(db, id, to, actor, now_utc()) {
        Ok(()) => {
            save_or_exit(db, db_path);
            println!("Task {id} moved to {}", status_slug(to));
        }
        Err(e) => engine_err(e),
    }
}

/// Note a delay on a work item.
pub fn cmd_delay(db: &mut Database, db_path: &Path, actor: &Actor, id: u64, reason: String) {
    match workflow::note_delay(db, id, &reason, actor, now_utc()) {
        Ok(()) => {
            save_or_exit(db, db_path);
            println!("Delay noted on task {id}");
        }
        Err(e) => engine_err(e),
    }
}

/// Add a comment to a work item.
pub fn cmd_comment(db: &mut Database, db_path: &Path, actor: &Actor, id: u64, content: String) {
    match workflow::add_comment(db, id, &content, actor, now_utc()) {
        Ok(_) => {
            save_or_exit(db, db_path);
            println!("Comment added to task {id}");
        }
        Err(e) => engine_err(e),
    }
}

/// Record document metadata on a work item.
pub fn cmd_attach(
    db: &mut Database,
    db_path: &Path,
    actor: &Actor,
    id: u64,
    name: String,
    size: u64,
    mime: String,
) {
    let new = NewDocument { name, size, mime_type: mime };
    match workflow::add_document(db, id, new, actor, now_utc()) {
        Ok(_) => {
            save_or_exit(db, db_path);
            println!("Document recorded on task {id}");
        }
        Err(e) => engine_err(e),
    }
}

/// Handle milestone subcommands.
pub fn cmd_milestone(db: &mut Database, db_path: &Path, actor: Option<Actor>, action: MilestoneAction) {
    match action {
        MilestoneAction::Add { title, due, status } => {
            let actor = require_actor(actor);
            let new = NewMilestone { title, due: parse_due_or_exit(&due), status };
            match workflow::add_milestone(db, new, &actor, now_utc()) {
                Ok(id) => {
                    save_or_exit(db, db_path);
                    println!("Added milestone {id}");
                }
                Err(e) => engine_err(e),
            }
        }
        MilestoneAction::List => {
            let today = Local::now().date_naive();
            println!("{:<5} {:<9} {:<12} {}", "ID", "Status", "Due", "Title");
            for m in &db.milestones {
                println!(
                    "{:<5} {:<9} {:<12} {}",
                    m.id,
                    format_milestone_status(m.status),
                    format_due_relative(Some(m.due), today),
                    m.title,
                );
            }
        }
    }
}

/// Handle filter subcommands. `Set` replaces the whole filter state.
pub fn cmd_filter(db: &mut Database, db_path: &Path, action: FilterAction) {
    match action {
        FilterAction::Set { assignee, status, due_by } => {
            db.filters = FilterState {
                assignee,
                status,
                due_by: due_by.as_deref().map(parse_due_or_exit),
            };
            save_or_exit(db, db_path);
            println!("Filters saved");
        }
        FilterAction::Clear => {
            db.filters = FilterState::default();
            save_or_exit(db, db_path);
            println!("Filters cleared");
        }
        FilterAction::Show => {
            let f = &db.filters;
            println!("Assignee: {}", f.assignee.as_deref().unwrap_or("-"));
            println!("Status:   {}", f.status.map(format_status).unwrap_or("-"));
            println!("Due by:   {}", f.due_by.map(|d| d.to_string()).unwrap_or_else(|| "-".into()));
        }
    }
}

/// Show the flat audit trail.
pub fn cmd_log(db: &Database, task: Option<u64>) {
    let entries: Vec<_> = db
        .audit
        .iter()
        .filter(|a| task.map_or(true, |id| a.task_id == id))
        .collect();
    if entries.is_empty() {
        println!("No activity recorded.");
        return;
    }
    for a in entries {
        println!("[{}] task {}: {} {}", format_ts(a.timestamp), a.task_id, a.actor_name, a.action);
    }
}

/// Print the per-subcontractor performance table.
pub fn cmd_performance(db: &Database) {
    let perf = analytics::compute_performance(&db.tasks);
    if perf.is_empty() {
        println!("No assigned tasks yet.");
        return;
    }
    println!(
        "{:<16} {:>5} {:>7} {:>8} {:>7} {:>7} {:>8} {:>6}",
        "Assignee", "Tasks", "OnTime", "Delayed", "Passed", "Failed", "OnTime%", "Pass%"
    );
    for (assignee, rec) in &perf {
        println!(
            "{:<16} {:>5} {:>7} {:>8} {:>7} {:>7} {:>7}% {:>5}%",
            truncate(assignee, 16),
            rec.total_tasks,
            rec.completed_on_time,
            rec.delayed,
            rec.inspection_passed,
            rec.inspection_failed,
            rec.on_time_percentage(),
            rec.pass_rate(),
        );
    }

    let reasons = analytics::delay_reasons(&db.tasks);
    if !reasons.is_empty() {
        println!("\nDelay reasons:");
        for (reason, count) in &reasons {
            println!("  {count}x {reason}");
        }
    }
}

/// Print the overall project health ratios.
pub fn cmd_health(db: &Database) {
    match analytics::project_health(&db.tasks) {
        None => println!("No tasks yet, project health is undefined."),
        Some(h) => {
            println!("Completion:      {:.1}%", h.completion_pct);
            println!("On time:         {:.1}%", h.on_time_pct);
            println!("Delayed:         {:.1}%", h.delayed_pct);
            println!("Inspection pass: {:.1}%", h.inspection_pass_rate);
        }
    }
}

/// Create a timestamped backup copy of the database file.
pub fn cmd_backup(db_path: &Path) {
    match create_backup(db_path) {
        Ok(backup_path) => println!("Backup created: {backup_path}"),
        Err(e) => {
            eprintln!("Failed to create backup: {e}");
            std::process::exit(1);
        }
    }
}

/// Copy the database file into a backup/ directory next to it.
pub fn create_backup(db_path: &Path) -> Result<String, std::io::Error> {
    if !db_path.exists() {
        return Err(std::io::Error::new(
            std::io::ErrorKind::NotFound,
            "Database file does not exist",
        ));
    }

    let parent_dir = db_path.parent().unwrap_or_else(|| Path::new("."));
    let backup_dir = parent_dir.join("backup");
    fs::create_dir_all(&backup_dir)?;

    let timestamp = Local::now().format("%Y-%m-%d_%H-%M-%S");
    let db_filename = db_path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("site.json");
    let backup_path = backup_dir.join(format!("{timestamp}_{db_filename}"));
    fs::copy(db_path, &backup_path)?;
    Ok(backup_path.display().to_string())
}

/// Generate shell completion scripts.
pub fn cmd_completions(shell: Shell) {
    use clap::CommandFactory;

    use crate::cli::Cli;

    let mut app = Cli::command();
    let app_name = app.get_name().to_string();
    generate(shell, &mut app, app_name, &mut std::io::stdout());
}
