//! # subwork - Subcontract Work Tracking CLI
//!
//! A command-line tracker for construction-style subcontracted work items
//! moving through a fixed approval workflow.
//!
//! ## Key Features
//!
//! - **Fixed Approval Pipeline**: Assigned → Accepted → Work Done →
//!   Inspection Requested → Approved, with a rework loop on failed
//!   inspections
//! - **Role-Based Authorization**: clients rule on inspections,
//!   subcontractors progress only their own tasks, and every transition is
//!   checked before it is written
//! - **Audit Trail**: one immutable activity entry per successful
//!   transition, on the task and in a flat process-wide log
//! - **Delay Tracking & Analytics**: per-subcontractor performance and
//!   overall project health, recomputed from live state
//! - **Local File Storage**: a single JSON document, written atomically
//!
//! ## Quick Start
//!
//! ```bash
//! # A client sets up work
//! subwork --actor c1 --role client add "Pour foundation" --assignee acme --due 2025-07-01
//!
//! # The subcontractor takes it through the pipeline
//! subwork --actor acme --role subcontractor move 1 accepted
//! subwork --actor acme --role subcontractor move 1 work-done
//! subwork --actor acme --role subcontractor move 1 inspection-requested
//!
//! # The client rules on the inspection
//! subwork --actor c1 --role client move 1 approved
//!
//! # Reading state needs no identity
//! subwork list
//! subwork performance
//! subwork health
//! ```
//!
//! Data is stored in `~/.subwork/site.json` (override with `--db` or
//! `SUBWORK_DB`). Logging is controlled via `RUST_LOG`.

use std::path::PathBuf;

use clap::Parser;
use tracing_subscriber::EnvFilter;

pub mod analytics;
pub mod auth;
pub mod cli;
pub mod cmd;
pub mod db;
pub mod fields;
pub mod filter;
pub mod task;
pub mod workflow;

use auth::Actor;
use cli::Cli;
use cmd::*;
use db::Database;

fn main() {
    tracing_subscriber::fmt().with_env_filter(EnvFilter::from_default_env()).init();

    let cli = Cli::parse();

    // Completions need no database.
    if let Commands::Completions { shell } = &cli.command {
        cmd_completions(*shell);
        return;
    }

    let db_path = cli.db.clone().unwrap_or_else(|| {
        if let Ok(p) = std::env::var("SUBWORK_DB") {
            return PathBuf::from(p);
        }
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        let dir = PathBuf::from(home).join(".subwork");
        if let Err(e) = std::fs::create_dir_all(&dir) {
            eprintln!("Failed to create data directory {}: {}", dir.display(), e);
            std::process::exit(1);
        }
        dir.join("site.json")
    });

    // The acting identity is explicit and threaded into every
    // authorization-sensitive call; nothing reads it ambiently.
    let actor = cli.actor.map(|id| {
        let role = cli.role.unwrap_or_else(|| {
            eprintln!("--actor also needs --role <client|subcontractor>.");
            std::process::exit(1);
        });
        Actor {
            name: cli.actor_name.unwrap_or_else(|| id.clone()),
            id,
            role,
        }
    });

    let mut db = Database::load(&db_path);

    match cli.command {
        Commands::Completions { .. } => unreachable!("handled above"),

        Commands::Add { title, desc, assignee, priority, due, start } => {
            let actor = require_actor(actor);
            cmd_add(&mut db, &db_path, &actor, title, desc, assignee, priority, due, start);
        }

        Commands::List { all } => cmd_list(&db, all),

        Commands::View { id } => cmd_view(&db, id),

        Commands::Update {
            id, title, desc, assignee, priority, due, start,
            clear_due, clear_start, clear_assignee,
        } => cmd_update(
            &mut db, &db_path, id, title, desc, assignee, priority, due, start,
            clear_due, clear_start, clear_assignee,
        ),

        Commands::Move { id, to } => {
            let actor = require_actor(actor);
            cmd_move(&mut db, &db_path, &actor, id, to);
        }

        Commands::Delay { id, reason } => {
            let actor = require_actor(actor);
            cmd_delay(&mut db, &db_path, &actor, id, reason);
        }

        Commands::Comment { id, content } => {
            let actor = require_actor(actor);
            cmd_comment(&mut db, &db_path, &actor, id, content);
        }

        Commands::Attach { id, name, size, mime } => {
            let actor = require_actor(actor);
            cmd_attach(&mut db, &db_path, &actor, id, name, size, mime);
        }

        Commands::Milestone { action } => cmd_milestone(&mut db, &db_path, actor, action),

        Commands::Filter { action } => cmd_filter(&mut db, &db_path, action),

        Commands::Log { task } => cmd_log(&db, task),

        Commands::Performance => cmd_performance(&db),

        Commands::Health => cmd_health(&db),

        Commands::Backup => cmd_backup(&db_path),
    }
}
