use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;
use crate::fields::Role;

/// File-backed subcontract work tracker CLI.
/// Storage defaults to ~/.subwork/site.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "subwork", version, about = "Subcontract work tracking CLI")]
pub struct Cli {
    /// Path to the JSON database file.
    #[arg(long, global = true)]
    pub db: Option<PathBuf>,

    /// Acting user id. Required by mutating commands.
    #[arg(long, global = true)]
    pub actor: Option<String>,

    /// Acting user display name. Defaults to the actor id.
    #[arg(long, global = true)]
    pub actor_name: Option<String>,

    /// Acting user role: client | subcontractor.
    #[arg(long, global = true, value_enum)]
    pub role: Option<Role>,

    #[command(subcommand)]
    pub command: Commands,
}
