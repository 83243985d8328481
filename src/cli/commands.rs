use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "tick", about = concat!("tickoff v", env!("CARGO_PKG_VERSION"), " - tick it off, keep the tally"), version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Output as JSON
    #[arg(long, global = true)]
    pub json: bool,

    /// Use a different data directory
    #[arg(short = 'C', long = "data-dir", global = true)]
    pub data_dir: Option<String>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Show pending tasks and the archive
    List,
    /// Show the tally of finished groups and items
    Stats(StatsArgs),
    /// Add a task to the end of the pending list
    Add(TextArgs),
    /// Add an empty group
    Group(TextArgs),
    /// Add a step to a group
    Sub(SubArgs),
    /// Mark a task done, or bring it back if it is done
    Toggle(IdArgs),
    /// Tick or untick a step of a group
    Check(SubIdArgs),
    /// Remove a step from a group
    Unsub(SubIdArgs),
    /// Change the text of a pending task or group title
    Edit(EditArgs),
    /// Change the text of a step
    EditSub(EditSubArgs),
    /// Move a pending task to a new position
    Mv(MvArgs),
    /// Permanently delete a task
    Delete(DeleteArgs),
    /// Remove every archived task of one day
    Clear(ClearArgs),
    /// Copy the saved data to a backup file
    Export(ExportArgs),
    /// Replace all data with a backup file
    Import(ImportArgs),
}

// ---------------------------------------------------------------------------
// Read command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct StatsArgs {
    /// Reset both counters to zero
    #[arg(long)]
    pub reset: bool,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Write command args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct TextArgs {
    /// Task text
    pub text: String,
}

#[derive(Args)]
pub struct IdArgs {
    /// Task ID (as shown by `tick list`)
    pub id: u64,
}

#[derive(Args)]
pub struct SubArgs {
    /// Group ID
    pub group: u64,
    /// Step text
    pub text: String,
}

#[derive(Args)]
pub struct SubIdArgs {
    /// Group ID
    pub group: u64,
    /// Step ID
    pub sub: u64,
}

#[derive(Args)]
pub struct EditArgs {
    /// Task ID
    pub id: u64,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct EditSubArgs {
    /// Group ID
    pub group: u64,
    /// Step ID
    pub sub: u64,
    /// New text
    pub text: String,
}

#[derive(Args)]
pub struct MvArgs {
    /// Task ID
    pub id: u64,
    /// New position in the pending list (1 = top)
    pub position: usize,
}

#[derive(Args)]
pub struct DeleteArgs {
    /// Task ID
    pub id: u64,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

#[derive(Args)]
pub struct ClearArgs {
    /// Day to clear, as shown in the archive (e.g. 2025年03月07日)
    pub date: String,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}

// ---------------------------------------------------------------------------
// Backup args
// ---------------------------------------------------------------------------

#[derive(Args)]
pub struct ExportArgs {
    /// Destination file (default: mytasks_backup_<date>.json in the current directory)
    pub path: Option<String>,
}

#[derive(Args)]
pub struct ImportArgs {
    /// Backup file to read
    pub path: String,
    /// Skip the confirmation prompt
    #[arg(long)]
    pub yes: bool,
}
