use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use crate::cli::commands::*;
use crate::cli::output::*;
use crate::io::config_io;
use crate::io::lock::FileLock;
use crate::io::session::Session;
use crate::io::storage::FileStorage;
use crate::model::{AppConfig, SubtaskId, TaskId};
use crate::ops::backup::ExportOutcome;
use crate::ops::confirm::{ConfirmAction, delete_needs_confirm};
use crate::ops::group_ops::GroupChange;
use crate::util::time::backup_file_name;

type CmdResult = Result<(), Box<dyn std::error::Error>>;

/// Route `tracing` events to stderr. `RUST_LOG` overrides the default `warn`.
pub fn install_tracing() {
    use tracing_subscriber::EnvFilter;
    use tracing_subscriber::filter::LevelFilter;

    let filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::WARN.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .try_init();
}

/// Where a command runs: the data directory and its config
struct Context {
    data_dir: PathBuf,
    config: AppConfig,
}

impl Context {
    fn load(flag: Option<&str>) -> Result<Self, Box<dyn std::error::Error>> {
        let data_dir = config_io::resolve_data_dir(flag);
        let config = config_io::read_config(&data_dir)?;
        tracing::debug!(data_dir = %data_dir.display(), key = %config.storage.key, "context");
        Ok(Context { data_dir, config })
    }

    fn open(&self) -> Result<Session<FileStorage>, Box<dyn std::error::Error>> {
        let storage = FileStorage::new(&self.data_dir);
        Ok(Session::open(storage, &self.config.storage.key)?)
    }

    /// Hold the data-directory lock for the whole read-modify-write
    fn mutate<F>(&self, f: F) -> CmdResult
    where
        F: FnOnce(&mut Session<FileStorage>) -> CmdResult,
    {
        let _lock = FileLock::acquire_default(&self.data_dir)?;
        let mut session = self.open()?;
        f(&mut session)
    }
}

// ---------------------------------------------------------------------------
// Dispatch
// ---------------------------------------------------------------------------

pub fn dispatch(cli: Cli) -> CmdResult {
    let json = cli.json;
    let ctx = Context::load(cli.data_dir.as_deref())?;

    match cli.command {
        None => {
            eprintln!("Use a subcommand, or run `tick` with none to open the board.");
            Ok(())
        }
        Some(cmd) => match cmd {
            // Read commands
            Commands::List => cmd_list(&ctx, json),
            Commands::Stats(args) => cmd_stats(&ctx, args, json),

            // Write commands
            Commands::Add(args) => cmd_add(&ctx, args),
            Commands::Group(args) => cmd_group(&ctx, args),
            Commands::Sub(args) => cmd_sub(&ctx, args),
            Commands::Toggle(args) => cmd_toggle(&ctx, args),
            Commands::Check(args) => cmd_check(&ctx, args),
            Commands::Unsub(args) => cmd_unsub(&ctx, args),
            Commands::Edit(args) => cmd_edit(&ctx, args),
            Commands::EditSub(args) => cmd_edit_sub(&ctx, args),
            Commands::Mv(args) => cmd_mv(&ctx, args),
            Commands::Delete(args) => cmd_delete(&ctx, args),
            Commands::Clear(args) => cmd_clear(&ctx, args),

            // Backups
            Commands::Export(args) => cmd_export(&ctx, args),
            Commands::Import(args) => cmd_import(&ctx, args),
        },
    }
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// Ask a yes/no question on stderr. Anything but `y`/`yes` is a no,
/// including end of input.
fn ask(prompt: &str) -> Result<bool, std::io::Error> {
    let mut stderr = std::io::stderr();
    write!(stderr, "{} [y/N] ", prompt)?;
    stderr.flush()?;
    let mut answer = String::new();
    std::io::stdin().lock().read_line(&mut answer)?;
    let answer = answer.trim().to_ascii_lowercase();
    Ok(answer == "y" || answer == "yes")
}

/// Run a destructive action after the user agrees (or `--yes` was given)
fn confirm_and_apply(
    session: &mut Session<FileStorage>,
    action: ConfirmAction,
    ask_first: bool,
) -> Result<bool, Box<dyn std::error::Error>> {
    if ask_first && !ask(&action.prompt())? {
        println!("cancelled");
        return Ok(false);
    }
    session.apply(action)?;
    Ok(true)
}

fn report_group_change(group: TaskId, change: GroupChange) {
    match change {
        GroupChange::Unchanged => {}
        GroupChange::Promoted => println!("group #{} finished", group),
        GroupChange::Demoted => println!("group #{} reopened", group),
    }
}

// ---------------------------------------------------------------------------
// Read commands
// ---------------------------------------------------------------------------

fn cmd_list(ctx: &Context, json: bool) -> CmdResult {
    let session = ctx.open()?;
    if json {
        println!("{}", serde_json::to_string_pretty(&board_to_json(session.board()))?);
    } else {
        for line in format_board(session.board()) {
            println!("{}", line);
        }
    }
    Ok(())
}

fn cmd_stats(ctx: &Context, args: StatsArgs, json: bool) -> CmdResult {
    if args.reset {
        return ctx.mutate(|session| {
            if confirm_and_apply(session, ConfirmAction::ResetStats, !args.yes)? {
                println!("tally reset");
            }
            Ok(())
        });
    }
    let session = ctx.open()?;
    let stats = &session.board().stats;
    if json {
        println!("{}", serde_json::to_string_pretty(&stats_to_json(stats))?);
    } else {
        println!("{}", format_stats(stats));
    }
    Ok(())
}

// ---------------------------------------------------------------------------
// Write commands
// ---------------------------------------------------------------------------

fn cmd_add(ctx: &Context, args: TextArgs) -> CmdResult {
    ctx.mutate(|session| {
        match session.add_simple(&args.text)? {
            Some(id) => println!("added #{}", id),
            None => return Err("task text is empty".into()),
        }
        Ok(())
    })
}

fn cmd_group(ctx: &Context, args: TextArgs) -> CmdResult {
    ctx.mutate(|session| {
        match session.add_group(&args.text)? {
            Some(id) => println!("added group #{}", id),
            None => return Err("group title is empty".into()),
        }
        Ok(())
    })
}

fn cmd_sub(ctx: &Context, args: SubArgs) -> CmdResult {
    ctx.mutate(|session| {
        let group = TaskId(args.group);
        match session.add_subtask(group, &args.text)? {
            Some((sub, change)) => {
                println!("added step #{} to group #{}", sub, group);
                report_group_change(group, change);
            }
            None => return Err("step text is empty".into()),
        }
        Ok(())
    })
}

fn cmd_toggle(ctx: &Context, args: IdArgs) -> CmdResult {
    ctx.mutate(|session| {
        let id = TaskId(args.id);
        if session.toggle_simple(id)? {
            println!("done #{}", id);
        } else {
            println!("reopened #{}", id);
        }
        Ok(())
    })
}

fn cmd_check(ctx: &Context, args: SubIdArgs) -> CmdResult {
    ctx.mutate(|session| {
        let (group, sub) = (TaskId(args.group), SubtaskId(args.sub));
        let toggle = session.toggle_subtask(group, sub)?;
        if toggle.done {
            println!("done step #{}", sub);
        } else {
            println!("reopened step #{}", sub);
        }
        report_group_change(group, toggle.group);
        Ok(())
    })
}

fn cmd_unsub(ctx: &Context, args: SubIdArgs) -> CmdResult {
    ctx.mutate(|session| {
        let (group, sub) = (TaskId(args.group), SubtaskId(args.sub));
        let change = session.remove_subtask(group, sub)?;
        println!("removed step #{}", sub);
        report_group_change(group, change);
        Ok(())
    })
}

fn cmd_edit(ctx: &Context, args: EditArgs) -> CmdResult {
    ctx.mutate(|session| {
        let id = TaskId(args.id);
        if session.edit_text(id, &args.text)? {
            println!("updated #{}", id);
        } else {
            println!("unchanged #{}", id);
        }
        Ok(())
    })
}

fn cmd_edit_sub(ctx: &Context, args: EditSubArgs) -> CmdResult {
    ctx.mutate(|session| {
        let sub = SubtaskId(args.sub);
        if session.edit_subtask(TaskId(args.group), sub, &args.text)? {
            println!("updated step #{}", sub);
        } else {
            println!("unchanged step #{}", sub);
        }
        Ok(())
    })
}

fn cmd_mv(ctx: &Context, args: MvArgs) -> CmdResult {
    ctx.mutate(|session| {
        let id = TaskId(args.id);
        session.move_pending(id, args.position.saturating_sub(1))?;
        if let Some(pos) = session.board().pending.iter().position(|t| t.id == id) {
            println!("#{} is now at position {}", id, pos + 1);
        }
        Ok(())
    })
}

fn cmd_delete(ctx: &Context, args: DeleteArgs) -> CmdResult {
    ctx.mutate(|session| {
        let id = TaskId(args.id);
        let node = session
            .board()
            .node(id)
            .ok_or_else(|| format!("task not found: {}", id))?;
        let ask_first = !args.yes && delete_needs_confirm(node, &ctx.config.ui);
        let action = ConfirmAction::delete(node);
        if confirm_and_apply(session, action, ask_first)? {
            println!("deleted #{}", id);
        }
        Ok(())
    })
}

fn cmd_clear(ctx: &Context, args: ClearArgs) -> CmdResult {
    ctx.mutate(|session| {
        if session.board().bucket(&args.date).is_none() {
            return Err(format!("no archived tasks for {}", args.date).into());
        }
        let action = ConfirmAction::ClearBucket {
            key: args.date.clone(),
        };
        if confirm_and_apply(session, action, !args.yes)? {
            println!("cleared {}", args.date);
        }
        Ok(())
    })
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

fn cmd_export(ctx: &Context, args: ExportArgs) -> CmdResult {
    let session = ctx.open()?;
    let dest = match args.path {
        Some(p) => PathBuf::from(p),
        None => PathBuf::from(backup_file_name(session.now())),
    };
    match session.export(&dest)? {
        ExportOutcome::Written(path) => println!("exported to {}", path.display()),
        ExportOutcome::Empty => println!("nothing to export yet"),
    }
    Ok(())
}

fn cmd_import(ctx: &Context, args: ImportArgs) -> CmdResult {
    let path = Path::new(&args.path);
    if !path.is_file() {
        return Err(format!("no such file: {}", path.display()).into());
    }
    ctx.mutate(|session| {
        let action = ConfirmAction::Import {
            path: path.to_path_buf(),
        };
        if confirm_and_apply(session, action, !args.yes)? {
            let board = session.board();
            println!(
                "imported {} pending and {} archived tasks",
                board.pending.len(),
                board.done_count()
            );
        }
        Ok(())
    })
}
