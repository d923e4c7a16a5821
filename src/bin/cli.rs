use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use serde_json::Value;

use rmmz_tools::error::AppError;
use rmmz_tools::registry::params::{BackupFileParams, PageParams, SearchEventsParams};
use rmmz_tools::mz::EventCommand;
use rmmz_tools::registry::{self, catalog, Command, CommandOutput, CommandResult};
use rmmz_tools::state::AppState;
use rmmz_tools::{annotate, logging, mcp, paths, settings};

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "rmmz-tools", about = "RPG Maker MZ project editing tools", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory (settings.json, tool-logs/)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Backups kept per data file, overriding settings.json
    #[arg(long, global = true)]
    backup_keep: Option<usize>,

    /// Log filter, e.g. `debug` or `rmmz_tools=trace`. RUST_LOG wins.
    #[arg(long, global = true)]
    log: Option<String>,

    /// Output the typed result as JSON instead of the message text
    #[arg(long, global = true)]
    json: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Serve tools over stdio (JSON-RPC, one message per line)
    Serve,
    /// Serve tools over HTTP on 127.0.0.1
    #[cfg(feature = "http-api")]
    ServeHttp {
        #[arg(long, default_value_t = 7878)]
        port: u16,
    },
    /// List available tools
    Tools,
    /// Call any tool with JSON arguments
    Call {
        tool: String,
        /// Arguments object; defaults to `{}`
        args: Option<String>,
    },
    /// Print an event page with annotations
    Page {
        project: PathBuf,
        map: u32,
        event: u32,
        #[arg(default_value_t = 0)]
        page: usize,
    },
    /// Search event commands for text or an opcode
    Search { project: PathBuf, query: String },
    /// List backups of one data file, or of all of them
    Backups {
        project: PathBuf,
        #[arg(long)]
        file: Option<String>,
    },
    /// Restore a data file from its newest backup
    Undo {
        project: PathBuf,
        #[arg(long)]
        file: Option<String>,
    },
    /// Check an event page's block structure
    Check {
        project: PathBuf,
        map: u32,
        event: u32,
        #[arg(default_value_t = 0)]
        page: usize,
    },
    /// Print the effective settings
    Settings {
        /// Write them back to settings.json in the config directory
        #[arg(long)]
        save: bool,
    },
}

fn fail(message: impl std::fmt::Display) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

fn initialize_state(cli: &Cli) -> Result<Arc<AppState>, AppError> {
    let config_dir = cli.config_dir.clone().unwrap_or_else(paths::default_config_dir);
    let mut loaded = settings::load_settings(&config_dir)?;
    if let Some(keep) = cli.backup_keep {
        loaded.backup_keep = keep;
    }
    if let Some(filter) = &cli.log {
        loaded.log_filter.clone_from(filter);
    }
    logging::init_tracing(&loaded.log_filter);
    tracing::debug!(config_dir = %config_dir.display(), "settings loaded");
    Ok(Arc::new(AppState::new(loaded, config_dir)))
}

// ── Command building ─────────────────────────────────────────────

fn page_params(project: &Path, map: u32, event: u32, page: usize) -> PageParams {
    PageParams {
        project_path: project.to_path_buf(),
        map_id: map,
        event_id: event,
        page_index: page,
    }
}

/// Typed shortcut for a subcommand, or `None` for the ones handled directly.
fn build_command(cmd: &Commands) -> Option<Command> {
    let built = match cmd {
        Commands::Page {
            project,
            map,
            event,
            page,
        } => Command::GetEventPage(page_params(project, *map, *event, *page)),
        Commands::Check {
            project,
            map,
            event,
            page,
        } => Command::CheckEventPage(page_params(project, *map, *event, *page)),
        Commands::Search { project, query } => Command::SearchEvents(SearchEventsParams {
            project_path: project.clone(),
            query: query.clone(),
        }),
        Commands::Backups { project, file } => Command::ListBackups(BackupFileParams {
            project_path: project.clone(),
            filename: file.clone(),
        }),
        Commands::Undo { project, file } => Command::UndoLastChange(BackupFileParams {
            project_path: project.clone(),
            filename: file.clone(),
        }),
        _ => return None,
    };
    Some(built)
}

// ── Output formatting ────────────────────────────────────────────

fn print_output(output: &CommandOutput, raw_json: bool) {
    if let (false, CommandResult::GetEventPage(annotated)) = (raw_json, &output.result) {
        let list: Vec<EventCommand> = annotated.iter().map(|a| a.command.clone()).collect();
        println!("{}", annotate::describe_page(&list));
        return;
    }
    if raw_json {
        let json = serde_json::json!({
            "message": output.message,
            "result": output.result,
        });
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
        return;
    }
    println!("{}", output.message);
}

fn print_tools() {
    for entry in catalog::command_registry() {
        let marker = if entry.mutating { "*" } else { " " };
        println!("{marker} {:<24} {}", entry.name, entry.description);
    }
    println!();
    println!("* writes a data file (a backup is taken first)");
}

// ── Main ─────────────────────────────────────────────────────────

#[tokio::main]
async fn main() {
    let cli = Cli::parse();
    let state = initialize_state(&cli).unwrap_or_else(|e| fail(e.to_tool_message()));

    match &cli.command {
        Commands::Serve => {
            if let Err(e) = mcp::run(state).await {
                fail(e);
            }
        }
        #[cfg(feature = "http-api")]
        Commands::ServeHttp { port } => {
            if let Err(e) = rmmz_tools::api::serve(state, *port).await {
                fail(e);
            }
        }
        Commands::Tools => print_tools(),
        Commands::Settings { save } => {
            if *save {
                settings::save_settings(&state.config_dir, &state.settings)
                    .unwrap_or_else(|e| fail(e.to_tool_message()));
                eprintln!("Saved {}", paths::settings_path(&state.config_dir).display());
            }
            println!(
                "{}",
                serde_json::to_string_pretty(&state.settings).unwrap_or_default()
            );
        }
        Commands::Call { tool, args } => {
            let input: Value = match args.as_deref() {
                Some(text) => serde_json::from_str(text)
                    .unwrap_or_else(|e| fail(format!("arguments are not valid JSON: {e}"))),
                None => serde_json::json!({}),
            };
            match registry::execute::execute_tool_call(&state, tool, &input) {
                Ok(output) => print_output(&output, cli.json),
                Err(e) => fail(e.to_tool_message()),
            }
        }
        other => {
            let Some(cmd) = build_command(other) else {
                fail("unsupported command");
            };
            match registry::execute::execute(&state, cmd) {
                Ok(output) => print_output(&output, cli.json),
                Err(e) => fail(e.to_tool_message()),
            }
        }
    }
}
