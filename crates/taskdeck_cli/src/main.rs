//! Command-line driver for the task list controller.
//!
//! # Responsibility
//! - Exercise the controller against the SQLite reference store.
//! - Keep output line-oriented so it can be diffed in smoke checks.

use chrono::Utc;
use std::path::PathBuf;
use std::process::ExitCode;
use taskdeck_core::db::open_db;
use taskdeck_core::{
    core_version, default_log_level, init_logging, recency_label, ListConfig, Notifier,
    SqliteTaskStore, TaskDelta, TaskDialog, TaskDraft, TaskId, TaskListController, TaskRecord,
};

const DB_FILE_NAME: &str = "taskdeck.sqlite3";
const COMMANDS: &[&str] = &[
    "list", "filter", "add", "start", "complete", "toggle", "delete",
];
const USAGE: &str = "usage: taskdeck_cli [version | list [page] | filter <text> | add <title> [priority] \
| start <id> | complete <id> | toggle <id> | delete <id>]";

/// Dialog whose answers come from the command line. Confirms everything.
struct ArgsDialog {
    draft: Option<TaskDraft>,
}

impl TaskDialog for ArgsDialog {
    fn open_create(&self) -> Option<TaskDraft> {
        self.draft.clone()
    }

    fn open_edit(&self, _record: &TaskRecord) -> Option<TaskDelta> {
        None
    }

    fn confirm_destructive(&self, _title: &str, _message: &str) -> bool {
        true
    }
}

struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn notify(&self, message: &str, _duration_ms: u64) {
        println!("{message}");
    }
}

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().skip(1).collect();
    init_logging_from_env();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(message) => {
            eprintln!("{message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &[String]) -> Result<(), String> {
    let command = args.first().map(String::as_str).unwrap_or("version");
    if command == "version" {
        println!("taskdeck_core version={}", core_version());
        return Ok(());
    }
    if !COMMANDS.contains(&command) {
        return Err(USAGE.to_string());
    }

    let config = load_config()?;
    let conn = open_db(resolve_db_path()).map_err(|err| format!("database open failed: {err}"))?;
    let store = SqliteTaskStore::new(&conn);
    let dialog = ArgsDialog {
        draft: parse_draft(command, &args[1..])?,
    };
    let mut controller = TaskListController::new(config, store, dialog, StdoutNotifier);

    let page = match command {
        "list" => parse_number::<u32>(args.get(1), "page")?.unwrap_or(0),
        _ => 0,
    };
    // Errors are already reported through the notifier.
    let _ = controller.load_page(page);

    let outcome = match command {
        "list" => Ok(()),
        "filter" => {
            controller.set_filter(&args[1..].join(" "));
            Ok(())
        }
        "add" => controller.create(),
        "start" => controller.start(required_id(args)?),
        "complete" => controller.complete(required_id(args)?),
        "toggle" => controller.toggle_done(required_id(args)?),
        "delete" => controller.delete(required_id(args)?),
        _ => return Err(USAGE.to_string()),
    };

    print_page(&controller);
    outcome.map_err(|err| err.to_string())
}

fn print_page<S, D, N>(controller: &TaskListController<S, D, N>)
where
    S: taskdeck_core::TaskStore,
    D: TaskDialog,
    N: Notifier,
{
    let state = controller.state();
    let now = Utc::now();
    for record in controller.view() {
        let id = record
            .id
            .map_or_else(|| "pending".to_string(), |id| format!("#{id}"));
        let age = record
            .created_at
            .map(|at| recency_label(at, now))
            .unwrap_or_default();
        println!(
            "{id} [{}] P{} {} ({age})",
            record.status, record.priority, record.title
        );
    }
    println!(
        "page {}/{} total~{}{}",
        state.page_index() + 1,
        state.page_count().max(1),
        state.total_estimate(),
        if state.filter_text().is_empty() {
            String::new()
        } else {
            format!(" filter=\"{}\"", state.filter_text())
        }
    );
}

fn parse_draft(command: &str, rest: &[String]) -> Result<Option<TaskDraft>, String> {
    if command != "add" {
        return Ok(None);
    }
    let Some(title) = rest.first() else {
        return Err(USAGE.to_string());
    };
    let mut draft = TaskDraft::new(title.clone());
    if let Some(priority) = parse_number::<i32>(rest.get(1), "priority")? {
        draft = draft.with_priority(priority);
    }
    Ok(Some(draft))
}

fn required_id(args: &[String]) -> Result<TaskId, String> {
    parse_number::<TaskId>(args.get(1), "id")?.ok_or_else(|| USAGE.to_string())
}

fn parse_number<T: std::str::FromStr>(
    raw: Option<&String>,
    name: &str,
) -> Result<Option<T>, String> {
    raw.map(|value| {
        value
            .trim()
            .parse::<T>()
            .map_err(|_| format!("invalid {name} `{value}`"))
    })
    .transpose()
}

fn load_config() -> Result<ListConfig, String> {
    match non_empty_env("TASKDECK_CONFIG") {
        Some(path) => ListConfig::from_file(path).map_err(|err| err.to_string()),
        None => Ok(ListConfig::default()),
    }
}

fn resolve_db_path() -> PathBuf {
    non_empty_env("TASKDECK_DB_PATH")
        .map(PathBuf::from)
        .unwrap_or_else(|| std::env::temp_dir().join(DB_FILE_NAME))
}

fn init_logging_from_env() {
    let Some(log_dir) = non_empty_env("TASKDECK_LOG_DIR") else {
        return;
    };
    let level = non_empty_env("TASKDECK_LOG_LEVEL")
        .unwrap_or_else(|| default_log_level().to_string());
    if let Err(err) = init_logging(&level, &log_dir) {
        eprintln!("logging disabled: {err}");
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
