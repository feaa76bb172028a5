use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::fs::File;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{mpsc, watch};
use tracing::info;
use tracing_subscriber::{
    filter::LevelFilter, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer,
};
use unicode_width::UnicodeWidthStr;

use gathering_counter::actionlog::{Counter, Snapshot, WatchList};
use gathering_counter::app::{poll_event, spawn_poller, Action, AppEvent, AppState, Config, ViewMode};
use gathering_counter::items::{remove_item, upsert_item, SaveOutcome, WatchedItem};
use gathering_counter::ui;
use gathering_counter::ui::InputDialogKind;

/// Gathering Counter - TUI that counts today's gathering pickups from PSO2 NGS action logs
#[derive(Parser)]
#[command(name = "gathering-counter")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Log level (trace, debug, info, warn, error); defaults to the config value
    #[arg(short, long)]
    log_level: Option<String>,

    /// ActionLog directory
    #[arg(long, env = "GATHERING_COUNTER_LOG_DIR")]
    log_dir: Option<PathBuf>,

    /// Hour (0-23) at which the gathering day starts
    #[arg(long, value_parser = clap::value_parser!(u32).range(0..=23))]
    cutover_hour: Option<u32>,

    /// Watch-list file
    #[arg(long)]
    items_file: Option<PathBuf>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Start the TUI (default)
    Tui,
    /// Count once at the current time and print the result
    Once {
        /// Print as JSON
        #[arg(long)]
        json: bool,
    },
    /// Edit the watch list
    Items {
        #[command(subcommand)]
        action: ItemsAction,
    },
}

#[derive(Subcommand)]
enum ItemsAction {
    /// Show watched items
    List,
    /// Add an item, or change the quota of an existing one
    Add {
        /// Item name, exactly as written in the action log
        name: String,
        /// Quota
        quota: u32,
    },
    /// Remove an item
    Remove {
        /// Item name
        name: String,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load()?;
    if let Some(log_dir) = cli.log_dir {
        config.log_dir = log_dir;
    }
    if let Some(hour) = cli.cutover_hour {
        config.cutover_hour = hour;
    }
    if let Some(items_file) = cli.items_file {
        config.items_file = items_file;
    }

    // ログ初期化
    let level = cli.log_level.unwrap_or_else(|| config.log_level.clone());
    init_logging(&level, &config.error_log_file)?;

    let counter = Counter::new(config.engine_config());

    match cli.command {
        Some(Commands::Once { json }) => run_once(&config, &counter, json),
        Some(Commands::Items { action }) => handle_items(&config, &counter, action),
        Some(Commands::Tui) | None => run_tui(&config, counter),
    }
}

/// ログ初期化
///
/// すべてのログはデータディレクトリのログファイルへ、WARN 以上は
/// 作業ディレクトリの error.log にも追記する。
fn init_logging(level: &str, error_log_file: &Path) -> Result<()> {
    let log_dir = directories::ProjectDirs::from("", "", "gathering-counter")
        .map(|d| d.data_dir().to_path_buf())
        .unwrap_or_else(|| std::env::temp_dir().join("gathering-counter"));

    std::fs::create_dir_all(&log_dir)?;
    let log_file = std::fs::File::create(log_dir.join("gathering-counter.log"))?;

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(level));

    let error_file = match std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(error_log_file)
    {
        Ok(file) => Some(file),
        Err(e) => {
            eprintln!(
                "Warning: Failed to open {}: {}",
                error_log_file.display(),
                e
            );
            None
        }
    };

    build_subscriber(filter, log_file, error_file).init();

    info!("Gathering Counter starting");
    Ok(())
}

/// ログレベルの設定はメインのログファイルにだけ効く。error.log には常に WARN 以上を書く
fn build_subscriber(
    filter: EnvFilter,
    log_file: File,
    error_file: Option<File>,
) -> impl tracing::Subscriber + Send + Sync + 'static {
    let error_layer = error_file.map(|file| {
        tracing_subscriber::fmt::layer()
            .with_writer(file)
            .with_ansi(false)
            .with_filter(LevelFilter::WARN)
    });

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(log_file)
                .with_filter(filter),
        )
        .with(error_layer)
}

/// 固定アイテムとユーザ定義アイテムを合わせた監視リスト
fn watch_list(config: &Config, counter: &Counter) -> WatchList {
    counter.load_watch_list(config.builtin_watched_items())
}

fn run_once(config: &Config, counter: &Counter, json: bool) -> Result<()> {
    let mut state = AppState::new(watch_list(config, counter).items);
    let snapshot = counter.counts(&state.watched_names())?;
    state.apply_snapshot(&snapshot);

    if json {
        println!("{}", serde_json::to_string_pretty(&once_json(&state, &snapshot))?);
        return Ok(());
    }

    println!(
        "{}  (gathering day {})",
        snapshot.calendar_now.format("%Y/%m/%d %H:%M:%S"),
        snapshot.logical_day.format("%Y/%m/%d")
    );
    let name_width = state
        .items
        .iter()
        .map(|row| row.item.name.width())
        .max()
        .unwrap_or(0)
        .max(4);
    for row in &state.items {
        let padding = " ".repeat(name_width - row.item.name.width());
        println!(
            "{}{}  {:>6} / {:<6} {}",
            row.item.name,
            padding,
            row.progress.count,
            row.item.quota,
            if row.progress.completed { "done" } else { "" }
        );
    }
    if snapshot.report.unreadable_files > 0 {
        eprintln!(
            "Warning: {} log file(s) could not be read",
            snapshot.report.unreadable_files
        );
    }
    Ok(())
}

fn once_json(state: &AppState, snapshot: &Snapshot) -> serde_json::Value {
    let items: Vec<serde_json::Value> = state
        .items
        .iter()
        .map(|row| {
            serde_json::json!({
                "name": row.item.name,
                "quota": row.item.quota,
                "read_only": row.item.read_only,
                "count": row.progress.count,
                "completed": row.progress.completed,
            })
        })
        .collect();
    serde_json::json!({
        "calendar_now": snapshot.calendar_now,
        "logical_day": snapshot.logical_day,
        "files": snapshot.files,
        "report": snapshot.report,
        "items": items,
    })
}

fn handle_items(config: &Config, counter: &Counter, action: ItemsAction) -> Result<()> {
    let WatchList {
        mut items,
        user_items_loaded,
    } = watch_list(config, counter);

    if !user_items_loaded && !matches!(action, ItemsAction::List) {
        bail!(
            "{} could not be read; not changing it",
            counter.config().items_file.display()
        );
    }

    match action {
        ItemsAction::List => {
            for item in &items {
                let marker = if item.read_only { " (built-in)" } else { "" };
                println!("{},{}{}", item.name, item.quota, marker);
            }
            return Ok(());
        }
        ItemsAction::Add { name, quota } => {
            upsert_item(&mut items, WatchedItem::user(name, quota)?)?;
        }
        ItemsAction::Remove { name } => {
            if remove_item(&mut items, &name)? == 0 {
                eprintln!("No item named {}", name);
                return Ok(());
            }
        }
    }

    report_save(counter.save_user_items(&items)?, &counter.config().items_file);
    Ok(())
}

fn report_save(outcome: SaveOutcome, path: &Path) {
    match outcome {
        SaveOutcome::Written(count) => {
            info!("Saved {} items to {}", count, path.display());
            println!("Saved {} items to {}", count, path.display());
        }
        SaveOutcome::Skipped => {
            info!("No user items to save; {} left unchanged", path.display());
            println!(
                "No user items left to save; {} was left unchanged",
                path.display()
            );
        }
    }
}

fn run_tui(config: &Config, counter: Counter) -> Result<()> {
    let counter = Arc::new(counter);
    let watch_list = watch_list(config, &counter);
    let mut state = AppState::new(watch_list.items);

    // Create tokio runtime for the poller
    let runtime = tokio::runtime::Runtime::new()?;
    let _runtime_guard = runtime.enter();

    let (event_tx, event_rx) = mpsc::channel::<AppEvent>(100);
    let (names_tx, names_rx) = watch::channel(state.watched_names());
    let (refresh_tx, refresh_rx) = mpsc::channel::<()>(8);
    let poller = spawn_poller(Arc::clone(&counter), names_rx, refresh_rx, event_tx);

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = run_app(&mut terminal, &mut state, event_rx, &names_tx, &refresh_tx);

    poller.abort();

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    // 編集していれば終了時に保存（読めなかった items.csv は上書きしない）
    if state.is_dirty() && !watch_list.user_items_loaded {
        tracing::warn!("Watch list was not loaded; edits are not saved");
        eprintln!(
            "{} could not be read at startup; edits were not saved",
            counter.config().items_file.display()
        );
    } else if state.is_dirty() {
        match counter.save_user_items(&state.watched_items()) {
            Ok(outcome) => report_save(outcome, &counter.config().items_file),
            Err(e) => {
                tracing::error!("Failed to save items: {}", e);
                eprintln!("Failed to save items: {}", e);
            }
        }
    }

    info!("Gathering Counter stopped");
    result
}

fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    state: &mut AppState,
    mut event_rx: mpsc::Receiver<AppEvent>,
    names_tx: &watch::Sender<Vec<String>>,
    refresh_tx: &mpsc::Sender<()>,
) -> Result<()> {
    loop {
        // 集計結果を反映（ノンブロッキング）
        while let Ok(event) = event_rx.try_recv() {
            if let AppEvent::CountsUpdated(snapshot) = event {
                state.apply_snapshot(&snapshot);
            }
        }

        terminal.draw(|frame| {
            ui::render(frame, state);
        })?;

        if let Some(AppEvent::Key(key)) = poll_event(Duration::from_millis(100))? {
            match state.view_mode {
                ViewMode::Input => handle_input_event(state, key),
                _ => handle_action(state, Action::from(key), refresh_tx),
            }
        }

        // 監視対象が変わったらすぐに集計し直す
        let names = state.watched_names();
        let changed = names_tx.send_if_modified(|current| {
            if *current != names {
                *current = names;
                true
            } else {
                false
            }
        });
        if changed {
            let _ = refresh_tx.try_send(());
        }

        if state.should_quit {
            break;
        }
    }

    Ok(())
}

/// 入力モードでのキーイベント処理
fn handle_input_event(state: &mut AppState, key: KeyEvent) {
    if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
        state.should_quit = true;
        return;
    }

    let Some(kind) = state.input_dialog.as_ref().map(|d| d.kind.clone()) else {
        state.close_input_dialog();
        return;
    };

    match kind {
        InputDialogKind::DeleteItem { .. } => match key.code {
            KeyCode::Char('y') | KeyCode::Char('Y') | KeyCode::Enter => {
                state.confirm_delete_dialog();
            }
            KeyCode::Char('n') | KeyCode::Char('N') | KeyCode::Esc => {
                state.close_input_dialog();
            }
            _ => {}
        },
        InputDialogKind::AddItem => {
            if key.code == KeyCode::Enter {
                state.submit_add_dialog();
                return;
            }
            if key.code == KeyCode::Esc {
                state.close_input_dialog();
                return;
            }
            if let Some(dialog) = state.input_dialog.as_mut() {
                match key.code {
                    KeyCode::Char(c) => dialog.insert_char(c),
                    KeyCode::Backspace => dialog.backspace(),
                    KeyCode::Delete => dialog.delete(),
                    KeyCode::Left => dialog.move_cursor_left(),
                    KeyCode::Right => dialog.move_cursor_right(),
                    _ => {}
                }
            }
        }
    }
}

fn handle_action(state: &mut AppState, action: Action, refresh_tx: &mpsc::Sender<()>) {
    if action != Action::None {
        state.status_message = None;
    }

    match action {
        Action::Quit => {
            state.should_quit = true;
        }
        Action::MoveUp => state.move_up(),
        Action::MoveDown => state.move_down(),
        Action::ToggleHelp => state.toggle_help(),
        Action::Back => {
            state.view_mode = ViewMode::List;
        }
        Action::Refresh => {
            if refresh_tx.try_send(()).is_ok() {
                state.status_message = Some("Refreshing...".to_string());
            }
        }
        Action::AddItem => state.open_add_dialog(),
        Action::DeleteItem => state.open_delete_dialog(),
        Action::None => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn read(path: &Path) -> String {
        std::fs::read_to_string(path).unwrap()
    }

    #[test]
    fn test_error_log_gets_warnings_at_any_level() {
        let dir = tempdir().unwrap();
        let main_path = dir.path().join("main.log");
        let error_path = dir.path().join("error.log");
        let subscriber = build_subscriber(
            EnvFilter::new("error"),
            File::create(&main_path).unwrap(),
            Some(File::create(&error_path).unwrap()),
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!("Poll finished");
            tracing::warn!("Failed to read log file ActionLog20220505_00.txt: permission denied");
        });

        let error_log = read(&error_path);
        assert!(error_log.contains("permission denied"));
        assert!(!error_log.contains("Poll finished"));
        assert!(!read(&main_path).contains("permission denied"));
    }

    #[test]
    fn test_main_log_follows_level() {
        let dir = tempdir().unwrap();
        let main_path = dir.path().join("main.log");
        let subscriber = build_subscriber(
            EnvFilter::new("info"),
            File::create(&main_path).unwrap(),
            None,
        );

        tracing::subscriber::with_default(subscriber, || {
            tracing::debug!("Too detailed");
            tracing::info!("Poller started");
        });

        let main_log = read(&main_path);
        assert!(main_log.contains("Poller started"));
        assert!(!main_log.contains("Too detailed"));
    }
}
