pub mod format;
pub mod listing;
pub mod prompts;
pub mod viewport;

use std::io::{self, Stdout};
use std::time::{Duration, Instant};

use anyhow::Result;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use crossterm::execute;
use crossterm::terminal::{
    EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode,
};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Style};
use ratatui::widgets::{Block, Borders, Clear, List, ListItem};
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use crate::app::{App, DownloadStatus, DownloadTarget, View};
use crate::aws::{DownloadOutcome, Storage};
use crate::config::Config;
use listing::{ListPanel, bucket_list, directory_list, string_list};
use viewport::TermSize;

const POLL_INTERVAL: Duration = Duration::from_millis(200);
const PAGE: isize = 5;
const SHUTDOWN_GRACE: Duration = Duration::from_secs(3);

pub type Tui = Terminal<CrosstermBackend<Stdout>>;
type DownloadSender = UnboundedSender<Result<DownloadOutcome, String>>;
type DownloadReceiver = UnboundedReceiver<Result<DownloadOutcome, String>>;

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    with_rollback(enter_screen, || {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
    })
}

fn enter_screen() -> Result<Tui> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let mut terminal = Terminal::new(CrosstermBackend::new(stdout))?;
    terminal.hide_cursor()?;
    Ok(terminal)
}

/// Runs `setup`, undoing what came before it if it fails.
fn with_rollback<T>(setup: impl FnOnce() -> Result<T>, rollback: impl FnOnce()) -> Result<T> {
    setup().inspect_err(|_| rollback())
}

pub fn restore(terminal: &mut Tui) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    Ok(())
}

pub async fn run<S>(terminal: &mut Tui, app: &mut App, storage: &S, config: &Config) -> Result<()>
where
    S: Storage + Clone + Send + Sync + 'static,
{
    let (tx, mut rx) = unbounded_channel();
    loop {
        app.expire_flash(Instant::now());
        while let Ok(result) = rx.try_recv() {
            app.finish_download(result);
        }
        terminal.draw(|frame| draw(frame, app))?;

        let timeout = app
            .flash
            .as_ref()
            .map(|f| f.remaining(Instant::now()).min(POLL_INTERVAL))
            .unwrap_or(POLL_INTERVAL);
        if event::poll(timeout)? {
            match event::read()? {
                Event::Key(key) => {
                    if handle_key_event(key, app, storage, config, &tx).await {
                        break;
                    }
                }
                Event::Resize(_, _) => continue,
                _ => continue,
            }
        }
    }
    stop_download(app, &mut rx, SHUTDOWN_GRACE).await;
    Ok(())
}

/// Cancels a running download and waits, at most `grace`, for its task to
/// clean up and report back.
async fn stop_download(app: &mut App, rx: &mut DownloadReceiver, grace: Duration) {
    if !app.cancel_download() {
        return;
    }
    match tokio::time::timeout(grace, rx.recv()).await {
        Ok(Some(result)) => app.finish_download(result),
        Ok(None) => {}
        Err(_) => warn!(?grace, "download did not stop in time, a partial file may remain"),
    }
}

async fn handle_key_event<S>(
    key: KeyEvent,
    app: &mut App,
    storage: &S,
    config: &Config,
    tx: &DownloadSender,
) -> bool
where
    S: Storage + Clone + Send + Sync + 'static,
{
    if key.kind != KeyEventKind::Press {
        return false;
    }

    if matches!(key.code, KeyCode::Char('c')) && key.modifiers.contains(KeyModifiers::CONTROL) {
        return true;
    }

    if app.dismiss_flash() {
        return false;
    }

    if key.code == KeyCode::Char('q') {
        return true;
    }

    if app.showing_log {
        if matches!(
            key.code,
            KeyCode::Esc | KeyCode::Enter | KeyCode::Char('l') | KeyCode::Char('L')
        ) {
            app.showing_log = false;
        }
        return false;
    }

    app.acknowledge_download();

    match key.code {
        KeyCode::Up | KeyCode::Char('k') => app.move_selection(-1),
        KeyCode::Down | KeyCode::Char('j') => app.move_selection(1),
        KeyCode::PageUp => app.move_selection(-PAGE),
        KeyCode::PageDown => app.move_selection(PAGE),
        KeyCode::Home => app.jump_selection(true),
        KeyCode::End => app.jump_selection(false),
        KeyCode::Enter => {
            if let Some(target) = app.open_selected(storage).await {
                start_download(app, storage, config, target, tx);
            }
        }
        KeyCode::Char('b') | KeyCode::Backspace => app.go_back(storage).await,
        KeyCode::Char('r') => app.refresh(storage).await,
        KeyCode::Char('l') | KeyCode::Char('L') => app.showing_log = true,
        KeyCode::Esc => {
            if app.cancel_download() {
                app.push_status("Cancelling download…");
            }
        }
        _ => {}
    }
    false
}

fn start_download<S>(
    app: &mut App,
    storage: &S,
    config: &Config,
    target: DownloadTarget,
    tx: &DownloadSender,
) where
    S: Storage + Clone + Send + Sync + 'static,
{
    if app.download_running() {
        app.show_error("A download is already in progress");
        return;
    }
    let dest = config.download_path(&target.file_name);
    let cancel = CancellationToken::new();
    info!(bucket = %target.bucket, key = %target.key, dest = %dest.display(), "starting download");
    app.start_download(dest.clone(), cancel.clone());

    let storage = storage.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = storage
            .download(&target.bucket, &target.key, &dest, cancel)
            .await
            .map_err(|err| format!("{err:#}"));
        // the loop may already be gone on quit
        let _ = tx.send(result);
    });
}

fn draw(frame: &mut ratatui::Frame, app: &App) {
    let size = TermSize::from(frame.size());
    let panel = match &app.view {
        View::Buckets => bucket_list(&app.buckets, app.selection, size),
        View::Directory { .. } => directory_list(&app.title(), &app.nodes, app.selection, size),
    };
    draw_list(frame, &panel);
    prompts::render(frame, &prompts::help(size));

    match &app.download {
        DownloadStatus::Running { dest, .. } => {
            prompts::render(frame, &prompts::download_started(dest, size));
        }
        DownloadStatus::Finished { dest } => {
            prompts::render(frame, &prompts::download_finished(dest, size));
        }
        DownloadStatus::Cancelled => {
            prompts::render(frame, &prompts::message("Download", "Download cancelled", size));
        }
        DownloadStatus::Idle => {}
    }
    if let Some(err) = &panel.error {
        prompts::render(frame, &prompts::error(&err.to_string(), size));
    }

    if app.showing_log {
        draw_log(frame, app, size);
    }
    if let Some(flash) = &app.flash {
        prompts::render(frame, &prompts::error(&flash.message, size));
    }
}

fn draw_list(frame: &mut ratatui::Frame, panel: &ListPanel) {
    let area = Rect::new(0, 0, panel.width, panel.height).intersection(frame.size());
    if area.width == 0 || area.height == 0 {
        return;
    }
    let items: Vec<ListItem> = panel
        .lines
        .iter()
        .map(|line| {
            let style = if line.selected {
                Style::default().fg(Color::Yellow).bg(Color::Blue)
            } else {
                Style::default().fg(Color::Yellow)
            };
            ListItem::new(line.label()).style(style)
        })
        .collect();
    let block = Block::default()
        .title(panel.title.as_str())
        .borders(Borders::ALL);
    frame.render_widget(Clear, area);
    frame.render_widget(List::new(items).block(block), area);
}

fn draw_log(frame: &mut ratatui::Frame, app: &App, size: TermSize) {
    let mut entries: Vec<String> = app.status.iter().cloned().collect();
    if entries.is_empty() {
        entries.push("No status messages yet.".into());
    }
    let newest = entries.len() - 1;
    let panel = string_list("Status log", &entries, newest, size);
    draw_list(frame, &panel);
}
