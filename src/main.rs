mod controller;
mod logging;
mod model;
mod player;
mod view;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use crossterm::{
    event::{self, DisableFocusChange, EnableFocusChange},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::Mutex;

use controller::AppController;
use model::{AppModel, FEED_FILE};
use player::{EngineConfig, HttpUpstream, LifecycleEvent, MediaCache, ReelPlayer};
use view::AppView;

/// Parent of the media cache directory
const CACHE_BASE_DIR: &str = ".cache";
/// UI tick: one scroll animation step and one input poll per tick
const TICK: Duration = Duration::from_millis(50);

#[tokio::main]
async fn main() -> Result<()> {
    if let Err(e) = logging::init_logging() {
        eprintln!("Warning: Failed to initialize logging: {}", e);
    }

    tracing::info!("=== reels-rs starting ===");

    let feed = model::load_feed(Path::new(FEED_FILE))?;

    let cache = MediaCache::shared(Path::new(CACHE_BASE_DIR)).context("Failed to open media cache")?;
    let upstream = Arc::new(HttpUpstream::new().context("Failed to build HTTP client")?);
    let player = ReelPlayer::initialize(EngineConfig::default(), cache, upstream)
        .context("Failed to initialize player")?;

    let model = Arc::new(Mutex::new(AppModel::new(feed)));
    let controller = AppController::new(model.clone(), Arc::new(Mutex::new(player)));

    // Playlist construction happens off the UI loop
    let controller_for_init = controller.clone();
    tokio::spawn(async move {
        controller_for_init.initialize_playback().await;
    });

    tracing::info!("Starting TUI...");

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableFocusChange)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let res = run_app(&mut terminal, model, controller.clone()).await;

    // Second destroy is a no-op; covers the error path out of run_app
    controller.handle_lifecycle(LifecycleEvent::Destroy).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), DisableFocusChange, LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    if let Err(err) = res {
        tracing::error!(error = ?err, "Application error");
    }

    tracing::info!("reels-rs shutting down");
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    model: Arc<Mutex<AppModel>>,
    controller: AppController,
) -> Result<()> {
    loop {
        controller.tick().await;

        let (view_state, should_quit) = {
            let mut model_guard = model.lock().await;
            model_guard.auto_clear_status();
            (model_guard.view_state(), model_guard.should_quit())
        };

        if should_quit {
            controller.handle_lifecycle(LifecycleEvent::Stop).await;
            controller.handle_lifecycle(LifecycleEvent::Destroy).await;
            break;
        }

        terminal.draw(|f| {
            AppView::render(f, &view_state);
        })?;

        if event::poll(TICK)? {
            let event = event::read()?;
            if let Err(e) = controller.handle_event(event).await {
                tracing::warn!(error = %e, "Event handling failed");
            }
        }
    }

    Ok(())
}
