use anyhow::Result;
use brainstorm_core::SeedData;
use clap::Parser;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

mod app;
mod config;
mod handler;
mod tui;
mod ui;

use app::App;
use config::Config;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "brainstorm")]
#[command(about = "Brainstorm with humans and AI agents from the terminal")]
#[command(version)]
struct Cli {
    /// Discussion service base URL
    #[arg(long)]
    api_url: Option<String>,
    /// Agent directory URL
    #[arg(long)]
    agents_url: Option<String>,
    /// Discussion to bind to the starting room
    #[arg(short, long)]
    discussion: Option<String>,
    /// Room to open on startup
    #[arg(short, long)]
    room: Option<String>,
    /// User id sent with each message
    #[arg(short, long)]
    user: Option<String>,
    /// Never ask the agents to speak up on their own
    #[arg(long)]
    no_auto_fetch: bool,
}

impl Cli {
    fn apply(&self, config: &mut Config, start_room: &str) {
        if let Some(url) = &self.api_url {
            config.api_base_url = url.clone();
        }
        if let Some(url) = &self.agents_url {
            config.agents_url = url.clone();
        }
        if let Some(user) = &self.user {
            config.user_id = user.clone();
        }
        if let Some(discussion) = &self.discussion {
            config
                .room_discussions
                .insert(start_room.to_string(), discussion.clone());
        }
        if self.no_auto_fetch {
            config.auto_fetch = false;
        }
    }
}

/// Logs go to a file next to the app data; the terminal belongs to the UI.
fn init_logging() -> Option<WorkerGuard> {
    let log_dir = dirs::data_dir()?.join("brainstorm");
    std::fs::create_dir_all(&log_dir).ok()?;

    let appender = tracing_appender::rolling::never(log_dir, "brainstorm.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(writer)
        .with_ansi(false)
        .compact()
        .init();

    Some(guard)
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let _log_guard = init_logging();

    let seed = SeedData::builtin();
    let start_room = cli
        .room
        .clone()
        .or_else(|| seed.rooms.first().map(|room| room.id.clone()))
        .unwrap_or_default();

    let mut config = Config::load().unwrap_or_else(|err| {
        tracing::warn!("could not read config, using defaults: {:#}", err);
        Config::new()
    });
    cli.apply(&mut config, &start_room);
    tracing::info!(api = %config.api_base_url, room = %start_room, "starting brainstorm");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new(tui::TICK_RATE);
    let mut app = App::new(config, seed, Some(&start_room));

    let result = run(&mut terminal, &mut events, &mut app).await;

    tui::restore()?;
    if let Err(err) = &result {
        tracing::error!("exited with error: {:#}", err);
    }
    result
}

async fn run(terminal: &mut tui::Tui, events: &mut EventHandler, app: &mut App) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        tokio::select! {
            Some(event) = events.next() => handler::handle_event(app, event).await?,
            Some(sync_event) = app.sync.next_event() => app.sync.apply(sync_event),
            else => break,
        }
    }
    Ok(())
}
