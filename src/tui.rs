use std::io::{self, Stderr};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{
        DisableMouseCapture, EnableMouseCapture, Event, EventStream, KeyEvent, KeyEventKind,
        MouseEvent,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use futures_util::StreamExt;
use ratatui::{backend::CrosstermBackend, Terminal};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;

pub type Tui = Terminal<CrosstermBackend<Stderr>>;

/// Drives the typing indicator and directory polling.
pub const TICK_RATE: Duration = Duration::from_millis(300);

#[derive(Debug)]
pub enum AppEvent {
    Key(KeyEvent),
    Mouse(MouseEvent),
    Resize(u16, u16),
    Tick,
}

/// Terminal input and ticks merged onto one channel by a single pump task.
pub struct EventHandler {
    rx: mpsc::UnboundedReceiver<AppEvent>,
    pump: JoinHandle<()>,
}

impl EventHandler {
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let pump = tokio::spawn(pump(tx, tick_rate));
        Self { rx, pump }
    }

    pub async fn next(&mut self) -> Option<AppEvent> {
        self.rx.recv().await
    }
}

impl Drop for EventHandler {
    fn drop(&mut self) {
        self.pump.abort();
    }
}

async fn pump(tx: mpsc::UnboundedSender<AppEvent>, tick_rate: Duration) {
    let mut reader = EventStream::new();
    let mut ticks = tokio::time::interval(tick_rate);
    ticks.set_missed_tick_behavior(MissedTickBehavior::Skip);

    loop {
        let event = tokio::select! {
            _ = ticks.tick() => AppEvent::Tick,
            next = reader.next() => match next {
                Some(Ok(event)) => match translate(event) {
                    Some(event) => event,
                    None => continue,
                },
                Some(Err(err)) => {
                    tracing::warn!("terminal event error: {}", err);
                    continue;
                }
                None => break,
            },
        };

        if tx.send(event).is_err() {
            break;
        }
    }
}

/// Key releases and focus/paste events are of no use to the app.
fn translate(event: Event) -> Option<AppEvent> {
    match event {
        Event::Key(key) if key.kind == KeyEventKind::Press => Some(AppEvent::Key(key)),
        Event::Mouse(mouse) => Some(AppEvent::Mouse(mouse)),
        Event::Resize(w, h) => Some(AppEvent::Resize(w, h)),
        _ => None,
    }
}

pub fn init() -> Result<Tui> {
    enable_raw_mode()?;
    execute!(io::stderr(), EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(io::stderr()))?)
}

pub fn restore() -> Result<()> {
    execute!(io::stderr(), DisableMouseCapture, LeaveAlternateScreen)?;
    disable_raw_mode()?;
    Ok(())
}

/// Puts the terminal back before the default hook prints the panic.
pub fn install_panic_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = restore();
        previous(info);
    }));
}
