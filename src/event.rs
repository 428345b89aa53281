use std::time::Duration;

use anyhow::Result;
use crossterm::event::{self, Event, KeyEventKind};
use tokio::sync::mpsc::UnboundedReceiver;

use crate::app::{App, AppEvent};
use crate::session::SessionEvent;

/// Polls for crossterm events and maps key presses to `AppEvent`s.
pub fn poll(timeout: Duration) -> Result<Option<AppEvent>> {
    if event::poll(timeout)? {
        if let Event::Key(key) = event::read()? {
            if key.kind != KeyEventKind::Press {
                return Ok(None);
            }
            return Ok(Some(AppEvent::KeyPress(key.code)));
        }
    }
    Ok(None)
}

/// Runs the main event loop. Key presses queue actions, which are awaited before the next
/// frame; events from the timer loops are drained once per frame.
pub async fn run(
    app: &mut App,
    terminal: &mut crate::tui::Terminal,
    session_events: &mut UnboundedReceiver<SessionEvent>,
) -> Result<()> {
    let tick_rate = Duration::from_millis(250);

    while app.running {
        app.sync();
        terminal.draw(|frame| crate::ui::draw(frame, app))?;

        if let Some(event) = poll(tick_rate)? {
            app.update(event);
        }
        while let Ok(event) = session_events.try_recv() {
            app.update(AppEvent::Session(event));
        }
        app.run_pending().await;
    }
    Ok(())
}
