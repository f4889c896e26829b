//! Terminal User Interface Implementation
//!
//! This module provides the dashboard loop using ratatui with crossterm backend.
//! It handles terminal setup, key events, syncing with the refresh scheduler and
//! reacting to forced navigation back to the login route.

use super::widgets::{render_dashboard, AppTheme};
use super::DashboardState;
use crate::live::{AnalyticsFeed, AnalyticsState, LastUpdatedAt};
use crate::models::User;
use crate::router::Route;
use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use std::io::{self, Stdout};
use std::time::Duration;
use tokio::sync::watch;
use tracing::{debug, info};

/// Redraw period, also bounds how stale the relative timestamps get
const FRAME_INTERVAL_MS: u64 = 250;
/// How long to wait for a key before redrawing
const EVENT_POLL_MS: u64 = 50;

type TerminalBackend = CrosstermBackend<Stdout>;

/// Why the dashboard loop ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DashboardOutcome {
    /// User asked to quit
    Quit,
    /// The session was cleared (401) and the router moved to the login route
    SessionEnded,
}

/// What a key press asks the dashboard to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyAction {
    Quit,
    Refresh,
    NextTab,
    PreviousTab,
    ScrollUp,
    ScrollDown,
    None,
}

impl KeyAction {
    pub fn from_key(key: KeyEvent) -> Self {
        if key.kind != KeyEventKind::Press {
            return KeyAction::None;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => KeyAction::Quit,
            KeyCode::Char('q') | KeyCode::Esc => KeyAction::Quit,
            KeyCode::Char('r') => KeyAction::Refresh,
            KeyCode::Tab | KeyCode::Right => KeyAction::NextTab,
            KeyCode::BackTab | KeyCode::Left => KeyAction::PreviousTab,
            KeyCode::Up => KeyAction::ScrollUp,
            KeyCode::Down => KeyAction::ScrollDown,
            _ => KeyAction::None,
        }
    }
}

/// Main display manager for the live dashboard
pub struct DashboardManager {
    terminal: Terminal<TerminalBackend>,
    state: DashboardState,
    feed: AnalyticsFeed,
    analytics_rx: watch::Receiver<AnalyticsState>,
    last_updated_rx: watch::Receiver<LastUpdatedAt>,
    route_rx: watch::Receiver<Route>,
    theme: AppTheme,
    /// Product rows that fit on screen at the last draw
    visible_rows: usize,
    restored: bool,
}

impl DashboardManager {
    /// Take over the terminal and attach to a running feed
    pub fn new(feed: AnalyticsFeed, route_rx: watch::Receiver<Route>, user: Option<User>) -> Result<Self> {
        let terminal = setup_terminal()?;
        let analytics_rx = feed.subscribe();
        let last_updated_rx = feed.subscribe_last_updated();

        Ok(Self {
            terminal,
            state: DashboardState::new(user),
            feed,
            analytics_rx,
            last_updated_rx,
            route_rx,
            theme: AppTheme::default(),
            visible_rows: 0,
            restored: false,
        })
    }

    /// Run until the user quits or the session ends
    pub async fn run(&mut self) -> Result<DashboardOutcome> {
        let mut frame_tick = tokio::time::interval(Duration::from_millis(FRAME_INTERVAL_MS));

        let outcome = loop {
            if *self.route_rx.borrow() == Route::Login {
                info!("Session ended, leaving dashboard");
                break DashboardOutcome::SessionEnded;
            }

            if self.handle_events()? == Some(DashboardOutcome::Quit) {
                break DashboardOutcome::Quit;
            }

            self.sync_state();
            self.render()?;
            frame_tick.tick().await;
        };

        self.restore()?;
        Ok(outcome)
    }

    fn handle_events(&mut self) -> Result<Option<DashboardOutcome>> {
        if !event::poll(Duration::from_millis(EVENT_POLL_MS)).context("Failed to poll terminal events")? {
            return Ok(None);
        }
        if let Event::Key(key) = event::read().context("Failed to read terminal event")? {
            match KeyAction::from_key(key) {
                KeyAction::Quit => return Ok(Some(DashboardOutcome::Quit)),
                KeyAction::Refresh => {
                    debug!("Manual refresh requested");
                    self.feed.refetch();
                }
                KeyAction::NextTab => self.state.next_tab(),
                KeyAction::PreviousTab => self.state.previous_tab(),
                KeyAction::ScrollUp => self.state.scroll_up(),
                KeyAction::ScrollDown => self.state.scroll_down(self.visible_rows),
                KeyAction::None => {}
            }
        }
        Ok(None)
    }

    /// Pull the latest values published by the scheduler
    fn sync_state(&mut self) {
        if self.analytics_rx.has_changed().unwrap_or(false) {
            let state = self.analytics_rx.borrow_and_update().clone();
            self.state.update_analytics(state);
        }
        if self.last_updated_rx.has_changed().unwrap_or(false) {
            let stamp = *self.last_updated_rx.borrow_and_update();
            self.state.update_last_updated(stamp);
        }
    }

    fn render(&mut self) -> Result<()> {
        let now = Utc::now();
        let mut visible_rows = self.visible_rows;
        self.terminal
            .draw(|frame| {
                visible_rows = render_dashboard(frame, &self.state, &self.theme, now);
            })
            .context("Failed to draw dashboard")?;
        self.visible_rows = visible_rows;
        Ok(())
    }

    fn restore(&mut self) -> Result<()> {
        if self.restored {
            return Ok(());
        }
        self.restored = true;
        cleanup_terminal(&mut self.terminal)
    }
}

impl Drop for DashboardManager {
    fn drop(&mut self) {
        let _ = self.restore();
    }
}

/// Setup the terminal for TUI mode
fn setup_terminal() -> Result<Terminal<TerminalBackend>> {
    enable_raw_mode().context("Failed to enable raw mode")?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen).context("Failed to setup terminal")?;
    let backend = CrosstermBackend::new(stdout);
    let terminal = Terminal::new(backend).context("Failed to create terminal")?;
    Ok(terminal)
}

/// Cleanup terminal and restore normal mode
fn cleanup_terminal(terminal: &mut Terminal<TerminalBackend>) -> Result<()> {
    disable_raw_mode().context("Failed to disable raw mode")?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen).context("Failed to cleanup terminal")?;
    terminal.show_cursor().context("Failed to show cursor")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn press(code: KeyCode, modifiers: KeyModifiers) -> KeyEvent {
        KeyEvent::new(code, modifiers)
    }

    #[test]
    fn test_key_bindings() {
        assert_eq!(KeyAction::from_key(press(KeyCode::Char('q'), KeyModifiers::NONE)), KeyAction::Quit);
        assert_eq!(KeyAction::from_key(press(KeyCode::Char('c'), KeyModifiers::CONTROL)), KeyAction::Quit);
        assert_eq!(KeyAction::from_key(press(KeyCode::Char('c'), KeyModifiers::NONE)), KeyAction::None);
        assert_eq!(KeyAction::from_key(press(KeyCode::Char('r'), KeyModifiers::NONE)), KeyAction::Refresh);
        assert_eq!(KeyAction::from_key(press(KeyCode::Tab, KeyModifiers::NONE)), KeyAction::NextTab);
        assert_eq!(KeyAction::from_key(press(KeyCode::Left, KeyModifiers::NONE)), KeyAction::PreviousTab);
        assert_eq!(KeyAction::from_key(press(KeyCode::Down, KeyModifiers::NONE)), KeyAction::ScrollDown);
    }

    #[test]
    fn test_key_release_is_ignored() {
        let mut key = press(KeyCode::Char('q'), KeyModifiers::NONE);
        key.kind = KeyEventKind::Release;
        assert_eq!(KeyAction::from_key(key), KeyAction::None);
    }
}
