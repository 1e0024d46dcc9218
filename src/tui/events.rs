//! TUI event handling.
//!
//! Terminal input and ticks come from a polling thread; background work
//! such as the release check reports back through a cloned sender.

use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crossterm::event::{self, Event as CrosstermEvent, KeyEvent, KeyEventKind};

use crate::update::UpdateStatus;

/// Application events.
#[derive(Debug)]
pub enum Event {
    /// Terminal tick.
    Tick,
    /// Key press event.
    Key(KeyEvent),
    /// Terminal resize.
    Resize(u16, u16),
    /// Release check finished.
    Update(Result<UpdateStatus, String>),
}

/// Event handler using channels.
pub struct EventHandler {
    /// Event receiver.
    rx: mpsc::Receiver<Event>,
    /// Sender handed to background workers.
    tx: mpsc::Sender<Event>,
}

impl EventHandler {
    /// Create a new event handler.
    pub fn new(tick_rate: Duration) -> Self {
        let (tx, rx) = mpsc::channel();
        let event_tx = tx.clone();

        thread::spawn(move || loop {
            if event::poll(tick_rate).unwrap_or(false) {
                let event = match event::read() {
                    // Release events would double every keystroke on Windows.
                    Ok(CrosstermEvent::Key(key)) if key.kind == KeyEventKind::Press => {
                        Some(Event::Key(key))
                    }
                    Ok(CrosstermEvent::Resize(w, h)) => Some(Event::Resize(w, h)),
                    _ => None,
                };
                if let Some(event) = event {
                    if event_tx.send(event).is_err() {
                        break;
                    }
                }
            }

            if event_tx.send(Event::Tick).is_err() {
                break;
            }
        });

        Self { rx, tx }
    }

    /// Get the next event.
    pub fn next(&self) -> Result<Event, mpsc::RecvError> {
        self.rx.recv()
    }

    /// A sender for background workers.
    pub fn sender(&self) -> mpsc::Sender<Event> {
        self.tx.clone()
    }
}

/// Key binding configuration.
#[derive(Debug, Clone)]
pub struct KeyBindings {
    /// Quit keys.
    pub quit: Vec<KeyEvent>,
    /// Navigation up.
    pub up: Vec<KeyEvent>,
    /// Navigation down.
    pub down: Vec<KeyEvent>,
    /// Select/confirm.
    pub select: Vec<KeyEvent>,
    /// Back/cancel.
    pub back: Vec<KeyEvent>,
    /// Switch between the Home and Archived tabs.
    pub switch_tab: Vec<KeyEvent>,
}

impl Default for KeyBindings {
    fn default() -> Self {
        use crossterm::event::{KeyCode, KeyModifiers};

        Self {
            quit: vec![
                KeyEvent::new(KeyCode::Char('q'), KeyModifiers::NONE),
                KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
            ],
            up: vec![
                KeyEvent::new(KeyCode::Up, KeyModifiers::NONE),
                KeyEvent::new(KeyCode::Char('k'), KeyModifiers::NONE),
            ],
            down: vec![
                KeyEvent::new(KeyCode::Down, KeyModifiers::NONE),
                KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE),
            ],
            select: vec![KeyEvent::new(KeyCode::Enter, KeyModifiers::NONE)],
            back: vec![KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)],
            switch_tab: vec![
                KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE),
                KeyEvent::new(KeyCode::BackTab, KeyModifiers::SHIFT),
            ],
        }
    }
}

fn matches(bindings: &[KeyEvent], key: &KeyEvent) -> bool {
    bindings
        .iter()
        .any(|k| k.code == key.code && k.modifiers == key.modifiers)
}

impl KeyBindings {
    /// Check if a key matches quit binding.
    pub fn is_quit(&self, key: &KeyEvent) -> bool {
        matches(&self.quit, key)
    }

    /// Check if a key matches up binding.
    pub fn is_up(&self, key: &KeyEvent) -> bool {
        matches(&self.up, key)
    }

    /// Check if a key matches down binding.
    pub fn is_down(&self, key: &KeyEvent) -> bool {
        matches(&self.down, key)
    }

    /// Check if a key matches select binding.
    pub fn is_select(&self, key: &KeyEvent) -> bool {
        matches(&self.select, key)
    }

    /// Check if a key matches back binding.
    pub fn is_back(&self, key: &KeyEvent) -> bool {
        matches(&self.back, key)
    }

    /// Check if a key matches the tab switch binding.
    pub fn is_switch_tab(&self, key: &KeyEvent) -> bool {
        matches(&self.switch_tab, key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossterm::event::{KeyCode, KeyModifiers};

    #[test]
    fn test_default_bindings() {
        let bindings = KeyBindings::default();
        let ctrl_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL);
        let plain_c = KeyEvent::new(KeyCode::Char('c'), KeyModifiers::NONE);

        assert!(bindings.is_quit(&ctrl_c));
        assert!(!bindings.is_quit(&plain_c));
        assert!(bindings.is_down(&KeyEvent::new(KeyCode::Char('j'), KeyModifiers::NONE)));
        assert!(bindings.is_switch_tab(&KeyEvent::new(KeyCode::Tab, KeyModifiers::NONE)));
        assert!(bindings.is_back(&KeyEvent::new(KeyCode::Esc, KeyModifiers::NONE)));
    }
}
