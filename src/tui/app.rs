//! TUI application main loop.

use std::io;
use std::sync::mpsc::Sender;
use std::thread;
use std::time::{Duration, Instant};

use crossterm::{
    event::{KeyCode, KeyEvent, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, List, ListItem, Paragraph, Tabs},
    Frame, Terminal,
};
use tracing::info;

use crate::config::{Config, UpdateConfig};
use crate::error::{Result, TrackerError};
use crate::store::KeyValueStore;
use crate::tracker::Tracker;
use crate::update::{UpdateChecker, CURRENT_VERSION};
use crate::util::truncate_display;
use crate::view::ViewMode;
use crate::viewer::{Browser, SystemBrowser, TrackingViewer};

use super::components::{InputBox, StatusBar};
use super::events::{Event, EventHandler, KeyBindings};
use super::state::{AppState, InputMode, MessageKind};
use super::theme::{available_themes, Theme};

/// What the loop should do after a key press.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    /// Keep running.
    Continue,
    /// Leave the TUI.
    Quit,
    /// Start a background release check.
    CheckUpdates,
}

/// Run the TUI application on an opened tracker.
pub fn run<S: KeyValueStore>(tracker: Tracker<S>, config: &Config, theme: Option<&str>) -> Result<()> {
    let theme_name = theme.unwrap_or(config.tui.theme.as_str());
    let theme = Theme::from_name(theme_name).ok_or_else(|| {
        TrackerError::invalid_argument(
            "theme",
            format!("unknown theme '{theme_name}' (available: {})", available_themes().join(", ")),
        )
    })?;

    // Setup terminal
    enable_raw_mode().map_err(|e| {
        TrackerError::io(
            "Cannot launch TUI - no interactive terminal available. \
             The TUI requires a terminal with keyboard input support",
            e,
        )
    })?;

    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)
        .map_err(|e| TrackerError::io("Failed to enter alternate screen", e))?;

    let backend = CrosstermBackend::new(stdout);
    let mut terminal =
        Terminal::new(backend).map_err(|e| TrackerError::io("Failed to create terminal", e))?;

    let viewer = TrackingViewer::new(&config.tracking, SystemBrowser);
    let mut app = AppState::new(tracker, viewer, config, theme);

    // Main loop
    let result = run_loop(&mut terminal, &mut app, &config.update);

    // Restore terminal
    disable_raw_mode().map_err(|e| TrackerError::io("Failed to disable raw mode", e))?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)
        .map_err(|e| TrackerError::io("Failed to leave alternate screen", e))?;
    terminal
        .show_cursor()
        .map_err(|e| TrackerError::io("Failed to show cursor", e))?;

    result
}

/// Main event loop using EventHandler.
fn run_loop<S: KeyValueStore, B: Browser>(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut AppState<S, B>,
    update_config: &UpdateConfig,
) -> Result<()> {
    let events = EventHandler::new(Duration::from_millis(100));
    let bindings = KeyBindings::default();

    loop {
        terminal
            .draw(|f| draw_ui(f, app, Instant::now()))
            .map_err(|e| TrackerError::io("Failed to draw TUI", e))?;

        match events.next() {
            Ok(Event::Key(key)) => match handle_key(app, key, &bindings, Instant::now()) {
                KeyOutcome::Continue => {}
                KeyOutcome::Quit => return Ok(()),
                KeyOutcome::CheckUpdates => {
                    app.update_in_flight = true;
                    app.info("Checking for updates...");
                    spawn_update_check(update_config.clone(), events.sender());
                }
            },
            Ok(Event::Tick) => app.tick(Instant::now()),
            // Terminal resize is handled automatically by ratatui
            Ok(Event::Resize(_, _)) => {}
            Ok(Event::Update(result)) => app.on_update_result(result),
            Err(_) => {
                return Err(TrackerError::TuiError {
                    message: "event channel closed".to_string(),
                })
            }
        }
    }
}

/// Run the release check on a worker thread and post the result back.
fn spawn_update_check(config: UpdateConfig, tx: Sender<Event>) {
    thread::spawn(move || {
        info!("Background update check started");
        let result = UpdateChecker::new(&config)
            .and_then(|checker| checker.check(CURRENT_VERSION))
            .map_err(|e| e.to_string());
        // The UI may have quit already.
        let _ = tx.send(Event::Update(result));
    });
}

/// Apply one key press to the state.
pub fn handle_key<S: KeyValueStore, B: Browser>(
    app: &mut AppState<S, B>,
    key: KeyEvent,
    bindings: &KeyBindings,
    now: Instant,
) -> KeyOutcome {
    if key.modifiers == KeyModifiers::CONTROL && key.code == KeyCode::Char('c') {
        return KeyOutcome::Quit;
    }

    match app.input_mode {
        InputMode::Search => {
            match (key.modifiers, key.code) {
                (_, KeyCode::Esc) => app.clear_search(),
                (_, KeyCode::Enter) => app.confirm_search(),
                (_, KeyCode::Backspace) => app.search_backspace(),
                (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => {
                    app.search_input(c);
                }
                _ => {}
            }
            return KeyOutcome::Continue;
        }
        InputMode::AddName | InputMode::AddCode => {
            match (key.modifiers, key.code) {
                (_, KeyCode::Esc) => app.cancel_add(),
                (_, KeyCode::Enter) => app.add_confirm(),
                (_, KeyCode::Backspace) => app.add_backspace(),
                (KeyModifiers::NONE | KeyModifiers::SHIFT, KeyCode::Char(c)) => app.add_input(c),
                _ => {}
            }
            return KeyOutcome::Continue;
        }
        InputMode::Normal => {}
    }

    if app.show_help {
        if bindings.is_back(&key) || key.code == KeyCode::Char('?') || bindings.is_quit(&key) {
            app.show_help = false;
        }
        return KeyOutcome::Continue;
    }

    // Clear status message on any key press
    app.status_message = None;

    if bindings.is_quit(&key) {
        return KeyOutcome::Quit;
    }
    if bindings.is_up(&key) {
        app.current_view_mut().previous();
    } else if bindings.is_down(&key) {
        app.current_view_mut().next();
    } else if bindings.is_select(&key) {
        app.activate_selected();
    } else if bindings.is_switch_tab(&key) {
        app.toggle_tab();
    } else if bindings.is_back(&key) {
        if !app.query().is_empty() {
            app.clear_search();
        }
    } else {
        match key.code {
            KeyCode::Char('1') => app.switch_tab(ViewMode::Home),
            KeyCode::Char('2') => app.switch_tab(ViewMode::Archived),
            KeyCode::Char('a') => app.start_add(),
            KeyCode::Char('x') => app.toggle_selected(now),
            KeyCode::Char('d') | KeyCode::Delete => app.delete_selected(now),
            KeyCode::Char('u') => app.undo(now),
            KeyCode::Char('/') => app.start_search(),
            KeyCode::Char('?') => app.show_help = true,
            KeyCode::Char('U') if !app.update_in_flight => return KeyOutcome::CheckUpdates,
            KeyCode::Char('U') => app.info("Update check already running"),
            KeyCode::Home | KeyCode::Char('g') => app.current_view_mut().select(0),
            KeyCode::End | KeyCode::Char('G') => {
                let last = app.current_view().len().saturating_sub(1);
                app.current_view_mut().select(last);
            }
            _ => {}
        }
    }

    KeyOutcome::Continue
}

fn draw_ui<S: KeyValueStore, B: Browser>(f: &mut Frame, app: &AppState<S, B>, now: Instant) {
    // Tabs + list + search bar (if active or filtering) + status bar
    let search_height = if app.input_mode == InputMode::Search || !app.query().is_empty() {
        3
    } else {
        0
    };
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Length(3),
            Constraint::Min(3),
            Constraint::Length(search_height),
            Constraint::Length(1),
        ])
        .split(f.area());

    draw_tabs(f, app, chunks[0]);
    draw_list(f, app, chunks[1]);
    if search_height > 0 {
        draw_search_bar(f, app, chunks[2]);
    }
    draw_status_bar(f, app, chunks[3], now);

    if matches!(app.input_mode, InputMode::AddName | InputMode::AddCode) {
        draw_add_dialog(f, app);
    }

    if app.show_help {
        draw_help_overlay(f, app);
    }
}

/// Draw the Home / Archived tab header.
fn draw_tabs<S: KeyValueStore, B: Browser>(f: &mut Frame, app: &AppState<S, B>, area: Rect) {
    let (active, archived) = app.counts();
    let titles = vec![
        Line::from(format!(" 1 {} ({active}) ", ViewMode::Home.title())),
        Line::from(format!(" 2 {} ({archived}) ", ViewMode::Archived.title())),
    ];
    let selected = match app.tab {
        ViewMode::Home => 0,
        ViewMode::Archived => 1,
    };

    let tabs = Tabs::new(titles)
        .select(selected)
        .block(
            Block::default()
                .title(" Cainiao Tracker ")
                .borders(Borders::ALL)
                .border_style(app.theme.border_style(false)),
        )
        .highlight_style(
            Style::default()
                .fg(app.theme.primary)
                .add_modifier(Modifier::BOLD),
        );

    f.render_widget(tabs, area);
}

/// Draw the parcel list of the visible tab.
fn draw_list<S: KeyValueStore, B: Browser>(f: &mut Frame, app: &AppState<S, B>, area: Rect) {
    let view = app.current_view();
    let visible_height = area.height.saturating_sub(2) as usize;
    let selected = view.selected_index();
    // Keep the cursor on screen
    let scroll = selected
        .map(|i| (i + 1).saturating_sub(visible_height))
        .unwrap_or(0);
    let name_width = (area.width as usize / 2).max(8);

    let items: Vec<ListItem> = view
        .rows()
        .into_iter()
        .enumerate()
        .skip(scroll)
        .take(visible_height)
        .map(|(i, row)| {
            let line = Line::from(vec![
                Span::raw(format!(
                    "{:<width$} ",
                    truncate_display(&row.name, name_width),
                    width = name_width
                )),
                Span::styled(row.code, Style::default().fg(app.theme.muted)),
                Span::styled(
                    format!("  [x {}]", row.toggle_label),
                    Style::default().fg(app.theme.border),
                ),
            ]);
            let style = if Some(i) == selected {
                app.theme.selection_style()
            } else {
                Style::default().fg(app.theme.foreground)
            };
            ListItem::new(line).style(style)
        })
        .collect();

    let title = format!(" {} ", view.mode().title());
    let block = Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(app.theme.border_style(app.input_mode == InputMode::Normal));

    if items.is_empty() {
        let hint = if !app.query().is_empty() {
            "No parcels match the search."
        } else if view.mode() == ViewMode::Home {
            "No parcels yet. Press 'a' to add one."
        } else {
            "Nothing archived."
        };
        let paragraph = Paragraph::new(hint)
            .style(Style::default().fg(app.theme.muted))
            .block(block);
        f.render_widget(paragraph, area);
        return;
    }

    f.render_widget(List::new(items).block(block), area);
}

/// Draw the search bar.
fn draw_search_bar<S: KeyValueStore, B: Browser>(f: &mut Frame, app: &AppState<S, B>, area: Rect) {
    let typing = app.input_mode == InputMode::Search;
    let title = if typing {
        " Search (Enter to confirm, Esc to clear) "
    } else {
        " Search (/ to edit, Esc to clear) "
    };
    let border = if typing {
        Style::default().fg(app.theme.warning)
    } else {
        app.theme.border_style(false)
    };

    InputBox::new(title, app.query())
        .focused(typing)
        .border_style(border)
        .render(f, area);
}

/// Draw the add dialog overlay.
fn draw_add_dialog<S: KeyValueStore, B: Browser>(f: &mut Frame, app: &AppState<S, B>) {
    let area = centered_rect(50, 30, f.area());
    f.render_widget(Clear, area);
    f.render_widget(
        Block::default()
            .title(" Add parcel (Enter to continue, Esc to cancel) ")
            .borders(Borders::ALL)
            .border_style(app.theme.border_style(true)),
        area,
    );

    let inner = Layout::default()
        .direction(Direction::Vertical)
        .margin(1)
        .constraints([Constraint::Length(3), Constraint::Length(3), Constraint::Min(0)])
        .split(area);

    let naming = app.input_mode == InputMode::AddName;
    InputBox::new(" Name ", &app.add_name)
        .focused(naming)
        .border_style(app.theme.border_style(naming))
        .render(f, inner[0]);
    InputBox::new(" Tracking code ", &app.add_code)
        .focused(!naming)
        .border_style(app.theme.border_style(!naming))
        .render(f, inner[1]);
}

/// Draw the status bar.
fn draw_status_bar<S: KeyValueStore, B: Browser>(
    f: &mut Frame,
    app: &AppState<S, B>,
    area: Rect,
    now: Instant,
) {
    let mode = match app.input_mode {
        InputMode::Search => "SEARCH",
        InputMode::AddName | InputMode::AddCode => "ADD",
        InputMode::Normal if app.show_help => "HELP",
        InputMode::Normal => match app.tab {
            ViewMode::Home => "HOME",
            ViewMode::Archived => "ARCHIVED",
        },
    };

    let brand = Span::styled(
        " cainiao ",
        Style::default()
            .fg(app.theme.primary)
            .add_modifier(Modifier::BOLD),
    );

    let left_content = if let Some(msg) = &app.status_message {
        let style = match msg.kind {
            MessageKind::Info => app.theme.success_style(),
            MessageKind::Error => app.theme.error_style(),
        };
        vec![brand, Span::raw("│ "), Span::styled(msg.text.clone(), style)]
    } else {
        vec![
            brand,
            Span::raw("│ "),
            Span::styled(mode, app.theme.warning_style()),
            Span::raw(" │ "),
            Span::styled(app.theme.name.clone(), Style::default().fg(app.theme.secondary)),
        ]
    };

    let mut right_content = Vec::new();
    if let (Some(command), Some(secs)) = (app.undo_available(now), app.undo_seconds_left(now)) {
        right_content.push(Span::styled(
            format!("u: undo {} {} ({secs}s) ", command.verb(), command.item.name),
            app.theme.warning_style(),
        ));
        right_content.push(Span::raw("│ "));
    }
    if app.update_in_flight {
        right_content.push(Span::raw("checking updates │ "));
    }
    right_content.push(Span::raw("? for help "));

    StatusBar::new()
        .left(left_content)
        .right(right_content)
        .render(f, area);
}

/// Draw help overlay.
fn draw_help_overlay<S: KeyValueStore, B: Browser>(f: &mut Frame, app: &AppState<S, B>) {
    let area = centered_rect(60, 70, f.area());

    let help_text = vec![
        Line::from(Span::styled(
            "Keyboard Shortcuts",
            Style::default().add_modifier(Modifier::BOLD),
        )),
        Line::from(""),
        Line::from("Navigation:"),
        Line::from("  j/↓       Move down"),
        Line::from("  k/↑       Move up"),
        Line::from("  g/G       First/last parcel"),
        Line::from("  Tab       Switch Home/Archived"),
        Line::from("  1/2       Home/Archived tab"),
        Line::from("  Enter     Open tracking page"),
        Line::from(""),
        Line::from("Parcels:"),
        Line::from("  a         Add parcel"),
        Line::from("  x         Archive/unarchive"),
        Line::from("  d         Delete"),
        Line::from("  u         Undo last archive/unarchive/delete"),
        Line::from(""),
        Line::from("Search:"),
        Line::from("  /         Filter by name or code"),
        Line::from("  Esc       Clear filter"),
        Line::from(""),
        Line::from("Other:"),
        Line::from("  U         Check for updates"),
        Line::from("  ?         Toggle help"),
        Line::from("  q         Quit"),
    ];

    let paragraph = Paragraph::new(help_text).block(
        Block::default()
            .title(format!(" Help (v{CURRENT_VERSION}) "))
            .borders(Borders::ALL)
            .border_style(app.theme.border_style(true))
            .style(Style::default().bg(Color::Black)),
    );

    f.render_widget(Clear, area);
    f.render_widget(paragraph, area);
}

fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::default()
        .direction(Direction::Vertical)
        .constraints([
            Constraint::Percentage((100 - percent_y) / 2),
            Constraint::Percentage(percent_y),
            Constraint::Percentage((100 - percent_y) / 2),
        ])
        .split(r);

    Layout::default()
        .direction(Direction::Horizontal)
        .constraints([
            Constraint::Percentage((100 - percent_x) / 2),
            Constraint::Percentage(percent_x),
            Constraint::Percentage((100 - percent_x) / 2),
        ])
        .split(popup_layout[1])[1]
}
