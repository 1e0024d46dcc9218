//! Reusable TUI components.

use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Clear, Paragraph},
    Frame,
};

/// A status bar component.
pub struct StatusBar<'a> {
    left: Vec<Span<'a>>,
    right: Vec<Span<'a>>,
    background: Color,
}

impl<'a> StatusBar<'a> {
    /// Create a new status bar.
    pub fn new() -> Self {
        Self {
            left: Vec::new(),
            right: Vec::new(),
            background: Color::DarkGray,
        }
    }

    /// Add left-aligned content.
    pub fn left(mut self, spans: Vec<Span<'a>>) -> Self {
        self.left = spans;
        self
    }

    /// Add right-aligned content.
    pub fn right(mut self, spans: Vec<Span<'a>>) -> Self {
        self.right = spans;
        self
    }

    /// Set the bar background.
    pub fn background(mut self, color: Color) -> Self {
        self.background = color;
        self
    }

    /// Render the status bar.
    pub fn render(self, f: &mut Frame, area: Rect) {
        let padding = (area.width as usize)
            .saturating_sub(spans_width(&self.left))
            .saturating_sub(spans_width(&self.right));

        let mut spans = self.left;
        spans.push(Span::raw(" ".repeat(padding.max(1))));
        spans.extend(self.right);

        let paragraph = Paragraph::new(Line::from(spans))
            .style(Style::default().bg(self.background).fg(Color::White));

        f.render_widget(paragraph, area);
    }
}

fn spans_width(spans: &[Span<'_>]) -> usize {
    spans.iter().map(|s| s.content.chars().count()).sum()
}

impl Default for StatusBar<'_> {
    fn default() -> Self {
        Self::new()
    }
}

/// A single-line text prompt drawn as a bordered box.
pub struct InputBox<'a> {
    title: &'a str,
    value: &'a str,
    focused: bool,
    border: Style,
}

impl<'a> InputBox<'a> {
    /// Create a prompt with a title and current value.
    pub fn new(title: &'a str, value: &'a str) -> Self {
        Self {
            title,
            value,
            focused: false,
            border: Style::default(),
        }
    }

    /// Show a cursor when focused.
    pub fn focused(mut self, focused: bool) -> Self {
        self.focused = focused;
        self
    }

    /// Border style.
    pub fn border_style(mut self, style: Style) -> Self {
        self.border = style;
        self
    }

    /// Render the prompt, clearing what is underneath.
    pub fn render(self, f: &mut Frame, area: Rect) {
        let cursor = if self.focused { "█" } else { "" };
        let paragraph = Paragraph::new(format!("{}{cursor}", self.value)).block(
            Block::default()
                .title(self.title)
                .borders(Borders::ALL)
                .border_style(self.border),
        );
        f.render_widget(Clear, area);
        f.render_widget(paragraph, area);
    }
}
