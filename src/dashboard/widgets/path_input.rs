use ratatui::{
    layout::{Constraint, Direction, Layout, Position, Rect},
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph, Wrap},
    Frame,
};
use unicode_width::UnicodeWidthStr;

/// Single-line path editor with a candidate strip underneath.
///
/// The cursor is a character index, not a byte offset.
pub struct PathInput {
    content: String,
    cursor: usize,
    candidates: Vec<String>,
    pending: bool,
}

impl PathInput {
    pub fn new() -> Self {
        Self {
            content: String::new(),
            cursor: 0,
            candidates: Vec::new(),
            pending: false,
        }
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn set_content(&mut self, content: String) {
        self.cursor = content.chars().count();
        self.content = content;
    }

    pub fn clear(&mut self) {
        self.content.clear();
        self.cursor = 0;
        self.candidates.clear();
        self.pending = false;
    }

    fn byte_index(&self, char_index: usize) -> usize {
        self.content
            .char_indices()
            .nth(char_index)
            .map(|(i, _)| i)
            .unwrap_or(self.content.len())
    }

    fn len_chars(&self) -> usize {
        self.content.chars().count()
    }

    pub fn insert_char(&mut self, c: char) {
        let idx = self.byte_index(self.cursor);
        self.content.insert(idx, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let idx = self.byte_index(self.cursor);
            self.content.remove(idx);
        }
    }

    pub fn delete_forward(&mut self) {
        if self.cursor < self.len_chars() {
            let idx = self.byte_index(self.cursor);
            self.content.remove(idx);
        }
    }

    pub fn move_cursor_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_cursor_right(&mut self) {
        if self.cursor < self.len_chars() {
            self.cursor += 1;
        }
    }

    pub fn move_cursor_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_cursor_end(&mut self) {
        self.cursor = self.len_chars();
    }

    #[allow(dead_code)]
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn set_candidates(&mut self, candidates: Vec<String>) {
        self.candidates = candidates;
        self.pending = false;
    }

    pub fn set_pending(&mut self) {
        self.pending = true;
    }

    #[allow(dead_code)]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    /// Display column of the cursor, accounting for wide characters.
    fn cursor_column(&self) -> u16 {
        let before = &self.content[..self.byte_index(self.cursor)];
        before.width() as u16
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, host_label: &str) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(3), Constraint::Min(1)])
            .split(area);

        let input_line = if self.content.is_empty() {
            Line::from(Span::styled(
                "Type a path, Tab to complete...",
                Style::default().fg(Color::DarkGray),
            ))
        } else {
            Line::from(Span::styled(
                self.content.as_str(),
                Style::default().fg(Color::White),
            ))
        };

        let input = Paragraph::new(input_line).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(format!(" Path on {} ", host_label)),
        );
        frame.render_widget(input, chunks[0]);
        frame.set_cursor_position(Position::new(
            chunks[0].x + 1 + self.cursor_column(),
            chunks[0].y + 1,
        ));

        let candidates_text = if self.pending {
            Line::from(Span::styled("fetching...", Style::default().fg(Color::Yellow)))
        } else if self.candidates.is_empty() {
            Line::from(Span::styled("no matches", Style::default().fg(Color::DarkGray)))
        } else {
            Line::from(
                self.candidates
                    .iter()
                    .flat_map(|c| {
                        [
                            Span::styled(c.as_str(), Style::default().fg(Color::Green)),
                            Span::raw("/  "),
                        ]
                    })
                    .collect::<Vec<_>>(),
            )
        };

        let candidates = Paragraph::new(candidates_text)
            .block(
                Block::default()
                    .borders(Borders::ALL)
                    .border_style(Style::default().fg(Color::Gray))
                    .title(format!(" Candidates ({}) ", self.candidates.len())),
            )
            .wrap(Wrap { trim: false });
        frame.render_widget(candidates, chunks[1]);
    }
}

impl Default for PathInput {
    fn default() -> Self {
        Self::new()
    }
}
