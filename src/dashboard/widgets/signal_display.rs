use ratatui::{
    layout::Rect,
    style::{Color, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::models::SignalRecord;
use crate::session::PaneInfo;
use crate::utils::truncate_str;

const LABEL_MAX_CHARS: usize = 32;

#[derive(Debug, Clone)]
pub struct PaneSignal {
    pub pane: PaneInfo,
    pub signal: Option<SignalRecord>,
}

pub struct SignalDisplay {
    rows: Vec<PaneSignal>,
    session_running: bool,
}

impl SignalDisplay {
    pub fn new() -> Self {
        Self {
            rows: Vec::new(),
            session_running: false,
        }
    }

    pub fn set_rows(&mut self, rows: Vec<PaneSignal>) {
        self.rows = rows;
    }

    #[allow(dead_code)]
    pub fn rows(&self) -> &[PaneSignal] {
        &self.rows
    }

    pub fn set_session_running(&mut self, running: bool) {
        self.session_running = running;
    }

    fn signal_spans(signal: Option<&SignalRecord>) -> Vec<Span<'static>> {
        match signal {
            Some(record) => vec![
                Span::styled(record.status.symbol(), Style::default().fg(record.status.color())),
                Span::raw(" "),
                Span::styled(record.status.as_str(), Style::default().fg(record.status.color())),
            ],
            None => vec![Span::styled("-", Style::default().fg(Color::DarkGray))],
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect, session_name: &str) {
        let items: Vec<ListItem> = if !self.session_running {
            vec![ListItem::new(Span::styled(
                format!("session {} is not running", session_name),
                Style::default().fg(Color::DarkGray),
            ))]
        } else {
            self.rows
                .iter()
                .map(|row| {
                    let mut spans = vec![
                        Span::styled(
                            format!("{:<6}", row.pane.pane_id),
                            Style::default().fg(Color::Yellow),
                        ),
                        Span::raw(format!(
                            "{:<width$} ",
                            truncate_str(&row.pane.label(), LABEL_MAX_CHARS),
                            width = LABEL_MAX_CHARS
                        )),
                    ];
                    spans.extend(Self::signal_spans(row.signal.as_ref()));
                    ListItem::new(Line::from(spans))
                })
                .collect()
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Gray))
                .title(format!(" Panes ({}) ", self.rows.len())),
        );
        frame.render_widget(list, area);
    }
}

impl Default for SignalDisplay {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::SignalStatus;

    #[test]
    fn signal_spans_show_icon_and_status() {
        let record = SignalRecord::new(SignalStatus::Waiting, 0);
        let spans = SignalDisplay::signal_spans(Some(&record));

        assert_eq!(spans[0].content, "◆");
        assert_eq!(spans[2].content, "waiting");
    }

    #[test]
    fn missing_signal_renders_placeholder() {
        let spans = SignalDisplay::signal_spans(None);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].content, "-");
    }
}
