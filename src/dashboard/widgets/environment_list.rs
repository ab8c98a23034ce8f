use ratatui::{
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, List, ListItem},
    Frame,
};

use crate::models::{HostDescriptor, ReachabilityState};

const SPINNER: [&str; 4] = ["⠋", "⠙", "⠸", "⠴"];

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentEntry {
    pub name: String,
    pub target: String,
}

impl EnvironmentEntry {
    pub fn from_host(host: &HostDescriptor) -> Self {
        Self {
            name: host.name.clone(),
            target: host
                .ssh_target()
                .map(|t| t.destination())
                .unwrap_or_default(),
        }
    }
}

/// Hosts whose managed session is running, plus a busy marker while a
/// probe batch is in flight.
pub struct EnvironmentList {
    entries: Vec<EnvironmentEntry>,
    detecting: bool,
    tick: usize,
    selected_host: Option<String>,
}

impl EnvironmentList {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            detecting: false,
            tick: 0,
            selected_host: None,
        }
    }

    pub fn set_environments(&mut self, hosts: &[HostDescriptor]) {
        self.entries = hosts.iter().map(EnvironmentEntry::from_host).collect();
    }

    pub fn entries(&self) -> &[EnvironmentEntry] {
        &self.entries
    }

    pub fn set_detecting(&mut self, detecting: bool) {
        self.detecting = detecting;
    }

    pub fn is_detecting(&self) -> bool {
        self.detecting
    }

    pub fn set_selected_host(&mut self, name: Option<String>) {
        self.selected_host = name;
    }

    pub fn tick(&mut self) {
        self.tick = self.tick.wrapping_add(1);
    }

    fn title(&self) -> String {
        if self.detecting {
            format!(
                " Environments {} detecting ",
                SPINNER[self.tick % SPINNER.len()]
            )
        } else {
            format!(" Environments ({}) ", self.entries.len())
        }
    }

    pub fn render(&self, frame: &mut Frame, area: Rect) {
        let available = ReachabilityState::Available;

        let items: Vec<ListItem> = if self.entries.is_empty() {
            vec![ListItem::new(Line::from(Span::styled(
                if self.detecting {
                    "checking hosts..."
                } else {
                    "no running environments"
                },
                Style::default().fg(Color::DarkGray),
            )))]
        } else {
            self.entries
                .iter()
                .map(|entry| {
                    let name_style = if self.selected_host.as_deref() == Some(entry.name.as_str())
                    {
                        Style::default()
                            .fg(Color::Cyan)
                            .add_modifier(Modifier::BOLD)
                    } else {
                        Style::default().add_modifier(Modifier::BOLD)
                    };
                    ListItem::new(Line::from(vec![
                        Span::styled(available.symbol(), Style::default().fg(available.color())),
                        Span::raw(" "),
                        Span::styled(format!("{:<16}", entry.name), name_style),
                        Span::styled(entry.target.as_str(), Style::default().fg(Color::Gray)),
                    ]))
                })
                .collect()
        };

        let list = List::new(items).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan))
                .title(self.title()),
        );
        frame.render_widget(list, area);
    }
}

impl Default for EnvironmentList {
    fn default() -> Self {
        Self::new()
    }
}
