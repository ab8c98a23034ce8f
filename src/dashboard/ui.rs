use std::io::{self, Stdout};

use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
    Frame, Terminal,
};

use super::app::DashboardApp;
use crate::remote::RemoteRunner;

pub struct UI;

impl UI {
    pub fn setup_terminal() -> io::Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        Terminal::new(backend)
    }

    pub fn restore_terminal() -> io::Result<()> {
        disable_raw_mode()?;
        execute!(io::stdout(), LeaveAlternateScreen)?;
        Ok(())
    }

    pub fn render<R: RemoteRunner + 'static>(frame: &mut Frame, app: &DashboardApp<R>) {
        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .margin(1)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(6),
                Constraint::Length(8),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let panels = Layout::default()
            .direction(Direction::Horizontal)
            .constraints([Constraint::Percentage(40), Constraint::Percentage(60)])
            .split(chunks[1]);

        Self::render_header(frame, chunks[0], app);
        app.environment_list().render(frame, panels[0]);
        app.signal_display()
            .render(frame, panels[1], &app.config().session_name);
        app.path_input()
            .render(frame, chunks[2], app.completion_host_label());
        Self::render_footer(frame, chunks[3], app);
    }

    fn render_header<R: RemoteRunner + 'static>(
        frame: &mut Frame,
        area: Rect,
        app: &DashboardApp<R>,
    ) {
        let environments = app.environment_list().entries().len();

        let mut title = vec![Span::styled(
            " YEEHAW ",
            Style::default()
                .fg(Color::Cyan)
                .add_modifier(Modifier::BOLD),
        )];

        if area.width >= 80 {
            title.push(Span::raw(" - Remote Environments "));
        }
        title.push(Span::raw("| "));
        title.extend([
            Span::styled(
                format!("Session: {} ", app.config().session_name),
                Style::default().fg(Color::Yellow),
            ),
            Span::raw("| "),
            Span::styled(
                format!("● {} running ", environments),
                Style::default().fg(Color::Green),
            ),
        ]);
        if app.environment_list().is_detecting() {
            title.push(Span::styled("| detecting", Style::default().fg(Color::Yellow)));
        }

        let header = Paragraph::new(Line::from(title)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::Cyan)),
        );

        frame.render_widget(header, area);
    }

    fn render_footer<R: RemoteRunner + 'static>(
        frame: &mut Frame,
        area: Rect,
        app: &DashboardApp<R>,
    ) {
        let message = app
            .message()
            .map(|m| format!("{} | ", m))
            .unwrap_or_default();

        let help_text = vec![
            Span::styled(message, Style::default().fg(Color::Green)),
            Span::styled("Tab", Style::default().fg(Color::Yellow)),
            Span::raw(": Complete "),
            Span::styled("Ctrl+E", Style::default().fg(Color::Yellow)),
            Span::raw(": Host "),
            Span::styled("Ctrl+R", Style::default().fg(Color::Yellow)),
            Span::raw(": Refresh "),
            Span::styled("Ctrl+U", Style::default().fg(Color::Yellow)),
            Span::raw(": Clear "),
            Span::styled("Esc", Style::default().fg(Color::Yellow)),
            Span::raw(": Quit"),
        ];

        let footer = Paragraph::new(Line::from(help_text)).block(
            Block::default()
                .borders(Borders::ALL)
                .border_style(Style::default().fg(Color::DarkGray)),
        );

        frame.render_widget(footer, area);
    }
}
