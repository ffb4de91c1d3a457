use crate::{
    app::{Action, AppContext, AppResult, AppView, Screen},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Paragraph},
};
use std::time::{Duration, Instant};

const STATUS_TTL: Duration = Duration::from_secs(4);

/// Title bar with the incremental search input and a transient status line.
/// The query itself lives in `AppState` so the grid can filter on it.
#[derive(Debug)]
pub struct TopBar {
    title: String,
    search_active: bool,
    status: Option<(String, Instant)>,
}

impl Default for TopBar {
    fn default() -> Self {
        Self {
            title: "pokedex-tui".to_string(),
            search_active: false,
            status: None,
        }
    }
}

#[derive(Debug, Clone)]
pub enum TopCommand {
    ActivateSearch,
    InputChar(char),
    Backspace,
    Submit,
    Cancel,
    ShowStatus(String),
}

impl TopBar {
    pub fn is_search_active(&self) -> bool {
        self.search_active
    }

    fn status_line(&self) -> Option<Line<'_>> {
        self.status
            .as_ref()
            .map(|(text, _)| Line::from(Span::styled(text.clone(), Style::default().fg(Color::Green))))
    }
}

impl Component for TopBar {
    type Command = TopCommand;

    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        match command {
            TopCommand::ActivateSearch => {
                self.search_active = true;
                self.status = None;
            }
            TopCommand::InputChar(c) => {
                ctx.state.query.push(*c);
            }
            TopCommand::Backspace => {
                ctx.state.query.pop();
            }
            TopCommand::Submit => {
                // The filter applies per keystroke; submit only leaves input
                // mode with the query intact.
                self.search_active = false;
            }
            TopCommand::Cancel => {
                self.search_active = false;
                ctx.state.query.clear();
            }
            TopCommand::ShowStatus(text) => {
                self.status = Some((text.clone(), Instant::now()));
            }
        }
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let state = ctx.state;

        let mut spans = vec![Span::styled(
            self.title.clone(),
            Style::default().fg(Color::Yellow).add_modifier(Modifier::BOLD),
        )];

        if self.search_active || !state.query.is_empty() {
            let cursor = if self.search_active { "▏" } else { "" };
            spans.push(Span::raw("  /"));
            spans.push(Span::styled(
                format!("{}{cursor}", state.query),
                Style::default().fg(Color::Cyan),
            ));
        } else if matches!(state.screen, Screen::List) {
            spans.push(Span::styled(
                "  press / to search",
                Style::default().fg(Color::DarkGray),
            ));
        }

        let counter = if state.browser.end_reached() {
            format!("{} loaded • end of catalog", state.browser.entries().len())
        } else {
            format!("{} loaded", state.browser.entries().len())
        };
        spans.push(Span::styled(
            format!("  [{counter}]"),
            Style::default().fg(Color::DarkGray),
        ));

        let mut lines = vec![Line::from(spans)];
        if let Some(status) = self.status_line() {
            lines.push(status);
        }

        let widget = Paragraph::new(lines).block(Block::bordered());
        frame.render_widget(widget, area);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        if let Some((_, shown_at)) = self.status.as_ref() {
            if shown_at.elapsed() > STATUS_TTL {
                self.status = None;
            }
        }
        Ok(None)
    }
}
