use super::util::{display_name, swatch_color};
use crate::{
    app::{Action, AppContext, AppResult, AppView},
    components::Component,
};
use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Gauge, Paragraph},
};

/// Highest base stat the gauge is scaled against.
const STAT_SCALE: f64 = 255.0;

/// Full-record view for one entity, headed by a banner tinted with the
/// color extracted from its sprite.
#[derive(Debug, Default)]
pub struct DetailView;

#[derive(Debug)]
pub enum DetailViewCommand {}

impl Component for DetailView {
    type Command = DetailViewCommand;

    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        _command: &Self::Command,
        _ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let Some(detail) = ctx.state.detail.as_ref() else {
            return;
        };

        let banner_color = detail
            .argb
            .map(swatch_color)
            .unwrap_or(Color::DarkGray);

        let block = Block::default().borders(Borders::ALL).title(
            Line::from(display_name(&detail.name))
                .style(Style::default().add_modifier(Modifier::BOLD)),
        );
        let inner = block.inner(area);
        frame.render_widget(block, area);

        let chunks = Layout::default()
            .direction(Direction::Vertical)
            .constraints([Constraint::Length(1), Constraint::Min(1)])
            .split(inner);

        let banner = Paragraph::new(Line::from(Span::styled(
            format!(" {} ", display_name(&detail.name)),
            Style::default()
                .bg(banner_color)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
        )))
        .alignment(Alignment::Center);
        frame.render_widget(banner, chunks[0]);

        let body = chunks[1];

        if let Some(error) = detail.error.as_ref() {
            let widget = Paragraph::new(vec![
                Line::from(Span::styled(
                    error.clone(),
                    Style::default().fg(Color::Red),
                )),
                Line::from(Span::styled(
                    "Press Esc to go back.",
                    Style::default().fg(Color::Gray),
                )),
            ])
            .alignment(Alignment::Center);
            frame.render_widget(widget, body);
            return;
        }

        let Some(record) = detail.record.as_ref() else {
            let widget = Paragraph::new("Loading…")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(widget, body);
            return;
        };

        let types = record
            .types
            .iter()
            .map(|slot| display_name(&slot.kind.name))
            .collect::<Vec<_>>()
            .join(" / ");

        let mut lines = vec![
            Line::from(format!("No. {:04}", record.id)),
            Line::from(format!("Type: {types}")),
            Line::from(format!(
                "Height: {:.1} m   Weight: {:.1} kg",
                record.height as f64 / 10.0,
                record.weight as f64 / 10.0
            )),
        ];
        if let Some(xp) = record.base_experience {
            lines.push(Line::from(format!("Base experience: {xp}")));
        }
        lines.push(Line::from(""));

        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(lines.len() as u16),
                Constraint::Min(1),
            ])
            .split(body);

        frame.render_widget(Paragraph::new(lines), rows[0]);
        self.render_stats(frame, rows[1], record, banner_color);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}

impl DetailView {
    fn render_stats(
        &self,
        frame: &mut Frame<'_>,
        area: Rect,
        record: &crate::app::pokeapi::EntityDetail,
        color: Color,
    ) {
        let constraints: Vec<Constraint> = record
            .stats
            .iter()
            .map(|_| Constraint::Length(1))
            .chain(std::iter::once(Constraint::Min(0)))
            .collect();
        let rows = Layout::default()
            .direction(Direction::Vertical)
            .constraints(constraints)
            .split(area);

        for (stat, row) in record.stats.iter().zip(rows.iter()) {
            let ratio = (f64::from(stat.base_stat) / STAT_SCALE).clamp(0.0, 1.0);
            let gauge = Gauge::default()
                .gauge_style(Style::default().fg(color))
                .label(format!("{} {}", display_name(&stat.stat.name), stat.base_stat))
                .ratio(ratio);
            frame.render_widget(gauge, *row);
        }
    }
}
