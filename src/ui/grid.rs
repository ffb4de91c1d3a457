use super::util::{display_name, swatch_color};
use crate::{
    app::{Action, AppContext, AppResult, AppView},
    components::Component,
};
use ratatui::{
    Frame,
    layout::{Alignment, Rect},
    style::{Color, Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

const GRID_COLUMNS: usize = 2;

/// Two-column grid over the filtered catalog. The cursor indexes into the
/// currently visible (filtered) list, not the running collection.
#[derive(Debug, Default)]
pub struct CatalogGrid {
    cursor: usize,
    scroll_row: usize,
}

#[derive(Debug)]
pub enum GridCommand {
    MoveUp,
    MoveDown,
    MoveLeft,
    MoveRight,
    ResetCursor,
}

impl CatalogGrid {
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    fn clamp_cursor(&mut self, len: usize) {
        if len == 0 {
            self.cursor = 0;
        } else if self.cursor >= len {
            self.cursor = len - 1;
        }
    }

    fn keep_cursor_in_view(&mut self, rows_visible: usize) {
        let cursor_row = self.cursor / GRID_COLUMNS;
        if cursor_row < self.scroll_row {
            self.scroll_row = cursor_row;
        } else if rows_visible > 0 && cursor_row >= self.scroll_row + rows_visible {
            self.scroll_row = cursor_row + 1 - rows_visible;
        }
    }
}

impl Component for CatalogGrid {
    type Command = GridCommand;

    fn init(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<()> {
        Ok(())
    }

    fn update(
        &mut self,
        command: &Self::Command,
        ctx: &mut AppContext<'_>,
    ) -> AppResult<Option<Action>> {
        let len = ctx.state.browser.visible(&ctx.state.query).len();
        match command {
            GridCommand::MoveUp => {
                if self.cursor >= GRID_COLUMNS {
                    self.cursor -= GRID_COLUMNS;
                }
            }
            GridCommand::MoveDown => {
                if self.cursor + GRID_COLUMNS < len {
                    self.cursor += GRID_COLUMNS;
                }
            }
            GridCommand::MoveLeft => {
                self.cursor = self.cursor.saturating_sub(1);
            }
            GridCommand::MoveRight => {
                if self.cursor + 1 < len {
                    self.cursor += 1;
                }
            }
            GridCommand::ResetCursor => {
                self.cursor = 0;
                self.scroll_row = 0;
            }
        }
        self.clamp_cursor(len);
        Ok(None)
    }

    fn render(&mut self, frame: &mut Frame<'_>, area: Rect, ctx: &AppView<'_>) {
        let state = ctx.state;
        let block = Block::default()
            .borders(Borders::ALL)
            .title(Line::from("Catalog").style(Style::default().add_modifier(Modifier::BOLD)));
        let inner = block.inner(area);
        frame.render_widget(block, area);

        // First page still on the wire: full-pane loading indicator.
        if state.browser.is_initial_load() {
            let loading = Paragraph::new("Loading…")
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(loading, inner);
            return;
        }

        let visible = state.browser.visible(&state.query);

        if visible.is_empty() {
            let text = if state.browser.failure().is_some() {
                "Could not load the catalog. Press `r` to retry."
            } else if !state.query.is_empty() {
                "No items found"
            } else {
                "The catalog is empty."
            };
            let empty = Paragraph::new(text)
                .alignment(Alignment::Center)
                .style(Style::default().fg(Color::Gray));
            frame.render_widget(empty, inner);
            return;
        }

        self.clamp_cursor(visible.len());

        // The bottom line is reserved for load progress / failures.
        let rows_visible = (inner.height as usize).saturating_sub(1);
        self.keep_cursor_in_view(rows_visible);

        let col_width = (inner.width as usize / GRID_COLUMNS).saturating_sub(1);
        let mut lines = Vec::with_capacity(rows_visible);
        for row in self.scroll_row..(self.scroll_row + rows_visible) {
            let mut spans = Vec::with_capacity(GRID_COLUMNS * 2);
            for col in 0..GRID_COLUMNS {
                let slot = row * GRID_COLUMNS + col;
                let Some(&entry_index) = visible.get(slot) else {
                    continue;
                };
                let entry = &state.browser.entries()[entry_index];

                let bullet_style = match state.colors.get(&entry.name) {
                    Some(&argb) => Style::default().fg(swatch_color(argb)),
                    None => Style::default().fg(Color::DarkGray),
                };
                let name_style = if slot == self.cursor {
                    Style::default()
                        .fg(Color::Cyan)
                        .add_modifier(Modifier::BOLD)
                } else {
                    Style::default()
                };
                let marker = if slot == self.cursor { "▸ " } else { "  " };

                // marker (2) + bullet (2) + padded name fills the column.
                let name_width = col_width.saturating_sub(4).max(1);
                let mut name = display_name(&entry.name);
                if name.chars().count() > name_width {
                    name = name.chars().take(name_width).collect();
                }

                spans.push(Span::styled(marker.to_string(), name_style));
                spans.push(Span::styled("● ".to_string(), bullet_style));
                spans.push(Span::styled(
                    format!("{name:<name_width$}"),
                    name_style,
                ));
            }
            if spans.is_empty() {
                break;
            }
            lines.push(Line::from(spans));
        }

        // Tail line: in-flight page, keyed failure, or end of catalog.
        if let Some(failure) = state.browser.failure() {
            lines.push(Line::from(Span::styled(
                format!(
                    "Page {} failed: {}. Press `r` to retry.",
                    failure.key + 1,
                    failure.message
                ),
                Style::default().fg(Color::Red),
            )));
        } else if state.browser.is_loading() {
            lines.push(Line::from(Span::styled(
                "Loading more…",
                Style::default().fg(Color::Gray),
            )));
        }

        let widget = Paragraph::new(lines);
        frame.render_widget(widget, inner);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
