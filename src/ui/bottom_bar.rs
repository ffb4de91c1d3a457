use crate::{
    app::{Action, AppContext, AppResult, AppView, Screen},
    components::Component,
};
use ratatui::{
    Frame,
    layout::Rect,
    text::Line,
    widgets::{Block, Paragraph},
};

#[derive(Debug, Default)]
pub struct BottomBar;

#[derive(Debug)]
pub enum BottomBarCommand {}

impl Component for BottomBar {
    type Command = BottomBarCommand;

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
        let keymap = match ctx.state.screen {
            Screen::List => {
                "q Quit • / Search • h j k l Move • Enter Open • r Retry/Refresh"
            }
            Screen::Detail => "q Quit • Esc Back",
        };
        let widget = Paragraph::new(Line::from(keymap))
            .block(Block::bordered().title(Line::from("Keymap")));
        frame.render_widget(widget, area);
    }

    fn tick(&mut self, _ctx: &mut AppContext<'_>) -> AppResult<Option<Action>> {
        Ok(None)
    }
}
