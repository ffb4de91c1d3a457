use crate::{
    components::Component,
    ui::{
        bottom_bar::BottomBar,
        detail::DetailView,
        grid::{CatalogGrid, GridCommand},
        top::{TopBar, TopCommand},
    },
};
pub type AppResult<T> = color_eyre::Result<T>;
use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{
    DefaultTerminal, Frame,
    layout::{Constraint, Direction, Layout},
};
use std::{
    collections::{HashMap, HashSet},
    sync::{Arc, mpsc},
    time::Duration,
};

use tokio::runtime::{Handle, Runtime};

pub mod browser;
pub mod paging;
pub mod palette;
pub mod pokeapi;

use browser::CatalogBrowser;
use paging::{DEFAULT_PAGE_SIZE, Page, PageSource};
use pokeapi::{CatalogClient, EntityDetail, PokeApiClient};

/// How many rows around the cursor get a color extraction scheduled.
const COLOR_WINDOW: usize = 24;
/// How long the event loop waits for input before running a tick.
const TICK_INTERVAL: Duration = Duration::from_millis(150);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Screen {
    #[default]
    List,
    Detail,
}

/// Everything the detail screen needs is handed over at navigation time: the
/// entity name and the color extracted from its sprite. The full record
/// arrives asynchronously afterwards.
#[derive(Debug, Clone, PartialEq)]
pub struct DetailState {
    pub name: String,
    pub argb: Option<u32>,
    pub record: Option<EntityDetail>,
    pub error: Option<String>,
}

/// State shared across components.
#[derive(Debug)]
pub struct AppState {
    pub screen: Screen,
    pub browser: CatalogBrowser,
    pub query: String,
    pub colors: HashMap<String, u32>,
    pub detail: Option<DetailState>,
}

impl AppState {
    fn new(page_size: u32) -> Self {
        Self {
            screen: Screen::default(),
            browser: CatalogBrowser::new(page_size),
            query: String::new(),
            colors: HashMap::new(),
            detail: None,
        }
    }
}

/// Mutable context passed to components while handling logic.
pub struct AppContext<'a> {
    pub state: &'a mut AppState,
    pub commands: CommandBus,
}

/// Read-only context used during rendering.
pub struct AppView<'a> {
    pub state: &'a AppState,
}

/// Central application type: the composition root binding the catalog
/// client, the page source, and the color extractor to the UI panes.
pub struct App {
    running: bool,
    pub state: AppState,
    client: PokeApiClient,
    source: Arc<PageSource<PokeApiClient>>,
    top_bar: TopBar,
    grid: CatalogGrid,
    detail_view: DetailView,
    bottom_bar: BottomBar,
    #[allow(dead_code)]
    runtime: Runtime,
    runtime_handle: Handle,
    message_rx: mpsc::Receiver<Message>,
    message_tx: mpsc::Sender<Message>,
    colors_requested: HashSet<String>,
}

impl App {
    pub fn new() -> AppResult<Self> {
        let client = PokeApiClient::new()?;
        let source = Arc::new(PageSource::new(client.clone(), DEFAULT_PAGE_SIZE));
        let mut state = AppState::new(DEFAULT_PAGE_SIZE);
        let mut top_bar = TopBar::default();
        let mut grid = CatalogGrid::default();
        let mut detail_view = DetailView::default();
        let mut bottom_bar = BottomBar;
        let runtime = Runtime::new()?;
        let runtime_handle = runtime.handle().clone();
        let (message_tx, message_rx) = mpsc::channel();

        {
            let mut ctx = AppContext {
                state: &mut state,
                commands: CommandBus::new(message_tx.clone(), runtime_handle.clone()),
            };
            top_bar.init(&mut ctx)?;
            grid.init(&mut ctx)?;
            detail_view.init(&mut ctx)?;
            bottom_bar.init(&mut ctx)?;
        }

        Ok(Self {
            running: false,
            state,
            client,
            source,
            top_bar,
            grid,
            detail_view,
            bottom_bar,
            runtime,
            runtime_handle,
            message_rx,
            message_tx,
            colors_requested: HashSet::new(),
        })
    }

    pub fn run(mut self, mut terminal: DefaultTerminal) -> AppResult<()> {
        self.running = true;
        while self.running {
            self.tick()?;
            terminal.draw(|frame| self.render(frame))?;
            self.handle_events()?;
        }
        Ok(())
    }

    fn render(&mut self, frame: &mut Frame<'_>) {
        let layout = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(3),
                Constraint::Min(1),
                Constraint::Length(3),
            ])
            .split(frame.area());

        let top_area = layout[0];
        let main_area = layout[1];
        let bottom_area = layout[2];

        let view = AppView { state: &self.state };

        self.top_bar.render(frame, top_area, &view);
        match self.state.screen {
            Screen::List => self.grid.render(frame, main_area, &view),
            Screen::Detail => self.detail_view.render(frame, main_area, &view),
        }
        self.bottom_bar.render(frame, bottom_area, &view);
    }

    fn handle_events(&mut self) -> AppResult<()> {
        // Poll so async results keep landing while the user is idle.
        if !event::poll(TICK_INTERVAL)? {
            return Ok(());
        }
        match event::read()? {
            Event::Key(key) if key.kind == KeyEventKind::Press => self.on_key_event(key)?,
            Event::Mouse(_) | Event::Resize(_, _) => {}
            _ => {}
        }
        Ok(())
    }

    fn on_key_event(&mut self, key: KeyEvent) -> AppResult<()> {
        if self.top_bar.is_search_active() {
            match key.code {
                KeyCode::Esc => {
                    self.top_bar_command(TopCommand::Cancel)?;
                    self.grid_command(GridCommand::ResetCursor)?;
                    return Ok(());
                }
                KeyCode::Enter => {
                    self.top_bar_command(TopCommand::Submit)?;
                    return Ok(());
                }
                KeyCode::Backspace => {
                    self.top_bar_command(TopCommand::Backspace)?;
                    self.grid_command(GridCommand::ResetCursor)?;
                    return Ok(());
                }
                KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => {
                    self.top_bar_command(TopCommand::InputChar(c))?;
                    self.grid_command(GridCommand::ResetCursor)?;
                    return Ok(());
                }
                _ => {}
            }
        }

        if matches!(self.state.screen, Screen::Detail) {
            match (key.modifiers, key.code) {
                (_, KeyCode::Esc | KeyCode::Char('h') | KeyCode::Backspace) => {
                    self.dispatch(Action::CloseDetail)
                }
                (_, KeyCode::Char('q'))
                | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
                    self.dispatch(Action::Quit)
                }
                _ => {}
            }
            return Ok(());
        }

        match (key.modifiers, key.code) {
            (_, KeyCode::Esc | KeyCode::Char('q'))
            | (KeyModifiers::CONTROL, KeyCode::Char('c') | KeyCode::Char('C')) => {
                self.dispatch(Action::Quit)
            }
            (KeyModifiers::NONE, KeyCode::Char('/')) => {
                self.top_bar_command(TopCommand::ActivateSearch)?;
            }
            (KeyModifiers::NONE, KeyCode::Char('h') | KeyCode::Left) => {
                self.grid_command(GridCommand::MoveLeft)?;
            }
            (KeyModifiers::NONE, KeyCode::Char('j') | KeyCode::Down) => {
                self.grid_command(GridCommand::MoveDown)?;
            }
            (KeyModifiers::NONE, KeyCode::Char('k') | KeyCode::Up) => {
                self.grid_command(GridCommand::MoveUp)?;
            }
            (KeyModifiers::NONE, KeyCode::Char('l') | KeyCode::Right) => {
                self.grid_command(GridCommand::MoveRight)?;
            }
            (KeyModifiers::NONE, KeyCode::Enter) => {
                self.open_selected();
            }
            (KeyModifiers::NONE, KeyCode::Char('r')) => {
                self.retry_or_refresh()?;
            }
            _ => {}
        }
        Ok(())
    }

    fn dispatch(&mut self, action: Action) {
        match action {
            Action::Quit => self.running = false,
            Action::OpenDetail { name, argb } => {
                self.state.detail = Some(DetailState {
                    name: name.clone(),
                    argb,
                    record: None,
                    error: None,
                });
                self.state.screen = Screen::Detail;
                self.start_detail_fetch(name);
            }
            Action::CloseDetail => {
                self.state.detail = None;
                self.state.screen = Screen::List;
            }
            Action::Noop => {}
        }
    }

    /// Navigation handoff: the detail screen is seeded with exactly the
    /// entity name and whatever color is cached for it.
    fn open_selected(&mut self) {
        let visible = self.state.browser.visible(&self.state.query);
        let Some(&index) = visible.get(self.grid.cursor()) else {
            return;
        };
        let entry = &self.state.browser.entries()[index];
        let name = entry.name.clone();
        let argb = self.state.colors.get(&name).copied();
        self.dispatch(Action::OpenDetail { name, argb });
    }

    /// `r` retries a failed page first; with nothing failed it refreshes the
    /// page the cursor is anchored on, leaving earlier pages in place.
    fn retry_or_refresh(&mut self) -> AppResult<()> {
        if self.state.browser.failure().is_some() {
            self.state.browser.retry();
            self.request_next_page();
            return Ok(());
        }

        let visible = self.state.browser.visible(&self.state.query);
        let anchor_row = visible.get(self.grid.cursor()).copied().unwrap_or(0);
        if let Some(page) = self.state.browser.begin_refresh(anchor_row) {
            let key = self.source.refresh_key(Some(page));
            self.spawn_page_load(key);
            self.top_bar_command(TopCommand::ShowStatus(format!(
                "Refreshing page {}",
                page + 1
            )))?;
        }
        Ok(())
    }

    fn request_next_page(&mut self) {
        if let Some(key) = self.state.browser.begin_load() {
            self.spawn_page_load(Some(key));
        }
    }

    fn spawn_page_load(&self, key: Option<u32>) {
        let source = Arc::clone(&self.source);
        self.command_bus().spawn_async(move || async move {
            match source.load(key).await {
                Ok(page) => Message::PageLoaded(page),
                Err(err) => Message::PageFailed {
                    key: err.key,
                    message: err.source.to_string(),
                },
            }
        });
    }

    fn start_detail_fetch(&mut self, name: String) {
        let client = self.client.clone();
        self.command_bus().spawn_async(move || async move {
            match client.entity_detail(&name).await {
                Ok(record) => Message::DetailLoaded(record),
                Err(err) => Message::DetailFailed {
                    name,
                    message: err.to_string(),
                },
            }
        });
    }

    /// Fetches one entity's sprite and extracts its color off the async
    /// threads. A failure keeps the placeholder color; nothing retries.
    fn start_color_extraction(&mut self, name: String, id: u32) {
        if !self.colors_requested.insert(name.clone()) {
            return;
        }
        let client = self.client.clone();
        self.command_bus().spawn_async(move || async move {
            let bytes = match client.fetch_sprite(id).await {
                Ok(bytes) => bytes,
                Err(_) => return Message::ColorUnavailable { name },
            };
            let extracted =
                tokio::task::spawn_blocking(move || palette::extract_color_from_bytes(&bytes))
                    .await;
            match extracted {
                Ok(Ok(argb)) => Message::ColorExtracted { name, argb },
                _ => Message::ColorUnavailable { name },
            }
        });
    }

    /// Schedules color extraction for entries around the cursor that have no
    /// cached color yet. Each entry is requested at most once per session.
    fn schedule_visible_colors(&mut self) {
        if !matches!(self.state.screen, Screen::List) {
            return;
        }
        let visible = self.state.browser.visible(&self.state.query);
        let start = self.grid.cursor().saturating_sub(COLOR_WINDOW / 4);
        let wanted: Vec<(String, u32)> = visible
            .iter()
            .skip(start)
            .take(COLOR_WINDOW)
            .filter_map(|&index| {
                let entry = &self.state.browser.entries()[index];
                if self.state.colors.contains_key(&entry.name) {
                    return None;
                }
                entry.id().map(|id| (entry.name.clone(), id))
            })
            .collect();
        for (name, id) in wanted {
            self.start_color_extraction(name, id);
        }
    }

    fn command_bus(&self) -> CommandBus {
        CommandBus::new(self.message_tx.clone(), self.runtime_handle.clone())
    }

    fn grid_command(&mut self, command: GridCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            state: &mut self.state,
            commands: CommandBus::new(self.message_tx.clone(), self.runtime_handle.clone()),
        };
        if let Some(action) = self.grid.update(&command, &mut ctx)? {
            self.dispatch(action);
        }
        Ok(())
    }

    fn top_bar_command(&mut self, command: TopCommand) -> AppResult<()> {
        let mut ctx = AppContext {
            state: &mut self.state,
            commands: CommandBus::new(self.message_tx.clone(), self.runtime_handle.clone()),
        };
        if let Some(action) = self.top_bar.update(&command, &mut ctx)? {
            self.dispatch(action);
        }
        Ok(())
    }

    fn tick(&mut self) -> AppResult<()> {
        {
            let mut ctx = AppContext {
                state: &mut self.state,
                commands: CommandBus::new(self.message_tx.clone(), self.runtime_handle.clone()),
            };
            if let Some(action) = self.top_bar.tick(&mut ctx)? {
                self.dispatch(action);
            }
        }
        self.drain_messages();

        // Filtering never triggers loads; forward pagination runs only over
        // the unfiltered collection, driven by cursor proximity to the tail.
        if matches!(self.state.screen, Screen::List)
            && self.state.query.is_empty()
            && self.state.browser.near_end(self.grid.cursor())
        {
            self.request_next_page();
        }

        self.schedule_visible_colors();
        Ok(())
    }

    fn drain_messages(&mut self) {
        while let Ok(message) = self.message_rx.try_recv() {
            match message {
                Message::PageLoaded(page) => {
                    self.state.browser.apply_page(page);
                }
                Message::PageFailed { key, message } => {
                    self.state.browser.load_failed(key, message);
                }
                Message::ColorExtracted { name, argb } => {
                    // Results for entries that scrolled away are cached too;
                    // the cache is never invalidated within a session.
                    self.state.colors.insert(name.clone(), argb);
                    if let Some(detail) = self.state.detail.as_mut() {
                        if detail.name == name && detail.argb.is_none() {
                            detail.argb = Some(argb);
                        }
                    }
                }
                Message::ColorUnavailable { .. } => {
                    // Placeholder color stays; extraction failure is never a
                    // user-visible error.
                }
                Message::DetailLoaded(record) => {
                    if let Some(detail) = self.state.detail.as_mut() {
                        if detail.name == record.name {
                            detail.record = Some(record);
                        }
                    }
                }
                Message::DetailFailed { name, message } => {
                    if let Some(detail) = self.state.detail.as_mut() {
                        if detail.name == name && detail.record.is_none() {
                            detail.error = Some(message);
                        }
                    }
                }
            }
        }
    }
}

#[derive(Clone)]
pub struct CommandBus {
    sender: mpsc::Sender<Message>,
    handle: Handle,
}

impl CommandBus {
    pub fn new(sender: mpsc::Sender<Message>, handle: Handle) -> Self {
        Self { sender, handle }
    }

    pub fn spawn_async<F, Fut>(&self, task: F)
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: std::future::Future<Output = Message> + Send + 'static,
    {
        let sender = self.sender.clone();
        self.handle.spawn(async move {
            let message = task().await;
            let _ = sender.send(message);
        });
    }

    pub fn send(&self, message: Message) {
        let _ = self.sender.send(message);
    }
}

#[derive(Debug, Clone)]
pub enum Message {
    PageLoaded(Page),
    PageFailed { key: u32, message: String },
    ColorExtracted { name: String, argb: u32 },
    ColorUnavailable { name: String },
    DetailLoaded(EntityDetail),
    DetailFailed { name: String, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    Quit,
    OpenDetail { name: String, argb: Option<u32> },
    CloseDetail,
    Noop,
}
