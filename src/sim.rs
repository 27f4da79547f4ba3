//! Terminal simulator: a fake page of links driven by real mouse input.
//!
//! This is the crate's runnable host adapter. Terminal cells stand in for
//! CSS pixels at a fixed scale; crossterm mouse/key events are translated
//! into semantic [`InputEvent`]s, and the engine's effect stream is applied
//! to a small retained view that ratatui renders each frame.

use std::io;
use std::time::{Duration, Instant};

use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyModifiers,
    MouseButton, MouseEvent, MouseEventKind,
};
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::{execute, terminal};
use ratatui::Terminal;
use ratatui::backend::CrosstermBackend;
use ratatui::layout::Rect;
use ratatui::style::{Color, Modifier, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Paragraph};

use crate::config::TriggerConfig;
use crate::effects::{Effect, WindowInit, ZRank};
use crate::engine::{Engine, PageContext};
use crate::events::{AnchorTarget, ChromeButton, InputEvent, PointerButton, ResizeCorner};
use crate::geometry::{PointPx, RectPx, Viewport};
use crate::persist::GeometryStore;
use crate::search::SearchSettings;
use crate::window::WindowId;

/// Cell-to-pixel scale. A terminal cell is roughly twice as tall as wide, so
/// the simulated viewport keeps believable CSS-pixel proportions.
const PX_PER_COL: i32 = 10;
const PX_PER_ROW: i32 = 20;

/// Simulated embeds "load" after this long.
const EMBED_LOAD_MS: u64 = 600;

const FRAME_INTERVAL: Duration = Duration::from_millis(16);

struct SimLink {
    label: &'static str,
    url: &'static str,
    col: u16,
    row: u16,
}

fn demo_links() -> Vec<SimLink> {
    vec![
        SimLink {
            label: "Rust language homepage",
            url: "https://www.rust-lang.org/",
            col: 4,
            row: 4,
        },
        SimLink {
            label: "Wikipedia: Window manager",
            url: "https://en.wikipedia.org/wiki/Window_manager",
            col: 4,
            row: 6,
        },
        SimLink {
            label: "A YouTube watch page",
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            col: 4,
            row: 8,
        },
        SimLink {
            label: "A Bilibili watch page",
            url: "https://www.bilibili.com/video/BV1GJ411x7h7",
            col: 4,
            row: 10,
        },
        SimLink {
            label: "Example article",
            url: "https://example.org/articles/42",
            col: 4,
            row: 12,
        },
    ]
}

fn link_rect_px(link: &SimLink) -> RectPx {
    RectPx::new(
        i32::from(link.col) * PX_PER_COL,
        i32::from(link.row) * PX_PER_ROW,
        link.label.len() as i32 * PX_PER_COL,
        PX_PER_ROW,
    )
}

fn cell_to_px(column: u16, row: u16) -> PointPx {
    PointPx::new(
        i32::from(column) * PX_PER_COL + PX_PER_COL / 2,
        i32::from(row) * PX_PER_ROW + PX_PER_ROW / 2,
    )
}

fn px_rect_to_cells(rect: RectPx) -> Rect {
    Rect {
        x: (rect.left / PX_PER_COL).max(0) as u16,
        y: (rect.top / PX_PER_ROW).max(0) as u16,
        width: (rect.width / PX_PER_COL).max(3) as u16,
        height: (rect.height / PX_PER_ROW).max(3) as u16,
    }
}

/// Retained view of one mounted window, kept in sync from the effect stream.
struct SimWindow {
    id: WindowId,
    rect: RectPx,
    rank: ZRank,
    overlay: bool,
    pinned: bool,
    loading: bool,
    address: String,
    video_mode: bool,
    video_available: bool,
    closing: bool,
    source: String,
    error_tip: Option<String>,
}

impl SimWindow {
    fn new(init: &WindowInit) -> Self {
        Self {
            id: init.id,
            rect: init.rect,
            rank: ZRank::Active,
            overlay: false,
            pinned: false,
            loading: true,
            address: crate::window::display_url(&init.url),
            video_mode: false,
            video_available: init.video_available,
            closing: false,
            source: init.embed_url.clone(),
            error_tip: init.error_tip.clone(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ChromeZone {
    Header,
    Button(ChromeButton),
    ResizeSw,
    ResizeSe,
    Body,
}

struct Press {
    anchor: Option<AnchorTarget>,
    moved: bool,
}

pub struct SimOptions {
    pub config: TriggerConfig,
    pub search: SearchSettings,
    pub store: Option<GeometryStore>,
}

pub struct Simulator {
    engine: Engine,
    links: Vec<SimLink>,
    windows: Vec<SimWindow>,
    spinner: Option<PointPx>,
    hovered_link: Option<usize>,
    hovered_window: Option<WindowId>,
    press: Option<Press>,
    modifier_down: bool,
    pending_loads: Vec<(WindowId, Instant, String)>,
    store: Option<GeometryStore>,
    status: String,
}

impl Simulator {
    pub fn new(options: SimOptions, viewport: Viewport) -> Result<Self, crate::EngineError> {
        let mut engine = Engine::attach(
            PageContext {
                viewport,
                page_url: "https://simulator.invalid/".into(),
                embedded: false,
                frame_token: "sim-token".into(),
                surface_ready: true,
            },
            options.config,
            options.search,
        )?;
        if let Some(store) = &options.store {
            engine.set_last_geometry(store.load());
        }
        Ok(Self {
            engine,
            links: demo_links(),
            windows: Vec::new(),
            spinner: None,
            hovered_link: None,
            hovered_window: None,
            press: None,
            modifier_down: false,
            pending_loads: Vec::new(),
            store: options.store,
            status: String::from("hover/drag/click links; a: hold modifier, Esc: close, q: quit"),
        })
    }

    fn dispatch(&mut self, event: InputEvent, now: Instant) {
        self.engine.handle_event(event, now);
        self.apply_effects(now);
    }

    /// One simulator frame: poll timers, drain coalesced geometry, complete
    /// fake embed loads.
    pub fn frame(&mut self, now: Instant) {
        self.engine.tick(now);
        self.apply_effects(now);
        self.engine.handle_event(InputEvent::AnimationFrame, now);
        self.apply_effects(now);

        let due: Vec<(WindowId, String)> = self
            .pending_loads
            .iter()
            .filter(|(_, at, _)| now >= *at)
            .map(|(id, _, url)| (*id, url.clone()))
            .collect();
        self.pending_loads.retain(|(_, at, _)| now < *at);
        for (id, url) in due {
            self.dispatch(
                InputEvent::EmbedLoaded {
                    id,
                    location: Some(url),
                },
                now,
            );
        }
    }

    /// Translate a terminal event. Returns true when the simulator should
    /// exit.
    pub fn handle_terminal_event(&mut self, event: Event, now: Instant) -> bool {
        match event {
            Event::Key(key) => self.handle_key(key, now),
            Event::Mouse(mouse) => {
                self.handle_mouse(mouse, now);
                false
            }
            Event::Resize(columns, rows) => {
                let viewport = Viewport::new(
                    i32::from(columns) * PX_PER_COL,
                    i32::from(rows) * PX_PER_ROW,
                );
                self.dispatch(InputEvent::ViewportResized(viewport), now);
                false
            }
            Event::FocusLost => {
                self.modifier_down = false;
                self.dispatch(InputEvent::WindowBlurred, now);
                false
            }
            _ => false,
        }
    }

    fn handle_key(&mut self, key: KeyEvent, now: Instant) -> bool {
        match key.code {
            KeyCode::Char('q') => return true,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return true,
            KeyCode::Esc => self.dispatch(InputEvent::EscapePressed, now),
            // Terminals deliver no key-up, so `a` toggles the configured
            // modifier instead of holding it.
            KeyCode::Char('a') => {
                let modifier = self.engine.config().custom_trigger_key;
                self.modifier_down = !self.modifier_down;
                let event = if self.modifier_down {
                    InputEvent::ModifierDown(modifier)
                } else {
                    InputEvent::ModifierUp(modifier)
                };
                self.status = format!(
                    "modifier {}",
                    if self.modifier_down { "held" } else { "released" }
                );
                self.dispatch(event, now);
            }
            KeyCode::Char('v') => {
                self.dispatch(InputEvent::VisibilityChanged { hidden: true }, now);
                self.dispatch(InputEvent::VisibilityChanged { hidden: false }, now);
                self.status = "visibility blinked (pending triggers cancelled)".into();
            }
            _ => {}
        }
        false
    }

    fn handle_mouse(&mut self, mouse: MouseEvent, now: Instant) {
        let at = cell_to_px(mouse.column, mouse.row);
        match mouse.kind {
            MouseEventKind::Moved | MouseEventKind::Drag(MouseButton::Left) => {
                if let Some(press) = &mut self.press {
                    press.moved = true;
                }
                self.dispatch(InputEvent::PointerMoved { at }, now);
                self.update_hover(mouse.column, mouse.row, at, now);
            }
            MouseEventKind::Down(MouseButton::Left) => {
                match self.chrome_zone_at(mouse.column, mouse.row) {
                    Some((id, ChromeZone::Header)) => {
                        self.dispatch(InputEvent::HeaderPointerDown { id, at }, now);
                    }
                    Some((id, ChromeZone::Button(button))) => {
                        self.dispatch(InputEvent::ChromeButtonPressed { id, button }, now);
                    }
                    Some((id, ChromeZone::ResizeSe)) => {
                        self.dispatch(
                            InputEvent::ResizeHandleDown {
                                id,
                                corner: ResizeCorner::SouthEast,
                                at,
                            },
                            now,
                        );
                    }
                    Some((id, ChromeZone::ResizeSw)) => {
                        self.dispatch(
                            InputEvent::ResizeHandleDown {
                                id,
                                corner: ResizeCorner::SouthWest,
                                at,
                            },
                            now,
                        );
                    }
                    Some((_, ChromeZone::Body)) => {
                        self.press = Some(Press {
                            anchor: None,
                            moved: false,
                        });
                        self.dispatch(
                            InputEvent::PointerDown {
                                at,
                                button: PointerButton::Primary,
                                anchor: None,
                            },
                            now,
                        );
                    }
                    None => {
                        let anchor = self.hovered_link.map(|index| self.anchor_for(index));
                        self.press = Some(Press {
                            anchor: anchor.clone(),
                            moved: false,
                        });
                        self.dispatch(
                            InputEvent::PointerDown {
                                at,
                                button: PointerButton::Primary,
                                anchor,
                            },
                            now,
                        );
                    }
                }
            }
            MouseEventKind::Up(MouseButton::Left) => {
                self.dispatch(
                    InputEvent::PointerUp {
                        at,
                        button: PointerButton::Primary,
                    },
                    now,
                );
                if let Some(press) = self.press.take() {
                    if press.moved && press.anchor.is_some() {
                        self.dispatch(
                            InputEvent::DragEnded {
                                at,
                                anchor: press.anchor,
                                selected_text: None,
                            },
                            now,
                        );
                    } else if !press.moved {
                        self.dispatch(
                            InputEvent::Click {
                                at,
                                anchor: press.anchor,
                            },
                            now,
                        );
                    }
                }
            }
            _ => {}
        }
    }

    fn anchor_for(&self, index: usize) -> AnchorTarget {
        let link = &self.links[index];
        AnchorTarget::new(link.url, link_rect_px(link))
    }

    fn update_hover(&mut self, column: u16, row: u16, at: PointPx, now: Instant) {
        let window_hit = self.window_at(column, row);
        if window_hit != self.hovered_window {
            if let Some(id) = self.hovered_window {
                self.dispatch(InputEvent::WindowPointerLeft { id }, now);
            }
            if let Some(id) = window_hit {
                self.dispatch(InputEvent::WindowPointerEntered { id }, now);
            }
            self.hovered_window = window_hit;
        }

        let link_hit = if window_hit.is_none() {
            self.links
                .iter()
                .position(|link| link_rect_px(link).contains(at))
        } else {
            None
        };
        if link_hit != self.hovered_link {
            if let Some(index) = self.hovered_link {
                let anchor = self.anchor_for(index);
                self.dispatch(InputEvent::PointerLeftLink { anchor, at }, now);
            }
            if let Some(index) = link_hit {
                let anchor = self.anchor_for(index);
                self.dispatch(InputEvent::PointerEnteredLink { anchor, at }, now);
            }
            self.hovered_link = link_hit;
        }
    }

    /// Topmost window under a cell: the active window wins, then later
    /// mounts.
    fn window_at(&self, column: u16, row: u16) -> Option<WindowId> {
        let mut hit = None;
        for window in &self.windows {
            let cells = px_rect_to_cells(window.rect);
            let inside = column >= cells.x
                && column < cells.x + cells.width
                && row >= cells.y
                && row < cells.y + cells.height;
            if inside && (hit.is_none() || window.rank == ZRank::Active) {
                hit = Some(window.id);
            }
        }
        hit
    }

    fn chrome_zone_at(&self, column: u16, row: u16) -> Option<(WindowId, ChromeZone)> {
        let id = self.window_at(column, row)?;
        let window = self.windows.iter().find(|window| window.id == id)?;
        let cells = px_rect_to_cells(window.rect);
        let right = cells.x + cells.width - 1;
        let bottom = cells.y + cells.height - 1;
        let zone = if row == cells.y {
            // Buttons sit at the right end of the header row, two cells each:
            // pin, refresh, open-external, video, close.
            let buttons = [
                ChromeButton::Pin,
                ChromeButton::Refresh,
                ChromeButton::OpenExternal,
                ChromeButton::VideoToggle,
                ChromeButton::Close,
            ];
            let from_right = right.saturating_sub(column);
            let slot = (from_right / 2) as usize;
            if from_right < 10 && slot < buttons.len() {
                ChromeZone::Button(buttons[buttons.len() - 1 - slot])
            } else {
                ChromeZone::Header
            }
        } else if row == bottom && column == cells.x {
            ChromeZone::ResizeSw
        } else if row == bottom && column == right {
            ChromeZone::ResizeSe
        } else {
            ChromeZone::Body
        };
        Some((id, zone))
    }

    fn apply_effects(&mut self, now: Instant) {
        for effect in self.engine.take_effects() {
            match effect {
                Effect::ShowSpinner { at } => self.spinner = Some(at),
                Effect::HideSpinner => self.spinner = None,
                Effect::MountWindow(init) => {
                    self.pending_loads.push((
                        init.id,
                        now + Duration::from_millis(EMBED_LOAD_MS),
                        init.embed_url.clone(),
                    ));
                    self.windows.push(SimWindow::new(&init));
                }
                Effect::BeginClose { id } => {
                    if let Some(window) = self.window_mut(id) {
                        window.closing = true;
                    }
                }
                Effect::UnmountWindow { id } => {
                    self.windows.retain(|window| window.id != id);
                    if self.hovered_window == Some(id) {
                        self.hovered_window = None;
                    }
                }
                Effect::SetWindowGeometry { id, rect } => {
                    if let Some(window) = self.window_mut(id) {
                        window.rect = rect;
                    }
                }
                Effect::SetZRank { id, rank } => {
                    if let Some(window) = self.window_mut(id) {
                        window.rank = rank;
                    }
                }
                Effect::SetOverlayVisible { id, visible } => {
                    if let Some(window) = self.window_mut(id) {
                        window.overlay = visible;
                    }
                }
                Effect::SetPinned { id, pinned } => {
                    if let Some(window) = self.window_mut(id) {
                        window.pinned = pinned;
                    }
                }
                Effect::SetLoadProgress { id, loading } => {
                    if let Some(window) = self.window_mut(id) {
                        window.loading = loading;
                    }
                }
                Effect::SetAddress { id, url } => {
                    if let Some(window) = self.window_mut(id) {
                        window.address = url;
                    }
                }
                Effect::SetVideoMode { id, alternate } => {
                    if let Some(window) = self.window_mut(id) {
                        window.video_mode = alternate;
                    }
                }
                Effect::NavigateEmbed { id, url } => {
                    if let Some(window) = self.window_mut(id) {
                        window.source = url.clone();
                    }
                    if url != "about:blank" {
                        self.pending_loads
                            .push((id, now + Duration::from_millis(EMBED_LOAD_MS), url));
                    }
                }
                Effect::SuppressNativeNavigation => {
                    self.status = "native navigation suppressed".into();
                }
                Effect::InstallClickSuppressor => {
                    self.status = "click suppressor armed".into();
                }
                Effect::ReleaseClickSuppressor => {}
                Effect::OpenExternal { url } => {
                    self.status = format!("opening externally: {url}");
                    if let Err(err) = webbrowser::open(&url) {
                        tracing::debug!(%url, %err, "external open failed");
                    }
                }
                Effect::PersistGeometry { rect } => {
                    if let Some(store) = &self.store
                        && let Err(err) = store.save(rect)
                    {
                        tracing::debug!(%err, "geometry persist failed");
                    }
                }
                Effect::ForwardToParent(envelope) => {
                    tracing::debug!(?envelope, "top-level engine produced a relay envelope");
                }
            }
        }
    }

    fn window_mut(&mut self, id: WindowId) -> Option<&mut SimWindow> {
        self.windows.iter_mut().find(|window| window.id == id)
    }

    fn render(&self, frame: &mut ratatui::Frame<'_>) {
        let area = frame.area();
        let title = Paragraph::new(Line::from(vec![
            Span::styled("linkpeek simulator", Style::default().add_modifier(Modifier::BOLD)),
            Span::raw("  —  "),
            Span::raw(format!("mode: {:?}", self.engine.config().trigger_mode)),
        ]));
        frame.render_widget(title, Rect { height: 1, ..area });

        for (index, link) in self.links.iter().enumerate() {
            let hovered = self.hovered_link == Some(index);
            let style = if hovered {
                Style::default()
                    .fg(Color::LightBlue)
                    .add_modifier(Modifier::UNDERLINED | Modifier::BOLD)
            } else {
                Style::default()
                    .fg(Color::Blue)
                    .add_modifier(Modifier::UNDERLINED)
            };
            let rect = Rect {
                x: link.col,
                y: link.row,
                width: (link.label.len() as u16).min(area.width.saturating_sub(link.col)),
                height: 1,
            };
            if rect.width > 0 && link.row < area.height {
                frame.render_widget(Paragraph::new(Span::styled(link.label, style)), rect);
            }
        }

        // background windows first so the active one paints on top
        let mut order: Vec<&SimWindow> = self.windows.iter().collect();
        order.sort_by_key(|window| window.rank == ZRank::Active);
        for window in order {
            self.render_window(frame, window, area);
        }

        if let Some(at) = self.spinner {
            let rect = Rect {
                x: ((at.x / PX_PER_COL).max(0) as u16).min(area.width.saturating_sub(1)),
                y: ((at.y / PX_PER_ROW).max(0) as u16).min(area.height.saturating_sub(1)),
                width: 1,
                height: 1,
            };
            frame.render_widget(
                Paragraph::new(Span::styled("◌", Style::default().fg(Color::Yellow))),
                rect,
            );
        }

        let status_rect = Rect {
            x: 0,
            y: area.height.saturating_sub(1),
            width: area.width,
            height: 1,
        };
        frame.render_widget(
            Paragraph::new(Span::styled(
                self.status.as_str(),
                Style::default().fg(Color::DarkGray),
            )),
            status_rect,
        );
    }

    fn render_window(&self, frame: &mut ratatui::Frame<'_>, window: &SimWindow, area: Rect) {
        let cells = px_rect_to_cells(window.rect).intersection(area);
        if cells.width < 3 || cells.height < 3 {
            return;
        }
        let active = window.rank == ZRank::Active;
        let border_style = if window.closing {
            Style::default().fg(Color::DarkGray)
        } else if active {
            Style::default().fg(Color::LightCyan)
        } else {
            Style::default().fg(Color::Gray)
        };
        let mut title = window.address.clone();
        if window.pinned {
            title.push_str(" ⏍");
        }
        let buttons = if window.video_available {
            " P  R  O  V  X"
        } else {
            " P  R  O  -  X"
        };
        frame.render_widget(Clear, cells);
        let block = Block::default()
            .borders(Borders::ALL)
            .border_style(border_style)
            .title(title)
            .title_top(Line::from(buttons).right_aligned());

        let mut lines = vec![Line::from(format!("⌁ {}", window.source))];
        if window.loading {
            lines.push(Line::from(Span::styled(
                "▰▰▰▱▱▱▱▱ loading…",
                Style::default().fg(Color::Yellow),
            )));
        }
        if let Some(tip) = &window.error_tip {
            lines.push(Line::from(Span::styled(
                tip.as_str(),
                Style::default().fg(Color::Red),
            )));
        }
        if window.video_mode {
            lines.push(Line::from(Span::styled(
                "◉ player embed",
                Style::default().fg(Color::Green),
            )));
        }
        if window.overlay {
            lines.push(Line::from(Span::styled(
                "overlay visible",
                Style::default().fg(Color::DarkGray),
            )));
        }
        frame.render_widget(Paragraph::new(lines).block(block), cells);
    }
}

/// Run the interactive simulator until the user quits.
pub fn run(options: SimOptions) -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    terminal::enable_raw_mode()?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let size = terminal.size()?;
    let viewport = Viewport::new(
        i32::from(size.width) * PX_PER_COL,
        i32::from(size.height) * PX_PER_ROW,
    );
    let result = match Simulator::new(options, viewport) {
        Ok(mut simulator) => run_loop(&mut terminal, &mut simulator),
        Err(err) => Err(io::Error::other(err.to_string())),
    };

    terminal::disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        DisableMouseCapture,
        LeaveAlternateScreen
    )?;
    terminal.show_cursor()?;
    result
}

fn run_loop(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    simulator: &mut Simulator,
) -> io::Result<()> {
    loop {
        simulator.frame(Instant::now());
        terminal.draw(|frame| simulator.render(frame))?;
        if event::poll(FRAME_INTERVAL)? {
            let event = event::read()?;
            if simulator.handle_terminal_event(event, Instant::now()) {
                return Ok(());
            }
        }
    }
}

/// Replay a JSON-lines script of [`InputEvent`]s against a fresh engine and
/// print the resulting effect stream, for reproducing reported bugs without
/// a terminal session.
pub fn replay(script: &str, options: SimOptions) -> Result<(), crate::EngineError> {
    let mut engine = Engine::attach(
        PageContext {
            viewport: Viewport::new(1920, 1080),
            page_url: "https://simulator.invalid/".into(),
            embedded: false,
            frame_token: "sim-token".into(),
            surface_ready: true,
        },
        options.config,
        options.search,
    )?;
    let base = Instant::now();
    let mut offset = Duration::ZERO;
    for (index, line) in script.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let event: InputEvent = serde_json::from_str(line)?;
        let now = base + offset;
        engine.tick(now);
        engine.handle_event(event.clone(), now);
        for effect in engine.take_effects() {
            println!("[{index}] {effect:?}");
        }
        // fixed cadence between scripted events keeps replays deterministic
        offset += Duration::from_millis(50);
    }
    // run scheduled deadlines dry so delayed triggers show up in the output
    let mut guard = 0;
    while let Some(deadline) = engine.next_deadline() {
        engine.tick(deadline);
        for effect in engine.take_effects() {
            println!("[timer] {effect:?}");
        }
        guard += 1;
        if guard > 64 {
            break;
        }
    }
    Ok(())
}
