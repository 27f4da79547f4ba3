//! The engine context: one per page load.
//!
//! Owns the configuration snapshot, the trigger arbiter, the window
//! collection and the in-flight interaction, and routes every semantic input
//! event to the right component. Hosts call [`Engine::handle_event`] from
//! their event handlers, [`Engine::tick`] whenever a deadline may have
//! passed, and drain [`Engine::take_effects`] after each call.
//!
//! Every entry point takes `now` explicitly; the engine never reads a wall
//! clock, which keeps timer behavior deterministic under test.

use std::time::{Duration, Instant};

use url::Url;

use crate::arbiter::{ClickOutcome, OpenRequest, TriggerArbiter};
use crate::config::{TriggerConfig, TriggerMode};
use crate::effects::Effect;
use crate::error::EngineError;
use crate::events::{ChromeButton, InputEvent};
use crate::geometry::{PointPx, RectPx, Viewport};
use crate::messages::{
    Ack, ControlMessage, FrameEnvelope, FrameMessage, PositionData, SelectedTextData,
    ShowSummaryData,
};
use crate::search::{self, SearchSettings};
use crate::theme::{self, Palette};
use crate::window::{InteractionController, OpenParams, PreviewManager};

/// Debounce for persisting last-used geometry after a drag/resize.
pub const GEOMETRY_FLUSH_MS: u64 = 300;

/// Facts about the page the engine is attached to, supplied by the host.
#[derive(Debug, Clone)]
pub struct PageContext {
    pub viewport: Viewport,
    /// URL of the host page itself, checked against the site blacklist.
    pub page_url: String,
    /// True when this engine instance runs inside an embedded preview frame;
    /// such instances forward intents instead of opening nested previews.
    pub embedded: bool,
    /// Shared capability token validated on every frame-channel envelope.
    pub frame_token: String,
    /// Whether the host managed to initialize the isolation surface. When
    /// false the preview feature is disabled for this page load.
    pub surface_ready: bool,
}

pub struct Engine {
    config: TriggerConfig,
    search: SearchSettings,
    palette: Palette,
    viewport: Viewport,
    page_host: Option<String>,
    embedded: bool,
    frame_token: String,
    arbiter: TriggerArbiter,
    windows: PreviewManager,
    interaction: InteractionController,
    last_geometry: Option<RectPx>,
    geometry_flush: Option<Instant>,
    effects: Vec<Effect>,
}

impl Engine {
    /// Attach an engine to a page. Fails only when the isolation surface
    /// could not be initialized; the caller must treat that as "no previews
    /// here" rather than an error worth surfacing to the page.
    pub fn attach(
        context: PageContext,
        config: TriggerConfig,
        search: SearchSettings,
    ) -> Result<Self, EngineError> {
        if !context.surface_ready {
            return Err(EngineError::Surface(context.page_url));
        }
        let page_host = Url::parse(&context.page_url)
            .ok()
            .and_then(|url| url.host_str().map(str::to_string));
        let config = config.sanitized();
        let palette = theme::resolve(config.preview_theme, config.custom_theme_colors.as_ref());
        Ok(Self {
            config,
            search,
            palette,
            viewport: context.viewport,
            page_host,
            embedded: context.embedded,
            frame_token: context.frame_token,
            arbiter: TriggerArbiter::new(),
            windows: PreviewManager::new(),
            interaction: InteractionController::new(),
            last_geometry: None,
            geometry_flush: None,
            effects: Vec::new(),
        })
    }

    pub fn config(&self) -> &TriggerConfig {
        &self.config
    }

    pub fn windows(&self) -> &PreviewManager {
        &self.windows
    }

    pub fn palette(&self) -> Palette {
        self.palette
    }

    /// Seed the last-used geometry from the host's store at startup.
    pub fn set_last_geometry(&mut self, rect: Option<RectPx>) {
        self.last_geometry = rect;
    }

    /// Drain the commands produced since the last drain. Hosts apply them in
    /// order after every call into the engine.
    pub fn take_effects(&mut self) -> Vec<Effect> {
        std::mem::take(&mut self.effects)
    }

    /// The earliest instant at which `tick` has scheduled work, for hosts
    /// that sleep between events.
    pub fn next_deadline(&self) -> Option<Instant> {
        [
            self.arbiter.next_deadline(),
            self.windows.next_deadline(),
            self.interaction.next_deadline(),
            self.geometry_flush,
        ]
        .into_iter()
        .flatten()
        .min()
    }

    /// Whether trigger arbitration runs on this page at all.
    fn triggers_enabled(&self) -> bool {
        if self.config.trigger_mode == TriggerMode::Disabled {
            return false;
        }
        match &self.page_host {
            Some(host) => !self.config.blacklist_blocks(host),
            None => true,
        }
    }

    pub fn handle_event(&mut self, event: InputEvent, now: Instant) {
        match event {
            InputEvent::PointerEnteredLink { anchor, at } => {
                if self.triggers_enabled() {
                    self.arbiter.pointer_entered_link(
                        anchor,
                        at,
                        &self.config,
                        now,
                        &mut self.effects,
                    );
                }
            }
            InputEvent::PointerLeftLink { anchor, at } => {
                self.arbiter.pointer_left_link(&anchor, at, now);
            }
            InputEvent::PointerMoved { at } => {
                self.arbiter.pointer_moved(at);
                self.interaction.pointer_moved(&self.windows, at);
            }
            InputEvent::PointerDown { at, button, anchor } => {
                if self.triggers_enabled() {
                    self.arbiter.pointer_down(
                        at,
                        button,
                        anchor.as_ref(),
                        &self.config,
                        now,
                        &mut self.effects,
                    );
                }
            }
            InputEvent::PointerUp { at, button } => {
                if let Some((_, rect)) =
                    self.interaction
                        .pointer_up(&mut self.windows, now, &mut self.effects)
                {
                    self.remember_geometry(rect, now);
                }
                self.arbiter.pointer_up(at, button, &mut self.effects);
            }
            InputEvent::Click { at, anchor } => {
                let outcome = if self.triggers_enabled() {
                    self.arbiter
                        .click(at, anchor.as_ref(), &self.config, now, &mut self.effects)
                } else {
                    ClickOutcome::PassThrough
                };
                match outcome {
                    ClickOutcome::Suppressed => {}
                    ClickOutcome::Open(request) => self.request_open(request, None),
                    ClickOutcome::PassThrough => {
                        self.windows.outside_click(at, now, &mut self.effects);
                    }
                }
            }
            InputEvent::DragEnded {
                at,
                anchor,
                selected_text,
            } => {
                if !self.triggers_enabled() {
                    return;
                }
                if let Some(request) = self.arbiter.drag_ended(at, anchor.as_ref(), &self.config) {
                    self.request_open(request, None);
                } else if let Some(text) = selected_text {
                    self.open_for_text(&text, Some(at));
                }
            }
            InputEvent::ModifierDown(key) => {
                if key == self.config.custom_trigger_key {
                    self.arbiter
                        .modifier_down(&self.config, now, &mut self.effects);
                }
            }
            InputEvent::ModifierUp(key) => {
                if key == self.config.custom_trigger_key {
                    self.arbiter.modifier_up(&mut self.effects);
                }
            }
            InputEvent::EscapePressed => {
                if self.embedded {
                    self.forward_to_parent(FrameMessage::ClosePreview);
                } else {
                    self.windows.escape(now, &mut self.effects);
                }
            }
            InputEvent::VisibilityChanged { hidden } => {
                if hidden {
                    self.arbiter.visibility_lost(&mut self.effects);
                }
            }
            InputEvent::WindowBlurred => {
                self.arbiter.window_blurred(&mut self.effects);
            }
            InputEvent::ViewportResized(viewport) => {
                self.viewport = viewport;
            }
            InputEvent::AnimationFrame => {
                self.interaction
                    .animation_frame(&mut self.windows, &mut self.effects);
            }
            InputEvent::WindowPointerEntered { id } => {
                self.windows.pointer_entered(id, &mut self.effects);
            }
            InputEvent::WindowPointerLeft { id } => {
                self.windows.pointer_left(id, &mut self.effects);
            }
            InputEvent::HeaderPointerDown { id, at } => {
                self.windows.focus(id, &mut self.effects);
                self.interaction.begin_drag(&mut self.windows, id, at);
            }
            InputEvent::ResizeHandleDown { id, corner, at } => {
                self.windows.focus(id, &mut self.effects);
                self.interaction
                    .begin_resize(&mut self.windows, id, corner, at);
            }
            InputEvent::ChromeButtonPressed { id, button } => match button {
                ChromeButton::Pin => self.windows.toggle_pin(id, &mut self.effects),
                ChromeButton::Refresh => self.windows.refresh(id, &mut self.effects),
                ChromeButton::OpenExternal => {
                    self.windows.open_external(id, now, &mut self.effects)
                }
                ChromeButton::Close => self.windows.close(id, now, &mut self.effects),
                ChromeButton::VideoToggle => self.windows.toggle_video(id, &mut self.effects),
            },
            InputEvent::EmbedLoaded { id, location } => {
                self.windows.embed_loaded(id, location, &mut self.effects);
            }
            InputEvent::EmbedFailed { id } => {
                self.windows.embed_failed(id, &mut self.effects);
            }
        }
    }

    /// Poll every deadline the engine owns. Hosts call this from their idle
    /// loop or a timer scheduled at `next_deadline`.
    pub fn tick(&mut self, now: Instant) {
        // Poll the window collection before the arbiter can mount anything,
        // so a window opened this tick arms its dismissal one poll later.
        self.windows.tick(now, &mut self.effects);
        self.interaction
            .tick(&mut self.windows, now, &mut self.effects);
        if let Some(request) = self.arbiter.tick(now, &mut self.effects) {
            self.request_open(request, None);
        }
        if let Some(deadline) = self.geometry_flush
            && now >= deadline
        {
            self.geometry_flush = None;
            if let Some(rect) = self.last_geometry {
                self.effects.push(Effect::PersistGeometry { rect });
            }
        }
    }

    /// Handle a control-channel message, already decoded.
    pub fn handle_control(&mut self, message: ControlMessage, now: Instant) -> Ack {
        match message {
            ControlMessage::UpdateLinkPreviewSettings { settings } => {
                self.apply_config(settings.sanitized());
                Ack::ok()
            }
            ControlMessage::UpdateCustomTheme { colors } => {
                let mut config = self.config.clone();
                config.preview_theme = theme::ThemePref::Custom;
                config.custom_theme_colors = Some(colors);
                self.apply_config(config);
                Ack::ok()
            }
            ControlMessage::UpdateTextSearchSettings { settings } => {
                self.search = settings;
                Ack::ok()
            }
            ControlMessage::SearchSelectedText { selected_text } => {
                let text = selected_text.trim().to_string();
                if text.is_empty() {
                    return Ack::failure("empty selection");
                }
                let url = search::search_url(&self.search, &text);
                self.open_preview(url, None, None, None);
                Ack::ok()
            }
            ControlMessage::TranslateSelectedText { selected_text } => {
                let text = selected_text.trim().to_string();
                if text.is_empty() {
                    return Ack::failure("empty selection");
                }
                let url = search::translate_url(&self.search, &text);
                self.open_preview(url, None, None, None);
                Ack::ok()
            }
        }
    }

    /// Handle a control-channel message straight off the wire. Malformed
    /// JSON produces a failure ack, never an error.
    pub fn handle_control_json(&mut self, json: &str, now: Instant) -> Ack {
        match serde_json::from_str::<ControlMessage>(json) {
            Ok(message) => self.handle_control(message, now),
            Err(err) => Ack::failure(err.to_string()),
        }
    }

    /// Handle an envelope received on the window-messaging channel. Only the
    /// top-level engine acts on these, and only after the tag and capability
    /// token check out — the channel is otherwise unauthenticated.
    pub fn handle_frame_envelope(&mut self, envelope: FrameEnvelope, now: Instant) -> Ack {
        if self.embedded {
            return Ack::failure("not a top-level context");
        }
        if !envelope.is_trusted(&self.frame_token) {
            tracing::debug!(source = %envelope.source, "rejected untrusted frame envelope");
            return Ack::failure("untrusted envelope");
        }
        match envelope.message {
            FrameMessage::ShowLinkSummary { data } => {
                let origin = data
                    .position_data
                    .map(|position| PointPx::new(position.client_x, position.client_y));
                // reconstruct a synthetic anchor from the forwarded URL
                self.open_preview(data.url, origin, None, data.error_tip);
                Ack::ok()
            }
            FrameMessage::ClosePreview => {
                self.windows.escape(now, &mut self.effects);
                Ack::ok()
            }
            FrameMessage::SearchSelectedText { data } => self.handle_control(
                ControlMessage::SearchSelectedText {
                    selected_text: data.selected_text,
                },
                now,
            ),
            FrameMessage::TranslateSelectedText { data } => self.handle_control(
                ControlMessage::TranslateSelectedText {
                    selected_text: data.selected_text,
                },
                now,
            ),
        }
    }

    fn apply_config(&mut self, config: TriggerConfig) {
        // Swapped as a unit; a pending trigger armed under the old snapshot
        // must not fire under the new one.
        self.arbiter.visibility_lost(&mut self.effects);
        self.palette = theme::resolve(config.preview_theme, config.custom_theme_colors.as_ref());
        self.config = config;
        tracing::debug!(mode = ?self.config.trigger_mode, "settings replaced");
    }

    fn request_open(&mut self, request: OpenRequest, error_tip: Option<String>) {
        self.open_preview(request.url, request.origin, request.anchor_rect, error_tip);
    }

    /// Dragged or selected text: a bare URL previews directly, anything else
    /// routes through the configured search engine.
    fn open_for_text(&mut self, text: &str, origin: Option<PointPx>) {
        let url = match search::detect_url(text) {
            Some(url) => url,
            None => search::search_url(&self.search, text),
        };
        self.open_preview(url, origin, None, None);
    }

    fn open_preview(
        &mut self,
        url: String,
        origin: Option<PointPx>,
        anchor_rect: Option<RectPx>,
        error_tip: Option<String>,
    ) {
        if self.embedded {
            // Never nest previews; hand the intent to the top-level engine
            // with the pointer position for placement.
            self.forward_to_parent(FrameMessage::ShowLinkSummary {
                data: ShowSummaryData {
                    url,
                    error_tip,
                    position_data: origin.map(|at| PositionData {
                        client_x: at.x,
                        client_y: at.y,
                    }),
                },
            });
            return;
        }
        let embed_url = normalize_embed_url(&url);
        self.windows.open(
            OpenParams {
                url,
                embed_url,
                origin,
                anchor_rect,
                error_tip,
            },
            &self.config,
            self.palette,
            self.viewport,
            self.last_geometry,
            &mut self.effects,
        );
    }

    fn forward_to_parent(&mut self, message: FrameMessage) {
        let envelope = FrameEnvelope::new(self.frame_token.clone(), message);
        self.effects.push(Effect::ForwardToParent(envelope));
    }

    fn remember_geometry(&mut self, rect: RectPx, now: Instant) {
        self.last_geometry = Some(rect);
        self.geometry_flush = Some(now + Duration::from_millis(GEOMETRY_FLUSH_MS));
    }

    /// Build a search envelope for an embedded engine that wants the
    /// top-level context to run a text search.
    pub fn forward_selected_text(&mut self, text: &str, translate: bool) {
        let data = SelectedTextData {
            selected_text: text.to_string(),
        };
        let message = if translate {
            FrameMessage::TranslateSelectedText { data }
        } else {
            FrameMessage::SearchSelectedText { data }
        };
        self.forward_to_parent(message);
    }
}

/// Known scheme upgrades applied before a URL becomes an embed source.
fn normalize_embed_url(url: &str) -> String {
    match url.strip_prefix("http://mp.weixin.qq.com") {
        Some(rest) => format!("https://mp.weixin.qq.com{rest}"),
        None => url.to_string(),
    }
}
