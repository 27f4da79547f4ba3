//! The preview-window collection: creation, z-order, overlays, dismissal.

use std::time::{Duration, Instant};

use crate::config::TriggerConfig;
use crate::effects::{Effect, WindowInit, ZRank};
use crate::geometry::{self, PointPx, RectPx, Viewport};
use crate::theme::Palette;
use crate::video;
use crate::window::{ContentMode, PreviewWindow, WindowId, display_url};

/// Fade-out duration before a closing window is unmounted.
pub const CLOSE_FADE_MS: u64 = 200;

/// Owns every open preview and arbitrates the single active rank.
#[derive(Debug, Default)]
pub struct PreviewManager {
    /// Insertion order is open order; Escape walks it newest-first.
    windows: Vec<PreviewWindow>,
    hovered: Option<WindowId>,
    next_id: u64,
}

/// Inputs for opening one preview.
#[derive(Debug, Clone)]
pub struct OpenParams {
    /// Original target URL (collection key and address display).
    pub url: String,
    /// Normalized URL for the embed; usually equal to `url`.
    pub embed_url: String,
    pub origin: Option<PointPx>,
    pub anchor_rect: Option<RectPx>,
    pub error_tip: Option<String>,
}

impl PreviewManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.windows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.windows.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PreviewWindow> {
        self.windows.iter()
    }

    pub fn get(&self, id: WindowId) -> Option<&PreviewWindow> {
        self.windows.iter().find(|window| window.id() == id)
    }

    pub(crate) fn get_mut(&mut self, id: WindowId) -> Option<&mut PreviewWindow> {
        self.windows.iter_mut().find(|window| window.id() == id)
    }

    pub fn find_by_url(&self, url: &str) -> Option<&PreviewWindow> {
        self.windows
            .iter()
            .find(|window| window.url() == url && !window.is_closing())
    }

    pub fn hovered(&self) -> Option<WindowId> {
        self.hovered
    }

    /// The single window currently holding the active rank, if any.
    pub fn active(&self) -> Option<WindowId> {
        self.windows
            .iter()
            .find(|window| window.rank() == ZRank::Active)
            .map(|window| window.id())
    }

    /// Open a preview for `params.url`, or focus the existing window when the
    /// URL already has one (the URL is the collection key; duplicates would
    /// make `close` ambiguous).
    pub fn open(
        &mut self,
        params: OpenParams,
        config: &TriggerConfig,
        palette: Palette,
        viewport: Viewport,
        last_geometry: Option<RectPx>,
        effects: &mut Vec<Effect>,
    ) -> WindowId {
        if let Some(existing) = self.find_by_url(&params.url) {
            let id = existing.id();
            tracing::debug!(url = %params.url, %id, "re-trigger focuses existing preview");
            self.focus(id, effects);
            return id;
        }

        let id = WindowId(self.next_id);
        self.next_id += 1;

        let size = geometry::preset_size(config.preview_size, last_geometry);
        let rect = geometry::place(
            config.preview_position,
            params.origin,
            size,
            viewport,
            last_geometry,
        );
        let video = video::recognize(&params.url);

        // Demote whatever was active before the new window takes the rank.
        self.demote_all(effects);

        let window = PreviewWindow::new(
            id,
            params.url.clone(),
            params.embed_url.clone(),
            params.anchor_rect,
            rect,
            video.clone(),
        );
        tracing::debug!(url = %params.url, %id, ?rect, "opening preview window");
        self.windows.push(window);

        effects.push(Effect::MountWindow(WindowInit {
            id,
            url: params.url,
            embed_url: params.embed_url,
            rect,
            palette,
            overlay_opacity: config.overlay_opacity,
            video_available: video.is_some(),
            error_tip: params.error_tip,
        }));
        effects.push(Effect::SetZRank {
            id,
            rank: ZRank::Active,
        });
        effects.push(Effect::SetLoadProgress { id, loading: true });
        id
    }

    fn demote_all(&mut self, effects: &mut Vec<Effect>) {
        for window in &mut self.windows {
            if window.rank == ZRank::Active {
                window.rank = ZRank::Background;
                effects.push(Effect::SetZRank {
                    id: window.id(),
                    rank: ZRank::Background,
                });
                effects.push(Effect::SetOverlayVisible {
                    id: window.id(),
                    visible: false,
                });
            }
        }
    }

    /// Promote `id` to the active rank, demoting everything else first so
    /// there is never a moment with two active windows.
    pub fn focus(&mut self, id: WindowId, effects: &mut Vec<Effect>) {
        if self.get(id).is_none() {
            return;
        }
        for window in &mut self.windows {
            if window.id() != id && window.rank == ZRank::Active {
                window.rank = ZRank::Background;
                effects.push(Effect::SetZRank {
                    id: window.id(),
                    rank: ZRank::Background,
                });
                effects.push(Effect::SetOverlayVisible {
                    id: window.id(),
                    visible: false,
                });
            }
        }
        if let Some(window) = self.get_mut(id) {
            window.rank = ZRank::Active;
        }
        effects.push(Effect::SetZRank {
            id,
            rank: ZRank::Active,
        });
    }

    pub fn pointer_entered(&mut self, id: WindowId, effects: &mut Vec<Effect>) {
        if self.get(id).is_none() {
            return;
        }
        self.hovered = Some(id);
        self.focus(id, effects);
        effects.push(Effect::SetOverlayVisible { id, visible: true });
    }

    pub fn pointer_left(&mut self, id: WindowId, effects: &mut Vec<Effect>) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        let Some(window) = self.get(id) else {
            return;
        };
        // Mid-drag/-resize the pointer routinely escapes the window; the
        // overlay stays until the interaction's grace period ends.
        if !window.interacting {
            effects.push(Effect::SetOverlayVisible { id, visible: false });
        }
    }

    /// Pin/unpin. Pinning only changes dismissal eligibility; the overlay
    /// re-evaluates from the current hover state and z-order is untouched.
    pub fn toggle_pin(&mut self, id: WindowId, effects: &mut Vec<Effect>) {
        let hovered = self.hovered == Some(id);
        let Some(window) = self.get_mut(id) else {
            return;
        };
        window.pinned = !window.pinned;
        let pinned = window.pinned;
        tracing::debug!(%id, pinned, "pin toggled");
        effects.push(Effect::SetPinned { id, pinned });
        effects.push(Effect::SetOverlayVisible {
            id,
            visible: hovered,
        });
    }

    /// Reload the embed by reassigning its current source.
    pub fn refresh(&mut self, id: WindowId, effects: &mut Vec<Effect>) {
        let Some(window) = self.get_mut(id) else {
            return;
        };
        window.loading = true;
        let source = window.current_source();
        effects.push(Effect::SetLoadProgress { id, loading: true });
        effects.push(Effect::NavigateEmbed { id, url: source });
    }

    /// Toggle alternate-content mode. A no-op when no video id was
    /// recognized for this URL. The outgoing embed is parked on a blank page
    /// first so background playback stops.
    pub fn toggle_video(&mut self, id: WindowId, effects: &mut Vec<Effect>) {
        let Some(window) = self.get_mut(id) else {
            return;
        };
        if window.video().is_none() {
            return;
        }
        window.mode = match window.mode {
            ContentMode::Normal => ContentMode::AlternateEmbed,
            ContentMode::AlternateEmbed => ContentMode::Normal,
        };
        let alternate = window.mode == ContentMode::AlternateEmbed;
        let source = window.current_source();
        window.loading = true;
        tracing::debug!(%id, alternate, "video mode toggled");
        effects.push(Effect::NavigateEmbed {
            id,
            url: "about:blank".to_string(),
        });
        effects.push(Effect::SetVideoMode { id, alternate });
        effects.push(Effect::NavigateEmbed { id, url: source });
        effects.push(Effect::SetLoadProgress { id, loading: true });
    }

    /// The embed finished loading. Reflect its reported location in the
    /// address display when the host could read it; cross-origin denial
    /// arrives as `None` and keeps the prior address.
    pub fn embed_loaded(
        &mut self,
        id: WindowId,
        location: Option<String>,
        effects: &mut Vec<Effect>,
    ) {
        let Some(window) = self.get_mut(id) else {
            return;
        };
        window.loading = false;
        effects.push(Effect::SetLoadProgress { id, loading: false });
        if let Some(location) = location
            && location != "about:blank"
            && location != window.embed_url()
        {
            effects.push(Effect::SetAddress {
                id,
                url: display_url(&location),
            });
        }
    }

    /// Embed error: hide progress; alternate mode falls back to the normal
    /// embed path.
    pub fn embed_failed(&mut self, id: WindowId, effects: &mut Vec<Effect>) {
        let Some(window) = self.get_mut(id) else {
            return;
        };
        window.loading = false;
        effects.push(Effect::SetLoadProgress { id, loading: false });
        if window.mode == ContentMode::AlternateEmbed {
            tracing::debug!(%id, "alternate embed failed, falling back to normal mode");
            window.mode = ContentMode::Normal;
            let source = window.current_source();
            window.loading = true;
            effects.push(Effect::SetVideoMode {
                id,
                alternate: false,
            });
            effects.push(Effect::NavigateEmbed { id, url: source });
            effects.push(Effect::SetLoadProgress { id, loading: true });
        }
    }

    /// Open the true URL externally and close the preview.
    pub fn open_external(&mut self, id: WindowId, now: Instant, effects: &mut Vec<Effect>) {
        let Some(window) = self.get(id) else {
            return;
        };
        effects.push(Effect::OpenExternal {
            url: window.url().to_string(),
        });
        self.close(id, now, effects);
    }

    /// Begin the fade-out; the window unmounts when the transition deadline
    /// passes in `tick`.
    pub fn close(&mut self, id: WindowId, now: Instant, effects: &mut Vec<Effect>) {
        if self.hovered == Some(id) {
            self.hovered = None;
        }
        let Some(window) = self.get_mut(id) else {
            return;
        };
        if window.is_closing() {
            return;
        }
        tracing::debug!(%id, url = %window.url(), "closing preview window");
        window.closing_at = Some(now + Duration::from_millis(CLOSE_FADE_MS));
        effects.push(Effect::BeginClose { id });
    }

    /// Escape closes the most recently opened unpinned window; pinned
    /// windows are inert to it.
    pub fn escape(&mut self, now: Instant, effects: &mut Vec<Effect>) -> bool {
        let target = self
            .windows
            .iter()
            .rev()
            .find(|window| !window.is_closing() && !window.pinned())
            .map(|window| window.id());
        match target {
            Some(id) => {
                self.close(id, now, effects);
                true
            }
            None => false,
        }
    }

    /// A document-level click landed at `at`. Every armed, unpinned,
    /// non-interacting window whose body and originating anchor both miss the
    /// point closes.
    pub fn outside_click(&mut self, at: PointPx, now: Instant, effects: &mut Vec<Effect>) {
        let to_close: Vec<WindowId> = self
            .windows
            .iter()
            .filter(|window| {
                !window.is_closing()
                    && window.dismiss_armed
                    && !window.pinned()
                    && !window.interacting()
                    && !window.rect().contains(at)
                    && !window
                        .origin_anchor()
                        .is_some_and(|anchor| anchor.contains(at))
            })
            .map(|window| window.id())
            .collect();
        for id in to_close {
            self.close(id, now, effects);
        }
    }

    /// Poll deadlines: finish fades, and arm outside-click dismissal for
    /// windows created before this poll.
    pub fn tick(&mut self, now: Instant, effects: &mut Vec<Effect>) {
        let mut unmounted = Vec::new();
        self.windows.retain(|window| match window.closing_at {
            Some(deadline) if now >= deadline => {
                unmounted.push(window.id());
                false
            }
            _ => true,
        });
        for id in unmounted {
            effects.push(Effect::UnmountWindow { id });
        }
        for window in &mut self.windows {
            if !window.dismiss_armed && !window.is_closing() {
                window.dismiss_armed = true;
            }
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.windows
            .iter()
            .filter_map(|window| window.closing_at)
            .min()
    }

    pub(crate) fn set_interacting(&mut self, id: WindowId, interacting: bool) {
        if let Some(window) = self.get_mut(id) {
            window.interacting = interacting;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::theme;

    fn viewport() -> Viewport {
        Viewport::new(1920, 1080)
    }

    fn open_one(
        manager: &mut PreviewManager,
        url: &str,
        effects: &mut Vec<Effect>,
    ) -> WindowId {
        manager.open(
            OpenParams {
                url: url.to_string(),
                embed_url: url.to_string(),
                origin: Some(PointPx::new(400, 300)),
                anchor_rect: Some(RectPx::new(380, 290, 120, 20)),
                error_tip: None,
            },
            &TriggerConfig::default(),
            theme::dark(),
            viewport(),
            None,
            effects,
        )
    }

    #[test]
    fn reopening_same_url_focuses_instead_of_duplicating() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let first = open_one(&mut manager, "https://example.org/a", &mut effects);
        let second = open_one(&mut manager, "https://example.org/a", &mut effects);
        assert_eq!(first, second);
        assert_eq!(manager.len(), 1);
    }

    #[test]
    fn only_one_window_is_active_after_pointer_enter() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let a = open_one(&mut manager, "https://example.org/a", &mut effects);
        let b = open_one(&mut manager, "https://example.org/b", &mut effects);
        assert_eq!(manager.active(), Some(b));

        effects.clear();
        manager.pointer_entered(a, &mut effects);
        assert_eq!(manager.active(), Some(a));
        // demotion of b must precede promotion of a in the effect stream
        let demote = effects
            .iter()
            .position(|e| matches!(e, Effect::SetZRank { id, rank: ZRank::Background } if *id == b));
        let promote = effects
            .iter()
            .position(|e| matches!(e, Effect::SetZRank { id, rank: ZRank::Active } if *id == a));
        assert!(demote.unwrap() < promote.unwrap());
    }

    #[test]
    fn escape_skips_pinned_windows() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let a = open_one(&mut manager, "https://example.org/a", &mut effects);
        let b = open_one(&mut manager, "https://example.org/b", &mut effects);
        manager.toggle_pin(b, &mut effects);

        let now = Instant::now();
        assert!(manager.escape(now, &mut effects));
        assert!(manager.get(a).unwrap().is_closing());
        assert!(!manager.get(b).unwrap().is_closing());
    }

    #[test]
    fn outside_click_respects_pin_and_anchor() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let a = open_one(&mut manager, "https://example.org/a", &mut effects);
        let now = Instant::now();

        // not armed yet: the triggering click cannot dismiss
        manager.outside_click(PointPx::new(5, 5), now, &mut effects);
        assert!(!manager.get(a).unwrap().is_closing());

        manager.tick(now, &mut effects);
        // a click on the originating anchor is not an outside click
        manager.outside_click(PointPx::new(390, 295), now, &mut effects);
        assert!(!manager.get(a).unwrap().is_closing());

        manager.outside_click(PointPx::new(5, 5), now, &mut effects);
        assert!(manager.get(a).unwrap().is_closing());
    }

    #[test]
    fn close_unmounts_after_fade() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let a = open_one(&mut manager, "https://example.org/a", &mut effects);
        let now = Instant::now();
        manager.close(a, now, &mut effects);
        assert!(effects.contains(&Effect::BeginClose { id: a }));

        effects.clear();
        manager.tick(now + Duration::from_millis(CLOSE_FADE_MS - 1), &mut effects);
        assert!(effects.is_empty());
        manager.tick(now + Duration::from_millis(CLOSE_FADE_MS), &mut effects);
        assert_eq!(effects, vec![Effect::UnmountWindow { id: a }]);
        assert!(manager.is_empty());
    }

    #[test]
    fn video_toggle_is_noop_without_recognized_id() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let a = open_one(&mut manager, "https://example.org/a", &mut effects);
        effects.clear();
        manager.toggle_video(a, &mut effects);
        assert!(effects.is_empty());
        assert_eq!(manager.get(a).unwrap().mode(), ContentMode::Normal);
    }

    #[test]
    fn video_toggle_parks_outgoing_embed_on_blank() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        let a = open_one(&mut manager, url, &mut effects);
        effects.clear();
        manager.toggle_video(a, &mut effects);
        assert!(matches!(
            &effects[0],
            Effect::NavigateEmbed { url, .. } if url == "about:blank"
        ));
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::NavigateEmbed { url, .. } if url.contains("dQw4w9WgXcQ") && url.contains("embed")
        )));
        assert_eq!(manager.get(a).unwrap().mode(), ContentMode::AlternateEmbed);
    }

    #[test]
    fn alternate_embed_failure_falls_back_to_normal() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let url = "https://www.youtube.com/watch?v=dQw4w9WgXcQ";
        let a = open_one(&mut manager, url, &mut effects);
        manager.toggle_video(a, &mut effects);
        effects.clear();
        manager.embed_failed(a, &mut effects);
        assert_eq!(manager.get(a).unwrap().mode(), ContentMode::Normal);
        assert!(effects.iter().any(|e| matches!(
            e,
            Effect::SetVideoMode { alternate: false, .. }
        )));
    }

    #[test]
    fn cross_origin_load_keeps_prior_address() {
        let mut manager = PreviewManager::new();
        let mut effects = Vec::new();
        let a = open_one(&mut manager, "https://example.org/a", &mut effects);
        effects.clear();
        manager.embed_loaded(a, None, &mut effects);
        assert_eq!(effects, vec![Effect::SetLoadProgress { id: a, loading: false }]);
    }
}
