//! Preview windows and their lifecycle.
//!
//! [`PreviewWindow`] is the record for one open preview. It is owned
//! exclusively by the [`PreviewManager`]; interaction code mutates it only
//! through the manager's accessors so every event handler leaves the
//! collection consistent.

mod controller;
mod manager;

pub use controller::{INTERACTION_GRACE_MS, InteractionController};
pub use manager::{CLOSE_FADE_MS, OpenParams, PreviewManager};

use std::time::Instant;

use url::Url;

use crate::effects::ZRank;
use crate::geometry::RectPx;
use crate::video::VideoEmbed;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct WindowId(pub u64);

impl std::fmt::Display for WindowId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "w{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ContentMode {
    #[default]
    Normal,
    AlternateEmbed,
}

#[derive(Debug, Clone)]
pub struct PreviewWindow {
    id: WindowId,
    /// Original target URL; the collection key.
    url: String,
    /// Normalized URL the normal embed loads.
    embed_url: String,
    /// Bounding box of the anchor that triggered this preview, kept so a
    /// click on the anchor itself never counts as an outside click.
    origin_anchor: Option<RectPx>,
    pub(crate) rect: RectPx,
    pub(crate) pinned: bool,
    pub(crate) interacting: bool,
    pub(crate) mode: ContentMode,
    pub(crate) rank: ZRank,
    pub(crate) loading: bool,
    /// Outside-click dismissal is disarmed at creation and armed on the next
    /// poll, so the triggering click can't immediately dismiss the window.
    pub(crate) dismiss_armed: bool,
    pub(crate) closing_at: Option<Instant>,
    video: Option<VideoEmbed>,
}

impl PreviewWindow {
    pub(crate) fn new(
        id: WindowId,
        url: String,
        embed_url: String,
        origin_anchor: Option<RectPx>,
        rect: RectPx,
        video: Option<VideoEmbed>,
    ) -> Self {
        Self {
            id,
            url,
            embed_url,
            origin_anchor,
            rect,
            pinned: false,
            interacting: false,
            mode: ContentMode::default(),
            rank: ZRank::Active,
            loading: true,
            dismiss_armed: false,
            closing_at: None,
            video,
        }
    }

    pub fn id(&self) -> WindowId {
        self.id
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn embed_url(&self) -> &str {
        &self.embed_url
    }

    pub fn rect(&self) -> RectPx {
        self.rect
    }

    pub fn pinned(&self) -> bool {
        self.pinned
    }

    pub fn interacting(&self) -> bool {
        self.interacting
    }

    pub fn mode(&self) -> ContentMode {
        self.mode
    }

    pub fn rank(&self) -> ZRank {
        self.rank
    }

    pub fn loading(&self) -> bool {
        self.loading
    }

    pub fn video(&self) -> Option<&VideoEmbed> {
        self.video.as_ref()
    }

    pub fn is_closing(&self) -> bool {
        self.closing_at.is_some()
    }

    pub(crate) fn origin_anchor(&self) -> Option<RectPx> {
        self.origin_anchor
    }

    /// The URL the embed should currently display, honoring content mode.
    pub fn current_source(&self) -> String {
        match (self.mode, &self.video) {
            (ContentMode::AlternateEmbed, Some(video)) => video.player_url(),
            _ => self.embed_url.clone(),
        }
    }
}

/// Shorten a URL for the address display: host + path, ellipsized at 50
/// characters, matching what users see in the window header.
pub fn display_url(url: &str) -> String {
    let compact = match Url::parse(url) {
        Ok(parsed) => {
            let host = parsed.host_str().unwrap_or_default();
            format!("{host}{}", parsed.path())
        }
        Err(_) => url.to_string(),
    };
    if compact.len() > 50 {
        let mut truncated: String = compact.chars().take(47).collect();
        truncated.push_str("...");
        truncated
    } else {
        compact
    }
}
