//! The outbound command stream.
//!
//! The engine mutates only its own state; everything the host surface must do
//! leaves the core as an [`Effect`]. Hosts drain the queue after every call
//! into the engine and apply the commands in order.

use crate::geometry::{PointPx, RectPx};
use crate::messages::FrameEnvelope;
use crate::theme::Palette;
use crate::window::WindowId;

/// Z rank of a preview window. Exactly one open window is `Active`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ZRank {
    Active,
    Background,
}

/// Everything needed to mount one window+overlay pair into the isolation
/// surface.
#[derive(Debug, Clone, PartialEq)]
pub struct WindowInit {
    pub id: WindowId,
    /// Original target URL, shown in the address display.
    pub url: String,
    /// Normalized URL the embed actually loads.
    pub embed_url: String,
    pub rect: RectPx,
    pub palette: Palette,
    /// Overlay opacity percentage (0–100) applied while the overlay shows.
    pub overlay_opacity: u8,
    /// Whether the alternate-content toggle is enabled for this URL.
    pub video_available: bool,
    /// When set, the window shows this message instead of an embed.
    pub error_tip: Option<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    // Trigger affordance.
    ShowSpinner { at: PointPx },
    HideSpinner,

    // Window lifecycle.
    MountWindow(WindowInit),
    /// Start the fade-out transition; `UnmountWindow` follows once it ends.
    BeginClose { id: WindowId },
    UnmountWindow { id: WindowId },

    // Window state.
    SetWindowGeometry { id: WindowId, rect: RectPx },
    SetZRank { id: WindowId, rank: ZRank },
    SetOverlayVisible { id: WindowId, visible: bool },
    SetPinned { id: WindowId, pinned: bool },
    SetLoadProgress { id: WindowId, loading: bool },
    SetAddress { id: WindowId, url: String },
    SetVideoMode { id: WindowId, alternate: bool },
    NavigateEmbed { id: WindowId, url: String },

    // Navigation arbitration.
    /// Cancel the native navigation of the event being handled
    /// (modifier-click interception).
    SuppressNativeNavigation,
    /// Install a one-shot capture-phase click suppressor so the synthetic
    /// click after a consumed long press cannot navigate.
    InstallClickSuppressor,
    ReleaseClickSuppressor,

    // Host services.
    OpenExternal { url: String },
    /// Debounced request to persist the last-used geometry.
    PersistGeometry { rect: RectPx },
    /// Relay an intent from an embedded frame to the top-level engine.
    ForwardToParent(FrameEnvelope),
}
