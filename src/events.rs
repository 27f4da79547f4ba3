//! Semantic input events.
//!
//! Host adapters translate raw DOM-level input into this vocabulary exactly
//! once (anchor resolution, chrome hit-testing, modifier identification), so
//! the core never re-derives "which link is this over" from raw targets.

use serde::{Deserialize, Serialize};

use crate::config::ModifierKey;
use crate::geometry::{PointPx, RectPx, Viewport};
use crate::window::WindowId;

/// A hyperlink the pointer can interact with: its target URL and its
/// bounding box in viewport coordinates.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnchorTarget {
    pub url: String,
    pub rect: RectPx,
}

impl AnchorTarget {
    pub fn new(url: impl Into<String>, rect: RectPx) -> Self {
        Self {
            url: url.into(),
            rect,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PointerButton {
    Primary,
    Auxiliary,
    Secondary,
}

/// The two resize affordances a preview window exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResizeCorner {
    /// Bottom-right: grows width and height from the fixed top-left corner.
    SouthEast,
    /// Bottom-left: grows width and height while the right edge stays put.
    SouthWest,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ChromeButton {
    Pin,
    Refresh,
    OpenExternal,
    Close,
    VideoToggle,
}

/// Everything the engine can react to.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    // Document-level pointer/keyboard traffic.
    PointerEnteredLink { anchor: AnchorTarget, at: PointPx },
    PointerLeftLink { anchor: AnchorTarget, at: PointPx },
    PointerMoved { at: PointPx },
    PointerDown {
        at: PointPx,
        button: PointerButton,
        anchor: Option<AnchorTarget>,
    },
    PointerUp { at: PointPx, button: PointerButton },
    Click { at: PointPx, anchor: Option<AnchorTarget> },
    /// Drag gesture ended; carries the anchor under the pointer (link drags)
    /// and any selected text (text drags).
    DragEnded {
        at: PointPx,
        anchor: Option<AnchorTarget>,
        selected_text: Option<String>,
    },
    ModifierDown(ModifierKey),
    ModifierUp(ModifierKey),
    EscapePressed,
    VisibilityChanged { hidden: bool },
    WindowBlurred,
    ViewportResized(Viewport),
    /// The host's animation-frame callback; drains coalesced geometry updates.
    AnimationFrame,

    // Preview-chrome traffic, already hit-tested by the host adapter.
    WindowPointerEntered { id: WindowId },
    WindowPointerLeft { id: WindowId },
    /// Pointer-down on the window header, excluding buttons and the address.
    HeaderPointerDown { id: WindowId, at: PointPx },
    ResizeHandleDown {
        id: WindowId,
        corner: ResizeCorner,
        at: PointPx,
    },
    ChromeButtonPressed { id: WindowId, button: ChromeButton },

    // Embedded-content lifecycle.
    /// The embed finished loading. `location` is the frame's reported URL
    /// when the host could read it; cross-origin denial arrives as `None`.
    EmbedLoaded {
        id: WindowId,
        location: Option<String>,
    },
    EmbedFailed { id: WindowId },
}
