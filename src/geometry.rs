//! Pixel-space geometry for preview windows.
//!
//! All coordinates are CSS pixels in the host viewport's coordinate space.
//! Origins are signed so intermediate drag math can go negative before
//! clamping; sizes are kept positive by construction.

use serde::{Deserialize, Serialize};

use crate::config::{PositionPref, SizePreset};

/// Inset kept between a preview window and every viewport edge.
pub const VIEWPORT_MARGIN: i32 = 20;

/// Resize floor. Drags past the floor freeze the violating axis at its last
/// valid value instead of erroring.
pub const MIN_PREVIEW_WIDTH: i32 = 400;
pub const MIN_PREVIEW_HEIGHT: i32 = 300;

/// Offset applied when placing a window at the pointer, so the cursor lands
/// just inside the header rather than on its corner.
pub const CURSOR_INSET: i32 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PointPx {
    pub x: i32,
    pub y: i32,
}

impl PointPx {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SizePx {
    pub width: i32,
    pub height: i32,
}

impl SizePx {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Signed rectangle origin with positive size.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RectPx {
    pub left: i32,
    pub top: i32,
    pub width: i32,
    pub height: i32,
}

impl RectPx {
    pub fn new(left: i32, top: i32, width: i32, height: i32) -> Self {
        Self {
            left,
            top,
            width,
            height,
        }
    }

    pub fn right(&self) -> i32 {
        self.left + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.top + self.height
    }

    pub fn size(&self) -> SizePx {
        SizePx::new(self.width, self.height)
    }

    /// Inclusive-left/top, exclusive-right/bottom containment, matching how
    /// the host reports bounding boxes.
    pub fn contains(&self, point: PointPx) -> bool {
        point.x >= self.left
            && point.x < self.right()
            && point.y >= self.top
            && point.y < self.bottom()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Viewport {
    pub width: i32,
    pub height: i32,
}

impl Viewport {
    pub fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Resolve a size preset to concrete pixels. `Last` falls back to `Medium`
/// when no remembered geometry exists yet.
pub fn preset_size(preset: SizePreset, last: Option<RectPx>) -> SizePx {
    match preset {
        SizePreset::Small => SizePx::new(500, 600),
        SizePreset::Medium => SizePx::new(700, 800),
        SizePreset::Large => SizePx::new(900, 1000),
        SizePreset::Last => last
            .map(|rect| rect.size())
            .unwrap_or_else(|| preset_size(SizePreset::Medium, None)),
    }
}

/// Compute the initial rectangle for a preview window.
///
/// The requested size is first clamped to fit inside the viewport margins,
/// then the position preference is resolved, then both axes are clamped into
/// `[MARGIN, viewport - size - MARGIN]` so the window never renders off-screen
/// or flush against an edge.
pub fn place(
    pref: PositionPref,
    origin: Option<PointPx>,
    requested: SizePx,
    viewport: Viewport,
    last: Option<RectPx>,
) -> RectPx {
    let width = requested
        .width
        .min(viewport.width - 2 * VIEWPORT_MARGIN)
        .max(1);
    let height = requested
        .height
        .min(viewport.height - 2 * VIEWPORT_MARGIN)
        .max(1);

    let centered_top = (viewport.height - height) / 2;
    let (left, top) = match pref {
        PositionPref::Left => (VIEWPORT_MARGIN, centered_top),
        PositionPref::Right => (viewport.width - width - VIEWPORT_MARGIN, centered_top),
        PositionPref::Center => ((viewport.width - width) / 2, centered_top),
        PositionPref::Last => match last {
            Some(rect) => (rect.left, rect.top),
            None => ((viewport.width - width) / 2, centered_top),
        },
        PositionPref::Cursor => match origin {
            Some(at) => (at.x - CURSOR_INSET, at.y - CURSOR_INSET),
            None => ((viewport.width - width) / 2, centered_top),
        },
    };

    let (left, top) = clamp_origin(left, top, SizePx::new(width, height), viewport);
    RectPx::new(left, top, width, height)
}

/// Clamp a window origin so the whole rectangle stays inside the viewport
/// margins. When the window is larger than the available area the top-left
/// corner pins to the margin.
pub fn clamp_origin(left: i32, top: i32, size: SizePx, viewport: Viewport) -> (i32, i32) {
    let max_left = viewport.width - size.width - VIEWPORT_MARGIN;
    let max_top = viewport.height - size.height - VIEWPORT_MARGIN;
    (
        left.min(max_left).max(VIEWPORT_MARGIN),
        top.min(max_top).max(VIEWPORT_MARGIN),
    )
}
