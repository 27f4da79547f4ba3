//! Drag and resize interaction for preview windows.
//!
//! Geometry updates are coalesced to at most one per animation frame: each
//! pointer move overwrites a single pending slot and the host's frame
//! callback drains it, so visual updates never queue up behind input.

use std::time::{Duration, Instant};

use crate::effects::Effect;
use crate::events::ResizeCorner;
use crate::geometry::{MIN_PREVIEW_HEIGHT, MIN_PREVIEW_WIDTH, PointPx, RectPx};
use crate::window::{PreviewManager, WindowId};

/// After pointer-up the interacting flag survives this long, so the release
/// click can't be misread as an outside click.
pub const INTERACTION_GRACE_MS: u64 = 50;

#[derive(Debug, Clone, Copy)]
enum InteractionKind {
    Drag {
        /// Pointer offset inside the window at press time, so the window
        /// follows the cursor with no jump.
        offset_x: i32,
        offset_y: i32,
    },
    Resize {
        corner: ResizeCorner,
        start_rect: RectPx,
        start_pointer: PointPx,
    },
}

#[derive(Debug, Clone, Copy)]
struct Interaction {
    id: WindowId,
    kind: InteractionKind,
    pending: Option<RectPx>,
}

#[derive(Debug, Clone, Copy)]
struct Grace {
    id: WindowId,
    deadline: Instant,
}

/// Tracks the single in-flight drag/resize (there is only one pointer).
#[derive(Debug, Default)]
pub struct InteractionController {
    current: Option<Interaction>,
    grace: Option<Grace>,
}

impl InteractionController {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn interacting_window(&self) -> Option<WindowId> {
        self.current.map(|interaction| interaction.id)
    }

    pub fn begin_drag(&mut self, manager: &mut PreviewManager, id: WindowId, at: PointPx) {
        let Some(window) = manager.get(id) else {
            return;
        };
        if window.is_closing() {
            return;
        }
        let rect = window.rect();
        tracing::debug!(%id, "drag started");
        self.grace = None;
        self.current = Some(Interaction {
            id,
            kind: InteractionKind::Drag {
                offset_x: at.x - rect.left,
                offset_y: at.y - rect.top,
            },
            pending: None,
        });
        manager.set_interacting(id, true);
    }

    pub fn begin_resize(
        &mut self,
        manager: &mut PreviewManager,
        id: WindowId,
        corner: ResizeCorner,
        at: PointPx,
    ) {
        let Some(window) = manager.get(id) else {
            return;
        };
        if window.is_closing() {
            return;
        }
        tracing::debug!(%id, ?corner, "resize started");
        self.grace = None;
        self.current = Some(Interaction {
            id,
            kind: InteractionKind::Resize {
                corner,
                start_rect: window.rect(),
                start_pointer: at,
            },
            pending: None,
        });
        manager.set_interacting(id, true);
    }

    /// Record the latest candidate geometry; only the newest position wins
    /// when the next frame drains it.
    pub fn pointer_moved(&mut self, manager: &PreviewManager, at: PointPx) {
        let Some(interaction) = &mut self.current else {
            return;
        };
        let Some(window) = manager.get(interaction.id) else {
            return;
        };
        let current = interaction.pending.unwrap_or(window.rect());
        let candidate = match interaction.kind {
            InteractionKind::Drag { offset_x, offset_y } => RectPx::new(
                at.x - offset_x,
                at.y - offset_y,
                current.width,
                current.height,
            ),
            InteractionKind::Resize {
                corner,
                start_rect,
                start_pointer,
            } => resize_rect(corner, start_rect, start_pointer, at, current),
        };
        interaction.pending = Some(candidate);
    }

    /// The host's frame callback: apply the pending geometry, if any.
    pub fn animation_frame(&mut self, manager: &mut PreviewManager, effects: &mut Vec<Effect>) {
        let Some(interaction) = &mut self.current else {
            return;
        };
        let Some(rect) = interaction.pending.take() else {
            return;
        };
        let id = interaction.id;
        if let Some(window) = manager.get_mut(id) {
            window.rect = rect;
            effects.push(Effect::SetWindowGeometry { id, rect });
        }
    }

    /// Finish the interaction. Returns the final geometry so the engine can
    /// debounce-persist it as the last-used size/position.
    pub fn pointer_up(
        &mut self,
        manager: &mut PreviewManager,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) -> Option<(WindowId, RectPx)> {
        let interaction = self.current.take()?;
        let id = interaction.id;
        // flush the last pending update so the release position sticks
        if let Some(rect) = interaction.pending
            && let Some(window) = manager.get_mut(id)
        {
            window.rect = rect;
            effects.push(Effect::SetWindowGeometry { id, rect });
        }
        self.grace = Some(Grace {
            id,
            deadline: now + Duration::from_millis(INTERACTION_GRACE_MS),
        });
        let rect = manager.get(id)?.rect();
        tracing::debug!(%id, ?rect, "interaction finished");
        Some((id, rect))
    }

    /// Poll the post-interaction grace period: clear the interacting flag and
    /// re-evaluate overlay visibility from the current hover state.
    pub fn tick(&mut self, manager: &mut PreviewManager, now: Instant, effects: &mut Vec<Effect>) {
        let Some(grace) = self.grace else {
            return;
        };
        if now < grace.deadline {
            return;
        }
        self.grace = None;
        manager.set_interacting(grace.id, false);
        if manager.get(grace.id).is_some() {
            effects.push(Effect::SetOverlayVisible {
                id: grace.id,
                visible: manager.hovered() == Some(grace.id),
            });
        }
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.grace.map(|grace| grace.deadline)
    }
}

/// Resize math for the two handles. The south-east handle grows from the
/// fixed top-left corner; the south-west handle grows leftward while the
/// right edge stays anchored. An axis that would dip below the floor keeps
/// its last valid value.
fn resize_rect(
    corner: ResizeCorner,
    start: RectPx,
    start_pointer: PointPx,
    at: PointPx,
    current: RectPx,
) -> RectPx {
    let dy = at.y - start_pointer.y;
    let mut rect = current;

    let height = start.height + dy;
    if height >= MIN_PREVIEW_HEIGHT {
        rect.height = height;
    }

    match corner {
        ResizeCorner::SouthEast => {
            let width = start.width + (at.x - start_pointer.x);
            if width >= MIN_PREVIEW_WIDTH {
                rect.width = width;
            }
        }
        ResizeCorner::SouthWest => {
            let dx = start_pointer.x - at.x;
            let width = start.width + dx;
            if width >= MIN_PREVIEW_WIDTH {
                rect.width = width;
                rect.left = start.left - dx;
            }
        }
    }
    rect
}

#[cfg(test)]
mod tests {
    use super::*;

    fn start() -> RectPx {
        RectPx::new(200, 150, 500, 400)
    }

    #[test]
    fn south_east_resize_grows_from_top_left() {
        let rect = resize_rect(
            ResizeCorner::SouthEast,
            start(),
            PointPx::new(700, 550),
            PointPx::new(760, 590),
            start(),
        );
        assert_eq!(rect, RectPx::new(200, 150, 560, 440));
    }

    #[test]
    fn south_west_resize_anchors_right_edge() {
        let rect = resize_rect(
            ResizeCorner::SouthWest,
            start(),
            PointPx::new(200, 550),
            PointPx::new(150, 580),
            start(),
        );
        assert_eq!(rect, RectPx::new(150, 150, 550, 430));
        assert_eq!(rect.right(), start().right());
    }

    #[test]
    fn resize_never_dips_below_floor() {
        let rect = resize_rect(
            ResizeCorner::SouthEast,
            start(),
            PointPx::new(700, 550),
            PointPx::new(-2000, -2000),
            start(),
        );
        assert!(rect.width >= MIN_PREVIEW_WIDTH);
        assert!(rect.height >= MIN_PREVIEW_HEIGHT);
        // the last valid size persists rather than snapping to the floor
        assert_eq!(rect.width, start().width);
        assert_eq!(rect.height, start().height);
    }

    #[test]
    fn violating_one_axis_keeps_the_other_live() {
        let rect = resize_rect(
            ResizeCorner::SouthEast,
            start(),
            PointPx::new(700, 550),
            PointPx::new(900, -2000),
            start(),
        );
        assert_eq!(rect.width, 700);
        assert_eq!(rect.height, start().height);
    }
}
