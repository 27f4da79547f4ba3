//! Trigger arbitration: converts ambient pointer/keyboard events into at most
//! one preview-open decision per user intent.
//!
//! Every trigger mode shares one state machine parametrized by its delay and
//! cancel conditions, instead of one hand-rolled timer path per mode. All
//! timers are deadline fields polled by [`TriggerArbiter::tick`]; cancellation
//! clears the deadline, so a cancelled trigger can never fire late.

use std::time::{Duration, Instant};

use crate::config::{
    LEAVE_CONFIRM_MS, MODIFIER_AUTO_RELEASE_MS, TriggerConfig, TriggerMode,
};
use crate::effects::Effect;
use crate::events::{AnchorTarget, PointerButton};
use crate::geometry::{PointPx, RectPx};

/// How long the capture-phase click suppressor stays armed after a consumed
/// long press, covering the browser's synthetic click on button release.
pub const CLICK_SUPPRESS_MS: u64 = 1_000;

/// A decided preview-open request, handed onward to the window manager.
#[derive(Debug, Clone, PartialEq)]
pub struct OpenRequest {
    pub url: String,
    pub origin: Option<PointPx>,
    pub anchor_rect: Option<RectPx>,
}

impl OpenRequest {
    fn from_anchor(anchor: &AnchorTarget, at: PointPx) -> Self {
        Self {
            url: anchor.url.clone(),
            origin: Some(at),
            anchor_rect: Some(anchor.rect),
        }
    }
}

/// Outcome of a click as seen by the arbiter.
#[derive(Debug, Clone, PartialEq)]
pub enum ClickOutcome {
    /// Not the arbiter's business; dismissal logic may look at it.
    PassThrough,
    /// Swallowed by the one-shot long-press suppressor.
    Suppressed,
    /// Modifier-click interception: native navigation was cancelled and a
    /// preview should open.
    Open(OpenRequest),
}

/// A scheduled-but-not-yet-fired preview request.
#[derive(Debug)]
struct PendingTrigger {
    anchor: AnchorTarget,
    origin: PointPx,
    fire_at: Instant,
    mode: TriggerMode,
    spinner: bool,
}

#[derive(Debug)]
struct LeaveConfirm {
    deadline: Instant,
}

#[derive(Debug, Default)]
struct ModifierState {
    held: bool,
    auto_release_at: Option<Instant>,
}

#[derive(Debug, Default)]
pub struct TriggerArbiter {
    /// Anchor currently under the pointer, tracked so a modifier press can
    /// retroactively arm an alt-hover trigger.
    hovered: Option<AnchorTarget>,
    last_pointer: PointPx,
    pending: Option<PendingTrigger>,
    leave_confirm: Option<LeaveConfirm>,
    modifier: ModifierState,
    suppress_clicks_until: Option<Instant>,
}

impl TriggerArbiter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn modifier_held(&self) -> bool {
        self.modifier.held
    }

    pub fn has_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// The earliest instant at which `tick` has work to do.
    pub fn next_deadline(&self) -> Option<Instant> {
        let mut deadline: Option<Instant> = None;
        let mut consider = |candidate: Option<Instant>| {
            if let Some(at) = candidate {
                deadline = Some(deadline.map_or(at, |current| current.min(at)));
            }
        };
        consider(self.pending.as_ref().map(|p| p.fire_at));
        consider(self.leave_confirm.as_ref().map(|l| l.deadline));
        consider(self.modifier.held.then_some(()).and(self.modifier.auto_release_at));
        consider(self.suppress_clicks_until);
        deadline
    }

    pub fn pointer_entered_link(
        &mut self,
        anchor: AnchorTarget,
        at: PointPx,
        config: &TriggerConfig,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        self.last_pointer = at;

        // Returning to the pending anchor before the leave confirms makes the
        // leave a non-event.
        if let Some(pending) = &self.pending
            && pending.anchor.url == anchor.url
        {
            self.leave_confirm = None;
            self.hovered = Some(anchor);
            return;
        }

        // Entering a different anchor cancels whatever was pending.
        if self.pending.is_some() {
            self.cancel_pending(effects);
        }
        self.hovered = Some(anchor.clone());

        let armed = match config.trigger_mode {
            TriggerMode::Hover => true,
            TriggerMode::AltHover => self.modifier.held,
            _ => return,
        };
        if armed && config.allows_url(&anchor.url) {
            self.arm(anchor, at, config, now, false, effects);
        }
    }

    pub fn pointer_left_link(&mut self, anchor: &AnchorTarget, at: PointPx, now: Instant) {
        self.last_pointer = at;
        if self
            .hovered
            .as_ref()
            .is_some_and(|hovered| hovered.url == anchor.url)
        {
            self.hovered = None;
        }
        let Some(pending) = &self.pending else {
            return;
        };
        // Only the hover family cancels on leave; a long press survives
        // sub-element churn until pointer-up.
        if !matches!(pending.mode, TriggerMode::Hover | TriggerMode::AltHover) {
            return;
        }
        if pending.anchor.url == anchor.url && self.leave_confirm.is_none() {
            self.leave_confirm = Some(LeaveConfirm {
                deadline: now + Duration::from_millis(LEAVE_CONFIRM_MS),
            });
        }
    }

    pub fn pointer_moved(&mut self, at: PointPx) {
        self.last_pointer = at;
    }

    pub fn pointer_down(
        &mut self,
        at: PointPx,
        button: PointerButton,
        anchor: Option<&AnchorTarget>,
        config: &TriggerConfig,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        self.last_pointer = at;
        if config.trigger_mode != TriggerMode::LongPress || button != PointerButton::Primary {
            return;
        }
        let Some(anchor) = anchor else {
            return;
        };
        if !config.allows_url(&anchor.url) {
            return;
        }
        self.cancel_pending(effects);
        self.arm(anchor.clone(), at, config, now, true, effects);
    }

    /// Pointer-up before the long-press threshold cancels silently so the
    /// native click proceeds as usual.
    pub fn pointer_up(&mut self, at: PointPx, button: PointerButton, effects: &mut Vec<Effect>) {
        self.last_pointer = at;
        if button != PointerButton::Primary {
            return;
        }
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.mode == TriggerMode::LongPress)
        {
            self.cancel_pending(effects);
        }
    }

    pub fn click(
        &mut self,
        at: PointPx,
        anchor: Option<&AnchorTarget>,
        config: &TriggerConfig,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) -> ClickOutcome {
        self.last_pointer = at;

        // One-shot: the first click consumes the suppressor.
        if self
            .suppress_clicks_until
            .is_some_and(|until| now < until)
        {
            self.suppress_clicks_until = None;
            effects.push(Effect::ReleaseClickSuppressor);
            return ClickOutcome::Suppressed;
        }

        if config.trigger_mode == TriggerMode::AltClick
            && self.modifier.held
            && let Some(anchor) = anchor
            && config.allows_url(&anchor.url)
        {
            effects.push(Effect::SuppressNativeNavigation);
            tracing::debug!(url = %anchor.url, "modifier-click trigger");
            return ClickOutcome::Open(OpenRequest::from_anchor(anchor, at));
        }

        // A real click on a link while a hover trigger is pending means the
        // user navigated; drop the stale trigger.
        if matches!(config.trigger_mode, TriggerMode::Hover | TriggerMode::AltHover)
            && anchor.is_some()
        {
            self.cancel_pending(effects);
        }
        ClickOutcome::PassThrough
    }

    pub fn drag_ended(
        &mut self,
        at: PointPx,
        anchor: Option<&AnchorTarget>,
        config: &TriggerConfig,
    ) -> Option<OpenRequest> {
        self.last_pointer = at;
        if config.trigger_mode != TriggerMode::DragLink {
            return None;
        }
        let anchor = anchor?;
        if !config.allows_url(&anchor.url) {
            return None;
        }
        tracing::debug!(url = %anchor.url, "link-drag trigger");
        Some(OpenRequest::from_anchor(anchor, at))
    }

    pub fn modifier_down(
        &mut self,
        config: &TriggerConfig,
        now: Instant,
        effects: &mut Vec<Effect>,
    ) {
        self.modifier.held = true;
        self.modifier.auto_release_at =
            Some(now + Duration::from_millis(MODIFIER_AUTO_RELEASE_MS));

        // Pressing the modifier while already over a qualifying anchor starts
        // the alt-hover timer retroactively.
        if config.trigger_mode == TriggerMode::AltHover
            && self.pending.is_none()
            && let Some(anchor) = self.hovered.clone()
            && config.allows_url(&anchor.url)
        {
            let at = self.last_pointer;
            self.arm(anchor, at, config, now, false, effects);
        }
    }

    pub fn modifier_up(&mut self, effects: &mut Vec<Effect>) {
        self.release_modifier(effects);
    }

    /// Tab hidden: every pending trigger and affordance must die with it.
    pub fn visibility_lost(&mut self, effects: &mut Vec<Effect>) {
        self.cancel_pending(effects);
        self.release_modifier(effects);
        self.hovered = None;
    }

    /// Window blur only invalidates modifier state; a pending hover trigger
    /// for a still-visible page keeps running.
    pub fn window_blurred(&mut self, effects: &mut Vec<Effect>) {
        self.release_modifier(effects);
    }

    /// Poll deadlines. Returns an open request when a pending trigger fired.
    /// A trigger armed under an older settings snapshot never reaches this
    /// point: replacing the snapshot cancels it.
    pub fn tick(&mut self, now: Instant, effects: &mut Vec<Effect>) -> Option<OpenRequest> {
        if self.modifier.held
            && self
                .modifier
                .auto_release_at
                .is_some_and(|deadline| now >= deadline)
        {
            tracing::debug!("modifier auto-release");
            self.release_modifier(effects);
        }

        if let Some(confirm) = &self.leave_confirm
            && now >= confirm.deadline
        {
            self.leave_confirm = None;
            let keep = self
                .pending
                .as_ref()
                .is_some_and(|pending| pending.anchor.rect.contains(self.last_pointer));
            if !keep {
                self.cancel_pending(effects);
            }
        }

        if let Some(until) = self.suppress_clicks_until
            && now >= until
        {
            self.suppress_clicks_until = None;
            effects.push(Effect::ReleaseClickSuppressor);
        }

        let pending = self
            .pending
            .take_if(|pending| now >= pending.fire_at)?;
        self.leave_confirm = None;
        if pending.spinner {
            effects.push(Effect::HideSpinner);
        }
        if pending.mode == TriggerMode::LongPress {
            // The button release still produces a synthetic click; keep it
            // from navigating the host page away from the fresh preview.
            self.suppress_clicks_until = Some(now + Duration::from_millis(CLICK_SUPPRESS_MS));
            effects.push(Effect::InstallClickSuppressor);
        }
        tracing::debug!(url = %pending.anchor.url, mode = ?pending.mode, "trigger fired");
        Some(OpenRequest::from_anchor(&pending.anchor, pending.origin))
    }

    fn arm(
        &mut self,
        anchor: AnchorTarget,
        at: PointPx,
        config: &TriggerConfig,
        now: Instant,
        spinner: bool,
        effects: &mut Vec<Effect>,
    ) {
        let Some(delay) = config.trigger_delay() else {
            return;
        };
        if spinner {
            effects.push(Effect::ShowSpinner { at });
        }
        tracing::debug!(url = %anchor.url, mode = ?config.trigger_mode, ?delay, "trigger armed");
        self.pending = Some(PendingTrigger {
            anchor,
            origin: at,
            fire_at: now + delay,
            mode: config.trigger_mode,
            spinner,
        });
        self.leave_confirm = None;
    }

    fn cancel_pending(&mut self, effects: &mut Vec<Effect>) {
        if let Some(pending) = self.pending.take() {
            tracing::debug!(url = %pending.anchor.url, "trigger cancelled");
            if pending.spinner {
                effects.push(Effect::HideSpinner);
            }
        }
        self.leave_confirm = None;
    }

    fn release_modifier(&mut self, effects: &mut Vec<Effect>) {
        self.modifier.held = false;
        self.modifier.auto_release_at = None;
        if self
            .pending
            .as_ref()
            .is_some_and(|pending| pending.mode == TriggerMode::AltHover)
        {
            self.cancel_pending(effects);
        }
    }
}
