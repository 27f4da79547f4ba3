//! End-to-end trigger arbitration: events in, effects out, clock driven by
//! hand.

use std::time::{Duration, Instant};

use linkpeek::config::{ModifierKey, TriggerConfig, TriggerMode};
use linkpeek::effects::Effect;
use linkpeek::engine::{Engine, PageContext};
use linkpeek::events::{AnchorTarget, InputEvent, PointerButton};
use linkpeek::geometry::{PointPx, RectPx, Viewport};
use linkpeek::search::SearchSettings;

fn engine_with(config: TriggerConfig) -> Engine {
    Engine::attach(
        PageContext {
            viewport: Viewport::new(1920, 1080),
            page_url: "https://host.test/page".into(),
            embedded: false,
            frame_token: "test-token".into(),
            surface_ready: true,
        },
        config,
        SearchSettings::default(),
    )
    .expect("surface ready")
}

fn anchor(url: &str) -> AnchorTarget {
    AnchorTarget::new(url, RectPx::new(100, 100, 200, 20))
}

fn mounts(effects: &[Effect]) -> usize {
    effects
        .iter()
        .filter(|effect| matches!(effect, Effect::MountWindow(_)))
        .count()
}

#[test]
fn hover_trigger_opens_after_delay() {
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::Hover,
        hover_delay: 500,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    engine.handle_event(
        InputEvent::PointerEnteredLink {
            anchor: anchor("https://example.org/a"),
            at: PointPx::new(110, 110),
        },
        start,
    );
    engine.tick(start + Duration::from_millis(499));
    assert_eq!(mounts(&engine.take_effects()), 0);
    engine.tick(start + Duration::from_millis(500));
    assert_eq!(mounts(&engine.take_effects()), 1);
}

#[test]
fn cancellation_before_delay_opens_nothing() {
    // hover: leave before the delay
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::Hover,
        hover_delay: 500,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    let a = anchor("https://example.org/a");
    engine.handle_event(
        InputEvent::PointerEnteredLink {
            anchor: a.clone(),
            at: PointPx::new(110, 110),
        },
        start,
    );
    engine.handle_event(
        InputEvent::PointerLeftLink {
            anchor: a,
            at: PointPx::new(600, 600),
        },
        start + Duration::from_millis(100),
    );
    engine.handle_event(
        InputEvent::PointerMoved {
            at: PointPx::new(600, 600),
        },
        start + Duration::from_millis(120),
    );
    engine.tick(start + Duration::from_secs(5));
    assert_eq!(mounts(&engine.take_effects()), 0);

    // long press: release before the threshold
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::LongPress,
        long_press_delay: 500,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    engine.handle_event(
        InputEvent::PointerDown {
            at: PointPx::new(110, 110),
            button: PointerButton::Primary,
            anchor: Some(anchor("https://example.org/b")),
        },
        start,
    );
    engine.handle_event(
        InputEvent::PointerUp {
            at: PointPx::new(110, 110),
            button: PointerButton::Primary,
        },
        start + Duration::from_millis(200),
    );
    engine.tick(start + Duration::from_secs(5));
    assert_eq!(mounts(&engine.take_effects()), 0);

    // alt-hover: modifier released before the delay
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::AltHover,
        alt_hover_delay: 400,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    engine.handle_event(InputEvent::ModifierDown(ModifierKey::Alt), start);
    engine.handle_event(
        InputEvent::PointerEnteredLink {
            anchor: anchor("https://example.org/c"),
            at: PointPx::new(110, 110),
        },
        start,
    );
    engine.handle_event(
        InputEvent::ModifierUp(ModifierKey::Alt),
        start + Duration::from_millis(100),
    );
    engine.tick(start + Duration::from_secs(5));
    assert_eq!(mounts(&engine.take_effects()), 0);

    // any mode: tab hidden before the delay
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::Hover,
        hover_delay: 500,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    engine.handle_event(
        InputEvent::PointerEnteredLink {
            anchor: anchor("https://example.org/d"),
            at: PointPx::new(110, 110),
        },
        start,
    );
    engine.handle_event(
        InputEvent::VisibilityChanged { hidden: true },
        start + Duration::from_millis(100),
    );
    engine.tick(start + Duration::from_secs(5));
    assert_eq!(mounts(&engine.take_effects()), 0);
}

#[test]
fn pointer_churn_inside_anchor_bbox_keeps_trigger_alive() {
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::Hover,
        hover_delay: 500,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    let a = anchor("https://example.org/a");
    engine.handle_event(
        InputEvent::PointerEnteredLink {
            anchor: a.clone(),
            at: PointPx::new(110, 110),
        },
        start,
    );
    // a child element swap reports a leave, but the pointer never exits the
    // anchor's bounding box
    engine.handle_event(
        InputEvent::PointerLeftLink {
            anchor: a,
            at: PointPx::new(180, 112),
        },
        start + Duration::from_millis(100),
    );
    engine.handle_event(
        InputEvent::PointerMoved {
            at: PointPx::new(220, 114),
        },
        start + Duration::from_millis(120),
    );
    engine.tick(start + Duration::from_millis(300));
    engine.tick(start + Duration::from_millis(500));
    assert_eq!(mounts(&engine.take_effects()), 1);
}

#[test]
fn drag_link_opens_immediately() {
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::DragLink,
        ..TriggerConfig::default()
    });
    let now = Instant::now();
    engine.handle_event(
        InputEvent::DragEnded {
            at: PointPx::new(300, 300),
            anchor: Some(anchor("https://example.org/a")),
            selected_text: None,
        },
        now,
    );
    assert_eq!(mounts(&engine.take_effects()), 1);
}

#[test]
fn alt_click_suppresses_navigation_and_opens() {
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::AltClick,
        ..TriggerConfig::default()
    });
    let now = Instant::now();
    engine.handle_event(InputEvent::ModifierDown(ModifierKey::Alt), now);
    engine.handle_event(
        InputEvent::Click {
            at: PointPx::new(110, 110),
            anchor: Some(anchor("https://example.org/a")),
        },
        now,
    );
    let effects = engine.take_effects();
    assert!(effects.contains(&Effect::SuppressNativeNavigation));
    assert_eq!(mounts(&effects), 1);

    // without the modifier nothing happens
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::AltClick,
        ..TriggerConfig::default()
    });
    engine.handle_event(
        InputEvent::Click {
            at: PointPx::new(110, 110),
            anchor: Some(anchor("https://example.org/a")),
        },
        now,
    );
    assert_eq!(mounts(&engine.take_effects()), 0);
}

#[test]
fn long_press_fires_and_swallows_the_synthetic_click() {
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::LongPress,
        long_press_delay: 500,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    engine.handle_event(
        InputEvent::PointerDown {
            at: PointPx::new(110, 110),
            button: PointerButton::Primary,
            anchor: Some(anchor("https://example.org/a")),
        },
        start,
    );
    let effects = engine.take_effects();
    assert!(effects.iter().any(|e| matches!(e, Effect::ShowSpinner { .. })));

    engine.tick(start + Duration::from_millis(500));
    let effects = engine.take_effects();
    assert_eq!(mounts(&effects), 1);
    assert!(effects.contains(&Effect::HideSpinner));
    assert!(effects.contains(&Effect::InstallClickSuppressor));

    // the synthetic click from the button release must not dismiss the
    // freshly opened window
    engine.tick(start + Duration::from_millis(550));
    engine.handle_event(
        InputEvent::Click {
            at: PointPx::new(900, 900),
            anchor: None,
        },
        start + Duration::from_millis(560),
    );
    let effects = engine.take_effects();
    assert!(!effects.iter().any(|e| matches!(e, Effect::BeginClose { .. })));
}

#[test]
fn disabled_mode_never_triggers() {
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::Disabled,
        ..TriggerConfig::default()
    });
    let start = Instant::now();
    engine.handle_event(
        InputEvent::PointerEnteredLink {
            anchor: anchor("https://example.org/a"),
            at: PointPx::new(110, 110),
        },
        start,
    );
    engine.handle_event(
        InputEvent::DragEnded {
            at: PointPx::new(110, 110),
            anchor: Some(anchor("https://example.org/a")),
            selected_text: None,
        },
        start,
    );
    engine.tick(start + Duration::from_secs(20));
    assert_eq!(mounts(&engine.take_effects()), 0);
}

#[test]
fn blacklisted_page_host_disables_triggers() {
    let mut engine = Engine::attach(
        PageContext {
            viewport: Viewport::new(1920, 1080),
            page_url: "https://sub.example.com/thread".into(),
            embedded: false,
            frame_token: "test-token".into(),
            surface_ready: true,
        },
        TriggerConfig {
            trigger_mode: TriggerMode::Hover,
            hover_delay: 500,
            blacklist_sites: vec!["*.example.com".into()],
            ..TriggerConfig::default()
        },
        SearchSettings::default(),
    )
    .expect("surface ready");
    let start = Instant::now();
    engine.handle_event(
        InputEvent::PointerEnteredLink {
            anchor: anchor("https://elsewhere.org/a"),
            at: PointPx::new(110, 110),
        },
        start,
    );
    engine.tick(start + Duration::from_secs(5));
    assert_eq!(mounts(&engine.take_effects()), 0);
}

#[test]
fn dragged_text_routes_to_search_or_direct_preview() {
    let mut engine = engine_with(TriggerConfig {
        trigger_mode: TriggerMode::DragLink,
        ..TriggerConfig::default()
    });
    let now = Instant::now();

    // plain words become a search preview
    engine.handle_event(
        InputEvent::DragEnded {
            at: PointPx::new(300, 300),
            anchor: None,
            selected_text: Some("rust window manager".into()),
        },
        now,
    );
    let effects = engine.take_effects();
    let mount = effects.iter().find_map(|e| match e {
        Effect::MountWindow(init) => Some(init),
        _ => None,
    });
    assert!(mount.unwrap().url.contains("google.com/search"));

    // a dragged URL previews directly
    engine.handle_event(
        InputEvent::DragEnded {
            at: PointPx::new(300, 340),
            anchor: None,
            selected_text: Some("https://docs.rs/tracing".into()),
        },
        now,
    );
    let effects = engine.take_effects();
    let mount = effects.iter().find_map(|e| match e {
        Effect::MountWindow(init) => Some(init),
        _ => None,
    });
    assert_eq!(mount.unwrap().url, "https://docs.rs/tracing");
}
