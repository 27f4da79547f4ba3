//! User-facing configuration for trigger arbitration and preview chrome.
//!
//! A [`TriggerConfig`] is an immutable snapshot: the engine replaces it
//! wholesale when a settings-updated message arrives and never mutates
//! individual fields, so event handlers can't observe a half-applied update.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::theme::{CustomColors, ThemePref};

/// Valid range for every trigger delay. Out-of-range values are clamped,
/// never rejected.
pub const MIN_TRIGGER_DELAY_MS: u64 = 200;
pub const MAX_TRIGGER_DELAY_MS: u64 = 10_000;

/// How long a hover-leave must remain uncontradicted before the pending
/// trigger is cancelled. Tolerates sub-element churn inside an anchor and
/// travel into the preview surface.
pub const LEAVE_CONFIRM_MS: u64 = 150;

/// A held modifier is treated as released after this long without key events,
/// so a lost key-up (OS focus steal) can't wedge the gated modes.
pub const MODIFIER_AUTO_RELEASE_MS: u64 = 2_000;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerMode {
    #[default]
    DragLink,
    Hover,
    AltHover,
    AltClick,
    LongPress,
    Disabled,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModifierKey {
    #[default]
    Alt,
    Cmd,
    Ctrl,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SizePreset {
    Small,
    #[default]
    Medium,
    Large,
    Last,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PositionPref {
    #[default]
    Cursor,
    Left,
    Center,
    Right,
    Last,
}

/// Snapshot of the settings the arbitration engine and window manager read.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct TriggerConfig {
    pub trigger_mode: TriggerMode,
    pub hover_delay: u64,
    pub alt_hover_delay: u64,
    pub long_press_delay: u64,
    pub custom_trigger_key: ModifierKey,
    pub preview_size: SizePreset,
    pub preview_position: PositionPref,
    pub preview_theme: ThemePref,
    pub custom_theme_colors: Option<CustomColors>,
    pub overlay_opacity: u8,
    pub blacklist_sites: Vec<String>,
}

impl Default for TriggerConfig {
    fn default() -> Self {
        Self {
            trigger_mode: TriggerMode::default(),
            hover_delay: 500,
            alt_hover_delay: 200,
            long_press_delay: 500,
            custom_trigger_key: ModifierKey::default(),
            preview_size: SizePreset::default(),
            preview_position: PositionPref::default(),
            preview_theme: ThemePref::default(),
            custom_theme_colors: None,
            overlay_opacity: 50,
            blacklist_sites: Vec::new(),
        }
    }
}

impl TriggerConfig {
    /// Clamp every user-supplied numeric field into its valid range.
    pub fn sanitized(mut self) -> Self {
        self.hover_delay = clamp_delay(self.hover_delay);
        self.alt_hover_delay = clamp_delay(self.alt_hover_delay);
        self.long_press_delay = clamp_delay(self.long_press_delay);
        self.overlay_opacity = self.overlay_opacity.min(100);
        self
    }

    /// The arming delay for the currently configured mode. Modes that open on
    /// a discrete event (drag, modifier-click) have no delay.
    pub fn trigger_delay(&self) -> Option<Duration> {
        let ms = match self.trigger_mode {
            TriggerMode::Hover => self.hover_delay,
            TriggerMode::AltHover => self.alt_hover_delay,
            TriggerMode::LongPress => self.long_press_delay,
            TriggerMode::DragLink | TriggerMode::AltClick | TriggerMode::Disabled => return None,
        };
        Some(Duration::from_millis(ms))
    }

    /// Whether previews may open for `url` at all: http(s) scheme and a host
    /// that no blacklist pattern matches.
    pub fn allows_url(&self, url: &str) -> bool {
        let Ok(parsed) = Url::parse(url) else {
            return false;
        };
        if !matches!(parsed.scheme(), "http" | "https") {
            return false;
        }
        match parsed.host_str() {
            Some(host) => !self.blacklist_blocks(host),
            None => false,
        }
    }

    /// Hostname blacklist check. Patterns come in four forms:
    /// `.example.com` and `*.example.com` match the apex and any subdomain;
    /// anything else is a substring match (which subsumes exact hostnames).
    pub fn blacklist_blocks(&self, host: &str) -> bool {
        self.blacklist_sites.iter().any(|pattern| {
            let pattern = pattern.trim();
            if pattern.is_empty() {
                return false;
            }
            if let Some(suffix) = pattern
                .strip_prefix("*.")
                .or_else(|| pattern.strip_prefix('.'))
            {
                return host == suffix || host.ends_with(&format!(".{suffix}"));
            }
            host.contains(pattern)
        })
    }
}

fn clamp_delay(ms: u64) -> u64 {
    ms.clamp(MIN_TRIGGER_DELAY_MS, MAX_TRIGGER_DELAY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config_with_blacklist(patterns: &[&str]) -> TriggerConfig {
        TriggerConfig {
            blacklist_sites: patterns.iter().map(|s| s.to_string()).collect(),
            ..TriggerConfig::default()
        }
    }

    #[test]
    fn delays_clamp_into_range() {
        let config = TriggerConfig {
            hover_delay: 50,
            alt_hover_delay: 99_999,
            long_press_delay: 500,
            ..TriggerConfig::default()
        }
        .sanitized();
        assert_eq!(config.hover_delay, MIN_TRIGGER_DELAY_MS);
        assert_eq!(config.alt_hover_delay, MAX_TRIGGER_DELAY_MS);
        assert_eq!(config.long_press_delay, 500);
    }

    #[test]
    fn blacklist_matches_every_documented_form() {
        for pattern in ["sub.example.com", ".example.com", "*.example.com", "example"] {
            let config = config_with_blacklist(&[pattern]);
            assert!(
                config.blacklist_blocks("sub.example.com"),
                "pattern {pattern:?} should block sub.example.com"
            );
        }
    }

    #[test]
    fn blacklist_does_not_overmatch_hosts() {
        let config = config_with_blacklist(&["example.com"]);
        assert!(!config.blacklist_blocks("otherexample.org"));
        let config = config_with_blacklist(&[".example.com"]);
        assert!(!config.blacklist_blocks("notexample.com"));
    }

    #[test]
    fn non_http_schemes_never_preview() {
        let config = TriggerConfig::default();
        assert!(!config.allows_url("javascript:void(0)"));
        assert!(!config.allows_url("file:///etc/hosts"));
        assert!(config.allows_url("https://example.org/article"));
    }

    #[test]
    fn settings_json_round_trip() {
        let json = r#"{
            "triggerMode": "alt_hover",
            "altHoverDelay": 250,
            "customTriggerKey": "ctrl",
            "previewSize": "large",
            "previewPosition": "center",
            "previewTheme": "dark",
            "overlayOpacity": 70,
            "blacklistSites": ["*.example.com"]
        }"#;
        let config: TriggerConfig = serde_json::from_str(json).unwrap();
        assert_eq!(config.trigger_mode, TriggerMode::AltHover);
        assert_eq!(config.alt_hover_delay, 250);
        assert_eq!(config.custom_trigger_key, ModifierKey::Ctrl);
        // unspecified fields fall back to defaults
        assert_eq!(config.hover_delay, 500);
    }
}
