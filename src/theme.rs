//! Preview chrome palettes.
//!
//! Built-in light/dark palettes mirror the extension chrome; a custom theme
//! derives its secondary colors (header, border, summary) from the two
//! user-picked base colors with plain RGB arithmetic.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ThemePref {
    Light,
    #[default]
    Dark,
    Custom,
}

/// User-picked base colors for the custom theme, as `#rrggbb` strings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomColors {
    pub bg: String,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Rgb {
    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` (or `rrggbb`) hex string.
    pub fn parse_hex(value: &str) -> Option<Self> {
        let hex = value.trim().strip_prefix('#').unwrap_or(value.trim());
        if hex.len() != 6 {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self { r, g, b })
    }

    pub fn to_hex(self) -> String {
        format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
    }

    /// Perceived lightness on 0..=255, used to decide which direction to
    /// shade derived colors.
    pub fn luminance(self) -> u8 {
        let lum =
            0.299 * f64::from(self.r) + 0.587 * f64::from(self.g) + 0.114 * f64::from(self.b);
        lum.round() as u8
    }
}

/// Lighten (`amount > 0`) or darken (`amount < 0`) a color, saturating each
/// channel at its bounds.
pub fn adjust(color: Rgb, amount: i16) -> Rgb {
    let shift = |channel: u8| -> u8 { (i16::from(channel) + amount).clamp(0, 255) as u8 };
    Rgb::new(shift(color.r), shift(color.g), shift(color.b))
}

/// Concrete palette handed to the host when mounting a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Palette {
    pub bg: Rgb,
    pub text: Rgb,
    pub header_bg: Rgb,
    pub border: Rgb,
    pub accent: Rgb,
}

pub const ACCENT_RGB: Rgb = Rgb::new(0, 123, 255);

pub fn light() -> Palette {
    Palette {
        bg: Rgb::new(0xff, 0xff, 0xff),
        text: Rgb::new(0x33, 0x33, 0x33),
        header_bg: Rgb::new(0xf5, 0xf5, 0xf5),
        border: Rgb::new(0xe0, 0xe0, 0xe0),
        accent: ACCENT_RGB,
    }
}

pub fn dark() -> Palette {
    Palette {
        bg: Rgb::new(0x3c, 0x3c, 0x3c),
        text: Rgb::new(0xe0, 0xe0, 0xe0),
        header_bg: Rgb::new(0x30, 0x30, 0x30),
        border: Rgb::new(0x44, 0x44, 0x44),
        accent: Rgb::new(0x03, 0x69, 0x9d),
    }
}

/// Derive a full palette from the two custom base colors. Light backgrounds
/// shade downward for header/border, dark backgrounds shade upward.
pub fn custom(colors: &CustomColors) -> Palette {
    let fallback = light();
    let bg = Rgb::parse_hex(&colors.bg).unwrap_or(fallback.bg);
    let text = Rgb::parse_hex(&colors.text).unwrap_or(fallback.text);
    let direction = if bg.luminance() >= 128 { -1 } else { 1 };
    Palette {
        bg,
        text,
        header_bg: adjust(bg, direction * 12),
        border: adjust(bg, direction * 28),
        accent: ACCENT_RGB,
    }
}

/// Resolve the configured theme preference to a palette.
pub fn resolve(pref: ThemePref, custom_colors: Option<&CustomColors>) -> Palette {
    match pref {
        ThemePref::Light => light(),
        ThemePref::Dark => dark(),
        ThemePref::Custom => match custom_colors {
            Some(colors) => custom(colors),
            None => light(),
        },
    }
}
