//! Color theme for the TUI.
//!
//! Dark and light themes over a zinc palette, with a five-step size gradient
//! shared by share-of-total colouring and absolute size tiers.

use ratatui::style::{Color, Modifier, Style};
use serde::{Deserialize, Serialize};

/// Theme variant (dark or light).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeVariant {
    #[default]
    Dark,
    Light,
}

/// Absolute size tiers used by the large-file spotlight.
const TIER_HUGE: u64 = 10_000_000_000;
const TIER_LARGE: u64 = 1_000_000_000;
const TIER_MEDIUM: u64 = 500_000_000;
const TIER_SMALL: u64 = 100_000_000;

/// Color theme for the TUI.
#[derive(Debug, Clone)]
pub struct Theme {
    /// Current theme variant.
    pub variant: ThemeVariant,

    // Base colors
    pub background: Color,
    pub foreground: Color,
    pub muted: Color,

    // Interactive elements
    pub selected: Style,
    pub marked: Style,

    // Size gradient, largest first
    pub size_huge: Color,
    pub size_large: Color,
    pub size_medium: Color,
    pub size_small: Color,
    pub size_tiny: Color,

    // Status colors
    pub success: Color,
    pub warning: Color,
    pub error: Color,
    pub info: Color,

    // UI elements
    pub border: Style,
    pub title: Style,
    pub help_key: Style,
    pub help_desc: Style,

    // Entries
    pub directory: Style,
    pub file: Style,
    pub folded: Style,
    pub pending: Style,

    // Progress
    pub progress_bar: Style,
    pub progress_bg: Style,

    // Header/Footer
    pub header: Style,
    pub footer: Style,
}

impl Theme {
    /// Dark theme.
    pub fn dark() -> Self {
        let zinc_50 = Color::Rgb(250, 250, 250);
        let zinc_100 = Color::Rgb(244, 244, 245);
        let zinc_300 = Color::Rgb(212, 212, 216);
        let zinc_400 = Color::Rgb(161, 161, 170);
        let zinc_500 = Color::Rgb(113, 113, 122);
        let zinc_600 = Color::Rgb(82, 82, 91);
        let zinc_700 = Color::Rgb(63, 63, 70);
        let zinc_800 = Color::Rgb(39, 39, 42);
        let zinc_900 = Color::Rgb(24, 24, 27);

        let sky_400 = Color::Rgb(56, 189, 248);
        let sky_500 = Color::Rgb(14, 165, 233);
        let emerald_500 = Color::Rgb(16, 185, 129);
        let yellow_400 = Color::Rgb(250, 204, 21);
        let orange_400 = Color::Rgb(251, 146, 60);
        let rose_500 = Color::Rgb(244, 63, 94);
        let violet_400 = Color::Rgb(167, 139, 250);
        let amber_400 = Color::Rgb(251, 191, 36);

        Self {
            variant: ThemeVariant::Dark,
            background: zinc_900,
            foreground: zinc_100,
            muted: zinc_500,

            selected: Style::new().bg(zinc_700).fg(zinc_50).add_modifier(Modifier::BOLD),
            marked: Style::new().fg(amber_400).add_modifier(Modifier::BOLD),

            size_huge: rose_500,
            size_large: orange_400,
            size_medium: yellow_400,
            size_small: emerald_500,
            size_tiny: zinc_600,

            success: emerald_500,
            warning: yellow_400,
            error: rose_500,
            info: sky_400,

            border: Style::new().fg(zinc_600),
            title: Style::new().fg(sky_400).add_modifier(Modifier::BOLD),
            help_key: Style::new().fg(sky_400).add_modifier(Modifier::BOLD),
            help_desc: Style::new().fg(zinc_400),

            directory: Style::new().fg(sky_500).add_modifier(Modifier::BOLD),
            file: Style::new().fg(zinc_300),
            folded: Style::new().fg(violet_400),
            pending: Style::new().fg(zinc_500).add_modifier(Modifier::ITALIC),

            progress_bar: Style::new().fg(sky_500),
            progress_bg: Style::new().fg(zinc_700),

            header: Style::new().bg(zinc_800).fg(zinc_100),
            footer: Style::new().bg(zinc_800).fg(zinc_400),
        }
    }

    /// Light theme.
    pub fn light() -> Self {
        let zinc_50 = Color::Rgb(250, 250, 250);
        let zinc_100 = Color::Rgb(244, 244, 245);
        let zinc_200 = Color::Rgb(228, 228, 231);
        let zinc_400 = Color::Rgb(161, 161, 170);
        let zinc_500 = Color::Rgb(113, 113, 122);
        let zinc_600 = Color::Rgb(82, 82, 91);
        let zinc_700 = Color::Rgb(63, 63, 70);
        let zinc_800 = Color::Rgb(39, 39, 42);
        let zinc_900 = Color::Rgb(24, 24, 27);

        let sky_700 = Color::Rgb(3, 105, 161);
        let emerald_600 = Color::Rgb(5, 150, 105);
        let yellow_600 = Color::Rgb(202, 138, 4);
        let orange_600 = Color::Rgb(234, 88, 12);
        let rose_600 = Color::Rgb(225, 29, 72);
        let violet_600 = Color::Rgb(124, 58, 237);
        let amber_600 = Color::Rgb(217, 119, 6);

        Self {
            variant: ThemeVariant::Light,
            background: zinc_50,
            foreground: zinc_900,
            muted: zinc_500,

            selected: Style::new().bg(zinc_200).fg(zinc_900).add_modifier(Modifier::BOLD),
            marked: Style::new().fg(amber_600).add_modifier(Modifier::BOLD),

            size_huge: rose_600,
            size_large: orange_600,
            size_medium: yellow_600,
            size_small: emerald_600,
            size_tiny: zinc_400,

            success: emerald_600,
            warning: yellow_600,
            error: rose_600,
            info: sky_700,

            border: Style::new().fg(zinc_400),
            title: Style::new().fg(sky_700).add_modifier(Modifier::BOLD),
            help_key: Style::new().fg(sky_700).add_modifier(Modifier::BOLD),
            help_desc: Style::new().fg(zinc_600),

            directory: Style::new().fg(sky_700).add_modifier(Modifier::BOLD),
            file: Style::new().fg(zinc_700),
            folded: Style::new().fg(violet_600),
            pending: Style::new().fg(zinc_500).add_modifier(Modifier::ITALIC),

            progress_bar: Style::new().fg(sky_700),
            progress_bg: Style::new().fg(zinc_200),

            header: Style::new().bg(zinc_100).fg(zinc_800),
            footer: Style::new().bg(zinc_100).fg(zinc_600),
        }
    }

    /// Create theme from variant.
    pub fn from_variant(variant: ThemeVariant) -> Self {
        match variant {
            ThemeVariant::Dark => Self::dark(),
            ThemeVariant::Light => Self::light(),
        }
    }

    /// Toggle between dark and light themes.
    pub fn toggle(&self) -> Self {
        match self.variant {
            ThemeVariant::Dark => Self::light(),
            ThemeVariant::Light => Self::dark(),
        }
    }

    /// Color for a share of the listing total (0.0 to 1.0).
    pub fn size_color(&self, share: f64) -> Color {
        match share {
            s if s > 0.50 => self.size_huge,
            s if s > 0.25 => self.size_large,
            s if s > 0.10 => self.size_medium,
            s if s > 0.01 => self.size_small,
            _ => self.size_tiny,
        }
    }

    /// Color for an absolute size, independent of its siblings.
    pub fn tier_color(&self, bytes: u64) -> Color {
        match bytes {
            b if b >= TIER_HUGE => self.size_huge,
            b if b >= TIER_LARGE => self.size_large,
            b if b >= TIER_MEDIUM => self.size_medium,
            b if b >= TIER_SMALL => self.size_small,
            _ => self.size_tiny,
        }
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_share_gradient() {
        let theme = Theme::dark();
        assert_eq!(theme.size_color(0.9926), theme.size_huge);
        assert_eq!(theme.size_color(0.30), theme.size_large);
        assert_eq!(theme.size_color(0.005), theme.size_tiny);
    }

    #[test]
    fn test_absolute_tiers() {
        let theme = Theme::light();
        assert_eq!(theme.tier_color(12_000_000_000), theme.size_huge);
        assert_eq!(theme.tier_color(1_000_000_000), theme.size_large);
        assert_eq!(theme.tier_color(600_000_000), theme.size_medium);
        assert_eq!(theme.tier_color(100_000_000), theme.size_small);
        assert_eq!(theme.tier_color(99_999_999), theme.size_tiny);
    }

    #[test]
    fn test_toggle() {
        assert_eq!(Theme::dark().toggle().variant, ThemeVariant::Light);
        assert_eq!(Theme::light().toggle().variant, ThemeVariant::Dark);
    }
}
