//! Theme system for the TUI.
//!
//! Provides semantic color roles that map to ratatui `Style` values.
//! The `ThemeVariant` enum selects between Dark and Light palettes,
//! and `StyleMap` resolves role names to concrete styles.

use ratatui::style::{Color, Modifier, Style};
use std::collections::HashMap;

// ============================================================================
// Theme Variant
// ============================================================================

/// Available theme variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThemeVariant {
    Dark,
    Light,
}

impl ThemeVariant {
    /// Parse a variant name from a string (case-insensitive).
    pub fn from_str_name(s: &str) -> Option<Self> {
        match s.to_ascii_lowercase().as_str() {
            "dark" => Some(Self::Dark),
            "light" => Some(Self::Light),
            _ => None,
        }
    }

    pub fn palette(self) -> ColorPalette {
        match self {
            Self::Dark => ColorPalette::dark(),
            Self::Light => ColorPalette::light(),
        }
    }

    /// Cycle to the next variant: Dark → Light → Dark.
    pub fn next(self) -> Self {
        match self {
            Self::Dark => Self::Light,
            Self::Light => Self::Dark,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Dark => "Dark",
            Self::Light => "Light",
        }
    }
}

// ============================================================================
// Color Palette
// ============================================================================

/// A complete color palette mapping every semantic UI role to a `Style`.
#[derive(Debug, Clone)]
pub struct ColorPalette {
    // -- List --
    pub item_name: Style,
    pub item_meta: Style,
    pub item_selected: Style,

    // -- Forms --
    pub form_label: Style,
    pub form_input: Style,
    pub suggestion: Style,
    pub suggestion_selected: Style,
    pub shopper_active: Style,
    pub error_text: Style,
    pub loading_text: Style,

    // -- Cat --
    pub cat_heading: Style,
    pub cat_link: Style,

    // -- Chrome --
    pub status_bar: Style,
    pub panel_border: Style,
    pub panel_border_focused: Style,
}

impl ColorPalette {
    fn dark() -> Self {
        Self {
            item_name: Style::default().add_modifier(Modifier::BOLD),
            item_meta: Style::default().fg(Color::DarkGray),
            item_selected: Style::default().bg(Color::DarkGray).fg(Color::White),

            form_label: Style::default().add_modifier(Modifier::BOLD),
            form_input: Style::default().fg(Color::White).bg(Color::Black),
            suggestion: Style::default().fg(Color::Cyan),
            suggestion_selected: Style::default()
                .bg(Color::Cyan)
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            shopper_active: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::BOLD),
            error_text: Style::default().fg(Color::Red),
            loading_text: Style::default()
                .fg(Color::Yellow)
                .add_modifier(Modifier::ITALIC),

            cat_heading: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            cat_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            status_bar: Style::default().bg(Color::DarkGray).fg(Color::White),
            panel_border: Style::default(),
            panel_border_focused: Style::default().fg(Color::Cyan),
        }
    }

    fn light() -> Self {
        Self {
            item_name: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            item_meta: Style::default().fg(Color::DarkGray),
            item_selected: Style::default().bg(Color::Blue).fg(Color::White),

            form_label: Style::default()
                .fg(Color::Black)
                .add_modifier(Modifier::BOLD),
            form_input: Style::default().fg(Color::Black).bg(Color::White),
            suggestion: Style::default().fg(Color::Blue),
            suggestion_selected: Style::default()
                .bg(Color::Blue)
                .fg(Color::White)
                .add_modifier(Modifier::BOLD),
            shopper_active: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            error_text: Style::default().fg(Color::Red),
            loading_text: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::ITALIC),

            cat_heading: Style::default()
                .fg(Color::Magenta)
                .add_modifier(Modifier::BOLD),
            cat_link: Style::default()
                .fg(Color::Blue)
                .add_modifier(Modifier::UNDERLINED),

            status_bar: Style::default().bg(Color::White).fg(Color::Black),
            panel_border: Style::default().fg(Color::DarkGray),
            panel_border_focused: Style::default().fg(Color::Blue),
        }
    }
}

// ============================================================================
// Style Map
// ============================================================================

/// String-keyed style lookup, so render code can name roles without holding
/// the whole palette.
#[derive(Debug, Clone)]
pub struct StyleMap {
    map: HashMap<&'static str, Style>,
}

/// All semantic role names, in declaration order.
const ROLE_NAMES: [&str; 15] = [
    "item_name",
    "item_meta",
    "item_selected",
    "form_label",
    "form_input",
    "suggestion",
    "suggestion_selected",
    "shopper_active",
    "error_text",
    "loading_text",
    "cat_heading",
    "cat_link",
    "status_bar",
    "panel_border",
    "panel_border_focused",
];

impl StyleMap {
    pub fn from_palette(p: &ColorPalette) -> Self {
        let styles: [Style; 15] = [
            p.item_name,
            p.item_meta,
            p.item_selected,
            p.form_label,
            p.form_input,
            p.suggestion,
            p.suggestion_selected,
            p.shopper_active,
            p.error_text,
            p.loading_text,
            p.cat_heading,
            p.cat_link,
            p.status_bar,
            p.panel_border,
            p.panel_border_focused,
        ];

        let map = ROLE_NAMES.iter().copied().zip(styles).collect();
        Self { map }
    }

    /// Resolve a role name to its `Style`. Returns `Style::default()` for unknown roles.
    pub fn resolve(&self, role: &str) -> Style {
        self.map.get(role).copied().unwrap_or_default()
    }
}

// ============================================================================
// Tests
// ============================================================================
