//! Keybinding registry: maps actions to key events with config overrides.
//!
//! Bindings are data, not match arms, so the `[keybindings]` table in
//! config.toml can move any action to another key.
use crossterm::event::{KeyCode, KeyModifiers};
use std::collections::HashMap;

// ============================================================================
// Action Enum
// ============================================================================

/// All user-facing actions that can be triggered by keybindings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Action {
    Quit,
    NavDown,
    NavUp,
    CycleFocus,
    Back,
    CycleTheme,
    ShowHelp,
    // List panel
    AddItem,
    RemoveItem,
    Refresh,
    SignOut,
    // Forms
    Submit,
    NextSuggestion,
    PrevSuggestion,
    AcceptSuggestion,
    ToggleShopper,
    // Cat panel
    NextCat,
    ToggleGif,
    ToggleCats,
    OpenCat,
}

impl Action {
    /// Human-readable description for the help screen.
    pub fn describe(self) -> &'static str {
        match self {
            Self::Quit => "Quit application",
            Self::NavDown => "Navigate down",
            Self::NavUp => "Navigate up",
            Self::CycleFocus => "Switch between list and cat",
            Self::Back => "Go back / cancel",
            Self::CycleTheme => "Cycle theme",
            Self::ShowHelp => "Show help",
            Self::AddItem => "Add an item",
            Self::RemoveItem => "Remove selected item",
            Self::Refresh => "Reload the list",
            Self::SignOut => "Sign out and forget password",
            Self::Submit => "Submit",
            Self::NextSuggestion => "Next suggestion",
            Self::PrevSuggestion => "Previous suggestion",
            Self::AcceptSuggestion => "Use highlighted suggestion",
            Self::ToggleShopper => "Switch who ordered it",
            Self::NextCat => "I don't like the look of this cat",
            Self::ToggleGif => "Switch between pictures and gifs",
            Self::ToggleCats => "Opt out of / back in to cats",
            Self::OpenCat => "Open cat in browser",
        }
    }
}

// ============================================================================
// Context Enum
// ============================================================================

/// Dispatch context: determines which bindings are active.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Context {
    Global,
    List,
    Cat,
    Login,
    AddForm,
    Help,
}

impl Context {
    /// Contexts where printable keys are typed into a text field.
    pub fn is_text_entry(self) -> bool {
        matches!(self, Context::Login | Context::AddForm)
    }

    pub fn label(self) -> &'static str {
        match self {
            Context::Global => "Global",
            Context::List => "List",
            Context::Cat => "Cat",
            Context::Login => "Password",
            Context::AddForm => "Add item",
            Context::Help => "Help",
        }
    }
}

// ============================================================================
// Key Specification
// ============================================================================

/// A key event: code + modifiers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct KeySpec {
    pub code: KeyCode,
    pub modifiers: KeyModifiers,
}

impl KeySpec {
    pub const fn new(code: KeyCode, modifiers: KeyModifiers) -> Self {
        Self { code, modifiers }
    }

    pub const fn plain(code: KeyCode) -> Self {
        Self::new(code, KeyModifiers::NONE)
    }

    pub const fn ctrl(c: char) -> Self {
        Self::new(KeyCode::Char(c), KeyModifiers::CONTROL)
    }
}

/// Parse a key string from config into a KeySpec.
///
/// Supported formats:
/// - Single char: "q", "j", "+"
/// - Named keys: "Enter", "Esc", "Tab", "BackTab", "Up", "Down", "Delete"
/// - Modifier combos: "Ctrl+d"
/// - Function keys: "F1" through "F12"
fn parse_key_string(s: &str) -> Option<KeySpec> {
    let s = s.trim();

    if let Some(rest) = s.strip_prefix("Ctrl+") {
        let mut chars = rest.trim().chars();
        return match (chars.next(), chars.next()) {
            (Some(c), None) => Some(KeySpec::ctrl(c)),
            _ => None,
        };
    }

    match s.to_lowercase().as_str() {
        "enter" | "return" => return Some(KeySpec::plain(KeyCode::Enter)),
        "esc" | "escape" => return Some(KeySpec::plain(KeyCode::Esc)),
        "tab" => return Some(KeySpec::plain(KeyCode::Tab)),
        "backtab" | "shift+tab" => return Some(KeySpec::new(KeyCode::BackTab, KeyModifiers::SHIFT)),
        "up" => return Some(KeySpec::plain(KeyCode::Up)),
        "down" => return Some(KeySpec::plain(KeyCode::Down)),
        "left" => return Some(KeySpec::plain(KeyCode::Left)),
        "right" => return Some(KeySpec::plain(KeyCode::Right)),
        "backspace" => return Some(KeySpec::plain(KeyCode::Backspace)),
        "delete" | "del" => return Some(KeySpec::plain(KeyCode::Delete)),
        "space" => return Some(KeySpec::plain(KeyCode::Char(' '))),
        _ => {}
    }

    if let Some(n) = s.strip_prefix(['F', 'f']).and_then(|n| n.parse::<u8>().ok()) {
        if (1..=12).contains(&n) {
            return Some(KeySpec::plain(KeyCode::F(n)));
        }
        return None;
    }

    let mut chars = s.chars();
    match (chars.next(), chars.next()) {
        (Some(c), None) => Some(KeySpec::plain(KeyCode::Char(c))),
        _ => None,
    }
}

/// Format a KeySpec as a human-readable string for the help screen.
fn format_key(key: &KeySpec) -> String {
    let modifier = if key.modifiers.contains(KeyModifiers::CONTROL) {
        "Ctrl+"
    } else {
        ""
    };

    let key_name = match key.code {
        KeyCode::Char(' ') => "Space".to_string(),
        KeyCode::Char(c) => c.to_string(),
        KeyCode::Enter => "Enter".to_string(),
        KeyCode::Esc => "Esc".to_string(),
        KeyCode::Tab => "Tab".to_string(),
        KeyCode::BackTab => "Shift+Tab".to_string(),
        KeyCode::Up => "Up".to_string(),
        KeyCode::Down => "Down".to_string(),
        KeyCode::Left => "Left".to_string(),
        KeyCode::Right => "Right".to_string(),
        KeyCode::Backspace => "Backspace".to_string(),
        KeyCode::Delete => "Delete".to_string(),
        KeyCode::F(n) => format!("F{}", n),
        _ => "?".to_string(),
    };

    format!("{}{}", modifier, key_name)
}

// ============================================================================
// Keybinding Registry
// ============================================================================

/// Registry of keybindings, supporting default bindings and config overrides.
///
/// The same key can map to different actions in different contexts; lookups
/// fall back to [`Context::Global`].
pub struct KeybindingRegistry {
    lookup: HashMap<(Context, KeySpec), Action>,
    /// All bindings in registration order, for the help screen
    bindings: Vec<(Context, KeySpec, Action)>,
}

impl KeybindingRegistry {
    pub fn new() -> Self {
        let mut registry = Self {
            lookup: HashMap::new(),
            bindings: Vec::new(),
        };
        registry.register_defaults();
        registry
    }

    fn bind(&mut self, context: Context, key: KeySpec, action: Action) {
        self.lookup.insert((context, key), action);
        self.bindings.push((context, key, action));
    }

    fn register_defaults(&mut self) {
        use Context::*;
        use KeyCode::*;

        // === Global ===
        self.bind(Global, KeySpec::plain(Char('q')), Action::Quit);
        self.bind(Global, KeySpec::ctrl('c'), Action::Quit);
        self.bind(Global, KeySpec::plain(Char('j')), Action::NavDown);
        self.bind(Global, KeySpec::plain(Down), Action::NavDown);
        self.bind(Global, KeySpec::plain(Char('k')), Action::NavUp);
        self.bind(Global, KeySpec::plain(Up), Action::NavUp);
        self.bind(Global, KeySpec::plain(Tab), Action::CycleFocus);
        self.bind(Global, KeySpec::plain(Esc), Action::Back);
        self.bind(Global, KeySpec::plain(Char('T')), Action::CycleTheme);
        self.bind(Global, KeySpec::plain(Char('?')), Action::ShowHelp);

        // === List panel ===
        self.bind(List, KeySpec::plain(Char('a')), Action::AddItem);
        self.bind(List, KeySpec::plain(Char('d')), Action::RemoveItem);
        self.bind(List, KeySpec::plain(Delete), Action::RemoveItem);
        self.bind(List, KeySpec::plain(Char('r')), Action::Refresh);
        self.bind(List, KeySpec::plain(Char('L')), Action::SignOut);

        // === Cat panel ===
        self.bind(Cat, KeySpec::plain(Char('n')), Action::NextCat);
        self.bind(Cat, KeySpec::plain(Char('g')), Action::ToggleGif);
        self.bind(Cat, KeySpec::plain(Char('c')), Action::ToggleCats);
        self.bind(Cat, KeySpec::plain(Char('o')), Action::OpenCat);

        // === Password form ===
        self.bind(Login, KeySpec::plain(Enter), Action::Submit);
        self.bind(Login, KeySpec::plain(Tab), Action::CycleFocus);

        // === Add-item form ===
        self.bind(AddForm, KeySpec::plain(Enter), Action::Submit);
        self.bind(AddForm, KeySpec::plain(Esc), Action::Back);
        self.bind(AddForm, KeySpec::plain(Down), Action::NextSuggestion);
        self.bind(AddForm, KeySpec::plain(Up), Action::PrevSuggestion);
        self.bind(AddForm, KeySpec::plain(Tab), Action::AcceptSuggestion);
        self.bind(
            AddForm,
            KeySpec::new(BackTab, KeyModifiers::SHIFT),
            Action::ToggleShopper,
        );
        self.bind(AddForm, KeySpec::plain(Left), Action::ToggleShopper);
        self.bind(AddForm, KeySpec::plain(Right), Action::ToggleShopper);

        // === Help overlay ===
        self.bind(Help, KeySpec::plain(Char('?')), Action::Back);
        self.bind(Help, KeySpec::plain(Char('q')), Action::Back);
    }

    /// Apply user overrides from config keybindings map.
    ///
    /// Keys in the map are action names (e.g., "quit", "add_item").
    /// Values are key strings (e.g., "q", "Ctrl+d", "F5").
    ///
    /// Returns a list of warnings for unrecognized action names or unparseable keys.
    pub fn apply_overrides(&mut self, overrides: &HashMap<String, String>) -> Vec<String> {
        let mut warnings = Vec::new();

        for (action_name, key_str) in overrides {
            let Some(action) = parse_action_name(action_name) else {
                warnings.push(format!("Unknown action '{}', ignoring", action_name));
                continue;
            };

            let Some(key) = parse_key_string(key_str) else {
                warnings.push(format!(
                    "Cannot parse key '{}' for action '{}', ignoring",
                    key_str, action_name
                ));
                continue;
            };

            let mut contexts: Vec<Context> = Vec::new();
            for (ctx, _, a) in &self.bindings {
                if *a == action && !contexts.contains(ctx) {
                    contexts.push(*ctx);
                }
            }

            self.lookup.retain(|_, a| *a != action);
            self.bindings.retain(|(_, _, a)| *a != action);

            for ctx in contexts {
                self.bind(ctx, key, action);
            }

            tracing::info!(
                action = %action_name,
                key = %key_str,
                "Applied keybinding override"
            );
        }

        warnings
    }

    /// Look up the action for a given key in a given context.
    ///
    /// Tries the specific context first, then falls back to Global. Text-entry
    /// contexts only fall back for Ctrl combinations, so typing "q" into a
    /// form does not quit.
    ///
    /// Terminals report uppercase letters with SHIFT set; the case of the
    /// character already carries it, so SHIFT is ignored for `Char` keys.
    pub fn action_for_key(
        &self,
        code: KeyCode,
        mut modifiers: KeyModifiers,
        context: Context,
    ) -> Option<Action> {
        if matches!(code, KeyCode::Char(_)) {
            modifiers.remove(KeyModifiers::SHIFT);
        }
        let key = KeySpec::new(code, modifiers);

        if let Some(&action) = self.lookup.get(&(context, key)) {
            return Some(action);
        }

        if context == Context::Global {
            return None;
        }
        if context.is_text_entry() && !modifiers.contains(KeyModifiers::CONTROL) {
            return None;
        }

        self.lookup.get(&(Context::Global, key)).copied()
    }

    /// Get all bindings for the help screen.
    ///
    /// Returns (context, key_display_string, action, description) tuples.
    pub fn all_bindings(&self) -> Vec<(Context, String, Action, &'static str)> {
        self.bindings
            .iter()
            .map(|(ctx, key, action)| (*ctx, format_key(key), *action, action.describe()))
            .collect()
    }
}

impl Default for KeybindingRegistry {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse an action name string (from config) into an Action enum.
fn parse_action_name(name: &str) -> Option<Action> {
    match name.to_lowercase().as_str() {
        "quit" => Some(Action::Quit),
        "nav_down" | "down" => Some(Action::NavDown),
        "nav_up" | "up" => Some(Action::NavUp),
        "cycle_focus" | "focus" => Some(Action::CycleFocus),
        "back" | "cancel" => Some(Action::Back),
        "cycle_theme" | "theme" => Some(Action::CycleTheme),
        "show_help" | "help" => Some(Action::ShowHelp),
        "add_item" | "add" => Some(Action::AddItem),
        "remove_item" | "remove" | "delete" => Some(Action::RemoveItem),
        "refresh" | "reload" => Some(Action::Refresh),
        "sign_out" | "logout" => Some(Action::SignOut),
        "submit" => Some(Action::Submit),
        "next_suggestion" => Some(Action::NextSuggestion),
        "prev_suggestion" => Some(Action::PrevSuggestion),
        "accept_suggestion" => Some(Action::AcceptSuggestion),
        "toggle_shopper" | "shopper" => Some(Action::ToggleShopper),
        "next_cat" | "reroll" => Some(Action::NextCat),
        "toggle_gif" | "gif" => Some(Action::ToggleGif),
        "toggle_cats" | "cats" => Some(Action::ToggleCats),
        "open_cat" | "open" => Some(Action::OpenCat),
        _ => None,
    }
}

// ============================================================================
// Tests
// ============================================================================
