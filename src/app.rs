use crate::cat::CatWidget;
use crate::config::{Config, Shoppers};
use crate::keybindings::{Context, KeybindingRegistry};
use crate::list::{Effect, ListController, ListState, Outcome, ShoppingItem, Suggestions};
use crate::remote::{Backend, Credential};
use crate::storage::{keys, Database, KeyValueStore};
use crate::theme::{StyleMap, ThemeVariant};
use anyhow::Result;
use ratatui::style::Style;
use std::borrow::Cow;
use tokio::time::Instant;

/// How long a status message stays visible.
const STATUS_TTL_SECS: u64 = 3;

/// Which panel receives panel-level keys.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    List,
    Cat,
}

/// Events from background tasks
#[derive(Debug)]
pub enum AppEvent {
    /// A remote request finished (or was abandoned) and must be settled.
    List(Outcome),
    TaskPanicked {
        task: &'static str,
        error: String,
    },
}

// ============================================================================
// Application State
// ============================================================================

/// Central application state
pub struct App {
    pub db: Database,
    pub backend: Backend,

    pub list: ListController,
    pub cat: CatWidget,
    pub cat_api_base: String,
    pub shoppers: Shoppers,

    // Theme
    pub theme_variant: ThemeVariant,
    pub theme: StyleMap,

    /// Keybinding registry with config overrides applied.
    pub keybindings: KeybindingRegistry,

    // UI State
    pub focus: Focus,
    /// Index into the active items.
    pub selected_item: usize,
    /// Highlighted autocomplete entry in the add form.
    pub selected_suggestion: Option<usize>,

    // Status message with expiry; Cow avoids allocation for static literals
    pub status_message: Option<(Cow<'static, str>, Instant)>,

    /// Dirty flag to skip unnecessary frame renders
    pub needs_redraw: bool,

    pub show_help: bool,
    pub help_scroll_offset: usize,

    /// The request currently in flight, aborted on drop.
    pub remote_task: Option<tokio::task::JoinHandle<()>>,
}

impl App {
    /// Build the app from config, reading suggestions and cat preferences
    /// from local state.
    pub async fn new(db: Database, backend: Backend, config: &Config) -> Result<Self> {
        let stored = db.get(keys::SUGGESTIONS).await?;
        let suggestions = Suggestions::from_stored(stored.as_deref());
        let cat = CatWidget::load(&db).await;

        let theme_variant = ThemeVariant::from_str_name(&config.theme).unwrap_or_else(|| {
            tracing::warn!(theme = %config.theme, "Unknown theme, using dark");
            ThemeVariant::Dark
        });

        let mut keybindings = KeybindingRegistry::new();
        for warning in keybindings.apply_overrides(&config.keybindings) {
            tracing::warn!("{}", warning);
        }

        Ok(Self {
            db,
            backend,
            list: ListController::new(suggestions, config.refresh_before_edit),
            cat,
            cat_api_base: config.cat_api_base.clone(),
            shoppers: config.shoppers.clone(),
            theme_variant,
            theme: StyleMap::from_palette(&theme_variant.palette()),
            keybindings,
            focus: Focus::List,
            selected_item: 0,
            selected_suggestion: None,
            status_message: None,
            needs_redraw: true,
            show_help: false,
            help_scroll_offset: 0,
            remote_task: None,
        })
    }

    /// Effects for the first frame: load the list if a password is remembered.
    pub async fn startup(&mut self, password: Option<Credential>) -> Result<Vec<Effect>> {
        if let Some(credential) = password {
            self.list.set_credential(credential);
            return Ok(self.list.submit_credential());
        }
        let stored = self.db.get(keys::CREDENTIAL).await?;
        Ok(self.list.startup(stored.map(Credential::new)))
    }

    /// Resolve a semantic role name to its `Style`.
    pub fn style(&self, role: &str) -> Style {
        self.theme.resolve(role)
    }

    pub fn set_theme(&mut self, variant: ThemeVariant) {
        self.theme_variant = variant;
        self.theme = StyleMap::from_palette(&variant.palette());
        self.needs_redraw = true;
    }

    /// Cycle to the next theme variant and return its name.
    pub fn cycle_theme(&mut self) -> &'static str {
        let next = self.theme_variant.next();
        self.set_theme(next);
        next.name()
    }

    /// Set status message (will auto-expire after 3 seconds)
    pub fn set_status(&mut self, msg: impl Into<Cow<'static, str>>) {
        self.status_message = Some((msg.into(), Instant::now()));
    }

    /// Clear status message if expired. Returns true if a message was cleared.
    pub fn clear_expired_status(&mut self) -> bool {
        if let Some((_, time)) = &self.status_message {
            if time.elapsed().as_secs() >= STATUS_TTL_SECS {
                self.status_message = None;
                return true;
            }
        }
        false
    }

    /// Keybinding context for the current screen.
    pub fn input_context(&self) -> Context {
        if self.show_help {
            return Context::Help;
        }
        if self.focus == Focus::Cat {
            return Context::Cat;
        }
        match self.list.state() {
            ListState::Unauthenticated => Context::Login,
            ListState::AddingItem => Context::AddForm,
            _ => Context::List,
        }
    }

    /// Text shown while a request is in flight.
    pub fn busy_message(&self) -> Option<&'static str> {
        match self.list.state() {
            ListState::Loading => Some("Loading the shopping list!"),
            ListState::Sending if !self.list.form().name.trim().is_empty() => {
                Some("Adding your item!")
            }
            ListState::Sending => Some("Updating the list!"),
            _ => None,
        }
    }

    pub fn cycle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::List => Focus::Cat,
            Focus::Cat => Focus::List,
        };
    }

    // ------------------------------------------------------------------------
    // Navigation
    // ------------------------------------------------------------------------

    pub fn selected(&self) -> Option<&ShoppingItem> {
        self.list.items().active().nth(self.selected_item)
    }

    pub fn nav_down(&mut self) {
        let len = self.list.items().active_len();
        if self.selected_item + 1 < len {
            self.selected_item += 1;
        }
    }

    pub fn nav_up(&mut self) {
        self.selected_item = self.selected_item.saturating_sub(1);
    }

    /// Keep the selection inside the list after it changes underneath us.
    pub fn clamp_selection(&mut self) {
        let len = self.list.items().active_len();
        self.selected_item = self.selected_item.min(len.saturating_sub(1));
    }

    pub fn next_suggestion(&mut self) {
        let count = self.list.matching_suggestions().len();
        if count == 0 {
            self.selected_suggestion = None;
            return;
        }
        self.selected_suggestion = Some(match self.selected_suggestion {
            Some(i) if i + 1 < count => i + 1,
            Some(i) => i,
            None => 0,
        });
    }

    pub fn prev_suggestion(&mut self) {
        self.selected_suggestion = match self.selected_suggestion {
            Some(0) | None => None,
            Some(i) => Some(i - 1),
        };
    }

    /// Copy the highlighted suggestion (or the first one) into the form.
    pub fn accept_suggestion(&mut self) -> bool {
        let index = self.selected_suggestion.unwrap_or(0);
        let Some(choice) = self
            .list
            .matching_suggestions()
            .get(index)
            .map(|s| s.to_string())
        else {
            return false;
        };
        self.list.set_form_name(choice);
        self.selected_suggestion = None;
        true
    }
}

/// Abort the in-flight request when the app goes away.
impl Drop for App {
    fn drop(&mut self) {
        if let Some(handle) = self.remote_task.take() {
            handle.abort();
            tracing::debug!("Aborted remote task on App drop");
        }
    }
}
