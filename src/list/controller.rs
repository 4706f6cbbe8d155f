use chrono::{DateTime, Utc};

use crate::remote::{Credential, StoreError};
use crate::util::clean_remote_text;

use super::effects::{Effect, Outcome};
use super::suggestions::Suggestions;
use super::types::{Mutation, ShoppingItem, ShoppingList, Shopper};

/// Where the list screen is.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ListState {
    /// Waiting for a password.
    Unauthenticated,
    /// A fetch is in flight.
    Loading,
    /// The confirmed list is shown.
    Loaded,
    /// The add-item form is open.
    AddingItem,
    /// A write (and its reconciling fetch) is in flight.
    Sending,
}

impl ListState {
    pub fn is_busy(self) -> bool {
        matches!(self, ListState::Loading | ListState::Sending)
    }
}

/// The add-item form.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemForm {
    pub name: String,
    pub ordered_by: Shopper,
}

impl Default for ItemForm {
    fn default() -> Self {
        Self {
            name: String::new(),
            ordered_by: Shopper::UserA,
        }
    }
}

/// What a fetch leads to once it succeeds.
#[derive(Debug, Clone, PartialEq, Eq)]
enum FetchPurpose {
    Load,
    OpenForm,
    Remove(String),
    Reconcile,
}

#[derive(Debug)]
enum InFlight {
    Fetch {
        generation: u64,
        purpose: FetchPurpose,
    },
    Write {
        generation: u64,
        return_to: ListState,
    },
}

/// State machine behind the list screen.
///
/// Transitions return [`Effect`]s; the driver performs them and feeds remote
/// results back through [`ListController::settle`]. At most one remote effect
/// is outstanding, and input that would start another is ignored while busy.
#[derive(Debug)]
pub struct ListController {
    state: ListState,
    credential: Credential,
    items: ShoppingList,
    form: ItemForm,
    suggestions: Suggestions,
    error: Option<String>,
    refresh_before_edit: bool,
    generation: u64,
    in_flight: Option<InFlight>,
}

impl ListController {
    pub fn new(suggestions: Suggestions, refresh_before_edit: bool) -> Self {
        Self {
            state: ListState::Unauthenticated,
            credential: Credential::default(),
            items: ShoppingList::default(),
            form: ItemForm::default(),
            suggestions,
            error: None,
            refresh_before_edit,
            generation: 0,
            in_flight: None,
        }
    }

    // ------------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------------

    pub fn state(&self) -> ListState {
        self.state
    }

    pub fn items(&self) -> &ShoppingList {
        &self.items
    }

    pub fn form(&self) -> &ItemForm {
        &self.form
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn suggestions(&self) -> &Suggestions {
        &self.suggestions
    }

    /// Suggestions for the current form input.
    pub fn matching_suggestions(&self) -> Vec<&str> {
        self.suggestions.matching(&self.form.name)
    }

    pub fn credential(&self) -> &Credential {
        &self.credential
    }

    /// Whether an outcome for `generation` would still be applied.
    pub fn is_current(&self, generation: u64) -> bool {
        match self.in_flight {
            Some(InFlight::Fetch { generation: g, .. })
            | Some(InFlight::Write { generation: g, .. }) => g == generation,
            None => false,
        }
    }

    // ------------------------------------------------------------------------
    // Form editing
    // ------------------------------------------------------------------------

    /// Replace the password being typed. Ignored unless unauthenticated.
    pub fn set_credential(&mut self, credential: Credential) {
        if self.state == ListState::Unauthenticated {
            self.credential = credential;
        }
    }

    pub fn set_form_name(&mut self, name: impl Into<String>) {
        if self.state == ListState::AddingItem {
            self.form.name = name.into();
        }
    }

    pub fn push_form_char(&mut self, c: char) {
        if self.state == ListState::AddingItem {
            self.form.name.push(c);
        }
    }

    pub fn pop_form_char(&mut self) {
        if self.state == ListState::AddingItem {
            self.form.name.pop();
        }
    }

    pub fn set_ordered_by(&mut self, shopper: Shopper) {
        if self.state == ListState::AddingItem {
            self.form.ordered_by = shopper;
        }
    }

    pub fn toggle_ordered_by(&mut self) {
        self.set_ordered_by(self.form.ordered_by.other());
    }

    // ------------------------------------------------------------------------
    // Transitions
    // ------------------------------------------------------------------------

    /// Load straight away when a password was remembered.
    pub fn startup(&mut self, stored: Option<Credential>) -> Vec<Effect> {
        match stored {
            Some(credential)
                if !credential.is_blank() && self.state == ListState::Unauthenticated =>
            {
                tracing::debug!("Remembered password found, loading list");
                self.credential = credential;
                vec![self.start_fetch(FetchPurpose::Load)]
            }
            _ => Vec::new(),
        }
    }

    /// Try the typed password.
    pub fn submit_credential(&mut self) -> Vec<Effect> {
        if self.state != ListState::Unauthenticated {
            return Vec::new();
        }
        if self.credential.is_blank() {
            self.error = Some("Enter the password first".to_string());
            return Vec::new();
        }
        self.error = None;
        vec![self.start_fetch(FetchPurpose::Load)]
    }

    pub fn begin_add(&mut self) -> Vec<Effect> {
        if self.state != ListState::Loaded {
            return Vec::new();
        }
        self.error = None;
        if self.refresh_before_edit {
            return vec![self.start_fetch(FetchPurpose::OpenForm)];
        }
        self.state = ListState::AddingItem;
        Vec::new()
    }

    pub fn cancel_add(&mut self) -> Vec<Effect> {
        if self.state == ListState::AddingItem {
            self.state = ListState::Loaded;
            self.form.name.clear();
            self.error = None;
        }
        Vec::new()
    }

    /// Send the form. `now` becomes the item's `orderedOn`.
    pub fn submit_item(&mut self, now: DateTime<Utc>) -> Vec<Effect> {
        if self.state != ListState::AddingItem {
            return Vec::new();
        }
        let name = self.form.name.trim().to_string();
        if name.is_empty() {
            return Vec::new();
        }
        if self.items.contains_active(&name) {
            self.error = Some(format!("{} is already on the list", name));
            return Vec::new();
        }

        self.error = None;
        self.suggestions.remember(&name);
        let item = ShoppingItem::new(name, self.form.ordered_by, now);

        vec![
            Effect::SaveSuggestions(self.suggestions.remembered().to_vec()),
            self.start_write(Mutation::Add(item), ListState::AddingItem),
        ]
    }

    /// Remove an active item by name. Absent names are ignored.
    pub fn remove_item(&mut self, name: &str) -> Vec<Effect> {
        if self.state != ListState::Loaded || !self.items.contains_active(name) {
            return Vec::new();
        }
        self.error = None;
        if self.refresh_before_edit {
            return vec![self.start_fetch(FetchPurpose::Remove(name.to_string()))];
        }
        vec![self.start_write(Mutation::Remove(name.to_string()), ListState::Loaded)]
    }

    pub fn refresh(&mut self) -> Vec<Effect> {
        if self.state != ListState::Loaded {
            return Vec::new();
        }
        self.error = None;
        vec![self.start_fetch(FetchPurpose::Load)]
    }

    /// Drop the list and forget the remembered password.
    pub fn sign_out(&mut self) -> Vec<Effect> {
        if self.state.is_busy() {
            return Vec::new();
        }
        self.state = ListState::Unauthenticated;
        self.items = ShoppingList::default();
        self.form = ItemForm::default();
        self.credential = Credential::default();
        self.error = None;
        vec![Effect::ForgetCredential]
    }

    /// Apply the result of a remote effect. Stale outcomes are dropped.
    pub fn settle(&mut self, outcome: Outcome) -> Vec<Effect> {
        match outcome {
            Outcome::Fetched { generation, result } => self.on_fetched(generation, result),
            Outcome::Written { generation, result } => self.on_written(generation, result),
        }
    }

    // ------------------------------------------------------------------------
    // Internals
    // ------------------------------------------------------------------------

    fn next_generation(&mut self) -> u64 {
        self.generation += 1;
        self.generation
    }

    fn start_fetch(&mut self, purpose: FetchPurpose) -> Effect {
        let generation = self.next_generation();
        if purpose != FetchPurpose::Reconcile {
            self.state = ListState::Loading;
        }
        tracing::debug!(generation, purpose = ?purpose, "Starting fetch");
        self.in_flight = Some(InFlight::Fetch {
            generation,
            purpose,
        });
        Effect::Fetch {
            generation,
            credential: self.credential.clone(),
        }
    }

    fn start_write(&mut self, mutation: Mutation, return_to: ListState) -> Effect {
        let generation = self.next_generation();
        self.state = ListState::Sending;
        tracing::debug!(generation, item = %mutation.name(), "Starting write");
        self.in_flight = Some(InFlight::Write {
            generation,
            return_to,
        });
        Effect::Write {
            generation,
            credential: self.credential.clone(),
            base: self.items.clone(),
            mutation,
        }
    }

    fn unauthenticate(&mut self, err: &StoreError, effects: &mut Vec<Effect>) {
        self.state = ListState::Unauthenticated;
        self.items = ShoppingList::default();
        self.error = Some(error_text(err));
        if err.is_credential_rejection() {
            effects.push(Effect::ForgetCredential);
        }
    }

    fn on_fetched(
        &mut self,
        generation: u64,
        result: Result<ShoppingList, StoreError>,
    ) -> Vec<Effect> {
        let purpose = match self.in_flight.take() {
            Some(InFlight::Fetch {
                generation: g,
                purpose,
            }) if g == generation => purpose,
            other => {
                tracing::debug!(generation, "Ignoring stale fetch result");
                self.in_flight = other;
                return Vec::new();
            }
        };

        let mut effects = Vec::new();
        let list = match result {
            Ok(list) => list,
            Err(err) => {
                if purpose == FetchPurpose::Reconcile {
                    self.form.name.clear();
                }
                self.unauthenticate(&err, &mut effects);
                return effects;
            }
        };

        self.items = list;
        self.error = None;
        effects.push(Effect::StoreCredential(self.credential.clone()));

        match purpose {
            FetchPurpose::Load => self.state = ListState::Loaded,
            FetchPurpose::OpenForm => self.state = ListState::AddingItem,
            FetchPurpose::Reconcile => {
                self.form.name.clear();
                self.state = ListState::Loaded;
            }
            FetchPurpose::Remove(name) => {
                if self.items.contains_active(&name) {
                    effects.push(self.start_write(Mutation::Remove(name), ListState::Loaded));
                } else {
                    tracing::debug!(item = %name, "Item already gone, skipping remove");
                    self.state = ListState::Loaded;
                }
            }
        }

        effects
    }

    fn on_written(&mut self, generation: u64, result: Result<(), StoreError>) -> Vec<Effect> {
        let return_to = match self.in_flight.take() {
            Some(InFlight::Write {
                generation: g,
                return_to,
            }) if g == generation => return_to,
            other => {
                tracing::debug!(generation, "Ignoring stale write result");
                self.in_flight = other;
                return Vec::new();
            }
        };

        match result {
            Ok(()) => vec![self.start_fetch(FetchPurpose::Reconcile)],
            Err(err) if err.is_credential_rejection() => {
                let mut effects = Vec::new();
                self.unauthenticate(&err, &mut effects);
                effects
            }
            Err(err) => {
                self.state = return_to;
                self.error = Some(error_text(&err));
                Vec::new()
            }
        }
    }
}

/// Store errors can quote the server's message, which is untrusted text.
fn error_text(err: &StoreError) -> String {
    clean_remote_text(&err.to_string()).into_owned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 9, 12, 0, 0).unwrap()
    }

    fn controller(refresh_before_edit: bool) -> ListController {
        ListController::new(
            Suggestions::new(vec![], vec!["Milk".into(), "Mint".into(), "Bread".into()]),
            refresh_before_edit,
        )
    }

    fn milk() -> ShoppingItem {
        ShoppingItem::new("Milk", Shopper::UserA, now())
    }

    fn fetch_generation(effects: &[Effect]) -> u64 {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Fetch { generation, .. } => Some(*generation),
                _ => None,
            })
            .expect("expected a fetch effect")
    }

    fn write_of(effects: &[Effect]) -> (u64, Mutation) {
        effects
            .iter()
            .find_map(|e| match e {
                Effect::Write {
                    generation,
                    mutation,
                    ..
                } => Some((*generation, mutation.clone())),
                _ => None,
            })
            .expect("expected a write effect")
    }

    fn loaded_with(items: Vec<ShoppingItem>, refresh_before_edit: bool) -> ListController {
        let mut c = controller(refresh_before_edit);
        let effects = c.startup(Some(Credential::new("abc123")));
        let generation = fetch_generation(&effects);
        c.settle(Outcome::Fetched {
            generation,
            result: Ok(ShoppingList::new(items)),
        });
        assert_eq!(c.state(), ListState::Loaded);
        c
    }

    #[test]
    fn test_startup_without_credential_waits() {
        let mut c = controller(false);
        assert!(c.startup(None).is_empty());
        assert!(c.startup(Some(Credential::new(""))).is_empty());
        assert_eq!(c.state(), ListState::Unauthenticated);
    }

    #[test]
    fn test_startup_with_credential_fetches() {
        let mut c = controller(false);
        let effects = c.startup(Some(Credential::new("abc123")));
        assert_eq!(c.state(), ListState::Loading);
        assert!(matches!(effects.as_slice(), [Effect::Fetch { .. }]));
    }

    #[test]
    fn test_empty_credential_is_refused_locally() {
        let mut c = controller(false);
        c.set_credential(Credential::new("  "));
        assert!(c.submit_credential().is_empty());
        assert_eq!(c.state(), ListState::Unauthenticated);
        assert!(c.error().is_some());
    }

    #[test]
    fn test_fetch_success_stores_credential() {
        let mut c = controller(false);
        c.set_credential(Credential::new("abc123"));
        let generation = fetch_generation(&c.submit_credential());

        let effects = c.settle(Outcome::Fetched {
            generation,
            result: Ok(ShoppingList::default()),
        });
        assert_eq!(c.state(), ListState::Loaded);
        assert!(matches!(effects.as_slice(), [Effect::StoreCredential(_)]));
    }

    #[test]
    fn test_missing_payload_forgets_credential_and_clears_items() {
        let mut c = loaded_with(vec![milk()], false);
        let generation = fetch_generation(&c.refresh());

        let effects = c.settle(Outcome::Fetched {
            generation,
            result: Err(StoreError::MissingPayload),
        });
        assert_eq!(c.state(), ListState::Unauthenticated);
        assert!(c.items().is_empty());
        assert!(c.error().is_some());
        assert!(matches!(effects.as_slice(), [Effect::ForgetCredential]));
    }

    #[test]
    fn test_rejection_message_is_cleaned() {
        let mut c = controller(false);
        let generation = fetch_generation(&c.startup(Some(Credential::new("abc123"))));
        c.settle(Outcome::Fetched {
            generation,
            result: Err(StoreError::Rejected("wrong key\u{9b}2J\x1b[31m!".to_string())),
        });
        assert_eq!(c.error(), Some("Wrong password: wrong key2J!"));
    }

    #[test]
    fn test_transport_failure_keeps_credential() {
        let mut c = controller(false);
        let generation = fetch_generation(&c.startup(Some(Credential::new("abc123"))));
        let effects = c.settle(Outcome::Fetched {
            generation,
            result: Err(StoreError::HttpStatus(503)),
        });
        assert_eq!(c.state(), ListState::Unauthenticated);
        assert!(effects.is_empty());
        assert_eq!(c.credential().expose(), "abc123");
    }

    #[test]
    fn test_empty_name_does_nothing() {
        let mut c = loaded_with(vec![], false);
        c.begin_add();
        c.set_form_name("   ");
        assert!(c.submit_item(now()).is_empty());
        assert_eq!(c.state(), ListState::AddingItem);
    }

    #[test]
    fn test_duplicate_name_is_refused() {
        let mut c = loaded_with(vec![milk()], false);
        c.begin_add();
        c.set_form_name("Milk");
        assert!(c.submit_item(now()).is_empty());
        assert_eq!(c.state(), ListState::AddingItem);
        assert!(c.error().unwrap().contains("Milk"));
    }

    #[test]
    fn test_add_flow_reconciles_then_clears_form() {
        let mut c = loaded_with(vec![milk()], false);
        c.begin_add();
        c.set_form_name(" Bread ");
        c.set_ordered_by(Shopper::UserB);

        let effects = c.submit_item(now());
        assert_eq!(c.state(), ListState::Sending);
        assert!(matches!(effects[0], Effect::SaveSuggestions(ref names) if names == &["Bread".to_string()]));
        let (generation, mutation) = write_of(&effects);
        let expected = ShoppingItem::new("Bread", Shopper::UserB, now());
        assert_eq!(mutation, Mutation::Add(expected.clone()));

        let effects = c.settle(Outcome::Written {
            generation,
            result: Ok(()),
        });
        assert_eq!(c.state(), ListState::Sending);
        let generation = fetch_generation(&effects);

        c.settle(Outcome::Fetched {
            generation,
            result: Ok(ShoppingList::new(vec![expected, milk()])),
        });
        assert_eq!(c.state(), ListState::Loaded);
        assert_eq!(c.form().name, "");
        assert_eq!(c.items().active_len(), 2);
    }

    #[test]
    fn test_write_failure_returns_to_form() {
        let mut c = loaded_with(vec![milk()], false);
        c.begin_add();
        c.set_form_name("Bread");
        let (generation, _) = write_of(&c.submit_item(now()));

        let effects = c.settle(Outcome::Written {
            generation,
            result: Err(StoreError::HttpStatus(500)),
        });
        assert!(effects.is_empty());
        assert_eq!(c.state(), ListState::AddingItem);
        assert_eq!(c.form().name, "Bread");
        assert_eq!(c.items().items(), &[milk()]);
        assert!(c.error().is_some());
    }

    #[test]
    fn test_write_rejection_signs_out() {
        let mut c = loaded_with(vec![milk()], false);
        let (generation, _) = write_of(&c.remove_item("Milk"));

        let effects = c.settle(Outcome::Written {
            generation,
            result: Err(StoreError::Rejected("store answered 401".into())),
        });
        assert_eq!(c.state(), ListState::Unauthenticated);
        assert!(matches!(effects.as_slice(), [Effect::ForgetCredential]));
    }

    #[test]
    fn test_remove_absent_is_noop() {
        let mut c = loaded_with(vec![milk()], false);
        assert!(c.remove_item("Bread").is_empty());
        assert_eq!(c.state(), ListState::Loaded);
    }

    #[test]
    fn test_remove_failure_returns_to_loaded() {
        let mut c = loaded_with(vec![milk()], false);
        let (generation, mutation) = write_of(&c.remove_item("Milk"));
        assert_eq!(mutation, Mutation::Remove("Milk".into()));

        c.settle(Outcome::Written {
            generation,
            result: Err(StoreError::Timeout(20)),
        });
        assert_eq!(c.state(), ListState::Loaded);
        assert!(c.items().contains_active("Milk"));
    }

    #[test]
    fn test_refresh_before_add_opens_form_after_fetch() {
        let mut c = loaded_with(vec![], true);
        let generation = fetch_generation(&c.begin_add());
        assert_eq!(c.state(), ListState::Loading);

        c.settle(Outcome::Fetched {
            generation,
            result: Ok(ShoppingList::new(vec![milk()])),
        });
        assert_eq!(c.state(), ListState::AddingItem);
        assert!(c.items().contains_active("Milk"));
    }

    #[test]
    fn test_refresh_before_remove_drops_vanished_item() {
        let mut c = loaded_with(vec![milk()], true);
        let generation = fetch_generation(&c.remove_item("Milk"));

        let effects = c.settle(Outcome::Fetched {
            generation,
            result: Ok(ShoppingList::default()),
        });
        assert!(!effects.iter().any(|e| matches!(e, Effect::Write { .. })));
        assert_eq!(c.state(), ListState::Loaded);
    }

    #[test]
    fn test_refresh_before_remove_writes_against_fresh_list() {
        let bread = ShoppingItem::new("Bread", Shopper::UserB, now());
        let mut c = loaded_with(vec![milk()], true);
        let generation = fetch_generation(&c.remove_item("Milk"));

        let effects = c.settle(Outcome::Fetched {
            generation,
            result: Ok(ShoppingList::new(vec![bread.clone(), milk()])),
        });
        assert_eq!(c.state(), ListState::Sending);
        let base = effects
            .iter()
            .find_map(|e| match e {
                Effect::Write { base, .. } => Some(base.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(base.items(), &[bread, milk()]);
    }

    #[test]
    fn test_stale_outcome_ignored() {
        let mut c = loaded_with(vec![milk()], false);
        let first = fetch_generation(&c.refresh());
        assert!(c.is_current(first));

        let effects = c.settle(Outcome::Fetched {
            generation: first + 7,
            result: Ok(ShoppingList::default()),
        });
        assert!(effects.is_empty());
        assert_eq!(c.state(), ListState::Loading);
        assert!(c.is_current(first));
    }

    #[test]
    fn test_busy_ignores_input() {
        let mut c = loaded_with(vec![milk()], false);
        c.refresh();
        assert!(c.refresh().is_empty());
        assert!(c.begin_add().is_empty());
        assert!(c.remove_item("Milk").is_empty());
        assert!(c.sign_out().is_empty());
    }

    #[test]
    fn test_cancel_add_discards_name() {
        let mut c = loaded_with(vec![], false);
        c.begin_add();
        c.push_form_char('T');
        c.push_form_char('e');
        c.pop_form_char();
        assert_eq!(c.form().name, "T");
        c.cancel_add();
        assert_eq!(c.state(), ListState::Loaded);
        assert_eq!(c.form().name, "");
    }

    #[test]
    fn test_sign_out_forgets() {
        let mut c = loaded_with(vec![milk()], false);
        let effects = c.sign_out();
        assert_eq!(c.state(), ListState::Unauthenticated);
        assert!(c.items().is_empty());
        assert!(c.credential().is_blank());
        assert!(matches!(effects.as_slice(), [Effect::ForgetCredential]));
    }

    #[test]
    fn test_autocomplete_follows_form_input() {
        let mut c = loaded_with(vec![], false);
        c.begin_add();
        c.set_form_name("mi");
        assert_eq!(c.matching_suggestions(), vec!["Milk", "Mint"]);
    }
}
