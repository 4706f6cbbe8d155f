//! Input handling for the TUI.
//!
//! Keys are resolved to actions through the keybinding registry for the
//! current context; unbound characters in the text forms are typed input.

use crate::app::{App, AppEvent};
use crate::keybindings::{Action as KbAction, Context as KbContext};
use crate::list::ListState;
use crate::remote::Credential;
use crate::util::validate_url_for_open;
use anyhow::{Context, Result};
use chrono::Utc;
use crossterm::event::{KeyCode, KeyModifiers};
use tokio::sync::mpsc;

use super::helpers::dispatch;
use super::Action;

/// Main input dispatch function.
pub(super) async fn handle_input(
    app: &mut App,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let context = app.input_context();
    let action = app.keybindings.action_for_key(code, modifiers, context);

    match context {
        KbContext::Help => Ok(handle_help_input(app, action)),
        KbContext::Login => handle_login_input(app, action, code, modifiers, event_tx).await,
        KbContext::AddForm => handle_form_input(app, action, code, modifiers, event_tx).await,
        KbContext::Cat => handle_cat_input(app, action).await,
        KbContext::List | KbContext::Global => handle_list_input(app, action, event_tx).await,
    }
}

/// Actions that mean the same thing on every screen.
///
/// Returns `None` when the action is not global and the caller should
/// handle it.
fn handle_global(app: &mut App, action: KbAction) -> Option<Action> {
    match action {
        KbAction::Quit => Some(Action::Quit),
        KbAction::CycleTheme => {
            let name = app.cycle_theme();
            app.set_status(format!("Theme: {}", name));
            Some(Action::Continue)
        }
        KbAction::ShowHelp => {
            app.show_help = true;
            app.help_scroll_offset = 0;
            Some(Action::Continue)
        }
        KbAction::CycleFocus => {
            app.cycle_focus();
            Some(Action::Continue)
        }
        _ => None,
    }
}

/// Handle input while the help overlay is visible.
fn handle_help_input(app: &mut App, action: Option<KbAction>) -> Action {
    match action {
        Some(KbAction::Back) | Some(KbAction::ShowHelp) => {
            app.show_help = false;
            app.help_scroll_offset = 0;
        }
        Some(KbAction::NavDown) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_add(1);
        }
        Some(KbAction::NavUp) => {
            app.help_scroll_offset = app.help_scroll_offset.saturating_sub(1);
        }
        Some(KbAction::Quit) => return Action::Quit,
        _ => {}
    }
    Action::Continue
}

/// Password form: type, submit, or leave for the cat panel.
async fn handle_login_input(
    app: &mut App,
    action: Option<KbAction>,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    if app.list.state().is_busy() {
        // Only global keys while the first load is running
        return Ok(action
            .and_then(|a| handle_global(app, a))
            .unwrap_or(Action::Continue));
    }

    match action {
        Some(KbAction::Submit) => {
            let effects = app.list.submit_credential();
            dispatch(app, effects, event_tx).await;
        }
        Some(a) => {
            if let Some(result) = handle_global(app, a) {
                return Ok(result);
            }
        }
        None => edit_password(app, code, modifiers),
    }
    Ok(Action::Continue)
}

fn edit_password(app: &mut App, code: KeyCode, modifiers: KeyModifiers) {
    let mut typed = app.list.credential().expose().to_string();
    match code {
        KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => typed.push(c),
        KeyCode::Backspace => {
            typed.pop();
        }
        _ => return,
    }
    app.list.set_credential(Credential::new(typed));
}

/// Add-item form.
async fn handle_form_input(
    app: &mut App,
    action: Option<KbAction>,
    code: KeyCode,
    modifiers: KeyModifiers,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    match action {
        Some(KbAction::Submit) => {
            let effects = app.list.submit_item(Utc::now());
            app.selected_suggestion = None;
            dispatch(app, effects, event_tx).await;
        }
        Some(KbAction::Back) => {
            app.list.cancel_add();
            app.selected_suggestion = None;
        }
        Some(KbAction::NextSuggestion) => app.next_suggestion(),
        Some(KbAction::PrevSuggestion) => app.prev_suggestion(),
        Some(KbAction::AcceptSuggestion) => {
            if !app.accept_suggestion() {
                app.set_status("No suggestions");
            }
        }
        Some(KbAction::ToggleShopper) => app.list.toggle_ordered_by(),
        Some(a) => {
            if let Some(result) = handle_global(app, a) {
                return Ok(result);
            }
        }
        None => match code {
            KeyCode::Char(c) if !modifiers.contains(KeyModifiers::CONTROL) => {
                app.list.push_form_char(c);
                app.selected_suggestion = None;
            }
            KeyCode::Backspace => {
                app.list.pop_form_char();
                app.selected_suggestion = None;
            }
            _ => {}
        },
    }
    Ok(Action::Continue)
}

/// The list panel once signed in.
async fn handle_list_input(
    app: &mut App,
    action: Option<KbAction>,
    event_tx: &mpsc::Sender<AppEvent>,
) -> Result<Action> {
    let Some(action) = action else {
        return Ok(Action::Continue);
    };
    if let Some(result) = handle_global(app, action) {
        return Ok(result);
    }

    match action {
        KbAction::NavDown => app.nav_down(),
        KbAction::NavUp => app.nav_up(),
        KbAction::AddItem => {
            let effects = app.list.begin_add();
            app.selected_suggestion = None;
            dispatch(app, effects, event_tx).await;
        }
        KbAction::RemoveItem => {
            if let Some(name) = app.selected().map(|item| item.name.clone()) {
                let effects = app.list.remove_item(&name);
                dispatch(app, effects, event_tx).await;
            }
        }
        KbAction::Refresh => {
            let effects = app.list.refresh();
            dispatch(app, effects, event_tx).await;
        }
        KbAction::SignOut => {
            if app.list.state() == ListState::Loaded {
                let effects = app.list.sign_out();
                dispatch(app, effects, event_tx).await;
                app.selected_item = 0;
                app.set_status("Signed out");
            }
        }
        _ => {}
    }
    Ok(Action::Continue)
}

/// The cat panel.
async fn handle_cat_input(app: &mut App, action: Option<KbAction>) -> Result<Action> {
    let Some(action) = action else {
        return Ok(Action::Continue);
    };
    if let Some(result) = handle_global(app, action) {
        return Ok(result);
    }

    match action {
        KbAction::NextCat if app.cat.opted_in() => app.cat.reroll(),
        KbAction::ToggleGif if app.cat.opted_in() => {
            app.cat
                .toggle_animated(&app.db)
                .await
                .context("Failed to save cat preference")?;
        }
        KbAction::ToggleCats => {
            let saved = if app.cat.opted_in() {
                app.cat.opt_out(&app.db).await
            } else {
                app.cat.opt_in(&app.db).await
            };
            saved.context("Failed to save cat preference")?;
        }
        KbAction::OpenCat if app.cat.opted_in() => {
            let url = app.cat.image_url(&app.cat_api_base);
            if let Err(e) = validate_url_for_open(&url) {
                app.set_status(e);
            } else if let Err(e) = open::that(&url) {
                app.set_status(format!("Failed to open browser: {}", e));
            } else {
                app.set_status("Opening cat...");
            }
        }
        KbAction::Back => app.cycle_focus(),
        _ => {}
    }
    Ok(Action::Continue)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::Focus;
    use crate::config::Config;
    use crate::list::{Effect, Outcome, ShoppingItem, ShoppingList, Shopper};
    use crate::remote::Backend;
    use crate::storage::{keys, Database, KeyValueStore};

    async fn test_app() -> App {
        let db = Database::open(":memory:").await.unwrap();
        let config = Config {
            refresh_before_edit: false,
            ..Config::default()
        };
        let backend = Backend::from_config(&config).unwrap();
        App::new(db, backend, &config).await.unwrap()
    }

    async fn press(app: &mut App, code: KeyCode, tx: &mpsc::Sender<AppEvent>) -> Action {
        handle_input(app, code, KeyModifiers::NONE, tx).await.unwrap()
    }

    async fn type_text(app: &mut App, text: &str, tx: &mpsc::Sender<AppEvent>) {
        for c in text.chars() {
            press(app, KeyCode::Char(c), tx).await;
        }
    }

    fn load(app: &mut App, names: &[&str]) {
        let items = names
            .iter()
            .map(|n| ShoppingItem::new(*n, Shopper::UserA, Utc::now()))
            .collect();
        app.list.set_credential(Credential::new("abc123"));
        let generation = match app.list.submit_credential().as_slice() {
            [Effect::Fetch { generation, .. }] => *generation,
            other => panic!("unexpected effects {:?}", other),
        };
        app.list.settle(Outcome::Fetched {
            generation,
            result: Ok(ShoppingList::new(items)),
        });
    }

    #[tokio::test]
    async fn test_typing_password_including_q() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        type_text(&mut app, "quiq", &tx).await;
        press(&mut app, KeyCode::Backspace, &tx).await;
        assert_eq!(app.list.credential().expose(), "qui");
    }

    #[tokio::test]
    async fn test_ctrl_c_quits_from_password_form() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        let action = handle_input(&mut app, KeyCode::Char('c'), KeyModifiers::CONTROL, &tx)
            .await
            .unwrap();
        assert!(matches!(action, Action::Quit));
    }

    #[tokio::test]
    async fn test_empty_password_submit_shows_error() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        press(&mut app, KeyCode::Enter, &tx).await;
        assert_eq!(app.list.state(), ListState::Unauthenticated);
        assert!(app.list.error().is_some());
        assert!(app.remote_task.is_none());
    }

    #[tokio::test]
    async fn test_add_form_typing_and_cancel() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        load(&mut app, &[]);

        press(&mut app, KeyCode::Char('a'), &tx).await;
        assert_eq!(app.list.state(), ListState::AddingItem);

        type_text(&mut app, "Bread", &tx).await;
        press(&mut app, KeyCode::Right, &tx).await;
        assert_eq!(app.list.form().name, "Bread");
        assert_eq!(app.list.form().ordered_by, Shopper::UserB);

        press(&mut app, KeyCode::Esc, &tx).await;
        assert_eq!(app.list.state(), ListState::Loaded);
        assert!(app.list.form().name.is_empty());
    }

    #[tokio::test]
    async fn test_empty_item_name_never_writes() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        load(&mut app, &[]);
        press(&mut app, KeyCode::Char('a'), &tx).await;
        type_text(&mut app, "   ", &tx).await;
        press(&mut app, KeyCode::Enter, &tx).await;
        assert_eq!(app.list.state(), ListState::AddingItem);
        assert!(app.remote_task.is_none());
    }

    #[tokio::test]
    async fn test_list_navigation() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        load(&mut app, &["Milk", "Bread", "Eggs"]);

        press(&mut app, KeyCode::Char('j'), &tx).await;
        press(&mut app, KeyCode::Down, &tx).await;
        press(&mut app, KeyCode::Down, &tx).await;
        assert_eq!(app.selected_item, 2);
        press(&mut app, KeyCode::Char('k'), &tx).await;
        assert_eq!(app.selected_item, 1);
    }

    #[tokio::test]
    async fn test_sign_out_forgets_password() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        load(&mut app, &["Milk"]);
        app.db.set(keys::CREDENTIAL, "abc123").await.unwrap();

        press(&mut app, KeyCode::Char('L'), &tx).await;

        assert_eq!(app.list.state(), ListState::Unauthenticated);
        assert!(app.list.items().is_empty());
        assert_eq!(app.db.get(keys::CREDENTIAL).await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_tab_moves_to_cat_panel_and_back() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        load(&mut app, &[]);

        press(&mut app, KeyCode::Tab, &tx).await;
        assert_eq!(app.focus, Focus::Cat);

        let before = app.cat.selector();
        press(&mut app, KeyCode::Char('n'), &tx).await;
        assert_eq!(app.cat.selector(), before.wrapping_add(1));

        press(&mut app, KeyCode::Esc, &tx).await;
        assert_eq!(app.focus, Focus::List);
    }

    #[tokio::test]
    async fn test_cat_opt_out_is_persisted() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        app.focus = Focus::Cat;

        press(&mut app, KeyCode::Char('c'), &tx).await;
        assert!(!app.cat.opted_in());
        assert_eq!(
            app.db.get(keys::CAT_OPTED_IN).await.unwrap().as_deref(),
            Some("false")
        );

        // Rerolling is disabled while opted out
        let before = app.cat.selector();
        press(&mut app, KeyCode::Char('n'), &tx).await;
        assert_eq!(app.cat.selector(), before);
    }

    #[tokio::test]
    async fn test_help_overlay_toggles() {
        let mut app = test_app().await;
        let (tx, _rx) = mpsc::channel(4);
        load(&mut app, &[]);

        press(&mut app, KeyCode::Char('?'), &tx).await;
        assert!(app.show_help);
        press(&mut app, KeyCode::Char('j'), &tx).await;
        assert_eq!(app.help_scroll_offset, 1);
        press(&mut app, KeyCode::Char('?'), &tx).await;
        assert!(!app.show_help);
    }
}
